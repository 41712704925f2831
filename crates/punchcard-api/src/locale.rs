//! Request language negotiation.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{header::ACCEPT_LANGUAGE, request::Parts},
};
use punchcard_core::locale::Locale;

/// The supported language named by the request's `Accept-Language` header,
/// if any. Never rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptLanguage(pub Option<Locale>);

impl AcceptLanguage {
  /// An explicit choice in the request body wins, then the header, then the
  /// server default.
  pub fn resolve(self, explicit: Option<Locale>, default: Locale) -> Locale {
    explicit.or(self.0).unwrap_or(default)
  }
}

impl<S> FromRequestParts<S> for AcceptLanguage
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let locale = parts
      .headers
      .get(ACCEPT_LANGUAGE)
      .and_then(|v| v.to_str().ok())
      .and_then(Locale::from_accept_language);
    Ok(AcceptLanguage(locale))
  }
}
