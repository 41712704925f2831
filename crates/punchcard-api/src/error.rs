//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use punchcard_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The request referenced a user that does not exist.
  #[error("constraint violation: {0}")]
  ForeignKey(String),

  /// A wallet or messaging provider failed.
  #[error("upstream service error: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a classified domain, store, or adapter error onto a response
  /// category. Internal failures are logged here so no handler can drop
  /// them silently.
  pub fn classify<E>(err: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match err.kind() {
      ErrorKind::NotFound => ApiError::NotFound(err.to_string()),
      ErrorKind::Validation => ApiError::BadRequest(err.to_string()),
      ErrorKind::Conflict => ApiError::Conflict(err.to_string()),
      ErrorKind::ForeignKey => ApiError::ForeignKey(err.to_string()),
      ErrorKind::Internal => {
        tracing::error!(error = %err, "store operation failed");
        ApiError::Store(Box::new(err))
      }
    }
  }

  /// Like [`ApiError::classify`], but provider transport failures become
  /// `502 Bad Gateway`.
  pub fn from_wallet(err: punchcard_wallet::Error) -> Self {
    match err {
      punchcard_wallet::Error::Upstream(message) => {
        tracing::warn!(%message, "upstream provider failed");
        ApiError::Upstream(message)
      }
      other => ApiError::classify(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::ForeignKey(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
