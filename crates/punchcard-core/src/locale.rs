//! Customer-facing language selection.
//!
//! A [`Locale`] is always passed explicitly with the request that needs it;
//! there is no process-wide current language.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  #[default]
  En,
  Es,
}

impl Locale {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::En => "en",
      Self::Es => "es",
    }
  }

  /// Match a BCP 47 tag on its primary language subtag, e.g. `es-MX` → `Es`.
  pub fn from_tag(tag: &str) -> Option<Self> {
    let primary = tag.trim().split(['-', '_']).next()?;
    match primary.to_ascii_lowercase().as_str() {
      "en" => Some(Self::En),
      "es" => Some(Self::Es),
      _ => None,
    }
  }

  /// Pick the highest-weighted supported language from an `Accept-Language`
  /// header value. Entries with `q=0` are ignored.
  pub fn from_accept_language(header: &str) -> Option<Self> {
    let mut best: Option<(f32, Self)> = None;
    for entry in header.split(',') {
      let mut parts = entry.split(';');
      let Some(locale) = parts.next().and_then(Self::from_tag) else {
        continue;
      };
      let weight = parts
        .filter_map(|p| p.trim().strip_prefix("q="))
        .find_map(|q| q.parse::<f32>().ok())
        .unwrap_or(1.0);
      if weight <= 0.0 {
        continue;
      }
      if best.is_none_or(|(w, _)| weight > w) {
        best = Some((weight, locale));
      }
    }
    best.map(|(_, locale)| locale)
  }
}

impl fmt::Display for Locale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Locale {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_tag(s)
      .ok_or_else(|| Error::Validation(format!("unsupported locale: {s:?}")))
  }
}
