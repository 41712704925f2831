//! Users: the loyalty program members and their counters.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Accepts an optional leading `+` followed by digits, spaces, dashes and
/// parentheses.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\+?[\d\s\-\(\)]+$").expect("invalid phone regex")
});

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered customer.
///
/// `phone_number` is the immutable business key. `pass_serial_number` stays
/// `None` until the wallet provider reports the issued pass; from then on it
/// is the key used to resolve scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:                    Uuid,
  pub first_name:            String,
  pub last_name:             String,
  pub phone_number:          String,
  /// Lifetime visit count; never decreases.
  pub total_visits:          u32,
  /// Progress through the current reward cycle, in `[0, 5)` after every
  /// accrual.
  pub current_reward_points: u32,
  pub pass_serial_number:    Option<String>,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
}

impl User {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

// ─── NewUser ─────────────────────────────────────────────────────────────────

/// Validated registration input for
/// [`crate::store::LoyaltyStore::create_user`].
///
/// The only way to build one is [`NewUser::new`], so a value of this type has
/// always passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
  first_name:   String,
  last_name:    String,
  phone_number: String,
}

impl NewUser {
  /// Trim and validate registration fields.
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    phone_number: impl Into<String>,
  ) -> Result<Self> {
    let first_name = first_name.into().trim().to_owned();
    let last_name = last_name.into().trim().to_owned();
    let phone_number = phone_number.into().trim().to_owned();

    if first_name.is_empty() {
      return Err(Error::Validation("first name is required".into()));
    }
    if last_name.is_empty() {
      return Err(Error::Validation("last name is required".into()));
    }
    if !PHONE_RE.is_match(&phone_number) {
      return Err(Error::Validation(format!(
        "invalid phone number format: {phone_number:?}"
      )));
    }

    Ok(Self { first_name, last_name, phone_number })
  }

  pub fn first_name(&self) -> &str { &self.first_name }

  pub fn last_name(&self) -> &str { &self.last_name }

  pub fn phone_number(&self) -> &str { &self.phone_number }
}
