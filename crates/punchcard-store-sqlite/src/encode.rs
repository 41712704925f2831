//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with exactly six fractional
//! digits and a `Z` suffix, so lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings. Counters are INTEGER.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use punchcard_core::{reward::RewardNotification, user::User, visit::Visit};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Truncate to the stored precision so values handed back to callers equal
/// what a later read returns.
pub fn truncate_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

/// The current time at stored precision.
pub fn now() -> DateTime<Utc> { truncate_dt(Utc::now()) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counters ────────────────────────────────────────────────────────────────

pub fn decode_counter(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Counter(n))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "id, first_name, last_name, phone_number, \
   total_visits, current_reward_points, pass_serial_number, created_at, \
   updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:                    String,
  pub first_name:            String,
  pub last_name:             String,
  pub phone_number:          String,
  pub total_visits:          i64,
  pub current_reward_points: i64,
  pub pass_serial_number:    Option<String>,
  pub created_at:            String,
  pub updated_at:            String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      first_name:            row.get(1)?,
      last_name:             row.get(2)?,
      phone_number:          row.get(3)?,
      total_visits:          row.get(4)?,
      current_reward_points: row.get(5)?,
      pass_serial_number:    row.get(6)?,
      created_at:            row.get(7)?,
      updated_at:            row.get(8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:                    decode_uuid(&self.id)?,
      first_name:            self.first_name,
      last_name:             self.last_name,
      phone_number:          self.phone_number,
      total_visits:          decode_counter(self.total_visits)?,
      current_reward_points: decode_counter(self.current_reward_points)?,
      pass_serial_number:    self.pass_serial_number,
      created_at:            decode_dt(&self.created_at)?,
      updated_at:            decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawVisit::from_row`].
pub const VISIT_COLUMNS: &str = "id, user_id, pass_serial_number, visited_at, \
   reward_points_earned, is_reward_visit";

/// Raw values read directly from a `visits` row.
pub struct RawVisit {
  pub id:                   String,
  pub user_id:              String,
  pub pass_serial_number:   String,
  pub visited_at:           String,
  pub reward_points_earned: i64,
  pub is_reward_visit:      bool,
}

impl RawVisit {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      user_id:              row.get(1)?,
      pass_serial_number:   row.get(2)?,
      visited_at:           row.get(3)?,
      reward_points_earned: row.get(4)?,
      is_reward_visit:      row.get(5)?,
    })
  }

  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      id:                   decode_uuid(&self.id)?,
      user_id:              decode_uuid(&self.user_id)?,
      pass_serial_number:   self.pass_serial_number,
      visited_at:           decode_dt(&self.visited_at)?,
      reward_points_earned: decode_counter(self.reward_points_earned)?,
      is_reward_visit:      self.is_reward_visit,
    })
  }
}

/// Column list matching [`RawNotification::from_row`].
pub const NOTIFICATION_COLUMNS: &str = "id, user_id, notification_sent_at, \
   reward_claimed, reward_claimed_at";

/// Raw values read directly from a `reward_notifications` row.
pub struct RawNotification {
  pub id:                   String,
  pub user_id:              String,
  pub notification_sent_at: String,
  pub reward_claimed:       bool,
  pub reward_claimed_at:    Option<String>,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      user_id:              row.get(1)?,
      notification_sent_at: row.get(2)?,
      reward_claimed:       row.get(3)?,
      reward_claimed_at:    row.get(4)?,
    })
  }

  pub fn into_notification(self) -> Result<RewardNotification> {
    Ok(RewardNotification {
      id:                   decode_uuid(&self.id)?,
      user_id:              decode_uuid(&self.user_id)?,
      notification_sent_at: decode_dt(&self.notification_sent_at)?,
      reward_claimed:       self.reward_claimed,
      reward_claimed_at:    self
        .reward_claimed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let whole = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let fractional = whole + chrono::Duration::microseconds(5);
    assert!(encode_dt(whole) < encode_dt(fractional));
    assert_eq!(encode_dt(whole), "2024-01-01T12:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(fractional)).unwrap(), fractional);
  }

  #[test]
  fn negative_counter_is_rejected() {
    assert!(matches!(decode_counter(-1), Err(Error::Counter(-1))));
    assert_eq!(decode_counter(4).unwrap(), 4);
  }
}
