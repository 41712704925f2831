//! [`SqliteStore`]: the SQLite implementation of [`LoyaltyStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use punchcard_core::{
  Error as CoreError,
  accrual::{Accrual, POINTS_PER_VISIT},
  reward::RewardNotification,
  store::LoyaltyStore,
  user::{NewUser, User},
  visit::{Visit, VisitRecord},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, ffi};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    NOTIFICATION_COLUMNS, RawNotification, RawUser, RawVisit, USER_COLUMNS,
    VISIT_COLUMNS, decode_counter, encode_dt, encode_uuid, now, truncate_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A loyalty store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one user matching `column = value`.
  async fn find_user(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
              rusqlite::params![value],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

// ─── Constraint helpers ──────────────────────────────────────────────────────

/// True if `err` is a constraint failure with the given extended code.
fn is_constraint(err: &rusqlite::Error, extended_code: i32) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
        && e.extended_code == extended_code
  )
}

/// Serials are stored and looked up trimmed; a blank serial is rejected.
fn normalize_serial(pass_serial_number: &str) -> Result<String> {
  let trimmed = pass_serial_number.trim();
  if trimmed.is_empty() {
    return Err(
      CoreError::Validation("pass serial number is required".into()).into(),
    );
  }
  Ok(trimmed.to_owned())
}

// ─── Accrual transaction ─────────────────────────────────────────────────────

/// Read the pass holder, advance their counters, insert the visit and write
/// the user back, all inside one `IMMEDIATE` transaction.
///
/// `IMMEDIATE` takes the write lock before the first read, so no other
/// writer can observe or modify the counters between our read and update.
/// Returning early drops the transaction, which rolls it back.
fn accrue_visit(
  conn: &mut rusqlite::Connection,
  pass_serial_number: String,
  visited_at: DateTime<Utc>,
) -> Result<VisitRecord> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let raw = tx
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE pass_serial_number = ?1"),
      rusqlite::params![pass_serial_number],
      RawUser::from_row,
    )
    .optional()?;
  let Some(raw) = raw else {
    return Err(CoreError::PassSerialNotFound(pass_serial_number).into());
  };
  let mut user = raw.into_user()?;

  let accrual = Accrual::apply(user.total_visits, user.current_reward_points);

  let visit = Visit {
    id: Uuid::new_v4(),
    user_id: user.id,
    pass_serial_number,
    visited_at,
    reward_points_earned: POINTS_PER_VISIT,
    is_reward_visit: accrual.reward_triggered,
  };

  tx.execute(
    "INSERT INTO visits (
       id, user_id, pass_serial_number, visited_at,
       reward_points_earned, is_reward_visit
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(visit.id),
      encode_uuid(visit.user_id),
      visit.pass_serial_number,
      encode_dt(visit.visited_at),
      visit.reward_points_earned,
      visit.is_reward_visit,
    ],
  )?;

  user.total_visits = accrual.total_visits;
  user.current_reward_points = accrual.current_reward_points;
  user.updated_at = now();

  tx.execute(
    "UPDATE users
        SET total_visits = ?1, current_reward_points = ?2, updated_at = ?3
      WHERE id = ?4",
    rusqlite::params![
      user.total_visits,
      user.current_reward_points,
      encode_dt(user.updated_at),
      encode_uuid(user.id),
    ],
  )?;

  tx.commit()?;

  Ok(VisitRecord {
    visit,
    user,
    is_reward_eligible: accrual.is_reward_eligible(),
    reward_triggered: accrual.reward_triggered,
  })
}

// ─── LoyaltyStore impl ───────────────────────────────────────────────────────

impl LoyaltyStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let created_at = now();
    let user = User {
      id: Uuid::new_v4(),
      first_name: input.first_name().to_owned(),
      last_name: input.last_name().to_owned(),
      phone_number: input.phone_number().to_owned(),
      total_visits: 0,
      current_reward_points: 0,
      pass_serial_number: None,
      created_at,
      updated_at: created_at,
    };

    let id_str  = encode_uuid(user.id);
    let first   = user.first_name.clone();
    let last    = user.last_name.clone();
    let phone   = user.phone_number.clone();
    let at_str  = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (
             id, first_name, last_name, phone_number,
             total_visits, current_reward_points, pass_serial_number,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, 0, 0, NULL, ?5, ?5)",
          rusqlite::params![id_str, first, last, phone, at_str],
        );
        let outcome: Result<()> = match inserted {
          Ok(_) => Ok(()),
          Err(e) if is_constraint(&e, ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            Err(CoreError::DuplicatePhone(phone).into())
          }
          Err(e) => Err(e.into()),
        };
        Ok(outcome)
      })
      .await??;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.find_user("id", encode_uuid(id)).await
  }

  async fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
    self.find_user("phone_number", phone_number.to_owned()).await
  }

  async fn get_user_by_pass_serial(
    &self,
    pass_serial_number: &str,
  ) -> Result<Option<User>> {
    self
      .find_user("pass_serial_number", pass_serial_number.to_owned())
      .await
  }

  async fn set_pass_serial(
    &self,
    user_id: Uuid,
    pass_serial_number: String,
  ) -> Result<User> {
    let pass_serial_number = normalize_serial(&pass_serial_number)?;
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(now());

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let updated = conn
          .query_row(
            &format!(
              "UPDATE users SET pass_serial_number = ?1, updated_at = ?2
                WHERE id = ?3
               RETURNING {USER_COLUMNS}"
            ),
            rusqlite::params![pass_serial_number, at_str, id_str],
            RawUser::from_row,
          )
          .optional();
        let outcome: Result<Option<RawUser>> = match updated {
          Ok(raw) => Ok(raw),
          Err(e) if is_constraint(&e, ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            Err(CoreError::DuplicatePassSerial(pass_serial_number).into())
          }
          Err(e) => Err(e.into()),
        };
        Ok(outcome)
      })
      .await??;

    raw
      .ok_or(CoreError::UserNotFound(user_id))?
      .into_user()
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn record_visit(
    &self,
    pass_serial_number: String,
    visited_at: Option<DateTime<Utc>>,
  ) -> Result<VisitRecord> {
    let pass_serial_number = normalize_serial(&pass_serial_number)?;
    let visited_at = visited_at.map(truncate_dt).unwrap_or_else(now);

    self
      .conn
      .call(move |conn| Ok(accrue_visit(conn, pass_serial_number, visited_at)))
      .await?
  }

  async fn list_visits(&self, user_id: Uuid) -> Result<Vec<Visit>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VISIT_COLUMNS} FROM visits
            WHERE user_id = ?1
            ORDER BY visited_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawVisit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  // ── Reward notifications ──────────────────────────────────────────────────

  async fn create_notification(
    &self,
    user_id: Uuid,
  ) -> Result<RewardNotification> {
    let notification = RewardNotification {
      id: Uuid::new_v4(),
      user_id,
      notification_sent_at: now(),
      reward_claimed: false,
      reward_claimed_at: None,
    };

    let id_str      = encode_uuid(notification.id);
    let user_id_str = encode_uuid(user_id);
    let at_str      = encode_dt(notification.notification_sent_at);

    self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO reward_notifications (
             id, user_id, notification_sent_at, reward_claimed, reward_claimed_at
           ) VALUES (?1, ?2, ?3, 0, NULL)",
          rusqlite::params![id_str, user_id_str, at_str],
        );
        let outcome: Result<()> = match inserted {
          Ok(_) => Ok(()),
          Err(e) if is_constraint(&e, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            Err(CoreError::ForeignKey(user_id).into())
          }
          Err(e) => Err(e.into()),
        };
        Ok(outcome)
      })
      .await??;

    Ok(notification)
  }

  async fn get_notification(
    &self,
    id: Uuid,
  ) -> Result<Option<RewardNotification>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNotification> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM reward_notifications
                  WHERE id = ?1"
              ),
              rusqlite::params![id_str],
              RawNotification::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNotification::into_notification).transpose()
  }

  async fn list_notifications(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<RewardNotification>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM reward_notifications
            WHERE user_id = ?1
            ORDER BY notification_sent_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn count_unclaimed(&self, user_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(user_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM reward_notifications
            WHERE user_id = ?1 AND reward_claimed = 0",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    decode_counter(count)
  }

  async fn claim_reward(
    &self,
    notification_id: Uuid,
  ) -> Result<RewardNotification> {
    let id_str = encode_uuid(notification_id);
    let at_str = encode_dt(now());

    let raw: Option<RawNotification> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE reward_notifications
                    SET reward_claimed = 1, reward_claimed_at = ?1
                  WHERE id = ?2
                 RETURNING {NOTIFICATION_COLUMNS}"
              ),
              rusqlite::params![at_str, id_str],
              RawNotification::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or(CoreError::NotificationNotFound(notification_id))?
      .into_notification()
  }
}
