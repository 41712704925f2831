//! The `LoyaltyStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `punchcard-store-sqlite`). Higher layers (`punchcard-api`,
//! `punchcard-wallet`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Classify,
  reward::RewardNotification,
  user::{NewUser, User},
  visit::{Visit, VisitRecord},
};

/// Abstraction over a loyalty store backend.
///
/// Visits are append-only. Users are never deleted. Reward notifications
/// only ever change through [`LoyaltyStore::claim_reward`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LoyaltyStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user with zeroed counters and no pass serial.
  ///
  /// Fails with a conflict if the phone number is already registered; no
  /// row is written in that case.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by exact phone number match.
  fn get_user_by_phone<'a>(
    &'a self,
    phone_number: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Retrieve the user currently holding `pass_serial_number`.
  fn get_user_by_pass_serial<'a>(
    &'a self,
    pass_serial_number: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Assign (or replace) the user's pass serial and bump `updated_at`.
  fn set_pass_serial(
    &self,
    user_id: Uuid,
    pass_serial_number: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Visits ────────────────────────────────────────────────────────────

  /// Accrue one visit for the holder of `pass_serial_number`.
  ///
  /// The user row is read and updated and the visit inserted in a single
  /// transaction that holds the write lock from the first read, so
  /// concurrent scans of the same pass serialise. `visited_at` defaults to
  /// now.
  fn record_visit(
    &self,
    pass_serial_number: String,
    visited_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<VisitRecord, Self::Error>> + Send + '_;

  /// All visits for a user, newest first.
  fn list_visits(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + '_;

  // ── Reward notifications ──────────────────────────────────────────────

  /// Record that a reward notification was sent to `user_id`.
  fn create_notification(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<RewardNotification, Self::Error>> + Send + '_;

  fn get_notification(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RewardNotification>, Self::Error>>
  + Send
  + '_;

  /// All notifications for a user, newest first.
  fn list_notifications(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RewardNotification>, Self::Error>>
  + Send
  + '_;

  /// Number of notifications for `user_id` whose reward is not yet claimed.
  fn count_unclaimed(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Mark a notification's reward as claimed at the current time.
  ///
  /// Claiming an already-claimed reward is not an error; it refreshes
  /// `reward_claimed_at`.
  fn claim_reward(
    &self,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<RewardNotification, Self::Error>> + Send + '_;
}
