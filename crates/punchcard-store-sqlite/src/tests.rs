//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone as _, Utc};
use punchcard_core::{
  Classify as _, Error as CoreError, ErrorKind,
  accrual::REWARD_THRESHOLD,
  stats::project_stats,
  store::LoyaltyStore,
  user::{NewUser, User},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(phone: &str) -> NewUser {
  NewUser::new("John", "Doe", phone).expect("valid registration")
}

/// Register a user and assign them `serial`.
async fn user_with_pass(s: &SqliteStore, phone: &str, serial: &str) -> User {
  let user = s.create_user(new_user(phone)).await.unwrap();
  s.set_pass_serial(user.id, serial.into()).await.unwrap()
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_user_starts_with_zero_counters() {
  let s = store().await;

  let user = s.create_user(new_user("+1234567890")).await.unwrap();
  assert_eq!(user.first_name, "John");
  assert_eq!(user.total_visits, 0);
  assert_eq!(user.current_reward_points, 0);
  assert!(user.pass_serial_number.is_none());
  assert_eq!(user.created_at, user.updated_at);

  let fetched = s.get_user(user.id).await.unwrap();
  assert_eq!(fetched, Some(user));
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_phone_is_rejected_without_second_row() {
  let s = store().await;
  let first = s.create_user(new_user("+1234567890")).await.unwrap();

  let err = s
    .create_user(NewUser::new("Jane", "Smith", "+1234567890").unwrap())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DuplicatePhone(_))));
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let by_phone = s.get_user_by_phone("+1234567890").await.unwrap().unwrap();
  assert_eq!(by_phone.id, first.id);
  assert_eq!(by_phone.first_name, "John");
}

#[tokio::test]
async fn get_user_by_phone_is_exact_match() {
  let s = store().await;
  s.create_user(new_user("+1234567890")).await.unwrap();
  s.create_user(new_user("+1234567891")).await.unwrap();

  let found = s.get_user_by_phone("+1234567891").await.unwrap().unwrap();
  assert_eq!(found.phone_number, "+1234567891");
  assert!(s.get_user_by_phone("1234567890").await.unwrap().is_none());
}

#[tokio::test]
async fn set_pass_serial_updates_lookup_key() {
  let s = store().await;
  let user = s.create_user(new_user("+1234567890")).await.unwrap();

  let updated = s.set_pass_serial(user.id, "PASS-1".into()).await.unwrap();
  assert_eq!(updated.pass_serial_number.as_deref(), Some("PASS-1"));
  assert!(updated.updated_at >= user.updated_at);
  assert_eq!(updated.created_at, user.created_at);

  let found = s.get_user_by_pass_serial("PASS-1").await.unwrap().unwrap();
  assert_eq!(found.id, user.id);

  // Replacing the serial frees the old one.
  s.set_pass_serial(user.id, "PASS-2".into()).await.unwrap();
  assert!(s.get_user_by_pass_serial("PASS-1").await.unwrap().is_none());
}

#[tokio::test]
async fn set_pass_serial_missing_user_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.set_pass_serial(id, "PASS-1".into()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(u)) if u == id));
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn set_pass_serial_rejects_serial_held_by_other_user() {
  let s = store().await;
  user_with_pass(&s, "+1000000001", "PASS-1").await;
  let other = s.create_user(new_user("+1000000002")).await.unwrap();

  let err = s.set_pass_serial(other.id, "PASS-1".into()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DuplicatePassSerial(_))));
}

// ─── Visit accrual ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fifth_visit_completes_cycle() {
  let s = store().await;
  user_with_pass(&s, "+1234567890", "PASS-1").await;

  for n in 1..=4 {
    let record = s.record_visit("PASS-1".into(), None).await.unwrap();
    assert_eq!(record.user.total_visits, n);
    assert_eq!(record.user.current_reward_points, n);
    assert!(!record.reward_triggered);
    assert!(!record.visit.is_reward_visit);
    assert!(!record.is_reward_eligible);
  }

  let record = s.record_visit("PASS-1".into(), None).await.unwrap();
  assert_eq!(record.user.total_visits, 5);
  assert_eq!(record.user.current_reward_points, 0);
  assert!(record.reward_triggered);
  assert!(record.visit.is_reward_visit);
  assert_eq!(record.visit.reward_points_earned, 1);
  assert_eq!(record.visit.pass_serial_number, "PASS-1");

  let stored = s.get_user(record.user.id).await.unwrap().unwrap();
  assert_eq!(stored, record.user);
}

#[tokio::test]
async fn counters_track_visit_count_modulo_threshold() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;

  for _ in 0..12 {
    s.record_visit("PASS-1".into(), None).await.unwrap();
  }

  let stored = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(stored.total_visits, 12);
  assert_eq!(stored.current_reward_points, 12 % REWARD_THRESHOLD);

  let visits = s.list_visits(user.id).await.unwrap();
  assert_eq!(visits.len(), 12);
  assert_eq!(visits.iter().filter(|v| v.is_reward_visit).count(), 2);
}

#[tokio::test]
async fn tenth_visit_from_mid_cycle_triggers_reward() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;
  for _ in 0..9 {
    s.record_visit("PASS-1".into(), None).await.unwrap();
  }
  let before = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!((before.total_visits, before.current_reward_points), (9, 4));

  let record = s.record_visit("PASS-1".into(), None).await.unwrap();
  assert_eq!(record.user.total_visits, 10);
  assert_eq!(record.user.current_reward_points, 0);
  assert!(record.reward_triggered);
}

#[tokio::test]
async fn unknown_pass_serial_writes_nothing() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;

  let err = s.record_visit("PASS-404".into(), None).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PassSerialNotFound(_))));
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let stored = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(stored.total_visits, 0);
  assert!(s.list_visits(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_pass_serial_is_a_validation_error() {
  let s = store().await;
  let err = s.record_visit("  ".into(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn padded_serial_is_stored_and_scanned_trimmed() {
  let s = store().await;
  let user = s.create_user(new_user("+1234567890")).await.unwrap();

  let updated = s.set_pass_serial(user.id, " PASS-WS\t".into()).await.unwrap();
  assert_eq!(updated.pass_serial_number.as_deref(), Some("PASS-WS"));

  let record = s.record_visit("  PASS-WS ".into(), None).await.unwrap();
  assert_eq!(record.user.id, user.id);
  assert_eq!(record.visit.pass_serial_number, "PASS-WS");

  let err = s.set_pass_serial(user.id, "   ".into()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn supplied_scan_time_is_stored() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;
  let scanned_at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();

  let record = s
    .record_visit("PASS-1".into(), Some(scanned_at))
    .await
    .unwrap();
  assert_eq!(record.visit.visited_at, scanned_at);

  let visits = s.list_visits(user.id).await.unwrap();
  assert_eq!(visits[0].visited_at, scanned_at);
}

#[tokio::test]
async fn list_visits_is_newest_first() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;
  let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

  // Recorded out of chronological order.
  for offset in [2, 0, 1] {
    s.record_visit("PASS-1".into(), Some(base + Duration::hours(offset)))
      .await
      .unwrap();
  }

  let visits = s.list_visits(user.id).await.unwrap();
  let times: Vec<_> = visits.iter().map(|v| v.visited_at).collect();
  assert_eq!(times, vec![
    base + Duration::hours(2),
    base + Duration::hours(1),
    base,
  ]);
}

#[tokio::test]
async fn list_visits_only_returns_owner_visits() {
  let s = store().await;
  let alice = user_with_pass(&s, "+1000000001", "PASS-A").await;
  let bob = user_with_pass(&s, "+1000000002", "PASS-B").await;

  s.record_visit("PASS-A".into(), None).await.unwrap();
  s.record_visit("PASS-B".into(), None).await.unwrap();
  s.record_visit("PASS-B".into(), None).await.unwrap();

  assert_eq!(s.list_visits(alice.id).await.unwrap().len(), 1);
  let bobs = s.list_visits(bob.id).await.unwrap();
  assert_eq!(bobs.len(), 2);
  assert!(bobs.iter().all(|v| v.user_id == bob.id));
  assert!(s.list_visits(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_scans_do_not_lose_updates() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;

  let mut handles = Vec::new();
  for _ in 0..10 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.record_visit("PASS-1".into(), None).await
    }));
  }
  let mut triggered = 0;
  for handle in handles {
    if handle.await.unwrap().unwrap().reward_triggered {
      triggered += 1;
    }
  }

  let stored = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(stored.total_visits, 10);
  assert_eq!(stored.current_reward_points, 0);
  assert_eq!(triggered, 2);
}

// ─── Reward notifications ────────────────────────────────────────────────────

#[tokio::test]
async fn create_notification_defaults() {
  let s = store().await;
  let user = s.create_user(new_user("+1234567890")).await.unwrap();

  let n = s.create_notification(user.id).await.unwrap();
  assert_eq!(n.user_id, user.id);
  assert!(!n.reward_claimed);
  assert!(n.reward_claimed_at.is_none());

  assert_eq!(s.get_notification(n.id).await.unwrap(), Some(n));
}

#[tokio::test]
async fn create_notification_for_missing_user_violates_foreign_key() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.create_notification(id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ForeignKey(u)) if u == id));
  assert_eq!(err.kind(), ErrorKind::ForeignKey);
}

#[tokio::test]
async fn claim_reward_sets_flag_and_timestamp() {
  let s = store().await;
  let user = s.create_user(new_user("+1234567890")).await.unwrap();
  let n = s.create_notification(user.id).await.unwrap();

  let claimed = s.claim_reward(n.id).await.unwrap();
  assert!(claimed.reward_claimed);
  let first_claim = claimed.reward_claimed_at.unwrap();
  assert!(first_claim >= n.notification_sent_at);

  // Re-claiming keeps the flag and moves the timestamp to the new now.
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let again = s.claim_reward(n.id).await.unwrap();
  assert!(again.reward_claimed);
  assert!(again.reward_claimed_at.unwrap() > first_claim);
  assert_eq!(again.notification_sent_at, n.notification_sent_at);
}

#[tokio::test]
async fn claim_missing_notification_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.claim_reward(id).await.unwrap_err();
  assert!(
    matches!(err, Error::Core(CoreError::NotificationNotFound(n)) if n == id)
  );
}

#[tokio::test]
async fn notifications_listed_newest_first_per_user() {
  let s = store().await;
  let alice = s.create_user(new_user("+1000000001")).await.unwrap();
  let bob = s.create_user(new_user("+1000000002")).await.unwrap();

  let first = s.create_notification(alice.id).await.unwrap();
  let second = s.create_notification(alice.id).await.unwrap();
  s.create_notification(bob.id).await.unwrap();

  let listed = s.list_notifications(alice.id).await.unwrap();
  let ids: Vec<_> = listed.iter().map(|n| n.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
  assert!(s.list_notifications(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unclaimed_count_drops_after_claim() {
  let s = store().await;
  let user = s.create_user(new_user("+1234567890")).await.unwrap();
  let n = s.create_notification(user.id).await.unwrap();
  s.create_notification(user.id).await.unwrap();

  assert_eq!(s.count_unclaimed(user.id).await.unwrap(), 2);
  s.claim_reward(n.id).await.unwrap();
  assert_eq!(s.count_unclaimed(user.id).await.unwrap(), 1);
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

/// Counter-derived eligibility is always false after a completed cycle
/// because the counter resets; the ledger is what records the pending
/// reward. This pins both answers side by side.
#[tokio::test]
async fn completed_cycle_eligibility_comes_from_ledger() {
  let s = store().await;
  let user = user_with_pass(&s, "+1234567890", "PASS-1").await;

  let mut last = None;
  for _ in 0..REWARD_THRESHOLD {
    last = Some(s.record_visit("PASS-1".into(), None).await.unwrap());
  }
  let record = last.unwrap();
  assert!(record.reward_triggered);
  s.create_notification(user.id).await.unwrap();

  let unclaimed = s.count_unclaimed(user.id).await.unwrap();
  let stats = project_stats(record.user, unclaimed);
  assert!(!stats.is_eligible_for_reward);
  assert_eq!(stats.visits_until_reward, REWARD_THRESHOLD);
  assert_eq!(stats.unclaimed_rewards, 1);
}
