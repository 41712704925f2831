//! Reward notifications: the ledger of granted rewards and their claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Records that a reward was granted to a user. Only the claim fields ever
/// change after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardNotification {
  pub id:                   Uuid,
  pub user_id:              Uuid,
  pub notification_sent_at: DateTime<Utc>,
  pub reward_claimed:       bool,
  /// Time of the most recent claim. Re-claiming advances it.
  pub reward_claimed_at:    Option<DateTime<Utc>>,
}
