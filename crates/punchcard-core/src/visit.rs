//! Visits: the append-only ledger of scanned passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{accrual::Accrual, user::User};

// ─── Visit ───────────────────────────────────────────────────────────────────

/// One accrual event. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub id:                   Uuid,
  pub user_id:              Uuid,
  /// The serial that was scanned, copied at scan time.
  pub pass_serial_number:   String,
  /// When the scan happened; may be reported by the wallet provider rather
  /// than being the insertion time.
  pub visited_at:           DateTime<Utc>,
  pub reward_points_earned: u32,
  /// This visit completed a reward cycle.
  pub is_reward_visit:      bool,
}

// ─── Accrual results ─────────────────────────────────────────────────────────

/// Result of [`crate::store::LoyaltyStore::record_visit`]: the persisted
/// visit and the user as updated in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
  pub visit:              Visit,
  pub user:               User,
  /// Counter-based eligibility; see [`Accrual::is_reward_eligible`].
  pub is_reward_eligible: bool,
  pub reward_triggered:   bool,
}

impl VisitRecord {
  /// The counters after this visit, as an [`Accrual`].
  pub fn accrual(&self) -> Accrual {
    Accrual {
      total_visits:          self.user.total_visits,
      current_reward_points: self.user.current_reward_points,
      reward_triggered:      self.reward_triggered,
    }
  }
}

/// The answer returned to the wallet provider's scan webhook.
///
/// Here "eligible" means the customer is one visit away from completing the
/// cycle, which is what the pass front displays after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
  pub visit_id:               Uuid,
  pub user_id:                Uuid,
  pub reward_points_earned:   u32,
  pub total_visits:           u32,
  pub current_reward_points:  u32,
  pub is_reward_visit:        bool,
  pub is_eligible_for_reward: bool,
  pub visits_until_reward:    u32,
}

impl From<&VisitRecord> for ScanOutcome {
  fn from(record: &VisitRecord) -> Self {
    let accrual = record.accrual();
    Self {
      visit_id:               record.visit.id,
      user_id:                record.user.id,
      reward_points_earned:   record.visit.reward_points_earned,
      total_visits:           accrual.total_visits,
      current_reward_points:  accrual.current_reward_points,
      is_reward_visit:        record.visit.is_reward_visit,
      is_eligible_for_reward: accrual.is_one_visit_away(),
      visits_until_reward:    accrual.visits_until_reward(),
    }
  }
}
