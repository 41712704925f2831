//! Reward-cycle arithmetic for a single visit.
//!
//! Every visit earns [`POINTS_PER_VISIT`]. When the point counter reaches
//! [`REWARD_THRESHOLD`] the cycle completes, a reward is triggered, and the
//! counter resets to zero. The storage layer applies the result inside the
//! same transaction that read the counters.

/// Visits needed to complete one reward cycle.
pub const REWARD_THRESHOLD: u32 = 5;

/// Points credited for every scanned visit.
pub const POINTS_PER_VISIT: u32 = 1;

/// The counters a user ends up with after one accrual event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
  pub total_visits:          u32,
  pub current_reward_points: u32,
  /// This visit completed a reward cycle.
  pub reward_triggered:      bool,
}

impl Accrual {
  /// Advance the given counters by one visit.
  pub fn apply(total_visits: u32, current_reward_points: u32) -> Self {
    let raw_points = current_reward_points.saturating_add(POINTS_PER_VISIT);
    let reward_triggered = raw_points >= REWARD_THRESHOLD;

    Self {
      total_visits: total_visits.saturating_add(1),
      current_reward_points: if reward_triggered { 0 } else { raw_points },
      reward_triggered,
    }
  }

  /// Counter-based eligibility: the point counter has reached the threshold.
  ///
  /// Because a completed cycle resets the counter, this is never true for an
  /// accrual result. It is reported for compatibility only; the reward ledger
  /// is the authoritative source of "reward available".
  pub fn is_reward_eligible(&self) -> bool {
    self.current_reward_points >= REWARD_THRESHOLD
  }

  /// Visits left in the current cycle, in `[1, 5]`.
  pub fn visits_until_reward(&self) -> u32 {
    REWARD_THRESHOLD - (self.current_reward_points % REWARD_THRESHOLD)
  }

  /// The next visit will complete the cycle.
  pub fn is_one_visit_away(&self) -> bool { self.visits_until_reward() == 1 }
}
