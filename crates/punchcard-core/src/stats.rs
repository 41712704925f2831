//! Derived reward statistics for the customer dashboard.

use serde::{Deserialize, Serialize};

use crate::{accrual::REWARD_THRESHOLD, user::User};

/// The computed read model for a user: never stored, always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithStats {
  #[serde(flatten)]
  pub user:                   User,
  /// `current_reward_points >= 5`. False for every persisted user, since a
  /// completed cycle resets the counter.
  pub is_eligible_for_reward: bool,
  pub visits_until_reward:    u32,
  /// Reward notifications not yet claimed; the authoritative answer to "does
  /// this customer have a reward waiting".
  pub unclaimed_rewards:      u32,
}

/// Project a user's counters into dashboard statistics. Pure; performs no
/// I/O.
pub fn project_stats(user: User, unclaimed_rewards: u32) -> UserWithStats {
  let is_eligible_for_reward = user.current_reward_points >= REWARD_THRESHOLD;
  let visits_until_reward =
    REWARD_THRESHOLD.saturating_sub(user.current_reward_points);

  UserWithStats {
    user,
    is_eligible_for_reward,
    visits_until_reward,
    unclaimed_rewards,
  }
}
