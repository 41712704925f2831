//! The visit-accrual flow shared by `POST /visits` and the scan webhook:
//! persist the visit, then run the side effects the store leaves to its
//! caller.

use chrono::{DateTime, Utc};
use punchcard_core::{locale::Locale, store::LoyaltyStore, visit::VisitRecord};
use punchcard_wallet::{PassUpdateRequest, RewardNotificationRequest};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub(crate) struct Accrued {
  pub record:          VisitRecord,
  /// Ledger entry written when this visit completed a cycle.
  pub notification_id: Option<Uuid>,
}

pub(crate) async fn accrue<S>(
  state: &AppState<S>,
  pass_serial_number: String,
  visited_at: Option<DateTime<Utc>>,
  locale: Locale,
) -> Result<Accrued, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let record = state
    .store
    .record_visit(pass_serial_number, visited_at)
    .await
    .map_err(ApiError::classify)?;

  tracing::info!(
    user_id = %record.user.id,
    visit_id = %record.visit.id,
    total_visits = record.user.total_visits,
    current_reward_points = record.user.current_reward_points,
    reward_triggered = record.reward_triggered,
    "visit recorded"
  );

  // The visit is committed at this point; nothing below may undo it.
  let notification_id = if record.reward_triggered {
    notify_reward(state, &record, locale).await
  } else {
    None
  };
  sync_pass(state, &record).await;

  Ok(Accrued { record, notification_id })
}

async fn notify_reward<S>(
  state: &AppState<S>,
  record: &VisitRecord,
  locale: Locale,
) -> Option<Uuid> {
  let user = &record.user;
  let request = RewardNotificationRequest {
    user_id: user.id,
    first_name: user.first_name.clone(),
    last_name: user.last_name.clone(),
    phone_number: user.phone_number.clone(),
    total_visits: user.total_visits,
    locale,
  };

  match state.notifier.notify(request).await {
    Ok(res) if res.success => {
      tracing::info!(
        user_id = %user.id,
        notification_id = ?res.notification_id,
        "reward earned"
      );
      res.notification_id
    }
    Ok(res) => {
      tracing::warn!(user_id = %user.id, message = %res.message, "reward notification rejected");
      None
    }
    Err(e) => {
      tracing::error!(user_id = %user.id, error = %e, "reward notification failed");
      None
    }
  }
}

/// Push the new counters to the customer's wallet pass. Best effort.
async fn sync_pass<S>(state: &AppState<S>, record: &VisitRecord) {
  let request = PassUpdateRequest {
    pass_serial_number: record.visit.pass_serial_number.clone(),
    reward_points:      record.user.current_reward_points,
    total_visits:       record.user.total_visits,
  };

  match state.passes.update_pass(request).await {
    Ok(res) if res.success => {}
    Ok(res) => tracing::warn!(
      pass_serial_number = %record.visit.pass_serial_number,
      message = %res.message,
      "pass update rejected"
    ),
    Err(e) => tracing::warn!(
      pass_serial_number = %record.visit.pass_serial_number,
      error = %e,
      "pass update failed"
    ),
  }
}
