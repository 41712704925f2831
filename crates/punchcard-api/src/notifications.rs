//! Handlers for the reward notification ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/notifications` | Body: `{"user_id":"…"}`; `201`, 422 for unknown user |
//! | `GET`  | `/notifications/{id}` | 404 if not found |
//! | `POST` | `/notifications/{id}/claim` | Re-claiming refreshes `reward_claimed_at` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use punchcard_core::{
  Error as CoreError, reward::RewardNotification, store::LoyaltyStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub user_id: Uuid,
}

/// `POST /notifications`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let notification = state
    .store
    .create_notification(body.user_id)
    .await
    .map_err(ApiError::classify)?;
  tracing::info!(
    user_id = %body.user_id,
    notification_id = %notification.id,
    "reward notification recorded"
  );
  Ok((StatusCode::CREATED, Json(notification)))
}

/// `GET /notifications/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RewardNotification>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let notification = state
    .store
    .get_notification(id)
    .await
    .map_err(ApiError::classify)?
    .ok_or_else(|| ApiError::classify(CoreError::NotificationNotFound(id)))?;
  Ok(Json(notification))
}

/// `POST /notifications/{id}/claim`
pub async fn claim<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RewardNotification>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let notification = state
    .store
    .claim_reward(id)
    .await
    .map_err(ApiError::classify)?;
  tracing::info!(
    user_id = %notification.user_id,
    notification_id = %id,
    "reward claimed"
  );
  Ok(Json(notification))
}
