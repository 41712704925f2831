//! Direct triggers for the outbound adapters, for operators and for
//! services that drive the wallet and messaging providers themselves.

use axum::{Json, extract::State};
use punchcard_core::{locale::Locale, store::LoyaltyStore};
use punchcard_wallet::{
  DispatchResponse, PassCreationRequest, PassResponse, PassUpdateRequest,
  RewardNotificationRequest,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, locale::AcceptLanguage};

/// `POST /integrations/pass-creation`
pub async fn pass_creation<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<PassCreationRequest>,
) -> Result<Json<PassResponse>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let res = state
    .passes
    .create_pass(body)
    .await
    .map_err(ApiError::from_wallet)?;
  Ok(Json(res))
}

/// `POST /integrations/pass-update`
pub async fn pass_update<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<PassUpdateRequest>,
) -> Result<Json<PassResponse>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let res = state
    .passes
    .update_pass(body)
    .await
    .map_err(ApiError::from_wallet)?;
  Ok(Json(res))
}

#[derive(Debug, Deserialize)]
pub struct RewardNotificationBody {
  pub user_id:      Uuid,
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
  pub total_visits: u32,
  #[serde(default)]
  pub locale:       Option<Locale>,
}

/// `POST /integrations/reward-notification`
pub async fn reward_notification<S>(
  State(state): State<AppState<S>>,
  accept: AcceptLanguage,
  Json(body): Json<RewardNotificationBody>,
) -> Result<Json<DispatchResponse>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let request = RewardNotificationRequest {
    user_id:      body.user_id,
    first_name:   body.first_name,
    last_name:    body.last_name,
    phone_number: body.phone_number,
    total_visits: body.total_visits,
    locale:       accept.resolve(body.locale, state.settings.default_locale),
  };
  let res = state
    .notifier
    .notify(request)
    .await
    .map_err(ApiError::from_wallet)?;
  Ok(Json(res))
}
