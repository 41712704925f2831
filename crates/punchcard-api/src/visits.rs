//! `POST /visits`: accrue one visit for the holder of a pass serial.

use axum::{Json, extract::State};
use punchcard_core::{locale::Locale, store::LoyaltyStore, visit::VisitRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, accrue::accrue, error::ApiError, locale::AcceptLanguage};

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub pass_serial_number: String,
  /// Language for the reward message if this visit completes a cycle.
  #[serde(default)]
  pub locale:             Option<Locale>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisitResponse {
  #[serde(flatten)]
  pub record:          VisitRecord,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notification_id: Option<Uuid>,
}

/// `POST /visits` (body: `{"pass_serial_number":"…"}`)
pub async fn record<S>(
  State(state): State<AppState<S>>,
  accept: AcceptLanguage,
  Json(body): Json<RecordBody>,
) -> Result<Json<VisitResponse>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let locale = accept.resolve(body.locale, state.settings.default_locale);
  let accrued = accrue(&state, body.pass_serial_number, None, locale).await?;
  Ok(Json(VisitResponse {
    record:          accrued.record,
    notification_id: accrued.notification_id,
  }))
}
