//! Callbacks from the wallet-pass provider.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/webhooks/pass-created` | Stores the issued serial on the user |
//! | `POST` | `/webhooks/pass-scanned` | Accrues a visit at `scanned_at` |

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use punchcard_core::{
  Error as CoreError,
  store::LoyaltyStore,
  user::User,
  visit::ScanOutcome,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState, accrue::accrue, error::ApiError, locale::AcceptLanguage,
  users::require_serial,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassType {
  Apple,
  Google,
}

// ─── Pass created ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PassCreatedBody {
  pub user_id:            Uuid,
  pub pass_serial_number: String,
  pub pass_url:           String,
  pub pass_type:          PassType,
}

/// `POST /webhooks/pass-created`
pub async fn pass_created<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<PassCreatedBody>,
) -> Result<Json<User>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let serial = require_serial(body.pass_serial_number)?;
  let user = state
    .store
    .set_pass_serial(body.user_id, serial)
    .await
    .map_err(ApiError::classify)?;
  tracing::info!(
    user_id = %user.id,
    pass_serial_number = ?user.pass_serial_number,
    pass_type = ?body.pass_type,
    pass_url = %body.pass_url,
    "wallet pass issued"
  );
  Ok(Json(user))
}

// ─── Pass scanned ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PassScannedBody {
  pub pass_serial_number: String,
  /// RFC 3339, parsed by the handler.
  pub scanned_at:         String,
  #[serde(default)]
  pub location:           Option<String>,
}

/// `POST /webhooks/pass-scanned`
pub async fn pass_scanned<S>(
  State(state): State<AppState<S>>,
  accept: AcceptLanguage,
  Json(body): Json<PassScannedBody>,
) -> Result<Json<ScanOutcome>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let scanned_at = DateTime::parse_from_rfc3339(&body.scanned_at)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| {
      ApiError::classify(CoreError::Validation(format!(
        "invalid scanned_at {:?}: {e}",
        body.scanned_at
      )))
    })?;

  tracing::info!(
    pass_serial_number = %body.pass_serial_number,
    %scanned_at,
    location = body.location.as_deref().unwrap_or("unknown"),
    "pass scanned"
  );

  let locale = accept.resolve(None, state.settings.default_locale);
  let accrued =
    accrue(&state, body.pass_serial_number, Some(scanned_at), locale).await?;
  Ok(Json(ScanOutcome::from(&accrued.record)))
}
