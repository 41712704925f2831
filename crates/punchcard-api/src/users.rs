//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Registers and requests a wallet pass; `201` |
//! | `GET`  | `/users/{id}` | 404 if not found |
//! | `GET`  | `/users/by-phone/{phone}` | Exact match; 404 if not found |
//! | `GET`  | `/users/{id}/stats` | Counters plus derived reward stats |
//! | `PUT`  | `/users/{id}/pass-serial` | Body: `{"pass_serial_number":"…"}` |
//! | `GET`  | `/users/{id}/visits` | Newest first |
//! | `GET`  | `/users/{id}/notifications` | Newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use punchcard_core::{
  Error as CoreError,
  reward::RewardNotification,
  stats::{UserWithStats, project_stats},
  store::LoyaltyStore,
  user::{NewUser, User},
  visit::Visit,
};
use punchcard_wallet::{PassCreationRequest, PassResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

async fn require_user<S: LoyaltyStore>(
  store: &S,
  id: Uuid,
) -> Result<User, ApiError> {
  store
    .get_user(id)
    .await
    .map_err(ApiError::classify)?
    .ok_or_else(|| ApiError::classify(CoreError::UserNotFound(id)))
}

/// Reject blank serials before they reach the store.
pub(crate) fn require_serial(serial: String) -> Result<String, ApiError> {
  let trimmed = serial.trim();
  if trimmed.is_empty() {
    return Err(ApiError::classify(CoreError::Validation(
      "pass serial number is required".into(),
    )));
  }
  Ok(trimmed.to_owned())
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Registration {
  pub user: User,
  /// The wallet provider's answer. The serial it reports is provisional
  /// until the pass-created webhook arrives.
  pub pass: PassResponse,
}

/// In abort mode a failed pass creation leaves a user without a pass. A
/// repeated registration with the same phone and name picks that user up
/// again instead of conflicting.
async fn resumable_registration<S: LoyaltyStore>(
  state: &AppState<S>,
  input: &NewUser,
) -> Result<Option<User>, ApiError> {
  if !state.settings.abort_registration_on_pass_failure {
    return Ok(None);
  }
  let existing = state
    .store
    .get_user_by_phone(input.phone_number())
    .await
    .map_err(ApiError::classify)?;
  Ok(existing.filter(|user| {
    user.pass_serial_number.is_none()
      && user.first_name == input.first_name()
      && user.last_name == input.last_name()
  }))
}

/// `POST /users` (body: `{"first_name","last_name","phone_number"}`)
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let input = NewUser::new(&body.first_name, &body.last_name, &body.phone_number)
    .map_err(ApiError::classify)?;
  let user = match resumable_registration(&state, &input).await? {
    Some(user) => {
      tracing::info!(user_id = %user.id, name = %user.full_name(), "resuming registration");
      user
    }
    None => {
      let user =
        state.store.create_user(input).await.map_err(ApiError::classify)?;
      tracing::info!(user_id = %user.id, name = %user.full_name(), "user registered");
      user
    }
  };

  let request = PassCreationRequest {
    user_id:      user.id,
    first_name:   user.first_name.clone(),
    last_name:    user.last_name.clone(),
    phone_number: user.phone_number.clone(),
  };
  let pass = match state.passes.create_pass(request).await {
    Ok(res) => res,
    Err(e) => PassResponse::rejected(e.to_string()),
  };

  if !pass.success {
    tracing::warn!(user_id = %user.id, message = %pass.message, "pass creation failed");
    if state.settings.abort_registration_on_pass_failure {
      return Err(ApiError::Upstream(pass.message));
    }
  }

  Ok((StatusCode::CREATED, Json(Registration { user, pass })))
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  Ok(Json(require_user(state.store.as_ref(), id).await?))
}

/// `GET /users/by-phone/{phone}`: the phone must be percent-encoded
/// (`+` as `%2B`).
pub async fn get_by_phone<S>(
  State(state): State<AppState<S>>,
  Path(phone): Path<String>,
) -> Result<Json<User>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let user = state
    .store
    .get_user_by_phone(&phone)
    .await
    .map_err(ApiError::classify)?
    .ok_or_else(|| ApiError::NotFound(format!("no user with phone number {phone}")))?;
  Ok(Json(user))
}

/// `GET /users/{id}/stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UserWithStats>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let user = require_user(state.store.as_ref(), id).await?;
  let unclaimed = state
    .store
    .count_unclaimed(id)
    .await
    .map_err(ApiError::classify)?;
  Ok(Json(project_stats(user, unclaimed)))
}

// ─── Pass serial ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PassSerialBody {
  pub pass_serial_number: String,
}

/// `PUT /users/{id}/pass-serial`
pub async fn set_pass_serial<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PassSerialBody>,
) -> Result<Json<User>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let user = state
    .store
    .set_pass_serial(id, require_serial(body.pass_serial_number)?)
    .await
    .map_err(ApiError::classify)?;
  Ok(Json(user))
}

// ─── History ─────────────────────────────────────────────────────────────────

/// `GET /users/{id}/visits`
pub async fn visits<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Visit>>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let visits = state.store.list_visits(id).await.map_err(ApiError::classify)?;
  Ok(Json(visits))
}

/// `GET /users/{id}/notifications`
pub async fn notifications<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<RewardNotification>>, ApiError>
where
  S: LoyaltyStore + 'static,
{
  let ledger = state
    .store
    .list_notifications(id)
    .await
    .map_err(ApiError::classify)?;
  Ok(Json(ledger))
}
