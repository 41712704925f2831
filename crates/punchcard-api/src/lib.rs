//! JSON REST API for Punchcard.
//!
//! Exposes an axum [`Router`] backed by any
//! [`punchcard_core::store::LoyaltyStore`] plus the wallet and messaging
//! ports from `punchcard-wallet`. Tracing middleware, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = punchcard_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod error;
pub mod integrations;
pub mod locale;
pub mod notifications;
pub mod users;
pub mod visits;
pub mod webhooks;

mod accrue;


use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use punchcard_core::{locale::Locale, store::LoyaltyStore};
use punchcard_wallet::{PassProvider, RewardNotifier};
use serde::{Deserialize, Serialize};

pub use error::ApiError;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Behavioural switches read from the server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSettings {
  /// Used when neither the request body nor `Accept-Language` names a
  /// supported language.
  #[serde(default)]
  pub default_locale:                     Locale,
  /// Fail `POST /users` with `502` when the wallet provider cannot issue a
  /// pass. The user row is kept either way.
  #[serde(default)]
  pub abort_registration_on_pass_failure: bool,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub passes:   Arc<dyn PassProvider>,
  pub notifier: Arc<dyn RewardNotifier>,
  pub settings: Arc<ApiSettings>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      passes:   self.passes.clone(),
      notifier: self.notifier.clone(),
      settings: self.settings.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: LoyaltyStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Users
    .route("/users", post(users::register::<S>))
    .route("/users/by-phone/{phone}", get(users::get_by_phone::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    .route("/users/{id}/stats", get(users::stats::<S>))
    .route("/users/{id}/pass-serial", put(users::set_pass_serial::<S>))
    .route("/users/{id}/visits", get(users::visits::<S>))
    .route("/users/{id}/notifications", get(users::notifications::<S>))
    // Visits
    .route("/visits", post(visits::record::<S>))
    // Reward ledger
    .route("/notifications", post(notifications::create::<S>))
    .route("/notifications/{id}", get(notifications::get_one::<S>))
    .route("/notifications/{id}/claim", post(notifications::claim::<S>))
    // Wallet provider callbacks
    .route("/webhooks/pass-created", post(webhooks::pass_created::<S>))
    .route("/webhooks/pass-scanned", post(webhooks::pass_scanned::<S>))
    // Direct adapter triggers
    .route("/integrations/pass-creation", post(integrations::pass_creation::<S>))
    .route("/integrations/pass-update", post(integrations::pass_update::<S>))
    .route(
      "/integrations/reward-notification",
      post(integrations::reward_notification::<S>),
    )
    .with_state(state)
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
  pub status:    String,
  pub timestamp: DateTime<Utc>,
}

/// `GET /health`
pub async fn health() -> Json<Health> {
  Json(Health { status: "ok".into(), timestamp: Utc::now() })
}
