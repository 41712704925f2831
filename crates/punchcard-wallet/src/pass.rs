//! Wallet pass issuance and updates.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

// ─── Messages ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCreationRequest {
  pub user_id:      Uuid,
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassUpdateRequest {
  pub pass_serial_number: String,
  pub reward_points:      u32,
  pub total_visits:       u32,
}

/// The provider's answer. A rejected request is `success: false`, not an
/// `Err`; errors are reserved for transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassResponse {
  pub success:            bool,
  pub message:            String,
  /// Only set by a successful pass creation.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pass_serial_number: Option<String>,
}

impl PassResponse {
  pub fn rejected(message: impl Into<String>) -> Self {
    Self { success: false, message: message.into(), pass_serial_number: None }
  }
}

// ─── Port ────────────────────────────────────────────────────────────────────

/// A wallet-pass provider (Apple Wallet, Google Wallet, or an aggregator).
///
/// Pass creation is asynchronous on the provider side: the serial reported
/// here is provisional, and the authoritative serial arrives later through
/// the pass-created webhook.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait PassProvider: Send + Sync {
  async fn create_pass(&self, request: PassCreationRequest)
  -> Result<PassResponse>;

  /// Push new counters to an issued pass so the wallet display stays in
  /// sync.
  async fn update_pass(&self, request: PassUpdateRequest) -> Result<PassResponse>;
}

// ─── Simulated provider ──────────────────────────────────────────────────────

/// Issues serials locally and logs updates instead of calling a provider.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPassProvider {
  latency: Duration,
}

impl SimulatedPassProvider {
  /// `latency` is awaited before each answer to mimic a network round trip.
  pub fn new(latency: Duration) -> Self { Self { latency } }

  async fn round_trip(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }
}

/// `PASS-<unix millis>-<6 uppercase alphanumerics>`.
pub fn generate_serial() -> String {
  let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
  format!(
    "PASS-{}-{}",
    Utc::now().timestamp_millis(),
    suffix.to_ascii_uppercase()
  )
}

#[async_trait::async_trait]
impl PassProvider for SimulatedPassProvider {
  async fn create_pass(
    &self,
    request: PassCreationRequest,
  ) -> Result<PassResponse> {
    if request.first_name.trim().is_empty()
      || request.last_name.trim().is_empty()
      || request.phone_number.trim().is_empty()
    {
      return Ok(PassResponse::rejected(
        "missing required fields: first_name, last_name, and phone_number \
         are required",
      ));
    }
    if request.user_id.is_nil() {
      return Ok(PassResponse::rejected("invalid user id"));
    }

    self.round_trip().await;

    let serial = generate_serial();
    tracing::info!(
      user_id = %request.user_id,
      pass_serial_number = %serial,
      "simulated pass creation"
    );

    Ok(PassResponse {
      success:            true,
      message:            "pass creation triggered successfully".into(),
      pass_serial_number: Some(serial),
    })
  }

  async fn update_pass(&self, request: PassUpdateRequest) -> Result<PassResponse> {
    if request.pass_serial_number.trim().is_empty() {
      return Ok(PassResponse::rejected("pass serial number is required"));
    }

    self.round_trip().await;

    tracing::info!(
      pass_serial_number = %request.pass_serial_number,
      reward_points = request.reward_points,
      total_visits = request.total_visits,
      "simulated pass update"
    );

    Ok(PassResponse {
      success:            true,
      message:            format!(
        "Pass {} updated successfully",
        request.pass_serial_number
      ),
      pass_serial_number: None,
    })
  }
}
