//! Reward alerts (SMS / push) and the ledger entry that goes with them.

use std::sync::Arc;

use punchcard_core::{locale::Locale, store::LoyaltyStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Messages ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardNotificationRequest {
  pub user_id:      Uuid,
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
  pub total_visits: u32,
  /// Language of the customer-facing message.
  #[serde(default)]
  pub locale:       Locale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
  pub success: bool,
  pub message: String,
  /// The ledger entry written for this alert.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notification_id: Option<Uuid>,
}

// ─── Port ────────────────────────────────────────────────────────────────────

/// Sends "you earned a reward" alerts. Implementations also record the
/// reward in the notification ledger, so one dispatch means one claimable
/// reward.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait RewardNotifier: Send + Sync {
  async fn notify(
    &self,
    request: RewardNotificationRequest,
  ) -> Result<DispatchResponse>;
}

/// The customer-facing alert text.
pub fn render_message(first_name: &str, total_visits: u32, locale: Locale) -> String {
  match locale {
    Locale::En => format!(
      "Congratulations {first_name}! You've reached {total_visits} visits and \
       earned a free reward. Show your pass on your next visit to claim it."
    ),
    Locale::Es => format!(
      "¡Felicidades {first_name}! Llegaste a {total_visits} visitas y ganaste \
       una recompensa gratis. Muestra tu pase en tu próxima visita para \
       reclamarla."
    ),
  }
}

// ─── Ledger-backed notifier ──────────────────────────────────────────────────

/// Writes the reward ledger entry and delivers the alert to the log in place
/// of an SMS gateway.
pub struct LedgerNotifier<S> {
  store: Arc<S>,
}

impl<S> LedgerNotifier<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

#[async_trait::async_trait]
impl<S> RewardNotifier for LedgerNotifier<S>
where
  S: LoyaltyStore + 'static,
{
  async fn notify(
    &self,
    request: RewardNotificationRequest,
  ) -> Result<DispatchResponse> {
    let notification = self
      .store
      .create_notification(request.user_id)
      .await
      .map_err(Error::store)?;

    let text =
      render_message(&request.first_name, request.total_visits, request.locale);
    tracing::info!(
      user_id = %request.user_id,
      notification_id = %notification.id,
      phone_number = %request.phone_number,
      locale = %request.locale,
      message = %text,
      "reward notification dispatched"
    );

    Ok(DispatchResponse {
      success:         true,
      message:         format!(
        "Reward notification sent successfully for user {}",
        request.user_id
      ),
      notification_id: Some(notification.id),
    })
  }
}

#[cfg(test)]
mod tests {
  use punchcard_core::{ErrorKind, Classify as _, user::NewUser};
  use punchcard_store_sqlite::SqliteStore;

  use super::*;

  async fn notifier() -> (Arc<SqliteStore>, LedgerNotifier<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    (store.clone(), LedgerNotifier::new(store))
  }

  fn request(user_id: Uuid, locale: Locale) -> RewardNotificationRequest {
    RewardNotificationRequest {
      user_id,
      first_name: "Jane".into(),
      last_name: "Smith".into(),
      phone_number: "+1987654321".into(),
      total_visits: 10,
      locale,
    }
  }

  #[tokio::test]
  async fn notify_records_unclaimed_reward() {
    let (store, notifier) = notifier().await;
    let user = store
      .create_user(NewUser::new("Jane", "Smith", "+1987654321").unwrap())
      .await
      .unwrap();

    let res = notifier.notify(request(user.id, Locale::En)).await.unwrap();
    assert!(res.success);
    assert_eq!(
      res.message,
      format!("Reward notification sent successfully for user {}", user.id)
    );

    let ledger = store.list_notifications(user.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(Some(ledger[0].id), res.notification_id);
    assert!(!ledger[0].reward_claimed);
  }

  #[tokio::test]
  async fn repeated_notifications_accumulate() {
    let (store, notifier) = notifier().await;
    let user = store
      .create_user(NewUser::new("Jane", "Smith", "+1987654321").unwrap())
      .await
      .unwrap();

    notifier.notify(request(user.id, Locale::En)).await.unwrap();
    notifier.notify(request(user.id, Locale::Es)).await.unwrap();
    assert_eq!(store.count_unclaimed(user.id).await.unwrap(), 2);
  }

  #[tokio::test]
  async fn notify_for_missing_user_fails() {
    let (_store, notifier) = notifier().await;
    let err = notifier
      .notify(request(Uuid::new_v4(), Locale::En))
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForeignKey);
  }

  #[test]
  fn message_is_rendered_per_locale() {
    let en = render_message("Ana", 5, Locale::En);
    let es = render_message("Ana", 5, Locale::Es);
    assert!(en.starts_with("Congratulations Ana!"));
    assert!(es.starts_with("¡Felicidades Ana!"));
    assert!(es.contains("5 visitas"));
  }

  #[test]
  fn request_locale_defaults_to_english() {
    let req: RewardNotificationRequest = serde_json::from_value(
      serde_json::json!({
        "user_id": Uuid::nil(),
        "first_name": "A",
        "last_name": "B",
        "phone_number": "+1",
        "total_visits": 5
      }),
    )
    .unwrap();
    assert_eq!(req.locale, Locale::En);
  }
}
