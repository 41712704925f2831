//! Wiring for the Punchcard HTTP server: configuration, adapter selection,
//! and the middleware stack around [`punchcard_api::api_router`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use punchcard_api::{ApiSettings, AppState};
use punchcard_core::locale::Locale;
use punchcard_store_sqlite::SqliteStore;
use punchcard_wallet::{LedgerNotifier, SimulatedPassProvider};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PUNCHCARD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                               String,
  #[serde(default = "default_port")]
  pub port:                               u16,
  #[serde(default = "default_store_path")]
  pub store_path:                         PathBuf,
  #[serde(default)]
  pub default_locale:                     Locale,
  #[serde(default)]
  pub abort_registration_on_pass_failure: bool,
  /// Artificial delay for the simulated wallet provider.
  #[serde(default)]
  pub pass_latency_ms:                    u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/punchcard/punchcard.db") }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PUNCHCARD").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      default_locale:                     self.default_locale,
      abort_registration_on_pass_failure: self.abort_registration_on_pass_failure,
    }
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// Build handler state around `store` with the simulated wallet provider and
/// the ledger-backed notifier.
pub fn build_state(
  store: Arc<SqliteStore>,
  config: &ServerConfig,
) -> AppState<SqliteStore> {
  AppState {
    store:    store.clone(),
    passes:   Arc::new(SimulatedPassProvider::new(Duration::from_millis(
      config.pass_latency_ms,
    ))),
    notifier: Arc::new(LedgerNotifier::new(store)),
    settings: Arc::new(config.api_settings()),
  }
}

/// The API router wrapped in request tracing.
pub fn app(state: AppState<SqliteStore>) -> Router {
  punchcard_api::api_router(state).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:3000");
    assert_eq!(cfg.default_locale, Locale::En);
    assert!(!cfg.abort_registration_on_pass_failure);
    assert_eq!(cfg.pass_latency_ms, 0);
  }

  #[test]
  fn toml_overrides_defaults() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 8080
        store_path = "/var/lib/punchcard.db"
        default_locale = "es"
        abort_registration_on_pass_failure = true
      "#,
    );
    assert_eq!(cfg.address(), "0.0.0.0:8080");
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/punchcard.db"));
    let settings = cfg.api_settings();
    assert_eq!(settings.default_locale, Locale::Es);
    assert!(settings.abort_registration_on_pass_failure);
  }

  #[test]
  fn tilde_is_expanded_only_at_start() {
    let plain = Path::new("/tmp/punchcard.db");
    assert_eq!(expand_tilde(plain), plain);
    let middle = Path::new("/tmp/~/punchcard.db");
    assert_eq!(expand_tilde(middle), middle);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/punchcard.db")),
        PathBuf::from(home).join("punchcard.db")
      );
    }
  }

  #[tokio::test]
  async fn traced_app_serves_health() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let state = build_state(store, &parse(""));
    let resp = app(state)
      .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
