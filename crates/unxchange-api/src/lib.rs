//! JSON REST API for UnxChange convocatorias.
//!
//! Exposes an axum [`Router`] backed by any
//! [`unxchange_core::store::ConvocatoriaStore`]. Every route except `GET /`
//! declares a guard extractor from [`auth`]; a route without one does not
//! compile against a handler that needs an identity.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod notify;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use unxchange_core::store::ConvocatoriaStore;

use auth::AuthPolicy;
use handlers::{convocatorias, interest, stats};
use notify::Notifier;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `UNXCHANGE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                      String,
  #[serde(default = "default_port")]
  pub port:                      u16,
  #[serde(default = "default_store_path")]
  pub store_path:                PathBuf,
  pub jwt_secret:                String,
  #[serde(default = "default_jwt_algorithm")]
  pub jwt_algorithm:             String,
  #[serde(default)]
  pub notifications_url:         Option<String>,
  #[serde(default = "default_notification_timeout")]
  pub notification_timeout_secs: u64,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8008 }
fn default_store_path() -> PathBuf { PathBuf::from("convocatorias.db") }
fn default_jwt_algorithm() -> String { "HS256".to_string() }
fn default_notification_timeout() -> u64 { 30 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ConvocatoriaStore> {
  pub store:    Arc<S>,
  pub auth:     Arc<AuthPolicy>,
  pub notifier: Arc<dyn Notifier>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(handlers::root))
    .route(
      "/convocatorias",
      get(convocatorias::list::<S>).post(convocatorias::create::<S>),
    )
    .route("/convocatorias/stats", get(stats::get::<S>))
    .route(
      "/convocatorias/{id}",
      get(convocatorias::get_one::<S>)
        .patch(convocatorias::update::<S>)
        .delete(convocatorias::delete::<S>),
    )
    .route(
      "/convocatorias/{id}/interest",
      post(interest::register::<S>).delete(interest::withdraw::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
