//! HTTP layer for the client registry.
//!
//! Exposes an axum [`Router`] serving the phone-home endpoint backed by any
//! [`RegistryStore`].

pub mod error;
pub mod handlers;
pub mod identity;
pub mod policy;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use registry_core::store::RegistryStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{hit, robots};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings every command needs: where the SQLite database lives.
///
/// Deserialised from the same sources as [`ServerConfig`], which carries the
/// endpoint-only settings and is only required by `serve`.
#[derive(Deserialize, Clone, Debug)]
pub struct StoreConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `REGISTRY_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  /// Where unrecognised agents are redirected.
  pub upgrade_check_url: String,
  /// Quoted in the upgrade notice sent to outdated clients.
  pub download_page:     String,
  /// `User-Agent` prefix identifying the product family.
  #[serde(default = "default_agent_prefix")]
  pub agent_prefix:      String,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("registry.db") }

fn default_agent_prefix() -> String { "OMERO.".to_string() }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RegistryStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the registry.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RegistryStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/",           get(hit::handler::<S>).post(hit::handler::<S>))
    .route("/robots.txt", get(robots::handler))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
