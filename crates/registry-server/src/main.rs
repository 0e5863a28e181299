//! Registry server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the phone-home endpoint over HTTP. The remaining
//! subcommands manage the reference data the endpoint reads.
//!
//! # Seeding
//!
//! ```text
//! registry set-version 5.1.2
//! registry add-agent OMERO.insight --display-name "OMERO.insight"
//! registry serve
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use registry_core::store::RegistryStore;
use registry_server::{AppState, ServerConfig, StoreConfig};
use registry_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Client registry phone-home server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the phone-home endpoint (the default).
  Serve,
  /// Set the canonical version clients are compared against.
  SetVersion { version: String },
  /// Register a client agent so its hits are accepted.
  AddAgent {
    agent_name: String,
    /// Human-readable name; defaults to the agent name.
    #[arg(long)]
    display_name: Option<String>,
  },
  /// List registered agents.
  Agents,
  /// Print the most recent hits as JSON lines.
  Hits {
    #[arg(short, long, default_value_t = 20)]
    limit: usize,
  },
  /// Print the total number of recorded hits.
  Count,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("REGISTRY"))
    .build()
    .context("failed to read config file")?;

  let store_cfg: StoreConfig = settings
    .clone()
    .try_deserialize()
    .context("failed to deserialise StoreConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&store_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => {
      // Endpoint settings are only required when serving.
      let server_cfg: ServerConfig = settings
        .try_deserialize()
        .context("failed to deserialise ServerConfig")?;
      serve(store, server_cfg).await
    }
    Command::SetVersion { version } => {
      store
        .set_current_version(&version)
        .await
        .context("failed to set version")?;
      tracing::info!(%version, "canonical version updated");
      Ok(())
    }
    Command::AddAgent { agent_name, display_name } => {
      let display = display_name.as_deref().unwrap_or(&agent_name);
      let agent = store
        .add_agent(&agent_name, display)
        .await
        .with_context(|| format!("failed to add agent {agent_name:?}"))?;
      println!("{}\t{}\t{}", agent.agent_id, agent.agent_name, agent.display_name);
      Ok(())
    }
    Command::Agents => {
      for agent in store.list_agents().await.context("failed to list agents")? {
        println!("{}\t{}\t{}", agent.agent_id, agent.agent_name, agent.display_name);
      }
      Ok(())
    }
    Command::Hits { limit } => {
      for hit in store.recent_hits(limit).await.context("failed to read hits")? {
        println!("{}", serde_json::to_string(&hit)?);
      }
      Ok(())
    }
    Command::Count => {
      println!("{}", store.count_hits().await.context("failed to count hits")?);
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = registry_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Peer addresses back the client-address fallback.
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
