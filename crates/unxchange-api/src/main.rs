//! unxchange-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `UNXCHANGE_*` environment variables, opens the SQLite store, and serves the
//! convocatorias API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use jsonwebtoken::Algorithm;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use unxchange_api::{
  AppState, ServerConfig,
  auth::AuthPolicy,
  notify::{DisabledNotifier, HttpNotifier, Notifier},
};
use unxchange_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "UnxChange convocatorias API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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
    .add_source(config::Environment::with_prefix("UNXCHANGE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let algorithm: Algorithm = server_cfg
    .jwt_algorithm
    .parse()
    .with_context(|| format!("unknown JWT algorithm {:?}", server_cfg.jwt_algorithm))?;
  let policy = AuthPolicy::new(&server_cfg.jwt_secret, algorithm)
    .context("invalid authorization settings")?;

  let notifier: Arc<dyn Notifier> = match server_cfg.notifications_url.as_deref() {
    Some(url) if !url.trim().is_empty() => {
      let timeout = Duration::from_secs(server_cfg.notification_timeout_secs);
      let notifier = HttpNotifier::new(url, timeout).context("failed to build notifier")?;
      tracing::info!(endpoint = notifier.endpoint(), "interest notifications enabled");
      Arc::new(notifier)
    }
    _ => {
      tracing::info!("no notifications_url configured; interest notifications disabled");
      Arc::new(DisabledNotifier)
    }
  };

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = ?store_path, "opened store");

  let state = AppState {
    store: Arc::new(store),
    auth: Arc::new(policy),
    notifier,
  };

  let app = unxchange_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
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
