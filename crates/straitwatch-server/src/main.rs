//! straitwatch server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the correlation API over HTTP.
//! Optionally runs correlation passes on a fixed interval so alerts keep
//! up with ingested events without an external trigger.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::{Json, Router, routing::get};
use clap::Parser;
use serde::Deserialize;
use straitwatch_api::ApiContext;
use straitwatch_core::engine::{Engine, EngineConfig};
use straitwatch_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Straitwatch correlation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `STRAITWATCH_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:               String,
  #[serde(default = "default_port")]
  port:               u16,
  #[serde(default = "default_store_path")]
  store_path:         PathBuf,
  /// Region, scoring policy, and window overrides.
  #[serde(default)]
  engine:             EngineConfig,
  /// If set, run a correlation pass every this many seconds.
  pass_interval_secs: Option<u64>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("straitwatch.db") }

// ─── Entry point ─────────────────────────────────────────────────────────────

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
    .add_source(config::Environment::with_prefix("STRAITWATCH"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Build the engine; rejects invalid scoring policies up front.
  let engine = Engine::new(store.clone(), server_cfg.engine.clone())
    .context("invalid engine configuration")?;

  // Optional scheduler: trigger passes on a fixed interval. Passes run
  // serially inside this one task, which is what the upsert protocol
  // expects; a failed pass just waits for the next tick.
  if let Some(secs) = server_cfg.pass_interval_secs {
    let scheduled = engine.clone();
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(Duration::from_secs(secs));
      loop {
        ticker.tick().await;
        if let Err(e) = scheduled.run_pass().await {
          tracing::error!(error = %e, "scheduled correlation pass failed");
        }
      }
    });
    tracing::info!(interval_secs = secs, "correlation scheduler started");
  }

  let ctx = Arc::new(ApiContext { store, engine });
  let app = Router::new()
    .route("/health", get(health))
    .nest("/api", straitwatch_api::api_router(ctx))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "status": "ok", "service": "straitwatch" }))
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
