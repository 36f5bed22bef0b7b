//! JSON REST API for Straitwatch.
//!
//! Exposes an axum [`Router`] backed by any
//! [`straitwatch_core::store::EventStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", straitwatch_api::api_router(ctx))
//! ```

pub mod alerts;
pub mod correlate;
pub mod error;
pub mod events;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use straitwatch_core::{engine::Engine, store::EventStore};

pub use error::ApiError;

/// Shared state threaded through all handlers: the store for ingest and
/// reads, and the engine for correlation passes over the same store.
pub struct ApiContext<S> {
  pub store:  Arc<S>,
  pub engine: Engine<S>,
}

/// Build a fully-materialised API router for `ctx`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(ctx: Arc<ApiContext<S>>) -> Router<()>
where
  S: EventStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Event ingest and reads
    .route(
      "/events/narrative",
      get(events::list_narrative::<S>).post(events::create_narrative::<S>),
    )
    .route(
      "/events/movement",
      get(events::list_movement::<S>).post(events::create_movement::<S>),
    )
    // Alerts
    .route("/alerts/active", get(alerts::get_active::<S>))
    // Correlation trigger
    .route("/correlate", post(correlate::run::<S>))
    .with_state(ctx)
}
