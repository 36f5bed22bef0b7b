//! Handlers for `/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events/narrative` | Optional `?window_hours=` (default 72) |
//! | `POST` | `/events/narrative` | Body: [`NewNarrativeEvent`]; returns 201 |
//! | `GET`  | `/events/movement` | Optional `?window_hours=` (default 72) |
//! | `POST` | `/events/movement` | Body: [`NewMovementEvent`]; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use straitwatch_core::{
  event::{MovementEvent, NarrativeEvent, NewMovementEvent, NewNarrativeEvent},
  store::EventStore,
};

use crate::{ApiContext, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct WindowParams {
  /// Lookback window in hours. Defaults to the engine's rolling window.
  pub window_hours: Option<u32>,
}

impl WindowParams {
  fn resolve<S: EventStore>(&self, ctx: &ApiContext<S>) -> u32 {
    self
      .window_hours
      .unwrap_or(ctx.engine.config().window_hours)
  }
}

// ─── Narrative events ────────────────────────────────────────────────────────

/// `GET /events/narrative[?window_hours=<h>]`
pub async fn list_narrative<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<Vec<NarrativeEvent>>, ApiError>
where
  S: EventStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let events = ctx
    .store
    .fetch_narrative_events(params.resolve(&ctx))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(events))
}

/// `POST /events/narrative` — returns 201 + the stored event.
pub async fn create_narrative<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Json(body): Json<NewNarrativeEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.outlet_count == 0 {
    return Err(ApiError::BadRequest(
      "outlet_count must be positive".into(),
    ));
  }

  let event = ctx
    .store
    .record_narrative_event(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Movement events ─────────────────────────────────────────────────────────

/// `GET /events/movement[?window_hours=<h>]`
pub async fn list_movement<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Query(params): Query<WindowParams>,
) -> Result<Json<Vec<MovementEvent>>, ApiError>
where
  S: EventStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let events = ctx
    .store
    .fetch_movement_events(params.resolve(&ctx))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(events))
}

/// `POST /events/movement` — returns 201 + the stored event.
pub async fn create_movement<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Json(body): Json<NewMovementEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let event = ctx
    .store
    .record_movement_event(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(event)))
}
