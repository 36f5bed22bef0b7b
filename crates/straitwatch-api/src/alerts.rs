//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts/active` | Optional `?region=`; defaults to the engine's region |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use straitwatch_core::{alert::Alert, store::EventStore};

use crate::{ApiContext, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ActiveParams {
  pub region: Option<String>,
}

/// `GET /alerts/active[?region=<name>]` — 404 when no unresolved alert
/// exists for the region.
pub async fn get_active<S>(
  State(ctx): State<Arc<ApiContext<S>>>,
  Query(params): Query<ActiveParams>,
) -> Result<Json<Alert>, ApiError>
where
  S: EventStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let region = params
    .region
    .as_deref()
    .unwrap_or(&ctx.engine.config().region.name);

  let alert = ctx
    .store
    .fetch_active_alert(region)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no active alert for region {region:?}"))
    })?;
  Ok(Json(alert))
}
