//! Handler for the `/correlate` trigger endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/correlate` | Runs one correlation pass; body is the pass outcome |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use straitwatch_core::store::EventStore;

use crate::ApiContext;

/// `POST /correlate` — run one correlation pass.
///
/// Empty-stream conditions and held escalations are successful outcomes and
/// serialise with their own `status`. Store failures come back as
/// `{"status":"error","error":..}` with HTTP 500; the next trigger simply
/// retries with fresh data.
pub async fn run<S>(State(ctx): State<Arc<ApiContext<S>>>) -> Response
where
  S: EventStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  match ctx.engine.run_pass().await {
    Ok(outcome) => Json(outcome).into_response(),
    Err(e) => {
      tracing::error!(error = %e, "correlation pass failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "error": e.to_string() })),
      )
        .into_response()
    }
  }
}
