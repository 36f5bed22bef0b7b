//! Error type for `straitwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] straitwatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown movement category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown threat level: {0:?}")]
  UnknownThreatLevel(String),

  /// The guarded alert update matched no row: the alert is gone or another
  /// pass got there first. The caller retries with fresh data.
  #[error("alert {0} missing or modified concurrently")]
  AlertConflict(uuid::Uuid),

  /// Insert would violate the one-active-alert-per-region invariant.
  #[error("an unresolved alert already exists for region {0:?}")]
  ActiveAlertExists(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
