//! Error types for `straitwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An engine configuration that fails [`crate::score::ScoringPolicy`]
  /// validation, e.g. weights that do not sum to one.
  #[error("invalid engine configuration: {0}")]
  InvalidConfig(String),

  /// A fetch or write against the backing [`crate::store::EventStore`]
  /// failed. The pass that hit it is abandoned; the next scheduled pass
  /// retries with fresh data.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
