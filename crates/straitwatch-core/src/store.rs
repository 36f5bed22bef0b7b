//! The `EventStore` trait — the engine's only I/O boundary.
//!
//! The trait is implemented by storage backends (e.g.
//! `straitwatch-store-sqlite`). The engine and the HTTP layer depend on
//! this abstraction, not on any concrete backend, which also allows
//! isolated engine tests against an in-memory fake.

use std::future::Future;

use uuid::Uuid;

use crate::{
  alert::{Alert, AlertUpdate, NewAlert},
  event::{MovementEvent, NarrativeEvent, NewMovementEvent, NewNarrativeEvent},
};

/// Abstraction over the Straitwatch event and alert store.
///
/// Event writes are append-only; events are never mutated after recording.
/// The single mutable row per region is the active alert, and its update
/// path is guarded by an explicit revision check so concurrent correlation
/// passes cannot interleave the read-modify-write.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Event ingest ──────────────────────────────────────────────────────

  /// Record a narrative coordination event. `created_at` is set by the
  /// store.
  fn record_narrative_event(
    &self,
    input: NewNarrativeEvent,
  ) -> impl Future<Output = Result<NarrativeEvent, Self::Error>> + Send + '_;

  /// Record a movement indicator event. `created_at` is set by the store.
  fn record_movement_event(
    &self,
    input: NewMovementEvent,
  ) -> impl Future<Output = Result<MovementEvent, Self::Error>> + Send + '_;

  // ── Correlation-window reads ──────────────────────────────────────────

  /// Narrative events with `created_at >= now − window_hours`, newest
  /// first. Rows the backend cannot decode are skipped, not fatal.
  fn fetch_narrative_events(
    &self,
    window_hours: u32,
  ) -> impl Future<Output = Result<Vec<NarrativeEvent>, Self::Error>> + Send + '_;

  /// Movement events with `created_at >= now − window_hours`, newest
  /// first. Rows the backend cannot decode are skipped, not fatal.
  fn fetch_movement_events(
    &self,
    window_hours: u32,
  ) -> impl Future<Output = Result<Vec<MovementEvent>, Self::Error>> + Send + '_;

  // ── Alerts ────────────────────────────────────────────────────────────

  /// The single unresolved alert for `region`, if one exists.
  fn fetch_active_alert<'a>(
    &'a self,
    region: &'a str,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + 'a;

  /// Insert a brand-new alert. Fails if an unresolved alert already exists
  /// for the region (one-active-alert invariant).
  fn insert_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  /// Apply an accepted escalation update to an existing alert.
  ///
  /// The write must only succeed if the stored revision still equals
  /// `expected_revision`; otherwise the backend returns a conflict error
  /// and leaves the row untouched.
  fn update_alert(
    &self,
    alert_id: Uuid,
    expected_revision: u64,
    update: AlertUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
