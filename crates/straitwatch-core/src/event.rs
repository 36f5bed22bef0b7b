//! Event types — the two input streams of the correlation engine.
//!
//! Both event kinds are immutable once recorded. They are produced by
//! external extraction/classification collaborators (state-media analysis,
//! vessel telemetry, social-channel monitoring) and only ever read back by
//! the rolling correlation-window query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Geography ───────────────────────────────────────────────────────────────

/// A point in decimal degrees. Movement events either carry a full point or
/// no location at all; half-specified coordinates are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

// ─── Narrative events ────────────────────────────────────────────────────────

/// A detected cross-outlet messaging coordination signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeEvent {
  pub event_id:             Uuid,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:           DateTime<Utc>,
  /// Number of distinct outlets participating in the coordination.
  pub outlet_count:         u32,
  /// The repeated phrasing found across outlets, in detection order.
  pub synchronized_phrases: Vec<String>,
  /// Free-text region label from the extraction collaborator, if any.
  pub geographic_focus:     Option<String>,
  /// Short thematic labels (e.g. "military exercise", "reunification").
  pub themes:               Vec<String>,
  /// Extraction confidence, 0–100.
  pub confidence:           f64,
}

/// Input to [`crate::store::EventStore::record_narrative_event`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNarrativeEvent {
  pub outlet_count:         u32,
  #[serde(default)]
  pub synchronized_phrases: Vec<String>,
  pub geographic_focus:     Option<String>,
  #[serde(default)]
  pub themes:               Vec<String>,
  pub confidence:           f64,
}

// ─── Movement events ─────────────────────────────────────────────────────────

/// The fixed vocabulary of movement indicators the classification
/// collaborator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementCategory {
  Naval,
  Convoy,
  Flight,
  RestrictedZone,
}

/// A detected physical/military movement indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementEvent {
  pub event_id:   Uuid,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub category:   MovementCategory,
  /// Where the movement was observed, if the report carried coordinates.
  pub location:   Option<GeoPoint>,
  /// Classification confidence, 0–100.
  pub confidence: f64,
}

/// Input to [`crate::store::EventStore::record_movement_event`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovementEvent {
  pub category:   MovementCategory,
  pub location:   Option<GeoPoint>,
  pub confidence: f64,
}
