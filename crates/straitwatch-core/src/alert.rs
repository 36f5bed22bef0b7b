//! Alert types — the single persisted, mutable, per-region assessment.
//!
//! Exactly one unresolved alert exists per region at any time. The alert
//! row is only ever updated in place: every accepted update appends one
//! entry to the detection history and may raise the threat level but never
//! lower it. Resolution is handled outside the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{score::SubScores, threat::ThreatLevel};

// ─── Detection history ───────────────────────────────────────────────────────

/// One scoring pass that touched the alert while it was active. Entries are
/// append-only: never truncated, never reordered, never deleted while the
/// alert remains unresolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEntry {
  pub detected_at: DateTime<Utc>,
  pub score:       f64,
  pub level:       ThreatLevel,
}

/// The correlation evidence attached to an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMetadata {
  pub narrative_event_ids: Vec<Uuid>,
  pub movement_event_ids:  Vec<Uuid>,
  pub evidence_summary:    String,
  pub detection_history:   Vec<DetectionEntry>,
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// The persisted per-region threat assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
  pub alert_id:             Uuid,
  pub region:               String,
  pub threat_level:         ThreatLevel,
  pub threat_score:         f64,
  pub confidence:           u8,
  pub sub_scores:           SubScores,
  pub correlation_metadata: CorrelationMetadata,
  pub updated_at:           DateTime<Utc>,
  /// Set by an external operator action; the engine never resolves alerts,
  /// and only considers rows where this is absent.
  pub resolved_at:          Option<DateTime<Utc>>,
  /// Optimistic-concurrency counter, bumped by the store on every accepted
  /// update. Guards the read-modify-write upsert against concurrent passes.
  pub revision:             u64,
}

/// Input to [`crate::store::EventStore::insert_alert`]. The store assigns
/// `alert_id`, `updated_at`, and the initial revision.
#[derive(Debug, Clone)]
pub struct NewAlert {
  pub region:               String,
  pub threat_level:         ThreatLevel,
  pub threat_score:         f64,
  pub confidence:           u8,
  pub sub_scores:           SubScores,
  pub correlation_metadata: CorrelationMetadata,
}

/// The fields rewritten by an accepted escalation update. The metadata
/// carries the full detection history including the newly appended entry;
/// the store replaces the column wholesale.
#[derive(Debug, Clone)]
pub struct AlertUpdate {
  pub threat_level:         ThreatLevel,
  pub threat_score:         f64,
  pub confidence:           u8,
  pub sub_scores:           SubScores,
  pub correlation_metadata: CorrelationMetadata,
}
