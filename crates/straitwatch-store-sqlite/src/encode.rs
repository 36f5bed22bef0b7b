//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields
//! (phrases, themes, sub-scores, correlation metadata) are stored as compact
//! JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use straitwatch_core::{
  alert::{Alert, CorrelationMetadata},
  event::{GeoPoint, MovementCategory, MovementEvent, NarrativeEvent},
  score::SubScores,
  threat::ThreatLevel,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── MovementCategory ────────────────────────────────────────────────────────

pub fn encode_category(c: MovementCategory) -> &'static str {
  match c {
    MovementCategory::Naval => "naval",
    MovementCategory::Convoy => "convoy",
    MovementCategory::Flight => "flight",
    MovementCategory::RestrictedZone => "restricted_zone",
  }
}

pub fn decode_category(s: &str) -> Result<MovementCategory> {
  match s {
    "naval" => Ok(MovementCategory::Naval),
    "convoy" => Ok(MovementCategory::Convoy),
    "flight" => Ok(MovementCategory::Flight),
    "restricted_zone" => Ok(MovementCategory::RestrictedZone),
    other => Err(Error::UnknownCategory(other.to_owned())),
  }
}

// ─── ThreatLevel ─────────────────────────────────────────────────────────────

pub fn encode_threat_level(level: ThreatLevel) -> &'static str {
  level.as_str()
}

pub fn decode_threat_level(s: &str) -> Result<ThreatLevel> {
  match s {
    "GREEN" => Ok(ThreatLevel::Green),
    "AMBER" => Ok(ThreatLevel::Amber),
    "RED" => Ok(ThreatLevel::Red),
    other => Err(Error::UnknownThreatLevel(other.to_owned())),
  }
}

// ─── String lists ────────────────────────────────────────────────────────────

pub fn encode_strings(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_strings(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_sub_scores(s: &SubScores) -> Result<String> {
  Ok(serde_json::to_string(s)?)
}

pub fn encode_metadata(m: &CorrelationMetadata) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `narrative_events` row.
pub struct RawNarrativeEvent {
  pub event_id:             String,
  pub created_at:           String,
  pub outlet_count:         i64,
  pub synchronized_phrases: String,
  pub geographic_focus:     Option<String>,
  pub themes:               String,
  pub confidence:           f64,
}

impl RawNarrativeEvent {
  pub fn into_event(self) -> Result<NarrativeEvent> {
    Ok(NarrativeEvent {
      event_id:             decode_uuid(&self.event_id)?,
      created_at:           decode_dt(&self.created_at)?,
      outlet_count:         self.outlet_count.max(0) as u32,
      synchronized_phrases: decode_strings(&self.synchronized_phrases)?,
      geographic_focus:     self.geographic_focus,
      themes:               decode_strings(&self.themes)?,
      confidence:           self.confidence,
    })
  }
}

/// Raw strings read directly from a `movement_events` row.
pub struct RawMovementEvent {
  pub event_id:     String,
  pub created_at:   String,
  pub category:     String,
  pub location_lat: Option<f64>,
  pub location_lon: Option<f64>,
  pub confidence:   f64,
}

impl RawMovementEvent {
  pub fn into_event(self) -> Result<MovementEvent> {
    let location = match (self.location_lat, self.location_lon) {
      (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
      _ => None,
    };
    Ok(MovementEvent {
      event_id:   decode_uuid(&self.event_id)?,
      created_at: decode_dt(&self.created_at)?,
      category:   decode_category(&self.category)?,
      location,
      confidence: self.confidence,
    })
  }
}

/// Raw strings read directly from an `alerts` row.
pub struct RawAlert {
  pub alert_id:             String,
  pub region:               String,
  pub threat_level:         String,
  pub threat_score:         f64,
  pub confidence:           i64,
  pub sub_scores:           String,
  pub correlation_metadata: String,
  pub updated_at:           String,
  pub resolved_at:          Option<String>,
  pub revision:             i64,
}

impl RawAlert {
  pub fn into_alert(self) -> Result<Alert> {
    Ok(Alert {
      alert_id:             decode_uuid(&self.alert_id)?,
      region:               self.region,
      threat_level:         decode_threat_level(&self.threat_level)?,
      threat_score:         self.threat_score,
      confidence:           self.confidence.clamp(0, u8::MAX.into()) as u8,
      sub_scores:           serde_json::from_str(&self.sub_scores)?,
      correlation_metadata: serde_json::from_str(&self.correlation_metadata)?,
      updated_at:           decode_dt(&self.updated_at)?,
      resolved_at:          self.resolved_at.as_deref().map(decode_dt).transpose()?,
      revision:             self.revision.max(0) as u64,
    })
  }
}
