//! The correlation pass orchestrator.
//!
//! One pass: fetch both event streams for the rolling window → match them
//! by time → score every matched pair → keep the single highest-scoring
//! pair → classify it → upsert the regional alert under the monotonic
//! escalation rule. Only that one best candidate ever reaches persistence;
//! the rest exist for diagnostics only.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  alert::{AlertUpdate, CorrelationMetadata, DetectionEntry, NewAlert},
  error::{Error, Result},
  matcher::{MatchedPair, match_by_window},
  region::Region,
  score::{ScoringPolicy, SubScores, evidence_summary},
  store::EventStore,
  threat::ThreatLevel,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Tunable engine parameters, deserialisable from server configuration.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub region:       Region,
  pub policy:       ScoringPolicy,
  /// Rolling fetch-and-match window, in hours.
  pub window_hours: u32,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      region:       Region::taiwan_strait(),
      policy:       ScoringPolicy::default(),
      window_hours: 72,
    }
  }
}

// ─── Correlation result ──────────────────────────────────────────────────────

/// One candidate correlation, computed per pass and discarded unless it is
/// the highest-scoring pair.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationResult {
  pub narrative_event_ids: Vec<Uuid>,
  pub movement_event_ids:  Vec<Uuid>,
  pub composite_score:     f64,
  pub sub_scores:          SubScores,
  pub geo_match:           bool,
  pub region:              String,
  pub evidence_summary:    String,
  pub detected_at:         chrono::DateTime<Utc>,
}

impl CorrelationResult {
  /// Score one matched pair against the region and policy.
  ///
  /// Geographic correlation requires both streams to corroborate
  /// independently: the narrative text must name the region AND at least
  /// one matched movement must carry coordinates inside its bounding box.
  fn evaluate(
    pair: &MatchedPair<'_>,
    region: &Region,
    policy: &ScoringPolicy,
    detected_at: chrono::DateTime<Utc>,
  ) -> Self {
    let narrative_geo =
      region.matches_text(pair.narrative.geographic_focus.as_deref());
    let movement_geo = pair.movements.iter().any(|m| {
      m.location
        .is_some_and(|p| region.contains(p.lat, p.lon))
    });
    let geo_match = narrative_geo && movement_geo;

    let (composite_score, sub_scores) =
      policy.composite(pair.narrative, pair.movements.len(), geo_match);

    Self {
      narrative_event_ids: vec![pair.narrative.event_id],
      movement_event_ids:  pair.movements.iter().map(|m| m.event_id).collect(),
      composite_score,
      sub_scores,
      geo_match,
      region:              region.name.clone(),
      evidence_summary:    evidence_summary(pair.narrative, pair.movements.len()),
      detected_at,
    }
  }
}

// ─── Pass outcome ────────────────────────────────────────────────────────────

/// What happened to the regional alert for a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDisposition {
  /// No prior active alert; a new one was inserted.
  Inserted,
  /// The existing alert was escalated or refreshed at the same level.
  Updated,
  /// The computed level was lower than the stored one; the update was
  /// rejected and the alert left byte-for-byte unchanged.
  EscalationHeld,
}

/// The result of one correlation pass. Empty-stream conditions are expected
/// steady-state outcomes, not errors; store failures surface as
/// [`Error::Store`] instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
  Success {
    correlations_found: usize,
    highest_score:      f64,
    threat_level:       ThreatLevel,
    confidence:         u8,
    alert_id:           Uuid,
    disposition:        AlertDisposition,
  },
  NoNarrativeEvents,
  NoMovementEvents,
  NoTemporalMatches,
}

impl PassOutcome {
  /// Candidate correlations computed during the pass (zero for the
  /// empty-stream outcomes).
  pub fn correlations_found(&self) -> usize {
    match self {
      Self::Success { correlations_found, .. } => *correlations_found,
      _ => 0,
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The correlation engine, generic over its injected store backend.
///
/// Cloning is cheap; the store handle is reference-counted.
#[derive(Clone)]
pub struct Engine<S> {
  store:  Arc<S>,
  config: EngineConfig,
}

impl<S: EventStore> Engine<S> {
  /// Build an engine over `store`, validating the scoring policy up front.
  pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
    config.policy.validate()?;
    Ok(Self { store, config })
  }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Run one correlation pass end to end.
  ///
  /// The two stream fetches run concurrently; everything after them is
  /// single-threaded pure computation followed by one guarded alert write.
  pub async fn run_pass(&self) -> Result<PassOutcome> {
    let window = self.config.window_hours;
    tracing::info!(window_hours = window, "correlation pass started");

    let (narratives, movements) = tokio::try_join!(
      self.store.fetch_narrative_events(window),
      self.store.fetch_movement_events(window),
    )
    .map_err(|e| Error::Store(Box::new(e)))?;

    if narratives.is_empty() {
      tracing::info!(status = "no_narrative_events", "pass complete");
      return Ok(PassOutcome::NoNarrativeEvents);
    }
    if movements.is_empty() {
      tracing::info!(status = "no_movement_events", "pass complete");
      return Ok(PassOutcome::NoMovementEvents);
    }

    tracing::info!(
      narrative_count = narratives.len(),
      movement_count = movements.len(),
      "events fetched"
    );

    let matches = match_by_window(&narratives, &movements, window);
    if matches.is_empty() {
      tracing::info!(status = "no_temporal_matches", "pass complete");
      return Ok(PassOutcome::NoTemporalMatches);
    }
    tracing::info!(count = matches.len(), "temporal matches found");

    let detected_at = Utc::now();
    let correlations: Vec<CorrelationResult> = matches
      .iter()
      .map(|pair| {
        CorrelationResult::evaluate(
          pair,
          &self.config.region,
          &self.config.policy,
          detected_at,
        )
      })
      .collect();

    // Strict greater-than keeps the first-encountered pair on ties.
    let mut best = &correlations[0];
    for candidate in &correlations[1..] {
      if candidate.composite_score > best.composite_score {
        best = candidate;
      }
    }
    let best = best.clone();

    let threat_level = self.config.policy.classify(best.composite_score);
    let confidence = self.config.policy.confidence(
      best.narrative_event_ids.len(),
      best.movement_event_ids.len(),
      best.geo_match,
    );

    let (alert_id, disposition) =
      self.upsert_alert(&best, threat_level, confidence).await?;

    let outcome = PassOutcome::Success {
      correlations_found: correlations.len(),
      highest_score: best.composite_score,
      threat_level,
      confidence,
      alert_id,
      disposition,
    };
    tracing::info!(
      status = "success",
      correlations_found = correlations.len(),
      highest_score = best.composite_score,
      threat_level = %threat_level,
      confidence,
      "pass complete"
    );
    Ok(outcome)
  }

  /// Per-region upsert with monotonic escalation enforcement.
  async fn upsert_alert(
    &self,
    correlation: &CorrelationResult,
    threat_level: ThreatLevel,
    confidence: u8,
  ) -> Result<(Uuid, AlertDisposition)> {
    let region = &self.config.region.name;
    let existing = self
      .store
      .fetch_active_alert(region)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    let entry = DetectionEntry {
      detected_at: correlation.detected_at,
      score:       correlation.composite_score,
      level:       threat_level,
    };

    match existing {
      None => {
        let alert = self
          .store
          .insert_alert(NewAlert {
            region:               region.clone(),
            threat_level,
            threat_score:         correlation.composite_score,
            confidence,
            sub_scores:           correlation.sub_scores,
            correlation_metadata: CorrelationMetadata {
              narrative_event_ids: correlation.narrative_event_ids.clone(),
              movement_event_ids:  correlation.movement_event_ids.clone(),
              evidence_summary:    correlation.evidence_summary.clone(),
              detection_history:   vec![entry],
            },
          })
          .await
          .map_err(|e| Error::Store(Box::new(e)))?;

        tracing::info!(
          alert_id = %alert.alert_id,
          threat_level = %threat_level,
          score = correlation.composite_score,
          "alert created"
        );
        Ok((alert.alert_id, AlertDisposition::Inserted))
      }

      Some(alert) => {
        if !alert.threat_level.can_transition_to(threat_level) {
          // Successful no-op: the stored assessment stays authoritative
          // and nothing is appended to its history.
          tracing::warn!(
            alert_id = %alert.alert_id,
            current = %alert.threat_level,
            attempted = %threat_level,
            "de-escalation prevented, keeping current level"
          );
          return Ok((alert.alert_id, AlertDisposition::EscalationHeld));
        }

        let mut detection_history =
          alert.correlation_metadata.detection_history;
        detection_history.push(entry);

        self
          .store
          .update_alert(alert.alert_id, alert.revision, AlertUpdate {
            threat_level,
            threat_score: correlation.composite_score,
            confidence,
            sub_scores: correlation.sub_scores,
            correlation_metadata: CorrelationMetadata {
              narrative_event_ids: correlation.narrative_event_ids.clone(),
              movement_event_ids: correlation.movement_event_ids.clone(),
              evidence_summary: correlation.evidence_summary.clone(),
              detection_history,
            },
          })
          .await
          .map_err(|e| Error::Store(Box::new(e)))?;

        tracing::info!(
          alert_id = %alert.alert_id,
          threat_level = %threat_level,
          score = correlation.composite_score,
          "alert updated"
        );
        Ok((alert.alert_id, AlertDisposition::Updated))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::{DateTime, Duration, Utc};

  use super::*;
  use crate::{
    alert::Alert,
    event::{
      GeoPoint, MovementCategory, MovementEvent, NarrativeEvent,
      NewMovementEvent, NewNarrativeEvent,
    },
  };

  // ── In-memory fake store ────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  enum MemError {
    #[error("an active alert already exists for {0}")]
    ActiveAlertExists(String),
    #[error("alert {0} missing or revision conflict")]
    Conflict(Uuid),
  }

  /// Fake store for isolated engine tests. Fetches return the seeded lists
  /// verbatim, ignoring the window argument, so tests can stage situations
  /// a well-behaved backend would pre-filter.
  #[derive(Default)]
  struct MemStore {
    narratives: Mutex<Vec<NarrativeEvent>>,
    movements:  Mutex<Vec<MovementEvent>>,
    alert:      Mutex<Option<Alert>>,
  }

  impl MemStore {
    fn seed_narrative(&self, event: NarrativeEvent) {
      self.narratives.lock().unwrap().push(event);
    }

    fn seed_movement(&self, event: MovementEvent) {
      self.movements.lock().unwrap().push(event);
    }

    fn alert(&self) -> Option<Alert> {
      self.alert.lock().unwrap().clone()
    }
  }

  impl EventStore for MemStore {
    type Error = MemError;

    async fn record_narrative_event(
      &self,
      input: NewNarrativeEvent,
    ) -> Result<NarrativeEvent, MemError> {
      let event = NarrativeEvent {
        event_id:             Uuid::new_v4(),
        created_at:           Utc::now(),
        outlet_count:         input.outlet_count,
        synchronized_phrases: input.synchronized_phrases,
        geographic_focus:     input.geographic_focus,
        themes:               input.themes,
        confidence:           input.confidence,
      };
      self.seed_narrative(event.clone());
      Ok(event)
    }

    async fn record_movement_event(
      &self,
      input: NewMovementEvent,
    ) -> Result<MovementEvent, MemError> {
      let event = MovementEvent {
        event_id:   Uuid::new_v4(),
        created_at: Utc::now(),
        category:   input.category,
        location:   input.location,
        confidence: input.confidence,
      };
      self.seed_movement(event.clone());
      Ok(event)
    }

    async fn fetch_narrative_events(
      &self,
      _window_hours: u32,
    ) -> Result<Vec<NarrativeEvent>, MemError> {
      Ok(self.narratives.lock().unwrap().clone())
    }

    async fn fetch_movement_events(
      &self,
      _window_hours: u32,
    ) -> Result<Vec<MovementEvent>, MemError> {
      Ok(self.movements.lock().unwrap().clone())
    }

    async fn fetch_active_alert<'a>(
      &'a self,
      region: &'a str,
    ) -> Result<Option<Alert>, MemError> {
      Ok(
        self
          .alert
          .lock()
          .unwrap()
          .clone()
          .filter(|a| a.region == region && a.resolved_at.is_none()),
      )
    }

    async fn insert_alert(&self, input: NewAlert) -> Result<Alert, MemError> {
      let mut slot = self.alert.lock().unwrap();
      if slot.as_ref().is_some_and(|a| a.resolved_at.is_none()) {
        return Err(MemError::ActiveAlertExists(input.region));
      }
      let alert = Alert {
        alert_id:             Uuid::new_v4(),
        region:               input.region,
        threat_level:         input.threat_level,
        threat_score:         input.threat_score,
        confidence:           input.confidence,
        sub_scores:           input.sub_scores,
        correlation_metadata: input.correlation_metadata,
        updated_at:           Utc::now(),
        resolved_at:          None,
        revision:             1,
      };
      *slot = Some(alert.clone());
      Ok(alert)
    }

    async fn update_alert(
      &self,
      alert_id: Uuid,
      expected_revision: u64,
      update: AlertUpdate,
    ) -> Result<(), MemError> {
      let mut slot = self.alert.lock().unwrap();
      match slot.as_mut() {
        Some(a) if a.alert_id == alert_id && a.revision == expected_revision => {
          a.threat_level = update.threat_level;
          a.threat_score = update.threat_score;
          a.confidence = update.confidence;
          a.sub_scores = update.sub_scores;
          a.correlation_metadata = update.correlation_metadata;
          a.updated_at = Utc::now();
          a.revision += 1;
          Ok(())
        }
        _ => Err(MemError::Conflict(alert_id)),
      }
    }
  }

  // ── Fixtures ────────────────────────────────────────────────────────────

  fn narrative(
    at: DateTime<Utc>,
    outlet_count: u32,
    phrases: usize,
    focus: Option<&str>,
  ) -> NarrativeEvent {
    NarrativeEvent {
      event_id:             Uuid::new_v4(),
      created_at:           at,
      outlet_count,
      synchronized_phrases: (0..phrases).map(|i| format!("p{i}")).collect(),
      geographic_focus:     focus.map(str::to_owned),
      themes:               vec![],
      confidence:           80.0,
    }
  }

  fn movement(at: DateTime<Utc>, location: Option<GeoPoint>) -> MovementEvent {
    MovementEvent {
      event_id:   Uuid::new_v4(),
      created_at: at,
      category:   MovementCategory::Naval,
      location,
      confidence: 75.0,
    }
  }

  fn in_strait() -> Option<GeoPoint> {
    Some(GeoPoint { lat: 24.5, lon: 120.0 })
  }

  fn engine(store: Arc<MemStore>) -> Engine<MemStore> {
    Engine::new(store, EngineConfig::default()).unwrap()
  }

  // ── Empty-stream statuses ───────────────────────────────────────────────

  #[tokio::test]
  async fn empty_narrative_stream_short_circuits() {
    let store = Arc::new(MemStore::default());
    store.seed_movement(movement(Utc::now(), in_strait()));

    let outcome = engine(store).run_pass().await.unwrap();
    assert!(matches!(outcome, PassOutcome::NoNarrativeEvents));
    assert_eq!(outcome.correlations_found(), 0);
  }

  #[tokio::test]
  async fn empty_movement_stream_short_circuits() {
    let store = Arc::new(MemStore::default());
    store.seed_narrative(narrative(Utc::now(), 3, 2, Some("Taiwan")));

    let outcome = engine(store).run_pass().await.unwrap();
    assert!(matches!(outcome, PassOutcome::NoMovementEvents));
  }

  #[tokio::test]
  async fn no_temporal_matches_leaves_alerts_untouched() {
    let store = Arc::new(MemStore::default());
    store.seed_narrative(narrative(Utc::now(), 3, 2, Some("Taiwan")));
    store.seed_movement(movement(
      Utc::now() - Duration::hours(100),
      in_strait(),
    ));

    let outcome = engine(store.clone()).run_pass().await.unwrap();
    assert!(matches!(outcome, PassOutcome::NoTemporalMatches));
    assert!(store.alert().is_none());
  }

  // ── Upsert protocol ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_pass_inserts_alert_with_single_history_entry() {
    let store = Arc::new(MemStore::default());
    let t = Utc::now();
    store.seed_narrative(narrative(t, 4, 3, Some("Taiwan Strait exercises")));
    for _ in 0..3 {
      store.seed_movement(movement(t - Duration::hours(2), in_strait()));
    }

    let outcome = engine(store.clone()).run_pass().await.unwrap();
    let PassOutcome::Success {
      correlations_found,
      highest_score,
      threat_level,
      confidence,
      disposition,
      ..
    } = outcome
    else {
      panic!("expected success, got {outcome:?}");
    };

    // outlet 100×0.30 + phrase 30×0.25 + volume 6×0.20 + geo 100×0.25
    assert_eq!(correlations_found, 1);
    assert!((highest_score - 63.7).abs() < 1e-9);
    assert_eq!(threat_level, ThreatLevel::Amber);
    assert_eq!(confidence, 60);
    assert_eq!(disposition, AlertDisposition::Inserted);

    let alert = store.alert().unwrap();
    assert_eq!(alert.threat_level, ThreatLevel::Amber);
    assert_eq!(alert.correlation_metadata.detection_history.len(), 1);
    assert_eq!(alert.resolved_at, None);
  }

  #[tokio::test]
  async fn stronger_rerun_escalates_and_appends_history() {
    let store = Arc::new(MemStore::default());
    let t = Utc::now();
    store.seed_narrative(narrative(t, 4, 3, Some("Taiwan Strait")));
    for _ in 0..3 {
      store.seed_movement(movement(t - Duration::hours(1), in_strait()));
    }
    engine(store.clone()).run_pass().await.unwrap();

    // A stronger pairing arrives: maxed phrases, more movement volume.
    store.seed_narrative(narrative(t, 4, 10, Some("Fujian coast")));
    for _ in 0..7 {
      store.seed_movement(movement(t - Duration::hours(1), in_strait()));
    }

    let outcome = engine(store.clone()).run_pass().await.unwrap();
    let PassOutcome::Success { threat_level, disposition, .. } = outcome
    else {
      panic!("expected success, got {outcome:?}");
    };
    assert_eq!(threat_level, ThreatLevel::Red);
    assert_eq!(disposition, AlertDisposition::Updated);

    let alert = store.alert().unwrap();
    assert_eq!(alert.threat_level, ThreatLevel::Red);
    assert_eq!(alert.correlation_metadata.detection_history.len(), 2);
    assert_eq!(alert.revision, 2);
  }

  #[tokio::test]
  async fn weaker_result_is_held_and_alert_is_unchanged() {
    let store = Arc::new(MemStore::default());
    let t = Utc::now();

    // Stage an existing RED alert.
    store.seed_narrative(narrative(t, 4, 10, Some("Taiwan Strait")));
    for _ in 0..10 {
      store.seed_movement(movement(t - Duration::hours(1), in_strait()));
    }
    engine(store.clone()).run_pass().await.unwrap();
    let before = store.alert().unwrap();
    assert_eq!(before.threat_level, ThreatLevel::Red);

    // Replace the streams with a weak signal that would classify GREEN.
    *store.narratives.lock().unwrap() =
      vec![narrative(t, 1, 0, None)];
    *store.movements.lock().unwrap() =
      vec![movement(t - Duration::hours(1), None)];

    let outcome = engine(store.clone()).run_pass().await.unwrap();
    let PassOutcome::Success { threat_level, disposition, alert_id, .. } =
      outcome
    else {
      panic!("expected success, got {outcome:?}");
    };
    assert_eq!(threat_level, ThreatLevel::Green);
    assert_eq!(disposition, AlertDisposition::EscalationHeld);
    assert_eq!(alert_id, before.alert_id);

    // The stored alert is completely unchanged — no history entry, no
    // field rewrites, no revision bump.
    let after = store.alert().unwrap();
    assert_eq!(after.threat_level, ThreatLevel::Red);
    assert_eq!(after.threat_score, before.threat_score);
    assert_eq!(
      after.correlation_metadata.detection_history.len(),
      before.correlation_metadata.detection_history.len()
    );
    assert_eq!(after.revision, before.revision);
  }

  // ── Selection ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn equal_scores_keep_the_first_encountered_pair() {
    let store = Arc::new(MemStore::default());
    let t = Utc::now();
    let first = narrative(t, 3, 2, Some("Taiwan"));
    let second = narrative(t - Duration::hours(1), 3, 2, Some("Taiwan"));
    let first_id = first.event_id;
    store.seed_narrative(first);
    store.seed_narrative(second);
    store.seed_movement(movement(t, in_strait()));

    let outcome = engine(store.clone()).run_pass().await.unwrap();
    assert_eq!(outcome.correlations_found(), 2);

    let alert = store.alert().unwrap();
    assert_eq!(
      alert.correlation_metadata.narrative_event_ids,
      vec![first_id]
    );
  }

  #[tokio::test]
  async fn geo_match_requires_both_streams_to_corroborate() {
    let store = Arc::new(MemStore::default());
    let t = Utc::now();
    // Narrative names the region, but all movements lack in-box locations.
    store.seed_narrative(narrative(t, 4, 3, Some("Taiwan Strait")));
    store.seed_movement(movement(t, Some(GeoPoint { lat: 40.0, lon: 116.0 })));
    store.seed_movement(movement(t, None));

    engine(store.clone()).run_pass().await.unwrap();
    let alert = store.alert().unwrap();
    assert_eq!(alert.sub_scores.geo_score, 0.0);
  }

  #[tokio::test]
  async fn invalid_policy_is_rejected_at_construction() {
    let mut config = EngineConfig::default();
    config.policy.weights.outlet = 0.9;
    let result = Engine::new(Arc::new(MemStore::default()), config);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
  }
}
