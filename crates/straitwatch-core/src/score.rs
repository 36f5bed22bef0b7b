//! Scoring policy: normalization, composite scores, threat classification,
//! and confidence estimation.
//!
//! Every number in here is tuned policy, not logic. The defaults were
//! calibrated against the demo-scale data distribution (4 monitored
//! outlets, tens of movement reports per window) and are expected to be
//! revisited once real-world distributions are available. They are all
//! overridable through [`ScoringPolicy`] deserialised from configuration.

use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  event::NarrativeEvent,
  threat::ThreatLevel,
};

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Linear min-max normalization of `value` into [0, 100].
///
/// Values outside `[min, max]` saturate rather than extrapolate. The
/// degenerate `min == max` case returns the neutral midpoint 50 instead of
/// dividing by zero. Every sub-score goes through this function, so its
/// edge-case policy is uniform across the composite.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
  if max == min {
    return 50.0;
  }
  let scaled = (value - min) / (max - min) * 100.0;
  scaled.clamp(0.0, 100.0)
}

// ─── Sub-scores ──────────────────────────────────────────────────────────────

/// The four named components feeding the composite score, each 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
  /// State-media coordination breadth (distinct outlet count).
  pub outlet_score: f64,
  /// Synchronized-messaging strength (repeated phrase count).
  pub phrase_score: f64,
  /// Movement-report volume within the correlation window.
  pub volume_score: f64,
  /// Geographic alignment, binary 0 or 100.
  pub geo_score:    f64,
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Weights applied to the four sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Weights {
  pub outlet: f64,
  pub phrase: f64,
  pub volume: f64,
  pub geo:    f64,
}

impl Default for Weights {
  fn default() -> Self {
    Self { outlet: 0.30, phrase: 0.25, volume: 0.20, geo: 0.25 }
  }
}

/// Min/max normalization bounds for one raw signal.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Bounds {
  pub min: f64,
  pub max: f64,
}

/// Additive bounded confidence formula parameters.
///
/// Each event stream contributes a capped amount, geographic corroboration
/// adds a fixed bonus, and a fixed bonus applies unconditionally because
/// the pipeline only ever scores in-window events. The sum is capped at
/// `ceiling` — certainty is never claimed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ConfidencePolicy {
  pub narrative_weight: u32,
  pub narrative_cap:    u32,
  pub movement_weight:  u32,
  pub movement_cap:     u32,
  pub geo_bonus:        u32,
  pub window_bonus:     u32,
  pub ceiling:          u32,
}

impl Default for ConfidencePolicy {
  fn default() -> Self {
    Self {
      narrative_weight: 15,
      narrative_cap:    40,
      movement_weight:  5,
      movement_cap:     30,
      geo_bonus:        20,
      window_bonus:     10,
      ceiling:          95,
    }
  }
}

/// The complete tunable scoring policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
  pub weights:         Weights,
  pub outlet_bounds:   Bounds,
  pub phrase_bounds:   Bounds,
  pub volume_bounds:   Bounds,
  /// Composite scores below this classify GREEN.
  pub green_threshold: f64,
  /// Composite scores at or above this classify RED.
  pub red_threshold:   f64,
  pub confidence:      ConfidencePolicy,
}

impl Default for ScoringPolicy {
  fn default() -> Self {
    Self {
      weights:         Weights::default(),
      outlet_bounds:   Bounds { min: 1.0, max: 4.0 },
      phrase_bounds:   Bounds { min: 0.0, max: 10.0 },
      volume_bounds:   Bounds { min: 0.0, max: 50.0 },
      green_threshold: 30.0,
      red_threshold:   70.0,
      confidence:      ConfidencePolicy::default(),
    }
  }
}

impl ScoringPolicy {
  /// Reject policies that would make scoring meaningless.
  pub fn validate(&self) -> Result<()> {
    let sum = self.weights.outlet
      + self.weights.phrase
      + self.weights.volume
      + self.weights.geo;
    if (sum - 1.0).abs() > 1e-6 {
      return Err(Error::InvalidConfig(format!(
        "scoring weights must sum to 1.0, got {sum}"
      )));
    }
    if self.green_threshold >= self.red_threshold {
      return Err(Error::InvalidConfig(format!(
        "green threshold {} must be below red threshold {}",
        self.green_threshold, self.red_threshold
      )));
    }
    Ok(())
  }

  /// Weighted composite score for one narrative event and its matched
  /// movement volume.
  pub fn composite(
    &self,
    narrative: &NarrativeEvent,
    movement_count: usize,
    geo_match: bool,
  ) -> (f64, SubScores) {
    let outlet_score = normalize(
      f64::from(narrative.outlet_count),
      self.outlet_bounds.min,
      self.outlet_bounds.max,
    );
    let phrase_score = normalize(
      narrative.synchronized_phrases.len() as f64,
      self.phrase_bounds.min,
      self.phrase_bounds.max,
    );
    let volume_score = normalize(
      movement_count as f64,
      self.volume_bounds.min,
      self.volume_bounds.max,
    );
    // Geographic corroboration is binary and already bounded.
    let geo_score = if geo_match { 100.0 } else { 0.0 };

    let composite = outlet_score * self.weights.outlet
      + phrase_score * self.weights.phrase
      + volume_score * self.weights.volume
      + geo_score * self.weights.geo;

    (
      composite,
      SubScores { outlet_score, phrase_score, volume_score, geo_score },
    )
  }

  /// Map a composite score to a threat level via the two thresholds.
  pub fn classify(&self, composite: f64) -> ThreatLevel {
    if composite < self.green_threshold {
      ThreatLevel::Green
    } else if composite < self.red_threshold {
      ThreatLevel::Amber
    } else {
      ThreatLevel::Red
    }
  }

  /// Bounded confidence estimate for a correlation, 0–`ceiling`.
  ///
  /// Monotonically non-decreasing in each input.
  pub fn confidence(
    &self,
    narrative_count: usize,
    movement_count: usize,
    geo_match: bool,
  ) -> u8 {
    let c = &self.confidence;

    let narrative = (narrative_count as u32)
      .saturating_mul(c.narrative_weight)
      .min(c.narrative_cap);
    let movement = (movement_count as u32)
      .saturating_mul(c.movement_weight)
      .min(c.movement_cap);
    let geo = if geo_match { c.geo_bonus } else { 0 };

    let total = narrative + movement + geo + c.window_bonus;
    total.min(c.ceiling) as u8
  }
}

// ─── Evidence summary ────────────────────────────────────────────────────────

/// Deterministic one-line evidence summary for a correlation. Pure function
/// of its inputs; the same inputs always produce the same sentence.
pub fn evidence_summary(
  narrative: &NarrativeEvent,
  movement_count: usize,
) -> String {
  let focus = narrative
    .geographic_focus
    .as_deref()
    .unwrap_or("unknown region");
  format!(
    "{} state media outlets detected coordinating on '{}' themes, \
     correlating with {} civilian movement reports in region.",
    narrative.outlet_count, focus, movement_count
  )
}
