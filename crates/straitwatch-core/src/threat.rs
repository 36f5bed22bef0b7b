//! Threat levels and the one-way escalation rule.
//!
//! The three levels form a strictly ordered chain GREEN < AMBER < RED.
//! An active alert may hold or climb this chain but never descend it; the
//! sole gate is [`ThreatLevel::can_transition_to`]. De-escalation only
//! happens outside the engine, by resolving the alert and starting over.

use serde::{Deserialize, Serialize};

/// The three-valued ordinal threat classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
  Green,
  Amber,
  Red,
}

impl ThreatLevel {
  /// Explicit ordinal rank. Transitions are decided on this value rather
  /// than on derived enum ordering, so reordering variants cannot silently
  /// change escalation behaviour.
  fn rank(self) -> u8 {
    match self {
      Self::Green => 1,
      Self::Amber => 2,
      Self::Red => 3,
    }
  }

  /// True iff moving to `next` stays level or escalates.
  pub fn can_transition_to(self, next: ThreatLevel) -> bool {
    next.rank() >= self.rank()
  }

  /// The string stored in the `threat_level` column and emitted on the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Green => "GREEN",
      Self::Amber => "AMBER",
      Self::Red => "RED",
    }
  }
}

impl std::fmt::Display for ThreatLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::ThreatLevel::*;

  #[test]
  fn escalation_is_one_way() {
    assert!(Green.can_transition_to(Amber));
    assert!(Green.can_transition_to(Red));
    assert!(Amber.can_transition_to(Red));

    assert!(!Red.can_transition_to(Amber));
    assert!(!Red.can_transition_to(Green));
    assert!(!Amber.can_transition_to(Green));
  }

  #[test]
  fn same_level_updates_are_permitted() {
    assert!(Green.can_transition_to(Green));
    assert!(Amber.can_transition_to(Amber));
    assert!(Red.can_transition_to(Red));
  }

  #[test]
  fn wire_representation_is_uppercase() {
    assert_eq!(Green.as_str(), "GREEN");
    assert_eq!(
      serde_json::to_string(&Red).unwrap(),
      "\"RED\""
    );
    assert_eq!(
      serde_json::from_str::<super::ThreatLevel>("\"AMBER\"").unwrap(),
      Amber
    );
  }
}
