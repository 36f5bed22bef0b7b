//! Temporal matching of narrative events against movement events.
//!
//! O(N·M) scan — both streams are bounded by the rolling retention window,
//! so the quadratic pairing stays small in practice.

use crate::event::{MovementEvent, NarrativeEvent};

/// One narrative event with every movement event inside its time window.
/// Movement order mirrors the input slice (chronological, descending, as
/// fetched from the store).
#[derive(Debug)]
pub struct MatchedPair<'a> {
  pub narrative: &'a NarrativeEvent,
  pub movements: Vec<&'a MovementEvent>,
}

/// Pair each narrative event with the movement events whose creation
/// timestamps lie within `window_hours` of it, in either direction,
/// boundary inclusive.
///
/// Narrative events with no movement inside the window are dropped — they
/// contribute no correlation evidence. Input order is preserved on both
/// sides of every pair.
pub fn match_by_window<'a>(
  narratives: &'a [NarrativeEvent],
  movements: &'a [MovementEvent],
  window_hours: u32,
) -> Vec<MatchedPair<'a>> {
  let window_seconds = i64::from(window_hours) * 3600;

  let mut matches = Vec::new();
  for narrative in narratives {
    let matched: Vec<&MovementEvent> = movements
      .iter()
      .filter(|movement| {
        let diff = (narrative.created_at - movement.created_at)
          .num_seconds()
          .abs();
        diff <= window_seconds
      })
      .collect();

    if !matched.is_empty() {
      matches.push(MatchedPair { narrative, movements: matched });
    }
  }
  matches
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Duration, Utc};
  use uuid::Uuid;

  use super::match_by_window;
  use crate::event::{MovementCategory, MovementEvent, NarrativeEvent};

  fn narrative_at(at: DateTime<Utc>) -> NarrativeEvent {
    NarrativeEvent {
      event_id:             Uuid::new_v4(),
      created_at:           at,
      outlet_count:         2,
      synchronized_phrases: vec![],
      geographic_focus:     None,
      themes:               vec![],
      confidence:           70.0,
    }
  }

  fn movement_at(at: DateTime<Utc>) -> MovementEvent {
    MovementEvent {
      event_id:   Uuid::new_v4(),
      created_at: at,
      category:   MovementCategory::Naval,
      location:   None,
      confidence: 70.0,
    }
  }

  #[test]
  fn window_boundary_is_inclusive() {
    let t = Utc::now();
    let narratives = [narrative_at(t)];
    let movements = [movement_at(t - Duration::hours(72))];

    let matches = match_by_window(&narratives, &movements, 72);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].movements.len(), 1);
  }

  #[test]
  fn just_outside_the_window_is_excluded() {
    let t = Utc::now();
    let narratives = [narrative_at(t)];
    let movements =
      [movement_at(t - Duration::hours(72) - Duration::seconds(1))];

    let matches = match_by_window(&narratives, &movements, 72);
    assert!(matches.is_empty());
  }

  #[test]
  fn matching_is_symmetric_in_time() {
    let t = Utc::now();
    let narratives = [narrative_at(t)];
    let movements =
      [movement_at(t - Duration::hours(10)), movement_at(t + Duration::hours(10))];

    let matches = match_by_window(&narratives, &movements, 72);
    assert_eq!(matches[0].movements.len(), 2);
  }

  #[test]
  fn zero_match_narratives_are_dropped() {
    let t = Utc::now();
    let narratives = [narrative_at(t), narrative_at(t - Duration::hours(200))];
    let movements = [movement_at(t - Duration::hours(1))];

    let matches = match_by_window(&narratives, &movements, 72);
    assert_eq!(matches.len(), 1);
    assert_eq!(
      matches[0].narrative.event_id,
      narratives[0].event_id
    );
  }

  #[test]
  fn input_order_is_preserved() {
    let t = Utc::now();
    let narratives = [narrative_at(t), narrative_at(t - Duration::hours(1))];
    let movements = [
      movement_at(t - Duration::hours(3)),
      movement_at(t - Duration::hours(2)),
      movement_at(t - Duration::hours(1)),
    ];

    let matches = match_by_window(&narratives, &movements, 72);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].narrative.event_id, narratives[0].event_id);
    assert_eq!(matches[1].narrative.event_id, narratives[1].event_id);

    let ids: Vec<_> =
      matches[0].movements.iter().map(|m| m.event_id).collect();
    let expected: Vec<_> = movements.iter().map(|m| m.event_id).collect();
    assert_eq!(ids, expected);
  }
}
