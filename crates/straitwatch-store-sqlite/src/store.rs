//! [`SqliteStore`] — the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use straitwatch_core::{
  alert::{Alert, AlertUpdate, NewAlert},
  event::{MovementEvent, NarrativeEvent, NewMovementEvent, NewNarrativeEvent},
  store::EventStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAlert, RawMovementEvent, RawNarrativeEvent, encode_category,
    encode_dt, encode_metadata, encode_strings, encode_sub_scores,
    encode_threat_level, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Straitwatch event store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn raw_conn(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Insert a narrative event with an explicit timestamp. The public trait
  /// method always stamps `Utc::now()`; tests stage historical events.
  pub(crate) async fn insert_narrative_at(
    &self,
    input: NewNarrativeEvent,
    created_at: DateTime<Utc>,
  ) -> Result<NarrativeEvent> {
    let event = NarrativeEvent {
      event_id: Uuid::new_v4(),
      created_at,
      outlet_count: input.outlet_count,
      synchronized_phrases: input.synchronized_phrases,
      geographic_focus: input.geographic_focus,
      themes: input.themes,
      confidence: input.confidence,
    };

    let id_str      = encode_uuid(event.event_id);
    let at_str      = encode_dt(event.created_at);
    let outlet      = i64::from(event.outlet_count);
    let phrases_str = encode_strings(&event.synchronized_phrases)?;
    let focus       = event.geographic_focus.clone();
    let themes_str  = encode_strings(&event.themes)?;
    let confidence  = event.confidence;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO narrative_events (
             event_id, created_at, outlet_count, synchronized_phrases,
             geographic_focus, themes, confidence
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            at_str,
            outlet,
            phrases_str,
            focus,
            themes_str,
            confidence,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  /// Insert a movement event with an explicit timestamp; see
  /// [`SqliteStore::insert_narrative_at`].
  pub(crate) async fn insert_movement_at(
    &self,
    input: NewMovementEvent,
    created_at: DateTime<Utc>,
  ) -> Result<MovementEvent> {
    let event = MovementEvent {
      event_id: Uuid::new_v4(),
      created_at,
      category: input.category,
      location: input.location,
      confidence: input.confidence,
    };

    let id_str       = encode_uuid(event.event_id);
    let at_str       = encode_dt(event.created_at);
    let category_str = encode_category(event.category).to_owned();
    let lat          = event.location.map(|p| p.lat);
    let lon          = event.location.map(|p| p.lon);
    let confidence   = event.confidence;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO movement_events (
             event_id, created_at, category, location_lat, location_lon,
             confidence
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, at_str, category_str, lat, lon, confidence],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }
}

/// Decode fetched rows, skipping the ones that fail instead of aborting the
/// whole fetch. Malformed stored data must not stop correlation of the
/// remaining events; skipped rows are surfaced through the log.
fn decode_skipping<R, T>(
  table: &'static str,
  raws: Vec<R>,
  decode: impl Fn(R) -> Result<T>,
) -> Vec<T> {
  let mut out = Vec::with_capacity(raws.len());
  let mut skipped = 0usize;
  for raw in raws {
    match decode(raw) {
      Ok(item) => out.push(item),
      Err(e) => {
        skipped += 1;
        tracing::warn!(table, error = %e, "skipping undecodable event row");
      }
    }
  }
  if skipped > 0 {
    tracing::warn!(table, skipped, "event rows skipped during fetch");
  }
  out
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Event ingest ──────────────────────────────────────────────────────────

  async fn record_narrative_event(
    &self,
    input: NewNarrativeEvent,
  ) -> Result<NarrativeEvent> {
    self.insert_narrative_at(input, Utc::now()).await
  }

  async fn record_movement_event(
    &self,
    input: NewMovementEvent,
  ) -> Result<MovementEvent> {
    self.insert_movement_at(input, Utc::now()).await
  }

  // ── Correlation-window reads ──────────────────────────────────────────────

  async fn fetch_narrative_events(
    &self,
    window_hours: u32,
  ) -> Result<Vec<NarrativeEvent>> {
    let cutoff = encode_dt(Utc::now() - Duration::hours(i64::from(window_hours)));

    let raws: Vec<RawNarrativeEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, created_at, outlet_count, synchronized_phrases,
                  geographic_focus, themes, confidence
           FROM narrative_events
           WHERE created_at >= ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![cutoff], |row| {
            Ok(RawNarrativeEvent {
              event_id:             row.get(0)?,
              created_at:           row.get(1)?,
              outlet_count:         row.get(2)?,
              synchronized_phrases: row.get(3)?,
              geographic_focus:     row.get(4)?,
              themes:               row.get(5)?,
              confidence:           row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_skipping("narrative_events", raws, RawNarrativeEvent::into_event))
  }

  async fn fetch_movement_events(
    &self,
    window_hours: u32,
  ) -> Result<Vec<MovementEvent>> {
    let cutoff = encode_dt(Utc::now() - Duration::hours(i64::from(window_hours)));

    let raws: Vec<RawMovementEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, created_at, category, location_lat, location_lon,
                  confidence
           FROM movement_events
           WHERE created_at >= ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![cutoff], |row| {
            Ok(RawMovementEvent {
              event_id:     row.get(0)?,
              created_at:   row.get(1)?,
              category:     row.get(2)?,
              location_lat: row.get(3)?,
              location_lon: row.get(4)?,
              confidence:   row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_skipping("movement_events", raws, RawMovementEvent::into_event))
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn fetch_active_alert<'a>(
    &'a self,
    region: &'a str,
  ) -> Result<Option<Alert>> {
    let region = region.to_owned();

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT alert_id, region, threat_level, threat_score,
                      confidence, sub_scores, correlation_metadata,
                      updated_at, resolved_at, revision
               FROM alerts
               WHERE region = ?1 AND resolved_at IS NULL",
              rusqlite::params![region],
              |row| {
                Ok(RawAlert {
                  alert_id:             row.get(0)?,
                  region:               row.get(1)?,
                  threat_level:         row.get(2)?,
                  threat_score:         row.get(3)?,
                  confidence:           row.get(4)?,
                  sub_scores:           row.get(5)?,
                  correlation_metadata: row.get(6)?,
                  updated_at:           row.get(7)?,
                  resolved_at:          row.get(8)?,
                  revision:             row.get(9)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  async fn insert_alert(&self, input: NewAlert) -> Result<Alert> {
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

    let id_str     = encode_uuid(alert.alert_id);
    let region     = alert.region.clone();
    let level_str  = encode_threat_level(alert.threat_level).to_owned();
    let score      = alert.threat_score;
    let confidence = i64::from(alert.confidence);
    let sub_str    = encode_sub_scores(&alert.sub_scores)?;
    let meta_str   = encode_metadata(&alert.correlation_metadata)?;
    let at_str     = encode_dt(alert.updated_at);

    let region_for_err = alert.region.clone();
    let result = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alerts (
             alert_id, region, threat_level, threat_score, confidence,
             sub_scores, correlation_metadata, updated_at, resolved_at,
             revision
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, 1)",
          rusqlite::params![
            id_str,
            region,
            level_str,
            score,
            confidence,
            sub_str,
            meta_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(alert),
      Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        e,
        _,
      ))) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
        Err(Error::ActiveAlertExists(region_for_err))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn update_alert(
    &self,
    alert_id: Uuid,
    expected_revision: u64,
    update: AlertUpdate,
  ) -> Result<()> {
    let id_str     = encode_uuid(alert_id);
    let level_str  = encode_threat_level(update.threat_level).to_owned();
    let score      = update.threat_score;
    let confidence = i64::from(update.confidence);
    let sub_str    = encode_sub_scores(&update.sub_scores)?;
    let meta_str   = encode_metadata(&update.correlation_metadata)?;
    let at_str     = encode_dt(Utc::now());
    let revision   = expected_revision as i64;

    let changed: usize = self
      .conn
      .call(move |conn| {
        // Single guarded statement: either the revision still matches and
        // every field lands atomically, or nothing is written at all.
        let n = conn.execute(
          "UPDATE alerts
           SET threat_level = ?1, threat_score = ?2, confidence = ?3,
               sub_scores = ?4, correlation_metadata = ?5, updated_at = ?6,
               revision = revision + 1
           WHERE alert_id = ?7 AND revision = ?8 AND resolved_at IS NULL",
          rusqlite::params![
            level_str,
            score,
            confidence,
            sub_str,
            meta_str,
            at_str,
            id_str,
            revision,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AlertConflict(alert_id));
    }
    Ok(())
  }
}
