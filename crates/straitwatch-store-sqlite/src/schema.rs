//! SQL schema for the Straitwatch SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Narrative events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS narrative_events (
    event_id             TEXT PRIMARY KEY,
    created_at           TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    outlet_count         INTEGER NOT NULL,
    synchronized_phrases TEXT NOT NULL DEFAULT '[]',  -- JSON array
    geographic_focus     TEXT,
    themes               TEXT NOT NULL DEFAULT '[]',  -- JSON array
    confidence           REAL NOT NULL
);

-- Movement events are strictly append-only.
CREATE TABLE IF NOT EXISTS movement_events (
    event_id     TEXT PRIMARY KEY,
    created_at   TEXT NOT NULL,
    category     TEXT NOT NULL,   -- 'naval' | 'convoy' | 'flight' | 'restricted_zone'
    location_lat REAL,            -- both present or both NULL
    location_lon REAL,
    confidence   REAL NOT NULL,
    CHECK ((location_lat IS NULL) = (location_lon IS NULL))
);

-- The single mutable per-region assessment. detection_history inside
-- correlation_metadata is append-only; revision guards concurrent updates.
CREATE TABLE IF NOT EXISTS alerts (
    alert_id             TEXT PRIMARY KEY,
    region               TEXT NOT NULL,
    threat_level         TEXT NOT NULL,   -- 'GREEN' | 'AMBER' | 'RED'
    threat_score         REAL NOT NULL,
    confidence           INTEGER NOT NULL,
    sub_scores           TEXT NOT NULL,   -- JSON SubScores
    correlation_metadata TEXT NOT NULL,   -- JSON CorrelationMetadata
    updated_at           TEXT NOT NULL,
    resolved_at          TEXT,            -- NULL while active
    revision             INTEGER NOT NULL DEFAULT 1
);

-- At most one unresolved alert per region.
CREATE UNIQUE INDEX IF NOT EXISTS alerts_active_region_idx
    ON alerts(region) WHERE resolved_at IS NULL;

CREATE INDEX IF NOT EXISTS narrative_created_idx ON narrative_events(created_at);
CREATE INDEX IF NOT EXISTS movement_created_idx  ON movement_events(created_at);

PRAGMA user_version = 1;
";
