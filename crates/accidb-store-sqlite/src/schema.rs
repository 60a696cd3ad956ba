//! SQL schema for the accident store.
//!
//! Executed once at connection startup. Natural keys carry `UNIQUE`
//! constraints so conflicting inserts can be skipped with
//! `ON CONFLICT DO NOTHING`; dependent rows cascade with their accident.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sites (
    site_id             TEXT PRIMARY KEY,
    plant_name          TEXT NOT NULL,
    address             TEXT NOT NULL,
    latitude            REAL,
    longitude           REAL,
    country             TEXT,
    industrial_activity TEXT,
    UNIQUE (plant_name, address)
);

CREATE TABLE IF NOT EXISTS accidents (
    accident_id    TEXT PRIMARY KEY,
    site_id        TEXT NOT NULL REFERENCES sites(site_id) ON DELETE CASCADE,
    title          TEXT NOT NULL,
    source         TEXT NOT NULL CHECK (source IN ('ARIA', 'EPICEA')),
    source_id      TEXT NOT NULL,
    accident_date  TEXT NOT NULL,   -- YYYY-MM-DD
    severity_scale TEXT,
    raw_data       TEXT NOT NULL,   -- the input record as JSON
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at     TEXT NOT NULL,
    UNIQUE (title, accident_date)
);

CREATE TABLE IF NOT EXISTS causes (
    id             INTEGER PRIMARY KEY,
    accident_id    TEXT NOT NULL UNIQUE
                   REFERENCES accidents(accident_id) ON DELETE CASCADE,
    event_category TEXT,
    failure        TEXT,
    description    TEXT
);

-- One row per accident; extra substances are dropped by the loader.
CREATE TABLE IF NOT EXISTS substances (
    id          INTEGER PRIMARY KEY,
    accident_id TEXT NOT NULL UNIQUE
                REFERENCES accidents(accident_id) ON DELETE CASCADE,
    name        TEXT,
    cas_number  TEXT,
    quantity    TEXT,
    clp_class   TEXT
);

CREATE TABLE IF NOT EXISTS consequences_human (
    id           INTEGER PRIMARY KEY,
    accident_id  TEXT NOT NULL UNIQUE
                 REFERENCES accidents(accident_id) ON DELETE CASCADE,
    fatalities   INTEGER CHECK (fatalities >= 0),
    injuries     INTEGER CHECK (injuries >= 0),
    evacuated    INTEGER CHECK (evacuated >= 0),
    hospitalized INTEGER CHECK (hospitalized >= 0)
);

CREATE TABLE IF NOT EXISTS consequences_other (
    id                   INTEGER PRIMARY KEY,
    accident_id          TEXT NOT NULL UNIQUE
                         REFERENCES accidents(accident_id) ON DELETE CASCADE,
    environmental_impact TEXT,
    economic_cost        TEXT,
    disruption_duration  TEXT
);

CREATE INDEX IF NOT EXISTS accidents_site_idx   ON accidents(site_id);
CREATE INDEX IF NOT EXISTS accidents_source_idx ON accidents(source);

PRAGMA user_version = 1;
";

/// Every table, parents first.
pub const TABLES: [&str; 6] = [
  "sites",
  "accidents",
  "causes",
  "substances",
  "consequences_human",
  "consequences_other",
];
