//! [`SqliteStore`]: the SQLite implementation of [`AccidentStore`].

use std::{collections::HashMap, path::Path};

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, Transaction, params};
use tracing::{debug, info};
use uuid::Uuid;

use accidb_core::{
  entity::{EntityGroup, Source, StoredAccident},
  store::{AccidentStore, LoadReport, TableCounts},
};

use crate::{
  Result,
  encode::{ACCIDENT_COLUMNS, RawAccident, encode_date, encode_dt, encode_source, encode_uuid},
  schema::{SCHEMA, TABLES},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An accident store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
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

  /// Delete an accident; its dependent rows go with it. Returns `false` when
  /// no such accident exists.
  pub async fn delete_accident(&self, accident_id: Uuid) -> Result<bool> {
    let id = encode_uuid(accident_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM accidents WHERE accident_id = ?1", params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }
}

// ─── Batch write ─────────────────────────────────────────────────────────────

const INSERT_SITE: &str = "
  INSERT INTO sites (
    site_id, plant_name, address, latitude, longitude, country,
    industrial_activity
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
  ON CONFLICT DO NOTHING";

const INSERT_ACCIDENT: &str = "
  INSERT INTO accidents (
    accident_id, site_id, title, source, source_id, accident_date,
    severity_scale, raw_data, created_at, updated_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
  ON CONFLICT DO NOTHING";

const INSERT_CAUSE: &str = "
  INSERT INTO causes (accident_id, event_category, failure, description)
  VALUES (?1, ?2, ?3, ?4)
  ON CONFLICT DO NOTHING";

const INSERT_SUBSTANCE: &str = "
  INSERT INTO substances (accident_id, name, cas_number, quantity, clp_class)
  VALUES (?1, ?2, ?3, ?4, ?5)
  ON CONFLICT DO NOTHING";

const INSERT_HUMAN: &str = "
  INSERT INTO consequences_human (
    accident_id, fatalities, injuries, evacuated, hospitalized
  ) VALUES (?1, ?2, ?3, ?4, ?5)
  ON CONFLICT DO NOTHING";

const INSERT_OTHER: &str = "
  INSERT INTO consequences_other (
    accident_id, environmental_impact, economic_cost, disruption_duration
  ) VALUES (?1, ?2, ?3, ?4)
  ON CONFLICT DO NOTHING";

/// Write every group through `tx`. Rows already present by primary or
/// natural key are left untouched, and ids are resolved back from the
/// stored rows so dependents always point at what is actually there.
fn write_batch(
  tx: &Transaction<'_>,
  groups: &[EntityGroup],
  now: &str,
) -> rusqlite::Result<LoadReport> {
  let mut report = LoadReport { submitted: groups.len(), ..Default::default() };

  // Sites, first occurrence of each natural key wins.
  let mut site_ids: HashMap<(&str, &str), String> = HashMap::new();
  {
    let mut insert = tx.prepare_cached(INSERT_SITE)?;
    let mut lookup = tx.prepare_cached(
      "SELECT site_id FROM sites WHERE plant_name = ?1 AND address = ?2",
    )?;
    for group in groups {
      let key = group.site_key();
      if site_ids.contains_key(&key) {
        continue;
      }
      let site = &group.site;
      report.sites += insert.execute(params![
        encode_uuid(site.site_id),
        site.plant_name,
        site.address,
        site.latitude,
        site.longitude,
        site.country,
        site.industrial_activity,
      ])?;
      let stored: String = lookup.query_row(params![key.0, key.1], |r| r.get(0))?;
      site_ids.insert(key, stored);
    }
  }

  // Accidents, under the resolved site ids.
  let mut accident_ids: HashMap<(&str, NaiveDate), String> = HashMap::new();
  {
    let mut insert = tx.prepare_cached(INSERT_ACCIDENT)?;
    let mut lookup = tx.prepare_cached(
      "SELECT accident_id FROM accidents WHERE title = ?1 AND accident_date = ?2",
    )?;
    for group in groups {
      let key = group.accident_key();
      if accident_ids.contains_key(&key) {
        continue;
      }
      let site_id = site_ids
        .get(&group.site_key())
        .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
      let accident = &group.accident;
      let date = encode_date(accident.accident_date);
      report.accidents += insert.execute(params![
        encode_uuid(accident.accident_id),
        site_id,
        accident.title,
        encode_source(accident.source),
        accident.source_id,
        date,
        accident.severity_scale,
        accident.raw_data.to_string(),
        now,
      ])?;
      // No row here means the primary key is taken by a different natural
      // key; the error rolls the batch back.
      let stored: String = lookup.query_row(params![key.0, date], |r| r.get(0))?;
      accident_ids.insert(key, stored);
    }
  }

  // Dependents, keyed by the resolved accident ids.
  let mut cause = tx.prepare_cached(INSERT_CAUSE)?;
  let mut substance = tx.prepare_cached(INSERT_SUBSTANCE)?;
  let mut human = tx.prepare_cached(INSERT_HUMAN)?;
  let mut other = tx.prepare_cached(INSERT_OTHER)?;
  for group in groups {
    let accident_id = accident_ids
      .get(&group.accident_key())
      .ok_or(rusqlite::Error::QueryReturnedNoRows)?;

    let c = &group.cause;
    report.causes +=
      cause.execute(params![accident_id, c.event_category, c.failure, c.description])?;

    if let Some(s) = group.substances.first() {
      report.substances += substance.execute(params![
        accident_id,
        s.name,
        s.cas_number,
        s.quantity,
        s.clp_class,
      ])?;
    }
    if group.substances.len() > 1 {
      debug!(
        %accident_id,
        dropped = group.substances.len() - 1,
        "keeping the first substance only"
      );
    }

    let h = &group.consequences_human;
    report.consequences_human += human.execute(params![
      accident_id,
      h.fatalities,
      h.injuries,
      h.evacuated,
      h.hospitalized,
    ])?;

    let o = &group.consequences_other;
    report.consequences_other += other.execute(params![
      accident_id,
      o.environmental_impact,
      o.economic_cost,
      o.disruption_duration,
    ])?;
  }

  Ok(report)
}

// ─── AccidentStore impl ──────────────────────────────────────────────────────

impl AccidentStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self, groups: Vec<EntityGroup>) -> Result<LoadReport> {
    if groups.is_empty() {
      return Ok(LoadReport::default());
    }
    let now = encode_dt(Utc::now());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let report = write_batch(&tx, &groups, &now)?;
        tx.commit()?;
        Ok(report)
      })
      .await?;

    info!(
      submitted = report.submitted,
      sites = report.sites,
      accidents = report.accidents,
      dependents = report.inserted() - report.sites - report.accidents,
      "batch loaded"
    );
    Ok(report)
  }

  async fn counts(&self) -> Result<TableCounts> {
    let n = self
      .conn
      .call(|conn| {
        let mut n = [0_usize; TABLES.len()];
        for (slot, table) in n.iter_mut().zip(TABLES) {
          let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          *slot = count as usize;
        }
        Ok(n)
      })
      .await?;

    Ok(TableCounts {
      sites:              n[0],
      accidents:          n[1],
      causes:             n[2],
      substances:         n[3],
      consequences_human: n[4],
      consequences_other: n[5],
    })
  }

  async fn get_accident(&self, accident_id: Uuid) -> Result<Option<StoredAccident>> {
    let id = encode_uuid(accident_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCIDENT_COLUMNS} FROM accidents WHERE accident_id = ?1"),
              params![id],
              RawAccident::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccident::into_stored).transpose()
  }

  async fn accidents_for_site(&self, site_id: Uuid) -> Result<Vec<StoredAccident>> {
    let id = encode_uuid(site_id);
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACCIDENT_COLUMNS} FROM accidents
           WHERE site_id = ?1
           ORDER BY accident_date, title"
        ))?;
        let rows = stmt
          .query_map(params![id], RawAccident::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(RawAccident::into_stored).collect()
  }

  async fn last_source_id(&self, source: Source) -> Result<Option<String>> {
    let source = encode_source(source);
    let last = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT source_id FROM accidents
               WHERE source = ?1 AND source_id <> ''
               ORDER BY CAST(source_id AS INTEGER) DESC, source_id DESC
               LIMIT 1",
              params![source],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(last)
  }
}
