//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, accident dates as
//! `YYYY-MM-DD` and timestamps as RFC 3339 strings.

use accidb_core::entity::{Accident, Source, StoredAccident};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Source ──────────────────────────────────────────────────────────────────

pub fn encode_source(s: Source) -> &'static str { s.as_str() }

pub fn decode_source(s: &str) -> Result<Source> {
  match s {
    "ARIA" => Ok(Source::Aria),
    "EPICEA" => Ok(Source::Epicea),
    other => Err(Error::UnknownSource(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawAccident::from_row`].
pub const ACCIDENT_COLUMNS: &str = "accident_id, site_id, title, source, \
  source_id, accident_date, severity_scale, raw_data, created_at, updated_at";

/// Raw strings read directly from an `accidents` row.
pub struct RawAccident {
  pub accident_id:    String,
  pub site_id:        String,
  pub title:          String,
  pub source:         String,
  pub source_id:      String,
  pub accident_date:  String,
  pub severity_scale: Option<String>,
  pub raw_data:       String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAccident {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      accident_id:    row.get(0)?,
      site_id:        row.get(1)?,
      title:          row.get(2)?,
      source:         row.get(3)?,
      source_id:      row.get(4)?,
      accident_date:  row.get(5)?,
      severity_scale: row.get(6)?,
      raw_data:       row.get(7)?,
      created_at:     row.get(8)?,
      updated_at:     row.get(9)?,
    })
  }

  pub fn into_stored(self) -> Result<StoredAccident> {
    let accident = Accident {
      accident_id:    decode_uuid(&self.accident_id)?,
      site_id:        decode_uuid(&self.site_id)?,
      title:          self.title,
      source:         decode_source(&self.source)?,
      source_id:      self.source_id,
      accident_date:  decode_date(&self.accident_date)?,
      severity_scale: self.severity_scale,
      raw_data:       serde_json::from_str(&self.raw_data)?,
    };
    Ok(StoredAccident {
      accident,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sources_round_trip_through_their_column_text() {
    for source in [Source::Aria, Source::Epicea] {
      assert_eq!(decode_source(encode_source(source)).unwrap(), source);
    }
    assert!(matches!(decode_source("aria"), Err(Error::UnknownSource(_))));
  }

  #[test]
  fn dates_are_iso() {
    let d = NaiveDate::from_ymd_opt(2003, 7, 9).unwrap();
    assert_eq!(encode_date(d), "2003-07-09");
    assert!(decode_date("09/07/2003").is_err());
  }
}
