//! Decoding of upstream exports into [`RawRecord`]s.

use std::{
  collections::BTreeMap,
  io::{BufRead, BufReader, Read},
};

use accidb_core::record::RawRecord;
use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

use crate::Result;

/// Lines of export metadata above the ARIA header row.
pub const ARIA_PREAMBLE_LINES: usize = 7;

/// Read a `;`-separated ARIA export. The first `preamble_lines` lines are
/// skipped; the next one is the header row. Rows may be ragged. The input
/// must be UTF-8.
pub fn read_aria_csv<R: Read>(reader: R, preamble_lines: usize) -> Result<Vec<RawRecord>> {
  let mut reader = BufReader::new(reader);
  let mut skipped = Vec::new();
  for _ in 0..preamble_lines {
    skipped.clear();
    if reader.read_until(b'\n', &mut skipped)? == 0 {
      break;
    }
  }

  let mut csv = ReaderBuilder::new()
    .delimiter(b';')
    .flexible(true)
    .from_reader(reader);
  let headers = csv.headers()?.clone();

  let mut records = Vec::new();
  for row in csv.records() {
    let row = row?;
    records.push(
      headers
        .iter()
        .zip(row.iter())
        .map(|(h, v)| (h.trim(), v))
        .collect::<RawRecord>(),
    );
  }
  debug!(rows = records.len(), "read ARIA export");
  Ok(records)
}

/// Read a JSON array of flat objects, as written by the EPICEA scraper.
/// Scalars are kept as text and `null`s are dropped.
pub fn read_epicea_json<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
  let rows: Vec<BTreeMap<String, Value>> = serde_json::from_reader(reader)?;
  let records: Vec<RawRecord> = rows
    .into_iter()
    .map(|row| {
      row
        .into_iter()
        .filter_map(|(k, v)| match v {
          Value::Null => None,
          Value::String(s) => Some((k, s)),
          other => Some((k, other.to_string())),
        })
        .collect()
    })
    .collect();
  debug!(records = records.len(), "read EPICEA records");
  Ok(records)
}

/// Drop records whose numeric `field` is not greater than `last`. Records
/// without a numeric value in `field` are kept.
pub fn resume_after(records: Vec<RawRecord>, field: &str, last: Option<&str>) -> Vec<RawRecord> {
  let Some(last) = last.and_then(|l| l.trim().parse::<u64>().ok()) else {
    return records;
  };
  records
    .into_iter()
    .filter(|r| {
      r.text(field)
        .and_then(|v| v.parse::<u64>().ok())
        .is_none_or(|n| n > last)
    })
    .collect()
}
