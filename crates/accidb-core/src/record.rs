//! The raw record: one row of a tabular export or one scraped page, flattened
//! to a field name → text mapping.
//!
//! Source adapters translate their native shape into a [`RawRecord`] before
//! normalization, so normalizers never see CSV rows or HTML.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cell values that tabular exports use to mean "no value".
const NULL_MARKERS: &[&str] = &["nan", "NaN", "NULL", "null", "None"];

/// Date layouts seen across sources, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
  fields: BTreeMap<String, String>,
}

impl RawRecord {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
    self.fields.insert(field.into(), value.into());
  }

  /// The value of `field`, untouched.
  pub fn raw(&self, field: &str) -> Option<&str> {
    self.fields.get(field).map(String::as_str)
  }

  /// The trimmed value of `field`. Empty cells and null markers are `None`.
  pub fn text(&self, field: &str) -> Option<&str> {
    self
      .raw(field)
      .map(str::trim)
      .filter(|v| !v.is_empty() && !NULL_MARKERS.contains(v))
  }

  /// The record as a JSON object, for the accident's `raw_data` column.
  pub fn to_json(&self) -> serde_json::Value {
    serde_json::Value::Object(
      self
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect(),
    )
  }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      fields: iter
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    }
  }
}

/// Parse a calendar date in any of the layouts the sources use. A trailing
/// time component (`2020-01-01 00:00:00`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  let day = raw.split_whitespace().next().unwrap_or(raw);
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_trims_and_drops_null_markers() {
    let record: RawRecord = [
      ("a", "  value "),
      ("b", ""),
      ("c", "nan"),
      ("d", "   "),
    ]
    .into_iter()
    .collect();

    assert_eq!(record.text("a"), Some("value"));
    assert_eq!(record.text("b"), None);
    assert_eq!(record.text("c"), None);
    assert_eq!(record.text("d"), None);
    assert_eq!(record.text("missing"), None);
    assert_eq!(record.raw("a"), Some("  value "));
  }

  #[test]
  fn to_json_keeps_every_field() {
    let record: RawRecord = [("Titre", "Fuite"), ("Date", "")].into_iter().collect();
    let json = record.to_json();
    assert_eq!(json["Titre"], "Fuite");
    assert_eq!(json["Date"], "");
  }

  #[test]
  fn parse_date_accepts_source_layouts() {
    let expected = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
    assert_eq!(parse_date("2020-02-01"), Some(expected));
    assert_eq!(parse_date("01/02/2020"), Some(expected));
    assert_eq!(parse_date("01-02-2020"), Some(expected));
    assert_eq!(parse_date(" 2020-02-01 00:00:00 "), Some(expected));
    assert_eq!(parse_date("yesterday"), None);
    assert_eq!(parse_date(""), None);
  }
}
