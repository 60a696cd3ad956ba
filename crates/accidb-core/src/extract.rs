//! The field-extractor contract.
//!
//! A [`FieldExtractor`] turns a context (a cell, a free-text summary) into a
//! typed value for one named field. Rule-based and model-assisted extractors
//! implement the same trait, so normalizers do not care which one they hold.

use std::{fmt, future::Future};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ExtractionError, record::parse_date};

/// Names of the fields normalizers ask extractors for.
pub mod fields {
  pub const TITLE: &str = "title";
  pub const ACCIDENT_DATE: &str = "accident_date";
  pub const SUBSTANCES: &str = "substances";
  pub const FATALITIES: &str = "fatalities";
  pub const INJURIES: &str = "injuries";
  pub const EVACUATED: &str = "evacuated";
  pub const HOSPITALIZED: &str = "hospitalized";
  pub const ENVIRONMENTAL_IMPACT: &str = "environmental_impact";
  pub const ECONOMIC_COST: &str = "economic_cost";
  pub const DISRUPTION_DURATION: &str = "disruption_duration";

  /// The four head-count fields, in column order.
  pub const HEAD_COUNTS: [&str; 4] = [FATALITIES, INJURIES, EVACUATED, HOSPITALIZED];
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// The shape of value a field is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSchema {
  Number,
  Text,
  Date,
  Substances,
}

impl fmt::Display for FieldSchema {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Number => "number",
      Self::Text => "text",
      Self::Date => "date",
      Self::Substances => "substance list",
    })
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// One substance as reported by an extractor, before it is attached to an
/// accident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstanceItem {
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub cas_number: String,
  #[serde(default)]
  pub quantity:   String,
  #[serde(default)]
  pub clp_class:  String,
}

/// A typed extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Extracted {
  Number(i64),
  Text(String),
  Date(NaiveDate),
  Substances(Vec<SubstanceItem>),
  /// The context does not mention the field.
  Absent,
}

impl Extracted {
  /// The schema this value satisfies; `None` for [`Extracted::Absent`], which
  /// satisfies every schema.
  pub fn schema(&self) -> Option<FieldSchema> {
    match self {
      Self::Number(_) => Some(FieldSchema::Number),
      Self::Text(_) => Some(FieldSchema::Text),
      Self::Date(_) => Some(FieldSchema::Date),
      Self::Substances(_) => Some(FieldSchema::Substances),
      Self::Absent => None,
    }
  }

  pub fn conforms_to(&self, schema: FieldSchema) -> bool {
    self.schema().is_none_or(|s| s == schema)
  }

  /// A head count: negative numbers become `None`.
  pub fn into_count(self, field: &str) -> Result<Option<u32>, ExtractionError> {
    match self {
      Self::Number(n) => Ok(u32::try_from(n).ok()),
      Self::Absent => Ok(None),
      _ => Err(mismatch(field, FieldSchema::Number)),
    }
  }

  /// Trimmed text; blank text becomes `None`.
  pub fn into_text(self, field: &str) -> Result<Option<String>, ExtractionError> {
    match self {
      Self::Text(s) => {
        let trimmed = s.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
      }
      Self::Absent => Ok(None),
      _ => Err(mismatch(field, FieldSchema::Text)),
    }
  }

  /// A date; text is accepted when it parses as one of the known layouts.
  pub fn into_date(self, field: &str) -> Result<Option<NaiveDate>, ExtractionError> {
    match self {
      Self::Date(d) => Ok(Some(d)),
      Self::Text(s) => parse_date(&s).map(Some).ok_or_else(|| {
        ExtractionError::Malformed {
          field:  field.to_owned(),
          reason: format!("{s:?} is not a date"),
        }
      }),
      Self::Absent => Ok(None),
      _ => Err(mismatch(field, FieldSchema::Date)),
    }
  }

  pub fn into_substances(
    self,
    field: &str,
  ) -> Result<Vec<SubstanceItem>, ExtractionError> {
    match self {
      Self::Substances(items) => Ok(items),
      Self::Absent => Ok(Vec::new()),
      _ => Err(mismatch(field, FieldSchema::Substances)),
    }
  }
}

fn mismatch(field: &str, expected: FieldSchema) -> ExtractionError {
  ExtractionError::SchemaMismatch { field: field.to_owned(), expected }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a field extractor.
///
/// Implementations must surface failures as [`ExtractionError`]s and never
/// return a value that does not match the field's schema.
pub trait FieldExtractor: Send + Sync {
  fn extract<'a>(
    &'a self,
    field: &'a str,
    context: &'a str,
  ) -> impl Future<Output = Result<Extracted, ExtractionError>> + Send + 'a;
}

impl<E: FieldExtractor> FieldExtractor for &E {
  fn extract<'a>(
    &'a self,
    field: &'a str,
    context: &'a str,
  ) -> impl Future<Output = Result<Extracted, ExtractionError>> + Send + 'a {
    (**self).extract(field, context)
  }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
  //! A canned extractor for tests.

  use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
  };

  use super::*;

  /// Answers every call for a field with the same canned value, and counts
  /// calls so tests can assert on caching.
  #[derive(Debug, Default)]
  pub struct StaticExtractor {
    answers: HashMap<String, Result<Extracted, ExtractionError>>,
    calls:   AtomicUsize,
  }

  impl StaticExtractor {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, field: &str, value: Extracted) -> Self {
      self.answers.insert(field.to_owned(), Ok(value));
      self
    }

    pub fn failing(mut self, field: &str, error: ExtractionError) -> Self {
      self.answers.insert(field.to_owned(), Err(error));
      self
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  impl FieldExtractor for StaticExtractor {
    async fn extract(
      &self,
      field: &str,
      _context: &str,
    ) -> Result<Extracted, ExtractionError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self
        .answers
        .get(field)
        .cloned()
        .unwrap_or_else(|| Err(ExtractionError::UnknownField(field.to_owned())))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_reject_negatives() {
    assert_eq!(Extracted::Number(3).into_count("f"), Ok(Some(3)));
    assert_eq!(Extracted::Number(-1).into_count("f"), Ok(None));
    assert_eq!(Extracted::Absent.into_count("f"), Ok(None));
    assert!(matches!(
      Extracted::Text("3".into()).into_count("f"),
      Err(ExtractionError::SchemaMismatch { expected: FieldSchema::Number, .. })
    ));
  }

  #[test]
  fn blank_text_is_null() {
    assert_eq!(Extracted::Text("  ".into()).into_text("f"), Ok(None));
    assert_eq!(
      Extracted::Text(" Fuite ".into()).into_text("f"),
      Ok(Some("Fuite".into()))
    );
  }

  #[test]
  fn dates_accept_parseable_text() {
    let d = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
    assert_eq!(Extracted::Text("04/03/2021".into()).into_date("f"), Ok(Some(d)));
    assert!(matches!(
      Extracted::Text("soon".into()).into_date("f"),
      Err(ExtractionError::Malformed { .. })
    ));
  }

  #[test]
  fn absent_conforms_to_every_schema() {
    assert!(Extracted::Absent.conforms_to(FieldSchema::Substances));
    assert!(!Extracted::Number(1).conforms_to(FieldSchema::Text));
  }
}
