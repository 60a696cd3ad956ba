//! The record-normalizer contract and helpers shared by source adapters.

use std::future::Future;

use chrono::NaiveDate;
use tracing::warn;

use crate::{
  ExtractionError,
  UnnormalizableRecord,
  entity::{EntityGroup, Source},
  extract::{FieldExtractor, SubstanceItem},
  record::{RawRecord, parse_date},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Maps one raw record of a given source into an [`EntityGroup`].
pub trait Normalizer: Send + Sync {
  fn source(&self) -> Source;

  /// A short, human-readable natural-key summary of `record`, used when a
  /// skipped record is logged.
  fn describe(&self, record: &RawRecord) -> String;

  fn normalize<'a>(
    &'a self,
    record: &'a RawRecord,
  ) -> impl Future<Output = Result<EntityGroup, UnnormalizableRecord>> + Send + 'a;
}

// ─── Direct field mapping ────────────────────────────────────────────────────

/// The trimmed value of a field the record cannot do without.
pub fn require<'r>(
  record: &'r RawRecord,
  field: &str,
) -> Result<&'r str, UnnormalizableRecord> {
  record
    .text(field)
    .ok_or_else(|| UnnormalizableRecord::MissingField(field.to_owned()))
}

pub fn require_date(
  record: &RawRecord,
  field: &str,
) -> Result<NaiveDate, UnnormalizableRecord> {
  let raw = require(record, field)?;
  parse_date(raw).ok_or_else(|| UnnormalizableRecord::InvalidDate {
    field: field.to_owned(),
    value: raw.to_owned(),
  })
}

/// A non-negative head count, or `None`. Empty strings are `None`, never an
/// error; `"2.0"` is accepted as 2.
pub fn parse_count(raw: &str) -> Option<u32> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }
  raw.parse::<u32>().ok().or_else(|| {
    raw
      .parse::<f64>()
      .ok()
      .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
      .map(|f| f as u32)
  })
}

/// `Some(text)` when `value` has non-blank content.
pub fn non_empty(value: &str) -> Option<String> {
  let value = value.trim();
  (!value.is_empty()).then(|| value.to_owned())
}

// ─── Extraction through a context ────────────────────────────────────────────

/// Binds an extractor to one record's context and applies the error policy:
/// identity-critical fields fail the record, everything else degrades to
/// null with a warning.
pub struct FieldReader<'a, E> {
  extractor: &'a E,
  source:    Source,
  context:   &'a str,
}

impl<'a, E: FieldExtractor> FieldReader<'a, E> {
  pub fn new(extractor: &'a E, source: Source, context: &'a str) -> Self {
    Self { extractor, source, context }
  }

  pub async fn required_text(
    &self,
    field: &str,
  ) -> Result<String, UnnormalizableRecord> {
    let value = self
      .extractor
      .extract(field, self.context)
      .await
      .and_then(|v| v.into_text(field))
      .map_err(|source| identity_failure(field, source))?;
    value.ok_or_else(|| UnnormalizableRecord::MissingField(field.to_owned()))
  }

  pub async fn required_date(
    &self,
    field: &str,
  ) -> Result<NaiveDate, UnnormalizableRecord> {
    let value = self
      .extractor
      .extract(field, self.context)
      .await
      .and_then(|v| v.into_date(field))
      .map_err(|source| identity_failure(field, source))?;
    value.ok_or_else(|| UnnormalizableRecord::MissingField(field.to_owned()))
  }

  pub async fn text(&self, field: &str) -> Option<String> {
    let result = self
      .extractor
      .extract(field, self.context)
      .await
      .and_then(|v| v.into_text(field));
    self.or_null(field, result)
  }

  pub async fn count(&self, field: &str) -> Option<u32> {
    let result = self
      .extractor
      .extract(field, self.context)
      .await
      .and_then(|v| v.into_count(field));
    self.or_null(field, result)
  }

  pub async fn substances(&self, field: &str) -> Vec<SubstanceItem> {
    let result = self
      .extractor
      .extract(field, self.context)
      .await
      .and_then(|v| v.into_substances(field))
      .map(Some);
    self.or_null(field, result).unwrap_or_default()
  }

  fn or_null<T>(
    &self,
    field: &str,
    result: Result<Option<T>, ExtractionError>,
  ) -> Option<T> {
    match result {
      Ok(value) => value,
      Err(error) => {
        warn!(source = %self.source, field, %error, "extraction failed, storing null");
        None
      }
    }
  }
}

fn identity_failure(field: &str, source: ExtractionError) -> UnnormalizableRecord {
  UnnormalizableRecord::Extraction { field: field.to_owned(), source }
}
