//! Error types for `accidb-core`.

use thiserror::Error;

use crate::extract::FieldSchema;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid uuid namespace {value:?}: {source}")]
  InvalidNamespace {
    value:  String,
    #[source]
    source: uuid::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("extraction cache i/o error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A field extractor could not produce a value conforming to the requested
/// schema. Never a partial value: the caller gets either a typed result or
/// one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
  #[error("no extraction strategy registered for field {0:?}")]
  UnknownField(String),

  #[error("field {field:?} expected a {expected} value")]
  SchemaMismatch { field: String, expected: FieldSchema },

  #[error("malformed value for field {field:?}: {reason}")]
  Malformed { field: String, reason: String },

  #[error("extractor transport failure: {0}")]
  Transport(String),
}

/// A raw record that cannot be turned into an entity-group. The batch
/// transformer logs and skips these; they never abort a batch.
#[derive(Debug, Error)]
pub enum UnnormalizableRecord {
  #[error("required field {0:?} is missing")]
  MissingField(String),

  #[error("field {field:?} holds an unparseable date: {value:?}")]
  InvalidDate { field: String, value: String },

  #[error("extraction of identity field {field:?} failed: {source}")]
  Extraction {
    field:  String,
    #[source]
    source: ExtractionError,
  },
}
