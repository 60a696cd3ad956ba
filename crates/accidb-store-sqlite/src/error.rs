//! Error type for `accidb-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Any failure inside a load rolls the whole batch back before this is
  /// returned.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown source {0:?}")]
  UnknownSource(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
