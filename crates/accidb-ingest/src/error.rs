//! Error type for `accidb-ingest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("configuration error: {0}")]
  Config(#[from] ::config::ConfigError),

  #[error("uuid_namespace is not set")]
  MissingNamespace,

  #[error("core error: {0}")]
  Core(#[from] accidb_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
