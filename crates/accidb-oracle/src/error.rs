//! Error types for `accidb-oracle`.
//!
//! Per-call failures are [`accidb_core::ExtractionError`]s; this type only
//! covers setting the extractor up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("oracle base url is empty")]
  MissingBaseUrl,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
