//! Transform a batch of raw records, then load it.

use std::fmt;

use accidb_core::{
  batch::transform,
  entity::Source,
  normalize::Normalizer,
  record::RawRecord,
  store::{AccidentStore, LoadReport},
};
use tracing::info;

/// What one run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
  pub source:    Source,
  /// Records decoded from the input.
  pub read:      usize,
  /// Records looked at after the limit.
  pub processed: usize,
  pub skipped:   usize,
  pub load:      LoadReport,
}

impl fmt::Display for RunSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}: read {}, processed {}, skipped {}; inserted {} sites, {} accidents, {} dependent rows",
      self.source,
      self.read,
      self.processed,
      self.skipped,
      self.load.sites,
      self.load.accidents,
      self.load.inserted() - self.load.sites - self.load.accidents,
    )
  }
}

/// Normalize up to `limit` records and load the survivors in one batch.
/// Unnormalizable records are skipped; a failed load is returned as is and
/// leaves the store untouched.
pub async fn run<N, S>(
  normalizer: &N,
  records: Vec<RawRecord>,
  limit: Option<usize>,
  store: &S,
) -> Result<RunSummary, S::Error>
where
  N: Normalizer,
  S: AccidentStore,
{
  let source = normalizer.source();
  let read = records.len();

  let outcome = transform(normalizer, records, limit).await;
  let processed = outcome.processed();
  let skipped = outcome.skipped.len();

  let load = store.load(outcome.groups).await?;

  let summary = RunSummary { source, read, processed, skipped, load };
  info!(%summary, "run complete");
  Ok(summary)
}
