//! The `AccidentStore` trait and supporting report types.
//!
//! The trait is implemented by storage backends (e.g. `accidb-store-sqlite`).
//! The ingest pipeline depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{EntityGroup, Source, StoredAccident};

// ─── Report types ────────────────────────────────────────────────────────────

/// Rows actually inserted by one [`AccidentStore::load`]. Conflicting rows
/// (already present by primary or natural key) are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
  /// Entity-groups handed to the loader.
  pub submitted:          usize,
  pub sites:              usize,
  pub accidents:          usize,
  pub causes:             usize,
  pub substances:         usize,
  pub consequences_human: usize,
  pub consequences_other: usize,
}

impl LoadReport {
  pub fn inserted(&self) -> usize {
    self.sites
      + self.accidents
      + self.causes
      + self.substances
      + self.consequences_human
      + self.consequences_other
  }

  /// `true` when the load changed nothing.
  pub fn is_noop(&self) -> bool { self.inserted() == 0 }
}

/// Row count of every table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
  pub sites:              usize,
  pub accidents:          usize,
  pub causes:             usize,
  pub substances:         usize,
  pub consequences_human: usize,
  pub consequences_other: usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an accident store backend.
///
/// Loading is idempotent: re-loading groups whose natural keys are already
/// present is a no-op, and new natural keys are strictly additive.
pub trait AccidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write a whole batch in one transaction: sites, then accidents, then the
  /// dependent tables. Existing rows win every conflict. Any other failure
  /// rolls the batch back and nothing is committed.
  fn load(
    &self,
    groups: Vec<EntityGroup>,
  ) -> impl Future<Output = Result<LoadReport, Self::Error>> + Send + '_;

  fn counts(&self) -> impl Future<Output = Result<TableCounts, Self::Error>> + Send + '_;

  /// Retrieve an accident by UUID. Returns `None` if not found.
  fn get_accident(
    &self,
    accident_id: Uuid,
  ) -> impl Future<Output = Result<Option<StoredAccident>, Self::Error>> + Send + '_;

  /// All accidents attached to a site, oldest first.
  fn accidents_for_site(
    &self,
    site_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StoredAccident>, Self::Error>> + Send + '_;

  /// The highest source-native identifier stored for `source`, compared
  /// numerically. Used to resume incremental ingestion.
  fn last_source_id(
    &self,
    source: Source,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;
}
