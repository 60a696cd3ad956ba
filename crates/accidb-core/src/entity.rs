//! Normalized entities. The fixed multi-table shape every source maps into.
//!
//! Entities are immutable once produced by a normalizer. The only mutation in
//! the system happens at persistence time, where conflicts resolve in favour
//! of rows already in the store.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Source ──────────────────────────────────────────────────────────────────

/// The upstream database an accident record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
  /// Structured CSV export (rule-based normalization).
  Aria,
  /// Scraped web records (model-assisted normalization).
  Epicea,
}

impl Source {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Aria => "ARIA",
      Self::Epicea => "EPICEA",
    }
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Site ────────────────────────────────────────────────────────────────────

/// An industrial facility. Natural key: `(plant_name, address)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
  /// Name-based UUID derived from the natural key.
  pub site_id:             Uuid,
  pub plant_name:          String,
  pub address:             String,
  pub latitude:            Option<f64>,
  pub longitude:           Option<f64>,
  pub country:             Option<String>,
  pub industrial_activity: Option<String>,
}

// ─── Accident ────────────────────────────────────────────────────────────────

/// A single accident. Natural key: `(title, accident_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accident {
  /// Name-based UUID derived from the natural key.
  pub accident_id:    Uuid,
  pub site_id:        Uuid,
  pub title:          String,
  pub source:         Source,
  /// Identifier native to the source (ARIA number, EPICEA dossier number).
  pub source_id:      String,
  pub accident_date:  NaiveDate,
  pub severity_scale: Option<String>,
  /// The untouched input record, kept for audit and debugging.
  pub raw_data:       serde_json::Value,
}

/// An accident as read back from the store, with its store-assigned
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAccident {
  pub accident:   Accident,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── Dependent sub-records ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
  pub accident_id:    Uuid,
  pub event_category: Option<String>,
  pub failure:        Option<String>,
  pub description:    Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substance {
  pub accident_id: Uuid,
  pub name:        Option<String>,
  pub cas_number:  Option<String>,
  pub quantity:    Option<String>,
  /// CLP (EU Classification, Labelling and Packaging) hazard class.
  pub clp_class:   Option<String>,
}

/// Head counts; `None` means "not reported", never "zero".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanConsequences {
  pub accident_id:  Uuid,
  pub fatalities:   Option<u32>,
  pub injuries:     Option<u32>,
  pub evacuated:    Option<u32>,
  pub hospitalized: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherConsequences {
  pub accident_id:          Uuid,
  pub environmental_impact: Option<String>,
  pub economic_cost:        Option<String>,
  pub disruption_duration:  Option<String>,
}

// ─── EntityGroup ─────────────────────────────────────────────────────────────

/// The normalized output of one raw record: one site, one accident and the
/// four dependent sub-records owned by that accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
  pub site:               Site,
  pub accident:           Accident,
  pub cause:              Cause,
  /// Modelled as a list; the store currently keeps one row per accident.
  pub substances:         Vec<Substance>,
  pub consequences_human: HumanConsequences,
  pub consequences_other: OtherConsequences,
}

impl EntityGroup {
  /// `(plant_name, address)` of the owning site.
  pub fn site_key(&self) -> (&str, &str) {
    (&self.site.plant_name, &self.site.address)
  }

  /// `(title, accident_date)` of the accident.
  pub fn accident_key(&self) -> (&str, NaiveDate) {
    (&self.accident.title, self.accident.accident_date)
  }
}
