//! Batch transformation: apply a [`Normalizer`] across many raw records.

use tracing::{info, warn};

use crate::{
  UnnormalizableRecord,
  entity::EntityGroup,
  normalize::Normalizer,
  record::RawRecord,
};

/// A record the normalizer rejected.
#[derive(Debug)]
pub struct SkippedRecord {
  /// Position of the record in the input sequence.
  pub index:   usize,
  /// Natural-key summary for manual follow-up.
  pub context: String,
  pub reason:  UnnormalizableRecord,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
  /// Normalized groups, in input order.
  pub groups:  Vec<EntityGroup>,
  pub skipped: Vec<SkippedRecord>,
}

impl BatchOutcome {
  /// Number of input records looked at (after the limit).
  pub fn processed(&self) -> usize { self.groups.len() + self.skipped.len() }
}

/// Normalize up to `limit` records, in order.
///
/// Unnormalizable records are logged and collected in
/// [`BatchOutcome::skipped`]; they never abort the batch.
pub async fn transform<N, I>(
  normalizer: &N,
  records: I,
  limit: Option<usize>,
) -> BatchOutcome
where
  N: Normalizer,
  I: IntoIterator<Item = RawRecord>,
{
  let source = normalizer.source();
  let mut outcome = BatchOutcome::default();

  let records = records.into_iter().take(limit.unwrap_or(usize::MAX));
  for (index, record) in records.enumerate() {
    match normalizer.normalize(&record).await {
      Ok(group) => outcome.groups.push(group),
      Err(reason) => {
        let context = normalizer.describe(&record);
        warn!(%source, index, %context, error = %reason, "skipping unnormalizable record");
        outcome.skipped.push(SkippedRecord { index, context, reason });
      }
    }
  }

  info!(
    %source,
    normalized = outcome.groups.len(),
    skipped = outcome.skipped.len(),
    "batch transformed"
  );
  outcome
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{
    entity::{
      Accident, Cause, HumanConsequences, OtherConsequences, Site, Source,
    },
    identity::{IdentityGenerator, SiteKey},
    normalize::{require, require_date},
  };

  /// Minimal normalizer over `name` / `addr` / `title` / `date` fields.
  struct PlainNormalizer {
    identity: IdentityGenerator,
  }

  impl Normalizer for PlainNormalizer {
    fn source(&self) -> Source { Source::Aria }

    fn describe(&self, record: &RawRecord) -> String {
      format!("{:?}", record.text("title"))
    }

    async fn normalize(
      &self,
      record: &RawRecord,
    ) -> Result<EntityGroup, UnnormalizableRecord> {
      let title = require(record, "title")?;
      let date = require_date(record, "date")?;
      let key = SiteKey::new(record.text("name"), record.text("addr"));
      let site_id = self.identity.site_id(&key);
      let accident_id = self.identity.accident_id(title, date);
      Ok(EntityGroup {
        site:               Site {
          site_id,
          plant_name: key.plant_name,
          address: key.address,
          latitude: None,
          longitude: None,
          country: None,
          industrial_activity: None,
        },
        accident:           Accident {
          accident_id,
          site_id,
          title: title.to_owned(),
          source: Source::Aria,
          source_id: String::new(),
          accident_date: date,
          severity_scale: None,
          raw_data: record.to_json(),
        },
        cause:              Cause { accident_id, ..Default::default() },
        substances:         Vec::new(),
        consequences_human: HumanConsequences { accident_id, ..Default::default() },
        consequences_other: OtherConsequences { accident_id, ..Default::default() },
      })
    }
  }

  fn normalizer() -> PlainNormalizer {
    PlainNormalizer { identity: IdentityGenerator::new(uuid::Uuid::NAMESPACE_OID) }
  }

  fn row(title: &str, date: &str) -> RawRecord {
    [("name", "Acme"), ("addr", "1 Rue X"), ("title", title), ("date", date)]
      .into_iter()
      .collect()
  }

  #[tokio::test]
  async fn skips_bad_records_and_keeps_order() {
    let records = vec![
      row("Explosion A", "2020-01-01"),
      row("", "2020-01-05"),
      row("Fire B", "2020-02-02"),
      row("Leak C", "not a date"),
      row("Spill D", "2020-03-03"),
    ];

    let outcome = transform(&normalizer(), records, None).await;

    let titles: Vec<_> =
      outcome.groups.iter().map(|g| g.accident.title.as_str()).collect();
    assert_eq!(titles, ["Explosion A", "Fire B", "Spill D"]);
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(outcome.skipped[0].index, 1);
    assert_eq!(outcome.skipped[1].index, 3);
    assert!(matches!(
      outcome.skipped[1].reason,
      UnnormalizableRecord::InvalidDate { .. }
    ));
    assert_eq!(outcome.processed(), 5);
  }

  #[tokio::test]
  async fn limit_caps_records_processed() {
    let records = vec![
      row("A", "2020-01-01"),
      row("B", "2020-01-02"),
      row("C", "2020-01-03"),
    ];

    let outcome = transform(&normalizer(), records, Some(2)).await;
    assert_eq!(outcome.processed(), 2);
    assert_eq!(
      outcome.groups[1].accident.accident_date,
      NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
    );
  }

  #[tokio::test]
  async fn same_site_rows_share_an_identifier() {
    let outcome = transform(
      &normalizer(),
      vec![row("Explosion A", "2020-01-01"), row("Fire B", "2020-02-02")],
      None,
    )
    .await;

    assert_eq!(outcome.groups[0].site.site_id, outcome.groups[1].site.site_id);
    assert_ne!(
      outcome.groups[0].accident.accident_id,
      outcome.groups[1].accident.accident_id
    );
  }
}
