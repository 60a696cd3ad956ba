//! ARIA adapter: rows of the BARPI CSV export.
//!
//! Most columns map straight onto entity fields. Head counts and the
//! environmental / economic impact only exist inside the free-text
//! `Conséquences` summary and go through an extractor, [`RuleExtractor::aria`]
//! by default.

use accidb_core::{
  UnnormalizableRecord,
  entity::{
    Accident, Cause, EntityGroup, HumanConsequences, OtherConsequences, Site,
    Source, Substance,
  },
  extract::{FieldExtractor, fields},
  identity::{IdentityGenerator, SiteKey},
  normalize::{FieldReader, Normalizer, require, require_date},
  record::RawRecord,
};
use uuid::Uuid;

use crate::rules::RuleExtractor;

/// Column headers of the export.
pub mod columns {
  pub const DEPARTMENT: &str = "Départment";
  pub const COMMUNE: &str = "Commune";
  pub const COUNTRY: &str = "Pays";
  pub const NAF_CODE: &str = "Code NAF";
  pub const TITLE: &str = "Titre";
  pub const DATE: &str = "Date";
  pub const NUMBER: &str = "Numéro ARIA";
  pub const SCALE: &str = "Echelle";
  pub const ROOT_CAUSES: &str = "Causes profondes";
  pub const PRIMARY_CAUSES: &str = "Causes premières";
  pub const CONTENT: &str = "Contenu";
  pub const MATERIALS: &str = "Matières";
  pub const CLP_CLASS: &str = "Classe de danger CLP";
  pub const CONSEQUENCES: &str = "Conséquences";
  pub const EVENT_TYPE: &str = "Type évènement";
}

pub struct AriaNormalizer<E = RuleExtractor> {
  identity:  IdentityGenerator,
  extractor: E,
}

impl AriaNormalizer {
  pub fn new(identity: IdentityGenerator) -> Self {
    Self { identity, extractor: RuleExtractor::aria() }
  }
}

impl<E: FieldExtractor> AriaNormalizer<E> {
  /// Use `extractor` instead of the built-in rules for the consequence
  /// summary.
  pub fn with_extractor(identity: IdentityGenerator, extractor: E) -> Self {
    Self { identity, extractor }
  }
}

/// The export carries no facility name, so the site is located by
/// department and commune only.
fn site_key(record: &RawRecord) -> SiteKey {
  let address = [columns::DEPARTMENT, columns::COMMUNE]
    .into_iter()
    .filter_map(|c| record.text(c))
    .collect::<Vec<_>>()
    .join(" ");
  SiteKey::new(None, Some(&address))
}

fn substance(record: &RawRecord, accident_id: Uuid) -> Option<Substance> {
  let name = record.text(columns::MATERIALS);
  let clp_class = record.text(columns::CLP_CLASS);
  if name.is_none() && clp_class.is_none() {
    return None;
  }
  Some(Substance {
    accident_id,
    name: name.map(str::to_owned),
    cas_number: None,
    quantity: None,
    clp_class: clp_class.map(str::to_owned),
  })
}

impl<E: FieldExtractor> Normalizer for AriaNormalizer<E> {
  fn source(&self) -> Source { Source::Aria }

  fn describe(&self, record: &RawRecord) -> String {
    format!(
      "ARIA {} / {:?} / {:?}",
      record.text(columns::NUMBER).unwrap_or("?"),
      record.text(columns::TITLE).unwrap_or_default(),
      record.text(columns::DATE).unwrap_or_default(),
    )
  }

  async fn normalize(
    &self,
    record: &RawRecord,
  ) -> Result<EntityGroup, UnnormalizableRecord> {
    let key = site_key(record);
    let site_id = self.identity.site_id(&key);

    let title = require(record, columns::TITLE)?;
    let accident_date = require_date(record, columns::DATE)?;
    let accident_id = self.identity.accident_id(title, accident_date);

    let text = |column: &str| record.text(column).map(str::to_owned);

    let summary = record.text(columns::CONSEQUENCES).unwrap_or_default();
    let reader = FieldReader::new(&self.extractor, Source::Aria, summary);
    let [fatalities, injuries, evacuated, hospitalized] = fields::HEAD_COUNTS;

    Ok(EntityGroup {
      site:               Site {
        site_id,
        plant_name: key.plant_name,
        address: key.address,
        latitude: None,
        longitude: None,
        country: text(columns::COUNTRY),
        industrial_activity: text(columns::NAF_CODE),
      },
      accident:           Accident {
        accident_id,
        site_id,
        title: title.to_owned(),
        source: Source::Aria,
        source_id: text(columns::NUMBER).unwrap_or_default(),
        accident_date,
        severity_scale: text(columns::SCALE),
        raw_data: record.to_json(),
      },
      cause:              Cause {
        accident_id,
        event_category: text(columns::ROOT_CAUSES),
        failure: text(columns::PRIMARY_CAUSES),
        description: text(columns::CONTENT),
      },
      substances:         substance(record, accident_id).into_iter().collect(),
      consequences_human: HumanConsequences {
        accident_id,
        fatalities: reader.count(fatalities).await,
        injuries: reader.count(injuries).await,
        evacuated: reader.count(evacuated).await,
        hospitalized: reader.count(hospitalized).await,
      },
      consequences_other: OtherConsequences {
        accident_id,
        environmental_impact: reader.text(fields::ENVIRONMENTAL_IMPACT).await,
        economic_cost: reader.text(fields::ECONOMIC_COST).await,
        disruption_duration: text(columns::EVENT_TYPE),
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use accidb_core::{
    ExtractionError,
    extract::{Extracted, testing::StaticExtractor},
    identity::MISSING_COMPONENT,
  };
  use chrono::NaiveDate;

  use super::*;

  fn identity() -> IdentityGenerator { IdentityGenerator::new(Uuid::NAMESPACE_URL) }

  fn row(title: &str, date: &str) -> RawRecord {
    [
      (columns::NUMBER, "54321"),
      (columns::TITLE, title),
      (columns::DATE, date),
      (columns::DEPARTMENT, "76"),
      (columns::COMMUNE, "ROUEN"),
      (columns::COUNTRY, "FRANCE"),
      (columns::NAF_CODE, "C20.14 - Fabrication d'autres produits chimiques"),
      (columns::SCALE, "2"),
      (columns::ROOT_CAUSES, "Organisation"),
      (columns::PRIMARY_CAUSES, "Défaillance matérielle"),
      (columns::CONTENT, "Une fuite de chlore se produit..."),
      (columns::MATERIALS, "CHLORE"),
      (columns::CLP_CLASS, ""),
      (
        columns::CONSEQUENCES,
        "CONSÉQUENCES HUMAINES, 3 blessés, CONSÉQUENCES ÉCONOMIQUES, Chômage technique",
      ),
      (columns::EVENT_TYPE, "Rejet prolongé"),
    ]
    .into_iter()
    .collect()
  }

  #[tokio::test]
  async fn maps_columns_onto_entities() {
    let group = AriaNormalizer::new(identity())
      .normalize(&row("Fuite de chlore", "12/06/2019"))
      .await
      .unwrap();

    assert_eq!(group.site.plant_name, MISSING_COMPONENT);
    assert_eq!(group.site.address, "76 ROUEN");
    assert_eq!(group.site.country.as_deref(), Some("FRANCE"));
    assert_eq!(group.accident.source, Source::Aria);
    assert_eq!(group.accident.source_id, "54321");
    assert_eq!(
      group.accident.accident_date,
      NaiveDate::from_ymd_opt(2019, 6, 12).unwrap()
    );
    assert_eq!(group.accident.severity_scale.as_deref(), Some("2"));
    assert_eq!(group.accident.raw_data["Titre"], "Fuite de chlore");
    assert_eq!(group.cause.failure.as_deref(), Some("Défaillance matérielle"));

    assert_eq!(group.substances.len(), 1);
    assert_eq!(group.substances[0].name.as_deref(), Some("CHLORE"));
    assert_eq!(group.substances[0].clp_class, None);

    assert_eq!(group.consequences_human.injuries, Some(3));
    assert_eq!(group.consequences_human.fatalities, None);
    assert_eq!(
      group.consequences_other.economic_cost.as_deref(),
      Some("Chômage technique")
    );
    assert_eq!(group.consequences_other.environmental_impact, None);
    assert_eq!(
      group.consequences_other.disruption_duration.as_deref(),
      Some("Rejet prolongé")
    );

    for id in [
      group.cause.accident_id,
      group.consequences_human.accident_id,
      group.consequences_other.accident_id,
      group.substances[0].accident_id,
    ] {
      assert_eq!(id, group.accident.accident_id);
    }
    assert_eq!(group.accident.site_id, group.site.site_id);
  }

  #[tokio::test]
  async fn date_formats_agree_on_the_accident_id() {
    let normalizer = AriaNormalizer::new(identity());
    let a = normalizer.normalize(&row("Incendie", "2019-06-12")).await.unwrap();
    let b = normalizer.normalize(&row("Incendie", "12-06-2019")).await.unwrap();
    assert_eq!(a.accident.accident_id, b.accident.accident_id);
  }

  #[tokio::test]
  async fn missing_title_or_bad_date_is_unnormalizable() {
    let normalizer = AriaNormalizer::new(identity());
    assert!(matches!(
      normalizer.normalize(&row("", "2019-06-12")).await,
      Err(UnnormalizableRecord::MissingField(f)) if f == columns::TITLE
    ));
    assert!(matches!(
      normalizer.normalize(&row("Incendie", "2019-13-45")).await,
      Err(UnnormalizableRecord::InvalidDate { .. })
    ));
  }

  #[tokio::test]
  async fn no_location_falls_into_the_unknown_site() {
    let mut record = row("Incendie", "2019-06-12");
    record.insert(columns::DEPARTMENT, "");
    record.insert(columns::COMMUNE, "nan");
    let group = AriaNormalizer::new(identity()).normalize(&record).await.unwrap();
    assert_eq!(group.site.address, MISSING_COMPONENT);
    assert_eq!(
      group.site.site_id,
      identity().site_id(&SiteKey::new(None, None))
    );
  }

  #[tokio::test]
  async fn extractor_failures_only_null_their_field() {
    let extractor = StaticExtractor::new()
      .with(fields::FATALITIES, Extracted::Number(-2))
      .with(fields::INJURIES, Extracted::Number(4))
      .failing(fields::ECONOMIC_COST, ExtractionError::Transport("down".into()));
    let normalizer = AriaNormalizer::with_extractor(identity(), extractor);

    let group = normalizer.normalize(&row("Incendie", "2019-06-12")).await.unwrap();
    assert_eq!(group.consequences_human.fatalities, None);
    assert_eq!(group.consequences_human.injuries, Some(4));
    assert_eq!(group.consequences_human.evacuated, None);
    assert_eq!(group.consequences_other.economic_cost, None);
  }
}
