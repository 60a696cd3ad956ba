//! EPICEA adapter: work-accident records scraped from the INRS database.
//!
//! Records carry almost no structured data beyond the dossier number and a
//! few coded labels; title, substances and consequences are read out of the
//! accident summary by an extractor, typically the model-assisted one.

use accidb_core::{
  UnnormalizableRecord,
  entity::{
    Accident, Cause, EntityGroup, HumanConsequences, OtherConsequences, Site,
    Source, Substance,
  },
  extract::{FieldExtractor, SubstanceItem, fields},
  identity::{IdentityGenerator, SiteKey},
  normalize::{FieldReader, Normalizer, non_empty, require, require_date},
  record::RawRecord,
};
use tracing::debug;
use uuid::Uuid;

/// Field names of a scraped record.
pub mod columns {
  pub const DOSSIER: &str = "Numéro du dossier";
  pub const DATE: &str = "Date de l'accident";
  pub const TECHNICAL_COMMITTEE: &str = "Comité technique national";
  pub const COMPANY_CODE: &str = "Code entreprise";
  pub const EQUIPMENT: &str = "Matériel en cause";
  pub const SUMMARY: &str = "Résumé de l'accident";
}

const COUNTRY: &str = "France";

/// The label half of a coded value: `"D - Services, commerces"` becomes
/// `"Services, commerces"`. Values without a code are returned as they are.
pub fn label_part(value: &str) -> &str {
  value.split_once(" - ").map_or(value, |(_, label)| label).trim()
}

pub struct EpiceaNormalizer<E> {
  identity:  IdentityGenerator,
  extractor: E,
}

impl<E: FieldExtractor> EpiceaNormalizer<E> {
  pub fn new(identity: IdentityGenerator, extractor: E) -> Self {
    Self { identity, extractor }
  }

  pub fn extractor(&self) -> &E { &self.extractor }
}

fn substance(item: SubstanceItem, accident_id: Uuid) -> Substance {
  Substance {
    accident_id,
    name: non_empty(&item.name),
    cas_number: non_empty(&item.cas_number),
    quantity: non_empty(&item.quantity),
    clp_class: non_empty(&item.clp_class),
  }
}

impl<E: FieldExtractor> Normalizer for EpiceaNormalizer<E> {
  fn source(&self) -> Source { Source::Epicea }

  fn describe(&self, record: &RawRecord) -> String {
    format!("EPICEA dossier {}", record.text(columns::DOSSIER).unwrap_or("?"))
  }

  async fn normalize(
    &self,
    record: &RawRecord,
  ) -> Result<EntityGroup, UnnormalizableRecord> {
    let summary = require(record, columns::SUMMARY)?;
    let reader = FieldReader::new(&self.extractor, Source::Epicea, summary);
    debug!(dossier = record.text(columns::DOSSIER), "extracting from summary");

    // Plant and address are never published.
    let key = SiteKey::new(None, None);
    let site_id = self.identity.site_id(&key);

    let title = reader.required_text(fields::TITLE).await?;
    let accident_date = match record.text(columns::DATE) {
      Some(_) => require_date(record, columns::DATE)?,
      None => reader.required_date(fields::ACCIDENT_DATE).await?,
    };
    let accident_id = self.identity.accident_id(&title, accident_date);

    let label = |column: &str| record.text(column).map(label_part).and_then(non_empty);

    let substances = reader
      .substances(fields::SUBSTANCES)
      .await
      .into_iter()
      .map(|item| substance(item, accident_id))
      .collect();

    Ok(EntityGroup {
      site:               Site {
        site_id,
        plant_name: key.plant_name,
        address: key.address,
        latitude: None,
        longitude: None,
        country: Some(COUNTRY.to_owned()),
        industrial_activity: label(columns::TECHNICAL_COMMITTEE),
      },
      accident:           Accident {
        accident_id,
        site_id,
        title,
        source: Source::Epicea,
        source_id: record.text(columns::DOSSIER).unwrap_or_default().to_owned(),
        accident_date,
        severity_scale: None,
        raw_data: record.to_json(),
      },
      cause:              Cause {
        accident_id,
        event_category: label(columns::COMPANY_CODE),
        failure: record.text(columns::EQUIPMENT).map(str::to_owned),
        description: Some(summary.to_owned()),
      },
      substances,
      consequences_human: HumanConsequences {
        accident_id,
        fatalities: reader.count(fields::FATALITIES).await,
        injuries: reader.count(fields::INJURIES).await,
        evacuated: reader.count(fields::EVACUATED).await,
        hospitalized: reader.count(fields::HOSPITALIZED).await,
      },
      consequences_other: OtherConsequences {
        accident_id,
        environmental_impact: reader.text(fields::ENVIRONMENTAL_IMPACT).await,
        economic_cost: reader.text(fields::ECONOMIC_COST).await,
        disruption_duration: reader.text(fields::DISRUPTION_DURATION).await,
      },
    })
  }
}
