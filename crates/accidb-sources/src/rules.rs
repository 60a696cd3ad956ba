//! Rule-based field extraction.
//!
//! A [`RuleExtractor`] is a strategy map from field name to a pure parsing
//! function plus the schema it produces. Rules never fail: text they cannot
//! make sense of yields [`Extracted::Absent`].
//!
//! The ARIA rule set reads the export's consequence summary, a run of
//! sections shaped like
//!
//! ```text
//! CONSÉQUENCES HUMAINES, 2 blessés graves, 1 mort, CONSÉQUENCES ÉCONOMIQUES, 3 M€
//! ```

use std::{collections::HashMap, sync::OnceLock};

use accidb_core::{
  ExtractionError,
  extract::{Extracted, FieldExtractor, FieldSchema, fields},
  normalize::parse_count,
};
use regex::Regex;

pub type RuleFn = fn(&str) -> Extracted;

#[derive(Clone, Copy)]
pub struct Rule {
  pub schema: FieldSchema,
  pub apply:  RuleFn,
}

#[derive(Clone, Default)]
pub struct RuleExtractor {
  rules: HashMap<String, Rule>,
}

impl RuleExtractor {
  pub fn new() -> Self { Self::default() }

  pub fn with_rule(mut self, field: &str, schema: FieldSchema, apply: RuleFn) -> Self {
    self.rules.insert(field.to_owned(), Rule { schema, apply });
    self
  }

  /// Rules over the ARIA `Conséquences` column.
  pub fn aria() -> Self {
    Self::new()
      .with_rule(fields::FATALITIES, FieldSchema::Number, fatalities)
      .with_rule(fields::INJURIES, FieldSchema::Number, injuries)
      .with_rule(fields::EVACUATED, FieldSchema::Number, evacuated)
      .with_rule(fields::HOSPITALIZED, FieldSchema::Number, hospitalized)
      .with_rule(fields::ENVIRONMENTAL_IMPACT, FieldSchema::Text, environmental_impact)
      .with_rule(fields::ECONOMIC_COST, FieldSchema::Text, economic_cost)
  }
}

impl FieldExtractor for RuleExtractor {
  async fn extract(
    &self,
    field: &str,
    context: &str,
  ) -> Result<Extracted, ExtractionError> {
    let rule = self
      .rules
      .get(field)
      .ok_or_else(|| ExtractionError::UnknownField(field.to_owned()))?;

    let value = (rule.apply)(context);
    if value.conforms_to(rule.schema) {
      Ok(value)
    } else {
      Err(ExtractionError::SchemaMismatch {
        field:    field.to_owned(),
        expected: rule.schema,
      })
    }
  }
}

// ─── Consequence sections ────────────────────────────────────────────────────

const SECTION_MARKER: &str = "CONSÉQUENCES ";

const HUMAN: &str = "HUMAINES";
const ENVIRONMENTAL: &str = "ENVIRONNEMENTALES";
const ECONOMIC: &str = "ÉCONOMIQUES";

/// Split a consequence summary into `(kind, body)` sections.
pub fn consequence_sections(summary: &str) -> Vec<(&str, &str)> {
  summary
    .split(SECTION_MARKER)
    .filter_map(|part| {
      let (kind, body) = part.split_once(',').unwrap_or((part, ""));
      let kind = kind.trim();
      if kind.is_empty() {
        return None;
      }
      Some((kind, body.trim().trim_end_matches(',').trim_end()))
    })
    .collect()
}

fn section<'s>(summary: &'s str, kind: &str) -> Option<&'s str> {
  consequence_sections(summary)
    .into_iter()
    .find(|(k, _)| k.to_uppercase() == kind)
    .map(|(_, body)| body)
    .filter(|body| !body.is_empty())
}

fn section_text(summary: &str, kind: &str) -> Extracted {
  section(summary, kind)
    .map(|body| Extracted::Text(body.to_owned()))
    .unwrap_or(Extracted::Absent)
}

fn environmental_impact(summary: &str) -> Extracted {
  section_text(summary, ENVIRONMENTAL)
}

fn economic_cost(summary: &str) -> Extracted { section_text(summary, ECONOMIC) }

// ─── Head counts ─────────────────────────────────────────────────────────────

/// Words that may sit between a number and the noun it counts
/// (`3 personnes évacuées`, `2 employés blessés`).
const QUALIFIERS: &str =
  "personnes?|employés?|salariés?|riverains?|ouvriers?|pompiers?";

/// `<number> [qualifier] <noun>` where the noun starts with one of `nouns`.
fn mention_pattern(nouns: &str) -> Regex {
  Regex::new(&format!(r"(?i)\b([0-9]+)\s+(?:(?:{QUALIFIERS})\s+)?(?:{nouns})\w*"))
    .expect("valid head-count pattern")
}

fn fatalities_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| mention_pattern("mort|décè|décéd|tué"))
}

fn injuries_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| mention_pattern("bless"))
}

fn evacuated_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| mention_pattern("évacu"))
}

fn hospitalized_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| mention_pattern("hospitalis"))
}

/// Sum every mention matched by `pattern` in the human section. Absent when
/// the section or the mention is, or when a count does not fit.
fn count_mentions(summary: &str, pattern: &Regex) -> Extracted {
  let Some(body) = section(summary, HUMAN) else {
    return Extracted::Absent;
  };

  let mut total: Option<u32> = None;
  for caps in pattern.captures_iter(body) {
    let Some(n) = parse_count(&caps[1]) else {
      return Extracted::Absent;
    };
    let Some(sum) = total.unwrap_or(0).checked_add(n) else {
      return Extracted::Absent;
    };
    total = Some(sum);
  }

  total.map_or(Extracted::Absent, |n| Extracted::Number(i64::from(n)))
}

fn fatalities(summary: &str) -> Extracted { count_mentions(summary, fatalities_re()) }

fn injuries(summary: &str) -> Extracted { count_mentions(summary, injuries_re()) }

fn evacuated(summary: &str) -> Extracted { count_mentions(summary, evacuated_re()) }

fn hospitalized(summary: &str) -> Extracted {
  count_mentions(summary, hospitalized_re())
}
