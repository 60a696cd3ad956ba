//! Prompt registry: which question to ask for which field, and the shape of
//! the answer.

use std::collections::HashMap;

use accidb_core::extract::{FieldSchema, fields};
use serde_json::{Value, json};

const PLACEHOLDER: &str = "{context}";

#[derive(Debug, Clone)]
pub struct Prompt {
  /// Contains `{context}` where the record text goes.
  pub template: String,
  pub schema:   FieldSchema,
}

impl Prompt {
  pub fn render(&self, context: &str) -> String {
    self.template.replace(PLACEHOLDER, context)
  }
}

#[derive(Debug, Clone)]
pub struct PromptSet {
  pub system: String,
  prompts:    HashMap<String, Prompt>,
}

impl PromptSet {
  pub fn new(system: impl Into<String>) -> Self {
    Self { system: system.into(), prompts: HashMap::new() }
  }

  pub fn with(
    mut self,
    field: &str,
    template: impl Into<String>,
    schema: FieldSchema,
  ) -> Self {
    self
      .prompts
      .insert(field.to_owned(), Prompt { template: template.into(), schema });
    self
  }

  pub fn get(&self, field: &str) -> Option<&Prompt> { self.prompts.get(field) }

  /// French prompts over an EPICEA accident summary.
  pub fn epicea() -> Self {
    Self::new(EPICEA_SYSTEM)
      .with(fields::TITLE, TITLE, FieldSchema::Text)
      .with(fields::ACCIDENT_DATE, ACCIDENT_DATE, FieldSchema::Date)
      .with(fields::SUBSTANCES, SUBSTANCES, FieldSchema::Substances)
      .with(fields::FATALITIES, count_prompt("morts (décès)"), FieldSchema::Number)
      .with(fields::INJURIES, count_prompt("blessés, légers ou graves"), FieldSchema::Number)
      .with(fields::EVACUATED, count_prompt("personnes évacuées"), FieldSchema::Number)
      .with(
        fields::HOSPITALIZED,
        count_prompt("personnes hospitalisées"),
        FieldSchema::Number,
      )
      .with(
        fields::ENVIRONMENTAL_IMPACT,
        text_prompt("les conséquences environnementales (pollution, rejets)"),
        FieldSchema::Text,
      )
      .with(
        fields::ECONOMIC_COST,
        text_prompt("les conséquences économiques (dégâts, pertes, chômage technique)"),
        FieldSchema::Text,
      )
      .with(
        fields::DISRUPTION_DURATION,
        text_prompt("la durée d'interruption de l'activité"),
        FieldSchema::Text,
      )
  }
}

const EPICEA_SYSTEM: &str = "Tu es un expert en extraction de données. On te \
  passe la description non structurée d'un accident du travail et tu dois la \
  convertir dans la structure JSON demandée. Réponds uniquement en français, \
  de façon courte et précise. Si l'information n'est pas mentionnée, réponds \
  null.";

const TITLE: &str = "Génère un titre concis (moins de 10 mots) qui résume \
  l'essentiel de cette description d'accident :\n{context}\n\nExemple : \
  \"Fuite propane avec périmètre sécurité 300m\". Réponds uniquement avec le \
  titre, sans guillemets ni explication.";

const ACCIDENT_DATE: &str = "À quelle date l'accident suivant a-t-il eu lieu ?\n\
  {context}\n\nRéponds avec une date au format AAAA-MM-JJ, ou null si elle \
  n'est pas mentionnée.";

const SUBSTANCES: &str = "Extrait les substances chimiques ou nuisibles \
  mentionnées explicitement dans cette description :\n{context}\n\n- Noms \
  exacts du texte (ex. propane, H2S, ammoniac).\n- Quantité seulement si \
  chiffrée (ex. \"2000L\"), sinon chaîne vide.\n- Liste vide s'il n'y en a \
  aucune.";

fn count_prompt(what: &str) -> String {
  format!(
    "Extrait le nombre exact de {what} dans cette description d'accident :\n\
     {PLACEHOLDER}\n\n- Si le nombre est donné, réponds ce nombre.\n- S'il \
     n'est pas mentionné ou pas chiffré, réponds null.\n\nRéponds uniquement \
     avec un nombre entier ou null."
  )
}

fn text_prompt(what: &str) -> String {
  format!(
    "Résume en une phrase {what} décrites dans ce texte :\n{PLACEHOLDER}\n\n\
     Réponds null si le texte n'en parle pas."
  )
}

// ─── Response schema ─────────────────────────────────────────────────────────

/// JSON Schema of the `{"response": ...}` object the model must return.
pub fn json_schema(schema: FieldSchema) -> Value {
  let response = match schema {
    FieldSchema::Number => json!({ "type": ["integer", "null"] }),
    FieldSchema::Text => json!({ "type": ["string", "null"] }),
    FieldSchema::Date => json!({
      "type": ["string", "null"],
      "description": "YYYY-MM-DD",
    }),
    FieldSchema::Substances => json!({
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "name":       { "type": "string" },
          "cas_number": { "type": "string" },
          "quantity":   { "type": "string" },
          "clp_class":  { "type": "string" },
        },
        "required": ["name", "cas_number", "quantity", "clp_class"],
        "additionalProperties": false,
      },
    }),
  };

  json!({
    "type": "object",
    "properties": { "response": response },
    "required": ["response"],
    "additionalProperties": false,
  })
}
