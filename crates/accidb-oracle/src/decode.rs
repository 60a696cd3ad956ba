//! Decoding of model answers into [`Extracted`] values.

use accidb_core::{
  ExtractionError,
  extract::{Extracted, FieldSchema, SubstanceItem},
  normalize::parse_count,
  record::parse_date,
};
use serde_json::Value;

/// Decode a `{"response": <value>}` answer for `field`. `null` is
/// [`Extracted::Absent`]; anything not matching `schema` is
/// [`ExtractionError::Malformed`].
pub fn decode_response(
  field: &str,
  schema: FieldSchema,
  content: &str,
) -> Result<Extracted, ExtractionError> {
  let malformed = |reason: String| ExtractionError::Malformed {
    field: field.to_owned(),
    reason,
  };

  let answer: Value = serde_json::from_str(content.trim())
    .map_err(|e| malformed(format!("not json: {e}")))?;
  let value = answer
    .get("response")
    .ok_or_else(|| malformed("no \"response\" key".to_owned()))?;

  if value.is_null() {
    return Ok(Extracted::Absent);
  }

  match schema {
    FieldSchema::Number => number(value)
      .map(Extracted::Number)
      .ok_or_else(|| malformed(format!("{value} is not an integer"))),
    FieldSchema::Text => value
      .as_str()
      .map(|s| Extracted::Text(s.to_owned()))
      .ok_or_else(|| malformed(format!("{value} is not a string"))),
    FieldSchema::Date => value
      .as_str()
      .and_then(parse_date)
      .map(Extracted::Date)
      .ok_or_else(|| malformed(format!("{value} is not a date"))),
    FieldSchema::Substances => {
      serde_json::from_value::<Vec<SubstanceItem>>(value.clone())
        .map(Extracted::Substances)
        .map_err(|e| malformed(format!("bad substance list: {e}")))
    }
  }
}

/// Integers, integral floats and count strings (`"3"`, `"2.0"`).
fn number(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
    Value::String(s) => parse_count(s).map(i64::from),
    _ => None,
  }
}
