//! Versioned adapter applied to stored documents on read.
//!
//! Older producers wrote convocatorias with Spanish or snake_case keys, with
//! `languages` as a single free-text string and `subscriptionYear` as a
//! number. Each stored document carries the schema version it was written
//! with; [`upgrade`] maps it to [`CURRENT_VERSION`] before deserialisation.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Schema version written by this crate.
pub const CURRENT_VERSION: u32 = 2;

/// Version 1 key renames, `(legacy, current)`.
const V1_RENAMES: &[(&str, &str)] = &[
  ("anioSuscripcion", "subscriptionYear"),
  ("añoSuscripcion", "subscriptionYear"),
  ("subscription_year", "subscriptionYear"),
  ("pais", "country"),
  ("país", "country"),
  ("institucion", "institution"),
  ("institución", "institution"),
  ("tipoConvenio", "agreementType"),
  ("agreement_type", "agreementType"),
  ("vigencia", "validity"),
  ("estado", "state"),
  ("nivelSuscripcion", "subscriptionLevel"),
  ("subscription_level", "subscriptionLevel"),
  ("idiomas", "languages"),
  ("enlaceDre", "dreLink"),
  ("dre_link", "dreLink"),
  ("enlaceConvenio", "agreementLink"),
  ("agreement_link", "agreementLink"),
  ("enlaceInternacional", "internationalLink"),
  ("international_link", "internationalLink"),
  ("propiedades", "properties"),
  ("Props", "properties"),
];

/// Upgrade `doc`, written at `version`, to the current schema.
pub fn upgrade(version: u32, doc: Value) -> Result<Value> {
  let Value::Object(mut map) = doc else {
    return Err(Error::NotAnObject);
  };

  // Nulls are never meaningful; dropping them lets field defaults apply.
  map.retain(|_, v| !v.is_null());

  match version {
    1 => upgrade_v1(&mut map),
    CURRENT_VERSION => {}
    other => return Err(Error::UnsupportedVersion(other)),
  }

  Ok(Value::Object(map))
}

fn upgrade_v1(map: &mut Map<String, Value>) {
  map.remove("_id");

  for (legacy, current) in V1_RENAMES {
    if let Some(value) = map.remove(*legacy) {
      map.entry(*current).or_insert(value);
    }
  }

  if let Some(Value::String(raw)) = map.get("languages") {
    let split: Vec<Value> = raw
      .split(|c: char| c.is_whitespace() || c == ',')
      .filter(|s| !s.is_empty())
      .map(|s| Value::String(s.to_owned()))
      .collect();
    map.insert("languages".to_owned(), Value::Array(split));
  }

  if let Some(Value::Number(year)) = map.get("subscriptionYear") {
    let year = year.to_string();
    map.insert("subscriptionYear".to_owned(), Value::String(year));
  }
}
