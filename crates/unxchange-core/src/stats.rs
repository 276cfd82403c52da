//! Aggregate counts over the whole collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::convocatoria::Convocatoria;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total_records:   u64,
  pub active_records:  u64,
  /// Number of `(record, user)` interest registrations.
  pub total_interests: u64,
  /// Records per language, keyed by the normalised language name.
  pub languages:       BTreeMap<String, u64>,
}

impl Stats {
  pub fn from_records<'a, I>(records: I) -> Self
  where
    I: IntoIterator<Item = &'a Convocatoria>,
  {
    let mut stats = Self::default();
    for record in records {
      stats.total_records += 1;
      if record.is_active() {
        stats.active_records += 1;
      }
      stats.total_interests += record.interested_users.len() as u64;
      for language in &record.document.languages {
        *stats.languages.entry(language.clone()).or_default() += 1;
      }
    }
    stats
  }
}
