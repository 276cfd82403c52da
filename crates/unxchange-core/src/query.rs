//! Translation of list-endpoint query parameters into a store filter.
//!
//! [`build`] is pure: the same [`ListParams`] always yields the same
//! [`Filter`] and [`Window`], with predicates in a fixed order, so the
//! serialised filter is byte-stable.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, convocatoria::Convocatoria};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 200;
/// Minimum length, in characters, of the free-text search parameter.
pub const MIN_SEARCH_LEN: usize = 3;

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Raw query parameters accepted by `GET /convocatorias`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListParams {
  /// Free-text search over institution, country and properties.
  pub q:                  Option<String>,
  pub country:            Option<String>,
  pub language:           Option<String>,
  pub state:              Option<String>,
  #[serde(rename = "agreementType", alias = "agreement_type")]
  pub agreement_type:     Option<String>,
  #[serde(rename = "subscriptionLevel", alias = "subscription_level")]
  pub subscription_level: Option<String>,
  pub limit:              Option<i64>,
  pub skip:               Option<i64>,
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A record field that predicates can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
  Country,
  Languages,
  State,
  AgreementType,
  SubscriptionLevel,
}

impl Field {
  fn values(self, record: &Convocatoria) -> Vec<&str> {
    let doc = &record.document;
    match self {
      Field::Country => vec![doc.country.as_str()],
      Field::Languages => doc.languages.iter().map(String::as_str).collect(),
      Field::State => vec![doc.state.as_str()],
      Field::AgreementType => vec![doc.agreement_type.as_str()],
      Field::SubscriptionLevel => vec![doc.subscription_level.as_str()],
    }
  }
}

/// A single condition. String operands are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
  /// Any term equals a word of institution, country or properties.
  Text { terms: Vec<String> },
  /// Case-insensitive whole-value equality.
  Equals { field: Field, value: String },
  /// Case-insensitive substring match.
  Contains { field: Field, value: String },
}

impl Predicate {
  fn matches(&self, record: &Convocatoria) -> bool {
    match self {
      Predicate::Text { terms } => {
        let doc = &record.document;
        let indexed = [
          doc.institution.as_str(),
          doc.country.as_str(),
          doc.properties.as_deref().unwrap_or_default(),
        ];
        indexed
          .into_iter()
          .flat_map(words)
          .any(|word| terms.contains(&word))
      }
      Predicate::Equals { field, value } => field
        .values(record)
        .into_iter()
        .any(|v| v.to_lowercase() == *value),
      Predicate::Contains { field, value } => field
        .values(record)
        .into_iter()
        .any(|v| v.to_lowercase().contains(value.as_str())),
    }
  }
}

/// The logical AND of zero or more predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
  predicates: Vec<Predicate>,
}

impl Filter {
  pub fn predicates(&self) -> &[Predicate] { &self.predicates }

  pub fn is_unconstrained(&self) -> bool { self.predicates.is_empty() }

  pub fn matches(&self, record: &Convocatoria) -> bool {
    self.predicates.iter().all(|p| p.matches(record))
  }
}

/// Pagination bounds handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
  pub skip:  u64,
  pub limit: u64,
}

impl Default for Window {
  fn default() -> Self { Self { skip: 0, limit: DEFAULT_LIMIT as u64 } }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the filter and result window for `params`.
///
/// Blank filter values are treated as absent. A supplied `q` shorter than
/// [`MIN_SEARCH_LEN`] and out-of-range pagination are rejected.
pub fn build(params: &ListParams) -> Result<(Filter, Window)> {
  let mut predicates = Vec::new();

  if let Some(q) = params.q.as_deref() {
    let q = q.trim();
    if q.chars().count() < MIN_SEARCH_LEN {
      return Err(Error::SearchTooShort { min: MIN_SEARCH_LEN });
    }
    predicates.push(Predicate::Text { terms: words(q).collect() });
  }

  let fields = [
    (Field::Country, &params.country, true),
    (Field::Languages, &params.language, false),
    (Field::State, &params.state, true),
    (Field::AgreementType, &params.agreement_type, true),
    (Field::SubscriptionLevel, &params.subscription_level, false),
  ];
  for (field, value, exact) in fields {
    let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    else {
      continue;
    };
    let value = value.to_lowercase();
    predicates.push(if exact {
      Predicate::Equals { field, value }
    } else {
      Predicate::Contains { field, value }
    });
  }

  let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
  if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
    return Err(Error::LimitOutOfRange { got: limit, min: MIN_LIMIT, max: MAX_LIMIT });
  }
  let skip = params.skip.unwrap_or(0);
  let skip = u64::try_from(skip).map_err(|_| Error::NegativeSkip(skip))?;

  Ok((Filter { predicates }, Window { skip, limit: limit as u64 }))
}

/// Lower-cased maximal alphanumeric runs of `s`.
fn words(s: &str) -> impl Iterator<Item = String> + '_ {
  s.split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(str::to_lowercase)
}
