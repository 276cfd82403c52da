//! Convocatoria: an academic-exchange agreement record.
//!
//! A stored record is split in two parts: the [`Document`] body, which is what
//! the document store persists, and the set of interested users, which the
//! store keeps as set membership. [`Convocatoria`] is the assembled read model.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Store-assigned identifier of a convocatoria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConvocatoriaId(Uuid);

impl ConvocatoriaId {
  /// Mint a fresh identifier. Only stores should call this.
  pub fn generate() -> Self { Self(Uuid::new_v4()) }
}

impl From<Uuid> for ConvocatoriaId {
  fn from(id: Uuid) -> Self { Self(id) }
}

impl FromStr for ConvocatoriaId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Uuid::try_parse(s)
      .map(Self)
      .map_err(|_| Error::InvalidId(s.to_owned()))
  }
}

impl fmt::Display for ConvocatoriaId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.hyphenated().fmt(f)
  }
}

// ─── Stored document ─────────────────────────────────────────────────────────

/// The persisted body of a convocatoria, in the current schema version.
///
/// Deserialisation is lenient: every field defaults, so documents written by
/// older producers still load once the legacy adapter has renamed their keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
  pub subscription_year:  String,
  pub country:            String,
  pub institution:        String,
  pub agreement_type:     String,
  pub validity:           String,
  pub state:              String,
  pub subscription_level: String,
  pub languages:          Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dre_link:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub agreement_link:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub international_link: Option<String>,
  #[serde(alias = "Props", skip_serializing_if = "Option::is_none")]
  pub properties:         Option<String>,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A convocatoria as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convocatoria {
  #[serde(alias = "_id")]
  pub id:               ConvocatoriaId,
  #[serde(flatten)]
  pub document:         Document,
  /// Subjects of users who registered interest. Never contains duplicates.
  #[serde(default)]
  pub interested_users: Vec<String>,
}

impl Convocatoria {
  /// Assemble a record, enforcing the set invariants on `languages` and
  /// `interested_users`.
  pub fn from_parts(
    id: ConvocatoriaId,
    mut document: Document,
    interested_users: Vec<String>,
  ) -> Self {
    document.languages = normalize_languages(&document.languages);
    let mut users: Vec<String> = Vec::with_capacity(interested_users.len());
    for user in interested_users {
      if !users.contains(&user) {
        users.push(user);
      }
    }
    Self { id, document, interested_users: users }
  }

  /// `true` if the record's state reads "Vigente" (case-insensitive).
  pub fn is_active(&self) -> bool {
    self.document.state.trim().to_lowercase() == "vigente"
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Request body for creating a convocatoria.
///
/// `country` and `institution` are mandatory; everything else defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConvocatoria {
  pub country:            String,
  pub institution:        String,
  #[serde(default)]
  pub subscription_year:  String,
  #[serde(default)]
  pub agreement_type:     String,
  #[serde(default)]
  pub validity:           String,
  #[serde(default)]
  pub state:              String,
  #[serde(default)]
  pub subscription_level: String,
  #[serde(default)]
  pub languages:          Vec<String>,
  #[serde(default)]
  pub dre_link:           Option<String>,
  #[serde(default)]
  pub agreement_link:     Option<String>,
  #[serde(default)]
  pub international_link: Option<String>,
  #[serde(default, alias = "Props")]
  pub properties:         Option<String>,
}

impl NewConvocatoria {
  /// Check mandatory fields and produce the document to persist.
  pub fn validate(self) -> Result<Document> {
    let country = non_blank("country", self.country)?;
    let institution = non_blank("institution", self.institution)?;
    Ok(Document {
      subscription_year: self.subscription_year,
      country,
      institution,
      agreement_type: self.agreement_type,
      validity: self.validity,
      state: self.state,
      subscription_level: self.subscription_level,
      languages: normalize_languages(&self.languages),
      dre_link: self.dre_link,
      agreement_link: self.agreement_link,
      international_link: self.international_link,
      properties: self.properties,
    })
  }
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// Request body for `PATCH`: only supplied fields change.
///
/// Serialises to a JSON merge patch that omits unsupplied fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvocatoriaPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subscription_year:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country:            Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub institution:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub agreement_type:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub validity:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state:              Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subscription_level: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub languages:          Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dre_link:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub agreement_link:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub international_link: Option<String>,
  #[serde(default, alias = "Props", skip_serializing_if = "Option::is_none")]
  pub properties:         Option<String>,
}

impl ConvocatoriaPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Reject empty patches and blank mandatory fields; normalise languages.
  pub fn validate(mut self) -> Result<Self> {
    if self.is_empty() {
      return Err(Error::EmptyPatch);
    }
    if let Some(country) = self.country.take() {
      self.country = Some(non_blank("country", country)?);
    }
    if let Some(institution) = self.institution.take() {
      self.institution = Some(non_blank("institution", institution)?);
    }
    if let Some(languages) = &self.languages {
      self.languages = Some(normalize_languages(languages));
    }
    Ok(self)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn non_blank(field: &'static str, value: String) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::BlankField(field));
  }
  Ok(trimmed.to_owned())
}

/// Trim, drop blanks, capitalise, and deduplicate keeping first-seen order.
pub fn normalize_languages<S: AsRef<str>>(languages: &[S]) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(languages.len());
  for language in languages {
    let language = language.as_ref().trim();
    if language.is_empty() {
      continue;
    }
    let capitalized = capitalize(language);
    if !out.contains(&capitalized) {
      out.push(capitalized);
    }
  }
  out
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first
      .to_uppercase()
      .chain(chars.flat_map(char::to_lowercase))
      .collect(),
    None => String::new(),
  }
}
