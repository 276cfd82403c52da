//! Roles and verified identities.
//!
//! Identities are derived per request from a signed token and never stored.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The closed set of roles a token may carry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Administrador,
  Profesional,
  Usuario,
}

impl Role {
  /// `true` if this role is one of `required`.
  pub fn allows(self, required: &[Role]) -> bool { required.contains(&self) }
}

/// A verified `(subject, role)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// Usually the user's email address.
  pub subject: String,
  pub role:    Role,
}

impl Identity {
  /// The local part of the subject when it is an email, else the subject.
  pub fn username(&self) -> &str {
    self
      .subject
      .split_once('@')
      .map_or(self.subject.as_str(), |(local, _)| local)
  }
}
