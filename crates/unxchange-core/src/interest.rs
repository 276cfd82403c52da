//! Interest registration outcomes.

use serde::{Deserialize, Serialize};

/// Result of adding or removing a user from a record's interested set.
///
/// Both directions are idempotent; the no-op outcomes are reported distinctly
/// so callers can tell whether anything changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestOutcome {
  Added,
  AlreadyInterested,
  Removed,
  NotInterested,
}

impl InterestOutcome {
  /// `true` if the membership set was modified.
  pub fn changed(self) -> bool { matches!(self, Self::Added | Self::Removed) }

  pub fn message(self) -> &'static str {
    match self {
      Self::Added => "interest registered",
      Self::AlreadyInterested => "interest was already registered",
      Self::Removed => "interest withdrawn",
      Self::NotInterested => "no registered interest to withdraw",
    }
  }
}
