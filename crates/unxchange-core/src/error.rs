//! Error types for `unxchange-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid convocatoria id: {0:?}")]
  InvalidId(String),

  #[error("field `{0}` must not be blank")]
  BlankField(&'static str),

  #[error("no fields supplied for update")]
  EmptyPatch,

  #[error("search text must be at least {min} characters")]
  SearchTooShort { min: usize },

  #[error("limit must be between {min} and {max}, got {got}")]
  LimitOutOfRange { got: i64, min: i64, max: i64 },

  #[error("skip must not be negative, got {0}")]
  NegativeSkip(i64),

  #[error("unsupported document version {0}")]
  UnsupportedVersion(u32),

  #[error("stored document is not a JSON object")]
  NotAnObject,
}

impl Error {
  /// `true` for errors caused by caller input rather than stored data.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidId(_)
        | Self::BlankField(_)
        | Self::EmptyPatch
        | Self::SearchTooShort { .. }
        | Self::LimitOutOfRange { .. }
        | Self::NegativeSkip(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
