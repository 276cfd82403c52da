//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders as `{"kind": "...", "error": "..."}` where `kind` is
//! one of `validation`, `unauthorized`, `forbidden`, `not_found`, `upstream`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use unxchange_core::{convocatoria::ConvocatoriaId, role::Role};

use crate::auth::AuthError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Unauthorized(#[from] AuthError),

  #[error("insufficient permissions for this action; current role: {role}")]
  Forbidden { role: Role },

  #[error("{0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }

  pub fn not_found(id: ConvocatoriaId) -> Self {
    ApiError::NotFound(format!("convocatoria {id} not found"))
  }

  /// Machine-readable discriminator rendered as `kind`.
  pub fn kind(&self) -> &'static str {
    match self {
      ApiError::Validation(_) => "validation",
      ApiError::Unauthorized(_) => "unauthorized",
      ApiError::Forbidden { .. } => "forbidden",
      ApiError::NotFound(_) => "not_found",
      ApiError::Store(_) => "upstream",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<unxchange_core::Error> for ApiError {
  fn from(e: unxchange_core::Error) -> Self {
    if e.is_validation() {
      ApiError::Validation(e.to_string())
    } else {
      ApiError::store(e)
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::Validation(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::Validation(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = match &self {
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        "internal server error".to_string()
      }
      other => other.to_string(),
    };

    let mut response =
      (self.status(), Json(json!({ "kind": self.kind(), "error": message }))).into_response();

    if matches!(self, ApiError::Unauthorized(_)) {
      response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
  }
}
