//! axum handlers, one module per resource.

pub mod convocatorias;
pub mod interest;
pub mod stats;

use axum::Json;
use serde_json::{Value, json};
use unxchange_core::convocatoria::ConvocatoriaId;

use crate::error::ApiError;

/// `GET /`: public welcome message.
pub async fn root() -> Json<Value> {
  Json(json!({ "message": "Bienvenido a la API de Convocatorias UnxChange" }))
}

/// Parse a path segment as a record id; malformed ids are a validation error.
pub(crate) fn parse_id(raw: &str) -> Result<ConvocatoriaId, ApiError> {
  Ok(raw.parse::<ConvocatoriaId>()?)
}
