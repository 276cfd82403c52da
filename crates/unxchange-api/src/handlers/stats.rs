use axum::{Json, extract::State};
use unxchange_core::{stats::Stats, store::ConvocatoriaStore};

use crate::{
  AppState,
  auth::{AdminOnly, Authorized},
  error::ApiError,
};

/// `GET /convocatorias/stats`
pub async fn get<S>(
  _: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
) -> Result<Json<Stats>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let stats = state.store.stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}
