//! Handlers for `/convocatorias` endpoints.
//!
//! | Method   | Path | Guard | Notes |
//! |----------|------|-------|-------|
//! | `GET`    | `/convocatorias` | any role | Query: `q`, `country`, `language`, `state`, `agreementType`, `subscriptionLevel`, `limit`, `skip` |
//! | `POST`   | `/convocatorias` | admin, professional | 201 with the created record |
//! | `GET`    | `/convocatorias/{id}` | any role | 404 if not found |
//! | `PATCH`  | `/convocatorias/{id}` | admin | Only supplied fields change |
//! | `DELETE` | `/convocatorias/{id}` | admin | 204, physical delete |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use unxchange_core::{
  convocatoria::{Convocatoria, ConvocatoriaPatch, NewConvocatoria},
  query::{self, ListParams},
  store::ConvocatoriaStore,
};

use super::parse_id;
use crate::{
  AppState,
  auth::{AdminOnly, AdminOrProfessional, Authenticated, Authorized},
  error::ApiError,
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /convocatorias[?q=..&country=..&limit=..&skip=..]`
pub async fn list<S>(
  Authenticated(identity): Authenticated,
  State(state): State<AppState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Convocatoria>>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let Query(params) = params?;
  let (filter, window) = query::build(&params)?;
  tracing::debug!(
    subject = %identity.subject,
    filter = %serde_json::to_string(&filter).unwrap_or_default(),
    skip = window.skip,
    limit = window.limit,
    "listing convocatorias"
  );

  let records = state
    .store
    .find(&filter, window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /convocatorias`
pub async fn create<S>(
  Authorized { identity, .. }: Authorized<AdminOrProfessional>,
  State(state): State<AppState<S>>,
  body: Result<Json<NewConvocatoria>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let Json(body) = body?;
  let document = body.validate()?;
  let record = state
    .store
    .insert(document)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %record.id, subject = %identity.subject, "created convocatoria");
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /convocatorias/{id}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Convocatoria>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(&id)?;
  state
    .store
    .find_one(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::not_found(id))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /convocatorias/{id}`, body: any subset of the record fields.
pub async fn update<S>(
  Authorized { identity, .. }: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  body: Result<Json<ConvocatoriaPatch>, JsonRejection>,
) -> Result<Json<Convocatoria>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(&id)?;
  let Json(patch) = body?;
  let patch = patch.validate()?;

  let record = state
    .store
    .update(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found(id))?;
  tracing::info!(%id, subject = %identity.subject, "updated convocatoria");
  Ok(Json(record))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /convocatorias/{id}`
pub async fn delete<S>(
  Authorized { identity, .. }: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(&id)?;
  if !state.store.delete(id).await.map_err(ApiError::store)? {
    return Err(ApiError::not_found(id));
  }
  tracing::info!(%id, subject = %identity.subject, "deleted convocatoria");
  Ok(StatusCode::NO_CONTENT)
}
