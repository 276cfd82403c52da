//! Handlers for `/convocatorias/{id}/interest`.
//!
//! Both directions are idempotent. A notification is dispatched only when the
//! interested set actually changed.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use unxchange_core::{interest::InterestOutcome, role::Identity, store::ConvocatoriaStore};

use super::parse_id;
use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  notify::{self, InterestEvent, InterestEventKind},
};

#[derive(Debug, Serialize)]
pub struct InterestResponse {
  pub status:  InterestOutcome,
  pub message: &'static str,
}

/// `POST /convocatorias/{id}/interest`
pub async fn register<S>(
  Authenticated(identity): Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<InterestResponse>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  toggle(&state, identity, &id, InterestEventKind::Registered).await
}

/// `DELETE /convocatorias/{id}/interest`
pub async fn withdraw<S>(
  Authenticated(identity): Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<InterestResponse>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  toggle(&state, identity, &id, InterestEventKind::Withdrawn).await
}

async fn toggle<S>(
  state: &AppState<S>,
  identity: Identity,
  raw_id: &str,
  kind: InterestEventKind,
) -> Result<Json<InterestResponse>, ApiError>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(raw_id)?;
  let record = state
    .store
    .find_one(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found(id))?;

  let user = identity.subject.clone();
  let outcome = match kind {
    InterestEventKind::Registered => state.store.add_interest(id, user).await,
    InterestEventKind::Withdrawn => state.store.remove_interest(id, user).await,
  }
  .map_err(ApiError::store)?
  .ok_or_else(|| ApiError::not_found(id))?;

  tracing::info!(%id, subject = %identity.subject, status = ?outcome, "interest toggled");
  if outcome.changed() {
    let event = InterestEvent::new(kind, &identity, &record);
    notify::dispatch(Arc::clone(&state.notifier), event);
  }

  Ok(Json(InterestResponse { status: outcome, message: outcome.message() }))
}
