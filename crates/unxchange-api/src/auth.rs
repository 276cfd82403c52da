//! Bearer-token authorization: JWT verification and role guards.
//!
//! [`AuthPolicy`] is a pure function of the token and the shared secret.
//! Handlers never call it directly; they declare a guard extractor instead:
//!
//! - [`Authenticated`]: any valid identity.
//! - [`Authorized<G>`]: a valid identity whose role is in `G::ALLOWED`.

use std::marker::PhantomData;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;
use unxchange_core::{
  role::{Identity, Role},
  store::ConvocatoriaStore,
};

use crate::{AppState, error::ApiError};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a request could not be authenticated.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("missing bearer token")]
  MissingToken,
  #[error("authorization scheme is not Bearer")]
  WrongScheme,
  #[error("token has expired")]
  Expired,
  #[error("token signature is invalid")]
  InvalidSignature,
  #[error("token algorithm is not accepted")]
  AlgorithmMismatch,
  #[error("token is missing the `{0}` claim")]
  MissingClaim(&'static str),
  #[error("token carries unknown role {0:?}")]
  UnknownRole(String),
  #[error("malformed token: {0}")]
  Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
  fn from(e: jsonwebtoken::errors::Error) -> Self {
    match e.kind() {
      ErrorKind::ExpiredSignature => AuthError::Expired,
      ErrorKind::InvalidSignature => AuthError::InvalidSignature,
      ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch,
      _ => AuthError::Malformed(e.to_string()),
    }
  }
}

/// Invalid policy configuration, reported at startup.
#[derive(Debug, Error)]
pub enum PolicyError {
  #[error("JWT secret must not be empty")]
  EmptySecret,
  #[error("algorithm {0:?} is not a shared-secret (HMAC) algorithm")]
  UnsupportedAlgorithm(Algorithm),
}

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct Claims {
  sub:  Option<String>,
  role: Option<String>,
}

/// Verifies tokens signed with a shared secret and a single fixed algorithm.
pub struct AuthPolicy {
  key:        DecodingKey,
  validation: Validation,
}

impl AuthPolicy {
  pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, PolicyError> {
    if secret.is_empty() {
      return Err(PolicyError::EmptySecret);
    }
    if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
      return Err(PolicyError::UnsupportedAlgorithm(algorithm));
    }
    // Exactly this one algorithm. `exp` is optional but enforced when present.
    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims.clear();
    validation.validate_exp = true;
    Ok(Self { key: DecodingKey::from_secret(secret.as_bytes()), validation })
  }

  /// Decode `token`, check signature and expiry, and extract the identity.
  pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;

    let subject = data
      .claims
      .sub
      .filter(|s| !s.is_empty())
      .ok_or(AuthError::MissingClaim("sub"))?;
    let role = data.claims.role.ok_or(AuthError::MissingClaim("role"))?;
    let role = role
      .parse::<Role>()
      .map_err(|_| AuthError::UnknownRole(role))?;

    Ok(Identity { subject, role })
  }

  /// Extract the bearer token from `headers` and verify it.
  pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
    self.verify(bearer_token(headers)?)
  }
}

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(AuthError::MissingToken)?;

  let (scheme, token) = value.split_once(' ').ok_or(AuthError::WrongScheme)?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return Err(AuthError::WrongScheme);
  }

  let token = token.trim();
  if token.is_empty() {
    return Err(AuthError::MissingToken);
  }
  Ok(token)
}

/// Fail with [`ApiError::Forbidden`] unless `identity` has one of `allowed`.
pub fn require_role(identity: Identity, allowed: &[Role]) -> Result<Identity, ApiError> {
  if identity.role.allows(allowed) {
    return Ok(identity);
  }
  tracing::warn!(
    subject = %identity.subject,
    role = %identity.role,
    "forbidden: role not allowed for this action"
  );
  Err(ApiError::Forbidden { role: identity.role })
}

// ─── Guards ──────────────────────────────────────────────────────────────────

/// A static set of roles allowed through an [`Authorized`] guard.
pub trait Guard {
  const ALLOWED: &'static [Role];
}

pub struct AdminOnly;

impl Guard for AdminOnly {
  const ALLOWED: &'static [Role] = &[Role::Administrador];
}

pub struct AdminOrProfessional;

impl Guard for AdminOrProfessional {
  const ALLOWED: &'static [Role] = &[Role::Administrador, Role::Profesional];
}

/// Present in a handler: the request carries a valid token.
pub struct Authenticated(pub Identity);

/// Present in a handler: the request carries a valid token whose role is in
/// `G::ALLOWED`.
pub struct Authorized<G> {
  pub identity: Identity,
  _guard:       PhantomData<fn() -> G>,
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = state
      .auth
      .authenticate(&parts.headers)
      .inspect_err(|e| tracing::debug!(error = %e, "rejected credentials"))?;
    Ok(Authenticated(identity))
  }
}

impl<S, G> FromRequestParts<AppState<S>> for Authorized<G>
where
  S: ConvocatoriaStore + Clone + Send + Sync + 'static,
  G: Guard,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;
    let identity = require_role(identity, G::ALLOWED)?;
    Ok(Authorized { identity, _guard: PhantomData })
  }
}
