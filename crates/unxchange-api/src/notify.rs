//! Best-effort notifications about interest changes.
//!
//! The interest handlers hand an [`InterestEvent`] to [`dispatch`], which
//! delivers it on a spawned task. Delivery failures are logged and dropped;
//! they never affect the HTTP response.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use unxchange_core::{
  convocatoria::{Convocatoria, ConvocatoriaId},
  role::Identity,
};

const ENDPOINT_PATH: &str = "/api/v1/notification/convocatoria-elegida/";
const UNDEFINED_DATE: &str = "Por definir";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("notification request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("notification service answered {status}: {body}")]
  Status { status: u16, body: String },
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestEventKind {
  Registered,
  Withdrawn,
}

/// The parts of a record a notification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
  pub id:             ConvocatoriaId,
  pub institution:    String,
  pub country:        String,
  pub agreement_type: String,
  pub validity:       String,
}

impl From<&Convocatoria> for RecordSummary {
  fn from(record: &Convocatoria) -> Self {
    Self {
      id:             record.id,
      institution:    record.document.institution.clone(),
      country:        record.document.country.clone(),
      agreement_type: record.document.agreement_type.clone(),
      validity:       record.document.validity.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestEvent {
  pub kind:       InterestEventKind,
  pub user_email: String,
  pub username:   String,
  pub summary:    RecordSummary,
}

impl InterestEvent {
  pub fn new(kind: InterestEventKind, identity: &Identity, record: &Convocatoria) -> Self {
    Self {
      kind,
      user_email: identity.subject.clone(),
      username: identity.username().to_owned(),
      summary: RecordSummary::from(record),
    }
  }
}

/// Wire body posted to the notification service.
#[derive(Debug, Serialize)]
pub struct NotificationPayload {
  pub event:                    InterestEventKind,
  pub user_name:                String,
  pub user_email:               String,
  pub convocatoria_titulo:      String,
  pub convocatoria_descripcion: String,
  pub universidad_destino:      String,
  pub fecha_inicio:             String,
  pub fecha_fin:                String,
}

impl From<&InterestEvent> for NotificationPayload {
  fn from(event: &InterestEvent) -> Self {
    let summary = &event.summary;
    let institution = non_blank(&summary.institution).unwrap_or("Universidad");
    let agreement = non_blank(&summary.agreement_type).unwrap_or("intercambio");
    let mut dates = summary.validity.split(" - ");
    let (start, end) = match (dates.next(), dates.next()) {
      (Some(start), Some(end)) => (start.trim().to_owned(), end.trim().to_owned()),
      _ => (UNDEFINED_DATE.to_owned(), UNDEFINED_DATE.to_owned()),
    };

    Self {
      event:                    event.kind,
      user_name:                event.username.clone(),
      user_email:               event.user_email.clone(),
      convocatoria_titulo:      format!("Intercambio en {institution}"),
      convocatoria_descripcion: format!("Programa de {agreement} en {}", summary.country),
      universidad_destino:      summary.institution.clone(),
      fecha_inicio:             start,
      fecha_fin:                end,
    }
  }
}

fn non_blank(s: &str) -> Option<&str> {
  let s = s.trim();
  (!s.is_empty()).then_some(s)
}

// ─── Notifiers ───────────────────────────────────────────────────────────────

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send_interest_event(&self, event: &InterestEvent) -> Result<(), NotifyError>;
}

/// Posts events to an external HTTP notification service.
pub struct HttpNotifier {
  client:   reqwest::Client,
  endpoint: String,
}

impl HttpNotifier {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NotifyError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(NotifyError::Client)?;
    let endpoint = format!("{}{ENDPOINT_PATH}", base_url.trim_end_matches('/'));
    Ok(Self { client, endpoint })
  }

  pub fn endpoint(&self) -> &str { &self.endpoint }
}

#[async_trait]
impl Notifier for HttpNotifier {
  async fn send_interest_event(&self, event: &InterestEvent) -> Result<(), NotifyError> {
    let payload = NotificationPayload::from(event);
    let response = self.client.post(&self.endpoint).json(&payload).send().await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
      let body = response.text().await.unwrap_or_default();
      return Err(NotifyError::Status { status: status.as_u16(), body });
    }
    Ok(())
  }
}

/// Used when no notification service is configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
  async fn send_interest_event(&self, event: &InterestEvent) -> Result<(), NotifyError> {
    tracing::debug!(
      kind = ?event.kind,
      user = %event.user_email,
      record = %event.summary.id,
      "notifications disabled; dropping event"
    );
    Ok(())
  }
}

/// Deliver `event` in the background.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: InterestEvent) {
  tokio::spawn(async move {
    match notifier.send_interest_event(&event).await {
      Ok(()) => tracing::debug!(
        kind = ?event.kind,
        user = %event.user_email,
        record = %event.summary.id,
        "interest notification delivered"
      ),
      Err(e) => tracing::warn!(
        error = %e,
        user = %event.user_email,
        record = %event.summary.id,
        "failed to deliver interest notification"
      ),
    }
  });
}
