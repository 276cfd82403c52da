//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt as _;
use unxchange_store_sqlite::SqliteStore;

use crate::{
  AppState,
  auth::AuthPolicy,
  notify::{InterestEvent, InterestEventKind, Notifier, NotifyError},
  router,
};

const SECRET: &str = "router-test-secret";

struct RecordingNotifier(mpsc::UnboundedSender<InterestEvent>);

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn send_interest_event(&self, event: &InterestEvent) -> Result<(), NotifyError> {
    let _ = self.0.send(event.clone());
    Ok(())
  }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
  async fn send_interest_event(&self, _: &InterestEvent) -> Result<(), NotifyError> {
    Err(NotifyError::Status { status: 503, body: "unavailable".into() })
  }
}

async fn make_state() -> (AppState<SqliteStore>, mpsc::UnboundedReceiver<InterestEvent>) {
  let (tx, rx) = mpsc::unbounded_channel();
  let state = AppState {
    store:    Arc::new(SqliteStore::open_in_memory().await.unwrap()),
    auth:     Arc::new(AuthPolicy::new(SECRET, Algorithm::HS256).unwrap()),
    notifier: Arc::new(RecordingNotifier(tx)),
  };
  (state, rx)
}

fn token_with(sub: &str, role: &str, exp_offset: i64, secret: &str) -> String {
  let claims = json!({
    "sub":  sub,
    "role": role,
    "exp":  chrono::Utc::now().timestamp() + exp_offset,
  });
  encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

fn admin() -> String { token_with("admin@unal.edu.co", "administrador", 3600, SECRET) }
fn professional() -> String { token_with("prof@unal.edu.co", "profesional", 3600, SECRET) }
fn user() -> String { token_with("ana@unal.edu.co", "usuario", 3600, SECRET) }

async fn oneshot_raw(
  state: AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  router(state).oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn call(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let response = oneshot_raw(state.clone(), method, uri, token, body).await;
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn sample(country: &str, institution: &str) -> Value {
  json!({
    "subscriptionYear":  "2024",
    "country":           country,
    "institution":       institution,
    "agreementType":     "Intercambio",
    "validity":          "2024 - 2028",
    "state":             "Vigente",
    "subscriptionLevel": "Universidad Nacional",
    "languages":         ["inglés", "Alemán", "ingles ", "Inglés"],
  })
}

async fn create(state: &AppState<SqliteStore>, body: Value) -> String {
  let (status, record) = call(state, "POST", "/convocatorias", Some(&admin()), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{record}");
  record["id"].as_str().unwrap().to_string()
}

// ── Public and authentication ────────────────────────────────────────────────

#[tokio::test]
async fn root_is_public() {
  let (state, _) = make_state().await;
  let (status, body) = call(&state, "GET", "/", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Bienvenido a la API de Convocatorias UnxChange");
}

#[tokio::test]
async fn missing_token_is_401_without_data() {
  let (state, _) = make_state().await;
  create(&state, sample("Alemania", "TU Berlin")).await;

  let response = oneshot_raw(state, "GET", "/convocatorias", None, None).await;
  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["kind"], "unauthorized");
  assert!(!body.to_string().contains("TU Berlin"));
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_401() {
  let (state, _) = make_state().await;

  let expired = token_with("ana@x.org", "usuario", -3600, SECRET);
  let (status, _) = call(&state, "GET", "/convocatorias", Some(&expired), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let foreign = token_with("ana@x.org", "administrador", 3600, "not-our-secret");
  let (status, _) = call(&state, "GET", "/convocatorias", Some(&foreign), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let unknown_role = token_with("ana@x.org", "root", 3600, SECRET);
  let (status, _) = call(&state, "GET", "/convocatorias", Some(&unknown_role), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_without_expiry_is_accepted_by_the_router() {
  let (state, _) = make_state().await;
  let claims = json!({ "sub": "ana@unal.edu.co", "role": "usuario" });
  let token =
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

  let (status, body) = call(&state, "GET", "/convocatorias", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
}

// ── Role guards ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn usuario_cannot_create_and_error_names_role() {
  let (state, _) = make_state().await;
  let (status, body) = call(
    &state,
    "POST",
    "/convocatorias",
    Some(&user()),
    Some(sample("Chile", "U. de Chile")),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "forbidden");
  assert!(body["error"].as_str().unwrap().contains("usuario"));

  let (_, list) = call(&state, "GET", "/convocatorias", Some(&user()), None).await;
  assert_eq!(list, json!([]));
}

#[tokio::test]
async fn professional_can_create_but_not_patch_or_delete() {
  let (state, _) = make_state().await;
  let (status, record) = call(
    &state,
    "POST",
    "/convocatorias",
    Some(&professional()),
    Some(sample("Chile", "U. de Chile")),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = record["id"].as_str().unwrap();
  let uri = format!("/convocatorias/{id}");

  let patch = json!({ "state": "No Vigente" });
  let (status, _) = call(&state, "PATCH", &uri, Some(&professional()), Some(patch)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(&state, "DELETE", &uri, Some(&professional()), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(&state, "GET", "/convocatorias/stats", Some(&professional()), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── CRUD ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_crud_round_trip() {
  let (state, _) = make_state().await;

  let (status, created) = call(
    &state,
    "POST",
    "/convocatorias",
    Some(&admin()),
    Some(sample("Alemania", "TU Berlin")),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["languages"], json!(["Inglés", "Alemán", "Ingles"]));
  assert_eq!(created["interestedUsers"], json!([]));
  let id = created["id"].as_str().unwrap().to_string();
  let uri = format!("/convocatorias/{id}");

  let (status, fetched) = call(&state, "GET", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let patch = json!({ "country": "Updated" });
  let (status, body) = call(&state, "PATCH", &uri, Some(&user()), Some(patch.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "forbidden");

  let (status, updated) = call(&state, "PATCH", &uri, Some(&admin()), Some(patch)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["country"], "Updated");
  assert_eq!(updated["institution"], "TU Berlin");
  assert_eq!(updated["state"], created["state"]);
  assert_eq!(updated["validity"], created["validity"]);
  assert_eq!(updated["languages"], created["languages"]);

  let (status, body) = call(&state, "DELETE", &uri, Some(&admin()), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);

  let (status, body) = call(&state, "GET", &uri, Some(&admin()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");

  let (status, _) = call(&state, "DELETE", &uri, Some(&admin()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_requires_country_and_institution() {
  let (state, _) = make_state().await;

  let (status, body) = call(
    &state,
    "POST",
    "/convocatorias",
    Some(&admin()),
    Some(json!({ "institution": "TU Berlin" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");

  let (status, _) = call(
    &state,
    "POST",
    "/convocatorias",
    Some(&admin()),
    Some(json!({ "country": "  ", "institution": "TU Berlin" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_patch_is_rejected() {
  let (state, _) = make_state().await;
  let id = create(&state, sample("Chile", "U")).await;
  let uri = format!("/convocatorias/{id}");

  let (status, body) = call(&state, "PATCH", &uri, Some(&admin()), Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn malformed_id_is_a_validation_error() {
  let (state, _) = make_state().await;
  let (status, body) =
    call(&state, "GET", "/convocatorias/not-an-id", Some(&user()), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

// ── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_case_insensitively() {
  let (state, _) = make_state().await;
  create(&state, sample("Alemania", "TU Berlin")).await;
  create(&state, sample("Chile", "U. de Chile")).await;
  let mut french = sample("Francia", "Sorbonne");
  french["languages"] = json!(["Francés"]);
  create(&state, french).await;

  let (status, body) =
    call(&state, "GET", "/convocatorias?country=alemania", Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["institution"], "TU Berlin");

  let (_, body) = call(&state, "GET", "/convocatorias?language=franc", Some(&user()), None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["country"], "Francia");

  let (_, body) = call(&state, "GET", "/convocatorias?q=chile", Some(&user()), None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (_, body) =
    call(&state, "GET", "/convocatorias?country=&state=vigente", Some(&user()), None).await;
  assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn list_window_bounds_are_enforced() {
  let (state, _) = make_state().await;
  for n in 0..3 {
    create(&state, sample("Chile", &format!("Institution {n}"))).await;
  }

  for uri in ["/convocatorias?limit=0", "/convocatorias?limit=201", "/convocatorias?skip=-1"] {
    let (status, body) = call(&state, "GET", uri, Some(&user()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert_eq!(body["kind"], "validation");
  }

  let (status, body) = call(&state, "GET", "/convocatorias?limit=abc", Some(&user()), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");

  let (status, _) = call(&state, "GET", "/convocatorias?q=ab", Some(&user()), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    call(&state, "GET", "/convocatorias?limit=2&skip=1", Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = body.as_array().unwrap().iter().map(|r| r["institution"].clone()).collect();
  assert_eq!(names, vec![json!("Institution 1"), json!("Institution 2")]);

  let (status, _) = call(&state, "GET", "/convocatorias?limit=200", Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
}

// ── Interest ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registering_twice_records_once_and_notifies_once() {
  let (state, mut events) = make_state().await;
  let id = create(&state, sample("Alemania", "TU Berlin")).await;
  let uri = format!("/convocatorias/{id}/interest");

  let (status, body) = call(&state, "POST", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "added");

  let (status, body) = call(&state, "POST", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "already_interested");

  let (_, record) = call(&state, "GET", &format!("/convocatorias/{id}"), Some(&user()), None).await;
  assert_eq!(record["interestedUsers"], json!(["ana@unal.edu.co"]));

  let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(event.kind, InterestEventKind::Registered);
  assert_eq!(event.user_email, "ana@unal.edu.co");
  assert_eq!(event.username, "ana");
  assert_eq!(event.summary.institution, "TU Berlin");

  let second = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
  assert!(second.is_err(), "no notification expected for a no-op");
}

#[tokio::test]
async fn withdrawing_twice_is_a_no_op() {
  let (state, mut events) = make_state().await;
  let id = create(&state, sample("Chile", "U")).await;
  let uri = format!("/convocatorias/{id}/interest");

  call(&state, "POST", &uri, Some(&user()), None).await;
  let (status, body) = call(&state, "DELETE", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "removed");

  let (status, body) = call(&state, "DELETE", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "not_interested");

  let kinds: Vec<_> = [
    tokio::time::timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap(),
    tokio::time::timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap(),
  ]
  .iter()
  .map(|e| e.kind)
  .collect();
  assert!(kinds.contains(&InterestEventKind::Registered));
  assert!(kinds.contains(&InterestEventKind::Withdrawn));
}

#[tokio::test]
async fn interest_on_missing_record_is_404() {
  let (state, _) = make_state().await;
  let uri = format!("/convocatorias/{}/interest", uuid_like());
  let (status, body) = call(&state, "POST", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_request() {
  let (mut state, _) = make_state().await;
  state.notifier = Arc::new(FailingNotifier);
  let id = create(&state, sample("Chile", "U")).await;

  let uri = format!("/convocatorias/{id}/interest");
  let (status, body) = call(&state, "POST", &uri, Some(&user()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "added");
}

// ── Stats ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_are_admin_only_and_aggregate() {
  let (state, _) = make_state().await;
  let id = create(&state, sample("Alemania", "TU Berlin")).await;
  let mut inactive = sample("Chile", "U");
  inactive["state"] = json!("No Vigente");
  create(&state, inactive).await;
  call(&state, "POST", &format!("/convocatorias/{id}/interest"), Some(&user()), None).await;

  let (status, _) = call(&state, "GET", "/convocatorias/stats", Some(&user()), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, stats) = call(&state, "GET", "/convocatorias/stats", Some(&admin()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stats["totalRecords"], 2);
  assert_eq!(stats["activeRecords"], 1);
  assert_eq!(stats["totalInterests"], 1);
  assert_eq!(stats["languages"]["Inglés"], 2);
}

fn uuid_like() -> &'static str { "3f2b8c1e-9d4a-4e7b-8a61-2c5d9e0f1a23" }
