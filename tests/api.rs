use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use roteiro::{
    auth::{self, AuthPhase, AuthSession},
    error::{Action, AppError},
    forms::{CreateTripForm, GuestForm, LoginForm},
    kv::keys,
    models::{
        notification::{Notification, NotificationKind},
        remote::UpdateTripRequest,
        trip::GuestRole,
    },
    services::{api::ApiClient, storage::StorageService},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const TOKEN: &str = "tok-1";

#[derive(Default)]
struct Backend {
    calls: Mutex<Vec<(String, Value)>>,
}

type Shared = Arc<Backend>;

impl Backend {
    fn record(&self, call: &str, body: Value) {
        self.calls
            .lock()
            .unwrap()
            .push((call.to_string(), body));
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

fn user() -> Value {
    json!({ "id": "u1", "nome": "Ana Maria Souza", "email": "ana@example.com" })
}

fn trip(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "titulo": title,
        "localPartida": "São Paulo",
        "localDestino": "Paraty",
        "dataPartida": "2025-03-01T12:00:00Z",
        "dataRetorno": "2025-03-04T12:00:00Z",
        "participantes": [{ "userId": "u2", "role": "EDITOR" }]
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["senha"] == "123456789" {
        (
            StatusCode::OK,
            Json(json!({ "token": TOKEN, "userInfo": user() })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Senha incorreta" })),
        )
    }
}

async fn me(headers: HeaderMap) -> impl IntoResponse {
    if authorized(&headers) {
        (StatusCode::OK, Json(user()))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })))
    }
}

#[derive(Deserialize)]
struct EmailQuery {
    email: String,
}

async fn by_email(Query(query): Query<EmailQuery>) -> impl IntoResponse {
    if query.email == "ana@example.com" {
        (StatusCode::OK, Json(user()))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Usuário não encontrado" })))
    }
}

async fn create_trip(State(backend): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let title = body["titulo"].as_str().unwrap_or_default().to_string();
    backend.record("create-trip", body);
    Json(trip("t9", &title))
}

async fn my_trips() -> Json<Value> {
    Json(json!([trip("t1", "Primeira"), trip("t2", "Segunda")]))
}

async fn participating() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" })))
}

async fn update_trip(Path(id): Path<String>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Viagem {id} não encontrada") })),
    )
}

async fn friend_request(State(backend): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    backend.record("friend/request", body);
    StatusCode::OK
}

async fn accept_friend(State(backend): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    backend.record("friend/accept-friend", body);
    StatusCode::OK
}

async fn decline_friend(State(backend): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    backend.record("friend/decline-friend", body);
    StatusCode::OK
}

async fn decline_invite(State(backend): State<Shared>, Path(id): Path<String>) -> StatusCode {
    backend.record("convites/recusar", json!(id));
    StatusCode::OK
}

async fn notifications() -> Json<Value> {
    Json(json!([
        {
            "id": "n1",
            "type": "friend_request",
            "senderName": "Bia",
            "referenceId": "req-7",
            "createdAt": "2025-03-01T12:00:00Z"
        },
        {
            "id": "n2",
            "tipo": "TRIP_INVITE",
            "senderName": "Caio",
            "referenceId": "inv-3",
            "tripName": "Paraty",
            "createdAt": "2025-03-02T12:00:00Z"
        },
        {
            "id": "n3",
            "type": "alert",
            "createdAt": "2025-03-03T12:00:00Z"
        }
    ]))
}

async fn delete_notification(
    State(backend): State<Shared>,
    Path(id): Path<String>,
) -> StatusCode {
    backend.record("notifications/delete", json!(id));
    StatusCode::NO_CONTENT
}

async fn spawn_backend() -> (String, Shared) {
    let backend = Shared::default();
    let api = Router::new()
        .route("/users/login", post(login))
        .route("/users/me", get(me))
        .route("/users/by-email", get(by_email))
        .route("/trips/create-trip", post(create_trip))
        .route("/trips/minhas-viagens", get(my_trips))
        .route("/trips/participando", get(participating))
        .route("/trips/:id", patch(update_trip))
        .route("/trips/convites/:id/recusar", post(decline_invite))
        .route("/friend/request", post(friend_request))
        .route("/friend/accept-friend", post(accept_friend))
        .route("/friend/decline-friend", post(decline_friend))
        .route("/notifications/minhasNotificacoes", get(notifications))
        .route("/notifications/:id", delete(delete_notification))
        .with_state(backend.clone());
    let app = Router::new().nest("/api", api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), backend)
}

fn client(base_url: &str, storage: &StorageService) -> ApiClient {
    ApiClient::new(base_url, storage.clone(), Duration::from_secs(2)).unwrap()
}

async fn signed_in(base_url: &str) -> (ApiClient, StorageService) {
    let storage = StorageService::in_memory();
    storage.set_raw(keys::USER_TOKEN, TOKEN).await.unwrap();
    storage.set_raw(keys::USER_ID, "u1").await.unwrap();
    (client(base_url, &storage), storage)
}

#[tokio::test]
async fn login_stores_the_session() {
    let (base_url, _) = spawn_backend().await;
    let storage = StorageService::in_memory();
    let api = client(&base_url, &storage);
    let mut session = AuthSession::load(storage.clone()).await;
    session.complete_onboarding().await.unwrap();

    let form = LoginForm {
        email: "ana@example.com".into(),
        password: "123456789".into(),
    };
    let user = auth::login(&api, &mut session, &form).await.unwrap();

    assert_eq!(user.short_name(), "Ana Souza");
    assert_eq!(session.phase(), AuthPhase::Authenticated);
    assert_eq!(storage.get_raw(keys::USER_TOKEN).await.as_deref(), Some(TOKEN));
    assert_eq!(storage.get_raw(keys::USER_ID).await.as_deref(), Some("u1"));
    assert_eq!(
        storage.get_raw(keys::USER_EMAIL).await.as_deref(),
        Some("ana@example.com")
    );

    // The stored token is what authorizes the next call.
    assert_eq!(api.me().await.unwrap().id, "u1");
}

#[tokio::test]
async fn rejected_login_shows_the_server_message() {
    let (base_url, _) = spawn_backend().await;
    let storage = StorageService::in_memory();
    let api = client(&base_url, &storage);

    let err = api.login("ana@example.com", "wrong-password").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    let alert = err.alert_for(Action::Login);
    assert_eq!(alert.title, "Invalid credentials");
    assert_eq!(alert.message, "Senha incorreta");
    assert_eq!(storage.get_raw(keys::USER_TOKEN).await, None);
}

#[tokio::test]
async fn invalid_login_form_never_reaches_the_backend() {
    let storage = StorageService::in_memory();
    let api = client("http://127.0.0.1:9/api", &storage);
    let mut session = AuthSession::load(storage).await;
    let form = LoginForm {
        email: "ana".into(),
        password: "123".into(),
    };
    let err = auth::login(&api, &mut session, &form).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn authenticated_calls_need_a_token() {
    let storage = StorageService::in_memory();
    // Nothing listens here; a request would fail with a network error.
    let api = client("http://127.0.0.1:9/api", &storage);
    assert!(matches!(api.me().await, Err(AppError::MissingToken)));
    assert!(matches!(api.my_trips().await, Err(AppError::MissingToken)));
}

#[tokio::test]
async fn unknown_email_is_not_an_error() {
    let (base_url, _) = spawn_backend().await;
    let (api, _) = signed_in(&base_url).await;

    let found = api.user_by_email("ana@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.name), Some("Ana Maria Souza".to_string()));
    assert!(api.user_by_email("ghost@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn trip_form_is_sent_with_backend_field_names() {
    let (base_url, backend) = spawn_backend().await;
    let (api, _) = signed_in(&base_url).await;

    let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let form = CreateTripForm {
        name: "Feriado em Paraty".into(),
        departure_location: "São Paulo".into(),
        destination: "Paraty".into(),
        start_date: start,
        end_date: start + chrono::Duration::days(3),
        description: None,
        image_uri: None,
        activities: Vec::new(),
        guests: vec![GuestForm {
            id: "u2".into(),
            email: "bia@example.com".into(),
            role: GuestRole::Editor,
        }],
    };
    let created = api.create_trip(&form.to_request()).await.unwrap();
    assert_eq!(created.id, "t9");
    assert_eq!(created.title, "Feriado em Paraty");
    assert_eq!(created.participants[0].role, GuestRole::Editor);

    let calls = backend.calls();
    let (call, body) = &calls[0];
    assert_eq!(call, "create-trip");
    assert_eq!(body["localPartida"], "São Paulo");
    assert_eq!(body["participantes"], json!(["bia@example.com"]));
    assert!(body.get("descricao").is_none());
}

#[tokio::test]
async fn overview_survives_failing_participating_list() {
    let (base_url, _) = spawn_backend().await;
    let (api, _) = signed_in(&base_url).await;

    let overview = api.trip_overview().await.unwrap();
    let ids: Vec<&str> = overview.created.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "t1"]);
    assert!(overview.participating.is_empty());

    let err = api.participating_trips().await.unwrap_err();
    assert_eq!(err.alert_for(Action::LoadTrips).message, "boom");
}

#[tokio::test]
async fn error_field_is_used_when_message_is_missing() {
    let (base_url, _) = spawn_backend().await;
    let (api, _) = signed_in(&base_url).await;

    let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let patch = UpdateTripRequest {
        title: "Novo nome".into(),
        origin: "São Paulo".into(),
        destination: "Paraty".into(),
        start_date: start,
        end_date: start + chrono::Duration::days(1),
        description: None,
    };
    let err = api.update_trip("t404", &patch).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.alert_for(Action::SaveTrip).message,
        "Viagem t404 não encontrada"
    );
}

#[tokio::test]
async fn friend_request_carries_both_user_ids() {
    let (base_url, backend) = spawn_backend().await;
    let (api, storage) = signed_in(&base_url).await;

    api.send_friend_request("u2").await.unwrap();
    assert_eq!(
        backend.calls()[0].1,
        json!({ "solicitanteId": "u1", "solicitadoId": "u2" })
    );

    storage.remove(keys::USER_ID).await.unwrap();
    assert!(matches!(
        api.send_friend_request("u2").await,
        Err(AppError::MissingUserId)
    ));
}

#[tokio::test]
async fn notifications_are_answered_by_kind() {
    let (base_url, backend) = spawn_backend().await;
    let (api, _) = signed_in(&base_url).await;

    let items = api.notifications().await.unwrap();
    let kinds: Vec<NotificationKind> = items.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::FriendRequest,
            NotificationKind::TripInvite,
            NotificationKind::Alert
        ]
    );

    api.respond_to(&items[0], true).await.unwrap();
    api.respond_to(&items[1], false).await.unwrap();
    let err = api.respond_to(&items[2], true).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    api.delete_notification("n3").await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls[0].0, "friend/accept-friend");
    assert_eq!(calls[0].1, json!({ "solicitacaoId": "req-7" }));
    assert_eq!(calls[1], ("convites/recusar".to_string(), json!("inv-3")));
    assert_eq!(calls[2], ("notifications/delete".to_string(), json!("n3")));
}

#[tokio::test]
async fn unreachable_backend_reports_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let storage = StorageService::in_memory();
    let api = client(&format!("http://{addr}/api"), &storage);
    let err = api.login("ana@example.com", "123456789").await.unwrap_err();

    assert!(err.is_connectivity());
    assert_eq!(err.alert_for(Action::Login).title, "Connection error");
}

#[tokio::test]
async fn only_invites_and_friend_requests_take_an_answer() {
    let (base_url, backend) = spawn_backend().await;
    let (api, _) = signed_in(&base_url).await;

    let request: Notification = serde_json::from_value(json!({
        "id": "n7",
        "type": "friend_request",
        "referenceId": "req-9",
        "createdAt": "2025-03-01T12:00:00Z"
    }))
    .unwrap();
    api.respond_to(&request, false).await.unwrap();

    let unknown: Notification = serde_json::from_value(json!({
        "id": "n8",
        "type": "trip_reminder",
        "referenceId": "t1",
        "timestamp": "2025-03-01T12:00:00Z"
    }))
    .unwrap();
    assert_eq!(unknown.kind, NotificationKind::Unknown);
    for accept in [true, false] {
        let err = api.respond_to(&unknown, accept).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "friend/decline-friend");
    assert_eq!(calls[0].1, json!({ "solicitacaoId": "req-9" }));
}
