//! An in-process stand-in for the remote API, served on a random local port.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::api::{ApiClient, DEFAULT_TIMEOUT};

pub(crate) const FAKE_USER: &str = "ana";
pub(crate) const FAKE_PASSWORD: &str = "correct horse battery staple";
pub(crate) const FAKE_TOKEN: &str = "fake-session-token";

#[derive(Clone, Default)]
struct FakeApiState {
    records: Arc<Mutex<Vec<Value>>>,
    log_ins: Arc<Mutex<Vec<Value>>>,
    fetch_count: Arc<AtomicUsize>,
    fail_fetches: Arc<AtomicBool>,
}

pub(crate) struct FakeApi {
    base_url: String,
    state: FakeApiState,
}

impl FakeApi {
    pub(crate) async fn start() -> Self {
        let state = FakeApiState::default();
        let router = Router::new()
            .route("/api/auth/login", post(log_in))
            .route("/api/auth/register", post(register))
            .route("/api/aspirantes", get(list_records).post(create_record))
            .route(
                "/api/aspirantes/{id}",
                put(update_record).delete(delete_record),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind fake API listener");
        let address = listener
            .local_addr()
            .expect("Could not get fake API address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fake API server failed");
        });

        Self {
            base_url: format!("http://{address}"),
            state,
        }
    }

    pub(crate) fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, DEFAULT_TIMEOUT).expect("Could not create API client")
    }

    pub(crate) fn set_records(&self, records: Vec<Value>) {
        *self.state.records.lock().unwrap() = records;
    }

    pub(crate) fn records(&self) -> Vec<Value> {
        self.state.records.lock().unwrap().clone()
    }

    pub(crate) fn received_log_ins(&self) -> Vec<Value> {
        self.state.log_ins.lock().unwrap().clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.state.fetch_count.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_fetches(&self, fail: bool) {
        self.state.fail_fetches.store(fail, Ordering::SeqCst);
    }
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header == format!("Bearer {FAKE_TOKEN}"))
}

async fn log_in(State(state): State<FakeApiState>, Json(body): Json<Value>) -> Response {
    state.log_ins.lock().unwrap().push(body.clone());

    if body["user"] == FAKE_USER && body["password"] == FAKE_PASSWORD {
        Json(json!({ "token": FAKE_TOKEN })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["user"] == FAKE_USER {
        (
            StatusCode::CONFLICT,
            Json(json!({ "message": "User already exists" })),
        )
            .into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

async fn list_records(State(state): State<FakeApiState>, headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    state.fetch_count.fetch_add(1, Ordering::SeqCst);

    if state.fail_fetches.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Json(state.records.lock().unwrap().clone()).into_response()
}

async fn create_record(
    State(state): State<FakeApiState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    state.records.lock().unwrap().push(body.clone());

    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_record(
    State(state): State<FakeApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut records = state.records.lock().unwrap();

    match records.iter_mut().find(|record| record["_id"] == id.as_str()) {
        Some(record) => {
            body["_id"] = Value::String(id);
            *record = body.clone();
            Json(body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_record(
    State(state): State<FakeApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut records = state.records.lock().unwrap();
    let count_before = records.len();
    records.retain(|record| record["_id"] != id.as_str());

    if records.len() < count_before {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
