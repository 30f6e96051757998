use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use smartsheet_client::JobServiceApi;

/// Requests the stub service has seen, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub bodies: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    pub fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.bodies.lock().unwrap())
    }
}

async fn autofill(State(rec): State<Recorded>, Json(body): Json<Value>) -> impl IntoResponse {
    let rows = body["rows"].as_array().map_or(0, Vec::len);
    let cols = body["cols"].as_array().map_or(0, Vec::len);
    let omit_id = body["rows"][0] == "no-id";
    rec.bodies
        .lock()
        .unwrap()
        .push(("/api/v1/autofill".to_string(), body));
    if omit_id {
        return (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Autofill processing started", "jobCount": rows * cols })),
        );
    }
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Autofill processing started",
            "autofillId": "autofill_0f3a",
            "jobCount": rows * cols,
            "status": "accepted",
        })),
    )
}

async fn sheet_run(
    State(rec): State<Recorded>,
    Path(sheet_id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let data_rows = body["table"].as_array().map_or(0, |t| t.len().saturating_sub(1));
    rec.bodies
        .lock()
        .unwrap()
        .push((format!("/api/v1/sheets/{sheet_id}/run"), body));
    (
        StatusCode::ACCEPTED,
        Json(json!({ "sheetId": sheet_id, "jobCount": data_rows })),
    )
}

async fn autofill_status(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return (StatusCode::NOT_FOUND, "autofill not found").into_response();
    }
    if id == "expired" {
        return Json(json!({ "results": {}, "error": "autofill expired" })).into_response();
    }
    Json(json!({
        "results": {
            "0:0": "{\"result\":\"100\",\"trace_id\":\"t-1\",\"status\":\"completed\",\"timestamp\":1700000000}",
            "0:1": "not json",
        }
    }))
    .into_response()
}

async fn sheet_status(Path(_id): Path<String>) -> impl IntoResponse {
    Json(json!({
        "results": {
            "1:0": {"result": "Paris", "timestamp": 1700000001.5, "status": "completed"},
        }
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Spawn a stub job service on an ephemeral port and return a client
/// pointed at it.
pub async fn spawn_stub() -> (JobServiceApi, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/v1/autofill", post(autofill))
        .route("/api/v1/autofill/{id}/status", get(autofill_status))
        .route("/api/v1/sheets/{id}/run", post(sheet_run))
        .route("/api/v1/sheets/{id}/status", get(sheet_status))
        .route("/health", get(health))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (JobServiceApi::new(format!("http://{addr}")), recorded)
}
