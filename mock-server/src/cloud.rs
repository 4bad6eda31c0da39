//! `/v1` FME Cloud routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::{form_fields, not_found, AppState};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/instances", get(list_instances).post(launch_instance))
        .route("/instances/{id}", get(get_instance))
        .route("/instances/{id}/{op}", get(instance_detail).put(instance_operation))
        .route("/account/balance", get(balance))
        .route("/fme_server_version.json", get(versions))
}

async fn list_instances(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!(store.instances.values().cloned().collect::<Vec<_>>()))
}

async fn launch_instance(State(state): State<AppState>, body: Bytes) -> Response {
    let fields = form_fields(&body);
    let Some(name) = fields.get("name") else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "name is required" })),
        )
            .into_response();
    };
    let mut store = state.store.write().await;
    let id = store.next_id().to_string();
    let instance = json!({
        "id": id,
        "name": name,
        "instance_type": fields.get("instance_type").cloned().unwrap_or_else(|| "standard".to_string()),
        "state": "launching"
    });
    store.instances.insert(id, instance.clone());
    (StatusCode::CREATED, Json(instance)).into_response()
}

async fn get_instance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.read().await.instances.get(&id) {
        Some(instance) => Json(instance.clone()).into_response(),
        None => not_found(&format!("Instance {id}")),
    }
}

async fn instance_detail(State(state): State<AppState>, Path((id, op)): Path<(String, String)>) -> Response {
    if op != "credentials" {
        return not_found(&format!("Resource {op}"));
    }
    if !state.store.read().await.instances.contains_key(&id) {
        return not_found(&format!("Instance {id}"));
    }
    Json(json!({ "username": "admin", "password": format!("pw-{id}") })).into_response()
}

/// pause/start/restart answer with the updated instance; terminate removes
/// it and answers 202 with no body.
async fn instance_operation(
    State(state): State<AppState>,
    Path((id, op)): Path<(String, String)>,
) -> Response {
    let mut store = state.store.write().await;
    if op == "terminate" {
        return match store.instances.remove(&id) {
            Some(_) => StatusCode::ACCEPTED.into_response(),
            None => not_found(&format!("Instance {id}")),
        };
    }
    let next_state = match op.as_str() {
        "pause" => "paused",
        "start" | "restart" => "running",
        _ => return not_found(&format!("Operation {op}")),
    };
    match store.instances.get_mut(&id) {
        Some(instance) => {
            instance["state"] = json!(next_state);
            Json(instance.clone()).into_response()
        }
        None => not_found(&format!("Instance {id}")),
    }
}

async fn balance() -> Json<Value> {
    Json(json!({ "balance": 100.0, "currency": "USD" }))
}

async fn versions() -> Json<Value> {
    Json(json!(["2018.1.0.3", "2017.1.2.1"]))
}
