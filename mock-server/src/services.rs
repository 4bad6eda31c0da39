//! Services outside the REST API: token issuance, data download/streaming,
//! data upload and the notification WebSocket.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::rest::disposition_file_name;
use crate::{form_fields, unauthorized, AppState, PASSWORD, USER};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/fmetoken/generate", post(generate_token))
        .route("/fmetoken/view", post(view_token))
        .route("/fmedatadownload/{repo}/{ws}", post(data_download))
        .route("/fmedatastreaming/{repo}/{ws}", post(data_streaming))
        .route("/fmedataupload/{repo}/{ws}", post(data_upload))
        .route("/websocket", get(websocket))
}

fn credentials_ok(fields: &HashMap<String, String>) -> bool {
    fields.get("user").map(String::as_str) == Some(USER)
        && fields.get("password").map(String::as_str) == Some(PASSWORD)
}

/// The token service answers with the bare token as text.
async fn generate_token(State(state): State<AppState>, body: Bytes) -> Response {
    let fields = form_fields(&body);
    if !credentials_ok(&fields) {
        return unauthorized();
    }
    if fields.get("expiration").and_then(|e| e.parse::<u32>().ok()).is_none() {
        return (StatusCode::BAD_REQUEST, "expiration must be a number").into_response();
    }
    state.token.as_str().to_string().into_response()
}

async fn view_token(State(state): State<AppState>, body: Bytes) -> Response {
    if !credentials_ok(&form_fields(&body)) {
        return unauthorized();
    }
    Json(json!({ "token": state.token.as_str(), "expirationDate": "" })).into_response()
}

fn token_ok(state: &AppState, fields: &HashMap<String, String>) -> bool {
    fields.get("token").is_some_and(|t| *t == *state.token)
}

async fn data_download(
    State(state): State<AppState>,
    Path((repo, ws)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let mut fields = form_fields(&body);
    if !token_ok(&state, &fields) {
        return unauthorized();
    }
    fields.remove("token");
    let id = state.store.write().await.next_id();
    Json(json!({
        "serviceResponse": {
            "statusInfo": { "status": "success", "mode": "sync" },
            "jobID": id,
            "url": format!("/fmedatadownload/results/{repo}_{ws}_{id}.zip"),
            "parameters": fields
        }
    }))
    .into_response()
}

async fn data_streaming(
    State(state): State<AppState>,
    Path((repo, ws)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let fields = form_fields(&body);
    if !token_ok(&state, &fields) {
        return unauthorized();
    }
    let mut rows = format!("repository,workspace\n{repo},{ws}\n");
    for (k, v) in fields.iter().filter(|(k, _)| k.as_str() != "token") {
        rows.push_str(&format!("{k},{v}\n"));
    }
    ([(header::CONTENT_TYPE, "text/csv")], rows).into_response()
}

/// Without `opt_namespace` this opens a session; with it, the body is a
/// file for that session.
async fn data_upload(
    State(state): State<AppState>,
    Path((repo, ws)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(session) = q.get("opt_namespace") else {
        let fields = form_fields(&body);
        if !token_ok(&state, &fields) {
            return unauthorized();
        }
        let session = Uuid::new_v4().to_string();
        state.store.write().await.uploads.insert(session.clone(), BTreeMap::new());
        return Json(json!({
            "serviceResponse": {
                "statusInfo": { "status": "success" },
                "session": session,
                "files": { "path": format!("/{repo}/{ws}/{session}"), "archive": [] }
            }
        }))
        .into_response();
    };

    if !token_ok(&state, &q) {
        return unauthorized();
    }
    let Some(file_name) = disposition_file_name(&headers) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "missing filename" }))).into_response();
    };
    let mut store = state.store.write().await;
    let Some(files) = store.uploads.get_mut(session) else {
        return crate::not_found(&format!("Session \"{session}\""));
    };
    let size = body.len();
    files.insert(file_name.clone(), body);
    let names: Vec<Value> = files
        .iter()
        .map(|(name, data)| json!({ "name": name, "size": data.len() }))
        .collect();
    debug!(session = %session, file = %file_name, size, "stored upload");
    Json(json!({
        "serviceResponse": {
            "statusInfo": { "status": "success" },
            "session": session,
            "files": { "path": format!("/{repo}/{ws}/{session}"), "archive": names }
        }
    }))
    .into_response()
}

async fn websocket(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(handle_socket)
}

/// Wait for the open handshake, acknowledge it, then echo every text frame
/// back as a notification on the opened stream.
async fn handle_socket(mut socket: WebSocket) {
    let mut stream_id: Option<String> = None;
    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let reply = match (&stream_id, serde_json::from_str::<Value>(text.as_str())) {
            (None, Ok(open)) if open["ws_op"] == "open" => {
                let id = open["ws_stream_id"].as_str().unwrap_or_default().to_string();
                let reply = json!({ "ws_op": "opened", "ws_stream_id": id });
                stream_id = Some(id);
                reply
            }
            (None, _) => json!({ "ws_op": "error", "message": "expected an open message" }),
            (Some(id), _) => json!({ "ws_stream_id": id, "notification": text.as_str() }),
        };
        if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
            break;
        }
    }
}
