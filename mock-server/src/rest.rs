//! `/fmerest/v2` routes.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::{conflict, form_fields, not_found, AppState};

const COLLECTIONS: [&str; 3] = ["topics", "publications", "subscriptions"];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(info))
        .route("/repositories", get(list_repositories))
        .route("/repositories/{repo}", get(get_repository))
        .route("/repositories/{repo}/items", get(list_items))
        .route("/repositories/{repo}/items/{ws}", get(get_item))
        .route("/repositories/{repo}/items/{ws}/parameters", get(list_parameters))
        .route("/repositories/{repo}/items/{ws}/parameters/{name}", get(get_parameter))
        .route("/transformations/submit/{repo}/{ws}", post(submit_job))
        .route("/transformations/transact/{repo}/{ws}", post(transact_job))
        .route("/transformations/jobs/id/{id}", get(get_job))
        .route("/transformations/jobs/id/{id}/result", get(get_job))
        .route("/transformations/jobs/running/{id}", delete(cancel_job))
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/schedules/{category}/{name}",
            get(get_schedule).put(replace_schedule).delete(delete_schedule),
        )
        .route("/schedules/{category}/{name}/enabled", put(enable_schedule))
        .route("/notifications/{kind}", get(list_entries).post(create_entry))
        .route(
            "/notifications/{kind}/{name}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/notifications/topics/{topic}/message/publish", post(publish))
        .route("/resources/connections", get(list_connections))
        .route("/resources/connections/{resource}/filesys", get(list_root))
        .route(
            "/resources/connections/{resource}/filesys/{*path}",
            get(get_path).post(post_path).delete(delete_path),
        )
}

async fn info() -> Json<Value> {
    Json(json!({ "build": "FME Server mock", "version": "FME Server", "currentTime": "" }))
}

fn sample_workspace(repo: &str) -> Value {
    json!({ "name": "austinApartments.fmw", "type": "WORKSPACE", "repositoryName": repo })
}

fn sample_parameters() -> Value {
    json!([
        { "name": "COORDSYS", "type": "COORDSYS", "defaultValue": "LL84" },
        { "name": "MAX_RESULTS", "type": "INTEGER", "defaultValue": 10 }
    ])
}

async fn list_repositories(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let detail = q.get("detail").cloned().unwrap_or_else(|| "low".to_string());
    Json(json!({
        "offset": -1,
        "limit": -1,
        "totalCount": 1,
        "items": [{ "name": "Samples", "description": "Sample workspaces", "detail": detail }]
    }))
}

async fn get_repository(Path(repo): Path<String>) -> Response {
    if repo != "Samples" {
        return not_found(&format!("Repository \"{repo}\""));
    }
    Json(json!({ "name": repo, "description": "Sample workspaces" })).into_response()
}

async fn list_items(Path(repo): Path<String>, Query(q): Query<HashMap<String, String>>) -> Response {
    if repo != "Samples" {
        return not_found(&format!("Repository \"{repo}\""));
    }
    let items = match q.get("type").map(String::as_str) {
        None | Some("WORKSPACE") => vec![sample_workspace(&repo)],
        Some(_) => Vec::new(),
    };
    Json(json!({ "totalCount": items.len(), "items": items })).into_response()
}

async fn get_item(Path((repo, ws)): Path<(String, String)>) -> Response {
    if repo != "Samples" || ws != "austinApartments.fmw" {
        return not_found(&format!("Workspace \"{repo}/{ws}\""));
    }
    Json(sample_workspace(&repo)).into_response()
}

async fn list_parameters(Path((repo, ws)): Path<(String, String)>) -> Response {
    if repo != "Samples" || ws != "austinApartments.fmw" {
        return not_found(&format!("Workspace \"{repo}/{ws}\""));
    }
    Json(sample_parameters()).into_response()
}

async fn get_parameter(Path((repo, ws, name)): Path<(String, String, String)>) -> Response {
    let params = sample_parameters();
    let found = params
        .as_array()
        .and_then(|all| all.iter().find(|p| p["name"] == name.as_str()).cloned());
    match found {
        Some(p) if repo == "Samples" && ws == "austinApartments.fmw" => Json(p).into_response(),
        _ => not_found(&format!("Parameter \"{name}\"")),
    }
}

async fn submit_job(
    State(state): State<AppState>,
    Path((repo, ws)): Path<(String, String)>,
    Json(request): Json<Value>,
) -> Response {
    let mut store = state.store.write().await;
    let id = store.next_id();
    store.jobs.insert(
        id,
        json!({ "id": id, "status": "QUEUED", "repository": repo, "workspace": ws, "request": request }),
    );
    (StatusCode::ACCEPTED, Json(json!({ "id": id, "request": request }))).into_response()
}

async fn transact_job(
    State(state): State<AppState>,
    Path((repo, ws)): Path<(String, String)>,
    Json(request): Json<Value>,
) -> Response {
    let mut store = state.store.write().await;
    let id = store.next_id();
    let job = json!({
        "id": id,
        "status": "SUCCESS",
        "repository": repo,
        "workspace": ws,
        "numFeaturesOutput": 0,
        "request": request
    });
    store.jobs.insert(id, job.clone());
    Json(job).into_response()
}

async fn get_job(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.store.read().await.jobs.get(&id) {
        Some(job) => Json(job.clone()).into_response(),
        None => not_found(&format!("Job {id}")),
    }
}

async fn cancel_job(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let mut store = state.store.write().await;
    match store.jobs.get_mut(&id) {
        Some(job) => {
            job["status"] = json!("ABORTED");
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(&format!("Job {id}")),
    }
}

async fn list_schedules(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let items: Vec<Value> = store.schedules.values().cloned().collect();
    Json(json!({ "totalCount": items.len(), "items": items }))
}

fn schedule_key(schedule: &Value) -> Option<(String, String)> {
    Some((
        schedule.get("category")?.as_str()?.to_string(),
        schedule.get("name")?.as_str()?.to_string(),
    ))
}

async fn create_schedule(State(state): State<AppState>, Json(schedule): Json<Value>) -> Response {
    let Some(key) = schedule_key(&schedule) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "A schedule needs a category and a name" })),
        )
            .into_response();
    };
    let mut store = state.store.write().await;
    if store.schedules.contains_key(&key) {
        return conflict(&format!("Schedule \"{}/{}\"", key.0, key.1));
    }
    store.schedules.insert(key, schedule.clone());
    (StatusCode::CREATED, Json(schedule)).into_response()
}

async fn get_schedule(State(state): State<AppState>, Path(key): Path<(String, String)>) -> Response {
    match state.store.read().await.schedules.get(&key) {
        Some(s) => Json(s.clone()).into_response(),
        None => not_found(&format!("Schedule \"{}/{}\"", key.0, key.1)),
    }
}

async fn replace_schedule(
    State(state): State<AppState>,
    Path(key): Path<(String, String)>,
    Json(mut schedule): Json<Value>,
) -> Response {
    if !schedule.is_object() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Schedule body must be a JSON object" })),
        )
            .into_response();
    }
    let mut store = state.store.write().await;
    if !store.schedules.contains_key(&key) {
        return not_found(&format!("Schedule \"{}/{}\"", key.0, key.1));
    }
    schedule["category"] = json!(key.0);
    schedule["name"] = json!(key.1);
    store.schedules.insert(key, schedule.clone());
    Json(schedule).into_response()
}

async fn delete_schedule(State(state): State<AppState>, Path(key): Path<(String, String)>) -> Response {
    match state.store.write().await.schedules.remove(&key) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&format!("Schedule \"{}/{}\"", key.0, key.1)),
    }
}

async fn enable_schedule(
    State(state): State<AppState>,
    Path(key): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let enabled = form_fields(&body).get("value").map(String::as_str) == Some("true");
    let mut store = state.store.write().await;
    match store.schedules.get_mut(&key) {
        Some(s) => {
            s["enabled"] = json!(enabled);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(&format!("Schedule \"{}/{}\"", key.0, key.1)),
    }
}

fn known_collection(kind: &str) -> bool {
    COLLECTIONS.contains(&kind)
}

async fn list_entries(State(state): State<AppState>, Path(kind): Path<String>) -> Response {
    if !known_collection(&kind) {
        return not_found(&format!("Collection \"{kind}\""));
    }
    let store = state.store.read().await;
    let items: Vec<Value> = store
        .notifications
        .get(&kind)
        .map(|entries| entries.values().cloned().collect())
        .unwrap_or_default();
    Json(json!(items)).into_response()
}

async fn create_entry(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(entry): Json<Value>,
) -> Response {
    if !known_collection(&kind) {
        return not_found(&format!("Collection \"{kind}\""));
    }
    let Some(name) = entry.get("name").and_then(Value::as_str).map(str::to_string) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "An entry needs a name" })),
        )
            .into_response();
    };
    let mut store = state.store.write().await;
    let entries = store.notifications.entry(kind).or_default();
    if entries.contains_key(&name) {
        return conflict(&format!("\"{name}\""));
    }
    entries.insert(name, entry.clone());
    (StatusCode::CREATED, Json(entry)).into_response()
}

async fn get_entry(State(state): State<AppState>, Path((kind, name)): Path<(String, String)>) -> Response {
    let store = state.store.read().await;
    match store.notifications.get(&kind).and_then(|e| e.get(&name)) {
        Some(entry) => Json(entry.clone()).into_response(),
        None => not_found(&format!("\"{name}\"")),
    }
}

async fn update_entry(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    Json(mut entry): Json<Value>,
) -> Response {
    if !entry.is_object() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Notification body must be a JSON object" })),
        )
            .into_response();
    }
    let mut store = state.store.write().await;
    match store.notifications.get_mut(&kind).and_then(|e| e.get_mut(&name)) {
        Some(existing) => {
            entry["name"] = json!(name);
            *existing = entry.clone();
            Json(entry).into_response()
        }
        None => not_found(&format!("\"{name}\"")),
    }
}

async fn delete_entry(State(state): State<AppState>, Path((kind, name)): Path<(String, String)>) -> Response {
    let mut store = state.store.write().await;
    match store.notifications.get_mut(&kind).and_then(|e| e.remove(&name)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&format!("\"{name}\"")),
    }
}

async fn publish(State(state): State<AppState>, Path(topic): Path<String>, body: String) -> Response {
    let mut store = state.store.write().await;
    let known = store
        .notifications
        .get("topics")
        .is_some_and(|topics| topics.contains_key(&topic));
    if !known {
        return not_found(&format!("Topic \"{topic}\""));
    }
    store.published.push((topic, body));
    StatusCode::ACCEPTED.into_response()
}

async fn list_connections() -> Json<Value> {
    Json(json!([
        { "name": "FME_SHAREDRESOURCE_DATA", "type": "LOCAL" },
        { "name": "FME_SHAREDRESOURCE_TEMP", "type": "LOCAL" }
    ]))
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn file_entry(path: &str, size: usize) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    json!({ "name": name, "path": format!("/{path}"), "type": "FILE", "size": size })
}

/// Entries directly below `dir` ("" is the root).
fn listing(store: &crate::Store, resource: &str, dir: &str) -> Vec<Value> {
    let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
    let direct = |path: &str| {
        path.strip_prefix(prefix.as_str())
            .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
    };
    let dirs = store
        .directories
        .iter()
        .filter(|(r, p)| r == resource && direct(p.as_str()))
        .map(|(_, p)| json!({ "name": p.rsplit('/').next().unwrap_or(p), "path": format!("/{p}"), "type": "DIR" }));
    let files = store
        .files
        .iter()
        .filter(|((r, p), _)| r == resource && direct(p.as_str()))
        .map(|((_, p), data)| file_entry(p, data.len()));
    dirs.chain(files).collect()
}

async fn list_root(State(state): State<AppState>, Path(resource): Path<String>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({ "path": "/", "type": "DIR", "contents": listing(&store, &resource, "") }))
}

async fn get_path(
    State(state): State<AppState>,
    Path((resource, path)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let path = normalize(&path);
    let store = state.store.read().await;
    let key = (resource.clone(), path.clone());
    if let Some(data) = store.files.get(&key) {
        if q.get("accept").map(String::as_str) == Some("contents") {
            return ([(header::CONTENT_TYPE, "application/octet-stream")], data.clone()).into_response();
        }
        return Json(file_entry(&path, data.len())).into_response();
    }
    if store.directories.contains(&key) {
        let contents = listing(&store, &resource, &path);
        return Json(json!({ "path": format!("/{path}"), "type": "DIR", "contents": contents })).into_response();
    }
    not_found(&format!("Path \"/{path}\""))
}

async fn post_path(
    State(state): State<AppState>,
    Path((resource, path)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let dir = normalize(&path);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let mut store = state.store.write().await;

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields = form_fields(&body);
        let Some(name) = fields.get("directoryname") else {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "directoryname is required" })),
            )
                .into_response();
        };
        let created = format!("{dir}/{name}");
        store.directories.insert((resource, created.clone()));
        return (
            StatusCode::CREATED,
            Json(json!({ "name": name, "path": format!("/{created}"), "type": "DIR" })),
        )
            .into_response();
    }

    let Some(file_name) = disposition_file_name(&headers) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Content-Disposition with a filename is required" })),
        )
            .into_response();
    };
    let dir_known = store.directories.contains(&(resource.clone(), dir.clone()));
    if !dir_known {
        if q.get("createDirectories").map(String::as_str) != Some("true") {
            return not_found(&format!("Path \"/{dir}\""));
        }
        store.directories.insert((resource.clone(), dir.clone()));
    }
    let file_path = format!("{dir}/{file_name}");
    let key = (resource, file_path.clone());
    if store.files.contains_key(&key) && q.get("overwrite").map(String::as_str) != Some("true") {
        return conflict(&format!("File \"/{file_path}\""));
    }
    let size = body.len();
    store.files.insert(key, body);
    (StatusCode::CREATED, Json(file_entry(&file_path, size))).into_response()
}

async fn delete_path(State(state): State<AppState>, Path((resource, path)): Path<(String, String)>) -> Response {
    let path = normalize(&path);
    let mut store = state.store.write().await;
    let key = (resource, path.clone());
    if store.files.remove(&key).is_some() || store.directories.remove(&key) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&format!("Path \"/{path}\""))
    }
}

/// `attachment; filename="x"` → `x`.
pub(crate) fn disposition_file_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_DISPOSITION)?.to_str().ok()?;
    let raw = value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?;
    let name = raw.trim_matches('"').replace("\\\"", "\"").replace("\\\\", "\\");
    (!name.is_empty()).then_some(name)
}
