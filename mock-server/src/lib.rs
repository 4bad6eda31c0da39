//! In-memory fake of an FME Server (REST v2, data services, token service,
//! notification WebSocket) and of the FME Cloud API.
//!
//! Everything lives in one `Store` behind a `RwLock`. REST calls must carry
//! `fmetoken`, data services a `token` field, and cloud calls a bearer
//! header; anything else gets a 401 with a JSON message, like the real
//! services.

mod cloud;
mod rest;
mod services;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const DEFAULT_TOKEN: &str = "mock-token";
pub const USER: &str = "admin";
pub const PASSWORD: &str = "admin";

/// Server-side state shared by all handlers.
#[derive(Default)]
pub struct Store {
    pub schedules: BTreeMap<(String, String), Value>,
    /// Keyed by collection (`topics`, `publications`, `subscriptions`).
    pub notifications: HashMap<String, BTreeMap<String, Value>>,
    pub published: Vec<(String, String)>,
    pub files: BTreeMap<(String, String), Bytes>,
    pub directories: BTreeSet<(String, String)>,
    pub jobs: BTreeMap<u64, Value>,
    pub uploads: HashMap<String, BTreeMap<String, Bytes>>,
    pub instances: BTreeMap<String, Value>,
    next_id: u64,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone)]
pub struct AppState {
    pub token: Arc<String>,
    pub store: Arc<RwLock<Store>>,
}

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        token: Arc::new(token.to_string()),
        store: Arc::new(RwLock::new(Store::default())),
    };
    let rest = rest::router().layer(middleware::from_fn_with_state(state.clone(), require_fmetoken));
    let cloud = cloud::router().layer(middleware::from_fn_with_state(state.clone(), require_bearer));
    Router::new()
        .nest("/fmerest/v2", rest)
        .nest("/v1", cloud)
        .merge(services::router())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_fmetoken(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    match params.get("fmetoken") {
        Some(token) if *token == *state.token => next.run(request).await,
        _ => {
            debug!(uri = %request.uri(), "rejecting request without a valid fmetoken");
            unauthorized()
        }
    }
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if authorized {
        next.run(request).await
    } else {
        unauthorized()
    }
}

pub(crate) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Authentication failed: missing or invalid token" })),
    )
        .into_response()
}

pub(crate) fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("{what} does not exist") })),
    )
        .into_response()
}

pub(crate) fn conflict(what: &str) -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({ "message": format!("{what} already exists") })),
    )
        .into_response()
}

/// Parse an `application/x-www-form-urlencoded` body.
pub(crate) fn form_fields(body: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fields_decode_pairs() {
        let fields = form_fields(b"a=1+2&b=%26&c=");
        assert_eq!(fields["a"], "1 2");
        assert_eq!(fields["b"], "&");
        assert_eq!(fields["c"], "");
    }

    #[test]
    fn store_ids_increase() {
        let mut store = Store::default();
        assert_eq!(store.next_id(), 1);
        assert_eq!(store.next_id(), 2);
    }
}
