//! The request dispatcher: one request out, one normalized `Response` back.
//!
//! # Design
//! `Transport` is the I/O seam. The dispatcher never distinguishes success
//! from failure: HTTP error statuses arrive as ordinary responses, and a
//! transport that cannot complete the exchange is logged and reported to the
//! continuation as an empty text body. There is no retry, timeout or
//! cancellation; concurrent dispatches complete in any order.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use tokio::runtime::Handle;
use tracing::{debug, warn};
use url::Url;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::Response;

/// Executes a single HTTP exchange.
///
/// Implementations must return every status code as data and read the
/// complete body before returning.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by an async `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Request(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Request(format!("invalid header value for {name}: {e}")))?;
            builder = builder.header(name, value);
        }
        if let Some(payload) = &request.body {
            builder = builder.body(payload.to_bytes());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await.map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(HttpResponse { status, headers, body })
    }
}

/// What to do with a `Response` once a dispatched request completes.
///
/// `Continuation::ignore()` (also the `Default`) discards the response.
pub struct Continuation(Option<Box<dyn FnOnce(Response) + Send + 'static>>);

impl Continuation {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Response) + Send + 'static,
    {
        Continuation(Some(Box::new(f)))
    }

    pub fn ignore() -> Self {
        Continuation(None)
    }

    fn call(self, response: Response) {
        if let Some(f) = self.0 {
            f(response);
        }
    }
}

impl Default for Continuation {
    fn default() -> Self {
        Continuation::ignore()
    }
}

impl<F> From<F> for Continuation
where
    F: FnOnce(Response) + Send + 'static,
{
    fn from(f: F) -> Self {
        Continuation::new(f)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Continuation")
            .field(&if self.0.is_some() { "fn" } else { "ignore" })
            .finish()
    }
}

/// Sends requests through a shared `Transport`.
///
/// Background round trips run on, in order of preference: the runtime set
/// with [`Dispatcher::with_runtime`], the runtime of the calling thread, or a
/// dedicated thread with its own single-threaded runtime.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    runtime: Option<Handle>,
}

impl Dispatcher {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            runtime: None,
        }
    }

    /// Spawn dispatched requests on `handle`, whichever thread calls
    /// `dispatch`. The runtime must outlive the requests sent through it.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Perform one round trip and normalize the result.
    pub async fn send(&self, request: HttpRequest) -> Response {
        round_trip(self.transport.as_ref(), request).await
    }

    /// Start one round trip in the background and hand its result to
    /// `on_complete` exactly once. Returns immediately and works with or
    /// without an ambient tokio runtime.
    pub fn dispatch(&self, request: HttpRequest, on_complete: impl Into<Continuation>) {
        let transport = Arc::clone(&self.transport);
        let on_complete = on_complete.into();
        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => {
                handle.spawn(async move {
                    let response = round_trip(transport.as_ref(), request).await;
                    on_complete.call(response);
                });
            }
            None => dispatch_on_own_thread(transport, request, on_complete),
        }
    }
}

/// Run one round trip on a fresh thread for callers outside any runtime.
/// If neither the runtime nor the thread can be created the continuation
/// still fires once, with the empty body used for transport failures.
fn dispatch_on_own_thread(transport: Arc<dyn Transport>, request: HttpRequest, on_complete: Continuation) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(error = %err, "cannot start a runtime for dispatch; delivering empty body");
            on_complete.call(Response::Text(String::new()));
            return;
        }
    };
    let slot = Arc::new(Mutex::new(Some(on_complete)));
    let worker_slot = Arc::clone(&slot);
    let spawned = std::thread::Builder::new()
        .name("fme-dispatch".to_string())
        .spawn(move || {
            let response = runtime.block_on(round_trip(transport.as_ref(), request));
            if let Some(on_complete) = take(&worker_slot) {
                on_complete.call(response);
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "cannot start a dispatch thread; delivering empty body");
        if let Some(on_complete) = take(&slot) {
            on_complete.call(Response::Text(String::new()));
        }
    }
}

fn take(slot: &Mutex<Option<Continuation>>) -> Option<Continuation> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(ReqwestTransport::default())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

async fn round_trip(transport: &dyn Transport, request: HttpRequest) -> Response {
    let method = request.method.as_str();
    let url = redact(&request.url);
    debug!(method, url = %url, "dispatching request");
    match transport.execute(request).await {
        Ok(response) => {
            debug!(method, url = %url, status = response.status, bytes = response.body.len(), "request completed");
            Response::interpret(response)
        }
        Err(err) => {
            warn!(method, url = %url, error = %err, "transport failed; delivering empty body");
            Response::Text(String::new())
        }
    }
}

/// Hide token query parameters from log output.
fn redact(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.split('?').next().unwrap_or_default().to_string();
    };
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "fmetoken" || k == "token" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
