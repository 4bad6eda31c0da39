//! FME Server connection.
//!
//! # Design
//! `FmeServer` owns its `ServerConfig` and a `Dispatcher`. Each endpoint is a
//! pure `build_*` method producing an `HttpRequest`, paired with a method of
//! the same name (minus the prefix) that dispatches it and forwards the
//! `Response` to a continuation. The pairs are grouped by REST area in the
//! submodules.
//!
//! REST v2 calls live under `{base}/fmerest/{version}/` and carry the token
//! as the `fmetoken` query parameter. The data services (`fmedatadownload`,
//! `fmedatastreaming`, `fmedataupload`) and the token service sit directly
//! under the base URL.

mod jobs;
mod notifications;
mod repositories;
mod resources;
mod schedules;
mod tokens;
mod upload;

pub use resources::UploadOptions;
pub use tokens::TimeUnit;
pub use upload::session_id;

use tracing::error;

use crate::config::{checked_token, Detail, OutputFormat, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::http::{query, HttpMethod, HttpRequest};

/// A connection to one FME Server.
#[derive(Debug, Clone)]
pub struct FmeServer {
    config: ServerConfig,
    base_url: String,
    host: String,
    dispatcher: Dispatcher,
}

impl FmeServer {
    /// Validate `config` and connect through the default reqwest transport.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::with_dispatcher(config, Dispatcher::default())
    }

    pub fn with_dispatcher(config: ServerConfig, dispatcher: Dispatcher) -> Result<Self> {
        let resolved = config
            .validate()
            .and_then(|()| Ok((config.base_url()?, config.host()?)));
        let (base_url, host) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(error = %err, "rejecting FME Server configuration");
                return Err(err.into());
            }
        };
        Ok(Self {
            config,
            base_url,
            host,
            dispatcher,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Host of the server, without scheme or port.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Replace the token used by subsequent requests. Blank tokens are
    /// rejected and leave the current one in place.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.config.token = checked_token(token.into())?;
        Ok(())
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.config.format = format;
    }

    pub fn set_detail(&mut self, detail: Detail) {
        self.config.detail = detail;
    }

    fn detail(&self) -> &'static str {
        self.config.detail.as_str()
    }

    /// `{base}/fmerest/{version}/{path}?{params}&fmetoken={token}`
    fn rest_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut pairs = params.to_vec();
        pairs.push(("fmetoken", self.config.token.as_str()));
        format!(
            "{}/fmerest/{}/{}?{}",
            self.base_url,
            self.config.version,
            path,
            query(&pairs)
        )
    }

    /// `{base}/{service}/{path}`
    fn service_url(&self, service: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, service, path)
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url).accept(self.config.format.mime_type())
    }
}
