//! FME Cloud instance management.
//!
//! # Design
//! Same build/dispatch split as `FmeServer`, against a separate API:
//! requests go to `{server}/{version}/...`, authenticate with an
//! `Authorization: Bearer` header instead of a query token, and always ask
//! for JSON.

use tracing::error;

use crate::config::{checked_token, CloudConfig};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::http::{segment, HttpMethod, HttpRequest, Payload, JSON};

/// A connection to the FME Cloud API.
#[derive(Debug, Clone)]
pub struct FmeCloud {
    config: CloudConfig,
    dispatcher: Dispatcher,
}

impl FmeCloud {
    pub fn new(config: CloudConfig) -> Result<Self> {
        Self::with_dispatcher(config, Dispatcher::default())
    }

    pub fn with_dispatcher(config: CloudConfig, dispatcher: Dispatcher) -> Result<Self> {
        if let Err(err) = config.validate() {
            error!(error = %err, "rejecting FME Cloud configuration");
            return Err(err.into());
        }
        Ok(Self { config, dispatcher })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Replace the bearer token. Blank tokens are rejected and leave the
    /// current one in place.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.config.token = checked_token(token.into())?;
        Ok(())
    }

    /// Launch a new instance described by `params` (`name`, `instance_type`,
    /// `deployment_name`, `fme_server_version`, ...).
    pub fn build_launch_instance(&self, params: &[(&str, &str)]) -> HttpRequest {
        self.request(HttpMethod::Post, "instances")
            .payload(Payload::form(params))
    }

    pub fn build_pause_instance(&self, id: &str) -> HttpRequest {
        self.lifecycle(id, "pause")
    }

    pub fn build_start_instance(&self, id: &str) -> HttpRequest {
        self.lifecycle(id, "start")
    }

    pub fn build_restart_instance(&self, id: &str) -> HttpRequest {
        self.lifecycle(id, "restart")
    }

    pub fn build_terminate_instance(&self, id: &str) -> HttpRequest {
        self.lifecycle(id, "terminate")
    }

    pub fn build_instances(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "instances")
    }

    pub fn build_instance(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("instances/{}", segment(id)))
    }

    /// Administrator credentials of an instance.
    pub fn build_credentials(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("instances/{}/credentials", segment(id)))
    }

    pub fn build_balance(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "account/balance")
    }

    /// FME Server versions available for new instances.
    pub fn build_versions(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "fme_server_version.json")
    }

    fn lifecycle(&self, id: &str, operation: &str) -> HttpRequest {
        self.request(HttpMethod::Put, &format!("instances/{}/{operation}", segment(id)))
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        let url = format!(
            "{}/{}/{}",
            self.config.server.trim_end_matches('/'),
            self.config.version,
            path
        );
        HttpRequest::new(method, url)
            .accept(JSON)
            .header("authorization", format!("Bearer {}", self.config.token))
    }

    dispatch_methods! {
        launch_instance => build_launch_instance(params: &[(&str, &str)]);
        pause_instance => build_pause_instance(id: &str);
        start_instance => build_start_instance(id: &str);
        restart_instance => build_restart_instance(id: &str);
        /// The API answers 202 with no body, which arrives as `Response::Accepted`.
        terminate_instance => build_terminate_instance(id: &str);
        instances => build_instances();
        instance => build_instance(id: &str);
        credentials => build_credentials(id: &str);
        balance => build_balance();
        versions => build_versions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ConfigError};
    use crate::http::FORM_URLENCODED;

    fn cloud() -> FmeCloud {
        FmeCloud::new(CloudConfig::new("C1")).unwrap()
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = FmeCloud::new(CloudConfig::new("")).unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::MissingToken)));
    }

    #[test]
    fn set_token_trims_and_rejects_blank() {
        let mut c = cloud();
        assert!(matches!(
            c.set_token(""),
            Err(ApiError::Config(ConfigError::MissingToken))
        ));
        assert_eq!(c.build_balance().header_value("authorization"), Some("Bearer C1"));
        c.set_token(" C2\n").unwrap();
        assert_eq!(c.build_balance().header_value("authorization"), Some("Bearer C2"));
    }

    #[test]
    fn requests_use_bearer_header_not_query_token() {
        let req = cloud().build_instances();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.fmecloud.safe.com/v1/instances");
        assert_eq!(req.header_value("authorization"), Some("Bearer C1"));
        assert_eq!(req.header_value("accept"), Some(JSON));
    }

    #[test]
    fn lifecycle_operations_are_puts() {
        let c = cloud();
        for (req, op) in [
            (c.build_pause_instance("12"), "pause"),
            (c.build_start_instance("12"), "start"),
            (c.build_restart_instance("12"), "restart"),
            (c.build_terminate_instance("12"), "terminate"),
        ] {
            assert_eq!(req.method, HttpMethod::Put);
            assert_eq!(req.url, format!("https://api.fmecloud.safe.com/v1/instances/12/{op}"));
            assert!(req.body.is_none());
        }
    }

    #[test]
    fn launch_posts_form_params() {
        let req = cloud().build_launch_instance(&[("name", "My Server"), ("instance_type", "standard")]);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header_value("content-type"), Some(FORM_URLENCODED));
        assert_eq!(
            req.body,
            Some(Payload::Form("name=My+Server&instance_type=standard".to_string()))
        );
    }

    #[test]
    fn account_and_instance_lookups() {
        let c = FmeCloud::new(CloudConfig::new("C1").with_server("http://localhost:9000/")).unwrap();
        assert_eq!(c.build_balance().url, "http://localhost:9000/v1/account/balance");
        assert_eq!(c.build_versions().url, "http://localhost:9000/v1/fme_server_version.json");
        assert_eq!(c.build_instance("7").url, "http://localhost:9000/v1/instances/7");
        assert_eq!(c.build_credentials("7").url, "http://localhost:9000/v1/instances/7/credentials");
    }
}
