//! Connection configuration for FME Server and FME Cloud.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

const DEFAULT_VERSION: &str = "v2";
const DEFAULT_WEBSOCKET_PORT: u16 = 7078;
const DEFAULT_CLOUD_SERVER: &str = "https://api.fmecloud.safe.com";
const DEFAULT_CLOUD_VERSION: &str = "v1";

/// Preferred response format, sent as the `Accept` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
    Html,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Html => "html",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Xml => "application/xml",
            OutputFormat::Html => "text/html",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "html" => Ok(OutputFormat::Html),
            _ => Err(invalid("format", s)),
        }
    }
}

/// Response detail level, sent as the `detail` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detail {
    #[default]
    High,
    Low,
}

impl Detail {
    pub fn as_str(self) -> &'static str {
        match self {
            Detail::High => "high",
            Detail::Low => "low",
        }
    }
}

impl std::str::FromStr for Detail {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Detail::High),
            "low" => Ok(Detail::Low),
            _ => Err(invalid("detail", s)),
        }
    }
}

/// Settings for one FME Server connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or URL, e.g. `fme.example.org`, `fme.example.org:8080` or
    /// `https://fme.example.org/prefix`.
    pub server: String,

    pub token: String,

    /// Overrides any port in `server`; 80 and 443 are left implicit.
    #[serde(default)]
    pub port: Option<u16>,

    /// Force `https`.
    #[serde(default)]
    pub ssl: bool,

    /// REST API version path segment.
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub detail: Detail,

    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,
}

impl ServerConfig {
    pub fn new(server: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: token.into(),
            port: None,
            ssl: false,
            version: default_version(),
            format: OutputFormat::default(),
            detail: Detail::default(),
            websocket_port: default_websocket_port(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_websocket_port(mut self, port: u16) -> Self {
        self.websocket_port = port;
        self
    }

    /// Checks that a server and token are present and that `server`
    /// parses as an `http`/`https` URL or a bare host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::MissingServer);
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        self.server_url().map(|_| ())
    }

    /// The effective base URL: one scheme, the configured port unless it is
    /// 80 or 443, any path prefix from `server`, no trailing slash.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let url = self.server_url()?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Bare host name without scheme, port or path.
    pub fn host(&self) -> Result<String, ConfigError> {
        let url = self.server_url()?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| invalid("server", &self.server))
    }

    fn server_url(&self) -> Result<Url, ConfigError> {
        let raw = self.server.trim();
        let bad = || invalid("server", raw);
        let mut url = if raw.contains("://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("http://{raw}"))
        }
        .map_err(|_| bad())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(bad());
        }
        if self.ssl {
            url.set_scheme("https").map_err(|_| bad())?;
        }
        match self.port {
            Some(80 | 443) => url.set_port(None),
            Some(port) => url.set_port(Some(port)),
            None => Ok(()),
        }
        .map_err(|_| bad())?;
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// Load from `FME_SERVER`, `FME_TOKEN` and the optional `FME_PORT`,
    /// `FME_SSL`, `FME_VERSION`, `FME_FORMAT`, `FME_DETAIL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = std::env::var("FME_SERVER").map_err(|_| ConfigError::MissingServer)?;
        let token = std::env::var("FME_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        let mut config = ServerConfig::new(server, token);
        if let Ok(port) = std::env::var("FME_PORT") {
            config.port = Some(port.trim().parse().map_err(|_| invalid("FME_PORT", &port))?);
        }
        if let Ok(ssl) = std::env::var("FME_SSL") {
            config.ssl = parse_flag("FME_SSL", &ssl)?;
        }
        if let Ok(version) = std::env::var("FME_VERSION") {
            config.version = version;
        }
        if let Ok(format) = std::env::var("FME_FORMAT") {
            config.format = format.parse()?;
        }
        if let Ok(detail) = std::env::var("FME_DETAIL") {
            config.detail = detail.parse()?;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Settings for the FME Cloud management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_cloud_server")]
    pub server: String,

    #[serde(default = "default_cloud_version")]
    pub version: String,

    /// Bearer token from the FME Cloud account.
    pub token: String,
}

impl CloudConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            server: default_cloud_server(),
            version: default_cloud_version(),
            token: token.into(),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::MissingServer);
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    /// `FMECLOUD_TOKEN` is required, `FMECLOUD_SERVER` optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("FMECLOUD_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        let mut config = CloudConfig::new(token);
        if let Ok(server) = std::env::var("FMECLOUD_SERVER") {
            config.server = server;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Trimmed `token`, or `MissingToken` when it is blank.
pub(crate) fn checked_token(token: String) -> Result<String, ConfigError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingToken);
    }
    Ok(trimmed.to_string())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_websocket_port() -> u16 {
    DEFAULT_WEBSOCKET_PORT
}

fn default_cloud_server() -> String {
    DEFAULT_CLOUD_SERVER.to_string()
}

fn default_cloud_version() -> String {
    DEFAULT_CLOUD_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(
            ServerConfig::new("example.org", "T1").base_url().unwrap(),
            "http://example.org"
        );
    }

    #[test]
    fn ssl_rewrites_scheme_once() {
        for server in ["example.org", "http://example.org", "https://example.org", "HTTP://example.org/"] {
            let url = ServerConfig::new(server, "T1").with_ssl(true).base_url().unwrap();
            assert_eq!(url, "https://example.org", "{server}");
        }
    }

    #[test]
    fn explicit_scheme_is_not_doubled() {
        assert_eq!(
            ServerConfig::new("http://example.org/", "T1").base_url().unwrap(),
            "http://example.org"
        );
        assert_eq!(
            ServerConfig::new("https://example.org", "T1").base_url().unwrap(),
            "https://example.org"
        );
    }

    #[test]
    fn non_standard_port_is_appended() {
        let url = ServerConfig::new("example.org", "T1").with_port(8080).base_url().unwrap();
        assert_eq!(url, "http://example.org:8080");
    }

    #[test]
    fn port_goes_after_the_host_not_the_path() {
        let config = ServerConfig::new("example.org/fmeserver/", "T").with_port(8080);
        assert_eq!(config.base_url().unwrap(), "http://example.org:8080/fmeserver");
    }

    #[test]
    fn configured_port_replaces_an_embedded_one() {
        let config = ServerConfig::new("example.org:8080", "T").with_port(9090);
        assert_eq!(config.base_url().unwrap(), "http://example.org:9090");
        assert_eq!(
            ServerConfig::new("example.org:8080", "T").base_url().unwrap(),
            "http://example.org:8080"
        );
    }

    #[test]
    fn unusable_servers_are_rejected() {
        for server in ["ftp://example.org", "http://", "exa mple.org"] {
            let config = ServerConfig::new(server, "T");
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidValue { .. })),
                "{server}"
            );
            assert!(config.base_url().is_err(), "{server}");
        }
    }

    #[test]
    fn standard_ports_are_omitted() {
        assert_eq!(
            ServerConfig::new("example.org", "T").with_port(80).base_url().unwrap(),
            "http://example.org"
        );
        assert_eq!(
            ServerConfig::new("example.org", "T").with_ssl(true).with_port(443).base_url().unwrap(),
            "https://example.org"
        );
    }

    #[test]
    fn host_strips_scheme_port_and_path() {
        assert_eq!(ServerConfig::new("https://fme.local:8443/x", "T").host().unwrap(), "fme.local");
        assert_eq!(ServerConfig::new("fme.local", "T").host().unwrap(), "fme.local");
    }

    #[test]
    fn validate_rejects_blank_server_and_token() {
        assert_eq!(ServerConfig::new(" ", "T").validate(), Err(ConfigError::MissingServer));
        assert_eq!(ServerConfig::new("h", "").validate(), Err(ConfigError::MissingToken));
        assert_eq!(CloudConfig::new("").validate(), Err(ConfigError::MissingToken));
        assert!(ServerConfig::new("h", "T").validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"server":"fme.local","token":"abc","detail":"low"}"#).unwrap();
        assert_eq!(config.version, "v2");
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.detail, Detail::Low);
        assert_eq!(config.websocket_port, 7078);
        assert!(!config.ssl);

        let cloud: CloudConfig = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(cloud.server, "https://api.fmecloud.safe.com");
        assert_eq!(cloud.version, "v1");
    }

    #[test]
    fn formats_and_details_parse() {
        assert_eq!("XML".parse::<OutputFormat>().unwrap(), OutputFormat::Xml);
        assert_eq!(OutputFormat::Html.mime_type(), "text/html");
        assert_eq!("low".parse::<Detail>().unwrap(), Detail::Low);
        assert!(matches!(
            "medium".parse::<Detail>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
