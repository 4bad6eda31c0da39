//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. Endpoint
//! methods build `HttpRequest` values without touching the network; a
//! `Transport` (or any host) executes them and hands back an `HttpResponse`.
//!
//! The body of a request is a `Payload` whose variant names its kind. The
//! content type is derived from that tag and written into `headers`
//! explicitly when the payload is attached, so a transport never has to guess
//! from the bytes.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use url::form_urlencoded;

use crate::error::ApiError;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A request body tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `key=value&...`, already URL-encoded.
    Form(String),
    /// A serialized JSON document.
    Json(String),
    Text(String),
    /// Raw file contents.
    Binary(Bytes),
}

impl Payload {
    /// URL-encode `pairs` into a form body.
    pub fn form<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Payload::Form(encode_pairs(pairs))
    }

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        Ok(Payload::Json(serde_json::to_string(value)?))
    }

    /// The content type implied by the payload kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            Payload::Form(_) => FORM_URLENCODED,
            Payload::Json(_) => JSON,
            Payload::Text(_) => TEXT,
            Payload::Binary(_) => OCTET_STREAM,
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        match self {
            Payload::Form(s) | Payload::Json(s) | Payload::Text(s) => Bytes::from(s.clone()),
            Payload::Binary(b) => b.clone(),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and fully substituted. Header names are stored
/// lower-case so lookups and replacement are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Payload>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Set `name` to `value`, replacing any earlier value.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(k, _)| *k != name);
        self.headers.push((name, value.into()));
        self
    }

    pub fn accept(self, value: impl Into<String>) -> Self {
        self.header("accept", value)
    }

    /// Explicit content type, overriding the one implied by the payload.
    pub fn content_type(self, value: impl Into<String>) -> Self {
        self.header("content-type", value)
    }

    /// Attach a body. The payload's content type is written unless one was
    /// already set explicitly.
    pub fn payload(mut self, payload: Payload) -> Self {
        if self.header_value("content-type").is_none() {
            self = self.content_type(payload.content_type());
        }
        self.body = Some(payload);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Percent-encode one path segment.
pub fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Encode a filesystem-shaped path: every segment is escaped, separators
/// survive, and leading/trailing/duplicate slashes are dropped.
pub fn fs_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Form-URL-encode query pairs (no leading `?`).
pub fn query<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    encode_pairs(pairs)
}

fn encode_pairs<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}

/// Wrap a file name in an attachment `Content-Disposition` value.
pub fn attachment(file_name: &str) -> String {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_method_is_get() {
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
        assert_eq!(HttpRequest::get("http://x").method, HttpMethod::Get);
    }

    #[test]
    fn payload_sets_content_type_from_kind() {
        let req = HttpRequest::new(HttpMethod::Post, "http://x")
            .payload(Payload::form(&[("a", "1 2"), ("b", "&")]));
        assert_eq!(req.header_value("Content-Type"), Some(FORM_URLENCODED));
        assert_eq!(req.body, Some(Payload::Form("a=1+2&b=%26".to_string())));
    }

    #[test]
    fn explicit_content_type_wins_over_payload_kind() {
        let req = HttpRequest::new(HttpMethod::Post, "http://x")
            .content_type("application/vnd.custom")
            .payload(Payload::Text("hi".to_string()));
        assert_eq!(req.header_value("content-type"), Some("application/vnd.custom"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn header_replaces_existing_value_case_insensitively() {
        let req = HttpRequest::get("http://x")
            .header("Accept", "application/json")
            .accept("text/html");
        assert_eq!(req.headers, vec![("accept".to_string(), "text/html".to_string())]);
    }

    #[test]
    fn json_payload_serializes_value() {
        let payload = Payload::json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(payload, Payload::Json(r#"{"a":1}"#.to_string()));
        assert_eq!(payload.content_type(), JSON);
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(segment("My Workspace.fmw"), "My%20Workspace.fmw");
        assert_eq!(segment("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn fs_path_keeps_separators_and_drops_empty_segments() {
        assert_eq!(fs_path("/data/in put//file.csv/"), "data/in%20put/file.csv");
        assert_eq!(fs_path("/"), "");
    }

    #[test]
    fn attachment_quotes_file_name() {
        assert_eq!(attachment("a\"b.txt"), "attachment; filename=\"a\\\"b.txt\"");
    }
}
