//! Normalization of completed HTTP exchanges.
//!
//! # Design
//! Every exchange ends in exactly one `Response`, whatever its status code.
//! A 404 carrying a JSON error document is `Response::Json` just like a 200;
//! callers that care inspect the payload. Empty bodies on 204 and 202 get
//! sentinel variants so "deleted" and "accepted" are distinguishable from an
//! empty 200.

use bytes::Bytes;
use serde_json::{json, Value};

use crate::http::HttpResponse;

const NO_CONTENT: u16 = 204;
const ACCEPTED: u16 = 202;

/// The normalized result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The body parsed as JSON.
    Json(Value),
    /// Empty body with 204 No Content.
    Deleted,
    /// Empty body with 202 Accepted.
    Accepted,
    /// The body was not JSON; forwarded unchanged.
    Text(String),
    /// The body was neither JSON nor UTF-8.
    Binary(Bytes),
}

impl Response {
    /// Normalize one completed exchange. An empty 204 or 202 body becomes
    /// the matching sentinel; otherwise the body is JSON if it parses,
    /// text if it is UTF-8 and raw bytes if neither. The status code plays
    /// no other part, so error payloads reach the caller like any other.
    pub fn interpret(response: HttpResponse) -> Self {
        if response.body.is_empty() {
            match response.status {
                NO_CONTENT => return Response::Deleted,
                ACCEPTED => return Response::Accepted,
                _ => {}
            }
        }
        if let Ok(value) = serde_json::from_slice::<Value>(&response.body) {
            return Response::Json(value);
        }
        match String::from_utf8(response.body.to_vec()) {
            Ok(text) => Response::Text(text),
            Err(_) => Response::Binary(response.body),
        }
    }

    /// The envelope as a JSON value: sentinels become `{"deleted": true}` /
    /// `{"value": true}`, text becomes a JSON string.
    pub fn to_value(&self) -> Value {
        match self {
            Response::Json(v) => v.clone(),
            Response::Deleted => json!({ "deleted": true }),
            Response::Accepted => json!({ "value": true }),
            Response::Text(t) => Value::String(t.clone()),
            Response::Binary(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Response::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Response::Deleted)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Response::Accepted)
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Response::interpret(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn empty_no_content_is_deleted_sentinel() {
        let r = Response::interpret(response(204, b""));
        assert!(r.is_deleted());
        assert_eq!(r.to_value(), json!({ "deleted": true }));
    }

    #[test]
    fn empty_accepted_is_value_sentinel() {
        let r = Response::interpret(response(202, b""));
        assert!(r.is_accepted());
        assert_eq!(r.to_value(), json!({ "value": true }));
    }

    #[test]
    fn accepted_with_body_is_parsed() {
        let r = Response::interpret(response(202, br#"{"id":7}"#));
        assert_eq!(r, Response::Json(json!({ "id": 7 })));
    }

    #[test]
    fn json_is_parsed_regardless_of_status() {
        for status in [200, 201, 401, 404, 500] {
            let r = Response::interpret(response(status, br#"{"message":"x"}"#));
            assert_eq!(r.as_json(), Some(&json!({ "message": "x" })), "status {status}");
        }
    }

    #[test]
    fn non_json_text_is_forwarded_unchanged() {
        let r = Response::interpret(response(200, b"4f1c  token\n"));
        assert_eq!(r.as_text(), Some("4f1c  token\n"));
    }

    #[test]
    fn empty_ok_body_is_empty_text() {
        assert_eq!(Response::interpret(response(200, b"")), Response::Text(String::new()));
    }

    #[test]
    fn invalid_utf8_is_binary() {
        let r = Response::interpret(response(200, &[0xff, 0xfe, 0x00]));
        assert_eq!(r, Response::Binary(Bytes::from_static(&[0xff, 0xfe, 0x00])));
    }
}
