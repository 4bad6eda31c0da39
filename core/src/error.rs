//! Error types for the FME client.
//!
//! # Design
//! Only configuration mistakes are fatal. Transport failures and HTTP error
//! statuses never surface here from `Dispatcher`: they are folded into the
//! normalized `Response` like any other completed exchange. `TransportError`
//! exists for the `Transport` seam, where the dispatcher logs and absorbs it.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Caller misuse detected while building a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No server host was given.
    #[error("no FME Server host was specified")]
    MissingServer,

    /// No token was given.
    #[error("no token was specified in the connection parameters")]
    MissingToken,

    /// An environment or document value could not be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// A single HTTP exchange could not be completed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, refused connection, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// The response head arrived but the body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Errors returned by fallible client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Opening or writing to the notification WebSocket failed.
    #[error("websocket error: {0}")]
    WebSocket(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ApiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ApiError::WebSocket(err.to_string())
    }
}
