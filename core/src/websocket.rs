//! The notification WebSocket channel.
//!
//! The server listens on a dedicated port (7078 by default). A client opens
//! the socket and immediately sends one `{"ws_op":"open","ws_stream_id":..}`
//! message naming the stream it wants; notifications published to that
//! stream then arrive as text frames.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::Result;
use crate::http::HttpResponse;
use crate::response::Response;
use crate::server::FmeServer;

/// The handshake message for `stream_id`.
pub fn open_message(stream_id: &str) -> String {
    json!({ "ws_op": "open", "ws_stream_id": stream_id }).to_string()
}

impl FmeServer {
    /// `ws://{host}:{websocket_port}/websocket`, `wss` over TLS.
    pub fn build_websocket_url(&self) -> String {
        let scheme = if self.config().ssl { "wss" } else { "ws" };
        format!(
            "{scheme}://{}:{}/websocket",
            self.host(),
            self.config().websocket_port
        )
    }

    /// Connect and send the open handshake for `stream_id`. With `ssl` set
    /// the socket is `wss` over native TLS, verified against the system
    /// trust store like the reqwest transport.
    pub async fn open_websocket(&self, stream_id: &str) -> Result<NotificationStream> {
        let url = self.build_websocket_url();
        let (mut inner, _) = connect_async(url.as_str()).await?;
        inner.send(Message::Text(open_message(stream_id))).await?;
        info!(url = %url, stream_id, "notification stream opened");
        Ok(NotificationStream {
            inner,
            stream_id: stream_id.to_string(),
        })
    }
}

/// A live notification channel.
pub struct NotificationStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
    stream_id: String,
}

impl NotificationStream {
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Wait for the next notification. Returns `None` once the server closes
    /// the channel. Payloads are normalized like HTTP bodies.
    pub async fn next_message(&mut self) -> Option<Result<Response>> {
        while let Some(frame) = self.inner.next().await {
            let body = match frame {
                Ok(Message::Text(text)) => Bytes::from(text),
                Ok(Message::Binary(data)) => Bytes::from(data),
                Ok(Message::Close(_)) => return None,
                Ok(other) => {
                    debug!(stream_id = %self.stream_id, frame = ?other, "skipping control frame");
                    continue;
                }
                Err(err) => return Some(Err(err.into())),
            };
            return Some(Ok(Response::interpret(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body,
            })));
        }
        None
    }

    pub async fn close(mut self) -> Result<()> {
        self.inner.close(None).await?;
        Ok(())
    }
}

impl std::fmt::Debug for NotificationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStream")
            .field("stream_id", &self.stream_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn open_message_names_the_stream() {
        let msg: serde_json::Value = serde_json::from_str(&open_message("s-42")).unwrap();
        assert_eq!(msg, json!({"ws_op": "open", "ws_stream_id": "s-42"}));
    }

    #[test]
    fn websocket_url_uses_bare_host_and_channel_port() {
        let s = FmeServer::new(ServerConfig::new("http://fme.local:8080/", "T")).unwrap();
        assert_eq!(s.build_websocket_url(), "ws://fme.local:7078/websocket");

        let s = FmeServer::new(
            ServerConfig::new("fme.local", "T")
                .with_ssl(true)
                .with_websocket_port(7079),
        )
        .unwrap();
        assert_eq!(s.build_websocket_url(), "wss://fme.local:7079/websocket");
    }
}
