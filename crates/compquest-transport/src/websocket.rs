//! WebSocket client transport implementation using `tokio-tungstenite`.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A WebSocket connection to the game server.
///
/// The server speaks JSON over text frames, but inbound binary frames
/// carrying the same payloads are accepted too.
#[derive(Debug)]
pub struct WebSocketConnection {
    ws: Arc<Mutex<WsStream>>,
}

impl WebSocketConnection {
    /// Opens a WebSocket connection to the given `ws://` or `wss://` URL.
    ///
    /// Credentials travel in the URL itself (a `token` query parameter),
    /// so no extra headers are attached here.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;
        tracing::debug!(url, "WebSocket connection established");

        Ok(Self {
            ws: Arc::new(Mutex::new(ws)),
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        // Outbound commands are JSON, so they go out as text frames.
        let text = std::str::from_utf8(data).map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })?;
        let msg = Message::Text(text.into());
        self.ws
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}
