//! Transport abstraction layer for CompQuest.
//!
//! Provides the [`Connection`] trait that abstracts the client's duplex
//! message channel to the game server, plus the WebSocket implementation
//! used in production. Everything above this layer deals in whole
//! messages; framing, masking, and keepalive belong here.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket client via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

/// A duplex, message-oriented connection to the game server.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the server.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the server.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;
}
