/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Opening the connection failed (DNS, TCP, TLS, or the WebSocket
    /// handshake itself).
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending a message failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a message failed (abrupt close, protocol violation).
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
