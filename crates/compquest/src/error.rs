//! Unified error type for the CompQuest client.

use compquest_lobby::LobbyError;
use compquest_protocol::ProtocolError;
use compquest_session::SessionError;
use compquest_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `compquest` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CompquestError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, malformed payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level rejection (phase gating, spent power-up).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A lobby-level error (matchmaking, leaderboard).
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}
