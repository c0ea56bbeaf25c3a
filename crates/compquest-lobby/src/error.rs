//! Error types for the lobby layer.

/// Errors that can occur during matchmaking and leaderboard calls.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The request never completed (connection, DNS, timeout, bad URL).
    #[error("lobby request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("lobby request rejected with status {status}: {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The server's `detail` text, or the raw body when absent.
        detail: String,
    },

    /// No session is currently waiting for a second player.
    ///
    /// Matchmaking-specific and expected during normal operation, so it
    /// is distinguished from [`LobbyError::Api`].
    #[error("no available sessions found")]
    NoSessionsAvailable,
}
