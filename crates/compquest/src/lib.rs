//! # CompQuest
//!
//! Async client SDK for a two-player realtime trivia duel.
//!
//! The server is authoritative: this client reflects server state, gates
//! local actions, and renders — it never computes scores or correctness.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compquest::prelude::*;
//!
//! # async fn run() -> Result<(), CompquestError> {
//! let lobby = LobbyClient::new("http://localhost:8000", "token");
//! let session_id = match lobby.join_random_session("Ana").await {
//!     Err(LobbyError::NoSessionsAvailable) => lobby.create_session("Ana").await?,
//!     other => other?,
//! };
//!
//! let config = ClientConfig {
//!     base_url: "ws://localhost:8000".into(),
//!     token: "token".into(),
//!     session: SessionConfig::default(),
//! };
//! let mut client = DuelClient::connect(config, &session_id, "Ana").await?;
//! let mut intents = client.take_intents().unwrap();
//! while let Some(_intent) = intents.recv().await {
//!     // feed the presentation layer
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{ClientConfig, DuelClient};
pub use error::CompquestError;

/// Commonly used types, re-exported for one-line imports.
pub mod prelude {
    pub use compquest_lobby::{LeaderboardEntry, LobbyClient, LobbyError};
    pub use compquest_protocol::{Letter, PowerUp, SessionId};
    pub use compquest_session::{
        GameOutcome, Phase, RenderIntent, RoundSummary, SessionConfig,
    };

    pub use crate::{ClientConfig, CompquestError, DuelClient};
}
