//! Matchmaking and leaderboard access for CompQuest.
//!
//! The lobby is plain request/response HTTP, separate from the realtime
//! duel connection: it creates or finds a session, and reads standings.
//!
//! # Key types
//!
//! - [`LobbyClient`] — the HTTP client, bearer-token authenticated
//! - [`LeaderboardEntry`] — one row of the best-score leaderboard
//! - [`LobbyError`] — transport faults vs. server rejections

mod client;
mod error;

pub use client::{LeaderboardEntry, LobbyClient};
pub use error::LobbyError;
