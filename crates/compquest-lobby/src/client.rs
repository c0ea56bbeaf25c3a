//! The HTTP lobby client.

use compquest_protocol::SessionId;
use serde::{Deserialize, Serialize};

use crate::LobbyError;

/// Request body shared by the matchmaking endpoints.
#[derive(Debug, Serialize)]
struct PlayerBody<'a> {
    name: &'a str,
}

/// Matchmaking response. Extra fields (status message, partial roster)
/// are informational and ignored.
#[derive(Debug, Deserialize)]
struct MatchmakingResponse {
    session_id: SessionId,
}

/// Error body the lobby server attaches to non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// One leaderboard row: a player and their best single-game score.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaderboardEntry {
    /// Player name.
    pub name: String,
    /// Highest score across all recorded games.
    pub best_score: i64,
}

/// Client for the lobby's request/response endpoints: matchmaking and the
/// leaderboard. Gameplay itself never flows through here.
#[derive(Debug, Clone)]
pub struct LobbyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl LobbyClient {
    /// Creates a client for the lobby rooted at `base_url`
    /// (e.g. `http://localhost:8000`), authenticating every request with
    /// the given bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Creates a fresh session with this player as the host and returns
    /// its identifier. The session waits until a second player joins.
    pub async fn create_session(&self, name: &str) -> Result<SessionId, LobbyError> {
        let response = self
            .http
            .post(format!("{}/compquest/launch", self.base_url))
            .bearer_auth(&self.token)
            .json(&PlayerBody { name })
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body: MatchmakingResponse = response.json().await?;
        tracing::info!(session = %body.session_id, "session created");
        Ok(body.session_id)
    }

    /// Joins a randomly chosen session that is waiting for an opponent.
    ///
    /// # Errors
    /// [`LobbyError::NoSessionsAvailable`] when nobody is waiting; the
    /// caller typically falls back to [`create_session`](Self::create_session).
    pub async fn join_random_session(&self, name: &str) -> Result<SessionId, LobbyError> {
        let response = self
            .http
            .post(format!("{}/compquest/join-random-session", self.base_url))
            .bearer_auth(&self.token)
            .json(&PlayerBody { name })
            .send()
            .await?;
        let response = match Self::check_status(response).await {
            Ok(response) => response,
            Err(LobbyError::Api { status: 404, detail })
                if detail.to_lowercase().contains("no available sessions") =>
            {
                return Err(LobbyError::NoSessionsAvailable);
            }
            Err(e) => return Err(e),
        };

        let body: MatchmakingResponse = response.json().await?;
        tracing::info!(session = %body.session_id, "joined session");
        Ok(body.session_id)
    }

    /// Fetches the top players by best single-game score, best first.
    pub async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, LobbyError> {
        let response = self
            .http
            .get(format!("{}/compquest/score", self.base_url))
            .query(&[("limit", limit)])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    /// Maps a non-success response to [`LobbyError::Api`], pulling the
    /// `detail` text out of the JSON error body when there is one.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LobbyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&raw)
            .map(|body| body.detail)
            .unwrap_or(raw);
        Err(LobbyError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
