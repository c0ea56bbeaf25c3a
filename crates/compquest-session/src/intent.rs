//! Effects and render intents emitted by the state machine.
//!
//! The machine never touches a socket or a display surface. Every step
//! returns a list of [`Effect`]s; the protocol client executes the
//! connection-facing ones and forwards [`RenderIntent`]s to whatever
//! presentation layer is attached. This keeps the entire protocol logic
//! headless-testable.

use std::collections::BTreeMap;
use std::time::Duration;

use compquest_protocol::{ClientCommand, Letter};

use crate::Scoreboard;

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// One instruction from the state machine to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Forward to the presentation layer.
    Render(RenderIntent),
    /// Serialize and transmit on the duplex connection (fire-and-forget).
    Send(ClientCommand),
    /// Arm the one-shot disconnect timer for the given grace period.
    StartDisconnectTimer(Duration),
    /// Disarm the disconnect timer if it is running.
    CancelDisconnectTimer,
    /// Close the duplex connection deliberately (auth rejection, session
    /// teardown). Distinct from a transport fault.
    CloseConnection,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The locally derived verdict of a finished duel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// Exactly one player holds the maximum score.
    Winner(String),
    /// Two or more players share the maximum score.
    Tie,
}

impl GameOutcome {
    /// Derives the outcome from a final score mapping: the winners are the
    /// players whose score equals the maximum; more than one means a tie.
    ///
    /// An empty mapping degenerates to [`GameOutcome::Tie`].
    pub fn from_scores(scores: &BTreeMap<String, i64>) -> Self {
        let Some(max) = scores.values().max().copied() else {
            return Self::Tie;
        };
        let mut winners = scores.iter().filter(|(_, s)| **s == max);
        match (winners.next(), winners.next()) {
            (Some((name, _)), None) => Self::Winner(name.clone()),
            _ => Self::Tie,
        }
    }
}

// ---------------------------------------------------------------------------
// Render intents
// ---------------------------------------------------------------------------

/// Everything the presentation layer needs to show one round's result.
/// Transient: drives a single render intent, then is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    /// Who answered first (the round's protagonist, not necessarily right).
    pub winner: String,
    /// The chosen option letter.
    pub answer_letter: Letter,
    /// The chosen option text.
    pub answer: String,
    /// Whether the choice was correct.
    pub correct: bool,
    /// Canonical correct answer text.
    pub correct_answer: String,
    /// Explanation text.
    pub explanation: String,
    /// Whether a power-up affected this round.
    pub power_up_used: bool,
    /// Seconds the winning answer took, when reported.
    pub response_time: Option<f64>,
    /// The scoreboard after this round (already adopted by the machine).
    pub scoreboard: Scoreboard,
}

/// Declarative rendering instructions, one per user-visible change.
///
/// Deliberately display-agnostic: "present this question", never "set this
/// element's innerHTML".
#[derive(Debug, Clone, PartialEq)]
pub enum RenderIntent {
    /// Both players matched; show the duel surface.
    SessionStarted {
        /// Roster in join order.
        players: Vec<String>,
        /// Initial scores and streaks.
        scoreboard: Scoreboard,
    },
    /// Present a question with its positional letters.
    QuestionPresented {
        /// 1-based question number, when the server reports it.
        index: Option<u32>,
        /// Total questions in the duel, when reported.
        total: Option<u32>,
        /// Prompt text.
        prompt: String,
        /// Options paired with their letters, in payload order.
        options: Vec<(Letter, String)>,
        /// Optional oracle hint.
        oracle_hint: Option<String>,
    },
    /// The round is locked; disable answer and power-up controls.
    /// Emitted exactly once per round.
    InputsLocked {
        /// Whose action locked the round.
        player: String,
        /// Whether that was the local player.
        by_local: bool,
    },
    /// Show the round-result modal.
    RoundResolved(RoundSummary),
    /// Local acknowledgment sent; opponent hasn't acknowledged yet.
    WaitingForOpponent,
    /// Informational: a player confirmed readiness.
    OpponentReady {
        /// Who acknowledged.
        player: String,
        /// How many have acknowledged so far, when reported.
        total_ready: Option<u32>,
    },
    /// Informational: both acknowledged; next question is on its way.
    BothReady,
    /// The duel ended; show the final standings.
    GameEnded {
        /// Locally derived verdict.
        outcome: GameOutcome,
        /// Final authoritative scores.
        final_scores: BTreeMap<String, i64>,
    },
    /// The opponent dropped; the session ends after the grace period
    /// unless acknowledged sooner.
    OpponentDisconnected {
        /// Who left.
        player: String,
        /// How long until the forced return to lobby.
        grace: Duration,
    },
    /// The server accepted a Memory Stick; a replacement question follows.
    MemoryStickAccepted {
        /// Who spent it.
        player: String,
    },
    /// The server rejected a Memory Stick activation. Display-only.
    MemoryStickRejected {
        /// Why, when the server says.
        reason: Option<String>,
    },
    /// The handshake credential was rejected.
    AuthenticationFailed {
        /// The server's error text.
        message: String,
    },
    /// The transport dropped; the session is dead.
    ConnectionLost {
        /// Human-readable cause.
        reason: String,
    },
    /// The session was torn down; return to the lobby view.
    SessionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    #[test]
    fn test_outcome_sole_winner() {
        let outcome = GameOutcome::from_scores(&scores(&[("A", 10), ("B", 7)]));
        assert_eq!(outcome, GameOutcome::Winner("A".into()));
    }

    #[test]
    fn test_outcome_tie_on_equal_max() {
        let outcome = GameOutcome::from_scores(&scores(&[("A", 10), ("B", 10)]));
        assert_eq!(outcome, GameOutcome::Tie);
    }

    #[test]
    fn test_outcome_tie_includes_negative_scores() {
        let outcome = GameOutcome::from_scores(&scores(&[("A", -5), ("B", -5)]));
        assert_eq!(outcome, GameOutcome::Tie);
    }

    #[test]
    fn test_outcome_empty_mapping_degenerates_to_tie() {
        assert_eq!(GameOutcome::from_scores(&BTreeMap::new()), GameOutcome::Tie);
    }
}
