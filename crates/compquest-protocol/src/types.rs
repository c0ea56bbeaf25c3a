//! Core protocol types for the CompQuest wire format.
//!
//! Every message on the wire is a JSON object discriminated by an `event`
//! field. Inbound traffic decodes to [`ServerEvent`], outbound traffic
//! encodes from [`ClientCommand`]. The server is authoritative: the client
//! never computes scores or correctness, it only reflects what these
//! payloads say.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for a duel session, issued by the matchmaking service.
///
/// Newtype wrapper so a session identifier can't be confused with a player
/// name or a token. `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An answer-option letter (`A`, `B`, `C`, …), assigned by position.
///
/// Letters are a pure function of the option index in the `new_question`
/// payload — the server and both clients agree on the mapping without
/// negotiating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Letter(pub char);

impl Letter {
    /// Maps a 0-based option index to its letter (0 → A, 1 → B, …).
    ///
    /// Returns `None` past `Z`; a question with more than 26 options is not
    /// representable on this wire format.
    pub fn from_index(index: usize) -> Option<Self> {
        if index < 26 {
            Some(Self((b'A' + index as u8) as char))
        } else {
            None
        }
    }

    /// The inverse of [`from_index`](Self::from_index).
    pub fn index(self) -> Option<usize> {
        if self.0.is_ascii_uppercase() {
            Some(self.0 as usize - 'A' as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Power-ups
// ---------------------------------------------------------------------------

/// The two one-shot special actions a player may invoke during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUp {
    /// Asks the oracle for help with the current question.
    Turing,
    /// Swaps the current question for a fresh one.
    MemoryStick,
}

impl fmt::Display for PowerUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turing => write!(f, "turing"),
            Self::MemoryStick => write!(f, "memory_stick"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload fragments
// ---------------------------------------------------------------------------

/// One question as delivered by `new_question`.
///
/// Identifier-free by design: the client holds exactly one question at a
/// time and replaces it wholesale on each `new_question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The prompt text. Named `question` on the wire.
    #[serde(rename = "question")]
    pub prompt: String,
    /// Answer options in presentation order.
    pub options: Vec<String>,
    /// Optional advisory text accompanying the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_hint: Option<String>,
}

impl Question {
    /// Enumerates the options with their positional letters.
    pub fn lettered_options(&self) -> Vec<(Letter, &str)> {
        self.options
            .iter()
            .enumerate()
            .filter_map(|(i, opt)| Letter::from_index(i).map(|l| (l, opt.as_str())))
            .collect()
    }
}

/// Full session state carried by `session_ready`.
///
/// Most fields are defaulted so a minimal payload (`players` only) still
/// decodes. The power-up maps let a client adopt server-reported prior
/// usage instead of assuming a fresh session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Roster of participant names, in join order.
    pub players: Vec<String>,
    /// Cumulative score per player.
    #[serde(default)]
    pub scores: BTreeMap<String, i64>,
    /// Current correct-answer streak per player.
    #[serde(default)]
    pub streaks: BTreeMap<String, u32>,
    /// Which players have spent their Turing power-up.
    #[serde(default)]
    pub has_used_turing: BTreeMap<String, bool>,
    /// Which players have spent their Memory Stick power-up.
    #[serde(default)]
    pub has_used_memory_stick: BTreeMap<String, bool>,
    /// Index of the next question to be served.
    #[serde(default)]
    pub current_index: u32,
}

// ---------------------------------------------------------------------------
// ServerEvent — inbound messages
// ---------------------------------------------------------------------------

/// Every message the server pushes over the duplex connection.
///
/// `#[serde(tag = "event")]` produces the internally tagged format the
/// server speaks: `{ "event": "new_question", "question": { … } }`.
///
/// Two variants never come out of serde directly — [`AuthRejected`]
/// (a bare `{"error": …}` object with no event tag) and [`Unknown`]
/// (a well-formed object with an unrecognized tag) are constructed by
/// [`WireCodec::decode_event`](crate::WireCodec::decode_event) so that
/// unseen event types degrade gracefully instead of crashing the client.
///
/// [`AuthRejected`]: Self::AuthRejected
/// [`Unknown`]: Self::Unknown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Both players are matched; the duel is about to begin.
    SessionReady {
        /// Full session state, including seeds for the power-up ledger.
        session: SessionSnapshot,
    },

    /// A fresh question. Replaces any previously held question.
    NewQuestion {
        /// 1-based position of this question, when the server reports it.
        #[serde(default)]
        index: Option<u32>,
        /// Total number of questions in the duel.
        #[serde(default)]
        total: Option<u32>,
        /// The question payload.
        question: Question,
    },

    /// Someone answered first — the round is locked for both players.
    PlayerAnswered {
        /// Name of the player whose answer was accepted.
        player: String,
        /// Seconds from question broadcast to the accepted answer.
        #[serde(default)]
        response_time: Option<f64>,
        /// Set when the accepted round-consuming action was a power-up.
        /// Authoritative over any locally optimistic guess.
        #[serde(default)]
        power_up: Option<PowerUp>,
    },

    /// The outcome of the current round.
    RoundResult {
        /// The player whose answer was judged.
        winner: String,
        /// The chosen option's text.
        answer: String,
        /// The chosen option's letter.
        answer_letter: Letter,
        /// Whether the chosen answer was correct.
        correct: bool,
        /// Canonical correct answer text.
        correct_answer: String,
        /// Explanation text for the result modal.
        #[serde(default)]
        explanation: String,
        /// Authoritative scoreboard. Replaces the local one wholesale.
        scores: BTreeMap<String, i64>,
        /// Authoritative streaks. Replaces the local ones wholesale.
        #[serde(default)]
        streaks: BTreeMap<String, u32>,
        /// Whether a power-up affected this round.
        #[serde(default)]
        power_up_used: bool,
        /// Seconds the winning answer took.
        #[serde(default)]
        response_time: Option<f64>,
    },

    /// Informational: a player confirmed readiness for the next round.
    PlayerReady {
        /// The player who acknowledged.
        player: String,
        /// How many players have acknowledged so far.
        #[serde(default)]
        total_ready: Option<u32>,
    },

    /// Informational: both players acknowledged. The next question arrives
    /// via a separate `new_question` push.
    BothReady,

    /// The opponent's connection dropped. The session will not recover.
    PlayerDisconnected {
        /// Name of the player who left.
        disconnected_player: String,
        /// Human-readable notice from the server.
        #[serde(default)]
        message: Option<String>,
    },

    /// The duel is over. The outcome is derived from `final_scores`.
    GameOver {
        /// Final authoritative score mapping.
        final_scores: BTreeMap<String, i64>,
    },

    /// The server accepted a Memory Stick activation — the question will be
    /// replaced via a normal `new_question` push.
    MemoryStickUsed {
        /// Who spent the power-up.
        player: String,
    },

    /// The server rejected a Memory Stick activation. Display-only.
    MemoryStickFailed {
        /// Why it was rejected (e.g. already used).
        #[serde(default)]
        reason: Option<String>,
    },

    /// Bare error payload with no event tag: the handshake credential was
    /// rejected. The client closes the connection deliberately.
    #[serde(skip)]
    AuthRejected {
        /// The server's error text.
        message: String,
    },

    /// A well-formed message with an event tag this client doesn't know.
    /// Tolerated for forward compatibility; never a decode failure.
    #[serde(skip)]
    Unknown {
        /// The unrecognized tag.
        event: String,
        /// The full raw payload, for logging.
        payload: serde_json::Value,
    },
}

impl ServerEvent {
    /// Whether `tag` is an event this client knows how to decode.
    ///
    /// Must stay in sync with the serde-visible variants above; the codec
    /// uses it to separate "malformed known event" (an error) from
    /// "unrecognized event" (tolerated as [`ServerEvent::Unknown`]).
    pub fn recognized_tag(tag: &str) -> bool {
        matches!(
            tag,
            "session_ready"
                | "new_question"
                | "player_answered"
                | "round_result"
                | "player_ready"
                | "both_ready"
                | "player_disconnected"
                | "game_over"
                | "memory_stick_used"
                | "memory_stick_failed"
        )
    }
}

// ---------------------------------------------------------------------------
// ClientCommand — outbound messages
// ---------------------------------------------------------------------------

/// Every command the client may send. Fire-and-forget: effects are observed
/// only through later, separately tagged [`ServerEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Submit the chosen option for the active question.
    Answer {
        /// The chosen option letter.
        answer: Letter,
    },
    /// Acknowledge the round result and wait for the opponent.
    ReadyNext,
    /// Activate the Turing power-up.
    UseTuring,
    /// Activate the Memory Stick power-up.
    UseMemoryStick,
}

// =========================================================================
// Tests
// =========================================================================
