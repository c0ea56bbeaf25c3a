//! Error types for the session layer.

use compquest_protocol::{Letter, PowerUp};

use crate::Phase;

/// Local validation rejections from the state machine's gating layer.
///
/// None of these ever reach the server — a rejected action produces no
/// outbound command. They indicate the caller asked for something the
/// current phase or ledger forbids.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// There is no active question to act on (answering or activating a
    /// power-up outside a round).
    #[error("no active question")]
    NoActiveQuestion,

    /// The round is already locked by a previous round-consuming action
    /// (an answer or a power-up activation, local or remote).
    #[error("round already locked")]
    RoundLocked,

    /// The power-up was already spent this session.
    #[error("power-up {0} already used this session")]
    PowerUpSpent(PowerUp),

    /// The letter does not correspond to any option of the current question.
    #[error("option {0} is not offered by the current question")]
    UnknownOption(Letter),

    /// The operation is not valid in the current phase (e.g. sending
    /// `ready_next` outside RoundResolved).
    #[error("{operation} is not valid in the {phase} phase")]
    InvalidPhase {
        /// The rejected operation.
        operation: &'static str,
        /// The phase the machine was in.
        phase: Phase,
    },
}
