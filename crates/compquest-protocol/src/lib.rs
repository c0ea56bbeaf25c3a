//! Wire protocol for the CompQuest trivia duel.
//!
//! This crate defines the language the client and server speak:
//!
//! - **Types** ([`ServerEvent`], [`ClientCommand`], [`Question`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`WireCodec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing it.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw WebSocket frames) and
//! the session state machine (duel phase, scores, power-ups). It knows
//! nothing about connections or game rules — only message shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (ServerEvent) → Session (phase + effects)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{JsonCodec, WireCodec};
pub use error::ProtocolError;
pub use types::{
    ClientCommand, Letter, PowerUp, Question, ServerEvent, SessionId, SessionSnapshot,
};
