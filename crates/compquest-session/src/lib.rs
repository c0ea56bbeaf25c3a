//! Duel session logic for CompQuest.
//!
//! This crate is the client's brain: a pure state machine that turns
//! decoded server events and validated local intents into effects, with
//! no I/O of its own.
//!
//! 1. **Phase tracking** — where the duel stands ([`SessionMachine`], [`Phase`])
//! 2. **Action gating** — rejecting answers and power-ups the current
//!    phase or ledger forbids, before anything is sent ([`SessionError`])
//! 3. **Power-up accounting** — one-shot usage flags ([`PowerUpLedger`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client Layer (above)  ← drives the machine, runs its effects
//!     ↕
//! Session Layer (this crate)  ← decides what happens, emits Effects
//!     ↕
//! Protocol Layer (below)  ← provides ServerEvent, ClientCommand types
//! ```

mod error;
mod intent;
mod machine;
mod powerup;

pub use error::SessionError;
pub use intent::{Effect, GameOutcome, RenderIntent, RoundSummary};
pub use machine::{Phase, ScoreEntry, Scoreboard, SessionConfig, SessionMachine};
pub use powerup::PowerUpLedger;
