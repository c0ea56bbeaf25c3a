//! The duel session state machine.
//!
//! [`SessionMachine`] owns the current phase, the question, the scoreboard,
//! and the power-up ledger. It consumes decoded [`ServerEvent`]s one at a
//! time (run to completion, no overlapping mutation) and validates local
//! user intents against the current phase before any command leaves the
//! process. Every step returns [`Effect`]s; the machine itself performs
//! no I/O.
//!
//! Phase diagram:
//!
//! ```text
//! Idle → Connecting → Lobby → QuestionActive ⇄ AnswerLocked
//!                                  ↑                │
//!                                  │           round_result
//!                                  │                ↓
//!                        new_question ← AwaitingOpponentReady ← RoundResolved
//!
//! game_over (any in-session phase) → GameOver ──ack──→ Idle
//! player_disconnected (any non-terminal) → Disconnected ──ack/expiry──→ Idle
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use compquest_protocol::{
    ClientCommand, Letter, PowerUp, Question, ServerEvent, SessionSnapshot,
};

use crate::{Effect, GameOutcome, PowerUpLedger, RenderIntent, RoundSummary, SessionError};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where the duel currently stands, from the local client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No active session.
    Idle,
    /// Handshake initiated, socket opening.
    Connecting,
    /// `session_ready` received, waiting for the first question.
    Lobby,
    /// A question is displayed; both players may act.
    QuestionActive,
    /// Exactly one round-consuming action was accepted; further attempts
    /// are rejected locally.
    AnswerLocked,
    /// The round result is being presented, awaiting local acknowledgment.
    RoundResolved,
    /// Local acknowledgment sent; the opponent hasn't acknowledged.
    AwaitingOpponentReady,
    /// Terminal for the session; requires acknowledgment to return to Idle.
    GameOver,
    /// Terminal unless acknowledged; auto-returns to Idle after the grace
    /// period.
    Disconnected,
}

impl Phase {
    /// Phases in which a round is underway (a question has been shown and
    /// not yet resolved past acknowledgment).
    fn in_round(self) -> bool {
        matches!(
            self,
            Self::QuestionActive
                | Self::AnswerLocked
                | Self::RoundResolved
                | Self::AwaitingOpponentReady
        )
    }

    /// Phases from which `player_disconnected` is accepted.
    fn accepts_disconnect(self) -> bool {
        !matches!(self, Self::Idle | Self::GameOver | Self::Disconnected)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Lobby => "lobby",
            Self::QuestionActive => "question-active",
            Self::AnswerLocked => "answer-locked",
            Self::RoundResolved => "round-resolved",
            Self::AwaitingOpponentReady => "awaiting-opponent-ready",
            Self::GameOver => "game-over",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Scoreboard
// ---------------------------------------------------------------------------

/// One player's standing. The server computes both fields; the client only
/// ever replaces them wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Cumulative score.
    pub score: i64,
    /// Current correct-answer streak.
    pub streak: u32,
}

/// Player name → standing, keyed by the roster names.
pub type Scoreboard = BTreeMap<String, ScoreEntry>;

fn build_scoreboard(scores: &BTreeMap<String, i64>, streaks: &BTreeMap<String, u32>) -> Scoreboard {
    scores
        .iter()
        .map(|(name, score)| {
            let streak = streaks.get(name).copied().unwrap_or(0);
            (name.clone(), ScoreEntry { score: *score, streak })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a Disconnected session waits for local acknowledgment
    /// before being force-closed. Default: 5 seconds.
    pub disconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            disconnect_grace: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionMachine
// ---------------------------------------------------------------------------

/// The owned session context: one per duel, no ambient state.
///
/// Exclusively owned and mutated through `&mut self` — the run-to-completion
/// guarantee comes from the host driving it from a single task.
#[derive(Debug)]
pub struct SessionMachine {
    local_player: String,
    config: SessionConfig,
    phase: Phase,
    roster: Vec<String>,
    scoreboard: Scoreboard,
    question: Option<Question>,
    /// The power-up sent in the current round's optimistic lock, awaiting
    /// server confirmation.
    pending_power_up: Option<PowerUp>,
    ledger: PowerUpLedger,
}

impl SessionMachine {
    /// Creates an idle machine for the named local player.
    pub fn new(local_player: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            local_player: local_player.into(),
            config,
            phase: Phase::Idle,
            roster: Vec::new(),
            scoreboard: Scoreboard::new(),
            question: None,
            pending_power_up: None,
            ledger: PowerUpLedger::new(),
        }
    }

    // -- Accessors --

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The local player's name.
    pub fn local_player(&self) -> &str {
        &self.local_player
    }

    /// The participant roster, empty outside a session.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// The current scoreboard view.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// The active question, if a round is underway.
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// The local player's power-up ledger.
    pub fn ledger(&self) -> &PowerUpLedger {
        &self.ledger
    }

    // -----------------------------------------------------------------
    // Connection lifecycle hooks (driven by the protocol client)
    // -----------------------------------------------------------------

    /// Marks the handshake as initiated. Idle → Connecting.
    pub fn begin_connect(&mut self) {
        tracing::debug!(player = %self.local_player, "connecting");
        self.phase = Phase::Connecting;
    }

    /// Handles a transport-level loss of connection. There is no resume
    /// protocol: all in-flight round state is discarded and the machine
    /// returns to Idle.
    pub fn connection_lost(&mut self, reason: &str) -> Vec<Effect> {
        if self.phase == Phase::Idle {
            return Vec::new();
        }
        tracing::warn!(phase = %self.phase, reason, "connection lost");
        let mut effects = Vec::new();
        if self.phase == Phase::Disconnected {
            effects.push(Effect::CancelDisconnectTimer);
        }
        self.reset();
        effects.push(Effect::Render(RenderIntent::ConnectionLost {
            reason: reason.to_owned(),
        }));
        effects
    }

    // -----------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------

    /// Applies one decoded server event and returns the effects to run.
    ///
    /// Events are processed strictly one at a time; every match arm runs to
    /// completion before the next event is seen.
    pub fn handle_event(&mut self, event: ServerEvent) -> Vec<Effect> {
        match event {
            ServerEvent::SessionReady { session } => self.on_session_ready(session),
            ServerEvent::NewQuestion { index, total, question } => {
                self.on_new_question(index, total, question)
            }
            ServerEvent::PlayerAnswered { player, power_up, .. } => {
                self.on_player_answered(player, power_up)
            }
            ServerEvent::RoundResult {
                winner,
                answer,
                answer_letter,
                correct,
                correct_answer,
                explanation,
                scores,
                streaks,
                power_up_used,
                response_time,
            } => self.on_round_result(RoundSummary {
                winner,
                answer_letter,
                answer,
                correct,
                correct_answer,
                explanation,
                power_up_used,
                response_time,
                scoreboard: build_scoreboard(&scores, &streaks),
            }),
            ServerEvent::PlayerReady { player, total_ready } => {
                vec![Effect::Render(RenderIntent::OpponentReady { player, total_ready })]
            }
            ServerEvent::BothReady => {
                // Informational only: the next question arrives via a
                // separate new_question push. If it never does, the duel is
                // stalled and this client defines no recovery.
                vec![Effect::Render(RenderIntent::BothReady)]
            }
            ServerEvent::PlayerDisconnected { disconnected_player, .. } => {
                self.on_player_disconnected(disconnected_player)
            }
            ServerEvent::GameOver { final_scores } => self.on_game_over(final_scores),
            ServerEvent::MemoryStickUsed { player } => self.on_memory_stick_used(player),
            ServerEvent::MemoryStickFailed { reason } => {
                // Display-only: no ledger mutation, no transition.
                vec![Effect::Render(RenderIntent::MemoryStickRejected { reason })]
            }
            ServerEvent::AuthRejected { message } => self.on_auth_rejected(message),
            ServerEvent::Unknown { event, .. } => {
                tracing::debug!(event, "ignoring unrecognized server event");
                Vec::new()
            }
        }
    }

    fn on_session_ready(&mut self, session: SessionSnapshot) -> Vec<Effect> {
        if !matches!(self.phase, Phase::Connecting | Phase::Lobby) {
            tracing::warn!(phase = %self.phase, "session_ready ignored outside connect");
            return Vec::new();
        }

        self.roster = session.players.clone();
        self.scoreboard = build_scoreboard(&session.scores, &session.streaks);
        // Adopt server-reported prior usage for the local player. Missing
        // entries mean "unused".
        let turing = session
            .has_used_turing
            .get(&self.local_player)
            .copied()
            .unwrap_or(false);
        let stick = session
            .has_used_memory_stick
            .get(&self.local_player)
            .copied()
            .unwrap_or(false);
        self.ledger.seed(PowerUp::Turing, turing);
        self.ledger.seed(PowerUp::MemoryStick, stick);

        self.phase = Phase::Lobby;
        tracing::info!(players = ?self.roster, "session ready");

        vec![Effect::Render(RenderIntent::SessionStarted {
            players: session.players,
            scoreboard: self.scoreboard.clone(),
        })]
    }

    fn on_new_question(
        &mut self,
        index: Option<u32>,
        total: Option<u32>,
        question: Question,
    ) -> Vec<Effect> {
        if !matches!(self.phase, Phase::Lobby) && !self.phase.in_round() {
            tracing::warn!(phase = %self.phase, "new_question ignored outside session");
            return Vec::new();
        }

        // Round boundary: the previous question is discarded wholesale,
        // never merged, and letters are re-enumerated from payload order.
        let options = question
            .lettered_options()
            .into_iter()
            .map(|(letter, text)| (letter, text.to_owned()))
            .collect();
        let intent = RenderIntent::QuestionPresented {
            index,
            total,
            prompt: question.prompt.clone(),
            options,
            oracle_hint: question.oracle_hint.clone(),
        };
        self.question = Some(question);
        self.pending_power_up = None;
        self.phase = Phase::QuestionActive;
        tracing::debug!(index, "question presented");

        vec![Effect::Render(intent)]
    }

    fn on_player_answered(&mut self, player: String, power_up: Option<PowerUp>) -> Vec<Effect> {
        // The payload's power-up flag is authoritative over any local
        // optimistic guess, and adopting it is idempotent.
        if player == self.local_player {
            if let Some(power_up) = power_up {
                self.ledger.mark_used(power_up);
                self.pending_power_up = None;
            }
        } else {
            // An opponent's answer consumes the round server-side. Any
            // in-flight local power-up loses the race: a later
            // memory_stick_used confirmation must not reopen this round.
            self.pending_power_up = None;
        }

        match self.phase {
            Phase::QuestionActive => {
                let by_local = player == self.local_player;
                self.phase = Phase::AnswerLocked;
                vec![Effect::Render(RenderIntent::InputsLocked { player, by_local })]
            }
            // Already locked (optimistically or by an earlier notification):
            // effects are applied exactly once per round, so repeats must
            // not re-disable anything.
            Phase::AnswerLocked => Vec::new(),
            _ => {
                tracing::debug!(phase = %self.phase, "player_answered outside round, ignored");
                Vec::new()
            }
        }
    }

    fn on_round_result(&mut self, summary: RoundSummary) -> Vec<Effect> {
        if !self.phase.in_round() {
            tracing::warn!(phase = %self.phase, "round_result ignored outside round");
            return Vec::new();
        }

        // The server's mapping fully replaces the local one — no merging,
        // no delta computation, regardless of any optimistic state.
        self.scoreboard = summary.scoreboard.clone();
        self.pending_power_up = None;
        self.phase = Phase::RoundResolved;
        tracing::debug!(winner = %summary.winner, correct = summary.correct, "round resolved");

        vec![Effect::Render(RenderIntent::RoundResolved(summary))]
    }

    fn on_player_disconnected(&mut self, player: String) -> Vec<Effect> {
        if !self.phase.accepts_disconnect() {
            tracing::debug!(phase = %self.phase, "player_disconnected ignored");
            return Vec::new();
        }

        let grace = self.config.disconnect_grace;
        self.phase = Phase::Disconnected;
        tracing::info!(%player, grace_secs = grace.as_secs(), "opponent disconnected");

        vec![
            Effect::Render(RenderIntent::OpponentDisconnected { player, grace }),
            Effect::StartDisconnectTimer(grace),
        ]
    }

    fn on_game_over(&mut self, final_scores: BTreeMap<String, i64>) -> Vec<Effect> {
        // Accepted from any state except Idle/Disconnected; supersedes any
        // pending RoundResolved/AwaitingOpponentReady state.
        if matches!(self.phase, Phase::Idle | Phase::Disconnected) {
            tracing::warn!(phase = %self.phase, "game_over ignored");
            return Vec::new();
        }

        let outcome = GameOutcome::from_scores(&final_scores);
        self.scoreboard = build_scoreboard(&final_scores, &BTreeMap::new());
        self.question = None;
        self.phase = Phase::GameOver;
        tracing::info!(?outcome, "game over");

        vec![Effect::Render(RenderIntent::GameEnded { outcome, final_scores })]
    }

    fn on_memory_stick_used(&mut self, player: String) -> Vec<Effect> {
        if player == self.local_player {
            self.ledger.mark_used(PowerUp::MemoryStick);
            // The swap did not consume the answer race: release the local
            // optimistic lock and wait for the replacement question.
            if self.phase == Phase::AnswerLocked
                && self.pending_power_up == Some(PowerUp::MemoryStick)
            {
                self.phase = Phase::QuestionActive;
            }
            self.pending_power_up = None;
        }
        vec![Effect::Render(RenderIntent::MemoryStickAccepted { player })]
    }

    fn on_auth_rejected(&mut self, message: String) -> Vec<Effect> {
        tracing::warn!(%message, "authentication rejected by server");
        let mut effects = Vec::new();
        if self.phase == Phase::Disconnected {
            effects.push(Effect::CancelDisconnectTimer);
        }
        self.reset();
        effects.push(Effect::Render(RenderIntent::AuthenticationFailed { message }));
        // Deliberate, locally initiated close — not a transport fault.
        effects.push(Effect::CloseConnection);
        effects
    }

    // -----------------------------------------------------------------
    // Local operations (the gating layer)
    // -----------------------------------------------------------------

    /// Submits an answer for the active question.
    ///
    /// Answering is a round-consuming action: on success the round is
    /// locked locally pending server confirmation, and no further answer
    /// or power-up attempt will be sent this round.
    ///
    /// # Errors
    /// Rejected without sending anything when no question is active, the
    /// round is already locked, or the letter doesn't match an option.
    pub fn submit_answer(&mut self, letter: Letter) -> Result<Vec<Effect>, SessionError> {
        let question = match self.phase {
            Phase::QuestionActive => self.question.as_ref().ok_or(SessionError::NoActiveQuestion)?,
            Phase::AnswerLocked => return Err(SessionError::RoundLocked),
            _ => return Err(SessionError::NoActiveQuestion),
        };
        let valid = letter
            .index()
            .is_some_and(|i| i < question.options.len());
        if !valid {
            return Err(SessionError::UnknownOption(letter));
        }

        self.phase = Phase::AnswerLocked;
        tracing::debug!(%letter, "answer submitted");

        Ok(vec![
            Effect::Send(ClientCommand::Answer { answer: letter }),
            Effect::Render(RenderIntent::InputsLocked {
                player: self.local_player.clone(),
                by_local: true,
            }),
        ])
    }

    /// Activates a one-shot power-up.
    ///
    /// Mutually exclusive with answering: activation consumes the round's
    /// single local action slot, pending server confirmation. The ledger
    /// flag itself is only flipped when a confirmation event referencing
    /// this player arrives.
    ///
    /// # Errors
    /// Rejected without sending anything when the ledger flag is already
    /// set, no question is active, or the round is already locked.
    pub fn activate_power_up(&mut self, power_up: PowerUp) -> Result<Vec<Effect>, SessionError> {
        if !self.ledger.can_use(power_up) {
            return Err(SessionError::PowerUpSpent(power_up));
        }
        match self.phase {
            Phase::QuestionActive => {}
            Phase::AnswerLocked => return Err(SessionError::RoundLocked),
            _ => return Err(SessionError::NoActiveQuestion),
        }

        let command = match power_up {
            PowerUp::Turing => ClientCommand::UseTuring,
            PowerUp::MemoryStick => ClientCommand::UseMemoryStick,
        };
        self.phase = Phase::AnswerLocked;
        self.pending_power_up = Some(power_up);
        tracing::debug!(%power_up, "power-up activation sent");

        Ok(vec![
            Effect::Send(command),
            Effect::Render(RenderIntent::InputsLocked {
                player: self.local_player.clone(),
                by_local: true,
            }),
        ])
    }

    /// Acknowledges the round result and tells the server we're ready.
    ///
    /// # Errors
    /// Valid only in RoundResolved.
    pub fn acknowledge_result(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.phase != Phase::RoundResolved {
            return Err(SessionError::InvalidPhase {
                operation: "ready_next",
                phase: self.phase,
            });
        }
        self.phase = Phase::AwaitingOpponentReady;
        Ok(vec![
            Effect::Send(ClientCommand::ReadyNext),
            Effect::Render(RenderIntent::WaitingForOpponent),
        ])
    }

    /// Acknowledges the final standings and destroys the session.
    ///
    /// # Errors
    /// Valid only in GameOver.
    pub fn acknowledge_game_over(&mut self) -> Result<Vec<Effect>, SessionError> {
        if self.phase != Phase::GameOver {
            return Err(SessionError::InvalidPhase {
                operation: "game-over acknowledgment",
                phase: self.phase,
            });
        }
        self.reset();
        Ok(vec![
            Effect::Render(RenderIntent::SessionClosed),
            Effect::CloseConnection,
        ])
    }

    /// Acknowledges the opponent's disconnect, returning to Idle now
    /// instead of waiting out the grace period.
    ///
    /// Idempotent: if the grace timer already won the race (or this is a
    /// repeat), it is a no-op — never an error.
    pub fn acknowledge_disconnect(&mut self) -> Vec<Effect> {
        self.leave_disconnected_session()
    }

    /// The disconnect timer's expiry path. Routes through the same
    /// idempotent teardown as [`acknowledge_disconnect`](Self::acknowledge_disconnect);
    /// whichever of the two fires second is a no-op.
    pub fn disconnect_grace_elapsed(&mut self) -> Vec<Effect> {
        self.leave_disconnected_session()
    }

    fn leave_disconnected_session(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Disconnected {
            return Vec::new();
        }
        tracing::info!("leaving disconnected session");
        self.reset();
        vec![
            Effect::CancelDisconnectTimer,
            Effect::Render(RenderIntent::SessionClosed),
            Effect::CloseConnection,
        ]
    }

    /// Clears all session state back to Idle. The ledger is session-scoped,
    /// so it resets with everything else.
    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.roster.clear();
        self.scoreboard.clear();
        self.question = None;
        self.pending_power_up = None;
        self.ledger = PowerUpLedger::new();
    }
}

// =========================================================================
// Tests
// =========================================================================
