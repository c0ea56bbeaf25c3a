//! `DuelClient`: the protocol client shell.
//!
//! One Tokio task (the driver) owns the connection and the state machine
//! and runs a `tokio::select!` loop over three sources:
//!   1. the inbound socket — decoded events fed to the machine in order
//!   2. the handle's command channel — validated local intents
//!   3. an optional disconnect deadline — armed and cleared by effects
//!
//! Everything the machine decides comes back as effects, dispatched after
//! each step. The handle side is fire-and-forget: gating rejections are
//! logged, never surfaced as channel errors.

use compquest_protocol::{JsonCodec, Letter, PowerUp, SessionId, WireCodec};
use compquest_session::{
    Effect, Phase, RenderIntent, SessionConfig, SessionMachine,
};
use compquest_transport::{Connection, WebSocketConnection};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::CompquestError;

/// Connection settings for a duel.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket base URL of the game server, e.g. `ws://localhost:8000`.
    pub base_url: String,
    /// Bearer token; travels as a `token` query parameter on the
    /// connection URL.
    pub token: String,
    /// Session behavior tunables.
    pub session: SessionConfig,
}

/// Commands from the handle to the driver task.
enum ClientOp {
    SubmitAnswer(Letter),
    ActivatePowerUp(PowerUp),
    AcknowledgeResult,
    AcknowledgeGameOver,
    AcknowledgeDisconnect,
    GetPhase(oneshot::Sender<Phase>),
    Shutdown,
}

/// Handle to a running duel.
///
/// Cheap to use from any task; all operations are messages to the driver.
/// Dropping the handle shuts the driver down once its channel drains.
pub struct DuelClient {
    ops: mpsc::Sender<ClientOp>,
    intents: Option<mpsc::UnboundedReceiver<RenderIntent>>,
    driver: tokio::task::JoinHandle<()>,
}

impl DuelClient {
    /// Connects to the given session and spawns the driver task.
    ///
    /// The returned handle carries the render-intent stream; call
    /// [`take_intents`](Self::take_intents) once and drive a presentation
    /// layer from it.
    pub async fn connect(
        config: ClientConfig,
        session_id: &SessionId,
        player_name: &str,
    ) -> Result<Self, CompquestError> {
        let url = format!(
            "{}/compquest/ws/{}/{}?token={}",
            config.base_url, session_id, player_name, config.token,
        );

        let mut machine = SessionMachine::new(player_name, config.session);
        machine.begin_connect();
        let conn = WebSocketConnection::connect(&url).await?;
        tracing::info!(session = %session_id, player = player_name, "duel connected");

        let (ops_tx, ops_rx) = mpsc::channel(32);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(async move {
            Driver {
                conn,
                codec: JsonCodec,
                machine,
                ops: ops_rx,
                intents: intents_tx,
                deadline: None,
            }
            .run()
            .await;
        });

        Ok(Self {
            ops: ops_tx,
            intents: Some(intents_rx),
            driver,
        })
    }

    /// Takes the render-intent stream. Yields `Some` exactly once.
    pub fn take_intents(&mut self) -> Option<mpsc::UnboundedReceiver<RenderIntent>> {
        self.intents.take()
    }

    /// Submits an answer for the active question. Fire-and-forget;
    /// a gating rejection is logged by the driver, not returned.
    pub async fn submit_answer(&self, letter: Letter) {
        let _ = self.ops.send(ClientOp::SubmitAnswer(letter)).await;
    }

    /// Activates a one-shot power-up. Fire-and-forget.
    pub async fn activate_power_up(&self, power_up: PowerUp) {
        let _ = self.ops.send(ClientOp::ActivatePowerUp(power_up)).await;
    }

    /// Acknowledges the round result (sends `ready_next`).
    pub async fn acknowledge_result(&self) {
        let _ = self.ops.send(ClientOp::AcknowledgeResult).await;
    }

    /// Acknowledges the final standings, tearing the session down.
    pub async fn acknowledge_game_over(&self) {
        let _ = self.ops.send(ClientOp::AcknowledgeGameOver).await;
    }

    /// Acknowledges an opponent disconnect without waiting out the grace
    /// period.
    pub async fn acknowledge_disconnect(&self) {
        let _ = self.ops.send(ClientOp::AcknowledgeDisconnect).await;
    }

    /// Queries the machine's current phase. `None` if the driver is gone.
    pub async fn phase(&self) -> Option<Phase> {
        let (tx, rx) = oneshot::channel();
        self.ops.send(ClientOp::GetPhase(tx)).await.ok()?;
        rx.await.ok()
    }

    /// Asks the driver to close the connection and exit.
    pub async fn shutdown(&self) {
        let _ = self.ops.send(ClientOp::Shutdown).await;
    }

    /// Waits for the driver task to finish.
    pub async fn wait(self) {
        let _ = self.driver.await;
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

struct Driver<C: Connection> {
    conn: C,
    codec: JsonCodec,
    machine: SessionMachine,
    ops: mpsc::Receiver<ClientOp>,
    intents: mpsc::UnboundedSender<RenderIntent>,
    /// When set, the `select!` deadline branch is armed.
    deadline: Option<Instant>,
}

impl<C: Connection> Driver<C> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                inbound = self.conn.recv() => {
                    if self.handle_inbound(inbound).await {
                        break;
                    }
                }
                op = self.ops.recv() => {
                    let Some(op) = op else {
                        // Handle dropped: deliberate local shutdown.
                        let _ = self.conn.close().await;
                        break;
                    };
                    if self.handle_op(op).await {
                        break;
                    }
                }
                _ = tokio::time::sleep_until(self.deadline.unwrap_or_else(Instant::now)),
                    if self.deadline.is_some() =>
                {
                    self.deadline = None;
                    let effects = self.machine.disconnect_grace_elapsed();
                    if self.dispatch(effects).await {
                        break;
                    }
                }
            }
        }
        tracing::debug!("driver task exiting");
    }

    /// Processes one inbound frame (or transport fault). Returns `true`
    /// when the loop should exit.
    async fn handle_inbound(
        &mut self,
        inbound: Result<Option<Vec<u8>>, C::Error>,
    ) -> bool {
        let data = match inbound {
            Ok(Some(data)) => data,
            Ok(None) => {
                let effects = self.machine.connection_lost("connection closed by server");
                self.dispatch(effects).await;
                return true;
            }
            Err(e) => {
                let effects = self.machine.connection_lost(&e.to_string());
                self.dispatch(effects).await;
                return true;
            }
        };

        // A malformed payload is dropped with a logged fault; it never
        // kills the loop or the session.
        let event = match self.codec.decode_event(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed server payload");
                return false;
            }
        };

        let effects = self.machine.handle_event(event);
        self.dispatch(effects).await
    }

    /// Processes one handle command. Returns `true` when the loop should
    /// exit.
    async fn handle_op(&mut self, op: ClientOp) -> bool {
        let result = match op {
            ClientOp::SubmitAnswer(letter) => self.machine.submit_answer(letter),
            ClientOp::ActivatePowerUp(power_up) => self.machine.activate_power_up(power_up),
            ClientOp::AcknowledgeResult => self.machine.acknowledge_result(),
            ClientOp::AcknowledgeGameOver => self.machine.acknowledge_game_over(),
            ClientOp::AcknowledgeDisconnect => Ok(self.machine.acknowledge_disconnect()),
            ClientOp::GetPhase(reply) => {
                let _ = reply.send(self.machine.phase());
                return false;
            }
            ClientOp::Shutdown => {
                let _ = self.conn.close().await;
                return true;
            }
        };

        match result {
            Ok(effects) => self.dispatch(effects).await,
            Err(e) => {
                tracing::debug!(error = %e, "local action rejected");
                false
            }
        }
    }

    /// Executes the machine's effects in order. Returns `true` when an
    /// effect ended the connection.
    async fn dispatch(&mut self, effects: Vec<Effect>) -> bool {
        for effect in effects {
            match effect {
                Effect::Render(intent) => {
                    // A dropped presentation side is fine; the duel
                    // continues headless.
                    let _ = self.intents.send(intent);
                }
                Effect::Send(command) => {
                    let bytes = match self.codec.encode_command(&command) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to encode command");
                            continue;
                        }
                    };
                    if let Err(e) = self.conn.send(&bytes).await {
                        // Loss effects are renders and timer cancels only;
                        // handled inline to keep dispatch non-recursive.
                        for fx in self.machine.connection_lost(&e.to_string()) {
                            match fx {
                                Effect::Render(intent) => {
                                    let _ = self.intents.send(intent);
                                }
                                Effect::CancelDisconnectTimer => self.deadline = None,
                                _ => {}
                            }
                        }
                        return true;
                    }
                }
                Effect::StartDisconnectTimer(grace) => {
                    self.deadline = Some(Instant::now() + grace);
                }
                Effect::CancelDisconnectTimer => {
                    self.deadline = None;
                }
                Effect::CloseConnection => {
                    let _ = self.conn.close().await;
                    return true;
                }
            }
        }
        false
    }
}
