//! Headless terminal client for CompQuest duels.
//!
//! Joins a random open session (or creates one and waits), then plays the
//! duel on stdin/stdout. Commands:
//!
//! ```text
//! a / b / c / d   answer the active question
//! turing          ask the oracle for help
//! stick           swap the current question
//! next            acknowledge the round result
//! done            acknowledge the final standings
//! leave           leave a disconnected session immediately
//! top             print the leaderboard
//! quit            close the connection and exit
//! ```
//!
//! Configuration via environment: `COMPQUEST_SERVER` (default
//! `http://localhost:8000`) and `COMPQUEST_TOKEN`.

use compquest::prelude::*;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "duel_cli=info".into()),
        )
        .init();

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "anonymous".to_string());
    let base_url =
        std::env::var("COMPQUEST_SERVER").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let token = std::env::var("COMPQUEST_TOKEN").unwrap_or_default();
    let ws_base = base_url.replacen("http", "ws", 1);

    let lobby = LobbyClient::new(base_url, token.clone());
    let session_id = match lobby.join_random_session(&name).await {
        Ok(id) => {
            println!("joined session {id}");
            id
        }
        Err(LobbyError::NoSessionsAvailable) => {
            let id = lobby.create_session(&name).await?;
            println!("no open sessions; created {id}, waiting for an opponent");
            id
        }
        Err(e) => return Err(e.into()),
    };

    let config = ClientConfig {
        base_url: ws_base,
        token,
        session: SessionConfig::default(),
    };
    let mut client = DuelClient::connect(config, &session_id, &name).await?;
    let mut intents = client.take_intents().expect("fresh client");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            intent = intents.recv() => {
                let Some(intent) = intent else { break };
                render(&name, intent);
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                match line.trim().to_lowercase().as_str() {
                    "" => {}
                    "turing" => client.activate_power_up(PowerUp::Turing).await,
                    "stick" => client.activate_power_up(PowerUp::MemoryStick).await,
                    "next" => client.acknowledge_result().await,
                    "done" => client.acknowledge_game_over().await,
                    "leave" => client.acknowledge_disconnect().await,
                    "top" => match lobby.top_players(3).await {
                        Ok(entries) => {
                            for (i, entry) in entries.iter().enumerate() {
                                println!("  {}. {} — {}", i + 1, entry.name, entry.best_score);
                            }
                        }
                        Err(e) => println!("leaderboard unavailable: {e}"),
                    },
                    "quit" => {
                        client.shutdown().await;
                        break;
                    }
                    answer => match answer.to_uppercase().chars().next() {
                        Some(c) if answer.len() == 1 && c.is_ascii_uppercase() => {
                            client.submit_answer(Letter(c)).await;
                        }
                        _ => println!("unknown command: {answer}"),
                    },
                }
            }
        }
    }

    client.wait().await;
    Ok(())
}

fn render(local: &str, intent: RenderIntent) {
    match intent {
        RenderIntent::SessionStarted { players, .. } => {
            println!("duel started: {}", players.join(" vs "));
        }
        RenderIntent::QuestionPresented { index, total, prompt, options, oracle_hint } => {
            match (index, total) {
                (Some(i), Some(t)) => println!("\nquestion {i}/{t}: {prompt}"),
                _ => println!("\n{prompt}"),
            }
            for (letter, text) in options {
                println!("  {letter}) {text}");
            }
            if let Some(hint) = oracle_hint {
                println!("  (oracle hint available: {hint})");
            }
        }
        RenderIntent::InputsLocked { player, by_local } => {
            if by_local {
                println!("answer sent, waiting for the result…");
            } else {
                println!("{player} was faster — round locked");
            }
        }
        RenderIntent::RoundResolved(summary) => {
            let verdict = if summary.correct { "correct" } else { "wrong" };
            println!(
                "{} answered {} ({}) — {verdict}; the right answer was {}",
                summary.winner, summary.answer_letter, summary.answer, summary.correct_answer,
            );
            if !summary.explanation.is_empty() {
                println!("  {}", summary.explanation);
            }
            for (player, entry) in &summary.scoreboard {
                println!("  {player}: {} (streak {})", entry.score, entry.streak);
            }
            println!("type `next` when ready");
        }
        RenderIntent::WaitingForOpponent => println!("waiting for your opponent…"),
        RenderIntent::OpponentReady { player, .. } => println!("{player} is ready"),
        RenderIntent::BothReady => println!("both ready — next question incoming"),
        RenderIntent::GameEnded { outcome, final_scores } => {
            println!("\ngame over!");
            for (player, score) in &final_scores {
                println!("  {player}: {score}");
            }
            match outcome {
                GameOutcome::Winner(winner) if winner == local => println!("you win!"),
                GameOutcome::Winner(winner) => println!("{winner} wins"),
                GameOutcome::Tie => println!("it's a tie"),
            }
            println!("type `done` to leave");
        }
        RenderIntent::OpponentDisconnected { player, grace } => {
            println!(
                "{player} disconnected; leaving in {}s (or type `leave`)",
                grace.as_secs(),
            );
        }
        RenderIntent::MemoryStickAccepted { player } => {
            println!("{player} swapped the question");
        }
        RenderIntent::MemoryStickRejected { reason } => {
            println!(
                "memory stick rejected: {}",
                reason.unwrap_or_else(|| "no reason given".to_string()),
            );
        }
        RenderIntent::AuthenticationFailed { message } => {
            println!("authentication failed: {message}");
        }
        RenderIntent::ConnectionLost { reason } => println!("connection lost: {reason}"),
        RenderIntent::SessionClosed => println!("session closed"),
    }
}
