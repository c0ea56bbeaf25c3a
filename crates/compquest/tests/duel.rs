//! Integration tests for the duel client.
//!
//! Each test binds a scripted WebSocket server on a loopback socket and
//! plays one side of the protocol against a real `DuelClient`, asserting
//! on the render-intent stream the client produces.

use std::time::Duration;

use compquest::prelude::*;
use compquest::{ClientConfig, DuelClient};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// Binds a loopback listener and returns its base URL plus a handle
/// resolving to the accepted server-side stream.
async fn bind_server() -> (String, tokio::task::JoinHandle<ServerWs>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed")
    });

    (format!("ws://{addr}"), handle)
}

async fn connect(base_url: String, grace: Duration) -> DuelClient {
    let config = ClientConfig {
        base_url,
        token: "test-token".into(),
        session: SessionConfig { disconnect_grace: grace },
    };
    DuelClient::connect(config, &SessionId("s-1".into()), "Ana")
        .await
        .expect("client should connect")
}

async fn send_json(ws: &mut ServerWs, json: serde_json::Value) {
    ws.send(Message::Text(json.to_string().into()))
        .await
        .expect("server send should succeed");
}

/// Reads the next inbound data frame on the server side as JSON.
async fn recv_json(ws: &mut ServerWs) -> serde_json::Value {
    loop {
        match ws.next().await.expect("stream should yield").unwrap() {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Binary(data) => return serde_json::from_slice(&data).unwrap(),
            _ => continue,
        }
    }
}

fn session_ready() -> serde_json::Value {
    serde_json::json!({
        "event": "session_ready",
        "session": {
            "players": ["Ana", "Bo"],
            "scores": {"Ana": 0, "Bo": 0},
        },
    })
}

fn new_question() -> serde_json::Value {
    serde_json::json!({
        "event": "new_question",
        "index": 1,
        "total": 5,
        "question": {
            "question": "What does CPU stand for?",
            "options": ["Central Processing Unit", "Core Power Unit", "Compute Path Utility"],
        },
    })
}

/// Receives intents until one matches, panicking on stream end.
async fn expect_intent(
    intents: &mut UnboundedReceiver<RenderIntent>,
    matcher: impl Fn(&RenderIntent) -> bool,
    what: &str,
) -> RenderIntent {
    loop {
        let intent = tokio::time::timeout(Duration::from_secs(5), intents.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
            .unwrap_or_else(|| panic!("intent stream ended waiting for {what}"));
        if matcher(&intent) {
            return intent;
        }
    }
}

#[tokio::test]
async fn test_full_duel_flow() {
    let (base_url, server) = bind_server().await;

    let server_script = tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, session_ready()).await;
        send_json(&mut ws, new_question()).await;

        // The client answers; echo the lock, then resolve the round.
        let answer = recv_json(&mut ws).await;
        assert_eq!(answer["event"], "answer");
        assert_eq!(answer["answer"], "A");
        send_json(
            &mut ws,
            serde_json::json!({"event": "player_answered", "player": "Ana", "response_time": 1.2}),
        )
        .await;
        send_json(
            &mut ws,
            serde_json::json!({
                "event": "round_result",
                "winner": "Ana",
                "answer": "Central Processing Unit",
                "answer_letter": "A",
                "correct": true,
                "correct_answer": "Central Processing Unit",
                "explanation": "",
                "scores": {"Ana": 100, "Bo": 0},
            }),
        )
        .await;

        let ready = recv_json(&mut ws).await;
        assert_eq!(ready["event"], "ready_next");

        send_json(
            &mut ws,
            serde_json::json!({"event": "game_over", "final_scores": {"Ana": 100, "Bo": 0}}),
        )
        .await;

        // The client acknowledges and closes; drain to the close frame.
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    let mut client = connect(base_url, Duration::from_secs(5)).await;
    let mut intents = client.take_intents().expect("intents available once");

    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::SessionStarted { .. }),
        "SessionStarted",
    )
    .await;

    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::QuestionPresented { .. }),
        "QuestionPresented",
    )
    .await;

    client.submit_answer(Letter('A')).await;
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::InputsLocked { by_local: true, .. }),
        "InputsLocked",
    )
    .await;

    let resolved = expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::RoundResolved(_)),
        "RoundResolved",
    )
    .await;
    if let RenderIntent::RoundResolved(summary) = resolved {
        assert!(summary.correct);
        assert_eq!(summary.scoreboard["Ana"].score, 100);
    }

    client.acknowledge_result().await;
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::WaitingForOpponent),
        "WaitingForOpponent",
    )
    .await;

    let ended = expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::GameEnded { .. }),
        "GameEnded",
    )
    .await;
    if let RenderIntent::GameEnded { outcome, .. } = ended {
        assert_eq!(outcome, GameOutcome::Winner("Ana".into()));
    }

    client.acknowledge_game_over().await;
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::SessionClosed),
        "SessionClosed",
    )
    .await;

    client.wait().await;
    server_script.await.unwrap();
}

#[tokio::test]
async fn test_answer_command_reaches_server_as_tagged_json() {
    let (base_url, server) = bind_server().await;

    let server_script = tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, session_ready()).await;
        send_json(&mut ws, new_question()).await;
        recv_json(&mut ws).await
    });

    let mut client = connect(base_url, Duration::from_secs(5)).await;
    let mut intents = client.take_intents().unwrap();
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::QuestionPresented { .. }),
        "QuestionPresented",
    )
    .await;

    client.submit_answer(Letter('B')).await;

    let received = server_script.await.unwrap();
    assert_eq!(received, serde_json::json!({"event": "answer", "answer": "B"}));
}

#[tokio::test]
async fn test_disconnect_grace_expiry_tears_down_exactly_once() {
    let (base_url, server) = bind_server().await;

    tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, session_ready()).await;
        send_json(
            &mut ws,
            serde_json::json!({
                "event": "player_disconnected",
                "disconnected_player": "Bo",
                "message": "Bo saiu da partida",
            }),
        )
        .await;
        // Hold the socket open; the client must tear down on its own.
        while ws.next().await.is_some() {}
    });

    let mut client = connect(base_url, Duration::from_millis(50)).await;
    let mut intents = client.take_intents().unwrap();

    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::OpponentDisconnected { .. }),
        "OpponentDisconnected",
    )
    .await;

    // No acknowledgment: the grace timer must fire and close the session.
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::SessionClosed),
        "SessionClosed",
    )
    .await;

    // The driver exits after the teardown; the stream ends with no second
    // SessionClosed.
    let mut extra_closes = 0;
    while let Some(intent) = intents.recv().await {
        if matches!(intent, RenderIntent::SessionClosed) {
            extra_closes += 1;
        }
    }
    assert_eq!(extra_closes, 0);
    client.wait().await;
}

#[tokio::test]
async fn test_disconnect_acknowledgment_preempts_grace_timer() {
    let (base_url, server) = bind_server().await;

    tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, session_ready()).await;
        send_json(
            &mut ws,
            serde_json::json!({
                "event": "player_disconnected",
                "disconnected_player": "Bo",
            }),
        )
        .await;
        while ws.next().await.is_some() {}
    });

    // Grace far beyond the test timeout: only the ack can close this.
    let mut client = connect(base_url, Duration::from_secs(600)).await;
    let mut intents = client.take_intents().unwrap();

    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::OpponentDisconnected { .. }),
        "OpponentDisconnected",
    )
    .await;

    client.acknowledge_disconnect().await;
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::SessionClosed),
        "SessionClosed",
    )
    .await;

    tokio::time::timeout(Duration::from_secs(5), client.wait())
        .await
        .expect("driver should exit promptly after acknowledgment");
}

#[tokio::test]
async fn test_malformed_payload_is_dropped_not_fatal() {
    let (base_url, server) = bind_server().await;

    tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, session_ready()).await;
        ws.send(Message::Text("definitely not json".into()))
            .await
            .unwrap();
        ws.send(Message::Text("[1,2,3]".into())).await.unwrap();
        send_json(&mut ws, new_question()).await;
        while ws.next().await.is_some() {}
    });

    let mut client = connect(base_url, Duration::from_secs(5)).await;
    let mut intents = client.take_intents().unwrap();

    // The garbage in between must not kill the loop or the session.
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::QuestionPresented { .. }),
        "QuestionPresented",
    )
    .await;
    assert_eq!(client.phase().await, Some(Phase::QuestionActive));
}

#[tokio::test]
async fn test_auth_rejection_closes_deliberately() {
    let (base_url, server) = bind_server().await;

    tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, serde_json::json!({"error": "Token inválido ou ausente"})).await;
        while ws.next().await.is_some() {}
    });

    let mut client = connect(base_url, Duration::from_secs(5)).await;
    let mut intents = client.take_intents().unwrap();

    let intent = expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::AuthenticationFailed { .. }),
        "AuthenticationFailed",
    )
    .await;
    if let RenderIntent::AuthenticationFailed { message } = intent {
        assert!(message.contains("Token"));
    }

    // Deliberate close: the driver exits and the intent stream ends.
    tokio::time::timeout(Duration::from_secs(5), client.wait())
        .await
        .expect("driver should exit after auth rejection");
    assert!(intents.recv().await.is_none());
}

#[tokio::test]
async fn test_server_close_surfaces_connection_lost() {
    let (base_url, server) = bind_server().await;

    tokio::spawn(async move {
        let mut ws = server.await.unwrap();
        send_json(&mut ws, session_ready()).await;
        ws.send(Message::Close(None)).await.unwrap();
    });

    let mut client = connect(base_url, Duration::from_secs(5)).await;
    let mut intents = client.take_intents().unwrap();

    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::SessionStarted { .. }),
        "SessionStarted",
    )
    .await;
    expect_intent(
        &mut intents,
        |i| matches!(i, RenderIntent::ConnectionLost { .. }),
        "ConnectionLost",
    )
    .await;

    client.wait().await;
}
