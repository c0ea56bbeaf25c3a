//! Integration tests for the lobby client.
//!
//! Each test mounts expectations on a wiremock server and points the
//! client at it, exercising the real reqwest pipeline end to end without
//! a lobby server.

use compquest_lobby::{LobbyClient, LobbyError};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_create_session_returns_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compquest/launch"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({"name": "Ana"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "abc-123",
            "message": "Session created, waiting for second player."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LobbyClient::new(server.uri(), "secret-token");
    let session = client.create_session("Ana").await.expect("should create");
    assert_eq!(session.0, "abc-123");
}

#[tokio::test]
async fn test_join_random_session_returns_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compquest/join-random-session"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({"name": "Bo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "abc-123",
            "message": "Game ready!",
            "players": ["Ana", "Bo"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LobbyClient::new(server.uri(), "secret-token");
    let session = client.join_random_session("Bo").await.expect("should join");
    assert_eq!(session.0, "abc-123");
}

#[tokio::test]
async fn test_join_random_session_maps_empty_pool_to_dedicated_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compquest/join-random-session"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"detail": "No available sessions found"})),
        )
        .mount(&server)
        .await;

    let client = LobbyClient::new(server.uri(), "secret-token");
    let err = client.join_random_session("Bo").await.unwrap_err();
    assert!(matches!(err, LobbyError::NoSessionsAvailable));
}

#[tokio::test]
async fn test_other_rejections_surface_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compquest/join-random-session"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Player already in session"})),
        )
        .mount(&server)
        .await;

    let client = LobbyClient::new(server.uri(), "secret-token");
    let err = client.join_random_session("Bo").await.unwrap_err();
    match err {
        LobbyError::Api { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Player already in session");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejection_without_json_body_keeps_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compquest/launch"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = LobbyClient::new(server.uri(), "secret-token");
    let err = client.create_session("Ana").await.unwrap_err();
    match err {
        LobbyError::Api { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "upstream exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_top_players_parses_leaderboard() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/compquest/score"))
        .and(query_param("limit", "3"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Ana", "best_score": 420},
            {"name": "Bo", "best_score": 310}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = LobbyClient::new(server.uri(), "secret-token");
    let entries = client.top_players(3).await.expect("should fetch");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Ana");
    assert_eq!(entries[0].best_score, 420);
    assert_eq!(entries[1].name, "Bo");
}
