//! Integration tests for the Sketchturn server, handler, and full
//! connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use sketchturn::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with(GameConfig::default()).await
}

async fn start_server_with(game: GameConfig) -> String {
    let server = SketchServer::builder()
        .bind("127.0.0.1:0")
        .game_config(game)
        .join_timeout(Duration::from_millis(500))
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).expect("encode");
    ws.send(Message::Text(json.into())).await.expect("send");
}

async fn recv(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended")
        .expect("recv");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

/// Reads events until one matches, returning it.
async fn recv_until(ws: &mut ClientWs, pred: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
    loop {
        let event = recv(ws).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Connects and joins `room`, returning the socket and assigned id. The
/// Welcome and first RoomView are consumed.
async fn join(addr: &str, room: &str, name: &str) -> (ClientWs, ParticipantId) {
    let mut ws = connect(addr).await;
    send(
        &mut ws,
        &ClientMessage::Join {
            room_id: room.into(),
            name: name.into(),
        },
    )
    .await;
    let id = match recv(&mut ws).await {
        ServerEvent::Welcome { participant_id } => participant_id,
        other => panic!("expected Welcome, got {other:?}"),
    };
    recv_until(&mut ws, |e| matches!(e, ServerEvent::RoomView(_))).await;
    (ws, id)
}

fn is_view_with(n: usize) -> impl Fn(&ServerEvent) -> bool {
    move |e| matches!(e, ServerEvent::RoomView(v) if v.participants.len() == n)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_sends_welcome_then_view() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(
        &mut ws,
        &ClientMessage::Join {
            room_id: "lobby".into(),
            name: "Ada".into(),
        },
    )
    .await;

    let id = match recv(&mut ws).await {
        ServerEvent::Welcome { participant_id } => participant_id,
        other => panic!("expected Welcome, got {other:?}"),
    };
    match recv(&mut ws).await {
        ServerEvent::RoomView(view) => {
            assert_eq!(view.room_id, RoomId::from("lobby"));
            assert_eq!(view.owner_id, id);
            assert_eq!(view.participants[0].name, "Ada");
            assert!(!view.started);
        }
        other => panic!("expected RoomView, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_message_must_be_join() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(&mut ws, &ClientMessage::Start).await;

    match recv(&mut ws).await {
        ServerEvent::Error { code, message } => {
            assert_eq!(code, 400);
            assert!(message.contains("Join"));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_timeout_closes_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    match recv(&mut ws).await {
        ServerEvent::Error { code, message } => {
            assert_eq!(code, 400);
            assert!(message.contains("timed out"));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_join_updates_everyone() {
    let addr = start_server().await;
    let (mut a, a_id) = join(&addr, "R1", "A").await;
    let (mut b, _) = join(&addr, "R1", "B").await;

    match recv_until(&mut a, is_view_with(2)).await {
        ServerEvent::RoomView(view) => assert_eq!(view.owner_id, a_id),
        _ => unreachable!(),
    }
    // B's own view already had both participants.
    send(&mut b, &ClientMessage::Start).await;
    recv_until(&mut b, |e| matches!(e, ServerEvent::GameStarted)).await;
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let addr = start_server().await;
    let (mut a, _) = join(&addr, "R1", "A").await;
    let (mut b, _) = join(&addr, "R2", "B").await;

    send(&mut b, &ClientMessage::Start).await;
    match recv(&mut b).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }

    send(&mut a, &ClientMessage::Chat { text: "hi".into() }).await;
    assert!(matches!(recv(&mut a).await, ServerEvent::Chat { .. }));
}

#[tokio::test]
async fn test_start_announces_first_drawer() {
    let addr = start_server().await;
    let (mut a, a_id) = join(&addr, "R1", "A").await;
    let (mut b, _) = join(&addr, "R1", "B").await;

    send(&mut b, &ClientMessage::Start).await;
    for ws in [&mut a, &mut b] {
        match recv_until(ws, |e| matches!(e, ServerEvent::DrawerSelected { .. })).await {
            ServerEvent::DrawerSelected { participant_id, name } => {
                assert_eq!(participant_id, a_id);
                assert_eq!(name, "A");
            }
            _ => unreachable!(),
        }
    }
}

#[tokio::test]
async fn test_non_drawer_cannot_pick_word() {
    let addr = start_server().await;
    let (mut a, _) = join(&addr, "R1", "A").await;
    let (mut b, _) = join(&addr, "R1", "B").await;
    send(&mut a, &ClientMessage::Start).await;
    recv_until(&mut b, |e| matches!(e, ServerEvent::SelectionTick { .. })).await;

    send(&mut b, &ClientMessage::SelectWord { word: "pear".into() }).await;
    match recv_until(&mut b, |e| matches!(e, ServerEvent::Error { .. })).await {
        ServerEvent::Error { code, message } => {
            assert_eq!(code, 400);
            assert!(message.contains("drawer"));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_correct_guess_scores_and_notifies() {
    let addr = start_server().await;
    let (mut a, _) = join(&addr, "R1", "A").await;
    let (mut b, _) = join(&addr, "R1", "B").await;
    let (mut c, _) = join(&addr, "R1", "C").await;

    send(&mut a, &ClientMessage::Start).await;
    send(&mut a, &ClientMessage::SelectWord { word: "apple".into() }).await;
    send(&mut a, &ClientMessage::ForceAdvanceSelection).await;
    recv_until(&mut b, |e| matches!(e, ServerEvent::GuessingStarted { total: 45 })).await;

    send(&mut b, &ClientMessage::Guess { text: "pear".into() }).await;
    match recv_until(&mut b, |e| matches!(e, ServerEvent::GuessResult { .. })).await {
        ServerEvent::GuessResult { accepted, points_awarded, .. } => {
            assert!(!accepted);
            assert_eq!(points_awarded, 0);
        }
        _ => unreachable!(),
    }

    send(&mut b, &ClientMessage::Guess { text: "APPLE".into() }).await;
    match recv_until(&mut b, |e| matches!(e, ServerEvent::GuessResult { .. })).await {
        ServerEvent::GuessResult { accepted, points_awarded, .. } => {
            assert!(accepted);
            assert_eq!(points_awarded, 20);
        }
        _ => unreachable!(),
    }

    match recv_until(&mut c, |e| matches!(e, ServerEvent::System { .. })).await {
        ServerEvent::System {
            notice: Notice::CorrectGuess { name, points },
            ..
        } => {
            assert_eq!(name, "B");
            assert_eq!(points, 20);
        }
        other => panic!("expected CorrectGuess, got {other:?}"),
    }
    match recv_until(&mut a, |e| matches!(e, ServerEvent::ScoreUpdate { .. })).await {
        ServerEvent::ScoreUpdate { scores } => {
            assert_eq!(scores[0].name, "B");
            assert_eq!(scores[1].name, "A");
            assert_eq!(scores[1].points, 5);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_drawing_relayed_to_others() {
    let addr = start_server().await;
    let (mut a, _) = join(&addr, "R1", "A").await;
    let (mut b, _) = join(&addr, "R1", "B").await;
    recv_until(&mut a, is_view_with(2)).await;

    let stroke = Stroke {
        prev_x: 1.0,
        prev_y: 1.0,
        x: 2.0,
        y: 2.0,
        brush_color: "#112233".into(),
        brush_size: 3.0,
    };
    send(&mut a, &ClientMessage::Draw(stroke.clone())).await;
    assert_eq!(recv(&mut b).await, ServerEvent::Drawing(stroke));

    send(&mut b, &ClientMessage::ClearCanvas).await;
    assert_eq!(recv(&mut a).await, ServerEvent::CanvasClear);
}

#[tokio::test]
async fn test_invalid_message_keeps_connection_open() {
    let addr = start_server().await;
    let (mut a, _) = join(&addr, "R1", "A").await;

    a.send(Message::Text("{not json".into())).await.unwrap();
    match recv(&mut a).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }

    send(&mut a, &ClientMessage::Chat { text: "still here".into() }).await;
    assert!(matches!(recv(&mut a).await, ServerEvent::Chat { .. }));
}

#[tokio::test]
async fn test_leave_updates_remaining_participants() {
    let addr = start_server().await;
    let (mut a, a_id) = join(&addr, "R1", "A").await;
    let (mut b, b_id) = join(&addr, "R1", "B").await;
    recv_until(&mut a, is_view_with(2)).await;

    send(&mut a, &ClientMessage::Leave).await;
    match recv_until(&mut b, is_view_with(1)).await {
        ServerEvent::RoomView(view) => {
            assert_eq!(view.participants[0].id, b_id);
            assert_eq!(view.owner_id, b_id);
            assert_ne!(view.owner_id, a_id);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_disconnect_of_last_participant_frees_room() {
    let addr = start_server().await;
    let (a, _) = join(&addr, "R1", "A").await;
    drop(a);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut b = connect(&addr).await;
    send(
        &mut b,
        &ClientMessage::Join {
            room_id: "R1".into(),
            name: "B".into(),
        },
    )
    .await;
    let b_id = match recv(&mut b).await {
        ServerEvent::Welcome { participant_id } => participant_id,
        other => panic!("expected Welcome, got {other:?}"),
    };
    match recv(&mut b).await {
        ServerEvent::RoomView(view) => {
            assert_eq!(view.owner_id, b_id, "a fresh room is owned by its first joiner");
            assert_eq!(view.participants.len(), 1);
        }
        other => panic!("expected RoomView, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_full_is_rejected() {
    let addr = start_server_with(GameConfig {
        max_participants: 2,
        ..GameConfig::default()
    })
    .await;
    let (_a, _) = join(&addr, "R1", "A").await;
    let (_b, _) = join(&addr, "R1", "B").await;

    let mut c = connect(&addr).await;
    send(
        &mut c,
        &ClientMessage::Join {
            room_id: "R1".into(),
            name: "C".into(),
        },
    )
    .await;
    assert!(matches!(recv(&mut c).await, ServerEvent::Welcome { .. }));
    match recv(&mut c).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 409),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_game_config_fails_build() {
    let result = SketchServer::builder()
        .bind("127.0.0.1:0")
        .game_config(GameConfig {
            max_rounds: 0,
            ..GameConfig::default()
        })
        .build()
        .await;
    assert!(matches!(result, Err(SketchError::Room(RoomError::InvalidConfig(_)))));
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown_signal() {
    let server = SketchServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (_a, _) = join(&addr, "R1", "A").await;
    stop_tx.send(()).expect("server still running");

    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("server should stop")
        .expect("server task should not panic");
    assert!(result.is_ok());
    assert!(tokio_tungstenite::connect_async(format!("ws://{addr}")).await.is_err());
}
