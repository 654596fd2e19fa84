//! Per-connection handler: join, then route messages to the room.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. WebSocket handshake
//!   2. Receive `Join` → assign a `ParticipantId` → send `Welcome`
//!   3. Join (or create) the room
//!   4. Loop: decode client messages → room actions; room events flow back
//!      through a writer task

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use sketchturn_protocol::{ClientMessage, Codec, Participant, ParticipantId, ProtocolError, RoomId, ServerEvent};
use sketchturn_room::{ParticipantSender, RoomAction, RoomError};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::SketchError;
use crate::server::ServerState;
use crate::transport::{self, TransportError, WsStream};

/// Counter for participant identities. One per connection.
static NEXT_PARTICIPANT_ID: AtomicU64 = AtomicU64::new(1);

/// Drop guard that removes a participant from their room when the handler
/// exits, including by panic. Since `Drop` is synchronous, it spawns a
/// fire-and-forget task for the async lock. The normal exit path calls
/// [`leave`](Self::leave) instead so the room is updated before the task
/// ends.
struct MembershipGuard<C: Codec> {
    participant_id: ParticipantId,
    state: Arc<ServerState<C>>,
    armed: bool,
}

impl<C: Codec> MembershipGuard<C> {
    async fn leave(mut self) {
        self.armed = false;
        let mut registry = self.state.registry.lock().await;
        if let Err(e) = registry.disconnect(self.participant_id).await {
            tracing::debug!(participant_id = %self.participant_id, error = %e, "leave failed");
        }
    }
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let participant_id = self.participant_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = state.registry.lock().await.disconnect(participant_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState<C>>,
) -> Result<(), SketchError> {
    let ws = transport::upgrade(stream).await?;
    let (mut sink, mut stream) = ws.split();
    let participant_id = ParticipantId(NEXT_PARTICIPANT_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%addr, %participant_id, "handling new connection");

    // --- Step 1: Join ---
    let (room_id, name) = match await_join(&mut stream, &state).await {
        Ok(join) => join,
        Err(e) => {
            let _ = send_direct(&mut sink, &state.codec, error_event(400, &e.to_string())).await;
            return Err(e);
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(sink, rx, Arc::clone(&state)));
    let _ = tx.send(ServerEvent::Welcome { participant_id });

    let joined = state
        .registry
        .lock()
        .await
        .join(room_id.clone(), Participant::new(participant_id, name), tx.clone())
        .await;
    if let Err(e) = joined {
        tracing::debug!(%participant_id, %room_id, error = %e, "join rejected");
        send_error(&tx, &e);
        drop(tx);
        let _ = writer.await;
        return Err(e.into());
    }
    tracing::info!(%participant_id, %room_id, "participant connected");

    let guard = MembershipGuard {
        participant_id,
        state: Arc::clone(&state),
        armed: true,
    };

    // Cache the handle so messages do not contend on the registry lock.
    let room = state.registry.lock().await.room(&room_id)?;

    // --- Step 2: Message loop ---
    loop {
        let data = match transport::recv_frame(&mut stream).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%participant_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%participant_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%participant_id, error = %e, "failed to decode message");
                let _ = tx.send(error_event(400, &format!("invalid message: {e}")));
                continue;
            }
        };

        let action = match into_action(msg) {
            Inbound::Action(action) => action,
            Inbound::Leave => {
                tracing::info!(%participant_id, "participant left");
                break;
            }
            Inbound::Rejoin => {
                let _ = tx.send(error_event(409, "already joined"));
                continue;
            }
        };

        if let Err(e) = room.act(participant_id, action).await {
            send_error(&tx, &e);
        }
    }

    guard.leave().await;
    drop(tx);
    writer.abort();
    Ok(())
}

/// Waits for the connection's first message, which must be `Join`.
async fn await_join<C: Codec>(
    stream: &mut SplitStream<WsStream>,
    state: &ServerState<C>,
) -> Result<(RoomId, String), SketchError> {
    let data = match tokio::time::timeout(state.join_timeout, transport::recv_frame(stream)).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before join".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(ProtocolError::InvalidMessage("join timed out".into()).into()),
    };

    let msg: ClientMessage = state.codec.decode(&data)?;
    match msg {
        ClientMessage::Join { room_id, name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(ProtocolError::InvalidMessage("name must not be empty".into()).into());
            }
            Ok((room_id, name.to_string()))
        }
        _ => Err(ProtocolError::InvalidMessage("first message must be Join".into()).into()),
    }
}

enum Inbound {
    Action(RoomAction),
    Leave,
    Rejoin,
}

fn into_action(msg: ClientMessage) -> Inbound {
    let action = match msg {
        ClientMessage::Join { .. } => return Inbound::Rejoin,
        ClientMessage::Leave => return Inbound::Leave,
        ClientMessage::Start => RoomAction::Start,
        ClientMessage::ResetScores => RoomAction::ResetScores,
        ClientMessage::SelectWord { word } => RoomAction::SelectWord(word),
        ClientMessage::Guess { text } => RoomAction::Guess(text),
        ClientMessage::GuessedCorrectly => RoomAction::SubmitGuess { correct: true },
        ClientMessage::ForceAdvanceSelection => RoomAction::ForceAdvanceSelection,
        ClientMessage::Chat { text } => RoomAction::Chat(text),
        ClientMessage::Draw(stroke) => RoomAction::Draw(stroke),
        ClientMessage::ClearCanvas => RoomAction::ClearCanvas,
    };
    Inbound::Action(action)
}

/// Drains room events into the socket until every sender is gone.
async fn write_events<C: Codec>(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<C>>,
) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = send_direct(&mut sink, &state.codec, event).await {
            tracing::debug!(error = %e, "write failed, dropping connection output");
            break;
        }
    }
    let _ = sink.close().await;
}

async fn send_direct(
    sink: &mut SplitSink<WsStream, Message>,
    codec: &impl Codec,
    event: ServerEvent,
) -> Result<(), SketchError> {
    let bytes = codec.encode(&event)?;
    sink.send(Message::Binary(bytes.into())).await.map_err(|e| {
        TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
    })?;
    Ok(())
}

fn send_error(tx: &ParticipantSender, err: &RoomError) {
    let _ = tx.send(error_event(err.code(), &err.to_string()));
}

fn error_event(code: u16, message: &str) -> ServerEvent {
    ServerEvent::Error {
        code,
        message: message.to_string(),
    }
}
