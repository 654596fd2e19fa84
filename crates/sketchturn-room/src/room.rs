//! Room actor: an isolated Tokio task that owns one room's [`Session`].
//!
//! The actor is the only thing that touches the session. It multiplexes two
//! inputs in a single `select!` loop: commands from the outside world over
//! an mpsc channel, and one-second ticks from its own [`TickScheduler`].
//! Because both run on the same task, a tick can never interleave with a
//! command, and when the last participant leaves the loop ends and the
//! ticker is dropped with it.

use std::collections::HashMap;

use sketchturn_protocol::{Participant, ParticipantId, Recipient, RoomId, RoomView, ServerEvent, Stroke};
use sketchturn_tick::{TickInfo, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{GameConfig, GuessOutcome, Outbox, RoomError, Session};

/// Channel sender for delivering events to one participant's connection.
pub type ParticipantSender = mpsc::UnboundedSender<ServerEvent>;

/// Something a participant asks the room to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomAction {
    Start,
    ResetScores,
    SelectWord(String),
    /// Free text judged against the current word.
    Guess(String),
    /// A guess whose correctness was judged by the client.
    SubmitGuess { correct: bool },
    ForceAdvanceSelection,
    Chat(String),
    Draw(Stroke),
    ClearCanvas,
}

/// What an accepted action produced for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionReply {
    Done,
    Guess(GuessOutcome),
}

/// Result of removing a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The room is empty and its actor has stopped.
    Destroyed,
    /// The room lives on with this roster.
    Remaining(RoomView),
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        participant: Participant,
        sender: ParticipantSender,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },
    Leave {
        participant_id: ParticipantId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },
    Act {
        participant_id: ParticipantId,
        action: RoomAction,
        reply: oneshot::Sender<Result<ActionReply, RoomError>>,
    },
    GetView {
        reply: oneshot::Sender<RoomView>,
    },
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the [`SessionRegistry`](crate::SessionRegistry) holds
/// one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        participant: Participant,
        sender: ParticipantSender,
    ) -> Result<RoomView, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                participant,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Sends a leave request to the room.
    pub async fn leave(&self, participant_id: ParticipantId) -> Result<Departure, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                participant_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Runs an action on behalf of a participant and waits for the verdict.
    pub async fn act(
        &self,
        participant_id: ParticipantId,
        action: RoomAction,
    ) -> Result<ActionReply, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Act {
                participant_id,
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn view(&self) -> Result<RoomView, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetView { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to stop without waiting for it to empty.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    session: Session,
    /// Per-participant outbound channels.
    senders: HashMap<ParticipantId, ParticipantSender>,
    ticker: TickScheduler,
    /// Last session timer epoch the ticker was anchored to.
    epoch: u64,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.session.room_id(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                info = self.ticker.wait_for_tick() => {
                    self.handle_tick(info);
                }
            }
            self.sync_ticker();
        }

        tracing::info!(room_id = %self.session.room_id(), "room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                participant,
                sender,
                reply,
            } => {
                let result = self.handle_join(participant, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave {
                participant_id,
                reply,
            } => {
                let result = self.handle_leave(participant_id);
                let destroyed = matches!(result, Ok(Departure::Destroyed));
                let _ = reply.send(result);
                if destroyed {
                    return false;
                }
            }
            RoomCommand::Act {
                participant_id,
                action,
                reply,
            } => {
                let result = self.handle_action(participant_id, action);
                if let Err(e) = &result {
                    tracing::debug!(
                        room_id = %self.session.room_id(),
                        %participant_id,
                        error = %e,
                        "action rejected"
                    );
                }
                let _ = reply.send(result);
            }
            RoomCommand::GetView { reply } => {
                let _ = reply.send(self.session.view());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.session.room_id(), "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        participant: Participant,
        sender: ParticipantSender,
    ) -> Result<RoomView, RoomError> {
        let id = participant.id;
        let view = self.session.join(participant)?;
        self.senders.insert(id, sender);
        self.broadcast(ServerEvent::RoomView(view.clone()));
        // Late joiners need the board too.
        if !self.session.scores().is_empty() {
            self.send_to(
                id,
                ServerEvent::ScoreUpdate {
                    scores: self.session.scores().snapshot(),
                },
            );
        }
        Ok(view)
    }

    fn handle_leave(&mut self, participant_id: ParticipantId) -> Result<Departure, RoomError> {
        let out = self.session.leave(participant_id)?;
        self.senders.remove(&participant_id);

        if self.session.is_empty() {
            tracing::info!(room_id = %self.session.room_id(), "last participant left");
            return Ok(Departure::Destroyed);
        }

        self.dispatch(out);
        let view = self.session.view();
        self.broadcast(ServerEvent::RoomView(view.clone()));
        Ok(Departure::Remaining(view))
    }

    fn handle_action(
        &mut self,
        from: ParticipantId,
        action: RoomAction,
    ) -> Result<ActionReply, RoomError> {
        if !self.session.contains(from) {
            return Err(RoomError::NotInRoom(from, self.session.room_id().clone()));
        }

        let (reply, out) = match action {
            RoomAction::Start => (ActionReply::Done, self.session.start()?),
            RoomAction::ResetScores => (ActionReply::Done, self.session.reset_scores()),
            RoomAction::SelectWord(word) => (ActionReply::Done, self.session.select_word(from, &word)?),
            RoomAction::ForceAdvanceSelection => {
                (ActionReply::Done, self.session.force_advance_selection()?)
            }
            RoomAction::Guess(text) => {
                let (outcome, out) = self.session.guess_text(from, &text)?;
                self.reply_guess(from, outcome);
                (ActionReply::Guess(outcome), out)
            }
            RoomAction::SubmitGuess { correct } => {
                let (outcome, out) = self.session.submit_guess(from, correct)?;
                self.reply_guess(from, outcome);
                (ActionReply::Guess(outcome), out)
            }
            RoomAction::Chat(text) => (ActionReply::Done, self.session.chat(from, &text)?),
            RoomAction::Draw(stroke) => (
                ActionReply::Done,
                vec![(Recipient::AllExcept(from), ServerEvent::Drawing(stroke))],
            ),
            RoomAction::ClearCanvas => (
                ActionReply::Done,
                vec![(Recipient::AllExcept(from), ServerEvent::CanvasClear)],
            ),
        };

        self.dispatch(out);
        Ok(reply)
    }

    fn reply_guess(&self, to: ParticipantId, outcome: GuessOutcome) {
        self.send_to(
            to,
            ServerEvent::GuessResult {
                accepted: outcome.accepted(),
                points_awarded: outcome.points_awarded(),
                already_counted: outcome == GuessOutcome::AlreadyCounted,
            },
        );
    }

    /// Applies the fired tick plus any the scheduler reported as skipped.
    /// Stops early if a phase change re-anchors the clock.
    fn handle_tick(&mut self, info: TickInfo) {
        for _ in 0..=info.ticks_skipped {
            let out = self.session.tick();
            self.dispatch(out);
            if !self.session.is_ticking() || self.session.timer_epoch() != self.epoch {
                break;
            }
        }
    }

    /// Pauses the ticker outside timed phases and re-anchors it whenever a
    /// new countdown begins.
    fn sync_ticker(&mut self) {
        if !self.session.is_ticking() {
            self.ticker.pause();
            return;
        }
        let epoch = self.session.timer_epoch();
        if epoch != self.epoch || self.ticker.is_paused() {
            self.epoch = epoch;
            self.ticker.restart();
        }
    }

    /// Dispatches outbound events to the correct recipients.
    fn dispatch(&self, out: Outbox) {
        for (recipient, event) in out {
            match recipient {
                Recipient::Participant(id) => self.send_to(id, event),
                _ => {
                    for p in self.session.participants() {
                        if recipient.includes(p.id) {
                            self.send_to(p.id, event.clone());
                        }
                    }
                }
            }
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        self.dispatch(vec![(Recipient::All, event)]);
    }

    /// Silently drops if the receiver is gone (connection closed).
    fn send_to(&self, participant_id: ParticipantId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&participant_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a room actor with `owner` as its first participant.
///
/// The owner's sender receives the initial [`RoomView`] before the
/// returned handle is usable, so it is always the first room event they
/// see.
pub(crate) fn spawn_room(
    room_id: RoomId,
    owner: Participant,
    sender: ParticipantSender,
    config: GameConfig,
    channel_size: usize,
) -> (RoomHandle, RoomView) {
    let (tx, rx) = mpsc::channel(channel_size);
    let owner_id = owner.id;
    let session = Session::new(room_id.clone(), owner, config);
    let view = session.view();
    let _ = sender.send(ServerEvent::RoomView(view.clone()));

    let actor = RoomActor {
        session,
        senders: HashMap::from([(owner_id, sender)]),
        ticker: TickScheduler::every_second(),
        epoch: 0,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    (RoomHandle { room_id, sender: tx }, view)
}
