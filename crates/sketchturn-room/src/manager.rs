//! Session registry: creates rooms on first join, routes participants to
//! them, and forgets rooms once they empty.

use std::collections::HashMap;

use sketchturn_protocol::{Participant, ParticipantId, RoomId, RoomView};

use crate::room::spawn_room;
use crate::{ActionReply, Departure, GameConfig, GuessOutcome, ParticipantSender, RoomAction, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks all live rooms and which room each participant is in.
///
/// A participant is in at most one room at a time. Rooms share nothing
/// with each other; every game runs in its own actor task and the
/// registry only holds handles.
pub struct SessionRegistry {
    config: GameConfig,
    rooms: HashMap<RoomId, RoomHandle>,
    memberships: HashMap<ParticipantId, RoomId>,
    channel_size: usize,
}

impl SessionRegistry {
    /// Creates an empty registry whose rooms all use `config`.
    pub fn new(config: GameConfig) -> Result<Self, RoomError> {
        config.validate()?;
        Ok(Self {
            config,
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Joins `participant` to `room_id`, creating the room (owned by this
    /// participant) if it does not exist yet.
    pub async fn join(
        &mut self,
        room_id: RoomId,
        participant: Participant,
        sender: ParticipantSender,
    ) -> Result<RoomView, RoomError> {
        if let Some(current) = self.memberships.get(&participant.id) {
            return Err(RoomError::AlreadyInRoom(participant.id, current.clone()));
        }

        let participant_id = participant.id;
        let view = match self.rooms.get(&room_id).cloned() {
            Some(handle) => match handle.join(participant.clone(), sender.clone()).await {
                Err(RoomError::Unavailable(_)) => {
                    tracing::warn!(%room_id, "room actor gone, recreating");
                    self.rooms.remove(&room_id);
                    self.memberships.retain(|_, rid| *rid != room_id);
                    self.create(room_id.clone(), participant, sender)
                }
                other => other?,
            },
            None => self.create(room_id.clone(), participant, sender),
        };

        self.memberships.insert(participant_id, room_id);
        Ok(view)
    }

    fn create(&mut self, room_id: RoomId, owner: Participant, sender: ParticipantSender) -> RoomView {
        let owner_id = owner.id;
        let (handle, view) = spawn_room(
            room_id.clone(),
            owner,
            sender,
            self.config.clone(),
            self.channel_size,
        );
        self.rooms.insert(room_id.clone(), handle);
        tracing::info!(%room_id, owner = %owner_id, "room created");
        view
    }

    /// Removes a participant from a room. Returns the remaining roster, or
    /// `None` if the room emptied and was destroyed.
    pub async fn leave(
        &mut self,
        room_id: &RoomId,
        participant_id: ParticipantId,
    ) -> Result<Option<RoomView>, RoomError> {
        let handle = self.room(room_id)?;

        match handle.leave(participant_id).await {
            Ok(Departure::Remaining(view)) => {
                self.memberships.remove(&participant_id);
                Ok(Some(view))
            }
            Ok(Departure::Destroyed) | Err(RoomError::Unavailable(_)) => {
                self.rooms.remove(room_id);
                self.memberships.retain(|_, rid| rid != room_id);
                tracing::info!(%room_id, "room destroyed");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a participant from whatever room they are in. A no-op for
    /// participants that never joined.
    pub async fn disconnect(&mut self, participant_id: ParticipantId) -> Result<Option<RoomView>, RoomError> {
        match self.memberships.get(&participant_id).cloned() {
            Some(room_id) => self.leave(&room_id, participant_id).await,
            None => Ok(None),
        }
    }

    /// Returns a clone of the room's handle for callers that want to talk
    /// to the actor without holding the registry.
    pub fn room(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::UnknownRoom(room_id.clone()))
    }

    /// Routes an action to the room, after checking the participant is
    /// actually in it.
    pub async fn act(
        &self,
        room_id: &RoomId,
        participant_id: ParticipantId,
        action: RoomAction,
    ) -> Result<ActionReply, RoomError> {
        let handle = self.room(room_id)?;
        if self.memberships.get(&participant_id) != Some(room_id) {
            return Err(RoomError::NotInRoom(participant_id, room_id.clone()));
        }
        handle.act(participant_id, action).await
    }

    pub async fn start(&self, room_id: &RoomId, by: ParticipantId) -> Result<(), RoomError> {
        self.act(room_id, by, RoomAction::Start).await.map(|_| ())
    }

    pub async fn reset_scores(&self, room_id: &RoomId, by: ParticipantId) -> Result<(), RoomError> {
        self.act(room_id, by, RoomAction::ResetScores).await.map(|_| ())
    }

    pub async fn select_word(
        &self,
        room_id: &RoomId,
        drawer: ParticipantId,
        word: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.act(room_id, drawer, RoomAction::SelectWord(word.into()))
            .await
            .map(|_| ())
    }

    /// Records a client-judged guess.
    pub async fn submit_guess(
        &self,
        room_id: &RoomId,
        guesser: ParticipantId,
        correct: bool,
    ) -> Result<GuessOutcome, RoomError> {
        match self.act(room_id, guesser, RoomAction::SubmitGuess { correct }).await? {
            ActionReply::Guess(outcome) => Ok(outcome),
            ActionReply::Done => Ok(GuessOutcome::Incorrect),
        }
    }

    pub async fn force_advance_selection(&self, room_id: &RoomId, by: ParticipantId) -> Result<(), RoomError> {
        self.act(room_id, by, RoomAction::ForceAdvanceSelection)
            .await
            .map(|_| ())
    }

    pub async fn chat(
        &self,
        room_id: &RoomId,
        from: ParticipantId,
        text: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.act(room_id, from, RoomAction::Chat(text.into()))
            .await
            .map(|_| ())
    }

    pub async fn view(&self, room_id: &RoomId) -> Result<RoomView, RoomError> {
        self.room(room_id)?.view().await
    }

    /// Returns the room a participant is currently in, if any.
    pub fn participant_room(&self, participant_id: ParticipantId) -> Option<&RoomId> {
        self.memberships.get(&participant_id)
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Stops every room actor and forgets all memberships.
    pub async fn shutdown_all(&mut self) {
        for (room_id, handle) in self.rooms.drain() {
            if let Err(e) = handle.shutdown().await {
                tracing::debug!(%room_id, error = %e, "room already stopped");
            }
        }
        self.memberships.clear();
        tracing::info!("all rooms shut down");
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}
