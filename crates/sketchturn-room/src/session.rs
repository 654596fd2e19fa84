//! The per-room turn state machine.
//!
//! A [`Session`] owns everything one room needs: roster, phase and
//! countdown, score board, and guess tracker. It has no clock and no I/O.
//! Callers feed it actions and one [`tick`](Session::tick) per second, and
//! every call returns the events to deliver as an [`Outbox`].

use sketchturn_protocol::{
    Notice, Participant, ParticipantId, Recipient, RoomId, RoomView, ServerEvent,
};
use sketchturn_tick::Countdown;

use crate::scoring::{self, DRAWER_GUESS_BONUS, FULL_CLEAR_BONUS};
use crate::{GameConfig, GuessTracker, Phase, RoomError, ScoreBoard, mask_word};

/// Events produced by one state transition, in delivery order.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// Result of a guess that reached the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct { points: u32 },
    Incorrect,
    /// The guesser already scored this turn. Nothing changed.
    AlreadyCounted,
}

impl GuessOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }

    pub fn points_awarded(&self) -> u32 {
        match self {
            Self::Correct { points } => *points,
            _ => 0,
        }
    }
}

/// One room's game state.
///
/// Invariants:
/// - while `started`, `drawer_index < participants.len()`;
/// - the guess tracker never holds the drawer and never holds more than
///   `participants.len() - 1` ids;
/// - score board totals only grow, except through [`reset_scores`](Self::reset_scores)
///   and `reset_scores_on_start`.
#[derive(Debug)]
pub struct Session {
    room_id: RoomId,
    config: GameConfig,
    /// Turn order is join order.
    participants: Vec<Participant>,
    owner_id: ParticipantId,
    started: bool,
    phase: Phase,
    drawer_index: usize,
    round: u32,
    current_word: String,
    hint_revealed: bool,
    total_guess_time: u32,
    scores: ScoreBoard,
    guesses: GuessTracker,
    /// Bumped every time a timed phase begins.
    timer_epoch: u64,
}

impl Session {
    /// Creates a room whose owner is its first participant.
    pub fn new(room_id: RoomId, owner: Participant, config: GameConfig) -> Self {
        Self {
            room_id,
            config,
            owner_id: owner.id,
            participants: vec![owner],
            started: false,
            phase: Phase::Idle,
            drawer_index: 0,
            round: 1,
            current_word: String::new(),
            hint_revealed: false,
            total_guess_time: 0,
            scores: ScoreBoard::new(),
            guesses: GuessTracker::new(),
            timer_epoch: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.participants.iter().any(|p| p.id == participant)
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn owner_id(&self) -> ParticipantId {
        self.owner_id
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn drawer_index(&self) -> usize {
        self.drawer_index
    }

    /// The current drawer, while a game is running.
    pub fn drawer(&self) -> Option<&Participant> {
        if self.started {
            self.participants.get(self.drawer_index)
        } else {
            None
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_word(&self) -> &str {
        &self.current_word
    }

    pub fn hint_revealed(&self) -> bool {
        self.hint_revealed
    }

    pub fn total_guess_time(&self) -> u32 {
        self.total_guess_time
    }

    /// Seconds left to guess, only while guessing is open.
    pub fn seconds_remaining(&self) -> Option<u32> {
        match self.phase {
            Phase::Guessing(c) => Some(c.remaining()),
            _ => None,
        }
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn guesses(&self) -> &GuessTracker {
        &self.guesses
    }

    /// Changes whenever a new countdown starts; the room actor re-anchors
    /// its ticker when it sees a new value.
    pub fn timer_epoch(&self) -> u64 {
        self.timer_epoch
    }

    pub fn is_ticking(&self) -> bool {
        self.phase.is_ticking()
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            room_id: self.room_id.clone(),
            participants: self.participants.clone(),
            owner_id: self.owner_id,
            started: self.started,
            round: self.round,
            max_rounds: self.config.max_rounds,
            drawer_id: self.drawer().map(|p| p.id),
        }
    }

    fn participant(&self, id: ParticipantId) -> Result<&Participant, RoomError> {
        self.participants
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| RoomError::NotInRoom(id, self.room_id.clone()))
    }

    fn eligible_guessers(&self) -> usize {
        self.participants.len().saturating_sub(1)
    }

    fn wrong_phase(&self, action: &'static str) -> RoomError {
        RoomError::WrongPhase {
            action,
            phase: self.phase.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Appends a participant to the turn order.
    pub fn join(&mut self, participant: Participant) -> Result<RoomView, RoomError> {
        if self.contains(participant.id) {
            return Err(RoomError::AlreadyInRoom(participant.id, self.room_id.clone()));
        }
        if self.participants.len() >= self.config.max_participants {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }

        tracing::info!(
            room_id = %self.room_id,
            participant_id = %participant.id,
            name = %participant.name,
            participants = self.participants.len() + 1,
            "participant joined"
        );
        self.participants.push(participant);
        Ok(self.view())
    }

    /// Removes a participant.
    ///
    /// `drawer_index` keeps pointing at the same logical drawer. If the
    /// drawer itself left, the turn is abandoned without drawer bonuses and
    /// the participant who moved into the vacated slot draws next. A game
    /// that drops below `min_participants` ends.
    ///
    /// When this empties the room the returned outbox is empty and the
    /// caller is expected to drop the session.
    pub fn leave(&mut self, participant: ParticipantId) -> Result<Outbox, RoomError> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == participant)
            .ok_or_else(|| RoomError::NotInRoom(participant, self.room_id.clone()))?;

        let departed = self.participants.remove(index);
        self.guesses.remove(participant);
        tracing::info!(
            room_id = %self.room_id,
            participant_id = %departed.id,
            participants = self.participants.len(),
            "participant left"
        );

        let mut out = Outbox::new();

        if self.participants.is_empty() {
            self.started = false;
            self.phase = Phase::Idle;
            return Ok(out);
        }

        if self.owner_id == participant {
            self.owner_id = self.participants[0].id;
            tracing::debug!(room_id = %self.room_id, owner_id = %self.owner_id, "ownership passed on");
        }

        if !self.started {
            return Ok(out);
        }

        if self.participants.len() < self.config.min_participants {
            tracing::info!(room_id = %self.room_id, "too few participants, ending game");
            self.end_game(&mut out);
            return Ok(out);
        }

        match index.cmp(&self.drawer_index) {
            std::cmp::Ordering::Less => self.drawer_index -= 1,
            std::cmp::Ordering::Equal => self.abandon_turn(&mut out),
            std::cmp::Ordering::Greater => {}
        }

        if matches!(self.phase, Phase::Guessing(_)) {
            self.check_full_clear(&mut out);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// `Idle → Selecting` for the participant at `drawer_index`.
    pub fn start(&mut self) -> Result<Outbox, RoomError> {
        if self.started {
            return Err(RoomError::AlreadyStarted);
        }
        if self.participants.len() < self.config.min_participants {
            return Err(RoomError::NotEnoughParticipants {
                required: self.config.min_participants,
                present: self.participants.len(),
            });
        }

        if self.config.reset_scores_on_start {
            self.scores.clear();
        }
        self.started = true;
        self.round = 1;
        self.drawer_index = 0;
        tracing::info!(
            room_id = %self.room_id,
            participants = self.participants.len(),
            max_rounds = self.config.max_rounds,
            "game started"
        );

        let mut out = vec![
            (Recipient::All, ServerEvent::GameStarted),
            (Recipient::All, ServerEvent::RoomView(self.view())),
        ];
        self.begin_selection(&mut out);
        Ok(out)
    }

    /// Empties the score board and the guess tracker. Turn state is kept.
    ///
    /// While a cleared turn is settling the tracker is left alone, so the
    /// pending drawer bonuses still match who guessed.
    pub fn reset_scores(&mut self) -> Outbox {
        self.scores.clear();
        if !matches!(self.phase, Phase::Settling(_)) {
            self.guesses.clear();
        }
        tracing::info!(room_id = %self.room_id, "scores reset");
        vec![(Recipient::All, ServerEvent::ScoreUpdate { scores: Vec::new() })]
    }

    /// The drawer picks the word for this turn. Selection keeps counting
    /// down; the word is locked in when guessing begins.
    pub fn select_word(&mut self, participant: ParticipantId, word: &str) -> Result<Outbox, RoomError> {
        if !self.started {
            return Err(RoomError::NotStarted);
        }
        self.participant(participant)?;
        if self.drawer().map(|d| d.id) != Some(participant) {
            return Err(RoomError::InvalidDrawerAction("only the drawer picks the word"));
        }
        if !matches!(self.phase, Phase::Selecting(_)) {
            return Err(self.wrong_phase("select word"));
        }
        let word = word.trim();
        if word.is_empty() {
            return Err(RoomError::EmptyWord);
        }

        self.current_word = word.to_string();
        tracing::debug!(room_id = %self.room_id, len = word.chars().count(), "word selected");
        Ok(Outbox::new())
    }

    /// Ends selection early.
    pub fn force_advance_selection(&mut self) -> Result<Outbox, RoomError> {
        if !self.started {
            return Err(RoomError::NotStarted);
        }
        if !matches!(self.phase, Phase::Selecting(_)) {
            return Err(self.wrong_phase("advance selection"));
        }
        let mut out = Outbox::new();
        self.begin_guessing(&mut out);
        Ok(out)
    }

    /// Records a guess whose correctness the caller already knows.
    pub fn submit_guess(
        &mut self,
        participant: ParticipantId,
        correct: bool,
    ) -> Result<(GuessOutcome, Outbox), RoomError> {
        if self.guesses.contains(participant) {
            return Ok((GuessOutcome::AlreadyCounted, Outbox::new()));
        }
        if !self.started {
            return Err(RoomError::NotStarted);
        }
        let guesser = self.participant(participant)?.clone();
        let Some(drawer) = self.drawer().cloned() else {
            return Err(RoomError::NotStarted);
        };
        if drawer.id == participant {
            return Err(RoomError::InvalidDrawerAction("the drawer cannot guess"));
        }
        let Phase::Guessing(countdown) = self.phase else {
            return Err(self.wrong_phase("guess"));
        };
        if !correct {
            return Ok((GuessOutcome::Incorrect, Outbox::new()));
        }

        let points = scoring::guess_award(
            countdown.remaining(),
            self.total_guess_time,
            self.hint_revealed,
        );
        self.scores.award(&guesser, points);
        self.scores.award(&drawer, DRAWER_GUESS_BONUS);
        self.guesses.record(participant);
        tracing::debug!(
            room_id = %self.room_id,
            participant_id = %participant,
            points,
            remaining = countdown.remaining(),
            hint = self.hint_revealed,
            "correct guess"
        );

        let mut out = vec![
            (
                Recipient::All,
                ServerEvent::system(Notice::CorrectGuess {
                    name: guesser.name,
                    points,
                }),
            ),
            (
                Recipient::All,
                ServerEvent::ScoreUpdate {
                    scores: self.scores.snapshot(),
                },
            ),
        ];
        self.check_full_clear(&mut out);
        Ok((GuessOutcome::Correct { points }, out))
    }

    /// Judges free text against the current word (trimmed, case-insensitive).
    /// An empty word never matches.
    pub fn guess_text(
        &mut self,
        participant: ParticipantId,
        text: &str,
    ) -> Result<(GuessOutcome, Outbox), RoomError> {
        let correct = self.matches_word(text);
        self.submit_guess(participant, correct)
    }

    /// Relays a chat line. The drawer can never spell the word in chat.
    /// Once guessing is open, a guesser's line that spells it counts as a
    /// guess and is not relayed.
    pub fn chat(&mut self, participant: ParticipantId, text: &str) -> Result<Outbox, RoomError> {
        let sender = self.participant(participant)?.clone();
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outbox::new());
        }

        let is_drawer = self.drawer().map(|d| d.id) == Some(participant);
        if is_drawer && self.matches_word(text) {
            return Ok(Outbox::new());
        }
        if matches!(self.phase, Phase::Guessing(_) | Phase::Settling(_)) && self.matches_word(text) {
            return match self.submit_guess(participant, true) {
                Ok((_, out)) => Ok(out),
                Err(RoomError::WrongPhase { .. }) => Ok(Outbox::new()),
                Err(e) => Err(e),
            };
        }

        Ok(vec![(
            Recipient::All,
            ServerEvent::Chat {
                participant_id: sender.id,
                name: sender.name,
                text: text.to_string(),
            },
        )])
    }

    fn matches_word(&self, text: &str) -> bool {
        !self.current_word.is_empty()
            && text.trim().to_lowercase() == self.current_word.to_lowercase()
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advances the room by one second.
    pub fn tick(&mut self) -> Outbox {
        let mut out = Outbox::new();
        match self.phase {
            Phase::Idle => {}
            Phase::Selecting(mut countdown) => {
                let remaining = countdown.tick();
                self.phase = Phase::Selecting(countdown);
                out.push((Recipient::All, ServerEvent::SelectionTick { remaining }));
                if remaining == 0 {
                    self.begin_guessing(&mut out);
                }
            }
            Phase::Guessing(mut countdown) => {
                let remaining = countdown.tick();
                self.phase = Phase::Guessing(countdown);
                tracing::trace!(room_id = %self.room_id, remaining, "guessing tick");
                out.push((Recipient::All, ServerEvent::GuessingTick { remaining }));
                if remaining > 0
                    && remaining == self.config.hint_threshold_secs
                    && !self.hint_revealed
                {
                    self.reveal_hint(&mut out);
                }
                if remaining == 0 {
                    self.settle_turn(false, &mut out);
                }
            }
            Phase::Settling(mut countdown) => {
                if countdown.tick() == 0 {
                    self.settle_turn(true, &mut out);
                } else {
                    self.phase = Phase::Settling(countdown);
                }
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn begin_selection(&mut self, out: &mut Outbox) {
        self.guesses.clear();
        self.hint_revealed = false;
        self.current_word.clear();
        let total = self.config.selection_secs;
        self.phase = Phase::Selecting(Countdown::new(total));
        self.timer_epoch += 1;

        let Some(drawer) = self.drawer().cloned() else {
            return;
        };
        tracing::debug!(
            room_id = %self.room_id,
            round = self.round,
            drawer = %drawer.id,
            "selecting"
        );
        out.push((
            Recipient::All,
            ServerEvent::DrawerSelected {
                participant_id: drawer.id,
                name: drawer.name,
            },
        ));
        out.push((Recipient::All, ServerEvent::SelectionTick { remaining: total }));
    }

    fn begin_guessing(&mut self, out: &mut Outbox) {
        let total = self.config.guessing_secs;
        self.total_guess_time = total;
        self.phase = Phase::Guessing(Countdown::new(total));
        self.timer_epoch += 1;
        if self.current_word.is_empty() {
            tracing::debug!(room_id = %self.room_id, "guessing without a word");
        }
        out.push((Recipient::All, ServerEvent::GuessingStarted { total }));
    }

    fn reveal_hint(&mut self, out: &mut Outbox) {
        let Some(drawer_id) = self.drawer().map(|d| d.id) else {
            return;
        };
        let masked = mask_word(&self.current_word, self.config.hint_letters, &mut rand::rng());
        self.hint_revealed = true;
        tracing::debug!(room_id = %self.room_id, "hint revealed");
        out.push((Recipient::AllExcept(drawer_id), ServerEvent::HintRevealed { masked }));
    }

    /// Moves into the grace period once every guesser has scored.
    fn check_full_clear(&mut self, out: &mut Outbox) {
        let eligible = self.eligible_guessers();
        if eligible == 0 || self.guesses.len() < eligible {
            return;
        }

        let grace = self.config.full_clear_grace_secs;
        tracing::debug!(room_id = %self.room_id, grace, "everyone guessed");
        out.push((Recipient::All, ServerEvent::EveryoneGuessed { grace_secs: grace }));
        if grace == 0 {
            self.settle_turn(true, out);
        } else {
            self.phase = Phase::Settling(Countdown::new(grace));
            self.timer_epoch += 1;
        }
    }

    /// Turn-end scoring, then rotation.
    fn settle_turn(&mut self, full_clear: bool, out: &mut Outbox) {
        if let Some(drawer) = self.drawer().cloned() {
            let correct = self.guesses.len();
            let bonus = scoring::drawer_turn_bonus(correct, self.eligible_guessers());
            if bonus > 0 {
                self.scores.award(&drawer, bonus);
                out.push((
                    Recipient::All,
                    ServerEvent::system(Notice::DrawerBonus {
                        name: drawer.name.clone(),
                        points: bonus,
                    }),
                ));
            }
            if full_clear {
                self.scores.award(&drawer, FULL_CLEAR_BONUS);
                out.push((
                    Recipient::All,
                    ServerEvent::system(Notice::FullClearBonus {
                        name: drawer.name,
                        points: FULL_CLEAR_BONUS,
                    }),
                ));
            }
        }
        if !full_clear {
            self.announce_word(out);
        }
        out.push((
            Recipient::All,
            ServerEvent::ScoreUpdate {
                scores: self.scores.snapshot(),
            },
        ));

        let next = self.drawer_index + 1;
        self.advance_to(next, out);
    }

    /// The drawer left: nobody collects drawer bonuses, and the participant
    /// now sitting at `drawer_index` draws next.
    fn abandon_turn(&mut self, out: &mut Outbox) {
        tracing::debug!(room_id = %self.room_id, "drawer left, abandoning turn");
        if matches!(self.phase, Phase::Guessing(_) | Phase::Settling(_)) {
            self.announce_word(out);
        }
        self.advance_to(self.drawer_index, out);
    }

    fn announce_word(&self, out: &mut Outbox) {
        if !self.current_word.is_empty() {
            out.push((
                Recipient::All,
                ServerEvent::system(Notice::WordReveal {
                    word: self.current_word.clone(),
                }),
            ));
        }
    }

    /// Hands the turn to `next`; running off the end of the roster wraps to
    /// the first participant and starts a new round.
    fn advance_to(&mut self, next: usize, out: &mut Outbox) {
        out.push((Recipient::All, ServerEvent::CanvasClear));
        if next >= self.participants.len() {
            self.drawer_index = 0;
            self.round += 1;
        } else {
            self.drawer_index = next;
        }

        if self.round > self.config.max_rounds {
            self.end_game(out);
        } else {
            self.begin_selection(out);
        }
    }

    fn end_game(&mut self, out: &mut Outbox) {
        tracing::info!(room_id = %self.room_id, "game ended");
        out.push((
            Recipient::All,
            ServerEvent::FinalScores {
                scores: self.scores.snapshot(),
            },
        ));
        self.started = false;
        self.phase = Phase::Idle;
        self.drawer_index = 0;
        self.round = 1;
        self.current_word.clear();
        self.hint_revealed = false;
        self.guesses.clear();
        out.push((Recipient::All, ServerEvent::GameEnded));
        out.push((Recipient::All, ServerEvent::RoomView(self.view())));
    }
}
