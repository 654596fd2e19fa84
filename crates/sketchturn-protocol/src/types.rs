//! Core protocol types for Sketchturn's wire format.
//!
//! Every type here is serialized with serde and travels between a browser
//! client and the server. The room engine produces [`ServerEvent`]s paired
//! with a [`Recipient`]; the connection layer turns them into frames.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identity of one connected participant.
///
/// Assigned by the server when a connection joins and stable for the life
/// of that connection. Serialized as a bare number thanks to
/// `#[serde(transparent)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identity of a room, supplied by clients as an opaque string.
///
/// Not `Copy` (it owns a `String`), so pass it by reference where you can.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A participant as the room sees it: connection identity plus display
/// name. Names are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every participant in the room.
    All,
    /// Exactly one participant.
    Participant(ParticipantId),
    /// Everyone except the given participant (e.g. hints skip the drawer).
    AllExcept(ParticipantId),
}

impl Recipient {
    /// Returns `true` if `participant` is addressed by this recipient.
    pub fn includes(&self, participant: ParticipantId) -> bool {
        match self {
            Self::All => true,
            Self::Participant(id) => *id == participant,
            Self::AllExcept(id) => *id != participant,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Snapshot of a room's roster and progress, re-broadcast after every join
/// and leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: RoomId,
    /// In turn order.
    pub participants: Vec<Participant>,
    pub owner_id: ParticipantId,
    pub started: bool,
    pub round: u32,
    pub max_rounds: u32,
    /// Current drawer, present only while a game is running.
    pub drawer_id: Option<ParticipantId>,
}

/// One line of a score board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub participant_id: ParticipantId,
    pub name: String,
    pub points: u32,
}

/// One canvas stroke segment. Relayed verbatim; the server never looks
/// inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub prev_x: f32,
    pub prev_y: f32,
    pub x: f32,
    pub y: f32,
    pub brush_color: String,
    pub brush_size: f32,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Everything a client can ask of the server.
///
/// Internally tagged, so `SelectWord` travels as
/// `{ "type": "SelectWord", "word": "apple" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Must be the first message on a connection.
    Join { room_id: RoomId, name: String },
    Leave,
    Start,
    ResetScores,
    /// Drawer only, during word selection.
    SelectWord { word: String },
    /// A guess judged by the server against the current word.
    Guess { text: String },
    /// A guess the client has already judged correct.
    GuessedCorrectly,
    ForceAdvanceSelection,
    Chat { text: String },
    Draw(Stroke),
    ClearCanvas,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A structured system announcement.
///
/// The fields are the contract; [`fmt::Display`] renders the human-facing
/// wording, which clients may replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Notice {
    CorrectGuess { name: String, points: u32 },
    DrawerBonus { name: String, points: u32 },
    FullClearBonus { name: String, points: u32 },
    WordReveal { word: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorrectGuess { name, points } => {
                write!(f, "{name} guessed the word! (+{points})")
            }
            Self::DrawerBonus { name, points } => {
                write!(f, "{name} earned a drawing bonus of {points} points")
            }
            Self::FullClearBonus { name, points } => {
                write!(f, "Everyone guessed it! {name} gets {points} bonus points")
            }
            Self::WordReveal { word } => write!(f, "The word was: {word}"),
        }
    }
}

/// Everything the server tells clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// First event on a connection: the identity the server assigned.
    Welcome { participant_id: ParticipantId },
    RoomView(RoomView),
    GameStarted,
    DrawerSelected { participant_id: ParticipantId, name: String },
    SelectionTick { remaining: u32 },
    GuessingStarted { total: u32 },
    GuessingTick { remaining: u32 },
    /// Word with all but a few letters replaced by `_`. Never sent to the
    /// drawer.
    HintRevealed { masked: String },
    /// All non-drawers guessed; the turn settles after `grace_secs`.
    EveryoneGuessed { grace_secs: u32 },
    System { notice: Notice, text: String },
    ScoreUpdate { scores: Vec<ScoreEntry> },
    FinalScores { scores: Vec<ScoreEntry> },
    GameEnded,
    CanvasClear,
    Chat { participant_id: ParticipantId, name: String, text: String },
    Drawing(Stroke),
    /// Reply to the guesser only.
    GuessResult { accepted: bool, points_awarded: u32, already_counted: bool },
    Error { code: u16, message: String },
}

impl ServerEvent {
    /// Wraps a notice together with its rendered text.
    pub fn system(notice: Notice) -> Self {
        let text = notice.to_string();
        Self::System { notice, text }
    }
}

#[cfg(test)]
mod tests {
    //! The JSON shape is what the browser client parses, so these tests
    //! pin the serde attributes.

    use super::*;

    #[test]
    fn test_participant_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ParticipantId(42)).unwrap();
        assert_eq!(json, "42");
        assert_eq!(ParticipantId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("R1")).unwrap();
        assert_eq!(json, "\"R1\"");
        assert_eq!(RoomId::from("lobby").to_string(), "lobby");
    }

    #[test]
    fn test_recipient_includes() {
        let a = ParticipantId(1);
        let b = ParticipantId(2);
        assert!(Recipient::All.includes(a));
        assert!(Recipient::Participant(a).includes(a));
        assert!(!Recipient::Participant(a).includes(b));
        assert!(!Recipient::AllExcept(a).includes(a));
        assert!(Recipient::AllExcept(a).includes(b));
    }

    #[test]
    fn test_client_message_is_internally_tagged() {
        let json = serde_json::to_value(ClientMessage::SelectWord {
            word: "apple".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "SelectWord");
        assert_eq!(json["word"], "apple");
    }

    #[test]
    fn test_draw_message_flattens_stroke() {
        let raw = r##"{"type":"Draw","prev_x":1.0,"prev_y":2.0,"x":3.0,"y":4.0,"brush_color":"#000","brush_size":5.0}"##;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMessage::Draw(stroke) => {
                assert_eq!(stroke.x, 3.0);
                assert_eq!(stroke.brush_color, "#000");
            }
            other => panic!("expected Draw, got {other:?}"),
        }
    }

    #[test]
    fn test_system_event_carries_fields_and_text() {
        let event = ServerEvent::system(Notice::DrawerBonus {
            name: "Ada".into(),
            points: 7,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "System");
        assert_eq!(json["notice"]["kind"], "DrawerBonus");
        assert_eq!(json["notice"]["points"], 7);
        assert!(json["text"].as_str().unwrap().contains("Ada"));
    }

    #[test]
    fn test_room_view_event_shape() {
        let view = RoomView {
            room_id: "R1".into(),
            participants: vec![Participant::new(ParticipantId(1), "Ada")],
            owner_id: ParticipantId(1),
            started: false,
            round: 1,
            max_rounds: 3,
            drawer_id: None,
        };
        let json = serde_json::to_value(ServerEvent::RoomView(view)).unwrap();
        assert_eq!(json["type"], "RoomView");
        assert_eq!(json["room_id"], "R1");
        assert_eq!(json["participants"][0]["name"], "Ada");
        assert!(json["drawer_id"].is_null());
    }

    #[test]
    fn test_word_reveal_text() {
        let notice = Notice::WordReveal {
            word: "apple".into(),
        };
        assert_eq!(notice.to_string(), "The word was: apple");
    }
}
