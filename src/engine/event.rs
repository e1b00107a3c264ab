use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{Expression, Variant};
use crate::services::responder::{AiReply, ResponderError};

#[derive(Debug, Clone)]
pub enum Event {
    /// External signals (typed text, UI affordances, pointer movement).
    Input(InputEvent),
    /// Result of a remote responder round-trip, tagged with the
    /// activity generation captured at dispatch time.
    ResponderResult {
        generation: u64,
        result: Result<AiReply, ResponderError>,
    },
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub source: String,
    pub content: InputContent,
}

impl InputEvent {
    pub fn message(source: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Message(text.to_string()),
        }
    }

    pub fn ui(content: InputContent) -> Self {
        Self { source: "ui".to_string(), content }
    }
}

/// Every entry point the UI or a view collaborator can drive. A quick
/// command button and typed free text are equivalent for dispatch.
#[derive(Debug, Clone)]
pub enum InputContent {
    StartSession,
    Message(String),
    Emote(Emote),
    MenuShowGallery,
    MenuShowGames,
    MenuTakePhoto,
    MenuSleep,
    MenuFeed(Food),
    VariantSelected(Variant),
    /// Tap on the agent body: wakes it when Sleeping, otherwise just
    /// counts as activity.
    BodyTapped,
    PointerMoved { x: f32, y: f32 },
    ViewClosed,
    GameStarted,
    GameWon,
    PhotoCaptured(Uuid),
}

/// Emote selected from the side panel: an expression plus the line the
/// agent says while holding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emote {
    pub name: String,
    pub expression: Expression,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Food {
    Chip,
    OilCan,
    Battery,
}

/// Named fire-and-forget cue for the sound collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Click,
    PowerUp,
    Eat,
    Play,
    TiredSigh,
    Sleep,
    Error,
    SendMessage,
    ReceiveMessage,
}

impl SoundCue {
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Click => "click",
            SoundCue::PowerUp => "powerUp",
            SoundCue::Eat => "eat",
            SoundCue::Play => "play",
            SoundCue::TiredSigh => "tiredSigh",
            SoundCue::Sleep => "sleep",
            SoundCue::Error => "error",
            SoundCue::SendMessage => "sendMessage",
            SoundCue::ReceiveMessage => "receiveMessage",
        }
    }
}

/// Effects are decided inside `tick_step` and executed by the driver.
#[derive(Debug, Clone)]
pub enum SideEffect {
    Sound(SoundCue),
}
