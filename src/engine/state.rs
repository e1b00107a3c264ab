use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discrete display state of the agent's face. Exactly one is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Neutral,
    Happy,
    Smile,
    Sad,
    Angry,
    Confuse,
    Cry,
    Thinking,
    Sleeping,
    Listening,
    Tired,
    LaserEyes,
    DemonEyes,
    Dead,
    Singing,
    Dancing,
    Walking,
    Surprised,
    Focused,
    Excited,
    Playful,
    Loving,
    Proud,
    Relaxed,
    Frustrated,
    Embarrassed,
    Scared,
    Charging,
    ChangeBattery,
    DrinkOil,
    EatChip,
    Gaming,
}

/// Persona of the agent. Standard and Cute share a command table;
/// Ooze has its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Standard,
    Cute,
    Ooze,
}

impl Variant {
    pub fn is_ooze(&self) -> bool {
        matches!(self, Variant::Ooze)
    }
}

/// Which full-view collaborator currently owns the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveView {
    None,
    Camera,
    Gallery,
    Game,
}

/// Transient body-animation tag consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyAnimation {
    HopInPlace,
    Shake,
    Wobble,
    Sway,
    DanceCombo,
    Crawl,
    Slide,
    Stretch,
    Splatter,
    Reform,
    JumpSplit,
    SquishHop,
    MeltDown,
    Wave,
    WobbleDance,
    Absorb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialEffect {
    Singing,
}

/// Spatial pose. x/y in pixels relative to viewport center, z is depth
/// in [-1.5, 1.0], rotation in degrees around the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Pose { x: 0.0, y: 0.0, z: 0.0, rotation: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of the conversation with the remote responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// The single mutable aggregate for one session. The engine owns it;
/// the renderer consumes clones published after every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub expression: Expression,
    pub variant: Variant,
    pub pose: Pose,
    pub battery_level: u8,

    pub session_active: bool,
    pub interacting: bool,
    pub exploring: bool,
    pub following: bool,
    pub charging: bool,
    pub in_game_mode: bool,
    pub loading_remote_response: bool,

    pub active_view: ActiveView,
    pub body_animation: Option<BodyAnimation>,
    pub special_effect: Option<SpecialEffect>,
    pub transparent: bool,
    pub glowing: bool,
    pub body_visible: bool,

    /// Currently displayed speech-bubble text, if any.
    pub message: Option<String>,

    pub gallery: Vec<Uuid>,
    pub history: Vec<ChatTurn>,
    pub has_welcomed: bool,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            // Pre-session the agent is asleep.
            expression: Expression::Sleeping,
            variant: Variant::Standard,
            pose: Pose::default(),
            battery_level: 100,
            session_active: false,
            interacting: false,
            exploring: false,
            following: false,
            charging: false,
            in_game_mode: false,
            loading_remote_response: false,
            active_view: ActiveView::None,
            body_animation: None,
            special_effect: None,
            transparent: false,
            glowing: false,
            body_visible: true,
            message: None,
            gallery: Vec::new(),
            history: Vec::new(),
            has_welcomed: false,
        }
    }
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Battery writes clamp into 0..=100.
    pub fn set_battery(&mut self, level: i32) {
        self.battery_level = level.clamp(0, 100) as u8;
    }

    pub fn raise_battery(&mut self, amount: i32) {
        self.set_battery(self.battery_level as i32 + amount);
    }

    pub fn reset_pose(&mut self) {
        self.pose = Pose::default();
    }

    /// At most one of exploring/following/charging may be true.
    pub fn exclusive_activity_ok(&self) -> bool {
        [self.exploring, self.following, self.charging]
            .iter()
            .filter(|&&f| f)
            .count()
            <= 1
    }

    pub fn push_turn(&mut self, role: Role, text: impl Into<String>) {
        self.history.push(ChatTurn { role, text: text.into() });
    }
}
