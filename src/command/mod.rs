//! Local command interpreter: free text in, table-matched command out.
//!
//! Phrases are matched as substrings of the normalized input; among all
//! matching keys the longest wins, so "stop exploring" beats "explore".

use crate::engine::state::Variant;

/// Every local command across both tables, as a tagged union. The
/// engine owns the handlers; this module only resolves phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveForward,
    MoveBackward,
    GoLeft,
    GoRight,
    DashForward,
    HopInPlace,
    Shake,
    Wobble,
    Explore,
    StopExploring,
    FollowMe,
    GuardMode,
    ReturnHome,
    Peek,
    Hide,
    JumpScare,
    FloatAround,
    CircleAround,
    Zigzag,
    Dance,
    SingASong,
    LaserEyes,
    DemonEyes,
    Bang,
    Facepalm,
    EatChip,
    DrinkOil,
    ChangeBattery,
    Charge,
    StopCharging,
    BatteryQuery,
    TakePhoto,
    // Ooze-only motions
    Stretch,
    Splatter,
    SplitClone,
    SquishHop,
    MeltDown,
    StickToWall,
    OozeWave,
    OozeCannon,
    TransparentMode,
    GlowMode,
}

/// Table for the Standard and Cute variants.
const STANDARD_TABLE: &[(&str, Command)] = &[
    ("stop exploring", Command::StopExploring),
    ("return home", Command::ReturnHome),
    ("move forward", Command::MoveForward),
    ("move backward", Command::MoveBackward),
    ("go left", Command::GoLeft),
    ("go right", Command::GoRight),
    ("dash forward", Command::DashForward),
    ("hop in place", Command::HopInPlace),
    ("shake", Command::Shake),
    ("wobble", Command::Wobble),
    ("explore", Command::Explore),
    ("follow me", Command::FollowMe),
    ("guard mode", Command::GuardMode),
    ("peek", Command::Peek),
    ("hide", Command::Hide),
    ("jump scare", Command::JumpScare),
    ("float around", Command::FloatAround),
    ("circle around", Command::CircleAround),
    ("zigzag", Command::Zigzag),
    ("dance", Command::Dance),
    ("laser eyes", Command::LaserEyes),
    ("demon eyes", Command::DemonEyes),
    ("bang", Command::Bang),
    ("sing a song", Command::SingASong),
    ("facepalm", Command::Facepalm),
    ("eat chip", Command::EatChip),
    ("drink oil", Command::DrinkOil),
    ("charge", Command::Charge),
    ("stop charging", Command::StopCharging),
    ("what's the battery level", Command::BatteryQuery),
    ("take a photo", Command::TakePhoto),
];

/// Table for the Ooze variant.
const OOZE_TABLE: &[(&str, Command)] = &[
    ("move forward", Command::MoveForward),
    ("move backward", Command::MoveBackward),
    ("go left", Command::GoLeft),
    ("go right", Command::GoRight),
    ("return home", Command::ReturnHome),
    ("stretch", Command::Stretch),
    ("splatter", Command::Splatter),
    ("split clone", Command::SplitClone),
    ("squish hop", Command::SquishHop),
    ("melt down", Command::MeltDown),
    ("explore", Command::Explore),
    ("stop exploring", Command::StopExploring),
    ("follow me", Command::FollowMe),
    ("stick to wall", Command::StickToWall),
    ("slime wave", Command::OozeWave),
    ("dance", Command::Dance),
    ("slime cannon", Command::OozeCannon),
    ("transparent mode", Command::TransparentMode),
    ("glow mode", Command::GlowMode),
    ("eat chip", Command::EatChip),
    ("drink oil", Command::DrinkOil),
    ("change battery", Command::ChangeBattery),
    ("take a photo", Command::TakePhoto),
];

pub fn table_for(variant: Variant) -> &'static [(&'static str, Command)] {
    match variant {
        Variant::Standard | Variant::Cute => STANDARD_TABLE,
        Variant::Ooze => OOZE_TABLE,
    }
}

/// Lowercase, trim, strip the punctuation set `! ? , .`.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .trim()
        .chars()
        .filter(|c| !matches!(c, '!' | '?' | ',' | '.'))
        .collect()
}

/// Longest-substring-match resolution against the variant's table.
/// Returns None when nothing matches (the caller then goes remote).
pub fn resolve(raw: &str, variant: Variant) -> Option<Command> {
    let text = normalize(raw);
    let mut best: Option<(&str, Command)> = None;
    for &(phrase, cmd) in table_for(variant) {
        if text.contains(phrase) {
            match best {
                Some((b, _)) if b.len() >= phrase.len() => {}
                _ => best = Some((phrase, cmd)),
            }
        }
    }
    best.map(|(_, cmd)| cmd)
}
