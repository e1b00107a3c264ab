use tokio::sync::mpsc;

use aros::config::EngineConfig;
use aros::engine::event::{Event, InputContent, InputEvent};
use aros::engine::state::{Expression, Variant};
use aros::engine::time::TICK_MS;
use aros::Engine;

fn engine() -> Engine {
    let config = EngineConfig {
        seed: Some(7),
        ..EngineConfig::default()
    };
    let (tx, rx) = mpsc::channel(16);
    let mut e = Engine::new(config, rx, tx);
    e.tick_step(vec![Event::Input(InputEvent::ui(InputContent::StartSession))]);
    e
}

fn say(e: &mut Engine, text: &str) {
    e.tick_step(vec![Event::Input(InputEvent::message("test", text))]);
}

fn step_ms(e: &mut Engine, ms: u64) {
    for _ in 0..ms.div_ceil(TICK_MS) {
        e.tick_step(vec![]);
    }
}

#[test]
fn punctuation_and_case_dispatch_identically() {
    for raw in ["go left", "Go Left!", "GO LEFT?", "go left,", "go left."] {
        let mut e = engine();
        say(&mut e, raw);
        assert_eq!(e.state.pose.x, -60.0, "input {raw:?} must move one step left");
        assert!(e.state.interacting, "move wraps in an interacting pulse");
    }
}

#[test]
fn pulse_releases_after_fixed_duration() {
    let mut e = engine();
    say(&mut e, "go right");
    assert!(e.state.interacting);
    step_ms(&mut e, 300);
    assert!(!e.state.interacting, "pulse must end after 300ms");
    assert_eq!(e.state.pose.x, 60.0);
}

#[test]
fn longest_key_wins_at_dispatch() {
    let mut e = engine();
    say(&mut e, "explore");
    assert!(e.state.exploring);
    // "stop exploring" contains "explore"; the longer key must win.
    say(&mut e, "stop exploring");
    assert!(!e.state.exploring, "longest match must select the stop handler");
}

#[test]
fn unmatched_text_routes_to_the_responder() {
    let mut e = engine();
    say(&mut e, "tell me about the weather");
    assert!(e.state.loading_remote_response);
    assert_eq!(e.state.expression, Expression::Thinking);
}

#[test]
fn command_table_follows_the_variant() {
    // "jump scare" only exists in the Standard/Cute table.
    let mut e = engine();
    say(&mut e, "jump scare");
    assert_eq!(e.state.expression, Expression::Scared);
    assert!(!e.state.loading_remote_response);

    let mut e = engine();
    e.tick_step(vec![Event::Input(InputEvent::ui(InputContent::VariantSelected(
        Variant::Ooze,
    )))]);
    say(&mut e, "jump scare");
    assert!(
        e.state.loading_remote_response,
        "unknown phrase for this variant must go remote"
    );

    // "splatter" only exists for Ooze.
    say(&mut e, "splatter");
    assert!(
        e.state.loading_remote_response,
        "local commands are ignored while a remote response is loading"
    );
}

#[test]
fn ooze_variant_has_its_own_motions() {
    let mut e = engine();
    e.tick_step(vec![Event::Input(InputEvent::ui(InputContent::VariantSelected(
        Variant::Ooze,
    )))]);
    say(&mut e, "splatter");
    step_ms(&mut e, TICK_MS);
    assert_eq!(e.state.expression, Expression::Surprised);
    assert!(e.state.interacting);
    // Splatter then reform, then settle.
    step_ms(&mut e, 1_200);
    assert_eq!(e.state.expression, Expression::Proud);
    step_ms(&mut e, 900);
    assert_eq!(e.state.expression, Expression::Neutral);
    assert!(!e.state.interacting);
}

#[test]
fn battery_query_reports_current_level() {
    let mut e = engine();
    // Past the welcome, so its greeting cannot shadow the report.
    step_ms(&mut e, 6_100);
    say(&mut e, "what's the battery level?");
    let message = e.state.message.clone().expect("query must display a message");
    assert!(message.contains("100%"), "unexpected message {message:?}");
    step_ms(&mut e, 4_100);
    assert!(e.state.message.is_none(), "report must expire");
}

#[test]
fn guard_mode_recenters_and_focuses() {
    let mut e = engine();
    say(&mut e, "go left");
    say(&mut e, "go left");
    assert_eq!(e.state.pose.x, -120.0);
    say(&mut e, "guard mode");
    assert_eq!(e.state.pose.x, 0.0);
    assert_eq!(e.state.expression, Expression::Focused);
}

#[test]
fn feeding_raises_battery_clamped() {
    let mut e = engine();
    e.state.set_battery(95);
    say(&mut e, "drink oil");
    assert_eq!(e.state.battery_level, 100, "battery clamps at 100");
    assert_eq!(e.state.message.as_deref(), Some("Smooth!"));
    step_ms(&mut e, TICK_MS);
    assert_eq!(e.state.expression, Expression::DrinkOil);
}

#[test]
fn dash_clamps_depth() {
    let mut e = engine();
    say(&mut e, "dash forward");
    say(&mut e, "dash forward");
    assert_eq!(e.state.pose.z, 1.0, "depth clamps at the near bound");
}
