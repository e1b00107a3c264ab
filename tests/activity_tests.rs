use tokio::sync::mpsc;

use aros::config::EngineConfig;
use aros::engine::event::{Event, InputContent, InputEvent};
use aros::engine::state::{ActiveView, Expression, Pose};
use aros::engine::time::TICK_MS;
use aros::Engine;

fn engine_with_seed(seed: u64) -> Engine {
    let config = EngineConfig {
        seed: Some(seed),
        ..EngineConfig::default()
    };
    let (tx, rx) = mpsc::channel(16);
    let mut e = Engine::new(config, rx, tx);
    e.tick_step(vec![Event::Input(InputEvent::ui(InputContent::StartSession))]);
    // Let the welcome run its course so it cannot perturb the activity
    // under test.
    for _ in 0..122 {
        e.tick_step(vec![]);
    }
    e
}

fn engine() -> Engine {
    engine_with_seed(3)
}

fn say(e: &mut Engine, text: &str) {
    e.tick_step(vec![Event::Input(InputEvent::message("test", text))]);
}

fn send(e: &mut Engine, content: InputContent) {
    e.tick_step(vec![Event::Input(InputEvent::ui(content))]);
}

fn step_ms(e: &mut Engine, ms: u64) {
    for _ in 0..ms.div_ceil(TICK_MS) {
        e.tick_step(vec![]);
    }
}

fn poses_equal(a: &Pose, b: &Pose) -> bool {
    a.x == b.x && a.y == b.y && a.z == b.z && a.rotation == b.rotation
}

#[test]
fn exploration_wanders_within_bounds() {
    // Across seeds the wander loop must move or emote, and every pose
    // it produces stays inside the derived bounds.
    for seed in 0..10 {
        let mut e = engine_with_seed(seed);
        say(&mut e, "explore");
        assert!(e.state.exploring);
        // Laterally a step is only taken while inside the bound for the
        // depth at that moment; the widest bound is at the far depth.
        let widest = e.config().x_boundary(-1.5) + e.config().x_step;
        let mut moved = false;
        for _ in 0..600 {
            e.tick_step(vec![]);
            let pose = e.state.pose;
            if pose.x != 0.0 || pose.z != 0.0 {
                moved = true;
            }
            assert!(pose.x.abs() <= widest, "seed {seed}: x {} out of bounds", pose.x);
            // Depth steps are guarded before moving, so one step past
            // the far limit is the extreme.
            assert!(
                pose.z >= -1.61 && pose.z <= 1.01,
                "seed {seed}: z {} out of range",
                pose.z
            );
        }
        assert!(e.state.exploring, "seed {seed}: loop must keep running");
        assert!(moved, "seed {seed}: thirty seconds of wandering must move");
    }
}

#[test]
fn exploration_stops_dead_once_told_to() {
    for seed in 0..10 {
        let mut e = engine_with_seed(seed);
        say(&mut e, "explore");
        step_ms(&mut e, 5_000);
        say(&mut e, "stop exploring");
        assert!(!e.state.exploring, "seed {seed}");

        let frozen_pose = e.state.pose;
        let frozen_expression = e.state.expression;
        step_ms(&mut e, 10_000);
        assert!(
            poses_equal(&e.state.pose, &frozen_pose),
            "seed {seed}: no step may land after the stop"
        );
        assert_eq!(
            e.state.expression, frozen_expression,
            "seed {seed}: no emote may land after the stop"
        );
    }
}

#[test]
fn follow_me_takes_over_from_exploration() {
    let mut e = engine();
    say(&mut e, "explore");
    step_ms(&mut e, 3_000);
    say(&mut e, "follow me");

    assert!(!e.state.exploring, "follow must end exploration");
    assert!(e.state.following);
    assert_eq!(e.state.expression, Expression::Focused);

    // Pose now tracks the pointer exclusively, re-centered on the
    // viewport, and nothing autonomous moves it afterwards.
    send(&mut e, InputContent::PointerMoved { x: 1_000.0, y: 700.0 });
    assert_eq!(e.state.pose.x, 360.0);
    assert_eq!(e.state.pose.y, 300.0);

    send(&mut e, InputContent::PointerMoved { x: 640.0, y: 400.0 });
    assert_eq!(e.state.pose.x, 0.0);
    assert_eq!(e.state.pose.y, 0.0);

    step_ms(&mut e, 5_000);
    assert_eq!(e.state.pose.x, 0.0, "no residual autonomous movement");
    assert_eq!(e.state.pose.y, 0.0);
}

#[test]
fn pointer_is_ignored_when_not_following() {
    let mut e = engine();
    send(&mut e, InputContent::PointerMoved { x: 1_000.0, y: 700.0 });
    assert_eq!(e.state.pose.x, 0.0);
    assert_eq!(e.state.pose.y, 0.0);
}

#[test]
fn pointer_is_ignored_while_a_view_is_open() {
    let mut e = engine();
    say(&mut e, "follow me");
    // The follow tracker releases when a view takes the display.
    send(&mut e, InputContent::MenuShowGallery);
    assert_eq!(e.state.active_view, ActiveView::Gallery);
    assert!(!e.state.following, "opening a view stops the tracker");
    send(&mut e, InputContent::PointerMoved { x: 1_000.0, y: 700.0 });
    assert_eq!(e.state.pose.x, 0.0);
}

#[test]
fn stopping_follow_reverts_focus_to_neutral() {
    let mut e = engine();
    say(&mut e, "follow me");
    assert_eq!(e.state.expression, Expression::Focused);
    say(&mut e, "return home");
    assert!(!e.state.following);
    assert_eq!(e.state.expression, Expression::Neutral);
}

#[test]
fn activities_are_mutually_exclusive() {
    let mut e = engine();
    say(&mut e, "explore");
    assert!(e.state.exclusive_activity_ok());
    say(&mut e, "follow me");
    assert!(e.state.exclusive_activity_ok());
    assert!(e.state.following && !e.state.exploring);
    say(&mut e, "charge");
    assert!(e.state.exclusive_activity_ok());
    assert!(e.state.charging && !e.state.following && !e.state.exploring);

    // Charging holds `interacting`, so the explore guard (which reads
    // the pre-stop snapshot) turns this into a plain stop.
    say(&mut e, "explore");
    assert!(e.state.exclusive_activity_ok());
    assert!(!e.state.exploring && !e.state.charging);

    // A second ask starts from a clean snapshot and goes through.
    say(&mut e, "explore");
    assert!(e.state.exploring);
}

#[test]
fn circle_returns_to_origin() {
    let mut e = engine();
    say(&mut e, "circle around");
    assert!(e.state.interacting);
    step_ms(&mut e, 1_000);
    assert!(e.state.interacting, "a revolution takes 72 steps of 50ms");
    step_ms(&mut e, 3_000);
    assert!(!e.state.interacting);
    assert!(poses_equal(&e.state.pose, &Pose::default()), "circling ends home");
}

#[test]
fn zigzag_runs_its_six_swings() {
    let mut e = engine();
    say(&mut e, "zigzag");
    step_ms(&mut e, 3_000);
    assert!(!e.state.interacting);
    // Six alternating swings cancel laterally but creep forward.
    assert_eq!(e.state.pose.x, 0.0);
    assert!((e.state.pose.z - 0.6).abs() < 1e-3, "z was {}", e.state.pose.z);
}

#[test]
fn procedural_animation_is_cancelled_by_the_next_command() {
    let mut e = engine();
    say(&mut e, "circle around");
    step_ms(&mut e, 500);
    say(&mut e, "return home");
    let home = e.state.pose;
    assert!(poses_equal(&home, &Pose::default()));
    step_ms(&mut e, 5_000);
    assert!(
        poses_equal(&e.state.pose, &Pose::default()),
        "no circle step may fire after cancellation"
    );
}
