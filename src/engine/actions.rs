//! User-facing entry points: session start, free text, emotes, menu
//! actions, view callbacks, and the handler behind every table command.

use rand::Rng;

use super::event::{Emote, Food, SoundCue};
use super::orchestrator::{Engine, MessageEnd};
use super::sequence::{InteractionSequence, SeqStep};
use super::state::{ActiveView, AgentState, BodyAnimation, Expression};
use super::timers::TimerAction;
use crate::command::{self, Command};

const EMOTE_HOLD_MS: u64 = 2_500;
const VIEW_GREETING_MS: u64 = 3_000;

impl Engine {
    pub fn start_session(&mut self) {
        if self.state.session_active {
            return;
        }
        self.cue(SoundCue::PowerUp);
        self.state.session_active = true;
        self.state.set_battery(100);
        self.state.expression = Expression::Neutral;
        self.state.reset_pose();
        self.schedule_ungated(TimerAction::Welcome, self.config.welcome_delay_ms);
        self.schedule_ungated(TimerAction::DrainTick, self.config.drain_period_ms);
        self.reset_inactivity();
    }

    /// Free text: local table first, remote responder otherwise.
    /// Sleeping swallows everything; only the wake tap gets through.
    pub fn handle_message(&mut self, text: &str) {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty()
            || self.state.loading_remote_response
            || !self.state.session_active
            || self.state.expression == Expression::Sleeping
        {
            return;
        }
        if self.try_dispatch(&trimmed) {
            return;
        }

        self.stop_all();
        self.cue(SoundCue::SendMessage);
        self.state.loading_remote_response = true;
        self.state.expression = Expression::Thinking;
        self.clear_message();
        self.dispatch_remote(&trimmed);
    }

    /// Resolve against the variant's table; on a match, Stop-All and
    /// run the handler. Guards inside handlers read the state captured
    /// before Stop-All, so e.g. "charge" while charging stops the
    /// charge without restarting it.
    pub fn try_dispatch(&mut self, text: &str) -> bool {
        if !self.state.session_active || self.state.expression == Expression::Sleeping {
            return false;
        }
        let Some(cmd) = command::resolve(text, self.state.variant) else {
            return false;
        };
        let prior = self.state.clone();
        self.stop_all();
        self.apply_command(cmd, &prior);
        true
    }

    pub fn handle_emote(&mut self, emote: Emote) {
        if self.state.loading_remote_response
            || !self.state.session_active
            || self.state.expression == Expression::Sleeping
        {
            return;
        }
        self.stop_all();
        self.clear_message();
        self.cue(SoundCue::Click);
        self.state.expression = emote.expression;
        self.show_message(emote.message, None);
        self.schedule(TimerAction::EmoteRevert, EMOTE_HOLD_MS);
    }

    // --- Menu / view collaborators --------------------------------------

    pub(crate) fn show_gallery(&mut self) {
        if !self.state.session_active
            || self.state.active_view != ActiveView::None
            || self.state.interacting
        {
            return;
        }
        self.stop_all();
        self.cue(SoundCue::Click);
        self.state.reset_pose();
        self.state.interacting = true;
        self.state.active_view = ActiveView::Gallery;
        self.state.expression = Expression::Smile;
        self.show_message(
            "Here are your photos!",
            Some((VIEW_GREETING_MS, MessageEnd::Clear)),
        );
    }

    pub(crate) fn show_games(&mut self) {
        if !self.state.session_active
            || self.state.active_view != ActiveView::None
            || self.state.interacting
        {
            return;
        }
        self.stop_all();
        self.cue(SoundCue::Click);
        self.state.reset_pose();
        self.state.interacting = true;
        self.state.active_view = ActiveView::Game;
        self.state.expression = Expression::Focused;
        self.show_message(
            "Let's play a game!",
            Some((VIEW_GREETING_MS, MessageEnd::Clear)),
        );
    }

    /// Close callback from whichever view owns the display.
    pub(crate) fn handle_view_closed(&mut self) {
        self.state.active_view = ActiveView::None;
        self.state.expression = Expression::Neutral;
        self.state.interacting = false;
        self.state.in_game_mode = false;
        self.reset_inactivity();
    }

    pub(crate) fn handle_game_win(&mut self) {
        self.handle_view_closed();
        self.run_sequence(
            InteractionSequence::new(vec![
                SeqStep::expr(Expression::Excited, 1_500),
                SeqStep::expr(Expression::Proud, 2_000),
            ])
            .with_sound(SoundCue::PowerUp),
        );
        self.show_message("You won! Great job!", None);
    }

    /// Feeding bypasses the tables so every variant can take every food.
    pub(crate) fn handle_feed(&mut self, food: Food) {
        if !self.state.session_active
            || self.state.loading_remote_response
            || self.state.expression == Expression::Sleeping
        {
            return;
        }
        let cmd = match food {
            Food::Chip => Command::EatChip,
            Food::OilCan => Command::DrinkOil,
            Food::Battery => Command::ChangeBattery,
        };
        let prior = self.state.clone();
        self.stop_all();
        self.apply_command(cmd, &prior);
    }

    /// Tap on the body: wake when Sleeping, otherwise just activity.
    pub(crate) fn handle_body_tap(&mut self) {
        if self.state.active_view != ActiveView::None {
            return;
        }
        if self.state.expression == Expression::Sleeping {
            self.wake_up();
            return;
        }
        self.reset_inactivity();
    }

    /// Pointer-follow tracker: absolute client position becomes an
    /// offset from viewport center, written straight into the pose
    /// (unclamped while following).
    pub(crate) fn handle_pointer(&mut self, x: f32, y: f32) {
        if !self.state.following || self.state.active_view != ActiveView::None {
            return;
        }
        self.state.pose.x = x - self.config.viewport_w / 2.0;
        self.state.pose.y = y - self.config.viewport_h / 2.0;
    }

    // --- Command handlers -----------------------------------------------

    /// 300ms synthetic interacting pulse around an instantaneous move,
    /// masking the idle animation between discrete steps.
    fn pulse(&mut self) {
        self.state.interacting = true;
        self.schedule(TimerAction::PulseEnd, self.config.pulse_ms);
    }

    fn apply_command(&mut self, cmd: Command, prior: &AgentState) {
        let ooze = self.state.variant.is_ooze();
        match cmd {
            Command::MoveForward => {
                if ooze {
                    self.play_animation(BodyAnimation::Crawl, 1_000, Some(Expression::Focused));
                }
                self.state.pose.z = (self.state.pose.z + self.config.z_step).min(1.0);
                self.pulse();
            }
            Command::MoveBackward => {
                if ooze {
                    self.play_animation(BodyAnimation::Crawl, 1_000, Some(Expression::Focused));
                }
                self.state.pose.z = (self.state.pose.z - self.config.z_step).max(-1.5);
                self.pulse();
            }
            Command::GoLeft => {
                if ooze {
                    self.play_animation(BodyAnimation::Slide, 1_000, Some(Expression::Playful));
                }
                self.state.pose.x -= self.config.x_step;
                self.pulse();
            }
            Command::GoRight => {
                if ooze {
                    self.play_animation(BodyAnimation::Slide, 1_000, Some(Expression::Playful));
                }
                self.state.pose.x += self.config.x_step;
                self.pulse();
            }
            Command::DashForward => {
                self.state.pose.z = (self.state.pose.z + self.config.z_step * 3.0).min(1.0);
                self.pulse();
            }
            Command::ReturnHome => {
                self.state.reset_pose();
            }
            Command::GuardMode => {
                self.state.reset_pose();
                self.state.expression = Expression::Focused;
            }
            Command::Explore => {
                if prior.exploring
                    || prior.interacting
                    || prior.active_view != ActiveView::None
                {
                    return;
                }
                self.state.exploring = true;
                self.wander_now();
            }
            Command::StopExploring => {
                // Stop-All already ran; nothing left to do.
            }
            Command::FollowMe => {
                if prior.interacting || prior.active_view != ActiveView::None {
                    return;
                }
                self.state.following = true;
                self.state.expression = Expression::Focused;
            }
            Command::Peek => {
                let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                let offscreen = (self.config.viewport_w / 2.0 + 150.0) * side;
                let peek_x = (self.config.viewport_w / 2.0 - 100.0) * side;
                self.state.pose.x = offscreen;
                self.state.pose.y = 0.0;
                self.state.pose.z = 0.0;
                self.schedule(TimerAction::PeekSlide { x: peek_x }, 100);
                self.pulse();
            }
            Command::Hide => {
                let side = if self.state.pose.x > 0.0 { 1.0 } else { -1.0 };
                self.state.pose.x = (self.config.viewport_w / 2.0 + 150.0) * side;
                self.pulse();
            }
            Command::JumpScare => {
                self.state.interacting = true;
                let original_z = self.state.pose.z;
                self.state.expression = Expression::Scared;
                self.state.pose.z = 1.2;
                self.cue(SoundCue::Error);
                self.schedule(TimerAction::JumpScareEnd { z: original_z }, 600);
            }
            Command::FloatAround => {
                if prior.interacting || prior.active_view != ActiveView::None {
                    return;
                }
                self.play_animation(BodyAnimation::Sway, 6_000, Some(Expression::Relaxed));
            }
            Command::CircleAround => {
                if prior.interacting {
                    return;
                }
                self.state.interacting = true;
                self.schedule(TimerAction::CircleStep { angle: 0.0 }, 50);
            }
            Command::Zigzag => {
                if prior.interacting {
                    return;
                }
                self.state.interacting = true;
                self.schedule(TimerAction::ZigzagStep { step: 0 }, 400);
            }
            Command::HopInPlace => {
                self.play_animation(BodyAnimation::HopInPlace, 2_400, Some(Expression::Playful));
            }
            Command::Shake => {
                self.play_animation(BodyAnimation::Shake, 500, Some(Expression::Frustrated));
            }
            Command::Wobble => {
                self.play_animation(BodyAnimation::Wobble, 2_000, Some(Expression::Confuse));
            }
            Command::Dance => {
                if ooze {
                    self.play_animation(
                        BodyAnimation::WobbleDance,
                        4_000,
                        Some(Expression::Dancing),
                    );
                } else {
                    self.play_animation(BodyAnimation::DanceCombo, 6_000, Some(Expression::Dancing));
                }
            }
            Command::SingASong => {
                self.run_sequence(
                    InteractionSequence::single(Expression::Singing, 4_000)
                        .with_sound(SoundCue::Play)
                        .with_effect(super::state::SpecialEffect::Singing),
                );
            }
            Command::LaserEyes => {
                self.run_sequence(
                    InteractionSequence::single(Expression::LaserEyes, 3_000)
                        .with_sound(SoundCue::Error),
                );
            }
            Command::DemonEyes => {
                self.run_sequence(
                    InteractionSequence::single(Expression::DemonEyes, 3_000)
                        .with_sound(SoundCue::Error),
                );
            }
            Command::Bang => {
                self.run_sequence(
                    InteractionSequence::new(vec![
                        SeqStep::expr(Expression::Confuse, 1_000),
                        SeqStep::expr(Expression::Dead, 2_000),
                    ])
                    .with_sound(SoundCue::Error),
                );
            }
            Command::Facepalm => {
                self.run_sequence(InteractionSequence::single(Expression::Frustrated, 2_000));
            }
            Command::EatChip => {
                if ooze {
                    self.run_sequence(
                        InteractionSequence::new(vec![
                            SeqStep::expr(Expression::EatChip, 500).with_body(BodyAnimation::Absorb),
                            SeqStep::hold(2_500).clearing_body(),
                        ])
                        .with_sound(SoundCue::Eat),
                    );
                } else {
                    self.run_sequence(
                        InteractionSequence::single(Expression::EatChip, 3_000)
                            .with_sound(SoundCue::Eat),
                    );
                    self.show_message("Crunchy!", Some((3_000, MessageEnd::Clear)));
                }
                self.state.raise_battery(15);
            }
            Command::DrinkOil => {
                if ooze {
                    self.run_sequence(
                        InteractionSequence::new(vec![
                            SeqStep::expr(Expression::DrinkOil, 500)
                                .with_body(BodyAnimation::Absorb),
                            SeqStep::hold(2_500).clearing_body(),
                        ])
                        .with_sound(SoundCue::Play),
                    );
                } else {
                    self.run_sequence(
                        InteractionSequence::single(Expression::DrinkOil, 3_000)
                            .with_sound(SoundCue::Play),
                    );
                    self.show_message("Smooth!", Some((3_000, MessageEnd::Clear)));
                }
                self.state.raise_battery(25);
            }
            Command::ChangeBattery => {
                if ooze {
                    self.run_sequence(
                        InteractionSequence::new(vec![
                            SeqStep::expr(Expression::ChangeBattery, 500)
                                .with_body(BodyAnimation::Absorb),
                            SeqStep::hold(2_500).clearing_body(),
                        ])
                        .with_sound(SoundCue::PowerUp),
                    );
                } else {
                    self.run_sequence(
                        InteractionSequence::single(Expression::ChangeBattery, 3_000)
                            .with_sound(SoundCue::PowerUp),
                    );
                }
                self.state.set_battery(100);
            }
            Command::Charge => {
                if prior.charging {
                    return;
                }
                self.state.charging = true;
                self.state.interacting = true;
                self.state.expression = Expression::Charging;
                self.schedule(TimerAction::ChargeTick, self.config.charge_period_ms);
            }
            Command::StopCharging => {
                if !prior.charging {
                    return;
                }
                self.state.expression = Expression::Neutral;
                self.reset_inactivity();
            }
            Command::BatteryQuery => {
                let text = format!("My battery is at {}%.", self.state.battery_level);
                self.show_message(text, Some((4_000, MessageEnd::Clear)));
                self.reset_inactivity();
            }
            Command::TakePhoto => {
                if prior.active_view != ActiveView::None || prior.interacting {
                    return;
                }
                self.cue(SoundCue::Click);
                self.state.reset_pose();
                self.state.interacting = true;
                self.state.active_view = ActiveView::Camera;
                self.state.expression = Expression::Focused;
                if !ooze {
                    self.show_message("Say cheese!", Some((VIEW_GREETING_MS, MessageEnd::Clear)));
                }
            }
            Command::Stretch => {
                self.play_animation(BodyAnimation::Stretch, 1_500, Some(Expression::Playful));
            }
            Command::SquishHop => {
                self.play_animation(BodyAnimation::SquishHop, 1_000, Some(Expression::Excited));
            }
            Command::OozeWave => {
                self.play_animation(BodyAnimation::Wave, 3_000, Some(Expression::Playful));
            }
            Command::Splatter => {
                if prior.interacting {
                    return;
                }
                self.run_sequence(InteractionSequence::new(vec![
                    SeqStep::expr(Expression::Surprised, 1_200).with_body(BodyAnimation::Splatter),
                    SeqStep::expr(Expression::Proud, 800).with_body(BodyAnimation::Reform),
                ]));
            }
            Command::MeltDown => {
                if prior.interacting {
                    return;
                }
                self.run_sequence(InteractionSequence::new(vec![
                    SeqStep::expr(Expression::Tired, 3_000).with_body(BodyAnimation::MeltDown),
                    SeqStep::expr(Expression::Neutral, 800).with_body(BodyAnimation::Reform),
                ]));
            }
            Command::SplitClone => {
                if prior.interacting {
                    return;
                }
                self.run_sequence(InteractionSequence::new(vec![
                    SeqStep::expr(Expression::Excited, 1_000).with_body(BodyAnimation::JumpSplit),
                    SeqStep::hold(3_800).clearing_body().hidden(),
                    SeqStep::expr(Expression::Proud, 800)
                        .with_body(BodyAnimation::Reform)
                        .shown(),
                ]));
            }
            Command::StickToWall => {
                let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                self.state.pose.x = (self.config.viewport_w / 2.0 - 100.0) * side;
                self.state.pose.rotation = side * 20.0;
                self.pulse();
            }
            Command::OozeCannon => {
                if prior.interacting {
                    return;
                }
                self.state.interacting = true;
                self.cue(SoundCue::SendMessage);
                self.schedule(TimerAction::PulseEnd, 1_000);
            }
            Command::TransparentMode => {
                self.state.interacting = true;
                self.state.transparent = true;
                self.schedule(TimerAction::ToggleEnd, 3_000);
            }
            Command::GlowMode => {
                self.state.interacting = true;
                self.state.glowing = true;
                self.schedule(TimerAction::ToggleEnd, 4_000);
            }
        }
    }

    /// Kick the wander loop off with an immediate first step.
    fn wander_now(&mut self) {
        self.schedule(TimerAction::ExploreStep, 0);
    }
}
