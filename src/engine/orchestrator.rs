use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::event::{Event, InputEvent, SideEffect, SoundCue};
use super::sequence::InteractionSequence;
use super::state::{AgentState, Expression, Role};
use super::time::{Tick, TICK_MS};
use super::timers::{BodyChange, TimerAction, TimerQueue};
use crate::config::EngineConfig;
use crate::services::responder::{expression_for_tag, AiReply, Responder, ResponderError};

const WELCOME_MESSAGE: &str = "Hi there! I'm Aros, your new AI friend.";
const INACTIVITY_PROMPT: &str = "Are you still there?";
const APOLOGY_MESSAGE: &str = "Oops, something went wrong. I can't seem to think right now.";


/// What to do when a timed message expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageEnd {
    /// Hide the message only.
    Clear,
    /// Hide and re-arm the inactivity detector.
    Rearm,
    /// Hide, restore Neutral, re-arm the inactivity detector.
    Revert,
}

/// The orchestration engine. Owns the one `AgentState` for the session
/// and every pending deadline; driven by `tick_step`, which must never
/// await. Mutual exclusion between activities is the Stop-All protocol:
/// bump the generation, establish new state.
pub struct Engine {
    pub state: AgentState,
    pub receiver: mpsc::Receiver<Event>,
    pub(crate) config: EngineConfig,
    tick: Tick,
    generation: u64,
    timers: TimerQueue,
    inactivity_deadline: Option<Tick>,
    message_deadline: Option<(Tick, MessageEnd)>,
    pub(crate) rng: SmallRng,
    tx: mpsc::Sender<Event>,
    responder: Option<Responder>,
    /// User text of the in-flight remote round-trip, appended to the
    /// history together with the reply once it lands.
    pending_prompt: Option<String>,
    effects: Vec<SideEffect>,
}

impl Engine {
    pub fn new(config: EngineConfig, receiver: mpsc::Receiver<Event>, tx: mpsc::Sender<Event>) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            state: AgentState::new(),
            receiver,
            config,
            tick: Tick::new(),
            generation: 0,
            timers: TimerQueue::new(),
            inactivity_deadline: None,
            message_deadline: None,
            rng,
            tx,
            responder: None,
            pending_prompt: None,
            effects: Vec::new(),
        }
    }

    /// Wire up the remote responder. Without one, unmatched messages
    /// still flip the loading flag and wait for an injected result.
    pub fn attach_responder(&mut self) {
        self.responder = Some(Responder::new(
            self.config.responder.base_url.clone(),
            self.config.responder.timeout_ms,
            self.tx.clone(),
        ));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// One step of the engine: advance the logical tick, apply queued
    /// events, fire due deadlines, and hand back the side effects for
    /// the driver to execute. MUST NOT await.
    pub fn tick_step(&mut self, events: Vec<Event>) -> Vec<SideEffect> {
        self.tick = self.tick.next();

        for event in events {
            match event {
                Event::Input(input) => self.handle_input(input),
                Event::ResponderResult { generation, result } => {
                    self.apply_responder_result(generation, result);
                }
            }
        }

        let due = self.timers.drain_due(self.tick, self.generation);
        for entry in due {
            // An earlier firing in this batch may have stopped
            // everything; re-validate before applying.
            if entry.live_under(self.generation) {
                self.fire(entry.action);
            }
        }

        if let Some((due, end)) = self.message_deadline {
            if due <= self.tick {
                self.message_deadline = None;
                self.state.message = None;
                match end {
                    MessageEnd::Clear => {}
                    MessageEnd::Rearm => self.reset_inactivity(),
                    MessageEnd::Revert => {
                        self.state.expression = Expression::Neutral;
                        self.reset_inactivity();
                    }
                }
            }
        }

        if let Some(due) = self.inactivity_deadline {
            if due <= self.tick {
                self.inactivity_deadline = None;
                // Guards are re-validated at fire time: a flag raised
                // after arming silently swallows the deadline.
                if !self.inactivity_suppressed() {
                    self.state.expression = Expression::Sad;
                    self.show_message(INACTIVITY_PROMPT, None);
                }
            }
        }

        std::mem::take(&mut self.effects)
    }

    fn handle_input(&mut self, input: InputEvent) {
        use super::event::InputContent::*;
        match input.content {
            StartSession => self.start_session(),
            Message(text) => self.handle_message(&text),
            Emote(emote) => self.handle_emote(emote),
            MenuShowGallery => self.show_gallery(),
            MenuShowGames => self.show_games(),
            MenuTakePhoto => {
                self.try_dispatch("take a photo");
            }
            MenuSleep => self.handle_sleep(false),
            MenuFeed(food) => self.handle_feed(food),
            VariantSelected(variant) => {
                self.cue(SoundCue::Click);
                self.state.variant = variant;
            }
            BodyTapped => self.handle_body_tap(),
            PointerMoved { x, y } => self.handle_pointer(x, y),
            ViewClosed => self.handle_view_closed(),
            GameStarted => self.state.in_game_mode = true,
            GameWon => self.handle_game_win(),
            PhotoCaptured(id) => self.state.gallery.push(id),
        }
    }

    // --- Stop-All coordinator ------------------------------------------

    /// The only synchronization primitive: invalidate every
    /// generation-tagged deadline and clear the transient activity
    /// state. Idempotent; called at the start of every mode transition.
    pub fn stop_all(&mut self) {
        self.generation += 1;
        self.timers.purge_stale(self.generation);

        self.state.exploring = false;

        if self.state.following {
            self.state.following = false;
            if self.state.expression == Expression::Focused {
                self.state.expression = Expression::Neutral;
            }
        }

        self.state.charging = false;
        self.state.interacting = false;
        self.state.body_animation = None;
        self.state.special_effect = None;
        self.state.transparent = false;
        self.state.glowing = false;
        self.state.body_visible = true;

        self.reset_inactivity();
    }

    // --- Inactivity detector -------------------------------------------

    fn inactivity_suppressed(&self) -> bool {
        !self.state.session_active
            || self.state.expression == Expression::Sleeping
            || self.state.interacting
            || self.state.loading_remote_response
            || self.state.exploring
            || self.state.following
            || self.state.charging
    }

    /// Re-arm the quiet-period deadline; suppressed states disarm it.
    pub fn reset_inactivity(&mut self) {
        self.inactivity_deadline = None;
        if self.inactivity_suppressed() {
            return;
        }
        self.inactivity_deadline = Some(self.tick.after_ms(self.config.inactivity_ms));
    }

    pub(crate) fn disarm_inactivity(&mut self) {
        self.inactivity_deadline = None;
    }

    // --- Messages ------------------------------------------------------

    pub(crate) fn show_message(&mut self, text: impl Into<String>, expiry: Option<(u64, MessageEnd)>) {
        self.state.message = Some(text.into());
        self.message_deadline = expiry.map(|(ms, end)| (self.tick.after_ms(ms), end));
    }

    /// Hiding a message also forgets its expiry so the old deadline can
    /// never fire against whatever replaces it.
    pub(crate) fn clear_message(&mut self) {
        self.state.message = None;
        self.message_deadline = None;
    }

    // --- Scheduling ----------------------------------------------------

    /// Schedule under the current generation; dies with the next Stop-All.
    pub(crate) fn schedule(&mut self, action: TimerAction, after_ms: u64) {
        self.timers
            .schedule(self.tick.after_ms(after_ms), Some(self.generation), action);
    }

    /// Schedule outside the generation protocol. Reserved for the drain
    /// cadence, the welcome one-shot, and the forced sleep fall.
    pub(crate) fn schedule_ungated(&mut self, action: TimerAction, after_ms: u64) {
        self.timers.schedule(self.tick.after_ms(after_ms), None, action);
    }

    pub(crate) fn cue(&mut self, cue: SoundCue) {
        self.effects.push(SideEffect::Sound(cue));
    }

    // --- Timed-sequence scheduler --------------------------------------

    /// Run a scripted interaction to completion or preemption. At most
    /// one sequence has live deadlines, because this stops everything
    /// first.
    pub fn run_sequence(&mut self, sequence: InteractionSequence) {
        if self.state.loading_remote_response || !self.state.session_active {
            return;
        }
        self.stop_all();
        self.state.interacting = true;
        self.clear_message();
        if let Some(sound) = sequence.sound {
            self.cue(sound);
        }
        if let Some(effect) = sequence.effect {
            self.state.special_effect = Some(effect);
        }

        let mut offset_ms = 0;
        for step in &sequence.steps {
            self.schedule(
                TimerAction::SequenceStep {
                    expression: step.expression,
                    body: step.body.clone(),
                    visible: step.visible,
                },
                offset_ms,
            );
            offset_ms += step.duration_ms;
        }
        self.schedule(TimerAction::SequenceDone, offset_ms);
    }

    /// Single-shot body animation with one completion deadline.
    pub fn play_animation(
        &mut self,
        tag: super::state::BodyAnimation,
        duration_ms: u64,
        expression: Option<Expression>,
    ) {
        if self.state.loading_remote_response || !self.state.session_active {
            return;
        }
        self.stop_all();
        self.state.interacting = true;
        if let Some(expr) = expression {
            self.state.expression = expr;
        }
        self.state.body_animation = Some(tag);
        self.schedule(TimerAction::SequenceDone, duration_ms);
    }

    // --- Timer firing ---------------------------------------------------

    fn fire(&mut self, action: TimerAction) {
        match action {
            TimerAction::Welcome => {
                // Fires once, and only into an idle agent: whatever the
                // user started in the first second wins over the greeting.
                let idle = !self.state.interacting
                    && !self.state.loading_remote_response
                    && self.state.expression != Expression::Sleeping
                    && self.state.message.is_none();
                if self.state.session_active && !self.state.has_welcomed && idle {
                    self.state.has_welcomed = true;
                    self.state.expression = Expression::Smile;
                    self.show_message(
                        WELCOME_MESSAGE,
                        Some((self.config.welcome_message_ms, MessageEnd::Revert)),
                    );
                }
            }
            TimerAction::SequenceStep { expression, body, visible } => {
                if let Some(expr) = expression {
                    self.state.expression = expr;
                }
                match body {
                    BodyChange::Keep => {}
                    BodyChange::Clear => self.state.body_animation = None,
                    BodyChange::Set(tag) => self.state.body_animation = Some(tag),
                }
                if let Some(v) = visible {
                    self.state.body_visible = v;
                }
            }
            TimerAction::SequenceDone => {
                self.state.expression = Expression::Neutral;
                self.state.interacting = false;
                self.state.special_effect = None;
                self.state.body_animation = None;
                self.state.body_visible = true;
                self.reset_inactivity();
            }
            TimerAction::PulseEnd => {
                self.state.interacting = false;
                self.reset_inactivity();
            }
            TimerAction::EmoteRevert => {
                self.clear_message();
                self.state.expression = Expression::Neutral;
                self.reset_inactivity();
            }
            TimerAction::ExploreStep => self.explore_step(),
            TimerAction::ChargeTick => self.charge_tick(),
            TimerAction::DrainTick => self.drain_tick(),
            TimerAction::SleepFall => {
                self.cue(SoundCue::Sleep);
                self.state.expression = Expression::Sleeping;
            }
            TimerAction::CircleStep { angle } => self.circle_step(angle),
            TimerAction::ZigzagStep { step } => self.zigzag_step(step),
            TimerAction::PeekSlide { x } => self.state.pose.x = x,
            TimerAction::JumpScareEnd { z } => {
                self.state.pose.z = z;
                self.state.expression = Expression::Playful;
                self.state.interacting = false;
            }
            TimerAction::ToggleEnd => {
                self.state.transparent = false;
                self.state.glowing = false;
                self.state.interacting = false;
            }
        }
    }

    // --- Activity timers ------------------------------------------------

    /// Battery drain cadence. Survives Stop-All; every guard is
    /// re-checked at fire time.
    fn drain_tick(&mut self) {
        if !self.state.session_active {
            return;
        }
        self.schedule_ungated(TimerAction::DrainTick, self.config.drain_period_ms);

        if self.state.expression == Expression::Sleeping || self.state.charging {
            return;
        }

        let amount = if self.state.exploring || self.state.following {
            self.config.drain_active
        } else {
            self.config.drain_idle
        };
        let level = (self.state.battery_level as i32 - amount).max(0);
        self.state.set_battery(level);

        if level == 0 {
            // Battery exhaustion forces sleep, even over a running
            // sequence or an in-flight remote response.
            self.handle_sleep(true);
        } else if level <= self.config.low_battery as i32
            && self.state.expression != Expression::Tired
        {
            self.state.expression = Expression::Tired;
        }
    }

    /// One self-rescheduling wander step. Reads the live `exploring`
    /// flag at fire time; a stale step is a silent no-op.
    fn explore_step(&mut self) {
        if !self.state.exploring {
            return;
        }

        let roll: f64 = self.rng.gen();
        let mut delay_ms = self
            .rng
            .gen_range(self.config.explore_min_ms..=self.config.explore_max_ms);

        if roll < self.config.explore_move_p {
            self.state.expression = if self.rng.gen_bool(0.5) {
                Expression::Confuse
            } else {
                Expression::Playful
            };

            let bound = self.config.x_boundary(self.state.pose.z);
            let direction: f64 = self.rng.gen();
            let pose = &mut self.state.pose;
            if direction < 0.25 && pose.z < 1.0 {
                pose.z += self.config.z_step;
            } else if direction < 0.5 && pose.z > -1.5 {
                pose.z -= self.config.z_step;
            } else if direction < 0.75 && pose.x > -bound {
                pose.x -= self.config.x_step;
            } else if pose.x < bound {
                pose.x += self.config.x_step;
            }
        } else {
            self.state.expression = if self.rng.gen_bool(0.5) {
                Expression::Confuse
            } else {
                Expression::Smile
            };
            delay_ms = self.config.explore_emote_ms;
        }

        self.schedule(TimerAction::ExploreStep, delay_ms);
    }

    /// Charge loop tick plus the full-battery watcher.
    fn charge_tick(&mut self) {
        if !self.state.charging {
            return;
        }
        self.state.raise_battery(self.config.charge_step);

        if self.state.battery_level >= 100 {
            self.state.charging = false;
            self.state.interacting = false;
            self.run_sequence(
                InteractionSequence::single(Expression::Excited, 2_500)
                    .with_sound(SoundCue::PowerUp),
            );
            self.show_message(
                "I'm fully charged! Let's play!",
                Some((4_000, MessageEnd::Rearm)),
            );
        } else {
            self.schedule(TimerAction::ChargeTick, self.config.charge_period_ms);
        }
    }

    fn circle_step(&mut self, angle: f32) {
        let angle = angle + 5.0;
        let radians = angle.to_radians();
        self.state.pose.x = radians.cos() * 150.0;
        self.state.pose.z = radians.sin() * 0.5 - 0.5;
        self.state.pose.rotation += 5.0;
        if angle >= 360.0 {
            self.state.interacting = false;
            self.state.reset_pose();
        } else {
            self.schedule(TimerAction::CircleStep { angle }, 50);
        }
    }

    fn zigzag_step(&mut self, step: u32) {
        let step = step + 1;
        let direction = if step % 2 == 0 { -1.0 } else { 1.0 };
        self.state.pose.x += self.config.x_step * direction;
        self.state.pose.z = (self.state.pose.z + self.config.z_step / 2.0).min(1.0);
        if step > 5 {
            self.state.interacting = false;
        } else {
            self.schedule(TimerAction::ZigzagStep { step }, 400);
        }
    }

    // --- Remote responder -----------------------------------------------

    pub(crate) fn dispatch_remote(&mut self, text: &str) {
        self.pending_prompt = Some(text.to_string());
        let generation = self.generation;
        if let Some(responder) = &self.responder {
            responder.dispatch(generation, text.to_string(), self.state.history.clone());
        } else {
            debug!("no responder attached; awaiting injected result");
        }
    }

    fn apply_responder_result(&mut self, generation: u64, result: Result<AiReply, ResponderError>) {
        self.state.loading_remote_response = false;
        let prompt = self.pending_prompt.take();

        if generation != self.generation {
            warn!("discarding stale responder result");
            return;
        }

        match result {
            Ok(reply) => {
                self.cue(SoundCue::ReceiveMessage);
                if let Some(prompt) = prompt {
                    self.state.push_turn(Role::User, prompt);
                }
                self.state.push_turn(Role::Model, reply.message.clone());
                self.state.expression = expression_for_tag(&reply.expression);
                let hold_ms = 8_000 + 50 * reply.message.chars().count() as u64;
                self.show_message(reply.message, Some((hold_ms, MessageEnd::Revert)));
            }
            Err(_) => {
                self.cue(SoundCue::Error);
                self.state.expression = Expression::Sad;
                self.show_message(APOLOGY_MESSAGE, Some((8_000, MessageEnd::Revert)));
            }
        }
    }

    // --- Wake / sleep ----------------------------------------------------

    /// `forced` is the battery-zero path: it ignores the loading guard
    /// and its fall deadline survives Stop-All.
    pub fn handle_sleep(&mut self, forced: bool) {
        if !self.state.session_active || self.state.expression == Expression::Sleeping {
            return;
        }
        if !forced && self.state.loading_remote_response {
            return;
        }
        self.stop_all();
        self.state.interacting = true;
        self.clear_message();
        self.disarm_inactivity();
        self.cue(SoundCue::TiredSigh);
        self.state.expression = Expression::Tired;
        self.schedule_ungated(TimerAction::SleepFall, self.config.sleep_fall_ms);
    }

    pub(crate) fn wake_up(&mut self) {
        self.cue(SoundCue::PowerUp);
        self.state.expression = Expression::Smile;
        let level = self.state.battery_level.max(20);
        self.state.battery_level = level;
        let message = match self.rng.gen_range(0..3) {
            0 => "I had a great nap!".to_string(),
            1 => format!("I feel refreshed! Battery is at {level}%."),
            _ => "I'm back!".to_string(),
        };
        self.show_message(message, Some((4_000, MessageEnd::Revert)));
        self.state.interacting = false;
    }

    // --- Driver -----------------------------------------------------------

    /// Embedded async driver: cadence-driven stepping, snapshots
    /// published for the renderer, cues logged. A custom driver can
    /// instead own the loop and call `tick_step` itself.
    pub async fn run(mut self, render_tx: watch::Sender<AgentState>, shutdown: CancellationToken) {
        info!("engine loop started, tick {}ms", TICK_MS);
        let mut cadence = tokio::time::interval(Duration::from_millis(TICK_MS));
        cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("engine loop stopped");
                    return;
                }
                _ = cadence.tick() => {}
            }

            let mut events = Vec::new();
            while let Ok(event) = self.receiver.try_recv() {
                events.push(event);
            }

            for effect in self.tick_step(events) {
                match effect {
                    SideEffect::Sound(cue) => info!(cue = cue.name(), "sound cue"),
                }
            }

            let _ = render_tx.send(self.state.clone());
        }
    }
}
