use super::event::SoundCue;
use super::state::{BodyAnimation, Expression, SpecialEffect};
use super::timers::BodyChange;

/// One step of a scripted interaction: what to apply, and how long to
/// hold it before the next step (or completion) takes over.
#[derive(Debug, Clone)]
pub struct SeqStep {
    pub duration_ms: u64,
    pub expression: Option<Expression>,
    pub body: BodyChange,
    pub visible: Option<bool>,
}

impl SeqStep {
    pub fn expr(expression: Expression, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            expression: Some(expression),
            body: BodyChange::Keep,
            visible: None,
        }
    }

    /// A step that changes nothing by itself; useful as a timed pause
    /// or combined with the body/visibility builders.
    pub fn hold(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            expression: None,
            body: BodyChange::Keep,
            visible: None,
        }
    }

    pub fn with_body(mut self, body: BodyAnimation) -> Self {
        self.body = BodyChange::Set(body);
        self
    }

    pub fn clearing_body(mut self) -> Self {
        self.body = BodyChange::Clear;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }

    pub fn shown(mut self) -> Self {
        self.visible = Some(true);
        self
    }
}

/// Ordered, timed script of expression/body changes. Lives only while
/// scheduled; preempted whole by Stop-All.
#[derive(Debug, Clone)]
pub struct InteractionSequence {
    pub steps: Vec<SeqStep>,
    pub sound: Option<SoundCue>,
    pub effect: Option<SpecialEffect>,
}

impl InteractionSequence {
    pub fn new(steps: Vec<SeqStep>) -> Self {
        Self { steps, sound: None, effect: None }
    }

    pub fn single(expression: Expression, duration_ms: u64) -> Self {
        Self::new(vec![SeqStep::expr(expression, duration_ms)])
    }

    pub fn with_sound(mut self, sound: SoundCue) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn with_effect(mut self, effect: SpecialEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn total_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_ms).sum()
    }
}
