use super::state::{BodyAnimation, Expression};
use super::time::Tick;

/// Deferred work, fired by the engine when its deadline tick arrives.
/// Actions carry data, not closures, so a fired entry is always applied
/// against the *current* state.
#[derive(Debug, Clone)]
pub enum TimerAction {
    /// One-shot welcome shortly after session start.
    Welcome,
    /// One step of a running interaction sequence.
    SequenceStep {
        expression: Option<Expression>,
        body: BodyChange,
        visible: Option<bool>,
    },
    /// Completion of a sequence or single-shot animation: restore
    /// Neutral, clear interacting/effect/body tag, re-arm inactivity.
    SequenceDone,
    /// End of a short synthetic interacting pulse around an
    /// instantaneous move.
    PulseEnd,
    /// Revert an emote: clear the message, restore Neutral.
    EmoteRevert,
    /// Self-rescheduling wander step. Re-reads the live `exploring`
    /// flag at fire time.
    ExploreStep,
    /// Charge loop tick. Re-reads the live `charging` flag.
    ChargeTick,
    /// Battery drain cadence. Never generation-tagged: it outlives
    /// Stop-All and re-checks its guards every period.
    DrainTick,
    /// Tired -> Sleeping fall. Never generation-tagged: forced sleep
    /// preempts any running activity.
    SleepFall,
    /// Procedural circling: one 5-degree increment.
    CircleStep { angle: f32 },
    /// Procedural zig-zag: one lateral swing.
    ZigzagStep { step: u32 },
    /// Second half of a peek: slide from offscreen to the peek position.
    PeekSlide { x: f32 },
    /// Restore depth and settle after a jump scare.
    JumpScareEnd { z: f32 },
    /// Turn off a transparency/glow toggle and release interacting.
    ToggleEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyChange {
    Keep,
    Clear,
    Set(BodyAnimation),
}

#[derive(Debug, Clone)]
pub struct TimerEntry {
    pub due: Tick,
    /// `Some(g)`: invalidated once the engine generation moves past `g`.
    /// `None`: survives Stop-All (drain cadence, sleep fall, welcome).
    pub generation: Option<u64>,
    pub action: TimerAction,
    seq: u64,
}

impl TimerEntry {
    pub fn live_under(&self, current_generation: u64) -> bool {
        self.generation.is_none_or(|g| g == current_generation)
    }
}

/// Pending deadline set. Small enough that a Vec plus a sort at drain
/// time beats a heap; entries fire in (due, insertion) order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Tick, generation: Option<u64>, action: TimerAction) {
        self.entries.push(TimerEntry { due, generation, action, seq: self.next_seq });
        self.next_seq += 1;
    }

    /// Remove and return every entry due at or before `now` that is
    /// still valid under `current_generation`, in firing order. Stale
    /// entries are silently dropped. Callers must re-check each entry's
    /// generation right before firing it: an earlier entry in the same
    /// batch may have moved the counter.
    pub fn drain_due(&mut self, now: Tick, current_generation: u64) -> Vec<TimerEntry> {
        let mut due: Vec<TimerEntry> = Vec::new();
        self.entries.retain(|e| {
            if e.due > now {
                return true;
            }
            if e.generation.is_none_or(|g| g == current_generation) {
                due.push(e.clone());
            }
            false
        });
        due.sort_by_key(|e| (e.due, e.seq));
        due
    }

    /// Drop every generation-tagged entry older than the current
    /// generation. Called after Stop-All bumps the counter.
    pub fn purge_stale(&mut self, current_generation: u64) {
        self.entries
            .retain(|e| e.generation.is_none_or(|g| g == current_generation));
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}
