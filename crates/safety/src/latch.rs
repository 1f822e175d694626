use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatchState {
    /// No fault condition, dwell timer not running.
    Idle,
    /// Condition active since the stamped instant, not yet held long enough.
    Pending { since: Duration },
    /// Condition held continuously for at least the dwell threshold.
    Latched,
}

/// Debounced fault latch. A transient condition becomes a sustained fault
/// only after holding continuously for the dwell threshold; a single tick of
/// the condition being false clears latch and timer together. The asymmetry
/// is intentional: slow to declare, fast to recover.
#[derive(Clone, Debug)]
pub struct FaultLatch {
    dwell: Duration,
    state: LatchState,
}

impl FaultLatch {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            state: LatchState::Idle,
        }
    }

    /// Advance the latch one tick. `now` is monotonic elapsed time from the
    /// loop's own clock; wall-clock adjustments must not reach it.
    /// Returns whether the latch is engaged after this tick.
    pub fn update(&mut self, condition: bool, now: Duration) -> bool {
        if !condition {
            self.state = LatchState::Idle;
            return false;
        }
        match self.state {
            LatchState::Idle => {
                self.state = LatchState::Pending { since: now };
            }
            LatchState::Pending { since } => {
                if now.saturating_sub(since) >= self.dwell {
                    self.state = LatchState::Latched;
                }
            }
            LatchState::Latched => {}
        }
        self.is_latched()
    }

    pub fn is_latched(&self) -> bool {
        matches!(self.state, LatchState::Latched)
    }

    pub fn state(&self) -> LatchState {
        self.state
    }
}
