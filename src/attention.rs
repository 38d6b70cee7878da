use std::time::{Duration, Instant};

use crate::types::AttentionState;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(3500);

/// Start of the current unbroken run of suspect frames.
pub type SuspectWindow = Option<Instant>;

pub struct AttentionStateMachine {
    window: SuspectWindow,
    delay: Duration,
}

impl AttentionStateMachine {
    pub fn new(delay: Duration) -> Self {
        Self {
            window: None,
            delay,
        }
    }

    pub fn window(&self) -> SuspectWindow {
        self.window
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn step(&mut self, verdict: bool, now: Instant) -> AttentionState {
        let (window, state) = transition(self.window, verdict, now, self.delay);
        self.window = window;
        state
    }
}

impl Default for AttentionStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

/// One tick of the debounce. The state is always derived from the window,
/// never stored next to it.
pub fn transition(
    window: SuspectWindow,
    verdict: bool,
    now: Instant,
    delay: Duration,
) -> (SuspectWindow, AttentionState) {
    if !verdict {
        // a single good frame resets the run
        return (None, AttentionState::Focused);
    }

    let since = window.unwrap_or(now);
    let elapsed = now.saturating_duration_since(since);

    if elapsed >= delay {
        (Some(since), AttentionState::Lost)
    } else {
        (
            Some(since),
            AttentionState::Drifting {
                remaining: delay - elapsed,
            },
        )
    }
}
