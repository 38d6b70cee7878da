use std::time::Instant;

use tracing::info;

use crate::attention::AttentionStateMachine;
use crate::classifier;
use crate::config::GuardianConfig;
use crate::countermeasure::{CountermeasureController, Launcher, ProcessLauncher};
use crate::error::Result;
use crate::types::{AttentionState, FrameObservation, TickOutput};
use crate::warning::WarningRotator;

/// Per-frame entry point: classifier, debounce, countermeasure and warning
/// text, all driven from the caller's thread.
pub struct FocusAgent {
    state: AttentionState,
    machine: AttentionStateMachine,
    controller: CountermeasureController,
    rotator: WarningRotator,
}

impl FocusAgent {
    pub fn new<L: Launcher>(config: &GuardianConfig, launcher: L) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            state: AttentionState::Focused,
            machine: AttentionStateMachine::new(config.delay()?),
            controller: CountermeasureController::spawn(
                launcher,
                config.countermeasure.media_path.clone(),
            ),
            rotator: WarningRotator::new(config.warnings.messages.clone(), config.cooldown()?)?,
        })
    }

    pub fn from_config(config: &GuardianConfig) -> Result<Self> {
        Self::new(config, ProcessLauncher::from_settings(&config.countermeasure))
    }

    pub fn with_parts(
        machine: AttentionStateMachine,
        controller: CountermeasureController,
        rotator: WarningRotator,
    ) -> Self {
        Self {
            state: AttentionState::Focused,
            machine,
            controller,
            rotator,
        }
    }

    pub fn current_state(&self) -> AttentionState {
        self.state
    }

    pub fn countermeasure_active(&self) -> bool {
        self.controller.is_active()
    }

    pub fn tick(&mut self, frame: &FrameObservation, now: Instant) -> TickOutput {
        let verdict = classifier::classify(&frame.faces, &frame.eyes, frame.frame_height);
        let next = self.machine.step(verdict, now);

        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            info!(from = ?self.state, to = ?next, "Attention state changed");
        }

        let action = self.controller.on_state_change(self.state, next);
        self.state = next;

        let message = match next {
            AttentionState::Lost => Some(self.rotator.message(now).to_string()),
            _ => None,
        };

        TickOutput {
            state: next,
            action,
            message,
        }
    }

    /// Force-stops any running countermeasure. Must run before exit.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}
