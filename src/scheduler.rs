use std::time::{Duration, Instant};

use tracing::info;

use crate::agent::FocusAgent;
use crate::types::{FrameObservation, TickOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_frames: u64,
    pub deadline_misses: u64,
    pub worst_case: Duration,
}

/// Paces the frame loop at a fixed rate and keeps tick-time metrics.
pub struct Scheduler {
    agent: FocusAgent,
    frame_budget: Duration,
    deadline_misses: u64,
    worst_case: Duration,
    total_frames: u64,
}

impl Scheduler {
    pub fn new(agent: FocusAgent, fps: u32) -> Self {
        let frame_budget = Duration::from_millis(1000 / fps.max(1) as u64);

        Self {
            agent,
            frame_budget,
            deadline_misses: 0,
            worst_case: Duration::ZERO,
            total_frames: 0,
        }
    }

    pub fn agent(&self) -> &FocusAgent {
        &self.agent
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            total_frames: self.total_frames,
            deadline_misses: self.deadline_misses,
            worst_case: self.worst_case,
        }
    }

    pub fn tick(&mut self, frame: &FrameObservation, now: Instant) -> TickOutput {
        let start = Instant::now();

        let output = self.agent.tick(frame, now);

        let elapsed = start.elapsed();

        if elapsed > self.frame_budget {
            self.deadline_misses += 1;
        }

        if elapsed > self.worst_case {
            self.worst_case = elapsed;
        }

        self.total_frames += 1;
        output
    }

    /// Drives the agent until the frame source runs dry, then shuts it down.
    pub fn run<F, R>(&mut self, mut frame_source: F, mut render: R) -> SchedulerStats
    where
        F: FnMut() -> Option<FrameObservation>,
        R: FnMut(&TickOutput),
    {
        loop {
            let cycle_start = Instant::now();

            let Some(frame) = frame_source() else {
                break;
            };
            let output = self.tick(&frame, Instant::now());
            render(&output);

            let elapsed = cycle_start.elapsed();

            if elapsed < self.frame_budget {
                std::thread::sleep(self.frame_budget - elapsed);
            }
        }

        self.agent.shutdown();

        let stats = self.stats();
        info!(
            frames = stats.total_frames,
            deadline_misses = stats.deadline_misses,
            worst_case_us = stats.worst_case.as_micros() as u64,
            "Frame loop finished"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardianConfig;
    use crate::countermeasure::{Launcher, ProcessLauncher};
    use crate::feed::FrameFeed;
    use crate::types::{AttentionState, BoundingBox};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct TerminateCounter(Arc<parking_lot::Mutex<u32>>);

    impl Launcher for TerminateCounter {
        type Handle = ();

        fn launch(&mut self, _media: &Path) -> crate::error::Result<()> {
            Ok(())
        }

        fn terminate(&mut self, _handle: ()) -> crate::error::Result<()> {
            *self.0.lock() += 1;
            Ok(())
        }
    }

    fn agent() -> FocusAgent {
        let mut config = GuardianConfig::default();
        config.countermeasure.media_path = "/nonexistent/media.mp4".into();
        FocusAgent::new(&config, ProcessLauncher::new("vlc", vec![], false)).unwrap()
    }

    #[test]
    fn tick_updates_metrics() {
        let mut scheduler = Scheduler::new(agent(), 30);

        scheduler.tick(&FrameObservation::default(), Instant::now());

        assert_eq!(scheduler.total_frames, 1);
        assert_eq!(scheduler.deadline_misses, 0);
    }

    #[test]
    fn run_stops_when_source_ends() {
        let mut scheduler = Scheduler::new(agent(), 200);
        let mut frames = vec![
            FrameObservation {
                faces: vec![BoundingBox::new(200, 300, 90, 100)],
                eyes: vec![],
                frame_height: 480,
            };
            3
        ]
        .into_iter();
        let mut rendered = Vec::new();

        let stats = scheduler.run(|| frames.next(), |out| rendered.push(out.state));

        assert_eq!(stats.total_frames, 3);
        assert_eq!(rendered.len(), 3);
        assert!(rendered
            .iter()
            .all(|s| matches!(s, AttentionState::Drifting { .. })));
        assert!(!scheduler.agent().countermeasure_active());
    }

    #[test]
    fn interrupt_during_lost_stops_countermeasure() {
        let media = tempfile::NamedTempFile::new().unwrap();
        let mut config = GuardianConfig::default();
        config.attention.delay_secs = 0.0;
        config.countermeasure.media_path = media.path().to_path_buf();
        let launcher = TerminateCounter::default();
        let terminated = launcher.0.clone();
        let agent = FocusAgent::new(&config, launcher).unwrap();
        let mut scheduler = Scheduler::new(agent, 200);

        let line = "{\"faces\": [[200, 300, 90, 100]], \"frame_height\": 480}\n";
        let stop = Arc::new(AtomicBool::new(false));
        let mut feed = FrameFeed::spawn(Cursor::new(line.repeat(50)), stop.clone());

        let stats = scheduler.run(
            || feed.next_frame(),
            |out| {
                if out.state.is_lost() {
                    stop.store(true, Ordering::SeqCst);
                }
            },
        );

        assert_eq!(stats.total_frames, 1);
        assert!(!scheduler.agent().countermeasure_active());
        assert_eq!(*terminated.lock(), 1);
    }
}
