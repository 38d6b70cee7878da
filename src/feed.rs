use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::types::FrameObservation;

const STOP_POLL: Duration = Duration::from_millis(50);

/// JSON-lines frame source. Lines are read on a background thread so a stop
/// request is seen even while the input is idle.
pub struct FrameFeed {
    lines: Receiver<String>,
    stop: Arc<AtomicBool>,
}

impl FrameFeed {
    pub fn spawn<R>(reader: R, stop: Arc<AtomicBool>) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Input closed: {}", e);
                        break;
                    }
                }
            }
        });

        Self { lines: rx, stop }
    }

    /// Next frame, or `None` once input ends or a stop was requested.
    ///
    /// A malformed line yields an empty observation, which reads as focused.
    pub fn next_frame(&mut self) -> Option<FrameObservation> {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return None;
            }

            match self.lines.recv_timeout(STOP_POLL) {
                Ok(line) => return Some(parse_frame(&line)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

fn parse_frame(line: &str) -> FrameObservation {
    match serde_json::from_str::<FrameObservation>(line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Skipping malformed frame: {}", e);
            FrameObservation::default()
        }
    }
}
