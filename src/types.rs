use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates.
///
/// Serialized as a `[x, y, width, height]` array, the shape detectors emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `None` when the box reaches past `u32::MAX`.
    pub fn center_y(&self) -> Option<u32> {
        self.y.checked_add(self.height / 2)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<[u32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [u32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// Raw detector output for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameObservation {
    #[serde(default)]
    pub faces: Vec<BoundingBox>,
    #[serde(default)]
    pub eyes: Vec<BoundingBox>,
    pub frame_height: u32, // pixels
}

impl FrameObservation {
    /// Only the first detected face takes part in the decision.
    pub fn primary_face(&self) -> Option<&BoundingBox> {
        self.faces.first()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttentionState {
    #[default]
    Focused,
    Drifting { remaining: Duration },
    Lost,
}

impl AttentionState {
    pub fn is_focused(&self) -> bool {
        matches!(self, AttentionState::Focused)
    }

    pub fn is_lost(&self) -> bool {
        matches!(self, AttentionState::Lost)
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self {
            AttentionState::Drifting { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

impl fmt::Display for AttentionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttentionState::Focused => write!(f, "Focused — keep going!"),
            AttentionState::Drifting { remaining } => {
                write!(f, "Attention drifting… ({:.1}s)", remaining.as_secs_f64())
            }
            AttentionState::Lost => write!(f, "FOCUS LOST"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountermeasureAction {
    None,
    Started(u64),
    Stopped(u64),
}

/// Everything the orchestrator needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutput {
    pub state: AttentionState,
    pub action: CountermeasureAction,
    pub message: Option<String>,
}

impl TickOutput {
    pub fn remaining(&self) -> Option<Duration> {
        self.state.remaining()
    }

    pub fn status_line(&self) -> String {
        match (&self.state, &self.message) {
            (AttentionState::Lost, Some(msg)) => format!("{}: {}", self.state, msg),
            _ => self.state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_reads_box_arrays() {
        let json = r#"{"faces": [[200, 300, 90, 100]], "eyes": [], "frame_height": 480}"#;

        let obs: FrameObservation = serde_json::from_str(json).unwrap();

        assert_eq!(obs.primary_face(), Some(&BoundingBox::new(200, 300, 90, 100)));
        assert_eq!(obs.primary_face().unwrap().center_y(), Some(350));
        assert!(obs.eyes.is_empty());
    }

    #[test]
    fn missing_detections_default_to_empty() {
        let obs: FrameObservation = serde_json::from_str(r#"{"frame_height": 480}"#).unwrap();

        assert_eq!(obs.primary_face(), None);
    }

    #[test]
    fn drifting_status_shows_remaining_seconds() {
        let out = TickOutput {
            state: AttentionState::Drifting {
                remaining: Duration::from_millis(2140),
            },
            action: CountermeasureAction::None,
            message: None,
        };

        assert_eq!(out.status_line(), "Attention drifting… (2.1s)");
    }

    #[test]
    fn center_of_box_past_u32_range_is_none() {
        let edge = BoundingBox::new(0, u32::MAX - 10, 100, 100);

        assert_eq!(edge.center_y(), None);
        assert_eq!(AttentionState::default(), AttentionState::Focused);
    }
}
