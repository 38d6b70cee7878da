use crate::types::BoundingBox;

pub const SUSPECT_SCORE: u8 = 3;

const FACE_LOW_STRONG: f64 = 0.58;
const FACE_LOW_MILD: f64 = 0.52;
const FLAT_FACE_RATIO: f64 = 1.1;
const EYES_LOW_STRONG: f64 = 0.6;
const EYES_LOW_MILD: f64 = 0.52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriftScore {
    pub face_position: u8,
    pub face_shape: u8,
    pub eyes: u8,
}

impl DriftScore {
    pub fn total(&self) -> u8 {
        self.face_position + self.face_shape + self.eyes
    }

    pub fn is_suspect(&self) -> bool {
        self.total() >= SUSPECT_SCORE
    }
}

/// Scores one face against the frame it was found in.
///
/// Returns `None` for malformed geometry: an empty face box, zero frame
/// height, or coordinates that overflow.
pub fn score(face: &BoundingBox, eyes: &[BoundingBox], frame_height: u32) -> Option<DriftScore> {
    if face.is_degenerate() || frame_height == 0 {
        return None;
    }

    let face_ratio = face.center_y()? as f64 / frame_height as f64;
    let face_position = if face_ratio > FACE_LOW_STRONG {
        2
    } else if face_ratio > FACE_LOW_MILD {
        1
    } else {
        0
    };

    let aspect = face.height as f64 / face.width as f64;
    let face_shape = u8::from(aspect < FLAT_FACE_RATIO);

    let eyes = if eyes.len() >= 2 {
        let centers = eyes
            .iter()
            .map(BoundingBox::center_y)
            .collect::<Option<Vec<u32>>>()?;
        let sum: f64 = centers.iter().map(|&c| c as f64).sum();
        let avg_eye_y = sum / eyes.len() as f64;
        let eye_ratio = (avg_eye_y - face.y as f64) / face.height as f64;

        if eye_ratio > EYES_LOW_STRONG {
            2
        } else if eye_ratio > EYES_LOW_MILD {
            1
        } else {
            0
        }
    } else {
        // closed or occluded eyes
        1
    };

    Some(DriftScore {
        face_position,
        face_shape,
        eyes,
    })
}

/// Binary verdict for one frame: is the subject suspected of looking away?
///
/// Only the first face counts. No face at all yields `false`, so an empty
/// chair reads the same as an attentive subject; that gap is known and kept.
pub fn classify(faces: &[BoundingBox], eyes: &[BoundingBox], frame_height: u32) -> bool {
    let Some(face) = faces.first() else {
        return false;
    };

    match score(face, eyes, frame_height) {
        Some(s) => {
            tracing::debug!(
                face_position = s.face_position,
                face_shape = s.face_shape,
                eyes = s.eyes,
                total = s.total(),
                "drift score"
            );
            s.is_suspect()
        }
        None => false,
    }
}
