// Confidence scoring for single-image analysis

use crate::models::pose::{BodyLandmark, LandmarkSet};

/// Scores a detection by the share of visible landmarks.
///
/// The denominator is the size of the full pose model, not the number of
/// landmarks the posture rules read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScorer {
    visibility_threshold: f32,
    full_model_landmark_count: usize,
}

impl ConfidenceScorer {
    pub fn new(visibility_threshold: f32, full_model_landmark_count: usize) -> Self {
        Self {
            visibility_threshold,
            full_model_landmark_count,
        }
    }

    /// `None` means no body was detected, which scores 0.0
    pub fn score(&self, landmarks: Option<&LandmarkSet>) -> f32 {
        let Some(landmarks) = landmarks else {
            return 0.0;
        };

        if self.full_model_landmark_count == 0 {
            return 0.0;
        }

        let visible = landmarks.visible_count(self.visibility_threshold);
        (visible as f32 / self.full_model_landmark_count as f32).min(1.0)
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(0.5, BodyLandmark::COUNT)
    }
}
