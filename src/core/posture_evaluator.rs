// Posture heuristics - maps one frame's landmarks to posture issues

use crate::core::config::PostureThresholds;
use crate::models::pose::{BodyLandmark, Landmark, LandmarkSet};
use crate::models::posture::{EvaluationError, PostureIssue, ShoulderSide};

/// The landmarks the rules read, resolved and checked up front
struct RequiredLandmarks {
    left_shoulder: Landmark,
    right_shoulder: Landmark,
    left_hip: Landmark,
    right_hip: Landmark,
    left_ear: Landmark,
    right_ear: Landmark,
}

impl RequiredLandmarks {
    fn resolve(landmarks: &LandmarkSet) -> Result<Self, EvaluationError> {
        // Every required part must be present before any coordinate is checked
        for part in BodyLandmark::REQUIRED_FOR_POSTURE {
            landmarks.get(part)?;
        }

        for part in BodyLandmark::REQUIRED_FOR_POSTURE {
            let landmark = landmarks.get(part)?;
            if !landmark.x.is_finite() || !landmark.y.is_finite() {
                return Err(EvaluationError::NonFiniteCoordinate(part));
            }
        }

        Ok(Self {
            left_shoulder: *landmarks.get(BodyLandmark::LeftShoulder)?,
            right_shoulder: *landmarks.get(BodyLandmark::RightShoulder)?,
            left_hip: *landmarks.get(BodyLandmark::LeftHip)?,
            right_hip: *landmarks.get(BodyLandmark::RightHip)?,
            left_ear: *landmarks.get(BodyLandmark::LeftEar)?,
            right_ear: *landmarks.get(BodyLandmark::RightEar)?,
        })
    }
}

/// Stateless rule set; identical input always gives identical, identically ordered output
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostureEvaluator {
    thresholds: PostureThresholds,
}

impl PostureEvaluator {
    pub fn new(thresholds: PostureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PostureThresholds {
        &self.thresholds
    }

    /// Run the rules in fixed order: forward head, slouch, shoulder level.
    ///
    /// Errors are returned as-is; substituting a synthetic issue is up to the caller.
    pub fn evaluate(&self, landmarks: &LandmarkSet) -> Result<Vec<PostureIssue>, EvaluationError> {
        let points = RequiredLandmarks::resolve(landmarks)?;
        let mut issues = Vec::new();

        let shoulder_mid_x = (points.left_shoulder.x + points.right_shoulder.x) / 2.0;
        let hip_mid_x = (points.left_hip.x + points.right_hip.x) / 2.0;
        let ear_mid_x = (points.left_ear.x + points.right_ear.x) / 2.0;

        if ear_mid_x > shoulder_mid_x + self.thresholds.head_forward {
            issues.push(PostureIssue::neck_forward());
        }

        // Only shoulders ahead of the hips count; the reverse lean is not flagged
        if (shoulder_mid_x - hip_mid_x).abs() > self.thresholds.back_alignment
            && shoulder_mid_x > hip_mid_x
        {
            issues.push(PostureIssue::back_slouch());
        }

        let shoulder_height_diff = (points.left_shoulder.y - points.right_shoulder.y).abs();
        if shoulder_height_diff > self.thresholds.shoulder_level {
            // Smaller y is higher in the image
            let higher = if points.left_shoulder.y < points.right_shoulder.y {
                ShoulderSide::Left
            } else {
                ShoulderSide::Right
            };
            issues.push(PostureIssue::uneven_shoulders(higher));
        }

        Ok(issues)
    }
}
