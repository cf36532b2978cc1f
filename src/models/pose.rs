// Data models for body landmarks produced by the pose estimator

use crate::models::posture::EvaluationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==============================================================================
// Body Landmarks (33 keypoints)
// ==============================================================================

/// MediaPipe Pose Landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    /// Number of landmarks in the full pose model
    pub const COUNT: usize = 33;

    /// All landmarks in model index order
    pub const ALL: [BodyLandmark; Self::COUNT] = [
        BodyLandmark::Nose,
        BodyLandmark::LeftEyeInner,
        BodyLandmark::LeftEye,
        BodyLandmark::LeftEyeOuter,
        BodyLandmark::RightEyeInner,
        BodyLandmark::RightEye,
        BodyLandmark::RightEyeOuter,
        BodyLandmark::LeftEar,
        BodyLandmark::RightEar,
        BodyLandmark::MouthLeft,
        BodyLandmark::MouthRight,
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftElbow,
        BodyLandmark::RightElbow,
        BodyLandmark::LeftWrist,
        BodyLandmark::RightWrist,
        BodyLandmark::LeftPinky,
        BodyLandmark::RightPinky,
        BodyLandmark::LeftIndex,
        BodyLandmark::RightIndex,
        BodyLandmark::LeftThumb,
        BodyLandmark::RightThumb,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftKnee,
        BodyLandmark::RightKnee,
        BodyLandmark::LeftAnkle,
        BodyLandmark::RightAnkle,
        BodyLandmark::LeftHeel,
        BodyLandmark::RightHeel,
        BodyLandmark::LeftFootIndex,
        BodyLandmark::RightFootIndex,
    ];

    /// Landmarks the posture heuristics cannot run without
    pub const REQUIRED_FOR_POSTURE: [BodyLandmark; 7] = [
        BodyLandmark::Nose,
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftEar,
        BodyLandmark::RightEar,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            BodyLandmark::Nose => "nose",
            BodyLandmark::LeftEyeInner => "left_eye_inner",
            BodyLandmark::LeftEye => "left_eye",
            BodyLandmark::LeftEyeOuter => "left_eye_outer",
            BodyLandmark::RightEyeInner => "right_eye_inner",
            BodyLandmark::RightEye => "right_eye",
            BodyLandmark::RightEyeOuter => "right_eye_outer",
            BodyLandmark::LeftEar => "left_ear",
            BodyLandmark::RightEar => "right_ear",
            BodyLandmark::MouthLeft => "mouth_left",
            BodyLandmark::MouthRight => "mouth_right",
            BodyLandmark::LeftShoulder => "left_shoulder",
            BodyLandmark::RightShoulder => "right_shoulder",
            BodyLandmark::LeftElbow => "left_elbow",
            BodyLandmark::RightElbow => "right_elbow",
            BodyLandmark::LeftWrist => "left_wrist",
            BodyLandmark::RightWrist => "right_wrist",
            BodyLandmark::LeftPinky => "left_pinky",
            BodyLandmark::RightPinky => "right_pinky",
            BodyLandmark::LeftIndex => "left_index",
            BodyLandmark::RightIndex => "right_index",
            BodyLandmark::LeftThumb => "left_thumb",
            BodyLandmark::RightThumb => "right_thumb",
            BodyLandmark::LeftHip => "left_hip",
            BodyLandmark::RightHip => "right_hip",
            BodyLandmark::LeftKnee => "left_knee",
            BodyLandmark::RightKnee => "right_knee",
            BodyLandmark::LeftAnkle => "left_ankle",
            BodyLandmark::RightAnkle => "right_ankle",
            BodyLandmark::LeftHeel => "left_heel",
            BodyLandmark::RightHeel => "right_heel",
            BodyLandmark::LeftFootIndex => "left_foot_index",
            BodyLandmark::RightFootIndex => "right_foot_index",
        }
    }
}

// ==============================================================================
// Landmark
// ==============================================================================

/// A detected keypoint with visibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1], grows downward
    #[serde(default)]
    pub z: Option<f32>, // Depth relative to the hip midpoint, when the model provides it
    pub visibility: f32, // Visibility confidence [0, 1]
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }
}

// ==============================================================================
// Landmark Set
// ==============================================================================

/// All landmarks detected for one frame, keyed by body part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    landmarks: HashMap<BodyLandmark, Landmark>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from model output in MediaPipe index order.
    /// Entries past the last known landmark are ignored.
    pub fn from_indexed(landmarks: &[Landmark]) -> Self {
        let landmarks = landmarks
            .iter()
            .enumerate()
            .filter_map(|(index, landmark)| {
                BodyLandmark::from_index(index).map(|part| (part, *landmark))
            })
            .collect();

        Self { landmarks }
    }

    pub fn insert(&mut self, part: BodyLandmark, landmark: Landmark) -> Option<Landmark> {
        self.landmarks.insert(part, landmark)
    }

    pub fn remove(&mut self, part: BodyLandmark) -> Option<Landmark> {
        self.landmarks.remove(&part)
    }

    /// Typed lookup; a missing part is reported instead of defaulted
    pub fn get(&self, part: BodyLandmark) -> Result<&Landmark, EvaluationError> {
        self.landmarks
            .get(&part)
            .ok_or(EvaluationError::LandmarksIncomplete(part))
    }

    pub fn contains(&self, part: BodyLandmark) -> bool {
        self.landmarks.contains_key(&part)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Count landmarks whose visibility is strictly above `threshold`
    pub fn visible_count(&self, threshold: f32) -> usize {
        self.landmarks
            .values()
            .filter(|landmark| landmark.is_visible(threshold))
            .count()
    }
}

impl FromIterator<(BodyLandmark, Landmark)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (BodyLandmark, Landmark)>>(iter: I) -> Self {
        Self {
            landmarks: iter.into_iter().collect(),
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Pose estimator not initialized")]
    NotInitialized,

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Not supported by this build")]
    NotSupported,
}

pub type PoseResult<T> = Result<T, PoseError>;
