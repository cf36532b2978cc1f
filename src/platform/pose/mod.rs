// Pose estimation platform integration
// Provides the MediaPipe bridge that turns frames into landmark sets

pub mod mediapipe_bridge;

pub use mediapipe_bridge::{default_landmark_source, DefaultMediaPipe, LandmarkSource};
