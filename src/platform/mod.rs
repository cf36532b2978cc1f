// Pose estimation backends
pub mod pose;
