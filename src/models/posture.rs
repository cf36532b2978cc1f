// Data models for posture issues and per-frame analysis results

use crate::models::capture::{DecodeError, MediaKind};
use crate::models::pose::{BodyLandmark, PoseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==============================================================================
// Posture Issues
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    NeckForward,
    BackSlouch,
    UnevenShoulders,
    AnalysisError,
}

impl IssueType {
    pub fn to_string(&self) -> &'static str {
        match self {
            IssueType::NeckForward => "neck_forward",
            IssueType::BackSlouch => "back_slouch",
            IssueType::UnevenShoulders => "uneven_shoulders",
            IssueType::AnalysisError => "analysis_error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn to_string(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Which shoulder sits higher in the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoulderSide {
    Left,
    Right,
}

impl ShoulderSide {
    pub fn to_string(&self) -> &'static str {
        match self {
            ShoulderSide::Left => "left",
            ShoulderSide::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub message: String,
    pub severity: Severity,
}

impl PostureIssue {
    pub fn neck_forward() -> Self {
        Self {
            issue_type: IssueType::NeckForward,
            message: "Forward head posture detected - align your head over your shoulders"
                .to_string(),
            severity: Severity::Medium,
        }
    }

    pub fn back_slouch() -> Self {
        Self {
            issue_type: IssueType::BackSlouch,
            message: "Slouching detected - straighten your back and engage core".to_string(),
            severity: Severity::High,
        }
    }

    /// `higher` is the shoulder the user should lower
    pub fn uneven_shoulders(higher: ShoulderSide) -> Self {
        Self {
            issue_type: IssueType::UnevenShoulders,
            message: format!(
                "Uneven shoulders detected - lower your {} shoulder",
                higher.to_string()
            ),
            severity: Severity::Low,
        }
    }

    pub fn analysis_error() -> Self {
        Self {
            issue_type: IssueType::AnalysisError,
            message: "Error occurred during posture analysis".to_string(),
            severity: Severity::Low,
        }
    }
}

// ==============================================================================
// Frame Results
// ==============================================================================

/// Result for one sampled video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_number: u64,
    pub timestamp: f64, // Seconds, frame_number / fps
    pub posture_issues: Vec<PostureIssue>,
    pub pose_detected: bool,
}

impl FrameResult {
    pub fn new(frame_number: u64, fps: f64, posture_issues: Vec<PostureIssue>) -> Self {
        Self {
            frame_number,
            timestamp: frame_number as f64 / fps,
            posture_issues,
            pose_detected: true,
        }
    }

    pub fn no_pose(frame_number: u64, fps: f64) -> Self {
        Self {
            frame_number,
            timestamp: frame_number as f64 / fps,
            posture_issues: Vec::new(),
            pose_detected: false,
        }
    }
}

/// Result for a single uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysisResult {
    pub pose_detected: bool,
    pub posture_issues: Vec<PostureIssue>,
    pub confidence_score: f32,
}

impl FrameAnalysisResult {
    pub fn no_pose() -> Self {
        Self {
            pose_detected: false,
            posture_issues: Vec::new(),
            confidence_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub processed_frames: u64,
    pub frames_with_pose: u64,
    pub reported_total_frames: Option<u64>,
    pub fps: f64,
    pub issue_counts: BTreeMap<IssueType, u64>,
}

/// Complete output of a video analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub results: Vec<FrameResult>,
    pub summary: AnalysisSummary,
}

// ==============================================================================
// Error Types
// ==============================================================================

/// Failures of the posture heuristics for a single frame
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Required landmark missing: {}", .0.to_string())]
    LandmarksIncomplete(BodyLandmark),

    #[error("Non-finite coordinate for landmark: {}", .0.to_string())]
    NonFiniteCoordinate(BodyLandmark),
}

/// Whole-request failures
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Could not decode input: {0}")]
    InputDecode(#[from] DecodeError),

    #[error("{} too large: {size} bytes (max {limit} bytes)", .kind.to_string())]
    ResourceLimitExceeded {
        kind: MediaKind,
        size: usize,
        limit: usize,
    },

    #[error("Unsupported media type for {}: {content_type}", .kind.to_string())]
    UnsupportedMediaType {
        kind: MediaKind,
        content_type: String,
    },

    #[error("Pose estimator error: {0}")]
    Estimator(#[from] PoseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Frame {got} arrived after frame {previous}")]
    OutOfOrderFrame { previous: u64, got: u64 },

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serialization_uses_wire_names() {
        let issue = PostureIssue::neck_forward();
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "neck_forward");
        assert_eq!(json["severity"], "medium");
    }

    #[test]
    fn test_uneven_shoulders_message_names_side() {
        let issue = PostureIssue::uneven_shoulders(ShoulderSide::Right);
        assert_eq!(issue.severity, Severity::Low);
        assert!(issue.message.ends_with("lower your right shoulder"));
    }

    #[test]
    fn test_frame_result_timestamp() {
        let result = FrameResult::new(45, 30.0, vec![PostureIssue::back_slouch()]);
        assert!((result.timestamp - 1.5).abs() < 1e-9);
        assert!(result.pose_detected);

        let empty = FrameResult::no_pose(15, 30.0);
        assert!(!empty.pose_detected);
        assert!(empty.posture_issues.is_empty());
    }

    #[test]
    fn test_no_pose_frame_analysis() {
        let result = FrameAnalysisResult::no_pose();
        assert!(!result.pose_detected);
        assert!(result.posture_issues.is_empty());
        assert_eq!(result.confidence_score, 0.0);
    }

    #[test]
    fn test_frame_result_wire_format() {
        let result = FrameResult::no_pose(0, 30.0);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"frame_number\":0"));
        assert!(json.contains("\"posture_issues\":[]"));
        assert!(json.contains("\"pose_detected\":false"));
    }
}
