pub mod core;
pub mod models;
pub mod platform;

pub use core::analysis_service::{api_stats, ApiStats, DefaultPostureService, HealthStatus, PostureService};
pub use core::analyzer::PostureAnalyzer;
pub use core::config::{AnalysisConfig, PostureThresholds};
pub use models::capture::Upload;
pub use models::posture::{AnalysisError, AnalysisResult, FrameAnalysisResult, FrameResult, VideoAnalysis};
