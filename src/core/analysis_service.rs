// Async request surface over the posture analyzer
// The analyzer owns a single, non-reentrant landmark source; requests are
// serialized through a tokio mutex and run on the blocking thread pool.

use crate::core::analyzer::PostureAnalyzer;
use crate::core::config::AnalysisConfig;
use crate::core::image_decoder::decode_image;
use crate::core::input_guard::validate_upload;
use crate::core::video_source::{default_video_opener, DefaultVideoOpener, VideoOpener};
use crate::models::capture::{MediaKind, Upload};
use crate::models::posture::{
    AnalysisError, AnalysisResult, FrameAnalysisResult, IssueType, VideoAnalysis,
};
use crate::platform::pose::{default_landmark_source, DefaultMediaPipe, LandmarkSource};
use chrono::Utc;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn to_string(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub estimator_status: String,
    pub model_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedFormats {
    pub video: Vec<String>,
    pub image: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub video: usize,
    pub image: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStats {
    pub supported_formats: SupportedFormats,
    /// Bytes
    pub max_file_size: SizeLimits,
    pub frame_stride: usize,
    pub supported_analyses: Vec<IssueType>,
}

/// Static description of what the service accepts and checks
pub fn api_stats(config: &AnalysisConfig) -> ApiStats {
    let extensions = |kind: MediaKind| -> Vec<String> {
        kind.supported_extensions()
            .iter()
            .map(|ext| ext.to_string())
            .collect()
    };

    ApiStats {
        supported_formats: SupportedFormats {
            video: extensions(MediaKind::Video),
            image: extensions(MediaKind::Image),
        },
        max_file_size: SizeLimits {
            video: config.max_video_bytes,
            image: config.max_image_bytes,
        },
        frame_stride: config.frame_stride,
        supported_analyses: vec![
            IssueType::NeckForward,
            IssueType::BackSlouch,
            IssueType::UnevenShoulders,
        ],
    }
}

pub struct PostureService<S: LandmarkSource + 'static, O: VideoOpener + 'static> {
    analyzer: Arc<Mutex<PostureAnalyzer<S>>>,
    opener: Arc<O>,
    config: AnalysisConfig,
}

impl<S: LandmarkSource + 'static, O: VideoOpener + 'static> Clone for PostureService<S, O> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
            opener: Arc::clone(&self.opener),
            config: self.config.clone(),
        }
    }
}

pub type DefaultPostureService = PostureService<DefaultMediaPipe, DefaultVideoOpener>;

impl DefaultPostureService {
    /// Service over the compiled-in estimator and video backend
    pub fn with_defaults(config: AnalysisConfig) -> AnalysisResult<Self> {
        let source = default_landmark_source()?;
        let opener = default_video_opener();
        info!("Pose estimator: {}", source.model_info());
        info!("Video decoder: {}", opener.backend_info());

        Self::new(source, opener, config)
    }
}

impl<S: LandmarkSource + 'static, O: VideoOpener + 'static> PostureService<S, O> {
    pub fn new(source: S, opener: O, config: AnalysisConfig) -> AnalysisResult<Self> {
        let analyzer = PostureAnalyzer::new(source, config.clone())?;

        Ok(Self {
            analyzer: Arc::new(Mutex::new(analyzer)),
            opener: Arc::new(opener),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn api_stats(&self) -> ApiStats {
        api_stats(&self.config)
    }

    /// Analyze every sampled frame of an uploaded video
    pub async fn analyze_video(&self, upload: Upload) -> AnalysisResult<VideoAnalysis> {
        let request_id = Uuid::new_v4();
        info!(
            "[{}] Processing video upload: {} ({} bytes)",
            request_id,
            upload.file_name.as_deref().unwrap_or("<unnamed>"),
            upload.data.len()
        );

        validate_upload(&upload, MediaKind::Video, &self.config)?;

        let analyzer = Arc::clone(&self.analyzer);
        let opener = Arc::clone(&self.opener);

        let analysis = tokio::task::spawn_blocking(move || -> AnalysisResult<VideoAnalysis> {
            let mut video = opener.open(&upload.data)?;
            let mut analyzer = analyzer.blocking_lock();
            Ok(analyzer.analyze_video(&mut *video))
        })
        .await
        .map_err(|e| AnalysisError::TaskFailed(e.to_string()))?;

        match &analysis {
            Ok(analysis) => info!(
                "[{}] Video analysis finished: {} frames analyzed",
                request_id, analysis.summary.processed_frames
            ),
            Err(e) => error!("[{}] Video analysis failed: {}", request_id, e),
        }

        analysis
    }

    /// Analyze a single uploaded image
    pub async fn analyze_frame(&self, upload: Upload) -> AnalysisResult<FrameAnalysisResult> {
        let request_id = Uuid::new_v4();
        info!(
            "[{}] Processing image upload: {} ({} bytes)",
            request_id,
            upload.file_name.as_deref().unwrap_or("<unnamed>"),
            upload.data.len()
        );

        validate_upload(&upload, MediaKind::Image, &self.config)?;

        let analyzer = Arc::clone(&self.analyzer);

        let result = tokio::task::spawn_blocking(move || -> AnalysisResult<FrameAnalysisResult> {
            let frame = decode_image(&upload.data)?;
            let mut analyzer = analyzer.blocking_lock();
            analyzer.analyze_image(&frame)
        })
        .await
        .map_err(|e| AnalysisError::TaskFailed(e.to_string()))?;

        if let Err(e) = &result {
            error!("[{}] Frame analysis failed: {}", request_id, e);
        }

        result
    }

    /// Probe the estimator with a blank frame
    pub async fn health_check(&self) -> HealthStatus {
        let analyzer = Arc::clone(&self.analyzer);

        let probe = tokio::task::spawn_blocking(move || {
            let mut analyzer = analyzer.blocking_lock();
            let model_info = analyzer.source().model_info();
            (model_info, analyzer.probe())
        })
        .await;

        let (model_info, outcome) = match probe {
            Ok((model_info, outcome)) => (model_info, outcome),
            Err(e) => (String::new(), Err(AnalysisError::TaskFailed(e.to_string()))),
        };

        let (status, estimator_status, error) = match outcome {
            Ok(()) => (HealthState::Healthy, "operational".to_string(), None),
            Err(e) => {
                error!("Health check failed: {}", e);
                (HealthState::Unhealthy, "failed".to_string(), Some(e.to_string()))
            }
        };

        HealthStatus {
            status,
            estimator_status,
            model_info,
            error,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
