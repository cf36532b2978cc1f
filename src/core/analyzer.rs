use crate::core::aggregator::ResultAggregator;
use crate::core::config::AnalysisConfig;
use crate::core::confidence::ConfidenceScorer;
use crate::core::frame_sampler::{effective_fps, FrameSampler};
use crate::core::posture_evaluator::PostureEvaluator;
use crate::core::video_source::VideoSource;
use crate::models::capture::DecodedFrame;
use crate::models::pose::{LandmarkSet, PoseError};
use crate::models::posture::{
    AnalysisError, AnalysisResult, EvaluationError, FrameAnalysisResult, FrameResult,
    PostureIssue, VideoAnalysis,
};
use crate::platform::pose::LandmarkSource;
use log::{debug, error, info, warn};

// ==============================================================================
// Posture Analyzer
// ==============================================================================

/// Synchronous analysis pipeline. Owns its landmark source for its whole
/// lifetime; frames are detected and evaluated one at a time.
pub struct PostureAnalyzer<S: LandmarkSource> {
    source: S,
    evaluator: PostureEvaluator,
    scorer: ConfidenceScorer,
    sampler: FrameSampler,
    config: AnalysisConfig,
}

impl<S: LandmarkSource> PostureAnalyzer<S> {
    pub fn new(source: S, config: AnalysisConfig) -> AnalysisResult<Self> {
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            source,
            evaluator: PostureEvaluator::new(config.thresholds),
            scorer: ConfidenceScorer::new(
                config.visibility_threshold,
                config.full_model_landmark_count,
            ),
            sampler: FrameSampler::new(config.frame_stride)?,
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Issues for one detected body. A missing landmark gives no issues;
    /// any other evaluation fault replaces the frame's issues with one
    /// synthetic `AnalysisError` issue.
    pub fn issues_for(&self, landmarks: &LandmarkSet) -> Vec<PostureIssue> {
        match self.evaluator.evaluate(landmarks) {
            Ok(issues) => issues,
            Err(e @ EvaluationError::LandmarksIncomplete(_)) => {
                debug!("Skipping posture rules: {}", e);
                Vec::new()
            }
            Err(e @ EvaluationError::NonFiniteCoordinate(_)) => {
                error!("Error in posture analysis: {}", e);
                vec![PostureIssue::analysis_error()]
            }
        }
    }

    /// Analyze every sampled frame of a video. Tracking state starts fresh;
    /// per-frame failures are logged and isolated.
    pub fn analyze_video(&mut self, video: &mut dyn VideoSource) -> VideoAnalysis {
        let metadata = video.metadata();
        let fps = effective_fps(metadata.fps, self.config.default_fps);
        if fps != metadata.fps {
            warn!(
                "Video reported fps {}, using default {}",
                metadata.fps, self.config.default_fps
            );
        }

        if let Err(e) = self.source.reset() {
            warn!("Could not reset pose tracking: {}", e);
        }

        let mut aggregator = ResultAggregator::new(fps, metadata.total_frame_count);
        let sampler = self.sampler;
        let mut frames_read: u64 = 0;

        let frames = std::iter::from_fn(|| match video.next_frame() {
            Ok(Some(frame)) => {
                frames_read += 1;
                Some(frame)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Stopping at frame {}: {}", frames_read, e);
                None
            }
        });

        for (frame_number, frame) in sampler.sample(frames) {
            let result = self.analyze_video_frame(frame_number, fps, &frame);
            // Frame numbers come from the sampler's monotonic counter
            if let Err(e) = aggregator.push(result) {
                error!("Dropping frame result: {}", e);
            }

            let processed = aggregator.processed_frames();
            if processed % self.config.progress_log_interval == 0 {
                info!("Processed {} frames", processed);
            }
        }

        let analysis = aggregator.finish();
        info!(
            "Video analysis completed. Processed {} frames out of {}",
            analysis.summary.processed_frames,
            analysis
                .summary
                .reported_total_frames
                .unwrap_or(frames_read)
        );

        analysis
    }

    fn analyze_video_frame(&mut self, frame_number: u64, fps: f64, frame: &DecodedFrame) -> FrameResult {
        match self.source.detect(frame) {
            Ok(Some(landmarks)) => FrameResult::new(frame_number, fps, self.issues_for(&landmarks)),
            Ok(None) => FrameResult::no_pose(frame_number, fps),
            Err(e) => {
                warn!("Pose estimation failed on frame {}: {}", frame_number, e);
                FrameResult::no_pose(frame_number, fps)
            }
        }
    }

    /// Analyze one still image, including a visibility-based confidence score.
    /// Estimator failures propagate: there is only one frame to report on.
    pub fn analyze_image(&mut self, frame: &DecodedFrame) -> AnalysisResult<FrameAnalysisResult> {
        self.source.reset()?;

        let Some(landmarks) = self.source.detect(frame)? else {
            return Ok(FrameAnalysisResult::no_pose());
        };

        Ok(FrameAnalysisResult {
            pose_detected: true,
            posture_issues: self.issues_for(&landmarks),
            confidence_score: self.scorer.score(Some(&landmarks)),
        })
    }

    /// Check the estimator is loaded, then run it once on a blank frame
    pub fn probe(&mut self) -> AnalysisResult<()> {
        if !self.source.is_initialized() {
            return Err(PoseError::NotInitialized.into());
        }

        self.source.reset()?;
        self.source.detect(&DecodedFrame::blank(100, 100))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::posture_evaluator::tests::upright_landmarks;
    use crate::core::video_source::InMemoryVideo;
    use crate::models::capture::{DecodeError, DecodeResult, VideoMetadata};
    use crate::models::pose::{BodyLandmark, Landmark, PoseError, PoseResult};
    use crate::models::posture::{IssueType, Severity};
    use std::collections::VecDeque;

    /// Replays a fixed script of detections, one per call
    pub(crate) struct ScriptedSource {
        pub script: VecDeque<PoseResult<Option<LandmarkSet>>>,
        pub calls: usize,
        pub resets: usize,
        pub initialized: bool,
    }

    impl ScriptedSource {
        pub(crate) fn new(script: Vec<PoseResult<Option<LandmarkSet>>>) -> Self {
            Self {
                script: script.into(),
                calls: 0,
                resets: 0,
                initialized: true,
            }
        }

        pub(crate) fn always(landmarks: LandmarkSet, times: usize) -> Self {
            Self::new((0..times).map(|_| Ok(Some(landmarks.clone()))).collect())
        }
    }

    impl LandmarkSource for ScriptedSource {
        fn detect(&mut self, _frame: &DecodedFrame) -> PoseResult<Option<LandmarkSet>> {
            self.calls += 1;
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn reset(&mut self) -> PoseResult<()> {
            self.resets += 1;
            Ok(())
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn model_info(&self) -> String {
            "scripted".to_string()
        }
    }

    pub(crate) fn frames(count: usize) -> Vec<DecodedFrame> {
        (0..count).map(|_| DecodedFrame::blank(2, 2)).collect()
    }

    fn forward_head_landmarks() -> LandmarkSet {
        let mut set = upright_landmarks();
        set.insert(BodyLandmark::LeftEar, Landmark::new(0.58, 0.22, 0.9));
        set.insert(BodyLandmark::RightEar, Landmark::new(0.62, 0.22, 0.9));
        set
    }

    fn analyzer(source: ScriptedSource) -> PostureAnalyzer<ScriptedSource> {
        PostureAnalyzer::new(source, AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_video_samples_every_fifteenth_frame() {
        let mut analyzer = analyzer(ScriptedSource::always(upright_landmarks(), 100));
        let mut video = InMemoryVideo::new(30.0, frames(100));

        let analysis = analyzer.analyze_video(&mut video);
        let numbers: Vec<u64> = analysis.results.iter().map(|r| r.frame_number).collect();
        assert_eq!(numbers, vec![0, 15, 30, 45, 60, 75, 90]);
        assert_eq!(analyzer.source().calls, 7);
        assert!((analysis.results[2].timestamp - 1.0).abs() < 1e-9);
        assert_eq!(analysis.summary.processed_frames, 7);
        assert_eq!(analysis.summary.reported_total_frames, Some(100));
    }

    #[test]
    fn test_video_uses_default_fps_when_unknown() {
        let mut analyzer = analyzer(ScriptedSource::always(upright_landmarks(), 10));
        let mut video = InMemoryVideo::with_metadata(
            VideoMetadata {
                fps: 0.0,
                total_frame_count: None,
            },
            frames(31),
        );

        let analysis = analyzer.analyze_video(&mut video);
        let numbers: Vec<u64> = analysis.results.iter().map(|r| r.frame_number).collect();
        assert_eq!(numbers, vec![0, 15, 30]);
        assert!((analysis.results[1].timestamp - 0.5).abs() < 1e-9);
        assert_eq!(analysis.summary.fps, 30.0);
    }

    #[test]
    fn test_video_frame_without_body() {
        let source = ScriptedSource::new(vec![Ok(Some(forward_head_landmarks())), Ok(None)]);
        let mut analyzer = analyzer(source);
        let mut video = InMemoryVideo::new(30.0, frames(20));

        let analysis = analyzer.analyze_video(&mut video);
        assert_eq!(analysis.results.len(), 2);
        assert!(analysis.results[0].pose_detected);
        assert_eq!(analysis.results[0].posture_issues[0].issue_type, IssueType::NeckForward);
        assert!(!analysis.results[1].pose_detected);
        assert!(analysis.results[1].posture_issues.is_empty());
        assert_eq!(analysis.summary.frames_with_pose, 1);
    }

    #[test]
    fn test_estimator_failure_is_isolated_to_its_frame() {
        let source = ScriptedSource::new(vec![
            Err(PoseError::InferenceFailed("boom".to_string())),
            Ok(Some(forward_head_landmarks())),
        ]);
        let mut analyzer = analyzer(source);
        let mut video = InMemoryVideo::new(30.0, frames(16));

        let analysis = analyzer.analyze_video(&mut video);
        assert_eq!(analysis.results.len(), 2);
        assert!(!analysis.results[0].pose_detected);
        assert!(analysis.results[1].pose_detected);
    }

    #[test]
    fn test_incomplete_landmarks_give_no_issues() {
        let mut set = forward_head_landmarks();
        set.remove(BodyLandmark::LeftHip);
        let mut analyzer = analyzer(ScriptedSource::always(set, 1));
        let mut video = InMemoryVideo::new(30.0, frames(1));

        let analysis = analyzer.analyze_video(&mut video);
        assert!(analysis.results[0].pose_detected);
        assert!(analysis.results[0].posture_issues.is_empty());
    }

    #[test]
    fn test_evaluation_fault_replaces_issues() {
        // Forward head would fire before the fault is seen; it must not survive
        let mut set = forward_head_landmarks();
        set.insert(BodyLandmark::RightHip, Landmark::new(f32::INFINITY, 0.7, 0.9));
        let analyzer = analyzer(ScriptedSource::new(Vec::new()));

        let issues = analyzer.issues_for(&set);
        assert_eq!(issues, vec![PostureIssue::analysis_error()]);
        assert_eq!(issues[0].severity, Severity::Low);
    }

    struct FailingVideo {
        remaining: usize,
    }

    impl VideoSource for FailingVideo {
        fn metadata(&self) -> VideoMetadata {
            VideoMetadata {
                fps: 30.0,
                total_frame_count: Some(100),
            }
        }

        fn next_frame(&mut self) -> DecodeResult<Option<DecodedFrame>> {
            if self.remaining == 0 {
                return Err(DecodeError::ReadFailed("corrupt packet".to_string()));
            }
            self.remaining -= 1;
            Ok(Some(DecodedFrame::blank(2, 2)))
        }
    }

    #[test]
    fn test_read_error_ends_stream() {
        let mut analyzer = analyzer(ScriptedSource::always(upright_landmarks(), 10));
        let mut video = FailingVideo { remaining: 20 };

        let analysis = analyzer.analyze_video(&mut video);
        let numbers: Vec<u64> = analysis.results.iter().map(|r| r.frame_number).collect();
        assert_eq!(numbers, vec![0, 15]);
    }

    #[test]
    fn test_image_confidence_and_issues() {
        let mut set = forward_head_landmarks();
        for part in BodyLandmark::ALL.iter().skip(20) {
            set.insert(*part, Landmark::new(0.5, 0.9, 0.1));
        }
        let mut analyzer = analyzer(ScriptedSource::always(set, 1));

        let result = analyzer.analyze_image(&DecodedFrame::blank(4, 4)).unwrap();
        assert!(result.pose_detected);
        assert_eq!(result.posture_issues, vec![PostureIssue::neck_forward()]);
        assert!((result.confidence_score - 20.0 / 33.0).abs() < 1e-6);
    }

    #[test]
    fn test_image_without_body() {
        let mut analyzer = analyzer(ScriptedSource::new(vec![Ok(None)]));
        let result = analyzer.analyze_image(&DecodedFrame::blank(4, 4)).unwrap();
        assert_eq!(result, FrameAnalysisResult::no_pose());
    }

    #[test]
    fn test_image_estimator_failure_propagates() {
        let source = ScriptedSource::new(vec![Err(PoseError::NotInitialized)]);
        let mut analyzer = analyzer(source);
        assert!(matches!(
            analyzer.analyze_image(&DecodedFrame::blank(4, 4)),
            Err(AnalysisError::Estimator(PoseError::NotInitialized))
        ));
    }

    #[test]
    fn test_each_run_starts_fresh_tracking() {
        let mut analyzer = analyzer(ScriptedSource::always(upright_landmarks(), 10));

        analyzer.analyze_video(&mut InMemoryVideo::new(30.0, frames(16)));
        analyzer.analyze_image(&DecodedFrame::blank(4, 4)).unwrap();
        analyzer.analyze_video(&mut InMemoryVideo::new(30.0, frames(1)));

        assert_eq!(analyzer.source().resets, 3);
        assert_eq!(analyzer.source().calls, 4);
    }

    #[test]
    fn test_probe_requires_loaded_model() {
        let mut source = ScriptedSource::new(vec![Ok(None)]);
        source.initialized = false;
        let mut analyzer = analyzer(source);

        assert!(matches!(
            analyzer.probe(),
            Err(AnalysisError::Estimator(PoseError::NotInitialized))
        ));
        assert_eq!(analyzer.source().calls, 0);
    }

    #[test]
    fn test_probe_runs_one_detection() {
        let mut analyzer = analyzer(ScriptedSource::new(vec![Ok(None)]));
        assert!(analyzer.probe().is_ok());
        assert_eq!(analyzer.source().calls, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            frame_stride: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            PostureAnalyzer::new(ScriptedSource::new(Vec::new()), config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
