// Result aggregation for video analysis runs

use crate::models::posture::{
    AnalysisError, AnalysisResult, AnalysisSummary, FrameResult, VideoAnalysis,
};

/// Collects per-frame results in frame order. The full sequence is only
/// handed out by [`ResultAggregator::finish`], once the stream is exhausted.
#[derive(Debug)]
pub struct ResultAggregator {
    results: Vec<FrameResult>,
    summary: AnalysisSummary,
}

impl ResultAggregator {
    pub fn new(fps: f64, reported_total_frames: Option<u64>) -> Self {
        Self {
            results: Vec::new(),
            summary: AnalysisSummary {
                fps,
                reported_total_frames,
                ..AnalysisSummary::default()
            },
        }
    }

    /// Append a frame result; frame numbers must be strictly increasing
    pub fn push(&mut self, result: FrameResult) -> AnalysisResult<()> {
        if let Some(last) = self.results.last() {
            if result.frame_number <= last.frame_number {
                return Err(AnalysisError::OutOfOrderFrame {
                    previous: last.frame_number,
                    got: result.frame_number,
                });
            }
        }

        self.summary.processed_frames += 1;
        if result.pose_detected {
            self.summary.frames_with_pose += 1;
        }
        for issue in &result.posture_issues {
            *self.summary.issue_counts.entry(issue.issue_type).or_insert(0) += 1;
        }

        self.results.push(result);
        Ok(())
    }

    pub fn processed_frames(&self) -> u64 {
        self.summary.processed_frames
    }

    pub fn finish(self) -> VideoAnalysis {
        VideoAnalysis {
            results: self.results,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posture::{IssueType, PostureIssue, ShoulderSide};

    #[test]
    fn test_collects_in_order() {
        let mut aggregator = ResultAggregator::new(30.0, Some(40));
        aggregator
            .push(FrameResult::new(0, 30.0, vec![PostureIssue::neck_forward()]))
            .unwrap();
        aggregator.push(FrameResult::no_pose(15, 30.0)).unwrap();
        aggregator
            .push(FrameResult::new(
                30,
                30.0,
                vec![
                    PostureIssue::neck_forward(),
                    PostureIssue::uneven_shoulders(ShoulderSide::Left),
                ],
            ))
            .unwrap();

        let analysis = aggregator.finish();
        let frames: Vec<u64> = analysis.results.iter().map(|r| r.frame_number).collect();
        assert_eq!(frames, vec![0, 15, 30]);

        let summary = analysis.summary;
        assert_eq!(summary.processed_frames, 3);
        assert_eq!(summary.frames_with_pose, 2);
        assert_eq!(summary.reported_total_frames, Some(40));
        assert_eq!(summary.issue_counts.get(&IssueType::NeckForward), Some(&2));
        assert_eq!(summary.issue_counts.get(&IssueType::UnevenShoulders), Some(&1));
        assert_eq!(summary.issue_counts.get(&IssueType::BackSlouch), None);
    }

    #[test]
    fn test_rejects_out_of_order_frames() {
        let mut aggregator = ResultAggregator::new(30.0, None);
        aggregator.push(FrameResult::no_pose(15, 30.0)).unwrap();

        let err = aggregator.push(FrameResult::no_pose(15, 30.0)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::OutOfOrderFrame { previous: 15, got: 15 }
        ));
        assert!(aggregator.push(FrameResult::no_pose(0, 30.0)).is_err());
        assert_eq!(aggregator.processed_frames(), 1);
    }

    #[test]
    fn test_empty_run() {
        let analysis = ResultAggregator::new(25.0, Some(0)).finish();
        assert!(analysis.results.is_empty());
        assert_eq!(analysis.summary.processed_frames, 0);
        assert_eq!(analysis.summary.fps, 25.0);
    }
}
