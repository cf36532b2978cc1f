// Frame sampling - picks which decoded video frames get analyzed

use crate::models::posture::{AnalysisError, AnalysisResult};

/// Default stride used by the video pipeline
pub const DEFAULT_FRAME_STRIDE: usize = 15;

/// Frame rate substituted when the decoder reports none
pub const DEFAULT_FPS: f64 = 30.0;

/// Selects frames `0, S, 2S, ...` from a stream of unknown length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampler {
    stride: usize,
}

impl FrameSampler {
    pub fn new(stride: usize) -> AnalysisResult<Self> {
        if stride == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Frame stride must be at least 1".to_string(),
            ));
        }

        Ok(Self { stride })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_selected(&self, frame_index: u64) -> bool {
        frame_index % self.stride as u64 == 0
    }

    /// Wrap a frame iterator so only selected frames come out, tagged with
    /// their 0-based index in the original stream
    pub fn sample<I: Iterator>(&self, frames: I) -> SampledFrames<I> {
        SampledFrames {
            inner: frames,
            sampler: *self,
            next_index: 0,
        }
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            stride: DEFAULT_FRAME_STRIDE,
        }
    }
}

/// Iterator adapter returned by [`FrameSampler::sample`]
pub struct SampledFrames<I> {
    inner: I,
    sampler: FrameSampler,
    next_index: u64,
}

impl<I: Iterator> Iterator for SampledFrames<I> {
    type Item = (u64, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.inner.next()?;
            let index = self.next_index;
            self.next_index += 1;

            if self.sampler.is_selected(index) {
                return Some((index, frame));
            }
        }
    }
}

/// Frame rate used for timestamps. Only affects timestamps, never selection.
pub fn effective_fps(reported: f64, fallback: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_100_frames() {
        let sampler = FrameSampler::new(15).unwrap();
        let indices: Vec<u64> = sampler.sample(0..100).map(|(index, _)| index).collect();
        assert_eq!(indices, vec![0, 15, 30, 45, 60, 75, 90]);
    }

    #[test]
    fn test_sample_count_is_ceil_of_stride() {
        let sampler = FrameSampler::new(15).unwrap();
        for total in [0u64, 1, 14, 15, 16, 30, 31, 299] {
            assert_eq!(
                sampler.sample(0..total).count() as u64,
                total.div_ceil(15)
            );
        }
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(matches!(
            FrameSampler::new(0),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sample_iterator_skips_unselected_frames() {
        let sampler = FrameSampler::new(4).unwrap();
        let sampled: Vec<(u64, char)> = sampler.sample("abcdefghij".chars()).collect();
        assert_eq!(sampled, vec![(0, 'a'), (4, 'e'), (8, 'i')]);
    }

    #[test]
    fn test_stride_one_keeps_everything() {
        let sampler = FrameSampler::new(1).unwrap();
        assert_eq!(sampler.sample(0..5).count(), 5);
    }

    #[test]
    fn test_effective_fps_fallback() {
        assert_eq!(effective_fps(25.0, DEFAULT_FPS), 25.0);
        assert_eq!(effective_fps(0.0, DEFAULT_FPS), 30.0);
        assert_eq!(effective_fps(-1.0, DEFAULT_FPS), 30.0);
        assert_eq!(effective_fps(f64::NAN, DEFAULT_FPS), 30.0);
    }
}
