// Video decode contract: frames in presentation order plus stream metadata

use crate::models::capture::{DecodeError, DecodeResult, DecodedFrame, VideoMetadata};
use std::collections::VecDeque;

/// A decoded video stream, read front to back exactly once
pub trait VideoSource: Send {
    fn metadata(&self) -> VideoMetadata;

    /// Next frame in presentation order, `Ok(None)` once the stream is exhausted
    fn next_frame(&mut self) -> DecodeResult<Option<DecodedFrame>>;
}

/// Opens raw video bytes as a [`VideoSource`]
pub trait VideoOpener: Send + Sync {
    fn open(&self, data: &[u8]) -> DecodeResult<Box<dyn VideoSource>>;

    fn backend_info(&self) -> String;
}

// ==============================================================================
// In-memory source
// ==============================================================================

/// Already-decoded frames, e.g. from a test fixture or an external decoder
pub struct InMemoryVideo {
    metadata: VideoMetadata,
    frames: VecDeque<DecodedFrame>,
}

impl InMemoryVideo {
    pub fn new(fps: f64, frames: Vec<DecodedFrame>) -> Self {
        Self {
            metadata: VideoMetadata {
                fps,
                total_frame_count: Some(frames.len() as u64),
            },
            frames: frames.into(),
        }
    }

    pub fn with_metadata(metadata: VideoMetadata, frames: Vec<DecodedFrame>) -> Self {
        Self {
            metadata,
            frames: frames.into(),
        }
    }
}

impl VideoSource for InMemoryVideo {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn next_frame(&mut self) -> DecodeResult<Option<DecodedFrame>> {
        Ok(self.frames.pop_front())
    }
}

// ==============================================================================
// Fallback when no video backend is compiled in
// ==============================================================================

#[cfg(not(feature = "video-ffmpeg"))]
pub struct UnsupportedVideoOpener;

#[cfg(not(feature = "video-ffmpeg"))]
impl VideoOpener for UnsupportedVideoOpener {
    fn open(&self, _data: &[u8]) -> DecodeResult<Box<dyn VideoSource>> {
        Err(DecodeError::NotSupported)
    }

    fn backend_info(&self) -> String {
        "No video decoder (enable the 'video-ffmpeg' feature)".to_string()
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

#[cfg(feature = "video-ffmpeg")]
pub type DefaultVideoOpener = crate::core::ffmpeg_wrapper::FFmpegVideoOpener;

#[cfg(not(feature = "video-ffmpeg"))]
pub type DefaultVideoOpener = UnsupportedVideoOpener;

pub fn default_video_opener() -> DefaultVideoOpener {
    #[cfg(feature = "video-ffmpeg")]
    {
        crate::core::ffmpeg_wrapper::FFmpegVideoOpener::new()
    }

    #[cfg(not(feature = "video-ffmpeg"))]
    {
        UnsupportedVideoOpener
    }
}
