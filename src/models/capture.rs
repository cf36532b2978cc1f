// Data structures for decoded media handed to the pose estimator

use serde::{Deserialize, Serialize};

/// A decoded frame, always tightly packed RGB8 (3 bytes per pixel)
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl DecodedFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(DecodeError::InvalidFrame(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// All-black frame, used by health checks
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }
}

/// Stream metadata reported by a video decoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Frame rate as reported by the container; may be 0 or garbage
    pub fps: f64,
    /// Frame count as reported by the container, when known
    pub total_frame_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    pub fn to_string(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }

    /// Prefix a content type must carry for this kind, e.g. `video/`
    pub fn content_type_prefix(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/",
            MediaKind::Image => "image/",
        }
    }

    pub fn supported_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => &["mp4", "avi", "mov", "webm"],
            MediaKind::Image => &["jpg", "jpeg", "png", "webp"],
        }
    }
}

/// Guess a content type from a file extension
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" => Some("video/mp4"),
        "avi" => Some("video/x-msvideo"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Raw media as received from a caller, before any decoding
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: None,
            content_type: Some(content_type.into()),
            data,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Error types for media decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Empty input")]
    EmptyInput,

    #[error("Could not open media: {0}")]
    OpenFailed(String),

    #[error("Could not decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame read failed: {0}")]
    ReadFailed(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Video decoding not supported by this build")]
    NotSupported,
}

pub type DecodeResult<T> = Result<T, DecodeError>;
