// Upload validation, applied before any decoding work

use crate::core::config::AnalysisConfig;
use crate::models::capture::{DecodeError, MediaKind, Upload};
use crate::models::posture::{AnalysisError, AnalysisResult};

/// Reject uploads with the wrong media type, no payload, or an oversized payload
pub fn validate_upload(
    upload: &Upload,
    kind: MediaKind,
    config: &AnalysisConfig,
) -> AnalysisResult<()> {
    let content_type = upload.content_type.as_deref().unwrap_or("");
    if !content_type.starts_with(kind.content_type_prefix()) {
        return Err(AnalysisError::UnsupportedMediaType {
            kind,
            content_type: content_type.to_string(),
        });
    }

    let limit = size_limit(kind, config);
    let size = upload.data.len();
    if size > limit {
        return Err(AnalysisError::ResourceLimitExceeded { kind, size, limit });
    }

    if size == 0 {
        return Err(AnalysisError::InputDecode(DecodeError::EmptyInput));
    }

    Ok(())
}

pub fn size_limit(kind: MediaKind, config: &AnalysisConfig) -> usize {
    match kind {
        MediaKind::Video => config.max_video_bytes,
        MediaKind::Image => config.max_image_bytes,
    }
}
