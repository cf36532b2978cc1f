pub mod config;

// Posture heuristics
pub mod angle;
pub mod posture_evaluator;
pub mod confidence;

// Video pipeline
pub mod frame_sampler;
pub mod aggregator;
pub mod video_source;
#[cfg(feature = "video-ffmpeg")]
pub mod ffmpeg_wrapper;

// Request handling
pub mod input_guard;
pub mod image_decoder;
pub mod analyzer;
pub mod analysis_service;
