use crate::core::frame_sampler::{DEFAULT_FPS, DEFAULT_FRAME_STRIDE};
use crate::models::pose::BodyLandmark;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Distance thresholds for the posture rules, in normalized image units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PostureThresholds {
    /// Ear midpoint ahead of shoulder midpoint by more than this => forward head
    pub head_forward: f32,
    /// Shoulder/hip midpoint x offset beyond this => slouch
    pub back_alignment: f32,
    /// Left/right shoulder height difference beyond this => uneven shoulders
    pub shoulder_level: f32,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            head_forward: 0.05,
            back_alignment: 0.04,
            shoulder_level: 0.03,
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: PostureThresholds,
    /// Analyze every Nth video frame
    pub frame_stride: usize,
    /// Frame rate assumed when the video reports none
    pub default_fps: f64,
    /// Landmarks above this visibility count toward the confidence score
    pub visibility_threshold: f32,
    /// Denominator of the confidence score (size of the full pose model)
    pub full_model_landmark_count: usize,
    /// Upload size caps, checked before decoding
    pub max_video_bytes: usize,
    pub max_image_bytes: usize,
    /// Log progress every N analyzed frames
    pub progress_log_interval: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: PostureThresholds::default(),
            frame_stride: DEFAULT_FRAME_STRIDE,
            default_fps: DEFAULT_FPS,
            visibility_threshold: 0.5,
            full_model_landmark_count: BodyLandmark::COUNT,
            max_video_bytes: 100 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
            progress_log_interval: 100,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from the default location, creating it with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        let thresholds = [
            ("head_forward", self.thresholds.head_forward),
            ("back_alignment", self.thresholds.back_alignment),
            ("shoulder_level", self.thresholds.shoulder_level),
        ];
        for (name, value) in thresholds {
            if !(value > 0.0 && value <= 1.0) {
                return Err(format!(
                    "Invalid {} threshold: {}. Must be in (0.0, 1.0]",
                    name, value
                )
                .into());
            }
        }

        if self.frame_stride == 0 {
            return Err("Invalid frame stride: 0. Must be at least 1".into());
        }

        if !self.default_fps.is_finite() || self.default_fps <= 0.0 {
            return Err(format!(
                "Invalid default FPS: {}. Must be a positive number",
                self.default_fps
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(format!(
                "Invalid visibility threshold: {}. Must be between 0.0 and 1.0",
                self.visibility_threshold
            )
            .into());
        }

        if self.full_model_landmark_count == 0
            || self.full_model_landmark_count > BodyLandmark::COUNT
        {
            return Err(format!(
                "Invalid landmark count: {}. Must be between 1 and {}",
                self.full_model_landmark_count,
                BodyLandmark::COUNT
            )
            .into());
        }

        if self.max_video_bytes == 0 || self.max_image_bytes == 0 {
            return Err("Upload size limits must be greater than 0".into());
        }

        if self.progress_log_interval == 0 {
            return Err("Progress log interval must be at least 1".into());
        }

        Ok(())
    }

    /// Reset to default configuration
    pub fn reset() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".posture_pro");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn get_test_config_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("posture_pro_test_config_{}", name));
        path.push("settings.json");
        path
    }

    fn cleanup_test_config(path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.thresholds.head_forward, 0.05);
        assert_eq!(config.thresholds.back_alignment, 0.04);
        assert_eq!(config.thresholds.shoulder_level, 0.03);
        assert_eq!(config.frame_stride, 15);
        assert_eq!(config.default_fps, 30.0);
        assert_eq!(config.visibility_threshold, 0.5);
        assert_eq!(config.full_model_landmark_count, 33);
        assert_eq!(config.max_video_bytes, 100 * 1024 * 1024);
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalysisConfig::default();

        config.thresholds.back_alignment = 0.0;
        assert!(config.validate().is_err());
        config.thresholds.back_alignment = 0.04;

        config.frame_stride = 0;
        assert!(config.validate().is_err());
        config.frame_stride = 15;

        config.default_fps = f64::NAN;
        assert!(config.validate().is_err());
        config.default_fps = 30.0;

        config.visibility_threshold = 1.5;
        assert!(config.validate().is_err());
        config.visibility_threshold = 0.5;

        config.full_model_landmark_count = 34;
        assert!(config.validate().is_err());
        config.full_model_landmark_count = 33;

        config.max_image_bytes = 0;
        assert!(config.validate().is_err());
        config.max_image_bytes = 1024;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "frame_stride": 10 }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.frame_stride, 10);
        assert_eq!(config.thresholds, PostureThresholds::default());
        assert_eq!(config.default_fps, 30.0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = get_test_config_path("roundtrip");
        cleanup_test_config(&path);

        let mut config = AnalysisConfig::default();
        config.thresholds.head_forward = 0.08;
        config.save_to(&path).unwrap();

        let loaded = AnalysisConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        cleanup_test_config(&path);
    }

    #[test]
    fn test_invalid_config_not_saved() {
        let path = get_test_config_path("invalid");
        cleanup_test_config(&path);

        let config = AnalysisConfig {
            frame_stride: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.save_to(&path).is_err());
        assert!(!path.exists());
    }
}
