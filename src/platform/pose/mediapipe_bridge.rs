// MediaPipe integration bridge
// Provides an abstraction over the pose landmark model that feeds posture analysis
// Implemented with PyO3 (Python MediaPipe); a dummy backend is used otherwise

use crate::models::capture::DecodedFrame;
use crate::models::pose::{LandmarkSet, PoseResult};

/// Source of body landmarks for a decoded RGB frame.
///
/// Estimators keep tracking state between calls and are not reentrant, so
/// `detect` takes `&mut self`: one instance serves one pipeline at a time.
pub trait LandmarkSource: Send {
    /// Run inference on a frame. `Ok(None)` means no body was detected.
    fn detect(&mut self, frame: &DecodedFrame) -> PoseResult<Option<LandmarkSet>>;

    /// Drop tracking state carried over from earlier frames
    fn reset(&mut self) -> PoseResult<()> {
        Ok(())
    }

    /// Check if the model is loaded
    fn is_initialized(&self) -> bool;

    /// Get model info
    fn model_info(&self) -> String;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn detect(&mut self, frame: &DecodedFrame) -> PoseResult<Option<LandmarkSet>> {
        (**self).detect(frame)
    }

    fn reset(&mut self) -> PoseResult<()> {
        (**self).reset()
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn model_info(&self) -> String {
        (**self).model_info()
    }
}

// ==============================================================================
// PyO3 Implementation (Python MediaPipe)
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub mod pyo3_backend {
    use super::*;
    use crate::models::pose::{Landmark, PoseError};
    use log::info;
    use pyo3::prelude::*;
    use pyo3::types::{PyBytes, PyDict};
    use serde::Deserialize;
    use std::path::Path;

    #[derive(Deserialize)]
    struct InferenceOutput {
        landmarks: Vec<Landmark>,
    }

    pub struct PyO3MediaPipe {
        // `pose_inference.PoseEstimator` instance owned by this bridge
        estimator: PyObject,
        initialized: bool,
    }

    impl PyO3MediaPipe {
        /// Import `pose_inference` from `python_dir` and create a dedicated estimator
        pub fn new(python_dir: &Path) -> PoseResult<Self> {
            Python::with_gil(|py| {
                let sys = py.import_bound("sys")
                    .map_err(|e| PoseError::ModelLoadFailed(format!("Failed to import sys: {}", e)))?;

                let path_list = sys.getattr("path")
                    .map_err(|e| PoseError::ModelLoadFailed(format!("Failed to get sys.path: {}", e)))?;

                let python_dir = python_dir.to_str()
                    .ok_or_else(|| PoseError::ModelLoadFailed("Python dir is not valid UTF-8".to_string()))?;

                path_list.call_method1("insert", (0, python_dir))
                    .map_err(|e| PoseError::ModelLoadFailed(format!("Failed to add python dir to path: {}", e)))?;

                let inference_module = py.import_bound("pose_inference")
                    .map_err(|e| PoseError::ModelLoadFailed(format!(
                        "Failed to import pose_inference: {}. Make sure mediapipe is installed (pip install mediapipe)",
                        e
                    )))?;

                let estimator = inference_module.getattr("PoseEstimator")
                    .and_then(|class| class.call0())
                    .map_err(|e| PoseError::ModelLoadFailed(format!("Failed to create PoseEstimator: {}", e)))?;

                info!("PyO3MediaPipe initialized from {}", python_dir);

                Ok(Self {
                    estimator: estimator.unbind(),
                    initialized: true,
                })
            })
        }

        fn parse_output(json_str: &str) -> PoseResult<Option<LandmarkSet>> {
            let output: Option<InferenceOutput> = serde_json::from_str(json_str)
                .map_err(|e| PoseError::InferenceFailed(format!("Failed to parse JSON: {}", e)))?;

            Ok(output.map(|o| LandmarkSet::from_indexed(&o.landmarks)))
        }
    }

    impl LandmarkSource for PyO3MediaPipe {
        fn detect(&mut self, frame: &DecodedFrame) -> PoseResult<Option<LandmarkSet>> {
            Python::with_gil(|py| {
                let estimator = self.estimator.bind(py);

                let kwargs = PyDict::new_bound(py);
                kwargs.set_item("pixels", PyBytes::new_bound(py, &frame.data))
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set pixels: {}", e)))?;
                kwargs.set_item("width", frame.width)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set width: {}", e)))?;
                kwargs.set_item("height", frame.height)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set height: {}", e)))?;

                let result_json = estimator.call_method("process_rgb_frame", (), Some(&kwargs))
                    .map_err(|e| PoseError::InferenceFailed(format!("MediaPipe inference failed: {}", e)))?;

                let json_str: String = result_json.extract()
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to extract JSON: {}", e)))?;

                Self::parse_output(&json_str)
            })
        }

        fn reset(&mut self) -> PoseResult<()> {
            Python::with_gil(|py| {
                self.estimator.bind(py).call_method0("reset")
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to reset tracking: {}", e)))?;
                Ok(())
            })
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn model_info(&self) -> String {
            "PyO3 MediaPipe Bridge (Python backend, 33-point pose)".to_string()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::models::pose::BodyLandmark;

        #[test]
        fn test_parse_no_body() {
            assert!(PyO3MediaPipe::parse_output("null").unwrap().is_none());
        }

        #[test]
        fn test_parse_landmarks() {
            let json = r#"{"landmarks":[{"x":0.5,"y":0.2,"z":-0.1,"visibility":0.99}]}"#;
            let set = PyO3MediaPipe::parse_output(json).unwrap().unwrap();
            assert_eq!(set.len(), 1);
            assert_eq!(set.get(BodyLandmark::Nose).unwrap().z, Some(-0.1));
        }
    }
}

// ==============================================================================
// Dummy Implementation (for compilation without features)
// ==============================================================================

#[cfg(not(feature = "ml-pyo3"))]
pub struct DummyMediaPipe;

#[cfg(not(feature = "ml-pyo3"))]
impl DummyMediaPipe {
    pub fn new() -> PoseResult<Self> {
        log::warn!("Using dummy MediaPipe implementation (no inference)");
        log::warn!("Enable the 'ml-pyo3' feature for actual pose estimation");
        Ok(Self)
    }
}

#[cfg(not(feature = "ml-pyo3"))]
impl LandmarkSource for DummyMediaPipe {
    fn detect(&mut self, _frame: &DecodedFrame) -> PoseResult<Option<LandmarkSet>> {
        Ok(None)
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn model_info(&self) -> String {
        "Dummy MediaPipe (no ML inference - enable 'ml-pyo3' feature)".to_string()
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub type DefaultMediaPipe = pyo3_backend::PyO3MediaPipe;

#[cfg(not(feature = "ml-pyo3"))]
pub type DefaultMediaPipe = DummyMediaPipe;

/// Create the compiled-in estimator. The PyO3 backend loads its module from `./python`.
pub fn default_landmark_source() -> PoseResult<DefaultMediaPipe> {
    #[cfg(feature = "ml-pyo3")]
    {
        let python_dir = std::env::current_dir()
            .map_err(|e| crate::models::pose::PoseError::ModelLoadFailed(e.to_string()))?
            .join("python");
        pyo3_backend::PyO3MediaPipe::new(&python_dir)
    }

    #[cfg(not(feature = "ml-pyo3"))]
    {
        DummyMediaPipe::new()
    }
}
