use std::path::{Path, PathBuf};

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::DEFAULT_CASCADE_NAME;

use super::cascade_face_detector::CascadeFaceDetector;
use super::model_resolver;

/// Creates the default frontal-face detector.
///
/// Resolves `haarcascade_frontalface_default.xml` through the model
/// resolver and applies [`DetectionParams::default`]. Fails with
/// [`DetectionError::ModelLoad`] when the cascade cannot be found or parsed.
pub fn create_default_detector() -> Result<Box<dyn FaceDetector>, DetectionError> {
    let model_path =
        model_resolver::resolve(DEFAULT_CASCADE_NAME).map_err(|e| DetectionError::ModelLoad {
            path: PathBuf::from(DEFAULT_CASCADE_NAME),
            source: e.into(),
        })?;
    create_detector(&model_path, DetectionParams::default())
}

/// Creates a cascade detector from an explicit model path and parameters.
pub fn create_detector(
    model_path: &Path,
    params: DetectionParams,
) -> Result<Box<dyn FaceDetector>, DetectionError> {
    log::info!(
        "Using cascade detector {} (scale_factor={}, min_neighbors={}, min_size={}x{})",
        model_path.display(),
        params.scale_factor,
        params.min_neighbors,
        params.min_size.0,
        params.min_size.1
    );
    Ok(Box::new(CascadeFaceDetector::new(model_path, params)?))
}
