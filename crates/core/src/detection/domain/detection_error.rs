use std::path::PathBuf;

use thiserror::Error;

use crate::detection::infrastructure::model_resolver::ModelResolveError;

/// Why a cascade model could not be turned into a usable classifier.
#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("{0}")]
    Resolve(#[from] ModelResolveError),
    #[error("failed to read cascade file: {0}")]
    Io(#[source] std::io::Error),
    #[error("cascade path is not valid UTF-8")]
    NonUtf8Path,
    #[error("OpenCV rejected cascade: {0}")]
    OpenCv(#[source] opencv::Error),
    #[error("file is not a cascade OpenCV can load")]
    Empty,
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: CascadeLoadError,
    },
    #[error("invalid input image: {0}")]
    InvalidInput(String),
    #[error("invalid detection parameters: {0}")]
    InvalidParams(String),
    #[error("detection failed: {0}")]
    Backend(#[source] opencv::Error),
}

impl DetectionError {
    pub fn is_model_load(&self) -> bool {
        matches!(self, DetectionError::ModelLoad { .. })
    }
}
