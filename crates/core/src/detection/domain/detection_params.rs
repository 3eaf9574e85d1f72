use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_error::DetectionError;
use crate::shared::constants::{DEFAULT_MIN_NEIGHBORS, DEFAULT_MIN_SIZE, DEFAULT_SCALE_FACTOR};

/// Tuning knobs for multi-scale cascade detection.
///
/// Defaults: scale factor 1.1, 3 neighbours, 30×30 minimum, no maximum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Step between consecutive scan scales. Must be greater than 1.
    pub scale_factor: f64,
    /// A candidate needs more than this many overlapping hits to be kept.
    /// Zero disables grouping and returns every raw hit.
    pub min_neighbors: u32,
    /// Smallest face (width, height) to report.
    pub min_size: (u32, u32),
    /// Largest face to report; `None` means bounded only by the image.
    pub max_size: Option<(u32, u32)>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: DEFAULT_MIN_SIZE,
            max_size: None,
        }
    }
}

impl DetectionParams {
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_min_neighbors(mut self, min_neighbors: u32) -> Self {
        self.min_neighbors = min_neighbors;
        self
    }

    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_size = (width, height);
        self
    }

    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_size = Some((width, height));
        self
    }

    pub fn validate(&self) -> Result<(), DetectionError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(DetectionError::InvalidParams(format!(
                "scale factor must be greater than 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.min_size.0 == 0 || self.min_size.1 == 0 {
            return Err(DetectionError::InvalidParams(format!(
                "minimum size must be positive, got {}x{}",
                self.min_size.0, self.min_size.1
            )));
        }
        if let Some((max_w, max_h)) = self.max_size {
            if max_w < self.min_size.0 || max_h < self.min_size.1 {
                return Err(DetectionError::InvalidParams(format!(
                    "maximum size {}x{} is smaller than minimum size {}x{}",
                    max_w, max_h, self.min_size.0, self.min_size.1
                )));
            }
        }
        Ok(())
    }
}
