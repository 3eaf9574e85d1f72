use crate::detection::domain::detection_error::DetectionError;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Detection is read-only over both the detector and the frame, so a single
/// instance can be shared across threads and reused for any number of calls.
/// An empty result means no faces were found.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError>;
}
