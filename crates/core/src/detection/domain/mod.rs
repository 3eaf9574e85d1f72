pub mod detection_error;
pub mod detection_params;
pub mod face_detector;
