pub mod cascade_face_detector;
pub mod detector_factory;
pub mod model_resolver;
