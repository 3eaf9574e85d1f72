//! Face detection over pretrained Haar cascade classifiers.
//!
//! ```no_run
//! use facecascade_core::detection::domain::face_detector::FaceDetector;
//! use facecascade_core::detection::infrastructure::detector_factory::create_default_detector;
//! use facecascade_core::shared::frame::Frame;
//!
//! let detector = create_default_detector()?;
//! let frame = Frame::open(std::path::Path::new("group.jpg"))?;
//! for face in detector.detect(&frame)? {
//!     println!("{} {} {} {}", face.x, face.y, face.width, face.height);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod detection;
pub mod shared;
