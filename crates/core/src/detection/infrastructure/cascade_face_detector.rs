use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use opencv::core::{self, Mat, Rect, Scalar, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detection::domain::detection_error::{CascadeLoadError, DetectionError};
use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Face detector backed by OpenCV's `CascadeClassifier::detectMultiScale`.
///
/// The classifier is loaded once at construction. OpenCV's detection call
/// needs mutable access to its scratch buffers, so calls are serialised
/// through a mutex; the detector is `Send + Sync` and can be shared.
pub struct CascadeFaceDetector {
    classifier: Mutex<CascadeClassifier>,
    params: DetectionParams,
    window_size: (u32, u32),
}

impl CascadeFaceDetector {
    /// Load the cascade at `model_path`. Fails immediately if the file is
    /// missing, unreadable or not a cascade OpenCV can load.
    pub fn new(model_path: &Path, params: DetectionParams) -> Result<Self, DetectionError> {
        params.validate()?;
        let model_load = |source| DetectionError::ModelLoad {
            path: model_path.to_path_buf(),
            source,
        };

        fs::metadata(model_path).map_err(|e| model_load(CascadeLoadError::Io(e)))?;
        let path_str = model_path
            .to_str()
            .ok_or_else(|| model_load(CascadeLoadError::NonUtf8Path))?;
        let classifier =
            CascadeClassifier::new(path_str).map_err(|e| model_load(CascadeLoadError::OpenCv(e)))?;
        if classifier.empty().map_err(|e| model_load(CascadeLoadError::OpenCv(e)))? {
            return Err(model_load(CascadeLoadError::Empty));
        }

        let window = classifier
            .get_original_window_size()
            .map_err(|e| model_load(CascadeLoadError::OpenCv(e)))?;
        let window_size = (window.width.max(0) as u32, window.height.max(0) as u32);
        log::info!(
            "Loaded cascade {} ({}x{} window)",
            model_path.display(),
            window_size.0,
            window_size.1
        );

        Ok(Self {
            classifier: Mutex::new(classifier),
            params,
            window_size,
        })
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Training window of the loaded cascade.
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    fn run_cascade(&self, gray: &Mat) -> opencv::Result<Vector<Rect>> {
        let (min_w, min_h) = self.params.min_size;
        // OpenCV treats a zero max size as "the whole image".
        let (max_w, max_h) = self.params.max_size.unwrap_or((0, 0));
        let mut rects = Vector::<Rect>::new();
        let mut classifier = self.classifier.lock().unwrap_or_else(PoisonError::into_inner);
        classifier.detect_multi_scale(
            gray,
            &mut rects,
            self.params.scale_factor,
            to_cv_int(self.params.min_neighbors),
            0,
            cv_size(min_w, min_h),
            cv_size(max_w, max_h),
        )?;
        Ok(rects)
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
        validate_frame(frame)?;
        let gray = to_gray_mat(frame).map_err(DetectionError::Backend)?;
        let rects = self.run_cascade(&gray).map_err(DetectionError::Backend)?;

        let (w, h) = (frame.width(), frame.height());
        let faces: Vec<BoundingBox> = rects
            .iter()
            .filter_map(|r| BoundingBox::new(r.x, r.y, r.width, r.height).clamp_to(w, h))
            .collect();

        log::debug!(
            "Cascade scan of {}x{} frame: {} faces",
            w,
            h,
            faces.len()
        );
        Ok(faces)
    }
}

fn validate_frame(frame: &Frame) -> Result<(), DetectionError> {
    if frame.is_empty() {
        return Err(DetectionError::InvalidInput(format!(
            "image is empty ({}x{})",
            frame.width(),
            frame.height()
        )));
    }
    if !matches!(frame.channels(), 1 | 3 | 4) {
        return Err(DetectionError::InvalidInput(format!(
            "unsupported channel count {}",
            frame.channels()
        )));
    }
    if frame.as_ndarray().is_none() {
        let expected = frame.width() as usize * frame.height() as usize * frame.channels() as usize;
        return Err(DetectionError::InvalidInput(format!(
            "expected {expected} bytes, got {}",
            frame.data().len()
        )));
    }
    if i32::try_from(frame.width()).is_err() || i32::try_from(frame.height()).is_err() {
        return Err(DetectionError::InvalidInput(format!(
            "image too large ({}x{})",
            frame.width(),
            frame.height()
        )));
    }
    Ok(())
}

/// Copy a validated frame into an 8-bit single-channel `Mat`.
fn to_gray_mat(frame: &Frame) -> opencv::Result<Mat> {
    let (mat_type, conversion) = match frame.channels() {
        1 => (core::CV_8UC1, None),
        3 => (core::CV_8UC3, Some(imgproc::COLOR_RGB2GRAY)),
        _ => (core::CV_8UC4, Some(imgproc::COLOR_RGBA2GRAY)),
    };
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        mat_type,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(frame.data());

    match conversion {
        None => Ok(mat),
        Some(code) => {
            let mut gray = Mat::default();
            imgproc::cvt_color(&mat, &mut gray, code, 0)?;
            Ok(gray)
        }
    }
}

fn to_cv_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn cv_size(width: u32, height: u32) -> Size {
    Size::new(to_cv_int(width), to_cv_int(height))
}

#[cfg(test)]
pub(crate) const EDGE_CASCADE_XML: &str = include_str!("testdata/edge_cascade.xml");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{DEFAULT_CASCADE_NAME, SYSTEM_CASCADE_DIRS};
    use rstest::rstest;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn cascade_file(xml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        file
    }

    fn detector(params: DetectionParams) -> CascadeFaceDetector {
        let file = cascade_file(EDGE_CASCADE_XML);
        CascadeFaceDetector::new(file.path(), params).unwrap()
    }

    /// Dark above row `edge`, bright from it downwards.
    fn edge_frame(width: u32, height: u32, edge: u32) -> Frame {
        let mut data = vec![0u8; (width * height) as usize];
        data[(edge * width) as usize..].fill(255);
        Frame::new(data, width, height, 1)
    }

    fn noise_frame(width: u32, height: u32, seed: u32) -> Frame {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        Frame::new(data, width, height, 1)
    }

    fn system_frontalface_cascade() -> Option<PathBuf> {
        SYSTEM_CASCADE_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(DEFAULT_CASCADE_NAME))
            .find(|path| path.is_file())
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn test_new_loads_model_from_path() {
        let det = detector(DetectionParams::default());
        assert_eq!(det.window_size(), (24, 24));
        assert_eq!(det.params(), &DetectionParams::default());
    }

    #[test]
    fn test_missing_model_fails_construction() {
        let path = Path::new("/nonexistent/haarcascade_frontalface_default.xml");
        let err = CascadeFaceDetector::new(path, DetectionParams::default())
            .err()
            .expect("construction must fail");
        match err {
            DetectionError::ModelLoad { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(source, CascadeLoadError::Io(_)));
            }
            other => panic!("expected ModelLoad, got {other:?}"),
        }
    }

    #[rstest]
    #[case::empty_file("")]
    #[case::not_xml("this is not a cascade")]
    #[case::empty_cascade("<opencv_storage><cascade></cascade></opencv_storage>")]
    #[case::truncated(&EDGE_CASCADE_XML[..EDGE_CASCADE_XML.len() / 2])]
    fn test_corrupt_model_fails_construction(#[case] xml: &str) {
        let file = cascade_file(xml);
        let err = CascadeFaceDetector::new(file.path(), DetectionParams::default())
            .err()
            .expect("construction must fail");
        assert!(err.is_model_load(), "{err:?}");
    }

    #[test]
    fn test_invalid_params_fail_construction() {
        let file = cascade_file(EDGE_CASCADE_XML);
        let params = DetectionParams::default().with_scale_factor(1.0);
        let err = CascadeFaceDetector::new(file.path(), params)
            .err()
            .expect("construction must fail");
        assert!(matches!(err, DetectionError::InvalidParams(_)));
    }

    // ── Input validation ─────────────────────────────────────────────

    #[test]
    fn test_empty_frame_is_invalid_input() {
        let det = detector(DetectionParams::default());
        let err = det.detect(&Frame::new(Vec::new(), 0, 0, 1)).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }

    #[test]
    fn test_two_channel_frame_is_invalid_input() {
        let det = detector(DetectionParams::default());
        let err = det.detect(&Frame::new(vec![0; 8], 2, 2, 2)).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }

    #[test]
    fn test_short_buffer_is_invalid_input() {
        let det = detector(DetectionParams::default());
        let err = det.detect(&Frame::new(vec![0; 99], 10, 10, 1)).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }

    // ── Detection ────────────────────────────────────────────────────

    #[test]
    fn test_blank_100x100_frame_has_no_faces() {
        let det = detector(DetectionParams::default());
        let faces = det.detect(&Frame::filled(100, 100, 0)).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn test_frame_smaller_than_window_has_no_faces() {
        let det = detector(DetectionParams::default().with_min_size(1, 1));
        let faces = det.detect(&edge_frame(20, 20, 10)).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn test_edge_is_detected_near_the_edge() {
        let det = detector(DetectionParams::default());
        let faces = det.detect(&edge_frame(100, 100, 50)).unwrap();
        assert!(!faces.is_empty());
        for face in &faces {
            assert!(face.y < 60 && face.bottom() > 40, "{face:?}");
        }
    }

    #[test]
    fn test_results_within_image_bounds() {
        let det = detector(DetectionParams::default().with_min_neighbors(0));
        for frame in [
            edge_frame(100, 100, 50),
            edge_frame(137, 91, 3),
            edge_frame(64, 200, 190),
            noise_frame(120, 90, 7),
        ] {
            for face in det.detect(&frame).unwrap() {
                assert!(face.is_within(frame.width(), frame.height()), "{face:?}");
            }
        }
    }

    #[test]
    fn test_detect_is_deterministic() {
        let det = detector(DetectionParams::default());
        let frame = edge_frame(100, 100, 50);
        let first = det.detect(&frame).unwrap();
        let second = det.detect(&frame).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rgb_frame_matches_gray_frame() {
        let det = detector(DetectionParams::default());
        let gray = edge_frame(100, 100, 50);
        let rgb_data: Vec<u8> = gray.data().iter().flat_map(|&v| [v, v, v]).collect();
        let rgb = Frame::new(rgb_data, 100, 100, 3);
        let rgba_data: Vec<u8> = gray.data().iter().flat_map(|&v| [v, v, v, 255]).collect();
        let rgba = Frame::new(rgba_data, 100, 100, 4);

        let expected = det.detect(&gray).unwrap();
        assert_eq!(det.detect(&rgb).unwrap(), expected);
        assert_eq!(det.detect(&rgba).unwrap(), expected);
    }

    #[test]
    fn test_grouping_reduces_raw_hits() {
        let frame = edge_frame(100, 100, 50);
        let raw = detector(DetectionParams::default().with_min_neighbors(0))
            .detect(&frame)
            .unwrap();
        let grouped = detector(DetectionParams::default()).detect(&frame).unwrap();
        assert!(raw.len() > grouped.len());
    }

    #[test]
    fn test_max_size_caps_window() {
        let frame = edge_frame(100, 100, 50);
        let unbounded = detector(DetectionParams::default().with_min_neighbors(0))
            .detect(&frame)
            .unwrap();
        assert!(unbounded.iter().any(|f| f.width > 60));

        let capped = detector(
            DetectionParams::default()
                .with_min_neighbors(0)
                .with_max_size(60, 60),
        )
        .detect(&frame)
        .unwrap();
        assert!(!capped.is_empty());
        assert!(capped.iter().all(|f| f.width <= 60 && f.height <= 60));
    }

    #[test]
    fn test_min_size_skips_small_windows() {
        let frame = edge_frame(100, 100, 50);
        let det = detector(
            DetectionParams::default()
                .with_min_neighbors(0)
                .with_min_size(50, 50),
        );
        let faces = det.detect(&frame).unwrap();
        assert!(!faces.is_empty());
        // Scan windows are >= 50; clamping at the border trims at most a pixel.
        assert!(faces.iter().all(|f| f.height >= 49));
    }

    #[test]
    fn test_shared_across_threads() {
        let det = Arc::new(detector(DetectionParams::default()));
        let frame = edge_frame(100, 100, 50);
        let expected = det.detect(&frame).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let det = Arc::clone(&det);
                    let frame = &frame;
                    s.spawn(move || det.detect(frame).unwrap())
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_usable_as_trait_object() {
        let det: Box<dyn FaceDetector> = Box::new(detector(DetectionParams::default()));
        assert!(det.detect(&Frame::filled(64, 64, 0)).unwrap().is_empty());
    }

    // ── Stock OpenCV model ───────────────────────────────────────────

    #[test]
    fn test_frontalface_cascade_blank_image() {
        // OpenCV's data package is optional next to the library itself.
        let Some(path) = system_frontalface_cascade() else {
            eprintln!("skipping: {DEFAULT_CASCADE_NAME} not installed");
            return;
        };
        let det = CascadeFaceDetector::new(&path, DetectionParams::default()).unwrap();
        assert_eq!(det.window_size(), (24, 24));
        assert!(det.detect(&Frame::filled(100, 100, 0)).unwrap().is_empty());
        assert!(det.detect(&noise_frame(160, 120, 3)).is_ok());
    }
}
