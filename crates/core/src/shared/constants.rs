/// Frontal face cascade shipped with OpenCV.
pub const DEFAULT_CASCADE_NAME: &str = "haarcascade_frontalface_default.xml";

/// Directory checked first when resolving a cascade by name.
pub const MODEL_DIR_ENV: &str = "FACECASCADE_MODEL_DIR";

pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_NEIGHBORS: u32 = 3;
pub const DEFAULT_MIN_SIZE: (u32, u32) = (30, 30);

/// Places OpenCV packages install their cascade files.
pub const SYSTEM_CASCADE_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/usr/local/share/opencv/haarcascades",
    "/opt/homebrew/share/opencv4/haarcascades",
];
