use std::path::Path;

use image::DynamicImage;
use ndarray::ArrayView3;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("failed to read image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{width}x{height}x{channels} frame needs {expected} bytes, got {actual}")]
    Shape {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },
}

/// A caller-owned raster image: contiguous `u8` pixels in row-major order.
///
/// Supports 1 (gray), 3 (RGB) and 4 (RGBA) channels. Detectors only borrow
/// a frame for the duration of a call.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    /// Wrap a pixel buffer without checking its length; detectors reject
    /// mismatched frames with an input error.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Like [`Frame::new`], but fails when the buffer length is not
    /// `width * height * channels`.
    pub fn try_new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(FrameError::Shape {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::new(data, width, height, channels))
    }

    /// Single-channel frame filled with `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self::new(
            vec![value; (width as usize) * (height as usize)],
            width,
            height,
            1,
        )
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => {
                Self::new(gray.as_raw().clone(), gray.width(), gray.height(), 1)
            }
            DynamicImage::ImageRgba8(rgba) => {
                Self::new(rgba.as_raw().clone(), rgba.width(), rgba.height(), 4)
            }
            other => {
                let rgb = other.to_rgb8();
                let (w, h) = rgb.dimensions();
                Self::new(rgb.into_raw(), w, h, 3)
            }
        }
    }

    /// Decode an image file from disk.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let image = image::open(path).map_err(|e| FrameError::Decode {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::from_image(&image))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Returns `None` when the buffer length disagrees with the dimensions.
    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(self.shape(), &self.data).ok()
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
