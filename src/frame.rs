use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of decoded video frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// 8-bit RGBA, 4 bytes per pixel
    Rgba8,
    /// 8-bit RGB, 3 bytes per pixel
    Rgb24,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Rgba8 => 4,
            FrameFormat::Rgb24 => 3,
        }
    }
}

/// A decoded video frame as exposed by the live stream
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Raw pixel data (shared ownership, frames are handed to several consumers)
    pub data: Arc<Vec<u8>>,
    /// Native frame width in pixels
    pub width: u32,
    /// Native frame height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: FrameFormat,
}

impl FrameData {
    /// Create a new frame data instance
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Expected buffer size for the frame's dimensions and format
    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Whether the frame carries usable decoded pixels
    pub fn has_decoded_data(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.expected_size()
    }

    /// Copy the frame into an RGBA raster at native resolution
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        if !self.has_decoded_data() {
            return None;
        }

        match self.format {
            FrameFormat::Rgba8 => RgbaImage::from_raw(self.width, self.height, self.data.to_vec()),
            FrameFormat::Rgb24 => RgbImage::from_raw(self.width, self.height, self.data.to_vec())
                .map(|rgb| DynamicImage::ImageRgb8(rgb).to_rgba8()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format_properties() {
        assert_eq!(FrameFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(FrameFormat::Rgb24.bytes_per_pixel(), 3);
    }

    #[test]
    fn test_decoded_data_check() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0; 4 * 4 * 4], 4, 4, FrameFormat::Rgba8);
        assert!(frame.has_decoded_data());

        let truncated = FrameData::new(2, SystemTime::now(), vec![0; 10], 4, 4, FrameFormat::Rgba8);
        assert!(!truncated.has_decoded_data());
        assert!(truncated.to_rgba_image().is_none());

        let empty = FrameData::new(3, SystemTime::now(), Vec::new(), 0, 0, FrameFormat::Rgba8);
        assert!(!empty.has_decoded_data());
    }

    #[test]
    fn test_rgb_frame_converts_to_rgba() {
        let frame = FrameData::new(
            1,
            SystemTime::now(),
            vec![10, 20, 30, 40, 50, 60],
            2,
            1,
            FrameFormat::Rgb24,
        );
        let image = frame.to_rgba_image().unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0).0, [40, 50, 60, 255]);
    }
}
