use crate::error::CaptureError;
use crate::frame::FrameData;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, DynamicImage, RgbaImage};

/// Copy the frame at native resolution, flipped horizontally when mirrored
pub(crate) fn rasterize(frame: &FrameData, mirrored: bool) -> Result<RgbaImage, CaptureError> {
    let image = frame
        .to_rgba_image()
        .ok_or_else(|| CaptureError::EncodingFailed {
            details: format!(
                "frame {} has no usable pixels ({}x{}, {} bytes)",
                frame.id,
                frame.width,
                frame.height,
                frame.data.len()
            ),
        })?;

    if mirrored {
        Ok(imageops::flip_horizontal(&image))
    } else {
        Ok(image)
    }
}

/// Compress to JPEG; alpha is dropped
pub(crate) fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| CaptureError::EncodingFailed {
            details: e.to_string(),
        })?;

    Ok(output)
}
