use crate::overlay::{rgba, StrokeMask};
use crate::pose::{NormalizedLandmark, PoseConnection};
use image::RgbaImage;

const SEGMENT_WIDTH: f32 = 3.0;
const JOINT_RADIUS: f32 = 4.0;

/// Draw joints and connecting segments of one body.
///
/// Segments with a missing endpoint are skipped. With `mirrored` set, x is
/// drawn at `(1 - x) * width` to line up with a mirrored preview.
pub fn draw_pose(
    image: &mut RgbaImage,
    landmarks: &[NormalizedLandmark],
    connections: &[PoseConnection],
    mirrored: bool,
) {
    let (width, height) = (image.width() as f32, image.height() as f32);
    let to_pixel = |landmark: &NormalizedLandmark| {
        (landmark.mirrored_x(mirrored) * width, landmark.y * height)
    };

    let mut segments = StrokeMask::new(image.width(), image.height());
    for connection in connections {
        if let (Some(a), Some(b)) = (landmarks.get(connection.start), landmarks.get(connection.end)) {
            segments.line(to_pixel(a), to_pixel(b), SEGMENT_WIDTH);
        }
    }
    segments.composite(image, rgba(0, 255, 136, 0.9));

    let mut joints = StrokeMask::new(image.width(), image.height());
    for landmark in landmarks {
        joints.dot(to_pixel(landmark), JOINT_RADIUS);
    }
    joints.composite(image, rgba(0, 255, 136, 0.95));
}
