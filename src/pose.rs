//! Body landmark types shared by the detector, matcher and renderers.

use serde::{Deserialize, Serialize};

/// Number of joints in the 33-point body model.
pub const BODY_LANDMARK_COUNT: usize = 33;

/// Normalized coordinates a detector may report for joints just out of view.
const PLAUSIBLE_RANGE: std::ops::RangeInclusive<f32> = -1.0..=2.0;

/// A detected joint position, normalized to the frame (x, y in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth, when the detector provides one
    pub z: Option<f32>,
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f32::is_finite)
    }

    /// Within one frame-width of the visible area on every side
    pub fn is_plausible(&self) -> bool {
        PLAUSIBLE_RANGE.contains(&self.x) && PLAUSIBLE_RANGE.contains(&self.y)
    }

    /// Horizontal coordinate as seen in a mirrored preview
    pub fn mirrored_x(&self, mirrored: bool) -> f32 {
        if mirrored {
            1.0 - self.x
        } else {
            self.x
        }
    }
}

/// Per-frame detector output: one landmark set per detected body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseDetectionResult {
    pub landmarks: Vec<Vec<NormalizedLandmark>>,
}

impl PoseDetectionResult {
    pub fn single(landmarks: Vec<NormalizedLandmark>) -> Self {
        Self {
            landmarks: vec![landmarks],
        }
    }

    /// Landmarks of the first detected body; single-subject mode ignores the rest
    pub fn primary(&self) -> Option<&[NormalizedLandmark]> {
        self.landmarks
            .first()
            .map(Vec::as_slice)
            .filter(|landmarks| !landmarks.is_empty())
    }

    /// False when any coordinate is NaN or infinite, or a joint lies
    /// implausibly far outside the frame
    pub fn is_well_formed(&self) -> bool {
        self.landmarks
            .iter()
            .flatten()
            .all(|landmark| landmark.is_finite() && landmark.is_plausible())
    }
}

/// A segment between two joints, used only for skeleton rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseConnection {
    pub start: usize,
    pub end: usize,
}

const fn link(start: usize, end: usize) -> PoseConnection {
    PoseConnection { start, end }
}

/// Joint indices of the 33-point body model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyJoint {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyJoint {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Skeleton segments of the 33-point body model.
pub const POSE_CONNECTIONS: [PoseConnection; 35] = [
    link(0, 1),
    link(1, 2),
    link(2, 3),
    link(3, 7),
    link(0, 4),
    link(4, 5),
    link(5, 6),
    link(6, 8),
    link(9, 10),
    link(11, 12),
    link(11, 13),
    link(13, 15),
    link(15, 17),
    link(15, 19),
    link(15, 21),
    link(17, 19),
    link(12, 14),
    link(14, 16),
    link(16, 18),
    link(16, 20),
    link(16, 22),
    link(18, 20),
    link(11, 23),
    link(12, 24),
    link(23, 24),
    link(23, 25),
    link(24, 26),
    link(25, 27),
    link(26, 28),
    link(27, 29),
    link(28, 30),
    link(29, 31),
    link(30, 32),
    link(27, 31),
    link(28, 32),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_ignores_additional_bodies() {
        let result = PoseDetectionResult {
            landmarks: vec![
                vec![NormalizedLandmark::new(0.1, 0.2)],
                vec![NormalizedLandmark::new(0.9, 0.9)],
            ],
        };
        assert_eq!(result.primary().unwrap()[0].x, 0.1);

        assert!(PoseDetectionResult::default().primary().is_none());
        assert!(PoseDetectionResult::single(Vec::new()).primary().is_none());
    }

    #[test]
    fn test_malformed_result_detection() {
        let good = PoseDetectionResult::single(vec![NormalizedLandmark::with_depth(0.5, 0.5, -0.1)]);
        assert!(good.is_well_formed());

        let bad = PoseDetectionResult::single(vec![NormalizedLandmark::new(f32::NAN, 0.5)]);
        assert!(!bad.is_well_formed());

        let out_of_view = PoseDetectionResult::single(vec![NormalizedLandmark::new(1.3, -0.2)]);
        assert!(out_of_view.is_well_formed());

        let far_off = PoseDetectionResult::single(vec![
            NormalizedLandmark::new(0.5, 0.5),
            NormalizedLandmark::new(2.0e5, 0.5),
        ]);
        assert!(!far_off.is_well_formed());
    }

    #[test]
    fn test_connections_reference_known_joints() {
        assert!(POSE_CONNECTIONS
            .iter()
            .all(|c| c.start < BODY_LANDMARK_COUNT && c.end < BODY_LANDMARK_COUNT));
        assert_eq!(BodyJoint::RightHip.index(), 24);
    }
}
