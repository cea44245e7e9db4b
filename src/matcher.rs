//! Quorum-based comparison of detected landmarks against a template.
//!
//! The tolerance is absolute in normalized frame units, so a subject standing
//! far from the camera (small body) matches more loosely than one standing
//! close. Body-size-relative tolerance is a known accuracy gap.

use crate::config::MatcherConfig;
use crate::pose::NormalizedLandmark;
use crate::templates::{PoseTemplate, ReferenceLandmark};

/// Per-axis distance within which a joint counts as matched
pub const ALIGNMENT_TOLERANCE: f32 = 0.22;

/// Fraction of reference points that must match
pub const ALIGNMENT_QUORUM: f64 = 0.7;

/// Alignment matcher with tunable tolerance and quorum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentMatcher {
    tolerance: f32,
    quorum: f64,
}

impl AlignmentMatcher {
    pub fn new(tolerance: f32, quorum: f64) -> Self {
        Self { tolerance, quorum }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn quorum(&self) -> f64 {
        self.quorum
    }

    /// Matches needed for `total` reference points
    pub fn required_matches(&self, total: usize) -> usize {
        (total as f64 * self.quorum).ceil() as usize
    }

    /// Whether `landmarks` sit on at least a quorum of `reference` points.
    ///
    /// With `mirrored` set, landmark x is flipped to `1 - x` before comparing,
    /// since front cameras preview a mirror image of the sensor frame. Missing
    /// joints cannot match but still count toward the quorum denominator.
    pub fn is_aligned(
        &self,
        landmarks: &[NormalizedLandmark],
        reference: &[ReferenceLandmark],
        mirrored: bool,
    ) -> bool {
        if landmarks.is_empty() || reference.is_empty() {
            return false;
        }

        let matched = reference
            .iter()
            .filter(|point| {
                landmarks.get(point.index).is_some_and(|landmark| {
                    let dx = (landmark.mirrored_x(mirrored) - point.x).abs();
                    let dy = (landmark.y - point.y).abs();
                    dx <= self.tolerance && dy <= self.tolerance
                })
            })
            .count();

        matched >= self.required_matches(reference.len())
    }

    /// Alignment against a template; templates without reference points never align
    pub fn check_template(
        &self,
        landmarks: &[NormalizedLandmark],
        template: &PoseTemplate,
        mirrored: bool,
    ) -> bool {
        self.is_aligned(landmarks, template.reference_landmarks, mirrored)
    }
}

impl Default for AlignmentMatcher {
    fn default() -> Self {
        Self::new(ALIGNMENT_TOLERANCE, ALIGNMENT_QUORUM)
    }
}

impl From<MatcherConfig> for AlignmentMatcher {
    fn from(config: MatcherConfig) -> Self {
        Self::new(config.tolerance, config.quorum)
    }
}

/// Alignment with the default tolerance (0.22) and quorum (70%)
pub fn is_aligned(
    landmarks: &[NormalizedLandmark],
    reference: &[ReferenceLandmark],
    mirrored: bool,
) -> bool {
    AlignmentMatcher::default().is_aligned(landmarks, reference, mirrored)
}

/// Template alignment with the default tolerance and quorum
pub fn check_template_alignment(
    landmarks: &[NormalizedLandmark],
    template: &PoseTemplate,
    mirrored: bool,
) -> bool {
    AlignmentMatcher::default().check_template(landmarks, template, mirrored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::BODY_LANDMARK_COUNT;
    use crate::templates::{OverlayGeometry, TemplateStore};

    fn reference(points: &[(usize, f32, f32)]) -> Vec<ReferenceLandmark> {
        points
            .iter()
            .map(|&(index, x, y)| ReferenceLandmark { index, x, y })
            .collect()
    }

    /// A full body with every joint parked far away from any reference
    fn far_body() -> Vec<NormalizedLandmark> {
        vec![NormalizedLandmark::new(0.98, 0.98); BODY_LANDMARK_COUNT]
    }

    fn five_points() -> Vec<ReferenceLandmark> {
        reference(&[
            (0, 0.5, 0.22),
            (11, 0.35, 0.38),
            (12, 0.65, 0.38),
            (23, 0.42, 0.58),
            (24, 0.58, 0.58),
        ])
    }

    fn body_matching(points: &[ReferenceLandmark], count: usize) -> Vec<NormalizedLandmark> {
        let mut body = far_body();
        for point in points.iter().take(count) {
            body[point.index] = NormalizedLandmark::new(point.x + 0.05, point.y - 0.05);
        }
        body
    }

    #[test]
    fn test_quorum_of_five() {
        let points = five_points();
        assert_eq!(AlignmentMatcher::default().required_matches(5), 4);

        assert!(is_aligned(&body_matching(&points, 5), &points, false));
        assert!(is_aligned(&body_matching(&points, 4), &points, false));
        assert!(!is_aligned(&body_matching(&points, 3), &points, false));
    }

    #[test]
    fn test_required_matches_rounding() {
        let matcher = AlignmentMatcher::default();
        assert_eq!(matcher.required_matches(1), 1);
        assert_eq!(matcher.required_matches(3), 3);
        assert_eq!(matcher.required_matches(10), 7);
        assert_eq!(matcher.required_matches(20), 14);
    }

    #[test]
    fn test_mirroring_inverts_x() {
        let points = reference(&[(0, 0.7, 0.5)]);
        let mut body = far_body();
        body[0] = NormalizedLandmark::new(0.3, 0.5);

        assert!(is_aligned(&body, &points, true));
        assert!(!is_aligned(&body, &points, false));
    }

    #[test]
    fn test_y_is_never_flipped() {
        let points = reference(&[(0, 0.5, 0.2)]);
        let mut body = far_body();
        body[0] = NormalizedLandmark::new(0.5, 0.8);

        assert!(!is_aligned(&body, &points, true));
        assert!(!is_aligned(&body, &points, false));
    }

    #[test]
    fn test_tolerance_applies_per_axis() {
        let points = reference(&[(0, 0.5, 0.5)]);
        let mut body = far_body();

        body[0] = NormalizedLandmark::new(0.7, 0.7);
        assert!(is_aligned(&body, &points, false));

        body[0] = NormalizedLandmark::new(0.75, 0.5);
        assert!(!is_aligned(&body, &points, false));

        let strict = AlignmentMatcher::new(0.1, 0.7);
        body[0] = NormalizedLandmark::new(0.65, 0.5);
        assert!(!strict.is_aligned(&body, &points, false));
        assert!(AlignmentMatcher::default().is_aligned(&body, &points, false));
    }

    #[test]
    fn test_missing_joints_cannot_match() {
        let points = five_points();
        // Only the nose is present; hips and shoulders are beyond the detected set
        let body = vec![NormalizedLandmark::new(0.5, 0.22)];
        assert!(!is_aligned(&body, &points, false));

        let lenient = AlignmentMatcher::new(ALIGNMENT_TOLERANCE, 0.2);
        assert!(lenient.is_aligned(&body, &points, false));
    }

    #[test]
    fn test_empty_inputs_never_align() {
        let points = five_points();
        assert!(!is_aligned(&[], &points, false));
        assert!(!is_aligned(&[], &points, true));
        assert!(!is_aligned(&far_body(), &[], false));

        static EMPTY: PoseTemplate = PoseTemplate {
            id: "empty",
            name: "Empty",
            geometry: OverlayGeometry {
                view_box: (100.0, 200.0),
                stroke_width: 1.0,
                paths: &[],
            },
            reference_landmarks: &[],
        };
        assert!(!check_template_alignment(&body_matching(&points, 5), &EMPTY, false));
    }

    #[test]
    fn test_repeated_calls_are_stable() {
        let points = five_points();
        let body = body_matching(&points, 4);
        let first = is_aligned(&body, &points, true);
        for _ in 0..10 {
            assert_eq!(is_aligned(&body, &points, true), first);
        }
    }

    #[test]
    fn test_builtin_template_alignment() {
        let template = TemplateStore::builtin().find("casual-standing").unwrap();
        let mut body = far_body();
        for point in template.reference_landmarks {
            // Sensor-space coordinates of a subject posing in front of a mirrored preview
            body[point.index] = NormalizedLandmark::new(1.0 - point.x, point.y);
        }

        assert!(check_template_alignment(&body, template, true));
        let matcher = AlignmentMatcher::from(MatcherConfig::default());
        assert!(matcher.check_template(&body, template, true));
    }
}
