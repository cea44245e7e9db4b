//! Built-in catalog of reference poses.
//!
//! The catalog is process-wide read-only data: every template is a `'static`
//! value, so the matcher and the overlay renderer share `&'static PoseTemplate`
//! without locking.

use crate::pose::BodyJoint;

/// Where a joint is expected to appear, in un-mirrored normalized template space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLandmark {
    pub index: usize,
    pub x: f32,
    pub y: f32,
}

const fn anchor(joint: BodyJoint, x: f32, y: f32) -> ReferenceLandmark {
    ReferenceLandmark {
        index: joint.index(),
        x,
        y,
    }
}

/// Outline drawing commands in view-box units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new contour at (x, y)
    MoveTo(f32, f32),
    /// Quadratic curve: control point, end point
    QuadTo(f32, f32, f32, f32),
    /// Cubic curve: two control points, end point
    CubicTo(f32, f32, f32, f32, f32, f32),
}

/// Line-art silhouette drawn over the live preview
#[derive(Debug, Clone, Copy)]
pub struct OverlayGeometry {
    /// Width and height of the drawing's coordinate space
    pub view_box: (f32, f32),
    /// Stroke width in view-box units
    pub stroke_width: f32,
    pub paths: &'static [&'static [PathCommand]],
}

impl OverlayGeometry {
    /// Flatten every contour into a polyline, `steps` segments per curve
    pub fn polylines(&self, steps: usize) -> Vec<Vec<(f32, f32)>> {
        let steps = steps.max(1);
        let mut lines = Vec::with_capacity(self.paths.len());

        for path in self.paths {
            let mut line: Vec<(f32, f32)> = Vec::new();
            let mut cursor = (0.0, 0.0);

            for command in path.iter() {
                match *command {
                    PathCommand::MoveTo(x, y) => {
                        if line.len() > 1 {
                            lines.push(std::mem::take(&mut line));
                        }
                        line.clear();
                        cursor = (x, y);
                        line.push(cursor);
                    }
                    PathCommand::QuadTo(cx, cy, x, y) => {
                        let p0 = cursor;
                        for i in 1..=steps {
                            let t = i as f32 / steps as f32;
                            let u = 1.0 - t;
                            line.push((
                                u * u * p0.0 + 2.0 * u * t * cx + t * t * x,
                                u * u * p0.1 + 2.0 * u * t * cy + t * t * y,
                            ));
                        }
                        cursor = (x, y);
                    }
                    PathCommand::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                        let p0 = cursor;
                        for i in 1..=steps {
                            let t = i as f32 / steps as f32;
                            let u = 1.0 - t;
                            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                            line.push((
                                a * p0.0 + b * c1x + c * c2x + d * x,
                                a * p0.1 + b * c1y + c * c2y + d * y,
                            ));
                        }
                        cursor = (x, y);
                    }
                }
            }

            if line.len() > 1 {
                lines.push(line);
            }
        }

        lines
    }
}

/// A named reference pose
#[derive(Debug)]
pub struct PoseTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub geometry: OverlayGeometry,
    /// Joints checked for alignment; empty means the template never aligns
    pub reference_landmarks: &'static [ReferenceLandmark],
}

use BodyJoint::{LeftHip, LeftShoulder, Nose, RightHip, RightShoulder};
use PathCommand::{CubicTo as C, MoveTo as M, QuadTo as Q};

/// Standing figure view box shared by the built-in silhouettes
const FIGURE_VIEW_BOX: (f32, f32) = (100.0, 200.0);
const FIGURE_STROKE: f32 = 1.6;

pub static POSE_TEMPLATES: [PoseTemplate; 3] = [
    PoseTemplate {
        id: "casual-standing",
        name: "Casual Standing",
        reference_landmarks: &[
            anchor(Nose, 0.5, 0.22),
            anchor(LeftShoulder, 0.35, 0.38),
            anchor(RightShoulder, 0.65, 0.38),
            anchor(LeftHip, 0.42, 0.58),
            anchor(RightHip, 0.58, 0.58),
        ],
        geometry: OverlayGeometry {
            view_box: FIGURE_VIEW_BOX,
            stroke_width: FIGURE_STROKE,
            paths: &[
                &[
                    M(50.0, 10.0),
                    Q(58.0, 6.0, 62.0, 14.0),
                    Q(64.0, 22.0, 60.0, 28.0),
                    Q(56.0, 32.0, 50.0, 32.0),
                    Q(44.0, 32.0, 40.0, 28.0),
                    Q(36.0, 22.0, 38.0, 14.0),
                    Q(42.0, 6.0, 50.0, 10.0),
                ],
                &[
                    M(50.0, 32.0),
                    C(50.0, 40.0, 50.0, 52.0, 50.0, 62.0),
                    C(49.0, 78.0, 48.0, 94.0, 48.0, 108.0),
                ],
                &[
                    M(50.0, 42.0),
                    C(36.0, 44.0, 26.0, 56.0, 24.0, 72.0),
                    C(22.0, 86.0, 26.0, 98.0, 32.0, 106.0),
                ],
                &[
                    M(50.0, 42.0),
                    C(64.0, 44.0, 74.0, 56.0, 76.0, 72.0),
                    C(78.0, 86.0, 74.0, 98.0, 68.0, 106.0),
                ],
                &[
                    M(48.0, 108.0),
                    C(40.0, 112.0, 32.0, 132.0, 28.0, 162.0),
                    C(26.0, 184.0, 28.0, 198.0, 30.0, 200.0),
                ],
                &[
                    M(50.0, 108.0),
                    C(58.0, 112.0, 66.0, 132.0, 70.0, 162.0),
                    C(72.0, 184.0, 70.0, 198.0, 68.0, 200.0),
                ],
            ],
        },
    },
    PoseTemplate {
        id: "fashion-editorial",
        name: "Fashion Editorial",
        reference_landmarks: &[
            anchor(Nose, 0.5, 0.2),
            anchor(LeftShoulder, 0.38, 0.36),
            anchor(RightShoulder, 0.62, 0.34),
            anchor(LeftHip, 0.42, 0.56),
            anchor(RightHip, 0.58, 0.56),
        ],
        geometry: OverlayGeometry {
            view_box: FIGURE_VIEW_BOX,
            stroke_width: FIGURE_STROKE,
            paths: &[
                &[
                    M(50.0, 10.0),
                    Q(60.0, 6.0, 64.0, 14.0),
                    Q(66.0, 22.0, 62.0, 28.0),
                    Q(56.0, 32.0, 50.0, 30.0),
                    Q(44.0, 30.0, 40.0, 26.0),
                    Q(38.0, 20.0, 40.0, 14.0),
                    Q(44.0, 8.0, 50.0, 10.0),
                ],
                &[
                    M(50.0, 30.0),
                    C(52.0, 38.0, 50.0, 52.0, 50.0, 62.0),
                    C(48.0, 80.0, 48.0, 98.0, 50.0, 108.0),
                ],
                &[
                    M(50.0, 38.0),
                    C(36.0, 34.0, 22.0, 42.0, 18.0, 56.0),
                    C(14.0, 68.0, 18.0, 80.0, 26.0, 88.0),
                ],
                &[
                    M(50.0, 42.0),
                    C(66.0, 40.0, 80.0, 52.0, 84.0, 66.0),
                    C(86.0, 76.0, 82.0, 84.0, 76.0, 88.0),
                    C(70.0, 90.0, 66.0, 86.0, 64.0, 82.0),
                ],
                &[
                    M(48.0, 108.0),
                    C(40.0, 112.0, 32.0, 132.0, 30.0, 162.0),
                    C(28.0, 182.0, 30.0, 198.0, 32.0, 200.0),
                ],
                &[
                    M(52.0, 108.0),
                    C(60.0, 114.0, 68.0, 136.0, 70.0, 162.0),
                    C(70.0, 182.0, 68.0, 198.0, 66.0, 200.0),
                ],
            ],
        },
    },
    PoseTemplate {
        id: "profile",
        name: "Profile",
        reference_landmarks: &[
            anchor(Nose, 0.35, 0.2),
            anchor(LeftShoulder, 0.28, 0.35),
            anchor(RightShoulder, 0.42, 0.35),
            anchor(LeftHip, 0.3, 0.56),
            anchor(RightHip, 0.4, 0.56),
        ],
        geometry: OverlayGeometry {
            view_box: FIGURE_VIEW_BOX,
            stroke_width: FIGURE_STROKE,
            paths: &[
                &[
                    M(30.0, 20.0),
                    Q(22.0, 16.0, 16.0, 24.0),
                    Q(12.0, 32.0, 14.0, 40.0),
                    Q(16.0, 46.0, 22.0, 48.0),
                    Q(30.0, 50.0, 38.0, 46.0),
                    Q(44.0, 40.0, 44.0, 32.0),
                    Q(44.0, 24.0, 38.0, 20.0),
                    Q(34.0, 16.0, 30.0, 20.0),
                ],
                &[
                    M(28.0, 48.0),
                    C(24.0, 56.0, 22.0, 68.0, 20.0, 80.0),
                    C(18.0, 100.0, 20.0, 120.0, 22.0, 140.0),
                    C(24.0, 168.0, 26.0, 192.0, 26.0, 200.0),
                ],
                &[
                    M(30.0, 52.0),
                    C(34.0, 60.0, 36.0, 78.0, 34.0, 98.0),
                    C(32.0, 120.0, 32.0, 148.0, 34.0, 178.0),
                    C(36.0, 198.0, 38.0, 200.0, 38.0, 200.0),
                ],
                &[M(20.0, 78.0), C(12.0, 82.0, 8.0, 92.0, 10.0, 102.0)],
                &[M(30.0, 56.0), C(40.0, 60.0, 48.0, 72.0, 50.0, 84.0)],
                &[
                    M(22.0, 140.0),
                    C(16.0, 144.0, 12.0, 164.0, 10.0, 190.0),
                    C(10.0, 200.0, 12.0, 200.0, 14.0, 200.0),
                ],
                &[
                    M(34.0, 140.0),
                    C(40.0, 144.0, 44.0, 164.0, 46.0, 190.0),
                    C(48.0, 200.0, 46.0, 200.0, 44.0, 200.0),
                ],
            ],
        },
    },
];

/// Read-only view over a template catalog
#[derive(Debug, Clone, Copy)]
pub struct TemplateStore {
    templates: &'static [PoseTemplate],
}

impl TemplateStore {
    /// The built-in catalog
    pub fn builtin() -> Self {
        Self {
            templates: &POSE_TEMPLATES,
        }
    }

    pub fn with_templates(templates: &'static [PoseTemplate]) -> Self {
        Self { templates }
    }

    pub fn all(&self) -> &'static [PoseTemplate] {
        self.templates
    }

    pub fn find(&self, id: &str) -> Option<&'static PoseTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Template at a zero-based catalog position
    pub fn get(&self, position: usize) -> Option<&'static PoseTemplate> {
        self.templates.get(position)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}
