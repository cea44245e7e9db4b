use super::draw::{rgba, StrokeMask};
use super::transition::{lerp_color, LevelTransition};
use crate::templates::PoseTemplate;
use image::{Rgba, RgbaImage};
use std::time::Duration;

pub const HINT_TEXT: &str = "Match the glowing outline to capture";

/// Silhouette height as a share of the overlay height
const SILHOUETTE_HEIGHT: f32 = 0.82;
/// Upper bound on silhouette width as a share of the overlay width
const SILHOUETTE_MAX_WIDTH: f32 = 0.58;
const BRACKET_ARM: f32 = 48.0;
const BRACKET_STROKE: f32 = 2.0;
const CURVE_STEPS: usize = 16;

fn neutral_color() -> Rgba<u8> {
    rgba(255, 255, 255, 0.85)
}

fn aligned_color() -> Rgba<u8> {
    Rgba([0x00, 0xFF, 0x66, 0xFF])
}

fn neutral_glow() -> Rgba<u8> {
    rgba(255, 255, 255, 0.2)
}

fn aligned_glow() -> Rgba<u8> {
    rgba(0, 255, 102, 0.5)
}

fn neutral_hint() -> Rgba<u8> {
    rgba(255, 255, 255, 0.5)
}

/// What the bottom hint looks like right now
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayHint {
    pub text: &'static str,
    pub color: Rgba<u8>,
}

/// Draws the static guide and the template silhouette.
///
/// Silhouette colour and glow are a function of the alignment flag only,
/// eased over the configured transition time.
pub struct OverlayRenderer {
    width: u32,
    height: u32,
    device_pixel_ratio: f32,
    level: LevelTransition,
}

impl OverlayRenderer {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32, transition: Duration) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: if device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
            level: LevelTransition::new(0.0, transition),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Start easing toward the aligned or neutral look
    pub fn set_aligned(&mut self, aligned: bool, now: Duration) {
        self.level.retarget(if aligned { 1.0 } else { 0.0 }, now);
    }

    /// 0.0 fully neutral, 1.0 fully aligned
    pub fn alignment_level(&self, now: Duration) -> f32 {
        self.level.level(now)
    }

    pub fn silhouette_color(&self, now: Duration) -> Rgba<u8> {
        lerp_color(neutral_color(), aligned_color(), self.level.level(now))
    }

    pub fn hint(&self, now: Duration) -> OverlayHint {
        OverlayHint {
            text: HINT_TEXT,
            color: lerp_color(neutral_hint(), aligned_color(), self.level.level(now)),
        }
    }

    /// Render the overlay onto a transparent image of the renderer's size
    pub fn render(&self, template: Option<&PoseTemplate>, mirrored: bool, now: Duration) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        if self.width == 0 || self.height == 0 {
            return image;
        }

        self.draw_guide(&mut image);
        if let Some(template) = template {
            self.draw_silhouette(&mut image, template, mirrored, now);
        }
        image
    }

    fn draw_guide(&self, image: &mut RgbaImage) {
        let (w, h) = (self.width as f32, self.height as f32);

        let mut grid = StrokeMask::new(self.width, self.height);
        for third in [1.0 / 3.0, 2.0 / 3.0] {
            grid.line((w * third, 0.0), (w * third, h - 1.0), 1.0);
            grid.line((0.0, h * third), (w - 1.0, h * third), 1.0);
        }
        grid.composite(image, rgba(255, 255, 255, 0.15));

        let arm = BRACKET_ARM * self.device_pixel_ratio;
        let stroke = BRACKET_STROKE * self.device_pixel_ratio;
        let inset = stroke / 2.0;
        let (left, top, right, bottom) = (inset, inset, w - 1.0 - inset, h - 1.0 - inset);

        let mut brackets = StrokeMask::new(self.width, self.height);
        for (corner, dx, dy) in [
            ((left, top), 1.0, 1.0),
            ((right, top), -1.0, 1.0),
            ((left, bottom), 1.0, -1.0),
            ((right, bottom), -1.0, -1.0),
        ] {
            brackets.polyline(
                &[
                    (corner.0 + dx * arm, corner.1),
                    corner,
                    (corner.0, corner.1 + dy * arm),
                ],
                stroke,
            );
        }
        brackets.composite(image, rgba(255, 255, 255, 0.5));
    }

    fn draw_silhouette(
        &self,
        image: &mut RgbaImage,
        template: &PoseTemplate,
        mirrored: bool,
        now: Duration,
    ) {
        let layout = SilhouetteLayout::fit(template, self.width, self.height);
        let strokes: Vec<Vec<(f32, f32)>> = template
            .geometry
            .polylines(CURVE_STEPS)
            .iter()
            .map(|line| line.iter().map(|&p| layout.place(p, mirrored)).collect())
            .collect();

        let level = self.level.level(now);
        let stroke = (template.geometry.stroke_width * layout.scale).max(1.0);
        // Glow spreads from 6 px (neutral) to 20 px (aligned)
        let glow = (6.0 + 14.0 * level) * self.device_pixel_ratio;

        let mut halo = StrokeMask::new(self.width, self.height);
        let mut outline = StrokeMask::new(self.width, self.height);
        for line in &strokes {
            halo.polyline(line, stroke + glow * 2.0);
            outline.polyline(line, stroke);
        }

        halo.composite(image, lerp_color(neutral_glow(), aligned_glow(), level));
        outline.composite(image, self.silhouette_color(now));
    }
}

/// Placement of a template's view box inside the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilhouetteLayout {
    pub scale: f32,
    pub offset: (f32, f32),
    pub overlay_width: f32,
}

impl SilhouetteLayout {
    /// Fit to 82% of the height, capped at 58% of the width, centred
    pub fn fit(template: &PoseTemplate, width: u32, height: u32) -> Self {
        let (view_w, view_h) = template.geometry.view_box;
        let (w, h) = (width as f32, height as f32);

        let scale = (h * SILHOUETTE_HEIGHT / view_h).min(w * SILHOUETTE_MAX_WIDTH / view_w);
        let offset = ((w - view_w * scale) / 2.0, (h - view_h * scale) / 2.0);

        Self {
            scale,
            offset,
            overlay_width: w,
        }
    }

    /// View-box point to overlay pixels, flipped horizontally when mirrored
    pub fn place(&self, (x, y): (f32, f32), mirrored: bool) -> (f32, f32) {
        let px = self.offset.0 + x * self.scale;
        let py = self.offset.1 + y * self.scale;
        if mirrored {
            (self.overlay_width - px, py)
        } else {
            (px, py)
        }
    }
}
