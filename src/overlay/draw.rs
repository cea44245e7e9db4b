use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

const COVERED: Luma<u8> = Luma([255]);

/// Coverage mask for one stroke layer.
///
/// Strokes are stamped into the mask first and composited once, so
/// overlapping segments of a translucent stroke do not darken where they meet.
pub struct StrokeMask {
    mask: GrayImage,
}

impl StrokeMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        x < self.mask.width() && y < self.mask.height() && self.mask.get_pixel(x, y)[0] > 0
    }

    /// Segment of the given width with round ends
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32) {
        let margin = (width / 2.0).max(1.0);
        let Some((from, to)) = self.clip(from, to, margin) else {
            return;
        };

        if width <= 1.5 {
            draw_line_segment_mut(&mut self.mask, from, to, COVERED);
            return;
        }

        let radius = width / 2.0;
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.dot((from.0 + dx * t, from.1 + dy * t), radius);
        }
    }

    /// Portion of a segment that can touch the mask, with `margin` of slack on
    /// every side. Stroke cost is bounded by the mask size, not the endpoints.
    fn clip(&self, from: (f32, f32), to: (f32, f32), margin: f32) -> Option<((f32, f32), (f32, f32))> {
        if !(from.0.is_finite() && from.1.is_finite() && to.0.is_finite() && to.1.is_finite()) {
            return None;
        }

        let (min_x, max_x) = (-margin, self.mask.width() as f32 + margin);
        let (min_y, max_y) = (-margin, self.mask.height() as f32 + margin);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);

        let mut enter = 0.0f32;
        let mut exit = 1.0f32;
        for (p, q) in [
            (-dx, from.0 - min_x),
            (dx, max_x - from.0),
            (-dy, from.1 - min_y),
            (dy, max_y - from.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                enter = enter.max(r);
            } else {
                exit = exit.min(r);
            }
            if enter > exit {
                return None;
            }
        }

        Some((
            (from.0 + dx * enter, from.1 + dy * enter),
            (from.0 + dx * exit, from.1 + dy * exit),
        ))
    }

    pub fn polyline(&mut self, points: &[(f32, f32)], width: f32) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], width);
        }
    }

    pub fn dot(&mut self, center: (f32, f32), radius: f32) {
        let reach = radius.max(0.0) + 1.0;
        if !(center.0 > -reach
            && center.1 > -reach
            && center.0 < self.mask.width() as f32 + reach
            && center.1 < self.mask.height() as f32 + reach)
        {
            return;
        }

        draw_filled_circle_mut(
            &mut self.mask,
            (center.0.round() as i32, center.1.round() as i32),
            radius.round().max(0.0) as i32,
            COVERED,
        );
    }

    /// Blend `color` onto `target` wherever the mask is covered
    pub fn composite(&self, target: &mut RgbaImage, color: Rgba<u8>) {
        let width = self.mask.width().min(target.width());
        let height = self.mask.height().min(target.height());

        for y in 0..height {
            for x in 0..width {
                let coverage = self.mask.get_pixel(x, y)[0];
                if coverage == 0 {
                    continue;
                }
                let mut paint = color;
                paint[3] = (u16::from(color[3]) * u16::from(coverage) / 255) as u8;
                target.get_pixel_mut(x, y).blend(&paint);
            }
        }
    }
}

/// RGBA colour from components, with alpha in [0, 1]
pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Rgba<u8> {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}
