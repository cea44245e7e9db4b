use crate::camera::DisplaySize;
use image::RgbaImage;

/// Frame-synced drawing surface, sized to the video's on-screen pixels
pub struct RenderSurface {
    image: RgbaImage,
    display: Option<DisplaySize>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            display: None,
        }
    }

    /// Match the backing store to `display`; returns whether it was reallocated
    pub fn resize(&mut self, display: DisplaySize) -> bool {
        self.display = Some(display);
        let (width, height) = display.pixel_size();
        if self.image.dimensions() == (width, height) {
            return false;
        }
        self.image = RgbaImage::new(width, height);
        true
    }

    /// A zero-sized surface cannot be drawn on
    pub fn is_available(&self) -> bool {
        self.image.width() > 0 && self.image.height() > 0
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = [0; 4];
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn display(&self) -> Option<DisplaySize> {
        self.display
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}
