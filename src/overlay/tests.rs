use super::*;
use crate::templates::TemplateStore;
use image::Rgba;
use std::time::Duration;

fn opaque_pixels(image: &image::RgbaImage) -> usize {
    image.pixels().filter(|p| p[3] > 0).count()
}

#[test]
fn test_layout_fits_height_in_landscape() {
    let template = TemplateStore::builtin().find("casual-standing").unwrap();
    let layout = SilhouetteLayout::fit(template, 1280, 720);

    assert!((layout.scale - 720.0 * 0.82 / 200.0).abs() < 1e-4);
    let drawn_width = 100.0 * layout.scale;
    assert!((layout.offset.0 * 2.0 + drawn_width - 1280.0).abs() < 1e-3);
}

#[test]
fn test_layout_caps_width_in_narrow_overlay() {
    let template = TemplateStore::builtin().find("casual-standing").unwrap();
    let layout = SilhouetteLayout::fit(template, 300, 1000);

    assert!((layout.scale - 300.0 * 0.58 / 100.0).abs() < 1e-4);
    assert!(200.0 * layout.scale < 1000.0 * 0.82);
}

#[test]
fn test_mirrored_placement_flips_x_only() {
    let template = TemplateStore::builtin().find("profile").unwrap();
    let layout = SilhouetteLayout::fit(template, 640, 480);

    let (x, y) = layout.place((20.0, 40.0), false);
    let (mx, my) = layout.place((20.0, 40.0), true);
    assert!((x + mx - 640.0).abs() < 1e-3);
    assert_eq!(y, my);
}

#[test]
fn test_guide_without_template() {
    let renderer = OverlayRenderer::new(300, 240, 1.0, Duration::from_millis(500));
    let image = renderer.render(None, false, Duration::ZERO);

    assert_eq!(image.dimensions(), (300, 240));
    // Thirds line and corner bracket are drawn, the centre stays clear
    assert!(image.get_pixel(100, 10)[3] > 0);
    assert!(image.get_pixel(1, 1)[3] > 0);
    assert_eq!(image.get_pixel(150, 120)[3], 0);
}

#[test]
fn test_silhouette_adds_to_guide() {
    let renderer = OverlayRenderer::new(320, 240, 1.0, Duration::from_millis(500));
    let template = TemplateStore::builtin().find("fashion-editorial").unwrap();

    let guide = renderer.render(None, false, Duration::ZERO);
    let full = renderer.render(Some(template), true, Duration::ZERO);
    assert!(opaque_pixels(&full) > opaque_pixels(&guide));
}

#[test]
fn test_zero_size_renders_nothing() {
    let renderer = OverlayRenderer::new(0, 0, 1.0, Duration::from_millis(500));
    let template = TemplateStore::builtin().find("profile").unwrap();
    assert_eq!(renderer.render(Some(template), false, Duration::ZERO).dimensions(), (0, 0));
}

#[test]
fn test_colour_eases_to_aligned() {
    let mut renderer = OverlayRenderer::new(64, 64, 1.0, Duration::from_millis(500));
    let start = Duration::from_secs(3);
    assert_eq!(renderer.silhouette_color(start), rgba(255, 255, 255, 0.85));

    renderer.set_aligned(true, start);
    let halfway = renderer.silhouette_color(start + Duration::from_millis(100));
    assert_ne!(halfway, rgba(255, 255, 255, 0.85));
    assert_ne!(halfway, Rgba([0x00, 0xFF, 0x66, 0xFF]));

    let settled = start + Duration::from_millis(500);
    assert_eq!(renderer.silhouette_color(settled), Rgba([0x00, 0xFF, 0x66, 0xFF]));
    assert_eq!(renderer.hint(settled).color, Rgba([0x00, 0xFF, 0x66, 0xFF]));
    assert_eq!(renderer.hint(settled).text, HINT_TEXT);

    renderer.set_aligned(false, settled);
    assert_eq!(renderer.alignment_level(settled), 1.0);
    assert_eq!(
        renderer.alignment_level(settled + Duration::from_millis(500)),
        0.0
    );
}

#[test]
fn test_tracker_drives_renderer_on_change_only() {
    let mut tracker = AlignmentTracker::new();
    let mut renderer = OverlayRenderer::new(64, 64, 1.0, Duration::from_millis(500));

    let mut now = Duration::ZERO;
    for aligned in [false, true, true, true, false] {
        if tracker.update(aligned) {
            renderer.set_aligned(aligned, now);
        }
        now += Duration::from_millis(50);
    }

    assert_eq!(tracker.changes(), 2);
    assert!(!tracker.is_aligned());
}
