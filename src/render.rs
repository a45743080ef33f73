//! Frame rendering for the preview surface and the exported image.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut, text_size};

use crate::config::MarkerStyle;
use crate::mapping::{to_display_space, Scale};
use crate::state::Point;

/// Offset of an index label from its marker centre, in display pixels.
pub const LABEL_OFFSET: (i32, i32) = (6, -6);

/// Interpolation used whenever the preview differs from the source size.
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Produces the display frame for `points` over `base`.
///
/// The base image is resized by `scale`, then every point gets a filled
/// marker at its display-space position and, if labels are enabled and a
/// font is available, its zero-based index. `base` is never modified.
pub fn render(
    base: &RgbaImage,
    points: &[Point],
    scale: Scale,
    style: &MarkerStyle,
    font: Option<&FontArc>,
) -> RgbaImage {
    let mut frame = scaled_copy(base, scale);
    let marker = Rgba(style.color);
    let label = Rgba(style.label_color);
    let font = font.filter(|_| style.labels);

    for (index, point) in points.iter().enumerate() {
        let center = to_display_space(point.x, point.y, scale);
        draw_filled_circle_mut(&mut frame, center, style.radius, marker);

        if let Some(font) = font {
            let text = index.to_string();
            let px = PxScale::from(style.label_scale);
            let (_, height) = text_size(px, font, &text);
            // Anchor the text's bottom-left corner at the offset point.
            let x = center.0 + LABEL_OFFSET.0;
            let y = center.1 + LABEL_OFFSET.1 - height as i32;
            draw_text_mut(&mut frame, label, x, y, px, font, &text);
        }
    }

    frame
}

/// Draws plain filled circles at image-space positions, without scaling or
/// labels.
pub fn draw_points(base: &RgbaImage, points: &[Point], color: [u8; 4], radius: i32) -> RgbaImage {
    let mut output = base.clone();
    for point in points {
        draw_filled_circle_mut(&mut output, (point.x, point.y), radius, Rgba(color));
    }
    output
}

fn scaled_copy(base: &RgbaImage, scale: Scale) -> RgbaImage {
    if scale.is_identity() {
        return base.clone();
    }
    let (width, height) = scale.display_size(base.width(), base.height());
    imageops::resize(base, width, height, RESIZE_FILTER)
}

/// Loads the font used for index labels.
///
/// An explicit path is tried first, then a handful of common system fonts.
/// Returns `None` if nothing usable is found; labels are then skipped.
pub fn load_label_font(explicit: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = explicit {
        match read_font(path) {
            Some(font) => return Some(font),
            None => log::warn!("cannot load label font {}", path.display()),
        }
    }

    let candidates = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Helvetica.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    candidates
        .iter()
        .find_map(|candidate| read_font(Path::new(candidate)))
}

fn read_font(path: &Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use ab_glyph::PxScale;
    use imageproc::drawing::text_size;

    use super::{draw_points, load_label_font, render, LABEL_OFFSET};
    use crate::config::MarkerStyle;
    use crate::mapping::Scale;
    use crate::state::Point;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, WHITE)
    }

    #[test]
    fn render_is_pure_and_deterministic() {
        let base = canvas(64, 48);
        let snapshot = base.clone();
        let points = [Point::new(10, 10), Point::new(40, 30)];
        let style = MarkerStyle::default();

        let first = render(&base, &points, Scale::IDENTITY, &style, None);
        let second = render(&base, &points, Scale::IDENTITY, &style, None);

        assert_eq!(first.as_raw(), second.as_raw());
        assert_eq!(base.as_raw(), snapshot.as_raw());
    }

    #[test]
    fn markers_land_on_scaled_positions() {
        let base = canvas(100, 100);
        let style = MarkerStyle::default();
        let scale = Scale::new(0.5).expect("valid scale");

        let frame = render(&base, &[Point::new(40, 60)], scale, &style, None);

        assert_eq!(frame.dimensions(), (50, 50));
        assert_eq!(*frame.get_pixel(20, 30), Rgba(style.color));
        assert_eq!(*frame.get_pixel(2, 2), WHITE);
    }

    #[test]
    fn marker_radius_is_respected() {
        let base = canvas(40, 40);
        let style = MarkerStyle {
            radius: 3,
            ..MarkerStyle::default()
        };

        let frame = render(&base, &[Point::new(20, 20)], Scale::IDENTITY, &style, None);

        assert_eq!(*frame.get_pixel(23, 20), Rgba(style.color));
        assert_eq!(*frame.get_pixel(25, 20), WHITE);
    }

    #[test]
    fn labels_are_drawn_above_right_of_the_marker() {
        let Some(font) = load_label_font(None) else {
            eprintln!("no system font found, skipping label rendering test");
            return;
        };
        let base = canvas(80, 80);
        let snapshot = base.clone();
        let style = MarkerStyle {
            label_scale: 24.0,
            ..MarkerStyle::default()
        };
        let center = (20, 50);
        let points = [Point::new(center.0, center.1)];

        let first = render(&base, &points, Scale::IDENTITY, &style, Some(&font));
        let second = render(&base, &points, Scale::IDENTITY, &style, Some(&font));
        assert_eq!(first.as_raw(), second.as_raw());
        assert_eq!(base.as_raw(), snapshot.as_raw());

        // Text is alpha blended onto white, so strongly covered pixels lose
        // most of their red and blue while keeping green.
        let (width, height) = text_size(PxScale::from(style.label_scale), &font, "0");
        let left = (center.0 + LABEL_OFFSET.0).max(0) as u32;
        let bottom = (center.1 + LABEL_OFFSET.1 + 2) as u32;
        let top = bottom.saturating_sub(height + 4);
        let right = (left + width + 2).min(first.width());
        let labelled = (left..right)
            .flat_map(|x| (top..bottom).map(move |y| (x, y)))
            .map(|(x, y)| *first.get_pixel(x, y))
            .any(|Rgba([r, g, b, _])| g > 200 && r < 128 && b < 128);
        assert!(labelled, "no label pixels near the marker");

        let unlabelled = render(
            &base,
            &points,
            Scale::IDENTITY,
            &MarkerStyle {
                labels: false,
                ..style.clone()
            },
            Some(&font),
        );
        assert_ne!(first.as_raw(), unlabelled.as_raw());
    }

    #[test]
    fn empty_point_list_renders_plain_copy() {
        let base = canvas(16, 16);
        let frame = render(&base, &[], Scale::IDENTITY, &MarkerStyle::default(), None);
        assert_eq!(frame.as_raw(), base.as_raw());
    }

    #[test]
    fn draw_points_uses_image_coordinates() {
        let base = canvas(30, 30);
        let red = [255, 0, 0, 255];
        let output = draw_points(&base, &[Point::new(5, 25)], red, 2);
        assert_eq!(*output.get_pixel(5, 25), Rgba(red));
        assert_eq!(*base.get_pixel(5, 25), WHITE);
    }
}
