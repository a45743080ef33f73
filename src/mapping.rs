//! Conversion between display-space and image-space pixel coordinates.
//!
//! The preview shown to the operator may be a resized copy of the source
//! image. Every coordinate reported by the pointer lives in that preview
//! (display-space) and must be mapped back to pixel indices of the original
//! image (image-space) before it is recorded.
//!
//! Rounding is half-away-from-zero (`f64::round`) in both directions.

use serde::{Deserialize, Serialize};

use crate::state::Point;

/// A positive, finite scale factor from image-space to display-space.
///
/// `1.0` means the preview is shown at the source resolution.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Scale(f64);

impl Scale {
    pub const IDENTITY: Self = Self(1.0);

    /// Returns `None` for zero, negative, NaN or infinite factors.
    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }

    /// Size of the preview surface for a source image of `width` x `height`.
    /// Never collapses a dimension to zero.
    pub fn display_size(self, width: u32, height: u32) -> (u32, u32) {
        let scale_dim = |dim: u32| ((dim as f64 * self.0).round() as u32).max(1);
        (scale_dim(width), scale_dim(height))
    }

    /// Like [`Scale::display_size`], but `None` when a dimension does not
    /// fit in `u32`.
    pub fn checked_display_size(self, width: u32, height: u32) -> Option<(u32, u32)> {
        let scale_dim = |dim: u32| {
            let scaled = (dim as f64 * self.0).round();
            (scaled <= u32::MAX as f64).then(|| (scaled as u32).max(1))
        };
        Some((scale_dim(width)?, scale_dim(height)?))
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<f64> for Scale {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("scale must be a positive number, got {value}"))
    }
}

impl From<Scale> for f64 {
    fn from(value: Scale) -> Self {
        value.0
    }
}

/// Maps a pointer position on the preview to image pixel indices.
pub fn to_image_space(display_x: f64, display_y: f64, scale: Scale) -> (i32, i32) {
    (
        (display_x / scale.0).round() as i32,
        (display_y / scale.0).round() as i32,
    )
}

/// Maps image pixel indices to their position on the preview.
pub fn to_display_space(image_x: i32, image_y: i32, scale: Scale) -> (i32, i32) {
    (
        (image_x as f64 * scale.0).round() as i32,
        (image_y as f64 * scale.0).round() as i32,
    )
}

/// Convenience wrapper over [`to_image_space`] producing a [`Point`].
pub fn point_from_display(display_x: f64, display_y: f64, scale: Scale) -> Point {
    let (x, y) = to_image_space(display_x, display_y, scale);
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(factor: f64) -> Scale {
        Scale::new(factor).expect("valid scale")
    }

    #[test]
    fn rejects_non_positive_and_non_finite_scales() {
        assert!(Scale::new(0.0).is_none());
        assert!(Scale::new(-0.5).is_none());
        assert!(Scale::new(f64::NAN).is_none());
        assert!(Scale::new(f64::INFINITY).is_none());
        assert!(Scale::new(0.25).is_some());
    }

    #[test]
    fn half_scale_click_maps_to_double_coordinates() {
        assert_eq!(to_image_space(5.0, 5.0, scale(0.5)), (10, 10));
        assert_eq!(point_from_display(5.0, 5.0, scale(0.5)), Point::new(10, 10));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 3 / 2 = 1.5 -> 2, 5 / 2 = 2.5 -> 3
        assert_eq!(to_image_space(3.0, 5.0, scale(2.0)), (2, 3));
        assert_eq!(to_display_space(1, 3, scale(0.5)), (1, 2));
    }

    #[test]
    fn integral_scales_round_trip_exactly() {
        for factor in [1.0, 2.0, 3.0, 4.0] {
            let s = scale(factor);
            for x in [0, 1, 17, 255, 1023] {
                for y in [0, 3, 99, 480] {
                    let (dx, dy) = to_display_space(x, y, s);
                    assert_eq!(to_image_space(dx as f64, dy as f64, s), (x, y));
                }
            }
        }
    }

    #[test]
    fn fractional_scales_round_trip_within_rounding_bound() {
        for factor in [0.1, 0.25, 0.33, 0.5, 0.75, 1.5, 2.7] {
            let s = scale(factor);
            for x in (0..400).step_by(7) {
                for y in (0..300).step_by(11) {
                    let (dx, dy) = to_display_space(x, y, s);
                    let (rx, ry) = to_image_space(dx as f64, dy as f64, s);
                    let tolerance = (0.5 / factor).ceil() as i32;
                    assert!(
                        (rx - x).abs() <= tolerance.max(1) && (ry - y).abs() <= tolerance.max(1),
                        "scale {factor}: ({x}, {y}) -> ({rx}, {ry})"
                    );
                }
            }
        }
    }

    #[test]
    fn display_size_never_collapses() {
        assert_eq!(scale(0.5).display_size(100, 60), (50, 30));
        assert_eq!(scale(0.001).display_size(10, 10), (1, 1));
    }

    #[test]
    fn checked_display_size_detects_overflow() {
        assert_eq!(scale(2.0).checked_display_size(100, 50), Some((200, 100)));
        assert_eq!(scale(1e12).checked_display_size(100, 100), None);
    }

    #[test]
    fn deserializes_only_valid_scales() {
        #[derive(Deserialize)]
        struct Wrapper {
            scale: Scale,
        }
        let ok: Wrapper = toml::from_str("scale = 0.5").expect("valid scale");
        assert_eq!(ok.scale.get(), 0.5);
        assert!(toml::from_str::<Wrapper>("scale = -1.0").is_err());
    }
}
