//! Geometry helpers for the poster canvas.
//!
//! Two primitives live here:
//! - [`rounded_rect_path`] builds the closed outline used both to fill the
//!   frame and to clip the photo.
//! - [`cover_fit`] computes where an image must be drawn so that it fully
//!   covers a target box while keeping its aspect ratio.
//!
//! # Coordinate System
//!
//! - Units are output-canvas pixels
//! - Origin is the top-left corner, y grows downwards

use serde::{Deserialize, Serialize};
use tiny_skia::{Path, PathBuilder};

/// Control-point distance for approximating a quarter circle with a cubic curve.
const ARC_KAPPA: f32 = 0.552_284_8;

/// A named rectangle in output-canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
}

impl LayoutBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32, corner_radius: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            corner_radius,
        }
    }

    /// Right edge (x + width).
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (y + height).
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal centre of the box.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// Destination rectangle for drawing an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Build a closed rounded-rectangle path.
///
/// The outline starts on the top edge just right of the top-left corner and
/// runs clockwise. Each corner is a quarter circle of `radius`, approximated
/// by a single cubic curve. The radius is clamped to half the shorter side;
/// a radius of zero produces a plain rectangle made of straight edges only.
///
/// Returns `None` when the box has no area.
pub fn rounded_rect_path(target: &LayoutBox, radius: f32) -> Option<Path> {
    let LayoutBox {
        x,
        y,
        width: w,
        height: h,
        ..
    } = *target;

    if !(w > 0.0 && h > 0.0) {
        return None;
    }

    let r = if radius.is_finite() {
        radius.clamp(0.0, w.min(h) / 2.0)
    } else {
        0.0
    };
    let k = r * ARC_KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);

    // Top edge, then top-right corner
    pb.line_to(x + w - r, y);
    if r > 0.0 {
        pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    }

    // Right edge, then bottom-right corner
    pb.line_to(x + w, y + h - r);
    if r > 0.0 {
        pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    }

    // Bottom edge, then bottom-left corner
    pb.line_to(x + r, y + h);
    if r > 0.0 {
        pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    }

    // Left edge, then top-left corner back to the start
    pb.line_to(x, y + r);
    if r > 0.0 {
        pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    }

    pb.close();
    pb.finish()
}

/// Compute the draw rectangle that makes an image cover `target`.
///
/// If the image is relatively wider than the box, it is scaled to the box
/// height and centred horizontally; otherwise it is scaled to the box width
/// and centred vertically. Ratios are compared by cross-multiplication so that
/// an image with exactly the box's ratio lands on the box itself.
pub fn cover_fit(image_width: u32, image_height: u32, target: &LayoutBox) -> DrawRect {
    let iw = image_width.max(1) as f32;
    let ih = image_height.max(1) as f32;

    if iw * target.height > target.width * ih {
        // Wider than the box
        let height = target.height;
        let width = target.height * iw / ih;
        DrawRect {
            x: target.x - (width - target.width) / 2.0,
            y: target.y,
            width,
            height,
        }
    } else {
        // Taller than the box, or the same ratio
        let width = target.width;
        let height = target.width * ih / iw;
        DrawRect {
            x: target.x,
            y: target.y - (height - target.height) / 2.0,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::PathSegment;

    fn photo_box() -> LayoutBox {
        LayoutBox::new(98.0, 606.0, 344.0, 304.0, 22.0)
    }

    fn segments(path: &Path) -> Vec<PathSegment> {
        path.segments().collect()
    }

    #[test]
    fn test_rounded_rect_is_closed_and_starts_after_corner() {
        let b = LayoutBox::new(10.0, 20.0, 100.0, 50.0, 8.0);
        let path = rounded_rect_path(&b, 8.0).unwrap();
        let segs = segments(&path);

        match segs.first() {
            Some(PathSegment::MoveTo(p)) => {
                assert_eq!(p.x, 18.0);
                assert_eq!(p.y, 20.0);
            }
            other => panic!("expected MoveTo, got {:?}", other),
        }
        assert!(matches!(segs.last(), Some(PathSegment::Close)));
    }

    #[test]
    fn test_rounded_rect_has_four_corner_arcs() {
        let b = LayoutBox::new(0.0, 0.0, 100.0, 60.0, 10.0);
        let path = rounded_rect_path(&b, 10.0).unwrap();
        let arcs: Vec<_> = segments(&path)
            .into_iter()
            .filter_map(|s| match s {
                PathSegment::CubicTo(_, _, end) => Some(end),
                _ => None,
            })
            .collect();

        // Clockwise: end of each corner arc is one radius away from the corner
        assert_eq!(arcs.len(), 4);
        assert_eq!((arcs[0].x, arcs[0].y), (100.0, 10.0));
        assert_eq!((arcs[1].x, arcs[1].y), (90.0, 60.0));
        assert_eq!((arcs[2].x, arcs[2].y), (0.0, 50.0));
        assert_eq!((arcs[3].x, arcs[3].y), (10.0, 0.0));
    }

    #[test]
    fn test_rounded_rect_bounds_match_box() {
        let b = LayoutBox::new(80.0, 588.0, 380.0, 400.0, 30.0);
        let path = rounded_rect_path(&b, 30.0).unwrap();
        let bounds = path.bounds();

        assert!((bounds.left() - 80.0).abs() < 1e-3);
        assert!((bounds.top() - 588.0).abs() < 1e-3);
        assert!((bounds.right() - 460.0).abs() < 1e-3);
        assert!((bounds.bottom() - 988.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_radius_is_plain_rectangle() {
        let b = LayoutBox::new(0.0, 0.0, 40.0, 30.0, 0.0);
        let path = rounded_rect_path(&b, 0.0).unwrap();
        let segs = segments(&path);

        assert!(segs
            .iter()
            .all(|s| !matches!(s, PathSegment::CubicTo(..) | PathSegment::QuadTo(..))));
        assert!(matches!(segs.last(), Some(PathSegment::Close)));

        let bounds = path.bounds();
        assert_eq!(bounds.width(), 40.0);
        assert_eq!(bounds.height(), 30.0);
    }

    #[test]
    fn test_radius_clamped_to_half_side() {
        let b = LayoutBox::new(0.0, 0.0, 20.0, 10.0, 0.0);
        let path = rounded_rect_path(&b, 50.0).unwrap();
        match segments(&path).first() {
            Some(PathSegment::MoveTo(p)) => assert_eq!(p.x, 5.0),
            other => panic!("expected MoveTo, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_box_has_no_path() {
        let b = LayoutBox::new(0.0, 0.0, 0.0, 10.0, 0.0);
        assert!(rounded_rect_path(&b, 2.0).is_none());
    }

    #[test]
    fn test_cover_fit_wide_image() {
        let b = photo_box();
        // 2:1 image into a 344x304 box
        let r = cover_fit(800, 400, &b);

        assert_eq!(r.height, b.height);
        assert_eq!(r.width, 608.0);
        assert_eq!(r.y, b.y);
        assert_eq!(r.x, b.x - (r.width - b.width) / 2.0);
    }

    #[test]
    fn test_cover_fit_tall_image() {
        let b = photo_box();
        // 3:4 portrait into a 344x304 box
        let r = cover_fit(300, 400, &b);

        assert_eq!(r.width, b.width);
        assert!(r.height > b.height);
        assert_eq!(r.x, b.x);
        assert_eq!(r.y, b.y - (r.height - b.height) / 2.0);
    }

    #[test]
    fn test_cover_fit_equal_ratio_is_exact() {
        let b = photo_box();
        let r = cover_fit(172, 152, &b);

        assert_eq!(r.x, b.x);
        assert_eq!(r.y, b.y);
        assert_eq!(r.width, b.width);
        assert_eq!(r.height, b.height);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn box_strategy() -> impl Strategy<Value = LayoutBox> {
        (0u32..=500, 0u32..=500, 1u32..=600, 1u32..=600)
            .prop_map(|(x, y, w, h)| LayoutBox::new(x as f32, y as f32, w as f32, h as f32, 0.0))
    }

    proptest! {
        /// Property: the draw rectangle always covers the box.
        #[test]
        fn prop_cover_fit_covers_box(
            (iw, ih) in (1u32..=4000, 1u32..=4000),
            b in box_strategy(),
        ) {
            let r = cover_fit(iw, ih, &b);
            let tol = 1e-2 * b.width.max(b.height);

            prop_assert!(r.width + tol >= b.width);
            prop_assert!(r.height + tol >= b.height);
            prop_assert!(r.x <= b.x + tol);
            prop_assert!(r.y <= b.y + tol);
            prop_assert!(r.x + r.width + tol >= b.right());
            prop_assert!(r.y + r.height + tol >= b.bottom());
        }

        /// Property: one axis always matches the box exactly.
        #[test]
        fn prop_cover_fit_matches_one_axis(
            (iw, ih) in (1u32..=4000, 1u32..=4000),
            b in box_strategy(),
        ) {
            let r = cover_fit(iw, ih, &b);
            prop_assert!(r.width == b.width || r.height == b.height);
        }

        /// Property: overflow is centred on the overflowing axis.
        #[test]
        fn prop_cover_fit_is_centred(
            (iw, ih) in (1u32..=4000, 1u32..=4000),
            b in box_strategy(),
        ) {
            let r = cover_fit(iw, ih, &b);
            let left = b.x - r.x;
            let right = (r.x + r.width) - b.right();
            let top = b.y - r.y;
            let bottom = (r.y + r.height) - b.bottom();
            let tol = 1e-2 * r.width.max(r.height);

            prop_assert!((left - right).abs() <= tol);
            prop_assert!((top - bottom).abs() <= tol);
        }

        /// Property: aspect ratio is preserved.
        #[test]
        fn prop_cover_fit_preserves_ratio(
            (iw, ih) in (1u32..=4000, 1u32..=4000),
            b in box_strategy(),
        ) {
            let r = cover_fit(iw, ih, &b);
            let expected = iw as f64 / ih as f64;
            let actual = r.width as f64 / r.height as f64;
            prop_assert!((expected - actual).abs() / expected < 1e-3);
        }
    }
}
