//! Fixed poster layout.
//!
//! The poster places a filled, rounded frame on top of the template. Inside
//! the frame sits the photo box, inset by [`PHOTO_MARGIN`] on every side, with
//! a strip of [`NAME_STRIP_HEIGHT`] reserved underneath it for the name.
//!
//! ```text
//! +-------------- frame (80, 588, 380x400, r=30) --------------+
//! |  +--------------- photo box (r=22) --------------------+   |
//! |  |                                                      |   |
//! |  +------------------------------------------------------+   |
//! |                     First Last   <- baseline                 |
//! +--------------------------------------------------------------+
//! ```

use crate::geometry::LayoutBox;

/// Frame drawn behind the photo and the name.
pub const FRAME_BOX: LayoutBox = LayoutBox::new(80.0, 588.0, 380.0, 400.0, 30.0);

/// Inset between the frame and the photo on every side.
pub const PHOTO_MARGIN: f32 = 18.0;

/// Height reserved below the photo for the name.
pub const NAME_STRIP_HEIGHT: f32 = 60.0;

/// Corner radius of the clipped photo.
pub const PHOTO_CORNER_RADIUS: f32 = 22.0;

/// Photo box derived from [`FRAME_BOX`].
pub const PHOTO_BOX: LayoutBox = LayoutBox::new(
    FRAME_BOX.x + PHOTO_MARGIN,
    FRAME_BOX.y + PHOTO_MARGIN,
    FRAME_BOX.width - PHOTO_MARGIN * 2.0,
    FRAME_BOX.height - PHOTO_MARGIN * 2.0 - NAME_STRIP_HEIGHT,
    PHOTO_CORNER_RADIUS,
);

/// Distance from the bottom of the photo to the name baseline.
pub const NAME_OFFSET: f32 = 38.0;

/// Minimum gap between the name baseline and the bottom of the frame.
pub const NAME_BOTTOM_PADDING: f32 = 16.0;

/// Frame fill colour (#176574).
pub const FRAME_FILL: [u8; 3] = [0x17, 0x65, 0x74];

/// Width of the white border stroked around the photo.
pub const PHOTO_BORDER_WIDTH: f32 = 2.5;

/// Name text size in canvas pixels.
pub const NAME_FONT_SIZE: f32 = 32.0;

/// Preferred family for the name, followed by fallbacks.
pub const NAME_FONT_FAMILIES: &str = "'Arial Black', Arial, sans-serif";

/// Target aspect ratio (width / height) of a cropped photo.
pub const CROP_ASPECT_RATIO: f64 = 3.0 / 4.0;

/// Derive the photo box for an arbitrary frame.
pub fn photo_box(frame: &LayoutBox) -> LayoutBox {
    LayoutBox::new(
        frame.x + PHOTO_MARGIN,
        frame.y + PHOTO_MARGIN,
        frame.width - PHOTO_MARGIN * 2.0,
        frame.height - PHOTO_MARGIN * 2.0 - NAME_STRIP_HEIGHT,
        PHOTO_CORNER_RADIUS,
    )
}

/// Baseline of the name text.
///
/// The name sits [`NAME_OFFSET`] below the photo, but never closer than
/// [`NAME_BOTTOM_PADDING`] to the bottom of the frame.
pub fn name_baseline(frame: &LayoutBox, photo: &LayoutBox) -> f32 {
    let below_photo = photo.bottom() + NAME_OFFSET;
    let limit = frame.bottom() - NAME_BOTTOM_PADDING;
    if below_photo > limit {
        limit
    } else {
        below_photo
    }
}

/// Anchor point (centre x, baseline y) of the name text.
pub fn name_anchor(frame: &LayoutBox, photo: &LayoutBox) -> (f32, f32) {
    (frame.center_x(), name_baseline(frame, photo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_box_constants() {
        assert_eq!(PHOTO_BOX.x, 98.0);
        assert_eq!(PHOTO_BOX.y, 606.0);
        assert_eq!(PHOTO_BOX.width, 344.0);
        assert_eq!(PHOTO_BOX.height, 304.0);
        assert_eq!(PHOTO_BOX.corner_radius, 22.0);
        assert_eq!(photo_box(&FRAME_BOX), PHOTO_BOX);
    }

    #[test]
    fn test_photo_box_inside_frame() {
        assert!(PHOTO_BOX.x > FRAME_BOX.x && PHOTO_BOX.y > FRAME_BOX.y);
        assert!(PHOTO_BOX.right() < FRAME_BOX.right());
        // Name strip plus margin remain below the photo
        assert_eq!(
            FRAME_BOX.bottom() - PHOTO_BOX.bottom(),
            PHOTO_MARGIN + NAME_STRIP_HEIGHT
        );
    }

    #[test]
    fn test_name_baseline_below_photo() {
        // Photo bottom 910, frame bottom 988: 948 < 972
        assert_eq!(FRAME_BOX.bottom(), 988.0);
        assert_eq!(PHOTO_BOX.bottom(), 910.0);
        assert_eq!(name_baseline(&FRAME_BOX, &PHOTO_BOX), 948.0);
    }

    #[test]
    fn test_name_baseline_clamped_to_frame() {
        // Photo reaching down to 950: 988 > 972, so clamp to 972
        let photo = LayoutBox::new(98.0, 606.0, 344.0, 344.0, 22.0);
        assert_eq!(name_baseline(&FRAME_BOX, &photo), 972.0);
    }

    #[test]
    fn test_name_baseline_at_limit() {
        // 934 + 38 == 972 exactly
        let photo = LayoutBox::new(98.0, 606.0, 344.0, 328.0, 22.0);
        assert_eq!(name_baseline(&FRAME_BOX, &photo), 972.0);
    }

    #[test]
    fn test_name_anchor_centred_in_frame() {
        let (x, y) = name_anchor(&FRAME_BOX, &PHOTO_BOX);
        assert_eq!(x, 270.0);
        assert_eq!(y, 948.0);
    }
}
