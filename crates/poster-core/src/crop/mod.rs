//! Interactive crop selection over an uploaded photo.
//!
//! A [`CropController`] owns at most one [`CropSession`]. The session keeps
//! the decoded source and the view state (zoom, rotation, pan) and renders a
//! fixed-aspect [`CroppedImage`] when applied.
//!
//! # Coordinate System
//!
//! - The *canvas* is the axis-aligned box around the source after rotation,
//!   measured in source pixels
//! - The crop box always stays inside the canvas
//! - Rotation is in degrees, positive = clockwise, normalised to (-360, 360)
//! - Zoom 1.0 is the largest crop box of the target ratio that fits the
//!   canvas; zooming in shrinks the box around its centre

mod sample;

pub use sample::{rotated_extent, InterpolationFilter};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::decode::{decode_image, DecodeError, ImageAsset};
use crate::encode::{encode_png, EncodeError};
use crate::layout::CROP_ASPECT_RATIO;

/// Smallest zoom level (the crop box fills the canvas).
pub const MIN_ZOOM: f64 = 1.0;

/// Largest zoom level.
pub const MAX_ZOOM: f64 = 10.0;

/// Errors from crop operations.
#[derive(Debug, Error)]
pub enum CropError {
    /// Apply was requested while no session is open.
    #[error("No crop session is active")]
    NoSession,

    /// The selected file could not be decoded.
    #[error("Could not read the selected image: {0}")]
    Decode(#[from] DecodeError),

    /// The cropped raster could not be encoded.
    #[error("Could not encode the cropped image: {0}")]
    Encode(#[from] EncodeError),
}

/// Crop box in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Snapshot of the view state, for the UI to draw the crop overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropState {
    pub region: CropRegion,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub zoom: f64,
    pub rotation: f64,
}

/// An encoded crop result, consumed by the next generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CroppedImage {
    /// PNG bytes of the crop.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// An open crop over one decoded source image.
#[derive(Debug, Clone)]
pub struct CropSession {
    source: ImageAsset,
    aspect_ratio: f64,
    zoom: f64,
    rotation: f64,
    /// Crop box centre relative to the canvas centre.
    offset: (f64, f64),
}

impl CropSession {
    /// Start a session with the default view: maximal box, centred.
    pub fn new(source: ImageAsset, aspect_ratio: f64) -> Self {
        Self {
            source,
            aspect_ratio,
            zoom: MIN_ZOOM,
            rotation: 0.0,
            offset: (0.0, 0.0),
        }
    }

    pub fn source(&self) -> &ImageAsset {
        &self.source
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Size of the rotated source's bounding box.
    pub fn canvas_size(&self) -> (f64, f64) {
        rotated_extent(
            self.source.width as f64,
            self.source.height as f64,
            self.rotation,
        )
    }

    /// Largest box of the target ratio that fits the canvas.
    fn max_box(&self) -> (f64, f64) {
        let (cw, ch) = self.canvas_size();
        if cw > ch * self.aspect_ratio {
            (ch * self.aspect_ratio, ch)
        } else {
            (cw, cw / self.aspect_ratio)
        }
    }

    fn box_size(&self) -> (f64, f64) {
        let (mw, mh) = self.max_box();
        (mw / self.zoom, mh / self.zoom)
    }

    /// Current crop box in canvas coordinates.
    pub fn region(&self) -> CropRegion {
        let (cw, ch) = self.canvas_size();
        let (width, height) = self.box_size();
        CropRegion {
            x: (cw - width) / 2.0 + self.offset.0,
            y: (ch - height) / 2.0 + self.offset.1,
            width,
            height,
        }
    }

    pub fn state(&self) -> CropState {
        let (canvas_width, canvas_height) = self.canvas_size();
        CropState {
            region: self.region(),
            canvas_width,
            canvas_height,
            zoom: self.zoom,
            rotation: self.rotation,
        }
    }

    /// Zoom relative to the current level.
    ///
    /// A positive `delta` zooms in by `1 + delta`; a negative one zooms out
    /// by `1 / (1 - delta)`.
    pub fn zoom(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let factor = if delta >= 0.0 {
            1.0 + delta
        } else {
            1.0 / (1.0 - delta)
        };
        self.zoom_to(self.zoom * factor);
    }

    /// Set an absolute zoom level, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn zoom_to(&mut self, level: f64) {
        if !level.is_finite() {
            return;
        }
        self.zoom = level.clamp(MIN_ZOOM, MAX_ZOOM);
        self.clamp_offset();
    }

    /// Rotate by `delta_degrees` (positive = clockwise).
    pub fn rotate(&mut self, delta_degrees: f64) {
        if !delta_degrees.is_finite() {
            return;
        }
        self.rotation = (self.rotation + delta_degrees) % 360.0;
        self.clamp_offset();
    }

    /// Move the crop box by (dx, dy) canvas pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.offset.0 += dx;
        self.offset.1 += dy;
        self.clamp_offset();
    }

    /// Return to the default view.
    pub fn reset(&mut self) {
        self.zoom = MIN_ZOOM;
        self.rotation = 0.0;
        self.offset = (0.0, 0.0);
    }

    fn clamp_offset(&mut self) {
        let (cw, ch) = self.canvas_size();
        let (bw, bh) = self.box_size();
        let max_dx = ((cw - bw) / 2.0).max(0.0);
        let max_dy = ((ch - bh) / 2.0).max(0.0);
        self.offset.0 = self.offset.0.clamp(-max_dx, max_dx);
        self.offset.1 = self.offset.1.clamp(-max_dy, max_dy);
    }

    /// Output size of a render: the crop width in source pixels, with the
    /// height following the target ratio.
    pub fn output_size(&self) -> (u32, u32) {
        let region = self.region();
        let width = region.width.round().max(1.0);
        let height = (width / self.aspect_ratio).round().max(1.0);
        (width as u32, height as u32)
    }

    /// Render the current selection into a new raster.
    pub fn render(&self, filter: InterpolationFilter) -> ImageAsset {
        let region = self.region();
        let (out_w, out_h) = self.output_size();
        let (cw, ch) = self.canvas_size();

        let scale_x = region.width / out_w as f64;
        let scale_y = region.height / out_h as f64;
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let src_cx = self.source.width as f64 / 2.0;
        let src_cy = self.source.height as f64 / 2.0;

        let mut output = vec![0u8; out_w as usize * out_h as usize * 4];

        for oy in 0..out_h {
            for ox in 0..out_w {
                // Output pixel centre in canvas space, relative to the canvas centre
                let dx = region.x + (ox as f64 + 0.5) * scale_x - cw / 2.0;
                let dy = region.y + (oy as f64 + 0.5) * scale_y - ch / 2.0;

                // Undo the clockwise rotation, then move to pixel-index space
                let src_x = dx * cos + dy * sin + src_cx - 0.5;
                let src_y = -dx * sin + dy * cos + src_cy - 0.5;

                let idx = (oy as usize * out_w as usize + ox as usize) * 4;
                output[idx..idx + 4].copy_from_slice(&filter.sample(&self.source, src_x, src_y));
            }
        }

        ImageAsset::new(out_w, out_h, output)
    }

    /// Render and encode the selection, ending the session.
    pub fn apply(self, filter: InterpolationFilter) -> Result<CroppedImage, CropError> {
        let raster = self.render(filter);
        let png = encode_png(&raster.pixels, raster.width, raster.height)?;
        Ok(CroppedImage {
            png,
            width: raster.width,
            height: raster.height,
        })
    }
}

/// Owner of the single active crop session.
#[derive(Debug, Default)]
pub struct CropController {
    session: Option<CropSession>,
    filter: InterpolationFilter,
}

impl CropController {
    pub fn new(filter: InterpolationFilter) -> Self {
        Self {
            session: None,
            filter,
        }
    }

    /// Decode `source_bytes` and start a new session.
    ///
    /// Any previous session is discarded first, so a failed open leaves no
    /// session behind.
    pub fn open(&mut self, source_bytes: &[u8]) -> Result<&CropSession, CropError> {
        self.session = None;
        let source = decode_image(source_bytes)?;
        info!(
            width = source.width,
            height = source.height,
            "crop session opened"
        );
        Ok(self.session.insert(CropSession::new(source, CROP_ASPECT_RATIO)))
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&CropSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> Option<CropState> {
        self.session.as_ref().map(CropSession::state)
    }

    pub fn zoom(&mut self, delta: f64) {
        if let Some(session) = self.session.as_mut() {
            session.zoom(delta);
        }
    }

    pub fn zoom_to(&mut self, level: f64) {
        if let Some(session) = self.session.as_mut() {
            session.zoom_to(level);
        }
    }

    pub fn rotate(&mut self, delta_degrees: f64) {
        if let Some(session) = self.session.as_mut() {
            session.rotate(delta_degrees);
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        if let Some(session) = self.session.as_mut() {
            session.pan(dx, dy);
        }
    }

    pub fn reset(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
    }

    /// Render the selection and end the session.
    pub fn apply(&mut self) -> Result<CroppedImage, CropError> {
        let session = self.session.take().ok_or(CropError::NoSession)?;
        let cropped = session.apply(self.filter)?;
        info!(
            width = cropped.width,
            height = cropped.height,
            bytes = cropped.png.len(),
            "crop applied"
        );
        Ok(cropped)
    }

    /// End the session without output. Returns whether one was open.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.session.take().is_some();
        if was_active {
            debug!("crop session cancelled");
        }
        was_active
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the crop box never leaves the canvas.
        #[test]
        fn prop_region_inside_canvas(
            (w, h) in (1u32..=400, 1u32..=400),
            zoom in -5.0f64..=5.0,
            rotation in -720.0f64..=720.0,
            (dx, dy) in (-500.0f64..=500.0, -500.0f64..=500.0),
        ) {
            let mut session = CropSession::new(ImageAsset::filled(w, h, [0; 4]), CROP_ASPECT_RATIO);
            session.rotate(rotation);
            session.zoom(zoom);
            session.pan(dx, dy);

            let (cw, ch) = session.canvas_size();
            let r = session.region();
            let tol = 1e-6 * cw.max(ch);
            prop_assert!(r.x >= -tol && r.y >= -tol);
            prop_assert!(r.x + r.width <= cw + tol);
            prop_assert!(r.y + r.height <= ch + tol);
        }

        /// Property: the crop box always has the target ratio.
        #[test]
        fn prop_region_keeps_ratio(
            (w, h) in (1u32..=400, 1u32..=400),
            zoom in 1.0f64..=10.0,
            rotation in -180.0f64..=180.0,
        ) {
            let mut session = CropSession::new(ImageAsset::filled(w, h, [0; 4]), CROP_ASPECT_RATIO);
            session.rotate(rotation);
            session.zoom_to(zoom);

            let r = session.region();
            prop_assert!((r.width / r.height - CROP_ASPECT_RATIO).abs() < 1e-9);
        }

        /// Property: rendered output matches the target ratio to the pixel.
        #[test]
        fn prop_output_ratio(
            (w, h) in (1u32..=64, 1u32..=64),
            zoom in 1.0f64..=4.0,
            rotation in -90.0f64..=90.0,
        ) {
            let mut session = CropSession::new(ImageAsset::filled(w, h, [9, 9, 9, 255]), CROP_ASPECT_RATIO);
            session.rotate(rotation);
            session.zoom_to(zoom);

            let out = session.render(InterpolationFilter::Bilinear);
            prop_assert!(out.width >= 1 && out.height >= 1);
            prop_assert_eq!(out.pixels.len(), out.width as usize * out.height as usize * 4);
            let expected_h = (out.width as f64 / CROP_ASPECT_RATIO).round().max(1.0) as u32;
            prop_assert_eq!(out.height, expected_h);
        }
    }
}
