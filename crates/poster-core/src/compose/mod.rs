//! Layered drawing of the final poster.
//!
//! The layers are drawn in a fixed order, each on top of the previous one:
//!
//! 1. `background`, stretched over the whole canvas
//! 2. `template`, at its native size (the canvas is sized to it)
//! 3. the rounded frame, filled with [`FRAME_FILL`]
//! 4. the photo, cover-fitted into the photo box and clipped to its corners
//! 5. a white border around the photo
//! 6. the display name, centred under the photo
//!
//! The finished raster is encoded as PNG. Everything here is synchronous and
//! deterministic: the same inputs always produce the same bytes.

mod text;

pub use text::BUNDLED_FONT;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, IntSize, Mask, Paint, Pixmap, PixmapPaint, Stroke,
    Transform,
};
use tracing::debug;
use usvg::fontdb::Database;

use crate::decode::ImageAsset;
use crate::encode::{encode_png, EncodeError};
use crate::geometry::{cover_fit, rounded_rect_path, LayoutBox};
use crate::layout::{name_anchor, photo_box, FRAME_BOX, FRAME_FILL, PHOTO_BORDER_WIDTH};

/// Errors that can occur while compositing.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The template has no area, so there is no canvas to draw on.
    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    /// A layer image has no pixels.
    #[error("The {0} layer is empty")]
    EmptyLayer(&'static str),

    /// A layout box produced no drawable outline.
    #[error("Layout box has no area")]
    Geometry,

    /// No font face is available for the name.
    #[error("No font available for the name text")]
    NoFont,

    /// The name could not be laid out.
    #[error("Text layout failed: {0}")]
    Text(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Join first and last name the way they are printed on the poster.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

/// Draws posters. Holds the font database used for the name.
#[derive(Clone)]
pub struct Compositor {
    frame: LayoutBox,
    fontdb: Arc<Database>,
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("frame", &self.frame)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::with_fonts::<&Path>(true, &[])
    }
}

impl Compositor {
    /// Compositor using the given font database.
    pub fn new(fontdb: Database) -> Self {
        Self {
            frame: FRAME_BOX,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Compositor with the bundled face, system fonts (when `system_fonts`
    /// is set) and every font file found directly inside `font_dirs`.
    pub fn with_fonts<P: AsRef<Path>>(system_fonts: bool, font_dirs: &[P]) -> Self {
        Self::new(text::build_fontdb(system_fonts, font_dirs))
    }

    /// Compositor with only the bundled face. Output does not depend on the
    /// fonts installed on the host.
    pub fn bundled() -> Self {
        Self::with_fonts::<&Path>(false, &[])
    }

    /// Register a font from memory (TTF, OTF or TTC data).
    pub fn add_font(&mut self, data: Vec<u8>) {
        Arc::make_mut(&mut self.fontdb).load_font_data(data);
    }

    /// Number of font faces available for the name.
    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Frame box the photo and name are placed in.
    pub fn frame(&self) -> LayoutBox {
        self.frame
    }

    /// Draw all layers and return the raw canvas.
    pub fn render(
        &self,
        background: &ImageAsset,
        template: &ImageAsset,
        photo: &ImageAsset,
        full_name: &str,
    ) -> Result<ImageAsset, ComposeError> {
        let (width, height) = (template.width, template.height);
        let invalid_canvas = ComposeError::InvalidCanvas { width, height };

        // A new pixmap starts fully transparent
        let mut canvas = Pixmap::new(width, height).ok_or(invalid_canvas)?;
        let background = to_pixmap(background).ok_or(ComposeError::EmptyLayer("background"))?;
        let template_layer = to_pixmap(template).ok_or(ComposeError::EmptyLayer("template"))?;
        let photo_layer = to_pixmap(photo).ok_or(ComposeError::EmptyLayer("photo"))?;

        let smooth = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };

        // Background, stretched to the canvas
        let stretch = Transform::from_scale(
            width as f32 / background.width() as f32,
            height as f32 / background.height() as f32,
        );
        canvas.draw_pixmap(0, 0, background.as_ref(), &smooth, stretch, None);

        // Template at native size
        canvas.draw_pixmap(
            0,
            0,
            template_layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        // Frame
        let frame_path =
            rounded_rect_path(&self.frame, self.frame.corner_radius).ok_or(ComposeError::Geometry)?;
        let mut fill = Paint::default();
        fill.set_color_rgba8(FRAME_FILL[0], FRAME_FILL[1], FRAME_FILL[2], 255);
        fill.anti_alias = true;
        canvas.fill_path(
            &frame_path,
            &fill,
            FillRule::Winding,
            Transform::identity(),
            None,
        );

        // Photo, clipped to the rounded photo box
        let photo_box = photo_box(&self.frame);
        let photo_path =
            rounded_rect_path(&photo_box, photo_box.corner_radius).ok_or(ComposeError::Geometry)?;
        let mut clip = Mask::new(width, height).ok_or(ComposeError::InvalidCanvas { width, height })?;
        clip.fill_path(&photo_path, FillRule::Winding, true, Transform::identity());

        let rect = cover_fit(photo.width, photo.height, &photo_box);
        let place = Transform::from_row(
            rect.width / photo.width as f32,
            0.0,
            0.0,
            rect.height / photo.height as f32,
            rect.x,
            rect.y,
        );
        canvas.draw_pixmap(0, 0, photo_layer.as_ref(), &smooth, place, Some(&clip));

        // Border
        let mut border = Paint::default();
        border.set_color(Color::WHITE);
        border.anti_alias = true;
        let stroke = Stroke {
            width: PHOTO_BORDER_WIDTH,
            ..Default::default()
        };
        canvas.stroke_path(&photo_path, &border, &stroke, Transform::identity(), None);

        // Name
        let (text_x, baseline) = name_anchor(&self.frame, &photo_box);
        text::draw_name(&mut canvas, &self.fontdb, text_x, baseline, full_name)?;

        Ok(from_pixmap(&canvas))
    }

    /// Draw all layers and encode the result as PNG.
    #[tracing::instrument(skip_all, fields(width = template.width, height = template.height))]
    pub fn compose(
        &self,
        background: &ImageAsset,
        template: &ImageAsset,
        photo: &ImageAsset,
        full_name: &str,
    ) -> Result<Vec<u8>, ComposeError> {
        let raster = self.render(background, template, photo, full_name)?;
        let png = encode_png(&raster.pixels, raster.width, raster.height)?;
        debug!(bytes = png.len(), "poster encoded");
        Ok(png)
    }
}

/// Convert straight RGBA into a premultiplied pixmap.
fn to_pixmap(image: &ImageAsset) -> Option<Pixmap> {
    if image.is_empty() {
        return None;
    }
    let size = IntSize::from_wh(image.width, image.height)?;
    let data = image
        .pixels
        .chunks_exact(4)
        .flat_map(|p| {
            let c = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

/// Convert a premultiplied pixmap back into straight RGBA.
fn from_pixmap(pixmap: &Pixmap) -> ImageAsset {
    let pixels = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    ImageAsset::new(pixmap.width(), pixmap.height(), pixels)
}
