//! Name text layer.
//!
//! The name is laid out as a single SVG `<text>` element and rasterized with
//! resvg straight onto the poster canvas, so shaping, font fallback and
//! anti-aliasing all come from the same engine.
//!
//! Every font database starts with [`BUNDLED_FONT`] and uses it as the
//! `sans-serif` family, so the name renders on hosts without system fonts and
//! in the browser.

use std::path::Path;
use std::sync::Arc;

use tiny_skia::{Pixmap, Transform};
use usvg::fontdb::{self, Database};
use usvg::{FontResolver, Options, Tree};

use super::ComposeError;
use crate::layout::{NAME_FONT_FAMILIES, NAME_FONT_SIZE};

/// DejaVu Sans Bold, compiled into the crate (Bitstream Vera license, see
/// `fonts/LICENSE`).
pub const BUNDLED_FONT: &[u8] = include_bytes!("../../fonts/DejaVuSans-Bold.ttf");

/// Build the font database used for the name text.
pub(crate) fn build_fontdb<P: AsRef<Path>>(system_fonts: bool, font_dirs: &[P]) -> Database {
    let mut db = Database::new();
    db.load_font_data(BUNDLED_FONT.to_vec());
    let bundled_family = db
        .faces()
        .next()
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone());
    if let Some(name) = bundled_family {
        db.set_sans_serif_family(name);
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if system_fonts {
            db.load_system_fonts();
        }
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir.as_ref());
        }
    }

    #[cfg(target_arch = "wasm32")]
    let _ = (system_fonts, font_dirs);

    db
}

#[cfg(not(target_arch = "wasm32"))]
fn load_fonts_from_dir(db: &mut Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            let _ = db.load_font_file(&path);
        }
    }
}

/// Resolve the requested families, then any sans-serif face, then any face.
fn font_resolver() -> FontResolver<'static> {
    FontResolver {
        select_font: Box::new(|font, db| {
            let mut families: Vec<fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => fontdb::Family::Name(s),
                })
                .collect();
            families.push(fontdb::Family::SansSerif);

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch: fontdb::Stretch::Normal,
                style: fontdb::Style::Normal,
            };

            db.query(&query).or_else(|| db.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG document holding the name centred on `x` with its baseline at `y`.
pub(crate) fn name_svg(width: u32, height: u32, x: f32, y: f32, name: &str) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" text-anchor="middle" font-family="{family}" "#,
            r##"font-weight="bold" font-size="{size}" fill="#ffffff">{name}</text>"##,
            "</svg>"
        ),
        w = width,
        h = height,
        x = x,
        y = y,
        family = NAME_FONT_FAMILIES,
        size = NAME_FONT_SIZE,
        name = escape_xml(name),
    )
}

/// Draw `name` onto `canvas`, centred on `x` with its baseline at `y`.
///
/// A blank name draws nothing. Fails when the database has no face or the
/// name produced no glyphs.
pub(crate) fn draw_name(
    canvas: &mut Pixmap,
    fontdb: &Arc<Database>,
    x: f32,
    y: f32,
    name: &str,
) -> Result<(), ComposeError> {
    if name.trim().is_empty() {
        return Ok(());
    }
    if fontdb.is_empty() {
        return Err(ComposeError::NoFont);
    }

    let svg = name_svg(canvas.width(), canvas.height(), x, y, name);
    let opts = Options {
        fontdb: Arc::clone(fontdb),
        font_resolver: font_resolver(),
        ..Default::default()
    };
    let tree = Tree::from_str(&svg, &opts).map_err(|e| ComposeError::Text(e.to_string()))?;
    if tree.root().children().is_empty() {
        return Err(ComposeError::Text(format!("no glyphs for {name:?}")));
    }

    resvg::render(&tree, Transform::identity(), &mut canvas.as_mut());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LayoutBox;
    use crate::layout::{name_anchor, FRAME_BOX};

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Ada Lovelace"), "Ada Lovelace");
        assert_eq!(
            escape_xml("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_name_svg_layout() {
        let svg = name_svg(540, 1000, 270.0, 948.0, "Jane O'Neil");

        assert!(svg.contains(r#"width="540" height="1000""#));
        assert!(svg.contains(r#"x="270" y="948""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"font-size="32""#));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains("Jane O&apos;Neil"));
    }

    #[test]
    fn test_name_svg_parses() {
        let svg = name_svg(100, 100, 50.0, 50.0, "A & B");
        assert!(Tree::from_str(&svg, &Options::default()).is_ok());
    }

    /// Bounds (left, top, right, bottom) of pixels with visible coverage.
    fn ink_bounds(canvas: &Pixmap) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (i, p) in canvas.pixels().iter().enumerate() {
            if p.alpha() < 128 {
                continue;
            }
            let (x, y) = (i as u32 % canvas.width(), i as u32 / canvas.width());
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
            });
        }
        bounds
    }

    fn bundled_db() -> Arc<Database> {
        Arc::new(build_fontdb::<&str>(false, &[]))
    }

    #[test]
    fn test_bundled_font_always_loaded() {
        let db = build_fontdb::<&str>(false, &[]);
        assert_eq!(db.len(), 1);

        let face = db.faces().next().unwrap();
        assert_eq!(face.families[0].0, "DejaVu Sans");
        assert_eq!(face.weight, fontdb::Weight::BOLD);
    }

    #[test]
    fn test_draw_name_without_fonts_fails() {
        let mut canvas = Pixmap::new(20, 20).unwrap();
        let fontdb = Arc::new(Database::new());

        assert!(matches!(
            draw_name(&mut canvas, &fontdb, 10.0, 10.0, "Ada"),
            Err(ComposeError::NoFont)
        ));
        assert!(canvas.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blank_name_draws_nothing() {
        let mut canvas = Pixmap::new(20, 20).unwrap();
        draw_name(&mut canvas, &bundled_db(), 10.0, 10.0, "   ").unwrap();
        assert!(canvas.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_name_centred_on_anchor() {
        let mut canvas = Pixmap::new(540, 1000).unwrap();
        draw_name(&mut canvas, &bundled_db(), 270.0, 948.0, "Ada Lovelace").unwrap();

        let (left, top, right, bottom) = ink_bounds(&canvas).unwrap();
        let mid = (left + right) / 2;
        assert!(mid.abs_diff(270) <= 4, "ink spans {left}..{right}");
        assert!(right - left > 100, "ink spans {left}..{right}");
        assert!((945..=949).contains(&bottom), "ink bottom {bottom}");
        assert!((918..=930).contains(&top), "ink top {top}");
    }

    #[test]
    fn test_name_follows_clamped_baseline() {
        // Photo reaching y=950 pushes the name past the frame padding
        let photo = LayoutBox::new(98.0, 606.0, 344.0, 344.0, 22.0);
        let (x, baseline) = name_anchor(&FRAME_BOX, &photo);
        assert_eq!(baseline, 972.0);

        let mut canvas = Pixmap::new(540, 1000).unwrap();
        draw_name(&mut canvas, &bundled_db(), x, baseline, "Ada Lovelace").unwrap();

        let (_, _, _, bottom) = ink_bounds(&canvas).unwrap();
        assert!((969..=973).contains(&bottom), "ink bottom {bottom}");
        assert!(bottom < FRAME_BOX.bottom() as u32 - 12);
    }
}
