//! Local SVG rasterization for the remote strategy's vector retry.

use std::sync::{Arc, LazyLock};

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use resvg::usvg;

use crate::error::RenderFailure;
use crate::raster::RenderedImage;

/// Upper bound on rasterized dimensions. Guards against absurd SVG
/// viewports blowing up memory.
const MAX_DIMENSION: u32 = 8192;

/// Lazily-loaded system font database for SVG text rendering.
///
/// Loading system fonts is expensive, so it happens once and the database
/// is shared across all rasterization calls.
static FONTDB: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts for SVG rendering");
    Arc::new(db)
});

/// Rasterize an SVG document to PNG at its natural size.
///
/// Any parse, dimension, or encoding problem maps to a decode failure:
/// the payload reached us but could not be turned into an image.
pub fn rasterize_svg(svg: &str) -> Result<RenderedImage, RenderFailure> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTDB),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| RenderFailure::decode(format!("SVG parse failed: {e}")))?;

    let size = tree.size();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (width, height) = (size.width().ceil() as u32, size.height().ceil() as u32);
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RenderFailure::decode(format!(
            "SVG dimensions out of range: {width}x{height}"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RenderFailure::decode("could not allocate pixmap"))?;
    // White background, matching the local CLI's `-b white`.
    pixmap.fill(resvg::tiny_skia::Color::from_rgba8(255, 255, 255, 255));

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::default(),
        &mut pixmap.as_mut(),
    );

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(pixmap.data(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| RenderFailure::decode(format!("PNG encoding failed: {e}")))?;

    Ok(RenderedImage {
        bytes: png,
        width_px: width,
        height_px: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use crate::raster::png_dimensions;

    const RECT_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="red"/></svg>"#;

    #[test]
    fn test_rasterize_simple_rect() {
        let image = rasterize_svg(RECT_SVG).unwrap();
        assert_eq!((image.width_px, image.height_px), (40, 20));
        assert_eq!(png_dimensions(&image.bytes), Some((40, 20)));
    }

    #[test]
    fn test_rasterize_invalid_svg() {
        let err = rasterize_svg("this is not svg").unwrap_err();
        assert_eq!(err.reason, FailureReason::DecodeError);
    }

    #[test]
    fn test_rasterize_truncated_svg() {
        let err = rasterize_svg("<svg xmlns=\"http://www.w3.org/2000/svg\"").unwrap_err();
        assert_eq!(err.reason, FailureReason::DecodeError);
    }
}
