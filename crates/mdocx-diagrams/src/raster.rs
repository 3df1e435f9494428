//! Raster image payloads and PNG inspection.

use crate::error::RenderFailure;

/// A successfully rendered diagram image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// PNG-encoded image data.
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl RenderedImage {
    /// Build from PNG bytes, reading dimensions from the header.
    ///
    /// Empty or non-PNG payloads fail with a decode error so corrupt
    /// service responses fall through the strategy chain.
    pub fn from_png(bytes: Vec<u8>) -> Result<Self, RenderFailure> {
        let (width_px, height_px) = png_dimensions(&bytes)
            .ok_or_else(|| RenderFailure::decode("payload is not a valid PNG image"))?;
        Ok(Self {
            bytes,
            width_px,
            height_px,
        })
    }
}

/// Extract width and height from PNG image data.
///
/// PNG format: 8-byte signature, then IHDR chunk with width/height at
/// bytes 16-24 (big-endian).
#[must_use]
pub fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 {
        return None;
    }

    if &data[0..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

#[cfg(test)]
pub(crate) fn fake_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"\x89PNG\r\n\x1a\n");
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[0; 5]);
    data
}
