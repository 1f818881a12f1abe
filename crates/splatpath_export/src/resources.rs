// SPDX-License-Identifier: MIT OR Apache-2.0
//! CPU-side buffers used while exporting frames.
//!
//! The staging buffer receives RGBA8 readback from the renderer; the encode
//! surface is the image handed to the PNG encoder. Both are sized exactly to
//! the export resolution, allocated on first use, reallocated when the
//! resolution changes, and dropped by [`ExportResources::release`].

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use splatpath_sequencer::RenderError;

/// Bytes per RGBA8 pixel
const BYTES_PER_PIXEL: usize = 4;

/// Staging buffer and encode surface for one export resolution
#[derive(Debug, Default)]
pub struct ExportResources {
    size: Option<(u32, u32)>,
    staging: Vec<u8>,
    surface: Option<RgbaImage>,
}

impl ExportResources {
    /// Empty, nothing allocated
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolution currently allocated
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Whether any buffer is held
    pub fn is_allocated(&self) -> bool {
        self.size.is_some()
    }

    /// Allocate for `width` x `height` unless already at that size
    pub fn ensure(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.size == Some((width, height)) {
            return Ok(());
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .filter(|n| *n > 0)
            .ok_or(RenderError::InvalidSize { width, height })?;

        tracing::debug!(width, height, "Allocating export buffers");
        self.staging = vec![0; len];
        self.surface = Some(RgbaImage::new(width, height));
        self.size = Some((width, height));
        Ok(())
    }

    /// Readback target for the renderer
    pub fn staging_mut(&mut self) -> &mut [u8] {
        &mut self.staging
    }

    /// Copy the staging pixels into the encode surface and encode as PNG
    pub fn encode_png(&mut self) -> Result<Vec<u8>, RenderError> {
        let (width, height) = self
            .size
            .ok_or_else(|| RenderError::Encode("export buffers not allocated".to_string()))?;
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| RenderError::Encode("encode surface missing".to_string()))?;

        surface.copy_from_slice(&self.staging);

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(surface.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(png)
    }

    /// Drop all buffers
    pub fn release(&mut self) {
        if self.size.take().is_some() {
            tracing::debug!("Released export buffers");
        }
        self.staging = Vec::new();
        self.surface = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_allocation_and_resize() {
        let mut resources = ExportResources::new();
        assert!(!resources.is_allocated());

        resources.ensure(4, 2).unwrap();
        assert_eq!(resources.staging_mut().len(), 4 * 2 * 4);

        resources.ensure(8, 8).unwrap();
        assert_eq!(resources.size(), Some((8, 8)));
        assert_eq!(resources.staging_mut().len(), 8 * 8 * 4);

        resources.release();
        assert!(!resources.is_allocated());
        assert!(resources.staging_mut().is_empty());
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut resources = ExportResources::new();
        assert_eq!(
            resources.ensure(0, 10),
            Err(RenderError::InvalidSize { width: 0, height: 10 })
        );
        assert!(!resources.is_allocated());
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let mut resources = ExportResources::new();
        resources.ensure(3, 2).unwrap();
        for (i, byte) in resources.staging_mut().iter_mut().enumerate() {
            *byte = (i * 7 % 256) as u8;
        }
        let expected = resources.staging_mut().to_vec();

        let png = resources.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.into_raw(), expected);
    }

    #[test]
    fn test_encode_without_buffers_fails() {
        let mut resources = ExportResources::new();
        assert!(matches!(resources.encode_png(), Err(RenderError::Encode(_))));
    }
}
