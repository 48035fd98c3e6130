//! Asset loading with degrade-on-failure semantics.
//!
//! Missing or broken assets never abort startup: a missing image renders
//! nothing, a missing shader program disables antialiasing. Both are logged.

use std::path::Path;

use anyhow::{Context, Result};

use crate::post::ShaderProgram;

/// Decoded RGBA8 (sRGB-encoded) image, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SourceImage {
    /// Wraps tightly packed RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "image has zero size ({width}x{height})");
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            pixels.len() == expected,
            "pixel buffer is {} bytes, expected {expected} for {width}x{height} RGBA8",
            pixels.len()
        );
        Ok(Self { width, height, pixels })
    }

    /// Decodes an encoded image (PNG, JPEG, ...) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)
            .context("failed to decode image")?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Reads and decodes an image file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("failed to load image {}", path.display()))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Loads the source image, logging and returning `None` on failure.
pub fn load_image(path: &Path) -> Option<SourceImage> {
    match SourceImage::open(path) {
        Ok(img) => {
            log::info!("loaded image {} ({}x{})", path.display(), img.width(), img.height());
            Some(img)
        }
        Err(e) => {
            log::warn!("no source image: {e:#}");
            None
        }
    }
}

/// Loads the FXAA program, logging and returning `None` on failure.
pub fn load_program(path: &Path) -> Option<ShaderProgram> {
    match ShaderProgram::load(path) {
        Ok(p) => {
            log::info!("loaded shader program {}", path.display());
            Some(p)
        }
        Err(e) => {
            log::warn!("antialiasing disabled: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba8_checks_buffer_length() {
        assert!(SourceImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(SourceImage::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(SourceImage::from_rgba8(0, 2, vec![]).is_err());
    }

    #[test]
    fn decode_png_round_trips_pixels() {
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let decoded = SourceImage::decode(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        let i = (1 * 3 + 1) * 4;
        assert_eq!(&decoded.pixels()[i..i + 4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(SourceImage::decode(b"not an image").is_err());
    }

    #[test]
    fn missing_assets_degrade_to_none() {
        let nowhere = Path::new("/definitely/not/here");
        assert!(load_image(&nowhere.join("TestImage.jpg")).is_none());
        assert!(load_program(&nowhere.join("fxaa.wgsl")).is_none());
    }
}
