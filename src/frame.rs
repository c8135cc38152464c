//! Captured frame raster.
//!
//! A `Frame` is an immutable, upright RGB8 raster owned by a single pipeline
//! invocation. It is only ever read or cropped; cropping produces a new
//! `Frame` in the same pixel format. Rotation normalization is the capture
//! side's responsibility, so decoding helpers take the rotation to apply
//! up front and the pipeline never sees a sideways image.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;

use crate::geometry::BoundingBox;

/// Clockwise rotation applied while decoding a captured image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Parse a rotation from whole degrees. Only quarter turns are valid.
    pub fn from_degrees(degrees: u32) -> Result<Self> {
        match degrees % 360 {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            other => Err(anyhow!("rotation must be a multiple of 90, got {}", other)),
        }
    }
}

/// Immutable upright RGB8 raster.
///
/// Pixels are private; stages read them through `pixels()` and never write.
#[derive(Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw RGB8 bytes (row-major, 3 bytes per pixel).
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions {}x{} are empty", width, height));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded image (JPEG/PNG) and normalize it upright.
    pub fn decode(bytes: &[u8], rotation: Rotation) -> Result<Self> {
        let rgb = image::load_from_memory(bytes)
            .context("decode captured image")?
            .into_rgb8();
        let rgb = match rotation {
            Rotation::None => rgb,
            Rotation::Cw90 => image::imageops::rotate90(&rgb),
            Rotation::Cw180 => image::imageops::rotate180(&rgb),
            Rotation::Cw270 => image::imageops::rotate270(&rgb),
        };
        Ok(Self::from_rgb(rgb))
    }

    /// Read and decode an image file.
    pub fn open<P: AsRef<Path>>(path: P, rotation: Rotation) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read captured image {}", path.display()))?;
        Self::decode(&bytes, rotation)
    }

    pub(crate) fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Extract the region under a clamped bounding box as a new frame.
    ///
    /// `left`/`top` are floored at 0 and the extent is capped at the frame
    /// edge: `width = min(box.width, frame_width - left)` and likewise for
    /// height. The box must cover at least one whole pixel.
    pub fn crop(&self, bbox: &BoundingBox) -> Result<Frame> {
        let left = bbox.left.max(0.0) as u32;
        let top = bbox.top.max(0.0) as u32;
        if left >= self.width || top >= self.height {
            return Err(anyhow!(
                "crop origin ({}, {}) outside {}x{} frame",
                left,
                top,
                self.width,
                self.height
            ));
        }
        let width = (bbox.width() as u32).min(self.width - left);
        let height = (bbox.height() as u32).min(self.height - top);
        if width == 0 || height == 0 {
            return Err(anyhow!("crop region has zero area"));
        }

        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for row in top..top + height {
            let start = ((row * self.width + left) * 3) as usize;
            let end = start + (width as usize) * 3;
            pixels.extend_from_slice(&self.pixels[start..end]);
        }
        Ok(Frame {
            width,
            height,
            pixels,
        })
    }

    /// Encode as JPEG (for the remote reader's request payload).
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let image = self.to_rgb_image()?;
        let mut bytes = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder.encode_image(&image).context("encode frame as jpeg")?;
        Ok(bytes)
    }

    pub(crate) fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))
    }
}
