#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::{HandLandmarkBackend, WatchDetectorBackend};
use crate::detect::result::Detection;
use crate::geometry::{BoundingBox, Point2D};

/// Input edge the clock-face detector was exported with.
const DETECTOR_INPUT_SIZE: u32 = 320;
/// Input edge the watch-hands landmark model was exported with.
const HANDS_INPUT_SIZE: u32 = 224;

fn load_model<P: AsRef<Path>>(
    model_path: P,
    width: u32,
    height: u32,
) -> Result<SimplePlan<TypedFact, Box<dyn TypedOp>>> {
    let model_path = model_path.as_ref();
    tract_onnx::onnx()
        .model_for_path(model_path)
        .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
        .with_input_fact(
            0,
            InferenceFact::dt_shape(
                f32::datum_type(),
                tvec!(1, 3, height as usize, width as usize),
            ),
        )
        .context("failed to set input fact")?
        .into_optimized()
        .context("failed to optimize ONNX model")?
        .into_runnable()
        .context("failed to build runnable ONNX model")
}

fn build_input(
    pixels: &[u8],
    width: u32,
    height: u32,
    input_width: u32,
    input_height: u32,
) -> Result<Tensor> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
    if pixels.len() != expected_len {
        return Err(anyhow!(
            "expected {} RGB bytes, received {}",
            expected_len,
            pixels.len()
        ));
    }

    let image = RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| anyhow!("pixel buffer does not match dimensions"))?;
    let resized = image::imageops::resize(
        &image,
        input_width,
        input_height,
        image::imageops::FilterType::Triangle,
    );

    let input = tract_ndarray::Array4::from_shape_fn(
        (1, 3, input_height as usize, input_width as usize),
        |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
    );
    Ok(input.into_tensor())
}

fn output_floats(outputs: &TVec<TValue>) -> Result<Vec<f32>> {
    let output = outputs
        .first()
        .ok_or_else(|| anyhow!("model produced no outputs"))?;
    let view = output
        .to_array_view::<f32>()
        .context("model output tensor was not f32")?;
    Ok(view.iter().cloned().collect())
}

/// Tract-based watch-face detector.
///
/// Expects an exported model with NMS baked in, emitting rows of
/// `(left, top, right, bottom, score)` in model-input pixels. Boxes are
/// rescaled to frame coordinates; they may still land outside the frame
/// (model padding), so downstream clamping applies as usual.
pub struct TractWatchBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_width: u32,
    input_height: u32,
}

impl TractWatchBackend {
    /// Load the clock-face detector ONNX model from disk.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model = load_model(model_path, DETECTOR_INPUT_SIZE, DETECTOR_INPUT_SIZE)?;
        Ok(Self {
            model,
            input_width: DETECTOR_INPUT_SIZE,
            input_height: DETECTOR_INPUT_SIZE,
        })
    }
}

impl WatchDetectorBackend for TractWatchBackend {
    fn name(&self) -> &'static str {
        "tract-watch"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = build_input(pixels, width, height, self.input_width, self.input_height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let flat = output_floats(&outputs)?;
        if flat.len() % 5 != 0 {
            return Err(anyhow!(
                "detection output length {} is not a multiple of 5",
                flat.len()
            ));
        }

        let sx = width as f32 / self.input_width as f32;
        let sy = height as f32 / self.input_height as f32;
        Ok(flat
            .chunks_exact(5)
            .map(|row| Detection {
                bbox: BoundingBox::new(row[0] * sx, row[1] * sy, row[2] * sx, row[3] * sy),
                score: row[4],
            })
            .collect())
    }
}

/// Tract-based watch-hands landmark extractor.
///
/// Expects an exported model emitting a flat vector of normalized `(x, y)`
/// pairs, positionally ordered center / hour tip / minute tip.
pub struct TractHandsBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_width: u32,
    input_height: u32,
}

impl TractHandsBackend {
    /// Load the watch-hands ONNX model from disk.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model = load_model(model_path, HANDS_INPUT_SIZE, HANDS_INPUT_SIZE)?;
        Ok(Self {
            model,
            input_width: HANDS_INPUT_SIZE,
            input_height: HANDS_INPUT_SIZE,
        })
    }
}

impl HandLandmarkBackend for TractHandsBackend {
    fn name(&self) -> &'static str {
        "tract-hands"
    }

    fn landmarks(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Point2D>> {
        let input = build_input(pixels, width, height, self.input_width, self.input_height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let flat = output_floats(&outputs)?;
        if flat.len() % 2 != 0 {
            return Err(anyhow!(
                "landmark output length {} is not a multiple of 2",
                flat.len()
            ));
        }

        Ok(flat
            .chunks_exact(2)
            .map(|pair| Point2D::new(pair[0], pair[1]))
            .collect())
    }
}
