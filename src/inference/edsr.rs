/// EDSR super-resolution model running on ONNX Runtime
///
/// The exported EDSR graphs take a single NHWC float32 tensor with values in
/// 0-255 (batch of 1) and return the upscaled NHWC tensor in the same range.
/// The output is clipped to 0-255 and rounded before it becomes RGB8 again.

use image::RgbImage;
use ndarray::{Array4, Ix4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};

use super::tiling::{needs_tiling, upscale_tiled};
use super::{ScaleFactor, Upscaler};
use crate::config::TilingSettings;
use crate::error::InferenceError;

/// One loaded EDSR model, fixed to a single scale
pub struct EdsrModel {
    session: Session,
    scale: ScaleFactor,
    path: PathBuf,
    tiling: TilingSettings,
}

impl EdsrModel {
    /// Load a model artifact from disk
    pub fn from_path(path: &Path, scale: ScaleFactor) -> Result<Self, InferenceError> {
        let session = Session::builder()
            .map_err(load_error(scale, path))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error(scale, path))?
            .commit_from_file(path)
            .map_err(load_error(scale, path))?;

        tracing::info!("🧠 Loaded {} from {}", scale.model_name(), path.display());

        Ok(Self {
            session,
            scale,
            path: path.to_path_buf(),
            tiling: TilingSettings::default(),
        })
    }

    pub fn set_tiling(&mut self, tiling: TilingSettings) {
        self.tiling = tiling;
    }

    /// Run the network once on a whole (sub)image
    fn infer_raw(&mut self, input: &RgbImage) -> Result<RgbImage, InferenceError> {
        let (width, height) = input.dimensions();

        // Add the batch dimension and convert to float, values stay 0-255
        let pixels: Vec<f32> = input.as_raw().iter().map(|&v| v as f32).collect();
        let array = Array4::from_shape_vec((1, height as usize, width as usize, 3), pixels)
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;
        let tensor = Tensor::from_array(array).map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;
        let view = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;
        let out = view
            .into_dimensionality::<Ix4>()
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let shape = out.shape();
        if shape[0] != 1 || shape[3] != 3 {
            return Err(InferenceError::Runtime(format!(
                "unexpected output tensor shape {:?}, want [1, H, W, 3]",
                shape
            )));
        }
        let (out_height, out_width) = (shape[1] as u32, shape[2] as u32);

        // Clip to the valid RGB range and round to whole values
        let bytes: Vec<u8> = out.iter().map(|&v| v.clamp(0.0, 255.0).round() as u8).collect();

        RgbImage::from_raw(out_width, out_height, bytes)
            .ok_or_else(|| InferenceError::Runtime("output buffer size mismatch".to_string()))
    }
}

fn load_error<E: std::fmt::Display>(scale: ScaleFactor, path: &Path) -> impl Fn(E) -> InferenceError + '_ {
    move |e| InferenceError::ModelLoad {
        scale: scale.factor(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl Upscaler for EdsrModel {
    fn scale(&self) -> ScaleFactor {
        self.scale
    }

    fn upscale_image(&mut self, input: &RgbImage) -> Result<RgbImage, InferenceError> {
        let (width, height) = input.dimensions();
        let tiling = self.tiling;

        if needs_tiling(&tiling, width, height) {
            tracing::debug!("Tiling {}x{} input for {}", width, height, self.scale.model_name());
            let factor = self.scale.factor();
            upscale_tiled(input, factor, &tiling, |tile| self.infer_raw(tile))
        } else {
            self.infer_raw(input)
        }
    }
}

impl std::fmt::Debug for EdsrModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdsrModel")
            .field("scale", &self.scale)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_artifact_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EDSR_2x.onnx");
        std::fs::write(&path, b"definitely not a protobuf").unwrap();

        let err = EdsrModel::from_path(&path, ScaleFactor::X2).unwrap_err();
        assert!(matches!(err, InferenceError::ModelLoad { scale: 2, .. }));
    }
}
