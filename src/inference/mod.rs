/// Super-resolution inference
///
/// This module wraps the pretrained upscaling models:
/// - `ScaleFactor` / `ScaleSelection` - which models a request needs
/// - `Upscaler` - anything that turns an RGB image into a `scale ×` one
/// - `edsr.rs` - the ONNX-backed EDSR model
/// - `tiling.rs` - tiled inference to bound memory on large pictures
/// - `ModelCatalog` - resolves `EDSR_<scale>x.onnx` artifacts on disk

pub mod edsr;
pub mod tiling;

pub use edsr::EdsrModel;

use image::{ImageFormat, RgbImage};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::TilingSettings;
use crate::error::InferenceError;

/// Upscale factor of one pretrained model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScaleFactor {
    X2,
    X4,
    X8,
}

impl ScaleFactor {
    pub const ALL: [ScaleFactor; 3] = [ScaleFactor::X2, ScaleFactor::X4, ScaleFactor::X8];

    pub fn factor(self) -> u32 {
        match self {
            ScaleFactor::X2 => 2,
            ScaleFactor::X4 => 4,
            ScaleFactor::X8 => 8,
        }
    }

    pub fn from_factor(factor: u32) -> Option<Self> {
        match factor {
            2 => Some(ScaleFactor::X2),
            4 => Some(ScaleFactor::X4),
            8 => Some(ScaleFactor::X8),
            _ => None,
        }
    }

    /// Name of the model artifact, e.g. `EDSR_4x`
    pub fn model_name(self) -> String {
        format!("EDSR_{}x", self.factor())
    }

    /// Gallery file holding this scale's output, e.g. `x4.png`
    pub fn file_name(self) -> String {
        format!("x{}.png", self.factor())
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.factor())
    }
}

/// What the user picked in the scale selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleSelection {
    #[default]
    X2,
    X4,
    X8,
    All,
}

impl ScaleSelection {
    pub const OPTIONS: [ScaleSelection; 4] = [
        ScaleSelection::X2,
        ScaleSelection::X4,
        ScaleSelection::X8,
        ScaleSelection::All,
    ];

    /// Scales to generate, in generation order
    pub fn scales(self) -> Vec<ScaleFactor> {
        match self {
            ScaleSelection::X2 => vec![ScaleFactor::X2],
            ScaleSelection::X4 => vec![ScaleFactor::X4],
            ScaleSelection::X8 => vec![ScaleFactor::X8],
            ScaleSelection::All => ScaleFactor::ALL.to_vec(),
        }
    }
}

impl fmt::Display for ScaleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleSelection::X2 => f.write_str("x2"),
            ScaleSelection::X4 => f.write_str("x4"),
            ScaleSelection::X8 => f.write_str("x8"),
            ScaleSelection::All => f.write_str("All"),
        }
    }
}

/// A model that upscales RGB images by a fixed factor
pub trait Upscaler {
    fn scale(&self) -> ScaleFactor;

    fn upscale_image(&mut self, input: &RgbImage) -> Result<RgbImage, InferenceError>;
}

/// Somewhere models can be loaded from, one per scale
pub trait ModelSource {
    fn load(&self, scale: ScaleFactor) -> Result<Box<dyn Upscaler + Send>, InferenceError>;
}

/// Decode JPEG/PNG bytes to RGB8
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, InferenceError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Encode an RGB8 image as PNG bytes
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, InferenceError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| InferenceError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Run an upscaler and check the output is exactly `scale ×` the input
pub fn upscale_checked(
    upscaler: &mut dyn Upscaler,
    input: &RgbImage,
) -> Result<RgbImage, InferenceError> {
    let factor = upscaler.scale().factor();
    let output = upscaler.upscale_image(input)?;

    let (expected_width, expected_height) = (input.width() * factor, input.height() * factor);
    if output.dimensions() != (expected_width, expected_height) {
        return Err(InferenceError::ShapeMismatch {
            expected_width,
            expected_height,
            actual_width: output.width(),
            actual_height: output.height(),
        });
    }
    Ok(output)
}

/// Upscale encoded image bytes, returning PNG bytes
pub fn upscale_bytes(
    upscaler: &mut dyn Upscaler,
    image_bytes: &[u8],
) -> Result<Vec<u8>, InferenceError> {
    let input = decode_rgb(image_bytes)?;
    let output = upscale_checked(upscaler, &input)?;
    encode_png(&output)
}

/// Model artifacts on disk, addressed as `<dir>/EDSR_<scale>x.onnx`
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models_dir: PathBuf,
    tiling: TilingSettings,
}

impl ModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>, tiling: TilingSettings) -> Self {
        Self {
            models_dir: models_dir.into(),
            tiling,
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn artifact_path(&self, scale: ScaleFactor) -> PathBuf {
        self.models_dir.join(format!("{}.onnx", scale.model_name()))
    }

    /// Scales whose artifact is present
    pub fn available_scales(&self) -> Vec<ScaleFactor> {
        ScaleFactor::ALL
            .into_iter()
            .filter(|scale| self.artifact_path(*scale).is_file())
            .collect()
    }

    /// Load the model for one scale and upscale encoded image bytes with it
    pub fn upscale(&self, scale: ScaleFactor, image_bytes: &[u8]) -> Result<Vec<u8>, InferenceError> {
        // Decode first so a bad upload never pays for a model load
        let input = decode_rgb(image_bytes)?;
        let mut model = self.load(scale)?;
        let output = upscale_checked(model.as_mut(), &input)?;
        encode_png(&output)
    }
}

impl ModelSource for ModelCatalog {
    fn load(&self, scale: ScaleFactor) -> Result<Box<dyn Upscaler + Send>, InferenceError> {
        let path = self.artifact_path(scale);
        if !path.is_file() {
            return Err(InferenceError::ModelLoad {
                scale: scale.factor(),
                path,
                reason: "artifact not found".to_string(),
            });
        }

        let mut model = EdsrModel::from_path(&path, scale)?;
        model.set_tiling(self.tiling);
        Ok(Box::new(model))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::NearestUpscaler;
    use super::*;

    /// Model that ignores the requested scale
    struct BrokenUpscaler;

    impl Upscaler for BrokenUpscaler {
        fn scale(&self) -> ScaleFactor {
            ScaleFactor::X4
        }

        fn upscale_image(&mut self, input: &RgbImage) -> Result<RgbImage, InferenceError> {
            Ok(RgbImage::new(input.width() * 2, input.height() * 2))
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]))).unwrap()
    }

    #[test]
    fn test_selection_expands_in_order() {
        assert_eq!(ScaleSelection::X4.scales(), vec![ScaleFactor::X4]);
        assert_eq!(
            ScaleSelection::All.scales(),
            vec![ScaleFactor::X2, ScaleFactor::X4, ScaleFactor::X8]
        );
        assert_eq!(ScaleSelection::All.to_string(), "All");
    }

    #[test]
    fn test_scale_names() {
        assert_eq!(ScaleFactor::X8.model_name(), "EDSR_8x");
        assert_eq!(ScaleFactor::X2.file_name(), "x2.png");
        assert_eq!(ScaleFactor::X4.to_string(), "x4");
        assert_eq!(ScaleFactor::from_factor(4), Some(ScaleFactor::X4));
        assert_eq!(ScaleFactor::from_factor(3), None);
    }

    #[test]
    fn test_output_is_scale_times_input() {
        let bytes = png_bytes(13, 7);
        for scale in ScaleFactor::ALL {
            let out = upscale_bytes(&mut NearestUpscaler(scale), &bytes).unwrap();
            let img = decode_rgb(&out).unwrap();
            assert_eq!(img.dimensions(), (13 * scale.factor(), 7 * scale.factor()));
        }
    }

    #[test]
    fn test_wrong_output_size_is_rejected() {
        let err = upscale_bytes(&mut BrokenUpscaler, &png_bytes(5, 5)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::ShapeMismatch { expected_width: 20, actual_width: 10, .. }
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = upscale_bytes(&mut NearestUpscaler(ScaleFactor::X2), b"not an image").unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[test]
    fn test_catalog_paths() {
        let catalog = ModelCatalog::new("Models", TilingSettings::default());
        assert_eq!(
            catalog.artifact_path(ScaleFactor::X4),
            PathBuf::from("Models/EDSR_4x.onnx")
        );
    }

    #[test]
    fn test_catalog_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ModelCatalog::new(dir.path(), TilingSettings::default());
        assert!(catalog.available_scales().is_empty());

        let err = catalog.upscale(ScaleFactor::X2, &png_bytes(4, 4)).unwrap_err();
        assert!(matches!(err, InferenceError::ModelLoad { scale: 2, .. }));
    }

    #[test]
    fn test_catalog_decodes_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ModelCatalog::new(dir.path(), TilingSettings::default());
        let err = catalog.upscale(ScaleFactor::X2, b"\x89PNG broken").unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[test]
    fn test_catalog_lists_present_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("EDSR_4x.onnx"), b"").unwrap();
        let catalog = ModelCatalog::new(dir.path(), TilingSettings::default());
        assert_eq!(catalog.available_scales(), vec![ScaleFactor::X4]);
    }
}
