/// Error types for every layer of the application
///
/// Each concern owns its own enum; the shell collects them into `AppError`
/// so a single status line can report whatever went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the inference adapter
#[derive(Error, Debug)]
pub enum InferenceError {
    /// No artifact exists for the requested scale, or the runtime rejected it
    #[error("no usable model for x{scale} at {path}: {reason}")]
    ModelLoad {
        scale: u32,
        path: PathBuf,
        reason: String,
    },

    /// The input bytes are not a decodable JPEG/PNG image
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The model ran but failed mid-inference
    #[error("inference failed: {0}")]
    Runtime(String),

    /// The model produced an image that is not exactly `scale ×` the input
    #[error("model output {actual_width}x{actual_height} does not match expected {expected_width}x{expected_height}")]
    ShapeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// The upscaled image could not be encoded back to PNG
    #[error("could not encode output: {0}")]
    Encode(String),
}

/// Failures of the gallery store
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a generation directory name: {0}")]
    InvalidTimestamp(String),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl GalleryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GalleryError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the crop/compare engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CropError {
    /// A computed slice index is negative or past the image edge.
    /// Happens when the snippet is larger than the image.
    #[error("crop window rows {top}..{bottom}, cols {left}..{right} exceeds {width}x{height} image")]
    OutOfBounds {
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
        width: u32,
        height: u32,
    },

    #[error("snippet size must be positive")]
    EmptySnippet,

    #[error("could not read {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

/// Failures while loading or saving settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not determine the user configuration directory")]
    NoConfigDir,
}

/// Everything the shell can surface to the user
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Gallery(#[from] GalleryError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error("background task failed: {0}")]
    Join(String),
}
