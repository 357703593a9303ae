/// Shared data structures for the application state
///
/// These structs flow between background tasks and the UI layer, so they
/// are cheap to clone.

use image::RgbImage;
use std::sync::Arc;

use crate::gallery::GenerationId;

/// A picture picked in the upload dialog
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedPicture {
    /// File name only (e.g., "holiday.jpg")
    pub name: String,
    /// Encoded bytes exactly as read from disk
    pub bytes: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

/// Decoded pictures needed to compare one gallery file against its original
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub generation: GenerationId,
    /// Index of the compared file in the generation's file list
    pub file_index: usize,
    pub original: Arc<RgbImage>,
    pub selected: Arc<RgbImage>,
}

/// The two aligned crops shown side by side
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lowres: RgbImage,
    pub highres: RgbImage,
    /// Focal point actually used, after edge clamping
    pub focal: (i64, i64),
    pub snippet_size: u32,
}
