/// State of the Picture Generator page

use std::sync::Arc;

use super::data::UploadedPicture;
use crate::error::InferenceError;
use crate::inference::{decode_rgb, ScaleFactor, ScaleSelection};

#[derive(Debug, Default)]
pub struct GeneratorState {
    pub upload: Option<UploadedPicture>,
    pub selection: ScaleSelection,
    /// Progress bar value while a generation runs
    pub progress: Option<u8>,
    /// Last message for the user
    pub status: String,
}

impl GeneratorState {
    /// Accept a picture from the upload dialog. Undecodable files are
    /// rejected here so generation is never attempted on them.
    pub fn set_upload(&mut self, name: String, bytes: Vec<u8>) -> Result<&UploadedPicture, InferenceError> {
        let decoded = match decode_rgb(&bytes) {
            Ok(img) => img,
            Err(e) => {
                self.upload = None;
                self.status = format!("⚠️ {} is not a readable picture: {}", name, e);
                return Err(e);
            }
        };

        self.status = format!("Loaded {} ({}x{})", name, decoded.width(), decoded.height());
        Ok(self.upload.insert(UploadedPicture {
            name,
            bytes: Arc::new(bytes),
            width: decoded.width(),
            height: decoded.height(),
        }))
    }

    pub fn is_busy(&self) -> bool {
        self.progress.is_some()
    }

    /// Whether the Generate button should be active
    pub fn can_generate(&self) -> bool {
        self.upload.is_some() && !self.is_busy()
    }

    /// Output size of every selected scale for the current upload
    pub fn future_sizes(&self) -> Vec<(ScaleFactor, u32, u32)> {
        match &self.upload {
            Some(upload) => self
                .selection
                .scales()
                .into_iter()
                .map(|scale| (scale, upload.width * scale.factor(), upload.height * scale.factor()))
                .collect(),
            None => Vec::new(),
        }
    }
}
