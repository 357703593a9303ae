/// Generation flow: upload in, gallery directory out
///
/// A generation decodes the upload, stores it as `original.png` and then
/// writes one `x<scale>.png` per requested scale. Nothing is written when the
/// upload cannot be decoded. A model that fails to load stops the remaining
/// scales; files already written stay in place.

use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;

use super::{GalleryStore, GenerationId, ORIGINAL_FILE_NAME};
use crate::error::AppError;
use crate::inference::{decode_rgb, encode_png, upscale_checked, ModelSource, ScaleFactor, ScaleSelection};

/// Progress through the scales of one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.done.min(self.total) * 100 / self.total) as u8
    }
}

/// A generation whose original is saved and whose scales are pending
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: GenerationId,
    pub input: Arc<RgbImage>,
    pub scales: Vec<ScaleFactor>,
    done: usize,
}

impl GenerationJob {
    /// The scale to run next, `None` once every scale is written
    pub fn next_scale(&self) -> Option<ScaleFactor> {
        self.scales.get(self.done).copied()
    }

    /// Record that the pending scale was written
    pub fn complete_scale(&mut self) -> Progress {
        self.done = (self.done + 1).min(self.scales.len());
        self.progress()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            done: self.done,
            total: self.scales.len(),
        }
    }
}

/// Decode the upload and save it as the generation's original
pub fn begin(
    store: &GalleryStore,
    upload: &[u8],
    selection: ScaleSelection,
    id: GenerationId,
) -> Result<GenerationJob, AppError> {
    let input = decode_rgb(upload)?;
    let png = encode_png(&input)?;
    store.save(&id, ORIGINAL_FILE_NAME, &png)?;

    tracing::info!(
        "🚀 Generation {} started: {}x{} picture, scales {:?}",
        id.dir_name(),
        input.width(),
        input.height(),
        selection.scales()
    );

    Ok(GenerationJob {
        id,
        input: Arc::new(input),
        scales: selection.scales(),
        done: 0,
    })
}

/// Upscale the original by one factor and save the result
pub fn upscale_step(
    store: &GalleryStore,
    models: &dyn ModelSource,
    id: &GenerationId,
    input: &RgbImage,
    scale: ScaleFactor,
) -> Result<PathBuf, AppError> {
    let mut model = models.load(scale)?;
    let output = upscale_checked(model.as_mut(), input)?;
    let png = encode_png(&output)?;
    let path = store.save(id, &scale.file_name(), &png)?;

    tracing::info!("✨ {} done: {}x{}", scale, output.width(), output.height());
    Ok(path)
}

/// Run a whole generation, reporting progress after each scale
pub fn generate<P>(
    store: &GalleryStore,
    models: &dyn ModelSource,
    upload: &[u8],
    selection: ScaleSelection,
    id: GenerationId,
    mut progress: P,
) -> Result<GenerationId, AppError>
where
    P: FnMut(Progress),
{
    let mut job = begin(store, upload, selection, id)?;
    progress(job.progress());

    while let Some(scale) = job.next_scale() {
        if let Err(e) = upscale_step(store, models, &job.id, &job.input, scale) {
            tracing::error!("❌ Generation {} failed at {}: {}", job.id.dir_name(), scale, e);
            return Err(e);
        }
        progress(job.complete_scale());
    }

    tracing::info!("✅ Generation {} complete", job.id.dir_name());
    Ok(job.id)
}
