/// State of the Picture Gallery page
///
/// Selection rules:
/// - no generations means nothing is selected and nothing can be compared
/// - picking a generation selects its first file and resets the focal point
/// - the comparison is recomputed whenever zoom, focal point or the decoded
///   pictures change
/// - failures the user should see land in `status` or, for picture loads, in
///   `comparison`

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use super::data::{Comparison, LoadedPair};
use crate::compare::{self, PreviewTransform};
use crate::error::{CropError, GalleryError};
use crate::gallery::{GalleryFile, GalleryStore, GenerationId};

#[derive(Debug)]
pub struct GalleryState {
    pub generations: Vec<GenerationId>,
    pub selected: Option<GenerationId>,
    pub files: Vec<GalleryFile>,
    pub selected_file: Option<usize>,
    /// Zoom percentage, 0-100 in steps of 5
    pub zoom: u8,
    /// Focal point in original-image pixels
    pub focal: (i64, i64),
    /// Decoded original and selected picture, once loaded
    pub loaded: Option<LoadedPair>,
    pub transform: Option<PreviewTransform>,
    pub comparison: Option<Result<Comparison, CropError>>,
    /// Last gallery failure, shown under the page title
    pub status: Option<String>,
    preview_width: u32,
}

impl GalleryState {
    pub fn new(default_zoom: u8, preview_width: u32) -> Self {
        Self {
            generations: Vec::new(),
            selected: None,
            files: Vec::new(),
            selected_file: None,
            zoom: default_zoom.min(100),
            focal: (0, 0),
            loaded: None,
            transform: None,
            comparison: None,
            status: None,
            preview_width,
        }
    }

    /// Re-read the generation list. The current selection is kept if it
    /// still exists, otherwise the most recent generation is selected.
    pub fn refresh(&mut self, store: &GalleryStore) -> Result<(), GalleryError> {
        self.status = None;
        self.generations = store.list_generations()?;

        let keep = self
            .selected
            .filter(|id| self.generations.contains(id));

        match keep.or_else(|| self.generations.first().copied()) {
            Some(id) if Some(id) == keep => {
                // Same generation, but new scales may have been written
                let current = self.selected_file().map(|f| f.path.clone());
                self.files = store.list_files(&id)?;
                self.selected_file = current
                    .and_then(|path| self.files.iter().position(|f| f.path == path))
                    .or(if self.files.is_empty() { None } else { Some(0) });
            }
            Some(id) => self.select_generation(store, id)?,
            None => self.clear(),
        }
        Ok(())
    }

    /// Switch to another generation
    pub fn select_generation(&mut self, store: &GalleryStore, id: GenerationId) -> Result<(), GalleryError> {
        self.clear();
        self.files = store.list_files(&id)?;
        self.selected = Some(id);
        self.selected_file = if self.files.is_empty() { None } else { Some(0) };
        Ok(())
    }

    /// Switch to another file of the current generation
    pub fn select_file(&mut self, index: usize) {
        if index < self.files.len() && self.selected_file != Some(index) {
            self.selected_file = Some(index);
            self.loaded = None;
            self.comparison = None;
        }
    }

    pub fn selected_file(&self) -> Option<&GalleryFile> {
        self.selected_file.and_then(|i| self.files.get(i))
    }

    /// Paths that must be decoded before a comparison is possible:
    /// `(generation, file index, original path, selected path)`
    pub fn pending_load(&self, store: &GalleryStore) -> Option<(GenerationId, usize, PathBuf, PathBuf)> {
        if self.loaded.is_some() {
            return None;
        }
        let id = self.selected?;
        let index = self.selected_file?;
        let file = self.files.get(index)?;
        Some((id, index, store.original_path(&id), file.path.clone()))
    }

    /// Install decoded pictures. Results for a stale selection are dropped.
    pub fn apply_loaded(&mut self, pair: LoadedPair) -> bool {
        if Some(pair.generation) != self.selected || Some(pair.file_index) != self.selected_file {
            tracing::debug!("Dropping stale picture load for {}", pair.generation);
            return false;
        }

        self.transform = Some(PreviewTransform::fit_width(
            pair.original.width(),
            pair.original.height(),
            self.preview_width,
        ));
        self.loaded = Some(pair);
        self.recompute();
        true
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.min(100);
        self.recompute();
    }

    /// Take a click on the preview as the new focal point
    pub fn set_focal_from_preview(&mut self, px: f32, py: f32) {
        if let Some(transform) = &self.transform {
            self.focal = transform.to_image(px, py);
            self.recompute();
        }
    }

    /// Record a failed picture load so the page stops waiting for it.
    /// Failures for a stale selection are dropped.
    pub fn load_failed(&mut self, generation: GenerationId, file_index: usize, error: CropError) -> bool {
        if Some(generation) != self.selected || Some(file_index) != self.selected_file {
            tracing::debug!("Dropping stale load failure for {}", generation);
            return false;
        }

        tracing::error!("❌ Could not load pictures of {}: {}", generation, error);
        self.loaded = None;
        self.transform = None;
        self.comparison = Some(Err(error));
        true
    }

    /// Log a failure and keep it for the status line
    pub fn report(&mut self, context: impl Into<String>, error: impl Display) {
        let message = format!("{}: {}", context.into(), error);
        tracing::error!("❌ {}", message);
        self.status = Some(message);
    }

    /// Snippet side length for the current zoom and original size
    pub fn snippet_size(&self) -> Option<u32> {
        let loaded = self.loaded.as_ref()?;
        Some(compare::snippet_size_for_zoom(
            loaded.original.width(),
            loaded.original.height(),
            self.zoom,
        ))
    }

    /// Size multiplier of the selected file relative to the original
    pub fn selected_scale(&self) -> Option<u32> {
        self.selected_file().map(|f| f.kind.scale())
    }

    fn recompute(&mut self) {
        let (Some(loaded), Some(snippet_size), Some(scale)) =
            (self.loaded.as_ref(), self.snippet_size(), self.selected_scale())
        else {
            self.comparison = None;
            return;
        };

        let plan = compare::crop_windows(
            loaded.original.width(),
            loaded.original.height(),
            snippet_size,
            scale,
            self.focal.0,
            self.focal.1,
        );
        let result = compare::compute_crops(
            &loaded.original,
            &loaded.selected,
            snippet_size,
            scale,
            self.focal.0,
            self.focal.1,
        )
        .map(|(lowres, highres)| Comparison {
            lowres,
            highres,
            focal: plan.focal,
            snippet_size,
        });

        if let Err(e) = &result {
            tracing::warn!("⚠️  Comparison unavailable: {}", e);
        }
        self.comparison = Some(result);
    }

    fn clear(&mut self) {
        self.selected = None;
        self.files.clear();
        self.selected_file = None;
        self.focal = (0, 0);
        self.loaded = None;
        self.transform = None;
        self.comparison = None;
        self.status = None;
    }
}

/// Decode the pictures of one comparison
pub fn load_pair(
    generation: GenerationId,
    file_index: usize,
    original_path: PathBuf,
    selected_path: PathBuf,
) -> Result<LoadedPair, CropError> {
    let original = Arc::new(compare::load_rgb(&original_path)?);
    let selected = if selected_path == original_path {
        Arc::clone(&original)
    } else {
        Arc::new(compare::load_rgb(&selected_path)?)
    };

    Ok(LoadedPair {
        generation,
        file_index,
        original,
        selected,
    })
}
