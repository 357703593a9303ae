use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, text, vertical_rule};
use iced::{Element, Length, Point, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;

use pixelpro::config::Settings;
use pixelpro::error::{AppError, CropError};
use pixelpro::gallery::generation::{self, GenerationJob};
use pixelpro::gallery::{GalleryStore, GenerationId};
use pixelpro::inference::{ModelCatalog, ScaleFactor, ScaleSelection};
use pixelpro::state::data::LoadedPair;
use pixelpro::state::gallery::{self as gallery_state, GalleryState};
use pixelpro::state::generator::GeneratorState;

// Declare the UI module (page views and widgets)
mod ui;

use ui::gallery::GalleryImages;
use ui::Page;

/// Main application state
struct PixelPro {
    settings: Settings,
    store: GalleryStore,
    models: ModelCatalog,
    page: Page,
    generator: GeneratorState,
    /// Rendered upload, shown on the generator page
    upload_preview: Option<Handle>,
    /// Generation in flight
    job: Option<GenerationJob>,
    gallery: GalleryState,
    gallery_images: GalleryImages,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Sidebar navigation
    Navigate(Page),

    /// User clicked "Browse files"
    PickUpload,
    /// Background read of the picked file finished
    UploadRead(String, Result<Vec<u8>, String>),
    SelectScale(ScaleSelection),
    /// User clicked "Generate!"
    Generate,
    /// Original saved, scales pending
    GenerationStarted(Result<GenerationJob, String>),
    /// One scale of the running generation finished
    ScaleFinished(Result<PathBuf, String>),

    RefreshGallery,
    SelectGeneration(GenerationId),
    SelectFile(usize),
    /// Background decode of original + selected file finished
    PicturesLoaded(GenerationId, usize, Result<LoadedPair, CropError>),
    ZoomChanged(u8),
    /// Click on the zoom-area preview, in preview coordinates
    FocalPicked(Point),
    Download,
}

impl PixelPro {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let store = GalleryStore::new(&settings.gallery_root);
        let models = ModelCatalog::new(&settings.models_dir, settings.tiling);

        let available = models.available_scales();
        tracing::info!(
            "🎨 PixelPro initialized: gallery at {}, models {:?} in {}",
            store.root().display(),
            available,
            models.models_dir().display()
        );

        let mut generator = GeneratorState::default();
        generator.status = if available.is_empty() {
            format!("⚠️ No EDSR models found in {}", models.models_dir().display())
        } else {
            "Ready.".to_string()
        };

        let gallery = GalleryState::new(settings.default_zoom, settings.preview_width);

        (
            PixelPro {
                settings,
                store,
                models,
                page: Page::default(),
                generator,
                upload_preview: None,
                job: None,
                gallery,
                gallery_images: GalleryImages::default(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(page) => {
                self.page = page;
                if page == Page::Gallery {
                    return self.refresh_gallery();
                }
                Task::none()
            }

            Message::PickUpload => {
                let file = FileDialog::new()
                    .set_title("Upload a picture")
                    .add_filter("Pictures", &["jpg", "jpeg", "png"])
                    .pick_file();

                if let Some(path) = file {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    return Task::perform(read_file_async(path), move |result| {
                        Message::UploadRead(name.clone(), result)
                    });
                }
                Task::none()
            }
            Message::UploadRead(name, Ok(bytes)) => {
                let preview = Handle::from_bytes(bytes.clone());
                self.upload_preview = match self.generator.set_upload(name, bytes) {
                    Ok(_) => Some(preview),
                    Err(_) => None,
                };
                Task::none()
            }
            Message::UploadRead(name, Err(e)) => {
                tracing::error!("❌ Could not read {}: {}", name, e);
                self.generator.status = format!("⚠️ Could not read {}: {}", name, e);
                Task::none()
            }
            Message::SelectScale(selection) => {
                self.generator.selection = selection;
                Task::none()
            }
            Message::Generate => {
                if !self.generator.can_generate() {
                    return Task::none();
                }
                let Some(upload) = self.generator.upload.as_ref().map(|u| Arc::clone(&u.bytes)) else {
                    return Task::none();
                };

                self.generator.progress = Some(0);
                self.generator.status = "Generating your pictures...".to_string();

                Task::perform(
                    begin_generation_async(
                        self.store.clone(),
                        upload,
                        self.generator.selection,
                        GenerationId::now(),
                    ),
                    Message::GenerationStarted,
                )
            }
            Message::GenerationStarted(Ok(job)) => {
                self.job = Some(job);
                self.next_scale()
            }
            Message::ScaleFinished(Ok(path)) => {
                tracing::debug!("Scale written to {}", path.display());
                if let Some(job) = &mut self.job {
                    self.generator.progress = Some(job.complete_scale().percent());
                }
                self.next_scale()
            }
            Message::GenerationStarted(Err(e)) | Message::ScaleFinished(Err(e)) => {
                tracing::error!("❌ Generation failed: {}", e);
                self.job = None;
                self.generator.progress = None;
                self.generator.status = format!("⚠️ {}", e);
                Task::none()
            }

            Message::RefreshGallery => self.refresh_gallery(),
            Message::SelectGeneration(id) => {
                if let Err(e) = self.gallery.select_generation(&self.store, id) {
                    self.gallery.report(format!("Could not open generation {}", id), e);
                }
                self.gallery_images = GalleryImages::default();
                self.load_pictures()
            }
            Message::SelectFile(index) => {
                self.gallery.select_file(index);
                self.load_pictures()
            }
            Message::PicturesLoaded(_, _, Ok(pair)) => {
                if self.gallery.apply_loaded(pair) {
                    self.gallery_images.preview = match (&self.gallery.transform, &self.gallery.loaded) {
                        (Some(transform), Some(loaded)) => Some(ui::rgb_handle(&transform.render(&loaded.original))),
                        _ => None,
                    };
                    self.render_comparison();
                }
                Task::none()
            }
            Message::PicturesLoaded(id, index, Err(e)) => {
                self.gallery.load_failed(id, index, e);
                Task::none()
            }
            Message::ZoomChanged(zoom) => {
                self.gallery.set_zoom(zoom);
                self.render_comparison();
                Task::none()
            }
            Message::FocalPicked(point) => {
                self.gallery.set_focal_from_preview(point.x, point.y);
                self.render_comparison();
                Task::none()
            }
            Message::Download => {
                let Some(file) = self.gallery.selected_file() else {
                    return Task::none();
                };

                let destination = FileDialog::new()
                    .set_title("Download picture")
                    .set_file_name(file.file_name())
                    .add_filter("PNG", &["png"])
                    .save_file();

                if let Some(destination) = destination {
                    if let Err(e) = self.store.export(&file.path, &destination) {
                        self.gallery.report("Download failed", e);
                    }
                }
                Task::none()
            }
        }
    }

    /// Start the next pending scale, or finish the generation
    fn next_scale(&mut self) -> Task<Message> {
        let Some(job) = &self.job else {
            return Task::none();
        };

        if let Some(scale) = job.next_scale() {
            return Task::perform(
                upscale_async(
                    self.store.clone(),
                    self.models.clone(),
                    job.id,
                    Arc::clone(&job.input),
                    scale,
                ),
                Message::ScaleFinished,
            );
        }

        tracing::info!("✅ Generation {} complete", job.id.dir_name());
        self.job = None;
        self.generator.progress = None;
        self.generator.status = "✅ Success! Please check the Picture Gallery.".to_string();
        Task::none()
    }

    fn refresh_gallery(&mut self) -> Task<Message> {
        let previous = (self.gallery.selected, self.gallery.selected_file);
        if let Err(e) = self.gallery.refresh(&self.store) {
            self.gallery
                .report(format!("Could not read gallery {}", self.store.root().display()), e);
        }
        if previous != (self.gallery.selected, self.gallery.selected_file) {
            self.gallery_images = GalleryImages::default();
        }
        self.load_pictures()
    }

    /// Decode the selected pair in the background if not done yet
    fn load_pictures(&mut self) -> Task<Message> {
        match self.gallery.pending_load(&self.store) {
            Some((id, index, original, selected)) => {
                self.gallery_images.comparison = None;
                Task::perform(load_pair_async(id, index, original, selected), move |result| {
                    Message::PicturesLoaded(id, index, result)
                })
            }
            None => Task::none(),
        }
    }

    fn render_comparison(&mut self) {
        self.gallery_images.comparison = match &self.gallery.comparison {
            Some(Ok(cmp)) => Some((ui::rgb_handle(&cmp.lowres), ui::rgb_handle(&cmp.highres))),
            _ => None,
        };
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let nav = |label: &'static str, page: Page| {
            let style = if self.page == page { button::primary } else { button::secondary };
            button(text(label))
                .style(style)
                .width(Length::Fill)
                .padding(10)
                .on_press(Message::Navigate(page))
        };

        let sidebar = column![
            text("Navigation Menu").size(20),
            nav("Picture Generator", Page::Generator),
            nav("Picture Gallery", Page::Gallery),
            text(format!("Gallery: {}", self.settings.gallery_root.display())).size(12),
            text("© 2023 PixelPro").size(14),
        ]
        .spacing(12)
        .padding(20)
        .width(Length::Fixed(240.0));

        let page = match self.page {
            Page::Generator => ui::generator::view(&self.generator, self.upload_preview.as_ref()),
            Page::Gallery => ui::gallery::view(&self.gallery, &self.gallery_images),
        };

        row![
            sidebar,
            vertical_rule(1),
            container(iced::widget::scrollable(container(page).padding(30)))
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pixelpro=info")),
        )
        .init();

    iced::application("PixelPro", PixelPro::update, PixelPro::view)
        .theme(PixelPro::theme)
        .centered()
        .run_with(PixelPro::new)
}

fn join_error(e: tokio::task::JoinError) -> String {
    AppError::Join(e.to_string()).to_string()
}

/// Read an uploaded file without blocking the UI
async fn read_file_async(path: PathBuf) -> Result<Vec<u8>, String> {
    tokio::fs::read(&path)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))
}

/// Save the original of a new generation
async fn begin_generation_async(
    store: GalleryStore,
    upload: Arc<Vec<u8>>,
    selection: ScaleSelection,
    id: GenerationId,
) -> Result<GenerationJob, String> {
    tokio::task::spawn_blocking(move || {
        generation::begin(&store, &upload, selection, id).map_err(|e| e.to_string())
    })
    .await
    .map_err(join_error)?
}

/// Run one model on the blocking pool; inference is CPU-heavy
async fn upscale_async(
    store: GalleryStore,
    models: ModelCatalog,
    id: GenerationId,
    input: Arc<image::RgbImage>,
    scale: ScaleFactor,
) -> Result<PathBuf, String> {
    tokio::task::spawn_blocking(move || {
        generation::upscale_step(&store, &models, &id, &input, scale).map_err(|e| e.to_string())
    })
    .await
    .map_err(join_error)?
}

/// Decode the original and the selected file for comparison
async fn load_pair_async(
    id: GenerationId,
    index: usize,
    original: PathBuf,
    selected: PathBuf,
) -> Result<LoadedPair, CropError> {
    let path = selected.clone();
    tokio::task::spawn_blocking(move || gallery_state::load_pair(id, index, original, selected))
        .await
        .map_err(|e| CropError::Load {
            path,
            reason: join_error(e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelpro::inference::encode_png;

    #[tokio::test]
    async fn test_read_missing_upload() {
        let result = read_file_async(PathBuf::from("/nonexistent/picture.png")).await;
        let err = result.unwrap_err();
        assert!(err.contains("/nonexistent/picture.png"));
    }

    #[tokio::test]
    async fn test_generation_start_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());

        let result = begin_generation_async(
            store.clone(),
            Arc::new(b"not a picture".to_vec()),
            ScaleSelection::All,
            GenerationId::now(),
        )
        .await;

        assert!(result.unwrap_err().contains("decode"));
        assert!(store.list_generations().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_reported_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path().join("gallery"));
        let models = ModelCatalog::new(dir.path().join("Models"), Default::default());
        let input = Arc::new(image::RgbImage::new(4, 4));

        let err = upscale_async(store, models, GenerationId::now(), input, ScaleFactor::X2)
            .await
            .unwrap_err();
        assert!(err.contains("x2"));
    }

    #[tokio::test]
    async fn test_load_pair_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());
        let id = GenerationId::now();
        let png = encode_png(&image::RgbImage::new(6, 4)).unwrap();
        let original = store.save(&id, "original.png", &png).unwrap();

        let pair = load_pair_async(id, 0, original.clone(), original).await.unwrap();
        assert_eq!(pair.original.dimensions(), (6, 4));
        assert!(Arc::ptr_eq(&pair.original, &pair.selected));
    }

    #[tokio::test]
    async fn test_load_pair_without_original_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::new(dir.path());
        let id = GenerationId::now();
        let png = encode_png(&image::RgbImage::new(6, 4)).unwrap();
        let x2 = store.save(&id, "x2.png", &png).unwrap();

        let err = load_pair_async(id, 0, store.original_path(&id), x2).await.unwrap_err();
        assert!(matches!(err, CropError::Load { ref path, .. } if *path == store.original_path(&id)));
    }
}
