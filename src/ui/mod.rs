/// Page views and custom widgets
///
/// - `generator.rs` - Picture Generator page
/// - `gallery.rs` - Picture Gallery page
/// - `canvas.rs` - focal-point picker drawn over the preview

pub mod canvas;
pub mod gallery;
pub mod generator;

use iced::widget::image::Handle;
use image::{DynamicImage, RgbImage};

/// Upload an RGB picture as an iced image handle
pub fn rgb_handle(img: &RgbImage) -> Handle {
    let rgba = DynamicImage::ImageRgb8(img.clone()).to_rgba8();
    Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw())
}

/// Which page the sidebar has selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Generator,
    Gallery,
}
