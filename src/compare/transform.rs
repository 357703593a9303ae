/// Coordinate transform between a downscaled preview and the full image
///
/// The gallery shows the original picture shrunk to a fixed width; clicks on
/// that preview are mapped back to full-resolution pixels through one
/// transform built when the picture is opened.

use image::{imageops::FilterType, RgbImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewTransform {
    image_width: u32,
    image_height: u32,
    preview_width: u32,
    preview_height: u32,
    /// preview pixels per image pixel
    ratio: f64,
}

impl PreviewTransform {
    /// Fit an image to `preview_width`, keeping its aspect ratio
    pub fn fit_width(image_width: u32, image_height: u32, preview_width: u32) -> Self {
        let image_width = image_width.max(1);
        let preview_width = preview_width.max(1);
        let ratio = preview_width as f64 / image_width as f64;
        let preview_height = ((image_height as f64 * ratio) as u32).max(1);

        Self {
            image_width,
            image_height,
            preview_width,
            preview_height,
            ratio,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn preview_size(&self) -> (u32, u32) {
        (self.preview_width, self.preview_height)
    }

    /// Preview point to image pixel, truncated and kept inside the image
    pub fn to_image(&self, px: f32, py: f32) -> (i64, i64) {
        let x = (px as f64 / self.ratio) as i64;
        let y = (py as f64 / self.ratio) as i64;
        (
            x.clamp(0, self.image_width as i64 - 1),
            y.clamp(0, (self.image_height as i64 - 1).max(0)),
        )
    }

    /// Image pixel to preview point
    pub fn to_preview(&self, x: i64, y: i64) -> (f32, f32) {
        ((x as f64 * self.ratio) as f32, (y as f64 * self.ratio) as f32)
    }

    /// Render the preview picture itself
    pub fn render(&self, img: &RgbImage) -> RgbImage {
        image::imageops::resize(
            img,
            self.preview_width,
            self.preview_height,
            FilterType::Triangle,
        )
    }
}
