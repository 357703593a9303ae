/// Crop/compare engine
///
/// Given a low-resolution image, its upscaled counterpart and a focal pixel in
/// low-resolution space, cut two aligned square windows so the same region
/// can be shown side by side.
///
/// Clamping is done per axis and checks the far edge before the near edge.
/// When the snippet is larger than the image this yields a negative focal
/// coordinate and the crop reports `CropError::OutOfBounds`.

pub mod transform;

pub use transform::PreviewTransform;

use image::{imageops, RgbImage};
use std::path::Path;

use crate::error::CropError;

/// Smallest snippet side length the zoom mapping will produce
pub const MIN_SNIPPET_SIZE: u32 = 2;

/// Half-open pixel window `[left, right) × [top, bottom)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl CropWindow {
    /// Square window of side `2 * half` centred on `(cx, cy)`
    fn centred(cx: i64, cy: i64, half: i64) -> Self {
        Self {
            left: cx - half,
            top: cy - half,
            right: cx + half,
            bottom: cy + half,
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// Check the window lies inside a `width × height` image
    pub fn check_within(&self, width: u32, height: u32) -> Result<(), CropError> {
        let inside = self.left >= 0
            && self.top >= 0
            && self.right <= width as i64
            && self.bottom <= height as i64;

        if inside {
            Ok(())
        } else {
            Err(CropError::OutOfBounds {
                left: self.left,
                top: self.top,
                right: self.right,
                bottom: self.bottom,
                width,
                height,
            })
        }
    }

    fn cut(&self, img: &RgbImage) -> Result<RgbImage, CropError> {
        self.check_within(img.width(), img.height())?;
        Ok(imageops::crop_imm(
            img,
            self.left as u32,
            self.top as u32,
            self.width() as u32,
            self.height() as u32,
        )
        .to_image())
    }
}

/// Window arithmetic for one comparison, before any pixels are touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    /// Focal point after clamping, in low-resolution pixels
    pub focal: (i64, i64),
    pub lowres: CropWindow,
    pub highres: CropWindow,
}

/// Clamp one focal coordinate so a window of `half` either side fits in
/// `dimension`. The far edge wins when both edges are violated.
pub fn clamp_focal(focal: i64, half: i64, dimension: i64) -> i64 {
    if focal + half > dimension {
        dimension - half
    } else if focal - half < 0 {
        half
    } else {
        focal
    }
}

/// Compute the low- and high-resolution windows for a focal point
pub fn crop_windows(
    lowres_width: u32,
    lowres_height: u32,
    snippet_size: u32,
    scale: u32,
    focal_x: i64,
    focal_y: i64,
) -> CropPlan {
    let half = (snippet_size / 2) as i64;
    let scale = scale as i64;

    let fx = clamp_focal(focal_x, half, lowres_width as i64);
    let fy = clamp_focal(focal_y, half, lowres_height as i64);

    CropPlan {
        focal: (fx, fy),
        lowres: CropWindow::centred(fx, fy, half),
        highres: CropWindow::centred(fx * scale, fy * scale, half * scale),
    }
}

/// Cut matching windows out of a low-resolution image and its `scale ×`
/// counterpart.
///
/// Returns `(lowres_crop, highres_crop)`. The crops are
/// `2*floor(snippet/2)` and `2*floor(snippet/2)*scale` pixels square.
pub fn compute_crops(
    lowres: &RgbImage,
    highres: &RgbImage,
    snippet_size: u32,
    scale: u32,
    focal_x: i64,
    focal_y: i64,
) -> Result<(RgbImage, RgbImage), CropError> {
    if snippet_size / 2 == 0 || scale == 0 {
        return Err(CropError::EmptySnippet);
    }

    let plan = crop_windows(
        lowres.width(),
        lowres.height(),
        snippet_size,
        scale,
        focal_x,
        focal_y,
    );

    let lowres_crop = plan.lowres.cut(lowres)?;
    let highres_crop = plan.highres.cut(highres)?;
    Ok((lowres_crop, highres_crop))
}

/// Decode two gallery files and crop them
pub fn compute_crops_from_files(
    lowres_path: &Path,
    highres_path: &Path,
    snippet_size: u32,
    scale: u32,
    focal_x: i64,
    focal_y: i64,
) -> Result<(RgbImage, RgbImage), CropError> {
    let lowres = load_rgb(lowres_path)?;
    let highres = load_rgb(highres_path)?;
    compute_crops(&lowres, &highres, snippet_size, scale, focal_x, focal_y)
}

/// Decode any supported file as RGB8
pub fn load_rgb(path: &Path) -> Result<RgbImage, CropError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| CropError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Map a zoom percentage to a snippet side length.
///
/// `zoom = 0` shows the largest square that fits, `zoom = 100` the minimum.
pub fn snippet_size_for_zoom(width: u32, height: u32, zoom: u8) -> u32 {
    let zoom = zoom.min(100) as u64;
    let max_size = width.min(height) as u64;
    // Integer form of trunc(max_size * (1 - zoom/100))
    let snippet = (max_size * (100 - zoom) / 100) as u32;
    snippet.max(MIN_SNIPPET_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Image whose pixel at (x, y) encodes its own coordinates
    fn coordinate_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]))
    }

    #[test]
    fn test_clamp_interior_unchanged() {
        assert_eq!(clamp_focal(50, 10, 100), 50);
        assert_eq!(clamp_focal(10, 10, 100), 10);
        assert_eq!(clamp_focal(90, 10, 100), 90);
    }

    #[test]
    fn test_clamp_edges() {
        assert_eq!(clamp_focal(95, 10, 100), 90);
        assert_eq!(clamp_focal(3, 10, 100), 10);
        assert_eq!(clamp_focal(-4, 10, 100), 10);
    }

    #[test]
    fn test_clamp_far_edge_takes_precedence() {
        // Snippet (30) wider than the image (20): far edge checked first
        assert_eq!(clamp_focal(10, 15, 20), 5);
        assert_eq!(clamp_focal(0, 15, 20), 5);
        assert_eq!(clamp_focal(0, 15, 10), -5);
    }

    #[test]
    fn test_documented_example_windows() {
        let plan = crop_windows(100, 100, 20, 2, 95, 50);
        assert_eq!(plan.focal, (90, 50));
        assert_eq!(plan.lowres, CropWindow { left: 80, top: 40, right: 100, bottom: 60 });
        assert_eq!(plan.highres, CropWindow { left: 160, top: 80, right: 200, bottom: 120 });
    }

    #[test]
    fn test_interior_crop_sizes_and_centre() {
        let lowres = coordinate_image(100, 80);
        let highres = coordinate_image(400, 320);

        let (lo, hi) = compute_crops(&lowres, &highres, 20, 4, 40, 30).unwrap();
        assert_eq!(lo.dimensions(), (20, 20));
        assert_eq!(hi.dimensions(), (80, 80));

        // Top-left of the low-res crop is (focal - half)
        assert_eq!(lo.get_pixel(0, 0), &Rgb([30, 20, 7]));
        // Top-left of the high-res crop is (focal*scale - half*scale)
        assert_eq!(hi.get_pixel(0, 0), &Rgb([120, 80, 7]));
    }

    #[test]
    fn test_far_edge_crop_ends_at_width() {
        let lowres = coordinate_image(100, 100);
        let highres = coordinate_image(200, 200);

        let (lo, hi) = compute_crops(&lowres, &highres, 20, 2, 95, 50).unwrap();
        assert_eq!(lo.dimensions(), (20, 20));
        assert_eq!(hi.dimensions(), (40, 40));
        // Rightmost column of the crop is the image's last column
        assert_eq!(lo.get_pixel(19, 0)[0], 99);
        assert_eq!(hi.get_pixel(39, 0)[0], 199);
    }

    #[test]
    fn test_default_focal_snaps_to_near_edge() {
        let lowres = coordinate_image(64, 64);
        let highres = coordinate_image(128, 128);

        let (lo, _) = compute_crops(&lowres, &highres, 16, 2, 0, 0).unwrap();
        assert_eq!(lo.get_pixel(0, 0), &Rgb([0, 0, 7]));
    }

    #[test]
    fn test_oversized_snippet_is_out_of_bounds() {
        let lowres = coordinate_image(10, 10);
        let highres = coordinate_image(20, 20);

        let err = compute_crops(&lowres, &highres, 30, 2, 5, 5).unwrap_err();
        assert_eq!(
            err,
            CropError::OutOfBounds { left: -20, top: -20, right: 10, bottom: 10, width: 10, height: 10 }
        );
    }

    #[test]
    fn test_snippet_below_two_is_rejected() {
        let img = coordinate_image(10, 10);
        assert_eq!(compute_crops(&img, &img, 1, 1, 5, 5), Err(CropError::EmptySnippet));
    }

    #[test]
    fn test_same_image_at_scale_one() {
        let img = coordinate_image(50, 40);
        let (lo, hi) = compute_crops(&img, &img, 10, 1, 25, 20).unwrap();
        assert_eq!(lo, hi);
    }

    #[test]
    fn test_crops_are_repeatable() {
        let lowres = coordinate_image(60, 60);
        let highres = coordinate_image(480, 480);

        let first = compute_crops(&lowres, &highres, 12, 8, 17, 44).unwrap();
        let second = compute_crops(&lowres, &highres, 12, 8, 17, 44).unwrap();
        assert_eq!(first.0.as_raw(), second.0.as_raw());
        assert_eq!(first.1.as_raw(), second.1.as_raw());
    }

    #[test]
    fn test_crops_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let lo_path = dir.path().join("original.png");
        let hi_path = dir.path().join("x2.png");
        coordinate_image(30, 30).save(&lo_path).unwrap();
        coordinate_image(60, 60).save(&hi_path).unwrap();

        let (lo, hi) = compute_crops_from_files(&lo_path, &hi_path, 10, 2, 15, 15).unwrap();
        assert_eq!(lo.dimensions(), (10, 10));
        assert_eq!(hi.dimensions(), (20, 20));

        let missing = dir.path().join("x4.png");
        assert!(matches!(
            compute_crops_from_files(&lo_path, &missing, 10, 4, 15, 15),
            Err(CropError::Load { .. })
        ));
    }

    #[test]
    fn test_zoom_mapping() {
        assert_eq!(snippet_size_for_zoom(300, 200, 0), 200);
        assert_eq!(snippet_size_for_zoom(300, 200, 50), 100);
        assert_eq!(snippet_size_for_zoom(300, 200, 95), 10);
        assert_eq!(snippet_size_for_zoom(300, 200, 100), 2);
        assert_eq!(snippet_size_for_zoom(3, 3, 50), 2);
        assert_eq!(snippet_size_for_zoom(101, 101, 50), 50);
    }
}
