/// Tiled inference
///
/// Large pictures are cut into tiles with a context margin on every side,
/// each padded tile is upscaled on its own, and only the tile's own region
/// of the output is pasted into the final canvas. The margin hides seams.

use image::{imageops, RgbImage};

use crate::config::TilingSettings;
use crate::error::InferenceError;

/// Whether a `width × height` input should be tiled
pub fn needs_tiling(settings: &TilingSettings, width: u32, height: u32) -> bool {
    settings.enabled && settings.tile > 0 && (width as u64) * (height as u64) > settings.threshold_pixels
}

/// Upscale `input` tile by tile with `infer`, which must return exactly
/// `factor ×` its input.
pub fn upscale_tiled<F>(
    input: &RgbImage,
    factor: u32,
    settings: &TilingSettings,
    mut infer: F,
) -> Result<RgbImage, InferenceError>
where
    F: FnMut(&RgbImage) -> Result<RgbImage, InferenceError>,
{
    let (width, height) = input.dimensions();
    let tile = settings.tile.max(1);
    let pad = settings.pad;
    let mut canvas = RgbImage::new(width * factor, height * factor);
    let mut tiles = 0usize;

    let mut y0 = 0;
    while y0 < height {
        let y1 = (y0 + tile).min(height);
        let y0p = y0.saturating_sub(pad);
        let y1p = (y1 + pad).min(height);

        let mut x0 = 0;
        while x0 < width {
            let x1 = (x0 + tile).min(width);
            let x0p = x0.saturating_sub(pad);
            let x1p = (x1 + pad).min(width);

            let padded = imageops::crop_imm(input, x0p, y0p, x1p - x0p, y1p - y0p).to_image();
            let out = infer(&padded)?;

            let expected = ((x1p - x0p) * factor, (y1p - y0p) * factor);
            if out.dimensions() != expected {
                return Err(InferenceError::ShapeMismatch {
                    expected_width: expected.0,
                    expected_height: expected.1,
                    actual_width: out.width(),
                    actual_height: out.height(),
                });
            }

            // Drop the context margin, keep the tile's own region
            let region = imageops::crop_imm(
                &out,
                (x0 - x0p) * factor,
                (y0 - y0p) * factor,
                (x1 - x0) * factor,
                (y1 - y0) * factor,
            )
            .to_image();
            imageops::replace(&mut canvas, &region, (x0 * factor) as i64, (y0 * factor) as i64);

            tiles += 1;
            x0 = x1;
        }
        y0 = y1;
    }

    tracing::debug!("Upscaled {}x{} in {} tiles", width, height, tiles);
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::imageops::FilterType;
    use image::Rgb;

    fn nearest(factor: u32) -> impl FnMut(&RgbImage) -> Result<RgbImage, InferenceError> {
        move |img: &RgbImage| {
            Ok(imageops::resize(img, img.width() * factor, img.height() * factor, FilterType::Nearest))
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8]))
    }

    #[test]
    fn test_threshold() {
        let settings = TilingSettings { enabled: true, tile: 64, pad: 8, threshold_pixels: 100 };
        assert!(!needs_tiling(&settings, 10, 10));
        assert!(needs_tiling(&settings, 11, 10));

        let disabled = TilingSettings { enabled: false, ..settings };
        assert!(!needs_tiling(&disabled, 1000, 1000));
    }

    #[test]
    fn test_tiled_matches_whole_image() {
        let input = gradient(37, 23);
        let settings = TilingSettings { enabled: true, tile: 10, pad: 3, threshold_pixels: 0 };

        let whole = nearest(4)(&input).unwrap();
        let tiled = upscale_tiled(&input, 4, &settings, nearest(4)).unwrap();
        assert_eq!(tiled.dimensions(), (148, 92));
        assert_eq!(tiled, whole);
    }

    #[test]
    fn test_tile_count_and_padding() {
        let input = gradient(20, 20);
        let settings = TilingSettings { enabled: true, tile: 10, pad: 2, threshold_pixels: 0 };

        let mut seen = Vec::new();
        upscale_tiled(&input, 2, &settings, |tile: &RgbImage| {
            seen.push(tile.dimensions());
            nearest(2)(tile)
        })
        .unwrap();

        // Four tiles, each padded only on the inner sides
        assert_eq!(seen, vec![(12, 12), (12, 12), (12, 12), (12, 12)]);
    }

    #[test]
    fn test_bad_tile_output_is_reported() {
        let input = gradient(8, 8);
        let settings = TilingSettings { enabled: true, tile: 4, pad: 0, threshold_pixels: 0 };

        let err = upscale_tiled(&input, 2, &settings, |tile: &RgbImage| Ok(tile.clone())).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { expected_width: 8, actual_width: 4, .. }));
    }
}
