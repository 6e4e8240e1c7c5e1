//! Bandwidth-limited preview raster for the interactive crop UI.
//!
//! The preview shows the whole, un-cropped first image of the batch so the
//! UI can draw the drag rectangle over it.

use crate::core::tensor::ImageBatch;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use ndarray::Axis;

/// Largest preview edge in pixels unless configured otherwise.
pub const DEFAULT_MAX_PREVIEW_DIMENSION: u32 = 1024;

/// A preview raster and the factor it was scaled by.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub raster: RgbImage,
    /// `preview size / original size`; 1.0 when no downscaling occurred.
    pub scale: f64,
}

impl PreviewImage {
    /// Preview width in pixels.
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Preview height in pixels.
    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// Scale that fits `width` x `height` within `max_dimension`.
pub fn preview_scale(width: u32, height: u32, max_dimension: u32) -> f64 {
    let longest = width.max(height);
    if longest > max_dimension {
        f64::from(max_dimension) / f64::from(longest)
    } else {
        1.0
    }
}

/// Dimensions after applying `scale`, rounded and kept within `1..=max_dimension`.
pub fn scaled_size(width: u32, height: u32, scale: f64, max_dimension: u32) -> (u32, u32) {
    let limit = max_dimension.max(1);
    let scale_dim = |d: u32| ((f64::from(d) * scale).round() as u32).clamp(1, limit);
    (scale_dim(width), scale_dim(height))
}

/// Convert a [0, 1] intensity to 8 bits.
pub fn to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0).round() as u8
}

/// Render the first image of `batch`, downscaled to fit `max_dimension`.
///
/// One- and two-channel images are shown as gray; channels past the third
/// (alpha) are dropped.
pub fn render_preview(batch: &ImageBatch, max_dimension: u32) -> PreviewImage {
    // Batches always hold at least one image.
    let first = batch.data().index_axis(Axis(0), 0);
    let (height, width, channels) = first.dim();

    let raster = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        if channels < 3 {
            let v = to_u8(first[[y, x, 0]]);
            Rgb([v, v, v])
        } else {
            Rgb([
                to_u8(first[[y, x, 0]]),
                to_u8(first[[y, x, 1]]),
                to_u8(first[[y, x, 2]]),
            ])
        }
    });

    let scale = preview_scale(raster.width(), raster.height(), max_dimension);
    if scale >= 1.0 {
        return PreviewImage { raster, scale: 1.0 };
    }

    let (new_width, new_height) = scaled_size(raster.width(), raster.height(), scale, max_dimension);
    log::debug!(
        "Downscaling preview {}x{} -> {}x{} (scale {:.4})",
        raster.width(),
        raster.height(),
        new_width,
        new_height,
        scale
    );
    let raster = image::imageops::resize(&raster, new_width, new_height, FilterType::Triangle);

    PreviewImage { raster, scale }
}
