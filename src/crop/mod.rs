//! Crop computation shared by the FreeDragCrop node.
//!
//! - [`geometry`]: insets, clamped bounds and the [`CropRect`] descriptor
//! - [`aspect`]: aspect-ratio hints used by the UI
//! - [`preview`]: the downscaled preview raster

pub mod aspect;
pub mod geometry;
pub mod preview;

pub use aspect::{AspectRatio, RATIO_PRESETS};
pub use geometry::{CropBounds, CropInsets, CropRect, MAX_INSET};
pub use preview::{render_preview, PreviewImage, DEFAULT_MAX_PREVIEW_DIMENSION};

use crate::core::error::TensorError;
use crate::core::tensor::{ImageBatch, MaskBatch};

/// Everything a crop produces apart from the stored preview.
#[derive(Debug, Clone)]
pub struct CropOutput {
    pub image: ImageBatch,
    pub mask: MaskBatch,
    pub rect: CropRect,
    pub bounds: CropBounds,
}

/// Crops image and mask batches and renders previews.
#[derive(Debug, Clone, Copy)]
pub struct CropExecutor {
    max_preview_dimension: u32,
}

impl Default for CropExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PREVIEW_DIMENSION)
    }
}

impl CropExecutor {
    pub fn new(max_preview_dimension: u32) -> Self {
        Self {
            max_preview_dimension: max_preview_dimension.max(1),
        }
    }

    pub fn max_preview_dimension(&self) -> u32 {
        self.max_preview_dimension
    }

    /// Crop every image of `image` (and `mask`, if given) by `insets`.
    ///
    /// Without a mask the output mask is all ones over the cropped region.
    /// A mask whose `(B, H, W)` differs from the image is rejected.
    pub fn crop(
        &self,
        image: &ImageBatch,
        mask: Option<&MaskBatch>,
        insets: CropInsets,
    ) -> Result<CropOutput, TensorError> {
        if let Some(mask) = mask {
            mask.check_aligned(image)?;
        }

        let (width, height) = (image.width(), image.height());
        let bounds = CropBounds::compute(width, height, insets);
        let rect = bounds.to_rect(width, height);

        let cropped = image.slice_region(bounds.top, bounds.bottom, bounds.left, bounds.right);
        let mask = match mask {
            Some(mask) => mask.slice_region(bounds.top, bounds.bottom, bounds.left, bounds.right),
            None => MaskBatch::ones(image.batch_size(), bounds.height(), bounds.width())?,
        };

        log::debug!(
            "Cropped {}x{} to {}x{} at ({}, {})",
            width,
            height,
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );

        Ok(CropOutput {
            image: cropped,
            mask,
            rect,
            bounds,
        })
    }

    /// Render the un-cropped preview of the first image.
    pub fn preview(&self, image: &ImageBatch) -> PreviewImage {
        render_preview(image, self.max_preview_dimension)
    }
}
