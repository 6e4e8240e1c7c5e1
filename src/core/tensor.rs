//! Batched image and mask tensors exchanged with the host.
//!
//! Layouts follow the host's conventions: images are `(batch, height, width,
//! channels)` and masks are `(batch, height, width)`, both `f32` with
//! intensities in [0, 1]. Every axis of a constructed batch is non-empty and
//! the spatial axes fit in a `u32`, so raster conversions never overflow.

use crate::core::error::TensorError;
use image::DynamicImage;
use ndarray::{s, Array3, Array4, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Shape of an [`ImageBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchShape {
    pub batch: usize,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl BatchShape {
    /// Shape a mask must have to align with an image of this shape.
    pub fn mask_dims(&self) -> [usize; 3] {
        [self.batch, self.height, self.width]
    }
}

/// An ordered batch of equally sized images, `(B, H, W, C)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Array4<f32>", into = "Array4<f32>")]
pub struct ImageBatch {
    data: Array4<f32>,
}

/// An ordered batch of single-channel masks, `(B, H, W)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Array3<f32>", into = "Array3<f32>")]
pub struct MaskBatch {
    data: Array3<f32>,
}

fn check_axis(axis: &'static str, len: usize) -> Result<(), TensorError> {
    if len == 0 {
        return Err(TensorError::EmptyAxis { axis });
    }
    Ok(())
}

fn check_spatial_axis(axis: &'static str, len: usize) -> Result<(), TensorError> {
    check_axis(axis, len)?;
    if u32::try_from(len).is_err() {
        return Err(TensorError::AxisTooLarge { axis, len });
    }
    Ok(())
}

// ============================================================================
// ImageBatch
// ============================================================================

impl ImageBatch {
    /// Wrap a `(B, H, W, C)` array.
    pub fn new(data: Array4<f32>) -> Result<Self, TensorError> {
        let (batch, height, width, channels) = data.dim();
        check_axis("batch", batch)?;
        check_spatial_axis("height", height)?;
        check_spatial_axis("width", width)?;
        check_axis("channels", channels)?;
        Ok(Self { data })
    }

    /// Build a batch from a flat row-major buffer.
    pub fn from_shape_vec(
        shape: (usize, usize, usize, usize),
        values: Vec<f32>,
    ) -> Result<Self, TensorError> {
        Self::new(Array4::from_shape_vec(shape, values)?)
    }

    /// Build a batch where every element has the same value.
    pub fn filled(shape: (usize, usize, usize, usize), value: f32) -> Result<Self, TensorError> {
        Self::new(Array4::from_elem(shape, value))
    }

    /// Convert decoded images into an RGB batch.
    ///
    /// All images must share the dimensions of the first one.
    pub fn from_images(images: &[DynamicImage]) -> Result<Self, TensorError> {
        let first = images.first().ok_or(TensorError::EmptyAxis { axis: "batch" })?;
        let (width, height) = (first.width() as usize, first.height() as usize);

        let mut data = Array4::<f32>::zeros((images.len(), height, width, 3));
        for (mut item, img) in data.axis_iter_mut(Axis(0)).zip(images) {
            let got = (img.width() as usize, img.height() as usize);
            if got != (width, height) {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![height, width],
                    got: vec![got.1, got.0],
                });
            }
            let rgb = img.to_rgb32f();
            for (x, y, pixel) in rgb.enumerate_pixels() {
                for c in 0..3 {
                    item[[y as usize, x as usize, c]] = pixel[c];
                }
            }
        }

        Self::new(data)
    }

    /// Get the batch shape.
    pub fn shape(&self) -> BatchShape {
        let (batch, height, width, channels) = self.data.dim();
        BatchShape {
            batch,
            height,
            width,
            channels,
        }
    }

    /// Number of images in the batch.
    pub fn batch_size(&self) -> usize {
        self.data.dim().0
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        self.data.dim().3
    }

    /// Borrow the underlying array.
    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// Take ownership of the underlying array.
    pub fn into_inner(self) -> Array4<f32> {
        self.data
    }

    /// View a single image of the batch as `(H, W, C)`.
    pub fn item(&self, index: usize) -> Option<ArrayView3<'_, f32>> {
        (index < self.batch_size()).then(|| self.data.index_axis(Axis(0), index))
    }

    /// Copy rows `[top, bottom)` and columns `[left, right)` of every image.
    ///
    /// Callers pass bounds already clamped to the batch with non-empty spans.
    pub(crate) fn slice_region(&self, top: usize, bottom: usize, left: usize, right: usize) -> Self {
        debug_assert!(top < bottom && bottom <= self.height());
        debug_assert!(left < right && right <= self.width());
        Self {
            data: self.data.slice(s![.., top..bottom, left..right, ..]).to_owned(),
        }
    }
}

impl TryFrom<Array4<f32>> for ImageBatch {
    type Error = TensorError;

    fn try_from(data: Array4<f32>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<ImageBatch> for Array4<f32> {
    fn from(batch: ImageBatch) -> Self {
        batch.data
    }
}

// ============================================================================
// MaskBatch
// ============================================================================

impl MaskBatch {
    /// Wrap a `(B, H, W)` array.
    pub fn new(data: Array3<f32>) -> Result<Self, TensorError> {
        let (batch, height, width) = data.dim();
        check_axis("batch", batch)?;
        check_spatial_axis("height", height)?;
        check_spatial_axis("width", width)?;
        Ok(Self { data })
    }

    /// Build a mask batch from a flat row-major buffer.
    pub fn from_shape_vec(shape: (usize, usize, usize), values: Vec<f32>) -> Result<Self, TensorError> {
        Self::new(Array3::from_shape_vec(shape, values)?)
    }

    /// A fully opaque mask batch.
    pub fn ones(batch: usize, height: usize, width: usize) -> Result<Self, TensorError> {
        Self::new(Array3::ones((batch, height, width)))
    }

    /// Get the `[B, H, W]` dimensions.
    pub fn dims(&self) -> [usize; 3] {
        let (batch, height, width) = self.data.dim();
        [batch, height, width]
    }

    /// Borrow the underlying array.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Take ownership of the underlying array.
    pub fn into_inner(self) -> Array3<f32> {
        self.data
    }

    /// Ensure this mask is batch- and pixel-aligned with `image`.
    pub fn check_aligned(&self, image: &ImageBatch) -> Result<(), TensorError> {
        let expected = image.shape().mask_dims();
        let got = self.dims();
        if expected != got {
            return Err(TensorError::ShapeMismatch {
                expected: expected.to_vec(),
                got: got.to_vec(),
            });
        }
        Ok(())
    }

    pub(crate) fn slice_region(&self, top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            data: self.data.slice(s![.., top..bottom, left..right]).to_owned(),
        }
    }
}

impl TryFrom<Array3<f32>> for MaskBatch {
    type Error = TensorError;

    fn try_from(data: Array3<f32>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<MaskBatch> for Array3<f32> {
    fn from(batch: MaskBatch) -> Self {
        batch.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_rejects_empty_axes() {
        assert!(matches!(
            ImageBatch::filled((0, 4, 4, 3), 0.0),
            Err(TensorError::EmptyAxis { axis: "batch" })
        ));
        assert!(matches!(
            ImageBatch::filled((1, 4, 0, 3), 0.0),
            Err(TensorError::EmptyAxis { axis: "width" })
        ));
        assert!(matches!(
            MaskBatch::ones(1, 0, 4),
            Err(TensorError::EmptyAxis { axis: "height" })
        ));
    }

    #[test]
    fn test_from_shape_vec_checks_length() {
        assert!(matches!(
            ImageBatch::from_shape_vec((1, 2, 2, 3), vec![0.0; 5]),
            Err(TensorError::Shape(_))
        ));
    }

    #[test]
    fn test_shape_accessors() {
        let batch = ImageBatch::filled((2, 3, 5, 4), 0.5).unwrap();
        let shape = batch.shape();
        assert_eq!(shape.batch, 2);
        assert_eq!(shape.height, 3);
        assert_eq!(shape.width, 5);
        assert_eq!(shape.channels, 4);
        assert_eq!(shape.mask_dims(), [2, 3, 5]);
        assert!(batch.item(1).is_some());
        assert!(batch.item(2).is_none());
    }

    #[test]
    fn test_from_images() {
        let mut rgb = RgbImage::new(3, 2);
        rgb.put_pixel(2, 1, Rgb([255, 0, 51]));
        let batch = ImageBatch::from_images(&[DynamicImage::ImageRgb8(rgb)]).unwrap();

        assert_eq!(batch.shape().mask_dims(), [1, 2, 3]);
        assert_eq!(batch.channels(), 3);
        assert_eq!(batch.data()[[0, 1, 2, 0]], 1.0);
        assert_eq!(batch.data()[[0, 1, 2, 1]], 0.0);
        assert!((batch.data()[[0, 1, 2, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_from_images_rejects_mixed_sizes() {
        let images = [
            DynamicImage::ImageRgb8(RgbImage::new(3, 2)),
            DynamicImage::ImageRgb8(RgbImage::new(2, 3)),
        ];
        assert!(matches!(
            ImageBatch::from_images(&images),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert!(ImageBatch::from_images(&[]).is_err());
    }

    #[test]
    fn test_mask_alignment() {
        let image = ImageBatch::filled((2, 4, 6, 3), 0.0).unwrap();
        assert!(MaskBatch::ones(2, 4, 6).unwrap().check_aligned(&image).is_ok());
        assert!(MaskBatch::ones(1, 4, 6).unwrap().check_aligned(&image).is_err());
        assert!(MaskBatch::ones(2, 6, 4).unwrap().check_aligned(&image).is_err());
    }

    #[test]
    fn test_slice_region_keeps_channels() {
        let values: Vec<f32> = (0..32).map(|v| v as f32).collect();
        let batch = ImageBatch::from_shape_vec((1, 4, 4, 2), values).unwrap();
        let sliced = batch.slice_region(1, 3, 2, 4);

        assert_eq!(sliced.shape().mask_dims(), [1, 2, 2]);
        assert_eq!(sliced.channels(), 2);
        // Element (row 1, col 2, channel 1) of the original.
        assert_eq!(sliced.data()[[0, 0, 0, 1]], ((4 + 2) * 2 + 1) as f32);
    }

    #[test]
    fn test_serde_rejects_empty_tensor() {
        let batch = ImageBatch::filled((1, 2, 2, 1), 0.25).unwrap();
        let json = serde_json::to_string(&batch).unwrap();
        let back: ImageBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, batch);

        let empty = serde_json::to_string(&Array4::<f32>::zeros((0, 2, 2, 1))).unwrap();
        assert!(serde_json::from_str::<ImageBatch>(&empty).is_err());
    }
}
