//! Preview persistence.
//!
//! The crop node hands its preview raster to a [`PreviewStore`], which
//! writes it somewhere the host UI can fetch it and answers with a
//! [`PreviewRef`] describing where it went.

mod temp_dir;

pub use temp_dir::TempDirStore;

use crate::core::error::StorageError;
use crate::core::types::PreviewRef;
use image::RgbImage;
use std::fmt::Debug;

/// Destination for preview images.
///
/// Implementations are shared between concurrent node invocations, so
/// every call must produce a distinct reference.
pub trait PreviewStore: Send + Sync + Debug {
    /// Persist `preview` and return a reference the UI can resolve.
    fn save_preview(&self, preview: &RgbImage) -> Result<PreviewRef, StorageError>;
}
