use crate::config::PreviewConfig;
use crate::core::error::StorageError;
use crate::core::types::{PreviewRef, StorageKind};
use crate::storage::PreviewStore;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const SUFFIX_LEN: usize = 5;

/// Writes previews as PNG files into a transient directory.
///
/// Files are named `{prefix}_temp_{suffix}_{counter:05}_.png`. The suffix
/// is random per call and the counter increases per store, so concurrent
/// saves never collide.
#[derive(Debug)]
pub struct TempDirStore {
    root: PathBuf,
    subfolder: String,
    prefix: String,
    counter: AtomicU64,
}

impl TempDirStore {
    /// Create a store that writes directly into `root`.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            subfolder: String::new(),
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Create a store from preview settings.
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(config.temp_dir.clone(), config.filename_prefix.clone())
    }

    /// Write into `subfolder` below the root.
    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = subfolder.into();
        self
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path a reference produced by this store points at.
    pub fn path_of(&self, preview: &PreviewRef) -> PathBuf {
        self.directory().join(&preview.filename)
    }

    fn directory(&self) -> PathBuf {
        if self.subfolder.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.subfolder)
        }
    }

    fn next_filename(&self) -> String {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}_temp_{}_{:05}_.png", self.prefix, random_suffix(), counter)
    }
}

fn random_suffix() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(SUFFIX_LEN)
        .map(|b| char::from(b'a' + b % 26))
        .collect()
}

impl PreviewStore for TempDirStore {
    fn save_preview(&self, preview: &RgbImage) -> Result<PreviewRef, StorageError> {
        let directory = self.directory();
        std::fs::create_dir_all(&directory)?;

        let filename = self.next_filename();
        let path = directory.join(&filename);
        preview.save_with_format(&path, image::ImageFormat::Png)?;

        log::debug!(
            "Saved {}x{} preview to {}",
            preview.width(),
            preview.height(),
            path.display()
        );

        Ok(PreviewRef {
            filename,
            subfolder: self.subfolder.clone(),
            kind: StorageKind::Temp,
        })
    }
}
