//! Typed configuration for the crop node and its preview output.

use crate::core::error::{DragCropError, DragCropResult};
use crate::core::types::Value;
use crate::crop::{AspectRatio, CropInsets, DEFAULT_MAX_PREVIEW_DIMENSION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parameters of one FreeDragCrop invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub crop_left: u32,
    pub crop_right: u32,
    pub crop_top: u32,
    pub crop_bottom: u32,
    /// UI hint only; never applied to the crop.
    pub aspect_ratio: String,
    /// UI hint only; never applied to the crop.
    pub ratio_lock: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            crop_left: 0,
            crop_right: 0,
            crop_top: 0,
            crop_bottom: 0,
            aspect_ratio: "1:1".to_string(),
            ratio_lock: false,
        }
    }
}

impl CropConfig {
    /// The configured edge insets.
    pub fn insets(&self) -> CropInsets {
        CropInsets::new(self.crop_left, self.crop_right, self.crop_top, self.crop_bottom)
    }

    /// The aspect-ratio hint, falling back to 1:1 when unparsable.
    pub fn ratio(&self) -> AspectRatio {
        AspectRatio::parse(&self.aspect_ratio)
    }

    /// Read from a node parameter map.
    ///
    /// Missing entries keep their defaults, negative insets count as zero
    /// and insets beyond `u32::MAX` saturate.
    pub fn from_parameters(params: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let inset = |name: &str, default: u32| {
            params
                .get(name)
                .and_then(Value::as_integer)
                .map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
                .unwrap_or(default)
        };

        Self {
            crop_left: inset("crop_left", defaults.crop_left),
            crop_right: inset("crop_right", defaults.crop_right),
            crop_top: inset("crop_top", defaults.crop_top),
            crop_bottom: inset("crop_bottom", defaults.crop_bottom),
            aspect_ratio: params
                .get("aspect_ratio")
                .and_then(Value::as_string)
                .map(str::to_string)
                .unwrap_or(defaults.aspect_ratio),
            ratio_lock: params
                .get("ratio_lock")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.ratio_lock),
        }
    }

    /// Convert into a node parameter map.
    pub fn to_parameters(&self) -> HashMap<String, Value> {
        let mut params = HashMap::new();
        params.insert("crop_left".to_string(), Value::Integer(i64::from(self.crop_left)));
        params.insert("crop_right".to_string(), Value::Integer(i64::from(self.crop_right)));
        params.insert("crop_top".to_string(), Value::Integer(i64::from(self.crop_top)));
        params.insert("crop_bottom".to_string(), Value::Integer(i64::from(self.crop_bottom)));
        params.insert("aspect_ratio".to_string(), Value::String(self.aspect_ratio.clone()));
        params.insert("ratio_lock".to_string(), Value::Boolean(self.ratio_lock));
        params
    }
}

/// Where and how previews are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Longest preview edge in pixels.
    pub max_dimension: u32,
    pub filename_prefix: String,
    pub temp_dir: PathBuf,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_PREVIEW_DIMENSION,
            filename_prefix: "dragcrop".to_string(),
            temp_dir: std::env::temp_dir().join("dragcrop"),
        }
    }
}

impl PreviewConfig {
    /// Parse from TOML; omitted keys keep their defaults.
    pub fn from_toml_str(text: &str) -> DragCropResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> DragCropResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> DragCropResult<()> {
        if self.max_dimension == 0 {
            return Err(DragCropError::InvalidConfig(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        if self.filename_prefix.is_empty() || self.filename_prefix.contains(|c: char| c == '/' || c == '\\') {
            return Err(DragCropError::InvalidConfig(format!(
                "filename_prefix '{}' must be a non-empty file name",
                self.filename_prefix
            )));
        }
        Ok(())
    }
}
