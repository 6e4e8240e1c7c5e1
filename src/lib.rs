//! # dragcrop - Interactive crop node
//!
//! dragcrop implements the FreeDragCrop node for node-based image
//! processing hosts: the user drags a rectangle over a preview, and the
//! node crops a batch of images (and an optional mask) by the four
//! resulting edge insets.
//!
//! ## Features
//!
//! - **Exact clamping**: any inset combination yields a crop of at least
//!   one pixel, never an error
//! - **Mask aware**: masks are cropped alongside, or synthesized as all ones
//! - **Crop descriptor**: a JSON [`CropRect`](crop::CropRect) for downstream nodes
//! - **Preview**: a downscaled preview written to a [`PreviewStore`](storage::PreviewStore)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dragcrop::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = ExecutionEngine::new(Arc::new(FilterRegistry::with_builtins()))
//!     .with_temp_store(&PreviewConfig::default());
//!
//! let config = CropConfig {
//!     crop_left: 100,
//!     crop_bottom: 50,
//!     ..CropConfig::default()
//! };
//! let inputs = NodeInputs::new()
//!     .with_input("image", Value::Image(batch))
//!     .with_parameters(config.to_parameters());
//!
//! let outputs = engine.execute("FreeDragCrop", inputs)?;
//! let rect = CropRect::from_json(outputs.get("crop_json").unwrap().as_string().unwrap())?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: values, tensors, node trait, contexts and errors
//! - [`crop`]: crop geometry, aspect ratios and preview rendering
//! - [`storage`]: preview stores
//! - [`filters`]: node registry and the FreeDragCrop node
//! - [`execution`]: single-invocation engine
//! - [`config`]: typed parameters and preview settings

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod crop;
pub mod execution;
pub mod filters;
pub mod storage;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use dragcrop::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::tensor::{BatchShape, ImageBatch, MaskBatch};
    pub use crate::core::types::{PortType, PreviewRef, StorageKind, UiPayload, Value};

    // Node traits and types
    pub use crate::core::node::{Category, FilterNode, NodeMetadata};
    pub use crate::core::port::{Constraint, ParameterDefinition, PortDefinition, UiHint};
    pub use crate::core::context::{ExecutionContext, ValidationContext};

    // Errors
    pub use crate::core::error::{
        AspectRatioError, DragCropError, DragCropResult, ExecutionError, NodeId, StorageError,
        TensorError, ValidationError,
    };

    // Crop
    pub use crate::crop::{
        AspectRatio, CropBounds, CropExecutor, CropInsets, CropOutput, CropRect, PreviewImage,
    };

    // Storage and configuration
    pub use crate::config::{CropConfig, PreviewConfig};
    pub use crate::storage::{PreviewStore, TempDirStore};

    // Registry and execution
    pub use crate::execution::engine::{ExecutionEngine, ExecutionOptions, NodeInputs, NodeOutputs};
    pub use crate::filters::builtin::FreeDragCrop;
    pub use crate::filters::registry::{FilterFactory, FilterRegistry, RegistryBuilder, RegistryEntry};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "dragcrop");
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = FilterRegistry::with_builtins();
        assert!(registry.contains("FreeDragCrop"));
        assert_eq!(registry.len(), 1);

        let schema = registry.schema_json();
        assert_eq!(schema["FreeDragCrop"]["category"], "image/process");
        assert_eq!(schema["FreeDragCrop"]["output_node"], true);
    }

    #[test]
    fn test_end_to_end_crop() {
        let engine = ExecutionEngine::new(Arc::new(FilterRegistry::with_builtins()));
        let config = CropConfig {
            crop_left: 2,
            crop_right: 1,
            crop_top: 3,
            ..CropConfig::default()
        };
        let inputs = NodeInputs::new()
            .with_input("image", Value::Image(ImageBatch::filled((3, 8, 8, 3), 0.5).unwrap()))
            .with_input("mask", Value::Mask(MaskBatch::ones(3, 8, 8).unwrap()))
            .with_parameters(config.to_parameters());

        let outputs = engine.execute("FreeDragCrop", inputs).unwrap();
        let shape = outputs.get("image").unwrap().as_image().unwrap().shape();
        assert_eq!((shape.batch, shape.height, shape.width, shape.channels), (3, 5, 5, 3));
        assert_eq!(outputs.get("mask").unwrap().as_mask().unwrap().dims(), [3, 5, 5]);

        let rect = CropRect::from_json(outputs.get("crop_json").unwrap().as_string().unwrap()).unwrap();
        assert_eq!(rect.insets(), config.insets());
    }
}
