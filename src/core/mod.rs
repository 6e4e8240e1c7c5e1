//! Core types and traits for dragcrop.
//!
//! This module contains the foundational types shared by every node:
//! - Value types and batch tensors (images, masks)
//! - Port and parameter definitions
//! - Node trait and metadata
//! - Error types
//! - Execution and validation contexts

pub mod types;
pub mod tensor;
pub mod port;
pub mod error;
pub mod context;
pub mod node;

// Re-export commonly used types
pub use types::{PortType, PreviewRef, StorageKind, UiPayload, Value};
pub use tensor::{BatchShape, ImageBatch, MaskBatch};
pub use port::{Constraint, ParameterDefinition, PortDefinition, UiHint};
pub use error::{AspectRatioError, DragCropError, ExecutionError, NodeId, StorageError, TensorError, ValidationError};
pub use context::{ExecutionContext, ValidationContext};
pub use node::{Category, FilterNode, NodeMetadata};
