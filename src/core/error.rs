//! Error types for dragcrop.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Be reportable through the host's own error surface
//! - Include actionable information (which node, which port, what shape)
//! - Support error chaining for context

use crate::core::types::PortType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a node invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a node ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for dragcrop.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum DragCropError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from the validation phase.
///
/// Validation runs before any pixel is touched, so contract violations
/// (wrong port types, misaligned masks) surface before the crop runs.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: PortType, got: PortType },

    #[error("Missing required input '{port}' on node {node_id}")]
    MissingRequiredInput { node_id: NodeId, port: String },

    #[error("Constraint violation on node {node_id}, parameter '{parameter}': {error}")]
    ConstraintViolation {
        node_id: NodeId,
        parameter: String,
        error: String,
    },

    #[error("Shape mismatch on node {node_id}, port '{port}': expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        node_id: NodeId,
        port: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Custom validation failed on node {node_id}: {error}")]
    CustomValidation { node_id: NodeId, error: String },
}

/// Errors during node execution.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Node {node_id} execution failed: {error}")]
    NodeExecution { node_id: NodeId, error: String },

    #[error("Missing input '{port}' for node {node_id}")]
    MissingInput { node_id: NodeId, port: String },

    #[error("Missing parameter '{parameter}' for node {node_id}")]
    MissingParameter { node_id: NodeId, parameter: String },

    #[error("Output '{port}' was not set by node {node_id}")]
    OutputNotSet { node_id: NodeId, port: String },

    #[error("Invalid tensor on node {node_id}: {source}")]
    InvalidTensor {
        node_id: NodeId,
        #[source]
        source: TensorError,
    },

    #[error("Preview for node {node_id} could not be stored: {source}")]
    Preview {
        node_id: NodeId,
        #[source]
        source: StorageError,
    },

    #[error("Unknown node type '{node_type}'")]
    UnknownNode { node_type: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while building or slicing batch tensors.
#[derive(Error, Debug)]
pub enum TensorError {
    #[error("Tensor axis '{axis}' is empty")]
    EmptyAxis { axis: &'static str },

    #[error("Tensor axis '{axis}' has length {len}, which exceeds the raster limit")]
    AxisTooLarge { axis: &'static str, len: usize },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// Errors from the preview store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode preview: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors from parsing an aspect-ratio string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AspectRatioError {
    #[error("Aspect ratio '{0}' is not a number or a W:H pair")]
    Malformed(String),

    #[error("Aspect ratio '{0}' must be positive and finite")]
    OutOfRange(String),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ValidationError {
    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ValidationError::TypeMismatch { expected, got } => Some(format!(
                "Connect a {} output instead of {}",
                expected, got
            )),
            ValidationError::MissingRequiredInput { port, .. } => {
                Some(format!("Connect an output to the '{}' input", port))
            }
            ValidationError::ConstraintViolation { parameter, error, .. } => {
                Some(format!("Adjust '{}': {}", parameter, error))
            }
            ValidationError::ShapeMismatch { port, .. } => Some(format!(
                "Make sure the '{}' input has the same batch size and dimensions as the image",
                port
            )),
            ValidationError::CustomValidation { .. } => None,
        }
    }

    /// Get the node ID that triggered this error, if applicable.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            ValidationError::MissingRequiredInput { node_id, .. }
            | ValidationError::ConstraintViolation { node_id, .. }
            | ValidationError::ShapeMismatch { node_id, .. }
            | ValidationError::CustomValidation { node_id, .. } => Some(*node_id),
            ValidationError::TypeMismatch { .. } => None,
        }
    }
}

impl ExecutionError {
    /// Get the node ID that caused this error, if applicable.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            ExecutionError::NodeExecution { node_id, .. }
            | ExecutionError::MissingInput { node_id, .. }
            | ExecutionError::MissingParameter { node_id, .. }
            | ExecutionError::OutputNotSet { node_id, .. }
            | ExecutionError::InvalidTensor { node_id, .. }
            | ExecutionError::Preview { node_id, .. } => Some(*node_id),
            ExecutionError::Validation(error) => error.node_id(),
            ExecutionError::UnknownNode { .. } | ExecutionError::Serialization(_) => None,
        }
    }
}

/// Result type alias for dragcrop operations.
pub type DragCropResult<T> = Result<T, DragCropError>;
