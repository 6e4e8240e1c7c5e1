//! Core value types that flow between the host and a node.
//!
//! The type system uses a closed enum: the host exchanges a small, fixed
//! set of data kinds (image batches, masks and scalar widgets), and
//! exhaustive matching catches missing cases at compile time.

use crate::core::tensor::{ImageBatch, MaskBatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values that can be passed to or produced by a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Batch of images, `(B, H, W, C)`
    Image(ImageBatch),
    /// Batch of masks, `(B, H, W)`
    Mask(MaskBatch),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Represents absence of value
    None,
}

/// Port types for checking values against a node's declared interface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind")]
pub enum PortType {
    Image,
    Mask,
    Integer,
    Float,
    String,
    Boolean,
    /// JSON text describing a crop rectangle
    CropJson,
    /// Accepts any type
    Any,
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Get the port type of this value.
    pub fn get_type(&self) -> PortType {
        match self {
            Value::Image(_) => PortType::Image,
            Value::Mask(_) => PortType::Mask,
            Value::Integer(_) => PortType::Integer,
            Value::Float(_) => PortType::Float,
            Value::String(_) => PortType::String,
            Value::Boolean(_) => PortType::Boolean,
            Value::None => PortType::Any,
        }
    }

    /// Try to get this value as an image batch.
    pub fn as_image(&self) -> Option<&ImageBatch> {
        if let Value::Image(img) = self {
            Some(img)
        } else {
            None
        }
    }

    /// Try to get this value as a mask batch.
    pub fn as_mask(&self) -> Option<&MaskBatch> {
        if let Value::Mask(mask) = self {
            Some(mask)
        } else {
            None
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    /// Integers are automatically converted to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Check if this value is None.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Convert a scalar value into its JSON form.
    ///
    /// Tensors have no compact JSON rendering and map to `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::from(s.as_str()),
            Value::Boolean(b) => serde_json::Value::from(*b),
            Value::Image(_) | Value::Mask(_) | Value::None => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Image(img) => {
                let s = img.shape();
                write!(f, "Image[{}x{}x{}x{}]", s.batch, s.height, s.width, s.channels)
            }
            Value::Mask(mask) => {
                let [b, h, w] = mask.dims();
                write!(f, "Mask[{}x{}x{}]", b, h, w)
            }
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:.4}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::None => write!(f, "None"),
        }
    }
}

// ============================================================================
// PortType Implementation
// ============================================================================

impl PortType {
    /// Check if a value matches this port type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (PortType::Any, _) => true,
            (PortType::Image, Value::Image(_)) => true,
            (PortType::Mask, Value::Mask(_)) => true,
            (PortType::Integer, Value::Integer(_)) => true,
            (PortType::Float, Value::Float(_)) => true,
            // Integer can be used where float is expected (implicit conversion)
            (PortType::Float, Value::Integer(_)) => true,
            (PortType::String, Value::String(_)) => true,
            (PortType::CropJson, Value::String(_)) => true,
            (PortType::Boolean, Value::Boolean(_)) => true,
            _ => false,
        }
    }

    /// Get a human-readable name for this type.
    pub fn display_name(&self) -> &'static str {
        match self {
            PortType::Image => "Image",
            PortType::Mask => "Mask",
            PortType::Integer => "Integer",
            PortType::Float => "Float",
            PortType::String => "String",
            PortType::Boolean => "Boolean",
            PortType::CropJson => "Crop JSON",
            PortType::Any => "Any",
        }
    }

    /// Type name used in the host's node schema.
    pub fn host_name(&self) -> &'static str {
        match self {
            PortType::Image => "IMAGE",
            PortType::Mask => "MASK",
            PortType::Integer => "INT",
            PortType::Float => "FLOAT",
            PortType::String => "STRING",
            PortType::Boolean => "BOOLEAN",
            PortType::CropJson => "CROP_JSON",
            PortType::Any => "*",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Host UI side channel
// ============================================================================

/// Where the host keeps a stored preview file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Transient file, cleaned up by the host
    Temp,
}

/// Reference to a stored preview as the host's viewer expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewRef {
    pub filename: String,
    pub subfolder: String,
    #[serde(rename = "type")]
    pub kind: StorageKind,
}

/// Side-channel payload delivered to the interactive UI after execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiPayload {
    pub images: Vec<PreviewRef>,
    pub preview_scale: Vec<f64>,
    pub orig_size: [u32; 2],
}

impl UiPayload {
    /// Payload for a single preview of an image with the given original size.
    pub fn single(preview: PreviewRef, scale: f64, orig_width: u32, orig_height: u32) -> Self {
        Self {
            images: vec![preview],
            preview_scale: vec![scale],
            orig_size: [orig_width, orig_height],
        }
    }
}
