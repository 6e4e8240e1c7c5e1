//! Execution and validation contexts.
//!
//! Contexts provide access to inputs, parameters, and outputs during
//! node validation and execution. They encapsulate the data flow between
//! the host and a node.

use crate::core::error::{ExecutionError, NodeId, ValidationError};
use crate::core::tensor::{ImageBatch, MaskBatch};
use crate::core::types::{PortType, UiPayload, Value};
use crate::crop::preview::DEFAULT_MAX_PREVIEW_DIMENSION;
use crate::storage::PreviewStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Context provided during node validation.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// ID of the node being validated.
    pub node_id: NodeId,
    /// Input values.
    inputs: HashMap<String, Value>,
    /// Parameter values.
    parameters: HashMap<String, Value>,
}

impl ValidationContext {
    /// Create a new validation context.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            inputs: HashMap::new(),
            parameters: HashMap::new(),
        }
    }

    /// Add an input value to the context.
    pub fn add_input(&mut self, name: impl Into<String>, value: Value) {
        self.inputs.insert(name.into(), value);
    }

    /// Add a parameter value to the context.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.insert(name.into(), value);
    }

    /// Get all inputs.
    pub fn inputs(&self) -> &HashMap<String, Value> {
        &self.inputs
    }

    /// Get all parameters.
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    // ========================================================================
    // Input Getters
    // ========================================================================

    /// Get an input value by name.
    pub fn get_input(&self, name: &str) -> Result<&Value, ValidationError> {
        self.inputs.get(name).ok_or_else(|| ValidationError::MissingRequiredInput {
            node_id: self.node_id,
            port: name.to_string(),
        })
    }

    /// Get an input as an image batch.
    pub fn get_input_image(&self, name: &str) -> Result<&ImageBatch, ValidationError> {
        let value = self.get_input(name)?;
        value.as_image().ok_or_else(|| ValidationError::TypeMismatch {
            expected: PortType::Image,
            got: value.get_type(),
        })
    }

    /// Get an optional mask input.
    ///
    /// A missing or `None` input yields `Ok(None)`; any other non-mask value
    /// is a type mismatch.
    pub fn get_input_mask_optional(&self, name: &str) -> Result<Option<&MaskBatch>, ValidationError> {
        match self.inputs.get(name) {
            None | Some(Value::None) => Ok(None),
            Some(Value::Mask(mask)) => Ok(Some(mask)),
            Some(other) => Err(ValidationError::TypeMismatch {
                expected: PortType::Mask,
                got: other.get_type(),
            }),
        }
    }

    /// Check if an input exists.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    // ========================================================================
    // Parameter Getters
    // ========================================================================

    /// Get a parameter value by name.
    pub fn get_parameter(&self, name: &str) -> Result<&Value, ValidationError> {
        self.parameters.get(name).ok_or_else(|| ValidationError::ConstraintViolation {
            node_id: self.node_id,
            parameter: name.to_string(),
            error: "Parameter not set".to_string(),
        })
    }

    /// Get a parameter as a string.
    pub fn get_string(&self, name: &str) -> Result<&str, ValidationError> {
        let value = self.get_parameter(name)?;
        value.as_string().ok_or_else(|| ValidationError::TypeMismatch {
            expected: PortType::String,
            got: value.get_type(),
        })
    }

    /// Check if a parameter exists.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
}

/// Context provided during node execution.
///
/// ExecutionContext contains the actual data values, the host collaborators
/// a node may call (the preview store), and collects the node's outputs.
#[derive(Debug)]
pub struct ExecutionContext {
    /// ID of the node being executed.
    pub node_id: NodeId,
    /// Input values.
    inputs: HashMap<String, Value>,
    /// Parameter values.
    parameters: HashMap<String, Value>,
    /// Output values set by the node.
    outputs: HashMap<String, Value>,
    /// Payload for the host's interactive UI.
    ui: Option<UiPayload>,
    /// Where previews are written; previews are skipped when absent.
    preview_store: Option<Arc<dyn PreviewStore>>,
    /// Largest preview edge in pixels.
    max_preview_dimension: u32,
}

impl ExecutionContext {
    /// Create a new execution context without a preview store.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            inputs: HashMap::new(),
            parameters: HashMap::new(),
            outputs: HashMap::new(),
            ui: None,
            preview_store: None,
            max_preview_dimension: DEFAULT_MAX_PREVIEW_DIMENSION,
        }
    }

    /// Create a new execution context that writes previews to `store`.
    pub fn with_preview(node_id: NodeId, store: Arc<dyn PreviewStore>, max_dimension: u32) -> Self {
        Self {
            preview_store: Some(store),
            max_preview_dimension: max_dimension,
            ..Self::new(node_id)
        }
    }

    /// Add an input value to the context.
    pub fn add_input(&mut self, name: impl Into<String>, value: Value) {
        self.inputs.insert(name.into(), value);
    }

    /// Add a parameter value to the context.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.insert(name.into(), value);
    }

    /// Get all inputs.
    pub fn inputs(&self) -> &HashMap<String, Value> {
        &self.inputs
    }

    /// Get all parameters.
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    /// Get all outputs.
    pub fn outputs(&self) -> &HashMap<String, Value> {
        &self.outputs
    }

    /// Take ownership of the outputs and UI payload.
    pub fn take_outputs(self) -> (HashMap<String, Value>, Option<UiPayload>) {
        (self.outputs, self.ui)
    }

    // ========================================================================
    // Input Getters
    // ========================================================================

    /// Get an input value by name.
    pub fn get_input(&self, name: &str) -> Result<&Value, ExecutionError> {
        self.inputs.get(name).ok_or_else(|| ExecutionError::MissingInput {
            node_id: self.node_id,
            port: name.to_string(),
        })
    }

    /// Get an input as an image batch.
    pub fn get_input_image(&self, name: &str) -> Result<&ImageBatch, ExecutionError> {
        self.get_input(name)?
            .as_image()
            .ok_or_else(|| ExecutionError::NodeExecution {
                node_id: self.node_id,
                error: format!("Input '{}' is not an image", name),
            })
    }

    /// Get an optional input as a mask batch.
    ///
    /// A missing or `None` input yields `Ok(None)`; any other non-mask value
    /// is a type mismatch.
    pub fn get_input_mask_optional(&self, name: &str) -> Result<Option<&MaskBatch>, ExecutionError> {
        match self.inputs.get(name) {
            None | Some(Value::None) => Ok(None),
            Some(Value::Mask(mask)) => Ok(Some(mask)),
            Some(other) => Err(ValidationError::TypeMismatch {
                expected: PortType::Mask,
                got: other.get_type(),
            }
            .into()),
        }
    }

    /// Check if an input exists.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    // ========================================================================
    // Parameter Getters
    // ========================================================================

    /// Get a parameter value by name.
    pub fn get_parameter(&self, name: &str) -> Result<&Value, ExecutionError> {
        self.parameters.get(name).ok_or_else(|| ExecutionError::MissingParameter {
            node_id: self.node_id,
            parameter: name.to_string(),
        })
    }

    /// Check if a parameter exists.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    // ========================================================================
    // Output Setters
    // ========================================================================

    /// Set an output value.
    pub fn set_output(&mut self, name: impl Into<String>, value: Value) -> Result<(), ExecutionError> {
        self.outputs.insert(name.into(), value);
        Ok(())
    }

    /// Check if an output has been set.
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    /// Attach the payload for the host's interactive UI.
    pub fn set_ui(&mut self, payload: UiPayload) {
        self.ui = Some(payload);
    }

    /// Get the UI payload, if the node produced one.
    pub fn ui(&self) -> Option<&UiPayload> {
        self.ui.as_ref()
    }

    // ========================================================================
    // Preview Settings
    // ========================================================================

    /// Attach a preview store to an existing context.
    pub fn set_preview_store(&mut self, store: Arc<dyn PreviewStore>, max_dimension: u32) {
        self.preview_store = Some(store);
        self.max_preview_dimension = max_dimension;
    }

    /// Get the preview store, if the host attached one.
    pub fn preview_store(&self) -> Option<Arc<dyn PreviewStore>> {
        self.preview_store.clone()
    }

    /// Largest preview edge in pixels.
    pub fn max_preview_dimension(&self) -> u32 {
        self.max_preview_dimension
    }
}

/// Convert ValidationContext to ExecutionContext.
impl From<ValidationContext> for ExecutionContext {
    fn from(val_ctx: ValidationContext) -> Self {
        let mut exec_ctx = ExecutionContext::new(val_ctx.node_id);
        exec_ctx.inputs = val_ctx.inputs;
        exec_ctx.parameters = val_ctx.parameters;
        exec_ctx
    }
}
