//! FilterNode trait and node metadata.
//!
//! The FilterNode trait is the stable capability every node exposes to the
//! host. It uses a two-phase design: validation (before execution) and
//! execution (processing).

use crate::core::context::{ExecutionContext, ValidationContext};
use crate::core::error::{ExecutionError, ValidationError};
use crate::core::port::{ParameterDefinition, PortDefinition};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Category for organizing nodes in the host's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Image processing (crop, resize, etc.)
    Process,
    /// Mask operations
    Mask,
    /// Utility nodes
    Utility,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Process => "Process",
            Category::Mask => "Mask",
            Category::Utility => "Utility",
        }
    }

    /// Menu path of this category in the host.
    pub fn host_path(&self) -> &'static str {
        match self {
            Category::Process => "image/process",
            Category::Mask => "mask",
            Category::Utility => "utils",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Utility
    }
}

/// Metadata describing a node type.
///
/// This struct contains all information needed to:
/// - Register the node with the host
/// - Validate inputs and parameters
/// - Document the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Unique type identifier (e.g., "FreeDragCrop")
    pub id: String,
    /// Human-readable name (e.g., "Free Drag Crop (Interactive)")
    pub name: String,
    /// Category for menu organization
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Version string
    pub version: String,

    /// Input port definitions
    pub inputs: Vec<PortDefinition>,
    /// Output port definitions
    pub outputs: Vec<PortDefinition>,
    /// Parameter definitions
    pub parameters: Vec<ParameterDefinition>,

    /// Searchable tags
    pub tags: Vec<String>,
    /// Whether this node sends a payload to the host UI
    pub has_ui_output: bool,
}

impl NodeMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> NodeMetadataBuilder {
        NodeMetadataBuilder::new(id, name)
    }

    /// Get all output port names.
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|p| p.name.as_str()).collect()
    }

    /// Find an input port by name.
    pub fn get_input(&self, name: &str) -> Option<&PortDefinition> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Find a parameter by name.
    pub fn get_parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Describe the node's inputs the way the host's registration expects.
    ///
    /// Ports and parameters land under `required` or `optional`; each entry
    /// is `[TYPE]` for ports and `[TYPE, {default, min, max, step}]` for
    /// parameters.
    pub fn input_types(&self) -> serde_json::Value {
        let mut required = serde_json::Map::new();
        let mut optional = serde_json::Map::new();

        for port in &self.inputs {
            let section = if port.optional { &mut optional } else { &mut required };
            section.insert(port.name.clone(), json!([port.port_type.host_name()]));
        }
        for param in &self.parameters {
            let section = if param.optional { &mut optional } else { &mut required };
            section.insert(
                param.name.clone(),
                json!([param.param_type.host_name(), param.host_options()]),
            );
        }

        json!({ "required": required, "optional": optional })
    }

    /// Output type names in declaration order.
    pub fn return_types(&self) -> Vec<&'static str> {
        self.outputs.iter().map(|p| p.port_type.host_name()).collect()
    }
}

/// Builder for NodeMetadata.
pub struct NodeMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    version: String,
    inputs: Vec<PortDefinition>,
    outputs: Vec<PortDefinition>,
    parameters: Vec<ParameterDefinition>,
    tags: Vec<String>,
    has_ui_output: bool,
}

impl NodeMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::default(),
            description: String::new(),
            version: "1.0.0".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            tags: Vec::new(),
            has_ui_output: false,
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add an input port.
    pub fn input(mut self, port: PortDefinition) -> Self {
        self.inputs.push(port);
        self
    }

    /// Add an output port.
    pub fn output(mut self, port: PortDefinition) -> Self {
        self.outputs.push(port);
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add multiple tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// Mark the node as sending a payload to the host UI.
    pub fn ui_output(mut self) -> Self {
        self.has_ui_output = true;
        self
    }

    /// Build the metadata.
    pub fn build(self) -> NodeMetadata {
        NodeMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            version: self.version,
            inputs: self.inputs,
            outputs: self.outputs,
            parameters: self.parameters,
            tags: self.tags,
            has_ui_output: self.has_ui_output,
        }
    }
}

/// The core trait for host nodes.
///
/// # Design
///
/// 1. **Validation Phase** (`validate`): checks inputs and parameters
///    against the node's contract before any pixel is processed.
///
/// 2. **Execution Phase** (`execute`): reads inputs from the context,
///    performs the processing, and sets outputs (and optionally a UI
///    payload) on the context.
///
/// # Thread Safety
///
/// `Send + Sync` bounds let the host invoke nodes from any worker thread.
pub trait FilterNode: Send + Sync {
    /// Get the metadata for this node.
    ///
    /// This is called during registration and should return consistent values.
    fn metadata(&self) -> NodeMetadata;

    /// Validate the node configuration.
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError>;

    /// Execute the node.
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), ExecutionError>;

    /// Clone this node into a boxed trait object.
    fn clone_box(&self) -> Box<dyn FilterNode>;
}

// Allow cloning Box<dyn FilterNode>
impl Clone for Box<dyn FilterNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A passthrough node used to exercise registry and engine plumbing.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct PassthroughNode;

#[cfg(test)]
impl FilterNode for PassthroughNode {
    fn metadata(&self) -> NodeMetadata {
        use crate::core::types::PortType;

        NodeMetadata::builder("Passthrough", "Passthrough")
            .category(Category::Utility)
            .description("Passes the input through unchanged")
            .input(PortDefinition::input("input", PortType::Any))
            .output(PortDefinition::output("output", PortType::Any))
            .build()
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ValidationError> {
        Ok(())
    }

    fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), ExecutionError> {
        let value = ctx.get_input("input")?.clone();
        ctx.set_output("output", value)?;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(self.clone())
    }
}
