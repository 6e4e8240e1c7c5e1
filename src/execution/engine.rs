//! Execution engine implementation.
//!
//! The engine runs a single node invocation the way the host does: resolve
//! the node type, complete and check its parameters, validate, execute and
//! collect the outputs.

use crate::config::PreviewConfig;
use crate::core::context::{ExecutionContext, ValidationContext};
use crate::core::error::{ExecutionError, NodeId, ValidationError};
use crate::core::node::NodeMetadata;
use crate::core::types::{UiPayload, Value};
use crate::crop::DEFAULT_MAX_PREVIEW_DIMENSION;
use crate::filters::registry::FilterRegistry;
use crate::storage::{PreviewStore, TempDirStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Execution options.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Whether to check parameters and run node validation first.
    pub validate: bool,
    /// Whether to write previews when a store is configured.
    pub write_preview: bool,
    /// Largest preview edge in pixels.
    pub max_preview_dimension: u32,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            validate: true,
            write_preview: true,
            max_preview_dimension: DEFAULT_MAX_PREVIEW_DIMENSION,
        }
    }
}

impl ExecutionOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Enable/disable preview output.
    pub fn with_preview(mut self, write_preview: bool) -> Self {
        self.write_preview = write_preview;
        self
    }

    /// Set the largest preview edge.
    pub fn with_max_preview_dimension(mut self, max: u32) -> Self {
        self.max_preview_dimension = max.max(1);
        self
    }
}

/// Inputs and parameter values for one invocation.
#[derive(Debug, Clone, Default)]
pub struct NodeInputs {
    pub inputs: HashMap<String, Value>,
    pub parameters: HashMap<String, Value>,
}

impl NodeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a value to an input port.
    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Set a parameter (widget) value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set several parameters at once, e.g. from `CropConfig::to_parameters`.
    pub fn with_parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters.extend(parameters);
        self
    }
}

/// Result of one invocation.
#[derive(Debug)]
pub struct NodeOutputs {
    /// Output values keyed by port name.
    pub outputs: HashMap<String, Value>,
    /// Output port names in declaration order.
    pub output_order: Vec<String>,
    /// Payload for the host's interactive UI, if any.
    pub ui: Option<UiPayload>,
    pub duration: Duration,
}

impl NodeOutputs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Outputs as the host's return tuple.
    pub fn values_in_order(&self) -> Vec<&Value> {
        self.output_order
            .iter()
            .filter_map(|name| self.outputs.get(name))
            .collect()
    }
}

/// The execution engine.
pub struct ExecutionEngine {
    registry: Arc<FilterRegistry>,
    preview_store: Option<Arc<dyn PreviewStore>>,
    default_options: ExecutionOptions,
}

impl ExecutionEngine {
    /// Create an engine over `registry` without a preview store.
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self {
            registry,
            preview_store: None,
            default_options: ExecutionOptions::default(),
        }
    }

    /// Write previews to `store`.
    pub fn with_preview_store(mut self, store: Arc<dyn PreviewStore>) -> Self {
        self.preview_store = Some(store);
        self
    }

    /// Write previews to a temp directory configured by `config`.
    pub fn with_temp_store(mut self, config: &PreviewConfig) -> Self {
        self.preview_store = Some(Arc::new(TempDirStore::from_config(config)));
        self.default_options.max_preview_dimension = config.max_dimension.max(1);
        self
    }

    /// Set default options.
    pub fn with_default_options(mut self, options: ExecutionOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Execute `node_type` with the default options.
    pub fn execute(&self, node_type: &str, inputs: NodeInputs) -> Result<NodeOutputs, ExecutionError> {
        self.execute_with(node_type, inputs, &self.default_options)
    }

    /// Execute `node_type` with explicit options.
    pub fn execute_with(
        &self,
        node_type: &str,
        inputs: NodeInputs,
        options: &ExecutionOptions,
    ) -> Result<NodeOutputs, ExecutionError> {
        let node = self
            .registry
            .create(node_type)
            .ok_or_else(|| ExecutionError::UnknownNode {
                node_type: node_type.to_string(),
            })?;
        let metadata = node.metadata();
        let node_id = NodeId::new();
        log::debug!("Executing {} as node {}", node_type, node_id);

        let parameters = resolve_parameters(&metadata, node_id, inputs.parameters, options.validate)?;
        let mut val_ctx = ValidationContext::new(node_id);
        for (name, value) in inputs.inputs {
            val_ctx.add_input(name, value);
        }
        for (name, value) in parameters {
            val_ctx.add_parameter(name, value);
        }

        if options.validate {
            check_inputs(&metadata, &val_ctx)?;
            node.validate(&val_ctx)?;
        }

        let mut ctx = ExecutionContext::from(val_ctx);
        if options.write_preview {
            if let Some(store) = &self.preview_store {
                ctx.set_preview_store(Arc::clone(store), options.max_preview_dimension);
            }
        }

        let start = Instant::now();
        node.execute(&mut ctx).map_err(|error| {
            log::error!("Node {} ({}) failed: {}", node_id, node_type, error);
            error
        })?;
        let duration = start.elapsed();

        for port in &metadata.outputs {
            if !ctx.has_output(&port.name) {
                return Err(ExecutionError::OutputNotSet {
                    node_id,
                    port: port.name.clone(),
                });
            }
        }

        log::info!("Node {} ({}) finished in {:?}", node_id, node_type, duration);
        let (outputs, ui) = ctx.take_outputs();
        Ok(NodeOutputs {
            outputs,
            output_order: metadata.outputs.iter().map(|p| p.name.clone()).collect(),
            ui,
            duration,
        })
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(Arc::new(FilterRegistry::with_builtins()))
    }
}

/// Fill defaults for missing parameters and check the supplied ones.
fn resolve_parameters(
    metadata: &NodeMetadata,
    node_id: NodeId,
    mut supplied: HashMap<String, Value>,
    validate: bool,
) -> Result<HashMap<String, Value>, ValidationError> {
    let mut resolved = HashMap::with_capacity(metadata.parameters.len());

    for param in &metadata.parameters {
        let value = match supplied.remove(&param.name) {
            Some(value) => value,
            None => {
                log::trace!("Parameter '{}' defaults to {}", param.name, param.default_value);
                param.default_value.clone()
            }
        };

        if validate {
            param
                .validate(&value)
                .map_err(|error| ValidationError::ConstraintViolation {
                    node_id,
                    parameter: param.name.clone(),
                    error,
                })?;
        }
        resolved.insert(param.name.clone(), value);
    }

    for name in supplied.keys() {
        log::warn!("Ignoring unknown parameter '{}' for {}", name, metadata.id);
    }

    Ok(resolved)
}

/// Check required inputs are connected and every input has the port's type.
fn check_inputs(metadata: &NodeMetadata, ctx: &ValidationContext) -> Result<(), ValidationError> {
    for port in &metadata.inputs {
        match ctx.inputs().get(&port.name) {
            None | Some(Value::None) if !port.optional => {
                return Err(ValidationError::MissingRequiredInput {
                    node_id: ctx.node_id,
                    port: port.name.clone(),
                });
            }
            None | Some(Value::None) => {}
            Some(value) if !port.port_type.matches(value) => {
                return Err(ValidationError::TypeMismatch {
                    expected: port.port_type,
                    got: value.get_type(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CropConfig;
    use crate::core::node::PassthroughNode;
    use crate::core::tensor::{ImageBatch, MaskBatch};
    use crate::core::types::PortType;
    use crate::crop::CropRect;
    use crate::filters::registry::RegistryBuilder;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn crop_inputs(image: ImageBatch) -> NodeInputs {
        NodeInputs::new().with_input("image", Value::Image(image))
    }

    #[test]
    fn test_engine_creation() {
        let engine = ExecutionEngine::default();
        assert!(engine.registry().contains("FreeDragCrop"));
    }

    #[test]
    fn test_unknown_node_type() {
        let engine = ExecutionEngine::default();
        let result = engine.execute("Nope", NodeInputs::new());
        assert!(matches!(result, Err(ExecutionError::UnknownNode { .. })));
    }

    #[test]
    fn test_defaults_are_filled() {
        init_logging();
        let engine = ExecutionEngine::default();
        let image = ImageBatch::filled((1, 6, 9, 3), 0.1).unwrap();

        let outputs = engine.execute("FreeDragCrop", crop_inputs(image.clone())).unwrap();
        assert_eq!(outputs.get("image").unwrap().as_image().unwrap(), &image);
        assert!(outputs.ui.is_none());

        let rect = CropRect::from_json(outputs.get("crop_json").unwrap().as_string().unwrap()).unwrap();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 9, 6));
        assert_eq!((rect.orig_width, rect.orig_height), (9, 6));
    }

    #[test]
    fn test_outputs_in_declaration_order() {
        let engine = ExecutionEngine::default();
        let outputs = engine
            .execute(
                "FreeDragCrop",
                crop_inputs(ImageBatch::filled((1, 2, 2, 3), 0.0).unwrap()),
            )
            .unwrap();
        let types: Vec<PortType> = outputs.values_in_order().iter().map(|v| v.get_type()).collect();
        assert_eq!(types, vec![PortType::Image, PortType::Mask, PortType::String]);
    }

    #[test]
    fn test_parameter_range_is_checked() {
        let engine = ExecutionEngine::default();
        let inputs = crop_inputs(ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap())
            .with_parameter("crop_left", Value::Integer(9000));

        let err = engine.execute("FreeDragCrop", inputs).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Validation(ValidationError::ConstraintViolation { ref parameter, .. })
                if parameter == "crop_left"
        ));

        // Without validation the geometry clamps instead.
        let inputs = crop_inputs(ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap())
            .with_parameter("crop_left", Value::Integer(9000));
        let outputs = engine
            .execute_with("FreeDragCrop", inputs, &ExecutionOptions::new().with_validation(false))
            .unwrap();
        assert_eq!(outputs.get("image").unwrap().as_image().unwrap().shape().width, 1);
    }

    #[test]
    fn test_missing_and_mistyped_inputs() {
        let engine = ExecutionEngine::default();

        let err = engine.execute("FreeDragCrop", NodeInputs::new()).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Validation(ValidationError::MissingRequiredInput { .. })
        ));

        let inputs = NodeInputs::new().with_input("image", Value::Integer(3));
        let err = engine.execute("FreeDragCrop", inputs).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Validation(ValidationError::TypeMismatch { .. })
        ));

        // An explicit None on the optional mask means "not connected".
        let inputs = crop_inputs(ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap())
            .with_input("mask", Value::None);
        assert!(engine.execute("FreeDragCrop", inputs).is_ok());
    }

    #[test]
    fn test_mask_shape_is_validated() {
        let engine = ExecutionEngine::default();
        let inputs = crop_inputs(ImageBatch::filled((2, 4, 4, 3), 0.0).unwrap())
            .with_input("mask", Value::Mask(MaskBatch::ones(2, 4, 5).unwrap()));
        let err = engine.execute("FreeDragCrop", inputs).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Validation(ValidationError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_preview_through_temp_store() {
        init_logging();
        let dir = TempDir::new().unwrap();
        let config = PreviewConfig {
            max_dimension: 64,
            filename_prefix: "test".to_string(),
            temp_dir: dir.path().to_path_buf(),
        };
        let engine = ExecutionEngine::default().with_temp_store(&config);

        let crop = CropConfig {
            crop_left: 10,
            crop_top: 5,
            ..CropConfig::default()
        };
        let inputs = crop_inputs(ImageBatch::filled((1, 100, 200, 3), 0.5).unwrap())
            .with_parameters(crop.to_parameters());
        let outputs = engine.execute("FreeDragCrop", inputs).unwrap();

        let ui = outputs.ui.unwrap();
        assert_eq!(ui.orig_size, [200, 100]);
        assert_relative_eq!(ui.preview_scale[0], 64.0 / 200.0);
        let saved = image::open(dir.path().join(&ui.images[0].filename)).unwrap();
        assert_eq!((saved.width(), saved.height()), (64, 32));

        let outputs = engine
            .execute_with(
                "FreeDragCrop",
                crop_inputs(ImageBatch::filled((1, 4, 4, 3), 0.5).unwrap()),
                &ExecutionOptions::new().with_preview(false),
            )
            .unwrap();
        assert!(outputs.ui.is_none());
    }

    #[test]
    fn test_custom_registry() {
        let registry = RegistryBuilder::new()
            .with_builtins(false)
            .register(|| Box::new(PassthroughNode))
            .build();
        let engine = ExecutionEngine::new(Arc::new(registry));

        let outputs = engine
            .execute("Passthrough", NodeInputs::new().with_input("input", Value::Float(1.5)))
            .unwrap();
        assert_eq!(outputs.get("output"), Some(&Value::Float(1.5)));
        assert!(engine.execute("FreeDragCrop", NodeInputs::new()).is_err());
    }

    #[test]
    fn test_execution_options_builder() {
        let options = ExecutionOptions::new()
            .with_validation(false)
            .with_preview(false)
            .with_max_preview_dimension(0);
        assert!(!options.validate);
        assert!(!options.write_preview);
        assert_eq!(options.max_preview_dimension, 1);
    }
}
