//! Port definitions and constraints for node inputs, outputs and parameters.
//!
//! Ports define the interface of a node - what data it accepts and produces.
//! Each port has a type and optional constraints for validation.

use crate::core::types::{PortType, Value};
use serde::{Deserialize, Serialize};

/// Definition of a node port (input or output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDefinition {
    /// Unique name within the node (used in code)
    pub name: String,
    /// Human-readable name (used in UI)
    pub display_name: String,
    /// Type of data this port accepts/produces
    pub port_type: PortType,
    /// Whether this port may be left unconnected
    pub optional: bool,
    /// Description for documentation and tooltips
    pub description: String,
}

/// UI hints for parameter display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "widget", content = "options")]
pub enum UiHint {
    /// Default input widget based on type
    Default,
    /// Dropdown offering presets
    Dropdown {
        /// Suggested options
        options: Vec<String>,
    },
    /// Checkbox for booleans
    Checkbox,
    /// Spin box for integers
    SpinBox,
}

/// Definition of a node parameter (widget value).
///
/// Parameters differ from inputs: they are set in the host's property
/// widgets rather than connected to other nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Unique name within the node
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Type of the parameter
    pub param_type: PortType,
    /// Default value used when the host omits the parameter
    pub default_value: Value,
    /// Whether the host lists this parameter under its optional section
    pub optional: bool,
    /// Description for documentation
    pub description: String,
    /// Constraints for validation
    pub constraints: Vec<Constraint>,
    /// UI widget hint
    pub ui_hint: UiHint,
}

/// Constraints that can be applied to parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Constraint {
    /// Numeric value must be within range [min, max]
    Range { min: f64, max: f64 },
    /// Numeric value must be a multiple of step
    Step(f64),
}

// ============================================================================
// PortDefinition Builder Pattern
// ============================================================================

impl PortDefinition {
    /// Create a new input port definition.
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name.into(), port_type)
    }

    /// Create a new output port definition.
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name.into(), port_type)
    }

    fn new(name: String, port_type: PortType) -> Self {
        Self {
            display_name: name_to_display(&name),
            name,
            port_type,
            optional: false,
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark this port as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Validate a value against this port's type.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        if !self.port_type.matches(value) {
            return Err(format!(
                "Type mismatch for port '{}': expected {}, got {}",
                self.name,
                self.port_type,
                value.get_type()
            ));
        }
        Ok(())
    }
}

/// Convert snake_case name to Title Case display name.
fn name_to_display(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// ParameterDefinition Builder Pattern
// ============================================================================

impl ParameterDefinition {
    /// Create a new parameter definition.
    pub fn new(name: impl Into<String>, param_type: PortType, default_value: Value) -> Self {
        let name = name.into();
        Self {
            display_name: name_to_display(&name),
            name,
            param_type,
            default_value,
            optional: false,
            description: String::new(),
            constraints: Vec::new(),
            ui_hint: UiHint::Default,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a range constraint.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.constraints.push(Constraint::Range { min, max });
        self
    }

    /// Add a step constraint.
    pub fn with_step(mut self, step: f64) -> Self {
        self.constraints.push(Constraint::Step(step));
        self
    }

    /// Set the UI hint.
    pub fn with_ui_hint(mut self, ui_hint: UiHint) -> Self {
        self.ui_hint = ui_hint;
        self
    }

    /// List this parameter in the host's optional section.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Validate a value against this parameter's type and constraints.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        if !self.param_type.matches(value) {
            return Err(format!(
                "Type mismatch for parameter '{}': expected {}, got {}",
                self.name,
                self.param_type,
                value.get_type()
            ));
        }

        for constraint in &self.constraints {
            constraint.validate(value)?;
        }

        Ok(())
    }

    /// Widget options in the host schema (`default`, `min`, `max`, `step`).
    pub fn host_options(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut options = serde_json::Map::new();
        options.insert("default".to_string(), self.default_value.to_json());

        let integral = self.param_type == PortType::Integer;
        let number = |v: f64| {
            if integral {
                serde_json::Value::from(v as i64)
            } else {
                serde_json::Value::from(v)
            }
        };

        for constraint in &self.constraints {
            match constraint {
                Constraint::Range { min, max } => {
                    options.insert("min".to_string(), number(*min));
                    options.insert("max".to_string(), number(*max));
                }
                Constraint::Step(step) => {
                    options.insert("step".to_string(), number(*step));
                }
            }
        }

        options
    }
}

// ============================================================================
// Constraint Validation
// ============================================================================

impl Constraint {
    /// Validate a value against this constraint.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Constraint::Range { min, max } => {
                if let Some(num) = value.as_float() {
                    if num < *min || num > *max {
                        return Err(format!("Value {} is out of range [{}, {}]", num, min, max));
                    }
                }
            }

            Constraint::Step(step) => {
                if let Some(num) = value.as_float() {
                    let remainder = num % step;
                    if remainder.abs() > f64::EPSILON {
                        return Err(format!("Value {} must be a multiple of {}", num, step));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for UiHint {
    fn default() -> Self {
        UiHint::Default
    }
}
