//! The FMI variable table.

use nandrad_core::{QuantityName, ReferenceType};
use serde::{Deserialize, Serialize};

/// One exchanged variable of an FMU.
///
/// Input variables are written by the co-simulation master and read by the
/// models; output variables are model results read by the master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmiVariableDefinition {
    /// Name of the variable in the model description, e.g. `Zone(1).AirTemperature`.
    pub fmi_var_name: String,
    /// FMI value reference number.
    pub fmi_value_ref: u32,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub start_value: f64,
    /// `true` for master-to-model variables.
    pub input_variable: bool,
    /// Type of the object that owns the model quantity.
    #[serde(default = "zone_reference")]
    pub reference_type: ReferenceType,
    pub object_id: u32,
    pub var_name: String,
    #[serde(default)]
    pub vector_index: Option<u32>,
}

impl FmiVariableDefinition {
    /// Creates an input variable with a start value of zero.
    pub fn input(fmi_value_ref: u32, object_id: u32, var_name: impl Into<String>) -> Self {
        Self::new(fmi_value_ref, true, object_id, var_name.into())
    }

    /// Creates an output variable with a start value of zero.
    pub fn output(fmi_value_ref: u32, object_id: u32, var_name: impl Into<String>) -> Self {
        Self::new(fmi_value_ref, false, object_id, var_name.into())
    }

    fn new(fmi_value_ref: u32, input_variable: bool, object_id: u32, var_name: String) -> Self {
        Self {
            fmi_var_name: format!("{var_name}({object_id})"),
            fmi_value_ref,
            unit: String::new(),
            start_value: 0.0,
            input_variable,
            reference_type: ReferenceType::Zone,
            object_id,
            var_name,
            vector_index: None,
        }
    }

    /// Returns `self` with the given vector index, keeping other fields unchanged.
    #[must_use]
    pub fn with_vector_index(self, index: u32) -> Self {
        Self {
            vector_index: Some(index),
            ..self
        }
    }

    /// Returns `self` with the given reference type, keeping other fields unchanged.
    #[must_use]
    pub fn with_reference_type(self, reference_type: ReferenceType) -> Self {
        Self {
            reference_type,
            ..self
        }
    }

    /// Returns `self` with the given unit and start value, keeping other fields unchanged.
    #[must_use]
    pub fn with_start_value(self, unit: impl Into<String>, start_value: f64) -> Self {
        Self {
            unit: unit.into(),
            start_value,
            ..self
        }
    }

    /// Returns `true` if both definitions address the same model quantity.
    ///
    /// Object ID, variable name and vector index are compared; the direction
    /// and FMI naming are not. Two unset indexes match.
    #[must_use]
    pub fn same_model_var_as(&self, other: &Self) -> bool {
        self.addresses(other.object_id, &other.var_name, other.vector_index)
    }

    pub(crate) fn addresses(&self, object_id: u32, var_name: &str, index: Option<u32>) -> bool {
        self.object_id == object_id && self.var_name == var_name && self.vector_index == index
    }

    /// Returns the model quantity name, including the vector index if set.
    #[must_use]
    pub fn quantity_name(&self) -> QuantityName {
        QuantityName {
            name: self.var_name.clone(),
            index: self.vector_index,
        }
    }
}

fn zone_reference() -> ReferenceType {
    ReferenceType::Zone
}

/// The ordered variable table of an FMU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FmiDescription {
    #[serde(default)]
    pub variables: Vec<FmiVariableDefinition>,
}

impl FmiDescription {
    #[must_use]
    pub fn new(variables: Vec<FmiVariableDefinition>) -> Self {
        Self { variables }
    }

    /// Parses a description from JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a valid description.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Iterates over the master-to-model variables in table order.
    pub fn inputs(&self) -> impl Iterator<Item = &FmiVariableDefinition> {
        self.variables.iter().filter(|v| v.input_variable)
    }

    /// Iterates over the model-to-master variables in table order.
    pub fn outputs(&self) -> impl Iterator<Item = &FmiVariableDefinition> {
        self.variables.iter().filter(|v| !v.input_variable)
    }
}
