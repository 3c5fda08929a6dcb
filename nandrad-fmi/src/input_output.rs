//! Exchange of values between an FMI master and the model network.
//!
//! Input variables become results of the [`FmiInputOutput`] model: the master
//! writes them and other models read them through value references. Output
//! variables become input references of the same model: the framework wires
//! them to the model results the master wants to read.

use nandrad_core::{
    ConfigurationError, ConsistencyFault, InputReference, ModelError, ModelId,
    QuantityDescription, StateDependency, ValueRef, ValueSource,
};
use tracing::debug;

use crate::{
    FmiError,
    variable::{FmiDescription, FmiVariableDefinition},
};

/// The model that represents the FMI interface inside a simulation.
#[derive(Debug, Clone)]
pub struct FmiInputOutput {
    id: ModelId,
    variables: Vec<FmiVariableDefinition>,
    /// Values of the input variables, in table order of the inputs.
    results: Vec<f64>,
    /// Wired model results, in table order of the outputs.
    value_refs: Vec<ValueRef>,
}

impl FmiInputOutput {
    /// Captures the variable table and allocates one result per input variable.
    ///
    /// Each result starts at its variable's start value.
    #[must_use]
    pub fn setup(id: ModelId, description: &FmiDescription) -> Self {
        let results: Vec<f64> = description.inputs().map(|v| v.start_value).collect();
        debug!(
            model = %id,
            inputs = results.len(),
            outputs = description.outputs().count(),
            "FMI input/output set up"
        );
        Self {
            id,
            variables: description.variables.clone(),
            results,
            value_refs: Vec::new(),
        }
    }

    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.id
    }

    /// Prepares the inputs for time `t`.
    ///
    /// Inputs are held constant over a communication interval, so there is
    /// nothing to compute.
    pub fn set_time(&mut self, _t: f64) {}

    /// Resolves a model's input reference against the FMI input variables.
    ///
    /// Only input variables are searched and the first match wins. The
    /// returned value reference addresses the matching input's result, and
    /// the description carries the requested ID, name and reference type.
    /// Returns `None` if no input variable matches.
    #[must_use]
    pub fn resolve_result_reference(
        &self,
        input_ref: &InputReference,
    ) -> Option<(ValueRef, QuantityDescription)> {
        let (slot, variable) = self.inputs().enumerate().find(|(_, v)| {
            v.addresses(input_ref.id, &input_ref.name.name, input_ref.name.index)
        })?;

        let description = QuantityDescription {
            id: input_ref.id,
            name: input_ref.name.name.clone(),
            unit: variable.unit.clone(),
            reference_type: Some(input_ref.reference_type),
            ..QuantityDescription::default()
        };
        Some((ValueRef::new(self.id, slot), description))
    }

    /// Writes the value the master hands over for an input variable.
    ///
    /// # Errors
    ///
    /// Returns [`FmiError::UnknownValueReference`] if no variable has the
    /// value reference and [`FmiError::NotAnInput`] if it is an output.
    pub fn set_fmi_input_value(&mut self, fmi_value_ref: u32, value: f64) -> Result<(), FmiError> {
        let slot = self.input_slot(fmi_value_ref)?;
        self.results[slot] = value;
        Ok(())
    }

    /// Reads the model result wired to an output variable.
    ///
    /// # Errors
    ///
    /// Returns [`FmiError::UnknownValueReference`] or [`FmiError::NotAnOutput`]
    /// for a bad value reference, and a [`ConsistencyFault`] if the outputs
    /// were not wired or `values` lacks the wired result.
    pub fn fmi_output_value(
        &self,
        fmi_value_ref: u32,
        values: &impl ValueSource,
    ) -> Result<f64, FmiError> {
        let position = self
            .outputs()
            .position(|v| v.fmi_value_ref == fmi_value_ref)
            .ok_or_else(|| self.missing(fmi_value_ref, false))?;

        let value_ref = *self.value_refs.get(position).ok_or_else(|| {
            ConsistencyFault::ValueRefCount {
                expected: self.outputs().count(),
                found: self.value_refs.len(),
            }
        })?;

        Ok(values
            .value(value_ref)
            .ok_or(ConsistencyFault::MissingValue(value_ref))?)
    }

    fn inputs(&self) -> impl Iterator<Item = &FmiVariableDefinition> {
        self.variables.iter().filter(|v| v.input_variable)
    }

    fn outputs(&self) -> impl Iterator<Item = &FmiVariableDefinition> {
        self.variables.iter().filter(|v| !v.input_variable)
    }

    fn input_slot(&self, fmi_value_ref: u32) -> Result<usize, FmiError> {
        self.inputs()
            .position(|v| v.fmi_value_ref == fmi_value_ref)
            .ok_or_else(|| self.missing(fmi_value_ref, true))
    }

    /// Distinguishes an unknown value reference from one with the wrong direction.
    fn missing(&self, fmi_value_ref: u32, wanted_input: bool) -> FmiError {
        let known = self.variables.iter().any(|v| v.fmi_value_ref == fmi_value_ref);
        match (known, wanted_input) {
            (false, _) => FmiError::UnknownValueReference(fmi_value_ref),
            (true, true) => FmiError::NotAnInput(fmi_value_ref),
            (true, false) => FmiError::NotAnOutput(fmi_value_ref),
        }
    }
}

impl ValueSource for FmiInputOutput {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        if value_ref.owner() != self.id {
            return None;
        }
        self.results.get(value_ref.slot()).copied()
    }
}

impl StateDependency for FmiInputOutput {
    fn input_references(&self) -> Vec<InputReference> {
        self.outputs()
            .map(|v| InputReference {
                id: v.object_id,
                reference_type: v.reference_type,
                name: v.quantity_name(),
                required: true,
            })
            .collect()
    }

    /// Stores the wired output values after checking them against the table.
    ///
    /// Every description must be scalar and name an output variable.
    fn set_input_value_refs(
        &mut self,
        result_descriptions: &[QuantityDescription],
        value_refs: Vec<ValueRef>,
    ) -> Result<(), ModelError> {
        for description in result_descriptions {
            if !description.index_keys.is_empty() {
                return Err(ConfigurationError::MalformedFmiVariable(description.name.clone()).into());
            }
            if !self.outputs().any(|v| v.var_name == description.name) {
                return Err(
                    ConfigurationError::MismatchingFmiVariable(description.name.clone()).into(),
                );
            }
        }

        let expected = self.outputs().count();
        if value_refs.len() != expected {
            return Err(ConsistencyFault::ValueRefCount {
                expected,
                found: value_refs.len(),
            }
            .into());
        }

        self.value_refs = value_refs;
        Ok(())
    }

    fn state_dependencies(&self) -> Vec<(ValueRef, ValueRef)> {
        Vec::new()
    }
}
