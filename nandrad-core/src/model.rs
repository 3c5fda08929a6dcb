use crate::{
    InputReference, ModelError, ModelId, QuantityDescription, QuantityName, ValueRef, ValueSource,
};

/// A model that publishes computed quantities.
///
/// The framework asks every model for its [`result_descriptions`] and then
/// probes models with [`result_value_ref`] to resolve the input references of
/// other models. A probe for a quantity the model does not own returns `None`;
/// this is the normal "not my variable" answer, not an error.
///
/// Published values are read back through the [`ValueSource`] supertrait.
///
/// [`result_descriptions`]: ResultProvider::result_descriptions
/// [`result_value_ref`]: ResultProvider::result_value_ref
pub trait ResultProvider: ValueSource {
    /// Returns the ID the framework assigned to this model.
    fn model_id(&self) -> ModelId;

    /// Describes all quantities published by this model.
    fn result_descriptions(&self) -> Vec<QuantityDescription>;

    /// Returns a handle to the published quantity `quantity`, if this model
    /// owns it.
    fn result_value_ref(&self, quantity: &QuantityName) -> Option<ValueRef>;
}

/// A model that consumes quantities published by other models.
pub trait StateDependency {
    /// Lists the quantities this model needs, in a fixed order.
    fn input_references(&self) -> Vec<InputReference>;

    /// Receives one value reference per entry of [`input_references`], in the
    /// same order, together with the descriptions of the resolved quantities.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the supplied references do not match what
    /// the model requested.
    ///
    /// [`input_references`]: StateDependency::input_references
    fn set_input_value_refs(
        &mut self,
        result_descriptions: &[QuantityDescription],
        value_refs: Vec<ValueRef>,
    ) -> Result<(), ModelError>;

    /// Lists `(result, input)` pairs where the result depends on the input.
    ///
    /// The framework uses these pairs to build the sparsity pattern of the
    /// system Jacobian.
    fn state_dependencies(&self) -> Vec<(ValueRef, ValueRef)>;
}
