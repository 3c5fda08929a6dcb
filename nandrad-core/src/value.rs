use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

/// Identifies a model instance within a simulation.
///
/// IDs are assigned by the framework when it constructs the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stable handle to one scalar value published by a model.
///
/// A `ValueRef` names the owning model and a slot in that model's result
/// storage. Handles stay valid for the lifetime of the model; the value
/// behind them is read through a [`ValueSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueRef {
    owner: ModelId,
    slot: usize,
}

impl ValueRef {
    #[must_use]
    pub fn new(owner: ModelId, slot: usize) -> Self {
        Self { owner, slot }
    }

    /// Returns the model that owns the referenced value.
    #[must_use]
    pub fn owner(&self) -> ModelId {
        self.owner
    }

    /// Returns the slot within the owner's result storage.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.slot)
    }
}

/// Read access to values behind [`ValueRef`] handles.
///
/// Models read their inputs through a `ValueSource` supplied by the caller,
/// so no model ever holds a pointer into another model's storage.
pub trait ValueSource {
    /// Returns the current value behind `value_ref`, or `None` if the
    /// reference is unknown to this source.
    fn value(&self, value_ref: ValueRef) -> Option<f64>;
}

impl<S: ValueSource + ?Sized> ValueSource for &S {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        (**self).value(value_ref)
    }
}

impl ValueSource for HashMap<ValueRef, f64> {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        self.get(&value_ref).copied()
    }
}

impl ValueSource for BTreeMap<ValueRef, f64> {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        self.get(&value_ref).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_sources_return_stored_values() {
        let r = ValueRef::new(ModelId(3), 7);
        let mut values = HashMap::new();
        values.insert(r, 21.5);

        assert_eq!(values.value(r), Some(21.5));
        assert_eq!(values.value(ValueRef::new(ModelId(3), 8)), None);
        assert_eq!((&values).value(r), Some(21.5));
    }

    #[test]
    fn value_ref_display() {
        assert_eq!(ValueRef::new(ModelId(2), 5).to_string(), "#2:5");
    }
}
