use std::collections::BTreeMap;

use nandrad_core::{
    InputReference, ModelError, ModelId, QuantityDescription, ReferenceType, StateDependency,
    ValueRef, ValueSource,
};
use thiserror::Error;

/// Zone quantities a [`ZoneSensors`] model publishes, in slot order.
pub const ZONE_QUANTITIES: [&str; 4] = [
    "AirTemperature",
    "OperativeTemperature",
    "HeatingSetpointSchedule",
    "CoolingSetpointSchedule",
];

/// Stand-in for the zone and schedule models of a simulation.
///
/// Publishes [`ZONE_QUANTITIES`] for each zone; all values are in K.
#[derive(Debug, Clone)]
pub struct ZoneSensors {
    id: ModelId,
    zone_ids: Vec<u32>,
    values: Vec<f64>,
}

impl ZoneSensors {
    /// Creates sensors with every zone at `air_temperature` and setpoint
    /// schedules of 20 °C and 26 °C.
    #[must_use]
    pub fn new(id: ModelId, zone_ids: impl IntoIterator<Item = u32>, air_temperature: f64) -> Self {
        let zone_ids: Vec<u32> = zone_ids.into_iter().collect();
        let values = zone_ids
            .iter()
            .flat_map(|_| [air_temperature, air_temperature, 293.15, 299.15])
            .collect();
        Self {
            id,
            zone_ids,
            values,
        }
    }

    /// Overwrites one quantity of one zone.
    ///
    /// Returns `false` if the zone or quantity is unknown.
    pub fn set(&mut self, zone_id: u32, quantity: &str, value: f64) -> bool {
        match self.slot(zone_id, quantity) {
            Some(slot) => {
                self.values[slot] = value;
                true
            }
            None => false,
        }
    }

    /// Resolves a zone input reference to one of the published values.
    #[must_use]
    pub fn resolve(&self, reference: &InputReference) -> Option<(ValueRef, QuantityDescription)> {
        if reference.reference_type != ReferenceType::Zone || reference.name.index.is_some() {
            return None;
        }
        let slot = self.slot(reference.id, &reference.name.name)?;
        let description = QuantityDescription {
            id: reference.id,
            name: reference.name.name.clone(),
            unit: "K".into(),
            reference_type: Some(ReferenceType::Zone),
            ..QuantityDescription::default()
        };
        Some((ValueRef::new(self.id, slot), description))
    }

    fn slot(&self, zone_id: u32, quantity: &str) -> Option<usize> {
        let zone = self.zone_ids.iter().position(|&id| id == zone_id)?;
        let quantity = ZONE_QUANTITIES.iter().position(|&q| q == quantity)?;
        Some(zone * ZONE_QUANTITIES.len() + quantity)
    }
}

impl ValueSource for ZoneSensors {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        if value_ref.owner() != self.id {
            return None;
        }
        self.values.get(value_ref.slot()).copied()
    }
}

/// Reads values from whichever model owns them.
#[derive(Default)]
pub struct Network<'a> {
    sources: BTreeMap<ModelId, &'a dyn ValueSource>,
}

impl<'a> Network<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` with `source` registered as the owner of `id`'s values.
    #[must_use]
    pub fn with(mut self, id: ModelId, source: &'a dyn ValueSource) -> Self {
        self.sources.insert(id, source);
        self
    }
}

impl ValueSource for Network<'_> {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        self.sources.get(&value_ref.owner())?.value(value_ref)
    }
}

/// Errors while connecting a model to its inputs.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("required input {} of object #{} cannot be resolved", .0.name, .0.id)]
    Unresolved(InputReference),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Resolves every input reference of `model` and hands it the value references.
///
/// `resolve` is tried for each reference in order. Unresolved optional
/// references are skipped.
///
/// # Errors
///
/// Returns [`WiringError::Unresolved`] for a required reference nobody
/// publishes, or the model's own error.
pub fn wire<M, R>(model: &mut M, resolve: R) -> Result<(), WiringError>
where
    M: StateDependency,
    R: Fn(&InputReference) -> Option<(ValueRef, QuantityDescription)>,
{
    let mut descriptions = Vec::new();
    let mut value_refs = Vec::new();

    for reference in model.input_references() {
        match resolve(&reference) {
            Some((value_ref, description)) => {
                value_refs.push(value_ref);
                descriptions.push(description);
            }
            None if reference.required => return Err(WiringError::Unresolved(reference)),
            None => {}
        }
    }

    model.set_input_value_refs(&descriptions, value_refs)?;
    Ok(())
}
