mod config;

pub use config::{ControllerType, TemperatureType, ThermostatConfig, ThermostatModelType};

use nandrad_core::{
    ConfigurationError, ConsistencyFault, InputReference, ModelError, ModelId, ObjectList,
    QuantityDescription, QuantityName, ReferenceType, ResultProvider, StateDependency, ValueRef,
    ValueSource, VectorValuedQuantity, Zone,
};
use tracing::debug;

use crate::controller::Controller;

/// Per-zone quantities published by a [`ThermostatModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatResult {
    HeatingSetpoint,
    CoolingSetpoint,
    HeatingControlValue,
    CoolingControlValue,
}

impl ThermostatResult {
    pub const ALL: [Self; 4] = [
        Self::HeatingSetpoint,
        Self::CoolingSetpoint,
        Self::HeatingControlValue,
        Self::CoolingControlValue,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HeatingSetpoint => "HeatingSetpoint",
            Self::CoolingSetpoint => "CoolingSetpoint",
            Self::HeatingControlValue => "HeatingControlValue",
            Self::CoolingControlValue => "CoolingControlValue",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::HeatingSetpoint | Self::CoolingSetpoint => "K",
            Self::HeatingControlValue | Self::CoolingControlValue => "---",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::HeatingSetpoint => "Heating setpoint temperature",
            Self::CoolingSetpoint => "Cooling setpoint temperature",
            Self::HeatingControlValue => "Heating control signal in [0, 1]",
            Self::CoolingControlValue => "Cooling control signal in [0, 1]",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

const TEMPERATURE_INPUT: usize = 0;
const HEATING_SCHEDULE_INPUT: usize = 1;
const COOLING_SCHEDULE_INPUT: usize = 2;

/// A thermostat for the zones of one object list.
///
/// The model publishes heating and cooling setpoints and control values for
/// every zone in its object list. Each zone gets its own heating and cooling
/// controller, cloned from the single controller built from the
/// configuration. The sensed temperature comes either from each zone itself or
/// from one reference zone shared by all zones.
///
/// Typical framework sequence:
///
/// 1. [`setup`](Self::setup) resolves references and builds the controller.
/// 2. [`init_results`](Self::init_results) fixes the zone keys and allocates results.
/// 3. [`input_references`](StateDependency::input_references) /
///    [`set_input_value_refs`](StateDependency::set_input_value_refs) wire inputs.
/// 4. [`update`](Self::update) per evaluation, [`step_completed`](Self::step_completed)
///    per accepted step.
#[derive(Debug, Clone)]
pub struct ThermostatModel {
    id: ModelId,
    config: ThermostatConfig,
    object_list: usize,
    object_list_name: String,
    controller: Controller,
    constant_setpoints: Option<(f64, f64)>,
    zone_ids: Vec<u32>,
    results_initialized: bool,
    results: Vec<VectorValuedQuantity>,
    heating_controllers: Vec<Controller>,
    cooling_controllers: Vec<Controller>,
    value_refs: Vec<ValueRef>,
}

impl ThermostatModel {
    /// Resolves the configuration against the project's object lists and zones.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the object list is unnamed, undefined
    /// or not zone-typed, if the reference zone does not exist, or if
    /// controller or setpoint parameters are missing or invalid.
    pub fn setup(
        id: ModelId,
        config: &ThermostatConfig,
        object_lists: &[ObjectList],
        zones: &[Zone],
    ) -> Result<Self, ConfigurationError> {
        if config.zone_object_list.is_empty() {
            return Err(ConfigurationError::MissingObjectList);
        }

        let object_list = ObjectList::find(object_lists, &config.zone_object_list)
            .ok_or_else(|| ConfigurationError::UndefinedObjectList(config.zone_object_list.clone()))?;

        let list = &object_lists[object_list];
        if list.reference_type != ReferenceType::Zone {
            return Err(ConfigurationError::WrongReferenceType {
                name: list.name.clone(),
                expected: ReferenceType::Zone,
                found: list.reference_type,
            });
        }

        if let Some(zone_id) = config.reference_zone_id {
            if Zone::find(zones, zone_id).is_none() {
                return Err(ConfigurationError::UndefinedZone(zone_id));
            }
        }

        let controller = config.build_controller()?;

        let constant_setpoints = match config.model_type {
            ThermostatModelType::Constant => Some(config.constant_setpoints()?),
            ThermostatModelType::Scheduled => None,
        };

        debug!(
            thermostat = config.id,
            object_list = %list.name,
            "thermostat set up"
        );

        Ok(Self {
            id,
            config: config.clone(),
            object_list,
            object_list_name: list.name.clone(),
            controller,
            constant_setpoints,
            zone_ids: Vec::new(),
            results_initialized: false,
            results: Vec::new(),
            heating_controllers: Vec::new(),
            cooling_controllers: Vec::new(),
            value_refs: Vec::new(),
        })
    }

    /// Allocates one result slot per zone of the resolved object list.
    ///
    /// An object list without zones is valid; the model then publishes and
    /// requests nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyFault::StaleObjectList`] if `object_lists` no longer
    /// holds the list resolved in [`setup`](Self::setup) at the same index.
    pub fn init_results(&mut self, object_lists: &[ObjectList]) -> Result<(), ConsistencyFault> {
        let list = object_lists
            .get(self.object_list)
            .filter(|list| list.name == self.object_list_name)
            .ok_or_else(|| ConsistencyFault::StaleObjectList {
                index: self.object_list,
                name: self.object_list_name.clone(),
            })?;

        self.zone_ids = list.id_vec();
        self.results_initialized = true;
        if self.zone_ids.is_empty() {
            return Ok(());
        }

        self.results = ThermostatResult::ALL
            .iter()
            .map(|_| VectorValuedQuantity::new(self.zone_ids.clone()))
            .collect();
        self.heating_controllers = vec![self.controller.clone(); self.zone_ids.len()];
        self.cooling_controllers = vec![self.controller.clone(); self.zone_ids.len()];

        debug!(
            thermostat = self.config.id,
            zones = self.zone_ids.len(),
            "thermostat results initialized"
        );
        Ok(())
    }

    /// Returns the controller built from the configuration.
    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Returns the controlled zone IDs in object-list order.
    #[must_use]
    pub fn zone_ids(&self) -> &[u32] {
        &self.zone_ids
    }

    /// Returns the number of input value references the model expects.
    #[must_use]
    pub fn expected_input_count(&self) -> usize {
        if self.zone_ids.is_empty() {
            return 0;
        }
        let sensors = if self.config.reference_zone_id.is_some() {
            1
        } else {
            self.zone_ids.len()
        };
        sensors * self.inputs_per_sensor()
    }

    /// Returns the published value of `result` for zone `zone_id`.
    #[must_use]
    pub fn result(&self, result: ThermostatResult, zone_id: u32) -> Option<f64> {
        self.results.get(result.index())?.get(zone_id)
    }

    /// Reads the inputs, updates all setpoints and feeds the controllers.
    ///
    /// Hysteresis controllers only compute tentative values here; the
    /// published control values change for them in
    /// [`step_completed`](Self::step_completed).
    ///
    /// # Errors
    ///
    /// Returns a [`ConsistencyFault`] if [`init_results`](Self::init_results)
    /// has not run, the inputs were not wired or a value is missing from
    /// `values`.
    pub fn update(&mut self, values: &impl ValueSource) -> Result<(), ConsistencyFault> {
        if !self.results_initialized {
            return Err(ConsistencyFault::ResultsNotInitialized);
        }
        if self.zone_ids.is_empty() {
            return Ok(());
        }
        let expected = self.expected_input_count();
        if self.value_refs.len() != expected {
            return Err(ConsistencyFault::ValueRefCount {
                expected,
                found: self.value_refs.len(),
            });
        }

        for position in 0..self.zone_ids.len() {
            let temperature = self.read(values, position, TEMPERATURE_INPUT)?;
            let (heating, cooling) = match self.constant_setpoints {
                Some(setpoints) => setpoints,
                None => (
                    self.read(values, position, HEATING_SCHEDULE_INPUT)?,
                    self.read(values, position, COOLING_SCHEDULE_INPUT)?,
                ),
            };

            self.set_result(ThermostatResult::HeatingSetpoint, position, heating);
            self.set_result(ThermostatResult::CoolingSetpoint, position, cooling);

            // Positive errors request heating (too cold) or cooling (too warm).
            self.heating_controllers[position].update(heating - temperature);
            self.cooling_controllers[position].update(temperature - cooling);
        }

        self.publish_control_values();
        Ok(())
    }

    /// Commits all controllers at the end of an accepted step at time `t`.
    pub fn step_completed(&mut self, t: f64) {
        for controller in self
            .heating_controllers
            .iter_mut()
            .chain(self.cooling_controllers.iter_mut())
        {
            controller.step_completed(t);
        }
        self.publish_control_values();
    }

    fn inputs_per_sensor(&self) -> usize {
        match self.config.model_type {
            ThermostatModelType::Constant => 1,
            ThermostatModelType::Scheduled => 3,
        }
    }

    /// Returns the index into `value_refs` of an input for the zone at `position`.
    fn input_index(&self, position: usize, offset: usize) -> usize {
        if self.config.reference_zone_id.is_some() {
            offset
        } else {
            position * self.inputs_per_sensor() + offset
        }
    }

    fn read(
        &self,
        values: &impl ValueSource,
        position: usize,
        offset: usize,
    ) -> Result<f64, ConsistencyFault> {
        let value_ref = self.value_refs[self.input_index(position, offset)];
        values
            .value(value_ref)
            .ok_or(ConsistencyFault::MissingValue(value_ref))
    }

    fn set_result(&mut self, result: ThermostatResult, position: usize, value: f64) {
        self.results[result.index()].set_at(position, value);
    }

    fn publish_control_values(&mut self) {
        for position in 0..self.zone_ids.len() {
            let heating = self.heating_controllers[position].control_value();
            let cooling = self.cooling_controllers[position].control_value();
            self.set_result(
                ThermostatResult::HeatingControlValue,
                position,
                heating.clamp(0.0, 1.0),
            );
            self.set_result(
                ThermostatResult::CoolingControlValue,
                position,
                cooling.clamp(0.0, 1.0),
            );
        }
    }

    fn result_ref(&self, result: ThermostatResult, position: usize) -> ValueRef {
        ValueRef::new(self.id, result.index() * self.zone_ids.len() + position)
    }

    fn input_ref(&self, position: usize, offset: usize) -> ValueRef {
        self.value_refs[self.input_index(position, offset)]
    }
}

impl ValueSource for ThermostatModel {
    fn value(&self, value_ref: ValueRef) -> Option<f64> {
        if value_ref.owner() != self.id || self.zone_ids.is_empty() {
            return None;
        }
        let n = self.zone_ids.len();
        self.results
            .get(value_ref.slot() / n)?
            .at(value_ref.slot() % n)
    }
}

impl ResultProvider for ThermostatModel {
    fn model_id(&self) -> ModelId {
        self.id
    }

    fn result_descriptions(&self) -> Vec<QuantityDescription> {
        if self.zone_ids.is_empty() {
            return Vec::new();
        }
        ThermostatResult::ALL
            .iter()
            .map(|result| {
                QuantityDescription {
                    reference_type: Some(ReferenceType::Zone),
                    ..QuantityDescription::vector(
                        result.name(),
                        result.unit(),
                        result.description(),
                        self.zone_ids.clone(),
                    )
                }
            })
            .collect()
    }

    fn result_value_ref(&self, quantity: &QuantityName) -> Option<ValueRef> {
        let result = ThermostatResult::from_name(&quantity.name)?;
        if self.zone_ids.is_empty() {
            return None;
        }
        // Without an index the reference points at the first element.
        let position = match quantity.index {
            None => 0,
            Some(zone_id) => self.results[result.index()].position(zone_id)?,
        };
        Some(self.result_ref(result, position))
    }
}

impl StateDependency for ThermostatModel {
    fn input_references(&self) -> Vec<InputReference> {
        if self.zone_ids.is_empty() {
            return Vec::new();
        }

        let temperature = self.config.temperature_type().quantity_name();
        let scheduled = self.config.model_type == ThermostatModelType::Scheduled;

        let sensor_ids = match self.config.reference_zone_id {
            Some(zone_id) => vec![zone_id],
            None => self.zone_ids.clone(),
        };

        let mut refs = Vec::with_capacity(self.expected_input_count());
        for id in sensor_ids {
            refs.push(InputReference::new(id, ReferenceType::Zone, temperature));
            if scheduled {
                refs.push(InputReference::new(
                    id,
                    ReferenceType::Zone,
                    "HeatingSetpointSchedule",
                ));
                refs.push(InputReference::new(
                    id,
                    ReferenceType::Zone,
                    "CoolingSetpointSchedule",
                ));
            }
        }
        refs
    }

    fn set_input_value_refs(
        &mut self,
        _result_descriptions: &[QuantityDescription],
        value_refs: Vec<ValueRef>,
    ) -> Result<(), ModelError> {
        let expected = self.expected_input_count();
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
        if self.zone_ids.is_empty() || self.value_refs.len() != self.expected_input_count() {
            return Vec::new();
        }

        let scheduled = self.config.model_type == ThermostatModelType::Scheduled;
        let mut deps = Vec::new();

        for position in 0..self.zone_ids.len() {
            let temperature = self.input_ref(position, TEMPERATURE_INPUT);
            let heating = self.result_ref(ThermostatResult::HeatingControlValue, position);
            let cooling = self.result_ref(ThermostatResult::CoolingControlValue, position);

            if scheduled {
                let heating_schedule = self.input_ref(position, HEATING_SCHEDULE_INPUT);
                let cooling_schedule = self.input_ref(position, COOLING_SCHEDULE_INPUT);

                deps.push((
                    self.result_ref(ThermostatResult::HeatingSetpoint, position),
                    heating_schedule,
                ));
                deps.push((
                    self.result_ref(ThermostatResult::CoolingSetpoint, position),
                    cooling_schedule,
                ));
                deps.push((heating, heating_schedule));
                deps.push((cooling, cooling_schedule));
            }

            deps.push((heating, temperature));
            deps.push((cooling, temperature));
        }
        deps
    }
}
