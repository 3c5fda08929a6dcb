//! A co-simulation master driving the CO2 ventilation FMU.

use integration_tests::init_tracing;
use nandrad_fmi::{
    FmuInstance, FmuState, InstanceError, InstanceStatus,
    co2_ventilation::{Co2Ventilation, Co2VentilationConfig},
};
use nandrad_solve::equation::newton;

const AMBIENT_TEMPERATURE: u32 = 1;
const OFFICE_AIR_TEMPERATURE: u32 = 10;
const OFFICE_CO2: u32 = 11;
const OFFICE_AIR_CHANGE_RATE: u32 = 12;
const STORAGE_AIR_TEMPERATURE: u32 = 20;
const STORAGE_CO2: u32 = 21;
const STORAGE_AIR_CHANGE_RATE: u32 = 22;

const OUTPUTS: [u32; 4] = [
    OFFICE_CO2,
    OFFICE_AIR_CHANGE_RATE,
    STORAGE_CO2,
    STORAGE_AIR_CHANGE_RATE,
];

const H: f64 = 600.0;
const HOUR: f64 = 3600.0;

/// An office occupied from 8:00 to 12:00 and an unoccupied storage room.
///
/// Air change rates are 0.5 and 4 per hour; CO2 switches with a 200 ppm band
/// around 1000 ppm.
const CONFIG: &str = r#"{
    "zones": [
        {
            "id": 2,
            "volume": 120.0,
            "floor_area": 40.0,
            "schedule_name": "Office",
            "air_temperature_value_ref": 10,
            "co2_concentration_value_ref": 11,
            "air_change_rate_value_ref": 12
        },
        {
            "id": 1,
            "volume": 60.0,
            "floor_area": 20.0,
            "schedule_name": "Storage",
            "air_temperature_value_ref": 20,
            "co2_concentration_value_ref": 21,
            "air_change_rate_value_ref": 22
        }
    ],
    "schedules": {
        "Office": {
            "time": [0.0, 28800.0, 28860.0, 43200.0, 43260.0],
            "values": [0.0, 0.0, 1e-6, 1e-6, 0.0]
        },
        "Storage": { "time": [0.0], "values": [0.0] }
    },
    "ambient_co2_concentration": 400e-6,
    "start_co2_concentration": 400e-6,
    "maximum_co2_concentration": 1000e-6,
    "co2_tolerance_band": 200e-6,
    "minimum_air_temperature": 293.15,
    "maximum_air_temperature": 299.15,
    "start_air_temperature": 295.15,
    "temperature_tolerance_band": 1.0,
    "minimum_air_change_rate": 1.388888888888889e-4,
    "maximum_air_change_rate": 1.111111111111111e-3,
    "ambient_temperature_value_ref": 1
}"#;

fn model() -> Co2Ventilation {
    Co2Ventilation::new(Co2VentilationConfig::from_json(CONFIG).unwrap())
}

fn instance(model: Co2Ventilation) -> FmuInstance<Co2Ventilation> {
    init_tracing();
    let mut instance = FmuInstance::new("co2", model);
    instance.initialize().unwrap();
    instance
}

/// Sets the inputs for step `n`, advances by one step and returns the outputs.
fn step(instance: &mut FmuInstance<Co2Ventilation>, n: usize) -> [f64; 4] {
    let swing = 0.1 * (n % 5) as f64;
    instance.set_real(AMBIENT_TEMPERATURE, 290.0 - swing).unwrap();
    instance.set_real(OFFICE_AIR_TEMPERATURE, 295.0 + swing).unwrap();
    instance.set_real(STORAGE_AIR_TEMPERATURE, 294.0).unwrap();
    instance.do_step(n as f64 * H, H).unwrap();
    OUTPUTS.map(|vr| instance.get_real(vr).unwrap())
}

fn run(instance: &mut FmuInstance<Co2Ventilation>, steps: std::ops::Range<usize>) -> Vec<[f64; 4]> {
    steps.map(|n| step(instance, n)).collect()
}

fn bits(outputs: &[[f64; 4]]) -> Vec<[u64; 4]> {
    outputs.iter().map(|o| o.map(f64::to_bits)).collect()
}

#[test]
fn occupancy_switches_ventilation() {
    let mut fmu = instance(model());
    let outputs = run(&mut fmu, 0..84);

    let night = &outputs[..47];
    assert!(night.iter().all(|o| o[1] < 2e-4));
    assert!(night.iter().all(|o| (o[0] - 400e-6).abs() < 2e-6));

    let occupied = &outputs[48..72];
    let peak = occupied.iter().map(|o| o[0]).fold(0.0, f64::max);
    assert!(peak > 1100e-6, "peak {peak}");
    assert!(peak < 1400e-6, "peak {peak}");
    assert!(occupied.iter().any(|o| o[1] > 1e-3));

    // The storage room never sees a source.
    assert!(outputs.iter().all(|o| (o[2] - 400e-6).abs() < 2e-6));
    assert!(outputs.iter().all(|o| o[3] < 2e-4));

    // Two hours after the office empties ventilation is back at the minimum.
    assert!(outputs[83][0] < 900e-6);
    assert!(outputs[83][1] < 2e-4);
    fmu.terminate().unwrap();
}

#[test]
fn restored_state_replays_bit_identically() {
    let mut fmu = instance(model());
    run(&mut fmu, 0..54);
    let checkpoint = fmu.get_fmu_state().unwrap();

    let first = run(&mut fmu, 54..66);
    fmu.set_fmu_state(&checkpoint).unwrap();
    let second = run(&mut fmu, 54..66);
    assert_eq!(bits(&first), bits(&second));

    // A second instance continues identically from the same blob.
    let mut other = instance(model());
    other.set_fmu_state(&checkpoint).unwrap();
    let third = run(&mut other, 54..66);
    assert_eq!(bits(&first), bits(&third));
}

#[test]
fn rejected_step_recovers_from_checkpoint() {
    let mut reference = instance(model());
    run(&mut reference, 0..54);
    let checkpoint = reference.get_fmu_state().unwrap();
    let expected = OUTPUTS.map(|vr| reference.get_real(vr).unwrap());

    let strict = newton::Config {
        max_iters: 1,
        ..newton::Config::default()
    };
    let mut fmu = instance(model().with_newton_config(strict));
    fmu.set_fmu_state(&checkpoint).unwrap();

    let error = fmu.do_step(54.0 * H, H).unwrap_err();
    assert!(matches!(error, InstanceError::Convergence(_)), "{error}");
    assert_eq!(fmu.status(), InstanceStatus::StepRejected);

    // Only a restore is accepted after a rejected step.
    assert!(matches!(
        fmu.do_step(54.0 * H, H),
        Err(InstanceError::InvalidCallingOrder { .. })
    ));
    assert!(matches!(
        fmu.get_fmu_state(),
        Err(InstanceError::InvalidCallingOrder { .. })
    ));

    fmu.set_fmu_state(&checkpoint).unwrap();
    assert_eq!(fmu.status(), InstanceStatus::StepAccepted);
    let restored = OUTPUTS.map(|vr| fmu.get_real(vr).unwrap());
    assert_eq!(restored.map(f64::to_bits), expected.map(f64::to_bits));
}

#[test]
fn corrupt_state_is_rejected_without_side_effects() {
    let mut fmu = instance(model());
    run(&mut fmu, 0..6);
    let before = OUTPUTS.map(|vr| fmu.get_real(vr).unwrap());
    let blob = fmu.get_fmu_state().unwrap();

    let mut truncated = blob.clone().into_bytes();
    truncated.pop();
    let error = fmu.set_fmu_state(&FmuState::from_bytes(truncated)).unwrap_err();
    assert!(matches!(error, InstanceError::State(_)), "{error}");

    // A blob from a different zone layout has the wrong length.
    let mut single_zone = Co2VentilationConfig::from_json(CONFIG).unwrap();
    single_zone.zones.truncate(1);
    let mut small = instance(Co2Ventilation::new(single_zone));
    let foreign = small.get_fmu_state().unwrap();
    assert!(foreign.len() < blob.len());
    assert!(matches!(
        fmu.set_fmu_state(&foreign),
        Err(InstanceError::State(_))
    ));
    small.terminate().unwrap();

    assert_eq!(fmu.status(), InstanceStatus::StepAccepted);
    let after = OUTPUTS.map(|vr| fmu.get_real(vr).unwrap());
    assert_eq!(after.map(f64::to_bits), before.map(f64::to_bits));
    step(&mut fmu, 6);
}

#[test]
fn calling_order_is_enforced() {
    init_tracing();
    let mut fmu = FmuInstance::new("co2", model());
    assert!(matches!(
        fmu.do_step(0.0, H),
        Err(InstanceError::InvalidCallingOrder { .. })
    ));

    fmu.initialize().unwrap();
    assert!(matches!(
        fmu.initialize(),
        Err(InstanceError::InvalidCallingOrder { .. })
    ));
    assert!(matches!(
        fmu.do_step(H, H),
        Err(InstanceError::InvalidStep { .. })
    ));
    assert!(matches!(
        fmu.set_real(OFFICE_CO2, 1.0),
        Err(InstanceError::UnknownValueReference(OFFICE_CO2))
    ));

    step(&mut fmu, 0);
    fmu.terminate().unwrap();
    assert!(matches!(
        fmu.get_real(OFFICE_CO2),
        Err(InstanceError::InvalidCallingOrder { .. })
    ));
}
