//! Shared helpers for motion HAL integration tests.

#![allow(dead_code)]

use motion_common::config::{BackendKind, DeviceConfig};
use motion_hal::MotionDevice;
use motion_hal::drivers::simulation::{self, SdkCall, SimHandle, SimulatedSdk};

/// Small simulated controller with fast polling and a short alarm debounce.
pub fn sim_config(backend: BackendKind) -> DeviceConfig {
    let mut config = DeviceConfig {
        backend,
        axis_count: 4,
        digital_input_count: 32,
        digital_output_count: 32,
        analog_input_count: 4,
        analog_output_count: 4,
        ..DeviceConfig::default()
    };
    config.wait.poll_interval_ms = 2;
    config.wait.default_timeout_ms = 5_000;
    config.alarm.debounce_ms = 20;
    config
}

/// Open a simulated device and clear the init calls from the journal.
pub fn open(backend: BackendKind) -> (MotionDevice<SimulatedSdk>, SimHandle) {
    open_with(&sim_config(backend))
}

/// Open with an explicit configuration and clear the init calls.
pub fn open_with(config: &DeviceConfig) -> (MotionDevice<SimulatedSdk>, SimHandle) {
    let (device, sim) = simulation::open_device(config).expect("open simulated device");
    sim.clear_journal();
    (device, sim)
}

/// Names of the state-changing calls in the journal.
pub fn command_names(sim: &SimHandle) -> Vec<&'static str> {
    sim.commands().iter().map(SdkCall::name).collect()
}
