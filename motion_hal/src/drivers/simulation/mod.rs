//! Simulation driver module.
//!
//! Runs the generic [`MotionDevice`](crate::device::MotionDevice) against an
//! in-memory controller, so every backend policy can be exercised without a
//! vendor runtime. The configured `backend` picks the policy (IO layout,
//! capability sets, status codes) the simulated controller answers with.

mod axis;
mod journal;
mod sdk;

pub use axis::{AxisSimulator, Drive, cam_position};
pub use journal::{JournalEntry, SdkCall};
pub use sdk::{SIM_AT_LIMIT, SIM_AXIS_ALARMED, SIM_AXIS_DISABLED, SIM_INVALID_ARGUMENT, SimHandle, SimulatedSdk};

use crate::device::MotionDevice;
use motion_common::config::DeviceConfig;
use motion_common::device::Controller;
use motion_common::error::MotionResult;

/// Simulated device plus the handle that inspects it.
pub fn open_device(config: &DeviceConfig) -> MotionResult<(MotionDevice<SimulatedSdk>, SimHandle)> {
    let sdk = SimulatedSdk::new(config);
    let handle = sdk.handle();
    let device = MotionDevice::open(sdk, config)?;
    Ok((device, handle))
}

/// Factory function to create a simulated device.
pub fn create_device(config: &DeviceConfig) -> MotionResult<Box<dyn Controller>> {
    let (device, _) = open_device(config)?;
    Ok(Box::new(device))
}
