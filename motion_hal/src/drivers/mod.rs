//! Motion driver implementations.
//!
//! - [`simulation`] - In-memory controller for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Implement [`MotionSdk`](crate::sdk::MotionSdk) over the vendor library
//! 2. Add a factory returning `MotionDevice<YourSdk>` as a `Box<dyn Controller>`
//! 3. Register the factory in [`register_builtin`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_builtin(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_device);
}
