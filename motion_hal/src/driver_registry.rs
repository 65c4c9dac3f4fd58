//! Driver registry.
//!
//! Maps the `driver` key of the device configuration to a factory. Built at
//! startup and passed by value; there is no global registry.

use crate::drivers;
use motion_common::config::DeviceConfig;
use motion_common::device::Controller;
use motion_common::error::{MotionError, MotionResult};
use std::collections::HashMap;

/// Factory creating an opened device from its configuration.
pub type DriverFactory = fn(&DeviceConfig) -> MotionResult<Box<dyn Controller>>;

/// Registry of available motion drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        drivers::register_builtin(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create and open the device named by `config.driver`.
    ///
    /// # Errors
    /// [`MotionError::InvalidParameter`] if no such driver is registered,
    /// otherwise whatever the driver's open sequence reports.
    pub fn create_device(&self, config: &DeviceConfig) -> MotionResult<Box<dyn Controller>> {
        let factory = self.get_factory(&config.driver).ok_or_else(|| {
            MotionError::invalid(format!(
                "unknown driver '{}' (available: {})",
                config.driver,
                self.list_drivers().join(", ")
            ))
        })?;
        factory(config)
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_driver(_config: &DeviceConfig) -> MotionResult<Box<dyn Controller>> {
        Err(MotionError::Connection("no hardware".to_string()))
    }

    #[test]
    fn builtin_registry_creates_simulation_device() {
        let registry = DriverRegistry::with_builtin();
        let device = registry
            .create_device(&DeviceConfig::default())
            .expect("should create");
        assert_eq!(device.name(), "simulation");
    }

    #[test]
    fn unknown_driver_lists_available() {
        let registry = DriverRegistry::with_builtin();
        let config = DeviceConfig {
            driver: "ethercat".to_string(),
            ..DeviceConfig::default()
        };
        let err = registry.create_device(&config).err().expect("should fail");
        let text = err.to_string();
        assert!(text.contains("ethercat"));
        assert!(text.contains("simulation"));
    }

    #[test]
    fn factory_errors_propagate() {
        let mut registry = DriverRegistry::new();
        registry.register("broken", failing_driver);
        let config = DeviceConfig {
            driver: "broken".to_string(),
            ..DeviceConfig::default()
        };
        assert!(matches!(
            registry.create_device(&config),
            Err(MotionError::Connection(_))
        ));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut registry = DriverRegistry::with_builtin();
        registry.register("simulation", failing_driver);
    }

    #[test]
    fn list_is_sorted() {
        let mut registry = DriverRegistry::with_builtin();
        registry.register("acs_spii", failing_driver);
        assert_eq!(registry.list_drivers(), vec!["acs_spii", "simulation"]);
    }
}
