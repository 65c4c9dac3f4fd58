//! Configuration loading traits and types.
//!
//! Every motion HAL process reads one TOML file with a `[shared]` section
//! and a `[device]` section. The `[device]` keys that name vendor session
//! settings keep the vendor spelling (`HostIP`, `ParameterFile`, ...).
//!
//! # Usage
//!
//! ```rust,no_run
//! use motion_common::config::{ConfigLoader, ConfigError, HalConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = HalConfig::load(Path::new("device.toml"))?;
//!     config.validate()?;
//!     println!("Backend: {}", config.device.backend);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_ALARM_DEBOUNCE_MS, DEFAULT_DEVICE_NAME, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_START_COMMUNICATION_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS, MAX_AI, MAX_AO, MAX_AXES,
    MAX_BITS_PER_SLOT, MAX_DI, MAX_DO,
};
use crate::error::MotionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for MotionError {
    fn from(e: ConfigError) -> Self {
        MotionError::InvalidParameter(e.to_string())
    }
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-poll tracing.
    Trace,
    /// Vendor call details.
    Debug,
    /// Session lifecycle and mode switches.
    #[default]
    Info,
    /// Recoverable oddities (missing init file, ...).
    Warn,
    /// Failed operations.
    Error,
}

impl LogLevel {
    /// Directive string for `tracing_subscriber::EnvFilter`.
    pub const fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "motion-hal-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Controller family whose behavioural policy a device follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ACS motion controller.
    Acs,
    /// Comizoa motion board.
    Comizoa,
    /// WMX (SoftServo) EtherCAT master.
    Wmx,
    /// Software simulation.
    #[default]
    Simulation,
}

impl BackendKind {
    /// Every backend, in declaration order.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Acs,
        BackendKind::Comizoa,
        BackendKind::Wmx,
        BackendKind::Simulation,
    ];

    /// Lowercase name, as written in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Acs => "acs",
            BackendKind::Comizoa => "comizoa",
            BackendKind::Wmx => "wmx",
            BackendKind::Simulation => "simulation",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `clear_alarm` does when the axis is not alarmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlarmResetPolicy {
    /// Return without pulsing when the axis reports no alarm.
    #[default]
    SkipIfNotAlarmed,
    /// Always pulse the reset line.
    Always,
}

/// `[device.wait]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Delay between motion-status queries.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Deadline for `wait` without an explicit timeout.
    #[serde(default = "default_wait_timeout_ms")]
    pub default_timeout_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            default_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl WaitConfig {
    #[inline]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// `[device.alarm]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default)]
    pub reset_policy: AlarmResetPolicy,

    /// How long the reset line stays asserted.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            reset_policy: AlarmResetPolicy::default(),
            debounce_ms: DEFAULT_ALARM_DEBOUNCE_MS,
        }
    }
}

impl AlarmConfig {
    #[inline]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// `[device]` section: driver selection, channel counts, vendor session keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Registry key of the SDK binding.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Behavioural policy.
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_axis_count")]
    pub axis_count: u32,
    #[serde(default)]
    pub digital_input_count: u32,
    #[serde(default)]
    pub digital_output_count: u32,
    #[serde(default)]
    pub analog_input_count: u32,
    #[serde(default)]
    pub analog_output_count: u32,

    /// Controller network address.
    #[serde(rename = "HostIP", default)]
    pub host_ip: Option<String>,

    /// Controller network port.
    #[serde(rename = "HostPort", default)]
    pub host_port: Option<u16>,

    /// Axis parameter file loaded after opening.
    #[serde(rename = "ParameterFile", default)]
    pub parameter_file: Option<PathBuf>,

    /// Board init file; a missing file only logs a warning.
    #[serde(rename = "InitFile", default)]
    pub init_file: Option<PathBuf>,

    /// Vendor installation directory.
    #[serde(rename = "WMXDir", default)]
    pub install_dir: Option<PathBuf>,

    #[serde(
        rename = "StartCommunicationTimeout",
        default = "default_start_communication_timeout"
    )]
    pub start_communication_timeout_ms: u32,

    #[serde(rename = "DeviceName", default = "default_device_name")]
    pub device_name: String,

    /// Overrides the backend's bits per IO word.
    #[serde(default)]
    pub bits_per_slot: Option<u32>,

    #[serde(default)]
    pub wait: WaitConfig,

    #[serde(default)]
    pub alarm: AlarmConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            backend: BackendKind::default(),
            axis_count: default_axis_count(),
            digital_input_count: 0,
            digital_output_count: 0,
            analog_input_count: 0,
            analog_output_count: 0,
            host_ip: None,
            host_port: None,
            parameter_file: None,
            init_file: None,
            install_dir: None,
            start_communication_timeout_ms: DEFAULT_START_COMMUNICATION_TIMEOUT_MS,
            device_name: default_device_name(),
            bits_per_slot: None,
            wait: WaitConfig::default(),
            alarm: AlarmConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Validate counts, timing and addressing settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "driver cannot be empty".to_string(),
            ));
        }
        if self.axis_count == 0 || self.axis_count as usize > MAX_AXES {
            return Err(ConfigError::ValidationError(format!(
                "axis_count {} must be in 1..={}",
                self.axis_count, MAX_AXES
            )));
        }
        check_count("digital_input_count", self.digital_input_count, MAX_DI)?;
        check_count("digital_output_count", self.digital_output_count, MAX_DO)?;
        check_count("analog_input_count", self.analog_input_count, MAX_AI)?;
        check_count("analog_output_count", self.analog_output_count, MAX_AO)?;

        if let Some(bits) = self.bits_per_slot
            && (bits == 0 || bits > MAX_BITS_PER_SLOT)
        {
            return Err(ConfigError::ValidationError(format!(
                "bits_per_slot {} must be in 1..={}",
                bits, MAX_BITS_PER_SLOT
            )));
        }
        if self.start_communication_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "StartCommunicationTimeout must be positive".to_string(),
            ));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "wait.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.alarm.debounce_ms == 0 {
            return Err(ConfigError::ValidationError(
                "alarm.debounce_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_count(key: &str, value: u32, max: usize) -> Result<(), ConfigError> {
    if value as usize > max {
        return Err(ConfigError::ValidationError(format!(
            "{} {} exceeds maximum {}",
            key, value, max
        )));
    }
    Ok(())
}

/// Complete configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalConfig {
    /// Process-wide settings
    pub shared: SharedConfig,
    /// The controller this process drives
    #[serde(default)]
    pub device: DeviceConfig,
}

impl HalConfig {
    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.device.validate()
    }
}

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_axis_count() -> u32 {
    1
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

fn default_start_communication_timeout() -> u32 {
    DEFAULT_START_COMMUNICATION_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_wait_timeout_ms() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_ALARM_DEBOUNCE_MS
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
///
/// Semantic checks are left to the caller's `validate()`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }

        let parsed = toml::from_str::<Wrapper>("level = \"trace\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Trace);
        let parsed = toml::from_str::<Wrapper>("level = \"error\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Error);
        assert!(toml::from_str::<Wrapper>("level = \"loud\"").is_err());
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_device_config_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.driver, "simulation");
        assert_eq!(config.backend, BackendKind::Simulation);
        assert_eq!(config.wait.default_timeout(), Duration::from_secs(180));
        assert_eq!(config.wait.poll_interval(), Duration::from_millis(1));
        assert_eq!(config.alarm.reset_policy, AlarmResetPolicy::SkipIfNotAlarmed);
        assert_eq!(config.alarm.debounce(), Duration::from_millis(100));
        assert_eq!(config.start_communication_timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_device_config_rejects_bad_values() {
        let mut config = DeviceConfig {
            axis_count: 0,
            ..DeviceConfig::default()
        };
        assert!(config.validate().is_err());

        config.axis_count = 4;
        config.bits_per_slot = Some(33);
        assert!(config.validate().is_err());

        config.bits_per_slot = Some(8);
        config.wait.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.wait.poll_interval_ms = 1;
        config.digital_input_count = (MAX_DI + 1) as u32;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("digital_input_count"));
    }

    #[test]
    fn test_config_error_converts_to_invalid_parameter() {
        let err: MotionError = ConfigError::ValidationError("axis_count".into()).into();
        assert!(matches!(err, MotionError::InvalidParameter(_)));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = HalConfig::load(Path::new("/nonexistent/path/device.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = HalConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_vendor_keys() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
service_name = "motion-hal-01"

[device]
backend = "wmx"
axis_count = 8
digital_output_count = 64
HostIP = "10.0.0.100"
HostPort = 701
WMXDir = "C:/Program Files/SoftServo/WMX3"
StartCommunicationTimeout = 2500
DeviceName = "cell-3"

[device.alarm]
reset_policy = "always"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = HalConfig::load(file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.shared.log_level, LogLevel::Info);
        assert_eq!(config.device.backend, BackendKind::Wmx);
        assert_eq!(config.device.driver, "simulation");
        assert_eq!(config.device.host_ip.as_deref(), Some("10.0.0.100"));
        assert_eq!(config.device.host_port, Some(701));
        assert_eq!(config.device.start_communication_timeout_ms, 2500);
        assert_eq!(config.device.device_name, "cell-3");
        assert_eq!(config.device.alarm.reset_policy, AlarmResetPolicy::Always);
        assert_eq!(config.device.alarm.debounce_ms, 100);
        assert_eq!(config.device.wait.default_timeout_ms, 180_000);
    }
}
