//! Configuration file round trips against the on-disk layout.

use motion_common::config::{AlarmResetPolicy, BackendKind, ConfigError, ConfigLoader, HalConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn full_file_loads_and_validates() {
    let file = write_config(
        r#"[shared]
log_level = "debug"
service_name = "motion-hal-01"

[device]
driver = "simulation"
backend = "acs"
axis_count = 8
digital_input_count = 64
digital_output_count = 64
analog_input_count = 8
analog_output_count = 8
HostIP = "10.0.0.100"
HostPort = 701
ParameterFile = "axes.prm"
InitFile = "board.cme"
bits_per_slot = 32

[device.wait]
poll_interval_ms = 2
default_timeout_ms = 5000

[device.alarm]
reset_policy = "skip_if_not_alarmed"
debounce_ms = 50
"#,
    );

    let config = HalConfig::load(file.path()).unwrap();
    config.validate().unwrap();

    let device = &config.device;
    assert_eq!(device.backend, BackendKind::Acs);
    assert_eq!(device.axis_count, 8);
    assert_eq!(device.bits_per_slot, Some(32));
    assert_eq!(device.parameter_file.as_deref(), Some(std::path::Path::new("axes.prm")));
    assert_eq!(device.init_file.as_deref(), Some(std::path::Path::new("board.cme")));
    assert_eq!(device.wait.poll_interval_ms, 2);
    assert_eq!(device.wait.default_timeout_ms, 5000);
    assert_eq!(device.alarm.reset_policy, AlarmResetPolicy::SkipIfNotAlarmed);
    assert_eq!(device.alarm.debounce_ms, 50);
}

#[test]
fn missing_device_section_uses_defaults() {
    let file = write_config("[shared]\nservice_name = \"bare\"\n");
    let config = HalConfig::load(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.device.backend, BackendKind::Simulation);
    assert_eq!(config.device.axis_count, 1);
}

#[test]
fn unknown_backend_is_a_parse_error() {
    let file = write_config(
        "[shared]\nservice_name = \"x\"\n\n[device]\nbackend = \"ajin\"\n",
    );
    assert!(matches!(
        HalConfig::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn zero_debounce_fails_validation() {
    let file = write_config(
        "[shared]\nservice_name = \"x\"\n\n[device.alarm]\ndebounce_ms = 0\n",
    );
    let config = HalConfig::load(file.path()).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(msg)) if msg.contains("debounce_ms")
    ));
}
