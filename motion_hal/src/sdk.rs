//! Vendor SDK boundary.
//!
//! [`MotionSdk`] is the thin, status-code-returning surface a vendor binding
//! exposes. It carries no policy: mode tracking, validation, alarm sequencing
//! and error mapping all live in [`crate::device::MotionDevice`]. Axis ids are
//! raw `u32` values because channel numbering is resolved before the call.

use motion_common::profile::ResolvedProfile;
use motion_common::types::{
    AnalogSample, AnalogWidth, AxisStatusBits, CommandMode, ECamTable, FaultFlags, SyncPair,
};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Raw vendor status code. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    /// Success.
    pub const OK: StatusCode = StatusCode(0);

    /// Returns true for [`StatusCode::OK`].
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a vendor call.
pub type SdkResult<T> = Result<T, StatusCode>;

/// Digital IO bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoBank {
    /// Digital inputs
    Input,
    /// Digital outputs
    Output,
}

/// Parameters for opening the vendor session.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRequest<'a> {
    /// Vendor runtime installation directory
    pub install_dir: Option<&'a Path>,
    /// Controller address for networked backends
    pub host_ip: Option<&'a str>,
    /// Controller port for networked backends
    pub host_port: Option<u16>,
}

/// Native calls of one vendor motion SDK.
///
/// IO is exchanged as whole containers (a slot word or a byte) of `width`
/// bits; bit extraction and read-modify-write happen above this trait.
pub trait MotionSdk {
    // ─── Session ────────────────────────────────────────────────────

    /// Open the vendor session.
    fn open(&mut self, request: &OpenRequest<'_>) -> SdkResult<()>;
    /// Register the client name with the vendor runtime.
    fn set_device_name(&mut self, name: &str) -> SdkResult<()>;
    /// Load a board init file.
    fn load_init_file(&mut self, path: &Path) -> SdkResult<()>;
    /// Load an axis parameter file.
    fn load_parameter_file(&mut self, path: &Path) -> SdkResult<()>;
    /// Start cyclic communication.
    fn start_communication(&mut self, timeout: Duration) -> SdkResult<()>;
    /// Stop cyclic communication.
    fn stop_communication(&mut self) -> SdkResult<()>;
    /// Close the vendor session.
    fn close(&mut self) -> SdkResult<()>;

    // ─── Servo & faults ─────────────────────────────────────────────

    /// Servo on/off.
    fn set_servo(&mut self, axis: u32, on: bool) -> SdkResult<()>;
    /// Re-enable fault latching for an axis.
    fn arm_fault_monitoring(&mut self, axis: u32) -> SdkResult<()>;
    /// Axis status bitfield.
    fn status(&mut self, axis: u32) -> SdkResult<AxisStatusBits>;
    /// Latched safety faults.
    fn faults(&mut self, axis: u32) -> SdkResult<FaultFlags>;
    /// Drive the alarm reset line.
    fn set_alarm_reset(&mut self, axis: u32, asserted: bool) -> SdkResult<()>;

    // ─── Command mode ───────────────────────────────────────────────

    /// Raw command mode as reported by the controller.
    fn command_mode(&mut self, axis: u32) -> SdkResult<i32>;
    /// Switch command mode.
    fn set_command_mode(&mut self, axis: u32, mode: CommandMode) -> SdkResult<()>;

    // ─── Motion ─────────────────────────────────────────────────────

    /// Start a point-to-point move.
    fn start_position(&mut self, axis: u32, target: f64, profile: &ResolvedProfile)
    -> SdkResult<()>;
    /// Start a synchronized point-to-point move.
    fn start_position_group(
        &mut self,
        targets: &[(u32, f64)],
        profile: &ResolvedProfile,
    ) -> SdkResult<()>;
    /// Start a jog at the profile's signed velocity.
    fn start_velocity(&mut self, axis: u32, profile: &ResolvedProfile) -> SdkResult<()>;
    /// Apply a torque command.
    fn start_torque(&mut self, axis: u32, torque: f64) -> SdkResult<()>;
    /// End the torque command.
    fn stop_torque(&mut self, axis: u32) -> SdkResult<()>;
    /// Decelerate a position move to rest.
    fn stop_position(&mut self, axis: u32) -> SdkResult<()>;
    /// Decelerate a jog to rest.
    fn stop_velocity(&mut self, axis: u32) -> SdkResult<()>;
    /// Immediate stop.
    fn emergency_stop(&mut self, axis: u32) -> SdkResult<()>;

    // ─── Positions & sensors ────────────────────────────────────────

    /// Overwrite the commanded position.
    fn set_command_position(&mut self, axis: u32, position: f64) -> SdkResult<()>;
    /// Overwrite the feedback position.
    fn set_actual_position(&mut self, axis: u32, position: f64) -> SdkResult<()>;
    /// Commanded position.
    fn command_position(&mut self, axis: u32) -> SdkResult<f64>;
    /// Feedback position.
    fn actual_position(&mut self, axis: u32) -> SdkResult<f64>;
    /// Commanded velocity.
    fn command_velocity(&mut self, axis: u32) -> SdkResult<f64>;
    /// Feedback velocity.
    fn actual_velocity(&mut self, axis: u32) -> SdkResult<f64>;
    /// Encoder index search.
    fn search_z_phase(
        &mut self,
        axis: u32,
        velocity: f64,
        acceleration: f64,
        distance: f64,
    ) -> SdkResult<()>;

    // ─── Synchronization ────────────────────────────────────────────

    /// Load and start a repeating cam table.
    fn start_ecam(&mut self, table: &ECamTable) -> SdkResult<()>;
    /// Stop a cam table.
    fn stop_ecam(&mut self, table_index: u32) -> SdkResult<()>;
    /// Cam table running.
    fn ecam_enabled(&mut self, table_index: u32) -> SdkResult<bool>;
    /// Engage or retune a gear coupling.
    fn start_gear(&mut self, pair: &SyncPair, ramp: &ResolvedProfile) -> SdkResult<()>;
    /// Release the gear coupling of `slave`.
    fn stop_gear(&mut self, slave: u32) -> SdkResult<()>;

    // ─── IO ─────────────────────────────────────────────────────────

    /// Read one IO container of `width` bits.
    fn read_io(&mut self, bank: IoBank, container: u32, width: u32) -> SdkResult<u32>;
    /// Write one IO container of `width` bits.
    fn write_io(&mut self, bank: IoBank, container: u32, width: u32, value: u32) -> SdkResult<()>;
    /// Read an analog port.
    fn read_analog(&mut self, bank: IoBank, port: u32, width: AnalogWidth) -> SdkResult<i64>;
    /// Write an analog output port.
    fn write_analog(&mut self, port: u32, sample: AnalogSample) -> SdkResult<()>;

    // ─── User memory ────────────────────────────────────────────────

    /// Start a program buffer.
    fn run_buffer(&mut self, buffer: u32, label: Option<&str>) -> SdkResult<()>;
    /// Stop a program buffer.
    fn stop_buffer(&mut self, buffer: u32) -> SdkResult<()>;
    /// Read a variable or an inclusive index range of it.
    fn read_variable(&mut self, name: &str, range: Option<(u32, u32)>) -> SdkResult<Vec<f64>>;
    /// Write a variable or an inclusive index range of it.
    fn write_variable(&mut self, name: &str, range: Option<(u32, u32)>, values: &[f64])
    -> SdkResult<()>;

    // ─── Diagnostics ────────────────────────────────────────────────

    /// Vendor message for a status code.
    fn describe(&self, code: StatusCode) -> String;
}
