//! Timestamped record of every call the simulated SDK receives.

use crate::sdk::IoBank;
use motion_common::profile::ResolvedProfile;
use motion_common::types::{AnalogSample, AnalogWidth, CommandMode};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// One vendor call with its arguments.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SdkCall {
    Open {
        install_dir: Option<PathBuf>,
        host_ip: Option<String>,
        host_port: Option<u16>,
    },
    SetDeviceName(String),
    LoadInitFile(PathBuf),
    LoadParameterFile(PathBuf),
    StartCommunication(Duration),
    StopCommunication,
    Close,
    SetServo { axis: u32, on: bool },
    ArmFaultMonitoring { axis: u32 },
    Status { axis: u32 },
    Faults { axis: u32 },
    SetAlarmReset { axis: u32, asserted: bool },
    CommandMode { axis: u32 },
    SetCommandMode { axis: u32, mode: CommandMode },
    StartPosition { axis: u32, target: f64, profile: ResolvedProfile },
    StartPositionGroup { targets: Vec<(u32, f64)>, profile: ResolvedProfile },
    StartVelocity { axis: u32, profile: ResolvedProfile },
    StartTorque { axis: u32, torque: f64 },
    StopTorque { axis: u32 },
    StopPosition { axis: u32 },
    StopVelocity { axis: u32 },
    EmergencyStop { axis: u32 },
    SetCommandPosition { axis: u32, position: f64 },
    SetActualPosition { axis: u32, position: f64 },
    CommandPosition { axis: u32 },
    ActualPosition { axis: u32 },
    CommandVelocity { axis: u32 },
    ActualVelocity { axis: u32 },
    SearchZPhase { axis: u32, velocity: f64, acceleration: f64, distance: f64 },
    StartECam { table_index: u32, master: u32, slave: u32, points: usize },
    StopECam { table_index: u32 },
    ECamEnabled { table_index: u32 },
    StartGear { master: u32, slave: u32, ratio: f64, ramp: ResolvedProfile },
    StopGear { slave: u32 },
    ReadIo { bank: IoBank, container: u32, width: u32 },
    WriteIo { bank: IoBank, container: u32, width: u32, value: u32 },
    ReadAnalog { bank: IoBank, port: u32, width: AnalogWidth },
    WriteAnalog { port: u32, sample: AnalogSample },
    RunBuffer { buffer: u32, label: Option<String> },
    StopBuffer { buffer: u32 },
    ReadVariable { name: String, range: Option<(u32, u32)> },
    WriteVariable { name: String, range: Option<(u32, u32)>, values: Vec<f64> },
}

impl SdkCall {
    /// Call name, as used for failure injection.
    pub fn name(&self) -> &'static str {
        match self {
            SdkCall::Open { .. } => "open",
            SdkCall::SetDeviceName(_) => "set_device_name",
            SdkCall::LoadInitFile(_) => "load_init_file",
            SdkCall::LoadParameterFile(_) => "load_parameter_file",
            SdkCall::StartCommunication(_) => "start_communication",
            SdkCall::StopCommunication => "stop_communication",
            SdkCall::Close => "close",
            SdkCall::SetServo { .. } => "set_servo",
            SdkCall::ArmFaultMonitoring { .. } => "arm_fault_monitoring",
            SdkCall::Status { .. } => "status",
            SdkCall::Faults { .. } => "faults",
            SdkCall::SetAlarmReset { .. } => "set_alarm_reset",
            SdkCall::CommandMode { .. } => "command_mode",
            SdkCall::SetCommandMode { .. } => "set_command_mode",
            SdkCall::StartPosition { .. } => "start_position",
            SdkCall::StartPositionGroup { .. } => "start_position_group",
            SdkCall::StartVelocity { .. } => "start_velocity",
            SdkCall::StartTorque { .. } => "start_torque",
            SdkCall::StopTorque { .. } => "stop_torque",
            SdkCall::StopPosition { .. } => "stop_position",
            SdkCall::StopVelocity { .. } => "stop_velocity",
            SdkCall::EmergencyStop { .. } => "emergency_stop",
            SdkCall::SetCommandPosition { .. } => "set_command_position",
            SdkCall::SetActualPosition { .. } => "set_actual_position",
            SdkCall::CommandPosition { .. } => "command_position",
            SdkCall::ActualPosition { .. } => "actual_position",
            SdkCall::CommandVelocity { .. } => "command_velocity",
            SdkCall::ActualVelocity { .. } => "actual_velocity",
            SdkCall::SearchZPhase { .. } => "search_z_phase",
            SdkCall::StartECam { .. } => "start_ecam",
            SdkCall::StopECam { .. } => "stop_ecam",
            SdkCall::ECamEnabled { .. } => "ecam_enabled",
            SdkCall::StartGear { .. } => "start_gear",
            SdkCall::StopGear { .. } => "stop_gear",
            SdkCall::ReadIo { .. } => "read_io",
            SdkCall::WriteIo { .. } => "write_io",
            SdkCall::ReadAnalog { .. } => "read_analog",
            SdkCall::WriteAnalog { .. } => "write_analog",
            SdkCall::RunBuffer { .. } => "run_buffer",
            SdkCall::StopBuffer { .. } => "stop_buffer",
            SdkCall::ReadVariable { .. } => "read_variable",
            SdkCall::WriteVariable { .. } => "write_variable",
        }
    }

    /// Returns true for calls that only read controller state.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            SdkCall::Status { .. }
                | SdkCall::Faults { .. }
                | SdkCall::CommandMode { .. }
                | SdkCall::CommandPosition { .. }
                | SdkCall::ActualPosition { .. }
                | SdkCall::CommandVelocity { .. }
                | SdkCall::ActualVelocity { .. }
                | SdkCall::ECamEnabled { .. }
                | SdkCall::ReadIo { .. }
                | SdkCall::ReadAnalog { .. }
                | SdkCall::ReadVariable { .. }
        )
    }
}

/// Journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// When the call arrived
    pub at: Instant,
    /// The call
    pub call: SdkCall,
}
