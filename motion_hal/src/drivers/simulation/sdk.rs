//! Simulated vendor SDK.
//!
//! [`SimulatedSdk`] implements [`MotionSdk`] against an in-memory controller:
//! axis kinematics advance with wall-clock time on every call, IO lives in
//! flat bit tables, and every call is journaled. A [`SimHandle`] shares the
//! same state so tests can inject faults and inspect the journal while a
//! device owns the SDK.

use super::axis::{AxisSimulator, Drive, cam_position};
use super::journal::{JournalEntry, SdkCall};
use crate::backend::BackendPolicy;
use crate::sdk::{IoBank, MotionSdk, OpenRequest, SdkResult, StatusCode};
use motion_common::config::DeviceConfig;
use motion_common::profile::ResolvedProfile;
use motion_common::types::{
    AnalogSample, AnalogWidth, AxisStatusBits, CommandMode, ECamTable, FaultFlags, SyncPair,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Simulation: axis servo is off.
pub const SIM_AXIS_DISABLED: i32 = 203;
/// Simulation: argument rejected by the controller.
pub const SIM_INVALID_ARGUMENT: i32 = 204;
/// Simulation: axis is alarmed.
pub const SIM_AXIS_ALARMED: i32 = 205;
/// Simulation: move refused at a limit, for backends without limit-stop codes.
pub const SIM_AT_LIMIT: i32 = 206;

/// Status codes the controller answers with, taken from the emulated
/// backend so its status table interprets them.
#[derive(Debug, Clone, Copy)]
struct SimCodes {
    not_connected: i32,
    positive_limit: i32,
    negative_limit: i32,
}

impl SimCodes {
    fn for_config(config: &DeviceConfig) -> Self {
        let table = BackendPolicy::of(config.backend).status;
        let limit = |i: usize| table.limit_stop_codes.get(i).copied().unwrap_or(SIM_AT_LIMIT);
        Self {
            not_connected: table.not_connected,
            positive_limit: limit(0),
            negative_limit: limit(1),
        }
    }
}

/// In-memory controller.
#[derive(Debug)]
struct SimState {
    codes: SimCodes,
    open: bool,
    communicating: bool,
    link_up: bool,
    axes: Vec<AxisSimulator>,
    inputs: Vec<bool>,
    outputs: Vec<bool>,
    analog_inputs: Vec<i64>,
    analog_outputs: Vec<i64>,
    cams: BTreeMap<u32, ECamTable>,
    buffers: BTreeSet<u32>,
    variables: HashMap<String, Vec<f64>>,
    journal: Vec<JournalEntry>,
    failures: VecDeque<(&'static str, i32)>,
    last_update: Instant,
}

impl SimState {
    fn new(config: &DeviceConfig) -> Self {
        Self {
            codes: SimCodes::for_config(config),
            open: false,
            communicating: false,
            link_up: true,
            axes: (0..config.axis_count).map(AxisSimulator::new).collect(),
            inputs: vec![false; config.digital_input_count as usize],
            outputs: vec![false; config.digital_output_count as usize],
            analog_inputs: vec![0; config.analog_input_count as usize],
            analog_outputs: vec![0; config.analog_output_count as usize],
            cams: BTreeMap::new(),
            buffers: BTreeSet::new(),
            variables: HashMap::new(),
            journal: Vec::new(),
            failures: VecDeque::new(),
            last_update: Instant::now(),
        }
    }

    /// Advance every axis to `now`: self-driven axes first, then followers.
    fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        if dt <= 0.0 {
            return;
        }
        let before: Vec<f64> = self.axes.iter().map(|a| a.command_position).collect();
        for axis in &mut self.axes {
            axis.advance(dt);
        }

        let positions: Vec<f64> = self.axes.iter().map(|a| a.command_position).collect();
        for axis in &mut self.axes {
            if !axis.servo_on || axis.is_alarmed() {
                continue;
            }
            match axis.drive {
                Drive::Gear {
                    master,
                    ratio,
                    master_origin,
                    slave_origin,
                    ..
                } => {
                    let master = master as usize;
                    if let (Some(&m0), Some(&m1)) = (before.get(master), positions.get(master)) {
                        let from = slave_origin + ratio * (m0 - master_origin);
                        let to = slave_origin + ratio * (m1 - master_origin);
                        axis.follow_gear(dt, from, to);
                    }
                }
                Drive::Cam { table_index } => {
                    let follow = self.cams.get(&table_index).and_then(|t| {
                        positions.get(t.master.as_usize()).map(|&m| {
                            cam_position(t.master_positions(), t.slave_positions(), m)
                        })
                    });
                    if let Some(position) = follow {
                        axis.follow(position);
                    }
                }
                _ => {}
            }
        }
    }

    /// Journal the call, then apply session gating and injected failures.
    fn enter(&mut self, call: SdkCall) -> SdkResult<()> {
        self.advance(Instant::now());
        let name = call.name();
        self.journal.push(JournalEntry {
            at: Instant::now(),
            call,
        });

        if !self.link_up {
            return Err(StatusCode(self.codes.not_connected));
        }
        if let Some(pos) = self.failures.iter().position(|(n, _)| *n == name) {
            if let Some((_, code)) = self.failures.remove(pos) {
                return Err(StatusCode(code));
            }
        }
        if name != "open" && !self.open {
            return Err(StatusCode(self.codes.not_connected));
        }
        Ok(())
    }

    fn axis(&mut self, axis: u32) -> SdkResult<&mut AxisSimulator> {
        self.axes
            .get_mut(axis as usize)
            .ok_or(StatusCode(SIM_INVALID_ARGUMENT))
    }

    /// Axis ready to accept a motion command.
    fn ready_axis(&mut self, axis: u32) -> SdkResult<&mut AxisSimulator> {
        let sim = self.axis(axis)?;
        if !sim.servo_on {
            return Err(StatusCode(SIM_AXIS_DISABLED));
        }
        if sim.is_alarmed() {
            return Err(StatusCode(SIM_AXIS_ALARMED));
        }
        Ok(sim)
    }

    fn bits(&mut self, bank: IoBank) -> &mut Vec<bool> {
        match bank {
            IoBank::Input => &mut self.inputs,
            IoBank::Output => &mut self.outputs,
        }
    }

    fn analog(&mut self, bank: IoBank) -> &mut Vec<i64> {
        match bank {
            IoBank::Input => &mut self.analog_inputs,
            IoBank::Output => &mut self.analog_outputs,
        }
    }
}

/// Refuse a move that heads into an active limit switch.
fn limit_check(codes: SimCodes, axis: &AxisSimulator, direction: f64) -> SdkResult<()> {
    if direction > 0.0 && axis.positive_limit {
        return Err(StatusCode(codes.positive_limit));
    }
    if direction < 0.0 && axis.negative_limit {
        return Err(StatusCode(codes.negative_limit));
    }
    Ok(())
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated vendor SDK.
#[derive(Debug, Clone)]
pub struct SimulatedSdk {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSdk {
    /// Controller sized from the device configuration.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(config))),
        }
    }

    /// Handle sharing this controller's state.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn with<T>(&self, call: SdkCall, f: impl FnOnce(&mut SimState) -> SdkResult<T>) -> SdkResult<T> {
        let mut state = lock(&self.state);
        state.enter(call)?;
        f(&mut state)
    }
}

impl MotionSdk for SimulatedSdk {
    fn open(&mut self, request: &OpenRequest<'_>) -> SdkResult<()> {
        let call = SdkCall::Open {
            install_dir: request.install_dir.map(Path::to_path_buf),
            host_ip: request.host_ip.map(str::to_string),
            host_port: request.host_port,
        };
        self.with(call, |st| {
            st.open = true;
            Ok(())
        })
    }

    fn set_device_name(&mut self, name: &str) -> SdkResult<()> {
        self.with(SdkCall::SetDeviceName(name.to_string()), |_| Ok(()))
    }

    fn load_init_file(&mut self, path: &Path) -> SdkResult<()> {
        self.with(SdkCall::LoadInitFile(path.to_path_buf()), |_| Ok(()))
    }

    fn load_parameter_file(&mut self, path: &Path) -> SdkResult<()> {
        self.with(SdkCall::LoadParameterFile(path.to_path_buf()), |_| Ok(()))
    }

    fn start_communication(&mut self, timeout: Duration) -> SdkResult<()> {
        self.with(SdkCall::StartCommunication(timeout), |st| {
            st.communicating = true;
            Ok(())
        })
    }

    fn stop_communication(&mut self) -> SdkResult<()> {
        self.with(SdkCall::StopCommunication, |st| {
            st.communicating = false;
            Ok(())
        })
    }

    fn close(&mut self) -> SdkResult<()> {
        self.with(SdkCall::Close, |st| {
            st.open = false;
            Ok(())
        })
    }

    fn set_servo(&mut self, axis: u32, on: bool) -> SdkResult<()> {
        self.with(SdkCall::SetServo { axis, on }, |st| {
            let sim = st.axis(axis)?;
            sim.servo_on = on;
            if !on {
                sim.halt();
            }
            Ok(())
        })
    }

    fn arm_fault_monitoring(&mut self, axis: u32) -> SdkResult<()> {
        self.with(SdkCall::ArmFaultMonitoring { axis }, |st| st.axis(axis).map(|_| ()))
    }

    fn status(&mut self, axis: u32) -> SdkResult<AxisStatusBits> {
        self.with(SdkCall::Status { axis }, |st| Ok(st.axis(axis)?.status()))
    }

    fn faults(&mut self, axis: u32) -> SdkResult<FaultFlags> {
        self.with(SdkCall::Faults { axis }, |st| {
            let sim = st.axis(axis)?;
            let mut faults = sim.faults;
            if sim.alarm || sim.latched_alarm {
                faults |= FaultFlags::DRIVE;
            }
            Ok(faults)
        })
    }

    fn set_alarm_reset(&mut self, axis: u32, asserted: bool) -> SdkResult<()> {
        self.with(SdkCall::SetAlarmReset { axis, asserted }, |st| {
            let sim = st.axis(axis)?;
            // Reset takes effect on the falling edge.
            if sim.reset_asserted && !asserted {
                sim.alarm = false;
                sim.faults = FaultFlags::empty();
            }
            sim.reset_asserted = asserted;
            Ok(())
        })
    }

    fn command_mode(&mut self, axis: u32) -> SdkResult<i32> {
        self.with(SdkCall::CommandMode { axis }, |st| Ok(st.axis(axis)?.mode_raw))
    }

    fn set_command_mode(&mut self, axis: u32, mode: CommandMode) -> SdkResult<()> {
        self.with(SdkCall::SetCommandMode { axis, mode }, |st| {
            let sim = st.axis(axis)?;
            sim.mode_raw = mode.raw();
            Ok(())
        })
    }

    fn start_position(&mut self, axis: u32, target: f64, profile: &ResolvedProfile) -> SdkResult<()> {
        let call = SdkCall::StartPosition {
            axis,
            target,
            profile: *profile,
        };
        self.with(call, |st| {
            let codes = st.codes;
            let sim = st.ready_axis(axis)?;
            limit_check(codes, sim, target - sim.command_position)?;
            sim.start_position(target, profile);
            Ok(())
        })
    }

    fn start_position_group(
        &mut self,
        targets: &[(u32, f64)],
        profile: &ResolvedProfile,
    ) -> SdkResult<()> {
        let call = SdkCall::StartPositionGroup {
            targets: targets.to_vec(),
            profile: *profile,
        };
        self.with(call, |st| {
            let codes = st.codes;
            for &(axis, target) in targets {
                let sim = st.ready_axis(axis)?;
                limit_check(codes, sim, target - sim.command_position)?;
            }
            for &(axis, target) in targets {
                st.axis(axis)?.start_position(target, profile);
            }
            Ok(())
        })
    }

    fn start_velocity(&mut self, axis: u32, profile: &ResolvedProfile) -> SdkResult<()> {
        let call = SdkCall::StartVelocity {
            axis,
            profile: *profile,
        };
        self.with(call, |st| {
            let codes = st.codes;
            let sim = st.ready_axis(axis)?;
            limit_check(codes, sim, profile.velocity)?;
            sim.start_velocity(profile);
            Ok(())
        })
    }

    fn start_torque(&mut self, axis: u32, torque: f64) -> SdkResult<()> {
        self.with(SdkCall::StartTorque { axis, torque }, |st| {
            st.ready_axis(axis)?.drive = Drive::Torque(torque);
            Ok(())
        })
    }

    fn stop_torque(&mut self, axis: u32) -> SdkResult<()> {
        self.with(SdkCall::StopTorque { axis }, |st| {
            st.axis(axis)?.halt();
            Ok(())
        })
    }

    fn stop_position(&mut self, axis: u32) -> SdkResult<()> {
        self.with(SdkCall::StopPosition { axis }, |st| {
            st.axis(axis)?.decelerate();
            Ok(())
        })
    }

    fn stop_velocity(&mut self, axis: u32) -> SdkResult<()> {
        self.with(SdkCall::StopVelocity { axis }, |st| {
            st.axis(axis)?.decelerate();
            Ok(())
        })
    }

    fn emergency_stop(&mut self, axis: u32) -> SdkResult<()> {
        self.with(SdkCall::EmergencyStop { axis }, |st| {
            st.axis(axis)?.halt();
            Ok(())
        })
    }

    fn set_command_position(&mut self, axis: u32, position: f64) -> SdkResult<()> {
        self.with(SdkCall::SetCommandPosition { axis, position }, |st| {
            st.axis(axis)?.set_command_position(position);
            Ok(())
        })
    }

    fn set_actual_position(&mut self, axis: u32, position: f64) -> SdkResult<()> {
        self.with(SdkCall::SetActualPosition { axis, position }, |st| {
            st.axis(axis)?.actual_position = position;
            Ok(())
        })
    }

    fn command_position(&mut self, axis: u32) -> SdkResult<f64> {
        self.with(SdkCall::CommandPosition { axis }, |st| {
            Ok(st.axis(axis)?.command_position)
        })
    }

    fn actual_position(&mut self, axis: u32) -> SdkResult<f64> {
        self.with(SdkCall::ActualPosition { axis }, |st| {
            Ok(st.axis(axis)?.actual_position)
        })
    }

    fn command_velocity(&mut self, axis: u32) -> SdkResult<f64> {
        self.with(SdkCall::CommandVelocity { axis }, |st| Ok(st.axis(axis)?.velocity))
    }

    fn actual_velocity(&mut self, axis: u32) -> SdkResult<f64> {
        self.with(SdkCall::ActualVelocity { axis }, |st| Ok(st.axis(axis)?.velocity))
    }

    fn search_z_phase(
        &mut self,
        axis: u32,
        velocity: f64,
        acceleration: f64,
        distance: f64,
    ) -> SdkResult<()> {
        let call = SdkCall::SearchZPhase {
            axis,
            velocity,
            acceleration,
            distance,
        };
        self.with(call, |st| {
            let codes = st.codes;
            let sim = st.ready_axis(axis)?;
            let direction = velocity.signum() * distance.signum();
            limit_check(codes, sim, direction)?;
            // The index pulse is found at the end of the search span.
            let target = sim.command_position + direction * distance.abs();
            sim.drive = Drive::Position {
                target,
                speed: velocity.abs(),
                acceleration,
                deceleration: acceleration,
            };
            Ok(())
        })
    }

    fn start_ecam(&mut self, table: &ECamTable) -> SdkResult<()> {
        let call = SdkCall::StartECam {
            table_index: table.table_index,
            master: table.master.index(),
            slave: table.slave.index(),
            points: table.len(),
        };
        self.with(call, |st| {
            st.axis(table.master.index())?;
            st.ready_axis(table.slave.index())?.drive = Drive::Cam {
                table_index: table.table_index,
            };
            st.cams.insert(table.table_index, table.clone());
            Ok(())
        })
    }

    fn stop_ecam(&mut self, table_index: u32) -> SdkResult<()> {
        self.with(SdkCall::StopECam { table_index }, |st| {
            if let Some(table) = st.cams.remove(&table_index) {
                st.axis(table.slave.index())?.halt();
            }
            Ok(())
        })
    }

    fn ecam_enabled(&mut self, table_index: u32) -> SdkResult<bool> {
        self.with(SdkCall::ECamEnabled { table_index }, |st| {
            Ok(st.cams.contains_key(&table_index))
        })
    }

    fn start_gear(&mut self, pair: &SyncPair, ramp: &ResolvedProfile) -> SdkResult<()> {
        let master = pair.master.index();
        let slave = pair.slave.index();
        let call = SdkCall::StartGear {
            master,
            slave,
            ratio: pair.gear_ratio,
            ramp: *ramp,
        };
        self.with(call, |st| {
            let master_origin = st.axis(master)?.command_position;
            let sim = st.ready_axis(slave)?;
            sim.drive = Drive::Gear {
                master,
                ratio: pair.gear_ratio,
                master_origin,
                slave_origin: sim.command_position,
                acceleration: ramp.acceleration,
                locked: false,
            };
            Ok(())
        })
    }

    fn stop_gear(&mut self, slave: u32) -> SdkResult<()> {
        self.with(SdkCall::StopGear { slave }, |st| {
            let sim = st.axis(slave)?;
            if matches!(sim.drive, Drive::Gear { .. }) {
                sim.halt();
            }
            Ok(())
        })
    }

    fn read_io(&mut self, bank: IoBank, container: u32, width: u32) -> SdkResult<u32> {
        self.with(SdkCall::ReadIo { bank, container, width }, |st| {
            let bits = st.bits(bank);
            let first = (container * width) as usize;
            if first >= bits.len() {
                return Err(StatusCode(SIM_INVALID_ARGUMENT));
            }
            let value = bits
                .iter()
                .skip(first)
                .take(width as usize)
                .enumerate()
                .fold(0u32, |acc, (i, &on)| if on { acc | (1 << i) } else { acc });
            Ok(value)
        })
    }

    fn write_io(&mut self, bank: IoBank, container: u32, width: u32, value: u32) -> SdkResult<()> {
        self.with(SdkCall::WriteIo { bank, container, width, value }, |st| {
            let bits = st.bits(bank);
            let first = (container * width) as usize;
            if first >= bits.len() {
                return Err(StatusCode(SIM_INVALID_ARGUMENT));
            }
            for (i, bit) in bits.iter_mut().skip(first).take(width as usize).enumerate() {
                *bit = value & (1 << i) != 0;
            }
            Ok(())
        })
    }

    fn read_analog(&mut self, bank: IoBank, port: u32, width: AnalogWidth) -> SdkResult<i64> {
        self.with(SdkCall::ReadAnalog { bank, port, width }, |st| {
            st.analog(bank)
                .get(port as usize)
                .copied()
                .ok_or(StatusCode(SIM_INVALID_ARGUMENT))
        })
    }

    fn write_analog(&mut self, port: u32, sample: AnalogSample) -> SdkResult<()> {
        self.with(SdkCall::WriteAnalog { port, sample }, |st| {
            let slot = st
                .analog_outputs
                .get_mut(port as usize)
                .ok_or(StatusCode(SIM_INVALID_ARGUMENT))?;
            *slot = sample.raw();
            Ok(())
        })
    }

    fn run_buffer(&mut self, buffer: u32, label: Option<&str>) -> SdkResult<()> {
        let call = SdkCall::RunBuffer {
            buffer,
            label: label.map(str::to_string),
        };
        self.with(call, |st| {
            st.buffers.insert(buffer);
            Ok(())
        })
    }

    fn stop_buffer(&mut self, buffer: u32) -> SdkResult<()> {
        self.with(SdkCall::StopBuffer { buffer }, |st| {
            st.buffers.remove(&buffer);
            Ok(())
        })
    }

    fn read_variable(&mut self, name: &str, range: Option<(u32, u32)>) -> SdkResult<Vec<f64>> {
        let call = SdkCall::ReadVariable {
            name: name.to_string(),
            range,
        };
        self.with(call, |st| {
            let values = st
                .variables
                .get(name)
                .ok_or(StatusCode(SIM_INVALID_ARGUMENT))?;
            match range {
                None => Ok(values.clone()),
                Some((first, last)) => values
                    .get(first as usize..=last as usize)
                    .map(<[f64]>::to_vec)
                    .ok_or(StatusCode(SIM_INVALID_ARGUMENT)),
            }
        })
    }

    fn write_variable(
        &mut self,
        name: &str,
        range: Option<(u32, u32)>,
        values: &[f64],
    ) -> SdkResult<()> {
        let call = SdkCall::WriteVariable {
            name: name.to_string(),
            range,
            values: values.to_vec(),
        };
        self.with(call, |st| {
            let stored = st.variables.entry(name.to_string()).or_default();
            match range {
                None => *stored = values.to_vec(),
                Some((first, last)) => {
                    if last < first || values.len() != (last - first + 1) as usize {
                        return Err(StatusCode(SIM_INVALID_ARGUMENT));
                    }
                    if stored.len() <= last as usize {
                        stored.resize(last as usize + 1, 0.0);
                    }
                    stored[first as usize..=last as usize].copy_from_slice(values);
                }
            }
            Ok(())
        })
    }

    fn describe(&self, code: StatusCode) -> String {
        let codes = lock(&self.state).codes;
        match code.0 {
            0 => "success".to_string(),
            c if c == codes.not_connected => "simulated controller not connected".to_string(),
            c if c == codes.positive_limit => "stopped by positive limit".to_string(),
            c if c == codes.negative_limit => "stopped by negative limit".to_string(),
            SIM_AT_LIMIT => "axis at limit".to_string(),
            SIM_AXIS_DISABLED => "axis servo is off".to_string(),
            SIM_INVALID_ARGUMENT => "invalid argument".to_string(),
            SIM_AXIS_ALARMED => "axis is alarmed".to_string(),
            other => format!("simulated failure {other}"),
        }
    }
}

/// Test and CLI access to a simulated controller.
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    fn state(&self) -> MutexGuard<'_, SimState> {
        let mut state = lock(&self.state);
        state.advance(Instant::now());
        state
    }

    fn update_axis(&self, axis: u32, f: impl FnOnce(&mut AxisSimulator)) {
        if let Some(sim) = self.state().axes.get_mut(axis as usize) {
            f(sim);
        }
    }

    // ─── Journal ────────────────────────────────────────────────────

    /// Every call received so far.
    pub fn journal(&self) -> Vec<JournalEntry> {
        lock(&self.state).journal.clone()
    }

    /// Calls received so far, without timestamps.
    pub fn calls(&self) -> Vec<SdkCall> {
        lock(&self.state)
            .journal
            .iter()
            .map(|e| e.call.clone())
            .collect()
    }

    /// Calls that change controller state.
    pub fn commands(&self) -> Vec<SdkCall> {
        self.calls().into_iter().filter(|c| !c.is_query()).collect()
    }

    /// Number of calls with the given name.
    pub fn count(&self, name: &str) -> usize {
        lock(&self.state)
            .journal
            .iter()
            .filter(|e| e.call.name() == name)
            .count()
    }

    /// Forget the journal.
    pub fn clear_journal(&self) {
        lock(&self.state).journal.clear();
    }

    // ─── Fault injection ────────────────────────────────────────────

    /// Fail the next call named `name` with `code`.
    pub fn fail_next(&self, name: &'static str, code: i32) {
        lock(&self.state).failures.push_back((name, code));
    }

    /// Drop or restore the link; while down every call reports not connected.
    pub fn set_link(&self, up: bool) {
        lock(&self.state).link_up = up;
    }

    /// Raise an alarm that a reset pulse clears.
    pub fn raise_alarm(&self, axis: u32) {
        self.update_axis(axis, |sim| sim.alarm = true);
    }

    /// Raise an alarm that survives reset pulses.
    pub fn latch_alarm(&self, axis: u32) {
        self.update_axis(axis, |sim| sim.latched_alarm = true);
    }

    /// Overwrite the latched fault word.
    pub fn set_faults(&self, axis: u32, faults: FaultFlags) {
        self.update_axis(axis, |sim| sim.faults = faults);
    }

    /// Keep reporting MOVING regardless of kinematics.
    pub fn hold_moving(&self, axis: u32, hold: bool) {
        self.update_axis(axis, |sim| sim.hold_moving = hold);
    }

    /// Force a raw command mode, including values no mode maps to.
    pub fn set_raw_mode(&self, axis: u32, raw: i32) {
        self.update_axis(axis, |sim| sim.mode_raw = raw);
    }

    /// Set limit switch states.
    pub fn set_limits(&self, axis: u32, negative: bool, positive: bool) {
        self.update_axis(axis, |sim| {
            sim.negative_limit = negative;
            sim.positive_limit = positive;
        });
    }

    /// Drive a digital input.
    pub fn set_input(&self, channel: u32, value: bool) {
        if let Some(bit) = self.state().inputs.get_mut(channel as usize) {
            *bit = value;
        }
    }

    /// Drive an analog input.
    pub fn set_analog_input(&self, port: u32, raw: i64) {
        if let Some(slot) = self.state().analog_inputs.get_mut(port as usize) {
            *slot = raw;
        }
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Session open.
    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// Cyclic communication running.
    pub fn is_communicating(&self) -> bool {
        lock(&self.state).communicating
    }

    /// Digital output state.
    pub fn output(&self, channel: u32) -> Option<bool> {
        lock(&self.state).outputs.get(channel as usize).copied()
    }

    /// Raw analog output value.
    pub fn analog_output(&self, port: u32) -> Option<i64> {
        lock(&self.state).analog_outputs.get(port as usize).copied()
    }

    /// Commanded position after advancing to now.
    pub fn position(&self, axis: u32) -> Option<f64> {
        self.state().axes.get(axis as usize).map(|a| a.command_position)
    }

    /// Raw command mode.
    pub fn raw_mode(&self, axis: u32) -> Option<i32> {
        lock(&self.state).axes.get(axis as usize).map(|a| a.mode_raw)
    }

    /// Running program buffers.
    pub fn running_buffers(&self) -> Vec<u32> {
        lock(&self.state).buffers.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{COMIZOA_NOT_CONNECTED, COMIZOA_STOP_BY_ELP, SIM_NOT_CONNECTED};
    use motion_common::config::BackendKind;
    use motion_common::profile::MotionProfile;

    fn config(backend: BackendKind) -> DeviceConfig {
        DeviceConfig {
            backend,
            axis_count: 2,
            digital_output_count: 16,
            ..DeviceConfig::default()
        }
    }

    fn opened(backend: BackendKind) -> SimulatedSdk {
        let mut sdk = SimulatedSdk::new(&config(backend));
        sdk.open(&OpenRequest::default()).unwrap();
        sdk
    }

    #[test]
    fn calls_before_open_are_not_connected() {
        let mut sdk = SimulatedSdk::new(&config(BackendKind::Simulation));
        assert_eq!(sdk.status(0), Err(StatusCode(SIM_NOT_CONNECTED)));
        let mut sdk = SimulatedSdk::new(&config(BackendKind::Comizoa));
        assert_eq!(sdk.set_servo(0, true), Err(StatusCode(COMIZOA_NOT_CONNECTED)));
        assert_eq!(sdk.handle().count("set_servo"), 1);
    }

    #[test]
    fn limit_codes_follow_emulated_backend() {
        let mut sdk = opened(BackendKind::Comizoa);
        sdk.set_servo(0, true).unwrap();
        sdk.handle().set_limits(0, false, true);
        let profile = MotionProfile::trapezoidal(10.0, 100.0, 100.0).resolve().unwrap();
        assert_eq!(
            sdk.start_position(0, 1.0, &profile),
            Err(StatusCode(COMIZOA_STOP_BY_ELP))
        );
        assert_eq!(sdk.describe(StatusCode(COMIZOA_STOP_BY_ELP)), "stopped by positive limit");
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut sdk = opened(BackendKind::Simulation);
        sdk.handle().fail_next("command_position", 31);
        assert_eq!(sdk.command_position(0), Err(StatusCode(31)));
        assert_eq!(sdk.command_position(0), Ok(0.0));
    }

    #[test]
    fn io_words_pack_flat_bits() {
        let mut sdk = opened(BackendKind::Simulation);
        sdk.write_io(IoBank::Output, 0, 8, 0b1000_0001).unwrap();
        assert_eq!(sdk.read_io(IoBank::Output, 0, 16), Ok(0b1000_0001));
        assert_eq!(sdk.read_io(IoBank::Output, 1, 8), Ok(0));
        assert_eq!(
            sdk.read_io(IoBank::Output, 2, 8),
            Err(StatusCode(SIM_INVALID_ARGUMENT))
        );
        assert_eq!(sdk.handle().output(7), Some(true));
    }

    #[test]
    fn variable_range_must_match_values() {
        let mut sdk = opened(BackendKind::Simulation);
        sdk.write_variable("v", Some((2, 3)), &[1.0, 2.0]).unwrap();
        assert_eq!(sdk.read_variable("v", None), Ok(vec![0.0, 0.0, 1.0, 2.0]));
        assert!(sdk.write_variable("v", Some((0, 1)), &[1.0]).is_err());
    }

    #[test]
    fn disabled_servo_refuses_motion() {
        let mut sdk = opened(BackendKind::Simulation);
        let profile = MotionProfile::trapezoidal(10.0, 100.0, 100.0).resolve().unwrap();
        assert_eq!(
            sdk.start_position(1, 1.0, &profile),
            Err(StatusCode(SIM_AXIS_DISABLED))
        );
    }
}
