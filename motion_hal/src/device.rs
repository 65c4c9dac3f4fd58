//! Generic motion device over a vendor SDK.
//!
//! [`MotionDevice`] implements every capability trait once, for any
//! [`MotionSdk`], and lets the backend's [`BackendPolicy`] decide what is
//! supported and how it is issued. Every operation follows the same order:
//!
//! 1. session liveness and channel range checks
//! 2. capability check (`NotSupported`)
//! 3. parameter validation (profiles, tables, ratios)
//! 4. command-mode transition
//! 5. the vendor call, mapped through the backend's status table
//!
//! Steps 1-3 never reach the SDK, so rejected input leaves no trace on the
//! controller.

use crate::alarm::AlarmReset;
use crate::backend::{AlarmSource, BackendPolicy, EStopBehavior, MotionFeatures, SCurveSupport};
use crate::mode::{CommandModeTracker, ModeTransition, StopAction};
use crate::sdk::{IoBank, MotionSdk};
use crate::session::Session;
use crate::sync::SyncRegistry;
use crate::wait::WaitPolicy;
use motion_common::channel::Channel;
use motion_common::config::{AlarmResetPolicy, DeviceConfig};
use motion_common::device::{
    AnalogIoCapable, Capabilities, Device, DigitalIoCapable, MotionCapable, UserMemoryCapable,
};
use motion_common::error::{MotionError, MotionResult};
use motion_common::profile::{MotionProfile, ProfileKind, ResolvedProfile};
use motion_common::types::{
    AnalogSample, AnalogWidth, AxisStatusBits, CommandMode, ECamTable, FaultFlags, SyncPair,
};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, info, trace};

/// One controller behind one vendor session.
pub struct MotionDevice<S: MotionSdk> {
    session: Session<S>,
    policy: BackendPolicy,
    axis_count: usize,
    digital_input_count: usize,
    digital_output_count: usize,
    analog_input_count: usize,
    analog_output_count: usize,
    modes: CommandModeTracker,
    sync: SyncRegistry,
    wait: WaitPolicy,
    alarm: AlarmReset,
}

impl<S: MotionSdk> MotionDevice<S> {
    /// Validate the configuration, resolve the backend policy and open the
    /// vendor session.
    ///
    /// # Errors
    ///
    /// [`MotionError::InvalidParameter`] for an invalid configuration, or
    /// [`MotionError::Init`] naming the failed session step.
    pub fn open(sdk: S, config: &DeviceConfig) -> MotionResult<Self> {
        config.validate()?;
        let policy = BackendPolicy::of(config.backend).with_bits_per_slot(config.bits_per_slot)?;
        info!(
            backend = policy.name(),
            driver = %config.driver,
            axes = config.axis_count,
            io_layout = ?policy.io_layout,
            "Opening motion device"
        );

        let session = Session::open(sdk, config, policy.status)?;
        let axis_count = config.axis_count as usize;
        Ok(Self {
            session,
            policy,
            axis_count,
            digital_input_count: config.digital_input_count as usize,
            digital_output_count: config.digital_output_count as usize,
            analog_input_count: config.analog_input_count as usize,
            analog_output_count: config.analog_output_count as usize,
            modes: CommandModeTracker::new(axis_count),
            sync: SyncRegistry::new(),
            wait: WaitPolicy::from(&config.wait),
            alarm: AlarmReset::from(&config.alarm),
        })
    }

    /// Active backend policy.
    pub fn policy(&self) -> &BackendPolicy {
        &self.policy
    }

    /// Active synchronization bindings.
    pub fn sync_registry(&self) -> &SyncRegistry {
        &self.sync
    }

    /// Wait settings.
    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait
    }

    /// Vendor SDK handle.
    pub fn sdk(&self) -> &S {
        self.session.sdk()
    }

    // ─── Guards ─────────────────────────────────────────────────────

    fn live(&self) -> MotionResult<()> {
        if self.session.is_open() {
            Ok(())
        } else {
            Err(MotionError::Connection(format!(
                "{} device has been shut down",
                self.policy.name()
            )))
        }
    }

    fn axis(&self, channel: Channel) -> MotionResult<Channel> {
        self.live()?;
        channel.check(self.axis_count, "axis")
    }

    fn io(&self, channel: Channel, count: usize, kind: &str) -> MotionResult<Channel> {
        self.live()?;
        channel.check(count, kind)
    }

    fn require(&self, feature: MotionFeatures, operation: &'static str) -> MotionResult<()> {
        if self.policy.supports(feature) {
            Ok(())
        } else {
            Err(self.unsupported(operation))
        }
    }

    fn require_capability(&self, set: Capabilities, operation: &'static str) -> MotionResult<()> {
        if self.policy.capabilities.contains(set) {
            Ok(())
        } else {
            Err(self.unsupported(operation))
        }
    }

    fn unsupported(&self, operation: &'static str) -> MotionError {
        MotionError::NotSupported {
            operation,
            backend: self.policy.name(),
        }
    }

    // ─── Command mode ───────────────────────────────────────────────

    /// Bring `channel` into `mode`, issuing the switch only when needed.
    ///
    /// Backends without command modes select the quantity through the
    /// primitive itself, so this is a no-op for them.
    fn ensure_mode(&mut self, channel: Channel, mode: CommandMode) -> MotionResult<()> {
        if !self.policy.supports(MotionFeatures::COMMAND_MODE) || self.modes.is_current(channel, mode)
        {
            return Ok(());
        }

        let axis = channel.index();
        let raw = self.session.call(Some(channel), |sdk| sdk.command_mode(axis))?;
        match CommandModeTracker::plan(raw, mode) {
            ModeTransition::Unchanged => {
                trace!(%channel, %mode, "Command mode already set");
            }
            ModeTransition::Switch { from, to } => {
                self.session
                    .call(Some(channel), |sdk| sdk.set_command_mode(axis, to))?;
                info!(%channel, ?from, %to, "Command mode switched");
            }
        }
        self.modes.record(channel, mode);
        Ok(())
    }

    /// Mode-dispatched deceleration stop.
    fn stop_by_mode(&mut self, channel: Channel) -> MotionResult<()> {
        let axis = channel.index();
        let action = if self.policy.supports(MotionFeatures::COMMAND_MODE) {
            let raw = self.session.call(Some(channel), |sdk| sdk.command_mode(axis))?;
            match StopAction::for_raw_mode(channel, raw) {
                Ok(action) => action,
                Err(e) => {
                    self.modes.forget(channel);
                    return Err(e);
                }
            }
        } else {
            StopAction::Position
        };

        debug!(%channel, ?action, "Stop");
        match action {
            StopAction::Position => self.session.call(Some(channel), |sdk| sdk.stop_position(axis)),
            StopAction::Velocity => self.session.call(Some(channel), |sdk| sdk.stop_velocity(axis)),
            StopAction::Torque => self.session.call(Some(channel), |sdk| sdk.stop_torque(axis)),
        }
    }

    // ─── Profiles ───────────────────────────────────────────────────

    /// Resolve a point-to-point profile of the expected kind, applying the
    /// backend's S-curve policy.
    fn resolve_point_profile(
        &self,
        profile: &MotionProfile,
        kind: ProfileKind,
        operation: &'static str,
    ) -> MotionResult<ResolvedProfile> {
        expect_kind(profile, kind, operation)?;
        let resolved = profile.resolve()?;
        match (kind, self.policy.s_curve) {
            (ProfileKind::JerkRatioSCurve, SCurveSupport::Trapezoidal) => {
                debug!(backend = self.policy.name(), "S-curve issued as trapezoid");
                profile.as_trapezoidal().resolve()
            }
            _ => Ok(resolved),
        }
    }

    fn move_single(
        &mut self,
        channel: Channel,
        position: f64,
        profile: &MotionProfile,
        kind: ProfileKind,
        operation: &'static str,
    ) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        finite("position", position)?;
        let resolved = self.resolve_point_profile(profile, kind, operation)?;
        self.ensure_mode(channel, CommandMode::Position)?;

        debug!(
            %channel,
            position,
            velocity = resolved.speed,
            accel_jerk = resolved.accel_jerk,
            decel_jerk = resolved.decel_jerk,
            "{operation}"
        );
        let axis = channel.index();
        self.session
            .call_motion(Some(channel), |sdk| sdk.start_position(axis, position, &resolved))?;
        Ok(())
    }

    fn move_group(
        &mut self,
        targets: &[(Channel, f64)],
        profile: &MotionProfile,
        kind: ProfileKind,
        operation: &'static str,
    ) -> MotionResult<()> {
        self.live()?;
        self.require(MotionFeatures::GROUP_MOVE, operation)?;
        if targets.is_empty() {
            return Err(MotionError::invalid(format!("{operation} needs at least one axis")));
        }
        let mut seen = HashSet::with_capacity(targets.len());
        let mut raw_targets = Vec::with_capacity(targets.len());
        for &(channel, position) in targets {
            let channel = self.axis(channel)?;
            finite("position", position)?;
            if !seen.insert(channel) {
                return Err(MotionError::invalid(format!(
                    "{operation}: axis {channel} listed twice"
                )));
            }
            raw_targets.push((channel.index(), position));
        }
        let resolved = self.resolve_point_profile(profile, kind, operation)?;

        for &(channel, _) in targets {
            self.ensure_mode(channel, CommandMode::Position)?;
        }

        debug!(axes = targets.len(), velocity = resolved.speed, "{operation}");
        self.session
            .call_motion(None, |sdk| sdk.start_position_group(&raw_targets, &resolved))?;
        Ok(())
    }

    fn status_bits(&mut self, channel: Channel) -> MotionResult<AxisStatusBits> {
        let axis = channel.index();
        self.session.call(Some(channel), |sdk| sdk.status(axis))
    }
}

fn expect_kind(
    profile: &MotionProfile,
    kind: ProfileKind,
    operation: &'static str,
) -> MotionResult<()> {
    if profile.kind == kind {
        Ok(())
    } else {
        Err(MotionError::invalid(format!(
            "{operation} needs a {kind:?} profile, got {:?}",
            profile.kind
        )))
    }
}

fn finite(name: &str, value: f64) -> MotionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MotionError::invalid(format!("{name} must be finite (got {value})")))
    }
}

fn variable_range(range: Option<RangeInclusive<u32>>) -> MotionResult<Option<(u32, u32)>> {
    match range {
        None => Ok(None),
        Some(r) if r.is_empty() => Err(MotionError::invalid(format!(
            "variable range {}..={} is empty",
            r.start(),
            r.end()
        ))),
        Some(r) => Ok(Some((*r.start(), *r.end()))),
    }
}

impl<S: MotionSdk> Device for MotionDevice<S> {
    fn name(&self) -> &'static str {
        self.policy.name()
    }

    fn capabilities(&self) -> Capabilities {
        self.policy.capabilities
    }

    fn shutdown(&mut self) -> MotionResult<()> {
        info!(backend = self.policy.name(), "Shutting down motion device");
        self.session.close()
    }
}

impl<S: MotionSdk> MotionCapable for MotionDevice<S> {
    fn enable(&mut self, channel: Channel, on: bool) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        let axis = channel.index();
        self.session.call(Some(channel), |sdk| sdk.set_servo(axis, on))?;
        if on {
            self.session
                .call(Some(channel), |sdk| sdk.arm_fault_monitoring(axis))?;
        } else if let Some(pair) = self.sync.release_gear(channel) {
            debug!(%channel, master = %pair.master, "Gear pair dropped with servo off");
        }
        info!(%channel, on, "Servo");
        Ok(())
    }

    fn is_enabled(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.axis(channel)?;
        Ok(self.status_bits(channel)?.contains(AxisStatusBits::SERVO_ON))
    }

    fn is_alarmed(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.axis(channel)?;
        let axis = channel.index();
        let source = self.policy.alarm_source;
        let (status, faults) = match source {
            AlarmSource::StatusBit => (self.status_bits(channel)?, FaultFlags::empty()),
            AlarmSource::FaultLatch => (
                AxisStatusBits::empty(),
                self.session.call(Some(channel), |sdk| sdk.faults(axis))?,
            ),
        };
        Ok(source.is_alarmed(status, faults))
    }

    fn clear_alarm(&mut self, channel: Channel) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        let reset = self.alarm;
        if reset.policy == AlarmResetPolicy::SkipIfNotAlarmed && !self.is_alarmed(channel)? {
            debug!(%channel, "Not alarmed, reset skipped");
            return Ok(());
        }

        let axis = channel.index();
        let session = &mut self.session;
        reset.pulse(|asserted| {
            trace!(%channel, asserted, "Alarm reset line");
            session.call(Some(channel), |sdk| sdk.set_alarm_reset(axis, asserted))
        })?;
        if self.policy.alarm_source.reads_faults() {
            self.session
                .call(Some(channel), |sdk| sdk.arm_fault_monitoring(axis))?;
        }
        info!(%channel, debounce = ?reset.debounce, "Alarm reset pulsed");
        Ok(())
    }

    fn trapezoidal_move(
        &mut self,
        channel: Channel,
        position: f64,
        profile: &MotionProfile,
    ) -> MotionResult<()> {
        self.move_single(channel, position, profile, ProfileKind::Trapezoidal, "TrapezoidalMove")
    }

    fn jerk_ratio_s_curve_move(
        &mut self,
        channel: Channel,
        position: f64,
        profile: &MotionProfile,
    ) -> MotionResult<()> {
        self.move_single(
            channel,
            position,
            profile,
            ProfileKind::JerkRatioSCurve,
            "JerkRatioSCurveMove",
        )
    }

    fn trapezoidal_move_group(
        &mut self,
        targets: &[(Channel, f64)],
        profile: &MotionProfile,
    ) -> MotionResult<()> {
        self.move_group(targets, profile, ProfileKind::Trapezoidal, "TrapezoidalMoveGroup")
    }

    fn jerk_ratio_s_curve_move_group(
        &mut self,
        targets: &[(Channel, f64)],
        profile: &MotionProfile,
    ) -> MotionResult<()> {
        self.move_group(
            targets,
            profile,
            ProfileKind::JerkRatioSCurve,
            "JerkRatioSCurveMoveGroup",
        )
    }

    fn velocity_move(&mut self, channel: Channel, profile: &MotionProfile) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        expect_kind(profile, ProfileKind::VelocityJog, "VelocityMove")?;
        let resolved = profile.resolve()?;
        self.ensure_mode(channel, CommandMode::Velocity)?;

        debug!(%channel, velocity = resolved.velocity, accel_jerk = resolved.accel_jerk, "VelocityMove");
        let axis = channel.index();
        self.session
            .call_motion(Some(channel), |sdk| sdk.start_velocity(axis, &resolved))?;
        Ok(())
    }

    fn stop(&mut self, channel: Channel) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        self.stop_by_mode(channel)
    }

    fn estop(&mut self, channel: Channel) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        match self.policy.estop {
            EStopBehavior::SameAsStop => self.stop_by_mode(channel),
            EStopBehavior::Immediate => {
                info!(%channel, "Emergency stop");
                let axis = channel.index();
                self.session.call(Some(channel), |sdk| sdk.emergency_stop(axis))
            }
        }
    }

    fn wait(&mut self, channel: Channel) -> MotionResult<()> {
        let timeout = self.wait.default_timeout;
        self.wait_timeout(channel, timeout)
    }

    fn wait_timeout(&mut self, channel: Channel, timeout: Duration) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        let policy = self.wait;
        policy.poll_until_idle(channel, timeout, || self.is_moving(channel))
    }

    fn is_moving(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.axis(channel)?;
        let axis = channel.index();
        let status = self
            .session
            .call_motion(Some(channel), |sdk| sdk.status(axis))?;
        // A limit-stop report means the axis has come to rest.
        Ok(status.is_some_and(|bits| bits.contains(AxisStatusBits::MOVING)))
    }

    fn set_command_position(&mut self, channel: Channel, position: f64) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        finite("position", position)?;
        self.ensure_mode(channel, CommandMode::Position)?;
        let axis = channel.index();
        self.session
            .call(Some(channel), |sdk| sdk.set_command_position(axis, position))
    }

    fn set_actual_position(&mut self, channel: Channel, position: f64) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        finite("position", position)?;
        self.ensure_mode(channel, CommandMode::Position)?;
        let axis = channel.index();
        self.session
            .call(Some(channel), |sdk| sdk.set_actual_position(axis, position))
    }

    fn command_position(&mut self, channel: Channel) -> MotionResult<f64> {
        let channel = self.axis(channel)?;
        let axis = channel.index();
        self.session.call(Some(channel), |sdk| sdk.command_position(axis))
    }

    fn actual_position(&mut self, channel: Channel) -> MotionResult<f64> {
        let channel = self.axis(channel)?;
        let axis = channel.index();
        self.session.call(Some(channel), |sdk| sdk.actual_position(axis))
    }

    fn command_velocity(&mut self, channel: Channel) -> MotionResult<f64> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::VELOCITY_READBACK, "GetCommandVelocity")?;
        let axis = channel.index();
        self.session.call(Some(channel), |sdk| sdk.command_velocity(axis))
    }

    fn actual_velocity(&mut self, channel: Channel) -> MotionResult<f64> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::VELOCITY_READBACK, "GetActualVelocity")?;
        let axis = channel.index();
        self.session.call(Some(channel), |sdk| sdk.actual_velocity(axis))
    }

    fn home_sensor(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::SENSORS, "GetHomeSensor")?;
        Ok(self.status_bits(channel)?.contains(AxisStatusBits::HOME))
    }

    fn negative_limit_sensor(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::SENSORS, "GetNegativeLimitSensor")?;
        Ok(self.status_bits(channel)?.contains(AxisStatusBits::NEGATIVE_LIMIT))
    }

    fn positive_limit_sensor(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::SENSORS, "GetPositiveLimitSensor")?;
        Ok(self.status_bits(channel)?.contains(AxisStatusBits::POSITIVE_LIMIT))
    }

    fn command_mode(&mut self, channel: Channel) -> MotionResult<CommandMode> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::COMMAND_MODE, "GetCommandMode")?;
        let axis = channel.index();
        let raw = self.session.call(Some(channel), |sdk| sdk.command_mode(axis))?;
        match CommandMode::from_raw(raw) {
            Some(mode) => {
                self.modes.record(channel, mode);
                Ok(mode)
            }
            None => {
                self.modes.forget(channel);
                Err(MotionError::InvalidState(format!(
                    "axis {channel} reports unknown command mode {raw}"
                )))
            }
        }
    }

    fn set_command_mode(&mut self, channel: Channel, mode: CommandMode) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::COMMAND_MODE, "SetCommandMode")?;
        self.ensure_mode(channel, mode)
    }

    fn set_torque(&mut self, channel: Channel, torque: f64) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::TORQUE, "SetTorque")?;
        finite("torque", torque)?;
        self.ensure_mode(channel, CommandMode::Torque)?;

        let axis = channel.index();
        if torque == 0.0 {
            debug!(%channel, "Torque command released");
            self.session.call(Some(channel), |sdk| sdk.stop_torque(axis))
        } else {
            debug!(%channel, torque, "Torque command");
            self.session
                .call(Some(channel), |sdk| sdk.start_torque(axis, torque))
        }
    }

    fn start_ecam(
        &mut self,
        table_index: u32,
        master: Channel,
        slave: Channel,
        master_positions: &[f64],
        slave_positions: &[f64],
    ) -> MotionResult<()> {
        let master = self.axis(master)?;
        let slave = self.axis(slave)?;
        self.require(MotionFeatures::ECAM, "StartECam")?;
        let table = ECamTable::new(table_index, master, slave, master_positions, slave_positions)?;
        self.sync.ensure_ecam_free(table_index)?;
        self.sync.ensure_cam_slave_free(slave)?;

        self.session.call(Some(slave), |sdk| sdk.start_ecam(&table))?;
        info!(table_index, %master, %slave, points = table.len(), "Cam engaged");
        self.sync.record_ecam(table);
        Ok(())
    }

    fn stop_ecam(&mut self, table_index: u32) -> MotionResult<()> {
        self.live()?;
        self.require(MotionFeatures::ECAM, "StopECam")?;
        let slave = self.sync.ecam(table_index).map(|t| t.slave);
        self.session.call(slave, |sdk| sdk.stop_ecam(table_index))?;
        if self.sync.remove_ecam(table_index).is_none() {
            debug!(table_index, "Stopped a cam table this device did not start");
        }
        info!(table_index, "Cam released");
        Ok(())
    }

    fn is_ecam_enabled(&mut self, table_index: u32) -> MotionResult<bool> {
        self.live()?;
        self.require(MotionFeatures::ECAM, "IsECamEnabled")?;
        self.session.call(None, |sdk| sdk.ecam_enabled(table_index))
    }

    fn set_sync_gear_ratio(
        &mut self,
        master: Channel,
        slave: Channel,
        ratio: f64,
        ramp: &MotionProfile,
    ) -> MotionResult<()> {
        let master = self.axis(master)?;
        let slave = self.axis(slave)?;
        self.require(MotionFeatures::GEAR, "SetSyncGearRatio")?;
        let pair = SyncPair {
            master,
            slave,
            gear_ratio: ratio,
            ramp: *ramp,
        };
        pair.validate()?;
        let resolved = ramp.resolve()?;
        self.sync.ensure_gear_slave_free(slave, master)?;
        self.ensure_mode(slave, CommandMode::Position)?;

        self.session
            .call(Some(slave), |sdk| sdk.start_gear(&pair, &resolved))?;
        match self.sync.record_gear(pair) {
            Some(old) => info!(%master, %slave, from = old.gear_ratio, to = ratio, "Gear ratio changed"),
            None => info!(%master, %slave, ratio, "Gear engaged"),
        }
        Ok(())
    }

    fn clear_sync(&mut self, slave: Channel) -> MotionResult<()> {
        let slave = self.axis(slave)?;
        self.require(MotionFeatures::GEAR, "ClearSync")?;
        let axis = slave.index();
        self.session.call(Some(slave), |sdk| sdk.stop_gear(axis))?;
        if self.sync.release_gear(slave).is_some() {
            info!(%slave, "Gear released");
        }
        Ok(())
    }

    fn search_z_phase(
        &mut self,
        channel: Channel,
        velocity: f64,
        acceleration: f64,
        distance: f64,
    ) -> MotionResult<()> {
        let channel = self.axis(channel)?;
        self.require(MotionFeatures::Z_PHASE, "SearchZPhase")?;
        if !velocity.is_finite() || velocity == 0.0 {
            return Err(MotionError::invalid(format!(
                "search velocity must be finite and non-zero (got {velocity})"
            )));
        }
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(MotionError::invalid(format!(
                "search acceleration must be positive (got {acceleration})"
            )));
        }
        if !distance.is_finite() || distance == 0.0 {
            return Err(MotionError::invalid(format!(
                "search distance must be finite and non-zero (got {distance})"
            )));
        }
        self.ensure_mode(channel, CommandMode::Position)?;

        info!(%channel, velocity, distance, "Z-phase search");
        let axis = channel.index();
        self.session.call_motion(Some(channel), |sdk| {
            sdk.search_z_phase(axis, velocity, acceleration, distance)
        })?;
        Ok(())
    }
}

impl<S: MotionSdk> DigitalIoCapable for MotionDevice<S> {
    fn digital_input(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.io(channel, self.digital_input_count, "digital input")?;
        self.require_capability(Capabilities::DIGITAL_IO, "GetDigitalInputBit")?;
        let layout = self.policy.io_layout;
        let addr = layout.address(channel);
        let word = self.session.call(Some(channel), |sdk| {
            sdk.read_io(IoBank::Input, addr.container(), layout.width())
        })?;
        Ok(addr.read(word))
    }

    fn set_digital_output(&mut self, channel: Channel, value: bool) -> MotionResult<()> {
        let channel = self.io(channel, self.digital_output_count, "digital output")?;
        self.require_capability(Capabilities::DIGITAL_IO, "SetDigitalOutputBit")?;
        let layout = self.policy.io_layout;
        let addr = layout.address(channel);
        let width = layout.width();
        let word = self.session.call(Some(channel), |sdk| {
            sdk.read_io(IoBank::Output, addr.container(), width)
        })?;
        let updated = addr.write(word, value);
        trace!(%channel, ?addr, word, updated, "Output read-modify-write");
        self.session.call(Some(channel), |sdk| {
            sdk.write_io(IoBank::Output, addr.container(), width, updated)
        })
    }

    fn digital_output(&mut self, channel: Channel) -> MotionResult<bool> {
        let channel = self.io(channel, self.digital_output_count, "digital output")?;
        self.require_capability(Capabilities::DIGITAL_IO, "GetDigitalOutputBit")?;
        let layout = self.policy.io_layout;
        let addr = layout.address(channel);
        let word = self.session.call(Some(channel), |sdk| {
            sdk.read_io(IoBank::Output, addr.container(), layout.width())
        })?;
        Ok(addr.read(word))
    }
}

impl<S: MotionSdk> AnalogIoCapable for MotionDevice<S> {
    fn analog_input(&mut self, channel: Channel, width: AnalogWidth) -> MotionResult<AnalogSample> {
        let channel = self.io(channel, self.analog_input_count, "analog input")?;
        self.require_capability(Capabilities::ANALOG_IO, "GetAnalogInput")?;
        let port = channel.index();
        let raw = self
            .session
            .call(Some(channel), |sdk| sdk.read_analog(IoBank::Input, port, width))?;
        AnalogSample::from_raw(width, raw)
    }

    fn set_analog_output(&mut self, channel: Channel, sample: AnalogSample) -> MotionResult<()> {
        let channel = self.io(channel, self.analog_output_count, "analog output")?;
        self.require_capability(Capabilities::ANALOG_IO, "SetAnalogOutput")?;
        let port = channel.index();
        self.session
            .call(Some(channel), |sdk| sdk.write_analog(port, sample))
    }

    fn analog_output(&mut self, channel: Channel, width: AnalogWidth) -> MotionResult<AnalogSample> {
        let channel = self.io(channel, self.analog_output_count, "analog output")?;
        self.require_capability(Capabilities::ANALOG_IO, "GetAnalogOutput")?;
        let port = channel.index();
        let raw = self
            .session
            .call(Some(channel), |sdk| sdk.read_analog(IoBank::Output, port, width))?;
        AnalogSample::from_raw(width, raw)
    }
}

impl<S: MotionSdk> UserMemoryCapable for MotionDevice<S> {
    fn run_buffer(&mut self, buffer: u32, label: Option<&str>) -> MotionResult<()> {
        self.live()?;
        self.require_capability(Capabilities::USER_MEMORY, "RunBuffer")?;
        if label.is_some_and(str::is_empty) {
            return Err(MotionError::invalid("buffer label cannot be empty"));
        }
        info!(buffer, ?label, "Run buffer");
        self.session.call(None, |sdk| sdk.run_buffer(buffer, label))
    }

    fn stop_buffer(&mut self, buffer: u32) -> MotionResult<()> {
        self.live()?;
        self.require_capability(Capabilities::USER_MEMORY, "StopBuffer")?;
        info!(buffer, "Stop buffer");
        self.session.call(None, |sdk| sdk.stop_buffer(buffer))
    }

    fn read_variable(
        &mut self,
        name: &str,
        range: Option<RangeInclusive<u32>>,
    ) -> MotionResult<Vec<f64>> {
        self.live()?;
        self.require_capability(Capabilities::USER_MEMORY, "ReadVariable")?;
        if name.is_empty() {
            return Err(MotionError::invalid("variable name cannot be empty"));
        }
        let range = variable_range(range)?;
        self.session.call(None, |sdk| sdk.read_variable(name, range))
    }

    fn write_variable(
        &mut self,
        name: &str,
        range: Option<RangeInclusive<u32>>,
        values: &[f64],
    ) -> MotionResult<()> {
        self.live()?;
        self.require_capability(Capabilities::USER_MEMORY, "WriteVariable")?;
        if name.is_empty() {
            return Err(MotionError::invalid("variable name cannot be empty"));
        }
        let range = variable_range(range)?;
        let expected = match range {
            Some((first, last)) => (last - first) as usize + 1,
            None => values.len().max(1),
        };
        if values.len() != expected {
            return Err(MotionError::invalid(format!(
                "variable {name}: {} values for {expected} elements",
                values.len()
            )));
        }
        debug!(name, ?range, count = values.len(), "Write variable");
        self.session
            .call(None, |sdk| sdk.write_variable(name, range, values))
    }
}
