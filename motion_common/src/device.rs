//! Capability traits implemented by motion device backends.
//!
//! A backend implements the subset of operations it physically supports.
//! Everything else keeps the default body, which fails with
//! [`MotionError::NotSupported`], so sequencing code targets one stable
//! surface whatever controller is attached.
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`Device`] | identity, capability set, teardown |
//! | [`MotionCapable`] | servo, alarms, moves, stops, waits, positions, sensors, sync |
//! | [`DigitalIoCapable`] | single-bit inputs and outputs |
//! | [`AnalogIoCapable`] | typed analog samples |
//! | [`UserMemoryCapable`] | controller program buffers and variables |
//!
//! All calls are synchronous and take `&mut self`: one device instance owns
//! one vendor session and callers serialize access.

use crate::channel::Channel;
use crate::error::{MotionError, MotionResult};
use crate::profile::MotionProfile;
use crate::types::{AnalogSample, AnalogWidth, AxisState, CommandMode};
use bitflags::bitflags;
use std::ops::RangeInclusive;
use std::time::Duration;

bitflags! {
    /// Capability sets a backend can advertise.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Motion axes.
        const MOTION      = 0x01;
        /// Digital IO.
        const DIGITAL_IO  = 0x02;
        /// Analog IO.
        const ANALOG_IO   = 0x04;
        /// Controller user memory (program buffers, variables).
        const USER_MEMORY = 0x08;
    }
}

fn unsupported<T>(backend: &'static str, operation: &'static str) -> MotionResult<T> {
    Err(MotionError::NotSupported { operation, backend })
}

/// Identity and lifecycle shared by every backend.
pub trait Device {
    /// Backend name (e.g. "acs", "wmx", "simulation").
    fn name(&self) -> &'static str;

    /// Capability sets this backend implements.
    fn capabilities(&self) -> Capabilities;

    /// Stop communication and close the vendor session.
    ///
    /// Every later call fails with [`MotionError::Connection`].
    fn shutdown(&mut self) -> MotionResult<()>;
}

/// Motion axis operations.
pub trait MotionCapable: Device {
    /// Energize (`true`) or release (`false`) the servo drive.
    fn enable(&mut self, channel: Channel, on: bool) -> MotionResult<()>;

    /// Servo drive state.
    fn is_enabled(&mut self, channel: Channel) -> MotionResult<bool>;

    /// Drive alarm state.
    fn is_alarmed(&mut self, channel: Channel) -> MotionResult<bool>;

    /// Pulse the alarm reset line.
    fn clear_alarm(&mut self, channel: Channel) -> MotionResult<()>;

    /// Point-to-point move with a trapezoidal profile.
    fn trapezoidal_move(
        &mut self,
        channel: Channel,
        position: f64,
        profile: &MotionProfile,
    ) -> MotionResult<()>;

    /// Point-to-point move with a jerk-ratio S-curve profile.
    fn jerk_ratio_s_curve_move(
        &mut self,
        channel: Channel,
        position: f64,
        profile: &MotionProfile,
    ) -> MotionResult<()>;

    /// Synchronized trapezoidal move of several axes.
    fn trapezoidal_move_group(
        &mut self,
        _targets: &[(Channel, f64)],
        _profile: &MotionProfile,
    ) -> MotionResult<()> {
        unsupported(self.name(), "TrapezoidalMoveGroup")
    }

    /// Synchronized jerk-ratio S-curve move of several axes.
    fn jerk_ratio_s_curve_move_group(
        &mut self,
        _targets: &[(Channel, f64)],
        _profile: &MotionProfile,
    ) -> MotionResult<()> {
        unsupported(self.name(), "JerkRatioSCurveMoveGroup")
    }

    /// Continuous velocity move; the profile velocity sign is the direction.
    fn velocity_move(&mut self, channel: Channel, profile: &MotionProfile) -> MotionResult<()>;

    /// Controlled deceleration stop.
    fn stop(&mut self, channel: Channel) -> MotionResult<()>;

    /// Immediate stop (may behave like [`MotionCapable::stop`] on some backends).
    fn estop(&mut self, channel: Channel) -> MotionResult<()>;

    /// Block until motion completes, using the device's default deadline.
    fn wait(&mut self, channel: Channel) -> MotionResult<()>;

    /// Block until motion completes or `timeout` elapses.
    fn wait_timeout(&mut self, channel: Channel, timeout: Duration) -> MotionResult<()>;

    /// Motion in progress.
    fn is_moving(&mut self, channel: Channel) -> MotionResult<bool>;

    /// Re-zero the commanded position without moving.
    fn set_command_position(&mut self, channel: Channel, position: f64) -> MotionResult<()>;

    /// Re-zero the feedback position without moving.
    fn set_actual_position(&mut self, channel: Channel, position: f64) -> MotionResult<()>;

    /// Re-zero both commanded and feedback positions.
    fn set_command_and_actual_position(
        &mut self,
        channel: Channel,
        position: f64,
    ) -> MotionResult<()> {
        self.set_command_position(channel, position)?;
        self.set_actual_position(channel, position)
    }

    /// Commanded position.
    fn command_position(&mut self, channel: Channel) -> MotionResult<f64>;

    /// Feedback position.
    fn actual_position(&mut self, channel: Channel) -> MotionResult<f64>;

    /// Commanded velocity.
    fn command_velocity(&mut self, _channel: Channel) -> MotionResult<f64> {
        unsupported(self.name(), "GetCommandVelocity")
    }

    /// Feedback velocity.
    fn actual_velocity(&mut self, _channel: Channel) -> MotionResult<f64> {
        unsupported(self.name(), "GetActualVelocity")
    }

    /// Home sensor state.
    fn home_sensor(&mut self, _channel: Channel) -> MotionResult<bool> {
        unsupported(self.name(), "GetHomeSensor")
    }

    /// Negative limit sensor state.
    fn negative_limit_sensor(&mut self, _channel: Channel) -> MotionResult<bool> {
        unsupported(self.name(), "GetNegativeLimitSensor")
    }

    /// Positive limit sensor state.
    fn positive_limit_sensor(&mut self, _channel: Channel) -> MotionResult<bool> {
        unsupported(self.name(), "GetPositiveLimitSensor")
    }

    /// Current command mode.
    fn command_mode(&mut self, _channel: Channel) -> MotionResult<CommandMode> {
        unsupported(self.name(), "GetCommandMode")
    }

    /// Request a command mode; the switch is only issued when it differs.
    fn set_command_mode(&mut self, _channel: Channel, _mode: CommandMode) -> MotionResult<()> {
        unsupported(self.name(), "SetCommandMode")
    }

    /// Torque command. Zero stops the torque command.
    fn set_torque(&mut self, _channel: Channel, _torque: f64) -> MotionResult<()> {
        unsupported(self.name(), "SetTorque")
    }

    /// Start a repeating electronic cam.
    fn start_ecam(
        &mut self,
        _table_index: u32,
        _master: Channel,
        _slave: Channel,
        _master_positions: &[f64],
        _slave_positions: &[f64],
    ) -> MotionResult<()> {
        unsupported(self.name(), "StartECam")
    }

    /// Tear down an electronic cam.
    fn stop_ecam(&mut self, _table_index: u32) -> MotionResult<()> {
        unsupported(self.name(), "StopECam")
    }

    /// Electronic cam state.
    fn is_ecam_enabled(&mut self, _table_index: u32) -> MotionResult<bool> {
        unsupported(self.name(), "IsECamEnabled")
    }

    /// Couple `slave` to `master` at `ratio`, ramping with `ramp`.
    fn set_sync_gear_ratio(
        &mut self,
        _master: Channel,
        _slave: Channel,
        _ratio: f64,
        _ramp: &MotionProfile,
    ) -> MotionResult<()> {
        unsupported(self.name(), "SetSyncGearRatio")
    }

    /// Release a gear coupling.
    fn clear_sync(&mut self, _slave: Channel) -> MotionResult<()> {
        unsupported(self.name(), "ClearSync")
    }

    /// Homing search for the encoder index pulse.
    fn search_z_phase(
        &mut self,
        _channel: Channel,
        _velocity: f64,
        _acceleration: f64,
        _distance: f64,
    ) -> MotionResult<()> {
        unsupported(self.name(), "SearchZPhase")
    }

    /// Snapshot of the axis. Velocities the backend cannot report are `None`.
    fn axis_state(&mut self, channel: Channel) -> MotionResult<AxisState> {
        Ok(AxisState {
            channel,
            command_mode: optional(self.command_mode(channel))?.unwrap_or_default(),
            servo_on: self.is_enabled(channel)?,
            alarmed: self.is_alarmed(channel)?,
            moving: self.is_moving(channel)?,
            command_position: self.command_position(channel)?,
            actual_position: self.actual_position(channel)?,
            command_velocity: optional(self.command_velocity(channel))?,
            actual_velocity: optional(self.actual_velocity(channel))?,
            home_sensor: optional(self.home_sensor(channel))?.unwrap_or(false),
            negative_limit: optional(self.negative_limit_sensor(channel))?.unwrap_or(false),
            positive_limit: optional(self.positive_limit_sensor(channel))?.unwrap_or(false),
        })
    }
}

/// Map `NotSupported` to `None`, keep every other error.
fn optional<T>(result: MotionResult<T>) -> MotionResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(MotionError::NotSupported { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Single-bit digital IO.
pub trait DigitalIoCapable: Device {
    /// Read a digital input bit.
    fn digital_input(&mut self, _channel: Channel) -> MotionResult<bool> {
        unsupported(self.name(), "GetDigitalInputBit")
    }

    /// Write a digital output bit, leaving sibling bits untouched.
    fn set_digital_output(&mut self, _channel: Channel, _value: bool) -> MotionResult<()> {
        unsupported(self.name(), "SetDigitalOutputBit")
    }

    /// Read back a digital output bit.
    fn digital_output(&mut self, _channel: Channel) -> MotionResult<bool> {
        unsupported(self.name(), "GetDigitalOutputBit")
    }
}

/// Typed analog IO.
pub trait AnalogIoCapable: Device {
    /// Read an analog input.
    fn analog_input(&mut self, _channel: Channel, _width: AnalogWidth) -> MotionResult<AnalogSample> {
        unsupported(self.name(), "GetAnalogInput")
    }

    /// Write an analog output.
    fn set_analog_output(&mut self, _channel: Channel, _sample: AnalogSample) -> MotionResult<()> {
        unsupported(self.name(), "SetAnalogOutput")
    }

    /// Read back an analog output.
    fn analog_output(&mut self, _channel: Channel, _width: AnalogWidth) -> MotionResult<AnalogSample> {
        unsupported(self.name(), "GetAnalogOutput")
    }
}

/// Controller user memory: program buffers and named variables.
pub trait UserMemoryCapable: Device {
    /// Start a program buffer, optionally at a label.
    fn run_buffer(&mut self, _buffer: u32, _label: Option<&str>) -> MotionResult<()> {
        unsupported(self.name(), "RunBuffer")
    }

    /// Stop a program buffer.
    fn stop_buffer(&mut self, _buffer: u32) -> MotionResult<()> {
        unsupported(self.name(), "StopBuffer")
    }

    /// Read a variable, or an index range of an array variable.
    fn read_variable(
        &mut self,
        _name: &str,
        _range: Option<RangeInclusive<u32>>,
    ) -> MotionResult<Vec<f64>> {
        unsupported(self.name(), "ReadVariable")
    }

    /// Write a variable, or an index range of an array variable.
    fn write_variable(
        &mut self,
        _name: &str,
        _range: Option<RangeInclusive<u32>>,
        _values: &[f64],
    ) -> MotionResult<()> {
        unsupported(self.name(), "WriteVariable")
    }
}

/// Full device surface, usable as a trait object.
pub trait Controller: MotionCapable + DigitalIoCapable + AnalogIoCapable + UserMemoryCapable {}

impl<T> Controller for T where
    T: MotionCapable + DigitalIoCapable + AnalogIoCapable + UserMemoryCapable
{
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Motion-only device with fixed readings.
    struct FixedAxis {
        enabled: bool,
    }

    impl Device for FixedAxis {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::MOTION
        }

        fn shutdown(&mut self) -> MotionResult<()> {
            Ok(())
        }
    }

    impl MotionCapable for FixedAxis {
        fn enable(&mut self, _channel: Channel, on: bool) -> MotionResult<()> {
            self.enabled = on;
            Ok(())
        }
        fn is_enabled(&mut self, _channel: Channel) -> MotionResult<bool> {
            Ok(self.enabled)
        }
        fn is_alarmed(&mut self, _channel: Channel) -> MotionResult<bool> {
            Ok(false)
        }
        fn clear_alarm(&mut self, _channel: Channel) -> MotionResult<()> {
            Ok(())
        }
        fn trapezoidal_move(&mut self, _: Channel, _: f64, _: &MotionProfile) -> MotionResult<()> {
            Ok(())
        }
        fn jerk_ratio_s_curve_move(
            &mut self,
            _: Channel,
            _: f64,
            _: &MotionProfile,
        ) -> MotionResult<()> {
            Ok(())
        }
        fn velocity_move(&mut self, _: Channel, _: &MotionProfile) -> MotionResult<()> {
            Ok(())
        }
        fn stop(&mut self, _: Channel) -> MotionResult<()> {
            Ok(())
        }
        fn estop(&mut self, _: Channel) -> MotionResult<()> {
            Ok(())
        }
        fn wait(&mut self, _: Channel) -> MotionResult<()> {
            Ok(())
        }
        fn wait_timeout(&mut self, _: Channel, _: Duration) -> MotionResult<()> {
            Ok(())
        }
        fn is_moving(&mut self, _: Channel) -> MotionResult<bool> {
            Ok(false)
        }
        fn set_command_position(&mut self, _: Channel, _: f64) -> MotionResult<()> {
            Ok(())
        }
        fn set_actual_position(&mut self, _: Channel, _: f64) -> MotionResult<()> {
            Ok(())
        }
        fn command_position(&mut self, _: Channel) -> MotionResult<f64> {
            Ok(12.5)
        }
        fn actual_position(&mut self, _: Channel) -> MotionResult<f64> {
            Ok(12.4)
        }
    }

    impl DigitalIoCapable for FixedAxis {}

    #[test]
    fn unimplemented_operations_report_not_supported() {
        let mut dev = FixedAxis { enabled: false };
        let err = dev.set_torque(Channel::new(0), 1.0).unwrap_err();
        assert_eq!(
            err,
            MotionError::NotSupported {
                operation: "SetTorque",
                backend: "fixed"
            }
        );
        assert!(dev.start_ecam(0, Channel::new(0), Channel::new(1), &[0.0], &[0.0]).unwrap_err().is_not_supported());
        assert!(dev.digital_input(Channel::new(0)).unwrap_err().is_not_supported());
    }

    #[test]
    fn axis_state_skips_unsupported_readings() {
        let mut dev = FixedAxis { enabled: false };
        dev.enable(Channel::new(2), true).unwrap();
        let state = dev.axis_state(Channel::new(2)).unwrap();
        assert_eq!(state.channel, Channel::new(2));
        assert!(state.servo_on);
        assert_eq!(state.command_mode, CommandMode::Position);
        assert_eq!(state.command_position, 12.5);
        assert_eq!(state.command_velocity, None);
        assert!(!state.home_sensor);
    }
}
