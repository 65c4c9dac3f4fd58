//! Shared motion types.
//!
//! - `CommandMode` - control quantity commanded to an axis
//! - `AxisStatusBits` / `FaultFlags` - vendor status bitfields, normalized
//! - `AxisState` - point-in-time axis snapshot
//! - `SyncPair` / `ECamTable` - synchronized-motion descriptors
//! - `AnalogWidth` / `AnalogSample` - typed analog IO values

use crate::channel::Channel;
use crate::error::{MotionError, MotionResult};
use crate::profile::MotionProfile;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control quantity currently commanded to an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CommandMode {
    /// Position control (point-to-point, homing, sync).
    Position = 0,
    /// Velocity control (jog).
    Velocity = 1,
    /// Torque control.
    Torque = 2,
}

impl CommandMode {
    /// Convert from the raw vendor value. Returns `None` for unknown modes.
    #[inline]
    pub const fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Position),
            1 => Some(Self::Velocity),
            2 => Some(Self::Torque),
            _ => None,
        }
    }

    /// Raw vendor value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self as i32
    }
}

impl Default for CommandMode {
    fn default() -> Self {
        Self::Position
    }
}

impl fmt::Display for CommandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Velocity => "velocity",
            Self::Torque => "torque",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Normalized per-axis status bits read from the controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisStatusBits: u16 {
        /// Servo drive energized.
        const SERVO_ON       = 0x0001;
        /// Drive alarm latched.
        const ALARM          = 0x0002;
        /// Motion profile in progress.
        const MOVING         = 0x0004;
        /// Home (origin) sensor active.
        const HOME           = 0x0008;
        /// Negative end limit active.
        const NEGATIVE_LIMIT = 0x0010;
        /// Positive end limit active.
        const POSITIVE_LIMIT = 0x0020;
        /// Encoder index (Z-phase) seen.
        const Z_PHASE        = 0x0040;
        /// At commanded target.
        const IN_POSITION    = 0x0080;
    }
}

impl Default for AxisStatusBits {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Latched safety faults for controllers that report faults separately
    /// from the status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u32 {
        /// Right (positive) hardware limit.
        const RIGHT_LIMIT      = 0x0000_0001;
        /// Left (negative) hardware limit.
        const LEFT_LIMIT       = 0x0000_0002;
        /// Drive amplifier fault.
        const DRIVE            = 0x0000_0100;
        /// Position error exceeded.
        const POSITION_ERROR   = 0x0000_0200;
        /// Encoder not connected or faulty.
        const ENCODER          = 0x0000_0400;
        /// Over-current.
        const OVERCURRENT      = 0x0000_0800;
        /// Emergency stop input.
        const EMERGENCY_STOP   = 0x0001_0000;
    }
}

impl FaultFlags {
    /// Limit-switch faults; a limit stop is an expected end of motion.
    pub const LIMITS: Self =
        Self::from_bits_truncate(Self::RIGHT_LIMIT.bits() | Self::LEFT_LIMIT.bits());

    /// Returns true if any fault other than a limit switch is latched.
    #[inline]
    pub const fn is_alarm(&self) -> bool {
        !self.difference(Self::LIMITS).is_empty()
    }
}

impl Default for FaultFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Point-in-time axis snapshot. The controller owns the authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisState {
    /// Axis channel
    pub channel: Channel,
    /// Current command mode
    pub command_mode: CommandMode,
    /// Servo energized
    pub servo_on: bool,
    /// Alarm latched
    pub alarmed: bool,
    /// Motion in progress
    pub moving: bool,
    /// Commanded position
    pub command_position: f64,
    /// Feedback position
    pub actual_position: f64,
    /// Commanded velocity (`None` when the backend cannot report it)
    pub command_velocity: Option<f64>,
    /// Feedback velocity (`None` when the backend cannot report it)
    pub actual_velocity: Option<f64>,
    /// Home sensor
    pub home_sensor: bool,
    /// Negative limit sensor
    pub negative_limit: bool,
    /// Positive limit sensor
    pub positive_limit: bool,
}

/// Gear-ratio coupling of a slave axis to a master axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPair {
    /// Master axis
    pub master: Channel,
    /// Following axis
    pub slave: Channel,
    /// Slave displacement per unit master displacement
    pub gear_ratio: f64,
    /// Ramp used when the ratio is applied or changed
    pub ramp: MotionProfile,
}

impl SyncPair {
    /// Validate channels and ratio.
    pub fn validate(&self) -> MotionResult<()> {
        if self.master == self.slave {
            return Err(MotionError::invalid(format!(
                "gear master and slave must differ (both {})",
                self.master
            )));
        }
        if !self.gear_ratio.is_finite() || self.gear_ratio == 0.0 {
            return Err(MotionError::invalid(format!(
                "gear ratio must be finite and non-zero (got {})",
                self.gear_ratio
            )));
        }
        Ok(())
    }
}

/// Electronic cam table binding slave displacement to master displacement.
///
/// Master positions are expected to increase; that ordering is the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct ECamTable {
    /// Controller table index
    pub table_index: u32,
    /// Master axis
    pub master: Channel,
    /// Slave axis
    pub slave: Channel,
    master_positions: Vec<f64>,
    slave_positions: Vec<f64>,
}

impl ECamTable {
    /// Build a cam table.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::InvalidParameter`] if the position sequences
    /// differ in length, are empty, or master equals slave.
    pub fn new(
        table_index: u32,
        master: Channel,
        slave: Channel,
        master_positions: &[f64],
        slave_positions: &[f64],
    ) -> MotionResult<Self> {
        if master_positions.len() != slave_positions.len() {
            return Err(MotionError::invalid(format!(
                "cam table {table_index}: {} master positions but {} slave positions",
                master_positions.len(),
                slave_positions.len()
            )));
        }
        if master_positions.is_empty() {
            return Err(MotionError::invalid(format!(
                "cam table {table_index} has no points"
            )));
        }
        if master == slave {
            return Err(MotionError::invalid(format!(
                "cam table {table_index}: master and slave must differ (both {master})"
            )));
        }
        Ok(Self {
            table_index,
            master,
            slave,
            master_positions: master_positions.to_vec(),
            slave_positions: slave_positions.to_vec(),
        })
    }

    /// Master positions.
    pub fn master_positions(&self) -> &[f64] {
        &self.master_positions
    }

    /// Slave positions.
    pub fn slave_positions(&self) -> &[f64] {
        &self.slave_positions
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.master_positions.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.master_positions.is_empty()
    }
}

/// Width and signedness of an analog IO sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalogWidth {
    /// Unsigned 8-bit
    U8,
    /// Signed 8-bit
    I8,
    /// Unsigned 16-bit
    U16,
    /// Signed 16-bit
    I16,
    /// Unsigned 32-bit
    U32,
    /// Signed 32-bit
    I32,
}

/// Typed analog sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogSample {
    /// Unsigned 8-bit sample
    U8(u8),
    /// Signed 8-bit sample
    I8(i8),
    /// Unsigned 16-bit sample
    U16(u16),
    /// Signed 16-bit sample
    I16(i16),
    /// Unsigned 32-bit sample
    U32(u32),
    /// Signed 32-bit sample
    I32(i32),
}

impl AnalogSample {
    /// Width of this sample.
    pub const fn width(self) -> AnalogWidth {
        match self {
            Self::U8(_) => AnalogWidth::U8,
            Self::I8(_) => AnalogWidth::I8,
            Self::U16(_) => AnalogWidth::U16,
            Self::I16(_) => AnalogWidth::I16,
            Self::U32(_) => AnalogWidth::U32,
            Self::I32(_) => AnalogWidth::I32,
        }
    }

    /// Widened raw value.
    pub const fn raw(self) -> i64 {
        match self {
            Self::U8(v) => v as i64,
            Self::I8(v) => v as i64,
            Self::U16(v) => v as i64,
            Self::I16(v) => v as i64,
            Self::U32(v) => v as i64,
            Self::I32(v) => v as i64,
        }
    }

    /// Narrow a raw value to `width`.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::InvalidParameter`] if `raw` does not fit.
    pub fn from_raw(width: AnalogWidth, raw: i64) -> MotionResult<Self> {
        let out_of_range =
            || MotionError::invalid(format!("analog value {raw} does not fit {width:?}"));
        Ok(match width {
            AnalogWidth::U8 => Self::U8(u8::try_from(raw).map_err(|_| out_of_range())?),
            AnalogWidth::I8 => Self::I8(i8::try_from(raw).map_err(|_| out_of_range())?),
            AnalogWidth::U16 => Self::U16(u16::try_from(raw).map_err(|_| out_of_range())?),
            AnalogWidth::I16 => Self::I16(i16::try_from(raw).map_err(|_| out_of_range())?),
            AnalogWidth::U32 => Self::U32(u32::try_from(raw).map_err(|_| out_of_range())?),
            AnalogWidth::I32 => Self::I32(i32::try_from(raw).map_err(|_| out_of_range())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_mode_raw_round_trip() {
        for mode in [CommandMode::Position, CommandMode::Velocity, CommandMode::Torque] {
            assert_eq!(CommandMode::from_raw(mode.raw()), Some(mode));
        }
        assert_eq!(CommandMode::from_raw(7), None);
        assert_eq!(CommandMode::from_raw(-1), None);
    }

    #[test]
    fn limit_faults_are_not_alarms() {
        assert!(!FaultFlags::empty().is_alarm());
        assert!(!FaultFlags::LIMITS.is_alarm());
        assert!(!FaultFlags::RIGHT_LIMIT.is_alarm());
        assert!((FaultFlags::LEFT_LIMIT | FaultFlags::DRIVE).is_alarm());
        assert!(FaultFlags::POSITION_ERROR.is_alarm());
    }

    #[test]
    fn ecam_table_rejects_length_mismatch() {
        let err = ECamTable::new(
            0,
            Channel::new(0),
            Channel::new(1),
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[0.0, 1.0, 2.0, 3.0],
        )
        .unwrap_err();
        assert!(err.to_string().contains("5 master positions but 4 slave positions"));
    }

    #[test]
    fn ecam_table_rejects_empty_and_self_coupling() {
        assert!(ECamTable::new(0, Channel::new(0), Channel::new(1), &[], &[]).is_err());
        assert!(ECamTable::new(0, Channel::new(2), Channel::new(2), &[0.0], &[0.0]).is_err());
    }

    #[test]
    fn ecam_table_keeps_points() {
        let table =
            ECamTable::new(3, Channel::new(0), Channel::new(1), &[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.slave_positions(), &[0.0, 5.0]);
    }

    #[test]
    fn sync_pair_validation() {
        let ramp = MotionProfile::s_curve(10.0, 100.0, 100.0, 0.5, 0.5);
        let pair = SyncPair {
            master: Channel::new(0),
            slave: Channel::new(1),
            gear_ratio: 2.0,
            ramp,
        };
        assert!(pair.validate().is_ok());
        assert!(SyncPair { gear_ratio: 0.0, ..pair }.validate().is_err());
        assert!(SyncPair { gear_ratio: f64::INFINITY, ..pair }.validate().is_err());
        assert!(SyncPair { slave: Channel::new(0), ..pair }.validate().is_err());
    }

    #[test]
    fn analog_sample_narrowing() {
        assert_eq!(
            AnalogSample::from_raw(AnalogWidth::I8, -128).unwrap(),
            AnalogSample::I8(-128)
        );
        assert!(AnalogSample::from_raw(AnalogWidth::U8, 256).is_err());
        assert!(AnalogSample::from_raw(AnalogWidth::U16, -1).is_err());
        assert_eq!(AnalogSample::U32(u32::MAX).raw(), u32::MAX as i64);
        assert_eq!(AnalogSample::I16(-5).width(), AnalogWidth::I16);
    }
}
