//! Backend behavioural policies.
//!
//! The set of controller families is closed ([`BackendKind`]). Each one gets
//! a constant [`BackendPolicy`] describing how the generic device logic must
//! behave for it: IO addressing, which optional operations exist, how
//! S-curves and emergency stops are issued, where the alarm state is read
//! from, and how vendor status codes are classified.
//!
//! | Backend | IO layout | Modes | S-curve | EStop | Alarm source |
//! |---------|-----------|-------|---------|-------|--------------|
//! | acs | word, 16 | no | native | as Stop | fault latch |
//! | comizoa | word, 16 | no | trapezoid | immediate | status bit |
//! | wmx | byte | yes | native | as Stop | status bit |
//! | simulation | word, 16 | yes | native | immediate | status bit |

use crate::status::StatusTable;
use bitflags::bitflags;
use motion_common::channel::IoLayout;
use motion_common::config::BackendKind;
use motion_common::consts::DEFAULT_BITS_PER_SLOT;
use motion_common::device::Capabilities;
use motion_common::error::MotionResult;
use motion_common::types::{AxisStatusBits, FaultFlags};

bitflags! {
    /// Optional motion operations a backend implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MotionFeatures: u16 {
        /// Command-mode query and switch
        const COMMAND_MODE      = 0x0001;
        /// Torque commands
        const TORQUE            = 0x0002;
        /// Command/actual velocity readback
        const VELOCITY_READBACK = 0x0004;
        /// Home and limit sensor readback
        const SENSORS           = 0x0008;
        /// Synchronized multi-axis moves
        const GROUP_MOVE        = 0x0010;
        /// Electronic cam tables
        const ECAM              = 0x0020;
        /// Gear-ratio following
        const GEAR              = 0x0040;
        /// Encoder index search
        const Z_PHASE           = 0x0080;
    }
}

/// How jerk-ratio S-curve moves are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SCurveSupport {
    /// Derived jerk is passed to the controller.
    Native,
    /// The controller has no jerk input; the move runs as a trapezoid.
    Trapezoidal,
}

/// What `estop` issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EStopBehavior {
    /// Same mode-dispatched stop as `stop`.
    SameAsStop,
    /// The vendor emergency-stop primitive.
    Immediate,
}

/// Where `is_alarmed` reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSource {
    /// The `ALARM` bit of the axis status word.
    StatusBit,
    /// Latched safety faults, limit-switch faults excluded. Fault latching
    /// must be re-armed after enabling and after a reset.
    FaultLatch,
}

impl AlarmSource {
    /// Returns true when the axis status needs the fault word.
    #[inline]
    pub const fn reads_faults(self) -> bool {
        matches!(self, AlarmSource::FaultLatch)
    }

    /// Alarm state from the raw readings.
    pub fn is_alarmed(self, status: AxisStatusBits, faults: FaultFlags) -> bool {
        match self {
            AlarmSource::StatusBit => status.contains(AxisStatusBits::ALARM),
            AlarmSource::FaultLatch => faults.is_alarm(),
        }
    }
}

/// Comizoa: motion stopped by the positive end limit.
pub const COMIZOA_STOP_BY_ELP: i32 = 1102;
/// Comizoa: motion stopped by the negative end limit.
pub const COMIZOA_STOP_BY_ELN: i32 = 1103;
/// Comizoa: board not opened.
pub const COMIZOA_NOT_CONNECTED: i32 = 100;
/// ACS: communication channel closed.
pub const ACS_NOT_CONNECTED: i32 = 3002;
/// WMX: communication not started.
pub const WMX_NOT_CONNECTED: i32 = 0x1001;
/// Simulation: motion stopped by the positive limit.
pub const SIM_STOP_BY_POSITIVE_LIMIT: i32 = 201;
/// Simulation: motion stopped by the negative limit.
pub const SIM_STOP_BY_NEGATIVE_LIMIT: i32 = 202;
/// Simulation: session not open.
pub const SIM_NOT_CONNECTED: i32 = 900;

/// Behaviour of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPolicy {
    /// Backend identity
    pub kind: BackendKind,
    /// Default digital IO addressing
    pub io_layout: IoLayout,
    /// Capability sets implemented
    pub capabilities: Capabilities,
    /// Optional motion operations implemented
    pub features: MotionFeatures,
    /// S-curve issuing
    pub s_curve: SCurveSupport,
    /// Emergency stop issuing
    pub estop: EStopBehavior,
    /// Alarm state source
    pub alarm_source: AlarmSource,
    /// Status code interpretation
    pub status: StatusTable,
}

const WORD_16: IoLayout = IoLayout::Word {
    bits_per_slot: DEFAULT_BITS_PER_SLOT,
};

impl BackendPolicy {
    /// Policy for a backend.
    pub const fn of(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Acs => Self {
                kind,
                io_layout: WORD_16,
                capabilities: Capabilities::MOTION
                    .union(Capabilities::DIGITAL_IO)
                    .union(Capabilities::USER_MEMORY),
                features: MotionFeatures::VELOCITY_READBACK
                    .union(MotionFeatures::SENSORS)
                    .union(MotionFeatures::GROUP_MOVE),
                s_curve: SCurveSupport::Native,
                estop: EStopBehavior::SameAsStop,
                alarm_source: AlarmSource::FaultLatch,
                status: StatusTable {
                    limit_stop_codes: &[],
                    not_connected: ACS_NOT_CONNECTED,
                },
            },
            BackendKind::Comizoa => Self {
                kind,
                io_layout: WORD_16,
                capabilities: Capabilities::MOTION.union(Capabilities::DIGITAL_IO),
                features: MotionFeatures::SENSORS.union(MotionFeatures::GROUP_MOVE),
                s_curve: SCurveSupport::Trapezoidal,
                estop: EStopBehavior::Immediate,
                alarm_source: AlarmSource::StatusBit,
                status: StatusTable {
                    limit_stop_codes: &[COMIZOA_STOP_BY_ELP, COMIZOA_STOP_BY_ELN],
                    not_connected: COMIZOA_NOT_CONNECTED,
                },
            },
            BackendKind::Wmx => Self {
                kind,
                io_layout: IoLayout::Byte,
                capabilities: Capabilities::MOTION
                    .union(Capabilities::DIGITAL_IO)
                    .union(Capabilities::ANALOG_IO),
                features: MotionFeatures::all(),
                s_curve: SCurveSupport::Native,
                estop: EStopBehavior::SameAsStop,
                alarm_source: AlarmSource::StatusBit,
                status: StatusTable {
                    limit_stop_codes: &[],
                    not_connected: WMX_NOT_CONNECTED,
                },
            },
            BackendKind::Simulation => Self {
                kind,
                io_layout: WORD_16,
                capabilities: Capabilities::all(),
                features: MotionFeatures::all(),
                s_curve: SCurveSupport::Native,
                estop: EStopBehavior::Immediate,
                alarm_source: AlarmSource::StatusBit,
                status: StatusTable {
                    limit_stop_codes: &[SIM_STOP_BY_POSITIVE_LIMIT, SIM_STOP_BY_NEGATIVE_LIMIT],
                    not_connected: SIM_NOT_CONNECTED,
                },
            },
        }
    }

    /// Backend name used in errors and logs.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Replace the word width of a word-addressed layout.
    ///
    /// Byte-addressed backends ignore the override.
    pub fn with_bits_per_slot(mut self, bits: Option<u32>) -> MotionResult<Self> {
        if let (Some(bits_per_slot), IoLayout::Word { .. }) = (bits, self.io_layout) {
            self.io_layout = IoLayout::Word { bits_per_slot }.validate()?;
        }
        Ok(self)
    }

    /// Returns true when the optional motion operation is implemented.
    #[inline]
    pub const fn supports(&self, feature: MotionFeatures) -> bool {
        self.features.contains(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comizoa_downgrades_s_curve_and_lacks_velocity_readback() {
        let policy = BackendPolicy::of(BackendKind::Comizoa);
        assert_eq!(policy.s_curve, SCurveSupport::Trapezoidal);
        assert!(!policy.supports(MotionFeatures::VELOCITY_READBACK));
        assert!(!policy.supports(MotionFeatures::TORQUE));
        assert!(policy.status.limit_stop_codes.contains(&COMIZOA_STOP_BY_ELP));
    }

    #[test]
    fn wmx_is_byte_addressed_with_full_motion() {
        let policy = BackendPolicy::of(BackendKind::Wmx);
        assert_eq!(policy.io_layout, IoLayout::Byte);
        assert!(policy.supports(MotionFeatures::ECAM | MotionFeatures::GEAR));
        assert!(policy.capabilities.contains(Capabilities::ANALOG_IO));
        assert!(!policy.capabilities.contains(Capabilities::USER_MEMORY));
    }

    #[test]
    fn acs_alarm_ignores_limit_faults() {
        let policy = BackendPolicy::of(BackendKind::Acs);
        let source = policy.alarm_source;
        assert!(source.reads_faults());
        assert!(!source.is_alarmed(AxisStatusBits::ALARM, FaultFlags::RIGHT_LIMIT));
        assert!(source.is_alarmed(AxisStatusBits::empty(), FaultFlags::DRIVE));
        assert_eq!(policy.estop, EStopBehavior::SameAsStop);
    }

    #[test]
    fn bits_per_slot_override() {
        let policy = BackendPolicy::of(BackendKind::Acs)
            .with_bits_per_slot(Some(32))
            .unwrap();
        assert_eq!(policy.io_layout, IoLayout::Word { bits_per_slot: 32 });

        let wmx = BackendPolicy::of(BackendKind::Wmx)
            .with_bits_per_slot(Some(32))
            .unwrap();
        assert_eq!(wmx.io_layout, IoLayout::Byte);

        assert!(BackendPolicy::of(BackendKind::Acs)
            .with_bits_per_slot(Some(0))
            .is_err());
    }

    #[test]
    fn every_backend_has_motion() {
        for kind in BackendKind::ALL {
            let policy = BackendPolicy::of(kind);
            assert!(policy.capabilities.contains(Capabilities::MOTION));
            assert_eq!(policy.name(), kind.as_str());
        }
    }
}
