//! Prelude module for common re-exports.
//!
//! ```rust
//! use motion_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AlarmResetPolicy, BackendKind, ConfigError, ConfigLoader, DeviceConfig, HalConfig, LogLevel,
    SharedConfig,
};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{MotionError, MotionResult};

// ─── Capabilities ───────────────────────────────────────────────────
pub use crate::device::{
    AnalogIoCapable, Capabilities, Controller, Device, DigitalIoCapable, MotionCapable,
    UserMemoryCapable,
};

// ─── Types ──────────────────────────────────────────────────────────
pub use crate::channel::{Channel, IoAddress, IoLayout};
pub use crate::profile::{MotionProfile, ProfileKind, ResolvedProfile};
pub use crate::types::{
    AnalogSample, AnalogWidth, AxisState, AxisStatusBits, CommandMode, ECamTable, FaultFlags,
    SyncPair,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::MAX_AXES;
