//! Motion Common Library
//!
//! Shared vocabulary for the motion HAL workspace: the capability contract a
//! vendor backend implements, the types that flow across it, and the
//! configuration that selects and tunes a backend.
//!
//! # Module Structure
//!
//! - [`consts`] - Limits, timing defaults and addressing constants
//! - [`error`] - Common error taxonomy (`MotionError`)
//! - [`channel`] - Logical channels and digital IO addressing
//! - [`profile`] - Motion profiles and the jerk calculator
//! - [`types`] - Command modes, axis snapshots, status bits, sync descriptors
//! - [`device`] - Capability traits (`MotionCapable`, `DigitalIoCapable`, ...)
//! - [`config`] - TOML configuration loading
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use motion_common::prelude::*;
//!
//! let profile = MotionProfile::s_curve(100.0, 500.0, 500.0, 0.5, 0.5);
//! let jerk = profile.resolve().unwrap().accel_jerk;
//! assert!((jerk - 500.0 * 500.0 / (0.5 * 100.0)).abs() < 1e-9);
//! ```

pub mod channel;
pub mod config;
pub mod consts;
pub mod device;
pub mod error;
pub mod prelude;
pub mod profile;
pub mod types;
