//! # Motion HAL Library
//!
//! Translates one uniform set of motion, IO and user-memory commands into
//! calls on a vendor motion-controller SDK, and keeps the small amount of
//! state the vendors leave to the caller: last commanded mode per axis,
//! active synchronization bindings, and the session lifetime.
//!
//! # Module Structure
//!
//! - [`sdk`] - Vendor SDK boundary (`MotionSdk`)
//! - [`session`] - Scoped vendor session: init sequence and teardown
//! - [`status`] - Vendor status code interpretation
//! - [`backend`] - Per-backend behaviour table (`BackendPolicy`)
//! - [`device`] - `MotionDevice`, the capability implementation
//! - [`mode`] - Command-mode cache and stop dispatch
//! - [`wait`] - Bounded motion-complete polling
//! - [`alarm`] - Alarm reset pulse
//! - [`sync`] - E-CAM and gear bookkeeping
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         motion_hal                               │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌────────────────┐   │
//! │  │  Driver     │───►│  MotionDevice<S> │◄──►│ BackendPolicy  │   │
//! │  │  Registry   │    │  (capabilities)  │    │ + StatusTable  │   │
//! │  └─────────────┘    └────────┬─────────┘    └────────────────┘   │
//! │                              │                                   │
//! │                              ▼                                   │
//! │                     ┌─────────────────┐                          │
//! │                     │  Session<S>     │ (closes on drop)         │
//! │                     └────────┬────────┘                          │
//! │                              ▼                                   │
//! │                     ┌─────────────────┐                          │
//! │                     │  MotionSdk      │ (vendor / simulation)    │
//! │                     └─────────────────┘                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod alarm;
pub mod backend;
pub mod device;
pub mod driver_registry;
pub mod drivers;
pub mod mode;
pub mod sdk;
pub mod session;
pub mod status;
pub mod sync;
pub mod wait;

// Re-export key types for convenience
pub use crate::backend::{BackendPolicy, MotionFeatures};
pub use crate::device::MotionDevice;
pub use crate::driver_registry::{DriverFactory, DriverRegistry};
pub use crate::sdk::{MotionSdk, StatusCode};
pub use crate::session::Session;
