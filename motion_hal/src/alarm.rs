//! Alarm reset sequencing.
//!
//! A reset is an edge on the drive's reset line: assert, hold for the
//! debounce delay so the controller latches it, deassert. Whether a healthy
//! axis is pulsed at all is decided by [`AlarmResetPolicy`].

use motion_common::config::{AlarmConfig, AlarmResetPolicy};
use motion_common::error::MotionResult;
use std::time::Duration;

/// Reset pulse settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmReset {
    /// Skip or always pulse
    pub policy: AlarmResetPolicy,
    /// Assert-to-deassert hold time
    pub debounce: Duration,
}

impl From<&AlarmConfig> for AlarmReset {
    fn from(config: &AlarmConfig) -> Self {
        Self {
            policy: config.reset_policy,
            debounce: config.debounce(),
        }
    }
}

impl Default for AlarmReset {
    fn default() -> Self {
        Self::from(&AlarmConfig::default())
    }
}

impl AlarmReset {
    /// Assert, hold, deassert.
    ///
    /// If asserting fails nothing else is issued. A failed deassert is
    /// reported as is; the line may remain asserted.
    pub fn pulse(&self, mut set_reset: impl FnMut(bool) -> MotionResult<()>) -> MotionResult<()> {
        set_reset(true)?;
        std::thread::sleep(self.debounce);
        set_reset(false)
    }
}
