//! System-wide constants for the motion HAL workspace.
//!
//! Single source of truth for numeric limits, timing defaults and IO
//! addressing widths. Imported by all crates.

use static_assertions::const_assert;

/// Canonical service name (used for logging and the CLI).
pub const HAL_SERVICE_NAME: &str = "motion_hal";

/// Maximum number of motion axes per device.
pub const MAX_AXES: usize = 64;

/// Maximum number of digital inputs per device.
pub const MAX_DI: usize = 1024;

/// Maximum number of digital outputs per device.
pub const MAX_DO: usize = 1024;

/// Maximum number of analog inputs per device.
pub const MAX_AI: usize = 256;

/// Maximum number of analog outputs per device.
pub const MAX_AO: usize = 256;

/// Default bits per slot for word-oriented IO backends.
pub const DEFAULT_BITS_PER_SLOT: u32 = 16;

/// Bits per byte for byte-oriented IO backends.
pub const BITS_PER_BYTE: u32 = 8;

/// Widest IO word the addressing layer can mask.
pub const MAX_BITS_PER_SLOT: u32 = 32;

/// Default interval between `IsMoving` queries while waiting [ms].
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Default ceiling for `Wait(channel)` without an explicit timeout [ms].
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 3 * 60 * 1000;

/// Hold time between alarm-reset assert and deassert [ms].
pub const DEFAULT_ALARM_DEBOUNCE_MS: u64 = 100;

/// Default timeout for starting vendor communication [ms].
pub const DEFAULT_START_COMMUNICATION_TIMEOUT_MS: u32 = 5000;

/// Default device name announced to the vendor runtime.
pub const DEFAULT_DEVICE_NAME: &str = "motion_hal";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/motion_hal/device.toml";

const_assert!(DEFAULT_BITS_PER_SLOT <= MAX_BITS_PER_SLOT);
const_assert!(BITS_PER_BYTE <= MAX_BITS_PER_SLOT);
const_assert!(DEFAULT_POLL_INTERVAL_MS > 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(MAX_AXES > 0 && MAX_AXES <= 256);
        assert!(MAX_DI > 0);
        assert!(MAX_DO > 0);
        assert!(MAX_AI > 0);
        assert!(MAX_AO > 0);
        assert!(DEFAULT_WAIT_TIMEOUT_MS > DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn io_counts_fill_whole_words() {
        assert_eq!(MAX_DI % DEFAULT_BITS_PER_SLOT as usize, 0);
        assert_eq!(MAX_DO % BITS_PER_BYTE as usize, 0);
    }
}
