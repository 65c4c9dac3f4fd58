//! Registry of active synchronized-motion bindings.
//!
//! Cam tables live from a successful start until stop. Gear pairs live until
//! cleared, superseded by a new ratio for the same slave, or the slave is
//! disabled. Entries are recorded only after the vendor accepted the call.

use motion_common::channel::Channel;
use motion_common::error::{MotionError, MotionResult};
use motion_common::types::{ECamTable, SyncPair};
use std::collections::HashMap;

/// Active cam tables and gear pairs of one device.
#[derive(Debug, Default)]
pub struct SyncRegistry {
    ecams: HashMap<u32, ECamTable>,
    gears: HashMap<Channel, SyncPair>,
}

impl SyncRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `table_index` is already running.
    pub fn ensure_ecam_free(&self, table_index: u32) -> MotionResult<()> {
        if self.ecams.contains_key(&table_index) {
            return Err(MotionError::InvalidState(format!(
                "cam table {table_index} is already running"
            )));
        }
        Ok(())
    }

    /// Fail if `slave` cannot start following a cam: it already follows a
    /// cam table or is geared to any master.
    pub fn ensure_cam_slave_free(&self, slave: Channel) -> MotionResult<()> {
        self.ensure_not_cam_slave(slave)?;
        if let Some(pair) = self.gears.get(&slave) {
            return Err(MotionError::InvalidState(format!(
                "axis {slave} is geared to axis {}; clear it first",
                pair.master
            )));
        }
        Ok(())
    }

    /// Fail if `slave` cannot be geared to `master`. Re-gearing to the same
    /// master is allowed and replaces the ratio.
    pub fn ensure_gear_slave_free(&self, slave: Channel, master: Channel) -> MotionResult<()> {
        self.ensure_not_cam_slave(slave)?;
        if self.gears.get(&slave).is_some_and(|pair| pair.master != master) {
            return Err(MotionError::InvalidState(format!(
                "axis {slave} is geared to another master; clear it first"
            )));
        }
        Ok(())
    }

    fn ensure_not_cam_slave(&self, slave: Channel) -> MotionResult<()> {
        match self.ecams.values().find(|t| t.slave == slave) {
            Some(table) => Err(MotionError::InvalidState(format!(
                "axis {slave} already follows cam table {}",
                table.table_index
            ))),
            None => Ok(()),
        }
    }

    /// Record a started cam table.
    pub fn record_ecam(&mut self, table: ECamTable) {
        self.ecams.insert(table.table_index, table);
    }

    /// Forget a cam table, returning it if it was known.
    pub fn remove_ecam(&mut self, table_index: u32) -> Option<ECamTable> {
        self.ecams.remove(&table_index)
    }

    /// Cam table by index.
    pub fn ecam(&self, table_index: u32) -> Option<&ECamTable> {
        self.ecams.get(&table_index)
    }

    /// Record an engaged gear pair, returning the pair it supersedes.
    pub fn record_gear(&mut self, pair: SyncPair) -> Option<SyncPair> {
        self.gears.insert(pair.slave, pair)
    }

    /// Forget the gear pair of `slave`.
    pub fn release_gear(&mut self, slave: Channel) -> Option<SyncPair> {
        self.gears.remove(&slave)
    }

    /// Gear pair of `slave`.
    pub fn gear(&self, slave: Channel) -> Option<&SyncPair> {
        self.gears.get(&slave)
    }

    /// Number of active bindings.
    pub fn len(&self) -> usize {
        self.ecams.len() + self.gears.len()
    }

    /// No active bindings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_common::profile::MotionProfile;

    fn pair(master: u32, slave: u32, ratio: f64) -> SyncPair {
        SyncPair {
            master: Channel::new(master),
            slave: Channel::new(slave),
            gear_ratio: ratio,
            ramp: MotionProfile::trapezoidal(10.0, 100.0, 100.0),
        }
    }

    #[test]
    fn ecam_lifecycle() {
        let mut reg = SyncRegistry::new();
        let table =
            ECamTable::new(2, Channel::new(0), Channel::new(1), &[0.0, 1.0], &[0.0, 2.0]).unwrap();
        reg.ensure_ecam_free(2).unwrap();
        reg.record_ecam(table);
        assert!(matches!(
            reg.ensure_ecam_free(2),
            Err(MotionError::InvalidState(_))
        ));
        assert!(reg.ensure_gear_slave_free(Channel::new(1), Channel::new(0)).is_err());
        assert!(reg.ensure_cam_slave_free(Channel::new(1)).is_err());
        assert!(reg.remove_ecam(2).is_some());
        assert!(reg.is_empty());
    }

    #[test]
    fn gear_supersede_and_release() {
        let mut reg = SyncRegistry::new();
        assert!(reg.record_gear(pair(0, 1, 2.0)).is_none());
        reg.ensure_gear_slave_free(Channel::new(1), Channel::new(0)).unwrap();
        assert!(reg.ensure_gear_slave_free(Channel::new(1), Channel::new(3)).is_err());
        // a geared slave cannot start a cam, whatever the cam's master
        assert!(matches!(
            reg.ensure_cam_slave_free(Channel::new(1)),
            Err(MotionError::InvalidState(_))
        ));

        let old = reg.record_gear(pair(0, 1, 0.5)).unwrap();
        assert_eq!(old.gear_ratio, 2.0);
        assert_eq!(reg.gear(Channel::new(1)).unwrap().gear_ratio, 0.5);

        assert!(reg.release_gear(Channel::new(1)).is_some());
        assert!(reg.release_gear(Channel::new(1)).is_none());
    }
}
