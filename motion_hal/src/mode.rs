//! Per-axis command-mode tracking.
//!
//! The controller owns the authoritative mode. The tracker only remembers the
//! last mode this device established on each axis so a repeated request does
//! not cost another query or switch. Stops always ask the controller.

use motion_common::channel::Channel;
use motion_common::error::{MotionError, MotionResult};
use motion_common::types::CommandMode;

/// Outcome of planning a mode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    /// Axis is already in the requested mode.
    Unchanged,
    /// The vendor switch must be issued.
    Switch {
        /// Mode reported by the controller (`None` if unrecognized)
        from: Option<CommandMode>,
        /// Requested mode
        to: CommandMode,
    },
}

/// Stop primitive matching a command mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    /// Position-move deceleration stop
    Position,
    /// Jog deceleration stop
    Velocity,
    /// Torque command release
    Torque,
}

impl StopAction {
    /// Stop primitive for a raw vendor mode.
    ///
    /// # Errors
    ///
    /// [`MotionError::InvalidState`] when the mode is not recognized. There
    /// is no fallback stop.
    pub fn for_raw_mode(channel: Channel, raw: i32) -> MotionResult<Self> {
        match CommandMode::from_raw(raw) {
            Some(CommandMode::Position) => Ok(StopAction::Position),
            Some(CommandMode::Velocity) => Ok(StopAction::Velocity),
            Some(CommandMode::Torque) => Ok(StopAction::Torque),
            None => Err(MotionError::InvalidState(format!(
                "axis {channel} is in unknown command mode {raw}; no stop primitive"
            ))),
        }
    }
}

/// Last established command mode per axis.
#[derive(Debug, Clone)]
pub struct CommandModeTracker {
    modes: Vec<Option<CommandMode>>,
}

impl CommandModeTracker {
    /// Tracker for `axis_count` axes, all unknown.
    pub fn new(axis_count: usize) -> Self {
        Self {
            modes: vec![None; axis_count],
        }
    }

    /// Mode this device last established, if any.
    #[inline]
    pub fn last_known(&self, channel: Channel) -> Option<CommandMode> {
        self.modes.get(channel.as_usize()).copied().flatten()
    }

    /// Returns true when the cached mode already equals `mode`.
    #[inline]
    pub fn is_current(&self, channel: Channel, mode: CommandMode) -> bool {
        self.last_known(channel) == Some(mode)
    }

    /// Compare the controller's raw mode with the request.
    pub fn plan(raw_current: i32, requested: CommandMode) -> ModeTransition {
        match CommandMode::from_raw(raw_current) {
            Some(current) if current == requested => ModeTransition::Unchanged,
            from => ModeTransition::Switch {
                from,
                to: requested,
            },
        }
    }

    /// Remember the mode now in effect.
    pub fn record(&mut self, channel: Channel, mode: CommandMode) {
        if let Some(slot) = self.modes.get_mut(channel.as_usize()) {
            *slot = Some(mode);
        }
    }

    /// Drop the cached mode so the next request queries the controller.
    pub fn forget(&mut self, channel: Channel) {
        if let Some(slot) = self.modes.get_mut(channel.as_usize()) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_skips_matching_mode() {
        assert_eq!(
            CommandModeTracker::plan(CommandMode::Velocity.raw(), CommandMode::Velocity),
            ModeTransition::Unchanged
        );
        assert_eq!(
            CommandModeTracker::plan(CommandMode::Position.raw(), CommandMode::Torque),
            ModeTransition::Switch {
                from: Some(CommandMode::Position),
                to: CommandMode::Torque
            }
        );
        assert_eq!(
            CommandModeTracker::plan(42, CommandMode::Position),
            ModeTransition::Switch {
                from: None,
                to: CommandMode::Position
            }
        );
    }

    #[test]
    fn record_and_forget() {
        let ch = Channel::new(1);
        let mut tracker = CommandModeTracker::new(2);
        assert_eq!(tracker.last_known(ch), None);
        tracker.record(ch, CommandMode::Torque);
        assert!(tracker.is_current(ch, CommandMode::Torque));
        assert!(!tracker.is_current(Channel::new(0), CommandMode::Torque));
        tracker.forget(ch);
        assert_eq!(tracker.last_known(ch), None);

        // out of range is ignored
        tracker.record(Channel::new(9), CommandMode::Velocity);
        assert_eq!(tracker.last_known(Channel::new(9)), None);
    }

    #[test]
    fn stop_action_dispatch() {
        let ch = Channel::new(0);
        assert_eq!(
            StopAction::for_raw_mode(ch, CommandMode::Torque.raw()).unwrap(),
            StopAction::Torque
        );
        assert_eq!(
            StopAction::for_raw_mode(ch, CommandMode::Velocity.raw()).unwrap(),
            StopAction::Velocity
        );
        assert!(matches!(
            StopAction::for_raw_mode(ch, 7),
            Err(MotionError::InvalidState(_))
        ));
    }
}
