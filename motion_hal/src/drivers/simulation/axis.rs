//! Axis kinematics for the simulated controller.
//!
//! Each axis integrates its velocity toward the active drive target with the
//! acceleration and deceleration limits of the issued profile. Jerk is not
//! modelled. Followers (gear, cam) are positioned from their master after
//! the masters have been advanced.

use motion_common::profile::ResolvedProfile;
use motion_common::types::{AxisStatusBits, FaultFlags};
use tracing::trace;

/// Integration step [s].
pub const STEP_S: f64 = 0.001;

/// Below this speed an axis counts as stopped.
const STANDSTILL: f64 = 1e-6;

/// Positions closer than this are considered reached.
const POSITION_WINDOW: f64 = 1e-6;

/// Home sensor window around position zero.
const HOME_WINDOW: f64 = 1e-3;

/// What currently drives the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drive {
    /// At rest or coasting down.
    Idle {
        /// Deceleration used to come to rest
        deceleration: f64,
    },
    /// Point-to-point move.
    Position {
        /// Target command position
        target: f64,
        /// Cruise speed
        speed: f64,
        /// Acceleration limit
        acceleration: f64,
        /// Deceleration limit
        deceleration: f64,
    },
    /// Jog.
    Velocity {
        /// Signed cruise velocity
        velocity: f64,
        /// Acceleration limit
        acceleration: f64,
        /// Deceleration limit
        deceleration: f64,
    },
    /// Torque command; the simulated load does not move.
    Torque(f64),
    /// Gear follower.
    Gear {
        /// Master axis
        master: u32,
        /// Slave displacement per master displacement
        ratio: f64,
        /// Master position at engagement
        master_origin: f64,
        /// Slave position at engagement
        slave_origin: f64,
        /// Ramp acceleration used to catch up with the master
        acceleration: f64,
        /// Slave has caught up and follows the ratio exactly
        locked: bool,
    },
    /// Cam follower.
    Cam {
        /// Table index in the controller
        table_index: u32,
    },
}

/// One simulated axis.
#[derive(Debug, Clone)]
pub struct AxisSimulator {
    /// Axis number
    pub index: u32,
    /// Servo energized
    pub servo_on: bool,
    /// Raw command mode
    pub mode_raw: i32,
    /// Commanded position
    pub command_position: f64,
    /// Feedback position
    pub actual_position: f64,
    /// Current velocity
    pub velocity: f64,
    /// Active drive
    pub drive: Drive,
    /// Alarm cleared by a reset pulse
    pub alarm: bool,
    /// Alarm that survives reset pulses
    pub latched_alarm: bool,
    /// Latched safety faults
    pub faults: FaultFlags,
    /// Report MOVING regardless of kinematics
    pub hold_moving: bool,
    /// Negative limit switch
    pub negative_limit: bool,
    /// Positive limit switch
    pub positive_limit: bool,
    /// Reset line state
    pub reset_asserted: bool,
}

impl AxisSimulator {
    /// Axis at rest at zero, servo off, position mode.
    pub fn new(index: u32) -> Self {
        Self {
            index,
            servo_on: false,
            mode_raw: 0,
            command_position: 0.0,
            actual_position: 0.0,
            velocity: 0.0,
            drive: Drive::Idle { deceleration: 0.0 },
            alarm: false,
            latched_alarm: false,
            faults: FaultFlags::empty(),
            hold_moving: false,
            negative_limit: false,
            positive_limit: false,
            reset_asserted: false,
        }
    }

    /// Any alarm condition present.
    pub fn is_alarmed(&self) -> bool {
        self.alarm || self.latched_alarm || self.faults.is_alarm()
    }

    /// Motion in progress.
    pub fn is_moving(&self) -> bool {
        if self.hold_moving {
            return true;
        }
        match self.drive {
            Drive::Position { target, .. } => {
                (target - self.command_position).abs() > POSITION_WINDOW
                    || self.velocity.abs() > STANDSTILL
            }
            Drive::Gear { locked, .. } => !locked || self.velocity.abs() > STANDSTILL,
            Drive::Velocity { .. } | Drive::Cam { .. } => true,
            Drive::Idle { .. } | Drive::Torque(_) => self.velocity.abs() > STANDSTILL,
        }
    }

    /// Status word.
    pub fn status(&self) -> AxisStatusBits {
        let mut bits = AxisStatusBits::empty();
        bits.set(AxisStatusBits::SERVO_ON, self.servo_on);
        bits.set(AxisStatusBits::ALARM, self.is_alarmed());
        bits.set(AxisStatusBits::MOVING, self.is_moving());
        bits.set(AxisStatusBits::HOME, self.actual_position.abs() <= HOME_WINDOW);
        bits.set(AxisStatusBits::NEGATIVE_LIMIT, self.negative_limit);
        bits.set(AxisStatusBits::POSITIVE_LIMIT, self.positive_limit);
        bits.set(AxisStatusBits::IN_POSITION, !self.is_moving());
        bits
    }

    /// Start a point-to-point move.
    pub fn start_position(&mut self, target: f64, profile: &ResolvedProfile) {
        self.drive = Drive::Position {
            target,
            speed: profile.speed,
            acceleration: profile.acceleration,
            deceleration: profile.deceleration,
        };
    }

    /// Start a jog.
    pub fn start_velocity(&mut self, profile: &ResolvedProfile) {
        self.drive = Drive::Velocity {
            velocity: profile.velocity,
            acceleration: profile.acceleration,
            deceleration: profile.deceleration,
        };
    }

    /// Decelerate to rest with the active profile's deceleration.
    pub fn decelerate(&mut self) {
        let deceleration = match self.drive {
            Drive::Position { deceleration, .. } | Drive::Velocity { deceleration, .. } => {
                deceleration
            }
            Drive::Idle { deceleration } => deceleration,
            Drive::Torque(_) | Drive::Gear { .. } | Drive::Cam { .. } => 0.0,
        };
        self.drive = Drive::Idle { deceleration };
    }

    /// Stop without deceleration.
    pub fn halt(&mut self) {
        self.velocity = 0.0;
        self.drive = Drive::Idle { deceleration: 0.0 };
    }

    /// Overwrite the commanded position.
    pub fn set_command_position(&mut self, position: f64) {
        self.command_position = position;
        if let Drive::Position { target, .. } = &mut self.drive {
            *target = position;
        }
    }

    /// Advance a self-driven axis by `dt` seconds. Followers are positioned
    /// separately.
    pub fn advance(&mut self, dt: f64) {
        if !self.servo_on || self.is_alarmed() {
            self.halt();
            return;
        }
        let mut remaining = dt;
        while remaining > 0.0 {
            let step = remaining.min(STEP_S);
            self.step(step);
            remaining -= step;
        }
    }

    fn step(&mut self, dt: f64) {
        match self.drive {
            Drive::Position {
                target,
                speed,
                acceleration,
                deceleration,
            } => self.step_position(dt, target, speed, acceleration, deceleration),
            Drive::Velocity {
                velocity,
                acceleration,
                deceleration,
            } => {
                let rate = if velocity.abs() >= self.velocity.abs() {
                    acceleration
                } else {
                    deceleration
                };
                self.approach_velocity(velocity, rate * dt);
                self.integrate(dt);
            }
            Drive::Idle { deceleration } => self.decelerate_to_stop(dt, deceleration),
            Drive::Torque(_) | Drive::Gear { .. } | Drive::Cam { .. } => {}
        }
    }

    fn step_position(&mut self, dt: f64, target: f64, speed: f64, accel: f64, decel: f64) {
        let error = target - self.command_position;
        if error.abs() <= POSITION_WINDOW && self.velocity.abs() <= accel * dt {
            self.move_to(target);
            return;
        }

        // Fastest speed from which the target can still be reached at `decel`.
        let braking = (2.0 * decel * error.abs()).sqrt();
        let desired = error.signum() * speed.min(braking);
        let rate = if desired.abs() >= self.velocity.abs() { accel } else { decel };
        self.approach_velocity(desired, rate * dt);

        let travel = self.velocity * dt;
        if travel.abs() >= error.abs() && travel.signum() == error.signum() {
            self.move_to(target);
        } else {
            self.integrate(dt);
        }

        trace!(
            axis = self.index,
            pos = self.command_position,
            vel = self.velocity,
            target,
            "Position step"
        );
    }

    fn decelerate_to_stop(&mut self, dt: f64, deceleration: f64) {
        if self.velocity.abs() <= STANDSTILL || deceleration <= 0.0 {
            self.velocity = 0.0;
            return;
        }
        self.approach_velocity(0.0, deceleration * dt);
        self.integrate(dt);
    }

    fn approach_velocity(&mut self, desired: f64, max_change: f64) {
        let change = (desired - self.velocity).clamp(-max_change, max_change);
        self.velocity += change;
    }

    fn integrate(&mut self, dt: f64) {
        let delta = self.velocity * dt;
        self.command_position += delta;
        self.actual_position += delta;
    }

    fn move_to(&mut self, target: f64) {
        let delta = target - self.command_position;
        self.command_position = target;
        self.actual_position += delta;
        self.velocity = 0.0;
    }

    /// Place a follower at `position`.
    pub fn follow(&mut self, position: f64) {
        let delta = position - self.command_position;
        self.command_position = position;
        self.actual_position += delta;
    }

    /// Advance a gear slave whose ratio target moved from `from` to `to`
    /// during the last `dt` seconds.
    ///
    /// Until locked, the slave chases the target with its velocity change
    /// bounded by the ramp acceleration. It locks once position and velocity
    /// error are within one integration step of the target and follows the
    /// ratio exactly from then on.
    pub fn follow_gear(&mut self, dt: f64, from: f64, to: f64) {
        let Drive::Gear {
            acceleration,
            locked,
            ..
        } = self.drive
        else {
            return;
        };
        let target_velocity = (to - from) / dt;
        if locked || acceleration <= 0.0 {
            self.lock_gear(to, target_velocity);
            return;
        }

        let steps = (dt / STEP_S).ceil().max(1.0);
        let step = dt / steps;
        let max_change = acceleration * step;
        for i in 1..=steps as usize {
            let target = from + (to - from) * (i as f64 / steps);
            let error = target - self.command_position;
            if error.abs() <= 4.0 * max_change * step
                && (self.velocity - target_velocity).abs() <= 4.0 * max_change
            {
                trace!(axis = self.index, error, "Gear locked");
                self.lock_gear(to, target_velocity);
                return;
            }
            let braking = (2.0 * acceleration * error.abs()).sqrt();
            self.approach_velocity(target_velocity + error.signum() * braking, max_change);
            self.integrate(step);
        }
    }

    fn lock_gear(&mut self, position: f64, velocity: f64) {
        if let Drive::Gear { locked, .. } = &mut self.drive {
            *locked = true;
        }
        self.velocity = velocity;
        self.follow(position);
    }
}

/// Slave position on a repeating cam table at `master_position`.
///
/// The table repeats every master span; the slave carries the accumulated
/// slave span of each completed cycle. Between points the slave is linearly
/// interpolated.
pub fn cam_position(master: &[f64], slave: &[f64], master_position: f64) -> f64 {
    let (Some(&m0), Some(&m_end)) = (master.first(), master.last()) else {
        return 0.0;
    };
    let (Some(&s0), Some(&s_end)) = (slave.first(), slave.last()) else {
        return 0.0;
    };
    let span = m_end - m0;
    if span <= 0.0 {
        return s0;
    }
    let cycles = ((master_position - m0) / span).floor();
    let local = master_position - cycles * span;
    let offset = cycles * (s_end - s0);

    let upper = master.partition_point(|&m| m <= local).clamp(1, master.len() - 1);
    let (ma, mb) = (master[upper - 1], master[upper]);
    let (sa, sb) = (slave[upper - 1], slave[upper]);
    let t = if mb > ma { (local - ma) / (mb - ma) } else { 0.0 };
    offset + sa + t * (sb - sa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_common::profile::MotionProfile;

    fn enabled_axis() -> AxisSimulator {
        let mut axis = AxisSimulator::new(0);
        axis.servo_on = true;
        axis
    }

    #[test]
    fn position_move_reaches_target() {
        let mut axis = enabled_axis();
        let profile = MotionProfile::trapezoidal(100.0, 1000.0, 1000.0).resolve().unwrap();
        axis.start_position(10.0, &profile);
        assert!(axis.is_moving());

        axis.advance(0.05);
        assert!(axis.command_position > 0.0 && axis.command_position < 10.0);
        assert!(axis.velocity <= 100.0 + 1e-9);

        axis.advance(1.0);
        assert!((axis.command_position - 10.0).abs() < 1e-9);
        assert!(!axis.is_moving());
        assert!(axis.status().contains(AxisStatusBits::IN_POSITION));
    }

    #[test]
    fn servo_off_axis_does_not_move() {
        let mut axis = AxisSimulator::new(0);
        let profile = MotionProfile::trapezoidal(100.0, 1000.0, 1000.0).resolve().unwrap();
        axis.start_position(10.0, &profile);
        axis.advance(1.0);
        assert_eq!(axis.command_position, 0.0);
    }

    #[test]
    fn jog_runs_until_decelerated() {
        let mut axis = enabled_axis();
        let profile = MotionProfile::jog(-50.0, 500.0, 500.0, 0.5, 0.5).resolve().unwrap();
        axis.start_velocity(&profile);
        axis.advance(0.5);
        assert!((axis.velocity + 50.0).abs() < 1e-6);
        assert!(axis.command_position < 0.0);

        axis.decelerate();
        axis.advance(0.5);
        assert_eq!(axis.velocity, 0.0);
        assert!(!axis.is_moving());
    }

    #[test]
    fn alarm_halts_axis() {
        let mut axis = enabled_axis();
        let profile = MotionProfile::trapezoidal(100.0, 1000.0, 1000.0).resolve().unwrap();
        axis.start_position(10.0, &profile);
        axis.alarm = true;
        axis.advance(0.1);
        assert_eq!(axis.velocity, 0.0);
        assert!(axis.status().contains(AxisStatusBits::ALARM));
    }

    fn geared_axis(acceleration: f64) -> AxisSimulator {
        let mut axis = enabled_axis();
        axis.index = 1;
        axis.drive = Drive::Gear {
            master: 0,
            ratio: 1.0,
            master_origin: 0.0,
            slave_origin: 0.0,
            acceleration,
            locked: false,
        };
        axis
    }

    #[test]
    fn gear_engagement_is_acceleration_limited() {
        // master at 100 units/s for 20 ms
        let mut slow = geared_axis(1.0);
        slow.follow_gear(0.02, 0.0, 2.0);
        assert!(slow.command_position < 1e-3, "slave at {}", slow.command_position);
        assert!(slow.velocity <= 0.02 + 1e-9);
        assert!(slow.is_moving());

        let mut fast = geared_axis(1e6);
        fast.follow_gear(0.02, 0.0, 2.0);
        assert!((fast.command_position - 2.0).abs() < 1e-9);
        assert!(matches!(fast.drive, Drive::Gear { locked: true, .. }));
    }

    #[test]
    fn gear_slave_catches_up_after_master_stops() {
        let mut axis = geared_axis(1000.0);
        axis.follow_gear(0.05, 0.0, 3.0);
        assert!(axis.command_position < 3.0);
        for _ in 0..100 {
            axis.follow_gear(0.01, 3.0, 3.0);
        }
        assert!((axis.command_position - 3.0).abs() < 1e-12);
        assert_eq!(axis.velocity, 0.0);
        assert!(!axis.is_moving());
    }

    #[test]
    fn cam_interpolates_and_repeats() {
        let master = [0.0, 10.0, 20.0];
        let slave = [0.0, 5.0, 5.0];
        assert!((cam_position(&master, &slave, 5.0) - 2.5).abs() < 1e-12);
        assert!((cam_position(&master, &slave, 15.0) - 5.0).abs() < 1e-12);
        // second cycle carries the slave span
        assert!((cam_position(&master, &slave, 25.0) - 7.5).abs() < 1e-12);
    }
}
