//! Motion profiles and the jerk calculator.
//!
//! A jerk-ratio S-curve is described by cruise velocity `v`, ramp rate `a`
//! and a dimensionless ratio `r` per ramp. The ramp lasts `t = v / a` and the
//! jerk for that ramp is
//!
//! ```text
//! j = v / (r * t^2) = a^2 / (r * v)
//! ```
//!
//! The acceleration ramp uses `acceleration` and `accel_jerk_ratio`, the
//! deceleration ramp uses `deceleration` and `decel_jerk_ratio`. Trapezoidal
//! profiles carry no jerk. Jog profiles compute jerk against `|v|` and keep
//! the sign of `v` as the direction.
//!
//! Validation happens in [`MotionProfile::resolve`], before any vendor call:
//! non-positive rates or ratios are rejected, never clamped.

use crate::error::{MotionError, MotionResult};
use serde::{Deserialize, Serialize};

/// Profile shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Constant acceleration, no jerk phase.
    Trapezoidal,
    /// Jerk-limited S-curve derived from jerk ratios.
    JerkRatioSCurve,
    /// Continuous velocity (jog); velocity sign encodes direction.
    VelocityJog,
}

/// Requested motion profile as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Profile shape
    pub kind: ProfileKind,
    /// Cruise velocity (signed for jogs)
    pub velocity: f64,
    /// Acceleration ramp rate
    pub acceleration: f64,
    /// Deceleration ramp rate
    pub deceleration: f64,
    /// Fraction of the acceleration ramp spent in jerk transition
    pub accel_jerk_ratio: f64,
    /// Fraction of the deceleration ramp spent in jerk transition
    pub decel_jerk_ratio: f64,
}

impl MotionProfile {
    /// Trapezoidal point-to-point profile.
    pub const fn trapezoidal(velocity: f64, acceleration: f64, deceleration: f64) -> Self {
        Self {
            kind: ProfileKind::Trapezoidal,
            velocity,
            acceleration,
            deceleration,
            accel_jerk_ratio: 0.0,
            decel_jerk_ratio: 0.0,
        }
    }

    /// Jerk-ratio S-curve point-to-point profile.
    pub const fn s_curve(
        velocity: f64,
        acceleration: f64,
        deceleration: f64,
        accel_jerk_ratio: f64,
        decel_jerk_ratio: f64,
    ) -> Self {
        Self {
            kind: ProfileKind::JerkRatioSCurve,
            velocity,
            acceleration,
            deceleration,
            accel_jerk_ratio,
            decel_jerk_ratio,
        }
    }

    /// Velocity jog profile. The sign of `velocity` is the direction.
    pub const fn jog(
        velocity: f64,
        acceleration: f64,
        deceleration: f64,
        accel_jerk_ratio: f64,
        decel_jerk_ratio: f64,
    ) -> Self {
        Self {
            kind: ProfileKind::VelocityJog,
            velocity,
            acceleration,
            deceleration,
            accel_jerk_ratio,
            decel_jerk_ratio,
        }
    }

    /// The same profile issued as a trapezoid (jerk ratios dropped).
    pub const fn as_trapezoidal(&self) -> Self {
        Self::trapezoidal(self.velocity, self.acceleration, self.deceleration)
    }

    /// Validate and derive the per-ramp jerk.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::InvalidParameter`] when any rate is not a
    /// positive finite number, when a point-to-point velocity is not positive,
    /// or when an S-curve/jog jerk ratio is not positive.
    pub fn resolve(&self) -> MotionResult<ResolvedProfile> {
        let speed = match self.kind {
            ProfileKind::VelocityJog => self.velocity.abs(),
            ProfileKind::Trapezoidal | ProfileKind::JerkRatioSCurve => self.velocity,
        };
        positive("velocity", speed)?;
        positive("acceleration", self.acceleration)?;
        positive("deceleration", self.deceleration)?;

        let (accel_jerk, decel_jerk) = match self.kind {
            ProfileKind::Trapezoidal => (0.0, 0.0),
            ProfileKind::JerkRatioSCurve | ProfileKind::VelocityJog => (
                jerk_from_ratio(speed, self.acceleration, self.accel_jerk_ratio)?,
                jerk_from_ratio(speed, self.deceleration, self.decel_jerk_ratio)?,
            ),
        };

        Ok(ResolvedProfile {
            kind: self.kind,
            velocity: self.velocity,
            speed,
            acceleration: self.acceleration,
            deceleration: self.deceleration,
            accel_jerk_ratio: self.accel_jerk_ratio,
            decel_jerk_ratio: self.decel_jerk_ratio,
            accel_jerk,
            decel_jerk,
        })
    }
}

/// Validated profile with derived jerk, computed at issue time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedProfile {
    /// Profile shape
    pub kind: ProfileKind,
    /// Signed velocity as requested
    pub velocity: f64,
    /// Velocity magnitude used for ramps
    pub speed: f64,
    /// Acceleration ramp rate
    pub acceleration: f64,
    /// Deceleration ramp rate
    pub deceleration: f64,
    /// Acceleration jerk ratio
    pub accel_jerk_ratio: f64,
    /// Deceleration jerk ratio
    pub decel_jerk_ratio: f64,
    /// Derived acceleration-ramp jerk (0 for trapezoids)
    pub accel_jerk: f64,
    /// Derived deceleration-ramp jerk (0 for trapezoids)
    pub decel_jerk: f64,
}

impl ResolvedProfile {
    /// Duration of the acceleration ramp `v / a` [s].
    #[inline]
    pub fn accel_time(&self) -> f64 {
        self.speed / self.acceleration
    }

    /// Duration of the deceleration ramp `v / d` [s].
    #[inline]
    pub fn decel_time(&self) -> f64 {
        self.speed / self.deceleration
    }

    /// Returns true when the velocity requests negative travel.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.velocity < 0.0
    }
}

/// Jerk for one ramp: `a^2 / (r * v)`.
///
/// # Errors
///
/// Returns [`MotionError::InvalidParameter`] when `velocity`, `acceleration`
/// or `ratio` is not a positive finite number.
pub fn jerk_from_ratio(velocity: f64, acceleration: f64, ratio: f64) -> MotionResult<f64> {
    positive("velocity", velocity)?;
    positive("acceleration", acceleration)?;
    positive("jerk ratio", ratio)?;
    Ok(acceleration * acceleration / (ratio * velocity))
}

fn positive(name: &str, value: f64) -> MotionResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MotionError::invalid(format!(
            "{name} must be a positive finite number (got {value})"
        )))
    }
}
