//! Bounded blocking wait for motion completion.
//!
//! The vendors offer no completion event, so waiting is a sleep-poll loop on
//! the motion status. The loop's only side effects are the status queries and
//! time passing. A zero timeout is already expired: the status is queried
//! once and a still-moving axis times out immediately.

use motion_common::channel::Channel;
use motion_common::config::WaitConfig;
use motion_common::error::{MotionError, MotionResult};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Poll interval and default deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between status queries
    pub poll_interval: Duration,
    /// Deadline used when the caller gives none
    pub default_timeout: Duration,
}

impl From<&WaitConfig> for WaitPolicy {
    fn from(config: &WaitConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            default_timeout: config.default_timeout(),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

impl WaitPolicy {
    /// Poll `is_moving` until it reports false or `timeout` elapses.
    ///
    /// Sleeps never overshoot the deadline by more than one poll interval.
    ///
    /// # Errors
    ///
    /// [`MotionError::Timeout`] carrying the channel and the elapsed time, or
    /// the first error returned by `is_moving`.
    pub fn poll_until_idle(
        &self,
        channel: Channel,
        timeout: Duration,
        mut is_moving: impl FnMut() -> MotionResult<bool>,
    ) -> MotionResult<()> {
        let start = Instant::now();
        let mut polls: u64 = 0;
        loop {
            polls += 1;
            if !is_moving()? {
                trace!(%channel, polls, "Motion complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!(%channel, ?elapsed, polls, "Wait timed out");
                return Err(MotionError::Timeout { channel, elapsed });
            }
            std::thread::sleep(self.poll_interval.min(timeout - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> WaitPolicy {
        WaitPolicy {
            poll_interval: Duration::from_millis(1),
            default_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn returns_when_motion_ends() {
        let mut remaining = 3;
        let result = policy().poll_until_idle(Channel::new(0), Duration::from_secs(1), || {
            remaining -= 1;
            Ok(remaining > 0)
        });
        assert!(result.is_ok());
        assert_eq!(remaining, 0);
    }

    #[test]
    fn zero_timeout_queries_once() {
        let mut queries = 0;
        let err = policy()
            .poll_until_idle(Channel::new(4), Duration::ZERO, || {
                queries += 1;
                Ok(true)
            })
            .unwrap_err();
        assert_eq!(queries, 1);
        assert!(matches!(err, MotionError::Timeout { channel, .. } if channel == Channel::new(4)));
    }

    #[test]
    fn zero_timeout_idle_axis_succeeds() {
        assert!(policy()
            .poll_until_idle(Channel::new(0), Duration::ZERO, || Ok(false))
            .is_ok());
    }

    #[test]
    fn query_error_propagates() {
        let err = policy()
            .poll_until_idle(Channel::new(0), Duration::from_secs(1), || {
                Err(MotionError::Connection("lost".into()))
            })
            .unwrap_err();
        assert!(matches!(err, MotionError::Connection(_)));
    }

    #[test]
    fn timeout_elapsed_is_bounded() {
        let timeout = Duration::from_millis(20);
        let policy = policy();
        let err = policy
            .poll_until_idle(Channel::new(0), timeout, || Ok(true))
            .unwrap_err();
        match err {
            MotionError::Timeout { elapsed, .. } => {
                assert!(elapsed >= timeout);
                // sleeps are clamped to the deadline; allow for scheduling slack
                let slack = Duration::from_millis(10);
                assert!(
                    elapsed <= timeout + policy.poll_interval + slack,
                    "overshot deadline: {elapsed:?}"
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
