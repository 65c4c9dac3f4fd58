//! Per-backend vendor status tables.
//!
//! A [`StatusTable`] is the single place a backend's raw status codes are
//! turned into [`MotionError`]. Besides plain failures it knows two special
//! classes:
//!
//! - the code meaning "session not connected", mapped to
//!   [`MotionError::Connection`]
//! - limit-stop codes, which are the normal outcome of a move that ran into a
//!   limit switch. They are accepted only where a caller opts in through
//!   [`StatusTable::check_motion`].

use crate::sdk::StatusCode;
use motion_common::channel::Channel;
use motion_common::error::{MotionError, MotionResult};

/// Status code interpretation for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTable {
    /// Codes reporting a stop caused by a limit switch
    pub limit_stop_codes: &'static [i32],
    /// Code reporting a lost or closed session
    pub not_connected: i32,
}

impl StatusTable {
    /// Returns true when `code` is a limit-stop outcome.
    #[inline]
    pub fn is_limit_stop(&self, code: StatusCode) -> bool {
        self.limit_stop_codes.contains(&code.0)
    }

    /// Map a failed call to the common taxonomy.
    pub fn to_error(&self, channel: Option<Channel>, code: StatusCode, message: String) -> MotionError {
        if code.0 == self.not_connected {
            MotionError::Connection(message)
        } else {
            MotionError::Device {
                channel,
                code: code.0,
                message,
            }
        }
    }

    /// Strict check: every failure is an error.
    pub fn check<T>(
        &self,
        channel: Option<Channel>,
        result: Result<T, StatusCode>,
        describe: impl FnOnce(StatusCode) -> String,
    ) -> MotionResult<T> {
        result.map_err(|code| self.to_error(channel, code, describe(code)))
    }

    /// Check for move issuance and motion queries: limit-stop codes yield
    /// `Ok(None)` instead of an error.
    pub fn check_motion<T>(
        &self,
        channel: Option<Channel>,
        result: Result<T, StatusCode>,
        describe: impl FnOnce(StatusCode) -> String,
    ) -> MotionResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(code) if self.is_limit_stop(code) => Ok(None),
            Err(code) => Err(self.to_error(channel, code, describe(code))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: StatusTable = StatusTable {
        limit_stop_codes: &[7, 8],
        not_connected: -1,
    };

    fn describe(code: StatusCode) -> String {
        format!("vendor error {code}")
    }

    #[test]
    fn plain_failure_is_device_error() {
        let err = TABLE
            .check::<()>(Some(Channel::new(3)), Err(StatusCode(42)), describe)
            .unwrap_err();
        assert_eq!(
            err,
            MotionError::Device {
                channel: Some(Channel::new(3)),
                code: 42,
                message: "vendor error 42".into()
            }
        );
    }

    #[test]
    fn not_connected_maps_to_connection() {
        let err = TABLE.check::<()>(None, Err(StatusCode(-1)), describe).unwrap_err();
        assert!(matches!(err, MotionError::Connection(_)));
    }

    #[test]
    fn limit_stop_only_accepted_by_motion_check() {
        assert!(TABLE.check::<()>(None, Err(StatusCode(7)), describe).is_err());
        assert_eq!(TABLE.check_motion::<()>(None, Err(StatusCode(8)), describe), Ok(None));
        assert_eq!(TABLE.check_motion(None, Ok(true), describe), Ok(Some(true)));
        assert!(TABLE.check_motion::<()>(None, Err(StatusCode(9)), describe).is_err());
    }
}
