//! Scoped vendor session.
//!
//! A [`Session`] owns the SDK handle from a successful open until close. It
//! is closed exactly once: explicitly through [`Session::close`] or on drop,
//! including when a later init step fails after the open succeeded. Once
//! closed, every call fails with [`MotionError::Connection`] without
//! reaching the SDK.

use crate::sdk::{MotionSdk, OpenRequest, SdkResult};
use crate::status::StatusTable;
use motion_common::channel::Channel;
use motion_common::config::DeviceConfig;
use motion_common::error::{MotionError, MotionResult};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Exclusive owner of one vendor session.
pub struct Session<S: MotionSdk> {
    sdk: S,
    status: StatusTable,
    open: bool,
}

impl<S: MotionSdk> Session<S> {
    /// Run the init sequence:
    ///
    /// 1. open device (install dir / host)
    /// 2. set device name
    /// 3. load init file (a missing file only warns)
    /// 4. load parameter file
    /// 5. start communication
    ///
    /// # Errors
    ///
    /// [`MotionError::Init`] naming the failed step. Steps after a successful
    /// open are undone by closing the session before returning.
    pub fn open(mut sdk: S, config: &DeviceConfig, status: StatusTable) -> MotionResult<Self> {
        let request = OpenRequest {
            install_dir: config.install_dir.as_deref(),
            host_ip: config.host_ip.as_deref(),
            host_port: config.host_port,
        };
        debug!(?request, "Opening device");
        let opened = sdk.open(&request);
        status
            .check(None, opened, |code| sdk.describe(code))
            .map_err(|e| e.at_step("open device"))?;

        let mut session = Self {
            sdk,
            status,
            open: true,
        };

        session.step("set device name", |sdk| sdk.set_device_name(&config.device_name))?;

        if let Some(path) = &config.init_file {
            if path.exists() {
                session.step("load init file", |sdk| sdk.load_init_file(path))?;
            } else {
                warn!(path = %path.display(), "Init file not found, skipping");
            }
        }

        if let Some(path) = &config.parameter_file {
            session.step("load parameter file", |sdk| sdk.load_parameter_file(path))?;
        }

        let timeout = Duration::from_millis(u64::from(config.start_communication_timeout_ms));
        session.step("start communication", |sdk| sdk.start_communication(timeout))?;

        info!(device = %config.device_name, "Vendor session open");
        Ok(session)
    }

    fn step(
        &mut self,
        name: &'static str,
        f: impl FnOnce(&mut S) -> SdkResult<()>,
    ) -> MotionResult<()> {
        debug!(step = name, "Init step");
        self.call(None, f).map_err(|e| e.at_step(name))
    }

    /// Returns true until the session is closed.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Status table used to classify vendor codes.
    #[inline]
    pub fn status_table(&self) -> &StatusTable {
        &self.status
    }

    fn live(&mut self) -> MotionResult<&mut S> {
        if !self.open {
            return Err(MotionError::Connection("vendor session is closed".to_string()));
        }
        Ok(&mut self.sdk)
    }

    /// Issue a vendor call; any failure is an error.
    pub fn call<T>(
        &mut self,
        channel: Option<Channel>,
        f: impl FnOnce(&mut S) -> SdkResult<T>,
    ) -> MotionResult<T> {
        let result = f(self.live()?);
        let sdk = &self.sdk;
        self.status.check(channel, result, |code| sdk.describe(code))
    }

    /// Issue a vendor call whose limit-stop codes are expected outcomes.
    pub fn call_motion<T>(
        &mut self,
        channel: Option<Channel>,
        f: impl FnOnce(&mut S) -> SdkResult<T>,
    ) -> MotionResult<Option<T>> {
        let result = f(self.live()?);
        let sdk = &self.sdk;
        self.status.check_motion(channel, result, |code| sdk.describe(code))
    }

    /// Stop communication, then close the device.
    ///
    /// Both steps are attempted; the first failure is returned. Closing a
    /// closed session is a no-op.
    pub fn close(&mut self) -> MotionResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        let stopped = self.sdk.stop_communication();
        let stopped = self
            .status
            .check(None, stopped, |code| self.sdk.describe(code))
            .map_err(|e| e.at_step("stop communication"));

        let closed = self.sdk.close();
        let closed = self
            .status
            .check(None, closed, |code| self.sdk.describe(code))
            .map_err(|e| e.at_step("close device"));

        info!("Vendor session closed");
        stopped.and(closed)
    }

    /// Borrow the SDK without the liveness check.
    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

impl<S: MotionSdk> Drop for Session<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(error = %e, "Failed to close vendor session");
        }
    }
}
