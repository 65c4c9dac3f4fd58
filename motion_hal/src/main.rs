//! # Motion HAL Command-Line Tool
//!
//! Opens the configured controller, runs one command against it and shuts
//! the vendor session down again.
//!
//! # Usage
//!
//! ```bash
//! # Axis snapshot on the simulated controller
//! motion_hal -s status 0
//!
//! # S-curve move and wait for completion
//! motion_hal --config /etc/motion_hal/device.toml move 0 100.0 --velocity 50 --jerk-ratio 0.5
//!
//! # Effective configuration after defaults
//! motion_hal -s config
//!
//! # Jog for two seconds, JSON logs
//! motion_hal --json jog 1 -- -20.0 --duration-ms 2000
//! ```

use clap::{Parser, Subcommand};
use motion_common::consts::{DEFAULT_CONFIG_PATH, HAL_SERVICE_NAME};
use motion_common::prelude::*;
use motion_hal::DriverRegistry;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Motion HAL - uniform commands over vendor motion controllers
#[derive(Parser, Debug)]
#[command(name = "motion_hal")]
#[command(version)]
#[command(about = "Issue motion, IO and alarm commands to a motion controller")]
#[command(long_about = None)]
struct Args {
    /// Path to the device configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force the simulation driver (a missing config file falls back to defaults)
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an axis snapshot
    Status {
        /// Axis channel
        channel: u32,
    },
    /// Servo on, point-to-point move, wait for completion
    Move {
        /// Axis channel
        channel: u32,
        /// Target position
        position: f64,
        #[command(flatten)]
        ramp: RampArgs,
        /// Use a jerk-ratio S-curve with this ratio on both ramps
        #[arg(long)]
        jerk_ratio: Option<f64>,
        /// Return as soon as the move is issued
        #[arg(long)]
        no_wait: bool,
    },
    /// Servo on, jog for a while, stop
    Jog {
        /// Axis channel
        channel: u32,
        /// Signed jog velocity
        velocity: f64,
        /// Acceleration ramp rate
        #[arg(long, default_value_t = 100.0)]
        acceleration: f64,
        /// Deceleration ramp rate
        #[arg(long, default_value_t = 100.0)]
        deceleration: f64,
        /// Jerk ratio on both ramps
        #[arg(long, default_value_t = 0.5)]
        jerk_ratio: f64,
        /// Jog duration before stopping
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
    /// Stop an axis according to its command mode
    Stop {
        /// Axis channel
        channel: u32,
        /// Emergency stop instead
        #[arg(long)]
        estop: bool,
    },
    /// Pulse the alarm reset line
    ClearAlarm {
        /// Axis channel
        channel: u32,
    },
    /// Read a digital input
    Di {
        /// Input channel
        channel: u32,
    },
    /// Read or write a digital output
    Do {
        /// Output channel
        channel: u32,
        /// New state; omitted to read
        value: Option<bool>,
    },
    /// List registered drivers
    Drivers,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
struct RampArgs {
    /// Cruise velocity
    #[arg(long, default_value_t = 10.0)]
    velocity: f64,
    /// Acceleration ramp rate
    #[arg(long, default_value_t = 100.0)]
    acceleration: f64,
    /// Deceleration ramp rate
    #[arg(long, default_value_t = 100.0)]
    deceleration: f64,
}

fn main() {
    if let Err(e) = run() {
        error!("motion_hal failed: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    setup_tracing(&args, &config.shared);

    info!(
        "{} v{} starting (backend {})",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.device.backend
    );

    let registry = DriverRegistry::with_builtin();
    match args.command {
        Command::Drivers => {
            println!("{}", serde_json::to_string_pretty(&registry.list_drivers())?);
            return Ok(());
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
        _ => {}
    }

    let mut device = registry.create_device(&config.device)?;
    let outcome = execute(device.as_mut(), &args.command);
    let closed = device.shutdown();

    let report = outcome?;
    closed?;
    if let Some(report) = report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Run one command. Returns the JSON report to print, if any.
fn execute(
    device: &mut dyn Controller,
    command: &Command,
) -> MotionResult<Option<serde_json::Value>> {
    let report = match *command {
        Command::Status { channel } => {
            let state = device.axis_state(Channel::new(channel))?;
            Some(json!(state))
        }
        Command::Move {
            channel,
            position,
            ref ramp,
            jerk_ratio,
            no_wait,
        } => {
            let ch = Channel::new(channel);
            device.enable(ch, true)?;
            match jerk_ratio {
                Some(ratio) => {
                    let profile = MotionProfile::s_curve(
                        ramp.velocity,
                        ramp.acceleration,
                        ramp.deceleration,
                        ratio,
                        ratio,
                    );
                    device.jerk_ratio_s_curve_move(ch, position, &profile)?;
                }
                None => {
                    let profile =
                        MotionProfile::trapezoidal(ramp.velocity, ramp.acceleration, ramp.deceleration);
                    device.trapezoidal_move(ch, position, &profile)?;
                }
            }
            if !no_wait {
                device.wait(ch)?;
            }
            Some(json!({
                "channel": channel,
                "command_position": device.command_position(ch)?,
                "actual_position": device.actual_position(ch)?,
            }))
        }
        Command::Jog {
            channel,
            velocity,
            acceleration,
            deceleration,
            jerk_ratio,
            duration_ms,
        } => {
            let ch = Channel::new(channel);
            device.enable(ch, true)?;
            let profile =
                MotionProfile::jog(velocity, acceleration, deceleration, jerk_ratio, jerk_ratio);
            device.velocity_move(ch, &profile)?;
            std::thread::sleep(Duration::from_millis(duration_ms));
            device.stop(ch)?;
            device.wait(ch)?;
            Some(json!({
                "channel": channel,
                "command_position": device.command_position(ch)?,
            }))
        }
        Command::Stop { channel, estop } => {
            let ch = Channel::new(channel);
            if estop {
                warn!(%ch, "Emergency stop requested");
                device.estop(ch)?;
            } else {
                device.stop(ch)?;
            }
            None
        }
        Command::ClearAlarm { channel } => {
            let ch = Channel::new(channel);
            device.clear_alarm(ch)?;
            Some(json!({ "channel": channel, "alarmed": device.is_alarmed(ch)? }))
        }
        Command::Di { channel } => {
            let value = device.digital_input(Channel::new(channel))?;
            Some(json!({ "channel": channel, "value": value }))
        }
        Command::Do { channel, value } => {
            let ch = Channel::new(channel);
            if let Some(value) = value {
                device.set_digital_output(ch, value)?;
            }
            Some(json!({ "channel": channel, "value": device.digital_output(ch)? }))
        }
        Command::Drivers | Command::Config => None,
    };
    Ok(report)
}

/// Load and validate the configuration file.
///
/// With `--simulate` a missing file falls back to defaults and the driver is
/// forced to the simulation driver.
fn load_config(args: &Args) -> Result<HalConfig, ConfigError> {
    let mut config = match HalConfig::load(&args.config) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound) if args.simulate => HalConfig {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: HAL_SERVICE_NAME.to_string(),
            },
            device: DeviceConfig::default(),
        },
        Err(e) => return Err(e),
    };
    if args.simulate {
        config.device.driver = "simulation".to_string();
    }
    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and the shared config.
fn setup_tracing(args: &Args, shared: &SharedConfig) {
    let level = if args.verbose {
        "debug"
    } else {
        shared.log_level.as_filter()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
