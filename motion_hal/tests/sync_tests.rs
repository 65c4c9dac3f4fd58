//! Synchronized motion (E-CAM, gear) and alarm reset tests.

mod common;

use common::{command_names, open, open_with, sim_config};
use motion_common::prelude::*;
use motion_hal::drivers::simulation::SdkCall;
use std::time::Duration;

const MASTER: Channel = Channel::new(0);
const SLAVE: Channel = Channel::new(1);

fn ramp() -> MotionProfile {
    MotionProfile::trapezoidal(100.0, 1000.0, 1000.0)
}

// ─── E-CAM ──────────────────────────────────────────────────────────

#[test]
fn test_ecam_length_mismatch_issues_no_call() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    let err = dev
        .start_ecam(
            0,
            MASTER,
            SLAVE,
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[0.0, 1.0, 2.0, 3.0],
        )
        .expect_err("5 vs 4 points");
    assert!(matches!(err, MotionError::InvalidParameter(_)));
    assert!(sim.calls().is_empty());
    assert!(dev.sync_registry().is_empty());
}

#[test]
fn test_ecam_lifecycle() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable master");
    dev.enable(SLAVE, true).expect("enable slave");

    dev.start_ecam(3, MASTER, SLAVE, &[0.0, 10.0], &[0.0, 5.0])
        .expect("start cam");
    assert!(dev.is_ecam_enabled(3).expect("enabled"));
    assert!(dev.sync_registry().ecam(3).is_some());
    assert!(sim.commands().contains(&SdkCall::StartECam {
        table_index: 3,
        master: 0,
        slave: 1,
        points: 2,
    }));

    // Slave follows the cam profile.
    dev.trapezoidal_move(MASTER, 4.0, &ramp()).expect("move master");
    dev.wait_timeout(MASTER, Duration::from_secs(2)).expect("wait");
    let slave = sim.position(1).expect("slave");
    assert!((slave - 2.0).abs() < 1e-9, "slave at {slave}");

    let err = dev
        .start_ecam(3, MASTER, Channel::new(2), &[0.0, 1.0], &[0.0, 1.0])
        .expect_err("table busy");
    assert!(matches!(err, MotionError::InvalidState(_)));

    dev.stop_ecam(3).expect("stop cam");
    assert!(!dev.is_ecam_enabled(3).expect("disabled"));
    assert!(dev.sync_registry().is_empty());
}

#[test]
fn test_cam_slave_cannot_also_be_geared() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable master");
    dev.enable(SLAVE, true).expect("enable slave");
    dev.start_ecam(0, MASTER, SLAVE, &[0.0, 1.0], &[0.0, 1.0])
        .expect("cam");
    sim.clear_journal();

    let err = dev
        .set_sync_gear_ratio(Channel::new(2), SLAVE, 2.0, &ramp())
        .expect_err("slave busy");
    assert!(matches!(err, MotionError::InvalidState(_)));
    assert!(command_names(&sim).is_empty());
}

#[test]
fn test_geared_slave_cannot_start_cam() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable master");
    dev.enable(SLAVE, true).expect("enable slave");
    dev.set_sync_gear_ratio(MASTER, SLAVE, 2.0, &ramp())
        .expect("gear");
    sim.clear_journal();

    // same master as the gear pair
    let err = dev
        .start_ecam(0, MASTER, SLAVE, &[0.0, 1.0], &[0.0, 5.0])
        .expect_err("slave geared");
    assert!(matches!(err, MotionError::InvalidState(_)));
    assert!(command_names(&sim).is_empty());
    assert!(dev.sync_registry().ecam(0).is_none());
    assert_eq!(
        dev.sync_registry().gear(SLAVE).map(|p| p.gear_ratio),
        Some(2.0)
    );
    assert_eq!(dev.sync_registry().len(), 1);
}

// ─── Gear ───────────────────────────────────────────────────────────

#[test]
fn test_gear_engages_under_ramp() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable master");
    dev.enable(SLAVE, true).expect("enable slave");
    dev.velocity_move(MASTER, &MotionProfile::jog(100.0, 1e6, 1e6, 0.5, 0.5))
        .expect("jog master");
    std::thread::sleep(Duration::from_millis(10));

    let slow = MotionProfile::trapezoidal(100.0, 1.0, 1.0);
    let master_start = sim.position(0).expect("master");
    dev.set_sync_gear_ratio(MASTER, SLAVE, 1.0, &slow)
        .expect("gear");
    assert!(sim.commands().contains(&SdkCall::StartGear {
        master: 0,
        slave: 1,
        ratio: 1.0,
        ramp: slow.resolve().expect("ramp"),
    }));

    std::thread::sleep(Duration::from_millis(20));
    let master = sim.position(0).expect("master") - master_start;
    let slave = sim.position(1).expect("slave");
    assert!(master > 1.0, "master moved {master}");
    assert!(slave.abs() < 0.05, "slave jumped to {slave}");
    assert!(dev.is_moving(SLAVE).expect("slave moving"));

    dev.stop(MASTER).expect("stop master");
    dev.clear_sync(SLAVE).expect("clear");
}

#[test]
fn test_gear_follows_master_and_ratio_updates() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable master");
    dev.enable(SLAVE, true).expect("enable slave");

    dev.set_sync_gear_ratio(MASTER, SLAVE, 2.0, &ramp())
        .expect("gear");
    dev.trapezoidal_move(MASTER, 3.0, &ramp()).expect("move master");
    dev.wait_timeout(MASTER, Duration::from_secs(2)).expect("wait master");
    // the slave lags under the ramp and catches up once the master stops
    dev.wait_timeout(SLAVE, Duration::from_secs(2)).expect("wait slave");
    let slave = sim.position(1).expect("slave");
    assert!((slave - 6.0).abs() < 1e-9, "slave at {slave}");

    // Re-issuing for the same pair replaces the ratio.
    dev.set_sync_gear_ratio(MASTER, SLAVE, -1.0, &ramp())
        .expect("new ratio");
    assert_eq!(
        dev.sync_registry().gear(SLAVE).map(|p| p.gear_ratio),
        Some(-1.0)
    );
    assert_eq!(dev.sync_registry().len(), 1);

    dev.clear_sync(SLAVE).expect("clear");
    assert!(dev.sync_registry().gear(SLAVE).is_none());
    assert_eq!(sim.count("stop_gear"), 1);
}

#[test]
fn test_gear_validation_precedes_vendor_calls() {
    let (mut dev, sim) = open(BackendKind::Simulation);

    assert!(dev.set_sync_gear_ratio(MASTER, SLAVE, 0.0, &ramp()).is_err());
    assert!(dev.set_sync_gear_ratio(MASTER, MASTER, 1.0, &ramp()).is_err());
    let bad_ramp = MotionProfile::trapezoidal(100.0, -1.0, 1000.0);
    assert!(dev.set_sync_gear_ratio(MASTER, SLAVE, 1.0, &bad_ramp).is_err());
    assert!(sim.calls().is_empty());
}

#[test]
fn test_servo_off_releases_gear_binding() {
    let (mut dev, _sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable master");
    dev.enable(SLAVE, true).expect("enable slave");
    dev.set_sync_gear_ratio(MASTER, SLAVE, 1.5, &ramp())
        .expect("gear");

    dev.enable(SLAVE, false).expect("servo off");
    assert!(dev.sync_registry().is_empty());
}

// ─── Alarm reset ────────────────────────────────────────────────────

fn reset_edges(calls: &[(std::time::Instant, SdkCall)]) -> Vec<(std::time::Instant, bool)> {
    calls
        .iter()
        .filter_map(|(at, call)| match call {
            SdkCall::SetAlarmReset { asserted, .. } => Some((*at, *asserted)),
            _ => None,
        })
        .collect()
}

fn timed_calls(sim: &motion_hal::drivers::simulation::SimHandle) -> Vec<(std::time::Instant, SdkCall)> {
    sim.journal().into_iter().map(|e| (e.at, e.call)).collect()
}

#[test]
fn test_clear_alarm_pulses_once_around_debounce() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    sim.latch_alarm(0);
    assert!(dev.is_alarmed(MASTER).expect("alarmed"));

    dev.clear_alarm(MASTER).expect("clear");

    let edges = reset_edges(&timed_calls(&sim));
    assert_eq!(edges.len(), 2);
    assert!(edges[0].1);
    assert!(!edges[1].1);
    assert!(edges[1].0.duration_since(edges[0].0) >= Duration::from_millis(20));

    // A latched alarm survives the pulse.
    assert!(dev.is_alarmed(MASTER).expect("still alarmed"));
}

#[test]
fn test_clear_alarm_resets_transient_alarm() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    sim.raise_alarm(0);
    dev.clear_alarm(MASTER).expect("clear");
    assert!(!dev.is_alarmed(MASTER).expect("cleared"));
}

#[test]
fn test_clear_alarm_skips_healthy_axis_by_default() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.clear_alarm(MASTER).expect("clear");
    assert_eq!(sim.count("set_alarm_reset"), 0);

    let mut config = sim_config(BackendKind::Simulation);
    config.alarm.reset_policy = AlarmResetPolicy::Always;
    let (mut dev, sim) = open_with(&config);
    dev.clear_alarm(MASTER).expect("clear");
    assert_eq!(sim.count("set_alarm_reset"), 2);
}

#[test]
fn test_fault_latch_backend_rearms_monitoring() {
    let (mut dev, sim) = open(BackendKind::Acs);
    sim.set_faults(0, FaultFlags::POSITION_ERROR);
    assert!(dev.is_alarmed(MASTER).expect("alarmed"));
    assert_eq!(sim.count("status"), 0);

    dev.clear_alarm(MASTER).expect("clear");
    assert_eq!(sim.count("arm_fault_monitoring"), 1);
    assert!(!dev.is_alarmed(MASTER).expect("cleared"));

    // Limit faults alone are not alarms.
    sim.set_faults(0, FaultFlags::RIGHT_LIMIT);
    assert!(!dev.is_alarmed(MASTER).expect("limit only"));
}

#[test]
fn test_alarmed_axis_refuses_motion() {
    let (mut dev, sim) = open(BackendKind::Simulation);
    dev.enable(MASTER, true).expect("enable");
    sim.raise_alarm(0);
    let err = dev
        .trapezoidal_move(MASTER, 1.0, &ramp())
        .expect_err("alarmed");
    assert!(matches!(err, MotionError::Device { .. }));
}
