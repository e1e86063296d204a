//! Command execution: sim hardware assembly, sorting, calibration, self-check.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use sorter_core::config::{ColorCfg, GeometryCfg, HomingCfg, SchedulerCfg};
use sorter_core::{BackgroundProfile, RunSummary, Sorter};
use sorter_hardware::{SimActuator, SimColorSensor, SimHomeSwitch};
use sorter_traits::{ColorSensor, MonotonicClock};

/// Simulated object stream, cycled when more objects are requested than
/// distinct colors. Pulse-width channel values, lower = brighter.
const PALETTE: [[u32; 3]; 5] = [
    [60, 130, 120],  // red
    [55, 110, 105],  // orange
    [50, 85, 95],    // yellow
    [90, 80, 100],   // green
    [95, 120, 90],   // purple
];

/// Wire a Ctrl-C handler to a flag the control loop polls every iteration.
fn stop_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let for_handler = Arc::clone(&flag);
    if let Err(e) = ctrlc::set_handler(move || {
        for_handler.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
    flag
}

/// Build the simulated sensor: first the idle reads calibration will consume,
/// then the requested object stream, then background forever.
fn sim_sensor(cfg: &sorter_config::Config, objects: u32) -> SimColorSensor {
    let mut sensor = SimColorSensor::new(cfg.simulation.background_color);
    for _ in 0..cfg.color.calibration_samples {
        sensor.push_object(cfg.simulation.background_color);
    }
    for i in 0..objects {
        sensor.push_object(PALETTE[i as usize % PALETTE.len()]);
    }
    sensor
}

fn build_sorter(cfg: &sorter_config::Config, objects: u32) -> eyre::Result<Sorter> {
    let steps = cfg.simulation.steps_per_pump;
    let flag = stop_flag();
    Sorter::builder()
        .with_collector(SimActuator::new("collector", steps))
        .with_dropper(SimActuator::new("dropper", steps))
        .with_sensor(sim_sensor(cfg, objects))
        .with_home_switch(SimHomeSwitch::quick_homing())
        .with_geometry(GeometryCfg::from(&cfg.geometry))
        .with_color(ColorCfg::from(&cfg.color))
        .with_scheduler(SchedulerCfg::from(&cfg.scheduler))
        .with_homing(HomingCfg::from(&cfg.homing))
        .with_stop_check(move || flag.load(Ordering::SeqCst))
        .try_build()
        .wrap_err("assembling sorter")
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        let obj = serde_json::json!({
            "objects_sorted": summary.objects_sorted,
            "background_total": summary.background_total,
            "missed_slots": summary.missed_slots(),
        });
        println!("{obj}");
    } else {
        println!(
            "Run complete: {} objects sorted, {} empty scans ({} before the final streak).",
            summary.objects_sorted,
            summary.background_total,
            summary.missed_slots()
        );
    }
}

pub fn run_sort(cfg: &sorter_config::Config, objects: u32, json: bool) -> eyre::Result<()> {
    let mut sorter = build_sorter(cfg, objects)?;
    let summary = sorter.run()?;
    print_summary(&summary, json);
    Ok(())
}

pub fn run_calibrate(cfg: &sorter_config::Config, json: bool) -> eyre::Result<()> {
    let mut sensor = sim_sensor(cfg, 0);
    let clock = MonotonicClock::new();
    let color = ColorCfg::from(&cfg.color);
    let profile = BackgroundProfile::calibrate(&mut sensor, &clock, &color)?;
    if json {
        let obj = serde_json::json!({
            "reference": profile.reference.0,
            "tolerance": profile.tolerance,
        });
        println!("{obj}");
    } else {
        let [r, g, b] = profile.reference.0;
        println!("Background: ({r}, {g}, {b}) tolerance {}", profile.tolerance);
    }
    Ok(())
}

/// Verify the config assembles into a runnable sorter and the peripherals
/// respond. No motion is commanded.
pub fn self_check(cfg: &sorter_config::Config) -> eyre::Result<()> {
    let _ = build_sorter(cfg, 0)?;
    let mut sensor = SimColorSensor::new(cfg.simulation.background_color);
    let sample = sensor
        .sample(std::time::Duration::ZERO)
        .map_err(|e| eyre::eyre!("sensor sample failed: {e}"))?;
    tracing::debug!(r = sample[0], g = sample[1], b = sample[2], "self-check sample");
    println!("self-check ok");
    Ok(())
}
