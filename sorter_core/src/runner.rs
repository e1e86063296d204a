//! Cooperative polling loop driving homing, calibration, and scheduling.
//!
//! Mirrors the machine's single-threaded control program: every iteration
//! pumps both actuators (the non-blocking step generators), and control
//! logic advances only when both report idle. There is no cycle overlap and
//! no reentrancy; the scheduler exclusively owns all mutable run state.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use sorter_traits::{Actuator, Clock, ColorSensor, HomeSwitch};

use crate::color::BackgroundProfile;
use crate::config::{ColorCfg, HomingCfg};
use crate::error::{Result, SorterError};
use crate::homing::{HomingAction, HomingSequence};
use crate::hw_error::map_hw_error;
use crate::scheduler::CycleScheduler;
use crate::status::{CycleStatus, RunState, RunSummary};

fn hw<T>(
    r: std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>,
    what: &'static str,
) -> Result<T> {
    r.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err(what)
}

/// Generic runner over the hardware collaborators.
pub struct SorterRunner<C, D, S, H>
where
    C: Actuator,
    D: Actuator,
    S: ColorSensor,
    H: HomeSwitch,
{
    pub(crate) collector: C,
    pub(crate) dropper: D,
    pub(crate) sensor: S,
    pub(crate) home_switch: H,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) scheduler: CycleScheduler,
    pub(crate) homing: HomingSequence,
    pub(crate) color: ColorCfg,
    pub(crate) homing_cfg: HomingCfg,
    pub(crate) stop_check: Option<Box<dyn Fn() -> bool>>,
    pub(crate) state: RunState,
}

impl<C, D, S, H> SorterRunner<C, D, S, H>
where
    C: Actuator,
    D: Actuator,
    S: ColorSensor,
    H: HomeSwitch,
{
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        self.scheduler.summary()
    }

    /// Home both axes, calibrate the background, then schedule cycles until
    /// the input stream ends. Returns the run totals after power-down.
    pub fn run(&mut self) -> Result<RunSummary> {
        let epoch = self.clock.now();
        self.home()?;

        // Carousel is stationary and empty right after homing: calibrate.
        let profile =
            BackgroundProfile::calibrate(&mut self.sensor, &*self.clock, &self.color)?;
        self.scheduler.set_background(profile);

        self.state = RunState::Running;
        tracing::info!("sorting started");

        loop {
            self.check_stop()?;
            self.pump_both()?;
            if self.either_moving()? {
                continue;
            }

            let c_raw = hw(self.collector.current_position(), "collector position")?;
            let d_raw = hw(self.dropper.current_position(), "dropper position")?;

            match self
                .scheduler
                .cycle(c_raw, d_raw, &mut self.sensor)?
            {
                CycleStatus::Running { collector, dropper } => {
                    // Rebase the controllers onto the folded frame before
                    // issuing absolute targets computed in that frame.
                    hw(
                        self.collector
                            .set_current_position(self.scheduler.collector_position()),
                        "rebase collector",
                    )?;
                    hw(
                        self.dropper
                            .set_current_position(self.scheduler.dropper_position()),
                        "rebase dropper",
                    )?;
                    hw(self.collector.move_to(collector.target), "move collector")?;
                    hw(self.dropper.move_to(dropper.target), "move dropper")?;
                }
                CycleStatus::ShutDown {
                    collector,
                    dropper,
                    summary,
                } => {
                    self.park_and_release(collector.target, dropper.target)?;
                    self.state = RunState::Idle;
                    tracing::info!(
                        objects = summary.objects_sorted,
                        missed = summary.missed_slots(),
                        elapsed_ms = self.clock.ms_since(epoch),
                        "run complete"
                    );
                    return Ok(summary);
                }
            }
        }
    }

    /// Execute the homing sequence to completion.
    fn home(&mut self) -> Result<()> {
        self.state = RunState::Homing;
        tracing::info!("homing started");
        let pause = Duration::from_millis(self.homing_cfg.jog_pause_ms);
        loop {
            self.check_stop()?;
            self.pump_both()?;
            if self.either_moving()? {
                continue;
            }

            let pressed = hw(self.home_switch.is_pressed(), "home switch")?;
            match self.homing.step(pressed) {
                HomingAction::JogBoth { delta } => {
                    hw(self.collector.move_by(delta), "jog collector")?;
                    hw(self.dropper.move_by(delta), "jog dropper")?;
                    self.clock.sleep(pause);
                }
                HomingAction::JogCollector { delta } => {
                    hw(self.collector.move_by(delta), "jog collector")?;
                    self.clock.sleep(pause);
                }
                HomingAction::JogDropper { delta } => {
                    hw(self.dropper.move_by(delta), "jog dropper")?;
                    self.clock.sleep(pause);
                }
                HomingAction::SetReference { collector, dropper } => {
                    hw(
                        self.collector.set_current_position(collector),
                        "reference collector",
                    )?;
                    hw(
                        self.dropper.set_current_position(dropper),
                        "reference dropper",
                    )?;
                }
                HomingAction::MoveToStart { collector, dropper } => {
                    hw(self.collector.move_to(collector), "start collector")?;
                    hw(self.dropper.move_to(dropper), "start dropper")?;
                }
                HomingAction::Complete => {
                    tracing::info!("homing complete");
                    return Ok(());
                }
            }
        }
    }

    /// Drive both axes to the power-down posture, then de-energize.
    fn park_and_release(&mut self, collector_target: i32, dropper_target: i32) -> Result<()> {
        hw(
            self.collector
                .set_current_position(self.scheduler.collector_position()),
            "rebase collector",
        )?;
        hw(
            self.dropper
                .set_current_position(self.scheduler.dropper_position()),
            "rebase dropper",
        )?;
        hw(self.collector.move_to(collector_target), "park collector")?;
        hw(self.dropper.move_to(dropper_target), "park dropper")?;
        loop {
            self.pump_both()?;
            if !self.either_moving()? {
                break;
            }
        }
        hw(self.collector.stop(), "stop collector")?;
        hw(self.dropper.stop(), "stop dropper")?;
        hw(self.collector.release(), "release collector")?;
        hw(self.dropper.release(), "release dropper")?;
        Ok(())
    }

    fn pump_both(&mut self) -> Result<()> {
        hw(self.collector.pump(), "pump collector")?;
        hw(self.dropper.pump(), "pump dropper")?;
        Ok(())
    }

    fn either_moving(&mut self) -> Result<bool> {
        Ok(hw(self.collector.is_moving(), "collector moving")?
            || hw(self.dropper.is_moving(), "dropper moving")?)
    }

    fn check_stop(&mut self) -> Result<()> {
        if let Some(check) = &self.stop_check
            && check()
        {
            let _ = self.collector.stop();
            let _ = self.dropper.stop();
            tracing::warn!("stop requested, halting both axes");
            return Err(eyre::Report::new(SorterError::Stopped));
        }
        Ok(())
    }
}
