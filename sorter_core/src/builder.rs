//! Type-state builder for `Sorter`.
//!
//! The builder enforces at compile time that both actuators and the color
//! sensor are provided before `build()` is available; `try_build()` is
//! always available for dynamic checks. Geometry and candidate-order
//! validation happens once here, so the scheduler can index freely.

use std::marker::PhantomData;
use std::sync::Arc;

use sorter_traits::clock::{Clock, MonotonicClock};
use sorter_traits::{Actuator, ColorSensor, HomeSwitch};

use crate::config::{ColorCfg, GeometryCfg, HomingCfg, SchedulerCfg};
use crate::error::{BuildError, Result};
use crate::homing::HomingSequence;
use crate::runner::SorterRunner;
use crate::scheduler::CycleScheduler;
use crate::status::{RunState, RunSummary};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// The assembled sorter, boxing its hardware collaborators.
pub struct Sorter {
    pub(crate) inner: SorterRunner<
        Box<dyn Actuator>,
        Box<dyn Actuator>,
        Box<dyn ColorSensor>,
        Box<dyn HomeSwitch>,
    >,
}

impl core::fmt::Debug for Sorter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sorter")
            .field("state", &self.inner.state())
            .field("summary", &self.inner.summary())
            .finish()
    }
}

impl Sorter {
    /// Start building a Sorter.
    pub fn builder() -> SorterBuilder<Missing, Missing, Missing> {
        SorterBuilder::default()
    }

    /// Home, calibrate, and sort until the input stream ends.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.inner.run()
    }

    pub fn state(&self) -> RunState {
        self.inner.state()
    }

    pub fn summary(&self) -> RunSummary {
        self.inner.summary()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Sorter`. All fields are validated on `build()`.
pub struct SorterBuilder<C, D, S> {
    collector: Option<Box<dyn Actuator>>,
    dropper: Option<Box<dyn Actuator>>,
    sensor: Option<Box<dyn ColorSensor>>,
    home_switch: Option<Box<dyn HomeSwitch>>,
    geometry: Option<GeometryCfg>,
    color: Option<ColorCfg>,
    scheduler: Option<SchedulerCfg>,
    homing: Option<HomingCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    stop_check: Option<Box<dyn Fn() -> bool>>,
    _c: PhantomData<C>,
    _d: PhantomData<D>,
    _s: PhantomData<S>,
}

impl Default for SorterBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            collector: None,
            dropper: None,
            sensor: None,
            home_switch: None,
            geometry: None,
            color: None,
            scheduler: None,
            homing: None,
            clock: None,
            stop_check: None,
            _c: PhantomData,
            _d: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<C, D, S> SorterBuilder<C, D, S> {
    fn transmute_state<C2, D2, S2>(self) -> SorterBuilder<C2, D2, S2> {
        SorterBuilder {
            collector: self.collector,
            dropper: self.dropper,
            sensor: self.sensor,
            home_switch: self.home_switch,
            geometry: self.geometry,
            color: self.color,
            scheduler: self.scheduler,
            homing: self.homing,
            clock: self.clock,
            stop_check: self.stop_check,
            _c: PhantomData,
            _d: PhantomData,
            _s: PhantomData,
        }
    }

    pub fn with_collector(mut self, actuator: impl Actuator + 'static) -> SorterBuilder<Set, D, S> {
        self.collector = Some(Box::new(actuator));
        self.transmute_state()
    }

    pub fn with_dropper(mut self, actuator: impl Actuator + 'static) -> SorterBuilder<C, Set, S> {
        self.dropper = Some(Box::new(actuator));
        self.transmute_state()
    }

    pub fn with_sensor(mut self, sensor: impl ColorSensor + 'static) -> SorterBuilder<C, D, Set> {
        self.sensor = Some(Box::new(sensor));
        self.transmute_state()
    }

    pub fn with_home_switch(mut self, switch: impl HomeSwitch + 'static) -> Self {
        self.home_switch = Some(Box::new(switch));
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryCfg) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_color(mut self, color: ColorCfg) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerCfg) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_homing(mut self, homing: HomingCfg) -> Self {
        self.homing = Some(homing);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Install an external stop request (e.g. SIGINT) polled every iteration.
    pub fn with_stop_check(mut self, check: impl Fn() -> bool + 'static) -> Self {
        self.stop_check = Some(Box::new(check));
        self
    }

    /// Dynamic variant of `build()`: verifies all required collaborators at
    /// run time.
    pub fn try_build(self) -> std::result::Result<Sorter, BuildError> {
        let collector = self.collector.ok_or(BuildError::MissingCollector)?;
        let dropper = self.dropper.ok_or(BuildError::MissingDropper)?;
        let sensor = self.sensor.ok_or(BuildError::MissingSensor)?;
        let home_switch = self.home_switch.ok_or(BuildError::MissingHomeSwitch)?;

        let geometry = self.geometry.unwrap_or_default();
        let color = self.color.unwrap_or_default();
        let scheduler_cfg = self.scheduler.unwrap_or_default();
        let homing_cfg = self.homing.unwrap_or_default();

        let scheduler = CycleScheduler::new(geometry.clone(), &color, scheduler_cfg.clone())?;
        let homing = HomingSequence::new(&geometry, &scheduler_cfg, &homing_cfg);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        Ok(Sorter {
            inner: SorterRunner {
                collector,
                dropper,
                sensor,
                home_switch,
                clock,
                scheduler,
                homing,
                color,
                homing_cfg,
                stop_check: self.stop_check,
                state: RunState::Homing,
            },
        })
    }
}

impl SorterBuilder<Set, Set, Set> {
    /// Build the sorter; hardware presence is already proven by the types.
    pub fn build(self) -> std::result::Result<Sorter, BuildError> {
        self.try_build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{InstantActuator, NoopColorSensor, ScriptedHomeSwitch};

    #[test]
    fn try_build_reports_missing_pieces() {
        let err = Sorter::builder().try_build().unwrap_err();
        assert!(matches!(err, BuildError::MissingCollector));

        let err = Sorter::builder()
            .with_collector(InstantActuator::new())
            .with_dropper(InstantActuator::new())
            .with_sensor(NoopColorSensor)
            .try_build()
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingHomeSwitch));
    }

    #[test]
    fn build_rejects_bad_geometry() {
        let err = Sorter::builder()
            .with_collector(InstantActuator::new())
            .with_dropper(InstantActuator::new())
            .with_sensor(NoopColorSensor)
            .with_home_switch(ScriptedHomeSwitch::new(vec![], false))
            .with_geometry(GeometryCfg {
                ticks_per_rev: 401, // not divisible by 8 indices
                ..GeometryCfg::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_oversized_geometry_without_wrapping() {
        // Large enough to wrap narrower arithmetic in the fit check.
        let err = Sorter::builder()
            .with_collector(InstantActuator::new())
            .with_dropper(InstantActuator::new())
            .with_sensor(NoopColorSensor)
            .with_home_switch(ScriptedHomeSwitch::new(vec![], false))
            .with_geometry(GeometryCfg {
                slot_count: 100_000,
                slot_stride: 100_000,
                ..GeometryCfg::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidConfig(_)));

        let err = Sorter::builder()
            .with_collector(InstantActuator::new())
            .with_dropper(InstantActuator::new())
            .with_sensor(NoopColorSensor)
            .with_home_switch(ScriptedHomeSwitch::new(vec![], false))
            .with_scheduler(SchedulerCfg {
                scan_quadrant: u32::MAX,
                ..SchedulerCfg::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidConfig(_)));
    }

    #[test]
    fn build_accepts_reference_geometry() {
        let sorter = Sorter::builder()
            .with_collector(InstantActuator::new())
            .with_dropper(InstantActuator::new())
            .with_sensor(NoopColorSensor)
            .with_home_switch(ScriptedHomeSwitch::new(vec![], false))
            .build();
        assert!(sorter.is_ok());
    }
}
