//! Test and helper mocks for sorter_core.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sorter_traits::{Actuator, Clock, ColorSensor, HomeSwitch};

/// A sensor that always errors; useful where the scheduler is driven through
/// paths that must never sample.
pub struct NoopColorSensor;

impl ColorSensor for NoopColorSensor {
    fn sample(
        &mut self,
        _settle: Duration,
    ) -> Result<[u32; 3], Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop color sensor")))
    }
}

/// Replays a fixed sequence of samples, then repeats the last one.
pub struct ScriptedColorSensor {
    seq: VecDeque<[u32; 3]>,
    last: [u32; 3],
}

impl ScriptedColorSensor {
    pub fn repeating(seq: impl Into<VecDeque<[u32; 3]>>) -> Self {
        let seq = seq.into();
        let last = seq.back().copied().unwrap_or([0; 3]);
        Self { seq, last }
    }
}

impl ColorSensor for ScriptedColorSensor {
    fn sample(
        &mut self,
        _settle: Duration,
    ) -> Result<[u32; 3], Box<dyn std::error::Error + Send + Sync>> {
        if let Some(s) = self.seq.pop_front() {
            self.last = s;
            Ok(s)
        } else {
            Ok(self.last)
        }
    }
}

/// Deterministic clock for tests: `sleep` returns immediately, so scripted
/// calibration and homing pauses cost nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock;

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _d: Duration) {}
}

/// An actuator that completes every move on the next `pump()` call.
///
/// Shared position state lets tests inspect an axis while the runner owns it.
#[derive(Clone)]
pub struct InstantActuator {
    state: Arc<Mutex<InstantState>>,
}

#[derive(Debug, Default)]
struct InstantState {
    position: i64,
    target: i64,
    released: bool,
    moves: Vec<i64>,
}

impl Default for InstantActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl InstantActuator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InstantState::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InstantState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn position(&self) -> i64 {
        self.lock().position
    }

    pub fn released(&self) -> bool {
        self.lock().released
    }

    /// Every absolute target this actuator has been commanded to.
    pub fn move_log(&self) -> Vec<i64> {
        self.lock().moves.clone()
    }
}

impl Actuator for InstantActuator {
    fn move_to(&mut self, position: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.lock();
        s.target = i64::from(position);
        s.moves.push(i64::from(position));
        Ok(())
    }

    fn move_by(&mut self, delta: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.lock();
        s.target += i64::from(delta);
        Ok(())
    }

    fn current_position(&mut self) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.lock().position)
    }

    fn set_current_position(
        &mut self,
        position: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.lock();
        let remaining = s.target - s.position;
        s.position = i64::from(position);
        s.target = s.position + remaining;
        Ok(())
    }

    fn is_moving(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.lock();
        Ok(s.position != s.target)
    }

    fn pump(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.lock();
        s.position = s.target;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.lock();
        s.target = s.position;
        Ok(())
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.lock();
        s.target = s.position;
        s.released = true;
        Ok(())
    }
}

/// Replays a scripted press sequence, then a resting level.
pub struct ScriptedHomeSwitch {
    script: VecDeque<bool>,
    rest: bool,
}

impl ScriptedHomeSwitch {
    pub fn new(script: impl Into<VecDeque<bool>>, rest: bool) -> Self {
        Self {
            script: script.into(),
            rest,
        }
    }
}

impl HomeSwitch for ScriptedHomeSwitch {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.script.pop_front().unwrap_or(self.rest))
    }
}
