//! Simulated peripherals for the carousel sorter.
//!
//! The real machine drives two steppers through an external motion controller
//! and reads a TCS3200-style pulse-width color sensor. These simulations match
//! those interfaces closely enough to exercise the full control loop: the
//! actuator advances a bounded number of steps per `pump()` call, and the
//! color sensor replays a scripted stream of samples.

pub mod error;

use std::collections::VecDeque;
use std::time::Duration;

use error::HwError;
use sorter_traits::{Actuator, ColorSensor, HomeSwitch};

/// Simulated rotary actuator with a free-running step counter.
///
/// `pump()` advances the position toward the commanded target by at most
/// `steps_per_pump`, mimicking an acceleration-limited stepper that needs
/// many loop iterations to complete a move.
pub struct SimActuator {
    position: i64,
    target: i64,
    steps_per_pump: i64,
    released: bool,
    label: &'static str,
}

impl SimActuator {
    pub fn new(label: &'static str, steps_per_pump: i64) -> Self {
        Self {
            position: 0,
            target: 0,
            steps_per_pump: steps_per_pump.max(1),
            released: false,
            label,
        }
    }

    fn guard_released(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.released {
            return Err(Box::new(HwError::DriveReleased(self.label)));
        }
        Ok(())
    }
}

impl Actuator for SimActuator {
    fn move_to(&mut self, position: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.guard_released()?;
        self.target = i64::from(position);
        tracing::trace!(axis = self.label, target = position, "sim move_to");
        Ok(())
    }

    fn move_by(&mut self, delta: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.guard_released()?;
        self.target += i64::from(delta);
        tracing::trace!(axis = self.label, delta, "sim move_by");
        Ok(())
    }

    fn current_position(&mut self) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.position)
    }

    fn set_current_position(
        &mut self,
        position: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.guard_released()?;
        // Rebase the frame; an idle actuator must stay idle afterwards.
        let remaining = self.target - self.position;
        self.position = i64::from(position);
        self.target = self.position + remaining;
        Ok(())
    }

    fn is_moving(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.position != self.target)
    }

    fn pump(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.released {
            return Ok(());
        }
        let delta = self.target - self.position;
        let step = delta.clamp(-self.steps_per_pump, self.steps_per_pump);
        self.position += step;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.target = self.position;
        Ok(())
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.target = self.position;
        self.released = true;
        tracing::debug!(axis = self.label, "sim drive released");
        Ok(())
    }
}

/// Simulated color sensor replaying a scripted sample stream.
///
/// Once the script is exhausted it keeps returning `background`, which is how
/// a real run ends: the hopper empties and every scan sees the bare carrier.
pub struct SimColorSensor {
    script: VecDeque<[u32; 3]>,
    background: [u32; 3],
}

impl SimColorSensor {
    pub fn new(background: [u32; 3]) -> Self {
        Self {
            script: VecDeque::new(),
            background,
        }
    }

    /// Queue one object sample to be returned before the stream runs dry.
    pub fn push_object(&mut self, sample: [u32; 3]) {
        self.script.push_back(sample);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ColorSensor for SimColorSensor {
    fn sample(
        &mut self,
        _settle: Duration,
    ) -> Result<[u32; 3], Box<dyn std::error::Error + Send + Sync>> {
        let s = self.script.pop_front().unwrap_or(self.background);
        tracing::trace!(r = s[0], g = s[1], b = s[2], "sim color sample");
        Ok(s)
    }
}

/// Simulated home switch replaying a scripted press sequence.
///
/// The default script walks the homing sequence forward: initially pressed
/// (axes parked on the switch), releases during back-off, then re-engages for
/// each seek pass.
pub struct SimHomeSwitch {
    script: VecDeque<bool>,
    rest: bool,
}

impl SimHomeSwitch {
    pub fn new(script: impl Into<VecDeque<bool>>, rest: bool) -> Self {
        Self {
            script: script.into(),
            rest,
        }
    }

    /// Script that completes a homing run in a handful of polls.
    pub fn quick_homing() -> Self {
        Self::new(
            vec![
                true, true, false, // back-off: pressed twice, then clear
                false, false, true, // collector seek: two jogs, then pressed
                false, true, // dropper seek: one jog, then pressed
            ],
            true,
        )
    }
}

impl HomeSwitch for SimHomeSwitch {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.script.pop_front().unwrap_or(self.rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sim_actuator_reaches_target_over_multiple_pumps() {
        let mut a = SimActuator::new("collector", 10);
        a.move_to(25).unwrap();
        assert!(a.is_moving().unwrap());
        let mut pumps = 0;
        while a.is_moving().unwrap() {
            a.pump().unwrap();
            pumps += 1;
            assert!(pumps < 100, "actuator never settled");
        }
        assert_eq!(a.current_position().unwrap(), 25);
        assert_eq!(pumps, 3);
    }

    #[test]
    fn sim_actuator_rebase_keeps_idle_idle() {
        let mut a = SimActuator::new("dropper", 50);
        a.move_to(390).unwrap();
        while a.is_moving().unwrap() {
            a.pump().unwrap();
        }
        a.set_current_position(40).unwrap();
        assert!(!a.is_moving().unwrap());
        assert_eq!(a.current_position().unwrap(), 40);
    }

    #[test]
    fn released_actuator_rejects_moves() {
        let mut a = SimActuator::new("collector", 10);
        a.release().unwrap();
        assert!(a.move_to(10).is_err());
        assert!(a.move_by(-1).is_err());
    }

    #[test]
    fn sim_sensor_falls_back_to_background() {
        let mut s = SimColorSensor::new([139, 159, 101]);
        s.push_object([60, 120, 110]);
        assert_eq!(s.sample(Duration::ZERO).unwrap(), [60, 120, 110]);
        assert_eq!(s.sample(Duration::ZERO).unwrap(), [139, 159, 101]);
        assert_eq!(s.sample(Duration::ZERO).unwrap(), [139, 159, 101]);
    }

    #[test]
    fn sim_switch_replays_script_then_rests() {
        let mut sw = SimHomeSwitch::new(vec![true, false], false);
        assert!(sw.is_pressed().unwrap());
        assert!(!sw.is_pressed().unwrap());
        assert!(!sw.is_pressed().unwrap());
    }
}
