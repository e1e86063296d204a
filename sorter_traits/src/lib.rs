pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// One rotary actuator (collector or dropper) driven by an external motion
/// controller. Positions are absolute step counts; the controller owns the
/// speed profile and step generation.
pub trait Actuator {
    /// Command a move to an absolute position.
    fn move_to(&mut self, position: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Command a relative move by `delta` steps (negative = counter-clockwise).
    fn move_by(&mut self, delta: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Raw free-running position feedback in steps. May exceed one revolution
    /// in either direction; callers fold it with `RotaryPosition::update`.
    fn current_position(&mut self) -> Result<i64, Box<dyn std::error::Error + Send + Sync>>;
    /// Overwrite the controller's notion of the current position without moving.
    fn set_current_position(
        &mut self,
        position: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// True while a commanded move is still in progress.
    fn is_moving(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
    /// Advance step generation. Non-blocking; called every loop iteration.
    fn pump(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Halt any in-progress move.
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// De-energize the drive. Terminal; no further moves are issued.
    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A 3-channel color sensor. Channel values are pulse widths: lower means
/// more reflective in that band.
pub trait ColorSensor {
    /// Sample all three filter channels sequentially, waiting `settle` after
    /// each filter change before reading.
    fn sample(
        &mut self,
        settle: Duration,
    ) -> Result<[u32; 3], Box<dyn std::error::Error + Send + Sync>>;
}

/// Debounced home-reference switch, consumed only during homing.
pub trait HomeSwitch {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

// Boxed trait objects delegate, so dynamic and static dispatch share the
// same generic plumbing.

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn move_to(&mut self, position: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).move_to(position)
    }
    fn move_by(&mut self, delta: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).move_by(delta)
    }
    fn current_position(&mut self) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).current_position()
    }
    fn set_current_position(
        &mut self,
        position: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_current_position(position)
    }
    fn is_moving(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_moving()
    }
    fn pump(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).pump()
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).release()
    }
}

impl<T: ColorSensor + ?Sized> ColorSensor for Box<T> {
    fn sample(
        &mut self,
        settle: Duration,
    ) -> Result<[u32; 3], Box<dyn std::error::Error + Send + Sync>> {
        (**self).sample(settle)
    }
}

impl<T: HomeSwitch + ?Sized> HomeSwitch for Box<T> {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_pressed()
    }
}
