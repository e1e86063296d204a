//! Color samples, tolerance matching, and background calibration.

use std::time::Duration;

use eyre::WrapErr;
use sorter_traits::{Clock, ColorSensor};

use crate::config::ColorCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;

/// One 3-channel reading from the pulse-width sensor. Lower values mean a
/// more reflective surface in that band. The all-zero sample is the "empty"
/// sentinel used by the quadrant memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSample(pub [u32; 3]);

impl ColorSample {
    pub const EMPTY: Self = Self([0; 3]);

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 3]
    }

    /// True when every channel differs by strictly less than `tolerance`.
    pub fn matches(&self, other: &Self, tolerance: u32) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| a.abs_diff(*b) < tolerance)
    }
}

impl From<[u32; 3]> for ColorSample {
    fn from(channels: [u32; 3]) -> Self {
        Self(channels)
    }
}

/// Baseline reading of an empty carrier slot, plus the tolerance within
/// which a reading is considered "no object present".
#[derive(Debug, Clone, Copy)]
pub struct BackgroundProfile {
    pub reference: ColorSample,
    pub tolerance: u32,
}

impl BackgroundProfile {
    pub fn is_background(&self, sample: &ColorSample) -> bool {
        sample.matches(&self.reference, self.tolerance)
    }

    /// Sample the idle background repeatedly and derive a reference color and
    /// tolerance from the observed range.
    ///
    /// Per channel the reference is the midpoint of the observed min/max; the
    /// tolerance is the widest half-range across channels (clamped to at
    /// least 1 so a perfectly quiet sensor cannot yield a degenerate zero
    /// tolerance) plus a fixed margin. The carousel must be stationary with
    /// all slots empty while this runs.
    pub fn calibrate<S: ColorSensor + ?Sized>(
        sensor: &mut S,
        clock: &dyn Clock,
        cfg: &ColorCfg,
    ) -> Result<Self> {
        let mut lowest = [u32::MAX; 3];
        let mut highest = [0u32; 3];
        let settle = Duration::from_millis(cfg.settle_ms);
        for _ in 0..cfg.calibration_samples.max(1) {
            clock.sleep(Duration::from_millis(cfg.calibration_pause_ms));
            let s = sensor
                .sample(settle)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("sampling background")?;
            for i in 0..3 {
                lowest[i] = lowest[i].min(s[i]);
                highest[i] = highest[i].max(s[i]);
            }
        }
        let mut reference = [0u32; 3];
        let mut half_range = 0u32;
        for i in 0..3 {
            reference[i] = (highest[i] + lowest[i]) / 2;
            half_range = half_range.max((highest[i] - lowest[i]) / 2);
        }
        let tolerance = half_range.max(1) + cfg.background_margin;
        tracing::info!(
            r = reference[0],
            g = reference[1],
            b = reference[2],
            tolerance,
            "background calibrated"
        );
        Ok(Self {
            reference: ColorSample(reference),
            tolerance,
        })
    }
}
