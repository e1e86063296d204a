#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and validation for the carousel sorter.
//!
//! `Config` and sub-structs are deserialized from TOML and validated before
//! being converted into the runtime structs in `sorter_core::config`. Every
//! field has a default reproducing the reference machine, so an empty TOML
//! document is a valid configuration.

use serde::Deserialize;

/// Carousel geometry: one revolution of either axis in steps, split into
/// evenly spaced indices (= discharge quadrants).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Geometry {
    /// Steps per full revolution.
    pub ticks_per_rev: u32,
    /// Angular reference points per revolution.
    pub index_count: u32,
    /// Carrier slots on the collector.
    pub slot_count: usize,
    /// Index spacing between adjacent slots.
    pub slot_stride: u32,
    /// +- window where an axis is considered in position.
    pub deadband: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            ticks_per_rev: 400,
            index_count: 8,
            slot_count: 4,
            slot_stride: 2,
            deadband: 2,
        }
    }
}

/// Color sensing and background calibration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Color {
    /// +- tolerance when comparing one object color to another.
    pub match_tolerance: u32,
    /// Margin added to the calibrated background half-range.
    pub background_margin: u32,
    /// Filter settle delay per channel (ms).
    pub settle_ms: u64,
    /// Idle samples taken during calibration.
    pub calibration_samples: u32,
    /// Pause between calibration samples (ms).
    pub calibration_pause_ms: u64,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            match_tolerance: 14,
            background_margin: 7,
            settle_ms: 25,
            calibration_samples: 10,
            calibration_pause_ms: 700,
        }
    }
}

/// Per-cycle scheduling knobs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Scheduler {
    /// Quadrant the scanner sits on.
    pub scan_quadrant: u32,
    /// Discharge quadrants in fill order; the last is the overflow bin.
    pub drop_quadrant_order: Vec<usize>,
    /// Consecutive background reads that end the run.
    pub background_miss_threshold: u32,
    /// Power-down targets.
    pub shutdown_collector: i32,
    pub shutdown_dropper: i32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            scan_quadrant: 2,
            drop_quadrant_order: vec![3, 4, 5, 6, 7],
            background_miss_threshold: 15,
            shutdown_collector: 0,
            shutdown_dropper: 215,
        }
    }
}

/// Homing bootstrap knobs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Homing {
    /// Ticks the collector retreats after finding the switch edge.
    pub back_off_ticks: i32,
    /// Offset subtracted from the reference indices when latching.
    pub reference_offset: i32,
    /// Pause between homing jogs (ms).
    pub jog_pause_ms: u64,
}

impl Default for Homing {
    fn default() -> Self {
        Self {
            back_off_ticks: 21,
            reference_offset: 4,
            jog_pause_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

/// Simulation shaping for runs without real hardware.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Simulation {
    /// Steps a simulated actuator advances per pump call.
    pub steps_per_pump: i64,
    /// Baseline background color replayed by the simulated sensor.
    pub background_color: [u32; 3],
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            steps_per_pump: 50,
            background_color: [139, 159, 101],
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub geometry: Geometry,
    pub color: Color,
    pub scheduler: Scheduler,
    pub homing: Homing,
    pub logging: Logging,
    pub simulation: Simulation,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Cross-field validation beyond what serde can express.
    pub fn validate(&self) -> eyre::Result<()> {
        let g = &self.geometry;
        if g.ticks_per_rev == 0 || g.index_count == 0 {
            eyre::bail!("geometry: ticks_per_rev and index_count must be nonzero");
        }
        if g.ticks_per_rev % g.index_count != 0 {
            eyre::bail!(
                "geometry: ticks_per_rev ({}) must be an exact multiple of index_count ({})",
                g.ticks_per_rev,
                g.index_count
            );
        }
        if g.slot_count == 0 || g.slot_stride == 0 {
            eyre::bail!("geometry: slot_count and slot_stride must be nonzero");
        }
        // Widened arithmetic: unvalidated TOML values must not wrap.
        let last_slot_index = (g.slot_count as u128 - 1) * u128::from(g.slot_stride);
        if last_slot_index >= u128::from(g.index_count) {
            eyre::bail!(
                "geometry: {} slots at stride {} do not fit {} indices",
                g.slot_count,
                g.slot_stride,
                g.index_count
            );
        }

        let s = &self.scheduler;
        if u64::from(s.scan_quadrant) + 1 >= u64::from(g.index_count) {
            eyre::bail!(
                "scheduler: scan_quadrant {} leaves no wait position on {} indices",
                s.scan_quadrant,
                g.index_count
            );
        }
        if s.drop_quadrant_order.is_empty() {
            eyre::bail!("scheduler: drop_quadrant_order must not be empty");
        }
        if let Some(&bad) = s
            .drop_quadrant_order
            .iter()
            .find(|&&q| q >= g.index_count as usize)
        {
            eyre::bail!(
                "scheduler: drop quadrant {} out of range (index_count {})",
                bad,
                g.index_count
            );
        }
        if s.background_miss_threshold == 0 {
            eyre::bail!("scheduler: background_miss_threshold must be nonzero");
        }

        let c = &self.color;
        if c.match_tolerance == 0 {
            eyre::bail!("color: match_tolerance must be nonzero");
        }
        if c.calibration_samples == 0 {
            eyre::bail!("color: calibration_samples must be nonzero");
        }

        if self.simulation.steps_per_pump <= 0 {
            eyre::bail!("simulation: steps_per_pump must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_reference_machine() {
        let cfg = load_toml("").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.geometry.ticks_per_rev, 400);
        assert_eq!(cfg.scheduler.drop_quadrant_order, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn huge_geometry_values_are_rejected_without_wrapping() {
        // Each value is large enough to wrap narrower arithmetic; all must
        // come back as ordinary validation errors.
        let cases = [
            "[geometry]\nslot_count = 4294967296\n",
            "[geometry]\nslot_count = 100000\nslot_stride = 100000\n",
            "[scheduler]\nscan_quadrant = 4294967295\n",
        ];
        for doc in cases {
            let cfg = load_toml(doc).unwrap();
            assert!(cfg.validate().is_err(), "accepted: {doc}");
        }
    }

    #[test]
    fn unknown_quadrant_is_rejected() {
        let cfg = load_toml("[scheduler]\ndrop_quadrant_order = [3, 9]\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
