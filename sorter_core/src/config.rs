//! Runtime configuration for the scheduling core.
//!
//! These are the structs `CycleScheduler` and friends consume at run time.
//! They are separate from the TOML-deserialized schemas in `sorter_config`;
//! conversions live here. Defaults reproduce the reference machine: a
//! 400-step revolution split into 8 quadrants, 4 collector slots two indices
//! apart, scanner on quadrant 2.

/// Carousel geometry shared by both axes.
#[derive(Debug, Clone)]
pub struct GeometryCfg {
    /// Steps per full revolution.
    pub ticks_per_rev: u32,
    /// Evenly spaced angular reference points per revolution (= quadrants).
    pub index_count: u32,
    /// Physical carrier slots on the collector.
    pub slot_count: usize,
    /// Index spacing between adjacent slots.
    pub slot_stride: u32,
    /// Position window treated as "in position" (absorbs step rounding).
    pub deadband: u32,
}

impl Default for GeometryCfg {
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

/// Color sensing and calibration parameters.
#[derive(Debug, Clone)]
pub struct ColorCfg {
    /// Per-channel tolerance when comparing two object colors.
    pub match_tolerance: u32,
    /// Margin added on top of the calibrated background half-range.
    pub background_margin: u32,
    /// Settle delay per filter change during a sample (ms).
    pub settle_ms: u64,
    /// Number of idle samples taken during background calibration.
    pub calibration_samples: u32,
    /// Pause between calibration samples (ms).
    pub calibration_pause_ms: u64,
}

impl Default for ColorCfg {
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

/// Per-cycle decision parameters.
#[derive(Debug, Clone)]
pub struct SchedulerCfg {
    /// Quadrant index of the scanner position.
    pub scan_quadrant: u32,
    /// Discharge quadrants in fill-priority order; the last entry is the
    /// overflow bin.
    pub drop_quadrant_order: Vec<usize>,
    /// Consecutive background reads that end the run.
    pub background_miss_threshold: u32,
    /// Power-down targets issued on the idle transition.
    pub shutdown_collector: i32,
    pub shutdown_dropper: i32,
}

impl Default for SchedulerCfg {
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

/// Homing bootstrap parameters.
#[derive(Debug, Clone)]
pub struct HomingCfg {
    /// Ticks the collector backs off after finding the switch edge.
    pub back_off_ticks: i32,
    /// Offset subtracted from the reference indices when latching positions.
    pub reference_offset: i32,
    /// Pause between homing jogs (ms), giving the debounced switch time to
    /// follow the mechanics.
    pub jog_pause_ms: u64,
}

impl Default for HomingCfg {
    fn default() -> Self {
        Self {
            back_off_ticks: 21,
            reference_offset: 4,
            jog_pause_ms: 100,
        }
    }
}

impl From<&sorter_config::Geometry> for GeometryCfg {
    fn from(g: &sorter_config::Geometry) -> Self {
        Self {
            ticks_per_rev: g.ticks_per_rev,
            index_count: g.index_count,
            slot_count: g.slot_count,
            slot_stride: g.slot_stride,
            deadband: g.deadband,
        }
    }
}

impl From<&sorter_config::Color> for ColorCfg {
    fn from(c: &sorter_config::Color) -> Self {
        Self {
            match_tolerance: c.match_tolerance,
            background_margin: c.background_margin,
            settle_ms: c.settle_ms,
            calibration_samples: c.calibration_samples,
            calibration_pause_ms: c.calibration_pause_ms,
        }
    }
}

impl From<&sorter_config::Scheduler> for SchedulerCfg {
    fn from(s: &sorter_config::Scheduler) -> Self {
        Self {
            scan_quadrant: s.scan_quadrant,
            drop_quadrant_order: s.drop_quadrant_order.clone(),
            background_miss_threshold: s.background_miss_threshold,
            shutdown_collector: s.shutdown_collector,
            shutdown_dropper: s.shutdown_dropper,
        }
    }
}

impl From<&sorter_config::Homing> for HomingCfg {
    fn from(h: &sorter_config::Homing) -> Self {
        Self {
            back_off_ticks: h.back_off_ticks,
            reference_offset: h.reference_offset,
            jog_pause_ms: h.jog_pause_ms,
        }
    }
}
