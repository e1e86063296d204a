//! The per-cycle decision core (`CycleScheduler`).
//!
//! Each control cycle reconciles fresh position feedback, the slot-occupancy
//! buffer, and the color classification of any slot that just arrived at the
//! scanner, then emits one absolute target per axis. A cycle runs only when
//! both actuators report idle, so every commanded move has physically
//! completed by the time the next cycle observes its intent; that is what
//! makes "classify on arrival" sound.

use std::time::Duration;

use eyre::WrapErr;
use sorter_traits::ColorSensor;

use crate::color::{BackgroundProfile, ColorSample};
use crate::config::{ColorCfg, GeometryCfg, SchedulerCfg};
use crate::error::{BuildError, Result, SorterError};
use crate::hw_error::map_hw_error;
use crate::quadrant::QuadrantAssigner;
use crate::rotary::RotaryPosition;
use crate::slots::{SlotBuffer, SlotEntry, UNREACHABLE_DIST};
use crate::status::{AxisCommand, AxisIntent, CycleStatus, RunState, RunSummary};

/// Per-cycle scheduler for the collector and dropper axes.
///
/// Owns all mutable run state: both axis positions, the slot buffer, the
/// quadrant memory, and the end-of-stream counters. Nothing else mutates
/// these; the runner only feeds raw positions in and carries commands out.
pub struct CycleScheduler {
    geometry: GeometryCfg,
    cfg: SchedulerCfg,
    settle: Duration,
    collector: RotaryPosition,
    dropper: RotaryPosition,
    slots: SlotBuffer,
    assigner: QuadrantAssigner,
    background: Option<BackgroundProfile>,
    collector_intent: AxisIntent,
    dropper_intent: AxisIntent,
    state: RunState,
    objects_sorted: u32,
    background_total: u32,
    background_consecutive: u32,
}

impl CycleScheduler {
    pub fn new(
        geometry: GeometryCfg,
        color: &ColorCfg,
        cfg: SchedulerCfg,
    ) -> std::result::Result<Self, BuildError> {
        if geometry.ticks_per_rev == 0 || geometry.index_count == 0 {
            return Err(BuildError::InvalidConfig(
                "ticks_per_rev and index_count must be nonzero",
            ));
        }
        if !geometry.ticks_per_rev.is_multiple_of(geometry.index_count) {
            return Err(BuildError::InvalidConfig(
                "ticks_per_rev must be an exact multiple of index_count",
            ));
        }
        if geometry.slot_count == 0 {
            return Err(BuildError::InvalidConfig("slot_count must be nonzero"));
        }
        // Widened arithmetic: unvalidated values must not wrap.
        let last_slot_index =
            (geometry.slot_count as u128 - 1) * u128::from(geometry.slot_stride.max(1));
        if last_slot_index >= u128::from(geometry.index_count) {
            return Err(BuildError::InvalidConfig(
                "slots do not fit the index ring at the configured stride",
            ));
        }
        // The wait position sits one quadrant past the scanner.
        if u64::from(cfg.scan_quadrant) + 1 >= u64::from(geometry.index_count) {
            return Err(BuildError::InvalidConfig(
                "scan_quadrant leaves no room for the wait position",
            ));
        }
        if cfg.background_miss_threshold == 0 {
            return Err(BuildError::InvalidConfig(
                "background_miss_threshold must be nonzero",
            ));
        }
        let assigner = QuadrantAssigner::new(
            geometry.index_count as usize,
            cfg.drop_quadrant_order.clone(),
            color.match_tolerance,
        )?;
        Ok(Self {
            collector: RotaryPosition::new(geometry.ticks_per_rev, geometry.index_count, true),
            dropper: RotaryPosition::new(geometry.ticks_per_rev, geometry.index_count, true),
            slots: SlotBuffer::new(geometry.slot_count, geometry.slot_stride),
            assigner,
            background: None,
            collector_intent: AxisIntent::Wait,
            dropper_intent: AxisIntent::Wait,
            state: RunState::Running,
            objects_sorted: 0,
            background_total: 0,
            background_consecutive: 0,
            settle: Duration::from_millis(color.settle_ms),
            geometry,
            cfg,
        })
    }

    /// Install the calibrated background profile. Must happen before the
    /// first cycle; classification is meaningless without it.
    pub fn set_background(&mut self, profile: BackgroundProfile) {
        self.background = Some(profile);
    }

    /// Folded collector position after the last cycle.
    pub fn collector_position(&self) -> i32 {
        self.collector.position()
    }

    /// Folded dropper position after the last cycle.
    pub fn dropper_position(&self) -> i32 {
        self.dropper.position()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn slot_entry(&self, slot: usize) -> SlotEntry {
        self.slots.entry(slot)
    }

    pub fn stored_color(&self, quadrant: usize) -> ColorSample {
        self.assigner.stored(quadrant)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            objects_sorted: self.objects_sorted,
            background_total: self.background_total,
            background_consecutive: self.background_consecutive,
        }
    }

    /// Run one scheduling cycle.
    ///
    /// `collector_raw` / `dropper_raw` are the free-running position counters
    /// read this iteration; the sensor is consulted only when the previous
    /// collector intent ended at the scanner. Returns the two axis commands,
    /// or the shutdown commands once the background streak hits its
    /// threshold.
    pub fn cycle<S: ColorSensor + ?Sized>(
        &mut self,
        collector_raw: i64,
        dropper_raw: i64,
        sensor: &mut S,
    ) -> Result<CycleStatus> {
        if self.state == RunState::Idle {
            return Err(eyre::Report::new(SorterError::State(
                "cycle called after shutdown".into(),
            )));
        }

        let c_pos = self.collector.update(collector_raw);
        let d_pos = self.dropper.update(dropper_raw);

        // Next empty slot approaching the scanner.
        let scan_target = self
            .collector
            .static_index_position(self.cfg.scan_quadrant);
        let next_scan =
            self.slots
                .find_nearest(&self.collector, scan_target, false, self.geometry.deadband);

        // Classify the slot that just arrived at the scanner, if any. The
        // arriving slot lags the next search hit by one slot position.
        if self.collector_intent.arrives_at_scan() {
            let arrived = match next_scan {
                Some(hit) => self.slots.previous_slot(hit.slot),
                None => self.slots.len() - 1,
            };
            self.classify_arrival(arrived, sensor)?;
        }

        // Next full slot approaching the dropper's current position, with its
        // distance recomputed linearly against the assigned drop target. A
        // negative distance means the target is behind the dropper this
        // revolution; the drop leg waits its turn rather than reversing.
        let next_full = self
            .slots
            .find_nearest(&self.collector, d_pos, true, self.geometry.deadband)
            .map(|hit| {
                let abs = self.slots.slot_abs_position(&self.collector, hit.slot);
                let target = match self.slots.entry(hit.slot) {
                    SlotEntry::Assigned(t) => t,
                    SlotEntry::Empty => abs,
                };
                (hit.slot, target - abs)
            });

        let scan_dist = next_scan.map_or(UNREACHABLE_DIST, |hit| hit.dist);
        let wait_pos = self
            .collector
            .static_index_position(self.cfg.scan_quadrant + 1);

        let (collector_cmd, dropper_cmd) = match next_full {
            Some((slot, dist)) if dist >= 0 && dist <= scan_dist => {
                // Drop handoff wins. Claim the slot now so it cannot be
                // offered again before the physical drop completes.
                match self.slots.claim(slot) {
                    Some(drop_target) => {
                        let intent = if dist < scan_dist {
                            AxisIntent::MovingToDrop
                        } else {
                            AxisIntent::MovingToDropAndScan
                        };
                        tracing::debug!(slot, dist, drop_target, ?intent, "drop handoff");
                        (
                            AxisCommand {
                                target: c_pos + dist,
                                intent,
                            },
                            AxisCommand {
                                target: drop_target,
                                intent: AxisIntent::MovingToDrop,
                            },
                        )
                    }
                    // Unreachable with a consistent buffer; degrade to a scan move.
                    None => self.scan_commands(c_pos, scan_dist, wait_pos),
                }
            }
            Some((slot, _)) => {
                // Scan leg is closer (or the drop target is behind): keep the
                // dropper heading for the pending target, collector scans.
                let pending = match self.slots.entry(slot) {
                    SlotEntry::Assigned(t) => t,
                    SlotEntry::Empty => wait_pos,
                };
                let (collector_cmd, _) = self.scan_commands(c_pos, scan_dist, wait_pos);
                (
                    collector_cmd,
                    AxisCommand {
                        target: pending,
                        intent: AxisIntent::MovingToDrop,
                    },
                )
            }
            None => self.scan_commands(c_pos, scan_dist, wait_pos),
        };

        self.collector_intent = collector_cmd.intent;
        self.dropper_intent = dropper_cmd.intent;

        // End-of-stream monitor.
        if self.background_consecutive >= self.cfg.background_miss_threshold {
            self.state = RunState::Idle;
            let summary = self.summary();
            tracing::info!(
                objects = summary.objects_sorted,
                missed = summary.missed_slots(),
                "input stream ended, shutting down"
            );
            return Ok(CycleStatus::ShutDown {
                collector: AxisCommand {
                    target: self.cfg.shutdown_collector,
                    intent: AxisIntent::Wait,
                },
                dropper: AxisCommand {
                    target: self.cfg.shutdown_dropper,
                    intent: AxisIntent::Wait,
                },
                summary,
            });
        }

        Ok(CycleStatus::Running {
            collector: collector_cmd,
            dropper: dropper_cmd,
        })
    }

    /// Commands for the no-drop case: collector toward the next empty slot,
    /// dropper parked at the wait position. With no empty slot left the
    /// collector simply holds position.
    fn scan_commands(
        &self,
        c_pos: i32,
        scan_dist: i32,
        wait_pos: i32,
    ) -> (AxisCommand, AxisCommand) {
        let collector = if scan_dist == UNREACHABLE_DIST {
            AxisCommand {
                target: c_pos,
                intent: AxisIntent::Wait,
            }
        } else {
            AxisCommand {
                target: c_pos + scan_dist,
                intent: AxisIntent::MovingToScan,
            }
        };
        (
            collector,
            AxisCommand {
                target: wait_pos,
                intent: AxisIntent::Wait,
            },
        )
    }

    /// Sample the sensor for the slot sitting at the scanner and either
    /// queue it for discharge or count a background read.
    fn classify_arrival<S: ColorSensor + ?Sized>(
        &mut self,
        arrived: usize,
        sensor: &mut S,
    ) -> Result<()> {
        let background = self.background.ok_or_else(|| {
            eyre::Report::new(SorterError::State("background not calibrated".into()))
        })?;
        let sample: ColorSample = sensor
            .sample(self.settle)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("sampling scanner color")?
            .into();

        if background.is_background(&sample) {
            self.background_total += 1;
            self.background_consecutive += 1;
            tracing::trace!(
                slot = arrived,
                streak = self.background_consecutive,
                "background at scanner"
            );
            return Ok(());
        }

        let assignment = self.assigner.assign(sample);
        let drop_target = self
            .collector
            .static_index_position(assignment.quadrant as u32);
        self.slots.assign(arrived, drop_target);
        self.objects_sorted += 1;
        self.background_consecutive = 0;
        tracing::debug!(
            slot = arrived,
            quadrant = assignment.quadrant,
            outcome = ?assignment.outcome,
            r = sample.0[0],
            g = sample.0[1],
            b = sample.0[2],
            "object classified"
        );
        Ok(())
    }
}
