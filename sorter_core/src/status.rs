//! Per-axis intents and run-level state reported by the scheduler.

/// What an axis was commanded to do this cycle. The collector's intent also
/// carries the one-cycle scan latency: a `MovingToScan` intent observed at
/// the start of the next cycle means a slot has just arrived at the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisIntent {
    /// Parked at the wait position, nothing to do.
    #[default]
    Wait,
    /// Carrying the next empty slot toward the scanner.
    MovingToScan,
    /// Carrying a full slot toward its discharge handoff.
    MovingToDrop,
    /// Drop handoff and scan arrival coincide this move.
    MovingToDropAndScan,
}

impl AxisIntent {
    /// True when this intent ends with a slot at the scanner.
    pub fn arrives_at_scan(self) -> bool {
        matches!(self, Self::MovingToScan | Self::MovingToDropAndScan)
    }
}

/// Run-level state of the control program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Homing,
    Running,
    /// Terminal: the input stream ended and shutdown targets were issued.
    Idle,
}

/// Absolute target plus intent for one axis, consumed by the actuator layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCommand {
    pub target: i32,
    pub intent: AxisIntent,
}

/// Counters accumulated over a run, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Objects classified and queued for discharge.
    pub objects_sorted: u32,
    /// Scans that saw only background.
    pub background_total: u32,
    /// Background streak that triggered the idle transition.
    pub background_consecutive: u32,
}

impl RunSummary {
    /// Slots that passed the scanner empty before the final streak.
    pub fn missed_slots(&self) -> u32 {
        self.background_total
            .saturating_sub(self.background_consecutive)
    }
}

/// Outcome of one scheduling cycle.
#[derive(Debug, Clone, Copy)]
pub enum CycleStatus {
    /// Keep going; both axes have fresh commands.
    Running {
        collector: AxisCommand,
        dropper: AxisCommand,
    },
    /// Input stream ended: move to the power-down targets, then release.
    ShutDown {
        collector: AxisCommand,
        dropper: AxisCommand,
        summary: RunSummary,
    },
}
