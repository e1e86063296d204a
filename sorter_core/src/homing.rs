//! Homing bootstrap: position both axes at a known reference before the
//! first scheduling cycle.
//!
//! Pure state machine: each `step()` consumes the debounced home-switch
//! level and yields the next action for the actuator layer to execute. The
//! caller must let each jog finish (both axes idle) before stepping again,
//! the same phase lock the scheduler runs under.

use crate::config::{GeometryCfg, HomingCfg, SchedulerCfg};
use crate::rotary::RotaryPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingState {
    /// Jog both axes counter-clockwise until the switch releases.
    BackOff,
    /// Jog the collector clockwise onto the switch, then retreat one notch.
    SeekCollector,
    /// Jog the dropper counter-clockwise onto the switch.
    SeekDropper,
    /// Reference latched; issue the starting moves.
    MoveToStart,
    Done,
}

/// One instruction for the actuator layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingAction {
    JogBoth { delta: i32 },
    JogCollector { delta: i32 },
    JogDropper { delta: i32 },
    /// Overwrite both controllers' current positions; no motion.
    SetReference { collector: i32, dropper: i32 },
    /// Absolute moves to the run starting posture.
    MoveToStart { collector: i32, dropper: i32 },
    Complete,
}

pub struct HomingSequence {
    state: HomingState,
    back_off_ticks: i32,
    reference_collector: i32,
    reference_dropper: i32,
    start_dropper: i32,
}

impl HomingSequence {
    pub fn new(geometry: &GeometryCfg, scheduler: &SchedulerCfg, homing: &HomingCfg) -> Self {
        // Static index positions only; a throwaway axis is enough.
        let axis = RotaryPosition::new(geometry.ticks_per_rev, geometry.index_count, true);
        let scan = scheduler.scan_quadrant;
        Self {
            state: HomingState::BackOff,
            back_off_ticks: homing.back_off_ticks,
            reference_collector: axis.static_index_position(scan) - homing.reference_offset,
            reference_dropper: axis.static_index_position(scan + 2) - homing.reference_offset,
            start_dropper: axis.static_index_position(scan + 1),
        }
    }

    pub fn state(&self) -> HomingState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == HomingState::Done
    }

    /// Advance by one poll of the home switch.
    pub fn step(&mut self, switch_pressed: bool) -> HomingAction {
        match self.state {
            HomingState::BackOff => {
                if switch_pressed {
                    return HomingAction::JogBoth { delta: -1 };
                }
                tracing::debug!("homing: clear of switch, seeking collector");
                self.state = HomingState::SeekCollector;
                // Fall through with the same (released) switch reading.
                self.step(switch_pressed)
            }
            HomingState::SeekCollector => {
                if !switch_pressed {
                    return HomingAction::JogCollector { delta: 1 };
                }
                tracing::debug!("homing: collector edge found, seeking dropper");
                self.state = HomingState::SeekDropper;
                HomingAction::JogCollector {
                    delta: -self.back_off_ticks,
                }
            }
            HomingState::SeekDropper => {
                if !switch_pressed {
                    return HomingAction::JogDropper { delta: -1 };
                }
                tracing::debug!(
                    collector = self.reference_collector,
                    dropper = self.reference_dropper,
                    "homing: reference latched"
                );
                self.state = HomingState::MoveToStart;
                HomingAction::SetReference {
                    collector: self.reference_collector,
                    dropper: self.reference_dropper,
                }
            }
            HomingState::MoveToStart => {
                self.state = HomingState::Done;
                HomingAction::MoveToStart {
                    collector: 0,
                    dropper: self.start_dropper,
                }
            }
            HomingState::Done => HomingAction::Complete,
        }
    }
}
