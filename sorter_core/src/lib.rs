#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Scheduling core for the carousel color sorter (hardware-agnostic).
//!
//! Two coordinated rotary axes: a collector carries objects past a color
//! scanner, a dropper carries a receiving bin past discharge quadrants. All
//! hardware interactions go through the `sorter_traits` abstractions.
//!
//! ## Architecture
//!
//! - **RotaryPosition**: modulo position tracking per axis (`rotary` module)
//! - **ColorSample / BackgroundProfile**: classification and background
//!   rejection (`color` module)
//! - **QuadrantAssigner**: color-to-discharge-quadrant memory (`quadrant`)
//! - **SlotBuffer**: circular slot occupancy + nearest-slot search (`slots`)
//! - **CycleScheduler**: the per-cycle decision state machine (`scheduler`)
//! - **HomingSequence**: reference bootstrap state machine (`homing`)
//! - **SorterRunner / Sorter**: cooperative polling loop and builder
//!   (`runner`, `builder`)
//!
//! All position arithmetic is integer-exact so scheduling decisions, which
//! are comparisons of clockwise distances, are bit-reproducible.

pub mod builder;
pub mod color;
pub mod config;
pub mod error;
pub mod homing;
pub mod hw_error;
pub mod mocks;
pub mod quadrant;
pub mod rotary;
pub mod runner;
pub mod scheduler;
pub mod slots;
pub mod status;

pub use builder::{Sorter, SorterBuilder};
pub use color::{BackgroundProfile, ColorSample};
pub use config::{ColorCfg, GeometryCfg, HomingCfg, SchedulerCfg};
pub use error::{BuildError, SorterError};
pub use homing::{HomingAction, HomingSequence, HomingState};
pub use quadrant::{AssignOutcome, Assignment, QuadrantAssigner};
pub use rotary::RotaryPosition;
pub use scheduler::CycleScheduler;
pub use slots::{NearestSlot, SlotBuffer, SlotEntry, UNREACHABLE_DIST};
pub use status::{AxisCommand, AxisIntent, CycleStatus, RunState, RunSummary};
