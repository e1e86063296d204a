//! Modulo position tracking for one rotary axis.
//!
//! The motion controller exposes a free-running step counter that can run
//! past a full revolution in either direction. `RotaryPosition` folds that
//! counter into `[0, ticks_per_rev)` and provides the index/position
//! conversions every scheduling decision is built on. All arithmetic is
//! integer-exact: the scheduler compares these values directly, so two
//! calls with the same inputs must always produce the same output.

/// Bounded position of one rotary axis, plus its index geometry.
#[derive(Debug, Clone)]
pub struct RotaryPosition {
    ticks_per_rev: i32,
    index_count: i32,
    ticks_per_index: i32,
    wrap: bool,
    current: i32,
}

impl RotaryPosition {
    /// Geometry must already be validated: `ticks_per_rev` nonzero and an
    /// exact multiple of `index_count` (see `sorter_config::validate`).
    pub fn new(ticks_per_rev: u32, index_count: u32, wrap: bool) -> Self {
        let ticks_per_rev = ticks_per_rev as i32;
        let index_count = index_count as i32;
        Self {
            ticks_per_rev,
            index_count,
            ticks_per_index: ticks_per_rev / index_count.max(1),
            wrap,
            current: 0,
        }
    }

    /// Fold a raw counter reading into the bounded position and store it.
    ///
    /// In wrap mode the result is always in `[0, ticks_per_rev)` no matter
    /// how many revolutions the raw counter has accumulated; non-wrap mode
    /// passes the reading through unchanged.
    pub fn update(&mut self, raw: i64) -> i32 {
        self.current = if self.wrap {
            raw.rem_euclid(i64::from(self.ticks_per_rev)) as i32
        } else {
            raw as i32
        };
        self.current
    }

    /// Current bounded position.
    pub fn position(&self) -> i32 {
        self.current
    }

    /// Overwrite the bounded position (used when re-referencing after homing).
    pub fn set_position(&mut self, pos: i32) {
        self.current = pos;
    }

    /// Absolute position of physical index `index` given the current
    /// rotation. Index 0 leads: it sits at absolute 0 when the axis is homed,
    /// and every index trails it by `ticks_per_index` steps.
    pub fn index_abs_position(&self, index: u32) -> i32 {
        let mut pos = self.current - (index as i32) * self.ticks_per_index;
        if pos < 0 {
            pos += self.ticks_per_rev;
        }
        pos
    }

    /// Fixed position of index `index`, independent of the current rotation.
    /// Used to address stationary targets such as the scanner quadrant.
    pub fn static_index_position(&self, index: u32) -> i32 {
        self.ticks_per_index * (index as i32)
    }

    /// Clockwise distance from `from` to `to`.
    ///
    /// Zero when the positions differ by no more than `deadband` (already in
    /// position); otherwise the positive clockwise travel, rotating negative
    /// raw deltas forward by one revolution. Clockwise is the only motion
    /// direction the scheduler ever considers.
    pub fn cw_distance(&self, from: i32, to: i32, deadband: u32) -> i32 {
        let mut dist = to - from;
        if dist.unsigned_abs() <= deadband {
            return 0;
        }
        if dist < 0 {
            dist += self.ticks_per_rev;
        }
        dist
    }

    pub fn ticks_per_rev(&self) -> i32 {
        self.ticks_per_rev
    }

    pub fn ticks_per_index(&self) -> i32 {
        self.ticks_per_index
    }

    pub fn index_count(&self) -> i32 {
        self.index_count
    }
}
