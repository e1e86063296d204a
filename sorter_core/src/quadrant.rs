//! Discharge-quadrant assignment and per-quadrant color memory.

use crate::color::ColorSample;
use crate::error::BuildError;

/// How a quadrant was chosen for a classified color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// Quadrant had no stored color; the sample is now recorded there.
    Empty,
    /// Quadrant's stored color matches the sample; reuse it.
    Match,
    /// No empty or matching quadrant; the last candidate is the overflow bin.
    Forced,
}

/// Result of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub quadrant: usize,
    pub outcome: AssignOutcome,
}

/// Maps classified colors to discharge quadrants.
///
/// The candidate order encodes priority: earlier quadrants fill first, and
/// the final candidate doubles as the overflow bin once everything else is
/// full and mismatched. Quadrant memory lives for the whole run; this type
/// never clears an assigned color (unloading bins is outside the core).
#[derive(Debug, Clone)]
pub struct QuadrantAssigner {
    memory: Vec<ColorSample>,
    order: Vec<usize>,
    tolerance: u32,
}

impl QuadrantAssigner {
    pub fn new(
        quadrant_count: usize,
        order: Vec<usize>,
        tolerance: u32,
    ) -> Result<Self, BuildError> {
        if order.is_empty() {
            return Err(BuildError::InvalidConfig("drop quadrant order is empty"));
        }
        if order.iter().any(|&q| q >= quadrant_count) {
            return Err(BuildError::InvalidConfig(
                "drop quadrant order references quadrant out of range",
            ));
        }
        Ok(Self {
            memory: vec![ColorSample::EMPTY; quadrant_count],
            order,
            tolerance,
        })
    }

    /// Pick the quadrant for `sample`: first empty candidate (recording the
    /// sample there), else first match, else the last candidate as forced
    /// overflow. The forced path deliberately leaves the stored color
    /// untouched, so the overflow bin keeps advertising its first occupant.
    pub fn assign(&mut self, sample: ColorSample) -> Assignment {
        // order is validated non-empty and in-range in new().
        for &quadrant in &self.order {
            if self.memory[quadrant].is_empty() {
                self.memory[quadrant] = sample;
                return Assignment {
                    quadrant,
                    outcome: AssignOutcome::Empty,
                };
            }
            if sample.matches(&self.memory[quadrant], self.tolerance) {
                return Assignment {
                    quadrant,
                    outcome: AssignOutcome::Match,
                };
            }
        }
        Assignment {
            quadrant: self.order[self.order.len() - 1],
            outcome: AssignOutcome::Forced,
        }
    }

    /// Stored color of a quadrant (`EMPTY` when unassigned).
    pub fn stored(&self, quadrant: usize) -> ColorSample {
        self.memory.get(quadrant).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigner() -> QuadrantAssigner {
        QuadrantAssigner::new(8, vec![3, 4, 5, 6, 7], 14).unwrap()
    }

    #[test]
    fn first_empty_candidate_wins_and_records() {
        let mut a = assigner();
        let red = ColorSample([60, 120, 110]);
        let got = a.assign(red);
        assert_eq!(got.quadrant, 3);
        assert_eq!(got.outcome, AssignOutcome::Empty);
        assert_eq!(a.stored(3), red);
    }

    #[test]
    fn matching_color_reuses_its_quadrant() {
        let mut a = assigner();
        a.assign(ColorSample([60, 120, 110]));
        a.assign(ColorSample([200, 80, 90]));
        // Within tolerance of the first color -> quadrant 3 again.
        let got = a.assign(ColorSample([65, 115, 112]));
        assert_eq!(got.quadrant, 3);
        assert_eq!(got.outcome, AssignOutcome::Match);
    }

    #[test]
    fn assignment_is_idempotent_before_mutation() {
        let mut a = assigner();
        a.assign(ColorSample([60, 120, 110]));
        let sample = ColorSample([61, 121, 111]);
        let first = a.assign(sample);
        let second = a.assign(sample);
        assert_eq!(first, second);
    }

    #[test]
    fn overflow_forces_last_candidate_without_overwrite() {
        let mut a = assigner();
        // Fill every candidate with mutually distinct colors.
        for (i, q) in [3usize, 4, 5, 6, 7].iter().enumerate() {
            let c = ColorSample([100 * (i as u32 + 1), 50, 50]);
            let got = a.assign(c);
            assert_eq!(got.quadrant, *q);
            assert_eq!(got.outcome, AssignOutcome::Empty);
        }
        let last_stored = a.stored(7);
        let newcomer = ColorSample([33, 900, 700]);
        let got = a.assign(newcomer);
        assert_eq!(got.quadrant, 7);
        assert_eq!(got.outcome, AssignOutcome::Forced);
        // Overflow reuses the bin but keeps its original memory.
        assert_eq!(a.stored(7), last_stored);
    }

    #[test]
    fn rejects_bad_candidate_order() {
        assert!(QuadrantAssigner::new(8, vec![], 14).is_err());
        assert!(QuadrantAssigner::new(8, vec![3, 8], 14).is_err());
    }
}
