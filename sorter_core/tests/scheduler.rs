//! Scenario tests for the per-cycle decision core, driven with hand-fed
//! positions so each branch of the drop/scan priority rule is observable.

use sorter_core::mocks::ScriptedColorSensor;
use sorter_core::{
    AxisIntent, BackgroundProfile, ColorCfg, ColorSample, CycleScheduler, CycleStatus, GeometryCfg,
    RunState, SchedulerCfg, SlotEntry,
};

const BACKGROUND: [u32; 3] = [139, 159, 101];
const OBJECT_A: [u32; 3] = [60, 130, 120];
const OBJECT_B: [u32; 3] = [95, 80, 60];

fn scheduler(cfg: SchedulerCfg) -> CycleScheduler {
    let mut s = CycleScheduler::new(GeometryCfg::default(), &ColorCfg::default(), cfg).unwrap();
    s.set_background(BackgroundProfile {
        reference: ColorSample(BACKGROUND),
        tolerance: 10,
    });
    s
}

fn running(status: CycleStatus) -> (sorter_core::AxisCommand, sorter_core::AxisCommand) {
    match status {
        CycleStatus::Running { collector, dropper } => (collector, dropper),
        CycleStatus::ShutDown { .. } => panic!("unexpected shutdown"),
    }
}

#[test]
fn first_cycle_carries_nearest_empty_slot_to_scanner() {
    let mut s = scheduler(SchedulerCfg::default());
    let mut sensor = ScriptedColorSensor::repeating(vec![BACKGROUND]);

    // Homed posture: collector at 0, dropper at the wait quadrant.
    let (collector, dropper) = running(s.cycle(0, 150, &mut sensor).unwrap());

    // Slot 3 already sits on the scanner (distance 0, "current" not "next");
    // slot 0 is the nearest approaching empty slot, 100 ticks out.
    assert_eq!(collector.target, 100);
    assert_eq!(collector.intent, AxisIntent::MovingToScan);
    assert_eq!(dropper.target, 150);
    assert_eq!(dropper.intent, AxisIntent::Wait);
}

#[test]
fn arrival_classifies_and_drop_handoff_wins_when_nearer() {
    let mut s = scheduler(SchedulerCfg::default());
    let mut sensor = ScriptedColorSensor::repeating(vec![OBJECT_A, BACKGROUND]);

    running(s.cycle(0, 150, &mut sensor).unwrap());
    // Scan move finished: slot 0 is at the scanner holding an object.
    let (collector, dropper) = running(s.cycle(100, 150, &mut sensor).unwrap());

    // First distinct color claims the first discharge quadrant (3, at 150).
    // Its handoff is 50 ticks out versus 100 for the next empty slot, so the
    // drop leg wins and the slot is claimed immediately.
    assert_eq!(collector.target, 150);
    assert_eq!(collector.intent, AxisIntent::MovingToDrop);
    assert_eq!(dropper.target, 150);
    assert_eq!(dropper.intent, AxisIntent::MovingToDrop);
    assert_eq!(s.slot_entry(0), SlotEntry::Empty);
    assert_eq!(s.summary().objects_sorted, 1);
    assert_eq!(s.stored_color(3), ColorSample(OBJECT_A));
}

#[test]
fn coinciding_handoff_and_scan_share_one_move() {
    // One discharge quadrant at index 4 (static 200): handoff distance from
    // the scanner equals the next scan distance, 100 ticks each.
    let cfg = SchedulerCfg {
        drop_quadrant_order: vec![4],
        ..SchedulerCfg::default()
    };
    let mut s = scheduler(cfg);
    let mut sensor = ScriptedColorSensor::repeating(vec![OBJECT_A, BACKGROUND]);

    running(s.cycle(0, 150, &mut sensor).unwrap());
    let (collector, dropper) = running(s.cycle(100, 150, &mut sensor).unwrap());

    assert_eq!(collector.target, 200);
    assert_eq!(collector.intent, AxisIntent::MovingToDropAndScan);
    assert_eq!(dropper.target, 200);
    assert_eq!(dropper.intent, AxisIntent::MovingToDrop);
    // Claimed on command issue: the same slot can never be offered twice.
    assert_eq!(s.slot_entry(0), SlotEntry::Empty);
}

#[test]
fn handoff_behind_the_slot_defers_to_the_scan_leg() {
    // Discharge quadrant 1 (static 50) sits behind the scanner, so right
    // after classification the slot's handoff distance is negative.
    let cfg = SchedulerCfg {
        drop_quadrant_order: vec![1],
        ..SchedulerCfg::default()
    };
    let mut s = scheduler(cfg);
    let mut sensor = ScriptedColorSensor::repeating(vec![OBJECT_A, BACKGROUND]);

    running(s.cycle(0, 150, &mut sensor).unwrap());
    let (collector, dropper) = running(s.cycle(100, 150, &mut sensor).unwrap());

    // Collector keeps scanning; the slot stays assigned for a later
    // revolution while the dropper heads for the pending drop position.
    assert_eq!(collector.target, 200);
    assert_eq!(collector.intent, AxisIntent::MovingToScan);
    assert_eq!(dropper.target, 50);
    assert_eq!(dropper.intent, AxisIntent::MovingToDrop);
    assert_eq!(s.slot_entry(0), SlotEntry::Assigned(50));
}

#[test]
fn matching_color_reuses_its_quadrant() {
    let mut s = scheduler(SchedulerCfg::default());
    // Second object differs by less than the match tolerance (14).
    let near_a = [OBJECT_A[0] + 5, OBJECT_A[1] - 3, OBJECT_A[2]];
    let mut sensor = ScriptedColorSensor::repeating(vec![OBJECT_A, near_a, BACKGROUND]);

    running(s.cycle(0, 150, &mut sensor).unwrap());
    running(s.cycle(100, 150, &mut sensor).unwrap());
    // Drop leg completes; next scan brings slot 1 to the scanner.
    running(s.cycle(150, 150, &mut sensor).unwrap());
    running(s.cycle(200, 150, &mut sensor).unwrap());

    // Both objects went to quadrant 3; the stored reference stays the first.
    assert_eq!(s.summary().objects_sorted, 2);
    assert_eq!(s.stored_color(3), ColorSample(OBJECT_A));
    assert!(s.stored_color(4).is_empty());
}

#[test]
fn distinct_color_claims_the_next_quadrant() {
    let mut s = scheduler(SchedulerCfg::default());
    let mut sensor = ScriptedColorSensor::repeating(vec![OBJECT_A, OBJECT_B, BACKGROUND]);

    running(s.cycle(0, 150, &mut sensor).unwrap());
    running(s.cycle(100, 150, &mut sensor).unwrap());
    running(s.cycle(150, 150, &mut sensor).unwrap());
    running(s.cycle(200, 150, &mut sensor).unwrap());

    assert_eq!(s.summary().objects_sorted, 2);
    assert_eq!(s.stored_color(3), ColorSample(OBJECT_A));
    assert_eq!(s.stored_color(4), ColorSample(OBJECT_B));
}

#[test]
fn background_streak_shuts_the_machine_down_once() {
    let cfg = SchedulerCfg {
        background_miss_threshold: 3,
        ..SchedulerCfg::default()
    };
    let mut s = scheduler(cfg);
    let mut sensor = ScriptedColorSensor::repeating(vec![BACKGROUND]);

    // Walk the machine: echo each commanded collector target back as the
    // next cycle's raw position, the way the runner does.
    let mut c_raw = 0i64;
    let d_raw = 150i64;
    let summary = loop {
        match s.cycle(c_raw, d_raw, &mut sensor).unwrap() {
            CycleStatus::Running { collector, .. } => {
                c_raw = i64::from(collector.target);
            }
            CycleStatus::ShutDown {
                collector,
                dropper,
                summary,
            } => {
                assert_eq!(collector.target, 0);
                assert_eq!(dropper.target, 215);
                break summary;
            }
        }
    };

    assert_eq!(summary.objects_sorted, 0);
    assert_eq!(summary.background_consecutive, 3);
    assert_eq!(summary.missed_slots(), 0);
    assert_eq!(s.state(), RunState::Idle);

    // The shutdown transition is terminal.
    let err = s.cycle(0, 150, &mut sensor).unwrap_err();
    assert!(err.to_string().contains("invalid state"));
}

#[test]
fn cycling_without_calibration_is_rejected_on_first_arrival() {
    let mut s =
        CycleScheduler::new(GeometryCfg::default(), &ColorCfg::default(), SchedulerCfg::default())
            .unwrap();
    let mut sensor = ScriptedColorSensor::repeating(vec![BACKGROUND]);

    // First cycle never samples, so it succeeds even uncalibrated.
    running(s.cycle(0, 150, &mut sensor).unwrap());
    let err = s.cycle(100, 150, &mut sensor).unwrap_err();
    assert!(err.to_string().contains("background not calibrated"));
}
