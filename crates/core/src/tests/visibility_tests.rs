use super::*;
use crate::curve::Keyframe;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn wait(index: usize, seconds: f32) -> WaitPoint {
    WaitPoint { index, seconds }
}

#[test]
fn test_interval_is_clamped() {
    let curve = VisibilityCurve::linear(2.0);
    assert_eq!(curve.interval_at(-5.0, 0.0), 0.0);
    assert_eq!(curve.interval_at(50.0, 0.0), 1.0);
    assert!(approx(curve.interval_at(1.0, 0.0), 0.5));
    assert!(approx(curve.interval_at(11.0, 10.0), 0.5));
    for step in -20..40 {
        let interval = curve.interval_at(step as f32 * 0.1, 0.0);
        assert!((0.0..=1.0).contains(&interval));
    }
}

#[test]
fn test_offsets_shift_the_reveal_window() {
    let curve = VisibilityCurve::linear(2.0).with_offsets(0.5, 0.5);
    assert_eq!(curve.effective_duration(), 1.0);
    assert_eq!(curve.interval_at(0.5, 0.0), 0.0);
    assert!(approx(curve.interval_at(1.0, 0.0), 0.5));
    assert_eq!(curve.interval_at(1.5, 0.0), 1.0);
}

#[test]
fn test_offsets_never_exceed_duration() {
    let mut curve = VisibilityCurve::linear(1.0);
    let assignments: [(bool, f32); 6] = [
        (true, 0.8),
        (false, 0.5),
        (false, 3.0),
        (true, -1.0),
        (false, 0.9),
        (true, 0.7),
    ];
    for (start, value) in assignments {
        if start {
            curve.set_start_offset(value);
        } else {
            curve.set_end_offset(value);
        }
        assert!(curve.start_offset() + curve.end_offset() <= curve.duration() + f32::EPSILON);
        assert!(curve.start_offset() >= 0.0 && curve.end_offset() >= 0.0);
    }

    curve.set_start_offset(0.8);
    curve.set_duration(0.5);
    assert!(curve.start_offset() + curve.end_offset() <= 0.5 + f32::EPSILON);
}

#[test]
fn test_zero_effective_duration_is_guarded() {
    let curve = VisibilityCurve::linear(1.0).with_offsets(0.5, 0.5);
    assert_eq!(curve.effective_duration(), 0.0);
    assert_eq!(curve.interval_at(0.4, 0.0), 0.0);
    assert_eq!(curve.interval_at(0.6, 0.0), 1.0);
}

#[test]
fn test_index_rounds_visibility() {
    let curve = VisibilityCurve::linear(1.0);
    assert_eq!(curve.index_at(0.0, 0.0, 10), 0);
    assert_eq!(curve.index_at(0.5, 0.0, 10), 5);
    assert_eq!(curve.index_at(0.26, 0.0, 10), 3);
    assert_eq!(curve.index_at(2.0, 0.0, 10), 10);
}

#[test]
fn test_time_for_index_finds_first_frame() {
    let curve = VisibilityCurve::linear(1.0);
    let step = 1.0 / 60.0;
    let time = curve.time_for_index(5, 0.0, 10, step).unwrap();
    assert!(time > 0.43 && time < 0.47, "{time}");
    assert!(curve.index_at(time, 0.0, 10) >= 5);
    assert!(curve.index_at(time - step, 0.0, 10) < 5);

    assert!(curve.time_for_index(10, 0.0, 10, step).is_some());
    assert_eq!(curve.time_for_index(11, 0.0, 10, step), None);
    assert_eq!(curve.time_for_index(0, 3.0, 10, step), Some(3.0));
}

#[test]
fn test_time_for_index_zero_waits_for_start_offset() {
    let curve = VisibilityCurve::linear(2.0).with_offsets(0.5, 0.0);
    let time = curve.time_for_index(0, 0.0, 10, 0.1).unwrap();
    assert!(approx(time, 0.6), "{time}");
}

#[test]
fn test_time_for_index_reports_unreached_index() {
    // A curve that stops at half visibility never shows the last characters.
    let half = AnimationCurve::linear(0.0, 0.0, 1.0, 0.5);
    let curve = VisibilityCurve::new(half, 1.0);
    assert_eq!(curve.time_for_index(9, 0.0, 10, 0.05), None);
}

#[test]
fn test_time_for_index_scan_is_bounded_on_long_clips() {
    let duration = 2.0e5;
    let coarse = duration / MAX_SCAN_FRAMES as f32;

    let half = VisibilityCurve::new(AnimationCurve::linear(0.0, 0.0, 1.0, 0.5), duration);
    assert_eq!(half.time_for_index(9, 0.0, 10, 1.0 / 60.0), None);

    let linear = VisibilityCurve::linear(duration);
    let time = linear.time_for_index(5, 0.0, 10, 1.0 / 60.0).unwrap();
    assert!(time >= 0.45 * duration && time <= 0.45 * duration + coarse, "{time}");
}

#[test]
fn test_tangent_is_reveal_slope() {
    let curve = VisibilityCurve::linear(2.0);
    assert!((curve.tangent_at(1.0, 0.0) - 1.0).abs() < 1e-2);
    let eased = VisibilityCurve::new(AnimationCurve::ease_in_out(0.0, 0.0, 1.0, 1.0), 1.0);
    assert!(eased.tangent_at(0.5, 0.0) > eased.tangent_at(0.1, 0.0));
}

#[test]
fn test_pause_holds_at_wait_index() {
    let mut curve = VisibilityCurve::linear(2.0);
    curve.apply_pauses(&[wait(2, 0.5)], 4).unwrap();

    let end = curve.runtime().end_time().unwrap();
    assert!(approx(end, 1.0), "{end}");
    // Two of four characters stay visible for the whole pause.
    for step in 0..=10 {
        let time = 0.76 + step as f32 * 0.048;
        assert_eq!(curve.index_at(time, 0.0, 4), 2, "t={time}");
        assert!(approx(curve.visibility_at(time, 0.0), 0.5), "t={time}");
    }
    assert_eq!(curve.index_at(2.0, 0.0, 4), 4);
    assert!(approx(curve.visibility_at(0.375, 0.0), 0.25));
}

#[test]
fn test_pause_rescale_from_source_is_idempotent() {
    let mut once = VisibilityCurve::linear(3.0);
    once.apply_pauses(&[wait(1, 0.25), wait(3, 0.5)], 6).unwrap();

    let mut twice = VisibilityCurve::linear(3.0);
    twice.apply_pauses(&[wait(1, 0.25), wait(3, 0.5)], 6).unwrap();
    twice.apply_pauses(&[wait(1, 0.25), wait(3, 0.5)], 6).unwrap();

    assert_eq!(once.runtime(), twice.runtime());
    assert_eq!(once.editor(), twice.editor());
}

#[test]
fn test_rescaling_runtime_keys_compounds() {
    let mut curve = VisibilityCurve::linear(2.0);
    curve.apply_pauses(&[wait(1, 0.5)], 4).unwrap();
    let runtime = curve.runtime().clone();
    let scale = (2.0 - 0.5) / 2.0;

    // Rescaling the already rescaled keys shrinks the reveal a second time.
    let compounded = runtime.scaled(scale, 1.0).unwrap();
    let drift = runtime.end_time().unwrap() - compounded.end_time().unwrap();
    assert!(drift > 0.2, "{drift}");
    assert!(approx(runtime.end_time().unwrap(), 1.0));
}

#[test]
fn test_pause_preserves_curved_reveal() {
    let editor = AnimationCurve::new(vec![
        Keyframe::new(0.0, 0.0, 0.0, 2.0),
        Keyframe::new(1.0, 1.0, 0.5, 0.0),
    ])
    .unwrap();
    let mut curve = VisibilityCurve::new(editor.clone(), 4.0);
    curve.apply_pauses(&[wait(8, 1.0)], 10).unwrap();

    let scaled = editor.scaled(0.75, 1.0).unwrap();
    let hold_start = scaled.time_for_value(0.8).unwrap();
    for step in 0..10 {
        let u = hold_start * step as f32 / 10.0;
        assert!(approx(curve.runtime().evaluate(u), scaled.evaluate(u)), "u={u}");
    }
    assert!(approx(curve.runtime().evaluate(hold_start + 0.2), 0.8));
    assert!(approx(curve.runtime().end_time().unwrap(), 1.0));
}

#[test]
fn test_pause_errors() {
    let mut curve = VisibilityCurve::linear(1.0);
    assert_eq!(
        curve.apply_pauses(&[wait(1, 0.6), wait(2, 0.4)], 3),
        Err(CurveError::PausesExceedDuration {
            pauses: 1.0,
            effective: 1.0
        })
    );
    let mut empty = VisibilityCurve::linear(0.0);
    assert_eq!(
        empty.apply_pauses(&[wait(0, 0.1)], 3),
        Err(CurveError::ZeroDuration)
    );
    assert!(empty.apply_pauses(&[], 3).is_ok());
}

#[test]
fn test_no_waits_restores_editor_keys() {
    let mut curve = VisibilityCurve::linear(2.0);
    curve.apply_pauses(&[wait(1, 0.5)], 4).unwrap();
    assert_ne!(curve.runtime(), curve.editor());
    curve.apply_pauses(&[], 4).unwrap();
    assert_eq!(curve.runtime(), curve.editor());
}
