/// Assert that two floats are equal to within `f32::EPSILON`.
#[track_caller]
pub fn assert_close(actual: f32, expected: f32) {
    assert_close_within(actual, expected, f32::EPSILON)
}

/// Assert that two floats are equal to within `tolerance`.
#[track_caller]
pub fn assert_close_within(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() < tolerance,
        "{} != {} ± {}",
        actual,
        expected,
        tolerance
    );
}
