use std::f64::consts::{PI, TAU};

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Normalize an axis angle into `[0, π)`; an axis and its opposite are the same.
pub fn normalize_axis_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(PI);
    if wrapped >= PI {
        0.0
    } else {
        wrapped
    }
}

/// Counter-clockwise turn from `from` to `to`, in `[0, 2π)`.
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Unsigned angular distance between two directions, in `[0, π]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = angle_difference(a, b);
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}

/// World-space bearing from `from` to `to`, in `[0, 2π)`.
///
/// Coincident points yield `0.0`.
pub fn bearing(from: [f64; 2], to: [f64; 2]) -> f64 {
    normalize_angle((to[1] - from[1]).atan2(to[0] - from[0]))
}

/// Unit vector pointing along `angle`.
pub fn unit(angle: f64) -> [f64; 2] {
    let (sin, cos) = angle.sin_cos();
    [cos, sin]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_wraps_negative_and_large_angles() {
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-12);
        assert_eq!(normalize_angle(TAU), 0.0);
    }

    #[test]
    fn normalize_never_returns_tau_for_tiny_negative() {
        let a = normalize_angle(-1e-18);
        assert!((0.0..TAU).contains(&a));
    }

    #[test]
    fn axis_angle_folds_opposite_directions() {
        assert!((normalize_axis_angle(1.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((0.0..PI).contains(&normalize_axis_angle(-1e-18)));
    }

    #[test]
    fn angular_distance_is_symmetric_and_bounded() {
        assert!((angular_distance(0.1, TAU - 0.1) - 0.2).abs() < 1e-12);
        assert!((angular_distance(TAU - 0.1, 0.1) - 0.2).abs() < 1e-12);
        assert!((angular_distance(0.0, PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn bearing_points_from_first_to_second() {
        assert!((bearing([0.0, 0.0], [0.0, 2.0]) - PI / 2.0).abs() < 1e-12);
        assert!((bearing([1.0, 1.0], [0.0, 1.0]) - PI).abs() < 1e-12);
        assert_eq!(bearing([3.0, 3.0], [3.0, 3.0]), 0.0);
    }

    proptest! {
        #[test]
        fn proptest_normalized_angles_stay_in_range(a in -1.0e6f64..1.0e6) {
            let n = normalize_angle(a);
            prop_assert!((0.0..TAU).contains(&n));
            let axis = normalize_axis_angle(a);
            prop_assert!((0.0..PI).contains(&axis));
        }
    }
}
