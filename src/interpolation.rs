use metfor::Quantity;
use std::ops::Sub;

/// Interpolate a value given two parallel slices of data and a target value.
///
/// Assumes that `xs` is strictly increasing and that both slices have the same, non-zero length.
/// Targets outside the range of `xs` get the value at the nearest end of the profile. Returns
/// `None` if the target cannot be ordered against the profile, e.g. a NaN height.
#[inline]
pub(crate) fn linear_interpolate_clamped<X, Y>(xs: &[X], ys: &[Y], target_x: X) -> Option<Y>
where
    X: Sub<X> + Copy + std::fmt::Debug + PartialOrd,
    <X as Sub<X>>::Output: Quantity,
    Y: Quantity + Sub<Y> + Copy,
    <Y as Sub<Y>>::Output: Quantity,
{
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(!xs.is_empty());

    let last = xs.len() - 1;
    target_x.partial_cmp(&xs[0])?;
    if target_x <= xs[0] {
        return Some(ys[0]);
    }
    if target_x >= xs[last] {
        return Some(ys[last]);
    }

    // Index of the first level above the target, guaranteed to be in 1..=last here.
    let above = xs.partition_point(|&x| x <= target_x);
    let below = above - 1;

    Some(linear_interp(
        target_x, xs[below], xs[above], ys[below], ys[above],
    ))
}

#[inline]
pub(crate) fn linear_interp<X, Y>(x_val: X, x1: X, x2: X, y1: Y, y2: Y) -> Y
where
    X: Sub<X> + Copy + std::fmt::Debug + std::cmp::PartialEq,
    <X as Sub<X>>::Output: Quantity,
    Y: Quantity + Sub<Y>,
    <Y as Sub<Y>>::Output: Quantity,
{
    debug_assert_ne!(x1, x2);

    let run = (x2 - x1).unpack();
    let rise = (y2 - y1).unpack();
    let dx = (x_val - x1).unpack();

    Y::pack(y1.unpack() + dx * (rise / run))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use metfor::{Celsius, Meters};

    fn profile() -> (Vec<Meters>, Vec<Celsius>) {
        (
            vec![Meters(0.0), Meters(1000.0), Meters(3000.0)],
            vec![Celsius(20.0), Celsius(10.0), Celsius(-10.0)],
        )
    }

    #[test]
    fn test_interior_points() {
        let (z, t) = profile();
        let val = linear_interpolate_clamped(&z, &t, Meters(500.0)).unwrap();
        assert_abs_diff_eq!(val.unpack(), 15.0);
        let val = linear_interpolate_clamped(&z, &t, Meters(2000.0)).unwrap();
        assert_abs_diff_eq!(val.unpack(), 0.0);
    }

    #[test]
    fn test_exact_levels() {
        let (z, t) = profile();
        let val = linear_interpolate_clamped(&z, &t, Meters(1000.0)).unwrap();
        assert_abs_diff_eq!(val.unpack(), 10.0);
    }

    #[test]
    fn test_clamped_outside_profile() {
        let (z, t) = profile();
        assert_abs_diff_eq!(
            linear_interpolate_clamped(&z, &t, Meters(-50.0))
                .unwrap()
                .unpack(),
            20.0
        );
        assert_abs_diff_eq!(
            linear_interpolate_clamped(&z, &t, Meters(12_000.0))
                .unwrap()
                .unpack(),
            -10.0
        );
    }

    #[test]
    fn test_nan_target_has_no_value() {
        let (z, t) = profile();
        assert!(linear_interpolate_clamped(&z, &t, Meters(std::f64::NAN)).is_none());
    }
}
