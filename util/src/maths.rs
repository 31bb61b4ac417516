//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Saturate a value so that its magnitude does not exceed `limit`, keeping its sign.
///
/// `limit` is expected to be non-negative.
pub fn saturate<T>(value: T, limit: T) -> T
where
    T: Float,
{
    if value.abs() > limit {
        limit.copysign(value)
    } else {
        value
    }
}

/// Wrap an angle into the range `(-pi, pi]`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    // rem_euclid gives [0, 2pi), shifting by pi maps that onto [-pi, pi)
    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    if wrapped <= -pi_t {
        wrapped + tau_t
    } else {
        wrapped
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(3.0f64, 2.5), 2.5);
        assert_eq!(saturate(-3.0f64, 2.5), -2.5);
        assert_eq!(saturate(1.0f64, 2.5), 1.0);
        assert_eq!(saturate(-1.0f64, 2.5), -1.0);
        assert_eq!(saturate(0.0f64, 0.0), 0.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-3.0f64, -2.0, 2.0), -2.0);
        assert_eq!(clamp(3.0f64, -2.0, 2.0), 2.0);
        assert_eq!(clamp(0.5f64, -2.0, 2.0), 0.5);
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0.5f64) - 0.5).abs() < 1e-12);
        assert!((wrap_pi(PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(-PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-5.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);

        for i in -100..100 {
            let a = wrap_pi(i as f64 * 0.37);
            assert!(a > -PI && a <= PI);
        }
    }
}
