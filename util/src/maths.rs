//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Bound a pair of angles so that interpolating between them takes the shortest arc.
///
/// Both angles are first reduced into [0, 2pi). The second angle is then shifted by one full turn
/// if, and only if, doing so strictly reduces its distance to the first. The returned pair
/// satisfies `|a1 - a0| <= pi`, and the second angle is unchanged modulo 2pi.
pub fn bounded_angles<T>(a0: T, a1: T) -> (T, T)
where
    T: Float + FloatConst
{
    let tau_t: T = (T::one() + T::one()) * T::PI();

    let a0 = rem_euclid(a0, tau_t);
    let mut a1 = rem_euclid(a1, tau_t);

    let diff = (a1 - a0).abs();
    if (a1 + tau_t - a0).abs() < diff {
        a1 = a1 + tau_t;
    }
    else if (a1 - tau_t - a0).abs() < diff {
        a1 = a1 - tau_t;
    }

    (a0, a1)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// Due to floating point round-off the result can be equal to `rhs.abs()` when `lhs` is a tiny
/// negative number, which is the closest representable value and is accepted here.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const TAU: f64 = std::f64::consts::TAU;
    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_bounded_angles_wraps_short_way() {
        // Going from just below 2pi to just above 0 must not sweep a full turn
        let (a0, a1) = bounded_angles(TAU - 0.1, 0.1);
        assert!((a0 - (TAU - 0.1)).abs() < 1e-12);
        assert!((a1 - (TAU + 0.1)).abs() < 1e-12);

        let (a0, a1) = bounded_angles(0.1, TAU - 0.1);
        assert!((a0 - 0.1).abs() < 1e-12);
        assert!((a1 + 0.1).abs() < 1e-12);

        // Negative inputs are reduced first
        let (a0, a1) = bounded_angles(-PI / 2.0, PI / 2.0);
        assert!((a0 - 1.5 * PI).abs() < 1e-12);
        assert!((a1 - 2.5 * PI).abs() < 1e-12 || (a1 - 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_bounded_angles_properties() {
        let n = 73;
        for i in 0..n {
            for j in 0..n {
                let a0 = TAU * i as f64 / n as f64;
                let a1 = TAU * j as f64 / n as f64;

                let (b0, b1) = bounded_angles(a0, a1);

                assert!((b1 - b0).abs() <= PI + 1e-12, "{} {} -> {} {}", a0, a1, b0, b1);

                // Same angle modulo a full turn
                let turns = (b1 - a1) / TAU;
                assert!((turns - turns.round()).abs() < 1e-9);
            }
        }
    }
}
