//! Piecewise polynomial interpolation with derivative constraints

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

use super::TrajError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A piecewise polynomial matching given derivatives at its knots.
///
/// Each knot `x_i` carries `[y, y', y'', ...]`. On the interval
/// `[x_i, x_{i+1}]` the polynomial has degree `len(y_i) + len(y_{i+1}) - 1`
/// and matches every given derivative at both ends.
#[derive(Debug, Clone)]
pub struct PiecewisePolynomial {
    knots: Vec<f64>,

    /// Coefficients of each interval in ascending powers of `x - x_i`.
    coeffs: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PiecewisePolynomial {
    pub fn new(knots: &[f64], values: &[Vec<f64>]) -> Result<Self, TrajError> {
        if knots.len() != values.len() {
            return Err(TrajError::KnotCountMismatch {
                knots: knots.len(),
                values: values.len(),
            });
        }
        if knots.len() < 2 {
            return Err(TrajError::TooFewKnots(knots.len()));
        }
        for (i, (x, y)) in knots.iter().zip(values.iter()).enumerate() {
            if y.is_empty() {
                return Err(TrajError::EmptyKnot(i));
            }
            if !x.is_finite() || y.iter().any(|v| !v.is_finite()) {
                return Err(TrajError::NonFiniteKnot(i));
            }
        }
        if let Some(i) = knots.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TrajError::NonIncreasingKnots(i + 1));
        }

        let coeffs = (0..knots.len() - 1)
            .map(|i| solve_interval(knots[i + 1] - knots[i], &values[i], &values[i + 1], i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            knots: knots.to_vec(),
            coeffs,
        })
    }

    /// Evaluate the `order`-th derivative at `x`.
    ///
    /// Outside of the knot range the first or last polynomial is extended.
    pub fn derivative(&self, x: f64, order: usize) -> f64 {
        let i = self.interval(x);
        let s = x - self.knots[i];

        // Horner's scheme on the differentiated coefficients
        self.coeffs[i]
            .iter()
            .enumerate()
            .skip(order)
            .rev()
            .fold(0.0, |acc, (k, c)| acc * s + c * falling_factorial(k, order))
    }

    pub fn value(&self, x: f64) -> f64 {
        self.derivative(x, 0)
    }

    /// Value, first and second derivatives at `x`.
    pub fn eval2(&self, x: f64) -> (f64, f64, f64) {
        (
            self.derivative(x, 0),
            self.derivative(x, 1),
            self.derivative(x, 2),
        )
    }

    fn interval(&self, x: f64) -> usize {
        let last = self.knots.len() - 2;
        match self.knots[1..=last].iter().position(|k| x < *k) {
            Some(i) => i,
            None => last,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// `k! / (k - d)!`
fn falling_factorial(k: usize, d: usize) -> f64 {
    ((k - d + 1)..=k).fold(1.0, |acc, v| acc * v as f64)
}

/// Solve for the coefficients of one interval of width `h`.
fn solve_interval(h: f64, y0: &[f64], y1: &[f64], index: usize) -> Result<Vec<f64>, TrajError> {
    let m = y0.len() + y1.len();
    let mut a = DMatrix::<f64>::zeros(m, m);
    let mut b = DVector::<f64>::zeros(m);

    // Derivatives at the start of the interval
    for (d, y) in y0.iter().enumerate() {
        a[(d, d)] = falling_factorial(d, d);
        b[d] = *y;
    }

    // Derivatives at the end of the interval
    for (d, y) in y1.iter().enumerate() {
        let row = y0.len() + d;
        for k in d..m {
            a[(row, k)] = falling_factorial(k, d) * h.powi((k - d) as i32);
        }
        b[row] = *y;
    }

    a.lu()
        .solve(&b)
        .map(|c| c.iter().cloned().collect())
        .ok_or(TrajError::Singular(index))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quintic_rest_to_rest() {
        let p = PiecewisePolynomial::new(&[0.0, 1.0], &[vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]])
            .unwrap();

        // Minimum jerk profile 10s^3 - 15s^4 + 6s^5
        for i in 0..=10 {
            let s = i as f64 / 10.0;
            let expected = 10.0 * s.powi(3) - 15.0 * s.powi(4) + 6.0 * s.powi(5);
            assert!((p.value(s) - expected).abs() < 1e-12);
        }

        for x in [0.0, 1.0].iter() {
            assert!(p.derivative(*x, 1).abs() < 1e-12);
            assert!(p.derivative(*x, 2).abs() < 1e-12);
        }
        assert!((p.value(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_apex_knots() {
        let h = 0.02;
        let p = PiecewisePolynomial::new(
            &[0.0, 0.45, 0.9],
            &[vec![0.0, 0.0, 0.0], vec![h, 0.0], vec![0.0, 0.0, 0.0]],
        )
        .unwrap();

        assert!((p.value(0.45) - h).abs() < 1e-12);
        assert!(p.derivative(0.45, 1).abs() < 1e-12);
        assert!(p.value(0.9).abs() < 1e-12);
        assert!(p.derivative(0.9, 1).abs() < 1e-9);
        assert!(p.derivative(0.9, 2).abs() < 1e-9);

        // Single apex, continuous across the middle knot
        assert!((p.value(0.45 - 1e-9) - p.value(0.45 + 1e-9)).abs() < 1e-9);
        for i in 1..90 {
            let x = i as f64 * 0.01;
            assert!(p.value(x) <= h + 1e-12);
            assert!(p.value(x) >= 0.0);
        }
    }

    #[test]
    fn test_linear() {
        let p = PiecewisePolynomial::new(&[1.0, 3.0], &[vec![2.0], vec![6.0]]).unwrap();
        assert!((p.value(2.0) - 4.0).abs() < 1e-12);
        assert!((p.derivative(2.5, 1) - 2.0).abs() < 1e-12);
        assert_eq!(p.derivative(2.5, 2), 0.0);
    }

    #[test]
    fn test_invalid_knots() {
        assert!(matches!(
            PiecewisePolynomial::new(&[0.0], &[vec![0.0]]),
            Err(TrajError::TooFewKnots(1))
        ));
        assert!(matches!(
            PiecewisePolynomial::new(&[0.0, 1.0], &[vec![0.0]]),
            Err(TrajError::KnotCountMismatch { .. })
        ));
        assert!(matches!(
            PiecewisePolynomial::new(&[0.0, 0.0], &[vec![0.0], vec![1.0]]),
            Err(TrajError::NonIncreasingKnots(1))
        ));
        assert!(matches!(
            PiecewisePolynomial::new(&[0.0, 1.0], &[vec![], vec![1.0]]),
            Err(TrajError::EmptyKnot(0))
        ));
    }
}
