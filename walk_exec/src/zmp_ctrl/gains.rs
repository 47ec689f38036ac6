//! Cart-table model and preview gain computation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::{Matrix3, Matrix4, RowVector3, RowVector4, Vector3, Vector4};

use super::{ZmpCtrlError, ZmpCtrlParams, MAX_RICCATI_ITERATIONS, RICCATI_TOLERANCE};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Discrete cart-table model of one horizontal axis.
///
/// The state is `[c, c', c'']` of the CoM, the input is the CoM jerk, and the
/// output is the ZMP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTable {
    pub a: Matrix3<f64>,
    pub b: Vector3<f64>,
    pub c: RowVector3<f64>,

    /// Units: seconds
    pub dt_s: f64,

    /// Height of the CoM above the ground plane.
    ///
    /// Units: meters
    pub com_height_m: f64,
}

/// One gain of the folded preview, applied to the reference `offset` ticks
/// ahead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewBlock {
    pub offset: usize,
    pub gain: f64,
}

/// Gains of the LQ optimal preview controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewGains {
    /// Gain on the integrated ZMP error.
    pub gi: f64,

    /// Gain on the model state.
    pub gx: RowVector3<f64>,

    /// Gain on each future reference sample, the first being one tick ahead.
    pub preview: Vec<f64>,

    /// The preview gains summed over blocks of `stride` samples.
    pub blocks: Vec<PreviewBlock>,

    /// Number of iterations needed to solve the Riccati equation.
    pub riccati_iterations: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CartTable {
    pub fn new(dt_s: f64, com_height_m: f64, gravity_mss: f64) -> Result<Self, ZmpCtrlError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(ZmpCtrlError::InvalidPeriod(dt_s));
        }
        if !(com_height_m.is_finite() && com_height_m > 0.0) {
            return Err(ZmpCtrlError::InvalidComHeight(com_height_m));
        }

        let dt2 = dt_s * dt_s;
        let dt3 = dt2 * dt_s;

        Ok(Self {
            a: Matrix3::new(
                1.0, dt_s, dt2 / 2.0,
                0.0, 1.0, dt_s,
                0.0, 0.0, 1.0,
            ),
            b: Vector3::new(dt3 / 6.0, dt2 / 2.0, dt_s),
            c: RowVector3::new(1.0, 0.0, -com_height_m / gravity_mss),
            dt_s,
            com_height_m,
        })
    }

    /// ZMP of the given state.
    pub fn zmp(&self, x: &Vector3<f64>) -> f64 {
        (self.c * x)[0]
    }

    /// State after applying the jerk `u` for one period.
    pub fn step(&self, x: &Vector3<f64>, u: f64) -> Vector3<f64> {
        self.a * x + self.b * u
    }
}

impl PreviewGains {
    /// Compute the gains for the given model and tuning.
    ///
    /// The gains come from the augmented system whose state is the ZMP error
    /// and the model state increment, with a unit weight on the error and a
    /// weight of `q_on_r` on the jerk increment.
    pub fn compute(model: &CartTable, params: &ZmpCtrlParams) -> Result<Self, ZmpCtrlError> {
        params.validate()?;

        let ca = model.c * model.a;
        let cb = (model.c * model.b)[0];

        let a = &model.a;
        let at = Matrix4::new(
            1.0, ca[0], ca[1], ca[2],
            0.0, a[(0, 0)], a[(0, 1)], a[(0, 2)],
            0.0, a[(1, 0)], a[(1, 1)], a[(1, 2)],
            0.0, a[(2, 0)], a[(2, 1)], a[(2, 2)],
        );
        let bt = Vector4::new(cb, model.b[0], model.b[1], model.b[2]);
        let q = Matrix4::from_diagonal(&Vector4::new(1.0, 0.0, 0.0, 0.0));
        let r = params.q_on_r;

        let (p, riccati_iterations) = solve_dare(&at, &bt, &q, r)?;

        let denom = r + bt.dot(&(p * bt));
        let k: RowVector4<f64> = (bt.transpose() * p * at) / denom;

        let gi = k[0];
        let gx = RowVector3::new(k[1], k[2], k[3]);

        // Preview gains
        let num_preview = util::time::ticks_in(params.horizon_s, model.dt_s);
        let ac = at - bt * k;
        let mut preview = Vec::with_capacity(num_preview);
        if num_preview > 0 {
            preview.push(-gi);
        }
        let mut x = -(ac.transpose() * p * Vector4::new(1.0, 0.0, 0.0, 0.0));
        for _ in 1..num_preview {
            preview.push(bt.dot(&x) / denom);
            x = ac.transpose() * x;
        }

        let blocks = preview
            .chunks(params.stride)
            .enumerate()
            .map(|(i, chunk)| PreviewBlock {
                offset: 1 + i * params.stride,
                gain: chunk.iter().sum(),
            })
            .collect::<Vec<_>>();

        debug!(
            "Preview gains computed in {} Riccati iterations: gi = {:.4e}, gx = [{:.4e}, {:.4e}, {:.4e}], {} preview samples in {} blocks",
            riccati_iterations, gi, gx[0], gx[1], gx[2], preview.len(), blocks.len()
        );

        Ok(Self {
            gi,
            gx,
            preview,
            blocks,
            riccati_iterations,
        })
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the discrete algebraic Riccati equation with a scalar input by
/// iterating the Riccati difference equation from `P = Q`.
fn solve_dare(
    a: &Matrix4<f64>,
    b: &Vector4<f64>,
    q: &Matrix4<f64>,
    r: f64,
) -> Result<(Matrix4<f64>, usize), ZmpCtrlError> {
    let mut p = *q;

    for i in 1..=MAX_RICCATI_ITERATIONS {
        let pa = p * a;
        let btpa = b.transpose() * pa;
        let denom = r + b.dot(&(p * b));

        let next = q + a.transpose() * pa - btpa.transpose() * btpa / denom;
        let next = (next + next.transpose()) * 0.5;

        if !next.iter().all(|v| v.is_finite()) {
            return Err(ZmpCtrlError::RiccatiDiverged(i));
        }

        let change = (next - p).norm();
        p = next;

        if change <= RICCATI_TOLERANCE * p.norm() {
            return Ok((p, i));
        }
    }

    Err(ZmpCtrlError::RiccatiDiverged(MAX_RICCATI_ITERATIONS))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cart_table() {
        let m = CartTable::new(0.01, 0.8, 9.81).unwrap();

        // Constant jerk from rest
        let mut x = Vector3::zeros();
        for _ in 0..100 {
            x = m.step(&x, 1.0);
        }
        assert!((x[0] - 1.0 / 6.0).abs() < 1e-9);
        assert!((x[1] - 0.5).abs() < 1e-9);
        assert!((x[2] - 1.0).abs() < 1e-9);

        // At rest the ZMP is under the CoM
        assert_eq!(m.zmp(&Vector3::new(0.3, 0.0, 0.0)), 0.3);

        assert!(matches!(
            CartTable::new(0.01, 0.0, 9.81),
            Err(ZmpCtrlError::InvalidComHeight(_))
        ));
        assert!(matches!(
            CartTable::new(0.0, 0.8, 9.81),
            Err(ZmpCtrlError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_gains() {
        let m = CartTable::new(0.01, 0.8, 9.81).unwrap();
        let params = ZmpCtrlParams::default();
        let g = PreviewGains::compute(&m, &params).unwrap();

        assert!(g.gi > 0.0);
        assert_eq!(g.preview.len(), 160);
        assert_eq!(g.preview[0], -g.gi);

        // Preview gains fade out over the horizon
        let first = g.preview[1].abs();
        let last = g.preview[159].abs();
        assert!(last < 0.05 * first, "first {} last {}", first, last);

        // Blocks fold the whole preview
        assert_eq!(g.blocks.len(), 54);
        assert_eq!(g.blocks[0].offset, 1);
        assert_eq!(g.blocks[1].offset, 4);
        let folded: f64 = g.blocks.iter().map(|b| b.gain).sum();
        let total: f64 = g.preview.iter().sum();
        assert!((folded - total).abs() < 1e-9 * total.abs().max(1.0));
    }

    #[test]
    fn test_effort_weight_softens() {
        let m = CartTable::new(0.01, 0.8, 9.81).unwrap();
        let stiff = PreviewGains::compute(&m, &ZmpCtrlParams::default()).unwrap();
        let soft = PreviewGains::compute(
            &m,
            &ZmpCtrlParams {
                q_on_r: 1e-4,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(soft.gi < stiff.gi, "soft {} stiff {}", soft.gi, stiff.gi);
    }

    #[test]
    fn test_invalid_tuning() {
        let m = CartTable::new(0.01, 0.8, 9.81).unwrap();
        let params = ZmpCtrlParams {
            stride: 0,
            ..Default::default()
        };
        assert!(matches!(
            PreviewGains::compute(&m, &params),
            Err(ZmpCtrlError::InvalidTuning { name: "stride", .. })
        ));
    }
}
