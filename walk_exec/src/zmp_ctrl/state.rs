//! ZMP preview controller state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;

use log::trace;
use nalgebra::{Isometry3, Point3, Vector2, Vector3};

use super::{CartTable, PreviewGains, ZmpCtrlError, ZmpCtrlParams};
use crate::task_if::{PointSample, PointTaskHandle};
use crate::zmp_ref::ZmpReference;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drives the CoM task so that the model ZMP follows a reference.
pub struct ZmpPreviewController {
    task: PointTaskHandle,
    model: CartTable,
    gains: PreviewGains,
    reference: ZmpReference,

    /// Ground plane frame in the world frame.
    plane: Isometry3<f64>,

    /// Model state of the X and Y axes, in the plane frame.
    state: [Vector3<f64>; 2],

    /// Integrated ZMP error.
    error_sum: Vector2<f64>,

    /// Index of the next reference sample.
    index: usize,

    /// Model ZMP after the latest update.
    zmp: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ZmpPreviewController {
    /// Create a new controller starting at rest at `com_world`.
    ///
    /// The height of the CoM above the plane sets the cart-table height, and
    /// must be positive.
    pub fn new(
        task: PointTaskHandle,
        com_world: Vector3<f64>,
        reference: ZmpReference,
        params: &ZmpCtrlParams,
        dt_s: f64,
        plane: Isometry3<f64>,
    ) -> Result<Self, ZmpCtrlError> {
        params.validate()?;

        let com = plane.inverse_transform_point(&Point3::from(com_world)).coords;
        let model = CartTable::new(dt_s, com[2], params.gravity_mss)?;
        let gains = PreviewGains::compute(&model, params)?;

        Ok(Self {
            task,
            model,
            gains,
            reference,
            plane,
            state: [
                Vector3::new(com[0], 0.0, 0.0),
                Vector3::new(com[1], 0.0, 0.0),
            ],
            error_sum: Vector2::zeros(),
            index: 0,
            zmp: Vector2::new(com[0], com[1]),
        })
    }

    /// Advance the model by one tick and send the new CoM sample to the task.
    ///
    /// Once the reference is exhausted its final sample is held, so the CoM
    /// settles over it.
    pub fn update(&mut self, tick: u64) {
        if !self.reference.is_empty() {
            let r = self.reference_at(self.index);

            // Preview term, each block applied to its first sample
            let mut preview = Vector2::zeros();
            for block in self.gains.blocks.iter() {
                preview += self.reference_at(self.index + block.offset) * block.gain;
            }

            for axis in 0..2 {
                let x = self.state[axis];

                self.error_sum[axis] += self.model.zmp(&x) - r[axis];

                let u = -self.gains.gi * self.error_sum[axis]
                    - (self.gains.gx * x)[0]
                    - preview[axis];

                self.state[axis] = self.model.step(&x, u);
                self.zmp[axis] = self.model.zmp(&self.state[axis]);
            }

            self.index += 1;
        }

        trace!(
            "ZMP control tick {}: CoM [{:.4}, {:.4}], ZMP [{:.4}, {:.4}]",
            tick, self.state[0][0], self.state[1][0], self.zmp[0], self.zmp[1]
        );

        self.task.update(&self.output());
    }

    /// True once every reference sample has been tracked.
    pub fn is_finished(&self) -> bool {
        self.index >= self.reference.len()
    }

    /// The CoM sample in the world frame.
    pub fn output(&self) -> PointSample {
        let (pos, vel, acc) = self.com_state();

        PointSample {
            pos: self.plane.transform_point(&Point3::from(pos)).coords,
            vel: self.plane.rotation * vel,
            acc: self.plane.rotation * acc,
        }
    }

    /// CoM position, velocity and acceleration in the plane frame.
    pub fn com_state(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let [x, y] = &self.state;
        (
            Vector3::new(x[0], y[0], self.model.com_height_m),
            Vector3::new(x[1], y[1], 0.0),
            Vector3::new(x[2], y[2], 0.0),
        )
    }

    /// Model ZMP after the latest update, in the plane frame.
    pub fn zmp(&self) -> Vector2<f64> {
        self.zmp
    }

    /// Reference sample at tick `index`, holding the final sample past the
    /// end. Zero for an empty reference.
    pub fn reference_at(&self, index: usize) -> Vector2<f64> {
        match self.reference.len().checked_sub(1) {
            Some(last) => self.reference[index.min(last)],
            None => Vector2::zeros(),
        }
    }

    /// Index of the reference sample tracked by the next update.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reference(&self) -> &ZmpReference {
        &self.reference
    }
}

impl fmt::Debug for ZmpPreviewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZmpPreviewController")
            .field("task", &self.task.name())
            .field("reference_len", &self.reference.len())
            .field("index", &self.index)
            .field("state", &self.state)
            .finish()
    }
}
