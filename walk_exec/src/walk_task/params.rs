//! Parameters structures for the walking task

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;

use crate::{error::ConfigError, footstep::StepParams, zmp_ctrl::ZmpCtrlParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All parameters of the walking task, as found in `walk.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalkParams {
    pub task: WalkTaskParams,
    pub step: StepParams,
    pub zmp_ctrl: ZmpCtrlParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkTaskParams {
    /// Period of the tick thread the task is run by.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Prefix of the names of the created tasks.
    pub prefix: String,

    pub lfoot_segment: String,
    pub rfoot_segment: String,
    pub waist_segment: String,

    /// Position of the left sole in the left foot segment frame.
    ///
    /// Units: meters
    pub lfoot_sole_offset_m: [f64; 3],

    /// Units: meters
    pub rfoot_sole_offset_m: [f64; 3],

    /// Position of the waist control frame in the waist segment frame.
    ///
    /// Units: meters
    pub waist_front_offset_m: [f64; 3],

    /// Origin of the ground plane in the world frame.
    ///
    /// Units: meters
    pub plane_origin_m: [f64; 3],

    /// Roll, pitch and yaw of the ground plane in the world frame.
    ///
    /// Units: radians
    pub plane_rpy_rad: [f64; 3],

    /// Weight of all created tasks.
    pub weight: f64,

    pub foot_kp: f64,
    pub waist_kp: f64,
    pub com_kp: f64,

    /// Reactivate the contacts as objectives rather than constraints on
    /// touch-down.
    pub contact_as_objective: bool,

    /// Period at which waiting callers check the walking status.
    ///
    /// Units: seconds
    pub wait_period_s: f64,

    /// Send a record of the CoM and ZMP on every tick.
    pub record_ticks: bool,

    pub contacts: ContactParams,
}

/// Contact points of the feet soles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContactParams {
    /// Contact points in the left foot segment frame.
    ///
    /// Units: meters
    pub lfoot_points_m: Vec<[f64; 3]>,

    /// Units: meters
    pub rfoot_points_m: Vec<[f64; 3]>,

    /// Friction coefficient.
    pub mu: f64,

    /// Units: meters
    pub margin_m: f64,

    pub weight: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WalkTaskParams {
    fn default() -> Self {
        Self {
            dt_s: 0.01,
            prefix: "walking.".into(),
            lfoot_segment: "l_foot".into(),
            rfoot_segment: "r_foot".into(),
            waist_segment: "waist".into(),
            lfoot_sole_offset_m: [0.0; 3],
            rfoot_sole_offset_m: [0.0; 3],
            waist_front_offset_m: [0.0; 3],
            plane_origin_m: [0.0; 3],
            plane_rpy_rad: [0.0; 3],
            weight: 1.0,
            foot_kp: 150.0,
            waist_kp: 9.0,
            com_kp: 0.0,
            contact_as_objective: false,
            wait_period_s: 0.001,
            record_ticks: false,
            contacts: ContactParams::default(),
        }
    }
}

impl Default for ContactParams {
    fn default() -> Self {
        let corners = |y: f64| {
            vec![
                [0.1, y + 0.03, 0.0],
                [0.1, y - 0.03, 0.0],
                [-0.05, y + 0.03, 0.0],
                [-0.05, y - 0.03, 0.0],
            ]
        };

        Self {
            lfoot_points_m: corners(0.0),
            rfoot_points_m: corners(0.0),
            mu: 1.5,
            margin_m: 0.0,
            weight: 1.0,
        }
    }
}

impl WalkTaskParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidParameter { name, value })
            }
        };

        if !(self.dt_s.is_finite() && self.dt_s > 0.0) {
            return Err(ConfigError::InvalidPeriod(self.dt_s));
        }
        positive("wait_period_s", self.wait_period_s)?;
        positive("weight", self.weight)?;

        for &(name, kp) in [
            ("foot_kp", self.foot_kp),
            ("waist_kp", self.waist_kp),
            ("com_kp", self.com_kp),
        ]
        .iter()
        {
            if !(kp.is_finite() && kp >= 0.0) {
                return Err(ConfigError::InvalidParameter { name, value: kp });
            }
        }

        Ok(())
    }

    /// The ground plane frame in the world frame.
    pub fn plane(&self) -> Isometry3<f64> {
        let [x, y, z] = self.plane_origin_m;
        let [r, p, yaw] = self.plane_rpy_rad;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(r, p, yaw),
        )
    }

    pub fn h_lfoot_sole(&self) -> Isometry3<f64> {
        offset(self.lfoot_sole_offset_m)
    }

    pub fn h_rfoot_sole(&self) -> Isometry3<f64> {
        offset(self.rfoot_sole_offset_m)
    }

    pub fn h_waist_front(&self) -> Isometry3<f64> {
        offset(self.waist_front_offset_m)
    }

    /// Full name of a task created by the walking task.
    pub fn task_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn offset(pos: [f64; 3]) -> Isometry3<f64> {
    Isometry3::from_parts(Vector3::from(pos).into(), UnitQuaternion::identity())
}
