//! # Footstep planning module
//!
//! Footsteps are placed in the ground plane frame as planar poses. A plan
//! starts with the current poses of both feet and then alternates feet,
//! beginning with the plan's start foot.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod plan;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fmt, str::FromStr};

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PlanningError};

pub use params::*;
pub use plan::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A placement in the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanarPose {
    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// Heading about the plane normal.
    ///
    /// Units: radians
    pub theta: f64,
}

/// An ordered sequence of footstep placements.
///
/// Entry `i` belongs to the start foot when `i` is even and to the other foot
/// when `i` is odd. The first two entries are the initial foot poses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootstepPlan {
    placements: Vec<PlanarPose>,
    start_foot: Foot,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foot {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlanarPose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }

    /// Project a 3D pose expressed in the plane frame onto the plane.
    ///
    /// The heading is extracted assuming the rotation is about the plane
    /// normal only.
    pub fn from_isometry(pose: &Isometry3<f64>) -> Self {
        let q = pose.rotation.quaternion();

        Self {
            x: pose.translation.vector[0],
            y: pose.translation.vector[1],
            theta: 2.0 * q.k.atan2(q.w),
        }
    }

    /// Lift the placement into a 3D pose at the given height above the plane.
    pub fn to_isometry(&self, z: f64) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.x, self.y, z),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.theta),
        )
    }

    /// The placement shifted by `dist` along the left normal of its heading.
    pub fn offset_left(&self, dist: f64) -> Self {
        Self {
            x: self.x - dist * self.theta.sin(),
            y: self.y + dist * self.theta.cos(),
            theta: self.theta,
        }
    }
}

impl Foot {
    pub fn other(&self) -> Self {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
        }
    }

    /// Sign of the lateral offset of this foot from the walking line.
    pub fn side_sign(&self) -> f64 {
        match self {
            Foot::Left => 1.0,
            Foot::Right => -1.0,
        }
    }
}

impl FromStr for Foot {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" | "l" => Ok(Foot::Left),
            "right" | "r" => Ok(Foot::Right),
            _ => Err(ConfigError::UnknownFoot(s.into())),
        }
    }
}

impl fmt::Display for Foot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Foot::Left => write!(f, "left"),
            Foot::Right => write!(f, "right"),
        }
    }
}

impl FootstepPlan {
    /// Build a plan from its placements.
    pub fn new(placements: Vec<PlanarPose>, start_foot: Foot) -> Result<Self, PlanningError> {
        if placements.len() < 2 {
            return Err(PlanningError::PathTooShort(placements.len()));
        }

        if let Some(i) = placements.iter().position(|p| !p.is_finite()) {
            return Err(PlanningError::NonFiniteWaypoint(i));
        }

        Ok(Self {
            placements,
            start_foot,
        })
    }

    pub fn placements(&self) -> &[PlanarPose] {
        &self.placements
    }

    pub fn start_foot(&self) -> Foot {
        self.start_foot
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// The foot which entry `index` belongs to.
    pub fn foot_of(&self, index: usize) -> Foot {
        if index % 2 == 0 {
            self.start_foot
        } else {
            self.start_foot.other()
        }
    }

    /// Number of swing phases in the plan.
    pub fn num_swings(&self) -> usize {
        self.placements.len().saturating_sub(2)
    }
}
