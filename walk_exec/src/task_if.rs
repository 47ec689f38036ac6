//! # Task-space controller interfaces
//!
//! The walking modules never talk to the whole-body solver directly. Instead
//! they drive task handles created by a `TaskController`, and read the robot
//! state through a `DynamicModel`. Both are implemented outside of this crate
//! (or by the `ideal` stand-in).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fmt, str::FromStr, sync::Arc};

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Spatial velocity (or acceleration) of a frame, angular part first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    /// Angular part.
    ///
    /// Units: radians/second (or radians/second^2)
    pub angular: Vector3<f64>,

    /// Linear part.
    ///
    /// Units: meters/second (or meters/second^2)
    pub linear: Vector3<f64>,
}

/// A desired pose of a frame together with its velocity and acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub pose: Isometry3<f64>,
    pub vel: Twist,
    pub acc: Twist,
}

/// A desired position of a point (e.g. the CoM) with its derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSample {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub acc: Vector3<f64>,
}

/// Handle on a task driven by frame samples (foot, waist and contact tasks).
pub type FrameTaskHandle = Arc<dyn Task<Sample = FrameSample>>;

/// Handle on a task driven by point samples (CoM task).
pub type PointTaskHandle = Arc<dyn Task<Sample = PointSample>>;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Controlled degrees of freedom of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskDofs {
    /// Rotation and translation, "RXYZ"
    Full,

    /// Rotation only, "R"
    Rotation,

    /// Vertical translation only, "Z"
    Altitude,

    /// Horizontal translation only, "XY"
    Horizontal,
}

/// Errors raised by a task controller implementation.
#[derive(Debug, thiserror::Error)]
pub enum TaskIfError {
    #[error("Unknown segment \"{0}\" in the dynamic model")]
    UnknownSegment(String),

    #[error("Unknown degrees of freedom specifier \"{0}\"")]
    UnknownDofs(String),

    #[error("Task \"{name}\" cannot control {dofs} degrees of freedom")]
    DofsNotSupported { name: String, dofs: TaskDofs },

    #[error("A task named \"{0}\" already exists")]
    DuplicateTask(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A task of the whole-body task-space controller.
///
/// All methods take `&self` since tasks are shared between the control
/// thread (weights, gains) and the tick thread (samples, activation).
pub trait Task: Send + Sync {
    type Sample;

    fn name(&self) -> &str;

    fn set_weight(&self, weight: f64);

    fn set_kp_kd(&self, kp: f64, kd: f64);

    /// Set the stiffness, with a critically damped derivative gain.
    fn set_kp(&self, kp: f64) {
        self.set_kp_kd(kp, 2.0 * kp.max(0.0).sqrt());
    }

    fn activate_as_objective(&self);

    fn activate_as_constraint(&self);

    fn deactivate(&self);

    /// Push a new desired sample into the task.
    fn update(&self, sample: &Self::Sample);
}

/// Factory for task handles.
pub trait TaskController: Send + Sync {
    /// Create a task on the frame `h_segment_frame` attached to `segment`.
    fn create_frame_task(
        &self,
        name: &str,
        segment: &str,
        h_segment_frame: &Isometry3<f64>,
        dofs: TaskDofs,
        weight: f64,
    ) -> Result<FrameTaskHandle, TaskIfError>;

    fn create_com_task(
        &self,
        name: &str,
        dofs: TaskDofs,
        weight: f64,
    ) -> Result<PointTaskHandle, TaskIfError>;

    /// Create a frictional point contact on `segment`.
    fn create_contact_task(
        &self,
        name: &str,
        segment: &str,
        h_segment_frame: &Isometry3<f64>,
        mu: f64,
        margin: f64,
        weight: f64,
    ) -> Result<FrameTaskHandle, TaskIfError>;
}

/// Read access to the rigid-body model of the robot.
pub trait DynamicModel: Send + Sync {
    fn segment_index(&self, name: &str) -> Option<usize>;

    /// World pose of the segment.
    fn segment_position(&self, index: usize) -> Isometry3<f64>;

    /// World position of the centre of mass.
    fn com_position(&self) -> Vector3<f64>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Twist {
    pub fn zero() -> Self {
        Self {
            angular: Vector3::zeros(),
            linear: Vector3::zeros(),
        }
    }

    /// Express the twist in a frame rotated by `rot`.
    ///
    /// Both parts are rotated, the twist is taken about the frame origin so
    /// there is no lever arm term.
    pub fn rotated(&self, rot: &UnitQuaternion<f64>) -> Self {
        Self {
            angular: rot * self.angular,
            linear: rot * self.linear,
        }
    }

    pub fn norm(&self) -> f64 {
        (self.angular.norm_squared() + self.linear.norm_squared()).sqrt()
    }
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl FrameSample {
    /// A sample holding the given pose with no motion.
    pub fn at_rest(pose: Isometry3<f64>) -> Self {
        Self {
            pose,
            vel: Twist::zero(),
            acc: Twist::zero(),
        }
    }
}

impl PointSample {
    pub fn at_rest(pos: Vector3<f64>) -> Self {
        Self {
            pos,
            vel: Vector3::zeros(),
            acc: Vector3::zeros(),
        }
    }
}

impl TaskDofs {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDofs::Full => "RXYZ",
            TaskDofs::Rotation => "R",
            TaskDofs::Altitude => "Z",
            TaskDofs::Horizontal => "XY",
        }
    }
}

impl FromStr for TaskDofs {
    type Err = TaskIfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RXYZ" => Ok(TaskDofs::Full),
            "R" => Ok(TaskDofs::Rotation),
            "Z" => Ok(TaskDofs::Altitude),
            "XY" => Ok(TaskDofs::Horizontal),
            _ => Err(TaskIfError::UnknownDofs(s.into())),
        }
    }
}

impl fmt::Display for TaskDofs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
