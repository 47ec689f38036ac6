//! Errors shared by the planning modules

use crate::footstep::Foot;

/// A walking request which cannot be turned into a footstep plan.
///
/// These are rejected before anything is handed to the tick thread, so the
/// plan currently being executed is not affected.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("The path must contain at least 2 waypoints, found {0}")]
    PathTooShort(usize),

    #[error("Waypoint {0} is not finite")]
    NonFiniteWaypoint(usize),

    #[error("The step length must be positive and finite, found {0}")]
    InvalidStepLength(f64),

    #[error("The path search tolerance must be positive and finite, found {0}")]
    InvalidTolerance(f64),

    #[error("A straight path of {0} waypoints exceeds the limit of {1}")]
    PathTooLong(f64, usize),

    #[error("The requested step does not move the foot")]
    ZeroLengthStep,
}

/// Invalid configuration of the walking modules.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown foot \"{0}\", expected one of left, l, right or r")]
    UnknownFoot(String),

    #[error("Segment \"{0}\" is not in the dynamic model")]
    UnknownSegment(String),

    #[error("No contact tasks were given for the {0} foot")]
    NoContacts(Foot),

    #[error("A plan of {plan_len} footsteps needs {expected} swing segments, found {segments}")]
    PlanLengthMismatch {
        plan_len: usize,
        expected: usize,
        segments: usize,
    },

    #[error("The step time must be positive and finite, found {0} s")]
    InvalidStepTime(f64),

    #[error("The single support ratio must be in (0, 1], found {0}")]
    InvalidRatio(f64),

    #[error("The control period must be positive and finite, found {0} s")]
    InvalidPeriod(f64),

    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}
