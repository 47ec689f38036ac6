//! # Swing trajectory module
//!
//! Generates the swing foot trajectory of every single support phase of a
//! footstep plan, and the waist heading trajectory following the feet.
//! Trajectories are sampled at the control period and expressed in the world
//! frame.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod interp;
mod traj;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use interp::*;
pub use traj::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while building an interpolated trajectory.
#[derive(Debug, thiserror::Error)]
pub enum TrajError {
    #[error("Found {knots} knots but {values} knot values")]
    KnotCountMismatch { knots: usize, values: usize },

    #[error("At least 2 knots are needed, found {0}")]
    TooFewKnots(usize),

    #[error("Knot {0} has no value")]
    EmptyKnot(usize),

    #[error("Knot {0} is not finite")]
    NonFiniteKnot(usize),

    #[error("Knot {0} is not strictly after the previous one")]
    NonIncreasingKnots(usize),

    #[error("The interpolation system of interval {0} is singular")]
    Singular(usize),
}
