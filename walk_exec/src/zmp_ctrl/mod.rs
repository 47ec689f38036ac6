//! # ZMP preview control module
//!
//! Computes the centre of mass trajectory which makes the Zero Moment Point
//! follow a reference, using the cart-table model and an LQ optimal preview
//! controller over the upcoming reference samples. Each horizontal axis is
//! controlled independently with the same gains.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod gains;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use gains::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of Riccati iterations before giving up.
pub const MAX_RICCATI_ITERATIONS: usize = 100_000;

/// Relative change of the Riccati solution below which it has converged.
pub const RICCATI_TOLERANCE: f64 = 1e-10;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur building a preview controller.
#[derive(Debug, thiserror::Error)]
pub enum ZmpCtrlError {
    #[error("The Riccati equation did not converge in {0} iterations")]
    RiccatiDiverged(usize),

    #[error("The CoM must be above the ground plane, found a height of {0} m")]
    InvalidComHeight(f64),

    #[error("Invalid preview controller tuning, {name} = {value}")]
    InvalidTuning { name: &'static str, value: f64 },

    #[error("The control period must be positive and finite, found {0} s")]
    InvalidPeriod(f64),
}
