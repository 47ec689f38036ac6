//! Parameters structure for the ZMP preview controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ZmpCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tuning of the preview controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZmpCtrlParams {
    /// Weight of the CoM jerk increment, against a unit weight on the ZMP
    /// error. Larger values penalise effort and soften the controller.
    pub q_on_r: f64,

    /// Length of the reference preview.
    ///
    /// Units: seconds
    pub horizon_s: f64,

    /// Number of consecutive preview samples folded into one gain.
    pub stride: usize,

    /// Units: meters/second^2
    pub gravity_mss: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ZmpCtrlParams {
    fn default() -> Self {
        Self {
            q_on_r: 1e-6,
            horizon_s: 1.6,
            stride: 3,
            gravity_mss: 9.81,
        }
    }
}

impl ZmpCtrlParams {
    pub fn validate(&self) -> Result<(), ZmpCtrlError> {
        let invalid = |name, value| Err(ZmpCtrlError::InvalidTuning { name, value });

        if !(self.q_on_r.is_finite() && self.q_on_r > 0.0) {
            return invalid("q_on_r", self.q_on_r);
        }
        if !(self.horizon_s.is_finite() && self.horizon_s >= 0.0) {
            return invalid("horizon_s", self.horizon_s);
        }
        if self.stride == 0 {
            return invalid("stride", 0.0);
        }
        if !(self.gravity_mss.is_finite() && self.gravity_mss > 0.0) {
            return invalid("gravity_mss", self.gravity_mss);
        }

        Ok(())
    }
}
