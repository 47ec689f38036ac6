//! Step parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Foot;
use crate::error::{ConfigError, PlanningError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry and timing of the steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepParams {
    /// Distance travelled along the path by one step.
    ///
    /// Units: meters
    pub length_m: f64,

    /// Lateral distance between each foot and the walking line.
    ///
    /// Units: meters
    pub side_m: f64,

    /// Apex height of the swing foot.
    ///
    /// Units: meters
    pub height_m: f64,

    /// Duration of one step (one double plus one single support phase).
    ///
    /// Units: seconds
    pub step_time_s: f64,

    /// Fraction of the step time spent in single support.
    pub ratio: f64,

    /// Foot which moves first.
    pub start_foot: Foot,
}

/// Validated step timing at a given control period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitTiming {
    step_time_s: f64,
    ratio: f64,
    dt_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StepParams {
    fn default() -> Self {
        Self {
            length_m: 0.1,
            side_m: 0.05,
            height_m: 0.01,
            step_time_s: 1.0,
            ratio: 0.9,
            start_foot: Foot::Left,
        }
    }
}

impl StepParams {
    /// Check the step geometry.
    pub fn check_geometry(&self) -> Result<(), PlanningError> {
        if !(self.length_m.is_finite() && self.length_m > 0.0) {
            return Err(PlanningError::InvalidStepLength(self.length_m));
        }

        Ok(())
    }

    /// Get the validated timing of these steps at the control period `dt_s`.
    pub fn timing(&self, dt_s: f64) -> Result<GaitTiming, ConfigError> {
        if !self.side_m.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "side_m",
                value: self.side_m,
            });
        }
        if !(self.height_m.is_finite() && self.height_m >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "height_m",
                value: self.height_m,
            });
        }

        GaitTiming::new(self.step_time_s, self.ratio, dt_s)
    }
}

impl GaitTiming {
    pub fn new(step_time_s: f64, ratio: f64, dt_s: f64) -> Result<Self, ConfigError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(ConfigError::InvalidPeriod(dt_s));
        }
        // A step must last at least one tick
        if !(step_time_s.is_finite() && step_time_s >= dt_s) {
            return Err(ConfigError::InvalidStepTime(step_time_s));
        }
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InvalidRatio(ratio));
        }

        Ok(Self {
            step_time_s,
            ratio,
            dt_s,
        })
    }

    pub fn step_time_s(&self) -> f64 {
        self.step_time_s
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// Duration of a single support phase.
    pub fn single_support_s(&self) -> f64 {
        self.step_time_s * self.ratio
    }

    /// Half the duration of a double support phase.
    pub fn half_double_support_s(&self) -> f64 {
        self.step_time_s * (1.0 - self.ratio) / 2.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_step_params_toml() {
        let p: StepParams = util::params::from_str(
            "length_m = 0.2\nstart_foot = \"right\"",
        )
        .unwrap();

        assert_eq!(p.length_m, 0.2);
        assert_eq!(p.start_foot, Foot::Right);
        assert_eq!(p.ratio, StepParams::default().ratio);
    }

    #[test]
    fn test_timing_validation() {
        let p = StepParams::default();
        let t = p.timing(0.01).unwrap();
        assert!((t.single_support_s() - 0.9).abs() < 1e-12);
        assert!((t.half_double_support_s() - 0.05).abs() < 1e-12);

        assert!(matches!(p.timing(0.0), Err(ConfigError::InvalidPeriod(_))));
        assert!(matches!(
            GaitTiming::new(1.0, 0.0, 0.01),
            Err(ConfigError::InvalidRatio(_))
        ));
        assert!(matches!(
            GaitTiming::new(1.0, 1.2, 0.01),
            Err(ConfigError::InvalidRatio(_))
        ));
        assert!(matches!(
            GaitTiming::new(-1.0, 0.9, 0.01),
            Err(ConfigError::InvalidStepTime(_))
        ));
        assert!(GaitTiming::new(1.0, 1.0, 0.01).is_ok());

        let bad = StepParams {
            length_m: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad.check_geometry(),
            Err(PlanningError::InvalidStepLength(_))
        ));
    }
}
