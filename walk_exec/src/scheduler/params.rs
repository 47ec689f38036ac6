//! Parameters structure for the tick scheduler

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// Period of the tick thread.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// If true the thread sleeps out the rest of each period, otherwise ticks
    /// are run back to back.
    pub realtime: bool,

    /// Number of consecutive overruns after which a fault is raised, 0 to
    /// never raise one.
    pub max_consec_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            period_s: 0.01,
            realtime: true,
            max_consec_overruns: 50,
        }
    }
}
