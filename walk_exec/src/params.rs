//! Parameters of the walking executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use walk_lib::{footstep::{Foot, StepParams}, ideal::IdealBipedParams, zmp_ctrl::ZmpCtrlParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalkExecParams {
    /// The biped the commands are run on.
    pub biped: IdealBipedParams,

    /// Archive a record of the CoM and ZMP on every tick.
    pub archive_records: bool,

    /// Commands run in sequence.
    pub commands: Vec<WalkCommand>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command of the executable's sequence.
///
/// Positions and angles are expressed in the ground plane frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalkCommand {
    StayIdle {
        #[serde(default)]
        pos_m: Option<[f64; 2]>,
    },

    GoTo {
        target_m: [f64; 2],

        #[serde(default)]
        angle_rad: Option<f64>,

        #[serde(default = "default_tolerance")]
        tolerance_m: f64,

        /// The target is relative to the centre of the feet.
        #[serde(default)]
        relative: bool,
    },

    MoveOneFoot {
        foot: Foot,
        length_m: f64,
        side_length_m: f64,

        #[serde(default)]
        angle_rad: Option<f64>,
    },

    FollowTrajectory {
        /// `[x, y, theta]` waypoints of the centre of the feet
        path: Vec<[f64; 3]>,
    },

    SetStepParameters {
        params: StepParams,
    },

    SetZmpControlParameters {
        params: ZmpCtrlParams,
    },

    SetWaistAltitude {
        altitude_m: f64,
    },

    SetWaistHeading {
        heading_rad: f64,
    },

    WaitForEndOfWalking {
        #[serde(default)]
        timeout_s: Option<f64>,
    },

    WaitForDoubleSupport {
        #[serde(default)]
        timeout_s: Option<f64>,
    },

    Sleep {
        duration_s: f64,
    },
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_tolerance() -> f64 {
    0.01
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_commands() {
        let p: WalkExecParams = util::params::from_str(
            r#"
            archive_records = true

            [[commands]]
            type = "stay_idle"

            [[commands]]
            type = "go_to"
            target_m = [1.0, 0.0]

            [[commands]]
            type = "move_one_foot"
            foot = "right"
            length_m = 0.1
            side_length_m = 0.05

            [[commands]]
            type = "set_step_parameters"
            params = { length_m = 0.2 }

            [[commands]]
            type = "wait_for_end_of_walking"
            timeout_s = 30.0
            "#,
        )
        .unwrap();

        assert!(p.archive_records);
        assert_eq!(p.commands.len(), 5);
        assert!(matches!(p.commands[0], WalkCommand::StayIdle { pos_m: None }));
        assert!(matches!(
            p.commands[1],
            WalkCommand::GoTo {
                angle_rad: None,
                relative: false,
                ..
            }
        ));
        match &p.commands[1] {
            WalkCommand::GoTo { tolerance_m, .. } => assert_eq!(*tolerance_m, 0.01),
            c => panic!("Unexpected command {:?}", c),
        }
        assert!(matches!(
            p.commands[2],
            WalkCommand::MoveOneFoot {
                foot: Foot::Right,
                ..
            }
        ));
        match &p.commands[3] {
            WalkCommand::SetStepParameters { params } => {
                assert_eq!(params.length_m, 0.2);
                assert_eq!(params.ratio, 0.9);
            }
            c => panic!("Unexpected command {:?}", c),
        }
    }
}
