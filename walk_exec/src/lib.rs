//! # Walking library.
//!
//! Footstep planning, ZMP preview control and gait sequencing for a biped
//! driven by a whole-body task-space controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Errors shared by the planning modules
pub mod error;

/// Footstep planner - places the feet along a path of the centre of the feet
pub mod footstep;

/// Gait state machine - sequences the support phases and the foot contacts
pub mod gait;

/// Perfect-tracking task controller and dynamic model, for running without a whole-body solver
pub mod ideal;

/// Tick scheduler - runs the controllers at a fixed period on a dedicated thread
pub mod scheduler;

/// Swing trajectories - foot and waist trajectories of a footstep plan
pub mod swing;

/// Interfaces of the whole-body controller's tasks and dynamic model
pub mod task_if;

/// Trajectory tracking - feeds a trajectory to a task one sample per tick
pub mod traj_track;

/// Walking task - the facade of the walking modules
pub mod walk_task;

/// ZMP preview controller - computes the CoM trajectory from the ZMP reference
pub mod zmp_ctrl;

/// ZMP reference builder - turns a footstep plan into a ZMP reference
pub mod zmp_ref;
