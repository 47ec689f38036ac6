//! Walking executable entry point.
//!
//! # Architecture
//!
//! Runs a sequence of walking commands on a biped driven by the
//! perfect-tracking task controller:
//!
//!     - Initialise the session, logging and parameters
//!     - Create the biped, the tick scheduler and the walking task
//!     - Run each command of `walk_exec.toml`, or of the file given as the only
//!       argument, archiving the CoM and ZMP records of the ticks
//!     - Stop the scheduler and save the tick statistics

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use nalgebra::Vector2;
use std::{env, sync::Arc, thread, time::Duration};

// Internal
use params::{WalkCommand, WalkExecParams};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    logger::{logger_init, LevelFilter},
    session::Session,
};
use walk_lib::{
    footstep::PlanarPose,
    ideal::{IdealController, IdealModel},
    scheduler::{SchedulerParams, TickScheduler},
    walk_task::{create_foot_contacts, TickRecord, WalkError, WalkParams, WalkingTask},
    zmp_ref::ZmpReference,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Archive of the tick records of the run.
struct RecordArchive {
    archiver: Archiver,
    pending: Vec<TickRecord>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RecordArchive {
    fn new(session: &Session) -> Result<Self, ArchiveError> {
        Ok(Self {
            archiver: Archiver::from_path(session, "walk_records.csv")?,
            pending: Vec::new(),
        })
    }
}

impl Archived for RecordArchive {
    fn write(&mut self) -> Result<(), ArchiveError> {
        for record in self.pending.drain(..) {
            self.archiver.serialise(record)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("walk_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, keeping the per tick logs quiet
    logger_init(LevelFilter::Debug, LevelFilter::Info, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Biped Walking Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    let start_time = Utc::now();

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let exec_params: WalkExecParams = match args.len() {
        1 => util::params::load("walk_exec.toml"),
        2 => {
            info!("Loading commands from \"{}\"", &args[1]);
            util::params::load_from_path(&args[1])
        }
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    }
    .wrap_err("Could not load the executable parameters")?;

    let walk_params: WalkParams =
        util::params::load("walk.toml").wrap_err("Could not load the walking parameters")?;
    let sched_params: SchedulerParams =
        util::params::load("scheduler.toml").wrap_err("Could not load the scheduler parameters")?;

    if (walk_params.task.dt_s - sched_params.period_s).abs() > 1e-9 {
        return Err(eyre!(
            "The walking period ({} s) differs from the tick period ({} s)",
            walk_params.task.dt_s,
            sched_params.period_s
        ));
    }

    info!(
        "Parameters loaded, {} commands to run",
        exec_params.commands.len()
    );

    // ---- INITIALISE MODULES ----

    let model = Arc::new(IdealModel::biped(&exec_params.biped));
    let ctrl = IdealController::new(model.clone());

    let scheduler =
        TickScheduler::new(sched_params).wrap_err("Failed to create the tick scheduler")?;

    let contacts = create_foot_contacts(&ctrl, &walk_params.task)
        .wrap_err("Failed to create the contact tasks")?;

    let mut walk = WalkingTask::new(&ctrl, model, &scheduler.handle(), contacts, walk_params)
        .wrap_err("Failed to create the walking task")?;

    let mut archive = if exec_params.archive_records {
        Some(RecordArchive::new(&session).wrap_err("Failed to create the record archive")?)
    } else {
        None
    };

    scheduler.start().wrap_err("Failed to start the tick scheduler")?;

    info!("Initialisation complete\n");

    // ---- COMMANDS ----

    for (i, command) in exec_params.commands.into_iter().enumerate() {
        info!("Command {}: {:?}", i, command);

        match run_command(&mut walk, command) {
            Ok(Some(reference)) => session.save(format!("zmp_ref_{:03}.json", i), reference),
            Ok(None) => (),
            Err(e) => warn!("Command {} failed: {}", i, e),
        }

        for fault in scheduler.faults() {
            warn!("Tick scheduler fault: {:?}", fault);
        }

        if let Some(ref mut archive) = archive {
            archive.pending.extend(walk.drain_records());
            if let Err(e) = archive.write() {
                warn!("Could not archive the tick records: {}", e);
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("Final status: {:?}", walk.status());
    info!(
        "Final feet: left {:?}, right {:?}",
        walk.lfoot_pose_in_plane(),
        walk.rfoot_pose_in_plane()
    );

    drop(walk);
    scheduler.stop();

    let stats = scheduler.stats();
    info!(
        "{} ticks, mean {:.06} s, max {:.06} s, {} overruns",
        stats.num_ticks, stats.mean_duration_s, stats.max_duration_s, stats.num_overruns
    );
    match serde_json::to_string(&stats) {
        Ok(s) => debug!("Tick statistics: {}", s),
        Err(e) => warn!("Could not serialise the tick statistics: {}", e),
    }
    session.save("tick_stats.json", stats);

    info!(
        "End of execution after {:.02} s",
        util::time::duration_to_seconds(Utc::now() - start_time).unwrap_or(std::f64::NAN)
    );

    session.exit();

    Ok(())
}

/// Run one command, returning the ZMP reference of walking requests.
fn run_command(
    walk: &mut WalkingTask,
    command: WalkCommand,
) -> Result<Option<ZmpReference>, WalkError> {
    let timeout = |t: Option<f64>| t.map(|s| Duration::from_secs_f64(s.max(0.0)));

    match command {
        WalkCommand::StayIdle { pos_m } => walk
            .stay_idle(pos_m.map(|p| Vector2::new(p[0], p[1])))
            .map(Some),
        WalkCommand::GoTo {
            target_m,
            angle_rad,
            tolerance_m,
            relative,
        } => {
            let target = Vector2::new(target_m[0], target_m[1]);
            if relative {
                walk.go_to_relative(target, angle_rad, tolerance_m).map(Some)
            } else {
                walk.go_to(target, angle_rad, tolerance_m).map(Some)
            }
        }
        WalkCommand::MoveOneFoot {
            foot,
            length_m,
            side_length_m,
            angle_rad,
        } => walk
            .move_one_foot(foot, length_m, side_length_m, angle_rad)
            .map(Some),
        WalkCommand::FollowTrajectory { path } => {
            let path = path
                .iter()
                .map(|p| PlanarPose::new(p[0], p[1], p[2]))
                .collect::<Vec<_>>();
            walk.follow_trajectory(&path).map(Some)
        }
        WalkCommand::SetStepParameters { params } => walk.set_step_parameters(params).map(|_| None),
        WalkCommand::SetZmpControlParameters { params } => {
            walk.set_zmp_control_parameters(params).map(|_| None)
        }
        WalkCommand::SetWaistAltitude { altitude_m } => {
            walk.hold_waist_altitude(altitude_m);
            Ok(None)
        }
        WalkCommand::SetWaistHeading { heading_rad } => {
            walk.hold_waist_heading(heading_rad);
            Ok(None)
        }
        WalkCommand::WaitForEndOfWalking { timeout_s } => {
            match timeout(timeout_s) {
                Some(t) => {
                    if !walk.wait_for_end_of_walking_timeout(t)? {
                        warn!("Walk still running after {:?}", t);
                    }
                }
                None => walk.wait_for_end_of_walking()?,
            }
            info!("End of walking, events: {:?}", walk.events());
            Ok(None)
        }
        WalkCommand::WaitForDoubleSupport { timeout_s } => {
            match timeout(timeout_s) {
                Some(t) => {
                    if !walk.wait_for_double_support_timeout(t)? {
                        warn!("Not in double support after {:?}", t);
                    }
                }
                None => walk.wait_for_double_support()?,
            }
            Ok(None)
        }
        WalkCommand::Sleep { duration_s } => {
            thread::sleep(Duration::from_secs_f64(duration_s.max(0.0)));
            Ok(None)
        }
    }
}
