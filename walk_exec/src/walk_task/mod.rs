//! # Walking task
//!
//! The facade of the walking modules. Requests from the control thread are
//! turned into a footstep plan, a ZMP reference, swing and waist trajectories,
//! a preview controller and a gait state machine, all built on the calling
//! thread. The result is then handed to the tick thread, which installs it on
//! its next tick in place of the running controllers.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod active;
mod handoff;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        mpsc::{channel, Receiver},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, warn};
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector2, Vector3};
use serde::Serialize;

use crate::{
    error::{ConfigError, PlanningError},
    footstep::{
        center_of_feet, plan_from_path, plan_one_foot, straight_path, Foot, FootstepPlan,
        PlanarPose, StepParams,
    },
    gait::{FootContacts, FootTrackers, GaitEvent, GaitStateMachine},
    scheduler::{SchedulerHandle, UpdaterId},
    swing::{foot_trajectories, waist_sample, waist_trajectory, TrajError},
    task_if::{
        DynamicModel, FrameSample, FrameTaskHandle, PointTaskHandle, TaskController, TaskDofs,
        TaskIfError,
    },
    traj_track::TrajectoryTracking,
    zmp_ctrl::{ZmpCtrlError, ZmpCtrlParams, ZmpPreviewController},
    zmp_ref::{build_zmp_reference, ZmpReference},
};

use self::{
    active::{ActiveControllerSet, WalkUpdater},
    handoff::{Handoff, PlanInstall, WaitOutcome},
};

pub use active::TickRecord;
pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drives the feet, CoM and waist tasks of a biped to make it walk.
pub struct WalkingTask {
    params: WalkTaskParams,
    step_params: StepParams,
    zmp_ctrl_params: ZmpCtrlParams,

    /// Ground plane frame in the world frame.
    plane: Isometry3<f64>,

    model: Arc<dyn DynamicModel>,
    lfoot_index: usize,
    rfoot_index: usize,
    h_lfoot_sole: Isometry3<f64>,
    h_rfoot_sole: Isometry3<f64>,

    lfoot_task: FrameTaskHandle,
    rfoot_task: FrameTaskHandle,
    com_task: PointTaskHandle,
    waist_rotation_task: FrameTaskHandle,
    waist_altitude_task: FrameTaskHandle,
    contacts: FootContacts,

    handoff: Arc<Handoff>,
    scheduler: SchedulerHandle,
    updater_id: UpdaterId,

    record_receiver: Option<Receiver<TickRecord>>,
}

/// Walking status published by the tick thread after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WalkStatus {
    pub walking: bool,
    pub double_support: bool,

    /// The swinging foot, if any.
    pub swinging: Option<Foot>,

    /// A CoM controller is installed.
    pub balancing: bool,

    pub num_com_ctrl: usize,
    pub num_feet_ctrl: usize,

    /// Tick on which the status was published.
    pub tick: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Trajectory generation error: {0}")]
    Traj(#[from] TrajError),

    #[error("ZMP controller error: {0}")]
    ZmpCtrl(#[from] ZmpCtrlError),

    #[error("Task controller error: {0}")]
    TaskIf(#[from] TaskIfError),

    #[error("The tick scheduler is not running")]
    SchedulerStopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WalkStatus {
    fn default() -> Self {
        Self {
            walking: false,
            double_support: true,
            swinging: None,
            balancing: false,
            num_com_ctrl: 0,
            num_feet_ctrl: 0,
            tick: 0,
        }
    }
}

impl WalkingTask {
    /// Create the walking tasks in `ctrl` and register the tick side with the
    /// scheduler.
    ///
    /// The feet and waist tasks start by holding their current pose. No CoM
    /// controller runs until the first request.
    pub fn new(
        ctrl: &dyn TaskController,
        model: Arc<dyn DynamicModel>,
        scheduler: &SchedulerHandle,
        contacts: FootContacts,
        params: WalkParams,
    ) -> Result<Self, WalkError> {
        let WalkParams {
            task: params,
            step: step_params,
            zmp_ctrl: zmp_ctrl_params,
        } = params;

        params.validate()?;
        step_params.check_geometry()?;
        step_params.timing(params.dt_s)?;
        zmp_ctrl_params.validate()?;

        let contacts = FootContacts::new(contacts.left, contacts.right)?;

        let segment = |name: &str| {
            model
                .segment_index(name)
                .ok_or_else(|| ConfigError::UnknownSegment(name.into()))
        };
        let lfoot_index = segment(&params.lfoot_segment)?;
        let rfoot_index = segment(&params.rfoot_segment)?;
        let waist_index = segment(&params.waist_segment)?;

        let plane = params.plane();
        let h_lfoot_sole = params.h_lfoot_sole();
        let h_rfoot_sole = params.h_rfoot_sole();
        let h_waist_front = params.h_waist_front();

        // ---- TASKS ----

        let lfoot_task = ctrl.create_frame_task(
            &params.task_name("left_foot"),
            &params.lfoot_segment,
            &h_lfoot_sole,
            TaskDofs::Full,
            params.weight,
        )?;
        let rfoot_task = ctrl.create_frame_task(
            &params.task_name("right_foot"),
            &params.rfoot_segment,
            &h_rfoot_sole,
            TaskDofs::Full,
            params.weight,
        )?;
        let com_task = ctrl.create_com_task(
            &params.task_name("com"),
            TaskDofs::Horizontal,
            params.weight,
        )?;
        let waist_rotation_task = ctrl.create_frame_task(
            &params.task_name("waist_rotation"),
            &params.waist_segment,
            &h_waist_front,
            TaskDofs::Rotation,
            params.weight,
        )?;
        let waist_altitude_task = ctrl.create_frame_task(
            &params.task_name("waist_altitude"),
            &params.waist_segment,
            &h_waist_front,
            TaskDofs::Altitude,
            params.weight,
        )?;

        lfoot_task.set_kp(params.foot_kp);
        rfoot_task.set_kp(params.foot_kp);
        com_task.set_kp(params.com_kp);
        waist_rotation_task.set_kp(params.waist_kp);
        waist_altitude_task.set_kp(params.waist_kp);

        // ---- TRACKERS ----

        let hold = |task: &FrameTaskHandle, pose: Isometry3<f64>| {
            let mut tt = TrajectoryTracking::new(task.clone());
            tt.set_new_trajectory(vec![FrameSample::at_rest(pose)]);
            tt
        };
        let waist_pose = model.segment_position(waist_index) * h_waist_front;

        let active = ActiveControllerSet {
            com_ctrl: None,
            feet_ctrl: None,
            foot_trackers: FootTrackers {
                left: hold(&lfoot_task, model.segment_position(lfoot_index) * h_lfoot_sole),
                right: hold(&rfoot_task, model.segment_position(rfoot_index) * h_rfoot_sole),
            },
            waist_rotation: hold(&waist_rotation_task, waist_pose),
            waist_altitude: hold(&waist_altitude_task, waist_pose),
        };

        // ---- TICK SIDE ----

        let (record_sender, record_receiver) = if params.record_ticks {
            let (tx, rx) = channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let handoff = Arc::new(Handoff::default());
        let updater_id = scheduler.register(Box::new(WalkUpdater::new(
            params.task_name("updater"),
            params.dt_s,
            handoff.clone(),
            active,
            record_sender,
        )));

        info!(
            "Walking task created with {} left and {} right contacts",
            contacts.left.len(),
            contacts.right.len()
        );

        Ok(Self {
            params,
            step_params,
            zmp_ctrl_params,
            plane,
            model,
            lfoot_index,
            rfoot_index,
            h_lfoot_sole,
            h_rfoot_sole,
            lfoot_task,
            rfoot_task,
            com_task,
            waist_rotation_task,
            waist_altitude_task,
            contacts,
            handoff,
            scheduler: scheduler.clone(),
            updater_id,
            record_receiver,
        })
    }

    // ---- REQUESTS ----

    /// Balance over a fixed ZMP, at `pos` in the plane or by default at the
    /// centre of the feet. Any walk in progress is cancelled.
    pub fn stay_idle(&self, pos: Option<Vector2<f64>>) -> Result<ZmpReference, WalkError> {
        let pos = pos.unwrap_or_else(|| self.center_of_feet_in_plane().position());
        if !(pos[0].is_finite() && pos[1].is_finite()) {
            return Err(PlanningError::NonFiniteWaypoint(0).into());
        }

        let reference = vec![pos];
        let com_ctrl = self.new_com_ctrl(reference.clone())?;

        info!("Staying idle with the ZMP at [{:.3}, {:.3}]", pos[0], pos[1]);

        self.handoff.submit_plan(
            PlanInstall {
                com_ctrl,
                gait: None,
                waist_rotation: None,
            },
            WalkStatus {
                balancing: true,
                num_com_ctrl: 1,
                tick: self.scheduler.tick_count(),
                ..Default::default()
            },
        );

        Ok(reference)
    }

    /// Walk in a straight line from the centre of the feet to `target`, facing
    /// `angle` or the direction of travel.
    pub fn go_to(
        &self,
        target: Vector2<f64>,
        angle: Option<f64>,
        tolerance_m: f64,
    ) -> Result<ZmpReference, WalkError> {
        let start = self.center_of_feet_in_plane().position();
        let path = straight_path(start, target, angle, tolerance_m)?;
        self.follow_trajectory(&path)
    }

    /// Walk in a straight line to `offset` from the centre of the feet.
    pub fn go_to_relative(
        &self,
        offset: Vector2<f64>,
        angle: Option<f64>,
        tolerance_m: f64,
    ) -> Result<ZmpReference, WalkError> {
        let start = self.center_of_feet_in_plane().position();
        self.go_to(start + offset, angle, tolerance_m)
    }

    /// Walk along a path of the centre of the feet.
    pub fn follow_trajectory(&self, path: &[PlanarPose]) -> Result<ZmpReference, WalkError> {
        let plan = plan_from_path(
            path,
            &self.step_params,
            self.lfoot_pose_in_plane(),
            self.rfoot_pose_in_plane(),
        )?;
        self.execute(&plan)
    }

    /// Take a single step with `foot`, `length` forward and `side_length`
    /// outwards of the centre of the feet.
    pub fn move_one_foot(
        &self,
        foot: Foot,
        length_m: f64,
        side_length_m: f64,
        angle: Option<f64>,
    ) -> Result<ZmpReference, WalkError> {
        let plan = plan_one_foot(
            foot,
            length_m,
            side_length_m,
            angle,
            self.lfoot_pose_in_plane(),
            self.rfoot_pose_in_plane(),
        )?;
        self.execute(&plan)
    }

    // ---- STATUS ----

    pub fn status(&self) -> WalkStatus {
        self.handoff.status()
    }

    pub fn is_walking(&self) -> bool {
        self.status().walking
    }

    pub fn is_on_double_support(&self) -> bool {
        self.status().double_support
    }

    /// The swinging foot, if any.
    pub fn is_on_simple_support(&self) -> Option<Foot> {
        self.status().swinging
    }

    pub fn is_balancing(&self) -> bool {
        self.status().balancing
    }

    /// Gait events raised so far by the current plan.
    pub fn events(&self) -> Vec<GaitEvent> {
        self.handoff.events()
    }

    /// Take the tick records sent since the last call. Empty unless
    /// `record_ticks` is set.
    pub fn drain_records(&self) -> Vec<TickRecord> {
        self.record_receiver
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }

    // ---- WAITING ----

    pub fn wait_for_end_of_walking(&self) -> Result<(), WalkError> {
        self.wait(|s| !s.walking, None).map(|_| ())
    }

    /// Returns false if the walk did not end before the timeout.
    pub fn wait_for_end_of_walking_timeout(&self, timeout: Duration) -> Result<bool, WalkError> {
        self.wait(|s| !s.walking, Some(timeout))
    }

    pub fn wait_for_double_support(&self) -> Result<(), WalkError> {
        self.wait(|s| s.double_support, None).map(|_| ())
    }

    pub fn wait_for_double_support_timeout(&self, timeout: Duration) -> Result<bool, WalkError> {
        self.wait(|s| s.double_support, Some(timeout))
    }

    // ---- CONFIGURATION ----

    /// Set the step parameters used by later requests.
    pub fn set_step_parameters(&mut self, step_params: StepParams) -> Result<(), WalkError> {
        step_params.check_geometry()?;
        step_params.timing(self.params.dt_s)?;

        debug!("New step parameters: {:?}", step_params);
        self.step_params = step_params;
        Ok(())
    }

    pub fn step_parameters(&self) -> &StepParams {
        &self.step_params
    }

    /// Set the preview controller tuning used by later requests.
    pub fn set_zmp_control_parameters(&mut self, zmp_ctrl_params: ZmpCtrlParams) -> Result<(), WalkError> {
        zmp_ctrl_params.validate()?;

        debug!("New ZMP control parameters: {:?}", zmp_ctrl_params);
        self.zmp_ctrl_params = zmp_ctrl_params;
        Ok(())
    }

    pub fn zmp_control_parameters(&self) -> &ZmpCtrlParams {
        &self.zmp_ctrl_params
    }

    /// Set the weight of the feet and CoM tasks.
    pub fn set_tasks_weight(&self, weight: f64) {
        self.lfoot_task.set_weight(weight);
        self.rfoot_task.set_weight(weight);
        self.com_task.set_weight(weight);
    }

    /// Track a new waist altitude trajectory, in the world frame.
    pub fn set_waist_altitude(&self, samples: Vec<FrameSample>) {
        if samples.is_empty() {
            warn!("Ignoring an empty waist altitude trajectory");
            return;
        }
        self.handoff.submit_waist_altitude(samples);
    }

    /// Track a new waist orientation trajectory, in the world frame.
    ///
    /// Replaced by the waist trajectory of the next walk.
    pub fn set_waist_orientation(&self, samples: Vec<FrameSample>) {
        if samples.is_empty() {
            warn!("Ignoring an empty waist orientation trajectory");
            return;
        }
        self.handoff.submit_waist_rotation(samples);
    }

    /// Hold the waist at `altitude_m` above the ground plane.
    pub fn hold_waist_altitude(&self, altitude_m: f64) {
        let pose = self.plane * PlanarPose::default().to_isometry(altitude_m);
        self.set_waist_altitude(vec![FrameSample::at_rest(pose)]);
    }

    /// Hold the waist facing `heading_rad` in the ground plane.
    pub fn hold_waist_heading(&self, heading_rad: f64) {
        let pose = PlanarPose::new(0.0, 0.0, heading_rad);
        self.set_waist_orientation(vec![waist_sample(&pose, &self.plane)]);
    }

    pub fn waist_rotation_task(&self) -> &FrameTaskHandle {
        &self.waist_rotation_task
    }

    pub fn waist_altitude_task(&self) -> &FrameTaskHandle {
        &self.waist_altitude_task
    }

    // ---- PLANE QUERIES ----

    pub fn plane(&self) -> &Isometry3<f64> {
        &self.plane
    }

    pub fn lfoot_pose_in_plane(&self) -> PlanarPose {
        self.pose_in_plane(&(self.model.segment_position(self.lfoot_index) * self.h_lfoot_sole))
    }

    pub fn rfoot_pose_in_plane(&self) -> PlanarPose {
        self.pose_in_plane(&(self.model.segment_position(self.rfoot_index) * self.h_rfoot_sole))
    }

    pub fn center_of_feet_in_plane(&self) -> PlanarPose {
        center_of_feet(&self.lfoot_pose_in_plane(), &self.rfoot_pose_in_plane())
    }

    /// Position of the CoM in the plane frame.
    pub fn com_in_plane(&self) -> Vector3<f64> {
        self.plane
            .inverse_transform_point(&Point3::from(self.model.com_position()))
            .coords
    }

    // ---- PRIVATE ----

    fn pose_in_plane(&self, h_0_pos: &Isometry3<f64>) -> PlanarPose {
        PlanarPose::from_isometry(&(self.plane.inverse() * h_0_pos))
    }

    fn new_com_ctrl(&self, reference: ZmpReference) -> Result<ZmpPreviewController, WalkError> {
        Ok(ZmpPreviewController::new(
            self.com_task.clone(),
            self.model.com_position(),
            reference,
            &self.zmp_ctrl_params,
            self.params.dt_s,
            self.plane,
        )?)
    }

    /// Build every controller of a plan and hand them to the tick thread.
    fn execute(&self, plan: &FootstepPlan) -> Result<ZmpReference, WalkError> {
        let timing = self.step_params.timing(self.params.dt_s)?;

        let reference = build_zmp_reference(plan, &timing)?;
        let segments = foot_trajectories(plan, &timing, self.step_params.height_m, &self.plane)?;
        let waist = waist_trajectory(plan, &timing, &self.plane)?;

        let gait = GaitStateMachine::new(
            segments,
            plan.len(),
            timing,
            plan.start_foot(),
            self.contacts.clone(),
            self.params.contact_as_objective,
        )?;
        let com_ctrl = self.new_com_ctrl(reference.clone())?;

        info!(
            "Walking a plan of {} footsteps starting with the {} foot",
            plan.len(),
            plan.start_foot()
        );

        self.handoff.submit_plan(
            PlanInstall {
                com_ctrl,
                gait: Some(gait),
                waist_rotation: Some(waist),
            },
            WalkStatus {
                walking: true,
                double_support: true,
                swinging: None,
                balancing: true,
                num_com_ctrl: 1,
                num_feet_ctrl: 1,
                tick: self.scheduler.tick_count(),
            },
        );

        Ok(reference)
    }

    fn wait<P>(&self, pred: P, timeout: Option<Duration>) -> Result<bool, WalkError>
    where
        P: Fn(&WalkStatus) -> bool,
    {
        let scheduler = &self.scheduler;
        match self.handoff.wait_until(
            pred,
            Duration::from_secs_f64(self.params.wait_period_s),
            timeout,
            || scheduler.is_running(),
        ) {
            WaitOutcome::Reached => Ok(true),
            WaitOutcome::TimedOut => Ok(false),
            WaitOutcome::Stopped => Err(WalkError::SchedulerStopped),
        }
    }
}

impl Drop for WalkingTask {
    fn drop(&mut self) {
        self.scheduler.remove(self.updater_id);
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Create the contact tasks of both feet from their contact points.
pub fn create_foot_contacts(
    ctrl: &dyn TaskController,
    params: &WalkTaskParams,
) -> Result<FootContacts, WalkError> {
    let c = &params.contacts;

    let create = |foot: &str, segment: &str, points: &[[f64; 3]]| {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                ctrl.create_contact_task(
                    &params.task_name(&format!("{}_contact_{}", foot, i)),
                    segment,
                    &Isometry3::from_parts(Vector3::from(*p).into(), UnitQuaternion::identity()),
                    c.mu,
                    c.margin_m,
                    c.weight,
                )
            })
            .collect::<Result<Vec<_>, _>>()
    };

    let left = create("lfoot", &params.lfoot_segment, &c.lfoot_points_m)?;
    let right = create("rfoot", &params.rfoot_segment, &c.rfoot_points_m)?;

    Ok(FootContacts::new(left, right)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ideal::{IdealBipedParams, IdealController, IdealModel},
        scheduler::{SchedulerParams, TickScheduler},
    };

    fn setup() -> (IdealController, TickScheduler, WalkingTask) {
        let model = Arc::new(IdealModel::biped(&IdealBipedParams::default()));
        let ctrl = IdealController::new(model.clone());
        let sched = TickScheduler::new(SchedulerParams::default()).unwrap();

        let params = WalkParams::default();
        let contacts = create_foot_contacts(&ctrl, &params.task).unwrap();
        let task = WalkingTask::new(&ctrl, model, &sched.handle(), contacts, params).unwrap();

        (ctrl, sched, task)
    }

    #[test]
    fn test_new() {
        let (ctrl, _sched, task) = setup();

        for name in &["left_foot", "right_foot", "waist_rotation", "waist_altitude"] {
            assert!(ctrl.frame_task(&format!("walking.{}", name)).is_some());
        }
        assert!(ctrl.frame_task("walking.lfoot_contact_3").is_some());
        assert_eq!(ctrl.frame_task("walking.left_foot").unwrap().gains().0, 150.0);
        assert!(ctrl.com_task("walking.com").is_some());

        let l = task.lfoot_pose_in_plane();
        let r = task.rfoot_pose_in_plane();
        assert!((l.y - 0.05).abs() < 1e-12);
        assert!((r.y + 0.05).abs() < 1e-12);
        assert!(task.center_of_feet_in_plane().position().norm() < 1e-12);

        let status = task.status();
        assert!(!status.walking);
        assert!(status.double_support);
        assert!(!status.balancing);
    }

    #[test]
    fn test_unknown_segment() {
        let model = Arc::new(IdealModel::biped(&IdealBipedParams::default()));
        let ctrl = IdealController::new(model.clone());
        let sched = TickScheduler::new(SchedulerParams::default()).unwrap();

        let params = WalkParams::default();
        let contacts = create_foot_contacts(&ctrl, &params.task).unwrap();

        let mut bad = params.clone();
        bad.task.waist_segment = "torso".into();
        assert!(matches!(
            WalkingTask::new(&ctrl, model.clone(), &sched.handle(), contacts.clone(), bad),
            Err(WalkError::Config(ConfigError::UnknownSegment(s))) if s == "torso"
        ));

        let no_contacts = FootContacts {
            left: contacts.left.clone(),
            right: Vec::new(),
        };
        assert!(matches!(
            WalkingTask::new(&ctrl, model, &sched.handle(), no_contacts, params),
            Err(WalkError::Config(ConfigError::NoContacts(Foot::Right)))
        ));
    }

    #[test]
    fn test_stay_idle() {
        let (_ctrl, _sched, task) = setup();

        let a = task.stay_idle(None).unwrap();
        let b = task.stay_idle(None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![Vector2::zeros()]);
        assert!(task.is_balancing());
        assert!(!task.is_walking());

        let c = task.stay_idle(Some(Vector2::new(0.02, 0.01))).unwrap();
        assert_eq!(c, vec![Vector2::new(0.02, 0.01)]);
    }

    #[test]
    fn test_rejected_request() {
        let (_ctrl, _sched, mut task) = setup();

        task.go_to(Vector2::new(0.5, 0.0), None, 0.01).unwrap();
        assert!(task.is_walking());

        // A bad request leaves the submitted plan in place
        assert!(matches!(
            task.go_to(Vector2::new(0.5, 0.0), None, 0.0),
            Err(WalkError::Planning(PlanningError::InvalidTolerance(_)))
        ));
        assert!(matches!(
            task.move_one_foot(Foot::Left, 0.0, 0.0, None),
            Err(WalkError::Planning(PlanningError::ZeroLengthStep))
        ));
        assert!(task.is_walking());

        assert!(task
            .set_step_parameters(StepParams {
                ratio: 0.0,
                ..Default::default()
            })
            .is_err());
        assert_eq!(task.step_parameters(), &StepParams::default());

        // Not running
        assert!(matches!(
            task.wait_for_end_of_walking(),
            Err(WalkError::SchedulerStopped)
        ));
    }

    #[test]
    fn test_tasks_weight() {
        let (ctrl, _sched, task) = setup();
        task.set_tasks_weight(0.5);

        assert_eq!(ctrl.frame_task("walking.left_foot").unwrap().weight(), 0.5);
        assert_eq!(ctrl.frame_task("walking.right_foot").unwrap().weight(), 0.5);
        assert_eq!(ctrl.com_task("walking.com").unwrap().weight(), 0.5);
        assert_eq!(ctrl.frame_task("walking.waist_rotation").unwrap().weight(), 1.0);
    }
}
