//! # Ideal task controller
//!
//! A stand-in for the whole-body controller and dynamics model which tracks
//! every task sample perfectly: a frame task sample moves its segment to the
//! sample pose, and a CoM task sample moves the centre of mass. Contact tasks
//! only record their activation.
//!
//! Used by the executable to run walking sequences without a simulator, and by
//! the tests to observe what the walking modules command.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::debug;
use nalgebra::{Isometry3, Vector3};
use serde::Deserialize;

use crate::task_if::{
    DynamicModel, FrameSample, FrameTaskHandle, PointSample, PointTaskHandle, Task,
    TaskController, TaskDofs, TaskIfError,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry of the ideal biped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdealBipedParams {
    pub lfoot_segment: String,
    pub rfoot_segment: String,
    pub waist_segment: String,

    /// Lateral distance between the feet.
    ///
    /// Units: meters
    pub feet_distance_m: f64,

    /// Units: meters
    pub waist_height_m: f64,

    /// Units: meters
    pub com_height_m: f64,
}

/// Rigid-body model whose state is written directly by the ideal tasks.
#[derive(Debug)]
pub struct IdealModel {
    state: RwLock<ModelState>,
}

#[derive(Debug)]
struct ModelState {
    segment_names: Vec<String>,
    segment_poses: Vec<Isometry3<f64>>,
    com: Vector3<f64>,
}

/// A perfectly tracked task.
#[derive(Debug)]
pub struct IdealTask<S> {
    name: String,
    binding: Binding,
    model: Option<Arc<IdealModel>>,
    state: Mutex<TaskState<S>>,
}

#[derive(Debug)]
struct TaskState<S> {
    weight: f64,
    kp: f64,
    kd: f64,
    activation: Activation,
    num_deactivations: u64,
    last: Option<S>,
    num_updates: u64,
}

/// Task controller creating ideal tasks on an `IdealModel`.
#[derive(Debug)]
pub struct IdealController {
    model: Arc<IdealModel>,
    frame_tasks: Mutex<Vec<Arc<IdealTask<FrameSample>>>>,
    point_tasks: Mutex<Vec<Arc<IdealTask<PointSample>>>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a task takes part in the controller's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Inactive,
    Objective,
    Constraint,
}

#[derive(Debug, Clone)]
enum Binding {
    Detached,
    Frame {
        segment: usize,
        h_frame_segment: Isometry3<f64>,
        dofs: TaskDofs,
    },
    Com {
        dofs: TaskDofs,
    },
    Contact {
        segment: usize,
        mu: f64,
        margin: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for IdealBipedParams {
    fn default() -> Self {
        Self {
            lfoot_segment: "l_foot".into(),
            rfoot_segment: "r_foot".into(),
            waist_segment: "waist".into(),
            feet_distance_m: 0.1,
            waist_height_m: 0.8,
            com_height_m: 0.75,
        }
    }
}

impl IdealModel {
    pub fn new(segments: Vec<(String, Isometry3<f64>)>, com: Vector3<f64>) -> Self {
        let (segment_names, segment_poses) = segments.into_iter().unzip();

        Self {
            state: RwLock::new(ModelState {
                segment_names,
                segment_poses,
                com,
            }),
        }
    }

    /// A biped standing at the world origin facing +X, with flat soles.
    pub fn biped(params: &IdealBipedParams) -> Self {
        let half = params.feet_distance_m / 2.0;
        Self::new(
            vec![
                (
                    params.lfoot_segment.clone(),
                    Isometry3::translation(0.0, half, 0.0),
                ),
                (
                    params.rfoot_segment.clone(),
                    Isometry3::translation(0.0, -half, 0.0),
                ),
                (
                    params.waist_segment.clone(),
                    Isometry3::translation(0.0, 0.0, params.waist_height_m),
                ),
            ],
            Vector3::new(0.0, 0.0, params.com_height_m),
        )
    }

    fn apply_frame(&self, index: usize, target: &Isometry3<f64>, dofs: TaskDofs) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = match state.segment_poses.get_mut(index) {
            Some(p) => p,
            None => return,
        };

        match dofs {
            TaskDofs::Full => *current = *target,
            TaskDofs::Rotation => current.rotation = target.rotation,
            TaskDofs::Altitude => current.translation.vector[2] = target.translation.vector[2],
            TaskDofs::Horizontal => {
                current.translation.vector[0] = target.translation.vector[0];
                current.translation.vector[1] = target.translation.vector[1];
            }
        }
    }

    fn apply_com(&self, pos: &Vector3<f64>, dofs: TaskDofs) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        match dofs {
            TaskDofs::Full => state.com = *pos,
            TaskDofs::Horizontal => {
                state.com[0] = pos[0];
                state.com[1] = pos[1];
            }
            TaskDofs::Altitude => state.com[2] = pos[2],
            TaskDofs::Rotation => (),
        }
    }
}

impl DynamicModel for IdealModel {
    fn segment_index(&self, name: &str) -> Option<usize> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .segment_names
            .iter()
            .position(|n| n == name)
    }

    fn segment_position(&self, index: usize) -> Isometry3<f64> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .segment_poses
            .get(index)
            .copied()
            .unwrap_or_else(Isometry3::identity)
    }

    fn com_position(&self) -> Vector3<f64> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).com
    }
}

impl<S: Clone> IdealTask<S> {
    /// A task which is not attached to any model, only recording its inputs.
    pub fn detached(name: &str) -> Self {
        Self::with_binding(name, Binding::Detached, None, Activation::Objective)
    }

    fn with_binding(
        name: &str,
        binding: Binding,
        model: Option<Arc<IdealModel>>,
        activation: Activation,
    ) -> Self {
        Self {
            name: name.into(),
            binding,
            model,
            state: Mutex::new(TaskState {
                weight: 1.0,
                kp: 0.0,
                kd: 0.0,
                activation,
                num_deactivations: 0,
                last: None,
                num_updates: 0,
            }),
        }
    }

    pub fn weight(&self) -> f64 {
        self.state().weight
    }

    /// `(kp, kd)`
    pub fn gains(&self) -> (f64, f64) {
        let s = self.state();
        (s.kp, s.kd)
    }

    pub fn activation(&self) -> Activation {
        self.state().activation
    }

    /// Number of times the task went from active to inactive.
    pub fn num_deactivations(&self) -> u64 {
        self.state().num_deactivations
    }

    pub fn last_sample(&self) -> Option<S> {
        self.state().last.clone()
    }

    pub fn num_updates(&self) -> u64 {
        self.state().num_updates
    }

    /// Friction coefficient and margin of a contact task.
    pub fn contact_params(&self) -> Option<(f64, f64)> {
        match self.binding {
            Binding::Contact { mu, margin, .. } => Some((mu, margin)),
            _ => None,
        }
    }

    fn state(&self) -> MutexGuard<TaskState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_activation(&self, activation: Activation) {
        let mut s = self.state();
        if activation == Activation::Inactive && s.activation != Activation::Inactive {
            s.num_deactivations += 1;
        }
        s.activation = activation;
    }

    fn record(&self, sample: &S) {
        let mut s = self.state();
        s.last = Some(sample.clone());
        s.num_updates += 1;
    }
}

impl Task for IdealTask<FrameSample> {
    type Sample = FrameSample;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_weight(&self, weight: f64) {
        self.state().weight = weight;
    }

    fn set_kp_kd(&self, kp: f64, kd: f64) {
        let mut s = self.state();
        s.kp = kp;
        s.kd = kd;
    }

    fn activate_as_objective(&self) {
        self.set_activation(Activation::Objective);
    }

    fn activate_as_constraint(&self) {
        self.set_activation(Activation::Constraint);
    }

    fn deactivate(&self) {
        self.set_activation(Activation::Inactive);
    }

    fn update(&self, sample: &FrameSample) {
        self.record(sample);

        if let (Some(model), Binding::Frame { segment, h_frame_segment, dofs }) =
            (&self.model, &self.binding)
        {
            model.apply_frame(*segment, &(sample.pose * h_frame_segment), *dofs);
        }
    }
}

impl Task for IdealTask<PointSample> {
    type Sample = PointSample;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_weight(&self, weight: f64) {
        self.state().weight = weight;
    }

    fn set_kp_kd(&self, kp: f64, kd: f64) {
        let mut s = self.state();
        s.kp = kp;
        s.kd = kd;
    }

    fn activate_as_objective(&self) {
        self.set_activation(Activation::Objective);
    }

    fn activate_as_constraint(&self) {
        self.set_activation(Activation::Constraint);
    }

    fn deactivate(&self) {
        self.set_activation(Activation::Inactive);
    }

    fn update(&self, sample: &PointSample) {
        self.record(sample);

        if let (Some(model), Binding::Com { dofs }) = (&self.model, &self.binding) {
            model.apply_com(&sample.pos, *dofs);
        }
    }
}

impl IdealController {
    pub fn new(model: Arc<IdealModel>) -> Self {
        Self {
            model,
            frame_tasks: Mutex::new(Vec::new()),
            point_tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn model(&self) -> &Arc<IdealModel> {
        &self.model
    }

    /// Get a frame or contact task by name.
    pub fn frame_task(&self, name: &str) -> Option<Arc<IdealTask<FrameSample>>> {
        self.frame_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    pub fn com_task(&self, name: &str) -> Option<Arc<IdealTask<PointSample>>> {
        self.point_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    fn segment(&self, name: &str) -> Result<usize, TaskIfError> {
        self.model
            .segment_index(name)
            .ok_or_else(|| TaskIfError::UnknownSegment(name.into()))
    }

    fn add_frame_task(
        &self,
        task: IdealTask<FrameSample>,
    ) -> Result<FrameTaskHandle, TaskIfError> {
        let mut tasks = self.frame_tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.iter().any(|t| t.name == task.name) {
            return Err(TaskIfError::DuplicateTask(task.name));
        }

        debug!("Ideal task created: {} ({:?})", task.name, task.binding);

        let task = Arc::new(task);
        tasks.push(task.clone());
        Ok(task)
    }
}

impl TaskController for IdealController {
    fn create_frame_task(
        &self,
        name: &str,
        segment: &str,
        h_segment_frame: &Isometry3<f64>,
        dofs: TaskDofs,
        weight: f64,
    ) -> Result<FrameTaskHandle, TaskIfError> {
        let binding = Binding::Frame {
            segment: self.segment(segment)?,
            h_frame_segment: h_segment_frame.inverse(),
            dofs,
        };
        let task = IdealTask::with_binding(name, binding, Some(self.model.clone()), Activation::Objective);
        task.state().weight = weight;

        self.add_frame_task(task)
    }

    fn create_com_task(
        &self,
        name: &str,
        dofs: TaskDofs,
        weight: f64,
    ) -> Result<PointTaskHandle, TaskIfError> {
        if dofs == TaskDofs::Rotation {
            return Err(TaskIfError::DofsNotSupported {
                name: name.into(),
                dofs,
            });
        }

        let mut tasks = self.point_tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.iter().any(|t| t.name == name) {
            return Err(TaskIfError::DuplicateTask(name.into()));
        }

        let task = Arc::new(IdealTask::with_binding(
            name,
            Binding::Com { dofs },
            Some(self.model.clone()),
            Activation::Objective,
        ));
        task.state().weight = weight;

        debug!("Ideal CoM task created: {} ({})", name, dofs);

        tasks.push(task.clone());
        Ok(task)
    }

    fn create_contact_task(
        &self,
        name: &str,
        segment: &str,
        _h_segment_frame: &Isometry3<f64>,
        mu: f64,
        margin: f64,
        weight: f64,
    ) -> Result<FrameTaskHandle, TaskIfError> {
        let binding = Binding::Contact {
            segment: self.segment(segment)?,
            mu,
            margin,
        };
        let task = IdealTask::with_binding(name, binding, None, Activation::Constraint);
        task.state().weight = weight;

        self.add_frame_task(task)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::footstep::PlanarPose;

    fn setup() -> IdealController {
        IdealController::new(Arc::new(IdealModel::biped(&IdealBipedParams::default())))
    }

    #[test]
    fn test_frame_task_moves_segment() {
        let ctrl = setup();
        let sole = Isometry3::translation(0.0, 0.0, -0.05);
        let task = ctrl
            .create_frame_task("lf", "l_foot", &sole, TaskDofs::Full, 1.0)
            .unwrap();

        let target = PlanarPose::new(0.3, 0.05, 0.2).to_isometry(0.0);
        task.update(&FrameSample::at_rest(target));

        let idx = ctrl.model().segment_index("l_foot").unwrap();
        // The sole reaches the target, so the segment sits above it
        let sole_pose = ctrl.model().segment_position(idx) * sole;
        assert!((sole_pose.translation.vector - target.translation.vector).norm() < 1e-12);
        assert!(sole_pose.rotation.angle_to(&target.rotation) < 1e-12);
    }

    #[test]
    fn test_partial_dofs() {
        let ctrl = setup();
        let alt = ctrl
            .create_frame_task("alt", "waist", &Isometry3::identity(), TaskDofs::Altitude, 1.0)
            .unwrap();
        alt.update(&FrameSample::at_rest(PlanarPose::new(5.0, 5.0, 1.0).to_isometry(0.7)));

        let idx = ctrl.model().segment_index("waist").unwrap();
        let waist = ctrl.model().segment_position(idx);
        assert_eq!(waist.translation.vector, Vector3::new(0.0, 0.0, 0.7));
        assert!(waist.rotation.angle() < 1e-12);

        let com = ctrl.create_com_task("com", TaskDofs::Horizontal, 1.0).unwrap();
        com.update(&PointSample::at_rest(Vector3::new(0.1, 0.2, 9.0)));
        assert_eq!(ctrl.model().com_position(), Vector3::new(0.1, 0.2, 0.75));
    }

    #[test]
    fn test_contacts_and_registry() {
        let ctrl = setup();
        let c = ctrl
            .create_contact_task("c0", "r_foot", &Isometry3::identity(), 1.5, 0.01, 1.0)
            .unwrap();

        c.deactivate();
        c.deactivate();
        c.activate_as_objective();

        let ideal = ctrl.frame_task("c0").unwrap();
        assert_eq!(ideal.activation(), Activation::Objective);
        assert_eq!(ideal.num_deactivations(), 1);
        assert_eq!(ideal.contact_params(), Some((1.5, 0.01)));

        assert!(matches!(
            ctrl.create_contact_task("c0", "r_foot", &Isometry3::identity(), 1.5, 0.01, 1.0),
            Err(TaskIfError::DuplicateTask(_))
        ));
        assert!(matches!(
            ctrl.create_frame_task("x", "tail", &Isometry3::identity(), TaskDofs::Full, 1.0),
            Err(TaskIfError::UnknownSegment(_))
        ));
        assert!(matches!(
            ctrl.create_com_task("com", TaskDofs::Rotation, 1.0),
            Err(TaskIfError::DofsNotSupported { .. })
        ));
    }
}
