//! # Gait phase state machine
//!
//! Sequences the double and single support phases of a plan. Each step has a
//! double support window centred on `(k + 0.5) * step_time`; the swing foot
//! lifts off at the end of a window and touches down at the start of the
//! next one. Lifting off installs the swing segment into the foot's tracker
//! and deactivates its contacts, touching down reactivates them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::mem;

use log::debug;
use nalgebra::{Isometry3, Translation3, Vector3};
use serde::Serialize;

use crate::{
    error::ConfigError,
    footstep::{Foot, GaitTiming},
    swing::SwingSegment,
    task_if::{FrameSample, FrameTaskHandle},
    traj_track::TrajectoryTracking,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance on the phase switching times.
///
/// Units: seconds
const SWITCH_TOLERANCE_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Contact tasks of both feet.
#[derive(Clone)]
pub struct FootContacts {
    pub left: Vec<FrameTaskHandle>,
    pub right: Vec<FrameTaskHandle>,
}

/// Trackers of both feet.
#[derive(Debug)]
pub struct FootTrackers {
    pub left: TrajectoryTracking<FrameSample>,
    pub right: TrajectoryTracking<FrameSample>,
}

/// Gait phase state machine of one plan.
#[derive(Debug)]
pub struct GaitStateMachine {
    segments: Vec<SwingSegment>,
    timing: GaitTiming,
    contacts: FootContacts,
    contact_as_objective: bool,

    /// Number of updates since the start of the plan.
    num_ticks: u64,

    /// Number of double support windows left behind.
    num_step: usize,

    /// The foot which swung last, or the support foot of the first step.
    current_foot: Foot,

    phase: GaitPhase,
    events: Vec<GaitEvent>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GaitPhase {
    DoubleSupport,
    SingleSupport(Foot),
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GaitEvent {
    LiftOff { foot: Foot, step: usize },
    TouchDown { foot: Foot, step: usize },
    Finished,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FootContacts {
    pub fn new(left: Vec<FrameTaskHandle>, right: Vec<FrameTaskHandle>) -> Result<Self, ConfigError> {
        if left.is_empty() {
            return Err(ConfigError::NoContacts(Foot::Left));
        }
        if right.is_empty() {
            return Err(ConfigError::NoContacts(Foot::Right));
        }

        Ok(Self { left, right })
    }

    pub fn get(&self, foot: Foot) -> &[FrameTaskHandle] {
        match foot {
            Foot::Left => &self.left,
            Foot::Right => &self.right,
        }
    }
}

impl std::fmt::Debug for FootContacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |c: &[FrameTaskHandle]| c.iter().map(|t| t.name().to_string()).collect::<Vec<_>>();
        f.debug_struct("FootContacts")
            .field("left", &names(&self.left))
            .field("right", &names(&self.right))
            .finish()
    }
}

impl FootTrackers {
    pub fn get_mut(&mut self, foot: Foot) -> &mut TrajectoryTracking<FrameSample> {
        match foot {
            Foot::Left => &mut self.left,
            Foot::Right => &mut self.right,
        }
    }

    pub fn update(&mut self, tick: u64) {
        self.left.update(tick);
        self.right.update(tick);
    }
}

impl GaitStateMachine {
    /// Create the state machine of a plan of `plan_len` footsteps, starting in
    /// double support.
    pub fn new(
        segments: Vec<SwingSegment>,
        plan_len: usize,
        timing: GaitTiming,
        start_foot: Foot,
        contacts: FootContacts,
        contact_as_objective: bool,
    ) -> Result<Self, ConfigError> {
        let expected = plan_len.saturating_sub(2);
        if plan_len < 2 || segments.len() != expected {
            return Err(ConfigError::PlanLengthMismatch {
                plan_len,
                expected,
                segments: segments.len(),
            });
        }
        if contacts.left.is_empty() {
            return Err(ConfigError::NoContacts(Foot::Left));
        }
        if contacts.right.is_empty() {
            return Err(ConfigError::NoContacts(Foot::Right));
        }

        Ok(Self {
            segments,
            timing,
            contacts,
            contact_as_objective,
            num_ticks: 0,
            num_step: 0,
            current_foot: start_foot.other(),
            phase: GaitPhase::DoubleSupport,
            events: Vec::new(),
        })
    }

    /// Advance the machine by one tick, switching phase when a window boundary
    /// is reached.
    pub fn update(&mut self, trackers: &mut FootTrackers) {
        if self.phase == GaitPhase::Idle {
            return;
        }

        self.num_ticks += 1;
        let t = self.num_ticks as f64 * self.timing.dt_s();

        let centre = (self.num_step as f64 + 0.5) * self.timing.step_time_s();
        let half = self.timing.half_double_support_s();

        if t >= centre + half - SWITCH_TOLERANCE_S {
            self.lift_off(trackers);
        } else if t >= centre - half - SWITCH_TOLERANCE_S {
            if let GaitPhase::SingleSupport(_) = self.phase {
                self.touch_down();
            }
        }
    }

    /// Stop the machine, putting a swinging foot back in contact.
    ///
    /// The swinging foot's tracker stops where it was, lowered onto the
    /// ground of its landing pose.
    pub fn cancel(&mut self, trackers: &mut FootTrackers) {
        if let GaitPhase::SingleSupport(foot) = self.phase {
            let tracker = trackers.get_mut(foot);
            if let Some(held) = grounded_sample(tracker) {
                tracker.set_new_trajectory(vec![held]);
            }
            self.touch_down();
        }

        if self.phase != GaitPhase::Idle {
            debug!("Gait cancelled at step {}", self.num_step);
            self.phase = GaitPhase::Idle;
        }
    }

    pub fn is_walking(&self) -> bool {
        self.phase != GaitPhase::Idle
    }

    pub fn is_on_double_support(&self) -> bool {
        self.phase == GaitPhase::DoubleSupport
    }

    /// The swinging foot, if any.
    pub fn is_on_simple_support(&self) -> Option<Foot> {
        match self.phase {
            GaitPhase::SingleSupport(foot) => Some(foot),
            _ => None,
        }
    }

    pub fn phase(&self) -> GaitPhase {
        self.phase
    }

    pub fn events(&self) -> &[GaitEvent] {
        &self.events
    }

    /// Number of swing segments of the plan.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Leave the current double support window.
    fn lift_off(&mut self, trackers: &mut FootTrackers) {
        if let GaitPhase::SingleSupport(_) = self.phase {
            self.touch_down();
        }

        let step = self.num_step;
        self.current_foot = self.current_foot.other();
        self.num_step += 1;

        match self.segments.get_mut(step) {
            Some(segment) => {
                let foot = self.current_foot;
                trackers.get_mut(foot).set_new_trajectory(mem::take(segment));

                for task in self.contacts.get(foot) {
                    task.deactivate();
                }

                debug!("Lift-off of the {} foot, step {}", foot, step);
                self.phase = GaitPhase::SingleSupport(foot);
                self.events.push(GaitEvent::LiftOff { foot, step });
            }
            None => {
                debug!("Gait finished after {} steps", step);
                self.phase = GaitPhase::Idle;
                self.events.push(GaitEvent::Finished);
            }
        }
    }

    /// Put the swinging foot back in contact.
    fn touch_down(&mut self) {
        let foot = self.current_foot;

        for task in self.contacts.get(foot) {
            if self.contact_as_objective {
                task.activate_as_objective();
            } else {
                task.activate_as_constraint();
            }
        }

        let step = self.num_step.saturating_sub(1);
        debug!("Touch-down of the {} foot, step {}", foot, step);
        self.phase = GaitPhase::DoubleSupport;
        self.events.push(GaitEvent::TouchDown { foot, step });
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The last sample forwarded by the tracker, at rest and projected along the
/// foot normal onto the ground of the trajectory's final sample.
fn grounded_sample(tracker: &TrajectoryTracking<FrameSample>) -> Option<FrameSample> {
    let current = tracker.last_forwarded()?;
    let landing = tracker.end()?;

    let normal = landing.pose.rotation * Vector3::z();
    let offset = current.pose.translation.vector - landing.pose.translation.vector;
    let position = current.pose.translation.vector - normal * normal.dot(&offset);

    Some(FrameSample::at_rest(Isometry3::from_parts(
        Translation3::from(position),
        current.pose.rotation,
    )))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ideal::{Activation, IdealTask};
    use crate::task_if::Task;
    use std::sync::Arc;

    struct Fixture {
        left: Arc<IdealTask<FrameSample>>,
        right: Arc<IdealTask<FrameSample>>,
        lfoot: Arc<IdealTask<FrameSample>>,
        rfoot: Arc<IdealTask<FrameSample>>,
    }

    impl Fixture {
        fn new() -> Self {
            let contact = |name| {
                let t = Arc::new(IdealTask::<FrameSample>::detached(name));
                t.activate_as_constraint();
                t
            };
            Self {
                left: contact("test.left_contact"),
                right: contact("test.right_contact"),
                lfoot: Arc::new(IdealTask::detached("test.lfoot")),
                rfoot: Arc::new(IdealTask::detached("test.rfoot")),
            }
        }

        fn contacts(&self) -> FootContacts {
            FootContacts::new(
                vec![self.left.clone() as FrameTaskHandle],
                vec![self.right.clone() as FrameTaskHandle],
            )
            .unwrap()
        }

        fn trackers(&self) -> FootTrackers {
            FootTrackers {
                left: TrajectoryTracking::new(self.lfoot.clone()),
                right: TrajectoryTracking::new(self.rfoot.clone()),
            }
        }
    }

    fn segment(len: usize) -> SwingSegment {
        vec![FrameSample::at_rest(Isometry3::identity()); len]
    }

    fn timing() -> GaitTiming {
        GaitTiming::new(1.0, 0.9, 0.01).unwrap()
    }

    #[test]
    fn test_one_step() {
        let fx = Fixture::new();
        let mut trackers = fx.trackers();
        let mut gait =
            GaitStateMachine::new(vec![segment(91)], 3, timing(), Foot::Left, fx.contacts(), false)
                .unwrap();

        assert!(gait.is_walking());
        assert!(gait.is_on_double_support());

        // Lift-off at the end of the first window, 0.55 s
        for _ in 0..54 {
            gait.update(&mut trackers);
        }
        assert!(gait.is_on_double_support());
        gait.update(&mut trackers);
        assert_eq!(gait.phase(), GaitPhase::SingleSupport(Foot::Left));
        assert_eq!(fx.left.activation(), Activation::Inactive);
        assert_eq!(fx.right.activation(), Activation::Constraint);
        assert_eq!(trackers.left.len(), 91);
        assert!(trackers.right.is_empty());

        // Touch-down at the start of the second window, 1.45 s
        for _ in 55..144 {
            gait.update(&mut trackers);
        }
        assert_eq!(gait.is_on_simple_support(), Some(Foot::Left));
        gait.update(&mut trackers);
        assert!(gait.is_on_double_support());
        assert_eq!(fx.left.activation(), Activation::Constraint);

        // Finished at the end of the second window, 1.55 s
        for _ in 145..155 {
            gait.update(&mut trackers);
        }
        assert!(!gait.is_walking());
        assert_eq!(
            gait.events(),
            &[
                GaitEvent::LiftOff { foot: Foot::Left, step: 0 },
                GaitEvent::TouchDown { foot: Foot::Left, step: 0 },
                GaitEvent::Finished,
            ]
        );

        // Idle is final
        for _ in 0..200 {
            gait.update(&mut trackers);
        }
        assert!(!gait.is_walking());
        assert_eq!(gait.events().len(), 3);
        assert_eq!(fx.left.num_deactivations(), 1);
    }

    #[test]
    fn test_alternation() {
        let fx = Fixture::new();
        let mut trackers = fx.trackers();
        let mut gait = GaitStateMachine::new(
            vec![segment(91), segment(91), segment(91)],
            5,
            timing(),
            Foot::Right,
            fx.contacts(),
            true,
        )
        .unwrap();

        for _ in 0..1000 {
            gait.update(&mut trackers);
        }

        let lift_offs = gait
            .events()
            .iter()
            .filter_map(|e| match e {
                GaitEvent::LiftOff { foot, .. } => Some(*foot),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(lift_offs, vec![Foot::Right, Foot::Left, Foot::Right]);
        assert_eq!(gait.events().last(), Some(&GaitEvent::Finished));

        // Contacts come back as objectives
        assert_eq!(fx.left.activation(), Activation::Objective);
        assert_eq!(fx.right.activation(), Activation::Objective);
    }

    #[test]
    fn test_full_single_support() {
        // Without double support the touch-down and the next lift-off coincide
        let fx = Fixture::new();
        let mut trackers = fx.trackers();
        let timing = GaitTiming::new(1.0, 1.0, 0.01).unwrap();
        let mut gait = GaitStateMachine::new(
            vec![segment(101), segment(101)],
            4,
            timing,
            Foot::Left,
            fx.contacts(),
            false,
        )
        .unwrap();

        for _ in 0..150 {
            gait.update(&mut trackers);
        }
        assert_eq!(gait.is_on_simple_support(), Some(Foot::Right));
        assert_eq!(
            &gait.events()[..3],
            &[
                GaitEvent::LiftOff { foot: Foot::Left, step: 0 },
                GaitEvent::TouchDown { foot: Foot::Left, step: 0 },
                GaitEvent::LiftOff { foot: Foot::Right, step: 1 },
            ]
        );
    }

    #[test]
    fn test_cancel() {
        let fx = Fixture::new();
        let mut trackers = fx.trackers();

        // Swing rising from the origin to 5 cm, landing 20 cm ahead
        let swing = (0..91)
            .map(|i| {
                let s = i as f64 / 90.0;
                let z = 0.05 * (std::f64::consts::PI * s).sin();
                FrameSample::at_rest(Isometry3::translation(0.2 * s, -0.05, z))
            })
            .collect::<Vec<_>>();
        let mut gait =
            GaitStateMachine::new(vec![swing], 3, timing(), Foot::Right, fx.contacts(), false)
                .unwrap();

        for _ in 0..60 {
            trackers.update(0);
            gait.update(&mut trackers);
        }
        assert_eq!(fx.right.activation(), Activation::Inactive);

        // A few samples of the swing have been forwarded
        trackers.update(0);
        let forwarded = *trackers.right.last_forwarded().unwrap();
        assert!(forwarded.pose.translation.vector[2] > 0.0);

        gait.cancel(&mut trackers);
        assert!(!gait.is_walking());
        assert_eq!(fx.right.activation(), Activation::Constraint);

        // The foot is held where it was, on the ground and at rest
        assert_eq!(trackers.right.len(), 1);
        let held = *trackers.right.current().unwrap();
        let p = held.pose.translation.vector;
        assert!((p[0] - forwarded.pose.translation.vector[0]).abs() < 1e-12);
        assert!((p[1] + 0.05).abs() < 1e-12);
        assert!(p[2].abs() < 1e-12);
        assert_eq!(held, FrameSample::at_rest(held.pose));

        trackers.update(0);
        assert_eq!(fx.rfoot.last_sample().unwrap(), held);
    }

    #[test]
    fn test_invalid() {
        let fx = Fixture::new();
        assert!(matches!(
            GaitStateMachine::new(vec![segment(91)], 4, timing(), Foot::Left, fx.contacts(), false),
            Err(ConfigError::PlanLengthMismatch {
                plan_len: 4,
                expected: 2,
                segments: 1
            })
        ));
        assert!(matches!(
            FootContacts::new(vec![fx.left.clone() as FrameTaskHandle], Vec::new()),
            Err(ConfigError::NoContacts(Foot::Right))
        ));
    }
}
