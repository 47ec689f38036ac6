//! Controllers run by the tick thread

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{mpsc::Sender, Arc};

use log::{info, trace};
use serde::Serialize;

use crate::{
    gait::{FootTrackers, GaitStateMachine},
    scheduler::Updater,
    task_if::FrameSample,
    traj_track::TrajectoryTracking,
    zmp_ctrl::ZmpPreviewController,
};

use super::{
    handoff::{Handoff, PlanInstall},
    WalkStatus,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The controllers currently driving the tasks.
#[derive(Debug)]
pub(super) struct ActiveControllerSet {
    pub com_ctrl: Option<ZmpPreviewController>,
    pub feet_ctrl: Option<GaitStateMachine>,
    pub foot_trackers: FootTrackers,
    pub waist_rotation: TrajectoryTracking<FrameSample>,
    pub waist_altitude: TrajectoryTracking<FrameSample>,
}

/// Record of the CoM and ZMP on one tick, in the ground plane frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub time_s: f64,
    pub com_x_m: f64,
    pub com_y_m: f64,
    pub com_z_m: f64,
    pub zmp_x_m: f64,
    pub zmp_y_m: f64,
    pub ref_x_m: f64,
    pub ref_y_m: f64,
    pub walking: bool,
    pub double_support: bool,
}

/// Tick side of the walking task.
pub(super) struct WalkUpdater {
    name: String,
    dt_s: f64,
    handoff: Arc<Handoff>,
    active: ActiveControllerSet,

    /// Number of gait events of the current plan already published.
    num_published_events: usize,

    record_sender: Option<Sender<TickRecord>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActiveControllerSet {
    /// Replace the CoM controller and the gait machine. The old controllers
    /// are dropped before the new ones run.
    pub fn install(&mut self, plan: PlanInstall) {
        if let Some(mut gait) = self.feet_ctrl.take() {
            gait.cancel(&mut self.foot_trackers);
        }
        self.com_ctrl = None;

        info!(
            "Installing a plan with a {} sample ZMP reference and {} steps",
            plan.com_ctrl.reference().len(),
            plan.gait.as_ref().map_or(0, |g| g.num_segments())
        );

        self.com_ctrl = Some(plan.com_ctrl);
        self.feet_ctrl = plan.gait;

        if let Some(samples) = plan.waist_rotation {
            self.waist_rotation.set_new_trajectory(samples);
        }
    }

    /// Run every controller once: trackers first, then the CoM controller,
    /// then the gait machine.
    pub fn update(&mut self, tick: u64) {
        self.foot_trackers.update(tick);
        self.waist_rotation.update(tick);
        self.waist_altitude.update(tick);

        if let Some(com_ctrl) = self.com_ctrl.as_mut() {
            com_ctrl.update(tick);
        }

        if let Some(gait) = self.feet_ctrl.as_mut() {
            gait.update(&mut self.foot_trackers);
        }
    }

    pub fn status(&self, tick: u64) -> WalkStatus {
        let walking = self.feet_ctrl.as_ref().map_or(false, |g| g.is_walking());

        WalkStatus {
            walking,
            double_support: !walking
                || self.feet_ctrl.as_ref().map_or(true, |g| g.is_on_double_support()),
            swinging: self.feet_ctrl.as_ref().and_then(|g| g.is_on_simple_support()),
            balancing: self.com_ctrl.is_some(),
            num_com_ctrl: self.com_ctrl.iter().count(),
            num_feet_ctrl: self.feet_ctrl.iter().count(),
            tick,
        }
    }

    pub fn record(&self, tick: u64, dt_s: f64) -> Option<TickRecord> {
        let com_ctrl = self.com_ctrl.as_ref()?;
        let (com, _, _) = com_ctrl.com_state();
        let zmp = com_ctrl.zmp();
        let reference = com_ctrl.reference_at(com_ctrl.index().saturating_sub(1));
        let status = self.status(tick);

        Some(TickRecord {
            tick,
            time_s: tick as f64 * dt_s,
            com_x_m: com[0],
            com_y_m: com[1],
            com_z_m: com[2],
            zmp_x_m: zmp[0],
            zmp_y_m: zmp[1],
            ref_x_m: reference[0],
            ref_y_m: reference[1],
            walking: status.walking,
            double_support: status.double_support,
        })
    }
}

impl WalkUpdater {
    pub fn new(
        name: String,
        dt_s: f64,
        handoff: Arc<Handoff>,
        active: ActiveControllerSet,
        record_sender: Option<Sender<TickRecord>>,
    ) -> Self {
        Self {
            name,
            dt_s,
            handoff,
            active,
            num_published_events: 0,
            record_sender,
        }
    }
}

impl Updater for WalkUpdater {
    fn update(&mut self, tick: u64) {
        // ---- HANDOFF ----

        let pending = self.handoff.take();

        if let Some(plan) = pending.plan {
            self.active.install(plan);
            self.num_published_events = 0;
        }
        if let Some(samples) = pending.waist_rotation {
            trace!("New waist rotation trajectory of {} samples", samples.len());
            self.active.waist_rotation.set_new_trajectory(samples);
        }
        if let Some(samples) = pending.waist_altitude {
            trace!("New waist altitude trajectory of {} samples", samples.len());
            self.active.waist_altitude.set_new_trajectory(samples);
        }

        // ---- CONTROL ----

        self.active.update(tick);

        // ---- STATUS ----

        let published = self.num_published_events;
        let events = self
            .active
            .feet_ctrl
            .as_ref()
            .map_or(&[][..], |g| &g.events()[published.min(g.events().len())..]);
        let num_events = events.len();

        self.handoff.publish(self.active.status(tick), events);
        self.num_published_events += num_events;

        if let Some(sender) = self.record_sender.as_ref() {
            if let Some(record) = self.active.record(tick, self.dt_s) {
                sender.send(record).ok();
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
