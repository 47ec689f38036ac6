//! Handoff of new controllers from the control thread to the tick thread
//!
//! The control thread builds a complete set of controllers off-lock, then
//! places it in a single slot. The tick thread takes the slot at the start of
//! its next tick and publishes the walking status at the end of it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    mem,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    gait::{GaitEvent, GaitStateMachine},
    task_if::FrameSample,
    zmp_ctrl::ZmpPreviewController,
};

use super::WalkStatus;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controllers of a new plan, replacing the active ones as a whole.
#[derive(Debug)]
pub(super) struct PlanInstall {
    pub com_ctrl: ZmpPreviewController,
    pub gait: Option<GaitStateMachine>,
    pub waist_rotation: Option<Vec<FrameSample>>,
}

/// Everything waiting to be taken by the tick thread.
#[derive(Debug, Default)]
pub(super) struct Pending {
    pub plan: Option<PlanInstall>,
    pub waist_rotation: Option<Vec<FrameSample>>,
    pub waist_altitude: Option<Vec<FrameSample>>,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Pending,
    status: WalkStatus,
    events: Vec<GaitEvent>,
}

#[derive(Debug, Default)]
pub(super) struct Handoff {
    slot: Mutex<Slot>,
    cond: Condvar,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WaitOutcome {
    Reached,
    TimedOut,
    Stopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Handoff {
    /// Place a new plan, replacing any plan not yet taken, and publish the
    /// status the plan starts with.
    pub fn submit_plan(&self, plan: PlanInstall, provisional: WalkStatus) {
        let mut slot = self.lock();
        slot.pending.plan = Some(plan);
        slot.status = provisional;
        slot.events.clear();
        drop(slot);

        self.cond.notify_all();
    }

    pub fn submit_waist_rotation(&self, samples: Vec<FrameSample>) {
        self.lock().pending.waist_rotation = Some(samples);
    }

    pub fn submit_waist_altitude(&self, samples: Vec<FrameSample>) {
        self.lock().pending.waist_altitude = Some(samples);
    }

    /// Take everything pending, leaving the slot empty.
    pub fn take(&self) -> Pending {
        mem::take(&mut self.lock().pending)
    }

    /// Publish the status after a tick, along with the gait events it raised.
    ///
    /// Skipped while a plan is pending, as the status would describe the plan
    /// it replaces.
    pub fn publish(&self, status: WalkStatus, events: &[GaitEvent]) {
        let mut slot = self.lock();
        if slot.pending.plan.is_some() {
            return;
        }

        slot.status = status;
        slot.events.extend_from_slice(events);
        drop(slot);

        self.cond.notify_all();
    }

    pub fn status(&self) -> WalkStatus {
        self.lock().status
    }

    /// Gait events of the current plan.
    pub fn events(&self) -> Vec<GaitEvent> {
        self.lock().events.clone()
    }

    /// Block until `pred` holds for the published status.
    ///
    /// The status is checked at least every `period`, and `alive` is polled at
    /// the same rate so that waiters return if the tick thread stops.
    pub fn wait_until<P, A>(
        &self,
        pred: P,
        period: Duration,
        timeout: Option<Duration>,
        alive: A,
    ) -> WaitOutcome
    where
        P: Fn(&WalkStatus) -> bool,
        A: Fn() -> bool,
    {
        let start = Instant::now();
        let mut slot = self.lock();

        loop {
            if pred(&slot.status) {
                return WaitOutcome::Reached;
            }
            if !alive() {
                return WaitOutcome::Stopped;
            }

            let wait = match timeout {
                Some(t) => match t.checked_sub(start.elapsed()) {
                    Some(left) => left.min(period),
                    None => return WaitOutcome::TimedOut,
                },
                None => period,
            };

            slot = match self.cond.wait_timeout(slot, wait) {
                Ok((s, _)) => s,
                Err(e) => e.into_inner().0,
            };
        }
    }

    fn lock(&self) -> MutexGuard<Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::footstep::Foot;
    use std::{sync::Arc, thread};

    #[test]
    fn test_publish_and_wait() {
        let handoff = Arc::new(Handoff::default());
        let period = Duration::from_millis(1);

        // Already reached
        assert_eq!(
            handoff.wait_until(|s| !s.walking, period, None, || true),
            WaitOutcome::Reached
        );

        handoff.publish(
            WalkStatus {
                walking: true,
                swinging: Some(Foot::Left),
                ..Default::default()
            },
            &[GaitEvent::LiftOff {
                foot: Foot::Left,
                step: 0,
            }],
        );
        assert_eq!(
            handoff.wait_until(|s| !s.walking, period, Some(Duration::from_millis(20)), || true),
            WaitOutcome::TimedOut
        );
        assert_eq!(
            handoff.wait_until(|s| !s.walking, period, None, || false),
            WaitOutcome::Stopped
        );

        let publisher = {
            let handoff = handoff.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                handoff.publish(WalkStatus::default(), &[GaitEvent::Finished]);
            })
        };

        assert_eq!(
            handoff.wait_until(|s| !s.walking, period, Some(Duration::from_secs(10)), || true),
            WaitOutcome::Reached
        );
        publisher.join().unwrap();

        assert_eq!(handoff.events().len(), 2);
        assert!(handoff.take().plan.is_none());
    }

    #[test]
    fn test_waist_overrides() {
        let handoff = Handoff::default();
        handoff.submit_waist_altitude(vec![FrameSample::at_rest(nalgebra::Isometry3::identity())]);

        let pending = handoff.take();
        assert_eq!(pending.waist_altitude.map(|s| s.len()), Some(1));
        assert!(pending.waist_rotation.is_none());

        // Taken once
        assert!(handoff.take().waist_altitude.is_none());
    }
}
