//! # Trajectory tracking adapter
//!
//! Feeds a task one sample of a trajectory per tick, holding the final sample
//! once the trajectory is exhausted.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fmt, sync::Arc};

use crate::task_if::Task;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Forwards a queue of samples to a task, one per tick.
///
/// Owned by the tick thread, new trajectories from the control thread are
/// handed over rather than written in place.
pub struct TrajectoryTracking<S> {
    task: Arc<dyn Task<Sample = S>>,
    samples: Vec<S>,
    cursor: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S> TrajectoryTracking<S> {
    /// Create an idle tracker, which forwards nothing until given a trajectory.
    pub fn new(task: Arc<dyn Task<Sample = S>>) -> Self {
        Self {
            task,
            samples: Vec::new(),
            cursor: 0,
        }
    }

    /// Replace the trajectory and restart from its first sample.
    pub fn set_new_trajectory(&mut self, samples: Vec<S>) {
        self.samples = samples;
        self.cursor = 0;
    }

    /// Forward the current sample to the task and advance.
    pub fn update(&mut self, _tick: u64) {
        let last = match self.samples.len().checked_sub(1) {
            Some(l) => l,
            None => return,
        };

        self.task.update(&self.samples[self.cursor.min(last)]);

        if self.cursor < self.samples.len() {
            self.cursor += 1;
        }
    }

    /// True once every sample has been forwarded at least once.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sample forwarded by the previous update.
    pub fn last_forwarded(&self) -> Option<&S> {
        let last = self.samples.len().checked_sub(1)?;
        self.samples.get(self.cursor.checked_sub(1)?.min(last))
    }

    /// Final sample of the trajectory.
    pub fn end(&self) -> Option<&S> {
        self.samples.last()
    }

    /// The sample which the next update will forward.
    pub fn current(&self) -> Option<&S> {
        let last = self.samples.len().checked_sub(1)?;
        self.samples.get(self.cursor.min(last))
    }
}

impl<S> fmt::Debug for TrajectoryTracking<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrajectoryTracking")
            .field("task", &self.task.name())
            .field("len", &self.samples.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ideal::IdealTask;
    use crate::task_if::PointSample;
    use nalgebra::Vector3;

    fn sample(x: f64) -> PointSample {
        PointSample::at_rest(Vector3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_forwards_then_holds() {
        let task = Arc::new(IdealTask::<PointSample>::detached("test.point"));
        let mut tt = TrajectoryTracking::new(task.clone() as Arc<dyn Task<Sample = PointSample>>);

        // Nothing forwarded while empty
        tt.update(0);
        assert_eq!(task.num_updates(), 0);
        assert!(tt.is_finished());

        tt.set_new_trajectory(vec![sample(1.0), sample(2.0), sample(3.0)]);
        assert!(!tt.is_finished());
        assert_eq!(tt.current(), Some(&sample(1.0)));

        assert_eq!(tt.last_forwarded(), None);
        assert_eq!(tt.end(), Some(&sample(3.0)));

        let mut seen = Vec::new();
        for tick in 0..5 {
            tt.update(tick);
            seen.push(task.last_sample().unwrap().pos[0]);
        }

        assert_eq!(seen, vec![1.0, 2.0, 3.0, 3.0, 3.0]);
        assert!(tt.is_finished());
        assert_eq!(tt.current(), Some(&sample(3.0)));
        assert_eq!(tt.last_forwarded(), Some(&sample(3.0)));
    }

    #[test]
    fn test_replacement_restarts() {
        let task = Arc::new(IdealTask::<PointSample>::detached("test.point"));
        let mut tt = TrajectoryTracking::new(task.clone() as Arc<dyn Task<Sample = PointSample>>);

        tt.set_new_trajectory(vec![sample(1.0), sample(2.0)]);
        tt.update(0);
        tt.set_new_trajectory(vec![sample(5.0), sample(6.0)]);
        tt.update(1);

        assert_eq!(task.last_sample().unwrap().pos[0], 5.0);
        assert_eq!(tt.len(), 2);
    }
}
