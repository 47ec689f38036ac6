//! # ZMP reference builder
//!
//! Converts a footstep plan into the per-tick Zero Moment Point reference
//! tracked by the preview controller. The ZMP is held on each support foot
//! for one step, with half a step on the initial foot and half a step between
//! the final two feet.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use crate::error::PlanningError;
use crate::footstep::{FootstepPlan, GaitTiming};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One ZMP sample per tick, in the ground plane frame.
pub type ZmpReference = Vec<Vector2<f64>>;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the ZMP reference of a footstep plan.
///
/// The reference lasts `(plan.len() - 1) * step_time` to within one tick.
pub fn build_zmp_reference(
    plan: &FootstepPlan,
    timing: &GaitTiming,
) -> Result<ZmpReference, PlanningError> {
    let placements = plan.placements();
    if placements.len() < 2 {
        return Err(PlanningError::PathTooShort(placements.len()));
    }

    let step_time_s = timing.step_time_s();
    let dt_s = timing.dt_s();

    // Each support ends on a tick counted from the start of the plan, so that
    // rounding does not accumulate when the step is not a multiple of the tick
    let n = placements.len();
    let end_of = |k: usize| util::time::ticks_in((k as f64 + 0.5) * step_time_s, dt_s);
    let total = util::time::ticks_in((n - 1) as f64 * step_time_s, dt_s);
    let mut zmp_ref = Vec::with_capacity(total);

    // Pre-roll on the first support foot, then one step per inner placement
    for (k, p) in placements[..n - 1].iter().enumerate() {
        zmp_ref.resize(end_of(k), p.position());
    }

    // Settle between the last two feet
    let end = (placements[n - 2].position() + placements[n - 1].position()) / 2.0;
    zmp_ref.resize(total, end);

    Ok(zmp_ref)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::footstep::{Foot, PlanarPose, StepParams};

    fn plan() -> FootstepPlan {
        FootstepPlan::new(
            vec![
                PlanarPose::new(0.0, 0.05, 0.0),
                PlanarPose::new(0.0, -0.05, 0.0),
                PlanarPose::new(0.1, 0.05, 0.0),
                PlanarPose::new(0.2, -0.05, 0.0),
                PlanarPose::new(0.2, 0.05, 0.0),
            ],
            Foot::Left,
        )
        .unwrap()
    }

    #[test]
    fn test_reference_shape() {
        let timing = StepParams::default().timing(0.01).unwrap();
        let r = build_zmp_reference(&plan(), &timing).unwrap();

        // (len - 1) * step_time / dt
        assert_eq!(r.len(), 400);

        assert_eq!(r[0], Vector2::new(0.0, 0.05));
        assert_eq!(r[49], Vector2::new(0.0, 0.05));
        assert_eq!(r[50], Vector2::new(0.0, -0.05));
        assert_eq!(r[149], Vector2::new(0.0, -0.05));
        assert_eq!(r[150], Vector2::new(0.1, 0.05));
        assert_eq!(r[250], Vector2::new(0.2, -0.05));
        assert_eq!(r[349], Vector2::new(0.2, -0.05));
        assert_eq!(r[350], Vector2::new(0.2, 0.0));
        assert_eq!(r[399], Vector2::new(0.2, 0.0));
    }

    #[test]
    fn test_reference_length_property() {
        let timing = crate::footstep::GaitTiming::new(0.7, 0.8, 0.005).unwrap();
        let p = plan();
        let r = build_zmp_reference(&p, &timing).unwrap();

        let expected = (p.len() - 1) as f64 * 0.7 / 0.005;
        assert!((r.len() as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_reference_follows_gait_clock() {
        // A step which is not a whole number of ticks over many steps
        let timing = crate::footstep::GaitTiming::new(1.005, 0.9, 0.01).unwrap();
        let placements = (0..42)
            .map(|i| {
                let y = if i % 2 == 0 { 0.05 } else { -0.05 };
                PlanarPose::new(0.1 * (i / 2) as f64, y, 0.0)
            })
            .collect();
        let p = FootstepPlan::new(placements, Foot::Left).unwrap();
        let r = build_zmp_reference(&p, &timing).unwrap();

        let expected = 41.0 * 1.005 / 0.01;
        assert!((r.len() as f64 - expected).abs() <= 1.0, "{} ticks", r.len());

        // Every support switch lies within a tick of (k + 0.5) * step_time
        let mut k = 0;
        for i in 1..r.len() {
            if r[i] != r[i - 1] {
                let switch = (k as f64 + 0.5) * 1.005 / 0.01;
                assert!((i as f64 - switch).abs() <= 1.0, "switch {} at tick {}", k, i);
                k += 1;
            }
        }
        assert_eq!(k, 41);
    }
}
