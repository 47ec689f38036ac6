//! Swing foot and waist trajectory generation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use super::{PiecewisePolynomial, TrajError};
use crate::footstep::{FootstepPlan, GaitTiming, PlanarPose};
use crate::task_if::{FrameSample, Twist};
use util::maths::bounded_angles;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Samples of one single support phase of the swinging foot.
pub type SwingSegment = Vec<FrameSample>;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the swing trajectories of a plan, one per footstep after the first
/// two.
///
/// Segment `i` moves the foot from placement `i` to placement `i + 2` over the
/// single support time, rising to `step_height_m` at mid-swing. Samples are
/// mapped from the plane frame to the world frame by `plane`.
pub fn foot_trajectories(
    plan: &FootstepPlan,
    timing: &GaitTiming,
    step_height_m: f64,
    plane: &Isometry3<f64>,
) -> Result<Vec<SwingSegment>, TrajError> {
    let t_ss = timing.single_support_s();
    let times = sample_times(t_ss, timing.dt_s());

    let z = PiecewisePolynomial::new(
        &[0.0, t_ss / 2.0, t_ss],
        &[vec![0.0, 0.0, 0.0], vec![step_height_m, 0.0], vec![0.0, 0.0, 0.0]],
    )?;

    plan.placements()
        .windows(3)
        .map(|w| -> Result<SwingSegment, TrajError> {
            let (from, to) = (&w[0], &w[2]);
            let (a_start, a_end) = bounded_angles(from.theta, to.theta);

            let x = rest_to_rest(from.x, to.x, t_ss)?;
            let y = rest_to_rest(from.y, to.y, t_ss)?;
            let a = rest_to_rest(a_start, a_end, t_ss)?;

            Ok(times
                .iter()
                .map(|t| {
                    frame_sample(
                        plane,
                        x.eval2(*t),
                        y.eval2(*t),
                        z.eval2(*t),
                        a.eval2(*t),
                    )
                })
                .collect())
        })
        .collect()
}

/// Build the waist heading trajectory of a plan.
///
/// The waist turns from the heading of each placement to the next over one
/// step time. The samples only carry a rotation, and consecutive steps share
/// their boundary sample.
pub fn waist_trajectory(
    plan: &FootstepPlan,
    timing: &GaitTiming,
    plane: &Isometry3<f64>,
) -> Result<Vec<FrameSample>, TrajError> {
    let times = sample_times(timing.step_time_s(), timing.dt_s());
    let mut samples = Vec::with_capacity(times.len() * plan.len());

    for (i, w) in plan.placements().windows(2).enumerate() {
        let (a_start, a_end) = bounded_angles(w[0].theta, w[1].theta);
        let a = rest_to_rest(a_start, a_end, timing.step_time_s())?;

        let skip = if i == 0 { 0 } else { 1 };
        samples.extend(times.iter().skip(skip).map(|t| {
            frame_sample(plane, (0.0, 0.0, 0.0), (0.0, 0.0, 0.0), (0.0, 0.0, 0.0), a.eval2(*t))
        }));
    }

    Ok(samples)
}

/// Waist sample holding the plane heading of a placement.
pub fn waist_sample(pose: &PlanarPose, plane: &Isometry3<f64>) -> FrameSample {
    frame_sample(
        plane,
        (0.0, 0.0, 0.0),
        (0.0, 0.0, 0.0),
        (0.0, 0.0, 0.0),
        (pose.theta, 0.0, 0.0),
    )
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// `n + 1` sample times over `[0, duration]` with exact end points, where `n`
/// is the number of ticks in the duration.
fn sample_times(duration_s: f64, dt_s: f64) -> Vec<f64> {
    let n = util::time::ticks_in(duration_s, dt_s).max(1);
    (0..=n).map(|j| j as f64 * duration_s / n as f64).collect()
}

/// Quintic from `v0` to `v1` with zero velocity and acceleration at both ends.
fn rest_to_rest(v0: f64, v1: f64, duration_s: f64) -> Result<PiecewisePolynomial, TrajError> {
    PiecewisePolynomial::new(
        &[0.0, duration_s],
        &[vec![v0, 0.0, 0.0], vec![v1, 0.0, 0.0]],
    )
}

/// Assemble a world frame sample from per-axis (value, rate, acceleration).
fn frame_sample(
    plane: &Isometry3<f64>,
    x: (f64, f64, f64),
    y: (f64, f64, f64),
    z: (f64, f64, f64),
    a: (f64, f64, f64),
) -> FrameSample {
    let pose = Isometry3::from_parts(
        Translation3::new(x.0, y.0, z.0),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), a.0),
    );
    let vel = Twist {
        angular: Vector3::new(0.0, 0.0, a.1),
        linear: Vector3::new(x.1, y.1, z.1),
    };
    let acc = Twist {
        angular: Vector3::new(0.0, 0.0, a.2),
        linear: Vector3::new(x.2, y.2, z.2),
    };

    FrameSample {
        pose: plane * pose,
        vel: vel.rotated(&plane.rotation),
        acc: acc.rotated(&plane.rotation),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::footstep::{Foot, StepParams};

    fn plan() -> FootstepPlan {
        FootstepPlan::new(
            vec![
                PlanarPose::new(0.0, 0.05, 0.0),
                PlanarPose::new(0.0, -0.05, 0.0),
                PlanarPose::new(0.1, 0.05, 0.2),
                PlanarPose::new(0.2, -0.05, 6.2),
                PlanarPose::new(0.2, 0.05, 6.2),
            ],
            Foot::Left,
        )
        .unwrap()
    }

    fn timing() -> GaitTiming {
        StepParams::default().timing(0.01).unwrap()
    }

    fn turning_plan() -> FootstepPlan {
        FootstepPlan::new(
            vec![
                PlanarPose::new(0.0, -0.05, 0.0),
                PlanarPose::new(0.0, 0.05, 0.0),
                PlanarPose::new(0.08, -0.04, 0.5),
                PlanarPose::new(0.1, 0.1, 1.2),
                PlanarPose::new(0.05, 0.12, 2.9),
                PlanarPose::new(-0.02, 0.2, -3.0),
            ],
            Foot::Right,
        )
        .unwrap()
    }

    #[test]
    fn test_foot_segments() {
        let tilted = Isometry3::from_parts(
            Translation3::new(1.0, -2.0, 0.3),
            UnitQuaternion::from_euler_angles(0.1, -0.2, 2.0),
        );
        let cases = vec![
            (plan(), timing(), Isometry3::identity()),
            (turning_plan(), GaitTiming::new(1.0, 1.0, 0.01).unwrap(), Isometry3::identity()),
            (turning_plan(), GaitTiming::new(0.6, 0.8, 0.005).unwrap(), tilted),
            (plan(), GaitTiming::new(1.0, 1.0, 0.01).unwrap(), tilted),
        ];

        for (plan, timing, plane) in cases.iter() {
            let segs = foot_trajectories(plan, timing, 0.02, plane).unwrap();
            assert_eq!(segs.len(), plan.len() - 2);

            let n = util::time::ticks_in(timing.single_support_s(), timing.dt_s());

            for (i, seg) in segs.iter().enumerate() {
                assert_eq!(seg.len(), n + 1);

                let from = plane * plan.placements()[i].to_isometry(0.0);
                let to = plane * plan.placements()[i + 2].to_isometry(0.0);
                let first = seg.first().unwrap();
                let last = seg.last().unwrap();

                assert!((first.pose.translation.vector - from.translation.vector).norm() < 1e-12);
                assert!(first.pose.rotation.angle_to(&from.rotation) < 1e-9);
                assert!((last.pose.translation.vector - to.translation.vector).norm() < 1e-9);
                assert!(last.pose.rotation.angle_to(&to.rotation) < 1e-9);

                // Rest at both ends of every segment
                for s in [first, last].iter() {
                    assert!(s.vel.norm() < 1e-9, "segment {} vel {:?}", i, s.vel);
                    assert!(s.acc.norm() < 1e-9, "segment {} acc {:?}", i, s.acc);
                }

                // Apex at mid-swing, measured from the plane
                let height = |s: &FrameSample| (plane.inverse() * s.pose).translation.vector[2];
                assert!((height(&seg[n / 2]) - 0.02).abs() < 1e-12);
                assert!(seg.iter().all(|s| height(s) <= 0.02 + 1e-12));
            }
        }
    }

    #[test]
    fn test_foot_heading_short_arc() {
        let plane = Isometry3::identity();
        let segs = foot_trajectories(&plan(), &timing(), 0.02, &plane).unwrap();

        // Segment 1 turns from 0 to 6.2 rad, which is a short turn backwards
        let seg = &segs[1];
        for w in seg.windows(2) {
            let ang = w[0].pose.rotation.angle_to(&w[1].pose.rotation);
            assert!(ang < 0.01);
        }
        let end = seg.last().unwrap().pose.rotation;
        let target = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 6.2);
        assert!(end.angle_to(&target) < 1e-9);
    }

    #[test]
    fn test_plane_mapping() {
        let plane = Isometry3::from_parts(
            Translation3::new(1.0, 2.0, 0.5),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
        );
        let segs = foot_trajectories(&plan(), &timing(), 0.02, &plane).unwrap();

        let last = segs[0].last().unwrap();
        // Placement (0.1, 0.05) rotated by 90 degrees then shifted
        assert!((last.pose.translation.vector - Vector3::new(0.95, 2.1, 0.5)).norm() < 1e-9);

        // Mid-swing velocity along plane x maps to world y
        let mid = &segs[0][45];
        assert!(mid.vel.linear[0].abs() < 1e-9);
        assert!(mid.vel.linear[1] > 0.0);
    }

    #[test]
    fn test_waist_trajectory() {
        let plane = Isometry3::identity();
        let w = waist_trajectory(&plan(), &timing(), &plane).unwrap();

        // 4 steps of 100 intervals with shared boundaries
        assert_eq!(w.len(), 4 * 100 + 1);

        let last = w.last().unwrap();
        let target = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 6.2);
        assert!(last.pose.rotation.angle_to(&target) < 1e-9);
        assert!(last.vel.norm() < 1e-9);

        for pair in w.windows(2) {
            assert!(pair[0].pose.rotation.angle_to(&pair[1].pose.rotation) < 0.01);
        }
    }
}
