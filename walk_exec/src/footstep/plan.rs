//! Footstep plan generation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector2;

use super::{Foot, FootstepPlan, PlanarPose, StepParams};
use crate::error::PlanningError;
use util::maths::bounded_angles;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest number of waypoints of a straight path.
pub const MAX_PATH_POINTS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Place footsteps around a path followed by the centre of the feet.
///
/// A footstep is emitted each time the distance travelled along the path
/// exceeds the step length, placed at the waypoint starting that interval and
/// shifted sideways towards the foot's side. The plan is closed by two
/// placements either side of the final waypoint, the next foot first.
pub fn plan_from_path(
    path: &[PlanarPose],
    params: &StepParams,
    left_start: PlanarPose,
    right_start: PlanarPose,
) -> Result<FootstepPlan, PlanningError> {
    if path.len() < 2 {
        return Err(PlanningError::PathTooShort(path.len()));
    }
    if let Some(i) = path.iter().position(|p| !p.is_finite()) {
        return Err(PlanningError::NonFiniteWaypoint(i));
    }
    params.check_geometry()?;

    let mut placements = match params.start_foot {
        Foot::Left => vec![left_start, right_start],
        Foot::Right => vec![right_start, left_start],
    };
    let mut next_foot = params.start_foot;

    let mut sum_distance_m = 0.0;
    for pair in path.windows(2) {
        sum_distance_m += (pair[1].position() - pair[0].position()).norm();

        if sum_distance_m > params.length_m {
            placements.push(pair[0].offset_left(next_foot.side_sign() * params.side_m));
            sum_distance_m = 0.0;
            next_foot = next_foot.other();
        }
    }

    // Close the plan with both feet side by side on the last waypoint. Indexing
    // is safe as the length was checked above.
    let last = path[path.len() - 1];
    placements.push(last.offset_left(next_foot.side_sign() * params.side_m));
    placements.push(last.offset_left(next_foot.other().side_sign() * params.side_m));

    debug!(
        "Planned {} footsteps over a {} waypoint path",
        placements.len(),
        path.len()
    );

    FootstepPlan::new(placements, params.start_foot)
}

/// Straight path between two points of the plane.
///
/// The path holds `floor(length / tolerance)` evenly spaced waypoints (at
/// least 2) including both ends, and at most [`MAX_PATH_POINTS`]. The heading
/// of every waypoint is `heading`, or the direction of travel if not given.
pub fn straight_path(
    start: Vector2<f64>,
    end: Vector2<f64>,
    heading: Option<f64>,
    tolerance_m: f64,
) -> Result<Vec<PlanarPose>, PlanningError> {
    if !(tolerance_m.is_finite() && tolerance_m > 0.0) {
        return Err(PlanningError::InvalidTolerance(tolerance_m));
    }
    if !(start[0].is_finite() && start[1].is_finite()) {
        return Err(PlanningError::NonFiniteWaypoint(0));
    }
    if !(end[0].is_finite() && end[1].is_finite()) {
        return Err(PlanningError::NonFiniteWaypoint(1));
    }

    let dir = end - start;
    let theta = heading.unwrap_or_else(|| dir[1].atan2(dir[0]));

    let num_points = (dir.norm() / tolerance_m).floor();
    if num_points > MAX_PATH_POINTS as f64 {
        return Err(PlanningError::PathTooLong(num_points, MAX_PATH_POINTS));
    }
    let num_points = (num_points as usize).max(2);

    Ok((0..num_points)
        .map(|i| {
            let s = i as f64 / (num_points - 1) as f64;
            let p = start + dir * s;
            PlanarPose::new(p[0], p[1], theta)
        })
        .collect())
}

/// Plan a single step of one foot, relative to the centre of both feet.
///
/// The placement is `length` ahead of the centre along its heading and
/// `side_length` towards the moving foot's side. The resulting plan is
/// `[moving foot start, other foot start, placement]`.
pub fn plan_one_foot(
    foot: Foot,
    length_m: f64,
    side_length_m: f64,
    angle: Option<f64>,
    left_start: PlanarPose,
    right_start: PlanarPose,
) -> Result<FootstepPlan, PlanningError> {
    let central = center_of_feet(&left_start, &right_start);

    let heading = angle.unwrap_or(central.theta);
    let turns = angle.map_or(false, |a| {
        let (a0, a1) = bounded_angles(central.theta, a);
        (a1 - a0).abs() > std::f64::EPSILON
    });
    if length_m == 0.0 && side_length_m == 0.0 && !turns {
        return Err(PlanningError::ZeroLengthStep);
    }

    let (s, c) = central.theta.sin_cos();
    let forward = Vector2::new(c, s);
    let left = Vector2::new(-s, c);
    let pos = central.position() + forward * length_m + left * (foot.side_sign() * side_length_m);

    let (moving, other) = match foot {
        Foot::Left => (left_start, right_start),
        Foot::Right => (right_start, left_start),
    };

    FootstepPlan::new(
        vec![moving, other, PlanarPose::new(pos[0], pos[1], heading)],
        foot,
    )
}

/// Mean pose of both feet, with the heading averaged along the shortest arc.
pub fn center_of_feet(left: &PlanarPose, right: &PlanarPose) -> PlanarPose {
    let (a0, a1) = bounded_angles(left.theta, right.theta);

    PlanarPose::new(
        (left.x + right.x) / 2.0,
        (left.y + right.y) / 2.0,
        (a0 + a1) / 2.0,
    )
}
