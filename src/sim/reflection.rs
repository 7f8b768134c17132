//! Reflection rules for a single hop
//!
//! Each rule is a pure decision over positions and the marker's aim, plus the
//! ray the presentation layer should draw for it. Two shapes of rule coexist:
//! - aiming at a target uses a flat angular threshold
//! - reflecting an incoming beam uses a cone measured 90° off the beam

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{point_to_segment_distance, ray_circle_intersection, vector_angle_degrees};
use super::state::{RayIntent, RayPath};
use crate::consts::*;

/// Acceptance thresholds for hop checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Max angle between aim and target direction (exclusive)
    pub aim_deg: f32,
    /// Max distance between the last leg and the teleporter (exclusive)
    pub pass_through: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            aim_deg: AIM_TOLERANCE_DEG,
            pass_through: PASS_THROUGH_TOLERANCE,
        }
    }
}

/// Result of evaluating one hop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopOutcome {
    pub success: bool,
    /// Counts toward the chain's reflection tally
    pub is_reflection: bool,
    /// Ray to draw, if any
    pub ray: Option<RayPath>,
    /// Measured angle or distance behind the decision (for logs/debug)
    pub measured: Option<f32>,
}

/// Flat aim check. An angle within `ANGLE_EPSILON_DEG` of the tolerance is on
/// the boundary and misses.
#[inline]
pub fn aim_within_tolerance(angle_deg: f32, tolerance_deg: f32) -> bool {
    angle_deg < tolerance_deg - ANGLE_EPSILON_DEG
}

/// Deflection of the aim relative to an incoming beam, offset by 90°
///
/// `None` if the marker sits on the beam source or has no aim.
pub fn deflection_degrees(incoming: Vec2, aim: Vec2) -> Option<f32> {
    vector_angle_degrees(incoming, aim).map(|angle| angle - REFLECTION_OFFSET_DEG)
}

/// Reflection cone check, inclusive on both edges. Deflections within
/// `ANGLE_EPSILON_DEG` of an edge are on it.
#[inline]
pub fn deflection_within_cone(deflection_deg: f32) -> bool {
    (REFLECTION_CONE_MIN_DEG - ANGLE_EPSILON_DEG..=REFLECTION_CONE_MAX_DEG + ANGLE_EPSILON_DEG)
        .contains(&deflection_deg)
}

/// Pass-through check. A distance within `DISTANCE_EPSILON` of the tolerance
/// is on the boundary and misses.
#[inline]
pub fn grazes(distance: f32, tolerance: f32) -> bool {
    distance < tolerance - DISTANCE_EPSILON
}

/// Where a ray from `origin` along `aim` leaves the arena
///
/// Falls back to one arena radius along the aim when the ray never meets the
/// wall (origin already outside and heading away).
pub fn ray_to_wall(origin: Vec2, aim: Vec2, arena_radius: f32) -> Vec2 {
    ray_circle_intersection(origin, aim, arena_radius).unwrap_or(origin + aim * arena_radius)
}

/// Beam reaching an automatic participant: always reflected
pub fn relay_reflection(from: Vec2, to: Vec2) -> HopOutcome {
    HopOutcome {
        success: true,
        is_reflection: true,
        ray: Some(RayPath::new(from, to, RayIntent::Beam)),
        measured: None,
    }
}

/// Beam reaching the controlled marker: the aim must sit inside the reflection cone
pub fn controlled_reflection(from: Vec2, marker: Vec2, aim: Vec2) -> HopOutcome {
    let deflection = deflection_degrees(marker - from, aim);
    HopOutcome {
        success: deflection.is_some_and(deflection_within_cone),
        is_reflection: true,
        ray: Some(RayPath::new(from, marker, RayIntent::Beam)),
        measured: deflection,
    }
}

/// Controlled marker sending the beam on: the aim must point at the target
pub fn directional_hop(
    marker: Vec2,
    aim: Vec2,
    target: Vec2,
    tolerances: &Tolerances,
    arena_radius: f32,
) -> HopOutcome {
    let angle = vector_angle_degrees(aim, target - marker);
    let success = angle.is_some_and(|a| aim_within_tolerance(a, tolerances.aim_deg));

    let ray = if success {
        Some(RayPath::new(marker, target, RayIntent::Hit))
    } else {
        ray_circle_intersection(marker, aim, arena_radius)
            .map(|exit| RayPath::new(marker, exit, RayIntent::Miss))
    };

    HopOutcome {
        success,
        is_reflection: true,
        ray,
        measured: angle,
    }
}

/// Last leg from an automatic participant into the portal
pub fn final_leg(
    from: Vec2,
    portal: Vec2,
    pass_through: Vec2,
    tolerances: &Tolerances,
) -> HopOutcome {
    let distance = point_to_segment_distance(pass_through, from, portal);
    HopOutcome {
        success: grazes(distance, tolerances.pass_through),
        is_reflection: false,
        ray: Some(RayPath::new(from, portal, RayIntent::Beam)),
        measured: Some(distance),
    }
}

/// Last leg fired by the controlled marker
///
/// The marker's ray runs to the arena wall; it must graze the teleporter on
/// the way. A hit is drawn into the portal, a miss out to the wall.
pub fn controlled_final_leg(
    marker: Vec2,
    aim: Vec2,
    portal: Vec2,
    pass_through: Vec2,
    tolerances: &Tolerances,
    arena_radius: f32,
) -> HopOutcome {
    let Some(exit) = ray_circle_intersection(marker, aim, arena_radius) else {
        return HopOutcome {
            success: false,
            is_reflection: false,
            ray: None,
            measured: None,
        };
    };

    let distance = point_to_segment_distance(pass_through, marker, exit);
    let success = grazes(distance, tolerances.pass_through);
    let ray = if success {
        RayPath::new(marker, portal, RayIntent::Hit)
    } else {
        RayPath::new(marker, exit, RayIntent::Miss)
    };

    HopOutcome {
        success,
        is_reflection: false,
        ray: Some(ray),
        measured: Some(distance),
    }
}
