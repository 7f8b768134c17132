//! Geometry kernel for rays in the arena
//!
//! Pure functions over arena-centred points. Angles are in degrees, with
//! directions built as `(cos θ, sin θ)`.

use glam::Vec2;

use crate::consts::RAY_EPSILON;
use crate::normalize_degrees;

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Heading from `a` to `b` in degrees, in (-180, 180]
pub fn angle_degrees(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    // atan2 can return exactly -180 for a negative-zero y
    normalize_degrees(d.y.atan2(d.x).to_degrees())
}

/// Unit direction for a heading in degrees
#[inline]
pub fn direction_from_degrees(deg: f32) -> Vec2 {
    let rad = deg.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Unsigned angle between two vectors in degrees, in [0, 180]
///
/// Returns `None` when either vector has zero length.
pub fn vector_angle_degrees(u: Vec2, v: Vec2) -> Option<f32> {
    let mags = u.length() * v.length();
    if mags <= f32::EPSILON {
        return None;
    }
    let cos = (u.dot(v) / mags).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// First intersection of a ray with the arena circle (centred at the origin)
///
/// Solves `|origin + t·dir|² = radius²` and returns the nearest root with
/// `t > RAY_EPSILON`, or `None` when the ray misses or only touches behind.
pub fn ray_circle_intersection(origin: Vec2, direction: Vec2, radius: f32) -> Option<Vec2> {
    let a = direction.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * origin.dot(direction);
    let c = origin.length_squared() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = (-b - sqrt_d) / (2.0 * a);
    let t2 = (-b + sqrt_d) / (2.0 * a);

    let t = if t1 > RAY_EPSILON {
        t1
    } else if t2 > RAY_EPSILON {
        t2
    } else {
        return None;
    };

    Some(origin + direction * t)
}

/// Shortest distance from `point` to the segment `start..end`
pub fn point_to_segment_distance(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let seg = end - start;
    let to_point = point - start;
    let len_sq = seg.length_squared();

    if len_sq == 0.0 {
        return to_point.length();
    }

    let t = (to_point.dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = start + seg * t;
    (point - closest).length()
}
