//! Star Relay - A circular arena reflection minigame
//!
//! Core modules:
//! - `sim`: Deterministic game core (geometry, reflection rules, relay chain, timers)
//! - `platform`: Input/render seams toward the browser or native host
//! - `settings`: Data-driven tolerances, radii and timings
//! - `web`: wasm-bindgen facade (wasm32 only)

pub mod platform;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use platform::{ControlSample, InputSource, LogSink, RenderEvent, RenderSink};
pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions
    pub const ARENA_RADIUS: f32 = 300.0;
    /// Marker half-size kept clear of the arena wall
    pub const MARKER_MARGIN: f32 = 20.0;
    /// Numbered portal markers sit just outside the arena wall
    pub const PORTAL_RING_RADIUS: f32 = 320.0;
    pub const PORTAL_COUNT: u8 = 8;

    /// Directional hop: aim must be strictly within this many degrees of the target
    pub const AIM_TOLERANCE_DEG: f32 = 15.0;
    /// Final leg: ray must pass strictly closer than this to the teleporter
    pub const PASS_THROUGH_TOLERANCE: f32 = 15.0;
    /// Reflection cone: deflection = angle(incoming, aim) - offset, accepted in [min, max]
    pub const REFLECTION_OFFSET_DEG: f32 = 90.0;
    pub const REFLECTION_CONE_MIN_DEG: f32 = 0.0;
    pub const REFLECTION_CONE_MAX_DEG: f32 = 90.0;

    /// Slack applied at every angular boundary. Computed angles land within this of
    /// the exact value; anything that close counts as on the boundary.
    pub const ANGLE_EPSILON_DEG: f32 = 1e-3;
    /// Slack applied at the pass-through boundary
    pub const DISTANCE_EPSILON: f32 = 1e-3;

    /// Ray/circle roots at or below this are treated as behind the origin
    pub const RAY_EPSILON: f32 = 0.01;

    /// Countdown defaults
    pub const COUNTDOWN_TICKS: u32 = 5;
    pub const COUNTDOWN_INTERVAL_MS: u32 = 1000;

    /// Marker movement per frame per held key
    pub const MARKER_SPEED: f32 = 3.0;

    /// Non-controlled role offsets (arena units)
    pub const NAMED_DISTANCE: f32 = 200.0;
    pub const RELAY_SIDE_OFFSET: f32 = 120.0;
    pub const RELAY3_FRONT_OFFSET: f32 = 100.0;
}

/// Normalized angle to (-180, 180] degrees
#[inline]
pub fn normalize_degrees(mut angle: f32) -> f32 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(190.0), -170.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(720.0 + 45.0), 45.0);
    }

    #[test]
    fn test_polar_roundtrip() {
        let p = polar_to_cartesian(120.0, 1.0);
        let (r, theta) = cartesian_to_polar(p);
        assert!((r - 120.0).abs() < 0.001);
        assert!((theta - 1.0).abs() < 0.001);
    }
}
