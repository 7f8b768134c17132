//! Circular arena bounds and the numbered portal ring

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::PORTAL_COUNT;
use crate::{cartesian_to_polar, polar_to_cartesian};

/// The circular play area, centred on the boss at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Wall radius
    pub radius: f32,
    /// Clearance kept between a participant's centre and the wall
    pub margin: f32,
}

impl Arena {
    pub fn new(radius: f32, margin: f32) -> Self {
        Self { radius, margin }
    }

    /// Furthest a participant may stand from the centre
    #[inline]
    pub fn usable_radius(&self) -> f32 {
        self.radius - self.margin
    }

    /// Pull a position back inside the usable radius, keeping its bearing
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        let max = self.usable_radius();
        let (dist, theta) = cartesian_to_polar(pos);
        if dist > max {
            polar_to_cartesian(max, theta)
        } else {
            pos
        }
    }
}

/// One of the eight numbered portal markers (1-8, clockwise from the top)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortalIndex(u8);

impl PortalIndex {
    /// Portal numbers run 1..=8; anything else is rejected
    pub fn new(number: u8) -> Option<Self> {
        (1..=PORTAL_COUNT).contains(&number).then_some(Self(number))
    }

    /// Uniform pick over the eight portals
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(1..=PORTAL_COUNT))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Bearing in degrees. Portal 1 sits at -90° (top of the screen, y down),
    /// each following portal 45° further round.
    pub fn bearing_degrees(self) -> f32 {
        (self.0 as f32 - 1.0) * 45.0 - 90.0
    }

    /// Position on a ring of the given radius
    pub fn position(self, ring_radius: f32) -> Vec2 {
        polar_to_cartesian(ring_radius, self.bearing_degrees().to_radians())
    }

    pub fn all() -> impl Iterator<Item = PortalIndex> {
        (1..=PORTAL_COUNT).map(PortalIndex)
    }
}
