//! Relay roles, random role binding and derived formation positions
//!
//! One role goes to the controlled marker; every other role stands at a spot
//! derived from the portal so that a perfect relay is always possible.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, PortalIndex};
use crate::consts::*;
use crate::polar_to_cartesian;

/// Relay roles, in chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Targeted first by the boss beam
    Named,
    Relay1,
    Relay2,
    Relay3,
    /// Stands on the last leg; the final beam must graze them
    Teleporter,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Named,
        Role::Relay1,
        Role::Relay2,
        Role::Relay3,
        Role::Teleporter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Named => "named",
            Role::Relay1 => "relay1",
            Role::Relay2 => "relay2",
            Role::Relay3 => "relay3",
            Role::Teleporter => "teleporter",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Role::Named => "Named",
            Role::Relay1 => "First relay",
            Role::Relay2 => "Second relay",
            Role::Relay3 => "Third relay",
            Role::Teleporter => "Teleporter",
        }
    }

    /// Marker colour hint for the presentation layer
    pub fn color(&self) -> &'static str {
        match self {
            Role::Named => "#e74c3c",
            Role::Relay1 => "#3498db",
            Role::Relay2 => "#2ecc71",
            Role::Relay3 => "#f39c12",
            Role::Teleporter => "#9b59b6",
        }
    }

    /// Formation spot for a non-controlled participant, before clamping
    pub fn formation_position(&self, portal: Vec2) -> Vec2 {
        let theta = portal.y.atan2(portal.x);
        match self {
            // Behind the boss, opposite the portal
            Role::Named => -polar_to_cartesian(NAMED_DISTANCE, theta),
            Role::Relay1 => {
                portal + polar_to_cartesian(RELAY_SIDE_OFFSET, theta - std::f32::consts::FRAC_PI_2)
            }
            Role::Relay2 => {
                portal + polar_to_cartesian(RELAY_SIDE_OFFSET, theta + std::f32::consts::FRAC_PI_2)
            }
            // In front of the portal, toward the centre
            Role::Relay3 => portal - polar_to_cartesian(RELAY3_FRONT_OFFSET, theta),
            // Midway along the relay3 -> portal leg
            Role::Teleporter => (Role::Relay3.formation_position(portal) + portal) * 0.5,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who drives a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Controlled,
    NonControlled,
}

/// Exactly one role is bound to the controlled marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub controlled: Role,
}

impl RoleAssignment {
    pub fn new(controlled: Role) -> Self {
        Self { controlled }
    }

    /// Fisher-Yates shuffle of the role set; the first role goes to the marker
    pub fn shuffle<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut roles = Role::ALL;
        roles.shuffle(rng);
        Self::new(roles[0])
    }

    pub fn binding(&self, role: Role) -> Binding {
        if role == self.controlled {
            Binding::Controlled
        } else {
            Binding::NonControlled
        }
    }

    pub fn non_controlled(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(move |r| *r != self.controlled)
    }
}

/// Everything drawn at game start: portal, binding and formation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    pub portal: PortalIndex,
    pub portal_pos: Vec2,
    pub assignment: RoleAssignment,
    /// Positions of non-controlled participants only
    pub positions: BTreeMap<Role, Vec2>,
}

impl Formation {
    /// Derive non-controlled positions for a given portal and binding
    pub fn arrange(
        portal: PortalIndex,
        assignment: RoleAssignment,
        arena: &Arena,
        portal_ring_radius: f32,
    ) -> Self {
        let portal_pos = portal.position(portal_ring_radius);
        let positions = assignment
            .non_controlled()
            .map(|role| (role, arena.clamp(role.formation_position(portal_pos))))
            .collect();

        Self {
            portal,
            portal_pos,
            assignment,
            positions,
        }
    }

    /// Draw a random portal and binding, then arrange the formation
    pub fn random<R: Rng + ?Sized>(rng: &mut R, arena: &Arena, portal_ring_radius: f32) -> Self {
        let portal = PortalIndex::random(rng);
        let assignment = RoleAssignment::shuffle(rng);
        Self::arrange(portal, assignment, arena, portal_ring_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Arena {
        Arena::new(ARENA_RADIUS, MARKER_MARGIN)
    }

    #[test]
    fn test_binding_exactly_one_controlled() {
        let assignment = RoleAssignment::new(Role::Relay2);
        let controlled = Role::ALL
            .iter()
            .filter(|r| assignment.binding(**r) == Binding::Controlled)
            .count();
        assert_eq!(controlled, 1);
        assert_eq!(assignment.non_controlled().count(), 4);
    }

    #[test]
    fn test_shuffle_is_seed_deterministic() {
        let a = RoleAssignment::shuffle(&mut Pcg32::seed_from_u64(42));
        let b = RoleAssignment::shuffle(&mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_reaches_every_role() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(RoleAssignment::shuffle(&mut rng).controlled);
        }
        assert_eq!(seen.len(), Role::ALL.len());
    }

    #[test]
    fn test_formation_geometry_portal_right() {
        // Portal 3 sits at (320, 0)
        let portal = PortalIndex::new(3).unwrap();
        let formation = Formation::arrange(portal, RoleAssignment::new(Role::Relay1), &arena(), 320.0);
        let pos = &formation.positions;

        assert!(!pos.contains_key(&Role::Relay1));
        assert!((pos[&Role::Named] - Vec2::new(-200.0, 0.0)).length() < 1e-3);
        assert!((pos[&Role::Relay3] - Vec2::new(220.0, 0.0)).length() < 1e-3);
        assert!((pos[&Role::Teleporter] - Vec2::new(270.0, 0.0)).length() < 1e-3);

        // Relay2 = (320, 120) is outside the usable radius, so it is pulled in
        let relay2 = pos[&Role::Relay2];
        assert!((relay2.length() - 280.0).abs() < 1e-3);
        assert!(relay2.y > 0.0);
    }

    #[test]
    fn test_relay_sides_mirror_each_other() {
        let portal_pos = Vec2::new(0.0, -320.0);
        let r1 = Role::Relay1.formation_position(portal_pos);
        let r2 = Role::Relay2.formation_position(portal_pos);
        assert!((r1.x + r2.x).abs() < 1e-3);
        assert!((r1.y - r2.y).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_random_formation_is_inside_arena(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let formation = Formation::random(&mut rng, &arena(), PORTAL_RING_RADIUS);
            prop_assert_eq!(formation.positions.len(), 4);
            prop_assert!(!formation.positions.contains_key(&formation.assignment.controlled));
            for pos in formation.positions.values() {
                prop_assert!(pos.length() <= 280.0 + 1e-3);
            }
            prop_assert!((1..=8).contains(&formation.portal.number()));
        }
    }
}
