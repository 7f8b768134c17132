//! Relay chain: hop sequence, short-circuit execution and verdict
//!
//! The beam leaves the boss, bounces through the four relay roles and must
//! finish in the portal, grazing the teleporter on the last leg.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::direction_from_degrees;
use super::reflection::{
    HopOutcome, Tolerances, controlled_final_leg, controlled_reflection, directional_hop,
    final_leg, relay_reflection,
};
use super::roles::{Role, RoleAssignment};
use super::state::FailureReason;
use crate::platform::ControlSample;

/// A point the beam can travel between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", content = "role", rename_all = "snake_case")]
pub enum Node {
    /// Beam source at the arena centre
    Boss,
    Role(Role),
    /// Destination marker on the portal ring
    Portal,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Boss => f.write_str("boss"),
            Node::Role(role) => write!(f, "{}", role),
            Node::Portal => f.write_str("portal"),
        }
    }
}

/// One directed edge of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub from: Node,
    pub to: Node,
}

impl Hop {
    pub const fn new(from: Node, to: Node) -> Self {
        Self { from, to }
    }

    /// The hop into the portal is the pass-through leg, not a reflection
    pub fn is_final_leg(&self) -> bool {
        self.to == Node::Portal
    }
}

/// boss -> named -> relay1 -> relay2 -> relay3 -> portal (through the teleporter)
pub const RELAY_SEQUENCE: [Hop; 5] = [
    Hop::new(Node::Boss, Node::Role(Role::Named)),
    Hop::new(Node::Role(Role::Named), Node::Role(Role::Relay1)),
    Hop::new(Node::Role(Role::Relay1), Node::Role(Role::Relay2)),
    Hop::new(Node::Role(Role::Relay2), Node::Role(Role::Relay3)),
    Hop::new(Node::Role(Role::Relay3), Node::Portal),
];

/// Number of reflections a full run of `hops` produces
pub fn expected_reflections(hops: &[Hop]) -> usize {
    hops.iter().filter(|hop| !hop.is_final_leg()).count()
}

/// Static geometry plus the live marker sample for one chain execution
#[derive(Debug, Clone)]
pub struct ChainContext<'a> {
    pub assignment: RoleAssignment,
    /// Non-controlled participant positions
    pub positions: &'a BTreeMap<Role, Vec2>,
    pub portal: Vec2,
    pub sample: ControlSample,
    pub tolerances: Tolerances,
    pub arena_radius: f32,
}

impl ChainContext<'_> {
    fn is_controlled(&self, node: Node) -> bool {
        matches!(node, Node::Role(role) if role == self.assignment.controlled)
    }

    /// Where a node stands right now
    pub fn position_of(&self, node: Node) -> Option<Vec2> {
        match node {
            Node::Boss => Some(Vec2::ZERO),
            Node::Portal => Some(self.portal),
            Node::Role(role) if role == self.assignment.controlled => Some(self.sample.position),
            Node::Role(role) => self.positions.get(&role).copied(),
        }
    }

    fn aim(&self) -> Vec2 {
        direction_from_degrees(self.sample.aim_degrees)
    }

    /// Evaluate one hop against the current geometry
    pub fn evaluate(&self, hop: &Hop) -> HopOutcome {
        let (Some(from), Some(to)) = (self.position_of(hop.from), self.position_of(hop.to)) else {
            log::warn!("Hop {} -> {} has no position, treating as broken", hop.from, hop.to);
            return HopOutcome {
                success: false,
                is_reflection: !hop.is_final_leg(),
                ray: None,
                measured: None,
            };
        };

        if hop.is_final_leg() {
            let Some(teleporter) = self.position_of(Node::Role(Role::Teleporter)) else {
                return HopOutcome {
                    success: false,
                    is_reflection: false,
                    ray: None,
                    measured: None,
                };
            };
            if self.is_controlled(hop.from) {
                controlled_final_leg(
                    from,
                    self.aim(),
                    to,
                    teleporter,
                    &self.tolerances,
                    self.arena_radius,
                )
            } else {
                final_leg(from, to, teleporter, &self.tolerances)
            }
        } else if self.is_controlled(hop.from) {
            directional_hop(from, self.aim(), to, &self.tolerances, self.arena_radius)
        } else if self.is_controlled(hop.to) {
            controlled_reflection(from, to, self.aim())
        } else {
            relay_reflection(from, to)
        }
    }
}

/// A hop together with how it went
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopRecord {
    pub hop: Hop,
    pub outcome: HopOutcome,
}

/// Everything one chain execution produced
#[derive(Debug, Clone, Default)]
pub struct ChainRun {
    pub records: Vec<HopRecord>,
}

impl ChainRun {
    /// Hops evaluated before the chain finished or broke
    pub fn attempted(&self) -> usize {
        self.records.len()
    }

    pub fn broken(&self) -> bool {
        self.records.iter().any(|r| !r.outcome.success)
    }
}

/// Walk the hops in order, stopping at the first one that fails
pub fn execute(hops: &[Hop], ctx: &ChainContext<'_>) -> ChainRun {
    let mut run = ChainRun::default();

    for hop in hops {
        let outcome = ctx.evaluate(hop);
        log::debug!(
            "Hop {} -> {}: {} (measured {:?})",
            hop.from,
            hop.to,
            if outcome.success { "ok" } else { "broken" },
            outcome.measured
        );
        run.records.push(HopRecord { hop: *hop, outcome });

        if !outcome.success {
            log::info!("Relay chain broke at {} -> {}", hop.from, hop.to);
            break;
        }
    }

    run
}

/// Outcome of a whole chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainVerdict {
    /// Reflections that actually happened
    pub reflections: usize,
    pub expected: usize,
    pub reasons: Vec<FailureReason>,
}

impl ChainVerdict {
    /// Judge a finished run. Each unmet condition adds its own reason.
    ///
    /// The reflection count is checked separately from the per-hop flags, so
    /// a chain cut short can never pass on the strength of the hops it did run.
    pub fn judge(records: &[(bool, bool)], expected: usize) -> Self {
        let all_reflections_ok = records
            .iter()
            .filter(|(is_reflection, _)| *is_reflection)
            .all(|(_, success)| *success);
        let reflections = records
            .iter()
            .filter(|(is_reflection, success)| *is_reflection && *success)
            .count();
        let passed_through = records
            .iter()
            .find(|(is_reflection, _)| !*is_reflection)
            .is_some_and(|(_, success)| *success);

        let mut reasons = Vec::new();
        if !all_reflections_ok {
            reasons.push(FailureReason::ReflectionFailed);
        }
        if reflections != expected {
            reasons.push(FailureReason::ChainLengthMismatch {
                recorded: reflections,
                expected,
            });
        }
        if !passed_through {
            reasons.push(FailureReason::PassThroughMissed);
        }

        Self {
            reflections,
            expected,
            reasons,
        }
    }

    pub fn from_run(run: &ChainRun, hops: &[Hop]) -> Self {
        let flags: Vec<_> = run
            .records
            .iter()
            .map(|r| (r.outcome.is_reflection, r.outcome.success))
            .collect();
        Self::judge(&flags, expected_reflections(hops))
    }

    pub fn is_success(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Status line for the presentation layer
    pub fn message(&self) -> String {
        if self.is_success() {
            "Relay succeeded! Perfect reflection chain!".to_string()
        } else {
            let reasons: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
            format!("Relay failed! {}", reasons.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ARENA_RADIUS;
    use crate::sim::geometry::angle_degrees;

    /// Straight-line layout along +x so distances are easy to reason about
    fn line_positions(controlled: Role) -> BTreeMap<Role, Vec2> {
        let all = [
            (Role::Named, Vec2::new(-100.0, 0.0)),
            (Role::Relay1, Vec2::new(0.0, 100.0)),
            (Role::Relay2, Vec2::new(100.0, 100.0)),
            (Role::Relay3, Vec2::new(100.0, 0.0)),
            (Role::Teleporter, Vec2::new(200.0, 10.0)),
        ];
        all.into_iter().filter(|(r, _)| *r != controlled).collect()
    }

    fn ctx(controlled: Role, positions: &BTreeMap<Role, Vec2>, sample: ControlSample) -> ChainContext<'_> {
        ChainContext {
            assignment: RoleAssignment::new(controlled),
            positions,
            portal: Vec2::new(320.0, 0.0),
            sample,
            tolerances: Tolerances::default(),
            arena_radius: ARENA_RADIUS,
        }
    }

    #[test]
    fn test_sequence_shape() {
        assert_eq!(RELAY_SEQUENCE.len(), 5);
        assert_eq!(expected_reflections(&RELAY_SEQUENCE), 4);
        assert!(RELAY_SEQUENCE[4].is_final_leg());
        for pair in RELAY_SEQUENCE.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn test_all_hops_succeed_teleporter_within_tolerance() {
        // Controlled teleporter stands 10 units off the relay3 -> portal leg
        let positions = line_positions(Role::Teleporter);
        let sample = ControlSample::new(Vec2::new(200.0, 10.0), 0.0);
        let context = ctx(Role::Teleporter, &positions, sample);

        let run = execute(&RELAY_SEQUENCE, &context);
        assert_eq!(run.attempted(), 5);
        let verdict = ChainVerdict::from_run(&run, &RELAY_SEQUENCE);
        assert!(verdict.is_success(), "{:?}", verdict.reasons);
        assert_eq!(verdict.reflections, 4);
    }

    #[test]
    fn test_all_hops_succeed_teleporter_too_far() {
        let positions = line_positions(Role::Teleporter);
        let sample = ControlSample::new(Vec2::new(200.0, 20.0), 0.0);
        let context = ctx(Role::Teleporter, &positions, sample);

        let run = execute(&RELAY_SEQUENCE, &context);
        assert_eq!(run.attempted(), 5);
        let verdict = ChainVerdict::from_run(&run, &RELAY_SEQUENCE);
        assert_eq!(verdict.reasons, vec![FailureReason::PassThroughMissed]);
    }

    #[test]
    fn test_fourth_hop_breaks_chain() {
        // Controlled relay3 keeps aiming along the incoming beam: cone check fails
        let positions = line_positions(Role::Relay3);
        let marker = Vec2::new(100.0, 0.0);
        let incoming_heading = angle_degrees(Vec2::new(100.0, 100.0), marker);
        let sample = ControlSample::new(marker, incoming_heading);
        let context = ctx(Role::Relay3, &positions, sample);

        let run = execute(&RELAY_SEQUENCE, &context);
        assert_eq!(run.attempted(), 4);
        assert!(run.records[..3].iter().all(|r| r.outcome.success));
        assert!(!run.records[3].outcome.success);

        let verdict = ChainVerdict::from_run(&run, &RELAY_SEQUENCE);
        assert!(!verdict.is_success());
        assert_eq!(verdict.reflections, 3);
        assert!(verdict.reasons.contains(&FailureReason::ReflectionFailed));
        assert!(verdict.reasons.contains(&FailureReason::ChainLengthMismatch {
            recorded: 3,
            expected: 4
        }));
        assert!(verdict.reasons.contains(&FailureReason::PassThroughMissed));
    }

    #[test]
    fn test_controlled_mid_chain_must_reflect_and_aim() {
        // Controlled relay1: beam arrives from named at (-100, 0); relay2 is at (100, 100)
        let positions = line_positions(Role::Relay1);
        let marker = Vec2::new(0.0, 100.0);
        let aim = angle_degrees(marker, Vec2::new(100.0, 100.0));
        let context = ctx(Role::Relay1, &positions, ControlSample::new(marker, aim));

        let run = execute(&RELAY_SEQUENCE, &context);
        // Incoming (100, 100) vs aim (1, 0) is 45°, deflection -45: the cone rejects it
        assert_eq!(run.attempted(), 2);
        assert!(!run.records[1].outcome.success);
    }

    #[test]
    fn test_controlled_directional_hop_success() {
        // Controlled named: boss beam arrives along -x, relay1 sits up and to the right
        let positions = line_positions(Role::Named);
        let marker = Vec2::new(-100.0, 0.0);
        let aim = angle_degrees(marker, Vec2::new(0.0, 100.0));
        let context = ctx(Role::Named, &positions, ControlSample::new(marker, aim));

        let run = execute(&RELAY_SEQUENCE, &context);
        // Incoming (-1, 0) vs aim (1, 1)/√2 is 135°, deflection 45: reflected, then aimed on target
        assert!(run.records[0].outcome.success);
        assert!(run.records[1].outcome.success);
        assert_eq!(run.attempted(), 5);
    }

    #[test]
    fn test_judge_reports_all_reasons_together() {
        let verdict = ChainVerdict::judge(&[(true, true), (true, false)], 4);
        assert_eq!(
            verdict.reasons,
            vec![
                FailureReason::ReflectionFailed,
                FailureReason::ChainLengthMismatch {
                    recorded: 1,
                    expected: 4
                },
                FailureReason::PassThroughMissed,
            ]
        );
        assert!(verdict.message().starts_with("Relay failed!"));
    }

    #[test]
    fn test_judge_catches_truncated_chain_with_clean_flags() {
        // Three clean reflections and a clean final leg, but one reflection short
        let verdict = ChainVerdict::judge(&[(true, true), (true, true), (true, true), (false, true)], 4);
        assert_eq!(
            verdict.reasons,
            vec![FailureReason::ChainLengthMismatch {
                recorded: 3,
                expected: 4
            }]
        );
    }
}
