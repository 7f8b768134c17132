//! Run state and core record types
//!
//! Everything a single run owns lives here: its phase, the drawn formation,
//! the reflection audit trail and the ray handles still on screen.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::PortalIndex;
use super::chain::Node;
use super::roles::{Role, RoleAssignment};

/// Which minigame a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Single reflection off the controlled marker
    Single,
    /// Five-hop relay through the role formation into the portal
    Relay,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Single => "single",
            Variant::Relay => "relay",
        }
    }
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    #[default]
    Idle,
    /// Countdown ticking toward execution
    CountingDown,
    /// Rays are being evaluated
    Executing,
    /// Result is on display
    Resolved,
    /// Releasing rays and markers
    CleaningUp,
}

/// Handle for a ray the presentation layer is drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RayId {
    pub variant: Variant,
    pub serial: u32,
}

/// What a drawn ray means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayIntent {
    /// Beam travelling between automatic participants (always drawn)
    Beam,
    /// Controlled marker's ray that found its target
    Hit,
    /// Controlled marker's ray that missed, drawn out to the wall
    Miss,
}

impl RayIntent {
    /// Colour hint for the presentation layer
    pub fn color(&self) -> &'static str {
        match self {
            RayIntent::Beam | RayIntent::Miss => "#ff0000",
            RayIntent::Hit => "#00ff00",
        }
    }
}

/// Ray geometry, before a handle is attached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayPath {
    pub start: Vec2,
    pub end: Vec2,
    pub intent: RayIntent,
}

impl RayPath {
    pub fn new(start: Vec2, end: Vec2, intent: RayIntent) -> Self {
        Self { start, end, intent }
    }
}

/// A ray handed to the render sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RaySegment {
    pub id: RayId,
    #[serde(flatten)]
    pub path: RayPath,
    /// Stroke colour, derived from the intent
    pub color: &'static str,
}

impl RaySegment {
    pub fn new(id: RayId, path: RayPath) -> Self {
        Self {
            id,
            path,
            color: path.intent.color(),
        }
    }
}

/// One evaluated hop of a relay run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionRecord {
    pub from: Node,
    pub to: Node,
    pub success: bool,
    pub is_reflection: bool,
    pub ray: Option<RayId>,
}

/// Why a run failed. Several can apply at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// A reflection hop broke the chain
    ReflectionFailed,
    /// Fewer reflections completed than the chain needs
    ChainLengthMismatch { recorded: usize, expected: usize },
    /// The last leg did not graze the teleporter
    PassThroughMissed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ReflectionFailed => write!(f, "reflection failed"),
            FailureReason::ChainLengthMismatch { recorded, expected } => {
                write!(f, "wrong reflection count ({}/{})", recorded, expected)
            }
            FailureReason::PassThroughMissed => write!(f, "ray missed the teleporter"),
        }
    }
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub success: bool,
    /// Human-readable status line
    pub message: String,
    pub reasons: Vec<FailureReason>,
    /// Deflection measured for single runs
    #[serde(default)]
    pub deflection_deg: Option<f32>,
}

/// Mutable state of one variant's run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub phase: RunPhase,
    /// Countdown ticks still to show
    pub countdown_remaining: u32,
    pub portal: Option<PortalIndex>,
    pub assignment: Option<RoleAssignment>,
    /// Non-controlled participant positions
    pub positions: BTreeMap<Role, Vec2>,
    /// Audit trail of the current relay run
    pub chain: Vec<ReflectionRecord>,
    /// Rays not tied to a chain record
    pub rays: Vec<RayId>,
    pub resolution: Option<Resolution>,
}

impl RunState {
    pub fn is_counting_down(&self) -> bool {
        self.phase == RunPhase::CountingDown
    }

    /// A run is active from execution until cleanup finishes
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            RunPhase::Executing | RunPhase::Resolved | RunPhase::CleaningUp
        )
    }

    /// Start requests are only honoured while idle
    pub fn accepts_start(&self) -> bool {
        !self.is_active() && !self.is_counting_down()
    }

    /// Every ray handle this run still owns
    pub fn owned_rays(&self) -> impl Iterator<Item = RayId> + '_ {
        self.chain
            .iter()
            .filter_map(|record| record.ray)
            .chain(self.rays.iter().copied())
    }

    /// Number of reflections that actually happened
    pub fn completed_reflections(&self) -> usize {
        self.chain
            .iter()
            .filter(|record| record.is_reflection && record.success)
            .count()
    }

    /// Drop everything and return to idle
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(serial: u32) -> RayId {
        RayId {
            variant: Variant::Relay,
            serial,
        }
    }

    #[test]
    fn test_phase_flags() {
        let mut state = RunState::default();
        assert!(state.accepts_start());

        state.phase = RunPhase::CountingDown;
        assert!(state.is_counting_down());
        assert!(!state.is_active());
        assert!(!state.accepts_start());

        state.phase = RunPhase::Resolved;
        assert!(state.is_active());
        assert!(!state.accepts_start());
    }

    #[test]
    fn test_owned_rays_and_reset() {
        let mut state = RunState::default();
        state.phase = RunPhase::Resolved;
        state.chain.push(ReflectionRecord {
            from: Node::Boss,
            to: Node::Role(Role::Named),
            success: true,
            is_reflection: true,
            ray: Some(ray(1)),
        });
        state.chain.push(ReflectionRecord {
            from: Node::Role(Role::Named),
            to: Node::Role(Role::Relay1),
            success: false,
            is_reflection: true,
            ray: None,
        });
        state.rays.push(ray(2));

        let owned: Vec<_> = state.owned_rays().collect();
        assert_eq!(owned, vec![ray(1), ray(2)]);
        assert_eq!(state.completed_reflections(), 1);

        state.reset();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(state.chain.is_empty());
        assert_eq!(state.owned_rays().count(), 0);
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::ChainLengthMismatch {
            recorded: 3,
            expected: 4,
        };
        assert_eq!(reason.to_string(), "wrong reflection count (3/4)");
        assert_eq!(FailureReason::PassThroughMissed.to_string(), "ray missed the teleporter");
    }
}
