//! Deterministic game core
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through the timer queue
//! - Seeded RNG only
//! - Stable iteration order (roles are kept in ordered maps)
//! - No rendering or platform dependencies

pub mod arena;
pub mod chain;
pub mod geometry;
pub mod marker;
pub mod reflection;
pub mod relay;
pub mod roles;
mod run;
pub mod session;
pub mod single;
pub mod state;
pub mod timer;

pub use arena::{Arena, PortalIndex};
pub use chain::{ChainContext, ChainVerdict, Hop, Node, RELAY_SEQUENCE, execute};
pub use marker::{Marker, MoveInput};
pub use reflection::{HopOutcome, Tolerances};
pub use relay::RelayGame;
pub use roles::{Binding, Formation, Role, RoleAssignment};
pub use session::Session;
pub use single::{Preview, SingleGame, preview};
pub use state::{
    FailureReason, RayId, RayIntent, RayPath, RaySegment, ReflectionRecord, Resolution, RunPhase,
    RunState, Variant,
};
pub use timer::{Scheduler, Timer, TimerKind, TimerQueue};
