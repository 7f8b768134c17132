//! Platform abstraction layer
//!
//! The game core never touches the DOM or a window. It reads the controlled
//! marker through an [`InputSource`] and reports everything drawable through a
//! [`RenderSink`]:
//! - Live input (marker position, aim heading)
//! - Ray creation/removal
//! - Countdown, status line and start button state

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::roles::Role;
use crate::sim::state::{RayId, RaySegment, Resolution, Variant};

/// Snapshot of the controlled marker
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlSample {
    /// Arena-centred position
    pub position: Vec2,
    /// Aim heading in degrees, direction = (cos, sin)
    pub aim_degrees: f32,
}

impl ControlSample {
    pub fn new(position: Vec2, aim_degrees: f32) -> Self {
        Self {
            position,
            aim_degrees,
        }
    }
}

/// Anything that can report where the controlled marker is and where it aims
pub trait InputSource {
    fn sample(&self) -> ControlSample;
}

impl InputSource for ControlSample {
    fn sample(&self) -> ControlSample {
        *self
    }
}

/// A non-controlled participant marker to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantMarker {
    pub role: Role,
    pub position: Vec2,
    pub label: &'static str,
    pub color: &'static str,
}

/// Everything the presentation layer needs to draw or update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderEvent {
    /// Show a countdown number
    Countdown { variant: Variant, remaining: u32 },
    CountdownHidden { variant: Variant },
    /// Replace the status line
    Status { variant: Variant, message: String },
    /// Relay formation drawn at start
    FormationShown {
        portal: u8,
        controlled: Role,
        markers: Vec<ParticipantMarker>,
    },
    FormationCleared,
    RayCreated(RaySegment),
    RayRemoved { id: RayId },
    Resolved { variant: Variant, resolution: Resolution },
    /// Start button enablement
    StartEnabled { variant: Variant, enabled: bool },
}

/// Receiver for render events
pub trait RenderSink {
    fn emit(&mut self, event: RenderEvent);
}

/// Collects events, for tests and for hosts that drain them per frame
impl RenderSink for Vec<RenderEvent> {
    fn emit(&mut self, event: RenderEvent) {
        self.push(event);
    }
}

/// Writes every event to the log (native runs)
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn emit(&mut self, event: RenderEvent) {
        match &event {
            RenderEvent::Resolved { variant, resolution } => {
                log::info!("[{}] {}", variant.as_str(), resolution.message);
            }
            RenderEvent::Status { variant, message } => {
                log::info!("[{}] {}", variant.as_str(), message);
            }
            RenderEvent::RayCreated(segment) => {
                log::debug!(
                    "Ray {:?} ({:.1}, {:.1}) -> ({:.1}, {:.1}) {:?}",
                    segment.id.serial,
                    segment.path.start.x,
                    segment.path.start.y,
                    segment.path.end.x,
                    segment.path.end.y,
                    segment.path.intent
                );
            }
            other => log::debug!("{:?}", other),
        }
    }
}
