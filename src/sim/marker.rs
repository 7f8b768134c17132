//! The controlled marker ("arrow")
//!
//! Moved by held direction keys, aimed at the pointer, kept inside the arena.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::geometry::angle_degrees;
use crate::platform::{ControlSample, InputSource};

/// Held keys and pointer for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pointer in arena coordinates, if the pointer is over the page
    pub pointer: Option<Vec2>,
}

impl MoveInput {
    /// Per-frame step direction (screen space, y down), not normalized
    fn step(&self) -> Vec2 {
        let mut step = Vec2::ZERO;
        if self.up {
            step.y -= 1.0;
        }
        if self.down {
            step.y += 1.0;
        }
        if self.left {
            step.x -= 1.0;
        }
        if self.right {
            step.x += 1.0;
        }
        step
    }
}

/// The player's marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub pos: Vec2,
    /// Aim heading in degrees
    pub aim_degrees: f32,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            aim_degrees: 0.0,
        }
    }
}

impl Marker {
    /// Advance one frame: move, clamp to the arena, then re-aim at the pointer
    pub fn update(&mut self, input: &MoveInput, speed: f32, arena: &Arena) {
        self.pos = arena.clamp(self.pos + input.step() * speed);

        if let Some(pointer) = input.pointer {
            if pointer != self.pos {
                self.aim_degrees = angle_degrees(self.pos, pointer);
            }
        }
    }
}

impl InputSource for Marker {
    fn sample(&self) -> ControlSample {
        ControlSample::new(self.pos, self.aim_degrees)
    }
}
