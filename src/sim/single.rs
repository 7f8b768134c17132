//! Single reflection game ("star move")
//!
//! The boss fires at the controlled marker; the marker must bounce the beam
//! back out inside the reflection cone. Also provides the live debug preview
//! of the same check.

use glam::Vec2;
use serde::Serialize;

use super::geometry::{direction_from_degrees, ray_circle_intersection};
use super::reflection::{controlled_reflection, ray_to_wall};
use super::run::RunCore;
use super::state::{FailureReason, RayIntent, RayPath, Resolution, RunPhase, RunState, Variant};
use super::timer::{Scheduler, TimerKind};
use crate::platform::{ControlSample, InputSource, RenderEvent, RenderSink};
use crate::settings::Settings;

/// Single-reflection minigame
#[derive(Debug, Clone)]
pub struct SingleGame {
    settings: Settings,
    core: RunCore,
    /// Marker sample taken when the beam fired; judged at resolve time
    fired_at: Option<ControlSample>,
}

impl SingleGame {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            core: RunCore::new(Variant::Single),
            fired_at: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.core.state
    }

    /// Start command. No-op while a run is counting down or active.
    pub fn start<S, K>(&mut self, scheduler: &mut S, sink: &mut K) -> bool
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        if !self.core.can_start() {
            return false;
        }
        log::info!("Single reflection started");
        self.core.begin_countdown(&self.settings, scheduler, sink);
        true
    }

    pub fn on_timer<I, S, K>(&mut self, kind: TimerKind, input: &I, scheduler: &mut S, sink: &mut K)
    where
        I: InputSource + ?Sized,
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        match kind {
            TimerKind::CountdownTick => {
                if self.core.tick_countdown(&self.settings, scheduler, sink) {
                    self.fire(input.sample(), scheduler, sink);
                }
            }
            TimerKind::Resolve if self.core.state.phase == RunPhase::Executing => {
                self.resolve(scheduler, sink);
            }
            TimerKind::Cleanup if self.core.state.phase == RunPhase::Resolved => {
                self.fired_at = None;
                self.core.cleanup(sink);
            }
            other => log::warn!(
                "Ignoring {:?} for single run in {:?}",
                other,
                self.core.state.phase
            ),
        }
    }

    /// Boss beam to the marker
    fn fire<S, K>(&mut self, sample: ControlSample, scheduler: &mut S, sink: &mut K)
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        let beam = RayPath::new(Vec2::ZERO, sample.position, RayIntent::Beam);
        let id = self.core.draw(beam, sink);
        self.core.state.rays.push(id);
        self.fired_at = Some(sample);

        self.core
            .schedule(scheduler, self.settings.single.resolve_delay_ms, TimerKind::Resolve);
    }

    fn resolve<S, K>(&mut self, scheduler: &mut S, sink: &mut K)
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        let sample = self.fired_at.unwrap_or_default();
        let aim = direction_from_degrees(sample.aim_degrees);
        let outcome = controlled_reflection(Vec2::ZERO, sample.position, aim);

        if outcome.success {
            let exit = ray_to_wall(sample.position, aim, self.settings.arena_radius);
            let reflected = RayPath::new(sample.position, exit, RayIntent::Hit);
            let id = self.core.draw(reflected, sink);
            self.core.state.rays.push(id);
        }

        let resolution = single_resolution(outcome.success, outcome.measured);
        log::info!("{}", resolution.message);

        self.core.state.phase = RunPhase::Resolved;
        self.core.status(resolution.message.clone(), sink);
        sink.emit(RenderEvent::Resolved {
            variant: Variant::Single,
            resolution: resolution.clone(),
        });
        self.core.state.resolution = Some(resolution);

        self.core
            .schedule(scheduler, self.settings.single.cleanup_delay_ms, TimerKind::Cleanup);
    }
}

fn single_resolution(success: bool, deflection: Option<f32>) -> Resolution {
    let message = match (success, deflection) {
        (true, Some(d)) => format!("Success! Deflection: {:.1}°", d),
        (false, Some(d)) => format!("Failure! Deflection: {:.1}°", d),
        (_, None) => "Failure! Marker is standing on the boss".to_string(),
    };
    Resolution {
        success,
        message,
        reasons: if success {
            Vec::new()
        } else {
            vec![FailureReason::ReflectionFailed]
        },
        deflection_deg: deflection,
    }
}

/// Live readout of the single-reflection check
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preview {
    pub deflection_deg: Option<f32>,
    pub success: bool,
    pub distance_from_centre: f32,
    /// Boss beam to the marker
    pub incoming: RayPath,
    /// Reflected ray to the wall, only when the reflection would succeed
    pub reflected: Option<RayPath>,
}

/// Evaluate the reflection the marker would make right now
pub fn preview(sample: &ControlSample, arena_radius: f32) -> Preview {
    let aim = direction_from_degrees(sample.aim_degrees);
    let outcome = controlled_reflection(Vec2::ZERO, sample.position, aim);

    let reflected = if outcome.success {
        ray_circle_intersection(sample.position, aim, arena_radius)
            .map(|exit| RayPath::new(sample.position, exit, RayIntent::Hit))
    } else {
        None
    };

    Preview {
        deflection_deg: outcome.measured,
        success: outcome.success,
        distance_from_centre: sample.position.length(),
        incoming: RayPath::new(Vec2::ZERO, sample.position, RayIntent::Beam),
        reflected,
    }
}
