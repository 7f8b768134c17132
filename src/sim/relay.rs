//! Relay game ("star relay")
//!
//! A random portal and role binding are drawn at start. After the countdown
//! the boss beam runs through the relay chain and the verdict is shown.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::chain::{
    ChainContext, ChainVerdict, RELAY_SEQUENCE, execute, expected_reflections,
};
use super::roles::Formation;
use super::run::RunCore;
use super::state::{ReflectionRecord, Resolution, RunPhase, RunState, Variant};
use super::timer::{Scheduler, TimerKind};
use crate::platform::{InputSource, ParticipantMarker, RenderEvent, RenderSink};
use crate::settings::Settings;

/// Relay minigame
#[derive(Debug, Clone)]
pub struct RelayGame {
    settings: Settings,
    core: RunCore,
    rng: Pcg32,
    /// Formation of the current run
    formation: Option<Formation>,
}

impl RelayGame {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            settings,
            core: RunCore::new(Variant::Relay),
            rng: Pcg32::seed_from_u64(seed),
            formation: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.core.state
    }

    pub fn formation(&self) -> Option<&Formation> {
        self.formation.as_ref()
    }

    /// Start command with a freshly drawn formation
    pub fn start<S, K>(&mut self, scheduler: &mut S, sink: &mut K) -> bool
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        if !self.core.can_start() {
            return false;
        }
        let formation = Formation::random(
            &mut self.rng,
            &self.settings.arena(),
            self.settings.portal_ring_radius,
        );
        self.begin(formation, scheduler, sink);
        true
    }

    /// Start command with a fixed formation
    pub fn start_with<S, K>(
        &mut self,
        formation: Formation,
        scheduler: &mut S,
        sink: &mut K,
    ) -> bool
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        if !self.core.can_start() {
            return false;
        }
        self.begin(formation, scheduler, sink);
        true
    }

    fn begin<S, K>(&mut self, formation: Formation, scheduler: &mut S, sink: &mut K)
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        log::info!(
            "Relay started: portal {}, you are {}",
            formation.portal.number(),
            formation.assignment.controlled.label()
        );

        let state = &mut self.core.state;
        state.portal = Some(formation.portal);
        state.assignment = Some(formation.assignment);
        state.positions = formation.positions.clone();

        let markers = formation
            .positions
            .iter()
            .map(|(role, position)| ParticipantMarker {
                role: *role,
                position: *position,
                label: role.label(),
                color: role.color(),
            })
            .collect();
        sink.emit(RenderEvent::FormationShown {
            portal: formation.portal.number(),
            controlled: formation.assignment.controlled,
            markers,
        });

        self.formation = Some(formation);
        self.core.begin_countdown(&self.settings, scheduler, sink);
    }

    pub fn on_timer<I, S, K>(&mut self, kind: TimerKind, input: &I, scheduler: &mut S, sink: &mut K)
    where
        I: InputSource + ?Sized,
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        let phase = self.core.state.phase;
        let launched = !self.core.state.chain.is_empty();
        match kind {
            TimerKind::CountdownTick => {
                if self.core.tick_countdown(&self.settings, scheduler, sink) {
                    self.core.status("Starting relay...", sink);
                    self.core.schedule(
                        scheduler,
                        self.settings.relay.launch_delay_ms,
                        TimerKind::Launch,
                    );
                }
            }
            TimerKind::Launch if phase == RunPhase::Executing && !launched => {
                self.launch(input, scheduler, sink);
            }
            TimerKind::Resolve if phase == RunPhase::Executing => {
                self.resolve(scheduler, sink);
            }
            TimerKind::Cleanup if phase == RunPhase::Resolved => {
                self.core.cleanup(sink);
                self.formation = None;
                sink.emit(RenderEvent::FormationCleared);
            }
            other => log::warn!("Ignoring {:?} for relay run in {:?}", other, phase),
        }
    }

    /// Fire the beam through the chain and draw every hop that was evaluated
    fn launch<I, S, K>(&mut self, input: &I, scheduler: &mut S, sink: &mut K)
    where
        I: InputSource + ?Sized,
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        let Some(formation) = self.formation.as_ref() else {
            log::error!("Relay launch without a formation");
            return;
        };
        self.core.status("Relay in progress...", sink);

        let ctx = ChainContext {
            assignment: formation.assignment,
            positions: &formation.positions,
            portal: formation.portal_pos,
            sample: input.sample(),
            tolerances: self.settings.tolerances(),
            arena_radius: self.settings.arena_radius,
        };
        let run = execute(&RELAY_SEQUENCE, &ctx);

        for record in &run.records {
            let ray = record.outcome.ray.map(|path| self.core.draw(path, sink));
            self.core.state.chain.push(ReflectionRecord {
                from: record.hop.from,
                to: record.hop.to,
                success: record.outcome.success,
                is_reflection: record.outcome.is_reflection,
                ray,
            });
        }

        self.core
            .schedule(scheduler, self.settings.relay.resolve_delay_ms, TimerKind::Resolve);
    }

    fn resolve<S, K>(&mut self, scheduler: &mut S, sink: &mut K)
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        let flags: Vec<(bool, bool)> = self
            .core
            .state
            .chain
            .iter()
            .map(|r| (r.is_reflection, r.success))
            .collect();
        let verdict = ChainVerdict::judge(&flags, expected_reflections(&RELAY_SEQUENCE));

        let resolution = Resolution {
            success: verdict.is_success(),
            message: verdict.message(),
            reasons: verdict.reasons.clone(),
            deflection_deg: None,
        };
        log::info!(
            "{} ({}/{} reflections, {} hops)",
            resolution.message,
            verdict.reflections,
            verdict.expected,
            self.core.state.chain.len()
        );

        self.core.state.phase = RunPhase::Resolved;
        self.core.status(resolution.message.clone(), sink);
        sink.emit(RenderEvent::Resolved {
            variant: Variant::Relay,
            resolution: resolution.clone(),
        });
        self.core.state.resolution = Some(resolution);

        self.core
            .schedule(scheduler, self.settings.relay.cleanup_delay_ms, TimerKind::Cleanup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ControlSample;
    use crate::sim::arena::PortalIndex;
    use crate::sim::chain::Node;
    use crate::sim::geometry::angle_degrees;
    use crate::sim::roles::{Role, RoleAssignment};
    use crate::sim::state::FailureReason;
    use crate::sim::timer::TimerQueue;
    use glam::Vec2;

    fn formation(controlled: Role) -> Formation {
        let settings = Settings::default();
        Formation::arrange(
            PortalIndex::new(3).unwrap(),
            RoleAssignment::new(controlled),
            &settings.arena(),
            settings.portal_ring_radius,
        )
    }

    fn run_until(
        game: &mut RelayGame,
        queue: &mut TimerQueue,
        input: &ControlSample,
        sink: &mut Vec<RenderEvent>,
        until_ms: u64,
    ) {
        while let Some(timer) = queue.pop_due(until_ms) {
            assert_eq!(timer.variant, Variant::Relay);
            game.on_timer(timer.kind, input, queue, sink);
        }
        queue.set_now(until_ms);
    }

    /// Run a fixed formation up to the verdict
    fn play(controlled: Role, input: ControlSample) -> (RelayGame, Vec<RenderEvent>) {
        let mut game = RelayGame::new(Settings::default(), 7);
        let mut queue = TimerQueue::new();
        let mut sink = Vec::new();
        assert!(game.start_with(formation(controlled), &mut queue, &mut sink));
        run_until(&mut game, &mut queue, &input, &mut sink, 7500);
        (game, sink)
    }

    #[test]
    fn test_timeline() {
        let mut game = RelayGame::new(Settings::default(), 7);
        let mut queue = TimerQueue::new();
        let mut sink = Vec::new();
        let input = ControlSample::new(Vec2::new(270.0, 0.0), 0.0);

        game.start_with(formation(Role::Teleporter), &mut queue, &mut sink);
        assert!(matches!(sink[0], RenderEvent::FormationShown { portal: 3, .. }));

        run_until(&mut game, &mut queue, &input, &mut sink, 5000);
        assert_eq!(game.state().phase, RunPhase::Executing);
        assert!(game.state().chain.is_empty());

        run_until(&mut game, &mut queue, &input, &mut sink, 6000);
        assert_eq!(game.state().chain.len(), 5);
        assert!(game.state().resolution.is_none());

        run_until(&mut game, &mut queue, &input, &mut sink, 7500);
        assert_eq!(game.state().phase, RunPhase::Resolved);

        run_until(&mut game, &mut queue, &input, &mut sink, 10499);
        assert_eq!(game.state().phase, RunPhase::Resolved);
        run_until(&mut game, &mut queue, &input, &mut sink, 10500);
        assert_eq!(game.state().phase, RunPhase::Idle);
        assert!(game.formation().is_none());
        assert_eq!(sink.last(), Some(&RenderEvent::FormationCleared));

        let created = sink
            .iter()
            .filter(|e| matches!(e, RenderEvent::RayCreated(_)))
            .count();
        let removed = sink
            .iter()
            .filter(|e| matches!(e, RenderEvent::RayRemoved { .. }))
            .count();
        assert_eq!(created, 5);
        assert_eq!(removed, created);
    }

    #[test]
    fn test_controlled_teleporter_on_the_line_succeeds() {
        let (game, _) = play(Role::Teleporter, ControlSample::new(Vec2::new(270.0, 0.0), 0.0));
        let resolution = game.state().resolution.clone().unwrap();
        assert!(resolution.success, "{}", resolution.message);
        assert_eq!(resolution.message, "Relay succeeded! Perfect reflection chain!");
        assert_eq!(game.state().completed_reflections(), 4);
        let last = game.state().chain.last().unwrap();
        assert_eq!((last.from, last.to), (Node::Role(Role::Relay3), Node::Portal));
    }

    #[test]
    fn test_controlled_teleporter_off_the_line_misses() {
        let (game, _) = play(Role::Teleporter, ControlSample::new(Vec2::new(270.0, 30.0), 0.0));
        let resolution = game.state().resolution.clone().unwrap();
        assert!(!resolution.success);
        assert_eq!(resolution.reasons, vec![FailureReason::PassThroughMissed]);
        assert_eq!(game.state().chain.len(), 5);
        assert_eq!(game.state().completed_reflections(), 4);
    }

    #[test]
    fn test_controlled_named_aiming_at_relay1_succeeds() {
        let formation = formation(Role::Named);
        let marker = Vec2::new(-200.0, 0.0);
        let aim = angle_degrees(marker, formation.positions[&Role::Relay1]);
        let (game, _) = play(Role::Named, ControlSample::new(marker, aim));

        let resolution = game.state().resolution.clone().unwrap();
        assert!(resolution.success, "{}", resolution.message);
        assert_eq!(game.state().chain.len(), 5);
    }

    #[test]
    fn test_controlled_named_facing_the_boss_breaks_at_first_hop() {
        // Letting the beam run straight on is outside the reflection cone
        let (game, sink) = play(Role::Named, ControlSample::new(Vec2::new(-200.0, 0.0), 180.0));

        let state = game.state();
        assert_eq!(state.chain.len(), 1);
        assert!(!state.chain[0].success);
        assert_eq!(state.completed_reflections(), 0);

        let resolution = state.resolution.clone().unwrap();
        assert_eq!(
            resolution.reasons,
            vec![
                FailureReason::ReflectionFailed,
                FailureReason::ChainLengthMismatch {
                    recorded: 0,
                    expected: 4
                },
                FailureReason::PassThroughMissed,
            ]
        );
        assert_eq!(
            resolution.message,
            "Relay failed! reflection failed, wrong reflection count (0/4), ray missed the teleporter"
        );
        assert!(sink.iter().any(|e| matches!(e, RenderEvent::Resolved { .. })));
    }

    #[test]
    fn test_double_start_runs_once() {
        let mut game = RelayGame::new(Settings::default(), 1);
        let mut queue = TimerQueue::new();
        let mut sink = Vec::new();

        assert!(game.start(&mut queue, &mut sink));
        let portal = game.state().portal;
        assert!(!game.start(&mut queue, &mut sink));
        assert!(!game.start_with(formation(Role::Named), &mut queue, &mut sink));

        assert_eq!(game.state().portal, portal);
        assert_eq!(queue.len(), 1);
        let shown = sink
            .iter()
            .filter(|e| matches!(e, RenderEvent::FormationShown { .. }))
            .count();
        assert_eq!(shown, 1);
    }

    #[test]
    fn test_stray_timers_are_ignored() {
        let mut game = RelayGame::new(Settings::default(), 1);
        let mut queue = TimerQueue::new();
        let mut sink = Vec::new();
        let input = ControlSample::default();

        game.on_timer(TimerKind::Launch, &input, &mut queue, &mut sink);
        game.on_timer(TimerKind::Resolve, &input, &mut queue, &mut sink);
        game.on_timer(TimerKind::Cleanup, &input, &mut queue, &mut sink);
        game.on_timer(TimerKind::CountdownTick, &input, &mut queue, &mut sink);

        assert_eq!(game.state().phase, RunPhase::Idle);
        assert!(sink.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_formation_markers_skip_controlled_role() {
        let mut game = RelayGame::new(Settings::default(), 1);
        let mut queue = TimerQueue::new();
        let mut sink = Vec::new();
        game.start_with(formation(Role::Relay2), &mut queue, &mut sink);

        let RenderEvent::FormationShown {
            controlled,
            markers,
            ..
        } = &sink[0]
        else {
            panic!("expected formation first, got {:?}", sink[0]);
        };
        assert_eq!(*controlled, Role::Relay2);
        assert_eq!(markers.len(), 4);
        assert!(markers.iter().all(|m| m.role != Role::Relay2));
    }
}
