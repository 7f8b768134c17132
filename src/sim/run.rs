//! Lifecycle shared by both minigames
//!
//! Start guard, countdown, ray ownership and cleanup. The variant-specific
//! games only decide what happens between countdown and cleanup.

use super::state::{RayId, RayPath, RaySegment, RunPhase, RunState, Variant};
use super::timer::{Scheduler, Timer, TimerKind};
use crate::platform::{RenderEvent, RenderSink};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub(crate) struct RunCore {
    pub variant: Variant,
    pub state: RunState,
    /// Ray serials keep counting across runs so stale handles never collide
    next_ray: u32,
}

impl RunCore {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            state: RunState::default(),
            next_ray: 1,
        }
    }

    fn timer(&self, kind: TimerKind) -> Timer {
        Timer::new(self.variant, kind)
    }

    pub fn schedule<S>(&self, scheduler: &mut S, delay_ms: u32, kind: TimerKind)
    where
        S: Scheduler + ?Sized,
    {
        scheduler.schedule(delay_ms, self.timer(kind));
    }

    /// Start guard. Returns false (and changes nothing) if a run is already
    /// counting down or active.
    pub fn can_start(&self) -> bool {
        if self.state.accepts_start() {
            true
        } else {
            log::warn!(
                "Ignoring start for {}: run is {:?}",
                self.variant.as_str(),
                self.state.phase
            );
            false
        }
    }

    /// Enter the countdown and show its first number
    pub fn begin_countdown<S, K>(&mut self, settings: &Settings, scheduler: &mut S, sink: &mut K)
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        self.state.phase = RunPhase::CountingDown;
        self.state.countdown_remaining = settings.countdown_ticks;
        self.state.resolution = None;

        sink.emit(RenderEvent::StartEnabled {
            variant: self.variant,
            enabled: false,
        });
        sink.emit(RenderEvent::Status {
            variant: self.variant,
            message: String::new(),
        });
        sink.emit(RenderEvent::Countdown {
            variant: self.variant,
            remaining: self.state.countdown_remaining,
        });
        self.schedule(scheduler, settings.countdown_interval_ms, TimerKind::CountdownTick);
    }

    /// One countdown step. Returns true when the countdown has just finished.
    pub fn tick_countdown<S, K>(
        &mut self,
        settings: &Settings,
        scheduler: &mut S,
        sink: &mut K,
    ) -> bool
    where
        S: Scheduler + ?Sized,
        K: RenderSink + ?Sized,
    {
        if !self.state.is_counting_down() {
            log::warn!("Stray countdown tick for {}", self.variant.as_str());
            return false;
        }

        self.state.countdown_remaining = self.state.countdown_remaining.saturating_sub(1);
        if self.state.countdown_remaining > 0 {
            sink.emit(RenderEvent::Countdown {
                variant: self.variant,
                remaining: self.state.countdown_remaining,
            });
            self.schedule(scheduler, settings.countdown_interval_ms, TimerKind::CountdownTick);
            false
        } else {
            sink.emit(RenderEvent::CountdownHidden {
                variant: self.variant,
            });
            self.state.phase = RunPhase::Executing;
            true
        }
    }

    /// Hand a ray to the sink and return its handle. The caller decides where
    /// the handle is owned.
    pub fn draw<K: RenderSink + ?Sized>(&mut self, path: RayPath, sink: &mut K) -> RayId {
        let id = RayId {
            variant: self.variant,
            serial: self.next_ray,
        };
        self.next_ray = self.next_ray.wrapping_add(1);
        sink.emit(RenderEvent::RayCreated(RaySegment::new(id, path)));
        id
    }

    pub fn status<K: RenderSink + ?Sized>(&self, message: impl Into<String>, sink: &mut K) {
        sink.emit(RenderEvent::Status {
            variant: self.variant,
            message: message.into(),
        });
    }

    /// Release every owned ray, reset to idle and re-enable start
    pub fn cleanup<K: RenderSink + ?Sized>(&mut self, sink: &mut K) {
        self.state.phase = RunPhase::CleaningUp;

        let rays: Vec<RayId> = self.state.owned_rays().collect();
        for id in rays {
            sink.emit(RenderEvent::RayRemoved { id });
        }

        self.state.reset();
        sink.emit(RenderEvent::StartEnabled {
            variant: self.variant,
            enabled: true,
        });
        log::debug!("{} run cleaned up", self.variant.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RayIntent;
    use crate::sim::timer::TimerQueue;
    use glam::Vec2;

    #[test]
    fn test_countdown_runs_down_to_execution() {
        let settings = Settings::default();
        let mut core = RunCore::new(Variant::Single);
        let mut queue = TimerQueue::new();
        let mut sink: Vec<RenderEvent> = Vec::new();

        assert!(core.can_start());
        core.begin_countdown(&settings, &mut queue, &mut sink);
        assert!(!core.can_start());

        let mut finished = false;
        for _ in 0..settings.countdown_ticks {
            let timer = queue.pop_due(u64::MAX).unwrap();
            assert_eq!(timer.kind, TimerKind::CountdownTick);
            finished = core.tick_countdown(&settings, &mut queue, &mut sink);
        }
        assert!(finished);
        assert_eq!(core.state.phase, RunPhase::Executing);
        assert!(queue.is_empty());
        assert_eq!(queue.now_ms(), 5000);

        let shown: Vec<u32> = sink
            .iter()
            .filter_map(|e| match e {
                RenderEvent::Countdown { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_ray_serials_wrap() {
        let mut core = RunCore::new(Variant::Relay);
        let mut sink: Vec<RenderEvent> = Vec::new();
        core.next_ray = u32::MAX;

        let path = RayPath::new(Vec2::ZERO, Vec2::X, RayIntent::Beam);
        assert_eq!(core.draw(path, &mut sink).serial, u32::MAX);
        assert_eq!(core.draw(path, &mut sink).serial, 0);
    }

    #[test]
    fn test_cleanup_releases_owned_rays() {
        let mut core = RunCore::new(Variant::Single);
        let mut sink: Vec<RenderEvent> = Vec::new();
        core.state.phase = RunPhase::Resolved;

        let a = core.draw(RayPath::new(Vec2::ZERO, Vec2::X, RayIntent::Beam), &mut sink);
        let b = core.draw(RayPath::new(Vec2::ZERO, Vec2::Y, RayIntent::Hit), &mut sink);
        assert_ne!(a, b);
        core.state.rays.extend([a, b]);

        sink.clear();
        core.cleanup(&mut sink);
        assert_eq!(core.state.phase, RunPhase::Idle);
        assert_eq!(
            sink,
            vec![
                RenderEvent::RayRemoved { id: a },
                RenderEvent::RayRemoved { id: b },
                RenderEvent::StartEnabled {
                    variant: Variant::Single,
                    enabled: true
                },
            ]
        );
    }
}
