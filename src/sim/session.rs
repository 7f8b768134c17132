//! Session driver
//!
//! Owns both minigames, the controlled marker and the timer queue. The host
//! calls [`Session::update`] once per frame with the elapsed time and held
//! input; due timers fire in order against the marker as it stands then.

use super::marker::{Marker, MoveInput};
use super::relay::RelayGame;
use super::single::{Preview, SingleGame, preview};
use super::state::Variant;
use super::timer::TimerQueue;
use crate::platform::{InputSource, RenderSink};
use crate::settings::Settings;

#[derive(Debug)]
pub struct Session {
    settings: Settings,
    single: SingleGame,
    relay: RelayGame,
    marker: Marker,
    timers: TimerQueue,
}

impl Session {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            single: SingleGame::new(settings.clone()),
            relay: RelayGame::new(settings.clone(), seed),
            marker: Marker::default(),
            timers: TimerQueue::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn single(&self) -> &SingleGame {
        &self.single
    }

    pub fn relay(&self) -> &RelayGame {
        &self.relay
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// Place the marker directly (debug tools, tests)
    pub fn place_marker(&mut self, marker: Marker) {
        self.marker = Marker {
            pos: self.settings.arena().clamp(marker.pos),
            aim_degrees: marker.aim_degrees,
        };
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Start button for one variant. False if that variant is busy.
    pub fn start<K: RenderSink + ?Sized>(&mut self, variant: Variant, sink: &mut K) -> bool {
        match variant {
            Variant::Single => self.single.start(&mut self.timers, sink),
            Variant::Relay => self.relay.start(&mut self.timers, sink),
        }
    }

    /// Advance one frame
    pub fn update<K>(&mut self, elapsed_ms: u64, input: &MoveInput, sink: &mut K)
    where
        K: RenderSink + ?Sized,
    {
        self.marker
            .update(input, self.settings.marker_speed, &self.settings.arena());

        let until = self.timers.now_ms() + elapsed_ms;
        while let Some(timer) = self.timers.pop_due(until) {
            log::trace!("{:?} fired at {}ms", timer, self.timers.now_ms());
            match timer.variant {
                Variant::Single => {
                    self.single
                        .on_timer(timer.kind, &self.marker, &mut self.timers, sink)
                }
                Variant::Relay => {
                    self.relay
                        .on_timer(timer.kind, &self.marker, &mut self.timers, sink)
                }
            }
        }
        self.timers.set_now(until);
    }

    /// Debug readout of the single reflection at the marker's current pose
    pub fn preview(&self) -> Preview {
        preview(&self.marker.sample(), self.settings.arena_radius)
    }
}
