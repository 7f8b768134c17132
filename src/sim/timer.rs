//! Scheduled continuations
//!
//! Countdown ticks and display delays are modelled as timers that fire back
//! into the owning game. The queue is advanced manually by the host, so the
//! same code runs under a browser frame loop and under tests.

use serde::{Deserialize, Serialize};

use super::state::Variant;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// One countdown step elapsed
    CountdownTick,
    /// Pre-execution pause is over, fire the beam
    Launch,
    /// Display delay before judging the run
    Resolve,
    /// Display delay before clearing the run
    Cleanup,
}

/// A timer addressed to one variant's game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub variant: Variant,
    pub kind: TimerKind,
}

impl Timer {
    pub fn new(variant: Variant, kind: TimerKind) -> Self {
        Self { variant, kind }
    }
}

/// Timer service the games schedule their continuations on
pub trait Scheduler {
    /// Fire `timer` after `delay_ms` milliseconds
    fn schedule(&mut self, delay_ms: u32, timer: Timer);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    due_ms: u64,
    /// Insertion order, breaks ties between timers due together
    seq: u64,
    timer: Timer,
}

/// Manually advanced timer queue
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_seq: u64,
    /// Sorted by (due, seq)
    pending: Vec<Pending>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current queue time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to it
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Timer> {
        match self.pending.first() {
            Some(head) if head.due_ms <= until_ms => {
                let head = self.pending.remove(0);
                self.now_ms = self.now_ms.max(head.due_ms);
                Some(head.timer)
            }
            _ => None,
        }
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay_ms: u32, timer: Timer) {
        let due_ms = self.now_ms + delay_ms as u64;
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = Pending { due_ms, seq, timer };
        let idx = self
            .pending
            .partition_point(|p| (p.due_ms, p.seq) <= (due_ms, seq));
        self.pending.insert(idx, entry);
    }
}
