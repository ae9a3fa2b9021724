// crates/profinet-rs/src/scheduler.rs
//! Deadline queue driving all periodic work in the stack.
//!
//! Timer callbacks are not stored as closures. Every entry carries a
//! stable identifier of its target (AR index, CR index) and the device
//! dispatches it when due, re-checking the target's run flag first, so
//! a timeout can never act on an instance after it was closed.

use crate::ProfinetError;
use log::trace;

/// How the embedding drives the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMode {
    /// One-shot OS timers re-armed from their own callbacks; timeouts may
    /// run concurrently with application calls.
    Preemptive,
    /// A single-threaded software scheduler polled on a fixed tick.
    Cooperative,
}

/// Scheduler parameters, fixed at device construction.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Granularity of the driving tick in microseconds. Must be > 0.
    pub tick_interval_us: u32,
    pub mode: SchedulerMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: 1000,
            mode: SchedulerMode::Cooperative,
        }
    }
}

/// What to do when a timeout fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Cyclic send for the PPM of IOCR `crep` in AR `ar`.
    PpmSend { ar: usize, crep: usize },
    /// Periodic LLDP broadcast.
    LldpBroadcast,
    /// LLDP peer TTL expired without a refresh.
    LldpPeerExpiry,
}

/// Handle for a scheduled timeout. Stale handles (already fired or
/// cancelled) are ignored by [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutId {
    slot: usize,
    seq: u32,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    seq: u32,
    deadline_us: u64,
    kind: TimeoutKind,
}

/// Fixed number of concurrent timeouts. One per PPM instance plus the
/// two LLDP timers is the steady-state load; the headroom covers
/// re-arms that briefly overlap their predecessor.
const SCHEDULER_SLOTS: usize = 32;

/// Bounded deadline queue.
pub struct Scheduler {
    cfg: SchedulerConfig,
    slots: [Option<Entry>; SCHEDULER_SLOTS],
    next_seq: u32,
}

impl Scheduler {
    pub fn new(cfg: SchedulerConfig) -> Self {
        debug_assert!(cfg.tick_interval_us > 0);
        Self {
            cfg,
            slots: [None; SCHEDULER_SLOTS],
            next_seq: 0,
        }
    }

    pub fn tick_interval_us(&self) -> u32 {
        self.cfg.tick_interval_us
    }

    pub fn mode(&self) -> SchedulerMode {
        self.cfg.mode
    }

    /// Arms a one-shot timeout `delay_us` from `now_us`.
    pub fn schedule(
        &mut self,
        now_us: u64,
        delay_us: u64,
        kind: TimeoutKind,
    ) -> Result<TimeoutId, ProfinetError> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(ProfinetError::SchedulerFull)?;
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.slots[slot] = Some(Entry {
            seq,
            deadline_us: now_us + delay_us,
            kind,
        });
        trace!(
            "[SCHED] Armed {:?} in slot {} for t+{}us",
            kind, slot, delay_us
        );
        Ok(TimeoutId { slot, seq })
    }

    /// Cancels a pending timeout. A stale id is a no-op.
    pub fn cancel(&mut self, id: TimeoutId) {
        if let Some(entry) = self.slots[id.slot] {
            if entry.seq == id.seq {
                self.slots[id.slot] = None;
            }
        }
    }

    /// Pops the earliest entry whose deadline has been reached, if any.
    /// Entries armed while draining are not returned until their own
    /// deadline passes.
    pub fn pop_due(&mut self, now_us: u64) -> Option<(TimeoutId, TimeoutKind)> {
        let mut best: Option<(usize, Entry)> = None;
        for (slot, entry) in self.slots.iter().enumerate() {
            if let Some(entry) = entry {
                if entry.deadline_us <= now_us
                    && best.map_or(true, |(_, b)| entry.deadline_us < b.deadline_us)
                {
                    best = Some((slot, *entry));
                }
            }
        }
        let (slot, entry) = best?;
        self.slots[slot] = None;
        Some((
            TimeoutId {
                slot,
                seq: entry.seq,
            },
            entry.kind,
        ))
    }

    /// Absolute time of the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots
            .iter()
            .flatten()
            .map(|entry| entry.deadline_us)
            .min()
    }

    /// Number of armed entries.
    pub fn pending(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
