// src/grammar/schedule.rs
//! Single-shot expansion timers keyed by (node, epoch).

use std::time::Duration;

use bevy::prelude::*; // Timer, TimerMode

use super::tree::NodeId;

#[derive(Debug)]
struct PendingExpansion {
    node: NodeId,
    epoch: u64,
    timer: Timer,
}

/// Deferred expansions in scheduling order. Stale entries are filtered by the tree.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: Vec<PendingExpansion>,
}

impl DeferredQueue {
    pub fn schedule(&mut self, node: NodeId, epoch: u64, delay_secs: f32) {
        self.pending.push(PendingExpansion {
            node,
            epoch,
            timer: Timer::from_seconds(delay_secs.max(0.0), TimerMode::Once),
        });
    }

    /// Advance every timer by `dt`; return the due entries in scheduling order.
    pub fn tick(&mut self, dt: Duration) -> Vec<(NodeId, u64)> {
        let mut due = Vec::new();
        self.pending.retain_mut(|p| {
            p.timer.tick(dt);
            if p.timer.finished() {
                due.push((p.node, p.epoch));
                false
            } else {
                true
            }
        });
        due
    }

    /// Drop entries the predicate rejects (e.g. nodes that no longer exist).
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId, u64) -> bool) {
        self.pending.retain(|p| keep(p.node, p.epoch));
    }

    #[inline] pub fn len(&self) -> usize { self.pending.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pending.is_empty() }
}
