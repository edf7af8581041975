//! Per-frame publish counters.
//!
//! A frame is due for publication while its counter is below the cap, or
//! with a small probability on every evaluation regardless of the counter.
//! The random path keeps long-saturated history occasionally refreshed so a
//! viewer that joins late still converges to the full trajectory.

use std::collections::HashMap;

use crate::map::Timestamp;

use super::sampler::Sampler;

/// Publish counter table, owned by the frame publisher for the lifetime of
/// the run loop. Counters are created lazily and only ever incremented.
#[derive(Debug, Clone)]
pub struct FramePublishTracker {
    counts: HashMap<Timestamp, u32>,
    cap: u32,
    refresh_probability: f64,
}

impl FramePublishTracker {
    pub fn new(cap: u32, refresh_probability: f64) -> Self {
        Self {
            counts: HashMap::new(),
            cap,
            refresh_probability,
        }
    }

    /// Whether the frame at `timestamp` should be emitted this tick.
    pub fn should_publish(&self, timestamp: Timestamp, sampler: &mut dyn Sampler) -> bool {
        self.count(timestamp) < self.cap || sampler.sample(self.refresh_probability)
    }

    /// Record one successful emission.
    pub fn record_publish(&mut self, timestamp: Timestamp) {
        let count = self.counts.entry(timestamp).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Times the frame has been emitted (0 if never).
    pub fn count(&self, timestamp: Timestamp) -> u32 {
        self.counts.get(&timestamp).copied().unwrap_or(0)
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Number of frames published at least once.
    pub fn tracked(&self) -> usize {
        self.counts.len()
    }

    /// Number of frames that reached the cap.
    pub fn saturated(&self) -> usize {
        self.counts.values().filter(|&&c| c >= self.cap).count()
    }
}
