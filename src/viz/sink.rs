//! Outbound marker transport.
//!
//! The publishers only know this trait. A sink is free to drop markers
//! (slow viewer, no client); the sampling policy re-emits them on a later
//! tick, so nothing here is retried.

use tracing::{debug, trace};

use super::marker::{Heartbeat, Marker, MarkerId, MarkerKind};

pub trait MarkerSink: Send {
    /// Called at the start of every tick, before any marker.
    fn begin_tick(&mut self, _tick: u64) {}

    fn publish(&mut self, marker: &Marker);

    fn heartbeat(&mut self, heartbeat: &Heartbeat);
}

/// In-memory sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub markers: Vec<Marker>,
    pub heartbeats: Vec<Heartbeat>,
    /// Index into `markers` where each tick starts.
    tick_starts: Vec<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.heartbeats.clear();
        self.tick_starts.clear();
    }

    /// Markers of one kind, in emission order.
    pub fn of_kind(&self, kind: MarkerKind) -> Vec<&Marker> {
        self.markers.iter().filter(|m| m.kind() == kind).collect()
    }

    /// Identities emitted within a namespace, in emission order.
    pub fn ids_in(&self, ns: &str) -> Vec<u64> {
        self.markers
            .iter()
            .filter(|m| m.id.ns == ns)
            .map(|m| m.id.id)
            .collect()
    }

    /// Markers emitted during the `n`-th observed tick (0-based).
    pub fn tick(&self, n: usize) -> &[Marker] {
        let Some(&start) = self.tick_starts.get(n) else {
            return &[];
        };
        let end = self
            .tick_starts
            .get(n + 1)
            .copied()
            .unwrap_or(self.markers.len());
        &self.markers[start..end]
    }

    pub fn find(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().rev().find(|m| m.id == id)
    }
}

impl MarkerSink for RecordingSink {
    fn begin_tick(&mut self, _tick: u64) {
        self.tick_starts.push(self.markers.len());
    }

    fn publish(&mut self, marker: &Marker) {
        self.markers.push(marker.clone());
    }

    fn heartbeat(&mut self, heartbeat: &Heartbeat) {
        self.heartbeats.push(heartbeat.clone());
    }
}

/// Sink that writes markers to the log; useful headless.
#[derive(Debug, Default)]
pub struct TracingSink {
    published: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl MarkerSink for TracingSink {
    fn publish(&mut self, marker: &Marker) {
        self.published += 1;
        trace!(id = %marker.id, kind = ?marker.kind(), color = ?marker.color, "marker");
    }

    fn heartbeat(&mut self, heartbeat: &Heartbeat) {
        debug!(
            "{} (tick {}, {} markers so far)",
            heartbeat.text, heartbeat.tick, self.published
        );
    }
}
