//! The four isolated PRNG streams a pipeline context exposes to passes:
//! `layout`, `rooms`, `connections`, `details`. Each is a `ChaCha8Rng` seeded
//! from its own sub-seed, so branching in one stream never perturbs another.
//!
//! *RNG discipline* (see module docs in `dg_core::pass`): within a stream,
//! the number of draws made per entity processed must be fixed regardless
//! of which way a random branch goes, or downstream streams desynchronize
//! between otherwise-equal runs. This is enforced by convention and by the
//! determinism property tests in `dg_procgen`, not by the type system.

use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::seed::SeedBundle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Layout,
    Rooms,
    Connections,
    Details,
}

pub struct RngStreams {
    layout: ChaCha8Rng,
    rooms: ChaCha8Rng,
    connections: ChaCha8Rng,
    details: ChaCha8Rng,
    draws: [u64; 4],
}

impl RngStreams {
    pub fn from_seed(seed: &SeedBundle) -> Self {
        Self {
            layout: ChaCha8Rng::seed_from_u64(seed.layout),
            rooms: ChaCha8Rng::seed_from_u64(seed.rooms),
            connections: ChaCha8Rng::seed_from_u64(seed.connections),
            details: ChaCha8Rng::seed_from_u64(seed.details),
            draws: [0; 4],
        }
    }

    fn stream_mut(&mut self, stream: Stream) -> &mut ChaCha8Rng {
        match stream {
            Stream::Layout => &mut self.layout,
            Stream::Rooms => &mut self.rooms,
            Stream::Connections => &mut self.connections,
            Stream::Details => &mut self.details,
        }
    }

    fn count(&mut self, stream: Stream) {
        self.draws[stream as usize] += 1;
    }

    pub fn layout(&mut self) -> &mut ChaCha8Rng {
        self.count(Stream::Layout);
        &mut self.layout
    }

    pub fn rooms(&mut self) -> &mut ChaCha8Rng {
        self.count(Stream::Rooms);
        &mut self.rooms
    }

    pub fn connections(&mut self) -> &mut ChaCha8Rng {
        self.count(Stream::Connections);
        &mut self.connections
    }

    pub fn details(&mut self) -> &mut ChaCha8Rng {
        self.count(Stream::Details);
        &mut self.details
    }

    /// Draws consumed so far per stream, in declaration order
    /// `[layout, rooms, connections, details]`. Surfaced in trace decisions
    /// and used by determinism tests to assert fixed per-entity draw counts.
    pub fn draw_counts(&self) -> [u64; 4] {
        self.draws
    }

    /// Direct access without bumping the draw counter, for callers (like
    /// the playthrough simulator) that are not bound by the pipeline's RNG
    /// discipline.
    pub fn raw(&mut self, stream: Stream) -> &mut ChaCha8Rng {
        self.stream_mut(stream)
    }
}

/// A single Bernoulli trial on a given stream, used pervasively for extra
/// MST loop edges, room placement chance, and branch corridor anchors.
pub fn bernoulli(rng: &mut ChaCha8Rng, probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    (rng.next_u64() as f64 / u64::MAX as f64) < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_bundle_yields_identical_streams() {
        let seed = SeedBundle::from_primary(7);
        let mut a = RngStreams::from_seed(&seed);
        let mut b = RngStreams::from_seed(&seed);
        let va: u32 = a.layout().gen();
        let vb: u32 = b.layout().gen();
        assert_eq!(va, vb);
    }

    #[test]
    fn streams_are_independent_of_each_other() {
        let seed = SeedBundle::from_primary(7);
        let mut streams = RngStreams::from_seed(&seed);
        let layout_val: u32 = streams.layout().gen();
        let rooms_val: u32 = streams.rooms().gen();
        assert_ne!(layout_val, rooms_val);
    }

    #[test]
    fn draw_counts_track_stream_use() {
        let seed = SeedBundle::from_primary(1);
        let mut streams = RngStreams::from_seed(&seed);
        let _: u32 = streams.layout().gen();
        let _: u32 = streams.layout().gen();
        let _: u32 = streams.rooms().gen();
        assert_eq!(streams.draw_counts(), [2, 1, 0, 0]);
    }

    #[test]
    fn bernoulli_extremes_are_deterministic() {
        let seed = SeedBundle::from_primary(1);
        let mut streams = RngStreams::from_seed(&seed);
        assert!(!bernoulli(streams.raw(Stream::Details), 0.0));
        assert!(bernoulli(streams.raw(Stream::Details), 1.0));
    }
}
