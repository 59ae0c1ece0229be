// crates/clipdeck-core/src/queue.rs
//
// Bounded FIFO of compressed packets for one track.
//
// The producer (demux refill on the tick thread) never blocks: a push into a
// full queue hands the packet straight back so the caller decides whether to
// park it or drop it. The consumer never blocks either: pop on empty is None.
//
// `low_water` is where the refill loop stops reading on this track's behalf;
// `capacity` is the hard limit. A queue with headroom above its low-water
// mark keeps packets the demuxer hands over while another track reads ahead.

use std::collections::VecDeque;

/// Packets buffered per track before the refill loop stops reading.
pub const DEFAULT_LOW_WATER: usize = 8;

pub struct PacketQueue<P> {
    packets:   VecDeque<P>,
    low_water: usize,
    capacity:  usize,
}

impl<P> PacketQueue<P> {
    /// Queue whose low-water mark equals its capacity.
    pub fn new(capacity: usize) -> Self {
        Self::with_headroom(capacity, capacity)
    }

    /// Queue that asks for packets up to `low_water` but accepts up to
    /// `capacity` (at least `low_water`).
    pub fn with_headroom(low_water: usize, capacity: usize) -> Self {
        let low_water = low_water.max(1);
        let capacity  = capacity.max(low_water);
        Self { packets: VecDeque::with_capacity(capacity), low_water, capacity }
    }

    pub fn len(&self) -> usize { self.packets.len() }

    pub fn is_empty(&self) -> bool { self.packets.is_empty() }

    /// Below the low-water mark: the refill loop should keep reading.
    pub fn wants_more(&self) -> bool { self.packets.len() < self.low_water }

    pub fn is_full(&self) -> bool { self.packets.len() >= self.capacity }

    pub fn low_water(&self) -> usize { self.low_water }

    pub fn capacity(&self) -> usize { self.capacity }

    /// Enqueue `packet`, or return it untouched when the queue is full.
    pub fn push(&mut self, packet: P) -> Result<(), P> {
        if self.is_full() {
            return Err(packet);
        }
        self.packets.push_back(packet);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<P> {
        self.packets.pop_front()
    }

    /// Drop every queued packet. Returns how many were discarded.
    pub fn flush(&mut self) -> usize {
        let n = self.packets.len();
        self.packets.clear();
        n
    }
}

impl<P> Default for PacketQueue<P> {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_WATER)
    }
}
