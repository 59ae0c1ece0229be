// crates/clipdeck-core/src/pool.rs
//
// Fixed-capacity generational pool.
//
// Slots 1..=capacity hold values; slot 0 is never handed out so that
// SessionHandle::INVALID can never resolve. A freed slot goes back on the
// free list with its value dropped; its generation is bumped on the next
// allocation, which is what makes every older handle to that slot dead.
//
// The free list is a LIFO stack seeded in descending order, so the first
// allocation gets slot 1, the next slot 2, and so on.
//
// GC protocol (for collaborators holding many handles):
//   clear_marks() → mark(h) for every retained handle → sweep()
// sweep() frees every live slot that was not marked and hands the evicted
// values back so the caller controls teardown order.

use crate::error::PoolError;
use crate::handle::SessionHandle;

/// Default number of usable slots. Matches the editor's historical limit.
pub const DEFAULT_CAPACITY: usize = 1024;

struct Slot<T> {
    generation: u32,
    marked:     bool,
    value:      Option<T>,
}

pub struct Pool<T> {
    slots:     Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(u32::MAX as usize - 1);
        let slots = (0..=capacity)
            .map(|_| Slot { generation: 0, marked: false, value: None })
            .collect();
        let free_list = (1..=capacity as u32).rev().collect();
        Self { slots, free_list }
    }

    /// Number of usable slots (excludes the reserved slot 0).
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn live_count(&self) -> usize {
        self.capacity() - self.free_list.len()
    }

    pub fn is_full(&self) -> bool {
        self.free_list.is_empty()
    }

    /// Store `value` in a free slot. Fails immediately when every slot is
    /// live; nothing is ever evicted to make room.
    pub fn allocate(&mut self, value: T) -> Result<SessionHandle, PoolError> {
        let slot_index = self.free_list.pop().ok_or(PoolError::Exhausted)?;
        let slot = &mut self.slots[slot_index as usize];
        debug_assert!(slot.value.is_none(), "free-listed slot {slot_index} still holds a value");
        slot.generation = slot.generation.wrapping_add(1).max(1);
        slot.marked = false;
        slot.value = Some(value);
        Ok(SessionHandle::new(slot_index, slot.generation))
    }

    /// Index of the slot `handle` refers to, if it is currently live.
    fn resolve(&self, handle: SessionHandle) -> Option<usize> {
        let index = handle.slot() as usize;
        if index == 0 || index >= self.slots.len() {
            return None;
        }
        let slot = &self.slots[index];
        (slot.generation == handle.generation() && slot.value.is_some()).then_some(index)
    }

    pub fn contains(&self, handle: SessionHandle) -> bool {
        self.resolve(handle).is_some()
    }

    pub fn get(&self, handle: SessionHandle) -> Option<&T> {
        let index = self.resolve(handle)?;
        self.slots[index].value.as_ref()
    }

    pub fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut T> {
        let index = self.resolve(handle)?;
        self.slots[index].value.as_mut()
    }

    /// Release the slot and return its value. Stale or invalid handles are a
    /// no-op and return `None`, which also makes double-free harmless.
    pub fn free(&mut self, handle: SessionHandle) -> Option<T> {
        let index = self.resolve(handle)?;
        let slot = &mut self.slots[index];
        let value = slot.value.take();
        slot.marked = false;
        self.free_list.push(index as u32);
        value
    }

    pub fn clear_marks(&mut self) {
        for slot in &mut self.slots {
            slot.marked = false;
        }
    }

    /// Mark a live handle as still referenced. Returns false for stale handles.
    pub fn mark(&mut self, handle: SessionHandle) -> bool {
        match self.resolve(handle) {
            Some(index) => {
                self.slots[index].marked = true;
                true
            }
            None => false,
        }
    }

    /// Free every live, unmarked slot. Marks are left as-is; call
    /// `clear_marks` before the next cycle.
    pub fn sweep(&mut self) -> Vec<(SessionHandle, T)> {
        let doomed: Vec<SessionHandle> = self.iter()
            .filter(|(h, _)| !self.slots[h.slot() as usize].marked)
            .map(|(h, _)| h)
            .collect();
        doomed.into_iter()
            .filter_map(|h| self.free(h).map(|v| (h, v)))
            .collect()
    }

    /// Free every live slot, in slot order.
    pub fn drain(&mut self) -> Vec<(SessionHandle, T)> {
        let live: Vec<SessionHandle> = self.iter().map(|(h, _)| h).collect();
        live.into_iter()
            .filter_map(|h| self.free(h).map(|v| (h, v)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SessionHandle, &T)> + '_ {
        self.slots.iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, s)| {
                s.value.as_ref().map(|v| (SessionHandle::new(i as u32, s.generation), v))
            })
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
