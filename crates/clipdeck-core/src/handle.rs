// crates/clipdeck-core/src/handle.rs
//
// Opaque reference to a pooled session.
//
// Layout (u64):
//   [63 .. 32]  generation, bumped every time the slot is allocated
//   [31 ..  0]  slot index, 0 is reserved, so the all-zero value is invalid
//
// A handle is only meaningful to the pool that issued it. Equality is exact
// bit equality, so a handle from a previous occupant of the same slot never
// compares equal to the current one.

use std::fmt;

const SLOT_BITS: u32 = 32;
const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(u64);

impl SessionHandle {
    /// The reserved "no session" value. Never resolves.
    pub const INVALID: SessionHandle = SessionHandle(0);

    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self(((generation as u64) << SLOT_BITS) | slot as u64)
    }

    pub fn slot(self) -> u32 {
        (self.0 & SLOT_MASK) as u32
    }

    pub fn generation(self) -> u32 {
        (self.0 >> SLOT_BITS) as u32
    }

    pub fn is_invalid(self) -> bool {
        self.slot() == 0
    }

    /// Raw bits, for collaborators that store handles in plain integer fields.
    pub fn to_bits(self) -> u64 {
        self.0
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionHandle({}v{})", self.slot(), self.generation())
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot(), self.generation())
    }
}
