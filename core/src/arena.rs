//! Bump arena over caller-owned `f32` scratch.
//!
//! Every intermediate buffer of a forward pass (padded image, feature
//! maps, flattened vector, scores) is carved out of one borrowed slice.
//! Allocation is O(1) and never touches the heap, so a caller can size the
//! scratch once from [`crate::ConvNet::arena_len`] and reuse it for every
//! inference.
//!
//! The arena is handed to the network as `&mut Arena`, which makes the
//! scratch the single serialization point of the engine: at most one
//! inference can be in flight per buffer.

use crate::error::{Error, Result};

/// Bump allocator over a borrowed `f32` buffer.
///
/// Slices handed out live for `'a` and are disjoint from each other and
/// from the unallocated tail, so a layer can read the previous layer's
/// output while writing its own.
pub struct Arena<'a> {
    free: &'a mut [f32],
    capacity: usize,
}

impl<'a> Arena<'a> {
    /// Create a new arena from a mutable scratch buffer.
    pub fn new(buf: &'a mut [f32]) -> Self {
        let capacity = buf.len();
        Self { free: buf, capacity }
    }

    /// Allocate a zero-initialized slice of `len` elements.
    pub fn alloc(&mut self, len: usize) -> Result<&'a mut [f32]> {
        if len > self.free.len() {
            return Err(Error::ArenaExhausted {
                requested: len,
                remaining: self.free.len(),
            });
        }

        let free = core::mem::take(&mut self.free);
        let (head, tail) = free.split_at_mut(len);
        self.free = tail;

        // Scratch is reused across calls; stale values must not leak
        head.fill(0.0);
        Ok(head)
    }

    /// Elements remaining in the arena.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.free.len()
    }

    /// Total capacity in elements.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Elements currently allocated.
    #[inline(always)]
    pub fn used(&self) -> usize {
        self.capacity - self.free.len()
    }
}
