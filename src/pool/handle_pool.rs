//! Generational handle pool.
//!
//! A `HandlePool<T>` stores resource records in a fixed-capacity slot
//! array and hands out opaque `(index, generation)` handles instead of
//! references. A handle is live iff its slot is occupied and its
//! generation matches the slot's current generation; reusing a slot bumps
//! the generation, so use-after-free is detectable rather than silent.
//!
//! Slots also carry the reference count and auto-release policy used by
//! the resource lifecycle layer, so all four resource kinds share one
//! refcounting implementation.

use crate::error::{Error, Result};

// ============================================================================
// HANDLE
// ============================================================================

/// Opaque key identifying a pool slot without being a raw pointer.
///
/// Handles are value types: copying one never affects liveness. Equality
/// and liveness checks happen only through the owning pool's accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Distinguished handle that never addresses a slot
    pub const NIL: Handle = Handle { index: u32::MAX, generation: u32::MAX };

    /// Whether this is the nil handle
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation this handle was issued with
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NIL
    }
}

// ============================================================================
// SLOT
// ============================================================================

/// One pool slot: payload plus lifecycle metadata
struct Slot<T> {
    payload: Option<T>,
    generation: u32,
    reference_count: u64,
    auto_release: bool,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            payload: None,
            generation: 0,
            reference_count: 0,
            auto_release: false,
        }
    }
}

// ============================================================================
// POOL
// ============================================================================

/// Fixed-capacity pool of generational slots
pub struct HandlePool<T> {
    slots: Vec<Slot<T>>,
    live_count: u32,
}

impl<T> HandlePool<T> {
    /// Create a pool with `capacity` slots.
    ///
    /// Capacity is clamped below `u32::MAX` so the nil handle's index can
    /// never address a slot.
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.min(u32::MAX - 1) as usize;
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::empty);
        Self { slots, live_count: 0 }
    }

    /// Insert a value into the first free slot.
    ///
    /// The returned handle bears the slot's current generation; the slot's
    /// reference count starts at 1 with auto-release enabled.
    ///
    /// # Errors
    ///
    /// `PoolFull` when every slot is occupied.
    pub fn add(&mut self, value: T) -> Result<Handle> {
        // Linear scan: pools here are bounded (≤ a few thousand slots)
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.payload.is_none() {
                slot.payload = Some(value);
                slot.reference_count = 1;
                slot.auto_release = true;
                self.live_count += 1;
                return Ok(Handle { index: index as u32, generation: slot.generation });
            }
        }
        Err(Error::PoolFull)
    }

    /// Remove a live slot's payload, invalidating all copies of `handle`.
    ///
    /// The slot's generation is bumped so outstanding handles become
    /// permanently stale, and the slot is marked free.
    pub fn remove(&mut self, handle: Handle) -> Result<T> {
        let slot = self.live_slot_mut(handle)?;
        let payload = slot.payload.take().ok_or(Error::StaleOrInvalidHandle)?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.reference_count = 0;
        slot.auto_release = false;
        self.live_count -= 1;
        Ok(payload)
    }

    // ===== ACCESS =====

    /// Get the payload behind a live handle
    pub fn get(&self, handle: Handle) -> Result<&T> {
        let slot = self.live_slot(handle)?;
        slot.payload.as_ref().ok_or(Error::StaleOrInvalidHandle)
    }

    /// Get the payload behind a live handle, mutably
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T> {
        let slot = self.live_slot_mut(handle)?;
        slot.payload.as_mut().ok_or(Error::StaleOrInvalidHandle)
    }

    /// Whether `handle` currently addresses a live slot. Never fails.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.live_slot(handle).is_ok()
    }

    // ===== REFERENCE COUNTING =====

    /// Increment a live slot's reference count, returning the new count
    pub fn increment_ref(&mut self, handle: Handle) -> Result<u64> {
        let slot = self.live_slot_mut(handle)?;
        slot.reference_count += 1;
        Ok(slot.reference_count)
    }

    /// Decrement a live slot's reference count, returning the new count.
    ///
    /// Fails with `StaleOrInvalidHandle` when the count is already zero.
    pub fn decrement_ref(&mut self, handle: Handle) -> Result<u64> {
        let slot = self.live_slot_mut(handle)?;
        if slot.reference_count == 0 {
            return Err(Error::StaleOrInvalidHandle);
        }
        slot.reference_count -= 1;
        Ok(slot.reference_count)
    }

    /// Get a live slot's reference count
    pub fn reference_count(&self, handle: Handle) -> Result<u64> {
        Ok(self.live_slot(handle)?.reference_count)
    }

    /// Set a live slot's auto-release policy
    pub fn set_auto_release(&mut self, handle: Handle, auto_release: bool) -> Result<()> {
        self.live_slot_mut(handle)?.auto_release = auto_release;
        Ok(())
    }

    /// Get a live slot's auto-release policy
    pub fn auto_release(&self, handle: Handle) -> Result<bool> {
        Ok(self.live_slot(handle)?.auto_release)
    }

    // ===== ENUMERATION =====

    /// Lazy, finite, one-shot sequence of currently live handles.
    ///
    /// Used by bulk teardown; collect before mutating the pool.
    pub fn live_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.payload.as_ref().map(|_| Handle {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    /// Number of live slots
    pub fn live_count(&self) -> u32 {
        self.live_count
    }

    /// Total slot capacity
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    // ===== INTERNAL =====

    fn live_slot(&self, handle: Handle) -> Result<&Slot<T>> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(Error::StaleOrInvalidHandle)?;
        if slot.payload.is_none() || slot.generation != handle.generation {
            return Err(Error::StaleOrInvalidHandle);
        }
        Ok(slot)
    }

    fn live_slot_mut(&mut self, handle: Handle) -> Result<&mut Slot<T>> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(Error::StaleOrInvalidHandle)?;
        if slot.payload.is_none() || slot.generation != handle.generation {
            return Err(Error::StaleOrInvalidHandle);
        }
        Ok(slot)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "handle_pool_tests.rs"]
mod tests;
