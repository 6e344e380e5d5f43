//! Device buffer paired with a `FreeList`.
//!
//! A `BufferArena` is the buffer-backed store used for vertex data, index
//! data and per-draw uniform data: one device buffer whose address space
//! is partitioned by a [`FreeList`]. Allocation uploads through the
//! device's buffer interface; freeing returns the range to the free list.
//!
//! Capacity exhaustion is handled here rather than surfaced to resource
//! code: the arena grows the device buffer (preserving contents) when the
//! free list runs out of space, and doubles the free list's node table
//! when it runs out of block nodes.

use std::sync::{Arc, Mutex};

use crate::allocator::FreeList;
use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, GraphicsDevice};
use crate::{engine_bail, engine_info};

/// A sub-allocated byte range within an arena's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRange {
    /// Offset of the range's first byte
    pub offset: u64,
    /// Range size in bytes
    pub size: u64,
}

/// Descriptor for creating a `BufferArena`
pub struct BufferArenaDesc {
    /// Device to create the backing buffer with
    pub device: Arc<Mutex<dyn GraphicsDevice>>,
    /// Usage of the backing buffer (TRANSFER_DST is added for uploads)
    pub usage: BufferUsage,
    /// Initial buffer size in bytes
    pub size: u64,
    /// Free list allocation-count bound
    pub max_allocations: u32,
    /// Arena name, used in log messages
    pub name: String,
}

/// A growable, sub-allocated device buffer
pub struct BufferArena {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    buffer: Arc<dyn Buffer>,
    free_list: FreeList,
    usage: BufferUsage,
    name: String,
}

impl BufferArena {
    /// Create an arena with a fresh device buffer
    pub fn from_desc(desc: BufferArenaDesc) -> Result<Self> {
        let free_list = FreeList::new(desc.size, desc.max_allocations)?;
        let usage = desc.usage | BufferUsage::TRANSFER_DST;

        let buffer = desc
            .device
            .lock()
            .unwrap()
            .create_buffer(BufferDesc { size: desc.size, usage })?;

        Ok(Self {
            device: desc.device,
            buffer,
            free_list,
            usage,
            name: desc.name,
        })
    }

    // ===== ALLOCATION =====

    /// Allocate a range and upload `data` into it.
    ///
    /// Grows the arena when the free list cannot satisfy the request.
    pub fn allocate(&mut self, data: &[u8]) -> Result<BufferRange> {
        let range = self.reserve(data.len() as u64)?;
        self.buffer.update(range.offset, data)?;
        Ok(range)
    }

    /// Allocate a range without uploading anything.
    ///
    /// Grows the arena when the free list cannot satisfy the request.
    pub fn reserve(&mut self, size: u64) -> Result<BufferRange> {
        let offset = match self.free_list.alloc(size) {
            Ok(offset) => offset,
            Err(Error::OutOfFreeListSpace { requested, .. }) => {
                let needed = self.free_list.total_size() + requested;
                self.grow(needed)?;
                self.free_list.alloc(size)?
            }
            Err(err) => return Err(err),
        };
        Ok(BufferRange { offset, size })
    }

    /// Upload bytes into a previously allocated range
    pub fn write(&self, range: BufferRange, data: &[u8]) -> Result<()> {
        if data.len() as u64 > range.size {
            engine_bail!("nova3d::BufferArena",
                "Write of {} bytes exceeds range size {} in arena '{}'",
                data.len(), range.size, self.name);
        }
        self.buffer.update(range.offset, data)
    }

    /// Return a range to the free list.
    ///
    /// Doubles the free list's node table and retries when the node table
    /// is full; other errors (double free, invalid range) propagate.
    pub fn free(&mut self, range: BufferRange) -> Result<()> {
        match self.free_list.free(range.offset, range.size) {
            Err(Error::ExceededMaxAllocations) => {
                let total = self.free_list.total_size();
                let doubled = self.free_list.max_allocation_count().saturating_mul(2);
                engine_info!("nova3d::BufferArena",
                    "Arena '{}' free list node table full, growing to {} nodes",
                    self.name, doubled);
                self.free_list.resize_with_capacity(total, doubled)?;
                self.free_list.free(range.offset, range.size)
            }
            result => result,
        }
    }

    // ===== GROWTH =====

    /// Grow the backing buffer to at least `min_total` bytes, preserving
    /// contents. New space appears as free space at the high end.
    fn grow(&mut self, min_total: u64) -> Result<()> {
        let old_size = self.free_list.total_size();
        let new_size = (old_size * 2).max(min_total);

        let new_buffer = self
            .device
            .lock()
            .unwrap()
            .create_buffer(BufferDesc { size: new_size, usage: self.usage })?;

        // Migrate contents through the byte-range owner interface
        let mut contents = vec![0u8; old_size as usize];
        self.buffer.read(0, &mut contents)?;
        new_buffer.update(0, &contents)?;

        self.free_list.resize(new_size)?;
        self.buffer = new_buffer;

        engine_info!("nova3d::BufferArena",
            "Arena '{}' grown from {} to {} bytes", self.name, old_size, new_size);
        Ok(())
    }

    // ===== ACCESSORS =====

    /// Get the backing device buffer
    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    /// Sum of all free space in the arena
    pub fn free_space(&self) -> u64 {
        self.free_list.free_space()
    }

    /// Current arena size in bytes
    pub fn total_size(&self) -> u64 {
        self.free_list.total_size()
    }

    /// Arena name
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "buffer_arena_tests.rs"]
mod tests;
