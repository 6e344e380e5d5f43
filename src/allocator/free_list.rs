//! Linear sub-allocator with coalescing free-space management.
//!
//! A `FreeList` partitions one linear address space of fixed total size
//! (typically a GPU buffer) into variable-size allocations. Free regions
//! are kept in a fixed-capacity node arena threaded into a singly linked
//! chain sorted by ascending offset, so no heap allocation happens per
//! alloc/free once the list is constructed.
//!
//! # Invariants
//!
//! - Free blocks are disjoint and sorted by offset
//! - No two free blocks are adjacent (adjacent regions are always merged)
//! - A freshly constructed or `reset()` list has exactly one free block
//!   spanning `[0, total_size)`
//!
//! # Allocation strategy
//!
//! First-fit in ascending-offset order, carving from the front of the
//! first block that fits. This keeps low offsets densely packed and high
//! offsets free, which suits append-heavy workloads.

use crate::error::{Error, Result};

/// Sentinel node index marking the end of a chain
const NIL: u32 = u32::MAX;

/// Smallest allocation granularity used to bound the node table size.
///
/// The node table capacity is `min(total_size / MIN_ALLOCATION_UNIT,
/// max_allocation_count)`: a region can never fragment into more free
/// blocks than `total_size / MIN_ALLOCATION_UNIT`.
pub const MIN_ALLOCATION_UNIT: u64 = 16;

/// A contiguous free region of the allocator's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    /// Offset of the region's first byte
    pub offset: u64,
    /// Region size in bytes
    pub size: u64,
}

/// Block node: a free region plus its link in the offset-ordered chain.
///
/// Unused nodes are threaded into their own recycling chain through the
/// same `next` field.
#[derive(Debug, Clone, Copy)]
struct Node {
    offset: u64,
    size: u64,
    next: u32,
}

/// Linear sub-allocator over `[0, total_size)`
pub struct FreeList {
    /// Fixed-capacity node arena (never grows during normal operation)
    nodes: Vec<Node>,
    /// First free block in ascending-offset order (NIL = fully allocated)
    head: u32,
    /// First unused node slot (NIL = node table full)
    free_node_head: u32,
    /// Total size of the managed address space
    total_size: u64,
    /// Configured allocation-count bound (kept for resize)
    max_allocation_count: u32,
}

impl FreeList {
    /// Create an allocator over `[0, total_size)`.
    ///
    /// The node table capacity is `min(total_size / MIN_ALLOCATION_UNIT,
    /// max_allocation_count)`, at least 1.
    ///
    /// # Errors
    ///
    /// `InvalidFreeListBlock` when `total_size` or `max_allocation_count`
    /// is zero.
    pub fn new(total_size: u64, max_allocation_count: u32) -> Result<Self> {
        if total_size == 0 || max_allocation_count == 0 {
            return Err(Error::InvalidFreeListBlock { offset: 0, size: total_size });
        }

        let capacity = (total_size / MIN_ALLOCATION_UNIT)
            .min(max_allocation_count as u64)
            .max(1) as usize;

        let mut list = Self {
            nodes: vec![Node { offset: 0, size: 0, next: NIL }; capacity],
            head: NIL,
            free_node_head: NIL,
            total_size,
            max_allocation_count,
        };
        list.reset();
        Ok(list)
    }

    /// Collapse all state back to a single free block spanning the whole range
    pub fn reset(&mut self) {
        let capacity = self.nodes.len();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            *node = Node {
                offset: 0,
                size: 0,
                next: if index + 1 < capacity { (index + 1) as u32 } else { NIL },
            };
        }
        self.nodes[0] = Node { offset: 0, size: self.total_size, next: NIL };
        self.head = 0;
        self.free_node_head = if capacity > 1 { 1 } else { NIL };
    }

    // ===== ALLOCATION =====

    /// Allocate `size` bytes, returning the range's offset.
    ///
    /// Scans free blocks in ascending-offset order. An exact-size block is
    /// consumed whole; otherwise a prefix of the first larger block is
    /// carved from its front.
    ///
    /// # Errors
    ///
    /// - `InvalidFreeListBlock` for a zero-size request
    /// - `OutOfFreeListSpace` when no block is large enough
    pub fn alloc(&mut self, size: u64) -> Result<u64> {
        if size == 0 {
            return Err(Error::InvalidFreeListBlock { offset: 0, size });
        }

        let mut prev = NIL;
        let mut current = self.head;
        while current != NIL {
            let node = self.nodes[current as usize];
            if node.size == size {
                // Exact match: the block is consumed and its node recycled
                self.unlink(prev, current);
                self.recycle_node(current);
                return Ok(node.offset);
            }
            if node.size > size {
                // Carve the prefix; the block keeps its node
                let slot = &mut self.nodes[current as usize];
                slot.offset += size;
                slot.size -= size;
                return Ok(node.offset);
            }
            prev = current;
            current = node.next;
        }

        Err(Error::OutOfFreeListSpace {
            requested: size,
            available: self.free_space(),
        })
    }

    /// Return `[offset, offset + size)` to the free list.
    ///
    /// The freed span is inserted in offset order and merged with a free
    /// block touching it on either side, producing at most one resulting
    /// block.
    ///
    /// # Errors
    ///
    /// - `InvalidFreeListBlock` for zero size, out-of-range spans, or spans
    ///   overlapping existing free space
    /// - `NodeAlreadyFreed` when a free block already begins at `offset`
    /// - `ExceededMaxAllocations` when a new node is needed but the node
    ///   table is full (capacity misconfiguration — the caller may
    ///   `resize_with_capacity` and retry)
    pub fn free(&mut self, offset: u64, size: u64) -> Result<()> {
        let end = match offset.checked_add(size) {
            Some(end) if size > 0 && end <= self.total_size => end,
            _ => return Err(Error::InvalidFreeListBlock { offset, size }),
        };

        // Find the neighbors around the insertion point
        let mut prev = NIL;
        let mut next = self.head;
        while next != NIL && self.nodes[next as usize].offset < offset {
            prev = next;
            next = self.nodes[next as usize].next;
        }

        // Double-free detection by address
        if next != NIL && self.nodes[next as usize].offset == offset {
            return Err(Error::NodeAlreadyFreed { offset });
        }

        // Overlap with existing free space is corruption, not a double free
        if next != NIL && end > self.nodes[next as usize].offset {
            return Err(Error::InvalidFreeListBlock { offset, size });
        }
        if prev != NIL {
            let prev_node = self.nodes[prev as usize];
            if prev_node.offset + prev_node.size > offset {
                return Err(Error::InvalidFreeListBlock { offset, size });
            }
        }

        let merges_prev = prev != NIL && {
            let prev_node = self.nodes[prev as usize];
            prev_node.offset + prev_node.size == offset
        };
        let merges_next = next != NIL && end == self.nodes[next as usize].offset;

        match (merges_prev, merges_next) {
            // Bridges two blocks: fold both and the span into `prev`
            (true, true) => {
                let next_node = self.nodes[next as usize];
                let prev_slot = &mut self.nodes[prev as usize];
                prev_slot.size += size + next_node.size;
                prev_slot.next = next_node.next;
                self.recycle_node(next);
            }
            (true, false) => {
                self.nodes[prev as usize].size += size;
            }
            (false, true) => {
                let next_slot = &mut self.nodes[next as usize];
                next_slot.offset = offset;
                next_slot.size += size;
            }
            // Isolated span: needs a fresh node
            (false, false) => {
                let index = self.take_node().ok_or(Error::ExceededMaxAllocations)?;
                self.nodes[index as usize] = Node { offset, size, next };
                if prev == NIL {
                    self.head = index;
                } else {
                    self.nodes[prev as usize].next = index;
                }
            }
        }

        Ok(())
    }

    // ===== QUERIES =====

    /// Sum of all free-block sizes. O(free-block count).
    pub fn free_space(&self) -> u64 {
        self.blocks().map(|block| block.size).sum()
    }

    /// Total size of the managed address space
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Configured allocation-count bound
    pub fn max_allocation_count(&self) -> u32 {
        self.max_allocation_count
    }

    /// Node table capacity (fixed at construction)
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live free blocks
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Iterate over free blocks in ascending-offset order
    pub fn blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
        BlockIter { list: self, current: self.head }
    }

    // ===== RESIZE =====

    /// Reconstruct `dst`'s free-block chain to mirror this one.
    ///
    /// The size delta (`dst.total_size - self.total_size`) is folded into
    /// the trailing free block when it touches the high end, otherwise
    /// appended as a new block — growth always appears as additional free
    /// space at the high end. `dst`'s previous contents are discarded.
    ///
    /// # Errors
    ///
    /// - `CannotCopyToSmallerFreeList` when `dst.total_size < self.total_size`
    /// - `ExceededMaxAllocations` when `dst`'s node table cannot hold the
    ///   chain (checked before `dst` is touched)
    pub fn copy_to(&self, dst: &mut FreeList) -> Result<()> {
        if dst.total_size < self.total_size {
            return Err(Error::CannotCopyToSmallerFreeList);
        }

        let delta = dst.total_size - self.total_size;

        // One node per source block, plus one when the size delta cannot be
        // folded into a trailing free block
        let mut needed = 0usize;
        let mut source_end = 0u64;
        for block in self.blocks() {
            needed += 1;
            source_end = block.offset + block.size;
        }
        if delta > 0 && (needed == 0 || source_end != self.total_size) {
            needed += 1;
        }
        if needed > dst.nodes.len() {
            return Err(Error::ExceededMaxAllocations);
        }

        // Rebuild dst as an empty chain with every node recyclable
        let capacity = dst.nodes.len();
        for (index, node) in dst.nodes.iter_mut().enumerate() {
            *node = Node {
                offset: 0,
                size: 0,
                next: if index + 1 < capacity { (index + 1) as u32 } else { NIL },
            };
        }
        dst.head = NIL;
        dst.free_node_head = 0;

        let mut tail = NIL;
        let mut last_end = 0u64;
        for block in self.blocks() {
            let index = dst.take_node().ok_or(Error::ExceededMaxAllocations)?;
            dst.nodes[index as usize] = Node { offset: block.offset, size: block.size, next: NIL };
            if tail == NIL {
                dst.head = index;
            } else {
                dst.nodes[tail as usize].next = index;
            }
            tail = index;
            last_end = block.offset + block.size;
        }

        if delta > 0 {
            if tail != NIL && last_end == self.total_size {
                dst.nodes[tail as usize].size += delta;
            } else {
                let index = dst.take_node().ok_or(Error::ExceededMaxAllocations)?;
                dst.nodes[index as usize] = Node { offset: self.total_size, size: delta, next: NIL };
                if tail == NIL {
                    dst.head = index;
                } else {
                    dst.nodes[tail as usize].next = index;
                }
            }
        }

        Ok(())
    }

    /// Grow the address space to `new_total_size`, keeping the current
    /// allocation-count bound.
    ///
    /// # Errors
    ///
    /// `CannotResizeFreeListToSmallerSize` when shrinking; see
    /// [`FreeList::copy_to`] for migration failures (self is left intact).
    pub fn resize(&mut self, new_total_size: u64) -> Result<()> {
        let max_allocation_count = self.max_allocation_count;
        self.resize_with_capacity(new_total_size, max_allocation_count)
    }

    /// Grow the address space and the allocation-count bound together.
    ///
    /// Allocates a fresh instance, migrates all free-block state into it
    /// via [`FreeList::copy_to`], and atomically replaces self. The size
    /// delta appears as free space at the high end.
    pub fn resize_with_capacity(
        &mut self,
        new_total_size: u64,
        max_allocation_count: u32,
    ) -> Result<()> {
        if new_total_size < self.total_size {
            return Err(Error::CannotResizeFreeListToSmallerSize);
        }

        let mut grown = FreeList::new(new_total_size, max_allocation_count)?;
        self.copy_to(&mut grown)?;
        *self = grown;
        Ok(())
    }

    // ===== INTERNAL NODE ARENA =====

    /// Pop a node slot from the recycling chain
    fn take_node(&mut self) -> Option<u32> {
        if self.free_node_head == NIL {
            return None;
        }
        let index = self.free_node_head;
        self.free_node_head = self.nodes[index as usize].next;
        Some(index)
    }

    /// Push a node slot back onto the recycling chain
    fn recycle_node(&mut self, index: u32) {
        self.nodes[index as usize] = Node { offset: 0, size: 0, next: self.free_node_head };
        self.free_node_head = index;
    }

    /// Remove `current` from the block chain (its node is not recycled here)
    fn unlink(&mut self, prev: u32, current: u32) {
        let next = self.nodes[current as usize].next;
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
    }
}

/// Lazy walk of the offset-ordered block chain
struct BlockIter<'a> {
    list: &'a FreeList,
    current: u32,
}

impl Iterator for BlockIter<'_> {
    type Item = FreeBlock;

    fn next(&mut self) -> Option<FreeBlock> {
        if self.current == NIL {
            return None;
        }
        let node = self.list.nodes[self.current as usize];
        self.current = node.next;
        Some(FreeBlock { offset: node.offset, size: node.size })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "free_list_tests.rs"]
mod tests;
