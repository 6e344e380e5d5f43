//! Sub-allocation module
//!
//! Partitions linear GPU buffer address space into variable-size ranges.

mod free_list;
mod buffer_arena;

pub use free_list::{FreeList, FreeBlock, MIN_ALLOCATION_UNIT};
pub use buffer_arena::{BufferArena, BufferArenaDesc, BufferRange};
