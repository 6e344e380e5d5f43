use super::*;

// ============================================================================
// Helpers
// ============================================================================

fn blocks_of(list: &FreeList) -> Vec<(u64, u64)> {
    list.blocks().map(|b| (b.offset, b.size)).collect()
}

/// No two free blocks may be adjacent, and offsets must ascend
fn assert_coalesced(list: &FreeList) {
    let blocks = blocks_of(list);
    for pair in blocks.windows(2) {
        let (offset_a, size_a) = pair[0];
        let (offset_b, _) = pair[1];
        assert!(offset_a + size_a < offset_b,
            "blocks ({}, {}) and ({}, _) are adjacent or out of order",
            offset_a, size_a, offset_b);
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_single_full_range_block() {
    let list = FreeList::new(512, 64).unwrap();
    assert_eq!(blocks_of(&list), vec![(0, 512)]);
    assert_eq!(list.free_space(), 512);
    assert_eq!(list.total_size(), 512);
    assert_eq!(list.block_count(), 1);
}

#[test]
fn test_new_zero_size_fails() {
    assert!(matches!(
        FreeList::new(0, 64),
        Err(Error::InvalidFreeListBlock { .. })
    ));
}

#[test]
fn test_new_zero_max_allocations_fails() {
    assert!(matches!(
        FreeList::new(512, 0),
        Err(Error::InvalidFreeListBlock { .. })
    ));
}

#[test]
fn test_node_capacity_bound() {
    // min(total_size / MIN_ALLOCATION_UNIT, max_allocation_count)
    let list = FreeList::new(64, 100).unwrap();
    assert_eq!(list.node_capacity(), 4); // 64 / 16

    let list = FreeList::new(1 << 20, 32).unwrap();
    assert_eq!(list.node_capacity(), 32);
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_alloc_carves_from_front() {
    let mut list = FreeList::new(512, 64).unwrap();
    assert_eq!(list.alloc(64).unwrap(), 0);
    assert_eq!(list.alloc(32).unwrap(), 64);
    assert_eq!(blocks_of(&list), vec![(96, 416)]);
}

#[test]
fn test_alloc_exact_fit_consumes_block() {
    let mut list = FreeList::new(512, 64).unwrap();
    assert_eq!(list.alloc(512).unwrap(), 0);
    assert_eq!(list.block_count(), 0);
    assert_eq!(list.free_space(), 0);
}

#[test]
fn test_alloc_first_fit_skips_small_blocks() {
    let mut list = FreeList::new(512, 64).unwrap();
    assert_eq!(list.alloc(64).unwrap(), 0);
    assert_eq!(list.alloc(32).unwrap(), 64);
    assert_eq!(list.alloc(64).unwrap(), 96);
    // Free the 32-byte hole at 64; first fitting block for 64 is at 160
    list.free(64, 32).unwrap();
    assert_eq!(list.alloc(64).unwrap(), 160);
    assert_eq!(blocks_of(&list), vec![(64, 32), (224, 288)]);
}

#[test]
fn test_alloc_zero_size_fails() {
    let mut list = FreeList::new(512, 64).unwrap();
    assert!(matches!(
        list.alloc(0),
        Err(Error::InvalidFreeListBlock { .. })
    ));
}

#[test]
fn test_alloc_out_of_space() {
    let mut list = FreeList::new(128, 64).unwrap();
    list.alloc(96).unwrap();
    let err = list.alloc(64).unwrap_err();
    assert_eq!(err, Error::OutOfFreeListSpace { requested: 64, available: 32 });
    // Recoverable: smaller allocations still succeed
    assert_eq!(list.alloc(32).unwrap(), 96);
}

#[test]
fn test_alloc_exact_fit_of_inner_block() {
    let mut list = FreeList::new(256, 64).unwrap();
    let a = list.alloc(32).unwrap();
    let _b = list.alloc(32).unwrap();
    list.free(a, 32).unwrap();
    // The 32-byte hole at 0 is an exact fit and is consumed whole
    assert_eq!(list.alloc(32).unwrap(), 0);
    assert_eq!(blocks_of(&list), vec![(64, 192)]);
}

// ============================================================================
// Free and coalescing
// ============================================================================

#[test]
fn test_free_merges_right() {
    let mut list = FreeList::new(256, 64).unwrap();
    list.alloc(64).unwrap();
    list.free(0, 64).unwrap();
    assert_eq!(blocks_of(&list), vec![(0, 256)]);
}

#[test]
fn test_free_merges_left() {
    let mut list = FreeList::new(256, 64).unwrap();
    list.alloc(64).unwrap(); // [0, 64)
    list.alloc(64).unwrap(); // [64, 128)
    list.free(0, 64).unwrap();   // isolated: [0, 64) free
    list.free(64, 64).unwrap();  // merges left into [0, 128), then right
    assert_eq!(blocks_of(&list), vec![(0, 256)]);
}

#[test]
fn test_free_bridges_both_sides() {
    let mut list = FreeList::new(256, 64).unwrap();
    let a = list.alloc(64).unwrap();
    let b = list.alloc(64).unwrap();
    let c = list.alloc(64).unwrap();
    list.free(a, 64).unwrap();
    list.free(c, 64).unwrap();
    // [128, 192) merged with the tail: [0, 64) and [128, 256) remain
    assert_eq!(list.block_count(), 2);
    assert_coalesced(&list);
    list.free(b, 64).unwrap(); // bridges everything
    assert_eq!(blocks_of(&list), vec![(0, 256)]);
}

#[test]
fn test_free_isolated_block() {
    let mut list = FreeList::new(256, 64).unwrap();
    list.alloc(32).unwrap();
    list.alloc(32).unwrap();
    list.alloc(32).unwrap();
    list.free(32, 32).unwrap();
    assert_eq!(blocks_of(&list), vec![(32, 32), (96, 160)]);
    assert_coalesced(&list);
}

#[test]
fn test_free_into_fully_allocated_list() {
    let mut list = FreeList::new(128, 64).unwrap();
    list.alloc(128).unwrap();
    assert_eq!(list.block_count(), 0);
    list.free(32, 32).unwrap();
    assert_eq!(blocks_of(&list), vec![(32, 32)]);
}

#[test]
fn test_double_free_detected() {
    let mut list = FreeList::new(256, 64).unwrap();
    let a = list.alloc(64).unwrap();
    list.alloc(64).unwrap(); // keeps the freed span isolated
    list.free(a, 64).unwrap();
    assert_eq!(list.free(a, 64), Err(Error::NodeAlreadyFreed { offset: 0 }));
}

#[test]
fn test_free_out_of_range_fails() {
    let mut list = FreeList::new(128, 64).unwrap();
    assert!(matches!(list.free(120, 16), Err(Error::InvalidFreeListBlock { .. })));
    assert!(matches!(list.free(0, 0), Err(Error::InvalidFreeListBlock { .. })));
}

#[test]
fn test_free_overlapping_free_space_fails() {
    let mut list = FreeList::new(256, 64).unwrap();
    list.alloc(64).unwrap();
    // [64, 256) is free; freeing [32, 96) overlaps it
    assert!(matches!(list.free(32, 64), Err(Error::InvalidFreeListBlock { .. })));
}

#[test]
fn test_exceeded_max_allocations() {
    // total 256, max 2 → node capacity 2
    let mut list = FreeList::new(256, 2).unwrap();
    assert_eq!(list.node_capacity(), 2);
    for _ in 0..8 {
        list.alloc(32).unwrap();
    }
    list.free(0, 32).unwrap();
    list.free(64, 32).unwrap();
    // A third isolated free block needs a third node
    assert_eq!(list.free(128, 32), Err(Error::ExceededMaxAllocations));
    // The failed free left state untouched
    assert_eq!(blocks_of(&list), vec![(0, 32), (64, 32)]);
}

// ============================================================================
// Conservation
// ============================================================================

#[test]
fn test_conservation_over_mixed_sequence() {
    let mut list = FreeList::new(1024, 64).unwrap();
    let mut live: Vec<(u64, u64)> = Vec::new();
    let sizes = [48u64, 16, 96, 32, 64, 16, 128, 80];

    for (step, &size) in sizes.iter().cycle().take(64).enumerate() {
        if step % 3 == 2 && !live.is_empty() {
            let (offset, size) = live.remove(step % live.len());
            list.free(offset, size).unwrap();
        } else if let Ok(offset) = list.alloc(size) {
            live.push((offset, size));
        }

        let live_total: u64 = live.iter().map(|&(_, s)| s).sum();
        assert_eq!(list.free_space() + live_total, 1024, "conservation broken at step {}", step);
        assert_coalesced(&list);
    }
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_restores_full_range() {
    let mut list = FreeList::new(512, 64).unwrap();
    list.alloc(64).unwrap();
    let b = list.alloc(64).unwrap();
    list.alloc(64).unwrap();
    list.free(b, 64).unwrap();
    list.reset();
    assert_eq!(blocks_of(&list), vec![(0, 512)]);
    assert_eq!(list.alloc(512).unwrap(), 0);
}

// ============================================================================
// copy_to / resize
// ============================================================================

#[test]
fn test_copy_to_smaller_fails() {
    let src = FreeList::new(512, 64).unwrap();
    let mut dst = FreeList::new(256, 64).unwrap();
    assert_eq!(src.copy_to(&mut dst), Err(Error::CannotCopyToSmallerFreeList));
}

#[test]
fn test_copy_to_same_size_mirrors_blocks() {
    let mut src = FreeList::new(512, 64).unwrap();
    src.alloc(64).unwrap();
    let b = src.alloc(64).unwrap();
    src.alloc(64).unwrap();
    src.free(b, 64).unwrap();

    let mut dst = FreeList::new(512, 64).unwrap();
    src.copy_to(&mut dst).unwrap();
    assert_eq!(blocks_of(&dst), blocks_of(&src));
}

#[test]
fn test_copy_to_larger_folds_delta_into_trailing_block() {
    let mut src = FreeList::new(512, 64).unwrap();
    src.alloc(64).unwrap();
    // Trailing free block [64, 512) touches the high end
    let mut dst = FreeList::new(768, 64).unwrap();
    src.copy_to(&mut dst).unwrap();
    assert_eq!(blocks_of(&dst), vec![(64, 704)]);
}

#[test]
fn test_copy_to_larger_appends_delta_when_end_is_allocated() {
    let mut src = FreeList::new(256, 64).unwrap();
    let a = src.alloc(64).unwrap();
    src.alloc(192).unwrap(); // consume through the high end
    src.free(a, 64).unwrap();
    assert_eq!(blocks_of(&src), vec![(0, 64)]);

    let mut dst = FreeList::new(512, 64).unwrap();
    src.copy_to(&mut dst).unwrap();
    assert_eq!(blocks_of(&dst), vec![(0, 64), (256, 256)]);
}

#[test]
fn test_resize_smaller_fails() {
    let mut list = FreeList::new(512, 64).unwrap();
    assert_eq!(list.resize(256), Err(Error::CannotResizeFreeListToSmallerSize));
    assert_eq!(list.total_size(), 512);
}

#[test]
fn test_resize_monotonicity() {
    let mut list = FreeList::new(512, 64).unwrap();
    list.alloc(128).unwrap();
    let b = list.alloc(64).unwrap();
    list.alloc(64).unwrap();
    list.free(b, 64).unwrap();

    let old_free = list.free_space();
    list.resize(2048).unwrap();
    assert_eq!(list.free_space(), old_free + (2048 - 512));
    assert_eq!(list.total_size(), 2048);
    assert_coalesced(&list);
}

#[test]
fn test_resize_fully_allocated_creates_trailing_block() {
    let mut list = FreeList::new(256, 64).unwrap();
    list.alloc(256).unwrap();
    list.resize(512).unwrap();
    assert_eq!(blocks_of(&list), vec![(256, 256)]);
}

#[test]
fn test_resize_preserves_existing_allocations() {
    let mut list = FreeList::new(256, 64).unwrap();
    let a = list.alloc(96).unwrap();
    list.resize(1024).unwrap();
    // The old range is still owned by the caller: freeing it works once
    list.free(a, 96).unwrap();
    assert_eq!(blocks_of(&list), vec![(0, 1024)]);
}

#[test]
fn test_resize_with_capacity_recovers_from_full_node_table() {
    let mut list = FreeList::new(256, 2).unwrap();
    for _ in 0..8 {
        list.alloc(32).unwrap();
    }
    list.free(0, 32).unwrap();
    list.free(64, 32).unwrap();
    assert_eq!(list.free(128, 32), Err(Error::ExceededMaxAllocations));

    list.resize_with_capacity(256, 8).unwrap();
    list.free(128, 32).unwrap();
    assert_eq!(blocks_of(&list), vec![(0, 32), (64, 32), (128, 32)]);
}

// ============================================================================
// Placement determinism
// ============================================================================

#[test]
fn test_first_fit_from_front_scenario() {
    let mut list = FreeList::new(512, 64).unwrap();
    assert_eq!(list.alloc(64).unwrap(), 0);
    assert_eq!(list.alloc(32).unwrap(), 64);
    assert_eq!(list.alloc(64).unwrap(), 96);
    list.free(64, 32).unwrap();
    assert_eq!(list.alloc(64).unwrap(), 160);
}
