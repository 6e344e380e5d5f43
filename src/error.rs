//! Error types for the Nova3D resource core
//!
//! This module defines the error types used throughout the crate,
//! covering sub-allocation, handle pools and resource lifecycle.
//!
//! Three families of failures exist:
//! - Capacity exhaustion (`OutOfFreeListSpace`, `ExceededMaxAllocations`,
//!   `PoolFull`): recoverable, the caller may grow backing storage
//! - Invalid reference (`StaleOrInvalidHandle`, `NodeAlreadyFreed`,
//!   `InvalidFreeListBlock`): usage errors, returned rather than aborted on
//! - Construction failure (`BackendError`, `InvalidResource`): propagated
//!   from the backend factory or descriptor validation

use std::fmt;

/// Result type for Nova3D resource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D resource core errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No free block is large enough to satisfy an allocation
    OutOfFreeListSpace {
        /// Requested allocation size in bytes
        requested: u64,
        /// Total free space remaining (fragmented)
        available: u64,
    },

    /// The free list's fixed block-node table is full
    ExceededMaxAllocations,

    /// A free block already begins at this offset (double free)
    NodeAlreadyFreed {
        /// Offset of the duplicate free
        offset: u64,
    },

    /// Block parameters are out of range or overlap existing free space
    InvalidFreeListBlock {
        /// Offset of the offending block
        offset: u64,
        /// Size of the offending block
        size: u64,
    },

    /// Destination free list is smaller than the source
    CannotCopyToSmallerFreeList,

    /// A free list can only be resized to a larger total size
    CannotResizeFreeListToSmallerSize,

    /// No free slot remains in the handle pool
    PoolFull,

    /// Handle generation mismatch or empty slot (use after free)
    StaleOrInvalidHandle,

    /// Backend-specific error (Vulkan, DirectX, etc.)
    BackendError(String),

    /// Invalid resource descriptor or resource state
    InvalidResource(String),
}

impl Error {
    /// Whether this error signals capacity exhaustion.
    ///
    /// Capacity errors are recoverable: the caller may grow the backing
    /// storage (or the node table) and retry.
    pub fn is_capacity_exhaustion(&self) -> bool {
        matches!(
            self,
            Error::OutOfFreeListSpace { .. } | Error::ExceededMaxAllocations | Error::PoolFull
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfFreeListSpace { requested, available } => write!(
                f,
                "Out of free list space: requested {} bytes, {} bytes remaining",
                requested, available
            ),
            Error::ExceededMaxAllocations => {
                write!(f, "Exceeded the free list's maximum allocation count")
            }
            Error::NodeAlreadyFreed { offset } => {
                write!(f, "Block at offset {} was already freed", offset)
            }
            Error::InvalidFreeListBlock { offset, size } => {
                write!(f, "Invalid free list block (offset {}, size {})", offset, size)
            }
            Error::CannotCopyToSmallerFreeList => {
                write!(f, "Cannot copy a free list into a smaller one")
            }
            Error::CannotResizeFreeListToSmallerSize => {
                write!(f, "Cannot resize a free list to a smaller size")
            }
            Error::PoolFull => write!(f, "Handle pool is full"),
            Error::StaleOrInvalidHandle => write!(f, "Stale or invalid handle"),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an `Error::InvalidResource`, logging it as an ERROR first
///
/// # Example
///
/// ```no_run
/// # use nova_3d_engine::engine_err;
/// let err = engine_err!("nova3d::Geometry", "Mesh '{}' not found", "hero");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::error::Error::InvalidResource(message)
    }};
}

/// Return early with an `Error::InvalidResource`, logging it as an ERROR
///
/// # Example
///
/// ```no_run
/// # use nova_3d_engine::{engine_bail, error::Result};
/// # fn check(stride: u64) -> Result<()> {
/// if stride == 0 {
///     engine_bail!("nova3d::Geometry", "Vertex stride must be non-zero");
/// }
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
