/*!
# Nova 3D Engine — resource core

Sub-allocation and resource lifecycle systems for the Nova3D rendering
engine.

This crate provides the platform-agnostic resource layer: GPU backends
(Vulkan, Direct3D 12, etc.) implement the `GraphicsDevice` factory traits
and are injected at construction time.

## Architecture

- **FreeList**: linear sub-allocator partitioning one GPU buffer's address
  space into variable-size ranges with coalescing free-space management
- **BufferArena**: a device buffer paired with a `FreeList`, with automatic
  growth
- **HandlePool**: generational `(index, generation)` handle pool with
  reference-counted slots
- **ResourceRegistry**: name-deduplicated, refcounted resource lifecycle
  (textures, materials, geometries, shaders) over an injected device
- **ResourceManager**: owning facade with ordered construction and teardown

Backend implementations provide concrete types implementing the
`graphics_device` traits; `MockGraphicsDevice` ships for GPU-less testing.
*/

// Internal modules
pub mod error;
pub mod log;
pub mod allocator;
pub mod pool;
pub mod graphics_device;
pub mod resource;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Sub-allocation sub-module
    pub mod alloc {
        pub use crate::allocator::*;
    }

    // Handle pool sub-module
    pub mod pool {
        pub use crate::pool::*;
    }

    // Device sub-module with the backend factory traits
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}
