//! Graphics device module - the injected backend object factory
//!
//! The resource core never talks to a GPU API directly. A backend
//! (Vulkan, Direct3D 12, a mock) implements `GraphicsDevice` and the
//! per-kind object traits; resources hold the returned `Arc<dyn ...>`
//! objects and destruction is dropping the last reference.

use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;

use crate::error::Result;

pub mod mock_graphics_device;

pub use mock_graphics_device::{MockGraphicsDevice, MockDeviceStats};

// ============================================================================
// Texture types
// ============================================================================

/// Pixel format of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
}

impl TextureFormat {
    /// Size of one pixel in bytes
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8_UNORM => 1,
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM => 4,
            TextureFormat::R16G16B16A16_SFLOAT => 8,
        }
    }
}

bitflags! {
    /// How a texture will be used by the pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureUsage: u32 {
        const SAMPLED       = 1 << 0;
        const TRANSFER_DST  = 1 << 1;
        const RENDER_TARGET = 1 << 2;
    }
}

/// Immutable description of a created texture
#[derive(Debug, Clone, Copy)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags
    pub usage: TextureUsage,
}

/// Descriptor for creating a device texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels (non-zero)
    pub width: u32,
    /// Height in pixels (non-zero)
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags
    pub usage: TextureUsage,
    /// Optional initial pixel data (tightly packed, `width * height * bpp`)
    pub data: Option<Vec<u8>>,
}

/// Device texture trait
pub trait Texture: Send + Sync + fmt::Debug {
    /// Get the texture description
    fn info(&self) -> &TextureInfo;

    /// Replace the whole pixel contents
    fn update(&self, data: &[u8]) -> Result<()>;
}

// ============================================================================
// Buffer types
// ============================================================================

bitflags! {
    /// How a buffer will be used by the pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufferUsage: u32 {
        const VERTEX       = 1 << 0;
        const INDEX        = 1 << 1;
        const UNIFORM      = 1 << 2;
        const STORAGE      = 1 << 3;
        const TRANSFER_SRC = 1 << 4;
        const TRANSFER_DST = 1 << 5;
    }
}

/// Descriptor for creating a device buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc {
    /// Buffer size in bytes (non-zero)
    pub size: u64,
    /// Usage flags
    pub usage: BufferUsage,
}

/// Device buffer trait - the byte-range owner the sub-allocator hands
/// offsets into
pub trait Buffer: Send + Sync + fmt::Debug {
    /// Buffer size in bytes
    fn size(&self) -> u64;

    /// Upload bytes at an offset previously returned by the sub-allocator
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Read bytes back into `out` (used when a buffer arena grows and to
    /// verify uploads in tests)
    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()>;
}

// ============================================================================
// Shader types
// ============================================================================

/// Pipeline stage a shader module belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// One shader module of a shader program
#[derive(Debug, Clone)]
pub struct ShaderStageDesc {
    /// Pipeline stage
    pub stage: ShaderStage,
    /// Compiled shader code (SPIR-V words, 4-byte aligned)
    pub code: Vec<u8>,
    /// Entry point function name
    pub entry_point: String,
}

/// Descriptor for creating a device shader program
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Stages making up the program (at least one)
    pub stages: Vec<ShaderStageDesc>,
}

/// Device shader program trait
pub trait Shader: Send + Sync + fmt::Debug {
    /// Number of stages in the program
    fn stage_count(&self) -> usize;
}

// ============================================================================
// Index type
// ============================================================================

/// Element type of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Size of one index in bytes
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Main device trait
///
/// This is the central factory interface for creating GPU resources.
/// Implemented by backend-specific devices (e.g., VulkanDevice) and by
/// `MockGraphicsDevice` for GPU-less tests. Destroying a resource is
/// dropping the last `Arc` to it.
pub trait GraphicsDevice: Send + Sync {
    /// Create a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture descriptor
    ///
    /// # Returns
    ///
    /// A shared pointer to the created texture
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor
    ///
    /// # Returns
    ///
    /// A shared pointer to the created buffer
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a shader program
    ///
    /// # Arguments
    ///
    /// * `desc` - Shader descriptor
    ///
    /// # Returns
    ///
    /// A shared pointer to the created shader
    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;
}
