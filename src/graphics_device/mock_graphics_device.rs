//! Mock graphics device (no GPU required)
//!
//! Byte-accurate in-memory backend used by the test suite and by callers
//! that want to exercise the resource systems without a real device.
//! Tracks create/destroy counts per object kind so tests can observe
//! resource lifecycle timing.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, GraphicsDevice, Shader, ShaderDesc, Texture, TextureDesc, TextureInfo,
};

// ============================================================================
// Shared statistics
// ============================================================================

#[derive(Debug, Default)]
struct StatsInner {
    textures_created: u32,
    textures_destroyed: u32,
    buffers_created: u32,
    buffers_destroyed: u32,
    shaders_created: u32,
    shaders_destroyed: u32,
    bytes_uploaded: u64,
}

/// Cloneable handle onto a mock device's counters.
///
/// Obtain one via `MockGraphicsDevice::stats()` before handing the device
/// to the code under test; counters stay observable afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockDeviceStats {
    inner: Arc<Mutex<StatsInner>>,
}

impl MockDeviceStats {
    fn with<R>(&self, f: impl FnOnce(&mut StatsInner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut inner)
    }

    /// Textures created minus textures destroyed
    pub fn live_textures(&self) -> u32 {
        self.with(|s| s.textures_created - s.textures_destroyed)
    }

    /// Buffers created minus buffers destroyed
    pub fn live_buffers(&self) -> u32 {
        self.with(|s| s.buffers_created - s.buffers_destroyed)
    }

    /// Shaders created minus shaders destroyed
    pub fn live_shaders(&self) -> u32 {
        self.with(|s| s.shaders_created - s.shaders_destroyed)
    }

    /// Total textures ever created
    pub fn textures_created(&self) -> u32 {
        self.with(|s| s.textures_created)
    }

    /// Total buffers ever created
    pub fn buffers_created(&self) -> u32 {
        self.with(|s| s.buffers_created)
    }

    /// Total shaders ever created
    pub fn shaders_created(&self) -> u32 {
        self.with(|s| s.shaders_created)
    }

    /// Total bytes pushed through buffer and texture updates
    pub fn bytes_uploaded(&self) -> u64 {
        self.with(|s| s.bytes_uploaded)
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
struct MockBuffer {
    data: Mutex<Vec<u8>>,
    stats: MockDeviceStats,
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.len() as u64
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut contents = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let end = offset as usize + data.len();
        if end > contents.len() {
            return Err(Error::BackendError(format!(
                "Buffer write at offset {} with size {} exceeds buffer size {}",
                offset,
                data.len(),
                contents.len()
            )));
        }
        contents[offset as usize..end].copy_from_slice(data);
        self.stats.with(|s| s.bytes_uploaded += data.len() as u64);
        Ok(())
    }

    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()> {
        let contents = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let end = offset as usize + out.len();
        if end > contents.len() {
            return Err(Error::BackendError(format!(
                "Buffer read at offset {} with size {} exceeds buffer size {}",
                offset,
                out.len(),
                contents.len()
            )));
        }
        out.copy_from_slice(&contents[offset as usize..end]);
        Ok(())
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.stats.with(|s| s.buffers_destroyed += 1);
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
struct MockTexture {
    info: TextureInfo,
    data: Mutex<Vec<u8>>,
    stats: MockDeviceStats,
}

impl MockTexture {
    fn byte_size(info: &TextureInfo) -> usize {
        (info.width * info.height * info.format.bytes_per_pixel()) as usize
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn update(&self, data: &[u8]) -> Result<()> {
        let expected = Self::byte_size(&self.info);
        if data.len() != expected {
            return Err(Error::BackendError(format!(
                "Texture update size {} does not match {}x{} ({} bytes)",
                data.len(),
                self.info.width,
                self.info.height,
                expected
            )));
        }
        let mut contents = self.data.lock().unwrap_or_else(|e| e.into_inner());
        contents.copy_from_slice(data);
        self.stats.with(|s| s.bytes_uploaded += data.len() as u64);
        Ok(())
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.stats.with(|s| s.textures_destroyed += 1);
    }
}

// ============================================================================
// Mock Shader
// ============================================================================

#[derive(Debug)]
struct MockShader {
    stage_count: usize,
    stats: MockDeviceStats,
}

impl Shader for MockShader {
    fn stage_count(&self) -> usize {
        self.stage_count
    }
}

impl Drop for MockShader {
    fn drop(&mut self) {
        self.stats.with(|s| s.shaders_destroyed += 1);
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// In-memory `GraphicsDevice` implementation
#[derive(Debug, Default)]
pub struct MockGraphicsDevice {
    stats: MockDeviceStats,
    fail_next_create: bool,
}

impl MockGraphicsDevice {
    /// Create a new mock device
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cloneable handle onto this device's counters
    pub fn stats(&self) -> MockDeviceStats {
        self.stats.clone()
    }

    /// Make the next `create_*` call fail with a backend error
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    fn check_injected_failure(&mut self) -> Result<()> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(Error::BackendError("injected create failure".to_string()));
        }
        Ok(())
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        self.check_injected_failure()?;

        let info = TextureInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
        };
        let byte_size = MockTexture::byte_size(&info);

        let texture = MockTexture {
            info,
            data: Mutex::new(vec![0u8; byte_size]),
            stats: self.stats.clone(),
        };
        self.stats.with(|s| s.textures_created += 1);

        if let Some(pixels) = desc.data {
            texture.update(&pixels)?;
        }
        Ok(Arc::new(texture))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.check_injected_failure()?;

        if desc.size == 0 {
            return Err(Error::BackendError("Buffer size must be non-zero".to_string()));
        }

        let buffer = MockBuffer {
            data: Mutex::new(vec![0u8; desc.size as usize]),
            stats: self.stats.clone(),
        };
        self.stats.with(|s| s.buffers_created += 1);
        Ok(Arc::new(buffer))
    }

    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        self.check_injected_failure()?;

        let shader = MockShader {
            stage_count: desc.stages.len(),
            stats: self.stats.clone(),
        };
        self.stats.with(|s| s.shaders_created += 1);
        Ok(Arc::new(shader))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
