//! Texture resource.
//!
//! A registry-managed wrapper around a device texture. The device object
//! is held as an `Arc`; destruction drops the last reference, which is
//! when the backend reclaims GPU memory.

use std::sync::{Arc, Mutex};

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{self, GraphicsDevice, TextureFormat, TextureInfo, TextureUsage};
use crate::resource::Resource;

/// Descriptor for acquiring a texture through the registry
pub struct TextureDesc {
    /// Device to create the backing texture with
    pub device: Arc<Mutex<dyn GraphicsDevice>>,
    /// Width in pixels (non-zero)
    pub width: u32,
    /// Height in pixels (non-zero)
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags (TRANSFER_DST is added when pixel data is supplied)
    pub usage: TextureUsage,
    /// Optional initial pixel data, tightly packed `width * height * bpp`
    pub pixels: Option<Vec<u8>>,
}

/// A named, reference-counted texture
pub struct Texture {
    texture: Option<Arc<dyn graphics_device::Texture>>,
}

impl Texture {
    /// Get the backing device texture
    pub fn device_texture(&self) -> &Arc<dyn graphics_device::Texture> {
        self.texture
            .as_ref()
            .expect("texture is live between construct and destroy")
    }

    /// Texture dimensions and format
    pub fn info(&self) -> &TextureInfo {
        self.device_texture().info()
    }

    /// Replace the whole pixel contents.
    ///
    /// `pixels` must be exactly `width * height * bytes_per_pixel` bytes.
    pub fn write_pixels(&self, pixels: &[u8]) -> Result<()> {
        let info = *self.info();
        validate_pixel_len(info.width, info.height, info.format, pixels.len())?;
        self.device_texture().update(pixels)
    }
}

impl Resource for Texture {
    type Desc = TextureDesc;

    fn construct(desc: TextureDesc) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("nova3d::Texture",
                "Texture extent must be non-zero, got {}x{}", desc.width, desc.height);
        }
        if let Some(pixels) = &desc.pixels {
            validate_pixel_len(desc.width, desc.height, desc.format, pixels.len())?;
        }

        let mut usage = desc.usage;
        if desc.pixels.is_some() {
            usage |= TextureUsage::TRANSFER_DST;
        }

        let texture = desc.device.lock().unwrap().create_texture(
            graphics_device::TextureDesc {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage,
                data: desc.pixels,
            },
        )?;
        Ok(Self { texture: Some(texture) })
    }

    fn destroy(&mut self) -> Result<()> {
        // Dropping the last Arc is what releases the backend object
        self.texture.take();
        Ok(())
    }

    fn kind() -> &'static str {
        "Texture"
    }
}

fn validate_pixel_len(
    width: u32,
    height: u32,
    format: TextureFormat,
    len: usize,
) -> Result<()> {
    let expected = width as u64 * height as u64 * format.bytes_per_pixel() as u64;
    if len as u64 != expected {
        engine_bail!("nova3d::Texture",
            "Pixel data is {} bytes, expected {} for {}x{} {:?}",
            len, expected, width, height, format);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
