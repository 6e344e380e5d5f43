//! Resource manager facade.
//!
//! Owns the four resource registries, the shared geometry buffers and the
//! injected device handle. Systems receive a `&mut ResourceManager` (or a
//! registry reference) instead of reaching for globals; constructing one
//! builds every default resource bottom-up, and shutdown tears the
//! registries down in dependency order.

use std::sync::{Arc, Mutex};

use crate::engine_info;
use crate::error::Result;
use crate::graphics_device::{
    GraphicsDevice, IndexType, ShaderStage, ShaderStageDesc, TextureFormat, TextureUsage,
};
use crate::resource::geometry::{Geometry, GeometryBuffers, GeometryBuffersDesc, GeometryDesc};
use crate::resource::material::{Material, MaterialDesc, MaterialTextureSlot};
use crate::resource::registry::ResourceRegistry;
use crate::resource::shader::{Shader, ShaderDesc};
use crate::resource::texture::{Texture, TextureDesc};

const SOURCE: &str = "nova3d::ResourceManager";

/// Name every registry's default record is registered under
pub const DEFAULT_RESOURCE_NAME: &str = "default";

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Descriptor for creating a `ResourceManager`
pub struct ResourceManagerDesc {
    /// Device all backend objects are created with
    pub device: Arc<Mutex<dyn GraphicsDevice>>,
    /// Registry capacities
    pub texture_capacity: u32,
    pub material_capacity: u32,
    pub geometry_capacity: u32,
    pub shader_capacity: u32,
    /// Initial shared vertex buffer size in bytes
    pub vertex_buffer_size: u64,
    /// Initial shared index buffer size in bytes
    pub index_buffer_size: u64,
    /// Free list allocation-count bound for the geometry arenas
    pub max_geometry_allocations: u32,
    /// Stages of the default shader; a built-in placeholder when empty
    pub default_shader_stages: Vec<ShaderStageDesc>,
}

impl ResourceManagerDesc {
    /// Sensible defaults around an injected device
    pub fn new(device: Arc<Mutex<dyn GraphicsDevice>>) -> Self {
        Self {
            device,
            texture_capacity: 1024,
            material_capacity: 1024,
            geometry_capacity: 4096,
            shader_capacity: 64,
            vertex_buffer_size: 64 * 1024 * 1024,
            index_buffer_size: 16 * 1024 * 1024,
            max_geometry_allocations: 4096,
            default_shader_stages: Vec::new(),
        }
    }
}

// ============================================================================
// MANAGER
// ============================================================================

/// Dependency-injected owner of all resource registries.
///
/// Field order is teardown order: materials reference shaders and
/// textures, geometries reference the shared buffers, so registries drop
/// before the buffers and the buffers before the device handle.
pub struct ResourceManager {
    materials: ResourceRegistry<Material>,
    geometries: ResourceRegistry<Geometry>,
    textures: ResourceRegistry<Texture>,
    shaders: ResourceRegistry<Shader>,
    geometry_buffers: Arc<Mutex<GeometryBuffers>>,
    device: Arc<Mutex<dyn GraphicsDevice>>,
}

impl ResourceManager {
    /// Build the manager and every default resource
    pub fn from_desc(desc: ResourceManagerDesc) -> Result<Self> {
        let device = desc.device;

        let geometry_buffers = Arc::new(Mutex::new(GeometryBuffers::from_desc(
            GeometryBuffersDesc {
                device: device.clone(),
                vertex_buffer_size: desc.vertex_buffer_size,
                index_buffer_size: desc.index_buffer_size,
                max_allocations: desc.max_geometry_allocations,
            },
        )?));

        let shaders = ResourceRegistry::new(
            desc.shader_capacity,
            DEFAULT_RESOURCE_NAME,
            ShaderDesc {
                device: device.clone(),
                stages: if desc.default_shader_stages.is_empty() {
                    vec![placeholder_stage()]
                } else {
                    desc.default_shader_stages
                },
            },
        )?;

        let textures = ResourceRegistry::new(
            desc.texture_capacity,
            DEFAULT_RESOURCE_NAME,
            TextureDesc {
                device: device.clone(),
                width: DEFAULT_TEXTURE_DIM,
                height: DEFAULT_TEXTURE_DIM,
                format: TextureFormat::R8G8B8A8_UNORM,
                usage: TextureUsage::SAMPLED,
                pixels: Some(default_texture_pixels()),
            },
        )?;

        let geometries = ResourceRegistry::new(
            desc.geometry_capacity,
            DEFAULT_RESOURCE_NAME,
            default_geometry_desc(&geometry_buffers),
        )?;

        let materials = ResourceRegistry::new(
            desc.material_capacity,
            DEFAULT_RESOURCE_NAME,
            MaterialDesc {
                shader: shaders.default_handle(),
                textures: vec![MaterialTextureSlot {
                    name: "albedo".to_string(),
                    texture: textures.default_handle(),
                }],
                params: Vec::new(),
            },
        )?;

        engine_info!(SOURCE, "Resource manager initialized");
        Ok(Self {
            materials,
            geometries,
            textures,
            shaders,
            geometry_buffers,
            device,
        })
    }

    // ===== REGISTRIES =====

    /// Texture registry
    pub fn textures(&self) -> &ResourceRegistry<Texture> {
        &self.textures
    }

    /// Texture registry, mutable
    pub fn textures_mut(&mut self) -> &mut ResourceRegistry<Texture> {
        &mut self.textures
    }

    /// Material registry
    pub fn materials(&self) -> &ResourceRegistry<Material> {
        &self.materials
    }

    /// Material registry, mutable
    pub fn materials_mut(&mut self) -> &mut ResourceRegistry<Material> {
        &mut self.materials
    }

    /// Geometry registry
    pub fn geometries(&self) -> &ResourceRegistry<Geometry> {
        &self.geometries
    }

    /// Geometry registry, mutable
    pub fn geometries_mut(&mut self) -> &mut ResourceRegistry<Geometry> {
        &mut self.geometries
    }

    /// Shader registry
    pub fn shaders(&self) -> &ResourceRegistry<Shader> {
        &self.shaders
    }

    /// Shader registry, mutable
    pub fn shaders_mut(&mut self) -> &mut ResourceRegistry<Shader> {
        &mut self.shaders
    }

    // ===== SHARED STATE =====

    /// Shared vertex/index arenas geometries sub-allocate from
    pub fn geometry_buffers(&self) -> &Arc<Mutex<GeometryBuffers>> {
        &self.geometry_buffers
    }

    /// Injected graphics device
    pub fn device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.device
    }

    // ===== TEARDOWN =====

    /// Destroy every non-default resource, dependents first.
    ///
    /// Materials go before the shaders and textures they reference,
    /// geometries before the shared buffers. Default records stay live
    /// until the manager is dropped.
    pub fn shutdown(&mut self) {
        engine_info!(SOURCE, "Resource manager shutting down");
        self.materials.remove_all();
        self.geometries.remove_all();
        self.textures.remove_all();
        self.shaders.remove_all();
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        // Registry Drop impls then destroy the defaults in field order
        self.shutdown();
    }
}

// ============================================================================
// DEFAULT RESOURCES
// ============================================================================

const DEFAULT_TEXTURE_DIM: u32 = 16;
const DEFAULT_GEOMETRY_STRIDE: u32 = 32;

/// Magenta/black checkerboard, the classic "missing texture" pattern
fn default_texture_pixels() -> Vec<u8> {
    let dim = DEFAULT_TEXTURE_DIM as usize;
    let mut pixels = Vec::with_capacity(dim * dim * 4);
    for y in 0..dim {
        for x in 0..dim {
            let magenta = (x / 4 + y / 4) % 2 == 0;
            if magenta {
                pixels.extend_from_slice(&[0xFF, 0x00, 0xFF, 0xFF]);
            } else {
                pixels.extend_from_slice(&[0x00, 0x00, 0x00, 0xFF]);
            }
        }
    }
    pixels
}

/// Placeholder single-stage program used when no default shader is given
fn placeholder_stage() -> ShaderStageDesc {
    ShaderStageDesc {
        stage: ShaderStage::Vertex,
        code: vec![0u8; 4],
        entry_point: "main".to_string(),
    }
}

/// A unit quad: 4 vertices, 6 indices
fn default_geometry_desc(buffers: &Arc<Mutex<GeometryBuffers>>) -> GeometryDesc {
    let indices: [u16; 6] = [0, 1, 2, 2, 3, 0];
    GeometryDesc {
        buffers: buffers.clone(),
        vertex_data: vec![0u8; 4 * DEFAULT_GEOMETRY_STRIDE as usize],
        vertex_stride: DEFAULT_GEOMETRY_STRIDE,
        index_data: Some(bytemuck::cast_slice(&indices).to_vec()),
        index_type: IndexType::U16,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
