//! Geometry resource.
//!
//! Unlike textures and shaders, a geometry does not own a device object.
//! All geometries share two large device buffers (one for vertices, one
//! for indices), each partitioned by a free list; a geometry owns the
//! byte ranges it was carved from and returns them on destruction.

use std::sync::{Arc, Mutex};

use crate::allocator::{BufferArena, BufferArenaDesc, BufferRange};
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{BufferUsage, GraphicsDevice, IndexType};
use crate::resource::Resource;

// ============================================================================
// SHARED BUFFERS
// ============================================================================

/// Descriptor for creating the shared geometry buffers
pub struct GeometryBuffersDesc {
    /// Device to create the backing buffers with
    pub device: Arc<Mutex<dyn GraphicsDevice>>,
    /// Initial vertex buffer size in bytes
    pub vertex_buffer_size: u64,
    /// Initial index buffer size in bytes
    pub index_buffer_size: u64,
    /// Free list allocation-count bound for each arena
    pub max_allocations: u32,
}

/// The vertex and index arenas every geometry sub-allocates from
pub struct GeometryBuffers {
    vertex_arena: BufferArena,
    index_arena: BufferArena,
}

impl GeometryBuffers {
    /// Create both arenas with fresh device buffers
    pub fn from_desc(desc: GeometryBuffersDesc) -> Result<Self> {
        let vertex_arena = BufferArena::from_desc(BufferArenaDesc {
            device: desc.device.clone(),
            usage: BufferUsage::VERTEX,
            size: desc.vertex_buffer_size,
            max_allocations: desc.max_allocations,
            name: "geometry_vertex".to_string(),
        })?;
        let index_arena = BufferArena::from_desc(BufferArenaDesc {
            device: desc.device,
            usage: BufferUsage::INDEX,
            size: desc.index_buffer_size,
            max_allocations: desc.max_allocations,
            name: "geometry_index".to_string(),
        })?;
        Ok(Self { vertex_arena, index_arena })
    }

    /// Get the vertex arena
    pub fn vertex_arena(&self) -> &BufferArena {
        &self.vertex_arena
    }

    /// Get the index arena
    pub fn index_arena(&self) -> &BufferArena {
        &self.index_arena
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Descriptor for acquiring a geometry through the registry
pub struct GeometryDesc {
    /// Shared arenas to sub-allocate from
    pub buffers: Arc<Mutex<GeometryBuffers>>,
    /// Interleaved vertex bytes (non-empty, a multiple of `vertex_stride`)
    pub vertex_data: Vec<u8>,
    /// Size of one vertex in bytes (non-zero)
    pub vertex_stride: u32,
    /// Optional index bytes (a multiple of the index element size)
    pub index_data: Option<Vec<u8>>,
    /// Element type of the index data
    pub index_type: IndexType,
}

/// A named, reference-counted geometry: byte ranges in the shared buffers
pub struct Geometry {
    buffers: Arc<Mutex<GeometryBuffers>>,
    vertex_range: BufferRange,
    index_range: Option<BufferRange>,
    vertex_stride: u32,
    vertex_count: u32,
    index_type: IndexType,
    index_count: u32,
    /// Ranges already returned to the arenas
    destroyed: bool,
}

impl Geometry {
    /// Range in the shared vertex buffer
    pub fn vertex_range(&self) -> BufferRange {
        self.vertex_range
    }

    /// Range in the shared index buffer, if indexed
    pub fn index_range(&self) -> Option<BufferRange> {
        self.index_range
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Size of one vertex in bytes
    pub fn vertex_stride(&self) -> u32 {
        self.vertex_stride
    }

    /// Number of indices (0 when non-indexed)
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Element type of the index data
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Whether the geometry draws through an index buffer
    pub fn is_indexed(&self) -> bool {
        self.index_range.is_some()
    }

    /// Overwrite the vertex range contents in place.
    ///
    /// `data` must not exceed the allocated range; the vertex count is
    /// recomputed from the new length.
    pub fn write_vertices(&mut self, data: &[u8]) -> Result<()> {
        if data.len() as u64 > self.vertex_range.size {
            engine_bail!("nova3d::Geometry",
                "Vertex update of {} bytes exceeds allocated range of {} bytes",
                data.len(), self.vertex_range.size);
        }
        if data.len() % self.vertex_stride as usize != 0 {
            engine_bail!("nova3d::Geometry",
                "Vertex update of {} bytes is not a multiple of stride {}",
                data.len(), self.vertex_stride);
        }
        let buffers = self.buffers.lock().unwrap();
        buffers.vertex_arena.write(self.vertex_range, data)?;
        self.vertex_count = (data.len() / self.vertex_stride as usize) as u32;
        Ok(())
    }
}

impl Resource for Geometry {
    type Desc = GeometryDesc;

    fn construct(desc: GeometryDesc) -> Result<Self> {
        if desc.vertex_stride == 0 {
            engine_bail!("nova3d::Geometry", "Vertex stride must be non-zero");
        }
        if desc.vertex_data.is_empty() {
            engine_bail!("nova3d::Geometry", "Geometry needs vertex data");
        }
        if desc.vertex_data.len() % desc.vertex_stride as usize != 0 {
            engine_bail!("nova3d::Geometry",
                "Vertex data is {} bytes, not a multiple of stride {}",
                desc.vertex_data.len(), desc.vertex_stride);
        }
        if let Some(index_data) = &desc.index_data {
            let element = desc.index_type.size_bytes() as usize;
            if index_data.is_empty() || index_data.len() % element != 0 {
                engine_bail!("nova3d::Geometry",
                    "Index data is {} bytes, not a non-empty multiple of {}",
                    index_data.len(), element);
            }
        }

        let vertex_count = (desc.vertex_data.len() / desc.vertex_stride as usize) as u32;

        let (vertex_range, index_range, index_count) = {
            let mut buffers = desc.buffers.lock().unwrap();
            let vertex_range = buffers.vertex_arena.allocate(&desc.vertex_data)?;

            match &desc.index_data {
                Some(index_data) => match buffers.index_arena.allocate(index_data) {
                    Ok(index_range) => {
                        let count =
                            (index_data.len() / desc.index_type.size_bytes() as usize) as u32;
                        (vertex_range, Some(index_range), count)
                    }
                    Err(err) => {
                        // All-or-nothing: the vertex range goes back
                        buffers.vertex_arena.free(vertex_range)?;
                        return Err(err);
                    }
                },
                None => (vertex_range, None, 0),
            }
        };

        Ok(Self {
            buffers: desc.buffers,
            vertex_range,
            index_range,
            vertex_stride: desc.vertex_stride,
            vertex_count,
            index_type: desc.index_type,
            index_count,
            destroyed: false,
        })
    }

    fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;

        let mut buffers = self.buffers.lock().unwrap();
        buffers.vertex_arena.free(self.vertex_range)?;
        if let Some(index_range) = self.index_range.take() {
            buffers.index_arena.free(index_range)?;
        }
        Ok(())
    }

    fn kind() -> &'static str {
        "Geometry"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
