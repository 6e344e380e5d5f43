//! Resource management module
//!
//! Named, reference-counted lifecycle management for engine resources
//! (textures, materials, geometries, shaders) over an injected graphics
//! device.

mod registry;
mod resource_manager;
pub mod texture;
pub mod material;
pub mod geometry;
pub mod shader;

pub use registry::{Resource, ResourceRegistry};
pub use resource_manager::{ResourceManager, ResourceManagerDesc, DEFAULT_RESOURCE_NAME};
pub use texture::{Texture, TextureDesc};
pub use material::{Material, MaterialDesc, MaterialTextureSlot, ParamValue};
pub use geometry::{Geometry, GeometryBuffers, GeometryBuffersDesc, GeometryDesc};
pub use shader::{Shader, ShaderDesc};
