//! Shader resource.
//!
//! A registry-managed wrapper around a device shader program. Stages are
//! validated here so the registry's all-or-nothing construction contract
//! holds before the backend is asked to do anything.

use std::sync::{Arc, Mutex};

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{self, GraphicsDevice, ShaderStageDesc};
use crate::resource::Resource;

/// Descriptor for acquiring a shader through the registry
pub struct ShaderDesc {
    /// Device to create the backing shader program with
    pub device: Arc<Mutex<dyn GraphicsDevice>>,
    /// Stages making up the program (at least one)
    pub stages: Vec<ShaderStageDesc>,
}

/// A named, reference-counted shader program
pub struct Shader {
    shader: Option<Arc<dyn graphics_device::Shader>>,
    stage_count: usize,
}

impl Shader {
    /// Get the backing device shader
    pub fn device_shader(&self) -> &Arc<dyn graphics_device::Shader> {
        self.shader
            .as_ref()
            .expect("shader is live between construct and destroy")
    }

    /// Number of stages in the program
    pub fn stage_count(&self) -> usize {
        self.stage_count
    }
}

impl Resource for Shader {
    type Desc = ShaderDesc;

    fn construct(desc: ShaderDesc) -> Result<Self> {
        if desc.stages.is_empty() {
            engine_bail!("nova3d::Shader", "Shader program needs at least one stage");
        }
        for stage in &desc.stages {
            if stage.code.is_empty() {
                engine_bail!("nova3d::Shader",
                    "Stage {:?} has empty code", stage.stage);
            }
            // SPIR-V is a stream of 32-bit words
            if stage.code.len() % 4 != 0 {
                engine_bail!("nova3d::Shader",
                    "Stage {:?} code is {} bytes, not a multiple of 4",
                    stage.stage, stage.code.len());
            }
        }

        let stage_count = desc.stages.len();
        let shader = desc
            .device
            .lock()
            .unwrap()
            .create_shader(graphics_device::ShaderDesc { stages: desc.stages })?;
        Ok(Self { shader: Some(shader), stage_count })
    }

    fn destroy(&mut self) -> Result<()> {
        self.shader.take();
        Ok(())
    }

    fn kind() -> &'static str {
        "Shader"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
