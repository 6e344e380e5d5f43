//! Material resource.
//!
//! A material is pure data: a shader handle, named texture slots and
//! named shader parameters. It owns no backend objects, so destruction is
//! trivial. Texture and shader handles are held without taking references;
//! render code resolves them through `get_or_default`, so a destroyed
//! dependency degrades to the default resource instead of failing.

use bytemuck::bytes_of;

use crate::engine_bail;
use crate::error::Result;
use crate::pool::Handle;
use crate::resource::Resource;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Value of one shader parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl ParamValue {
    /// std140 base alignment of the value
    fn alignment(&self) -> usize {
        match self {
            ParamValue::Float(_) | ParamValue::Int(_) => 4,
            ParamValue::Vec2(_) => 8,
            // vec3 aligns like vec4 but occupies only 12 bytes
            ParamValue::Vec3(_) | ParamValue::Vec4(_) | ParamValue::Mat4(_) => 16,
        }
    }

    fn write_bytes(&self, out: &mut Vec<u8>) {
        match self {
            ParamValue::Float(v) => out.extend_from_slice(bytes_of(v)),
            ParamValue::Int(v) => out.extend_from_slice(bytes_of(v)),
            ParamValue::Vec2(v) => out.extend_from_slice(bytes_of(v)),
            ParamValue::Vec3(v) => out.extend_from_slice(bytes_of(v)),
            ParamValue::Vec4(v) => out.extend_from_slice(bytes_of(v)),
            ParamValue::Mat4(v) => out.extend_from_slice(bytes_of(v)),
        }
    }
}

/// A named texture binding
#[derive(Debug, Clone)]
pub struct MaterialTextureSlot {
    /// Binding name, e.g. "albedo"
    pub name: String,
    /// Texture registry handle (not reference-owned)
    pub texture: Handle,
}

// ============================================================================
// MATERIAL
// ============================================================================

/// Descriptor for acquiring a material through the registry
pub struct MaterialDesc {
    /// Shader registry handle (not reference-owned)
    pub shader: Handle,
    /// Named texture bindings, unique by name
    pub textures: Vec<MaterialTextureSlot>,
    /// Named shader parameters, unique by name, packed in this order
    pub params: Vec<(String, ParamValue)>,
}

/// A named, reference-counted material
pub struct Material {
    shader: Handle,
    textures: Vec<MaterialTextureSlot>,
    params: Vec<(String, ParamValue)>,
}

impl Material {
    /// Shader handle to resolve through the shader registry
    pub fn shader(&self) -> Handle {
        self.shader
    }

    /// All texture slots, in declaration order
    pub fn texture_slots(&self) -> &[MaterialTextureSlot] {
        &self.textures
    }

    /// Texture handle bound under `name`, if any
    pub fn texture(&self, name: &str) -> Option<Handle> {
        self.textures
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.texture)
    }

    /// All parameters, in declaration (and packing) order
    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    /// Value of the parameter named `name`, if any
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| *value)
    }

    /// Overwrite an existing parameter's value.
    ///
    /// The new value must have the same variant as the old one, since the
    /// packed layout is fixed at construction.
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let slot = match self.params.iter_mut().find(|(param, _)| param == name) {
            Some(slot) => slot,
            None => {
                engine_bail!("nova3d::Material", "Unknown material parameter '{}'", name);
            }
        };
        if std::mem::discriminant(&slot.1) != std::mem::discriminant(&value) {
            engine_bail!("nova3d::Material",
                "Parameter '{}' is {:?}, cannot assign {:?}", name, slot.1, value);
        }
        slot.1 = value;
        Ok(())
    }

    /// Pack all parameters into an std140 uniform block layout.
    ///
    /// Members appear in declaration order at their std140 alignment; the
    /// block is padded to a 16-byte multiple.
    pub fn pack_params(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, value) in &self.params {
            let alignment = value.alignment();
            while out.len() % alignment != 0 {
                out.push(0);
            }
            value.write_bytes(&mut out);
        }
        while out.len() % 16 != 0 {
            out.push(0);
        }
        out
    }
}

impl Resource for Material {
    type Desc = MaterialDesc;

    fn construct(desc: MaterialDesc) -> Result<Self> {
        for (i, slot) in desc.textures.iter().enumerate() {
            if desc.textures[..i].iter().any(|other| other.name == slot.name) {
                engine_bail!("nova3d::Material",
                    "Duplicate texture slot name '{}'", slot.name);
            }
        }
        for (i, (name, _)) in desc.params.iter().enumerate() {
            if desc.params[..i].iter().any(|(other, _)| other == name) {
                engine_bail!("nova3d::Material",
                    "Duplicate parameter name '{}'", name);
            }
        }

        Ok(Self {
            shader: desc.shader,
            textures: desc.textures,
            params: desc.params,
        })
    }

    fn destroy(&mut self) -> Result<()> {
        // Handles are not reference-owned; nothing to release
        Ok(())
    }

    fn kind() -> &'static str {
        "Material"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
