use std::sync::{Arc, Mutex};

use super::*;
use crate::graphics_device::{MockGraphicsDevice, ShaderStage};

fn device() -> (Arc<Mutex<MockGraphicsDevice>>, crate::graphics_device::MockDeviceStats) {
    let device = MockGraphicsDevice::new();
    let stats = device.stats();
    (Arc::new(Mutex::new(device)), stats)
}

fn stage(kind: ShaderStage, words: usize) -> ShaderStageDesc {
    ShaderStageDesc {
        stage: kind,
        code: vec![0u8; words * 4],
        entry_point: "main".to_string(),
    }
}

fn desc(device: &Arc<Mutex<MockGraphicsDevice>>, stages: Vec<ShaderStageDesc>) -> ShaderDesc {
    ShaderDesc {
        device: device.clone() as Arc<Mutex<dyn GraphicsDevice>>,
        stages,
    }
}

#[test]
fn test_construct_vertex_fragment_program() {
    let (device, stats) = device();
    let shader = Shader::construct(desc(
        &device,
        vec![stage(ShaderStage::Vertex, 8), stage(ShaderStage::Fragment, 12)],
    ))
    .unwrap();

    assert_eq!(shader.stage_count(), 2);
    assert_eq!(shader.device_shader().stage_count(), 2);
    assert_eq!(stats.live_shaders(), 1);
}

#[test]
fn test_empty_stage_list_rejected() {
    let (device, stats) = device();
    assert!(Shader::construct(desc(&device, vec![])).is_err());
    assert_eq!(stats.shaders_created(), 0);
}

#[test]
fn test_empty_code_rejected() {
    let (device, stats) = device();
    let mut broken = stage(ShaderStage::Compute, 0);
    broken.code.clear();
    assert!(Shader::construct(desc(&device, vec![broken])).is_err());
    assert_eq!(stats.shaders_created(), 0);
}

#[test]
fn test_unaligned_code_rejected() {
    let (device, stats) = device();
    let mut broken = stage(ShaderStage::Vertex, 2);
    broken.code.push(0);
    assert!(Shader::construct(desc(&device, vec![broken])).is_err());
    assert_eq!(stats.shaders_created(), 0);
}

#[test]
fn test_destroy_releases_device_shader() {
    let (device, stats) = device();
    let mut shader =
        Shader::construct(desc(&device, vec![stage(ShaderStage::Compute, 4)])).unwrap();
    assert_eq!(stats.live_shaders(), 1);

    shader.destroy().unwrap();
    assert_eq!(stats.live_shaders(), 0);
    // Stage count stays queryable after destruction
    assert_eq!(shader.stage_count(), 1);
}
