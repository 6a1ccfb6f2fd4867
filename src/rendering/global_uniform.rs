use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::config::{srgb_to_linear, ShadowConfig};
use crate::lights::{DirectionalLight, Lights};

/// Mirrors `Globals` in `shared/lighting.wgsl`. Colors are linear.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GlobalUniformState {
    pub light_view_proj: Mat4,
    /// xyz towards the light, w intensity
    pub sun_direction: Vec4,
    pub sun_color: Vec4,
    pub sunset_direction: Vec4,
    pub sunset_color: Vec4,
    /// Premultiplied by intensity
    pub ambient: Vec4,
    pub sky_color: Vec4,
    /// Resolution, shadows enabled, shadow map texel size
    pub params: Vec4,
}

fn light_terms(light: &DirectionalLight) -> (Vec4, Vec4) {
    (
        light.direction().extend(light.intensity),
        srgb_to_linear(light.color).extend(1.0),
    )
}

impl GlobalUniformState {
    pub fn new(lights: &Lights, shadows: &ShadowConfig, resolution: PhysicalSize<u32>) -> Self {
        let (sun_direction, sun_color) = light_terms(&lights.sun);
        let (sunset_direction, sunset_color) = light_terms(&lights.sunset);

        let ambient: Vec3 = srgb_to_linear(lights.ambient.color) * lights.ambient.intensity;
        let shadows_enabled = if shadows.enabled { 1.0 } else { 0.0 };

        Self {
            light_view_proj: lights.sun_view_proj(shadows),
            sun_direction,
            sun_color,
            sunset_direction,
            sunset_color,
            ambient: ambient.extend(1.0),
            sky_color: srgb_to_linear(lights.sky_color).extend(1.0),
            params: Vec4::new(
                resolution.width as f32,
                resolution.height as f32,
                shadows_enabled,
                1.0 / shadows.map_size.max(1) as f32,
            ),
        }
    }
}

pub struct GlobalUniform {
    buffer: wgpu::Buffer,
}

impl GlobalUniform {
    pub fn new(device: &wgpu::Device, initial_state: GlobalUniformState) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global uniform buffer"),
            contents: bytemuck::cast_slice(&[initial_state]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn update(&self, queue: &wgpu::Queue, state: GlobalUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn layout_matches_shader_struct() {
        assert_eq!(std::mem::size_of::<GlobalUniformState>(), 64 + 7 * 16);
    }

    #[test]
    fn disabled_shadows_are_flagged() {
        let config = SceneConfig::from_ron(include_str!("../../assets/scene_plain.ron")).unwrap();
        let lights = Lights::from_config(&config);

        let state = GlobalUniformState::new(&lights, &config.shadows, PhysicalSize::new(800, 600));
        assert_eq!(state.params.z, 0.0);
        assert_eq!(state.params.x, 800.0);
        assert!((state.sun_direction.truncate().length() - 1.0).abs() < 1e-5);
    }
}
