use anyhow::Context;
use wgpu::SurfaceConfiguration;
use winit::dpi::PhysicalSize;

use crate::rendering::config::RenderConfig;
use crate::rendering::global_uniform::{GlobalUniform, GlobalUniformState};
use crate::rendering::texture::DepthTexture;

/// GPU resources shared by every pass.
pub struct RenderCommon {
    pub surface_format: wgpu::TextureFormat,
    pub camera_uniform_buffer: wgpu::Buffer,
    pub global_uniform: GlobalUniform,
    pub shadow_map: DepthTexture,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_uniform_buffer: wgpu::Buffer,
        initial_globals: GlobalUniformState,
        shadow_map_size: u32,
    ) -> Self {
        Self {
            surface_format,
            camera_uniform_buffer,
            global_uniform: GlobalUniform::new(device, initial_globals),
            shadow_map: DepthTexture::new(
                device,
                shadow_map_size,
                shadow_map_size,
                "Sun shadow map",
            ),
        }
    }
}

pub fn configure_surface(
    device: &wgpu::Device,
    adapter: &wgpu::Adapter,
    surface: &wgpu::Surface,
    size: PhysicalSize<u32>,
    config: &RenderConfig,
) -> anyhow::Result<SurfaceConfiguration> {
    let surface_caps = surface.get_capabilities(adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| surface_caps.formats.first())
        .copied()
        .context("Surface reports no supported formats")?;

    let output_surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo),
        alpha_mode: surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: config.desired_maximum_frame_latency,
    };

    surface.configure(device, &output_surface_config);

    Ok(output_surface_config)
}
