use std::sync::Arc;

use wgpu::RenderPass;

use crate::rendering::{
    config::RenderConfig,
    render_common::RenderCommon,
    shader_loader::{PipelineCache, PipelineCacheBuilder},
};

pub(crate) trait Pass {
    type TextureViews;

    fn create(
        device: &wgpu::Device,
        common: Arc<RenderCommon>,
        config: &RenderConfig,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn render<'a, F>(
        &self,
        texture_views: &Self::TextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a;
}

pub(crate) fn uniform_layout_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) const MODEL_PRIMITIVE_STATE: wgpu::PrimitiveState = wgpu::PrimitiveState {
    topology: wgpu::PrimitiveTopology::TriangleList,
    strip_index_format: None,
    front_face: wgpu::FrontFace::Ccw,
    cull_mode: Some(wgpu::Face::Back),
    polygon_mode: wgpu::PolygonMode::Fill,
    unclipped_depth: false,
    conservative: false,
};
