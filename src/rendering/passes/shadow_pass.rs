use std::sync::Arc;

use wgpu::{
    Device, MultisampleState, PipelineCompilationOptions, RenderPass, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::rendering::{
    config::RenderConfig,
    instance::Instance,
    passes::pass::{uniform_layout_entry, Pass},
    render_common::RenderCommon,
    render_model::RENDER_MODEL_VBL,
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::DepthTexture,
};

/// Depth-only render of the shadow casters from the sun.
pub struct ShadowPass {
    pipeline_id: PipelineId,
    globals_bind_group: wgpu::BindGroup,
}

const SHADOW_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Shadow",
    path: "shadow.wgsl",
};

pub struct ShadowPassTextureViews {
    pub depth: wgpu::TextureView,
}

impl Pass for ShadowPass {
    type TextureViews = ShadowPassTextureViews;

    fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        config: &RenderConfig,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<Self> {
        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Shadow globals bind group layout"),
                entries: &[uniform_layout_entry(0, wgpu::ShaderStages::VERTEX)],
            });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow globals bind group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: common.global_uniform.buffer().as_entire_binding(),
            }],
        });

        let shadow_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shadow Pipeline Layout"),
                bind_group_layouts: &[&globals_bind_group_layout],
                push_constant_ranges: &[],
            });

        let depth_bias = config.shadow_depth_bias;

        let pipeline_id = cache_builder.add_shader(
            SHADOW_SHADER,
            Box::new(
                move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(shader_def.name),
                        source: ShaderSource::Wgsl(source.into()),
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Shadow Pass Pipeline"),
                        layout: Some(&shadow_pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &shader,
                            entry_point: Some("vs_main"),
                            buffers: &[RENDER_MODEL_VBL, Instance::descriptor()],
                            compilation_options: PipelineCompilationOptions::default(),
                        },
                        fragment: None,
                        primitive: wgpu::PrimitiveState {
                            topology: wgpu::PrimitiveTopology::TriangleList,
                            strip_index_format: None,
                            front_face: wgpu::FrontFace::Ccw,
                            cull_mode: None,
                            polygon_mode: wgpu::PolygonMode::Fill,
                            unclipped_depth: false,
                            conservative: false,
                        },
                        depth_stencil: Some(wgpu::DepthStencilState {
                            format: DepthTexture::DEPTH_FORMAT,
                            depth_write_enabled: true,
                            depth_compare: wgpu::CompareFunction::LessEqual,
                            stencil: StencilState::default(),
                            bias: depth_bias,
                        }),
                        multisample: MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    });

                    Ok(pipeline)
                },
            ),
        );

        Ok(Self {
            pipeline_id,
            globals_bind_group,
        })
    }

    fn render<'a, F>(
        &self,
        texture_views: &Self::TextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a,
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(pipeline) = pipeline_cache.get(self.pipeline_id) else {
            return;
        };

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
        render_callback(&mut render_pass);
    }
}
