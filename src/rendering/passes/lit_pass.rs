use std::sync::Arc;

use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPass,
    RenderPassDescriptor, ShaderSource, StencilState,
};

use crate::rendering::{
    config::RenderConfig,
    instance::Instance,
    passes::pass::{uniform_layout_entry, Pass, MODEL_PRIMITIVE_STATE},
    render_common::RenderCommon,
    render_model::RENDER_MODEL_VBL,
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::DepthTexture,
};

/// Lambert shading with ambient, sun and sunset light and the sun's shadow.
pub struct LitPass {
    pipeline_id: PipelineId,
    frame_bind_group: wgpu::BindGroup,
}

pub struct LitPassTextureViews {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
}

const LIT_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Lit",
    path: "lit.wgsl",
};

impl Pass for LitPass {
    type TextureViews = LitPassTextureViews;

    fn create(
        device: &wgpu::Device,
        common: Arc<RenderCommon>,
        _config: &RenderConfig,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<Self> {
        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Lit frame bind group layout"),
                entries: &[
                    uniform_layout_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                    uniform_layout_entry(1, wgpu::ShaderStages::VERTEX_FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Depth,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
            });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lit frame bind group"),
            layout: &frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: common.camera_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: common.global_uniform.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(common.shadow_map.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(common.shadow_map.sampler()),
                },
            ],
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Lit Pipeline Layout"),
                bind_group_layouts: &[&frame_bind_group_layout],
                push_constant_ranges: &[],
            });

        let surface_format = common.surface_format;

        let pipeline_id = cache_builder.add_shader(
            LIT_SHADER,
            Box::new(
                move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(shader_def.name),
                        source: ShaderSource::Wgsl(source.into()),
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Lit render pipeline"),
                        layout: Some(&render_pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &shader,
                            entry_point: Some("vs_main"),
                            buffers: &[RENDER_MODEL_VBL, Instance::descriptor()],
                            compilation_options: PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                            module: &shader,
                            entry_point: Some("fs_main"),
                            targets: &[Some(wgpu::ColorTargetState {
                                format: surface_format,
                                blend: Some(wgpu::BlendState::REPLACE),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                            compilation_options: PipelineCompilationOptions::default(),
                        }),
                        primitive: MODEL_PRIMITIVE_STATE,
                        depth_stencil: Some(wgpu::DepthStencilState {
                            format: DepthTexture::DEPTH_FORMAT,
                            depth_write_enabled: true,
                            depth_compare: wgpu::CompareFunction::Less,
                            stencil: StencilState::default(),
                            bias: DepthBiasState::default(),
                        }),
                        multisample: MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    });

                    Ok(pipeline)
                },
            ),
        );

        Ok(LitPass {
            pipeline_id,
            frame_bind_group,
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
            label: Some("Lit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
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
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

        render_callback(&mut render_pass);
    }
}
