use std::sync::Arc;

use wgpu::{
    Device, MultisampleState, PipelineCompilationOptions, RenderPass, RenderPassDescriptor,
    ShaderSource,
};

use crate::rendering::{
    config::RenderConfig,
    passes::pass::{uniform_layout_entry, Pass},
    render_common::RenderCommon,
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
};

/// Fills the frame with the sky color.
pub struct SkyPass {
    pipeline_id: PipelineId,
    globals_bind_group: wgpu::BindGroup,
}

const SKY_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Sky",
    path: "sky.wgsl",
};

pub struct SkyPassTextureViews {
    pub color: wgpu::TextureView,
}

impl Pass for SkyPass {
    type TextureViews = SkyPassTextureViews;

    fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        _config: &RenderConfig,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<SkyPass> {
        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Sky globals bind group layout"),
                entries: &[uniform_layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
            });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky globals bind group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: common.global_uniform.buffer().as_entire_binding(),
            }],
        });

        let sky_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[&globals_bind_group_layout],
            push_constant_ranges: &[],
        });

        let surface_format = common.surface_format;

        let pipeline_id = cache_builder.add_shader(
            SKY_SHADER,
            Box::new(
                move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(shader_def.name),
                        source: ShaderSource::Wgsl(source.into()),
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Sky Pass Pipeline"),
                        layout: Some(&sky_pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &shader,
                            entry_point: Some("vs_main"),
                            buffers: &[],
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
                        primitive: wgpu::PrimitiveState {
                            topology: wgpu::PrimitiveTopology::TriangleList,
                            strip_index_format: None,
                            front_face: wgpu::FrontFace::Ccw,
                            cull_mode: None,
                            polygon_mode: wgpu::PolygonMode::Fill,
                            unclipped_depth: false,
                            conservative: false,
                        },
                        depth_stencil: None,
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
            label: Some("Sky Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
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
