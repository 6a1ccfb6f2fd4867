use imgui_wgpu::RendererConfig;
use wgpu::{CommandEncoder, Device, Queue, RenderPassDescriptor, TextureFormat};

/// Composites the imgui debug panel over the lit frame.
///
/// Unlike the scene passes this one has no pipeline in the shader cache;
/// imgui-wgpu owns its own pipeline and font atlas.
pub struct DebugPanelPass {
    renderer: imgui_wgpu::Renderer,
}

pub struct DebugPanelPassTextureViews {
    pub color: wgpu::TextureView,
}

impl DebugPanelPass {
    pub fn create(
        device: &Device,
        queue: &Queue,
        surface_format: TextureFormat,
        imgui_context: &mut imgui::Context,
    ) -> DebugPanelPass {
        let renderer = imgui_wgpu::Renderer::new(
            imgui_context,
            device,
            queue,
            RendererConfig {
                texture_format: surface_format,
                ..Default::default()
            },
        );

        DebugPanelPass { renderer }
    }

    /// Ends the current imgui frame and draws it. The frame is ended even when
    /// nothing gets drawn so the next `new_frame` starts clean.
    pub fn render(
        &mut self,
        views: &DebugPanelPassTextureViews,
        encoder: &mut CommandEncoder,
        device: &Device,
        queue: &Queue,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<()> {
        let draw_data = imgui_context.render();

        // imgui-wgpu crashes on empty draw data
        // https://github.com/imgui-rs/imgui-rs/issues/325
        if draw_data.draw_lists_count() == 0 {
            return Ok(());
        }

        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Debug panel"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.renderer
            .render(draw_data, queue, device, &mut render_pass)
            .map_err(|e| anyhow::anyhow!("Debug panel draw failed: {:?}", e))
    }
}
