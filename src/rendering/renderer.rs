use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::CameraUniform,
    diorama::Diorama,
    rendering::{
        config::RenderConfig,
        global_uniform::GlobalUniformState,
        instance::gather_instances,
        passes::{
            debug_panel_pass::{DebugPanelPass, DebugPanelPassTextureViews},
            lit_pass::{LitPass, LitPassTextureViews},
            pass::Pass,
            shadow_pass::{ShadowPass, ShadowPassTextureViews},
            sky_pass::{SkyPass, SkyPassTextureViews},
        },
        render_common::{configure_surface, RenderCommon},
        render_model::RenderModel,
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
    skinning,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,

    camera_uniform: CameraUniform,

    shader_loader: ShaderLoader,

    sky_pass: SkyPass,
    shadow_pass: ShadowPass,
    lit_pass: LitPass,
    debug_panel_pass: DebugPanelPass,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        diorama: &Diorama,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let config = RenderConfig::default();
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request device")?;

        let surface_config = configure_surface(&device, &adapter, &surface, size, &config)?;

        let mut camera_uniform = CameraUniform::default();
        camera_uniform.update(&diorama.camera);
        let camera_buffer = camera_uniform.create_buffer(&device);

        let shadows = &diorama.config.shadows;
        let common = Arc::new(RenderCommon::new(
            &device,
            surface_config.format,
            camera_buffer,
            GlobalUniformState::new(&diorama.lights, shadows, size),
            shadows.map_size.max(1),
        ));

        let depth_texture = DepthTexture::new(
            &device,
            surface_config.width,
            surface_config.height,
            "Depth Texture",
        );

        let mut cache_builder = PipelineCacheBuilder::new();

        let sky_pass = SkyPass::create(&device, common.clone(), &config, &mut cache_builder)?;
        let shadow_pass = ShadowPass::create(&device, common.clone(), &config, &mut cache_builder)?;
        let lit_pass = LitPass::create(&device, common.clone(), &config, &mut cache_builder)?;

        let shader_loader = ShaderLoader::new(device.clone(), cache_builder)?;

        let debug_panel_pass =
            DebugPanelPass::create(&device, &queue, surface_config.format, imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            surface_config,
            device,
            queue,
            common,
            depth_texture,
            render_models: Arena::new(),
            camera_uniform,
            shader_loader,
            sky_pass,
            shadow_pass,
            lit_pass,
            debug_panel_pass,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture
            .resize(&self.device, new_size.width, new_size.height);
    }

    /// Uploads models that arrived since the last frame.
    fn sync_models(&mut self, diorama: &mut Diorama) {
        for (_id, scene_model) in diorama.scene.models.iter_mut() {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            scene_model.render_model = Some(self.render_models.alloc(render_model));

            log::info!(
                "Uploaded model {} with {} primitives",
                scene_model.name(),
                scene_model.model.primitives.len()
            );
        }
    }

    /// Rewrites the vertex buffers of skinned objects with their current pose.
    fn upload_skinned_vertices(&self, diorama: &Diorama) {
        let scene = &diorama.scene;

        for (_id, object) in scene.objects.iter() {
            let (Some(skin), Some(model_id)) = (&object.skin, object.model_id) else {
                continue;
            };
            let Some(scene_model) = scene.models.get(model_id).filter(|m| m.is_skinned()) else {
                continue;
            };
            let Some(render_model) = scene_model
                .render_model
                .and_then(|id| self.render_models.get(id))
            else {
                continue;
            };

            let joints = skinning::joint_matrices(scene, skin);

            for (primitive, render_primitive) in scene_model
                .model
                .primitives
                .iter()
                .zip(&render_model.primitives)
            {
                let Some(weights) = &primitive.skin_weights else {
                    continue;
                };

                let skinned = skinning::skin_vertices(&primitive.vertices, weights, &joints);
                self.queue.write_buffer(
                    &render_primitive.vertex_buffer,
                    0,
                    bytemuck::cast_slice(&skinned),
                );
            }
        }
    }

    pub fn render(
        &mut self,
        diorama: &mut Diorama,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        self.sync_models(diorama);

        self.camera_uniform.update(&diorama.camera);
        self.camera_uniform
            .update_buffer(&self.queue, &self.common.camera_uniform_buffer);

        let shadows = &diorama.config.shadows;
        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(&diorama.lights, shadows, self.size),
        );

        gather_instances(&diorama.scene, &mut self.render_models);
        for (_id, render_model) in self.render_models.iter_mut() {
            render_model.upload_instances(&self.device, &self.queue);
        }

        self.upload_skinned_vertices(diorama);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                // Ends the imgui frame that was started for this redraw
                imgui_context.render();
                return Err(e);
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let pipeline_cache = &self.shader_loader.cache;
        let render_models = &self.render_models;

        self.sky_pass.render(
            &SkyPassTextureViews {
                color: view.clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| render_pass.draw(0..3, 0..1),
        );

        if shadows.enabled {
            self.shadow_pass.render(
                &ShadowPassTextureViews {
                    depth: self.common.shadow_map.view().clone(),
                },
                &mut encoder,
                pipeline_cache,
                |render_pass| {
                    for (_id, render_model) in render_models.iter() {
                        render_model.draw_casters(render_pass);
                    }
                },
            );
        }

        self.lit_pass.render(
            &LitPassTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                for (_id, render_model) in render_models.iter() {
                    render_model.draw_instances(render_pass);
                }
            },
        );

        if let Err(e) = self.debug_panel_pass.render(
            &DebugPanelPassTextureViews { color: view },
            &mut encoder,
            &self.device,
            &self.queue,
            imgui_context,
        ) {
            log::error!("{:?}", e);
        }

        self.queue.submit([encoder.finish()]);

        output.present();

        Ok(())
    }
}
