use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::SceneConfig, controls::PointerButton, diorama::Diorama, engine,
    rendering::renderer::Renderer,
};

/// Pixels of trackpad scrolling that count as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 100.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct Running {
    diorama: Diorama,
    renderer: Renderer,
    imgui: ImguiState,
    cursor: Vec2,
    last_frame: Instant,
}

struct App {
    config: Option<SceneConfig>,
    running: Option<Running>,
    startup_error: Option<anyhow::Error>,
}

fn setup_imgui(window: &Window) -> ImguiState {
    let mut context = imgui::Context::create();
    let mut platform = WinitPlatform::new(&mut context);
    platform.attach_window(
        context.io_mut(),
        window,
        imgui_winit_support::HiDpiMode::Default,
    );

    let font_size = 14.0;
    context.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            oversample_h: 1,
            pixel_snap_h: true,
            size_pixels: font_size,
            ..Default::default()
        }),
    }]);

    // Disable INI support because it's broken in the published version of imgui
    context.set_ini_filename(None);

    ImguiState { context, platform }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn wheel_notches(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_NOTCH,
    }
}

fn viewpoint_for_key(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Digit1 => Some(0),
        KeyCode::Digit2 => Some(1),
        _ => None,
    }
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config: Some(config),
            running: None,
            startup_error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let config = self.config.take().context("Scene already started")?;

        let window_attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let mut imgui = setup_imgui(&window);

        let diorama = Diorama::new(config, window.inner_size())?;
        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            &diorama,
            &mut imgui.context,
        ))?;

        window.request_redraw();

        self.running = Some(Running {
            diorama,
            renderer,
            imgui,
            cursor: Vec2::ZERO,
            last_frame: Instant::now(),
        });

        Ok(())
    }
}

impl Running {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;

        let imgui = &mut self.imgui;
        imgui.context.io_mut().update_delta_time(delta);

        let window = self.renderer.window.clone();
        window.request_redraw();

        if let Err(e) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &window)
        {
            log::error!("Failed to prepare imgui frame: {:?}", e);
            return;
        }

        let ui = imgui.context.new_frame();
        engine::update(&mut self.diorama, ui, delta);
        imgui.platform.prepare_render(ui, &window);

        match self.renderer.render(&mut self.diorama, &mut imgui.context) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.renderer.resize(self.renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        let io = self.imgui.context.io();
        let ui_wants_mouse = io.want_capture_mouse;
        let ui_wants_keyboard = io.want_capture_keyboard;

        let controls = &mut self.diorama.controls;

        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = pointer_button(*button) else {
                    return;
                };

                match state {
                    ElementState::Pressed if !ui_wants_mouse => {
                        controls.on_pointer_down(button, self.cursor);
                    }
                    ElementState::Pressed => {}
                    ElementState::Released => controls.on_pointer_up(button),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                let height = self.renderer.size.height as f32;
                controls.on_pointer_move(self.cursor, height, &self.diorama.camera);
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_wants_mouse => {
                controls.on_wheel(wheel_notches(*delta));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !ui_wants_keyboard => {
                if let Some(index) = viewpoint_for_key(*code) {
                    self.diorama.go_to_viewpoint(index);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("Failed to start: {:?}", e);
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized to {}x{}", new_size.width, new_size.height);
                running.renderer.resize(*new_size);
                running.diorama.resize(*new_size);
            }
            WindowEvent::RedrawRequested => {
                running.redraw(event_loop);
            }
            other => running.handle_input(other),
        }

        let window = running.renderer.window.clone();
        running.imgui.platform.handle_event::<()>(
            running.imgui.context.io_mut(),
            &window,
            &Event::WindowEvent { window_id, event },
        );
    }
}

pub async fn run(config: SceneConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
