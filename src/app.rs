//! Window, event loop and per-frame glue
//!
//! [`SunroomApp`] owns the event loop; the winit handler owns the window,
//! the [`RenderEngine`], the UI and the [`SceneController`]. Each redraw
//! builds the panel, ticks the controller and renders with the UI on top.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::assets::FsAssetSource;
use crate::config::{DemoConfig, CANVAS_WIDTH};
use crate::gfx::rendering::{RenderError, RenderEngine, RenderSetupError};
use crate::gfx::scene::SceneError;
use crate::room;
use crate::state::SceneController;
use crate::ui::{parameter_panel, UiManager};

/// Anything that stops the room from getting on screen
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error("cannot create the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("cannot create the window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Renderer(#[from] RenderSetupError),
    #[error("cannot build the room: {0}")]
    Scene(#[from] SceneError),
}

pub struct SunroomApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    controller: SceneController,
    last_frame: Instant,
    error: Option<SetupError>,
}

impl SunroomApp {
    /// Builds the room and the event loop; the window appears once the loop runs
    pub fn new(config: DemoConfig) -> Result<Self, SetupError> {
        let event_loop = EventLoop::new()?;
        let source = Arc::new(FsAssetSource::new(config.asset_root.clone()));
        let controller = SceneController::new(&config, source)?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                controller,
                last_frame: Instant::now(),
                error: None,
            },
        })
    }

    /// Runs until the window closes or setup fails
    pub fn run(mut self) -> Result<(), SetupError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => {
                log::info!("Window closed");
                Ok(())
            }
        }
    }
}

impl AppState {
    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SetupError> {
        let monitor_width = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .map(|monitor| monitor.size().width)
            .unwrap_or(CANVAS_WIDTH);
        let (width, height) = self.config.canvas.size(monitor_width);

        let window = Arc::new(event_loop.create_window(
            Window::default_attributes()
                .with_title("Sunroom")
                .with_inner_size(PhysicalSize::new(width, height)),
        )?);
        let (width, height): (u32, u32) = window.inner_size().into();

        let renderer = pollster::block_on(RenderEngine::new(window.clone(), width, height))?
            .with_clear_color(room::CLEAR_COLOR);
        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );

        self.controller
            .camera_mut()
            .camera
            .resize_projection(width, height);
        log::info!("Canvas {width}x{height}");

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(render_engine)) = (self.window.as_ref(), self.render_engine.as_mut()) else {
            return;
        };

        let now = Instant::now();
        let delta = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let panel = self.controller.panel_mut();
            ui_manager.update_logic(window, |ui| parameter_panel(ui, panel));
        }

        match self.controller.tick(delta, render_engine) {
            Ok(report) if !report.rebuilt.is_empty() || report.attached > 0 => {
                log::debug!("Frame: {report:?}");
            }
            Ok(_) => {}
            Err(e) => log::error!("Update failed: {e}"),
        }

        let graph = self.controller.graph();
        let camera = &self.controller.camera().camera;
        let result = match self.ui_manager.as_mut() {
            Some(ui_manager) => render_engine.render_frame(
                graph,
                camera,
                Some(|device: &wgpu::Device, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView| {
                    ui_manager.render_display_only(device, queue, encoder, window, view);
                }),
            ),
            None => self.controller.render(render_engine),
        };

        match result {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("Out of GPU memory, closing");
                event_loop.exit();
            }
            Err(e) => log::warn!("Skipping frame: {e}"),
        }

        // the UI pass is skipped when the frame fails
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            ui_manager.discard_frame();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // drop the old surface before the new window takes its place
        self.ui_manager = None;
        self.render_engine = None;
        self.window = None;

        if let Err(e) = self.create_surface(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_input(&window, window_id, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if let KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                } = key_event
                {
                    event_loop.exit();
                    return;
                }
                self.controller.camera_mut().process_keyboard_event(&key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.controller
                    .camera_mut()
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        if self.ui_manager.as_ref().is_some_and(|ui| ui.wants_input()) {
            return;
        }

        self.controller.camera_mut().process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
