//! ImGui integration with winit and wgpu
//!
//! Frame timing, input capture and drawing of the tweak panel on top of the
//! rendered room.

use std::time::Instant;

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE: f32 = 14.0;

/// Owns the ImGui context and draws it with wgpu
///
/// A frame is split in two: [`update_logic`](Self::update_logic) builds the
/// widgets before the scene is updated, so edits land in the same tick, and
/// [`render_display_only`](Self::render_display_only) draws them once the
/// scene pass is recorded.
pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    /// A frame was built but not rendered yet
    frame_open: bool,
}

impl UiManager {
    pub fn new(device: &Device, queue: &Queue, output_color_format: TextureFormat, window: &Window) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        // scaling is fixed; the canvas is sized in physical pixels
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer = Renderer::new(
            &mut context,
            device,
            queue,
            RendererConfig {
                texture_format: output_color_format,
                ..Default::default()
            },
        );

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
            frame_open: false,
        }
    }

    /// True while the panel is hovered, focused or being dragged
    pub fn wants_input(&self) -> bool {
        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Feeds a window event to ImGui; true when the panel keeps it
    pub fn handle_input(&mut self, window: &Window, window_id: WindowId, event: &WindowEvent) -> bool {
        let forwarded = matches!(
            event,
            WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::ModifiersChanged(_)
                | WindowEvent::Focused(_)
                | WindowEvent::Resized(_)
        );
        if !forwarded {
            return false;
        }

        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform.handle_event(self.context.io_mut(), window, &wrapped);

        // resizes always reach the renderer as well
        !matches!(event, WindowEvent::Resized(_)) && self.wants_input()
    }

    /// Starts a UI frame and builds it with `run_ui`
    ///
    /// # Returns
    /// True if the UI wants to capture input this frame
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        self.discard_frame();

        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("Cannot prepare UI frame: {e}");
        }

        let ui = self.context.frame();
        self.frame_open = true;
        run_ui(ui);

        let cursor = ui.mouse_cursor();
        if self.last_cursor != cursor {
            self.last_cursor = cursor;
            self.platform.prepare_render(ui, window);
        }

        self.wants_input()
    }

    /// Ends a frame started by `update_logic()` without drawing it, for
    /// redraws that never reached the UI pass
    pub fn discard_frame(&mut self) {
        end_frame(&mut self.context, &mut self.frame_open);
    }

    /// Draws the UI built in the last `update_logic()` call over the existing
    /// contents of `color_attachment`.
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        _window: &Window,
        color_attachment: &TextureView,
    ) {
        if !self.frame_open {
            return;
        }
        self.frame_open = false;
        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
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

        if let Err(e) = self.renderer.render(draw_data, queue, device, &mut render_pass) {
            log::error!("Cannot draw the UI: {e:?}");
        }
    }
}

fn end_frame(context: &mut Context, frame_open: &mut bool) {
    if std::mem::take(frame_open) {
        context.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrendered_frame_is_closed_once() {
        let mut context = Context::create();
        context.set_ini_filename(None);
        context.io_mut().display_size = [846.0, 494.0];
        context.fonts().build_rgba32_texture();

        let mut frame_open = true;
        context.frame().text("dropped");
        end_frame(&mut context, &mut frame_open);
        assert!(!frame_open);

        // a second close has nothing to end
        end_frame(&mut context, &mut frame_open);

        context.frame().text("next");
        let draw_data = context.render();
        assert!(draw_data.total_vtx_count > 0);
    }
}
