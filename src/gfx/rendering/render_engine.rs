//! WGPU-based rendering engine for the room
//!
//! Owns the surface, the pipelines and the GPU copies of everything in the
//! scene graph. Each frame is turned into a [`FramePlan`] on the CPU and then
//! recorded as a single render pass; the mirror's cube capture records six
//! more passes into [`CubeRenderTarget`] faces.

use std::sync::Arc;

use slotmap::SecondaryMap;
use wgpu::TextureFormat;

use crate::gfx::{
    camera::Camera,
    geometry::generate_quad,
    resources::{CubeRenderTarget, GlobalBindings, TextureResource, COLOR_FORMAT},
    scene::{CubeTextureKey, GeometryKey, SceneGraph, TextureKey},
};

use super::frame::{plan_frame, DrawGeometry, FramePlan, ObjectUniform, PlannedDraw, ViewSetup};
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::render_pass_ext::{GpuMesh, RenderPassExt};
use super::{CubeCapture, RenderError, SceneRenderer};

const DEFAULT_CAPTURE_RESOLUTION: u32 = 512;

#[derive(thiserror::Error, Debug)]
pub enum RenderSetupError {
    #[error("cannot create a surface for the window: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("cannot open the graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

struct GpuTexture {
    version: u64,
    group: wgpu::BindGroup,
}

struct GpuCube {
    version: u64,
    group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Opaque,
    Transparent,
    Sky,
}

impl PassKind {
    const ALL: [PassKind; 3] = [PassKind::Opaque, PassKind::Transparent, PassKind::Sky];

    fn pipeline_name(self, target: TextureFormat) -> String {
        format!("{:?} {:?}", self, target)
    }
}

/// Where a recorded view ends up
struct PassTarget<'t> {
    color: &'t wgpu::TextureView,
    depth: &'t wgpu::TextureView,
    format: TextureFormat,
    frame_slot: usize,
    object_base: usize,
    /// Cube bound for draws that reflect; `None` while capturing
    reflection: Option<&'t wgpu::BindGroup>,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    bindings: GlobalBindings,
    clear_color: [f32; 3],

    meshes: SecondaryMap<GeometryKey, GpuMesh>,
    textures: SecondaryMap<TextureKey, GpuTexture>,
    cubes: SecondaryMap<CubeTextureKey, GpuCube>,
    synced_revision: Option<u64>,

    sprite_quad: GpuMesh,
    white_texture: wgpu::BindGroup,
    fallback_cube: wgpu::BindGroup,
    capture: CubeRenderTarget,
    capture_group: wgpu::BindGroup,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, RenderSetupError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8Unorm);
        log::info!("Rendering to {:?} on {}", format, adapter.get_info().name);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height, "depth_texture");
        let bindings = GlobalBindings::new(&device);

        let white = crate::gfx::scene::ImageData::solid(1, 1, [255, 255, 255, 255]);
        let white_texture = bindings.texture_group(
            &device,
            &TextureResource::from_image(&device, &queue, &white, "White Texture"),
            "White Texture Bind Group",
        );
        let fallback_cube = bindings.cube_group(
            &device,
            &TextureResource::solid_cube(&device, &queue, [0, 0, 0, 255], "Fallback Cube"),
            "Fallback Cube Bind Group",
        );
        let capture = CubeRenderTarget::new(&device, DEFAULT_CAPTURE_RESOLUTION);
        let capture_group = bindings.cube_group(&device, &capture.cube, "Mirror Capture Bind Group");
        let sprite_quad = GpuMesh::upload(&device, &generate_quad(), "Sprite Quad");

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());
        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));

        for target in [format, COLOR_FORMAT] {
            for kind in PassKind::ALL {
                pipeline_manager.register_pipeline(
                    &kind.pipeline_name(target),
                    scene_pipeline(kind, target, bindings.bind_group_layouts()),
                );
            }
        }
        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{error}");
            }
        }

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            bindings,
            clear_color: [0.0; 3],
            meshes: SecondaryMap::new(),
            textures: SecondaryMap::new(),
            cubes: SecondaryMap::new(),
            synced_revision: None,
            sprite_quad,
            white_texture,
            fallback_cube,
            capture,
            capture_group,
        })
    }

    /// Colour the frame is cleared to while a cube map background is loading
    pub fn with_clear_color(mut self, color: [f32; 3]) -> Self {
        self.clear_color = color;
        self
    }

    /// Uploads whatever the graph gained since the last sync
    fn sync_resources(&mut self, graph: &SceneGraph) {
        if self.synced_revision == Some(graph.revision()) {
            return;
        }

        for (key, geometry) in graph.geometries() {
            if !self.meshes.contains_key(key) {
                let mesh = GpuMesh::upload(&self.device, geometry, "Scene Mesh");
                self.meshes.insert(key, mesh);
            }
        }

        for (key, slot) in graph.textures() {
            let Some(image) = &slot.image else { continue };
            if self.textures.get(key).is_some_and(|t| t.version == slot.version) {
                continue;
            }
            log::debug!("Uploading texture {} ({}x{})", slot.label, image.width, image.height);
            let resource = TextureResource::from_image(&self.device, &self.queue, image, &slot.label);
            let group = self.bindings.texture_group(&self.device, &resource, &slot.label);
            self.textures.insert(
                key,
                GpuTexture {
                    version: slot.version,
                    group,
                },
            );
        }

        for (key, slot) in graph.cube_textures() {
            let Some(faces) = &slot.faces else { continue };
            if self.cubes.get(key).is_some_and(|c| c.version == slot.version) {
                continue;
            }
            log::debug!("Uploading cube texture {}", slot.label);
            let resource = TextureResource::cube_from_images(&self.device, &self.queue, faces, &slot.label);
            let group = self.bindings.cube_group(&self.device, &resource, &slot.label);
            self.cubes.insert(
                key,
                GpuCube {
                    version: slot.version,
                    group,
                },
            );
        }

        self.synced_revision = Some(graph.revision());
    }

    fn ensure_capture_resolution(&mut self, resolution: u32) {
        if resolution.max(1) == self.capture.resolution {
            return;
        }
        log::debug!("Mirror capture resized to {resolution}");
        self.capture = CubeRenderTarget::new(&self.device, resolution);
        self.capture_group = self
            .bindings
            .cube_group(&self.device, &self.capture.cube, "Mirror Capture Bind Group");
    }

    /// Records one planned view into `target`
    ///
    /// Uniforms for the view must already be written at `target.frame_slot`
    /// and `target.object_base`.
    fn record(&self, encoder: &mut wgpu::CommandEncoder, plan: &FramePlan, target: &PassTarget) {
        let [r, g, b] = plan.clear;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let frame_offset = self.bindings.frames.offset(target.frame_slot);
        pass.set_bind_group(0, self.bindings.frame_group(), &[frame_offset]);

        if let Some(sky) = plan.sky.and_then(|key| self.cubes.get(key)) {
            if let Some(pipeline) = self.pipeline_manager.pipeline(&PassKind::Sky.pipeline_name(target.format)) {
                pass.set_pipeline(pipeline);
                // the sky never reads its object block
                pass.set_bind_group(1, self.bindings.object_group(), &[0]);
                pass.set_bind_group(2, &self.white_texture, &[]);
                pass.set_bind_group(3, &sky.group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        let batches = [
            (PassKind::Opaque, plan.opaque.as_slice(), 0),
            (PassKind::Transparent, plan.transparent.as_slice(), plan.opaque.len()),
        ];
        for (kind, draws, first) in batches {
            if draws.is_empty() {
                continue;
            }
            let Some(pipeline) = self.pipeline_manager.pipeline(&kind.pipeline_name(target.format)) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            for (i, draw) in draws.iter().enumerate() {
                self.draw(&mut pass, draw, target, target.object_base + first + i);
            }
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, draw: &PlannedDraw, target: &PassTarget, slot: usize) {
        let mesh = match draw.geometry {
            DrawGeometry::Mesh(key) => match self.meshes.get(key) {
                Some(mesh) => mesh,
                None => return,
            },
            DrawGeometry::SpriteQuad => &self.sprite_quad,
        };
        let texture = draw
            .texture
            .and_then(|key| self.textures.get(key))
            .map(|t| &t.group)
            .unwrap_or(&self.white_texture);
        let environment = match (draw.reflects, target.reflection) {
            (true, Some(reflection)) => reflection,
            _ => &self.fallback_cube,
        };

        pass.set_bind_group(1, self.bindings.object_group(), &[self.bindings.objects.offset(slot)]);
        pass.set_bind_group(2, texture, &[]);
        pass.set_bind_group(3, environment, &[]);
        pass.draw_mesh(mesh);
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// # Arguments
    /// * `graph` - Scene to draw
    /// * `camera` - Viewer of the frame
    /// * `ui_callback` - Optional function that renders UI elements on top
    pub fn render_frame<F>(
        &mut self,
        graph: &SceneGraph,
        camera: &dyn Camera,
        ui_callback: Option<F>,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.sync_resources(graph);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let plan = plan_frame(graph, &ViewSetup::from_camera(camera), self.clear_color);
        let objects = collect_objects(&plan);
        self.bindings.write_frame(&self.device, &self.queue, 0, plan.uniform);
        self.bindings.write_objects(&self.device, &self.queue, 0, &objects);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.record(
            &mut encoder,
            &plan,
            &PassTarget {
                color: &surface_texture_view,
                depth: &self.depth_texture.view,
                format: self.format,
                frame_slot: 0,
                object_base: 0,
                reflection: Some(&self.capture_group),
            },
        );

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the surface and recreates the depth buffer
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
    }

    /// Returns current surface dimensions
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }
}

fn scene_pipeline(kind: PassKind, target: TextureFormat, layouts: Vec<wgpu::BindGroupLayout>) -> PipelineConfig {
    let config = PipelineConfig::default()
        .with_label(&kind.pipeline_name(target))
        .with_shader("scene")
        .with_cull_mode(None)
        .with_bind_group_layouts(layouts);

    match kind {
        PassKind::Opaque => config
            .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
            .with_color_target(target, Some(wgpu::BlendState::REPLACE)),
        PassKind::Transparent => config
            .with_depth(TextureResource::DEPTH_FORMAT, false, wgpu::CompareFunction::Less)
            .with_color_target(target, Some(wgpu::BlendState::ALPHA_BLENDING)),
        PassKind::Sky => config
            .with_entry_points("vs_sky", "fs_sky")
            .with_no_vertex_buffers()
            .with_depth(TextureResource::DEPTH_FORMAT, false, wgpu::CompareFunction::Always)
            .with_color_target(target, Some(wgpu::BlendState::REPLACE)),
    }
}

/// Object uniforms in draw order: opaque then transparent
fn collect_objects(plan: &FramePlan) -> Vec<ObjectUniform> {
    plan.opaque
        .iter()
        .chain(&plan.transparent)
        .map(|draw| draw.object)
        .collect()
}

impl SceneRenderer for RenderEngine {
    fn capture_cube(&mut self, graph: &SceneGraph, capture: &CubeCapture) {
        self.sync_resources(graph);
        self.ensure_capture_resolution(capture.settings.resolution);

        let plans = capture
            .face_cameras()
            .map(|camera| plan_frame(graph, &ViewSetup::from_camera(&camera), self.clear_color));

        // every face's objects go into one write so a buffer growth cannot
        // drop slots written for earlier faces
        let mut objects = Vec::new();
        let mut bases = [0usize; 6];
        for (face, plan) in plans.iter().enumerate() {
            bases[face] = objects.len();
            objects.extend(collect_objects(plan));
            self.bindings.write_frame(&self.device, &self.queue, face + 1, plan.uniform);
        }
        self.bindings.write_objects(&self.device, &self.queue, 0, &objects);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Mirror Capture Encoder"),
            });
        for (face, plan) in plans.iter().enumerate() {
            self.record(
                &mut encoder,
                plan,
                &PassTarget {
                    color: &self.capture.faces[face],
                    depth: &self.capture.depth.view,
                    format: COLOR_FORMAT,
                    frame_slot: face + 1,
                    object_base: bases[face],
                    reflection: None,
                },
            );
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn render(&mut self, graph: &SceneGraph, camera: &dyn Camera) -> Result<(), RenderError> {
        self.render_frame(
            graph,
            camera,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        )
    }
}
