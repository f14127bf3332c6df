//! The top-level orchestrator: owns the GPU context, the scene, and the
//! active program/projection/camera, and drives one frame at a time.
//!
//! A renderer starts idle and becomes configured once a program, a
//! projection, and a camera have all been set; [`Renderer::render`] from
//! the idle state fails with [`RenderError::NotConfigured`]. One `render`
//! call performs, in order: texture polling, geometry buffer preparation,
//! frame uniform upload (view + projection through the program's uniform
//! contract), a clear of color and depth, and one indexed draw per
//! drawable geometry in scene order.
//!
//! Per-frame problems degrade instead of failing: an undrawable geometry
//! is skipped, a lost surface is reconfigured and the frame dropped.
//! The host guarantees `render`, `add_geometry`, and input handling are
//! serialized on one thread, so the scene list is never mutated while a
//! frame walks it.

use crate::camera::Camera;
use crate::error::RenderError;
use crate::geometry::Geometry;
use crate::gpu::GpuContext;
use crate::program::{DEPTH_FORMAT, Program, UniformValue};
use crate::projection::Projection;
use crate::scene::Scene;
use crate::texture::{Texture, TextureId};

struct DepthBuffer {
    view: wgpu::TextureView,
    size: (u32, u32),
}

impl DepthBuffer {
    fn new(gpu: &GpuContext) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Buffer"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            size: (gpu.width(), gpu.height()),
        }
    }

    /// Recreate the depth texture if the surface has been resized since
    /// the last frame.
    fn ensure_size(&mut self, gpu: &GpuContext) {
        if self.size != (gpu.width(), gpu.height()) {
            *self = Self::new(gpu);
        }
    }
}

/// Scene owner and frame driver.
pub struct Renderer {
    gpu: GpuContext,
    scene: Scene,
    textures: Vec<Texture>,
    program: Option<Program>,
    projection: Option<Projection>,
    camera: Option<Camera>,
    depth: DepthBuffer,
    default_texture: Texture,
}

impl Renderer {
    /// Create a renderer owning the GPU context, sized to the initial
    /// viewport.
    pub fn new(mut gpu: GpuContext, width: u32, height: u32) -> Self {
        gpu.resize(width, height);
        let depth = DepthBuffer::new(&gpu);
        let default_texture = Texture::from_rgba(&gpu, &[255, 255, 255, 255], 1, 1, "Fallback White");
        Self {
            gpu,
            scene: Scene::new(),
            textures: Vec::new(),
            program: None,
            projection: None,
            camera: None,
            depth,
            default_texture,
        }
    }

    /// Set the active (linked) shader program.
    pub fn set_program(&mut self, program: Program) {
        self.program = Some(program);
    }

    /// Set the active projection.
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = Some(projection);
    }

    /// Set the active camera.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn program_mut(&mut self) -> Option<&mut Program> {
        self.program.as_mut()
    }

    /// The GPU context this renderer owns.
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Append a geometry to the scene. O(1); safe between frames,
    /// including from input handlers.
    pub fn add_geometry(&mut self, geometry: Geometry) {
        self.scene.add(geometry);
    }

    /// The scene, for inspection.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Register a shared texture and get a handle for geometry to
    /// reference.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len());
        self.textures.push(texture);
        id
    }

    /// Apply a new viewport: resizes the drawing surface and recomputes
    /// the projection. The depth buffer follows on the next frame.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        if let Some(projection) = &mut self.projection {
            projection.set_perspective(width, height);
        }
    }

    /// Render one frame.
    pub fn render(&mut self) -> Result<(), RenderError> {
        let view = match &self.camera {
            Some(camera) => camera.view_matrix(),
            None => return Err(RenderError::NotConfigured("camera")),
        };
        let proj = match &self.projection {
            Some(projection) => projection.matrix(),
            None => return Err(RenderError::NotConfigured("projection")),
        };

        // Commit any texture decodes that finished since the last frame,
        // before anything samples them.
        for texture in &mut self.textures {
            texture.poll(&self.gpu);
        }

        {
            let Some(program) = self.program.as_mut() else {
                return Err(RenderError::NotConfigured("program"));
            };
            if !program.is_linked() {
                return Err(RenderError::NotConfigured("linked program"));
            }
            let frame_uniforms = [
                ("view_matrix", UniformValue::Mat4(view)),
                ("projection_matrix", UniformValue::Mat4(proj)),
            ];
            for (name, value) in frame_uniforms {
                if let Err(err) = program.set_uniform(name, value) {
                    log::warn!("frame uniform skipped: {err}");
                }
            }
            program.flush_uniforms(&self.gpu);
        }

        let Some(program) = self.program.as_ref() else {
            return Err(RenderError::NotConfigured("program"));
        };
        let Some(linked) = program.linked() else {
            return Err(RenderError::NotConfigured("linked program"));
        };

        for geometry in self.scene.iter_mut() {
            geometry.prepare(&self.gpu, linked);
        }
        self.depth.ensure_size(&self.gpu);

        // Model matrices are written before the pass is recorded; each
        // geometry owns its model buffer, so the writes cannot clobber
        // one another across draws.
        let draws = self.scene.draw_list();
        for call in &draws {
            if let Some(buffers) = call.geometry.buffers() {
                buffers.write_model(&self.gpu, call.model);
            }
        }

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring and skipping the frame");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping the frame");
                return Ok(());
            }
            Err(err) => return Err(RenderError::Surface(err)),
        };
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&linked.pipeline);
            pass.set_bind_group(0, &linked.frame_bind_group, &[]);

            for call in &draws {
                let Some(buffers) = call.geometry.buffers() else {
                    continue;
                };

                pass.set_bind_group(1, &buffers.model_bind_group, &[]);

                // A pending texture binds its placeholder; a missing or
                // unregistered handle falls back to plain white.
                let texture = call
                    .texture
                    .and_then(|id| self.textures.get(id.0))
                    .unwrap_or(&self.default_texture);
                let texture_bind_group = linked.texture_bind_group(&self.gpu, texture);
                pass.set_bind_group(2, &texture_bind_group, &[]);

                pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..buffers.index_count, 0, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
