//! Shader program compilation, linking, and uniform binding.
//!
//! A [`Program`] is built in two phases, mirroring the classic GPU shader
//! lifecycle: attach and compile the vertex and fragment stages, then
//! [`link`](Program::link) them into a render pipeline. Compilation
//! failures surface as [`ShaderError::Compile`] with the stage and the
//! compiler diagnostic; link failures as [`ShaderError::Link`]. Both are
//! fatal to startup by design.
//!
//! # Uniforms
//!
//! Uniform dispatch is a closed, typed set rather than stringly-typed GPU
//! lookups: every frame uniform the scene pipeline understands is listed
//! in one layout table with a fixed byte offset and a [`UniformKind`].
//! Name resolution happens once, into slot handles; repeated
//! [`set_uniform`](Program::set_uniform) calls by name hit a `HashMap` of
//! pre-resolved slots and write into a CPU staging block, which the
//! renderer flushes to the GPU once per frame. Unknown names return
//! [`UniformError::Unknown`], which callers are free to log and ignore —
//! optional uniforms are common.
//!
//! The pipeline uses three bind groups: group 0 holds the per-frame
//! uniform block (view/projection/lighting), group 1 the per-object model
//! matrix, group 2 the object's texture and sampler.

use std::collections::HashMap;
use std::fmt;

use glam::{Mat4, Vec3};

use crate::error::{ShaderError, UniformError};
use crate::geometry::SceneVertex;
use crate::gpu::GpuContext;
use crate::texture::Texture;

/// Depth buffer format shared by the pipeline and the renderer's depth
/// attachment.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The two programmable stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// The closed set of uniform kinds the engine can upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Mat4,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Int => write!(f, "int"),
            UniformKind::Float => write!(f, "float"),
            UniformKind::Vec3 => write!(f, "vec3"),
            UniformKind::Mat4 => write!(f, "mat4"),
        }
    }
}

/// A typed uniform value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

/// Frame uniform block layout, offsets per WGSL uniform address space
/// rules. Must match `FrameUniforms` in the scene shaders.
const FRAME_UNIFORM_LAYOUT: &[(&str, usize, UniformKind)] = &[
    ("view_matrix", 0, UniformKind::Mat4),
    ("projection_matrix", 64, UniformKind::Mat4),
    ("lighting_direction", 128, UniformKind::Vec3),
    ("ambient_strength", 140, UniformKind::Float),
    ("directional_color", 144, UniformKind::Vec3),
];
const FRAME_UNIFORM_SIZE: usize = 160;

/// Byte size of the per-object model block (one mat4).
pub(crate) const MODEL_UNIFORM_SIZE: u64 = 64;

#[derive(Clone, Copy, Debug)]
struct UniformSlot {
    offset: usize,
    kind: UniformKind,
}

/// CPU staging for one uniform block: raw bytes plus the name → slot
/// table resolved from the layout.
struct UniformBlock {
    bytes: Vec<u8>,
    slots: HashMap<&'static str, UniformSlot>,
}

impl UniformBlock {
    fn new(layout: &[(&'static str, usize, UniformKind)], size: usize) -> Self {
        let slots = layout
            .iter()
            .map(|&(name, offset, kind)| (name, UniformSlot { offset, kind }))
            .collect();
        Self {
            bytes: vec![0; size],
            slots,
        }
    }

    /// The frame block, with neutral defaults: identity matrices, no
    /// directional light, full ambient (plain textured output).
    fn frame() -> Self {
        let mut block = Self::new(FRAME_UNIFORM_LAYOUT, FRAME_UNIFORM_SIZE);
        block.write(0, bytemuck::bytes_of(&Mat4::IDENTITY.to_cols_array()));
        block.write(64, bytemuck::bytes_of(&Mat4::IDENTITY.to_cols_array()));
        block.write(140, bytemuck::bytes_of(&1.0f32));
        block
    }

    fn write(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let slot = *self
            .slots
            .get(name)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))?;
        if slot.kind != value.kind() {
            return Err(UniformError::KindMismatch {
                name: name.to_string(),
                expected: slot.kind,
                got: value.kind(),
            });
        }
        match value {
            UniformValue::Int(v) => self.write(slot.offset, bytemuck::bytes_of(&v)),
            UniformValue::Float(v) => self.write(slot.offset, bytemuck::bytes_of(&v)),
            UniformValue::Vec3(v) => self.write(slot.offset, bytemuck::bytes_of(&v.to_array())),
            UniformValue::Mat4(v) => {
                self.write(slot.offset, bytemuck::bytes_of(&v.to_cols_array()))
            }
        }
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// GPU-side state that only exists after a successful link.
pub(crate) struct LinkedProgram {
    pub(crate) pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    pub(crate) frame_bind_group: wgpu::BindGroup,
    pub(crate) model_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
}

impl LinkedProgram {
    /// Build a bind group exposing a texture and its sampler to group 2.
    pub(crate) fn texture_bind_group(
        &self,
        gpu: &GpuContext,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }
}

/// A compiled and linkable vertex + fragment shader pair with its frame
/// uniform state.
///
/// One program is active per renderer at a time; the renderer binds it and
/// flushes its staged uniforms before issuing draws, so `set_uniform`
/// calls always take effect on the next rendered frame.
pub struct Program {
    vertex: Option<wgpu::ShaderModule>,
    fragment: Option<wgpu::ShaderModule>,
    linked: Option<LinkedProgram>,
    frame_uniforms: UniformBlock,
    frame_dirty: bool,
}

impl Program {
    /// Create an empty, unlinked program.
    pub fn new() -> Self {
        Self {
            vertex: None,
            fragment: None,
            linked: None,
            frame_uniforms: UniformBlock::frame(),
            frame_dirty: true,
        }
    }

    /// Compile and attach the vertex stage from WGSL source.
    pub fn set_vertex_shader(&mut self, gpu: &GpuContext, source: &str) -> Result<(), ShaderError> {
        self.vertex = Some(compile_stage(gpu, ShaderStage::Vertex, source)?);
        Ok(())
    }

    /// Compile and attach the fragment stage from WGSL source.
    pub fn set_fragment_shader(
        &mut self,
        gpu: &GpuContext,
        source: &str,
    ) -> Result<(), ShaderError> {
        self.fragment = Some(compile_stage(gpu, ShaderStage::Fragment, source)?);
        Ok(())
    }

    /// Link the attached stages into a render pipeline targeting the
    /// surface format, and allocate the frame uniform buffer.
    pub fn link(&mut self, gpu: &GpuContext) -> Result<(), ShaderError> {
        let vertex = self
            .vertex
            .as_ref()
            .ok_or(ShaderError::MissingStage(ShaderStage::Vertex))?;
        let fragment = self
            .fragment
            .as_ref()
            .ok_or(ShaderError::MissingStage(ShaderStage::Fragment))?;

        let device = &gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &model_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        // No face culling: the floor slab is a single quad that must stay
        // visible from either side.
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some("vs"),
                buffers: &[SceneVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: FRAME_UNIFORM_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Link(err.to_string()));
        }

        self.linked = Some(LinkedProgram {
            pipeline,
            frame_buffer,
            frame_bind_group,
            model_layout,
            texture_layout,
        });
        self.frame_dirty = true;
        Ok(())
    }

    /// True once `link` has succeeded.
    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }

    /// Stage a uniform value by name.
    ///
    /// The value reaches the GPU when the renderer flushes the block
    /// before the next frame's draws. Unknown names are rejected; callers
    /// treating the uniform as optional should log and move on.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        self.frame_uniforms.set(name, value)?;
        self.frame_dirty = true;
        Ok(())
    }

    /// Upload the staged uniform block if it changed since the last flush.
    pub(crate) fn flush_uniforms(&mut self, gpu: &GpuContext) {
        if !self.frame_dirty {
            return;
        }
        if let Some(linked) = &self.linked {
            gpu.queue
                .write_buffer(&linked.frame_buffer, 0, self.frame_uniforms.bytes());
            self.frame_dirty = false;
        }
    }

    pub(crate) fn linked(&self) -> Option<&LinkedProgram> {
        self.linked.as_ref()
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_stage(
    gpu: &GpuContext,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(match stage {
                ShaderStage::Vertex => "Scene Vertex Shader",
                ShaderStage::Fragment => "Scene Fragment Shader",
            }),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
    match pollster::block_on(gpu.device.pop_error_scope()) {
        Some(err) => Err(ShaderError::Compile {
            stage,
            log: err.to_string(),
        }),
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_uniforms_write_at_their_slot() {
        let mut block = UniformBlock::frame();
        block
            .set("ambient_strength", UniformValue::Float(0.25))
            .unwrap();

        let bytes = block.bytes();
        let stored = f32::from_ne_bytes([bytes[140], bytes[141], bytes[142], bytes[143]]);
        assert_eq!(stored, 0.25);
    }

    #[test]
    fn mat4_lands_column_major() {
        let mut block = UniformBlock::frame();
        let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block.set("view_matrix", UniformValue::Mat4(view)).unwrap();

        // Translation is the fourth column: elements 12..15.
        let bytes = block.bytes();
        let x = f32::from_ne_bytes([bytes[48], bytes[49], bytes[50], bytes[51]]);
        let y = f32::from_ne_bytes([bytes[52], bytes[53], bytes[54], bytes[55]]);
        let z = f32::from_ne_bytes([bytes[56], bytes[57], bytes[58], bytes[59]]);
        assert_eq!((x, y, z), (1.0, 2.0, 3.0));
    }

    #[test]
    fn unknown_uniform_is_rejected_by_name() {
        let mut block = UniformBlock::frame();
        let err = block
            .set("specular_power", UniformValue::Float(8.0))
            .unwrap_err();
        assert_eq!(err, UniformError::Unknown("specular_power".to_string()));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut block = UniformBlock::frame();
        let err = block
            .set("lighting_direction", UniformValue::Float(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            UniformError::KindMismatch {
                name: "lighting_direction".to_string(),
                expected: UniformKind::Vec3,
                got: UniformKind::Float,
            }
        );
    }

    #[test]
    fn defaults_are_neutral() {
        let block = UniformBlock::frame();
        let bytes = block.bytes();

        // Identity view matrix: m[0] == 1.0.
        let m0 = f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(m0, 1.0);

        // Full ambient, no directional color.
        let ambient = f32::from_ne_bytes([bytes[140], bytes[141], bytes[142], bytes[143]]);
        assert_eq!(ambient, 1.0);
        let red = f32::from_ne_bytes([bytes[144], bytes[145], bytes[146], bytes[147]]);
        assert_eq!(red, 0.0);
    }

    #[test]
    fn layout_covers_the_block_without_overlap() {
        let mut spans: Vec<(usize, usize)> = FRAME_UNIFORM_LAYOUT
            .iter()
            .map(|&(_, offset, kind)| {
                let size = match kind {
                    UniformKind::Int | UniformKind::Float => 4,
                    UniformKind::Vec3 => 12,
                    UniformKind::Mat4 => 64,
                };
                (offset, offset + size)
            })
            .collect();
        spans.sort();
        for pair in spans.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "slots overlap: {pair:?}");
        }
        assert!(spans.last().unwrap().1 <= FRAME_UNIFORM_SIZE);
    }
}
