//! Per-object geometry: staged vertex data, a model transform, and the
//! GPU buffers behind one draw call.
//!
//! A [`Geometry`] stages its attribute and index data CPU-side, where the
//! validation contract lives: attribute lengths must divide evenly by
//! their component count, every attribute must agree on the vertex count,
//! and indices must stay inside the vertex sequence. A call that fails
//! validation leaves the staged state untouched, so a rejected object
//! never reaches the GPU in a half-mutated shape.
//!
//! GPU buffers are built lazily the first time the renderer prepares the
//! object for a frame, and rebuilt whenever the staged data changes. The
//! model transform (translate ∘ scale) is separate from the buffers and
//! is recomposed on demand, so moving an object never re-uploads its
//! vertices.

use glam::{Mat4, Vec3};

use crate::error::GeometryError;
use crate::gpu::GpuContext;
use crate::program::{LinkedProgram, MODEL_UNIFORM_SIZE};
use crate::texture::TextureId;

/// Vertex attribute name for positions (three components per vertex).
pub const ATTRIBUTE_POSITION: &str = "position";
/// Vertex attribute name for texture coordinates (two components per vertex).
pub const ATTRIBUTE_UV: &str = "uv";

/// Interleaved vertex format consumed by the scene pipeline.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl SceneVertex {
    /// Buffer layout: position at shader location 0, uv at location 1,
    /// 20 bytes per vertex.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SceneVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// GPU-side state for one geometry, built by `prepare`.
pub(crate) struct GeometryBuffers {
    pub(crate) vertex: wgpu::Buffer,
    pub(crate) index: wgpu::Buffer,
    pub(crate) index_count: u32,
    model_buffer: wgpu::Buffer,
    pub(crate) model_bind_group: wgpu::BindGroup,
}

impl GeometryBuffers {
    /// Upload the model matrix for this frame's draw. Each geometry owns
    /// its model buffer, so writes for different objects never alias.
    pub(crate) fn write_model(&self, gpu: &GpuContext, model: Mat4) {
        gpu.queue
            .write_buffer(&self.model_buffer, 0, bytemuck::bytes_of(&model.to_cols_array()));
    }
}

/// One discrete textured object in the scene.
pub struct Geometry {
    positions: Option<Vec<f32>>,
    uvs: Option<Vec<f32>>,
    indices: Vec<u32>,
    translate: Vec3,
    scale: Vec3,
    texture: Option<TextureId>,
    buffers: Option<GeometryBuffers>,
    dirty: bool,
}

impl Geometry {
    /// Create an empty geometry with an identity transform.
    pub fn new() -> Self {
        Self {
            positions: None,
            uvs: None,
            indices: Vec::new(),
            translate: Vec3::ZERO,
            scale: Vec3::ONE,
            texture: None,
            buffers: None,
            dirty: true,
        }
    }

    /// Stage a named vertex attribute.
    ///
    /// The scene pipeline understands [`ATTRIBUTE_POSITION`] (3 components)
    /// and [`ATTRIBUTE_UV`] (2 components). The data length must be a
    /// whole number of vertices, and the vertex count must agree with any
    /// attribute staged earlier. On error nothing is mutated.
    pub fn add_attribute(
        &mut self,
        name: &str,
        data: Vec<f32>,
        components: usize,
    ) -> Result<(), GeometryError> {
        let expected = match name {
            ATTRIBUTE_POSITION => 3,
            ATTRIBUTE_UV => 2,
            _ => {
                return Err(GeometryError::Malformed(format!(
                    "unsupported attribute '{name}'"
                )));
            }
        };
        if components != expected {
            return Err(GeometryError::Malformed(format!(
                "attribute '{name}' takes {expected} components per vertex, got {components}"
            )));
        }
        if data.len() % components != 0 {
            return Err(GeometryError::Malformed(format!(
                "attribute '{name}' has {} values, not a whole number of vertices",
                data.len()
            )));
        }

        let count = data.len() / components;
        let existing = self.vertex_count();
        if (self.positions.is_some() || self.uvs.is_some()) && count != existing {
            return Err(GeometryError::Malformed(format!(
                "attribute '{name}' has {count} vertices, existing attributes have {existing}"
            )));
        }

        match name {
            ATTRIBUTE_POSITION => self.positions = Some(data),
            _ => self.uvs = Some(data),
        }
        self.dirty = true;
        Ok(())
    }

    /// Stage the triangle-list index sequence.
    ///
    /// Every index must address a staged vertex; an out-of-range index
    /// rejects the whole call and leaves the previous indices in place.
    pub fn set_indices(&mut self, data: Vec<u32>) -> Result<(), GeometryError> {
        if data.len() % 3 != 0 {
            return Err(GeometryError::Malformed(format!(
                "{} indices do not form a whole number of triangles",
                data.len()
            )));
        }
        let vertex_count = self.vertex_count();
        if let Some(&index) = data.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        self.indices = data;
        self.dirty = true;
        Ok(())
    }

    /// Associate a shared texture. Geometry without a texture draws with
    /// the renderer's plain white fallback.
    pub fn set_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Set the translation component of the model transform.
    pub fn set_translate(&mut self, x: f32, y: f32, z: f32) {
        self.translate = Vec3::new(x, y, z);
    }

    /// Set the scale component of the model transform.
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vec3::new(x, y, z);
    }

    /// Model matrix placing this object in world space: translate ∘ scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate) * Mat4::from_scale(self.scale)
    }

    /// Number of staged vertices.
    pub fn vertex_count(&self) -> usize {
        match (&self.positions, &self.uvs) {
            (Some(p), _) => p.len() / 3,
            (None, Some(uv)) => uv.len() / 2,
            (None, None) => 0,
        }
    }

    /// Staged index sequence.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// True when the geometry has enough data to issue a draw call.
    pub fn is_drawable(&self) -> bool {
        self.positions.is_some() && !self.indices.is_empty()
    }

    /// Build or rebuild the GPU buffers if the staged data changed.
    /// No-op for geometry that is not drawable.
    pub(crate) fn prepare(&mut self, gpu: &GpuContext, program: &LinkedProgram) {
        if !self.is_drawable() || (!self.dirty && self.buffers.is_some()) {
            return;
        }

        use wgpu::util::DeviceExt;

        let positions = self.positions.as_deref().unwrap_or(&[]);
        let uvs = self.uvs.as_deref().unwrap_or(&[]);
        let vertices: Vec<SceneVertex> = positions
            .chunks_exact(3)
            .enumerate()
            .map(|(i, p)| SceneVertex {
                position: [p[0], p[1], p[2]],
                uv: uvs
                    .get(i * 2..i * 2 + 2)
                    .map_or([0.0, 0.0], |uv| [uv[0], uv[1]]),
            })
            .collect();

        let vertex = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let model_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Geometry Model Uniform"),
            size: MODEL_UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let model_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Geometry Model Bind Group"),
            layout: &program.model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        self.buffers = Some(GeometryBuffers {
            vertex,
            index,
            index_count: self.indices.len() as u32,
            model_buffer,
            model_bind_group,
        });
        self.dirty = false;
    }

    pub(crate) fn buffers(&self) -> Option<&GeometryBuffers> {
        self.buffers.as_ref()
    }

    /// The prototype block: a cube spanning ±1 on each axis, every face
    /// tiling its texture three times.
    pub fn block() -> Self {
        #[rustfmt::skip]
        let positions: Vec<f32> = vec![
            // Front face
            -1.0, -1.0,  1.0,
             1.0, -1.0,  1.0,
             1.0,  1.0,  1.0,
            -1.0,  1.0,  1.0,
            // Back face
            -1.0, -1.0, -1.0,
            -1.0,  1.0, -1.0,
             1.0,  1.0, -1.0,
             1.0, -1.0, -1.0,
            // Top face
            -1.0,  1.0, -1.0,
            -1.0,  1.0,  1.0,
             1.0,  1.0,  1.0,
             1.0,  1.0, -1.0,
            // Bottom face
            -1.0, -1.0, -1.0,
             1.0, -1.0, -1.0,
             1.0, -1.0,  1.0,
            -1.0, -1.0,  1.0,
            // Right face
             1.0, -1.0, -1.0,
             1.0,  1.0, -1.0,
             1.0,  1.0,  1.0,
             1.0, -1.0,  1.0,
            // Left face
            -1.0, -1.0, -1.0,
            -1.0, -1.0,  1.0,
            -1.0,  1.0,  1.0,
            -1.0,  1.0, -1.0,
        ];

        #[rustfmt::skip]
        let uvs: Vec<f32> = vec![
            // Front face
            0.0, 0.0,  3.0, 0.0,  3.0, 3.0,  0.0, 3.0,
            // Back face
            3.0, 0.0,  3.0, 3.0,  0.0, 3.0,  0.0, 0.0,
            // Top face
            0.0, 3.0,  0.0, 0.0,  3.0, 0.0,  3.0, 3.0,
            // Bottom face
            3.0, 3.0,  0.0, 3.0,  0.0, 0.0,  3.0, 0.0,
            // Right face
            3.0, 0.0,  3.0, 3.0,  0.0, 3.0,  0.0, 0.0,
            // Left face
            0.0, 0.0,  3.0, 0.0,  3.0, 3.0,  0.0, 3.0,
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
             0,  1,  2,   0,  2,  3, // front
             4,  5,  6,   4,  6,  7, // back
             8,  9, 10,   8, 10, 11, // top
            12, 13, 14,  12, 14, 15, // bottom
            16, 17, 18,  16, 18, 19, // right
            20, 21, 22,  20, 22, 23, // left
        ];

        let mut geometry = Self::new();
        geometry.positions = Some(positions);
        geometry.uvs = Some(uvs);
        geometry.indices = indices;
        geometry
    }

    /// A flat slab one unit below the origin, tiling its texture a
    /// hundred times across. Scale it wide to make a floor.
    pub fn floor_slab() -> Self {
        #[rustfmt::skip]
        let positions: Vec<f32> = vec![
            -1.0, -1.0, -1.0,
             1.0, -1.0, -1.0,
             1.0, -1.0,  1.0,
            -1.0, -1.0,  1.0,
        ];

        #[rustfmt::skip]
        let uvs: Vec<f32> = vec![
              0.0,   0.0,
            100.0,   0.0,
            100.0, 100.0,
              0.0, 100.0,
        ];

        let mut geometry = Self::new();
        geometry.positions = Some(positions);
        geometry.uvs = Some(uvs);
        geometry.indices = vec![0, 1, 2, 0, 2, 3];
        geometry
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_length_must_divide_by_components() {
        let mut geometry = Geometry::new();
        let err = geometry
            .add_attribute(ATTRIBUTE_POSITION, vec![0.0; 7], 3)
            .unwrap_err();
        assert!(matches!(err, GeometryError::Malformed(_)));
        assert_eq!(geometry.vertex_count(), 0);
    }

    #[test]
    fn attributes_must_agree_on_vertex_count() {
        let mut geometry = Geometry::new();
        geometry
            .add_attribute(ATTRIBUTE_POSITION, vec![0.0; 9], 3)
            .unwrap();
        let err = geometry
            .add_attribute(ATTRIBUTE_UV, vec![0.0; 4], 2)
            .unwrap_err();
        assert!(matches!(err, GeometryError::Malformed(_)));
        // The failed call must not have replaced anything.
        assert_eq!(geometry.vertex_count(), 3);
    }

    #[test]
    fn unsupported_attribute_names_are_rejected() {
        let mut geometry = Geometry::new();
        let err = geometry
            .add_attribute("tangent", vec![0.0; 9], 3)
            .unwrap_err();
        assert!(matches!(err, GeometryError::Malformed(_)));
    }

    #[test]
    fn out_of_range_index_rejects_without_mutation() {
        let mut geometry = Geometry::new();
        geometry
            .add_attribute(ATTRIBUTE_POSITION, vec![0.0; 9], 3)
            .unwrap();
        geometry.set_indices(vec![0, 1, 2]).unwrap();

        let err = geometry.set_indices(vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3,
            }
        );
        assert_eq!(geometry.indices(), &[0, 1, 2]);
    }

    #[test]
    fn partial_triangles_are_rejected() {
        let mut geometry = Geometry::new();
        geometry
            .add_attribute(ATTRIBUTE_POSITION, vec![0.0; 9], 3)
            .unwrap();
        let err = geometry.set_indices(vec![0, 1]).unwrap_err();
        assert!(matches!(err, GeometryError::Malformed(_)));
    }

    #[test]
    fn model_matrix_applies_scale_then_translate() {
        let mut geometry = Geometry::new();
        geometry.set_translate(1.0, 2.0, 3.0);
        geometry.set_scale(2.0, 2.0, 2.0);

        let p = geometry.model_matrix() * glam::Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!((p.x, p.y, p.z), (3.0, 4.0, 5.0));
    }

    #[test]
    fn block_primitive_is_consistent() {
        let block = Geometry::block();
        assert_eq!(block.vertex_count(), 24);
        assert_eq!(block.indices().len(), 36);
        assert!(block.is_drawable());
        assert!(block.indices().iter().all(|&i| (i as usize) < 24));
    }

    #[test]
    fn floor_primitive_is_consistent() {
        let floor = Geometry::floor_slab();
        assert_eq!(floor.vertex_count(), 4);
        assert_eq!(floor.indices().len(), 6);
        assert!(floor.is_drawable());
    }

    #[test]
    fn empty_geometry_is_not_drawable() {
        assert!(!Geometry::new().is_drawable());
    }
}
