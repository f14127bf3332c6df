//! # Phalanx
//!
//! **A minimal real-time 3D engine for interactive block worlds.**
//!
//! Phalanx manages a GPU context, a flat scene of discrete textured
//! objects, a rate-driven first-person camera, and a perspective
//! projection, and renders one frame per display refresh. It was built
//! for a voxel-block demo — fly around, drop textured cubes — but the
//! engine core is domain-agnostic.
//!
//! ## Shape of a frame
//!
//! The host owns the loop and calls into the engine once per scheduled
//! frame, in a fixed order:
//!
//! ```ignore
//! handle_input(&input, camera);          // key state -> camera rates
//! camera.update_view_matrix();           // freeze this frame's view
//! renderer.render()?;                    // clear, bind, draw the scene
//! camera.animate();                      // integrate rates post-frame
//! input.begin_frame();
//! ```
//!
//! Input mutation always lands before `render`, and rate integration
//! always after, so a rendered frame reflects the pre-update camera.
//!
//! ## Setting up
//!
//! ```ignore
//! use phalanx::*;
//!
//! let gpu = GpuContext::new(window.clone());
//!
//! let mut program = Program::new();
//! program.set_vertex_shader(&gpu, include_str!("shaders/scene.vert.wgsl"))?;
//! program.set_fragment_shader(&gpu, include_str!("shaders/scene.frag.wgsl"))?;
//! program.link(&gpu)?;
//!
//! let mut renderer = Renderer::new(gpu, width, height);
//! renderer.set_program(program);
//! renderer.set_projection(Projection::new(width, height));
//! renderer.set_camera(Camera::new(0.0, 0.0, 10.0));
//!
//! let brick = renderer.add_texture(Texture::load(renderer.gpu(), "assets/brickwall.png"));
//! let mut cube = Geometry::block();
//! cube.set_texture(brick);
//! renderer.add_geometry(cube);
//! ```

mod camera;
mod error;
mod geometry;
mod gpu;
mod input;
mod lighting;
mod program;
mod projection;
mod renderer;
mod scene;
mod texture;

pub use camera::Camera;
pub use error::{GeometryError, RenderError, ShaderError, TextureError, UniformError};
pub use geometry::{ATTRIBUTE_POSITION, ATTRIBUTE_UV, Geometry, SceneVertex};
pub use gpu::GpuContext;
pub use input::{
    InputState, MOVE_SPEED, PLACE_DISTANCE, TURN_RATE, handle_input, placement_offset,
};
pub use lighting::DirectionalLight;
pub use program::{Program, ShaderStage, UniformKind, UniformValue};
pub use projection::{FOV_Y_DEGREES, Projection, Z_FAR, Z_NEAR};
pub use renderer::Renderer;
pub use scene::{DrawCall, Scene};
pub use texture::{Texture, TextureId, TextureState};

// Re-export the math types that appear in the public API.
pub use glam::{Mat4, Vec3};

// Re-export the key codes the input layer speaks.
pub use winit::keyboard::KeyCode;
