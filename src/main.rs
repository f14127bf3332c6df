//! The block-world demo: a brick monolith, a stone floor, and a free
//! camera. Fly with W/A/S/D (or the arrow keys), look up and down with
//! PageUp/PageDown, and release Space to drop a brick cube next to
//! wherever you are facing.

use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use phalanx::{
    Camera, DirectionalLight, Geometry, GpuContext, InputState, KeyCode, Program, Projection,
    Renderer, ShaderError, Texture, TextureId, UniformValue, handle_input, placement_offset,
};

const VERTEX_SHADER: &str = include_str!("shaders/scene.vert.wgsl");
const FRAGMENT_SHADER: &str = include_str!("shaders/scene.frag.wgsl");

#[derive(Default)]
struct Demo {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    input: InputState,
    block_texture: Option<TextureId>,
}

fn build_program(gpu: &GpuContext) -> Result<Program, ShaderError> {
    let mut program = Program::new();
    program.set_vertex_shader(gpu, VERTEX_SHADER)?;
    program.set_fragment_shader(gpu, FRAGMENT_SHADER)?;
    program.link(gpu)?;
    Ok(program)
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("Phalanx")
                        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
                )
                .unwrap(),
        );
        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone());

        // Shader problems are fatal to startup; report and bail out.
        let mut program = match build_program(&gpu) {
            Ok(program) => program,
            Err(err) => {
                log::error!("{err}");
                event_loop.exit();
                return;
            }
        };

        DirectionalLight::default().apply(&mut program);
        if let Err(err) = program.set_uniform("ambient_strength", UniformValue::Float(0.2)) {
            log::warn!("ambient uniform skipped: {err}");
        }

        // The decodes run in the background; cubes show up black for the
        // first few frames and pop to brick once the uploads land.
        let brick = Texture::load(&gpu, "assets/brickwall.png");
        let stone = Texture::load(&gpu, "assets/stone.png");

        let mut renderer = Renderer::new(gpu, size.width, size.height);
        renderer.set_program(program);
        renderer.set_projection(Projection::new(size.width, size.height));
        renderer.set_camera(Camera::new(0.0, 0.0, 10.0));

        let brick_id = renderer.add_texture(brick);
        let stone_id = renderer.add_texture(stone);

        for i in 0..10 {
            let mut block = Geometry::block();
            block.set_texture(brick_id);
            block.set_translate(0.0, 0.0, (i * 2) as f32);
            block.set_scale(3.0, 3.0, 3.0);
            renderer.add_geometry(block);
        }

        let mut floor = Geometry::floor_slab();
        floor.set_texture(stone_id);
        floor.set_translate(0.0, 0.0, 10.0);
        floor.set_scale(100.0, 1.0, 100.0);
        renderer.add_geometry(floor);

        self.block_texture = Some(brick_id);
        self.renderer = Some(renderer);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.set_viewport(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(renderer) = &mut self.renderer else {
                    return;
                };

                // One tick. Input lands before render, integration after,
                // so the frame shows the pre-update camera state.
                if let Some(camera) = renderer.camera_mut() {
                    handle_input(&self.input, camera);
                }

                if self.input.key_released(KeyCode::Space) {
                    if let (Some(texture), Some(camera)) = (self.block_texture, renderer.camera())
                    {
                        let position = camera.coords() + placement_offset(&camera.view_matrix());
                        let mut block = Geometry::block();
                        block.set_texture(texture);
                        block.set_translate(position.x, position.y, position.z);
                        renderer.add_geometry(block);
                    }
                }

                if let Some(camera) = renderer.camera_mut() {
                    camera.update_view_matrix();
                }
                if let Err(err) = renderer.render() {
                    log::error!("render failed: {err}");
                }
                if let Some(camera) = renderer.camera_mut() {
                    camera.animate();
                }

                self.input.begin_frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut demo = Demo::default();
    event_loop.run_app(&mut demo).unwrap();
}
