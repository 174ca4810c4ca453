use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::time::Instant;

use glutin::event::{
    DeviceEvent, ElementState, Event, MouseScrollDelta, VirtualKeyCode, WindowEvent,
};
use glutin::event_loop::{ControlFlow, EventLoop};
use glutin::window::WindowBuilder;
use glutin::ContextBuilder;
use log::error;

use kestrel_core::cache;
use kestrel_core::glam::{Mat4, Vec3};
use kestrel_core::standard_shader::get_standard_shader;
use kestrel_core::Model;

use camera::{Camera, CameraMovement};

mod camera;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

const WINDOW_TITLE: &'static str = "Kestrel";
const DEFAULT_MODEL: &'static str = "models/backpack/backpack.obj";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let model_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_MODEL.to_owned());

    let el = EventLoop::new();
    let wb = WindowBuilder::new().with_title(WINDOW_TITLE);

    let windowed_context = ContextBuilder::new().build_windowed(wb, &el)?;
    let windowed_context = unsafe { windowed_context.make_current().map_err(|(_, e)| e)? };

    gl::load_with(|symbol| windowed_context.get_proc_address(symbol));

    unsafe {
        gl::Enable(gl::DEPTH_TEST);
    }

    let shader = get_standard_shader()?;
    let mut model = Some(Model::load(&model_path)?);

    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0));
    let mut pressed: HashSet<VirtualKeyCode> = HashSet::new();
    let mut last_frame = Instant::now();

    let mut aspect_ratio = {
        let size = windowed_context.window().inner_size();
        size.width as f32 / size.height as f32
    };

    el.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::LoopDestroyed => {
                // GL context is still current here; drop the meshes before
                // tearing down the cached textures.
                model.take();
                cache::release_all();
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Resized(size) => {
                    windowed_context.resize(size);
                    aspect_ratio = size.width as f32 / size.height.max(1) as f32;
                    unsafe {
                        gl::Viewport(0, 0, size.width as i32, size.height as i32);
                    }
                }
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput { input, .. } => {
                    if let Some(key) = input.virtual_keycode {
                        match input.state {
                            ElementState::Pressed => {
                                pressed.insert(key);
                            }
                            ElementState::Released => {
                                pressed.remove(&key);
                            }
                        }

                        if key == VirtualKeyCode::Escape {
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                }
                WindowEvent::MouseWheel {
                    delta: MouseScrollDelta::LineDelta(_, dy),
                    ..
                } => {
                    camera.process_scroll(dy);
                }
                _ => (),
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta: (dx, dy) },
                ..
            } => {
                // Screen y grows downward, pitch grows upward.
                camera.process_mouse(dx as f32, -dy as f32);
            }
            Event::MainEventsCleared => {
                windowed_context.window().request_redraw();
            }
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let delta = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                if pressed.contains(&VirtualKeyCode::W) {
                    camera.process_keyboard(CameraMovement::Forward, delta);
                }
                if pressed.contains(&VirtualKeyCode::S) {
                    camera.process_keyboard(CameraMovement::Backward, delta);
                }
                if pressed.contains(&VirtualKeyCode::A) {
                    camera.process_keyboard(CameraMovement::Left, delta);
                }
                if pressed.contains(&VirtualKeyCode::D) {
                    camera.process_keyboard(CameraMovement::Right, delta);
                }

                unsafe {
                    gl::ClearColor(0.1, 0.1, 0.1, 1.0);
                    gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
                }

                shader.use_program();
                shader.set_mat4("view", camera.view_matrix());
                shader.set_mat4(
                    "projection",
                    Mat4::perspective_rh_gl(camera.fov.to_radians(), aspect_ratio, 0.1, 100.0),
                );
                shader.set_vec3("view_pos", camera.position);
                shader.set_f32("material.shininess", 32.0);

                shader.set_vec3("dir_light.direction", Vec3::new(-0.2, -1.0, -0.3));
                shader.set_vec3("dir_light.ambient", Vec3::new(0.2, 0.2, 0.2));
                shader.set_vec3("dir_light.diffuse", Vec3::new(0.8, 0.8, 0.8));
                shader.set_vec3("dir_light.specular", Vec3::new(1.0, 1.0, 1.0));

                if let Some(model) = &model {
                    model.draw(&shader);
                }

                windowed_context.swap_buffers().unwrap();
            }
            _ => (),
        }
    });
}
