use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    event::*,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, WindowBuilder},
};
use sky_sphere::{sky::SkyConfig, State, ViewerOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sky texture (PNG or JPEG). A generated gradient is used when omitted.
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Directory whose shader files override the built-in sky shaders
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 5000.0)]
    radius: f32,

    #[arg(long, default_value_t = 30)]
    slices: u32,

    #[arg(long, default_value_t = 30)]
    stacks: u32,
}

impl Args {
    fn viewer_options(self) -> ViewerOptions {
        ViewerOptions {
            texture: self.texture,
            shader_dir: self.shader_dir,
            sky: SkyConfig {
                radius: self.radius,
                slice_count: self.slices,
                stack_count: self.stacks,
                ..Default::default()
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let options = Args::parse().viewer_options();

    let event_loop = winit::event_loop::EventLoop::new().context("Failed to create event loop")?;

    let window = WindowBuilder::new()
        .with_title("Sky Viewer")
        .with_visible(true)
        .build(&event_loop)
        .context("Failed to create window")?;

    let mut state = State::new(window, &options)?;
    let mut mouse_captured = false;

    event_loop.run(move |event, window_target| {
        match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::KeyboardInput {
                        event: KeyEvent {
                            physical_key: PhysicalKey::Code(key_code),
                            state: key_state,
                            ..
                        },
                        ..
                    } => {
                        if key_code == KeyCode::Escape && key_state == ElementState::Pressed {
                            mouse_captured = false;
                            if let Err(e) = state.window().set_cursor_grab(CursorGrabMode::None) {
                                log::warn!("Failed to release cursor: {}", e);
                            }
                            state.window().set_cursor_visible(true);
                        }
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let grabbed = state.window().set_cursor_grab(CursorGrabMode::Confined)
                            .or_else(|_e| state.window().set_cursor_grab(CursorGrabMode::Locked));
                        match grabbed {
                            Ok(()) => {
                                mouse_captured = true;
                                state.window().set_cursor_visible(false);
                            }
                            Err(e) => log::warn!("Failed to grab cursor: {}", e),
                        }
                    }
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size.width, new_size.height);
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(e) = state.render() {
                            log::error!("Render error: {:#}", e);
                            window_target.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } if mouse_captured => {
                state.scene.process_mouse(delta.0 as f32, delta.1 as f32);
            }
            Event::AboutToWait => {
                if let Err(e) = state.update() {
                    log::error!("Update error: {:#}", e);
                }
                state.window().request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
