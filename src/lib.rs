use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;
use log::info;
use winit::window::Window;

pub mod bind;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod sky;
pub mod texture;

#[cfg(test)]
mod test_support;

use renderer::Renderer;
use scene::{Camera, SceneNode, SceneTree};
use shader::ShaderCache;
use sky::{SkyConfig, SkySphere};
use texture::Texture;

const GRADIENT_ZENITH: [u8; 3] = [40, 90, 200];
const GRADIENT_HORIZON: [u8; 3] = [200, 220, 240];

/// What the viewer puts in its scene.
#[derive(Clone, Debug, Default)]
pub struct ViewerOptions {
    pub texture: Option<PathBuf>,
    pub shader_dir: Option<PathBuf>,
    pub sky: SkyConfig,
}

pub struct State {
    window: Arc<Window>,
    pub scene: SceneTree,
    nodes: Vec<Box<dyn SceneNode>>,
    renderer: Renderer,
}

impl State {
    pub fn new(window: Window, options: &ViewerOptions) -> Result<Self> {
        let window = Arc::new(window);
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("Failed to find an appropriate adapter")?;

        let adapter_info = adapter.get_info();
        info!("Using adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no supported formats")?;
        info!("Selected surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let renderer = Renderer::new(device, queue, surface, config);

        let mut shaders = match &options.shader_dir {
            Some(dir) => ShaderCache::new().with_shader_dir(dir),
            None => ShaderCache::new(),
        };
        shaders
            .load_builtins(renderer.device())
            .context("Failed to load sky shaders")?;

        let sky = match &options.texture {
            Some(path) => SkySphere::with_config(
                renderer.device(),
                renderer.queue(),
                &shaders,
                renderer.targets(),
                path,
                &options.sky,
            )?,
            None => {
                info!("No sky texture given, using a generated gradient");
                let texture =
                    Texture::gradient(renderer.device(), renderer.queue(), GRADIENT_ZENITH, GRADIENT_HORIZON, 256)?;
                SkySphere::from_texture(renderer.device(), &shaders, renderer.targets(), texture, &options.sky)?
            }
        };

        let camera = Camera::new(Vec3::new(0.0, 1.0, 0.0), size.width.max(1) as f32 / size.height.max(1) as f32);

        Ok(Self {
            window,
            scene: SceneTree::new(camera),
            nodes: vec![Box::new(sky)],
            renderer,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.renderer.resize(width, height);
            self.scene.resize(width, height);
        }
    }

    pub fn update(&mut self) -> Result<()> {
        let elapsed_ms = self.scene.update();
        for node in self.nodes.iter_mut() {
            node.on_update(&mut self.scene, elapsed_ms)?;
        }
        Ok(())
    }

    pub fn render(&mut self) -> Result<()> {
        self.renderer.render(&mut self.scene, &mut self.nodes)
    }
}
