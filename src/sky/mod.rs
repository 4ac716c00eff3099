//! Textured sphere drawn around the camera at the far plane.

mod constants;

pub use constants::{inverse_transpose, FrameConstants, ObjectConstants};

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use pollster::FutureExt;

use crate::bind::{
    BakedBindings, BindingList, BlendState, ConstantBuffer, ConstantBufferHandle, DepthStencilState, IndexBuffer,
    InputLayout, PixelShader, RasterizerState, RenderTargets, SamplerState, ShaderResource, Topology, VertexBuffer,
    VertexShader,
};
use crate::mesh::{create_sphere, IndexedTriangleList};
use crate::scene::{NodeProperties, SceneNode, SceneTree, Transform};
use crate::shader::{ShaderCache, ShaderStage, SKY_PIXEL_SHADER, SKY_VERTEX_SHADER};
use crate::texture::Texture;

#[derive(Clone, Debug, PartialEq)]
pub struct SkyConfig {
    pub radius: f32,
    pub slice_count: u32,
    pub stack_count: u32,
    pub vertex_shader: String,
    pub pixel_shader: String,
    pub label: String,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            radius: 5000.0,
            slice_count: 30,
            stack_count: 30,
            vertex_shader: SKY_VERTEX_SHADER.to_string(),
            pixel_shader: SKY_PIXEL_SHADER.to_string(),
            label: "Sky Sphere".to_string(),
        }
    }
}

/// Depth test passes at the far plane; the stencil counts how often the sky
/// is hidden by front and back faces.
pub fn sky_depth_stencil() -> DepthStencilState {
    let face = |depth_fail_op| wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Always,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op,
        pass_op: wgpu::StencilOperation::Keep,
    };

    DepthStencilState {
        depth_enabled: true,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState {
            front: face(wgpu::StencilOperation::IncrementClamp),
            back: face(wgpu::StencilOperation::DecrementClamp),
            read_mask: 0xFF,
            write_mask: 0xFF,
        },
    }
}

/// Viewed from inside, so nothing is culled.
pub fn sky_rasterizer() -> RasterizerState {
    RasterizerState {
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        front_face: wgpu::FrontFace::Cw,
        depth_clip: true,
    }
}

/// Runs `create` with validation and out-of-memory errors captured, so GPU
/// failures surface as errors instead of the device's uncaptured handler.
fn with_error_scopes<T>(device: &wgpu::Device, label: &str, create: impl FnOnce() -> Result<T>) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let created = create();

    let validation = device.pop_error_scope().block_on();
    let out_of_memory = device.pop_error_scope().block_on();
    if let Some(error) = validation.or(out_of_memory) {
        bail!("GPU error while creating '{}': {}", label, error);
    }

    created
}

pub struct SkySphere {
    properties: NodeProperties,
    bindings: BindingList,
    baked: BakedBindings,
    vs_object: ConstantBufferHandle<ObjectConstants>,
    ps_object: ConstantBufferHandle<ObjectConstants>,
    ps_frame: ConstantBufferHandle<FrameConstants>,
    object_constants: ObjectConstants,
    frame_constants: FrameConstants,
}

impl SkySphere {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &ShaderCache,
        targets: RenderTargets,
        texture_path: &Path,
    ) -> Result<Self> {
        Self::with_config(device, queue, shaders, targets, texture_path, &SkyConfig::default())
    }

    pub fn with_config(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &ShaderCache,
        targets: RenderTargets,
        texture_path: &Path,
        config: &SkyConfig,
    ) -> Result<Self> {
        with_error_scopes(device, &config.label, || {
            let texture = Texture::from_path(device, queue, texture_path, Some(config.label.as_str()))?;
            Self::build(device, shaders, targets, texture, config)
        })
    }

    /// Builds the sky around an already uploaded texture.
    pub fn from_texture(
        device: &wgpu::Device,
        shaders: &ShaderCache,
        targets: RenderTargets,
        texture: Texture,
        config: &SkyConfig,
    ) -> Result<Self> {
        with_error_scopes(device, &config.label, || Self::build(device, shaders, targets, texture, config))
    }

    fn build(
        device: &wgpu::Device,
        shaders: &ShaderCache,
        targets: RenderTargets,
        texture: Texture,
        config: &SkyConfig,
    ) -> Result<Self> {
        let mesh = create_sphere(config.radius, config.slice_count, config.stack_count);
        let model = IndexedTriangleList::from_mesh_data(&mesh);
        debug!(
            "Generated sky mesh: {} vertices, {} triangles",
            model.vertices.len(),
            mesh.triangle_count()
        );

        let mut bindings = BindingList::new();
        bindings.push(VertexBuffer::new(device, &model.vertices, &config.label));
        bindings.push(IndexBuffer::new(device, &model.indices, &config.label));

        let vertex_shader = VertexShader::new(shaders.get(&config.vertex_shader)?)
            .with_context(|| format!("Failed to bind vertex shader {}", config.vertex_shader))?;
        let input_layout = InputLayout::from_vertex_shader(&vertex_shader)
            .with_context(|| format!("Failed to reflect input layout from {}", config.vertex_shader))?;
        bindings.push(vertex_shader);
        bindings.push(
            PixelShader::new(shaders.get(&config.pixel_shader)?)
                .with_context(|| format!("Failed to bind pixel shader {}", config.pixel_shader))?,
        );
        bindings.push(ShaderResource::new(texture, 0));
        bindings.push(input_layout);
        bindings.push(Topology(wgpu::PrimitiveTopology::TriangleList));
        bindings.push(SamplerState::new(device, 0));
        bindings.push(sky_depth_stencil());
        bindings.push(sky_rasterizer());
        bindings.push(BlendState::default());

        let object_constants = ObjectConstants::identity();
        let frame_constants = FrameConstants::default();
        let vs_object = bindings.push_constant_buffer(ConstantBuffer::new(
            device,
            ShaderStage::Vertex,
            0,
            &object_constants,
            &format!("{} VS Object Constants", config.label),
        ));
        let ps_object = bindings.push_constant_buffer(ConstantBuffer::new(
            device,
            ShaderStage::Pixel,
            0,
            &object_constants,
            &format!("{} PS Object Constants", config.label),
        ));
        let ps_frame = bindings.push_constant_buffer(ConstantBuffer::new(
            device,
            ShaderStage::Pixel,
            1,
            &frame_constants,
            &format!("{} PS Frame Constants", config.label),
        ));

        let baked = bindings
            .bake(device, &targets, &config.label)
            .with_context(|| format!("Failed to bake bindings for '{}'", config.label))?;

        info!(
            "Created '{}' (radius {}, {}x{}) with {} bindings",
            config.label,
            config.radius,
            config.slice_count,
            config.stack_count,
            bindings.len()
        );

        Ok(Self {
            properties: NodeProperties::new(config.label.clone(), Transform::new()),
            bindings,
            baked,
            vs_object,
            ps_object,
            ps_frame,
            object_constants,
            frame_constants,
        })
    }

    pub fn bindings(&self) -> &BindingList {
        &self.bindings
    }

    pub fn baked(&self) -> &BakedBindings {
        &self.baked
    }

    pub fn object_constants(&self) -> &ObjectConstants {
        &self.object_constants
    }

    pub fn frame_constants(&self) -> &FrameConstants {
        &self.frame_constants
    }

    pub fn properties_mut(&mut self) -> &mut NodeProperties {
        &mut self.properties
    }
}

impl SceneNode for SkySphere {
    fn properties(&self) -> &NodeProperties {
        &self.properties
    }

    fn pre_render(&mut self, scene: &mut SceneTree, queue: &wgpu::Queue) -> Result<()> {
        scene.push_and_set_matrix(self.properties.to_parent());

        self.object_constants = ObjectConstants::from_scene(scene.top_matrix(), scene.camera());

        self.bindings.update_constant(queue, self.vs_object, &self.object_constants)?;
        self.bindings.update_constant(queue, self.ps_object, &self.object_constants)?;
        self.bindings.update_constant(queue, self.ps_frame, &self.frame_constants)?;
        Ok(())
    }

    fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        self.bindings.draw(&self.baked, render_pass);
    }
}

#[cfg(test)]
mod tests;
