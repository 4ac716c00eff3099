//! Ordered GPU bindings owned by a drawable.
//!
//! Fixed-function state, shaders and the input layout are baked into a
//! single render pipeline. Constant buffers, shader resources and samplers
//! become bind groups, one group per stage and kind:
//!
//! | group | contents                          |
//! |-------|-----------------------------------|
//! | 0     | vertex-stage constant buffers     |
//! | 1     | pixel-stage constant buffers      |
//! | 2     | pixel-stage shader resources      |
//! | 3     | pixel-stage samplers              |
//!
//! Within a group the binding number is the slot.

mod buffer;
mod resource;
mod shader;
mod state;

pub use buffer::{ConstantBuffer, ConstantBufferHandle, IndexBuffer, VertexBuffer};
pub use resource::ShaderResource;
pub use shader::{InputLayout, PixelShader, VertexShader};
pub use state::{BlendState, DepthStencilState, RasterizerState, SamplerState, StencilFormatError, Topology};

use std::collections::BTreeMap;

use thiserror::Error;

use crate::shader::{ShaderError, ShaderStage};

pub const VERTEX_CONSTANTS_GROUP: u32 = 0;
pub const PIXEL_CONSTANTS_GROUP: u32 = 1;
pub const PIXEL_RESOURCES_GROUP: u32 = 2;
pub const PIXEL_SAMPLERS_GROUP: u32 = 3;
const GROUP_COUNT: u32 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindingKind {
    VertexBuffer,
    IndexBuffer,
    VertexShader,
    PixelShader,
    ShaderResource,
    InputLayout,
    Topology,
    Sampler,
    DepthStencil,
    Rasterizer,
    Blend,
    ConstantBuffer,
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("no {0:?} binding in list")]
    Missing(BindingKind),

    #[error("{0:?} bound more than once")]
    Duplicate(BindingKind),

    #[error("{binding:?} at position {position} must follow a {requires:?}")]
    OutOfOrder {
        binding: BindingKind,
        requires: BindingKind,
        position: usize,
    },

    #[error("input layout reflects '{layout}' but the bound vertex shader is '{bound}'")]
    InputLayoutShader { layout: String, bound: String },

    #[error("input layout stride {layout} does not match vertex buffer stride {buffer}")]
    InputLayoutStride {
        layout: wgpu::BufferAddress,
        buffer: wgpu::BufferAddress,
    },

    #[error("group {group} slot {slot} bound more than once")]
    DuplicateSlot { group: u32, slot: u32 },

    #[error("depth-stencil state bound but no depth-stencil target format given")]
    NoDepthTarget,

    #[error(transparent)]
    StencilFormat(#[from] StencilFormatError),

    #[error("binding {index} is not a constant buffer")]
    NotAConstantBuffer { index: usize },

    #[error("constant buffer {index} holds {expected} bytes, got {actual}")]
    ConstantBufferSize {
        index: usize,
        expected: wgpu::BufferAddress,
        actual: wgpu::BufferAddress,
    },

    #[error(transparent)]
    Shader(#[from] ShaderError),
}

pub enum Binding {
    VertexBuffer(VertexBuffer),
    IndexBuffer(IndexBuffer),
    VertexShader(VertexShader),
    PixelShader(PixelShader),
    ShaderResource(ShaderResource),
    InputLayout(InputLayout),
    Topology(Topology),
    Sampler(SamplerState),
    DepthStencil(DepthStencilState),
    Rasterizer(RasterizerState),
    Blend(BlendState),
    ConstantBuffer(ConstantBuffer),
}

impl Binding {
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::VertexBuffer(_) => BindingKind::VertexBuffer,
            Binding::IndexBuffer(_) => BindingKind::IndexBuffer,
            Binding::VertexShader(_) => BindingKind::VertexShader,
            Binding::PixelShader(_) => BindingKind::PixelShader,
            Binding::ShaderResource(_) => BindingKind::ShaderResource,
            Binding::InputLayout(_) => BindingKind::InputLayout,
            Binding::Topology(_) => BindingKind::Topology,
            Binding::Sampler(_) => BindingKind::Sampler,
            Binding::DepthStencil(_) => BindingKind::DepthStencil,
            Binding::Rasterizer(_) => BindingKind::Rasterizer,
            Binding::Blend(_) => BindingKind::Blend,
            Binding::ConstantBuffer(_) => BindingKind::ConstantBuffer,
        }
    }
}

macro_rules! impl_from_binding {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(impl From<$ty> for Binding {
            fn from(value: $ty) -> Self {
                Binding::$variant(value)
            }
        })*
    };
}

impl_from_binding!(
    VertexBuffer(VertexBuffer),
    IndexBuffer(IndexBuffer),
    VertexShader(VertexShader),
    PixelShader(PixelShader),
    ShaderResource(ShaderResource),
    InputLayout(InputLayout),
    Topology(Topology),
    Sampler(SamplerState),
    DepthStencil(DepthStencilState),
    Rasterizer(RasterizerState),
    Blend(BlendState),
);

/// Formats of the attachments the baked pipeline renders into.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderTargets {
    pub color_format: wgpu::TextureFormat,
    pub depth_stencil_format: Option<wgpu::TextureFormat>,
}

/// Pipeline and bind groups produced from a [`BindingList`].
pub struct BakedBindings {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_groups: Vec<wgpu::BindGroup>,
    vertex_buffer: usize,
    index_buffer: usize,
}

#[derive(Default)]
pub struct BindingList {
    bindings: Vec<Binding>,
}

impl BindingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding and returns its position.
    pub fn push(&mut self, binding: impl Into<Binding>) -> usize {
        self.bindings.push(binding.into());
        self.bindings.len() - 1
    }

    pub fn push_constant_buffer<T: bytemuck::Pod>(&mut self, buffer: ConstantBuffer) -> ConstantBufferHandle<T> {
        debug_assert_eq!(buffer.size, std::mem::size_of::<T>() as wgpu::BufferAddress);
        self.bindings.push(Binding::ConstantBuffer(buffer));
        ConstantBufferHandle::new(self.bindings.len() - 1)
    }

    pub fn constant_buffer<T>(&self, handle: ConstantBufferHandle<T>) -> Result<&ConstantBuffer, BindError> {
        match self.bindings.get(handle.index) {
            Some(Binding::ConstantBuffer(buffer)) => Ok(buffer),
            _ => Err(BindError::NotAConstantBuffer { index: handle.index }),
        }
    }

    /// Writes `value` into the constant buffer behind `handle`.
    pub fn update_constant<T: bytemuck::Pod>(
        &self,
        queue: &wgpu::Queue,
        handle: ConstantBufferHandle<T>,
        value: &T,
    ) -> Result<(), BindError> {
        let buffer = self.constant_buffer(handle)?;
        let actual = std::mem::size_of::<T>() as wgpu::BufferAddress;
        if buffer.size != actual {
            return Err(BindError::ConstantBufferSize {
                index: handle.index,
                expected: buffer.size,
                actual,
            });
        }

        queue.write_buffer(&buffer.buffer, 0, bytemuck::bytes_of(value));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn kinds(&self) -> Vec<BindingKind> {
        self.bindings.iter().map(Binding::kind).collect()
    }

    pub fn index_count(&self) -> Option<u32> {
        self.bindings.iter().find_map(|binding| match binding {
            Binding::IndexBuffer(buffer) => Some(buffer.index_count),
            _ => None,
        })
    }

    /// Walks the list in order and compiles it into a render pipeline plus
    /// bind groups.
    pub fn bake(
        &self,
        device: &wgpu::Device,
        targets: &RenderTargets,
        label: &str,
    ) -> Result<BakedBindings, BindError> {
        let mut vertex_buffer: Option<(usize, &VertexBuffer)> = None;
        let mut index_buffer: Option<usize> = None;
        let mut vertex_shader: Option<&VertexShader> = None;
        let mut pixel_shader: Option<&PixelShader> = None;
        let mut input_layout: Option<&InputLayout> = None;
        let mut topology: Option<Topology> = None;
        let mut depth_stencil: Option<&DepthStencilState> = None;
        let mut rasterizer: Option<RasterizerState> = None;
        let mut blend: Option<BlendState> = None;
        let mut groups: BTreeMap<u32, Vec<(u32, wgpu::BindingType, wgpu::ShaderStages, wgpu::BindingResource<'_>)>> =
            BTreeMap::new();

        for (position, binding) in self.bindings.iter().enumerate() {
            let kind = binding.kind();
            match binding {
                Binding::VertexBuffer(buffer) => set_once(&mut vertex_buffer, (position, buffer), kind)?,
                Binding::IndexBuffer(_) => set_once(&mut index_buffer, position, kind)?,
                Binding::VertexShader(shader) => set_once(&mut vertex_shader, shader, kind)?,
                Binding::PixelShader(shader) => set_once(&mut pixel_shader, shader, kind)?,
                Binding::InputLayout(layout) => {
                    let bound = vertex_shader.ok_or(BindError::OutOfOrder {
                        binding: kind,
                        requires: BindingKind::VertexShader,
                        position,
                    })?;
                    if !layout.references(bound) {
                        return Err(BindError::InputLayoutShader {
                            layout: layout.shader_name().to_string(),
                            bound: bound.shader().name().to_string(),
                        });
                    }
                    set_once(&mut input_layout, layout, kind)?;
                }
                Binding::Topology(value) => set_once(&mut topology, *value, kind)?,
                Binding::DepthStencil(state) => set_once(&mut depth_stencil, state, kind)?,
                Binding::Rasterizer(state) => set_once(&mut rasterizer, *state, kind)?,
                Binding::Blend(state) => set_once(&mut blend, *state, kind)?,
                Binding::ConstantBuffer(buffer) => {
                    let group = match buffer.stage {
                        ShaderStage::Vertex => VERTEX_CONSTANTS_GROUP,
                        ShaderStage::Pixel => PIXEL_CONSTANTS_GROUP,
                    };
                    let ty = wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(buffer.size),
                    };
                    add_entry(
                        &mut groups,
                        group,
                        (buffer.slot, ty, buffer.stage.visibility(), buffer.buffer.as_entire_binding()),
                    )?;
                }
                Binding::ShaderResource(resource) => {
                    add_entry(
                        &mut groups,
                        PIXEL_RESOURCES_GROUP,
                        (
                            resource.slot,
                            resource.binding_type(),
                            wgpu::ShaderStages::FRAGMENT,
                            wgpu::BindingResource::TextureView(&resource.texture.view),
                        ),
                    )?;
                }
                Binding::Sampler(sampler) => {
                    add_entry(
                        &mut groups,
                        PIXEL_SAMPLERS_GROUP,
                        (
                            sampler.slot,
                            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            wgpu::ShaderStages::FRAGMENT,
                            wgpu::BindingResource::Sampler(&sampler.sampler),
                        ),
                    )?;
                }
            }
        }

        let (vertex_buffer_index, vertex_buffer) = vertex_buffer.ok_or(BindError::Missing(BindingKind::VertexBuffer))?;
        let index_buffer = index_buffer.ok_or(BindError::Missing(BindingKind::IndexBuffer))?;
        let vertex_shader = vertex_shader.ok_or(BindError::Missing(BindingKind::VertexShader))?;
        let pixel_shader = pixel_shader.ok_or(BindError::Missing(BindingKind::PixelShader))?;
        let input_layout = input_layout.ok_or(BindError::Missing(BindingKind::InputLayout))?;

        if input_layout.stride() != vertex_buffer.stride {
            return Err(BindError::InputLayoutStride {
                layout: input_layout.stride(),
                buffer: vertex_buffer.stride,
            });
        }

        let depth_stencil = match depth_stencil {
            Some(state) => {
                let format = targets.depth_stencil_format.ok_or(BindError::NoDepthTarget)?;
                Some(state.to_wgpu(format)?)
            }
            None => None,
        };

        let mut bind_group_layouts = Vec::with_capacity(GROUP_COUNT as usize);
        let mut bind_groups = Vec::with_capacity(GROUP_COUNT as usize);
        let group_count = groups.keys().next_back().map_or(0, |last| last + 1);
        for group in 0..group_count {
            let entries = groups.remove(&group).unwrap_or_default();

            let layout_entries: Vec<_> = entries
                .iter()
                .map(|(slot, ty, visibility, _)| wgpu::BindGroupLayoutEntry {
                    binding: *slot,
                    visibility: *visibility,
                    ty: *ty,
                    count: None,
                })
                .collect();
            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} Bind Group Layout {}", label, group)),
                entries: &layout_entries,
            });

            let group_entries: Vec<_> = entries
                .into_iter()
                .map(|(slot, _, _, resource)| wgpu::BindGroupEntry { binding: slot, resource })
                .collect();
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Bind Group {}", label, group)),
                layout: &layout,
                entries: &group_entries,
            });

            bind_group_layouts.push(layout);
            bind_groups.push(bind_group);
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", label)),
            bind_group_layouts: &bind_group_layouts.iter().collect::<Vec<_>>(),
            push_constant_ranges: &[],
        });

        let blend = blend.unwrap_or_default();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: vertex_shader.shader().module(),
                entry_point: Some(vertex_shader.shader().entry_point()),
                buffers: &[input_layout.desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: pixel_shader.shader().module(),
                entry_point: Some(pixel_shader.shader().entry_point()),
                targets: &[Some(blend.color_target(targets.color_format))],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: rasterizer
                .unwrap_or_default()
                .primitive_state(topology.unwrap_or_default()),
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::debug!(
            "Baked {} bindings for '{}' into a pipeline with {} bind groups",
            self.bindings.len(),
            label,
            bind_groups.len()
        );

        Ok(BakedBindings {
            pipeline,
            bind_groups,
            vertex_buffer: vertex_buffer_index,
            index_buffer,
        })
    }

    /// Applies the baked bindings to `render_pass` and issues one indexed draw.
    pub fn draw<'a>(&'a self, baked: &'a BakedBindings, render_pass: &mut wgpu::RenderPass<'a>) {
        let (Some(Binding::VertexBuffer(vertices)), Some(Binding::IndexBuffer(indices))) = (
            self.bindings.get(baked.vertex_buffer),
            self.bindings.get(baked.index_buffer),
        ) else {
            log::error!("Baked bindings do not belong to this binding list");
            return;
        };

        render_pass.set_pipeline(&baked.pipeline);
        for (group, bind_group) in baked.bind_groups.iter().enumerate() {
            render_pass.set_bind_group(group as u32, bind_group, &[]);
        }
        render_pass.set_vertex_buffer(0, vertices.buffer.slice(..));
        render_pass.set_index_buffer(indices.buffer.slice(..), IndexBuffer::FORMAT);
        render_pass.draw_indexed(0..indices.index_count, 0, 0..1);
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, kind: BindingKind) -> Result<(), BindError> {
    if slot.is_some() {
        return Err(BindError::Duplicate(kind));
    }
    *slot = Some(value);
    Ok(())
}

fn add_entry<'a>(
    groups: &mut BTreeMap<u32, Vec<(u32, wgpu::BindingType, wgpu::ShaderStages, wgpu::BindingResource<'a>)>>,
    group: u32,
    entry: (u32, wgpu::BindingType, wgpu::ShaderStages, wgpu::BindingResource<'a>),
) -> Result<(), BindError> {
    let entries = groups.entry(group).or_default();
    if entries.iter().any(|(slot, ..)| *slot == entry.0) {
        return Err(BindError::DuplicateSlot { group, slot: entry.0 });
    }
    entries.push(entry);
    Ok(())
}
