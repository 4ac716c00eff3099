use std::marker::PhantomData;

use wgpu::util::DeviceExt;

use crate::shader::ShaderStage;

pub struct VertexBuffer {
    pub buffer: wgpu::Buffer,
    pub stride: wgpu::BufferAddress,
    pub label: String,
}

impl VertexBuffer {
    /// `owner` names the object the buffer belongs to; the kind is appended.
    pub fn new<V: bytemuck::Pod>(device: &wgpu::Device, vertices: &[V], owner: &str) -> Self {
        let label = format!("{} Vertex Buffer", owner);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        log::debug!("Created {} ({} vertices)", label, vertices.len());

        Self {
            buffer,
            stride: std::mem::size_of::<V>() as wgpu::BufferAddress,
            label,
        }
    }
}

pub struct IndexBuffer {
    pub buffer: wgpu::Buffer,
    pub index_count: u32,
    pub label: String,
}

impl IndexBuffer {
    pub const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

    pub fn new(device: &wgpu::Device, indices: &[u32], owner: &str) -> Self {
        let label = format!("{} Index Buffer", owner);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!("Created {} ({} indices)", label, indices.len());

        Self {
            buffer,
            index_count: indices.len() as u32,
            label,
        }
    }
}

/// Uniform buffer visible to one shader stage at a fixed slot.
pub struct ConstantBuffer {
    pub buffer: wgpu::Buffer,
    pub stage: ShaderStage,
    pub slot: u32,
    pub size: wgpu::BufferAddress,
}

impl ConstantBuffer {
    pub fn new<T: bytemuck::Pod>(
        device: &wgpu::Device,
        stage: ShaderStage,
        slot: u32,
        initial: &T,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        });

        Self {
            buffer,
            stage,
            slot,
            size: std::mem::size_of::<T>() as wgpu::BufferAddress,
        }
    }
}

/// Typed, non-owning reference to a constant buffer stored in a
/// [`BindingList`](super::BindingList).
pub struct ConstantBufferHandle<T> {
    pub(super) index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ConstantBufferHandle<T> {
    pub(super) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for ConstantBufferHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ConstantBufferHandle<T> {}

impl<T> std::fmt::Debug for ConstantBufferHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantBufferHandle")
            .field("index", &self.index)
            .finish()
    }
}
