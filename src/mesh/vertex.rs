use super::sphere::GeneratorVertex;

/// Engine vertex format consumed by the sky shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyVertex {
    pub position: [f32; 4],  // homogeneous, w = 1
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
}

impl SkyVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x4,  // position
        1 => Float32x3,  // normal
        2 => Float32x2,  // tex_coords
        3 => Float32x3,  // tangent
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkyVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&GeneratorVertex> for SkyVertex {
    fn from(v: &GeneratorVertex) -> Self {
        Self {
            position: v.position.extend(1.0).to_array(),
            normal: v.normal.to_array(),
            tex_coords: v.tex_coords.to_array(),
            tangent: v.tangent_u.to_array(),
        }
    }
}
