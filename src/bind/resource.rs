use crate::texture::Texture;

/// Texture exposed to the pixel stage at a fixed slot.
pub struct ShaderResource {
    pub texture: Texture,
    pub slot: u32,
}

impl ShaderResource {
    pub fn new(texture: Texture, slot: u32) -> Self {
        Self { texture, slot }
    }

    pub fn binding_type(&self) -> wgpu::BindingType {
        wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        }
    }
}
