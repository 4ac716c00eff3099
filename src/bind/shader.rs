use std::sync::Arc;

use crate::shader::{CompiledShader, ShaderError, ShaderStage};

pub struct VertexShader(Arc<CompiledShader>);

impl VertexShader {
    pub fn new(shader: Arc<CompiledShader>) -> Result<Self, ShaderError> {
        shader.expect_stage(ShaderStage::Vertex)?;
        Ok(Self(shader))
    }

    pub fn shader(&self) -> &CompiledShader {
        &self.0
    }
}

pub struct PixelShader(Arc<CompiledShader>);

impl PixelShader {
    pub fn new(shader: Arc<CompiledShader>) -> Result<Self, ShaderError> {
        shader.expect_stage(ShaderStage::Pixel)?;
        Ok(Self(shader))
    }

    pub fn shader(&self) -> &CompiledShader {
        &self.0
    }
}

/// Vertex buffer layout reflected from a vertex shader's inputs.
///
/// Attributes are packed tightly in location order, so the vertex struct
/// must declare its fields in the same order as the shader's locations.
pub struct InputLayout {
    shader: Arc<CompiledShader>,
    attributes: Vec<wgpu::VertexAttribute>,
    stride: wgpu::BufferAddress,
}

impl InputLayout {
    pub fn from_vertex_shader(vertex_shader: &VertexShader) -> Result<Self, ShaderError> {
        let inputs = vertex_shader.shader().vertex_inputs()?;

        let mut offset = 0;
        let attributes = inputs
            .iter()
            .map(|input| {
                let attribute = wgpu::VertexAttribute {
                    format: input.format,
                    offset,
                    shader_location: input.location,
                };
                offset += input.format.size();
                attribute
            })
            .collect();

        log::debug!(
            "Reflected {} vertex inputs ({} bytes) from '{}'",
            inputs.len(),
            offset,
            vertex_shader.shader().name()
        );

        Ok(Self {
            shader: vertex_shader.0.clone(),
            attributes,
            stride: offset,
        })
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn stride(&self) -> wgpu::BufferAddress {
        self.stride
    }

    pub fn shader_name(&self) -> &str {
        self.shader.name()
    }

    pub fn references(&self, vertex_shader: &VertexShader) -> bool {
        Arc::ptr_eq(&self.shader, &vertex_shader.0)
    }

    pub fn desc(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}
