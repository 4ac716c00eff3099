//! Fixed-function pipeline state. Each value is baked into the render
//! pipeline when the binding list is baked.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("depth-stencil state enables stencil but target format {0:?} has no stencil aspect")]
pub struct StencilFormatError(pub wgpu::TextureFormat);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Topology(pub wgpu::PrimitiveTopology);

impl Default for Topology {
    fn default() -> Self {
        Self(wgpu::PrimitiveTopology::TriangleList)
    }
}

pub struct SamplerState {
    pub sampler: wgpu::Sampler,
    pub slot: u32,
}

impl SamplerState {
    /// Trilinear filtering with clamped addressing.
    pub fn new(device: &wgpu::Device, slot: u32) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sky Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { sampler, slot }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DepthStencilState {
    pub depth_enabled: bool,
    pub depth_write_enabled: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub stencil: wgpu::StencilState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_enabled: true,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
        }
    }
}

impl DepthStencilState {
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> Result<wgpu::DepthStencilState, StencilFormatError> {
        if self.stencil.is_enabled() && !format.has_stencil_aspect() {
            return Err(StencilFormatError(format));
        }

        let (depth_write_enabled, depth_compare) = if self.depth_enabled {
            (self.depth_write_enabled, self.depth_compare)
        } else {
            (false, wgpu::CompareFunction::Always)
        };

        Ok(wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare,
            stencil: self.stencil.clone(),
            bias: wgpu::DepthBiasState::default(),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterizerState {
    pub cull_mode: Option<wgpu::Face>,
    pub polygon_mode: wgpu::PolygonMode,
    pub front_face: wgpu::FrontFace,
    pub depth_clip: bool,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            front_face: wgpu::FrontFace::Cw,
            depth_clip: true,
        }
    }
}

impl RasterizerState {
    pub fn primitive_state(&self, topology: Topology) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: topology.0,
            strip_index_format: None,
            front_face: self.front_face,
            cull_mode: self.cull_mode,
            polygon_mode: self.polygon_mode,
            unclipped_depth: !self.depth_clip,
            conservative: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlendState {
    pub blend: Option<wgpu::BlendState>,
    pub write_mask: wgpu::ColorWrites,
}

impl Default for BlendState {
    /// Opaque: source replaces destination.
    fn default() -> Self {
        Self {
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }
}

impl BlendState {
    pub fn color_target(&self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.blend,
            write_mask: self.write_mask,
        }
    }
}
