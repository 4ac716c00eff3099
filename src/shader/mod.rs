//! Compiled shader cache keyed by file name.
//!
//! Every shader file holds exactly one entry point. Alongside the wgpu module
//! the cache keeps the parsed `naga` IR, which is what input layouts are
//! reflected from.

mod reflect;

use log::{debug, info};
use pollster::FutureExt;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use thiserror::Error;

pub use reflect::VertexInput;

pub const SKY_VERTEX_SHADER: &str = "SkyVertexShader.wgsl";
pub const SKY_PIXEL_SHADER: &str = "SkyPixelShader.wgsl";

const BUILTIN_SHADERS: [(&str, &str); 2] = [
    (SKY_VERTEX_SHADER, include_str!("sky_vertex.wgsl")),
    (SKY_PIXEL_SHADER, include_str!("sky_pixel.wgsl")),
];

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to parse: {message}")]
    Parse { name: String, message: String },

    #[error("shader '{name}' failed validation: {message}")]
    Validation { name: String, message: String },

    #[error("shader file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file: {0}")]
    Io(#[from] std::io::Error),

    #[error("shader '{name}' not found in cache")]
    NotLoaded { name: String },

    #[error("shader '{name}' must declare exactly one entry point, found {count}")]
    EntryPointCount { name: String, count: usize },

    #[error("shader '{name}' uses unsupported stage {stage:?}")]
    UnsupportedStage { name: String, stage: naga::ShaderStage },

    #[error("shader '{name}' input at location {location} has unsupported type {ty}")]
    UnsupportedInput { name: String, location: u32, ty: String },

    #[error("shader '{name}' is a {actual:?} shader, expected {expected:?}")]
    WrongStage {
        name: String,
        expected: ShaderStage,
        actual: ShaderStage,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    pub fn visibility(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Pixel => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

pub struct CompiledShader {
    name: String,
    stage: ShaderStage,
    entry_point: String,
    module: wgpu::ShaderModule,
    ir: naga::Module,
}

impl CompiledShader {
    pub fn compile(device: &wgpu::Device, name: &str, source: &str) -> Result<Self, ShaderError> {
        let ir = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
            name: name.to_string(),
            message: e.emit_to_string(source),
        })?;

        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
            .validate(&ir)
            .map_err(|e| ShaderError::Validation {
                name: name.to_string(),
                message: e.emit_to_string(source),
            })?;

        let [entry] = ir.entry_points.as_slice() else {
            return Err(ShaderError::EntryPointCount {
                name: name.to_string(),
                count: ir.entry_points.len(),
            });
        };

        let stage = match entry.stage {
            naga::ShaderStage::Vertex => ShaderStage::Vertex,
            naga::ShaderStage::Fragment => ShaderStage::Pixel,
            other => {
                return Err(ShaderError::UnsupportedStage {
                    name: name.to_string(),
                    stage: other,
                })
            }
        };
        let entry_point = entry.name.clone();

        // Device-level checks naga does not know about, such as missing features.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = device.pop_error_scope().block_on() {
            return Err(ShaderError::Validation {
                name: name.to_string(),
                message: error.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            stage,
            entry_point,
            module,
            ir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn expect_stage(&self, expected: ShaderStage) -> Result<(), ShaderError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ShaderError::WrongStage {
                name: self.name.clone(),
                expected,
                actual: self.stage,
            })
        }
    }
}

/// Shared registry of compiled shaders.
pub struct ShaderCache {
    shaders: HashMap<String, Arc<CompiledShader>>,
    shader_dir: Option<PathBuf>,
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCache {
    pub fn new() -> Self {
        Self {
            shaders: HashMap::new(),
            shader_dir: None,
        }
    }

    /// Directory searched by [`ShaderCache::load_from_file`] and for builtin overrides.
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    /// Compiles the shaders shipped with the crate. A file with the same name
    /// in the shader directory takes precedence over the embedded source.
    pub fn load_builtins(&mut self, device: &wgpu::Device) -> Result<(), ShaderError> {
        for (name, source) in BUILTIN_SHADERS {
            let overridden = self
                .shader_dir
                .as_ref()
                .map(|dir| dir.join(name))
                .filter(|path| path.exists());

            match overridden {
                Some(path) => {
                    info!("Using shader override {}", path.display());
                    self.load_from_file(device, name)?;
                }
                None => {
                    self.load_from_source(device, name, source)?;
                }
            }
        }
        Ok(())
    }

    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<CompiledShader>, ShaderError> {
        debug!("Compiling shader '{}'", name);

        let shader = Arc::new(CompiledShader::compile(device, name, source)?);
        if self.shaders.insert(name.to_string(), shader.clone()).is_some() {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded {:?} shader '{}'", shader.stage(), name);
        }

        Ok(shader)
    }

    pub fn load_from_file(
        &mut self,
        device: &wgpu::Device,
        filename: &str,
    ) -> Result<Arc<CompiledShader>, ShaderError> {
        let path = match &self.shader_dir {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        };

        if !path.exists() {
            return Err(ShaderError::FileNotFound { path });
        }

        let source = std::fs::read_to_string(&path)?;
        self.load_from_source(device, filename, &source)
    }

    pub fn get(&self, name: &str) -> Result<Arc<CompiledShader>, ShaderError> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}
