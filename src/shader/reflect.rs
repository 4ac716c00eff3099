use naga::{Binding, Scalar, ScalarKind, TypeInner, VectorSize};

use super::{CompiledShader, ShaderError};

/// One `@location` input of a vertex entry point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexInput {
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

impl CompiledShader {
    /// Location inputs of the entry point, sorted by location. Built-ins are skipped.
    pub fn vertex_inputs(&self) -> Result<Vec<VertexInput>, ShaderError> {
        let entry = &self.ir.entry_points[0];
        let mut inputs = Vec::new();

        for argument in &entry.function.arguments {
            match argument.binding {
                Some(Binding::Location { location, .. }) => {
                    inputs.push(self.reflect_input(location, argument.ty)?);
                }
                Some(Binding::BuiltIn(_)) => {}
                None => {
                    if let TypeInner::Struct { ref members, .. } = self.ir.types[argument.ty].inner {
                        for member in members {
                            if let Some(Binding::Location { location, .. }) = member.binding {
                                inputs.push(self.reflect_input(location, member.ty)?);
                            }
                        }
                    }
                }
            }
        }

        inputs.sort_by_key(|input| input.location);
        Ok(inputs)
    }

    fn reflect_input(
        &self,
        location: u32,
        ty: naga::Handle<naga::Type>,
    ) -> Result<VertexInput, ShaderError> {
        let inner = &self.ir.types[ty].inner;
        let format = vertex_format(inner).ok_or_else(|| ShaderError::UnsupportedInput {
            name: self.name.clone(),
            location,
            ty: format!("{:?}", inner),
        })?;
        Ok(VertexInput { location, format })
    }
}

fn vertex_format(inner: &TypeInner) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;

    let (kind, components) = match *inner {
        TypeInner::Scalar(Scalar { kind, width: 4 }) => (kind, 1),
        TypeInner::Vector {
            size,
            scalar: Scalar { kind, width: 4 },
        } => {
            let components = match size {
                VectorSize::Bi => 2,
                VectorSize::Tri => 3,
                VectorSize::Quad => 4,
            };
            (kind, components)
        }
        _ => return None,
    };

    let format = match (kind, components) {
        (ScalarKind::Float, 1) => F::Float32,
        (ScalarKind::Float, 2) => F::Float32x2,
        (ScalarKind::Float, 3) => F::Float32x3,
        (ScalarKind::Float, 4) => F::Float32x4,
        (ScalarKind::Uint, 1) => F::Uint32,
        (ScalarKind::Uint, 2) => F::Uint32x2,
        (ScalarKind::Uint, 3) => F::Uint32x3,
        (ScalarKind::Uint, 4) => F::Uint32x4,
        (ScalarKind::Sint, 1) => F::Sint32,
        (ScalarKind::Sint, 2) => F::Sint32x2,
        (ScalarKind::Sint, 3) => F::Sint32x3,
        (ScalarKind::Sint, 4) => F::Sint32x4,
        _ => return None,
    };
    Some(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_format_mapping() {
        let float4 = TypeInner::Vector {
            size: VectorSize::Quad,
            scalar: Scalar::F32,
        };
        assert_eq!(vertex_format(&float4), Some(wgpu::VertexFormat::Float32x4));

        let uint = TypeInner::Scalar(Scalar::U32);
        assert_eq!(vertex_format(&uint), Some(wgpu::VertexFormat::Uint32));

        let double2 = TypeInner::Vector {
            size: VectorSize::Bi,
            scalar: Scalar::F64,
        };
        assert_eq!(vertex_format(&double2), None);

        let bool1 = TypeInner::Scalar(Scalar::BOOL);
        assert_eq!(vertex_format(&bool1), None);
    }
}
