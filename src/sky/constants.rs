use glam::{Mat4, Vec4};
use log::warn;

use crate::scene::Camera;

/// Per-object matrices, shared by the vertex and pixel stages.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub world_inv_transpose: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn identity() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            world: identity,
            view: identity,
            projection: identity,
            world_inv_transpose: identity,
        }
    }

    /// Column-major, uploaded as is.
    pub fn from_scene(world: Mat4, camera: &Camera) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
            world_inv_transpose: inverse_transpose(world).to_cols_array_2d(),
        }
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self::identity()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameConstants {
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
}

impl Default for FrameConstants {
    fn default() -> Self {
        Self {
            light_direction: [-1.0, -1.0, -1.0, 0.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            ambient: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

/// Inverse-transpose of `world` with its translation removed, for
/// transforming normals. A singular matrix yields identity.
pub fn inverse_transpose(world: Mat4) -> Mat4 {
    let mut linear = world;
    linear.w_axis = Vec4::W;

    let determinant = linear.determinant();
    if !determinant.is_normal() {
        warn!("World matrix is singular (det = {}), using identity for normals", determinant);
        return Mat4::IDENTITY;
    }

    linear.inverse().transpose()
}
