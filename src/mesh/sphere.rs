//! Parametric UV sphere generation.
//!
//! Vertices are laid out pole to pole: the north pole first, then
//! `stack_count - 1` rings of `slice_count + 1` vertices each (the first and
//! last vertex of a ring share a position so the texture seam wraps cleanly),
//! then the south pole.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeneratorVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent_u: Vec3,
    pub tex_coords: Vec2,
}

impl GeneratorVertex {
    fn new(position: Vec3, normal: Vec3, tangent_u: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tangent_u,
            tex_coords,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<GeneratorVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Builds a sphere centered at the origin.
///
/// Triangles wind clockwise when seen from outside the sphere, so from the
/// inside they face away from a clockwise front face.
/// `slice_count` must be at least 3 and `stack_count` at least 2; smaller
/// values are clamped.
pub fn create_sphere(radius: f32, slice_count: u32, stack_count: u32) -> MeshData {
    let slice_count = slice_count.max(3);
    let stack_count = stack_count.max(2);

    let ring_vertex_count = slice_count + 1;
    let vertex_count = 2 + (stack_count - 1) * ring_vertex_count;
    let index_count = 6 * slice_count * (stack_count - 1);

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(vertex_count as usize),
        indices: Vec::with_capacity(index_count as usize),
    };

    mesh.vertices.push(GeneratorVertex::new(
        Vec3::new(0.0, radius, 0.0),
        Vec3::Y,
        Vec3::X,
        Vec2::new(0.0, 0.0),
    ));

    let phi_step = PI / stack_count as f32;
    let theta_step = 2.0 * PI / slice_count as f32;

    for i in 1..stack_count {
        let phi = i as f32 * phi_step;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for j in 0..=slice_count {
            let theta = j as f32 * theta_step;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let position = Vec3::new(
                radius * sin_phi * cos_theta,
                radius * cos_phi,
                radius * sin_phi * sin_theta,
            );

            // dP/dtheta
            let tangent_u = Vec3::new(-radius * sin_phi * sin_theta, 0.0, radius * sin_phi * cos_theta)
                .normalize();

            mesh.vertices.push(GeneratorVertex::new(
                position,
                position.normalize(),
                tangent_u,
                Vec2::new(theta / (2.0 * PI), phi / PI),
            ));
        }
    }

    mesh.vertices.push(GeneratorVertex::new(
        Vec3::new(0.0, -radius, 0.0),
        Vec3::NEG_Y,
        Vec3::X,
        Vec2::new(0.0, 1.0),
    ));

    // North cap: fan around vertex 0 into the first ring.
    for i in 1..=slice_count {
        mesh.indices.extend_from_slice(&[0, i, i + 1]);
    }

    // Body: a quad between each pair of adjacent rings.
    let base_index = 1;
    for i in 0..stack_count - 2 {
        for j in 0..slice_count {
            let upper = base_index + i * ring_vertex_count + j;
            let lower = base_index + (i + 1) * ring_vertex_count + j;

            mesh.indices.extend_from_slice(&[upper, lower, upper + 1]);
            mesh.indices.extend_from_slice(&[lower, lower + 1, upper + 1]);
        }
    }

    // South cap: fan around the last vertex from the last ring.
    let south_pole = mesh.vertices.len() as u32 - 1;
    let base_index = south_pole - ring_vertex_count;
    for i in 0..slice_count {
        mesh.indices
            .extend_from_slice(&[south_pole, base_index + i + 1, base_index + i]);
    }

    mesh
}
