use super::{sphere::MeshData, SkyVertex};

/// Vertices and indices ready for upload. Dropped once the GPU buffers exist.
#[derive(Clone, Debug, Default)]
pub struct IndexedTriangleList {
    pub vertices: Vec<SkyVertex>,
    pub indices: Vec<u32>,
}

impl IndexedTriangleList {
    /// Repacks generator output into the engine vertex format.
    pub fn from_mesh_data(mesh: &MeshData) -> Self {
        let mut list = Self {
            vertices: Vec::with_capacity(mesh.vertices.len()),
            indices: Vec::with_capacity(mesh.indices.len()),
        };
        list.vertices.extend(mesh.vertices.iter().map(SkyVertex::from));
        list.indices.extend_from_slice(&mesh.indices);
        list
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}
