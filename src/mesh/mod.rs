mod sphere;
mod triangle_list;
mod vertex;

pub use sphere::{create_sphere, GeneratorVertex, MeshData};
pub use triangle_list::IndexedTriangleList;
pub use vertex::SkyVertex;
