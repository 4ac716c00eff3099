pub mod camera;
pub mod node;
pub mod transform;

pub use camera::Camera;
pub use node::{NodeProperties, SceneNode};
pub use transform::Transform;

use glam::Mat4;
use std::time::Instant;

/// Traversal context handed to scene nodes: the active camera and a stack of
/// accumulated world matrices.
pub struct SceneTree {
    pub camera: Camera,
    matrix_stack: Vec<Mat4>,
    last_update: Instant,
}

impl SceneTree {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            matrix_stack: vec![Mat4::IDENTITY],
            last_update: Instant::now(),
        }
    }

    /// Returns the milliseconds elapsed since the previous call.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        self.last_update = now;
        elapsed.as_secs_f32() * 1000.0
    }

    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.camera.rotate(dx, dy);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.aspect = width as f32 / height as f32;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Pushes `top * to_parent`, making it the new world matrix.
    pub fn push_and_set_matrix(&mut self, to_parent: Mat4) {
        let world = self.top_matrix() * to_parent;
        self.matrix_stack.push(world);
    }

    /// Pops the top matrix. The root identity is never popped.
    pub fn pop_matrix(&mut self) -> Option<Mat4> {
        if self.matrix_stack.len() > 1 {
            self.matrix_stack.pop()
        } else {
            log::warn!("Attempted to pop the root scene matrix");
            None
        }
    }

    pub fn top_matrix(&self) -> Mat4 {
        self.matrix_stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn depth(&self) -> usize {
        self.matrix_stack.len() - 1
    }
}
