use anyhow::Result;
use glam::Mat4;

use super::{SceneTree, Transform};

pub struct NodeProperties {
    pub name: String,
    pub transform: Transform,
}

impl NodeProperties {
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }

    pub fn to_parent(&self) -> Mat4 {
        self.transform.to_matrix()
    }
}

/// A renderable node driven once per frame by the render loop:
/// `on_update`, then `pre_render`, `render` and `post_render`.
pub trait SceneNode {
    fn properties(&self) -> &NodeProperties;

    fn on_update(&mut self, _scene: &mut SceneTree, _elapsed_ms: f32) -> Result<()> {
        Ok(())
    }

    /// Pushes this node's transform onto the scene matrix stack.
    fn pre_render(&mut self, scene: &mut SceneTree, _queue: &wgpu::Queue) -> Result<()> {
        scene.push_and_set_matrix(self.properties().to_parent());
        Ok(())
    }

    fn render<'a>(&'a self, _render_pass: &mut wgpu::RenderPass<'a>) {}

    /// Pops the matrix pushed by `pre_render`.
    fn post_render(&mut self, scene: &mut SceneTree) -> Result<()> {
        scene.pop_matrix();
        Ok(())
    }
}
