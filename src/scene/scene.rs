//! Scene container - the root of the scene graph.

use super::Node;
use crate::core::Id;
use crate::light::Light;
use crate::math::{Color, Mat4};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Background type for the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Background {
    /// Solid color background.
    Color(Color),
    /// No background (cleared to transparent black).
    #[default]
    None,
}

/// Fog type for the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fog {
    /// No fog.
    #[default]
    None,
    /// Linear fog with near and far distances.
    Linear {
        /// Fog color.
        color: Color,
        /// Distance where fog starts.
        near: f32,
        /// Distance where fog is fully opaque.
        far: f32,
    },
    /// Exponential squared fog.
    Exponential {
        /// Fog color.
        color: Color,
        /// Fog density.
        density: f32,
    },
}

impl Fog {
    /// Fog factor at a view distance, 0 (clear) to 1 (fully fogged).
    pub fn factor(&self, distance: f32) -> f32 {
        match *self {
            Fog::None => 0.0,
            Fog::Linear { near, far, .. } => {
                if far <= near {
                    return if distance >= far { 1.0 } else { 0.0 };
                }
                ((distance - near) / (far - near)).clamp(0.0, 1.0)
            }
            Fog::Exponential { density, .. } => {
                let d = density * distance;
                (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
            }
        }
    }
}

/// The scene - root container for all objects.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    id: Id,
    name: String,
    background: Background,
    fog: Fog,
    children: Vec<Node>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            id: Id::new(),
            name: "Scene".to_string(),
            ..Default::default()
        }
    }

    /// Get the scene ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the scene name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the background.
    #[inline]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Set the background.
    #[inline]
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Set a solid color background.
    pub fn set_background_color(&mut self, color: impl Into<Color>) {
        self.background = Background::Color(color.into());
    }

    /// Get the fog.
    #[inline]
    pub fn fog(&self) -> &Fog {
        &self.fog
    }

    /// Set the fog.
    #[inline]
    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = fog;
    }

    /// Add a top-level node, returning its ID.
    pub fn add(&mut self, node: Node) -> Id {
        let id = node.id();
        log::debug!("scene: added {} '{}'", id, node.name());
        self.children.push(node);
        id
    }

    /// Detach a node anywhere in the graph.
    pub fn remove(&mut self, id: Id) -> Option<Node> {
        if let Some(index) = self.children.iter().position(|c| c.id() == id) {
            return Some(self.children.remove(index));
        }
        self.children.iter_mut().find_map(|c| remove_from(c, id))
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Top-level nodes.
    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Number of top-level nodes.
    #[inline]
    pub fn children_count(&self) -> usize {
        self.children.len()
    }

    /// Total number of nodes in the graph.
    pub fn count_objects(&self) -> usize {
        self.children.iter().map(Node::count).sum()
    }

    /// Visit every node, depth first.
    pub fn traverse<F: FnMut(&Node)>(&self, mut f: F) {
        for child in &self.children {
            child.traverse(&mut f);
        }
    }

    /// Visit every node mutably, depth first.
    pub fn traverse_mut<F: FnMut(&mut Node)>(&mut self, mut f: F) {
        for child in &mut self.children {
            child.traverse_mut(&mut f);
        }
    }

    /// Visit visible nodes only. A hidden node hides its subtree.
    pub fn traverse_visible<F: FnMut(&Node)>(&self, mut f: F) {
        self.visit_world(|node, _| f(node));
    }

    /// Visit visible nodes with their world matrices.
    pub fn visit_world<F: FnMut(&Node, &Mat4)>(&self, mut f: F) {
        for child in &self.children {
            child.visit_world(&Mat4::IDENTITY, &mut f);
        }
    }

    /// World matrix of every visible node.
    pub fn world_matrices(&self) -> HashMap<Id, Mat4> {
        let mut out = HashMap::new();
        self.visit_world(|node, world| {
            out.insert(node.id(), *world);
        });
        out
    }

    /// Find the first node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.children.iter().find_map(|c| c.find_by_name(name))
    }

    /// Find a node by ID.
    pub fn find_by_id(&self, id: Id) -> Option<&Node> {
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// Find a node by ID, mutably.
    pub fn find_by_id_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.children.iter_mut().find_map(|c| c.find_by_id_mut(id))
    }

    /// Whether a visible directional light casts shadows.
    pub fn has_shadow_caster(&self) -> bool {
        let mut found = false;
        self.traverse_visible(|node| {
            if node.cast_shadow && matches!(node.as_light(), Some(Light::Directional(_))) {
                found = true;
            }
        });
        found
    }
}

fn remove_from(node: &mut Node, id: Id) -> Option<Node> {
    if let Some(found) = node.remove(id) {
        return Some(found);
    }
    node.children_mut().iter_mut().find_map(|c| remove_from(c, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::DirectionalLight;

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::new();
        let a = scene.add(Node::group("a"));
        let mut b = Node::group("b");
        let nested = b.add(Node::group("nested"));
        scene.add(b);
        assert_eq!(scene.children_count(), 2);
        assert_eq!(scene.count_objects(), 3);

        assert!(scene.remove(nested).is_some());
        assert!(scene.remove(a).is_some());
        assert_eq!(scene.count_objects(), 1);
    }

    #[test]
    fn test_shadow_caster_requires_flag_and_visibility() {
        let mut scene = Scene::new();
        let mut light = Node::light("sun", Light::Directional(DirectionalLight::new(0xffffff, 1.0)));
        assert!(!scene.has_shadow_caster());
        light.cast_shadow = true;
        let id = scene.add(light);
        assert!(scene.has_shadow_caster());
        scene.find_by_id_mut(id).unwrap().set_visible(false);
        assert!(!scene.has_shadow_caster());
    }

    #[test]
    fn test_linear_fog_factor() {
        let fog = Fog::Linear {
            color: Color::from_hex(0xa0a0a0),
            near: 200.0,
            far: 1000.0,
        };
        assert_eq!(fog.factor(100.0), 0.0);
        assert_eq!(fog.factor(600.0), 0.5);
        assert_eq!(fog.factor(5000.0), 1.0);
        assert_eq!(Fog::None.factor(5000.0), 0.0);
    }

    #[test]
    fn test_world_matrices_cover_visible_nodes() {
        let mut scene = Scene::new();
        let id = scene.add(Node::group("a").with_position(0.0, 5.0, 0.0));
        let worlds = scene.world_matrices();
        assert_eq!(worlds[&id].w_axis.y, 5.0);
    }
}
