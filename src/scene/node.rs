//! Scene graph nodes.

use super::Transform;
use crate::core::Id;
use crate::helpers::GridHelper;
use crate::light::Light;
use crate::math::{Mat4, Vec3};
use crate::objects::Mesh;

/// What a node carries besides its transform.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Grouping node (also used for skeleton joints).
    Group,
    /// Drawable triangle mesh.
    Mesh(Mesh),
    /// Light source.
    Light(Light),
    /// Line grid helper.
    Grid(GridHelper),
}

/// A node in the scene graph. Owns its children.
#[derive(Debug, Clone)]
pub struct Node {
    id: Id,
    name: String,
    kind: NodeKind,
    transform: Transform,
    visible: bool,
    /// Whether this node is drawn into shadow maps.
    pub cast_shadow: bool,
    /// Whether this node is darkened by shadow maps.
    pub receive_shadow: bool,
    children: Vec<Node>,
}

impl Node {
    /// Create a node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: Id::new(),
            name: String::new(),
            kind,
            transform: Transform::new(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            children: Vec::new(),
        }
    }

    /// Create an empty group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Group).with_name(name)
    }

    /// Create a mesh node.
    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(NodeKind::Mesh(mesh)).with_name(name)
    }

    /// Create a light node.
    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(NodeKind::Light(light)).with_name(name)
    }

    /// Create a grid helper node.
    pub fn grid(name: impl Into<String>, grid: GridHelper) -> Self {
        Self::new(NodeKind::Grid(grid)).with_name(name)
    }

    /// Builder-style name setter.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style position setter.
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.set_position(x, y, z);
        self
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the node name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the node name.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get the node kind.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Get the node kind mutably.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// The mesh this node carries, if any.
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// The mesh this node carries, mutably.
    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// The light this node carries, if any.
    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Whether this node carries a mesh.
    #[inline]
    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    /// Get the local transform.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Get the local transform mutably.
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Local position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Set local position.
    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.transform.set_position(x, y, z);
    }

    /// Local transformation matrix.
    #[inline]
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// Whether the node (and therefore its subtree) is drawn.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the node and its subtree.
    #[inline]
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Direct children.
    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct children, mutably.
    #[inline]
    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    /// Number of direct children.
    #[inline]
    pub fn children_count(&self) -> usize {
        self.children.len()
    }

    /// Append a child, returning its ID.
    pub fn add(&mut self, child: Node) -> Id {
        let id = child.id;
        self.children.push(child);
        id
    }

    /// Detach a direct child by ID.
    pub fn remove(&mut self, id: Id) -> Option<Node> {
        let index = self.children.iter().position(|c| c.id == id)?;
        Some(self.children.remove(index))
    }

    /// Visit this node and all descendants, depth first.
    pub fn traverse<F: FnMut(&Node)>(&self, mut f: F) {
        self.traverse_with(&mut f);
    }

    fn traverse_with<F: FnMut(&Node)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.traverse_with(f);
        }
    }

    /// Visit this node and all descendants mutably, depth first.
    pub fn traverse_mut<F: FnMut(&mut Node)>(&mut self, mut f: F) {
        self.traverse_mut_with(&mut f);
    }

    fn traverse_mut_with<F: FnMut(&mut Node)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut_with(f);
        }
    }

    /// Visit visible nodes with their world matrices. Hidden subtrees are skipped.
    pub fn visit_world<F: FnMut(&Node, &Mat4)>(&self, parent: &Mat4, f: &mut F) {
        if !self.visible {
            return;
        }
        let world = *parent * self.local_matrix();
        f(self, &world);
        for child in &self.children {
            child.visit_world(&world, f);
        }
    }

    /// Find the first node in this subtree with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_name(name))
    }

    /// Find a node in this subtree by ID.
    pub fn find_by_id(&self, id: Id) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// Find a node in this subtree by ID, mutably.
    pub fn find_by_id_mut(&mut self, id: Id) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_by_id_mut(id))
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Node {
        let mut root = Node::group("root");
        let mut arm = Node::group("arm").with_position(1.0, 0.0, 0.0);
        arm.add(Node::group("hand").with_position(0.0, 2.0, 0.0));
        root.add(arm);
        root.add(Node::group("leg"));
        root
    }

    #[test]
    fn test_traverse_visits_all() {
        let root = tree();
        let mut names = Vec::new();
        root.traverse(|n| names.push(n.name().to_string()));
        assert_eq!(names, ["root", "arm", "hand", "leg"]);
        assert_eq!(root.count(), 4);
    }

    #[test]
    fn test_find_and_remove() {
        let mut root = tree();
        let leg = root.find_by_name("leg").map(Node::id).unwrap();
        assert!(root.find_by_id(leg).is_some());
        assert!(root.remove(leg).is_some());
        assert!(root.find_by_name("leg").is_none());
        assert!(root.remove(leg).is_none());
    }

    #[test]
    fn test_visit_world_composes_and_skips_hidden() {
        let mut root = tree();
        let mut worlds = Vec::new();
        root.visit_world(&Mat4::IDENTITY, &mut |n, m| {
            worlds.push((n.name().to_string(), m.w_axis.truncate()))
        });
        let hand = worlds.iter().find(|(n, _)| n == "hand").unwrap();
        assert_eq!(hand.1, Vec3::new(1.0, 2.0, 0.0));

        let arm = root.find_by_name("arm").map(Node::id).unwrap();
        root.find_by_id_mut(arm).unwrap().set_visible(false);
        let mut seen = 0;
        root.visit_world(&Mat4::IDENTITY, &mut |_, _| seen += 1);
        assert_eq!(seen, 2);
    }
}
