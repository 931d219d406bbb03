use slotmap::SlotMap;

use crate::scene::graph::SceneGraph;
use crate::scene::mesh::Mesh;
use crate::scene::node::Node;
use crate::scene::transform::Transform;
use crate::scene::{MeshKey, NodeHandle};

/// Arena-backed scene hierarchy.
///
/// Nodes live in a [`SlotMap`] so handles stay valid across removals of
/// other nodes; meshes are pooled separately and referenced from nodes.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
    pub meshes: SlotMap<MeshKey, Mesh<NodeHandle>>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unnamed top-level node.
    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new())
    }

    /// Creates a named top-level node.
    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.add_node(Node::with_name(name))
    }

    /// Adds a node to the scene as a top-level node.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Inserts `child` directly under `parent`.
    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::error!("Parent node not found, adding '{}' as a root node", child.name);
            return self.add_node(child);
        }

        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Creates a named node with the given local transform under `parent`.
    pub fn spawn(&mut self, name: &str, transform: Transform, parent: Option<NodeHandle>) -> NodeHandle {
        let mut node = Node::with_name(name);
        node.transform = transform;
        match parent {
            Some(parent) => self.add_to_parent(node, parent),
            None => self.add_node(node),
        }
    }

    /// Removes a node and, recursively, all of its children.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        let children = if let Some(node) = self.nodes.get(handle) {
            node.children.clone()
        } else {
            return;
        };

        for child in children {
            self.remove_node(child);
        }

        let parent = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(parent)
                && let Some(pos) = p.children.iter().position(|&x| x == handle)
            {
                p.children.remove(pos);
            }
        } else if let Some(pos) = self.root_nodes.iter().position(|&x| x == handle) {
            self.root_nodes.remove(pos);
        }

        if let Some(node) = self.nodes.remove(handle)
            && let Some(mesh) = node.mesh
        {
            self.meshes.remove(mesh);
        }
    }

    /// Re-parents `child` under `parent`, keeping both sides in sync.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(parent) {
            log::error!("Parent node not found during attach!");
            return;
        }
        if !self.nodes.contains_key(child) {
            log::error!("Child node not found during attach!");
            return;
        }

        // 1. Detach from old
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }

        // 2. Attach to new
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle).map(|n| n.name.as_str())
    }

    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.name = name.to_string();
        }
    }

    /// First node (in root order, depth-first) with the given name.
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.root_nodes.iter().find_map(|&root| {
            if self.get_name(root) == Some(name) {
                return Some(root);
            }
            self.descendants(root)
                .into_iter()
                .find(|&h| self.get_name(h) == Some(name))
        })
    }

    // ========================================================================
    // Mesh components
    // ========================================================================

    /// Attaches a mesh to a node, replacing any previous one.
    pub fn set_mesh(&mut self, handle: NodeHandle, mesh: Mesh<NodeHandle>) -> Option<MeshKey> {
        if !self.nodes.contains_key(handle) {
            log::warn!("set_mesh: node not found");
            return None;
        }

        let key = self.meshes.insert(mesh);
        if let Some(node) = self.nodes.get_mut(handle)
            && let Some(old) = node.mesh.replace(key)
        {
            self.meshes.remove(old);
        }
        Some(key)
    }

    #[must_use]
    pub fn get_mesh(&self, handle: NodeHandle) -> Option<&Mesh<NodeHandle>> {
        let key = self.nodes.get(handle)?.mesh?;
        self.meshes.get(key)
    }

    pub fn get_mesh_mut(&mut self, handle: NodeHandle) -> Option<&mut Mesh<NodeHandle>> {
        let key = self.nodes.get(handle)?.mesh?;
        self.meshes.get_mut(key)
    }
}

impl SceneGraph for Scene {
    type Handle = NodeHandle;

    fn name(&self, node: NodeHandle) -> Option<&str> {
        self.get_name(node)
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(node).and_then(Node::parent)
    }

    fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(node).map_or(&[][..], Node::children)
    }

    fn local_transform(&self, node: NodeHandle) -> Option<Transform> {
        self.nodes.get(node).map(|n| n.transform)
    }

    fn set_local_transform(&mut self, node: NodeHandle, transform: Transform) -> bool {
        match self.nodes.get_mut(node) {
            Some(n) => {
                n.transform = transform;
                true
            }
            None => false,
        }
    }

    fn mesh(&self, node: NodeHandle) -> Option<&Mesh<NodeHandle>> {
        self.get_mesh(node)
    }
}
