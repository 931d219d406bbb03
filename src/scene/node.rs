use crate::scene::transform::Transform;
use crate::scene::{MeshKey, NodeHandle};

/// A scene node: a name, its place in the hierarchy and a local transform.
///
/// # Hierarchy
///
/// Nodes form a tree structure through parent-child relationships:
/// - `parent`: Optional handle to parent node (None for root nodes)
/// - `children`: List of child node handles, in insertion order
///
/// Mesh data lives in the owning [`Scene`](crate::scene::Scene)'s mesh pool
/// and is referenced through `mesh`.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,

    pub(crate) mesh: Option<MeshKey>,
}

impl Node {
    /// Creates an unnamed node with an identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("")
    }

    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            mesh: None,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<MeshKey> {
        self.mesh
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
