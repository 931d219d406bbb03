//! The node-hierarchy contract.
//!
//! Recorder, player and exporter only ever see a host scene through
//! [`SceneGraph`]. A host implements the five required methods; everything
//! else (descendant walks, world matrices, node paths) is derived.

use std::fmt::Debug;
use std::hash::Hash;

use glam::Mat4;

use crate::math;
use crate::scene::mesh::Mesh;
use crate::scene::transform::Transform;

/// Capability set a host scene must expose.
pub trait SceneGraph {
    /// Stable identity of a node.
    type Handle: Copy + Eq + Hash + Debug;

    /// Node name, or `None` if the handle is stale.
    fn name(&self, node: Self::Handle) -> Option<&str>;

    fn parent(&self, node: Self::Handle) -> Option<Self::Handle>;

    /// Direct children in a stable order. Stale handles yield an empty slice.
    fn children(&self, node: Self::Handle) -> &[Self::Handle];

    fn local_transform(&self, node: Self::Handle) -> Option<Transform>;

    /// Writes a node's local transform. Returns `false` for stale handles.
    fn set_local_transform(&mut self, node: Self::Handle, transform: Transform) -> bool;

    /// Mesh attached to the node. Only the exporter reads this.
    fn mesh(&self, _node: Self::Handle) -> Option<&Mesh<Self::Handle>> {
        None
    }

    // ========================================================================
    // Provided
    // ========================================================================

    #[inline]
    fn contains(&self, node: Self::Handle) -> bool {
        self.name(node).is_some()
    }

    /// All descendants of `node` in depth-first pre-order, excluding `node`.
    fn descendants(&self, node: Self::Handle) -> Vec<Self::Handle> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Handle> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    #[inline]
    fn local_matrix(&self, node: Self::Handle) -> Option<Mat4> {
        self.local_transform(node).map(|t| t.local_matrix())
    }

    /// Composes local matrices from the top of the hierarchy down to `node`.
    fn world_matrix(&self, node: Self::Handle) -> Option<Mat4> {
        let mut world = self.local_matrix(node)?;
        let mut current = self.parent(node);
        while let Some(parent) = current {
            let Some(parent_local) = self.local_matrix(parent) else {
                break;
            };
            world = parent_local * world;
            current = self.parent(parent);
        }
        Some(world)
    }

    /// World-space TRS (decomposed, so shear is lost).
    fn world_transform(&self, node: Self::Handle) -> Option<Transform> {
        let world = self.world_matrix(node)?;
        let mut transform = Transform::new();
        transform.apply_local_matrix(&world);
        Some(transform)
    }

    /// Writes a world-space TRS by re-expressing it in the parent's space.
    fn set_world_transform(&mut self, node: Self::Handle, world: Transform) -> bool {
        let parent_world = self
            .parent(node)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY);

        let local_matrix = parent_world.inverse() * world.local_matrix();
        let (position, rotation, scale) = math::decompose(&local_matrix);
        self.set_local_transform(node, Transform::from_trs(position, rotation, scale))
    }

    /// `"/"`-joined names from just below `root` down to `node`.
    ///
    /// `root` itself maps to the empty string. Returns `None` when `node` is
    /// not `root` or one of its descendants.
    fn path_from(&self, root: Self::Handle, node: Self::Handle) -> Option<String> {
        if node == root {
            return Some(String::new());
        }

        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == root {
                segments.reverse();
                return Some(segments.join("/"));
            }
            segments.push(self.name(handle)?);
            current = self.parent(handle);
        }
        None
    }

    /// Resolves a path produced by [`SceneGraph::path_from`].
    fn find_by_path(&self, root: Self::Handle, path: &str) -> Option<Self::Handle> {
        if path.is_empty() {
            return self.contains(root).then_some(root);
        }

        let mut current = root;
        for segment in path.split('/') {
            current = self
                .children(current)
                .iter()
                .copied()
                .find(|&child| self.name(child) == Some(segment))?;
        }
        Some(current)
    }
}
