//! Scene graph module
//!
//! The host-side hierarchy the capture core reads from and writes to:
//! - [`SceneGraph`]: the capability contract recorder, player and exporter use
//! - [`Node`]: a named node with parent/child links and a local transform
//! - [`Transform`]: local position, rotation and scale
//! - [`Scene`]: slotmap-backed implementation of [`SceneGraph`]
//! - [`Mesh`] / [`SkinBinding`]: geometry and skinning data read by the exporter

pub mod graph;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use graph::SceneGraph;
pub use mesh::{Material, Mesh, Texture};
pub use node::Node;
pub use scene::Scene;
pub use skeleton::{BoneInfluence, MAX_INFLUENCES, SkinBinding, UNUSED_JOINT};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
}
