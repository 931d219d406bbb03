use glam::{Mat4, Quat, Vec3};

use crate::math;

/// Local translation / rotation / scale of a scene node.
///
/// This is plain data: matrices are produced on demand with
/// [`Transform::local_matrix`] and hierarchy composition lives in
/// [`SceneGraph::world_matrix`](crate::scene::SceneGraph::world_matrix).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new() -> Self {
        Self::IDENTITY
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Composes the TRS into a local matrix.
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        math::compose(self.position, self.rotation, self.scale)
    }

    /// Replaces position/rotation/scale with the decomposition of `mat`.
    ///
    /// Shear and negative scale are lost in the decomposition.
    pub fn apply_local_matrix(&mut self, mat: &Mat4) {
        let (translation, rotation, scale) = math::decompose(mat);
        self.position = translation;
        self.rotation = rotation;
        self.scale = scale;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
