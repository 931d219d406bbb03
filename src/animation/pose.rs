use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::math;
use crate::scene::Transform;

/// One sampled transform of one node.
///
/// Rotation is stored as produced; nothing here re-normalizes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Decomposes a TRS matrix with the crate's pose math.
    #[must_use]
    pub fn from_matrix(m: &Mat4) -> Self {
        let (translation, rotation, scale) = math::decompose(m);
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        math::compose(self.translation, self.rotation, self.scale)
    }

    /// Linear blend of translation and scale, spherical blend of rotation.
    #[must_use]
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Transform> for Pose {
    fn from(t: Transform) -> Self {
        Self {
            translation: t.position,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

impl From<Pose> for Transform {
    fn from(p: Pose) -> Self {
        Transform::from_trs(p.translation, p.rotation, p.scale)
    }
}
