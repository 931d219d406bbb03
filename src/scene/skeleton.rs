use glam::Mat4;

/// Sentinel joint index for an unused influence slot.
pub const UNUSED_JOINT: i32 = -1;

/// Maximum number of bone influences per vertex.
pub const MAX_INFLUENCES: usize = 4;

/// Up to four (bone, weight) pairs for one vertex.
///
/// `joints` index into [`SkinBinding::bones`]; unused slots hold
/// [`UNUSED_JOINT`] with a zero weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfluence {
    pub joints: [i32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl BoneInfluence {
    pub const NONE: Self = Self {
        joints: [UNUSED_JOINT; MAX_INFLUENCES],
        weights: [0.0; MAX_INFLUENCES],
    };

    /// Builds an influence from up to four pairs; extra pairs are ignored.
    #[must_use]
    pub fn from_pairs(pairs: &[(i32, f32)]) -> Self {
        let mut influence = Self::NONE;
        for (slot, &(joint, weight)) in pairs.iter().take(MAX_INFLUENCES).enumerate() {
            influence.joints[slot] = joint;
            influence.weights[slot] = weight;
        }
        influence
    }
}

impl Default for BoneInfluence {
    fn default() -> Self {
        Self::NONE
    }
}

/// Skinning data stored alongside a mesh.
///
/// `bind_matrices[i]` is the mesh-to-bone matrix recorded when the mesh was
/// bound to `bones[i]`, i.e. the inverse of the bone's bind pose expressed in
/// mesh space.
#[derive(Debug, Clone)]
pub struct SkinBinding<H> {
    pub bones: Vec<H>,
    pub bind_matrices: Vec<Mat4>,
    /// One entry per mesh vertex.
    pub influences: Vec<BoneInfluence>,
}

impl<H> SkinBinding<H> {
    #[must_use]
    pub fn new(bones: Vec<H>, bind_matrices: Vec<Mat4>, influences: Vec<BoneInfluence>) -> Self {
        Self {
            bones,
            bind_matrices,
            influences,
        }
    }
}
