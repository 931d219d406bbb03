//! Pose Math
//!
//! Pure helpers for composing and decomposing translation/rotation/scale
//! (TRS) transforms stored as 4×4 homogeneous matrices, plus the root-motion
//! re-basing product used by the recorder.
//!
//! # Lossy steps
//!
//! [`decompose_scale`] returns per-axis column magnitudes. Negative scale and
//! shear cannot be recovered from those, so a matrix built with a negative
//! or sheared scale does not round-trip. [`decompose_rotation`] normalizes
//! the basis columns before rebuilding the orientation; a zero-length column
//! (zero scale on any axis) has no defined orientation and the result for
//! such inputs is unspecified. Callers must not feed zero-scale matrices.

use glam::{Mat3, Mat4, Quat, Vec3};

/// Standard TRS composition: `T * R * S`.
#[inline]
#[must_use]
pub fn compose(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Returns the translation held in the fourth column.
#[inline]
#[must_use]
pub fn decompose_translation(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// Extracts the orientation of `m`.
///
/// The up (Y) and forward (Z) columns are normalized and the rotation is
/// rebuilt from them as a look-at basis, which discards scale and tolerates
/// slightly non-orthogonal input. The result is canonicalized to `w >= 0`.
#[must_use]
pub fn decompose_rotation(m: &Mat4) -> Quat {
    let up = m.y_axis.truncate().normalize();
    let forward = m.z_axis.truncate().normalize();
    look_rotation(forward, up)
}

/// Per-axis magnitude of the 3×3 basis columns. Sign and shear are lost.
#[inline]
#[must_use]
pub fn decompose_scale(m: &Mat4) -> Vec3 {
    Vec3::new(
        m.x_axis.truncate().length(),
        m.y_axis.truncate().length(),
        m.z_axis.truncate().length(),
    )
}

/// Decomposes `m` into `(translation, rotation, scale)`.
#[must_use]
pub fn decompose(m: &Mat4) -> (Vec3, Quat, Vec3) {
    (decompose_translation(m), decompose_rotation(m), decompose_scale(m))
}

/// Builds the rotation whose local Z axis points along `forward` and whose
/// local Y axis is as close to `up` as possible.
#[must_use]
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.normalize();
    let right = up.cross(forward).normalize();
    let up = forward.cross(right);

    let q = Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize();
    canonical(q)
}

/// Flips `q` into the `w >= 0` hemisphere.
#[inline]
#[must_use]
pub fn canonical(q: Quat) -> Quat {
    if q.w < 0.0 { -q } else { q }
}

/// Re-bases a child of the capture root onto the root's initial placement:
/// `inverse(root_initial) * root_current * node_local`.
#[inline]
#[must_use]
pub fn rebase_on_root(root_initial: &Mat4, root_current: &Mat4, node_local: &Mat4) -> Mat4 {
    root_initial.inverse() * *root_current * *node_local
}

// ============================================================================
// Handedness conversion
// ============================================================================

/// Mirrors a point or direction about the YZ plane: `(x, y, z) -> (-x, y, z)`.
#[inline]
#[must_use]
pub fn mirror_vec3(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

/// The rotation `M * R * M` for the X mirror `M`: `(x, y, z, w) -> (x, -y, -z, w)`.
#[inline]
#[must_use]
pub fn mirror_quat(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

/// Mirrors a full TRS matrix (`M * m * M`). Scale is unaffected.
#[must_use]
pub fn mirror_matrix(m: &Mat4) -> Mat4 {
    let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
    mirror * *m * mirror
}
