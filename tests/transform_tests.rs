//! Transform and pose math tests
//!
//! Tests for:
//! - TRS compose / decompose and its lossy scale step
//! - look-at rotation reconstruction
//! - Root-motion re-basing
//! - X-axis handedness mirroring
//! - Transform helpers (apply_local_matrix)

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{EulerRot, Mat4, Quat, Vec3};
use mocap::math;
use mocap::scene::Transform;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

/// Same rotation, either sign.
fn quat_approx(a: Quat, b: Quat) -> bool {
    approx_eq(a.dot(b).abs(), 1.0)
}

// ============================================================================
// Compose / Decompose
// ============================================================================

#[test]
fn compose_matches_trs_matrix() {
    let t = Vec3::new(1.0, 2.0, 3.0);
    let r = Quat::from_rotation_y(FRAC_PI_4);
    let s = Vec3::new(2.0, 3.0, 4.0);

    let m = math::compose(t, r, s);
    let expected = Mat4::from_translation(t) * Mat4::from_quat(r) * Mat4::from_scale(s);
    assert!(m.abs_diff_eq(expected, EPSILON));
}

#[test]
fn decompose_translation_is_fourth_column() {
    let m = math::compose(Vec3::new(-4.0, 5.5, 9.0), Quat::from_rotation_x(1.0), Vec3::splat(3.0));
    assert_eq!(math::decompose_translation(&m), Vec3::new(-4.0, 5.5, 9.0));
}

#[test]
fn decompose_round_trips_positive_scale() {
    let t = Vec3::new(0.5, -2.0, 7.0);
    let r = Quat::from_euler(EulerRot::XYZ, 0.3, -1.2, 2.0);
    let s = Vec3::new(1.5, 0.5, 2.5);

    let (t2, r2, s2) = math::decompose(&math::compose(t, r, s));
    assert!(vec3_approx(t2, t));
    assert!(quat_approx(r2, r), "expected {r:?}, got {r2:?}");
    assert!(vec3_approx(s2, s));
}

#[test]
fn decompose_rotation_ignores_scale() {
    let r = Quat::from_rotation_z(FRAC_PI_2);
    let m = math::compose(Vec3::ZERO, r, Vec3::new(10.0, 0.1, 3.0));
    assert!(quat_approx(math::decompose_rotation(&m), r));
}

#[test]
fn decompose_rotation_is_canonical() {
    // w < 0 on input
    let r = -Quat::from_rotation_y(0.5);
    let q = math::decompose_rotation(&math::compose(Vec3::ZERO, r, Vec3::ONE));
    assert!(q.w >= 0.0);
    assert!(quat_approx(q, r));
}

#[test]
fn decompose_scale_loses_sign() {
    let m = math::compose(Vec3::ZERO, Quat::IDENTITY, Vec3::new(-2.0, 1.0, 1.0));
    assert!(vec3_approx(math::decompose_scale(&m), Vec3::new(2.0, 1.0, 1.0)));
}

#[test]
fn look_rotation_identity_basis() {
    let q = math::look_rotation(Vec3::Z, Vec3::Y);
    assert!(quat_approx(q, Quat::IDENTITY));
}

#[test]
fn look_rotation_points_forward() {
    let q = math::look_rotation(Vec3::X, Vec3::Y);
    assert!(vec3_approx(q * Vec3::Z, Vec3::X));
    assert!(vec3_approx(q * Vec3::Y, Vec3::Y));
}

// ============================================================================
// Root-motion re-basing
// ============================================================================

#[test]
fn rebase_collapses_when_root_unchanged() {
    let root = math::compose(Vec3::new(3.0, 0.0, -1.0), Quat::from_rotation_y(0.7), Vec3::ONE);
    let local = math::compose(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_x(0.2), Vec3::ONE);

    let rebased = math::rebase_on_root(&root, &root, &local);
    assert!(rebased.abs_diff_eq(local, EPSILON));
}

#[test]
fn rebase_applies_root_displacement() {
    let initial = Mat4::IDENTITY;
    let current = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
    let local = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));

    let rebased = math::rebase_on_root(&initial, &current, &local);
    assert!(vec3_approx(math::decompose_translation(&rebased), Vec3::new(6.0, 0.0, 0.0)));
}

// ============================================================================
// Mirroring
// ============================================================================

#[test]
fn mirror_vec3_negates_x() {
    assert_eq!(math::mirror_vec3(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(-1.0, 2.0, 3.0));
}

#[test]
fn mirror_quat_commutes_with_mirrored_vectors() {
    let q = Quat::from_euler(EulerRot::XYZ, 0.4, 1.1, -0.6);
    let v = Vec3::new(0.3, -2.0, 1.5);

    let lhs = math::mirror_quat(q) * math::mirror_vec3(v);
    let rhs = math::mirror_vec3(q * v);
    assert!(vec3_approx(lhs, rhs), "{lhs:?} != {rhs:?}");
}

#[test]
fn mirror_matrix_matches_component_mirror() {
    let t = Vec3::new(1.0, 2.0, 3.0);
    let r = Quat::from_rotation_y(0.9);
    let s = Vec3::new(2.0, 1.0, 1.0);

    let mirrored = math::mirror_matrix(&math::compose(t, r, s));
    let expected = math::compose(math::mirror_vec3(t), math::mirror_quat(r), s);
    assert!(mirrored.abs_diff_eq(expected, EPSILON));
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_apply_local_matrix() {
    let mut t = Transform::new();
    let r = Quat::from_rotation_x(FRAC_PI_4);
    t.apply_local_matrix(&math::compose(Vec3::new(1.0, 2.0, 3.0), r, Vec3::splat(2.0)));

    assert!(vec3_approx(t.position, Vec3::new(1.0, 2.0, 3.0)));
    assert!(quat_approx(t.rotation, r));
    assert!(vec3_approx(t.scale, Vec3::splat(2.0)));
}
