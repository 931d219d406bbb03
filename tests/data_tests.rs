//! AnimationData Tests
//!
//! Tests for:
//! - Structural invariants (equal lengths, monotonic time, unique paths)
//! - Deep copy independence
//! - Edit operations: delete, interpolate, apply-to-range

use glam::{Quat, Vec3};

use mocap::MotionError;
use mocap::animation::{AnimationData, NodeTrack, Pose};

fn pose_x(x: f32) -> Pose {
    Pose::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE)
}

/// Two tracks, `frames` frames, translation.x == frame index on both.
fn sample(frames: usize) -> AnimationData {
    let mut data = AnimationData::with_track_paths("Sample", ["Hips", "Hips/Spine"]).unwrap();
    for i in 0..frames {
        let x = i as f32;
        data.push_frame(x * 0.1, vec![pose_x(x), pose_x(x)]).unwrap();
    }
    data
}

fn assert_lengths_consistent(data: &AnimationData) {
    for track in data.tracks() {
        assert_eq!(track.poses.len(), data.frame_count(), "track '{}'", track.node_path);
    }
}

// ============================================================================
// Construction & Invariants
// ============================================================================

#[test]
fn data_queries() {
    let data = sample(4);
    assert_eq!(data.frame_count(), 4);
    assert_eq!(data.track_count(), 2);
    assert!((data.duration() - 0.3).abs() < 1e-6);
    assert_eq!(data.pose_at("Hips/Spine", 2), Some(&pose_x(2.0)));
    assert_eq!(data.pose_at("Tail", 0), None);
    assert_eq!(data.frame_at_time(0.15), Some(1));
    assert_eq!(data.frame_at_time(-1.0), None);
}

#[test]
fn push_frame_rejects_time_going_backwards() {
    let mut data = sample(2);
    let err = data.push_frame(0.05, vec![pose_x(0.0), pose_x(0.0)]).unwrap_err();
    assert!(matches!(err, MotionError::NonMonotonicTime { .. }));
    assert_eq!(data.frame_count(), 2);
}

#[test]
fn push_frame_rejects_non_finite_time() {
    let mut data = sample(2);
    for time in [f32::NAN, f32::INFINITY] {
        let err = data.push_frame(time, vec![pose_x(0.0), pose_x(0.0)]).unwrap_err();
        assert!(matches!(err, MotionError::NonFiniteTime(_)));
    }
    assert_eq!(data.frame_count(), 2);
    assert_lengths_consistent(&data);
}

#[test]
fn push_frame_rejects_wrong_pose_count() {
    let mut data = sample(2);
    assert!(data.push_frame(1.0, vec![pose_x(0.0)]).is_err());
    assert_lengths_consistent(&data);
}

#[test]
fn add_track_rejects_duplicates() {
    let mut data = AnimationData::new("Empty");
    data.add_track(NodeTrack::new("Hips")).unwrap();
    let err = data.add_track(NodeTrack::new("Hips")).unwrap_err();
    assert!(matches!(err, MotionError::DuplicateTrack(path) if path == "Hips"));
}

#[test]
fn from_parts_validates() {
    let err = AnimationData::from_parts(
        "Broken",
        vec![0.0, 0.1],
        vec![NodeTrack::with_poses("Hips", vec![Pose::IDENTITY])],
    )
    .unwrap_err();
    assert!(matches!(err, MotionError::TrackLengthMismatch { poses: 1, frames: 2, .. }));

    let err = AnimationData::from_parts("Backwards", vec![0.2, 0.1], vec![]).unwrap_err();
    assert!(matches!(err, MotionError::NonMonotonicTime { .. }));

    let err = AnimationData::from_parts("NaN", vec![0.0, f32::NAN, 0.1], vec![]).unwrap_err();
    assert!(matches!(err, MotionError::NonFiniteTime(_)));
}

#[test]
fn deep_copy_is_independent() {
    let original = sample(3);
    let mut copy = original.clone();
    assert_eq!(copy, original);

    copy.pose_mut("Hips", 1).unwrap().translation = Vec3::splat(42.0);
    copy.delete_frame(0).unwrap();

    assert_eq!(original.frame_count(), 3);
    assert_eq!(original.pose_at("Hips", 1), Some(&pose_x(1.0)));
    assert_ne!(copy, original);
}

#[test]
fn track_mut_edits_poses_in_place() {
    let mut data = sample(3);
    for pose in data.track_mut("Hips").unwrap() {
        pose.scale = Vec3::splat(2.0);
    }
    assert!(data.tracks()[0].poses.iter().all(|p| p.scale == Vec3::splat(2.0)));
    assert!(data.tracks()[1].poses.iter().all(|p| p.scale == Vec3::ONE));
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn delete_frame_keeps_lengths_equal() {
    let mut data = sample(6);
    for frame in [5, 0, 2, 1] {
        data.delete_frame(frame).unwrap();
        assert_lengths_consistent(&data);
    }
    assert_eq!(data.frame_count(), 2);
    assert_eq!(data.pose_at("Hips", 0), Some(&pose_x(1.0)));
    assert_eq!(data.pose_at("Hips", 1), Some(&pose_x(4.0)));
}

#[test]
fn delete_frame_out_of_range_changes_nothing() {
    let mut data = sample(3);
    let before = data.clone();
    let err = data.delete_frame(3).unwrap_err();
    assert!(matches!(err, MotionError::FrameOutOfRange { frame: 3, frame_count: 3 }));
    assert_eq!(data, before);
}

#[test]
fn delete_until_empty() {
    let mut data = sample(2);
    data.delete_frame(0).unwrap();
    data.delete_frame(0).unwrap();
    assert!(data.is_empty());
    assert_eq!(data.track_count(), 2);
    assert!(data.delete_frame(0).is_err());
}

// ============================================================================
// Interpolate
// ============================================================================

#[test]
fn interpolate_uses_index_fraction() {
    let mut data = AnimationData::with_track_paths("Lerp", ["Hips"]).unwrap();
    // Uneven spacing must not matter.
    for (i, t) in [0.0, 0.01, 0.5, 0.51, 2.0].into_iter().enumerate() {
        let x = if i == 4 { 10.0 } else { 0.0 };
        data.push_frame(t, vec![pose_x(x)]).unwrap();
    }

    data.interpolate(0, 4).unwrap();

    assert_eq!(data.pose_at("Hips", 2).unwrap().translation.x, 5.0);
    assert_eq!(data.pose_at("Hips", 1).unwrap().translation.x, 2.5);
    assert_eq!(data.pose_at("Hips", 0).unwrap().translation.x, 0.0);
    assert_eq!(data.pose_at("Hips", 4).unwrap().translation.x, 10.0);
}

#[test]
fn interpolate_slerps_rotation() {
    let mut data = AnimationData::with_track_paths("Spin", ["Hips"]).unwrap();
    let end = Quat::from_rotation_y(1.0);
    data.push_frame(0.0, vec![Pose::IDENTITY]).unwrap();
    data.push_frame(0.1, vec![Pose::IDENTITY]).unwrap();
    data.push_frame(0.2, vec![Pose::new(Vec3::ZERO, end, Vec3::ONE)]).unwrap();

    data.interpolate(0, 2).unwrap();

    let mid = data.pose_at("Hips", 1).unwrap().rotation;
    assert!(mid.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-5), "{mid:?}");
}

#[test]
fn interpolate_rejects_bad_ranges() {
    let mut data = sample(5);
    let before = data.clone();

    assert!(matches!(data.interpolate(2, 2), Err(MotionError::InvalidFrameRange { .. })));
    assert!(matches!(data.interpolate(3, 1), Err(MotionError::InvalidFrameRange { .. })));
    assert!(matches!(data.interpolate(0, 5), Err(MotionError::InvalidFrameRange { .. })));
    assert_eq!(data, before);
}

// ============================================================================
// Apply frame to range
// ============================================================================

#[test]
fn apply_frame_to_range_is_inclusive() {
    let mut data = sample(6);
    data.apply_frame_to_range(5, 1, 3).unwrap();

    let xs: Vec<f32> = data.tracks()[0].poses.iter().map(|p| p.translation.x).collect();
    assert_eq!(xs, vec![0.0, 5.0, 5.0, 5.0, 4.0, 5.0]);
    assert_lengths_consistent(&data);
}

#[test]
fn apply_frame_to_range_validates_all_arguments() {
    let mut data = sample(4);
    let before = data.clone();

    assert!(matches!(
        data.apply_frame_to_range(4, 0, 1),
        Err(MotionError::FrameOutOfRange { frame: 4, .. })
    ));
    assert!(data.apply_frame_to_range(0, 2, 4).is_err());
    assert!(data.apply_frame_to_range(0, 3, 2).is_err());
    assert_eq!(data, before);
}
