//! Recorder Tests
//!
//! Tests for:
//! - Capture scheduling (capture on start, one frame per update, no backfill)
//! - Capture rate validation and the minimum interval
//! - Root-motion re-basing of the root's direct children
//! - Track selection (include / exclude, with and without children)
//! - Local vs world capture space

use glam::{Quat, Vec3};

use mocap::scene::{Scene, SceneGraph, Transform};
use mocap::{CaptureSpace, MotionError, NodeHandle, Pose, Recorder, RecorderSettings, RecorderState, TrackSelection};

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn settings(rate: f32) -> RecorderSettings {
    RecorderSettings {
        capture_rate: rate,
        ..Default::default()
    }
}

/// Root -> Child
fn pair() -> (Scene, NodeHandle, NodeHandle) {
    let mut scene = Scene::new();
    let root = scene.spawn("Root", Transform::new(), None);
    let child = scene.spawn("Child", Transform::from_position(Vec3::X), Some(root));
    (scene, root, child)
}

/// Root -> (Spine -> (Neck, ArmL), Leg)
fn rig() -> (Scene, [NodeHandle; 5]) {
    let mut scene = Scene::new();
    let root = scene.spawn("Root", Transform::new(), None);
    let spine = scene.spawn("Spine", Transform::from_position(Vec3::Y), Some(root));
    let neck = scene.spawn("Neck", Transform::from_position(Vec3::Y), Some(spine));
    let arm = scene.spawn("ArmL", Transform::from_position(Vec3::X), Some(spine));
    let leg = scene.spawn("Leg", Transform::from_position(-Vec3::Y), Some(root));
    (scene, [root, spine, neck, arm, leg])
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn two_updates_after_start_yield_three_frames() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();

    recorder.start_capturing(&scene).unwrap();
    recorder.update(&scene, 0.11);
    recorder.update(&scene, 0.11);

    let data = recorder.captured_data();
    assert_eq!(data.frame_count(), 3);
    assert_eq!(data.track_count(), 1);
    assert_eq!(data.tracks()[0].node_path, "Child");
    assert_eq!(data.tracks()[0].poses.len(), 3);

    let expected = [0.0, 0.11, 0.22];
    for (t, e) in data.timeline().iter().zip(expected) {
        assert!((t - e).abs() < EPSILON, "{:?}", data.timeline());
    }
}

#[test]
fn large_delta_captures_only_one_frame() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();

    // Five intervals elapse, but missed frames are not backfilled.
    recorder.update(&scene, 0.5);
    assert_eq!(recorder.frame_count(), 2);
    assert!((recorder.elapsed() - 0.5).abs() < EPSILON);
}

#[test]
fn ticking_at_capture_rate_never_drops_frames() {
    init_logger();
    for rate in [30.0_f32, 60.0] {
        let (scene, root, _) = pair();
        let mut recorder = Recorder::new(settings(rate));
        recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
        recorder.start_capturing(&scene).unwrap();

        for _ in 0..300 {
            recorder.update(&scene, 1.0 / rate);
        }
        assert_eq!(recorder.frame_count(), 301, "rate {rate}");

        let data = recorder.captured_data();
        assert!(data.timeline().windows(2).all(|w| w[1] > w[0]));
    }
}

#[test]
fn short_deltas_accumulate() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();

    recorder.update(&scene, 0.06);
    assert_eq!(recorder.frame_count(), 1);
    recorder.update(&scene, 0.06);
    assert_eq!(recorder.frame_count(), 2);
    recorder.update(&scene, 0.06);
    assert_eq!(recorder.frame_count(), 2);
}

#[test]
fn non_positive_delta_is_ignored() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();

    recorder.update(&scene, 0.0);
    recorder.update(&scene, -1.0);
    recorder.update(&scene, f32::NAN);
    assert_eq!(recorder.frame_count(), 1);
    assert_eq!(recorder.elapsed(), 0.0);
}

#[test]
fn updates_after_stop_capture_nothing() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();
    recorder.update(&scene, 0.2);
    recorder.stop_capturing();

    assert_eq!(recorder.state(), RecorderState::Idle);
    recorder.update(&scene, 0.2);
    recorder.update(&scene, 0.2);
    assert_eq!(recorder.frame_count(), 2);
}

#[test]
fn restart_clears_previous_frames() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();
    recorder.update(&scene, 0.2);
    recorder.update(&scene, 0.2);
    recorder.stop_capturing();

    recorder.start_capturing(&scene).unwrap();
    assert_eq!(recorder.frame_count(), 1);
    assert_eq!(recorder.captured_data().timeline(), &[0.0]);

    recorder.reset();
    assert!(!recorder.is_capturing());
    assert_eq!(recorder.frame_count(), 0);
    assert_eq!(recorder.tracked_paths(), vec!["Child"]);
}

#[test]
fn snapshot_is_independent_of_further_capture() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();

    let snapshot = recorder.captured_data();
    recorder.update(&scene, 0.2);
    recorder.update(&scene, 0.2);

    assert_eq!(snapshot.frame_count(), 1);
    assert_eq!(recorder.frame_count(), 3);
    snapshot.validate().unwrap();
}

// ============================================================================
// Rate validation
// ============================================================================

#[test]
fn start_before_initialize_fails() {
    init_logger();
    let (scene, _, _) = pair();
    let mut recorder: Recorder<NodeHandle> = Recorder::default();
    let err = recorder.start_capturing(&scene).unwrap_err();
    assert!(matches!(err, MotionError::RecorderNotInitialized));
    assert!(!recorder.is_capturing());
}

#[test]
fn initialize_with_stale_root_fails() {
    init_logger();
    let (mut scene, _, child) = pair();
    scene.remove_node(child);
    let mut recorder = Recorder::default();
    let err = recorder.initialize(&scene, child, &TrackSelection::all()).unwrap_err();
    assert!(matches!(err, MotionError::NodeNotFound(_)));
}

#[test]
fn invalid_rate_falls_back_to_default() {
    init_logger();
    let (scene, root, _) = pair();
    for rate in [0.0, -5.0, f32::NAN] {
        let mut recorder = Recorder::new(settings(rate));
        recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
        recorder.start_capturing(&scene).unwrap();
        assert!(recorder.is_capturing());
        assert_eq!(recorder.settings().capture_rate, 30.0);
        assert_eq!(recorder.frame_count(), 1);
    }
}

#[test]
fn interval_never_drops_below_minimum() {
    let recorder: Recorder<NodeHandle> = Recorder::new(settings(100_000.0));
    assert_eq!(recorder.capture_interval(), 0.001);

    let recorder: Recorder<NodeHandle> = Recorder::new(settings(4.0));
    assert_eq!(recorder.capture_interval(), 0.25);
}

#[test]
fn timestamps_stay_distinct_at_high_rates() {
    init_logger();
    let (scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(100_000.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();
    for _ in 0..10 {
        recorder.update(&scene, 0.0006);
    }

    let data = recorder.captured_data();
    assert!(data.timeline().windows(2).all(|w| w[1] > w[0]), "{:?}", data.timeline());
    assert_eq!(data.frame_count(), 6);
}

// ============================================================================
// Root motion
// ============================================================================

#[test]
fn static_root_records_exact_local_decomposition() {
    init_logger();
    let mut scene = Scene::new();
    let root = scene.spawn(
        "Root",
        Transform::from_trs(Vec3::new(2.0, 0.0, -3.0), Quat::from_rotation_y(0.8), Vec3::ONE),
        None,
    );
    let child = scene.spawn(
        "Child",
        Transform::from_trs(Vec3::new(0.3, 1.2, 0.0), Quat::from_rotation_x(0.4), Vec3::new(1.0, 2.0, 1.0)),
        Some(root),
    );

    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();
    for _ in 0..4 {
        recorder.update(&scene, 0.15);
    }

    let expected = Pose::from_matrix(&scene.local_matrix(child).unwrap());
    let data = recorder.captured_data();
    assert_eq!(data.frame_count(), 5);
    assert!(data.tracks()[0].poses.iter().all(|p| *p == expected));
}

#[test]
fn root_displacement_is_folded_into_children() {
    init_logger();
    let (mut scene, root, _) = pair();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();

    scene.get_node_mut(root).unwrap().transform.position = Vec3::new(5.0, 0.0, 0.0);
    recorder.start_capturing(&scene).unwrap();

    let pose = recorder.captured_data().pose_at("Child", 0).copied().unwrap();
    assert!(vec3_approx(pose.translation, Vec3::new(6.0, 0.0, 0.0)), "{pose:?}");
}

#[test]
fn root_motion_only_touches_direct_children() {
    init_logger();
    let (mut scene, [root, ..]) = rig();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();

    scene.get_node_mut(root).unwrap().transform.position = Vec3::new(0.0, 0.0, 4.0);
    recorder.start_capturing(&scene).unwrap();

    let data = recorder.captured_data();
    let spine = data.pose_at("Spine", 0).unwrap();
    let neck = data.pose_at("Spine/Neck", 0).unwrap();
    assert!(vec3_approx(spine.translation, Vec3::new(0.0, 1.0, 4.0)));
    assert_eq!(neck.translation, Vec3::Y);
}

#[test]
fn disabled_root_motion_records_plain_local() {
    init_logger();
    let (mut scene, root, _) = pair();
    let mut recorder = Recorder::new(RecorderSettings {
        root_motion: false,
        ..settings(10.0)
    });
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();

    scene.get_node_mut(root).unwrap().transform.position = Vec3::new(5.0, 0.0, 0.0);
    recorder.start_capturing(&scene).unwrap();

    let pose = recorder.captured_data().pose_at("Child", 0).copied().unwrap();
    assert_eq!(pose.translation, Vec3::X);
}

#[test]
fn world_space_capture() {
    init_logger();
    let (mut scene, [root, ..]) = rig();
    scene.get_node_mut(root).unwrap().transform.position = Vec3::new(10.0, 0.0, 0.0);

    let mut recorder = Recorder::new(RecorderSettings {
        root_motion: false,
        space: CaptureSpace::World,
        ..settings(10.0)
    });
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();

    let data = recorder.captured_data();
    assert!(vec3_approx(data.pose_at("Spine", 0).unwrap().translation, Vec3::new(10.0, 1.0, 0.0)));
    assert!(vec3_approx(data.pose_at("Spine/Neck", 0).unwrap().translation, Vec3::new(10.0, 2.0, 0.0)));
}

#[test]
fn vanished_node_repeats_last_pose() {
    init_logger();
    let (mut scene, [root, _, _, _, leg]) = rig();
    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();

    scene.remove_node(leg);
    recorder.update(&scene, 0.2);

    let data = recorder.captured_data();
    assert_eq!(data.frame_count(), 2);
    assert_eq!(data.pose_at("Leg", 1), data.pose_at("Leg", 0));
    data.validate().unwrap();
}

// ============================================================================
// Track selection
// ============================================================================

#[test]
fn default_selection_tracks_every_descendant() {
    init_logger();
    let (scene, [root, ..]) = rig();
    let mut recorder = Recorder::default();
    recorder.initialize(&scene, root, &TrackSelection::default()).unwrap();
    assert_eq!(recorder.tracked_paths(), vec!["Spine", "Spine/Neck", "Spine/ArmL", "Leg"]);
}

#[test]
fn include_with_children_minus_exclusions() {
    init_logger();
    let (scene, [root, spine, _, arm, _]) = rig();
    let selection = TrackSelection::including(vec![spine], true).excluding(vec![arm], false);

    let mut recorder = Recorder::default();
    recorder.initialize(&scene, root, &selection).unwrap();
    assert_eq!(recorder.tracked_paths(), vec!["Spine", "Spine/Neck"]);
}

#[test]
fn exclude_with_children_drops_subtree() {
    init_logger();
    let (scene, [root, spine, ..]) = rig();
    let selection = TrackSelection::all().excluding(vec![spine], true);

    let mut recorder = Recorder::default();
    recorder.initialize(&scene, root, &selection).unwrap();
    assert_eq!(recorder.tracked_paths(), vec!["Leg"]);
}

#[test]
fn nodes_outside_root_and_duplicates_are_skipped() {
    init_logger();
    let (scene, [_, spine, neck, _, leg]) = rig();
    let selection = TrackSelection::including(vec![neck, leg, neck], false);

    let mut recorder = Recorder::default();
    recorder.initialize(&scene, spine, &selection).unwrap();
    assert_eq!(recorder.tracked_paths(), vec!["Neck"]);
}

#[test]
fn zero_tracked_nodes_still_captures_timeline() {
    init_logger();
    let mut scene = Scene::new();
    let root = scene.spawn("Lonely", Transform::new(), None);

    let mut recorder = Recorder::new(settings(10.0));
    recorder.initialize(&scene, root, &TrackSelection::all()).unwrap();
    recorder.start_capturing(&scene).unwrap();
    recorder.update(&scene, 0.2);

    let data = recorder.captured_data();
    assert_eq!(data.track_count(), 0);
    assert_eq!(data.frame_count(), 2);
    assert_eq!(data.name, "Recording");
}
