//! # Myth Mocap
//!
//! Pose capture, frame-accurate playback and glTF export for node
//! hierarchies.
//!
//! ```rust,ignore
//! use mocap::{Recorder, RecorderSettings, Scene, TrackSelection, Transform};
//!
//! let mut scene = Scene::new();
//! let root = scene.create_node_with_name("Actor");
//! scene.spawn("Hips", Transform::new(), Some(root));
//!
//! let mut recorder = Recorder::new(RecorderSettings::default());
//! recorder.initialize(&scene, root, &TrackSelection::all())?;
//! recorder.start_capturing(&scene)?;
//! // once per frame:
//! recorder.update(&scene, 1.0 / 60.0);
//! let clip = recorder.captured_data();
//! ```
//!
//! The host hierarchy is reached only through [`SceneGraph`]; [`Scene`] is
//! the bundled slotmap implementation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod math;
pub mod scene;

pub use animation::{
    AnimationData, CaptureSpace, Channel, CurveConstructor, CurveSet, CurveSink, InterpolationMode, KeyframeTrack,
    NodeTrack, Player, PlayerSettings, Pose, Recorder, RecorderSettings, RecorderState, TrackSelection,
};
pub use assets::{ExportFormat, ExportOptions, ExportSummary, GltfEncoder, SceneEncoder, SceneExporter, load_clip, save_clip};
pub use errors::{MotionError, Result};
pub use scene::{
    BoneInfluence, Material, Mesh, Node, NodeHandle, Scene, SceneGraph, SkinBinding, Texture, Transform,
};
