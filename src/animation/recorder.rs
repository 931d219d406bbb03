//! Pose capture.
//!
//! A [`Recorder`] samples a resolved set of nodes below a capture root at a
//! fixed rate and appends the samples to an [`AnimationData`]. It is driven
//! by an external tick: call [`Recorder::update`] once per frame with the
//! frame's delta time.
//!
//! # State machine
//!
//! ```text
//! Idle --start_capturing--> Capturing --stop_capturing--> Idle
//! ```
//!
//! `start_capturing` records a frame at t = 0 immediately. Afterwards at
//! most one frame is captured per `update`, even when several capture
//! intervals elapsed since the previous one; missed frames are not
//! backfilled.

use std::fmt::Debug;
use std::hash::Hash;

use glam::Mat4;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::animation::data::{AnimationData, NodeTrack};
use crate::animation::pose::Pose;
use crate::errors::{MotionError, Result};
use crate::math;
use crate::scene::SceneGraph;

/// Capture rate used when the configured one is not a positive number.
pub const DEFAULT_CAPTURE_RATE: f32 = 30.0;

/// Smallest allowed gap between two captured frames, in seconds.
pub const MIN_CAPTURE_INTERVAL: f32 = 0.001;

/// Fraction of the capture interval absorbed as f32 accumulation error when
/// checking whether the next frame is due.
const CAPTURE_TOLERANCE: f32 = 1e-3;

/// Which transform of a node is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureSpace {
    /// Parent-relative TRS.
    #[default]
    Local,
    /// TRS decomposed from the node's world matrix.
    World,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Name given to the captured clip.
    pub clip_name: String,
    /// Frames per second.
    pub capture_rate: f32,
    /// Re-base direct children of the root onto the root's initial placement.
    pub root_motion: bool,
    pub space: CaptureSpace,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            clip_name: String::from("Recording"),
            capture_rate: DEFAULT_CAPTURE_RATE,
            root_motion: true,
            space: CaptureSpace::Local,
        }
    }
}

/// Which nodes below the capture root get a track.
///
/// An empty `include` list tracks every descendant of the root. The exclude
/// set is subtracted afterwards.
#[derive(Debug, Clone)]
pub struct TrackSelection<H> {
    pub include: Vec<H>,
    pub include_children: bool,
    pub exclude: Vec<H>,
    pub exclude_children: bool,
}

impl<H> TrackSelection<H> {
    /// Every descendant of the root.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include: Vec::new(),
            include_children: false,
            exclude: Vec::new(),
            exclude_children: false,
        }
    }

    #[must_use]
    pub fn including(nodes: Vec<H>, with_children: bool) -> Self {
        Self {
            include: nodes,
            include_children: with_children,
            ..Self::all()
        }
    }

    #[must_use]
    pub fn excluding(mut self, nodes: Vec<H>, with_children: bool) -> Self {
        self.exclude = nodes;
        self.exclude_children = with_children;
        self
    }
}

impl<H> Default for TrackSelection<H> {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Capturing,
}

#[derive(Debug, Clone)]
struct TrackedNode<H> {
    handle: H,
    path: String,
    /// Direct child of the capture root; eligible for root-motion re-basing.
    root_child: bool,
}

pub struct Recorder<H> {
    settings: RecorderSettings,
    state: RecorderState,

    root: Option<H>,
    /// Root's local TRS matrix at `initialize` time; never updated afterwards.
    root_initial: Mat4,
    tracked: Vec<TrackedNode<H>>,

    data: AnimationData,
    elapsed: f32,
    last_capture: f32,
}

impl<H: Copy + Eq + Hash + Debug> Recorder<H> {
    #[must_use]
    pub fn new(settings: RecorderSettings) -> Self {
        let data = AnimationData::new(settings.clip_name.clone());
        Self {
            settings,
            state: RecorderState::Idle,
            root: None,
            root_initial: Mat4::IDENTITY,
            tracked: Vec::new(),
            data,
            elapsed: 0.0,
            last_capture: 0.0,
        }
    }

    /// Resolves the tracked node set and fixes the root reference frame.
    ///
    /// Nodes outside the root's subtree and nodes whose path collides with
    /// an already tracked one are skipped with a warning. Re-initializing
    /// while capturing stops the capture first.
    pub fn initialize<S>(&mut self, scene: &S, root: H, selection: &TrackSelection<H>) -> Result<()>
    where
        S: SceneGraph<Handle = H>,
    {
        let Some(root_matrix) = scene.local_matrix(root) else {
            log::error!("Recorder root {root:?} is not part of the scene");
            return Err(MotionError::NodeNotFound(format!("{root:?}")));
        };

        if self.is_capturing() {
            log::warn!("Recorder re-initialized while capturing; stopping capture");
            self.stop_capturing();
        }

        let candidates = if selection.include.is_empty() {
            scene.descendants(root)
        } else {
            expand(scene, &selection.include, selection.include_children)
        };
        let excluded: FxHashSet<H> = expand(scene, &selection.exclude, selection.exclude_children)
            .into_iter()
            .collect();

        let mut seen = FxHashSet::default();
        let mut tracked = Vec::with_capacity(candidates.len());
        let mut data = AnimationData::new(self.settings.clip_name.clone());

        for handle in candidates {
            if excluded.contains(&handle) || !seen.insert(handle) {
                continue;
            }
            let Some(path) = scene.path_from(root, handle) else {
                log::warn!("Node {handle:?} is not below the capture root, skipping");
                continue;
            };
            if let Err(err) = data.add_track(NodeTrack::new(path.clone())) {
                log::warn!("Skipping node {handle:?}: {err}");
                continue;
            }
            tracked.push(TrackedNode {
                handle,
                path,
                root_child: scene.parent(handle) == Some(root),
            });
        }

        log::debug!("Recorder initialized with {} tracked nodes", tracked.len());

        self.root = Some(root);
        self.root_initial = root_matrix;
        self.tracked = tracked;
        self.data = data;
        self.elapsed = 0.0;
        self.last_capture = 0.0;
        Ok(())
    }

    /// Idle → Capturing. Clears earlier frames and captures the t = 0 frame.
    pub fn start_capturing<S>(&mut self, scene: &S) -> Result<()>
    where
        S: SceneGraph<Handle = H>,
    {
        let Some(root) = self.root else {
            log::error!("start_capturing called before initialize");
            return Err(MotionError::RecorderNotInitialized);
        };
        if self.is_capturing() {
            log::warn!("Recorder is already capturing");
            return Ok(());
        }

        let rate = self.settings.capture_rate;
        if !(rate.is_finite() && rate > 0.0) {
            log::warn!("Invalid capture rate {rate}, falling back to {DEFAULT_CAPTURE_RATE} Hz");
            self.settings.capture_rate = DEFAULT_CAPTURE_RATE;
        }

        self.data.clear_frames();
        self.elapsed = 0.0;
        self.last_capture = 0.0;
        self.state = RecorderState::Capturing;
        log::info!(
            "Capture started: {} nodes at {} Hz",
            self.tracked.len(),
            self.settings.capture_rate
        );

        self.capture_frame(scene, root);
        Ok(())
    }

    /// Capturing → Idle. Captured frames are kept.
    pub fn stop_capturing(&mut self) {
        if self.state == RecorderState::Capturing {
            log::info!("Capture stopped after {} frames", self.data.frame_count());
        }
        self.state = RecorderState::Idle;
    }

    /// Advances capture time and captures at most one frame.
    pub fn update<S>(&mut self, scene: &S, delta_time: f32)
    where
        S: SceneGraph<Handle = H>,
    {
        if self.state != RecorderState::Capturing {
            return;
        }
        let Some(root) = self.root else {
            return;
        };
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return;
        }

        self.elapsed += delta_time;
        let interval = self.capture_interval();
        let deadline = self.last_capture + interval;
        if self.elapsed + interval * CAPTURE_TOLERANCE >= deadline {
            self.capture_frame(scene, root);
        }
    }

    /// Point-in-time copy of everything captured so far.
    #[must_use]
    pub fn captured_data(&self) -> AnimationData {
        self.data.clone()
    }

    /// Drops captured frames and returns to `Idle`, keeping the tracked set.
    pub fn reset(&mut self) {
        self.state = RecorderState::Idle;
        self.data.clear_frames();
        self.elapsed = 0.0;
        self.last_capture = 0.0;
    }

    // ========================================================================
    // Getters
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn state(&self) -> RecorderState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.state == RecorderState::Capturing
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.data.frame_count()
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    #[must_use]
    pub fn tracked_paths(&self) -> Vec<&str> {
        self.tracked.iter().map(|t| t.path.as_str()).collect()
    }

    /// Seconds between captured frames, never below [`MIN_CAPTURE_INTERVAL`].
    #[must_use]
    pub fn capture_interval(&self) -> f32 {
        (1.0 / self.settings.capture_rate).max(MIN_CAPTURE_INTERVAL)
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    fn capture_frame<S>(&mut self, scene: &S, root: H)
    where
        S: SceneGraph<Handle = H>,
    {
        let root_current = scene.local_matrix(root);
        let mut poses = Vec::with_capacity(self.tracked.len());

        for (index, node) in self.tracked.iter().enumerate() {
            let sampled = if self.settings.root_motion && node.root_child {
                scene.local_matrix(node.handle).map(|local| match root_current {
                    // No displacement since initialize: the correction is the identity.
                    Some(current) if current != self.root_initial => {
                        Pose::from_matrix(&math::rebase_on_root(&self.root_initial, &current, &local))
                    }
                    _ => Pose::from_matrix(&local),
                })
            } else {
                match self.settings.space {
                    CaptureSpace::Local => scene.local_transform(node.handle).map(Pose::from),
                    CaptureSpace::World => scene.world_transform(node.handle).map(Pose::from),
                }
            };

            let pose = sampled.unwrap_or_else(|| {
                log::warn!("Tracked node '{}' vanished, repeating its last pose", node.path);
                self.data.tracks()[index]
                    .poses
                    .last()
                    .copied()
                    .unwrap_or_default()
            });
            poses.push(pose);
        }

        if let Err(err) = self.data.push_frame(self.elapsed, poses) {
            log::error!("Failed to append captured frame: {err}");
            return;
        }
        self.last_capture = self.elapsed;
    }
}

impl<H: Copy + Eq + Hash + Debug> Default for Recorder<H> {
    fn default() -> Self {
        Self::new(RecorderSettings::default())
    }
}

/// `nodes`, optionally followed by each node's descendants, in order.
fn expand<S: SceneGraph>(scene: &S, nodes: &[S::Handle], with_children: bool) -> Vec<S::Handle> {
    let mut out = Vec::with_capacity(nodes.len());
    for &node in nodes {
        if !scene.contains(node) {
            log::warn!("Selected node {node:?} is not part of the scene");
            continue;
        }
        out.push(node);
        if with_children {
            out.extend(scene.descendants(node));
        }
    }
    out
}
