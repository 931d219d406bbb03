//! Captured-clip playback.
//!
//! The [`Player`] maps accumulated time onto the discrete frames of an
//! [`AnimationData`]. Every `update` applies at most one frame: the last one
//! whose timestamp has been reached. Frames are never applied out of order
//! and never applied twice by `update`.
//!
//! Tracks are matched to live nodes through their path below a bound root
//! (see [`Binder`]). Tracks without a live node are skipped.

use std::fmt::Debug;
use std::hash::Hash;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::animation::binder::Binder;
use crate::animation::binding::TrackBinding;
use crate::animation::data::AnimationData;
use crate::animation::recorder::CaptureSpace;
use crate::errors::{MotionError, Result};
use crate::scene::{SceneGraph, Transform};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Space the stored translation/rotation is written in. Scale is always
    /// written as local scale.
    pub space: CaptureSpace,
    /// Multiplier applied to every delta time.
    pub speed: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            space: CaptureSpace::Local,
            speed: 1.0,
        }
    }
}

pub struct Player<H> {
    pub settings: PlayerSettings,

    data: Option<AnimationData>,
    root: Option<H>,
    bindings: Vec<TrackBinding<H>>,
    needs_rebind: bool,

    elapsed: f32,
    /// Index of the next frame `update` may apply.
    next_frame: usize,
    current_frame: Option<usize>,
    playing: bool,
}

impl<H: Copy + Eq + Hash + Debug> Player<H> {
    #[must_use]
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            data: None,
            root: None,
            bindings: Vec::new(),
            needs_rebind: false,
            elapsed: 0.0,
            next_frame: 0,
            current_frame: None,
            playing: false,
        }
    }

    // ========================================================================
    // Data & binding
    // ========================================================================

    /// Replaces the loaded clip. Playback stops and the cursor resets.
    pub fn load(&mut self, data: AnimationData) {
        log::debug!(
            "Player loaded '{}' ({} tracks, {} frames)",
            data.name,
            data.track_count(),
            data.frame_count()
        );
        self.data = Some(data);
        self.bindings.clear();
        self.needs_rebind = self.root.is_some();
        self.reset_cursor();
    }

    /// Removes the loaded clip and returns it.
    pub fn unload(&mut self) -> Option<AnimationData> {
        self.bindings.clear();
        self.needs_rebind = false;
        self.reset_cursor();
        self.data.take()
    }

    #[must_use]
    pub fn data(&self) -> Option<&AnimationData> {
        self.data.as_ref()
    }

    /// Sets the playback root and resolves track paths below it.
    ///
    /// Returns the number of tracks bound to a live node. Call again
    /// whenever the target hierarchy changes.
    pub fn bind<S>(&mut self, scene: &S, root: H) -> Result<usize>
    where
        S: SceneGraph<Handle = H>,
    {
        if !scene.contains(root) {
            log::error!("Playback root {root:?} is not part of the scene");
            return Err(MotionError::NodeNotFound(format!("{root:?}")));
        }
        self.root = Some(root);
        self.rebind(scene);
        Ok(self.bindings.len())
    }

    fn rebind<S>(&mut self, scene: &S)
    where
        S: SceneGraph<Handle = H>,
    {
        self.bindings = match (&self.data, self.root) {
            (Some(data), Some(root)) => Binder::bind(scene, root, data),
            _ => Vec::new(),
        };
        self.needs_rebind = false;
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Applies `frame` and starts playing from its timestamp.
    ///
    /// Fails without touching any state when no clip is loaded or `frame`
    /// is out of range.
    pub fn start_playing<S>(&mut self, scene: &mut S, frame: usize) -> Result<()>
    where
        S: SceneGraph<Handle = H>,
    {
        let time = self.checked_frame_time(frame)?;
        if self.needs_rebind {
            self.rebind(scene);
        }

        self.apply_frame_unchecked(scene, frame);
        self.elapsed = time;
        self.next_frame = frame + 1;
        self.current_frame = Some(frame);
        self.playing = true;
        log::info!("Playback started at frame {frame} ({time:.3}s)");
        Ok(())
    }

    pub fn stop_playing(&mut self) {
        if self.playing {
            log::info!("Playback stopped at {:.3}s", self.elapsed);
        }
        self.playing = false;
    }

    /// Advances playback time and applies at most one frame.
    pub fn update<S>(&mut self, scene: &mut S, delta_time: f32)
    where
        S: SceneGraph<Handle = H>,
    {
        if !self.playing {
            return;
        }
        let Some(data) = &self.data else {
            self.playing = false;
            return;
        };

        let step = delta_time * self.settings.speed;
        if !(step.is_finite() && step >= 0.0) {
            return;
        }
        self.elapsed += step;

        let timeline = data.timeline();
        if self.next_frame >= timeline.len() {
            log::debug!("Playback reached the end of '{}'", data.name);
            self.playing = false;
            return;
        }

        let mut candidate = None;
        while self.next_frame < timeline.len() && self.elapsed >= timeline[self.next_frame] {
            candidate = Some(self.next_frame);
            self.next_frame += 1;
        }

        if let Some(frame) = candidate {
            if self.needs_rebind {
                self.rebind(scene);
            }
            self.apply_frame_unchecked(scene, frame);
            self.current_frame = Some(frame);
        }
    }

    /// Writes the poses of `frame` onto the bound nodes without moving the
    /// playback cursor.
    pub fn apply_frame<S>(&mut self, scene: &mut S, frame: usize) -> Result<()>
    where
        S: SceneGraph<Handle = H>,
    {
        self.checked_frame_time(frame)?;
        if self.needs_rebind {
            self.rebind(scene);
        }
        self.apply_frame_unchecked(scene, frame);
        Ok(())
    }

    /// Applies `frame` and moves the cursor there. The playing flag is kept.
    pub fn seek<S>(&mut self, scene: &mut S, frame: usize) -> Result<()>
    where
        S: SceneGraph<Handle = H>,
    {
        let time = self.checked_frame_time(frame)?;
        if self.needs_rebind {
            self.rebind(scene);
        }
        self.apply_frame_unchecked(scene, frame);
        self.elapsed = time;
        self.next_frame = frame + 1;
        self.current_frame = Some(frame);
        Ok(())
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Removes `frame` from the loaded clip, keeping the cursor on the same
    /// content and within bounds.
    pub fn delete_frame(&mut self, frame: usize) -> Result<()> {
        let data = self.data_mut()?;
        if let Err(err) = data.delete_frame(frame) {
            log::error!("delete_frame({frame}) on '{}': {err}", data.name);
            return Err(err);
        }
        let len = data.frame_count();

        if frame < self.next_frame {
            self.next_frame -= 1;
        }
        self.next_frame = self.next_frame.min(len);
        self.current_frame = self.current_frame.and_then(|current| {
            let shifted = if current > frame { current - 1 } else { current };
            if shifted < len { Some(shifted) } else { len.checked_sub(1) }
        });
        Ok(())
    }

    pub fn interpolate(&mut self, start: usize, end: usize) -> Result<()> {
        let data = self.data_mut()?;
        data.interpolate(start, end).inspect_err(|err| {
            log::error!("interpolate({start}, {end}) on '{}': {err}", data.name);
        })
    }

    pub fn apply_frame_to_range(&mut self, source: usize, start: usize, end: usize) -> Result<()> {
        let data = self.data_mut()?;
        data.apply_frame_to_range(source, start, end).inspect_err(|err| {
            log::error!("apply_frame_to_range({source}, {start}, {end}) on '{}': {err}", data.name);
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Last frame applied by `start_playing`, `seek` or `update`.
    #[inline]
    #[must_use]
    pub fn current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    #[inline]
    #[must_use]
    pub fn next_frame(&self) -> usize {
        self.next_frame
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub fn bound_track_count(&self) -> usize {
        self.bindings.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn reset_cursor(&mut self) {
        self.playing = false;
        self.elapsed = 0.0;
        self.next_frame = 0;
        self.current_frame = None;
    }

    fn data_mut(&mut self) -> Result<&mut AnimationData> {
        self.data.as_mut().ok_or_else(|| {
            log::error!("No animation data loaded");
            MotionError::NoAnimationData
        })
    }

    fn checked_frame_time(&self, frame: usize) -> Result<f32> {
        let Some(data) = &self.data else {
            log::error!("No animation data loaded");
            return Err(MotionError::NoAnimationData);
        };
        data.frame_time(frame).ok_or_else(|| {
            log::error!("Frame {frame} out of range for '{}' ({} frames)", data.name, data.frame_count());
            MotionError::FrameOutOfRange {
                frame,
                frame_count: data.frame_count(),
            }
        })
    }

    fn apply_frame_unchecked<S>(&self, scene: &mut S, frame: usize)
    where
        S: SceneGraph<Handle = H>,
    {
        let Some(data) = &self.data else {
            return;
        };
        let tracks = data.tracks();

        for binding in &self.bindings {
            let Some(pose) = tracks
                .get(binding.track_index)
                .and_then(|track| track.poses.get(frame))
            else {
                continue;
            };

            match self.settings.space {
                CaptureSpace::Local => {
                    scene.set_local_transform(binding.node, Transform::from(*pose));
                }
                CaptureSpace::World => {
                    let placed = Transform::from_trs(pose.translation, pose.rotation, Vec3::ONE);
                    if scene.set_world_transform(binding.node, placed)
                        && let Some(mut local) = scene.local_transform(binding.node)
                    {
                        local.scale = pose.scale;
                        scene.set_local_transform(binding.node, local);
                    }
                }
            }
        }
    }
}

impl<H: Copy + Eq + Hash + Debug> Default for Player<H> {
    fn default() -> Self {
        Self::new(PlayerSettings::default())
    }
}
