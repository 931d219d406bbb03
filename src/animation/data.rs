//! Captured animation data.
//!
//! [`AnimationData`] is a shared frame timeline plus one [`NodeTrack`] per
//! recorded node. Three invariants hold for every instance:
//!
//! - every track has exactly one pose per timeline entry
//! - timestamps are non-decreasing
//! - node paths are unique
//!
//! Edit operations validate their arguments up front and either apply fully
//! or return an error with the data untouched. A deep copy is a plain
//! [`Clone`]: all storage is owned.

use serde::{Deserialize, Serialize};

use crate::animation::pose::Pose;
use crate::errors::{MotionError, Result};

/// The pose series of one node, keyed by its path below the capture root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTrack {
    pub node_path: String,
    pub poses: Vec<Pose>,
}

impl NodeTrack {
    #[must_use]
    pub fn new(node_path: impl Into<String>) -> Self {
        Self {
            node_path: node_path.into(),
            poses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_poses(node_path: impl Into<String>, poses: Vec<Pose>) -> Self {
        Self {
            node_path: node_path.into(),
            poses,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    pub name: String,
    timeline: Vec<f32>,
    tracks: Vec<NodeTrack>,
}

impl AnimationData {
    /// Creates an empty clip with no tracks and no frames.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeline: Vec::new(),
            tracks: Vec::new(),
        }
    }

    /// Creates an empty clip with one empty track per path.
    pub fn with_track_paths<I, S>(name: impl Into<String>, paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut data = Self::new(name);
        for path in paths {
            data.add_track(NodeTrack::new(path))?;
        }
        Ok(data)
    }

    /// Builds a clip from raw parts, checking every invariant.
    pub fn from_parts(name: impl Into<String>, timeline: Vec<f32>, tracks: Vec<NodeTrack>) -> Result<Self> {
        let data = Self {
            name: name.into(),
            timeline,
            tracks,
        };
        data.validate()?;
        Ok(data)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn timeline(&self) -> &[f32] {
        &self.timeline
    }

    #[inline]
    #[must_use]
    pub fn tracks(&self) -> &[NodeTrack] {
        &self.tracks
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.timeline.len()
    }

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Timestamp of the last frame, or zero for an empty clip.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.timeline.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn frame_time(&self, frame: usize) -> Option<f32> {
        self.timeline.get(frame).copied()
    }

    #[must_use]
    pub fn track(&self, node_path: &str) -> Option<&NodeTrack> {
        self.tracks.iter().find(|t| t.node_path == node_path)
    }

    #[must_use]
    pub fn pose_at(&self, node_path: &str, frame: usize) -> Option<&Pose> {
        self.track(node_path)?.poses.get(frame)
    }

    /// Mutable access to a single pose. The frame structure cannot change
    /// through this, so the invariants are preserved.
    pub fn pose_mut(&mut self, node_path: &str, frame: usize) -> Option<&mut Pose> {
        self.tracks
            .iter_mut()
            .find(|t| t.node_path == node_path)?
            .poses
            .get_mut(frame)
    }

    /// Mutable pose series of one track. The slice cannot change length.
    pub fn track_mut(&mut self, node_path: &str) -> Option<&mut [Pose]> {
        self.tracks
            .iter_mut()
            .find(|t| t.node_path == node_path)
            .map(|t| t.poses.as_mut_slice())
    }

    /// Index of the last frame whose timestamp is `<= time`.
    #[must_use]
    pub fn frame_at_time(&self, time: f32) -> Option<usize> {
        self.timeline.partition_point(|&t| t <= time).checked_sub(1)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Adds a track whose pose count must match the current frame count.
    pub fn add_track(&mut self, track: NodeTrack) -> Result<()> {
        if self.track(&track.node_path).is_some() {
            return Err(MotionError::DuplicateTrack(track.node_path));
        }
        if track.poses.len() != self.timeline.len() {
            return Err(MotionError::TrackLengthMismatch {
                path: track.node_path,
                poses: track.poses.len(),
                frames: self.timeline.len(),
            });
        }
        self.tracks.push(track);
        Ok(())
    }

    /// Appends one frame. `poses` is in track order, one per track.
    pub fn push_frame(&mut self, time: f32, poses: Vec<Pose>) -> Result<()> {
        if !time.is_finite() {
            return Err(MotionError::NonFiniteTime(time));
        }
        if let Some(&last) = self.timeline.last()
            && time < last
        {
            return Err(MotionError::NonMonotonicTime { time, last });
        }
        if poses.len() != self.tracks.len() {
            return Err(MotionError::TrackLengthMismatch {
                path: String::from("<frame>"),
                poses: poses.len(),
                frames: self.tracks.len(),
            });
        }

        self.timeline.push(time);
        for (track, pose) in self.tracks.iter_mut().zip(poses) {
            track.poses.push(pose);
        }
        Ok(())
    }

    /// Drops every frame, keeping the tracks.
    pub fn clear_frames(&mut self) {
        self.timeline.clear();
        for track in &mut self.tracks {
            track.poses.clear();
        }
    }

    /// Checks all three structural invariants.
    pub fn validate(&self) -> Result<()> {
        let frames = self.timeline.len();

        if let Some(&time) = self.timeline.iter().find(|t| !t.is_finite()) {
            return Err(MotionError::NonFiniteTime(time));
        }
        if let Some(w) = self.timeline.windows(2).find(|w| w[1] < w[0]) {
            return Err(MotionError::NonMonotonicTime {
                time: w[1],
                last: w[0],
            });
        }

        for (i, track) in self.tracks.iter().enumerate() {
            if track.poses.len() != frames {
                return Err(MotionError::TrackLengthMismatch {
                    path: track.node_path.clone(),
                    poses: track.poses.len(),
                    frames,
                });
            }
            if self.tracks[..i].iter().any(|t| t.node_path == track.node_path) {
                return Err(MotionError::DuplicateTrack(track.node_path.clone()));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Edit operations
    // ========================================================================

    /// Removes one frame from the timeline and from every track.
    pub fn delete_frame(&mut self, frame: usize) -> Result<()> {
        self.check_frame(frame)?;

        self.timeline.remove(frame);
        for track in &mut self.tracks {
            track.poses.remove(frame);
        }
        Ok(())
    }

    /// Replaces the frames strictly between `start` and `end` with a blend of
    /// the two endpoint poses.
    ///
    /// The blend factor is the frame's index fraction
    /// `(i - start) / (end - start)`, so the result does not depend on the
    /// spacing of timestamps.
    pub fn interpolate(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        if start == end {
            return Err(self.range_error(start, end));
        }

        let span = (end - start) as f32;
        for track in &mut self.tracks {
            let from = track.poses[start];
            let to = track.poses[end];
            for i in (start + 1)..end {
                let t = (i - start) as f32 / span;
                track.poses[i] = from.lerp(&to, t);
            }
        }
        Ok(())
    }

    /// Copies the poses of `source` onto every frame in `start..=end`.
    pub fn apply_frame_to_range(&mut self, source: usize, start: usize, end: usize) -> Result<()> {
        self.check_frame(source)?;
        self.check_range(start, end)?;

        for track in &mut self.tracks {
            let pose = track.poses[source];
            track.poses[start..=end].fill(pose);
        }
        Ok(())
    }

    fn check_frame(&self, frame: usize) -> Result<()> {
        if frame < self.timeline.len() {
            Ok(())
        } else {
            Err(MotionError::FrameOutOfRange {
                frame,
                frame_count: self.timeline.len(),
            })
        }
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start <= end && end < self.timeline.len() {
            Ok(())
        } else {
            Err(self.range_error(start, end))
        }
    }

    fn range_error(&self, start: usize, end: usize) -> MotionError {
        MotionError::InvalidFrameRange {
            start,
            end,
            frame_count: self.timeline.len(),
        }
    }
}
