//! Conversion of captured frames into continuous per-component curves.
//!
//! [`CurveConstructor`] walks an [`AnimationData`] and emits one
//! [`KeyframeTrack<f32>`] per (node path, [`Channel`], component), with one
//! key per captured frame at that frame's timestamp. The receiving curve
//! store is abstracted as a [`CurveSink`]; [`CurveSet`] is the in-memory one.

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::animation::binding::Channel;
use crate::animation::data::AnimationData;
use crate::animation::pose::Pose;
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};

/// Receiver of constructed curves.
pub trait CurveSink {
    /// Drops every component curve of `channel` on `node_path`.
    fn clear_channel(&mut self, node_path: &str, channel: Channel);

    /// Stores (or replaces) one component curve.
    fn set_curve(&mut self, node_path: &str, channel: Channel, component: usize, curve: KeyframeTrack<f32>);
}

/// Which channels are turned into curves, and how the curves interpolate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConstructor {
    pub translation: bool,
    pub rotation: bool,
    pub scale: bool,
    pub interpolation: InterpolationMode,
}

impl Default for CurveConstructor {
    fn default() -> Self {
        Self {
            translation: true,
            rotation: true,
            scale: true,
            interpolation: InterpolationMode::Linear,
        }
    }
}

impl CurveConstructor {
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Translation => self.translation,
            Channel::Rotation => self.rotation,
            Channel::Scale => self.scale,
        }
    }

    /// Writes curves for every track of `data` into `sink`.
    ///
    /// Every channel of every track is cleared first, so disabled channels
    /// end up with no curves even if the sink held some before.
    pub fn build<K: CurveSink + ?Sized>(&self, data: &AnimationData, sink: &mut K) {
        let times = data.timeline();

        for track in data.tracks() {
            for channel in Channel::ALL {
                sink.clear_channel(&track.node_path, channel);
                if !self.is_enabled(channel) {
                    continue;
                }

                let count = channel.components();
                let mut curves = vec![KeyframeTrack::empty(self.interpolation); count];
                let mut previous = None;

                for (&time, pose) in times.iter().zip(&track.poses) {
                    let values = channel_values(channel, pose, &mut previous);
                    for (curve, value) in curves.iter_mut().zip(values) {
                        curve.push_key(time, value);
                    }
                }

                for (component, curve) in curves.into_iter().enumerate() {
                    sink.set_curve(&track.node_path, channel, component, curve);
                }
            }
        }

        log::debug!("Built curves for {} tracks of '{}'", data.track_count(), data.name);
    }
}

/// Component values of one channel. Rotations are flipped into the
/// hemisphere of `previous` so consecutive keys never jump sign.
fn channel_values(channel: Channel, pose: &Pose, previous: &mut Option<Quat>) -> Vec<f32> {
    match channel {
        Channel::Translation => pose.translation.to_array().to_vec(),
        Channel::Scale => pose.scale.to_array().to_vec(),
        Channel::Rotation => {
            let mut q = pose.rotation;
            if let Some(prev) = *previous
                && prev.dot(q) < 0.0
            {
                q = -q;
            }
            *previous = Some(q);
            q.to_array().to_vec()
        }
    }
}

// ============================================================================
// In-memory curve store
// ============================================================================

type ChannelCurves = FxHashMap<(Channel, usize), KeyframeTrack<f32>>;

/// Curves keyed by node path, channel and component index.
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    curves: FxHashMap<String, ChannelCurves>,
}

impl CurveSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of component curves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.curves.values().map(FxHashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node paths that carry at least one curve, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .curves
            .iter()
            .filter(|(_, curves)| !curves.is_empty())
            .map(|(path, _)| path.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }

    #[must_use]
    pub fn curve(&self, node_path: &str, channel: Channel, component: usize) -> Option<&KeyframeTrack<f32>> {
        self.curves.get(node_path)?.get(&(channel, component))
    }

    /// True when every component of `channel` has a curve on `node_path`.
    #[must_use]
    pub fn has_channel(&self, node_path: &str, channel: Channel) -> bool {
        (0..channel.components()).all(|c| self.curve(node_path, channel, c).is_some())
    }

    #[must_use]
    pub fn sample(&self, node_path: &str, channel: Channel, component: usize, time: f32) -> Option<f32> {
        self.curve(node_path, channel, component)?.sample(time)
    }

    /// Evaluates all channels of `node_path` at `time`.
    ///
    /// Channels without curves keep their identity value. The sampled
    /// rotation is re-normalized since components are interpolated
    /// independently. Returns `None` when the path has no curves at all.
    #[must_use]
    pub fn sample_pose(&self, node_path: &str, time: f32) -> Option<Pose> {
        let curves = self.curves.get(node_path)?;
        if curves.is_empty() {
            return None;
        }

        let mut pose = Pose::IDENTITY;
        if let Some([x, y, z]) = self.sample_components::<3>(node_path, Channel::Translation, time) {
            pose.translation = Vec3::new(x, y, z);
        }
        if let Some(xyzw) = self.sample_components::<4>(node_path, Channel::Rotation, time) {
            pose.rotation = Quat::from_array(xyzw).normalize();
        }
        if let Some([x, y, z]) = self.sample_components::<3>(node_path, Channel::Scale, time) {
            pose.scale = Vec3::new(x, y, z);
        }
        Some(pose)
    }

    fn sample_components<const N: usize>(&self, node_path: &str, channel: Channel, time: f32) -> Option<[f32; N]> {
        let mut out = [0.0; N];
        for (component, value) in out.iter_mut().enumerate() {
            *value = self.sample(node_path, channel, component, time)?;
        }
        Some(out)
    }
}

impl CurveSink for CurveSet {
    fn clear_channel(&mut self, node_path: &str, channel: Channel) {
        if let Some(curves) = self.curves.get_mut(node_path) {
            curves.retain(|(c, _), _| *c != channel);
        }
    }

    fn set_curve(&mut self, node_path: &str, channel: Channel, component: usize, curve: KeyframeTrack<f32>) {
        self.curves
            .entry(node_path.to_string())
            .or_default()
            .insert((channel, component), curve);
    }
}
