use serde::{Deserialize, Serialize};

/// A pose channel a curve can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    Translation, // Maps to transform.position
    Rotation,    // Maps to transform.rotation (x, y, z, w)
    Scale,       // Maps to transform.scale
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Translation, Channel::Rotation, Channel::Scale];

    /// Number of scalar components stored for this channel.
    #[inline]
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            Channel::Rotation => 4,
            Channel::Translation | Channel::Scale => 3,
        }
    }
}

/// Binding relationship: maps track `track_index` of an
/// [`AnimationData`](crate::animation::AnimationData) to the live node it
/// is replayed onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackBinding<H> {
    pub track_index: usize,
    pub node: H,
}
