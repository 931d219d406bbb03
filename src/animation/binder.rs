use crate::animation::binding::TrackBinding;
use crate::animation::data::AnimationData;
use crate::scene::SceneGraph;

pub struct Binder;

impl Binder {
    /// Resolves every track path of `data` below `root` to a live node.
    ///
    /// Tracks whose path does not resolve get no binding; the player skips
    /// them, so a target hierarchy only needs to share the recorded paths it
    /// wants driven.
    pub fn bind<S: SceneGraph>(scene: &S, root: S::Handle, data: &AnimationData) -> Vec<TrackBinding<S::Handle>> {
        let mut bindings = Vec::with_capacity(data.track_count());
        let mut unresolved = 0usize;

        for (track_index, track) in data.tracks().iter().enumerate() {
            match scene.find_by_path(root, &track.node_path) {
                Some(node) => bindings.push(TrackBinding { track_index, node }),
                None => unresolved += 1,
            }
        }

        if unresolved > 0 {
            log::debug!(
                "{unresolved} of {} tracks of '{}' have no matching node below {root:?}",
                data.track_count(),
                data.name
            );
        }
        bindings
    }
}
