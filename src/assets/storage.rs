//! Clip files.
//!
//! Captured clips are stored as pretty-printed JSON:
//!
//! ```json
//! {
//!   "name": "Recording",
//!   "timeline": [0.0, 0.033],
//!   "tracks": [
//!     { "node_path": "Hips", "poses": [ { "translation": [0, 1, 0], "rotation": [0, 0, 0, 1], "scale": [1, 1, 1] } ] }
//!   ]
//! }
//! ```
//!
//! Loading re-validates every [`AnimationData`] invariant, so a hand-edited
//! file with uneven tracks is rejected instead of producing a broken clip.

use std::fs;
use std::path::Path;

use crate::animation::AnimationData;
use crate::errors::Result;

impl AnimationData {
    /// Serializes the clip to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a clip.
    pub fn from_json(text: &str) -> Result<Self> {
        let data: AnimationData = serde_json::from_str(text)?;
        data.validate()?;
        Ok(data)
    }
}

/// Writes `data` to `path`, replacing any existing file.
pub fn save_clip(data: &AnimationData, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, data.to_json()?)?;
    log::info!(
        "Saved clip '{}' ({} tracks, {} frames) to {}",
        data.name,
        data.track_count(),
        data.frame_count(),
        path.display()
    );
    Ok(())
}

/// Reads a clip written by [`save_clip`].
pub fn load_clip(path: impl AsRef<Path>) -> Result<AnimationData> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    AnimationData::from_json(&text).inspect_err(|err| {
        log::error!("Failed to load clip from {}: {err}", path.display());
    })
}
