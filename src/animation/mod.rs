//! Animation capture, playback and curve construction
//!
//! - [`Recorder`]: samples node poses at a fixed rate into [`AnimationData`]
//! - [`Player`]: replays captured frames onto a live hierarchy
//! - [`CurveConstructor`]: turns captured frames into per-component curves

mod values;
pub mod binder;
pub mod binding;
pub mod curves;
pub mod data;
pub mod player;
pub mod pose;
pub mod recorder;
pub mod tracks;

pub use binder::Binder;
pub use binding::{Channel, TrackBinding};
pub use curves::{CurveConstructor, CurveSet, CurveSink};
pub use data::{AnimationData, NodeTrack};
pub use player::{Player, PlayerSettings};
pub use pose::Pose;
pub use recorder::{
    CaptureSpace, DEFAULT_CAPTURE_RATE, MIN_CAPTURE_INTERVAL, Recorder, RecorderSettings, RecorderState,
    TrackSelection,
};
pub use tracks::{InterpolationMode, KeyframeTrack};
pub use values::Interpolatable;
