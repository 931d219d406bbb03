//! Error Types
//!
//! This module defines the error type shared by the recorder, player,
//! clip storage and scene exporter.
//!
//! # Overview
//!
//! [`MotionError`] is grouped the same way failures are handled:
//! - Invalid arguments (bad frame index, empty clip, bad range), always
//!   rejected before any state is touched
//! - Unavailable resources (unreadable mesh, missing texture, unsupported
//!   export target)
//! - Data inconsistencies (track length mismatch, unmapped bone, duplicate
//!   track path)
//! - I/O and encoder failures
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, MotionError>`.
//!
//! ```rust,ignore
//! use mocap::errors::{MotionError, Result};
//!
//! fn trim(data: &mut AnimationData) -> Result<()> {
//!     data.delete_frame(0)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for capture, playback and export.
#[derive(Error, Debug)]
pub enum MotionError {
    // ========================================================================
    // Invalid Arguments
    // ========================================================================
    /// A frame index outside `[0, frame_count)`.
    #[error("Frame {frame} out of range (frame count: {frame_count})")]
    FrameOutOfRange {
        /// The rejected frame index
        frame: usize,
        /// Number of frames in the clip
        frame_count: usize,
    },

    /// A frame range that is empty, reversed or out of bounds.
    #[error("Invalid frame range {start}..={end} (frame count: {frame_count})")]
    InvalidFrameRange {
        start: usize,
        end: usize,
        frame_count: usize,
    },

    /// An operation needed animation data but none is loaded.
    #[error("No animation data loaded")]
    NoAnimationData,

    /// The recorder was used before `initialize`.
    #[error("Recorder has not been initialized")]
    RecorderNotInitialized,

    /// A node handle does not exist in the scene.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A timestamp would break the non-decreasing timeline.
    #[error("Timestamp {time} precedes last frame time {last}")]
    NonMonotonicTime { time: f32, last: f32 },

    /// A timestamp is NaN or infinite.
    #[error("Timestamp {0} is not finite")]
    NonFiniteTime(f32),

    // ========================================================================
    // Resource Unavailable
    // ========================================================================
    /// Mesh geometry is not CPU-readable.
    #[error("Mesh '{0}' is not readable")]
    MeshNotReadable(String),

    /// A material references a texture without pixel data.
    #[error("Texture '{0}' has no pixel data")]
    TextureMissing(String),

    /// The export target cannot be produced on this platform.
    #[error("Export target unsupported: {0}")]
    ExportUnsupported(String),

    // ========================================================================
    // Data Inconsistency
    // ========================================================================
    /// A track's pose count differs from the timeline length.
    #[error("Track '{path}' has {poses} poses but the timeline has {frames} frames")]
    TrackLengthMismatch {
        path: String,
        poses: usize,
        frames: usize,
    },

    /// Two tracks share a node path.
    #[error("Duplicate track path: '{0}'")]
    DuplicateTrack(String),

    /// A skin bone has no exported node.
    #[error("Bone '{0}' is not part of the exported hierarchy")]
    BoneNotMapped(String),

    // ========================================================================
    // I/O & Encoder Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Image encoding error.
    #[error("Image encode error: {0}")]
    ImageEncodeError(String),

    /// The scene encoder reported a non-zero result code.
    #[error("Scene encoder failed with code {code}: {message}")]
    EncoderFailed { code: i32, message: String },
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for MotionError {
    fn from(err: image::ImageError) -> Self {
        MotionError::ImageEncodeError(err.to_string())
    }
}

/// Alias for `Result<T, MotionError>`.
pub type Result<T> = std::result::Result<T, MotionError>;
