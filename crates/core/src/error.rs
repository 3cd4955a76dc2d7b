//! Typed errors for the tiling/merging geometry.
//!
//! Split and merge are pure functions; every failure here is a precondition
//! violation surfaced to the caller, never retried or recovered internally.
//! Session/model failures at the orchestration layer use `anyhow` instead.

/// Image axis, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// Image dimension smaller than the window along one axis — no valid
    /// placement exists, so the sweep would silently produce nothing.
    #[error("image too small for window on {axis} axis: dimension {dim} < window {win}")]
    DegenerateImage { axis: Axis, dim: usize, win: usize },

    /// Predicted batch length does not match the position sequence computed
    /// for the merge target shape.
    #[error("patch count mismatch: target shape requires {expected} patches, batch has {actual}")]
    PatchCountMismatch { expected: usize, actual: usize },

    /// Batch channel count differs from the merge target's channel count.
    #[error("channel mismatch: target has {expected} channels, batch has {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// Merge received a zero-length batch, so no window size can be inferred.
    #[error("cannot merge an empty patch batch")]
    EmptyBatch,
}
