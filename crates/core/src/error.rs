//! Error taxonomy for artwork loading
//!
//! Every failure resolves to "no bitmap" at the delivery boundary; the
//! renderer only ever sees `Option<Bitmap>` and draws a placeholder. What
//! the taxonomy decides is whether an item may be re-dispatched: terminal
//! failures are resolved for the rest of the generation, transient ones
//! are retried on a later dispatch cycle.

use thiserror::Error;

/// Why an artwork load produced no bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The source has no artwork for this item.
    #[error("no artwork available at the source")]
    SourceUnavailable,

    /// The source bytes could not be decoded (corrupt or unsupported image).
    #[error("artwork decode failed: {0}")]
    DecodeFailed(String),

    /// The job was invalidated by a generation bump or shutdown before
    /// decoding.
    #[error("load cancelled")]
    Cancelled,

    /// Allocation failure during decode or resize.
    #[error("resource exhaustion during decode")]
    ResourceExhausted,
}

impl LoadError {
    /// Terminal failures mark the item resolved-without-bitmap for the
    /// rest of the current generation; transient ones may be retried on a
    /// later dispatch cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadError::SourceUnavailable | LoadError::DecodeFailed(_))
    }
}
