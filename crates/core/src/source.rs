//! Collaborator traits for artwork bytes and decoding
//!
//! The cache owns neither storage access nor an image codec. Raw bytes come
//! from an [`ArtworkSource`] (library/disk access) and are turned into
//! display-sized bitmaps by an [`ArtworkDecoder`]. Both are called from
//! worker threads and must be `Send + Sync`; decode failures are returned
//! as typed errors, never thrown or panicked.

use crate::error::LoadError;
use artgrid_cache::{Bitmap, ItemKey};

/// Requested bitmap dimensions for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl TargetSize {
    /// Create a target size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square target, the common case for a tile grid.
    pub fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }
}

/// Provider of raw artwork bytes for an item.
///
/// Implemented by the media-library collaborator. Called on worker
/// threads; expected to be slow (disk access).
pub trait ArtworkSource: Send + Sync {
    /// Fetch the raw encoded artwork for an item.
    ///
    /// Returns [`LoadError::SourceUnavailable`] when the item has no
    /// artwork; that outcome is terminal for the current generation.
    fn fetch(&self, item: ItemKey) -> Result<Vec<u8>, LoadError>;
}

/// External image decode primitive.
///
/// Turns raw encoded bytes into a pixel buffer resized/cropped to the
/// target. Called on worker threads.
pub trait ArtworkDecoder: Send + Sync {
    /// Decode and resize raw bytes to the target size.
    fn decode_and_resize(&self, bytes: &[u8], target: TargetSize) -> Result<Bitmap, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_target() {
        let target = TargetSize::square(160);
        assert_eq!(target.width, 160);
        assert_eq!(target.height, 160);
    }
}
