//! Video decoding seam.
//!
//! Contract: a video decoder exposes the media's duration and the
//! ability to seek to an arbitrary timestamp in `[0, duration)` and
//! capture the visible frame. Container demuxing and codec work belong
//! to the embedding platform, so this crate defines the seam and ships
//! no demuxer of its own; hosts install a backend when they can decode
//! video, and submissions without one fail as undecodable.

use async_trait::async_trait;

use lucidscan_core::FrameSource;

use crate::error::ErrorCause;

/// Platform video decoding capability.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Parse `bytes` and return a seekable frame source for the stream.
    ///
    /// # Errors
    /// Any backend failure; the pipeline wraps it into a decode error
    /// for the video modality.
    async fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn FrameSource>, ErrorCause>;
}
