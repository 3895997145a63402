//! Remote digest backends.
//!
//! A [`DigestBackend`] produces the same [`Digest`] the local compressor
//! does, over the network. [`HybridCompressor`] prefers a healthy backend
//! and falls back to local compression on any failure.

mod client;
mod hybrid;

pub use client::RemoteCompressor;
pub use hybrid::{HybridCompressor, RemoteStatus};

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::model::{Digest, Thread};

/// A service that can digest a whole thread.
#[async_trait]
pub trait DigestBackend: Send + Sync {
    /// Short name for logs and status output.
    fn name(&self) -> &str;

    /// Whether the backend is reachable and ready.
    async fn healthy(&self) -> bool;

    /// Digest a thread. The result replaces every compression field.
    async fn digest(&self, thread: &Thread) -> Result<Digest, RemoteError>;
}
