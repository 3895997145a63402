//! Remote-first compression with local fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use super::DigestBackend;
use crate::compression::ThreadCompressor;
use crate::model::{Digest, Thread};

/// Remote backend state for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteStatus {
    pub configured: bool,
    pub healthy: bool,
    pub backend: Option<String>,
}

/// Uses the remote backend while it is healthy, the local compressor
/// otherwise. A digest is always wholly remote or wholly local.
pub struct HybridCompressor {
    remote: Option<Arc<dyn DigestBackend>>,
    remote_healthy: AtomicBool,
    local: ThreadCompressor,
}

impl HybridCompressor {
    /// Local compression only.
    pub fn local_only(local: ThreadCompressor) -> Self {
        Self {
            remote: None,
            remote_healthy: AtomicBool::new(false),
            local,
        }
    }

    /// Probe the backend once; an unhealthy backend is skipped until
    /// [`refresh_health`](Self::refresh_health) sees it come back.
    pub async fn new(remote: Option<Arc<dyn DigestBackend>>, local: ThreadCompressor) -> Self {
        let healthy = match &remote {
            Some(backend) => {
                let healthy = backend.healthy().await;
                info!(backend = backend.name(), healthy, "Remote digest backend probed");
                healthy
            }
            None => false,
        };
        Self {
            remote,
            remote_healthy: AtomicBool::new(healthy),
            local,
        }
    }

    pub fn local(&self) -> &ThreadCompressor {
        &self.local
    }

    pub fn status(&self) -> RemoteStatus {
        RemoteStatus {
            configured: self.remote.is_some(),
            healthy: self.remote_healthy.load(Ordering::Relaxed),
            backend: self.remote.as_ref().map(|b| b.name().to_string()),
        }
    }

    /// Re-probe the backend and report the new status.
    pub async fn refresh_health(&self) -> RemoteStatus {
        if let Some(backend) = &self.remote {
            let healthy = backend.healthy().await;
            self.remote_healthy.store(healthy, Ordering::Relaxed);
        }
        self.status()
    }

    /// Remote digest when possible, local digest otherwise.
    pub async fn digest(&self, thread: &Thread) -> Digest {
        if let Some(backend) = self.usable_remote() {
            match backend.digest(thread).await {
                Ok(digest) => return digest,
                Err(e) => {
                    warn!(
                        thread_id = %thread.thread_id,
                        backend = backend.name(),
                        error = %e,
                        "Remote digest failed, falling back to local compression"
                    );
                }
            }
        }
        self.local.digest(thread)
    }

    /// Compress in place and hand the thread back.
    pub async fn compress<'a>(&self, thread: &'a mut Thread) -> &'a mut Thread {
        let digest = self.digest(thread).await;
        info!(
            thread_id = %thread.thread_id,
            messages = thread.message_count(),
            ratio = digest.compression_ratio,
            "Thread compressed"
        );
        thread.apply_digest(digest);
        thread
    }

    fn usable_remote(&self) -> Option<&Arc<dyn DigestBackend>> {
        self.remote
            .as_ref()
            .filter(|_| self.remote_healthy.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::error::RemoteError;
    use crate::model::{Address, Message, TimelineEvent};

    /// Stub backend with a fixed health answer and digest result.
    struct StubBackend {
        healthy: AtomicBool,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn new(healthy: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(healthy),
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DigestBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        async fn healthy(&self) -> bool {
            self.healthy.load(Ordering::Relaxed)
        }

        async fn digest(&self, _thread: &Thread) -> Result<Digest, RemoteError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(RemoteError::RequestFailed {
                    backend: "stub".into(),
                    reason: "boom".into(),
                });
            }
            Ok(Digest {
                summary: "remote summary".into(),
                key_decisions: vec!["remote decision".into()],
                original_token_count: 100,
                compressed_token_count: 5,
                compression_ratio: 95.0,
                ..Default::default()
            })
        }
    }

    fn make_thread() -> Thread {
        let msg = Message::new(
            "m-1",
            "t-1",
            "Plan",
            Address::new("alice@example.com"),
            "We agreed to freeze the API on Friday. Deadline: 3/4/2026",
            Utc::now(),
        );
        Thread::new("t-1", "Plan", vec![], vec![msg])
    }

    #[tokio::test]
    async fn healthy_remote_replaces_every_field() {
        let stub = StubBackend::new(true, false);
        let hybrid = HybridCompressor::new(Some(stub.clone()), ThreadCompressor::default()).await;
        let mut thread = make_thread();
        thread.timeline.push(TimelineEvent {
            date: Utc::now(),
            event: "stale".into(),
        });

        hybrid.compress(&mut thread).await;

        assert_eq!(stub.calls.load(Ordering::Relaxed), 1);
        assert_eq!(thread.compressed_summary.as_deref(), Some("remote summary"));
        assert_eq!(thread.key_decisions, vec!["remote decision"]);
        assert!(thread.timeline.is_empty());
        assert!(thread.unresolved_questions.is_empty());
        assert_eq!(thread.compression_ratio, 95.0);
    }

    #[tokio::test]
    async fn remote_error_falls_back_to_local() {
        let stub = StubBackend::new(true, true);
        let hybrid = HybridCompressor::new(Some(stub.clone()), ThreadCompressor::default()).await;
        let thread = make_thread();

        let digest = hybrid.digest(&thread).await;

        assert_eq!(stub.calls.load(Ordering::Relaxed), 1);
        assert_eq!(digest, hybrid.local().digest(&thread));
        assert!(digest.summary.starts_with("KEY DECISIONS:"));
        assert!(!digest.timeline.is_empty());
    }

    #[tokio::test]
    async fn unhealthy_remote_is_never_called() {
        let stub = StubBackend::new(false, false);
        let hybrid = HybridCompressor::new(Some(stub.clone()), ThreadCompressor::default()).await;

        hybrid.digest(&make_thread()).await;

        assert_eq!(stub.calls.load(Ordering::Relaxed), 0);
        assert_eq!(
            hybrid.status(),
            RemoteStatus {
                configured: true,
                healthy: false,
                backend: Some("stub".into()),
            }
        );
    }

    #[tokio::test]
    async fn refresh_picks_up_recovery() {
        let stub = StubBackend::new(false, false);
        let hybrid = HybridCompressor::new(Some(stub.clone()), ThreadCompressor::default()).await;

        stub.healthy.store(true, Ordering::Relaxed);
        assert!(hybrid.refresh_health().await.healthy);

        let digest = hybrid.digest(&make_thread()).await;
        assert_eq!(digest.summary, "remote summary");
    }

    #[tokio::test]
    async fn local_only_status() {
        let hybrid = HybridCompressor::local_only(ThreadCompressor::default());
        let status = hybrid.refresh_health().await;
        assert!(!status.configured);
        assert!(!status.healthy);
        assert!(status.backend.is_none());
    }
}
