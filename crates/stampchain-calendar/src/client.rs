//! Collaborator traits for calendar servers and block header sources.
//!
//! Implementations may use HTTP, a local node, or anything else. The core
//! only ever sees the attestation bytes and the 80-byte headers they return.

use async_trait::async_trait;
use bytes::Bytes;
use stampchain_core::{BlockHeader, Digest};

use crate::error::Result;

/// A timestamping calendar server.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Base URL or other identifier of the server.
    fn endpoint(&self) -> &str;

    /// Submit a digest and return the raw attestation bytes.
    ///
    /// The bytes are opaque to the caller and end up wrapped in a
    /// `CalendarCommit` operation.
    async fn submit(&self, digest: &Digest) -> Result<Bytes>;
}

/// Looks up the block header that contains a transaction.
#[async_trait]
pub trait BlockHeaderSource: Send + Sync {
    /// Header of the block containing `txid`.
    ///
    /// Fails with `NotConfirmed` when the transaction is not in a block yet.
    async fn header_for_tx(&self, txid: &Digest) -> Result<BlockHeader>;
}

/// In-memory collaborators for testing.
///
/// Calendars answer deterministically and can be scripted to fail or stall.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::RwLock;

    use stampchain_core::sha256_pair;

    use crate::error::CalendarError;

    /// In-memory calendar server.
    pub struct MemoryCalendar {
        endpoint: String,
        delay: Option<Duration>,
        failing: AtomicBool,
        submissions: RwLock<Vec<Digest>>,
    }

    impl MemoryCalendar {
        /// Create a calendar that answers immediately.
        pub fn new(endpoint: impl Into<String>) -> Self {
            Self {
                endpoint: endpoint.into(),
                delay: None,
                failing: AtomicBool::new(false),
                submissions: RwLock::new(Vec::new()),
            }
        }

        /// Wait `delay` before every answer.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Start out refusing every request.
        pub fn failing(self) -> Self {
            self.failing.store(true, Ordering::SeqCst);
            self
        }

        /// Toggle failure at runtime.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// The attestation this calendar returns for `digest`.
        pub fn attestation_for(&self, digest: &Digest) -> Bytes {
            let tag = sha256_pair(self.endpoint.as_bytes(), digest.as_bytes());
            let mut out = Vec::with_capacity(self.endpoint.len() + 32);
            out.extend_from_slice(self.endpoint.as_bytes());
            out.extend_from_slice(tag.as_bytes());
            Bytes::from(out)
        }

        /// Digests received so far, in arrival order.
        pub async fn submissions(&self) -> Vec<Digest> {
            self.submissions.read().await.clone()
        }
    }

    #[async_trait]
    impl CalendarClient for MemoryCalendar {
        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        async fn submit(&self, digest: &Digest) -> Result<Bytes> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(CalendarError::Unavailable {
                    endpoint: self.endpoint.clone(),
                    reason: "scripted failure".into(),
                });
            }
            self.submissions.write().await.push(*digest);
            Ok(self.attestation_for(digest))
        }
    }

    /// In-memory block header source.
    #[derive(Default)]
    pub struct MemoryBlockSource {
        headers: RwLock<HashMap<Digest, BlockHeader>>,
        lookups: AtomicUsize,
    }

    impl MemoryBlockSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Mark `txid` as confirmed in the block with `header`.
        pub async fn confirm(&self, txid: Digest, header: BlockHeader) {
            self.headers.write().await.insert(txid, header);
        }

        /// Number of lookups served, successful or not.
        pub fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlockHeaderSource for MemoryBlockSource {
        async fn header_for_tx(&self, txid: &Digest) -> Result<BlockHeader> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.headers
                .read()
                .await
                .get(txid)
                .copied()
                .ok_or_else(|| CalendarError::NotConfirmed(txid.to_hex()))
        }
    }
}
