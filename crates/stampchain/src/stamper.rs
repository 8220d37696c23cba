//! The Stamper: unified API for creating and checking timestamp proofs.
//!
//! The Stamper brings together proof storage, calendar servers and block
//! header lookups behind one interface.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stampchain_calendar::{BlockHeaderSource, CalendarError, CalendarPool, DEFAULT_TIMEOUT};
use stampchain_core::{
    sha256, verify_chain, BlockHeader, Digest, MerkleProof, Operation, ProofChain, ProofSummary,
    VerificationReport,
};
use stampchain_store::{proof_key, InsertResult, Store};
use tracing::{debug, info, warn};

use crate::error::{Result, StampError};

/// Configuration for the Stamper.
#[derive(Debug, Clone)]
pub struct StamperConfig {
    /// How long each calendar gets to answer.
    pub calendar_timeout: Duration,
    /// Whether stamped and upgraded proofs are written to the store.
    pub persist_proofs: bool,
    /// Whether block headers are looked up in and written to the store.
    pub use_header_cache: bool,
}

impl Default for StamperConfig {
    fn default() -> Self {
        Self {
            calendar_timeout: DEFAULT_TIMEOUT,
            persist_proofs: true,
            use_header_cache: true,
        }
    }
}

/// Outcome of an upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    /// Attestations appended to the chain.
    pub added: usize,
    /// Calendars that answered.
    pub succeeded: Vec<String>,
    /// Calendars that failed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Set when the chain was left unchanged because no calendar answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl UpgradeReport {
    pub fn is_unchanged(&self) -> bool {
        self.added == 0
    }
}

/// The main Stamper struct.
///
/// Provides a unified API for:
/// - Stamping files and digests
/// - Upgrading proofs with further attestations
/// - Verifying proofs, fetching block headers when needed
/// - Reading, writing and merging proof files
pub struct Stamper<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Calendar servers.
    pool: CalendarPool,
    /// Where block headers come from when the cache misses.
    headers: Option<Arc<dyn BlockHeaderSource>>,
    /// Configuration.
    config: StamperConfig,
}

impl<S: Store> Stamper<S> {
    /// Create a new stamper.
    ///
    /// The pool's timeout is replaced by the configured one.
    pub fn new(store: S, pool: CalendarPool, config: StamperConfig) -> Self {
        Self {
            store: Arc::new(store),
            pool: pool.with_timeout(config.calendar_timeout),
            headers: None,
            config,
        }
    }

    /// Use `source` to fetch block headers during verification.
    pub fn with_header_source(mut self, source: Arc<dyn BlockHeaderSource>) -> Self {
        self.headers = Some(source);
        self
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pool(&self) -> &CalendarPool {
        &self.pool
    }

    pub fn config(&self) -> &StamperConfig {
        &self.config
    }

    /// The configured calendar endpoints.
    pub fn pools(&self) -> Vec<&str> {
        self.pool.endpoints()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stamping
    // ─────────────────────────────────────────────────────────────────────────

    /// Stamp the SHA-256 of `data`.
    pub async fn stamp_bytes(&self, data: &[u8]) -> Result<ProofChain> {
        self.stamp_digest(sha256(data)).await
    }

    /// Stamp a digest computed elsewhere.
    pub async fn stamp_digest(&self, digest: Digest) -> Result<ProofChain> {
        self.submit(ProofChain::from_digest(digest)).await
    }

    /// Obtain one calendar attestation for `chain`'s leaf and append it.
    ///
    /// A chain without a start digest is submitted under the digest its
    /// operations fold to from the empty string.
    pub async fn submit(&self, mut chain: ProofChain) -> Result<ProofChain> {
        let leaf = chain.compute_leaf_digest()?;
        let attestation = self.pool.stamp(&leaf).await?;

        chain.push(Operation::CalendarCommit(attestation.payload));
        info!(%leaf, endpoint = %attestation.endpoint, "stamped");

        self.persist(&chain).await?;
        Ok(chain)
    }

    /// Append attestations from every calendar that answers.
    ///
    /// Attestations the chain already carries are skipped. When no calendar
    /// answers, the chain is left untouched and the report carries a warning.
    /// `chain` is only modified once the upgraded proof has been persisted.
    pub async fn upgrade(&self, chain: &mut ProofChain) -> Result<UpgradeReport> {
        let leaf = chain.compute_leaf_digest()?;
        let collected = self.pool.collect(&leaf).await;

        let mut report = UpgradeReport {
            added: 0,
            succeeded: collected.succeeded,
            failed: collected.failed,
            warning: None,
        };

        if collected.attestations.is_empty() {
            let warning = match self.pool.len() {
                0 => CalendarError::NoEndpoints.to_string(),
                attempts => format!("no calendar answered ({} tried), proof unchanged", attempts),
            };
            warn!(%leaf, "{}", warning);
            report.warning = Some(warning);
            return Ok(report);
        }

        let mut upgraded = chain.clone();
        for attestation in collected.attestations {
            let known = upgraded
                .calendar_attestations()
                .into_iter()
                .any(|existing| *existing == attestation.payload);
            if known {
                debug!(%leaf, endpoint = %attestation.endpoint, "attestation already present");
                continue;
            }
            upgraded.push(Operation::CalendarCommit(attestation.payload));
            report.added += 1;
        }

        if report.added > 0 {
            self.persist(&upgraded).await?;
            info!(%leaf, added = report.added, "upgraded proof");
            *chain = upgraded;
        }
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify every attestation in `chain`.
    ///
    /// `leaf` is used when the chain has no start digest. Bitcoin attestations
    /// without a header are re-checked against the header of the block
    /// containing `txid`; the chain itself never names the transaction of an
    /// attestation that lacks a header. A header that cannot be fetched leaves
    /// the attestation unresolved.
    pub async fn verify(
        &self,
        chain: &ProofChain,
        leaf: Option<&Digest>,
        txid: Option<&Digest>,
    ) -> Result<VerificationReport> {
        let mut report = verify_chain(chain, leaf)?;

        let missing: Vec<usize> = report.missing_headers().map(|a| a.position).collect();
        if missing.is_empty() {
            return Ok(report);
        }
        let Some(tx) = txid.copied() else {
            debug!(count = missing.len(), "no transaction id for bitcoin attestations");
            return Ok(report);
        };

        if let Some(header) = self.block_header(&tx).await? {
            for position in missing {
                let status =
                    report.resolve_with_header(position, &header, &MerkleProof::default())?;
                debug!(position, txid = %tx, ?status, "checked fetched header");
            }
        }

        Ok(report)
    }

    /// Header of the block containing `txid`, from the cache or the source.
    ///
    /// Source failures are logged and reported as `None`.
    async fn block_header(&self, txid: &Digest) -> Result<Option<BlockHeader>> {
        if self.config.use_header_cache {
            if let Some(header) = self.store.get_block_header(txid).await? {
                debug!(%txid, "block header cache hit");
                return Ok(Some(header));
            }
        }

        let Some(source) = &self.headers else {
            debug!(%txid, "no block header source configured");
            return Ok(None);
        };

        match source.header_for_tx(txid).await {
            Ok(header) => {
                if self.config.use_header_cache {
                    self.store.put_block_header(txid, &header).await?;
                }
                Ok(Some(header))
            }
            Err(e) => {
                warn!(%txid, error = %e, "block header unavailable");
                Ok(None)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Proof files
    // ─────────────────────────────────────────────────────────────────────────

    /// Describe a chain.
    pub fn info(&self, chain: &ProofChain) -> ProofSummary {
        chain.summary()
    }

    /// Summary of the stored proof for `leaf`, if any.
    pub async fn status(&self, leaf: &Digest) -> Result<Option<ProofSummary>> {
        Ok(self
            .store
            .get_proof(leaf)
            .await?
            .map(|chain| chain.summary()))
    }

    /// Concatenate `chains` in order into one.
    pub fn merge(&self, chains: &[ProofChain]) -> Result<ProofChain> {
        let (first, rest) = chains
            .split_first()
            .ok_or_else(|| StampError::InvalidOperation("no proofs to merge".into()))?;
        let mut merged = first.clone();
        for chain in rest {
            merged.merge(chain)?;
        }
        debug!(inputs = chains.len(), ops = merged.len(), "merged proofs");
        Ok(merged)
    }

    /// Read a proof file.
    pub fn load(&self, bytes: &[u8]) -> Result<ProofChain> {
        Ok(ProofChain::deserialize(bytes)?)
    }

    /// Write a proof file, persisting the chain when configured.
    pub async fn save(&self, chain: &ProofChain) -> Result<Vec<u8>> {
        self.persist(chain).await?;
        Ok(chain.serialize())
    }

    async fn persist(&self, chain: &ProofChain) -> Result<Option<InsertResult>> {
        if !self.config.persist_proofs {
            return Ok(None);
        }
        match self.store.put_proof(chain).await? {
            InsertResult::Conflict { existing_len } => Err(StampError::Conflict {
                leaf: proof_key(chain)?,
                existing_len,
            }),
            result => {
                debug!(?result, "persisted proof");
                Ok(Some(result))
            }
        }
    }
}
