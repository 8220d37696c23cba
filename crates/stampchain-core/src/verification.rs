//! Whole-chain verification.
//!
//! [`verify_chain`] computes the attestation root of a chain once and then
//! reports on every attestation independently, so one failing attestation
//! does not hide the status of the others.

use serde::{Deserialize, Serialize};

use crate::bitcoin::{check_bitcoin_commitment, BlockHeader, FailureReason, Verdict};
use crate::chain::{BitcoinAttestation, ProofChain};
use crate::error::{CoreError, Result};
use crate::merkle::MerkleProof;
use crate::op::Operation;
use crate::types::Digest;

/// State of a single attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttestationStatus {
    /// Calendar promise, not yet anchored anywhere checkable.
    Pending,
    Verified,
    Failed { reason: FailureReason },
    /// Bitcoin commitment with no block header to check against.
    HeaderMissing,
}

impl From<Verdict> for AttestationStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Verified => AttestationStatus::Verified,
            Verdict::Failed(reason) => AttestationStatus::Failed { reason },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationKind {
    Calendar,
    Bitcoin,
}

/// Status of one attestation, keyed by its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationReport {
    pub position: usize,
    pub kind: AttestationKind,
    pub status: AttestationStatus,
    /// OP_RETURN commitment, for Bitcoin attestations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<Digest>,
    /// Committing transaction, for Bitcoin attestations that carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<Digest>,
}

/// Per-attestation verification results for a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub leaf_digest: Digest,
    pub attestation_root: Digest,
    pub attestations: Vec<AttestationReport>,
}

impl VerificationReport {
    /// At least one attestation verified and none failed.
    pub fn is_verified(&self) -> bool {
        self.attestations
            .iter()
            .any(|a| a.status == AttestationStatus::Verified)
            && self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AttestationReport> {
        self.attestations
            .iter()
            .filter(|a| matches!(a.status, AttestationStatus::Failed { .. }))
    }

    pub fn pending(&self) -> impl Iterator<Item = &AttestationReport> {
        self.attestations
            .iter()
            .filter(|a| a.status == AttestationStatus::Pending)
    }

    /// Bitcoin attestations still waiting for a header.
    pub fn missing_headers(&self) -> impl Iterator<Item = &AttestationReport> {
        self.attestations
            .iter()
            .filter(|a| a.status == AttestationStatus::HeaderMissing)
    }

    /// Re-check the Bitcoin attestation at `position` against a header
    /// obtained elsewhere, replacing its status.
    ///
    /// Returns the new status, or `None` if no Bitcoin attestation sits at
    /// `position`.
    pub fn resolve_with_header(
        &mut self,
        position: usize,
        header: &BlockHeader,
        proof: &MerkleProof,
    ) -> Result<Option<AttestationStatus>> {
        let root = self.attestation_root;
        let Some(entry) = self
            .attestations
            .iter_mut()
            .find(|a| a.position == position && a.kind == AttestationKind::Bitcoin)
        else {
            return Ok(None);
        };
        let Some(commitment) = entry.commitment else {
            return Ok(None);
        };
        let verdict =
            check_bitcoin_commitment(&root, &commitment, header.as_bytes(), &proof.siblings)?;
        entry.status = verdict.into();
        Ok(Some(entry.status.clone()))
    }
}

/// Check one Bitcoin attestation against the chain's attestation root.
///
/// The chain carries no transaction Merkle proof, so the commitment must
/// sit directly in the header unless `proof` supplies the siblings.
pub fn check_bitcoin_attestation(
    root: &Digest,
    attestation: &BitcoinAttestation,
    proof: &MerkleProof,
) -> Result<AttestationStatus> {
    match &attestation.header {
        Some(header) => Ok(check_bitcoin_commitment(
            root,
            &attestation.commitment,
            header.as_bytes(),
            &proof.siblings,
        )?
        .into()),
        None => Ok(AttestationStatus::HeaderMissing),
    }
}

/// Verify every attestation in `chain`.
///
/// The leaf comes from the chain's start digest when set, otherwise from
/// `leaf`. Failing to compute the root is an error; a failed attestation is
/// not.
pub fn verify_chain(chain: &ProofChain, leaf: Option<&Digest>) -> Result<VerificationReport> {
    let attestation_root = chain.merkle_root(leaf)?;
    let start = chain
        .start_digest()
        .or(leaf)
        .ok_or(CoreError::digest_length(0))?;
    let leaf_digest = Digest::from_slice(&chain.fold_digest(start))?;

    let mut attestations: Vec<AttestationReport> = chain
        .operations()
        .iter()
        .enumerate()
        .filter(|(_, op)| matches!(op, Operation::CalendarCommit(_)))
        .map(|(position, _)| AttestationReport {
            position,
            kind: AttestationKind::Calendar,
            status: AttestationStatus::Pending,
            commitment: None,
            tx_hash: None,
        })
        .collect();

    for attestation in chain.bitcoin_attestations() {
        let status =
            check_bitcoin_attestation(&attestation_root, &attestation, &MerkleProof::default())?;
        attestations.push(AttestationReport {
            position: attestation.position,
            kind: AttestationKind::Bitcoin,
            status,
            commitment: Some(attestation.commitment),
            tx_hash: attestation.tx_hash,
        });
    }
    attestations.sort_by_key(|a| a.position);

    Ok(VerificationReport {
        leaf_digest,
        attestation_root,
        attestations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitcoin::MERKLE_ROOT_RANGE;
    use crate::crypto::sha256;

    fn header_committing(commitment: &Digest) -> BlockHeader {
        let mut bytes = [0u8; 80];
        bytes[MERKLE_ROOT_RANGE].copy_from_slice(commitment.as_bytes());
        BlockHeader::from_bytes(bytes)
    }

    /// A chain whose Bitcoin attestation commits to its own root.
    fn anchored_chain() -> (ProofChain, Digest) {
        let leaf = Digest::from_bytes([0x21; 32]);
        let mut chain = ProofChain::from_digest(leaf);
        chain.push(Operation::calendar_commit(b"pending".to_vec()));
        let root = chain.merkle_root(None).unwrap();
        let commitment = sha256(root.as_bytes());
        chain.push(Operation::OpReturnCommit(commitment));
        chain.push(Operation::BitcoinBlockHeader {
            header: header_committing(&commitment),
            tx_hash: None,
        });
        (chain, root)
    }

    #[test]
    fn test_calendar_only_is_pending() {
        let mut chain = ProofChain::from_digest(Digest::from_bytes([1; 32]));
        chain.push(Operation::calendar_commit(b"a".to_vec()));
        chain.push(Operation::calendar_commit(b"b".to_vec()));

        let report = verify_chain(&chain, None).unwrap();
        assert_eq!(report.attestations.len(), 2);
        assert_eq!(report.pending().count(), 2);
        assert!(!report.is_verified());
    }

    #[test]
    fn test_bitcoin_attestation_verifies() {
        let (chain, root) = anchored_chain();
        let report = verify_chain(&chain, None).unwrap();
        assert_eq!(report.attestation_root, root);
        let bitcoin: Vec<_> = report
            .attestations
            .iter()
            .filter(|a| a.kind == AttestationKind::Bitcoin)
            .collect();
        assert_eq!(bitcoin.len(), 1);
        assert_eq!(bitcoin[0].status, AttestationStatus::Verified);
        assert!(report.is_verified());
    }

    #[test]
    fn test_failure_does_not_hide_other_attestations() {
        let (mut chain, _) = anchored_chain();
        chain.push(Operation::OpReturnCommit(Digest::from_bytes([0xde; 32])));
        chain.push(Operation::BitcoinBlockHeader {
            header: BlockHeader::from_bytes([0u8; 80]),
            tx_hash: None,
        });

        let report = verify_chain(&chain, None).unwrap();
        assert_eq!(report.attestations.len(), 3);
        assert_eq!(report.failures().count(), 1);
        assert!(report
            .attestations
            .iter()
            .any(|a| a.status == AttestationStatus::Verified));
        assert!(!report.is_verified());
    }

    #[test]
    fn test_missing_header_then_resolved() {
        let leaf = Digest::from_bytes([0x33; 32]);
        let mut chain = ProofChain::from_digest(leaf);
        let commitment = sha256(leaf.as_bytes());
        chain.push(Operation::OpReturnCommit(commitment));

        let mut report = verify_chain(&chain, None).unwrap();
        assert_eq!(report.missing_headers().count(), 1);

        let status = report
            .resolve_with_header(0, &header_committing(&commitment), &MerkleProof::default())
            .unwrap();
        assert_eq!(status, Some(AttestationStatus::Verified));
        assert!(report.is_verified());

        assert_eq!(
            report
                .resolve_with_header(7, &header_committing(&commitment), &MerkleProof::default())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_detached_chain_uses_supplied_leaf() {
        let mut chain = ProofChain::new();
        chain.push(Operation::Sha256);
        let leaf = Digest::from_bytes([0x44; 32]);
        let report = verify_chain(&chain, Some(&leaf)).unwrap();
        assert_eq!(report.leaf_digest, sha256(leaf.as_bytes()));
    }

    #[test]
    fn test_unfoldable_chain_is_error() {
        let mut chain = ProofChain::from_digest(Digest::from_bytes([1; 32]));
        chain.push(Operation::append(vec![0]));
        assert!(verify_chain(&chain, None).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let (chain, _) = anchored_chain();
        let report = verify_chain(&chain, None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["attestations"][0]["kind"], "calendar");
        assert_eq!(json["attestations"][0]["status"]["status"], "pending");
        assert_eq!(json["attestations"][1]["status"]["status"], "verified");
    }
}
