//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: memory calendars, memory block
//! sources and chains carrying Bitcoin attestations that check out.

use std::sync::Arc;

use stampchain_calendar::{
    BlockHeaderSource, CalendarClient, CalendarPool, MemoryBlockSource, MemoryCalendar,
};
use stampchain_core::bitcoin::MERKLE_ROOT_RANGE;
use stampchain_core::{sha256, BlockHeader, Digest, Operation, ProofChain, BLOCK_HEADER_LEN};

/// A block header whose Merkle root field is `root`.
pub fn header_with_root(root: &Digest) -> BlockHeader {
    let mut bytes = [0u8; BLOCK_HEADER_LEN];
    bytes[MERKLE_ROOT_RANGE].copy_from_slice(root.as_bytes());
    BlockHeader::from_bytes(bytes)
}

/// The OP_RETURN commitment and a header containing it, for a chain whose
/// attestation root is `root`.
pub fn bitcoin_anchor(root: &Digest) -> (Digest, BlockHeader) {
    let commitment = sha256(root.as_bytes());
    (commitment, header_with_root(&commitment))
}

/// A chain anchored to `leaf` with one calendar attestation per payload.
pub fn calendar_chain<P: AsRef<[u8]>>(leaf: Digest, payloads: &[P]) -> ProofChain {
    let mut chain = ProofChain::from_digest(leaf);
    for payload in payloads {
        chain.push(Operation::calendar_commit(payload.as_ref().to_vec()));
    }
    chain
}

/// Append an OP_RETURN commitment for `chain`'s current attestation root.
///
/// With `with_header` the matching block header follows it; without, the
/// attestation is left waiting for a header.
///
/// # Panics
///
/// If the chain does not fold to a 32-byte leaf.
pub fn anchor_in_bitcoin(chain: &mut ProofChain, with_header: bool) -> BlockHeader {
    let root = chain
        .merkle_root(None)
        .expect("anchored chain must fold to a digest");
    let (commitment, header) = bitcoin_anchor(&root);
    chain.push(Operation::OpReturnCommit(commitment));
    if with_header {
        chain.push(Operation::BitcoinBlockHeader {
            header,
            tx_hash: None,
        });
    }
    header
}

/// A set of memory calendars with handles for scripting them.
pub struct CalendarFixture {
    pub calendars: Vec<Arc<MemoryCalendar>>,
    pub blocks: Arc<MemoryBlockSource>,
}

impl CalendarFixture {
    /// One calendar per endpoint, all answering immediately.
    pub fn new(endpoints: &[&str]) -> Self {
        Self::from_calendars(endpoints.iter().map(|e| MemoryCalendar::new(*e)).collect())
    }

    pub fn from_calendars(calendars: Vec<MemoryCalendar>) -> Self {
        Self {
            calendars: calendars.into_iter().map(Arc::new).collect(),
            blocks: Arc::new(MemoryBlockSource::new()),
        }
    }

    /// A pool over every calendar, in order.
    pub fn pool(&self) -> CalendarPool {
        CalendarPool::new(
            self.calendars
                .iter()
                .map(|c| Arc::clone(c) as Arc<dyn CalendarClient>)
                .collect(),
        )
    }

    /// The block source as a trait object.
    pub fn block_source(&self) -> Arc<dyn BlockHeaderSource> {
        Arc::clone(&self.blocks) as Arc<dyn BlockHeaderSource>
    }

    pub fn calendar(&self, index: usize) -> &MemoryCalendar {
        &self.calendars[index]
    }

    /// Make every calendar fail or recover.
    pub fn set_all_failing(&self, failing: bool) {
        for calendar in &self.calendars {
            calendar.set_failing(failing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampchain_core::{verify_chain, AttestationStatus};

    #[test]
    fn test_anchored_chain_verifies() {
        let mut chain = calendar_chain(Digest::from_bytes([3; 32]), &[b"a", b"b"]);
        anchor_in_bitcoin(&mut chain, true);

        let report = verify_chain(&chain, None).unwrap();
        assert!(report.is_verified());
    }

    #[test]
    fn test_anchor_without_header_is_missing() {
        let mut chain = calendar_chain(Digest::from_bytes([3; 32]), &[b"a"]);
        let header = anchor_in_bitcoin(&mut chain, false);

        let report = verify_chain(&chain, None).unwrap();
        assert_eq!(report.missing_headers().count(), 1);
        assert_eq!(header.merkle_root(), sha256(report.attestation_root.as_bytes()));
        assert!(report
            .attestations
            .iter()
            .all(|a| a.status != AttestationStatus::Verified));
    }

    #[tokio::test]
    async fn test_calendar_fixture_pool() {
        let fixture = CalendarFixture::new(&["https://a.example", "https://b.example"]);
        let pool = fixture.pool();
        assert_eq!(pool.endpoints(), vec!["https://a.example", "https://b.example"]);

        fixture.set_all_failing(true);
        assert!(pool.stamp(&Digest::ZERO).await.is_err());
        fixture.set_all_failing(false);
        assert!(pool.stamp(&Digest::ZERO).await.is_ok());
    }
}
