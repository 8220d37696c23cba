//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, warn};

use stampchain_core::{BlockHeader, Digest, ProofChain};

use crate::error::{Result, StoreError};
use crate::traits::{classify_insert, proof_key, InsertResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Proofs indexed by leaf, ordered for listing.
    proofs: BTreeMap<Digest, ProofChain>,

    /// Block headers indexed by transaction id.
    headers: HashMap<Digest, BlockHeader>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_proof(&self, chain: &ProofChain) -> Result<InsertResult> {
        let leaf = proof_key(chain)?;
        let mut inner = self.write()?;

        let result = classify_insert(inner.proofs.get(&leaf), chain);
        match &result {
            InsertResult::Inserted | InsertResult::Upgraded { .. } => {
                debug!(%leaf, ?result, "storing proof");
                inner.proofs.insert(leaf, chain.clone());
            }
            InsertResult::Conflict { existing_len } => {
                warn!(
                    %leaf,
                    existing_len,
                    incoming_len = chain.len(),
                    "proof does not extend stored proof"
                );
            }
            InsertResult::AlreadyExists => {}
        }

        Ok(result)
    }

    async fn get_proof(&self, leaf: &Digest) -> Result<Option<ProofChain>> {
        Ok(self.read()?.proofs.get(leaf).cloned())
    }

    async fn has_proof(&self, leaf: &Digest) -> Result<bool> {
        Ok(self.read()?.proofs.contains_key(leaf))
    }

    async fn list_proofs(&self) -> Result<Vec<Digest>> {
        Ok(self.read()?.proofs.keys().copied().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.proofs.len() as u64)
    }

    async fn put_block_header(&self, txid: &Digest, header: &BlockHeader) -> Result<()> {
        self.write()?.headers.insert(*txid, *header);
        Ok(())
    }

    async fn get_block_header(&self, txid: &Digest) -> Result<Option<BlockHeader>> {
        Ok(self.read()?.headers.get(txid).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampchain_core::Operation;

    fn make_test_chain(byte: u8) -> ProofChain {
        let mut chain = ProofChain::from_digest(Digest::from_bytes([byte; 32]));
        chain.push(Operation::calendar_commit(format!("calendar {}", byte).into_bytes()));
        chain
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let chain = make_test_chain(1);
        let leaf = Digest::from_bytes([1; 32]);

        // Insert
        let result = store.put_proof(&chain).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        // Get
        let retrieved = store.get_proof(&leaf).await.unwrap().unwrap();
        assert_eq!(retrieved, chain);
        assert!(store.has_proof(&leaf).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_idempotent() {
        let store = MemoryStore::new();
        let chain = make_test_chain(1);

        let r1 = store.put_proof(&chain).await.unwrap();
        assert_eq!(r1, InsertResult::Inserted);

        let r2 = store.put_proof(&chain).await.unwrap();
        assert_eq!(r2, InsertResult::AlreadyExists);
    }

    #[tokio::test]
    async fn test_memory_store_upgrade_and_conflict() {
        let store = MemoryStore::new();
        let chain = make_test_chain(1);
        store.put_proof(&chain).await.unwrap();

        let mut upgraded = chain.clone();
        upgraded.push(Operation::calendar_commit(b"second".to_vec()));
        assert_eq!(
            store.put_proof(&upgraded).await.unwrap(),
            InsertResult::Upgraded { added: 1 }
        );

        let mut diverged = ProofChain::from_digest(Digest::from_bytes([1; 32]));
        diverged.push(Operation::Sha256);
        assert_eq!(
            store.put_proof(&diverged).await.unwrap(),
            InsertResult::Conflict { existing_len: 2 }
        );

        let stored = store.get_proof(&Digest::from_bytes([1; 32])).await.unwrap().unwrap();
        assert_eq!(stored, upgraded);
    }

    #[tokio::test]
    async fn test_memory_store_listing_is_ordered() {
        let store = MemoryStore::new();
        for byte in [3u8, 1, 2] {
            store.put_proof(&make_test_chain(byte)).await.unwrap();
        }
        let leaves = store.list_proofs().await.unwrap();
        assert_eq!(
            leaves,
            vec![
                Digest::from_bytes([1; 32]),
                Digest::from_bytes([2; 32]),
                Digest::from_bytes([3; 32]),
            ]
        );
    }

    #[tokio::test]
    async fn test_memory_store_headers() {
        let store = MemoryStore::new();
        let txid = Digest::from_bytes([9; 32]);
        let header = BlockHeader::from_bytes([4; 80]);

        assert!(store.get_block_header(&txid).await.unwrap().is_none());
        store.put_block_header(&txid, &header).await.unwrap();
        assert_eq!(store.get_block_header(&txid).await.unwrap(), Some(header));
    }
}
