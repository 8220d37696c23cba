//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Stampchain. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use stampchain_core::{BlockHeader, Digest, ProofChain};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{classify_insert, proof_key, InsertResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

fn digest_from_column(bytes: Vec<u8>) -> Result<Digest> {
    Digest::from_slice(&bytes)
        .map_err(|_| StoreError::InvalidData(format!("expected 32-byte key, got {}", bytes.len())))
}

fn load_proof(conn: &Connection, leaf: &Digest) -> Result<Option<ProofChain>> {
    let bytes: Option<Vec<u8>> = conn
        .query_row(
            "SELECT proof FROM proofs WHERE leaf = ?1",
            params![leaf.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    match bytes {
        Some(bytes) => Ok(Some(ProofChain::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn put_proof(&self, chain: &ProofChain) -> Result<InsertResult> {
        let leaf = proof_key(chain)?;
        let chain = chain.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let existing = load_proof(&tx, &leaf)?;
            let result = classify_insert(existing.as_ref(), &chain);
            let now = now_millis();

            match &result {
                InsertResult::Inserted => {
                    tx.execute(
                        "INSERT INTO proofs (leaf, proof, op_count, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?4)",
                        params![
                            leaf.as_bytes().as_slice(),
                            chain.serialize(),
                            chain.len() as i64,
                            now,
                        ],
                    )?;
                    debug!(%leaf, ops = chain.len(), "inserted proof");
                }
                InsertResult::Upgraded { added } => {
                    tx.execute(
                        "UPDATE proofs SET proof = ?2, op_count = ?3, updated_at = ?4
                         WHERE leaf = ?1",
                        params![
                            leaf.as_bytes().as_slice(),
                            chain.serialize(),
                            chain.len() as i64,
                            now,
                        ],
                    )?;
                    debug!(%leaf, added, "upgraded proof");
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

            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn get_proof(&self, leaf: &Digest) -> Result<Option<ProofChain>> {
        let leaf = *leaf;
        self.blocking(move |conn| load_proof(conn, &leaf)).await
    }

    async fn has_proof(&self, leaf: &Digest) -> Result<bool> {
        let leaf = *leaf;
        self.blocking(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM proofs WHERE leaf = ?1)",
                params![leaf.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn list_proofs(&self) -> Result<Vec<Digest>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT leaf FROM proofs ORDER BY leaf")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            keys.into_iter().map(digest_from_column).collect()
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM proofs", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn put_block_header(&self, txid: &Digest, header: &BlockHeader) -> Result<()> {
        let txid = *txid;
        let header = *header;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO block_headers (txid, header, block_hash, fetched_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(txid) DO UPDATE SET
                    header = excluded.header,
                    block_hash = excluded.block_hash,
                    fetched_at = excluded.fetched_at",
                params![
                    txid.as_bytes().as_slice(),
                    header.as_bytes().as_slice(),
                    header.block_hash().as_bytes().as_slice(),
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_block_header(&self, txid: &Digest) -> Result<Option<BlockHeader>> {
        let txid = *txid;
        self.blocking(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT header FROM block_headers WHERE txid = ?1",
                    params![txid.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            match bytes {
                Some(bytes) => Ok(Some(BlockHeader::from_slice(&bytes)?)),
                None => Ok(None),
            }
        })
        .await
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
    async fn test_insert_and_get_proof() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = make_test_chain(1);
        let leaf = Digest::from_bytes([1; 32]);

        let result = store.put_proof(&chain).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        let retrieved = store.get_proof(&leaf).await.unwrap().unwrap();
        assert_eq!(retrieved, chain);
        assert!(store.has_proof(&leaf).await.unwrap());
        assert!(!store.has_proof(&Digest::ZERO).await.unwrap());
    }

    #[tokio::test]
    async fn test_idempotent_insert() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = make_test_chain(1);

        let r1 = store.put_proof(&chain).await.unwrap();
        assert_eq!(r1, InsertResult::Inserted);

        let r2 = store.put_proof(&chain).await.unwrap();
        assert_eq!(r2, InsertResult::AlreadyExists);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_replaces_proof() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = make_test_chain(1);
        store.put_proof(&chain).await.unwrap();

        let mut upgraded = chain.clone();
        upgraded.push(Operation::calendar_commit(b"second".to_vec()));
        upgraded.push(Operation::calendar_commit(b"third".to_vec()));
        assert_eq!(
            store.put_proof(&upgraded).await.unwrap(),
            InsertResult::Upgraded { added: 2 }
        );

        // A stale copy does not roll the proof back
        assert_eq!(store.put_proof(&chain).await.unwrap(), InsertResult::AlreadyExists);

        let stored = store.get_proof(&Digest::from_bytes([1; 32])).await.unwrap().unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_conflict_detection() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = make_test_chain(1);
        store.put_proof(&chain).await.unwrap();

        let mut diverged = ProofChain::from_digest(Digest::from_bytes([1; 32]));
        diverged.push(Operation::append(b"other".to_vec()));

        let result = store.put_proof(&diverged).await.unwrap();
        assert_eq!(result, InsertResult::Conflict { existing_len: 1 });

        let stored = store.get_proof(&Digest::from_bytes([1; 32])).await.unwrap().unwrap();
        assert_eq!(stored, chain);
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let store = SqliteStore::open_memory().unwrap();
        for byte in [5u8, 2, 9] {
            store.put_proof(&make_test_chain(byte)).await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 3);
        let leaves = store.list_proofs().await.unwrap();
        assert_eq!(leaves[0], Digest::from_bytes([2; 32]));
        assert_eq!(leaves[2], Digest::from_bytes([9; 32]));
    }

    #[tokio::test]
    async fn test_block_header_cache() {
        let store = SqliteStore::open_memory().unwrap();
        let txid = Digest::from_bytes([7; 32]);

        assert_eq!(store.get_block_header(&txid).await.unwrap(), None);

        let first = BlockHeader::from_bytes([1; 80]);
        store.put_block_header(&txid, &first).await.unwrap();
        assert_eq!(store.get_block_header(&txid).await.unwrap(), Some(first));

        let second = BlockHeader::from_bytes([2; 80]);
        store.put_block_header(&txid, &second).await.unwrap();
        assert_eq!(store.get_block_header(&txid).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let store = SqliteStore::open_memory().unwrap();
        let leaf = Digest::from_bytes([3; 32]);
        store
            .blocking(move |conn| {
                conn.execute(
                    "INSERT INTO proofs (leaf, proof, op_count, created_at, updated_at)
                     VALUES (?1, ?2, 0, 0, 0)",
                    params![leaf.as_bytes().as_slice(), vec![0xdeu8, 0xad]],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.get_proof(&leaf).await.unwrap_err();
        assert!(matches!(err, StoreError::Proof(e) if e.is_malformed()));
    }
}
