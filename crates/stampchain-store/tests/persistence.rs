//! On-disk persistence tests for the SQLite store.

use stampchain_core::{BlockHeader, Digest, Operation, ProofChain};
use stampchain_store::{InsertResult, MemoryStore, SqliteStore, Store};

fn chain_for(byte: u8, calendars: usize) -> ProofChain {
    let mut chain = ProofChain::from_digest(Digest::from_bytes([byte; 32]));
    for i in 0..calendars {
        chain.push(Operation::calendar_commit(vec![i as u8; 48]));
    }
    chain
}

#[tokio::test]
async fn test_proofs_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proofs.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.put_proof(&chain_for(1, 1)).await.unwrap();
        store.put_proof(&chain_for(2, 2)).await.unwrap();
        store
            .put_block_header(&Digest::from_bytes([8; 32]), &BlockHeader::from_bytes([6; 80]))
            .await
            .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(
        store.get_proof(&Digest::from_bytes([2; 32])).await.unwrap(),
        Some(chain_for(2, 2))
    );
    assert!(store
        .get_block_header(&Digest::from_bytes([8; 32]))
        .await
        .unwrap()
        .is_some());

    // Upgrade after reopen still enforces append-only
    assert_eq!(
        store.put_proof(&chain_for(1, 3)).await.unwrap(),
        InsertResult::Upgraded { added: 2 }
    );
}

/// Both backends must agree on every insert outcome.
#[tokio::test]
async fn test_backends_agree() {
    let sqlite = SqliteStore::open_memory().unwrap();
    let memory = MemoryStore::new();

    let mut diverged = ProofChain::from_digest(Digest::from_bytes([1; 32]));
    diverged.push(Operation::Sha256);

    let sequence = vec![
        chain_for(1, 1),
        chain_for(1, 1),
        chain_for(1, 2),
        chain_for(1, 1),
        diverged,
        chain_for(2, 0),
    ];

    for chain in &sequence {
        let a = sqlite.put_proof(chain).await.unwrap();
        let b = memory.put_proof(chain).await.unwrap();
        assert_eq!(a, b);
    }

    assert_eq!(sqlite.list_proofs().await.unwrap(), memory.list_proofs().await.unwrap());
}
