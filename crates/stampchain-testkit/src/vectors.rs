//! Golden test vectors for the proof file format.
//!
//! These vectors pin the exact bytes of serialized proofs and the digests
//! they fold to, so any implementation of the format can be checked against
//! them.

use stampchain_core::bitcoin::MERKLE_ROOT_RANGE;
use stampchain_core::{sha256, BlockHeader, Digest, Operation, ProofChain, BLOCK_HEADER_LEN};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Builds the chain the vector describes.
    pub build: fn() -> ProofChain,
    /// Expected serialized proof (hex).
    pub expected_bytes: &'static str,
    /// Expected leaf digest (hex), empty if the chain has none.
    pub expected_leaf: &'static str,
    /// Expected attestation root (hex), empty if the chain has none.
    pub expected_root: &'static str,
}

fn empty_detached() -> ProofChain {
    ProofChain::new()
}

fn anchored_sha256() -> ProofChain {
    let mut chain = ProofChain::from_digest(Digest::from_bytes([0x42; 32]));
    chain.push(Operation::Sha256);
    chain
}

fn detached_hello() -> ProofChain {
    let mut chain = ProofChain::new();
    chain.push(Operation::append(b"hello".to_vec()));
    chain.push(Operation::Sha256);
    chain
}

fn single_calendar() -> ProofChain {
    let mut chain = ProofChain::from_digest(Digest::from_bytes([0x01; 32]));
    chain.push(Operation::calendar_commit(b"cal".to_vec()));
    chain
}

fn bitcoin_anchored() -> ProofChain {
    let leaf = Digest::from_bytes([0x07; 32]);
    let mut chain = ProofChain::from_digest(leaf);
    chain.push(Operation::calendar_commit(b"x".to_vec()));

    let commitment = sha256(chain.build_attestation_tree(&leaf).as_bytes());
    let mut header = [0u8; BLOCK_HEADER_LEN];
    header[MERKLE_ROOT_RANGE].copy_from_slice(commitment.as_bytes());

    chain.push(Operation::OpReturnCommit(commitment));
    chain.push(Operation::BitcoinBlockHeader {
        header: BlockHeader::from_bytes(header),
        tx_hash: None,
    });
    chain
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "empty detached chain",
            build: empty_detached,
            expected_bytes: "4f5453010000",
            expected_leaf: "",
            expected_root: "",
        },
        GoldenVector {
            name: "anchored single sha256",
            build: anchored_sha256,
            expected_bytes: concat!(
                "4f545301204242424242424242424242424242424242424242424242424242424242424242",
                "010101"
            ),
            expected_leaf: "425ed4e4a36b30ea21b90e21c712c649e8214c29b7eaf68089d1039c6e55384c",
            expected_root: "425ed4e4a36b30ea21b90e21c712c649e8214c29b7eaf68089d1039c6e55384c",
        },
        GoldenVector {
            name: "detached append then sha256",
            build: detached_hello,
            expected_bytes: "4f545301000207020568656c6c6f0101",
            expected_leaf: "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
            expected_root: "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        },
        GoldenVector {
            name: "one calendar attestation",
            build: single_calendar,
            expected_bytes: concat!(
                "4f545301200101010101010101010101010101010101010101010101010101010101010101",
                "0105060363616c"
            ),
            expected_leaf: "0101010101010101010101010101010101010101010101010101010101010101",
            expected_root: "7c8975e1e60a5c8337f28edf8c33c3b180360b7279644a9bc1af3c51e6220bf5",
        },
        GoldenVector {
            name: "calendar and bitcoin attestation",
            build: bitcoin_anchored,
            expected_bytes: concat!(
                "4f54530120070707070707070707070707070707070707070707070707070707070707070703",
                "03060178",
                "221320a65b17a27c83cc5fa4546ab0bf91bbd9dfe327c012f625b0d6f06df236743439",
                "531450000000000000000000000000000000000000000000000000000000000000000000",
                "000000a65b17a27c83cc5fa4546ab0bf91bbd9dfe327c012f625b0d6f06df23674343900",
                "000000000000000000000000"
            ),
            expected_leaf: "0707070707070707070707070707070707070707070707070707070707070707",
            expected_root: "6cfeeb3aa25d3f411dae5eec17d7369ca7153e72dcf54bcf4c3daec0f5b21fc7",
        },
    ]
}

/// Check every vector against this implementation.
///
/// Returns `(name, matches, actual serialized hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let chain = (v.build)();
            let hex = hex::encode(chain.serialize());
            let summary = chain.summary();
            let leaf = summary.leaf_digest.map(|d| d.to_hex()).unwrap_or_default();
            let root = summary.attestation_root.map(|d| d.to_hex()).unwrap_or_default();

            let matches =
                hex == v.expected_bytes && leaf == v.expected_leaf && root == v.expected_root;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector {} produced {}", name, hex);
        }
    }

    #[test]
    fn test_vectors_decode_to_their_chain() {
        for vector in all_vectors() {
            let bytes = hex::decode(vector.expected_bytes).unwrap();
            let decoded = ProofChain::deserialize(&bytes).unwrap();
            assert_eq!(decoded, (vector.build)(), "vector {}", vector.name);
        }
    }

    #[test]
    fn test_bitcoin_vector_layout() {
        let vector = all_vectors()
            .into_iter()
            .find(|v| v.name == "calendar and bitcoin attestation")
            .unwrap();
        let bytes = hex::decode(vector.expected_bytes).unwrap();
        // header, start digest, op count, then ops of 3, 34 and 83 bytes
        assert_eq!(bytes.len(), 4 + 33 + 1 + (1 + 3) + (1 + 34) + (1 + 83));
        assert_eq!(&bytes[bytes.len() - 83..][..2], &[0x14, 0x50]);
        assert_eq!(bytes, (vector.build)().serialize());
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }
}
