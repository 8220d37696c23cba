//! Proptest generators for property-based testing.

use proptest::prelude::*;

use stampchain_core::{BlockHeader, Digest, Operation, ProofChain, BLOCK_HEADER_LEN};

/// Generate a random Digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate a random 80-byte block header.
pub fn block_header() -> impl Strategy<Value = BlockHeader> {
    prop::collection::vec(any::<u8>(), BLOCK_HEADER_LEN).prop_map(|bytes| {
        let mut header = [0u8; BLOCK_HEADER_LEN];
        header.copy_from_slice(&bytes);
        BlockHeader::from_bytes(header)
    })
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate any operation.
pub fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        Just(Operation::Sha256),
        Just(Operation::Sha1),
        Just(Operation::Ripemd160),
        payload(64).prop_map(|p| Operation::append(p)),
        payload(64).prop_map(|p| Operation::prepend(p)),
        payload(300).prop_map(|p| Operation::calendar_commit(p)),
        digest().prop_map(Operation::OpReturnCommit),
        (block_header(), proptest::option::of(digest()))
            .prop_map(|(header, tx_hash)| Operation::BitcoinBlockHeader { header, tx_hash }),
    ]
}

/// Generate an operation that leaves a 32-byte input 32 bytes long.
pub fn digest_preserving_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        Just(Operation::Sha256),
        payload(64).prop_map(|p| Operation::calendar_commit(p)),
        digest().prop_map(Operation::OpReturnCommit),
        (block_header(), proptest::option::of(digest()))
            .prop_map(|(header, tx_hash)| Operation::BitcoinBlockHeader { header, tx_hash }),
    ]
}

/// Parameters for generating a chain.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub start_digest: Option<Digest>,
    pub operations: Vec<Operation>,
}

impl Arbitrary for ChainParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            proptest::option::of(digest()),
            prop::collection::vec(operation(), 0..16),
        )
            .prop_map(|(start_digest, operations)| ChainParams {
                start_digest,
                operations,
            })
            .boxed()
    }
}

/// Build a chain from parameters.
pub fn chain_from_params(params: &ChainParams) -> ProofChain {
    let mut chain = match params.start_digest {
        Some(digest) => ProofChain::from_digest(digest),
        None => ProofChain::new(),
    };
    for op in &params.operations {
        chain.push(op.clone());
    }
    chain
}

/// Generate an anchored chain whose leaf is always computable.
pub fn anchored_chain() -> impl Strategy<Value = ProofChain> {
    (digest(), prop::collection::vec(digest_preserving_operation(), 0..12)).prop_map(
        |(start, operations)| {
            let mut chain = ProofChain::from_digest(start);
            for op in operations {
                chain.push(op);
            }
            chain
        },
    )
}
