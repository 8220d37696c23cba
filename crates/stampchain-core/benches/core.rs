//! Core benchmarks.
//!
//! - Proof chain encode / decode
//! - Chain folding
//! - Merkle tree build, proof and verify

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::RngCore;

use stampchain_core::{merkle, sha256, Digest, MerkleTree, Operation, ProofChain};

fn random_digest() -> Digest {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Digest::from_bytes(bytes)
}

fn make_chain(ops: usize) -> ProofChain {
    let mut chain = ProofChain::from_digest(random_digest());
    for i in 0..ops {
        match i % 4 {
            0 => chain.push(Operation::append(random_digest().0.to_vec())),
            1 => chain.push(Operation::Sha256),
            2 => chain.push(Operation::prepend(random_digest().0.to_vec())),
            _ => chain.push(Operation::calendar_commit(vec![0xa5; 96])),
        }
    }
    chain.push(Operation::Sha256);
    chain
}

fn bench_chain_codec(c: &mut Criterion) {
    let sizes = [4, 32, 256];

    let mut group = c.benchmark_group("chain/codec");

    for &size in &sizes {
        let chain = make_chain(size);
        let bytes = chain.serialize();

        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("serialize", size), &chain, |b, chain| {
            b.iter(|| black_box(chain).serialize())
        });

        group.bench_with_input(BenchmarkId::new("deserialize", size), &bytes, |b, bytes| {
            b.iter(|| ProofChain::deserialize(black_box(bytes)).unwrap())
        });
    }

    group.finish();
}

fn bench_chain_fold(c: &mut Criterion) {
    let sizes = [4, 32, 256];

    let mut group = c.benchmark_group("chain/fold");

    for &size in &sizes {
        let chain = make_chain(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("merkle_root", size), &chain, |b, chain| {
            b.iter(|| chain.merkle_root(None).unwrap())
        });
    }

    group.finish();
}

fn bench_merkle(c: &mut Criterion) {
    let sizes = [3, 64, 1000];

    let mut group = c.benchmark_group("merkle");

    for &size in &sizes {
        let leaves: Vec<Digest> = (0..size as u64)
            .map(|i| sha256(&i.to_le_bytes()))
            .collect();
        let tree = MerkleTree::build(&leaves);
        let root = tree.root().unwrap();
        let last = size - 1;
        let proof = tree.proof(last).unwrap();

        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("build", size), &leaves, |b, leaves| {
            b.iter(|| MerkleTree::build(black_box(leaves)).root())
        });

        group.bench_with_input(BenchmarkId::new("proof", size), &tree, |b, tree| {
            b.iter(|| tree.proof(black_box(last)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("verify", size), &proof, |b, proof| {
            b.iter(|| merkle::verify(&leaves[last], black_box(proof), &root, last))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chain_codec, bench_chain_fold, bench_merkle);

criterion_main!(benches);
