//! Operations: the individual steps of a proof chain.
//!
//! Each operation is a deterministic transform over a byte string plus a
//! stable wire encoding: one opcode byte followed by a type-specific payload.
//! Opcodes are persisted in proof files and must never be renumbered.
//!
//! | Opcode | Operation            | Payload                                   |
//! |--------|----------------------|-------------------------------------------|
//! | `0x01` | `Sha256`             | none                                      |
//! | `0x02` | `Append`             | varbytes                                  |
//! | `0x05` | `Ripemd160`          | none                                      |
//! | `0x06` | `CalendarCommit`     | varbytes (opaque attestation)             |
//! | `0x0a` | `Sha1`               | none                                      |
//! | `0x0c` | `Prepend`            | varbytes                                  |
//! | `0x13` | `OpReturnCommit`     | varbytes (exactly 32)                     |
//! | `0x14` | `BitcoinBlockHeader` | varbytes (exactly 80), varbytes (0 or 32) |

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bitcoin::BlockHeader;
use crate::codec::{Reader, Writer};
use crate::crypto;
use crate::error::{MalformedInput, Result};
use crate::types::{Digest, DIGEST_LEN};

/// Stable operation discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Sha256 = 0x01,
    Append = 0x02,
    Ripemd160 = 0x05,
    CalendarCommit = 0x06,
    Sha1 = 0x0a,
    Prepend = 0x0c,
    OpReturnCommit = 0x13,
    BitcoinBlockHeader = 0x14,
}

impl Opcode {
    /// Every opcode, in wire-value order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Sha256,
        Opcode::Append,
        Opcode::Ripemd160,
        Opcode::CalendarCommit,
        Opcode::Sha1,
        Opcode::Prepend,
        Opcode::OpReturnCommit,
        Opcode::BitcoinBlockHeader,
    ];

    /// Convert to the wire byte.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from the wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        OperationRegistry::global()
            .entry(value)
            .map(|entry| entry.opcode)
    }

    /// Short lowercase name, as shown in proof summaries.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Sha256 => "sha256",
            Opcode::Append => "append",
            Opcode::Ripemd160 => "ripemd160",
            Opcode::CalendarCommit => "calendar-commit",
            Opcode::Sha1 => "sha1",
            Opcode::Prepend => "prepend",
            Opcode::OpReturnCommit => "op-return",
            Opcode::BitcoinBlockHeader => "bitcoin-block-header",
        }
    }

    /// Whether operations with this opcode carry an attestation rather than
    /// transforming the digest.
    pub fn is_attestation(self) -> bool {
        matches!(
            self,
            Opcode::CalendarCommit | Opcode::OpReturnCommit | Opcode::BitcoinBlockHeader
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single step of a proof chain.
///
/// Hash and byte-manipulation variants transform the running digest.
/// Attestation variants are identity transforms that carry payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// SHA-256 of the input.
    Sha256,
    /// SHA-1 of the input.
    Sha1,
    /// RIPEMD-160 of the input.
    Ripemd160,
    /// `input || payload`.
    Append(Bytes),
    /// `payload || input`.
    Prepend(Bytes),
    /// Opaque attestation returned by a calendar server.
    CalendarCommit(Bytes),
    /// 32-byte value embedded in a Bitcoin OP_RETURN output.
    OpReturnCommit(Digest),
    /// Raw Bitcoin block header, optionally with the committing transaction hash.
    BitcoinBlockHeader {
        header: BlockHeader,
        tx_hash: Option<Digest>,
    },
}

impl Operation {
    /// Build an `Append` step.
    pub fn append(payload: impl Into<Bytes>) -> Self {
        Operation::Append(payload.into())
    }

    /// Build a `Prepend` step.
    pub fn prepend(payload: impl Into<Bytes>) -> Self {
        Operation::Prepend(payload.into())
    }

    /// Wrap a calendar attestation.
    pub fn calendar_commit(attestation: impl Into<Bytes>) -> Self {
        Operation::CalendarCommit(attestation.into())
    }

    /// Build an `OpReturnCommit` from raw bytes, which must be exactly 32.
    pub fn op_return(commitment: &[u8]) -> Result<Self> {
        if commitment.len() != DIGEST_LEN {
            return Err(MalformedInput::InvalidPayloadLength {
                operation: Opcode::OpReturnCommit.name(),
                expected: DIGEST_LEN,
                actual: commitment.len(),
            }
            .into());
        }
        Ok(Operation::OpReturnCommit(Digest::from_slice(commitment)?))
    }

    /// Build a `BitcoinBlockHeader` from raw bytes (80-byte header, optional
    /// 32-byte transaction hash).
    pub fn bitcoin_block_header(header: &[u8], tx_hash: Option<&[u8]>) -> Result<Self> {
        let header = BlockHeader::from_slice(header)?;
        let tx_hash = tx_hash.map(decode_tx_hash).transpose()?;
        Ok(Operation::BitcoinBlockHeader { header, tx_hash })
    }

    /// The opcode of this operation.
    pub fn opcode(&self) -> Opcode {
        match self {
            Operation::Sha256 => Opcode::Sha256,
            Operation::Sha1 => Opcode::Sha1,
            Operation::Ripemd160 => Opcode::Ripemd160,
            Operation::Append(_) => Opcode::Append,
            Operation::Prepend(_) => Opcode::Prepend,
            Operation::CalendarCommit(_) => Opcode::CalendarCommit,
            Operation::OpReturnCommit(_) => Opcode::OpReturnCommit,
            Operation::BitcoinBlockHeader { .. } => Opcode::BitcoinBlockHeader,
        }
    }

    /// Apply this operation to `input`.
    ///
    /// Pure and deterministic. Attestation variants return the input unchanged.
    pub fn apply(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Operation::Sha256 => crypto::sha256(input).0.to_vec(),
            Operation::Sha1 => crypto::sha1(input).to_vec(),
            Operation::Ripemd160 => crypto::ripemd160(input).to_vec(),
            Operation::Append(payload) => {
                let mut out = Vec::with_capacity(input.len() + payload.len());
                out.extend_from_slice(input);
                out.extend_from_slice(payload);
                out
            }
            Operation::Prepend(payload) => {
                let mut out = Vec::with_capacity(input.len() + payload.len());
                out.extend_from_slice(payload);
                out.extend_from_slice(input);
                out
            }
            Operation::CalendarCommit(_)
            | Operation::OpReturnCommit(_)
            | Operation::BitcoinBlockHeader { .. } => input.to_vec(),
        }
    }

    /// Write the opcode and payload.
    pub fn encode(&self, w: &mut Writer) {
        w.write_u8(self.opcode().to_u8());
        match self {
            Operation::Sha256 | Operation::Sha1 | Operation::Ripemd160 => {}
            Operation::Append(payload)
            | Operation::Prepend(payload)
            | Operation::CalendarCommit(payload) => w.write_varbytes(payload),
            Operation::OpReturnCommit(commitment) => w.write_varbytes(commitment.as_bytes()),
            Operation::BitcoinBlockHeader { header, tx_hash } => {
                w.write_varbytes(header.as_bytes());
                match tx_hash {
                    Some(hash) => w.write_varbytes(hash.as_bytes()),
                    None => w.write_varbytes(&[]),
                }
            }
        }
    }

    /// Encode to a standalone byte blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode(&mut w);
        w.into_bytes()
    }

    /// Read one operation (opcode first) from the reader.
    pub fn decode(r: &mut Reader<'_>) -> Result<Self> {
        OperationRegistry::global().decode(r)
    }

    /// Decode a standalone blob, which must contain exactly one operation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let op = Self::decode(&mut r)?;
        r.finish("operation")?;
        Ok(op)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Append(p) | Operation::Prepend(p) => {
                write!(f, "{}({})", self.opcode(), hex::encode(p))
            }
            Operation::CalendarCommit(p) => write!(f, "{}({} bytes)", self.opcode(), p.len()),
            Operation::OpReturnCommit(c) => write!(f, "{}({})", self.opcode(), c),
            Operation::BitcoinBlockHeader { header, .. } => {
                write!(f, "{}({})", self.opcode(), header.block_hash())
            }
            _ => write!(f, "{}", self.opcode()),
        }
    }
}

fn decode_tx_hash(bytes: &[u8]) -> Result<Digest> {
    if bytes.len() != DIGEST_LEN {
        return Err(MalformedInput::InvalidPayloadLength {
            operation: "bitcoin-block-header tx hash",
            expected: DIGEST_LEN,
            actual: bytes.len(),
        }
        .into());
    }
    Digest::from_slice(bytes)
}

/// Payload decoder for one opcode. The opcode byte has already been consumed.
pub type DecodeFn = fn(&mut Reader<'_>) -> Result<Operation>;

/// A registered opcode and its payload decoder.
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    pub opcode: Opcode,
    pub decode: DecodeFn,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryEntry({:#04x} {})", self.opcode.to_u8(), self.opcode)
    }
}

/// Maps opcode bytes to payload decoders.
///
/// The table is a constant: it is complete at compile time and never mutated.
#[derive(Debug)]
pub struct OperationRegistry {
    entries: &'static [RegistryEntry],
}

static REGISTRY: OperationRegistry = OperationRegistry {
    entries: &[
        RegistryEntry { opcode: Opcode::Sha256, decode: decode_sha256 },
        RegistryEntry { opcode: Opcode::Append, decode: decode_append },
        RegistryEntry { opcode: Opcode::Ripemd160, decode: decode_ripemd160 },
        RegistryEntry { opcode: Opcode::CalendarCommit, decode: decode_calendar_commit },
        RegistryEntry { opcode: Opcode::Sha1, decode: decode_sha1 },
        RegistryEntry { opcode: Opcode::Prepend, decode: decode_prepend },
        RegistryEntry { opcode: Opcode::OpReturnCommit, decode: decode_op_return },
        RegistryEntry { opcode: Opcode::BitcoinBlockHeader, decode: decode_block_header },
    ],
};

impl OperationRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// Look up the entry for an opcode byte.
    pub fn entry(&self, opcode: u8) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.opcode.to_u8() == opcode)
    }

    /// All registered entries.
    pub fn entries(&self) -> &[RegistryEntry] {
        self.entries
    }

    /// Read the opcode byte and dispatch to its decoder.
    ///
    /// An unknown opcode is fatal: nothing after it can be trusted.
    pub fn decode(&self, r: &mut Reader<'_>) -> Result<Operation> {
        let opcode = r.read_u8()?;
        let entry = self
            .entry(opcode)
            .ok_or(MalformedInput::UnknownOperation(opcode))?;
        (entry.decode)(r)
    }
}

fn decode_sha256(_: &mut Reader<'_>) -> Result<Operation> {
    Ok(Operation::Sha256)
}

fn decode_sha1(_: &mut Reader<'_>) -> Result<Operation> {
    Ok(Operation::Sha1)
}

fn decode_ripemd160(_: &mut Reader<'_>) -> Result<Operation> {
    Ok(Operation::Ripemd160)
}

fn decode_append(r: &mut Reader<'_>) -> Result<Operation> {
    Ok(Operation::Append(Bytes::copy_from_slice(r.read_varbytes()?)))
}

fn decode_prepend(r: &mut Reader<'_>) -> Result<Operation> {
    Ok(Operation::Prepend(Bytes::copy_from_slice(r.read_varbytes()?)))
}

fn decode_calendar_commit(r: &mut Reader<'_>) -> Result<Operation> {
    Ok(Operation::CalendarCommit(Bytes::copy_from_slice(r.read_varbytes()?)))
}

fn decode_op_return(r: &mut Reader<'_>) -> Result<Operation> {
    Operation::op_return(r.read_varbytes()?)
}

fn decode_block_header(r: &mut Reader<'_>) -> Result<Operation> {
    let header = r.read_varbytes()?;
    let tx_hash = r.read_varbytes()?;
    let tx_hash = if tx_hash.is_empty() { None } else { Some(tx_hash) };
    Operation::bitcoin_block_header(header, tx_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn header_bytes(fill: u8) -> [u8; 80] {
        [fill; 80]
    }

    fn all_variants() -> Vec<Operation> {
        vec![
            Operation::Sha256,
            Operation::Sha1,
            Operation::Ripemd160,
            Operation::append(b"tail".to_vec()),
            Operation::prepend(b"head".to_vec()),
            Operation::calendar_commit(vec![0xaa; 100]),
            Operation::OpReturnCommit(Digest::from_bytes([0x33; 32])),
            Operation::BitcoinBlockHeader {
                header: BlockHeader::from_bytes(header_bytes(0x44)),
                tx_hash: Some(Digest::from_bytes([0x55; 32])),
            },
            Operation::BitcoinBlockHeader {
                header: BlockHeader::from_bytes(header_bytes(0x66)),
                tx_hash: None,
            },
        ]
    }

    #[test]
    fn test_opcode_roundtrip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_u8(opcode.to_u8()), Some(opcode));
        }
        assert_eq!(Opcode::from_u8(0x00), None);
        assert_eq!(Opcode::from_u8(0xff), None);
    }

    #[test]
    fn test_opcode_values_are_stable() {
        assert_eq!(Opcode::Sha256.to_u8(), 0x01);
        assert_eq!(Opcode::Append.to_u8(), 0x02);
        assert_eq!(Opcode::Ripemd160.to_u8(), 0x05);
        assert_eq!(Opcode::CalendarCommit.to_u8(), 0x06);
        assert_eq!(Opcode::Sha1.to_u8(), 0x0a);
        assert_eq!(Opcode::Prepend.to_u8(), 0x0c);
        assert_eq!(Opcode::OpReturnCommit.to_u8(), 0x13);
        assert_eq!(Opcode::BitcoinBlockHeader.to_u8(), 0x14);
    }

    #[test]
    fn test_registry_covers_every_opcode_once() {
        let registry = OperationRegistry::global();
        assert_eq!(registry.entries().len(), Opcode::ALL.len());
        for opcode in Opcode::ALL {
            let matches = registry
                .entries()
                .iter()
                .filter(|e| e.opcode == opcode)
                .count();
            assert_eq!(matches, 1, "{} registered {} times", opcode, matches);
        }
    }

    #[test]
    fn test_apply_hashes() {
        let input = b"abc";
        assert_eq!(Operation::Sha256.apply(input), crypto::sha256(input).0.to_vec());
        assert_eq!(Operation::Sha1.apply(input).len(), 20);
        assert_eq!(Operation::Ripemd160.apply(input).len(), 20);
    }

    #[test]
    fn test_apply_append_prepend() {
        assert_eq!(Operation::append(b"yz".to_vec()).apply(b"abc"), b"abcyz");
        assert_eq!(Operation::prepend(b"yz".to_vec()).apply(b"abc"), b"yzabc");
    }

    #[test]
    fn test_attestations_are_identity() {
        let input = [0x12u8; 32];
        for op in all_variants().into_iter().filter(|op| op.opcode().is_attestation()) {
            assert_eq!(op.apply(&input), input.to_vec(), "{} changed its input", op);
        }
    }

    #[test]
    fn test_roundtrip_every_variant() {
        for op in all_variants() {
            let bytes = op.to_bytes();
            let decoded = Operation::from_bytes(&bytes).unwrap();
            assert_eq!(decoded, op);
            assert_eq!(decoded.to_bytes(), bytes);
            assert_eq!(decoded.apply(b"sample"), op.apply(b"sample"));
        }
    }

    #[test]
    fn test_wire_layout() {
        assert_eq!(Operation::Sha256.to_bytes(), vec![0x01]);
        assert_eq!(Operation::append(vec![0xab]).to_bytes(), vec![0x02, 0x01, 0xab]);
        assert_eq!(Operation::prepend(vec![]).to_bytes(), vec![0x0c, 0x00]);

        let op_return = Operation::OpReturnCommit(Digest::from_bytes([0x01; 32])).to_bytes();
        assert_eq!(op_return.len(), 1 + 1 + 32);
        assert_eq!(&op_return[..2], &[0x13, 32]);

        let header = Operation::BitcoinBlockHeader {
            header: BlockHeader::from_bytes([0u8; 80]),
            tx_hash: None,
        }
        .to_bytes();
        assert_eq!(header.len(), 1 + 1 + 80 + 1);
        assert_eq!(header[0], 0x14);
        assert_eq!(header[1], 80);
        assert_eq!(header[82], 0);
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        let err = Operation::from_bytes(&[0x7f]).unwrap_err();
        assert_eq!(err, CoreError::Malformed(MalformedInput::UnknownOperation(0x7f)));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_op_return_length_enforced() {
        assert!(Operation::op_return(&[0u8; 31]).is_err());
        assert!(Operation::op_return(&[0u8; 33]).is_err());
        assert!(Operation::op_return(&[0u8; 32]).is_ok());

        // 31-byte payload on the wire
        let mut bytes = vec![0x13, 31];
        bytes.extend_from_slice(&[0u8; 31]);
        assert!(Operation::from_bytes(&bytes).unwrap_err().is_malformed());
    }

    #[test]
    fn test_block_header_length_enforced() {
        assert_eq!(
            Operation::bitcoin_block_header(&[0u8; 79], None).unwrap_err(),
            CoreError::Malformed(MalformedInput::InvalidBlockHeader(79))
        );
        assert!(Operation::bitcoin_block_header(&[0u8; 80], Some(&[0u8; 31])).is_err());
        assert!(Operation::bitcoin_block_header(&[0u8; 80], Some(&[0u8; 32])).is_ok());
    }

    #[test]
    fn test_trailing_bytes_in_blob_rejected() {
        let err = Operation::from_bytes(&[0x01, 0x00]).unwrap_err();
        assert_eq!(
            err,
            CoreError::Malformed(MalformedInput::TrailingBytes(1, "operation"))
        );
    }

    #[test]
    fn test_truncated_payload_rejected() {
        assert!(Operation::from_bytes(&[0x02, 0x05, 0xaa]).unwrap_err().is_malformed());
        assert!(Operation::from_bytes(&[]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_display() {
        assert_eq!(Operation::Sha256.to_string(), "sha256");
        assert_eq!(Operation::append(vec![0xab, 0xcd]).to_string(), "append(abcd)");
        assert_eq!(
            Operation::calendar_commit(vec![0; 7]).to_string(),
            "calendar-commit(7 bytes)"
        );
    }
}
