//! Compact binary encoding for proofs.
//!
//! Integers use the Bitcoin-style compact size encoding:
//! - `n < 0xfd`: one byte
//! - `n <= 0xffff`: `0xfd` followed by 2 bytes little-endian
//! - `n <= 0xffff_ffff`: `0xfe` followed by 4 bytes little-endian
//! - otherwise: `0xff` followed by 8 bytes little-endian
//!
//! Byte strings are a varint length followed by the raw bytes.
//!
//! Decoding is strict. A value written with a longer form than necessary is
//! rejected, so every accepted buffer re-encodes to the same bytes.

use crate::error::{MalformedInput, Result};

const PREFIX_U16: u8 = 0xfd;
const PREFIX_U32: u8 = 0xfe;
const PREFIX_U64: u8 = 0xff;

/// Append-only output buffer.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Write raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write an integer in its smallest compact form.
    pub fn write_varint(&mut self, n: u64) {
        if n < PREFIX_U16 as u64 {
            self.buf.push(n as u8);
        } else if n <= 0xffff {
            self.buf.push(PREFIX_U16);
            self.buf.extend_from_slice(&(n as u16).to_le_bytes());
        } else if n <= 0xffff_ffff {
            self.buf.push(PREFIX_U32);
            self.buf.extend_from_slice(&(n as u32).to_le_bytes());
        } else {
            self.buf.push(PREFIX_U64);
            self.buf.extend_from_slice(&n.to_le_bytes());
        }
    }

    /// Write a length-prefixed byte string.
    pub fn write_varbytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an input buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the whole buffer has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read exactly `len` bytes.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(MalformedInput::UnexpectedEndOfInput {
                needed: len,
                remaining: self.remaining(),
            }
            .into());
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.read_exact(N)?);
        Ok(arr)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    /// Read a compact integer, rejecting non-minimal encodings.
    pub fn read_varint(&mut self) -> Result<u64> {
        let first = self.read_u8()?;
        let (value, min) = match first {
            PREFIX_U16 => (u16::from_le_bytes(self.read_array()?) as u64, PREFIX_U16 as u64),
            PREFIX_U32 => (u32::from_le_bytes(self.read_array()?) as u64, 0x1_0000),
            PREFIX_U64 => (u64::from_le_bytes(self.read_array()?), 0x1_0000_0000),
            n => return Ok(n as u64),
        };
        if value < min {
            return Err(MalformedInput::NonCanonicalVarInt(value).into());
        }
        Ok(value)
    }

    /// Read a length-prefixed byte string.
    pub fn read_varbytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| MalformedInput::LengthOverflow(len))?;
        self.read_exact(len)
    }

    /// Fail if any input is left over.
    pub fn finish(&self, context: &'static str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MalformedInput::TrailingBytes(self.remaining(), context).into())
        }
    }
}
