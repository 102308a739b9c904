//! Input normalization and binary helpers.
//!
//! Provides the `Octets` boundary type that turns raw bytes or hex strings
//! into one canonical byte form, `ByteReader` and `ByteWriter` for the
//! big-endian fixed layouts used by extended keys, and a bounds-checked
//! `Stack` that reports underflow as an error.

use num_bigint::BigUint;

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// Octets
// ---------------------------------------------------------------------------

/// A byte sequence given either as raw bytes or as a hex string.
///
/// Every API that accepts key material, seeds, entropy or version tags
/// takes `impl Into<Octets>` and calls [`Octets::to_bytes`] before doing
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Octets<'a> {
    /// Raw bytes, used as-is.
    Bytes(&'a [u8]),
    /// Hex text; must have even length and only hex digits.
    Hex(&'a str),
}

impl<'a> Octets<'a> {
    /// Normalize to an owned byte vector.
    ///
    /// # Returns
    /// The bytes, or `InvalidHex` if a hex string does not decode cleanly.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PrimitivesError> {
        match self {
            Octets::Bytes(b) => Ok(b.to_vec()),
            Octets::Hex(s) => {
                let s = s.trim();
                if s.len() % 2 != 0 {
                    tracing::debug!(len = s.len(), "rejected odd-length hex input");
                    return Err(PrimitivesError::InvalidHex(format!(
                        "odd length {}",
                        s.len()
                    )));
                }
                Ok(hex::decode(s)?)
            }
        }
    }
}

impl<'a> From<&'a [u8]> for Octets<'a> {
    fn from(b: &'a [u8]) -> Self {
        Octets::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Octets<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Octets::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for Octets<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Octets::Bytes(b)
    }
}

impl<'a> From<&'a str> for Octets<'a> {
    fn from(s: &'a str) -> Self {
        Octets::Hex(s)
    }
}

impl<'a> From<&'a String> for Octets<'a> {
    fn from(s: &'a String) -> Self {
        Octets::Hex(s)
    }
}

/// Interpret an octet sequence as a big-endian unsigned integer (SEC 1, 2.3.8).
pub fn int_from_octets<'a>(o: impl Into<Octets<'a>>) -> Result<BigUint, PrimitivesError> {
    Ok(BigUint::from_bytes_be(&o.into().to_bytes()?))
}

/// Serialize an integer as exactly `len` big-endian bytes.
///
/// # Returns
/// The left-padded bytes, or `LengthMismatch` if the value needs more
/// than `len` bytes.
pub fn int_to_octets(value: &BigUint, len: usize) -> Result<Vec<u8>, PrimitivesError> {
    let raw = if value.bits() == 0 { Vec::new() } else { value.to_bytes_be() };
    if raw.len() > len {
        return Err(PrimitivesError::LengthMismatch { expected: len, got: raw.len() });
    }
    let mut out = vec![0u8; len - raw.len()];
    out.extend_from_slice(&raw);
    Ok(out)
}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// A cursor-based reader for fixed binary layouts.
///
/// Wraps a byte slice and maintains a read position. Integers are read in
/// big-endian order, as BIP32 serializes them.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a new reader over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// # Returns
    /// A byte slice of length `n`, or `UnexpectedEof` if insufficient data remains.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if self.pos + n > self.data.len() {
            return Err(PrimitivesError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read exactly `N` bytes into a fixed array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte and advance the position.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Read a big-endian u32 and advance the position by 4 bytes.
    pub fn read_u32_be(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    /// Return the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

// ---------------------------------------------------------------------------
// ByteWriter
// ---------------------------------------------------------------------------

/// A buffer-based writer for fixed binary layouts.
///
/// Wraps a `Vec<u8>`; integers are appended in big-endian order.
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// Create a new writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter { buf: Vec::with_capacity(capacity) }
    }

    /// Append raw bytes to the buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte to the buffer.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a big-endian u32 (4 bytes) to the buffer.
    pub fn write_u32_be(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Return the current length of the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// A LIFO stack over an owned `Vec<T>`.
///
/// `pop` reports `StackUnderflow` instead of returning `None`, so callers
/// can propagate with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Stack { items: Vec::new() }
    }

    /// Create an empty stack with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Stack { items: Vec::with_capacity(capacity) }
    }

    /// Push an item on top of the stack.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Remove and return the top item.
    pub fn pop(&mut self) -> Result<T, PrimitivesError> {
        self.items
            .pop()
            .ok_or_else(|| PrimitivesError::StackUnderflow("pop from empty stack".to_string()))
    }

    /// Number of items on the stack.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
