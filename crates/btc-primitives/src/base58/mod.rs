//! Base58 encoding and decoding with optional checksum support.
//!
//! Raw Base58 uses the Bitcoin alphabet; Base58Check appends the first four
//! bytes of SHA-256d(payload) and verifies them on every decode. Extended
//! keys cross the wire in this form.

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Bitcoin's modified Base58 alphabet.
///
/// Excludes 0, O, I, l to reduce visual ambiguity.
pub const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Number of checksum bytes appended by [`check_encode`].
pub const CHECKSUM_LEN: usize = 4;

/// Encode a byte slice to a Base58 string.
///
/// Leading zero bytes are encoded as leading '1' characters.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

/// Decode a Base58 string to a byte vector.
///
/// Surrounding whitespace is ignored; leading '1' characters decode to
/// leading zero bytes.
///
/// # Returns
/// `Ok(Vec<u8>)` on success, or `InvalidBase58` for characters outside the alphabet.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s.trim())
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected base58 input");
            PrimitivesError::InvalidBase58(e.to_string())
        })
}

/// Decode a Base58 string that must yield exactly `expected_len` bytes.
///
/// # Returns
/// The bytes, or `LengthMismatch` when the decoded length differs.
pub fn decode_len(s: &str, expected_len: usize) -> Result<Vec<u8>, PrimitivesError> {
    let decoded = decode(s)?;
    check_len(decoded, expected_len)
}

/// Encode `data` with a 4-byte double-SHA-256 checksum appended (Base58Check).
pub fn check_encode(data: &[u8]) -> String {
    let checksum = sha256d(data);
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&payload)
}

/// Decode a Base58Check string, verifying the 4-byte checksum.
///
/// # Returns
/// The payload without checksum, `InvalidBase58` when the text is too
/// short to carry a checksum, or `ChecksumMismatch`.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(PrimitivesError::InvalidBase58(
            "data too short for checksum".to_string(),
        ));
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    let expected = sha256d(payload);
    if checksum != &expected[..CHECKSUM_LEN] {
        tracing::debug!(payload_len = payload.len(), "base58check checksum mismatch");
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}

/// Decode a Base58Check string whose payload must be `expected_len` bytes.
///
/// The checksum is verified before the length is checked.
pub fn check_decode_len(s: &str, expected_len: usize) -> Result<Vec<u8>, PrimitivesError> {
    let payload = check_decode(s)?;
    check_len(payload, expected_len)
}

fn check_len(bytes: Vec<u8>, expected: usize) -> Result<Vec<u8>, PrimitivesError> {
    if bytes.len() != expected {
        tracing::debug!(expected, got = bytes.len(), "base58 length mismatch");
        return Err(PrimitivesError::LengthMismatch { expected, got: bytes.len() });
    }
    Ok(bytes)
}
