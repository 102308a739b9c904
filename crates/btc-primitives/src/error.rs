/// Unified error type for all primitives operations.
///
/// Covers errors from base conversion, Base58Check, EC operations, ECDSA,
/// extended-key handling and mnemonic encoding.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid length: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("point not on curve")]
    PointNotOnCurve,

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing produced a zero {0} component, retry with a different nonce")]
    SigningRetry(&'static str),

    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),

    #[error("invalid extended key version: {0}")]
    InvalidVersion(String),

    #[error("child key at index {0} is invalid, proceed with the next index")]
    InvalidChild(u32),

    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("entropy length must be a multiple of 4 bytes, got {0} bytes")]
    InvalidEntropyLength(usize),

    #[error("strength must be a positive multiple of 32 bits, got {0}")]
    InvalidStrength(usize),

    #[error("entropy is outside the curve order domain (0, n)")]
    EntropyOutOfRange,

    #[error("unknown mnemonic word: {0}")]
    UnknownWord(String),

    #[error("wordlist error: {0}")]
    Wordlist(String),

    #[error("stack underflow: {0}")]
    StackUnderflow(String),

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("{0}")]
    Other(String),
}

impl PrimitivesError {
    /// Whether the caller may retry the operation with different input.
    ///
    /// Only numeric flukes qualify: a zero `r`/`s` during signing, or a
    /// BIP32 child index that yields an invalid key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PrimitivesError::SigningRetry(_) | PrimitivesError::InvalidChild(_)
        )
    }
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
