//! Positional base conversion.
//!
//! Converts values between radix 2, 10, 16, 32, 58, 256, bech32, custom
//! single-byte alphabets and plain integer-digit radices (e.g. 2048 for
//! BIP39 word indices). Inputs of any accepted shape are normalized into
//! one digit vector before conversion, and leading zero symbols survive the
//! trip: a zero byte becomes `1` in Base58 and `00` in hex.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use unicode_normalization::UnicodeNormalization;

use crate::util::{Octets, Stack};
use crate::PrimitivesError;

const BINARY_SYMBOLS: &[u8] = b"01";
const DECIMAL_SYMBOLS: &[u8] = b"0123456789";
const HEX_SYMBOLS: &[u8] = b"0123456789abcdef";
const BASE32_SYMBOLS: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
const BASE58_SYMBOLS: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BECH32_SYMBOLS: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

fn encoding_error(msg: impl Into<String>) -> PrimitivesError {
    let msg = msg.into();
    tracing::debug!(%msg, "base conversion rejected input");
    PrimitivesError::Encoding(msg)
}

// ---------------------------------------------------------------------------
// Alphabet / Radix
// ---------------------------------------------------------------------------

/// A custom alphabet of distinct single-byte symbols; index 0 is the zero symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    lookup: [Option<u8>; 256],
}

impl Alphabet {
    /// Build an alphabet from 2 to 256 distinct symbols.
    pub fn new(symbols: &[u8]) -> Result<Self, PrimitivesError> {
        if symbols.len() < 2 || symbols.len() > 256 {
            return Err(encoding_error(format!(
                "alphabet must have 2 to 256 symbols, got {}",
                symbols.len()
            )));
        }
        let mut lookup = [None; 256];
        for (i, &b) in symbols.iter().enumerate() {
            if lookup[b as usize].is_some() {
                return Err(encoding_error(format!("duplicate alphabet symbol {:?}", b as char)));
            }
            lookup[b as usize] = Some(i as u8);
        }
        Ok(Alphabet { symbols: symbols.to_vec(), lookup })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The radix a value is expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Radix {
    /// Base 2 over `01`.
    Binary,
    /// Base 10; converted to and from [`Encoded::Integer`].
    Decimal,
    /// Base 16, lowercase on output, case-insensitive on input.
    Hex,
    /// Base 32 over the RFC 4648 lowercase alphabet.
    Base32,
    /// Base 58 over the Bitcoin alphabet.
    Base58,
    /// Base 32 over the bech32 alphabet.
    Bech32,
    /// Base 256, i.e. raw bytes.
    Bytes,
    /// A caller-supplied alphabet.
    Custom(Alphabet),
    /// Digits carried as plain integers in `[0, base)`.
    Indexed(u32),
}

impl Radix {
    /// Map a numeric base to its standard radix.
    ///
    /// # Returns
    /// The radix for 2, 10, 16, 32, 58 or 256, or an `Encoding` error for
    /// any other base.
    pub fn from_base(base: u32) -> Result<Self, PrimitivesError> {
        match base {
            2 => Ok(Radix::Binary),
            10 => Ok(Radix::Decimal),
            16 => Ok(Radix::Hex),
            32 => Ok(Radix::Base32),
            58 => Ok(Radix::Base58),
            256 => Ok(Radix::Bytes),
            other => Err(encoding_error(format!("unrecognized base {}", other))),
        }
    }

    /// Number of distinct digits.
    pub fn base(&self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Decimal => 10,
            Radix::Hex => 16,
            Radix::Base32 | Radix::Bech32 => 32,
            Radix::Base58 => 58,
            Radix::Bytes => 256,
            Radix::Custom(a) => a.len() as u32,
            Radix::Indexed(n) => *n,
        }
    }

    fn symbols(&self) -> Option<&[u8]> {
        match self {
            Radix::Binary => Some(BINARY_SYMBOLS),
            Radix::Decimal => Some(DECIMAL_SYMBOLS),
            Radix::Hex => Some(HEX_SYMBOLS),
            Radix::Base32 => Some(BASE32_SYMBOLS),
            Radix::Base58 => Some(BASE58_SYMBOLS),
            Radix::Bech32 => Some(BECH32_SYMBOLS),
            Radix::Custom(a) => Some(&a.symbols),
            Radix::Bytes | Radix::Indexed(_) => None,
        }
    }

    /// Digit value of a single-byte symbol.
    fn digit_of(&self, symbol: u8) -> Option<u32> {
        match self {
            Radix::Bytes => Some(symbol as u32),
            Radix::Indexed(_) => None,
            Radix::Hex => (symbol as char).to_digit(16),
            Radix::Custom(a) => a.lookup[symbol as usize].map(u32::from),
            other => other
                .symbols()
                .and_then(|s| s.iter().position(|&c| c == symbol))
                .map(|p| p as u32),
        }
    }

    /// Bits carried by one leading zero symbol: log2(base) for powers of
    /// two, otherwise one byte's worth.
    fn zero_width(&self) -> u64 {
        let base = self.base();
        if base.is_power_of_two() {
            base.trailing_zeros() as u64
        } else {
            8
        }
    }
}

// ---------------------------------------------------------------------------
// Encoded values
// ---------------------------------------------------------------------------

/// A value on either side of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// Symbols of an alphabet radix, one byte per character.
    Text(String),
    /// Raw bytes (radix 256), or alphabet symbols given as bytes.
    Bytes(Vec<u8>),
    /// A decimal value.
    Integer(BigUint),
    /// Plain digit values.
    Indices(Vec<u32>),
}

impl Encoded {
    pub fn into_text(self) -> Result<String, PrimitivesError> {
        match self {
            Encoded::Text(s) => Ok(s),
            other => Err(encoding_error(format!("expected text output, got {:?}", other))),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, PrimitivesError> {
        match self {
            Encoded::Bytes(b) => Ok(b),
            other => Err(encoding_error(format!("expected byte output, got {:?}", other))),
        }
    }

    pub fn into_integer(self) -> Result<BigUint, PrimitivesError> {
        match self {
            Encoded::Integer(v) => Ok(v),
            other => Err(encoding_error(format!("expected integer output, got {:?}", other))),
        }
    }

    pub fn into_indices(self) -> Result<Vec<u32>, PrimitivesError> {
        match self {
            Encoded::Indices(v) => Ok(v),
            other => Err(encoding_error(format!("expected index output, got {:?}", other))),
        }
    }
}

impl From<&str> for Encoded {
    fn from(s: &str) -> Self {
        Encoded::Text(s.to_string())
    }
}

impl From<String> for Encoded {
    fn from(s: String) -> Self {
        Encoded::Text(s)
    }
}

impl From<&[u8]> for Encoded {
    fn from(b: &[u8]) -> Self {
        Encoded::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Encoded {
    fn from(b: &[u8; N]) -> Self {
        Encoded::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Encoded {
    fn from(b: Vec<u8>) -> Self {
        Encoded::Bytes(b)
    }
}

impl From<BigUint> for Encoded {
    fn from(v: BigUint) -> Self {
        Encoded::Integer(v)
    }
}

impl From<&BigUint> for Encoded {
    fn from(v: &BigUint) -> Self {
        Encoded::Integer(v.clone())
    }
}

impl From<u64> for Encoded {
    fn from(v: u64) -> Self {
        Encoded::Integer(BigUint::from(v))
    }
}

impl From<Vec<u32>> for Encoded {
    fn from(v: Vec<u32>) -> Self {
        Encoded::Indices(v)
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Output shaping for [`change_base_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Left-pad the output with zero symbols up to this many digits.
    /// Required (non-zero) when converting from decimal.
    pub min_length: usize,
    /// Force an even digit count; `None` means "even for hex output only".
    pub output_even: Option<bool>,
}

impl ConvertOptions {
    pub fn min_length(min_length: usize) -> Self {
        ConvertOptions { min_length, output_even: None }
    }
}

/// Normalized input: either a ready integer, or digits with a count of
/// leading zero digits.
enum Digits {
    Number(BigUint),
    Positional(Vec<u32>),
}

/// Convert `input` from radix `from` to radix `to`.
///
/// Shorthand for [`change_base_with`] with only a minimum length.
pub fn change_base(
    input: impl Into<Encoded>,
    from: &Radix,
    to: &Radix,
    min_length: usize,
) -> Result<Encoded, PrimitivesError> {
    change_base_with(input, from, to, ConvertOptions::min_length(min_length))
}

/// Convert `input` from radix `from` to radix `to`.
///
/// # Returns
/// `Encoded::Integer` for decimal output, `Encoded::Bytes` for radix 256,
/// `Encoded::Indices` for indexed radices and `Encoded::Text` otherwise.
/// Fails with `Encoding` on unknown symbols, a decimal input without a
/// minimum length, or an input shape the source radix cannot carry.
pub fn change_base_with(
    input: impl Into<Encoded>,
    from: &Radix,
    to: &Radix,
    opts: ConvertOptions,
) -> Result<Encoded, PrimitivesError> {
    let input = input.into();
    if *from == Radix::Decimal && opts.min_length == 0 {
        return Err(encoding_error("decimal input requires a minimum output length"));
    }
    for radix in [from, to] {
        if radix.base() < 2 {
            return Err(encoding_error(format!("radix base {} is too small", radix.base())));
        }
    }

    // Fast paths that skip digit accumulation.
    match (from, to, &input) {
        (Radix::Bytes, Radix::Hex, Encoded::Bytes(b))
            if opts.min_length == 0 && opts.output_even != Some(false) =>
        {
            return Ok(Encoded::Text(hex::encode(b)));
        }
        (Radix::Hex, Radix::Bytes, Encoded::Text(s)) if opts.min_length == 0 && s.len() % 2 == 0 => {
            return Ok(Encoded::Bytes(hex::decode(s)?));
        }
        (Radix::Hex, Radix::Decimal, Encoded::Text(s)) => {
            if s.is_empty() {
                return Ok(Encoded::Integer(BigUint::zero()));
            }
            if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(encoding_error(format!("invalid hex number {:?}", s)));
            }
            return BigUint::parse_bytes(s.as_bytes(), 16)
                .map(Encoded::Integer)
                .ok_or_else(|| encoding_error(format!("invalid hex number {:?}", s)));
        }
        _ => {}
    }

    let base_from = from.base();
    let (value, leading_zeros) = match normalize(input, from)? {
        Digits::Number(v) => (v, 0usize),
        Digits::Positional(digits) => {
            let leading = digits.iter().take_while(|&&d| d == 0).count();
            let mut value = BigUint::zero();
            for d in digits {
                value = value * base_from + d;
            }
            (value, leading)
        }
    };

    if *to == Radix::Decimal {
        return Ok(Encoded::Integer(value));
    }

    let base_to = to.base();
    let mut stack: Stack<u32> = Stack::with_capacity(value.bits() as usize + opts.min_length);
    let mut rest = value;
    while !rest.is_zero() {
        let (q, r) = rest.div_rem(&BigUint::from(base_to));
        stack.push(r.to_u32().unwrap_or_default());
        rest = q;
    }
    let zeros = (leading_zeros as u64 * from.zero_width() / to.zero_width()) as usize;
    for _ in 0..zeros {
        stack.push(0);
    }
    let even = opts.output_even.unwrap_or(*to == Radix::Hex);
    if even && stack.len() % 2 == 1 {
        stack.push(0);
    }
    while stack.len() < opts.min_length {
        stack.push(0);
    }
    let mut digits = Vec::with_capacity(stack.len());
    while !stack.is_empty() {
        digits.push(stack.pop()?);
    }

    Ok(match to {
        Radix::Bytes => Encoded::Bytes(digits.into_iter().map(|d| d as u8).collect()),
        Radix::Indexed(_) => Encoded::Indices(digits),
        other => {
            let symbols = other
                .symbols()
                .ok_or_else(|| encoding_error("radix has no alphabet"))?;
            Encoded::Text(digits.into_iter().map(|d| symbols[d as usize] as char).collect())
        }
    })
}

/// Turn any accepted input shape into digits of `radix`.
fn normalize(input: Encoded, radix: &Radix) -> Result<Digits, PrimitivesError> {
    if *radix == Radix::Decimal {
        return match input {
            Encoded::Integer(v) => Ok(Digits::Number(v)),
            Encoded::Text(s) => parse_decimal(s.trim().as_bytes()),
            Encoded::Bytes(b) => parse_decimal(&b),
            Encoded::Indices(_) => Err(encoding_error("decimal radix takes integer or text input")),
        };
    }
    let base = radix.base();
    match input {
        Encoded::Integer(v) => Ok(Digits::Number(v)),
        Encoded::Indices(digits) => {
            if let Some(bad) = digits.iter().find(|&&d| d >= base) {
                return Err(encoding_error(format!("digit {} out of range for base {}", bad, base)));
            }
            Ok(Digits::Positional(digits))
        }
        Encoded::Text(s) => {
            let mut symbols = Vec::with_capacity(s.len());
            for c in s.chars() {
                let b = u8::try_from(c as u32)
                    .map_err(|_| encoding_error(format!("character {:?} is not single-byte", c)))?;
                symbols.push(b);
            }
            symbol_digits(&symbols, radix)
        }
        Encoded::Bytes(b) => symbol_digits(&b, radix),
    }
}

fn symbol_digits(symbols: &[u8], radix: &Radix) -> Result<Digits, PrimitivesError> {
    if let Radix::Indexed(_) = radix {
        return Err(encoding_error("indexed radix takes index input"));
    }
    symbols
        .iter()
        .map(|&b| {
            radix.digit_of(b).ok_or_else(|| {
                encoding_error(format!("symbol {:?} not in base-{} alphabet", b as char, radix.base()))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Digits::Positional)
}

fn parse_decimal(text: &[u8]) -> Result<Digits, PrimitivesError> {
    if text.is_empty() {
        return Ok(Digits::Number(BigUint::zero()));
    }
    if !text.iter().all(u8::is_ascii_digit) {
        return Err(encoding_error(format!(
            "invalid decimal {:?}",
            String::from_utf8_lossy(text)
        )));
    }
    BigUint::parse_bytes(text, 10)
        .map(Digits::Number)
        .ok_or_else(|| encoding_error(format!("invalid decimal {:?}", String::from_utf8_lossy(text))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercase hex of `bytes`.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string; odd length or non-hex characters are `InvalidHex`.
pub fn from_hex(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    Octets::Hex(s).to_bytes()
}

/// Normalize text to Unicode NFKD, the form BIP39 sentences are compared in.
pub fn normalize_string(s: &str) -> String {
    s.nfkd().collect()
}
