//! ECDSA signature value with DER and compact serialization.
//!
//! DER output is 0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s> with minimal
//! unsigned integers. The compact form is <header> <32-byte r> <32-byte s>
//! where header = 27 + recovery id, plus 4 when the signer's key is
//! compressed.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::ec::curve::Curve;
use crate::util::{int_to_octets, ByteReader, ByteWriter};
use crate::PrimitivesError;

/// Length of a compact signature.
pub const COMPACT_LEN: usize = 65;

const COMPACT_HEADER_BASE: u8 = 27;
const COMPACT_COMPRESSED_FLAG: u8 = 4;

/// Largest sequence body expressible with a short-form DER length.
const MAX_DER_BODY_LEN: usize = 0x7f;

/// An ECDSA signature (r, s).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    r: BigUint,
    s: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Signature { r, s }
    }

    pub fn r(&self) -> &BigUint {
        &self.r
    }

    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// Whether s lies in the lower half of the group order.
    pub fn is_low_s(&self, curve: &Curve) -> bool {
        self.s <= (curve.order() >> 1)
    }

    /// The equivalent signature with s replaced by n - s when s > n/2.
    ///
    /// Both forms verify; relays that enforce low-S only accept the lower one.
    pub fn to_low_s(&self, curve: &Curve) -> Signature {
        if self.is_low_s(curve) {
            self.clone()
        } else {
            Signature { r: self.r.clone(), s: curve.order() - &self.s }
        }
    }

    /// Parse a DER-encoded signature.
    ///
    /// # Arguments
    /// * `bytes` - DER bytes; trailing data after the sequence is rejected.
    ///
    /// # Returns
    /// `Ok(Signature)`, or `InvalidSignature` for malformed encodings,
    /// negative or zero-length integers.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let mut reader = ByteReader::new(bytes);
        let header = reader.read_u8().map_err(|_| malformed("too short"))?;
        if header != 0x30 {
            return Err(malformed("no header magic"));
        }
        let seq_len = reader.read_u8().map_err(|_| malformed("too short"))? as usize;
        if seq_len != reader.remaining() {
            return Err(malformed("bad length"));
        }
        let r = read_der_int(&mut reader, "R")?;
        let s = read_der_int(&mut reader, "S")?;
        if reader.remaining() != 0 {
            return Err(malformed("trailing bytes"));
        }
        Ok(Signature { r, s })
    }

    /// Serialize in DER.
    ///
    /// # Returns
    /// The DER bytes, or `InvalidSignature` when the components are too
    /// large for single-byte DER lengths.
    pub fn to_der(&self) -> Result<Vec<u8>, PrimitivesError> {
        let rb = canonicalize_int(&self.r);
        let sb = canonicalize_int(&self.s);

        let body_len = 4 + rb.len() + sb.len();
        if body_len > MAX_DER_BODY_LEN {
            return Err(PrimitivesError::InvalidSignature(format!(
                "DER body of {} bytes exceeds {}",
                body_len, MAX_DER_BODY_LEN
            )));
        }
        let mut writer = ByteWriter::with_capacity(body_len + 2);
        writer.write_u8(0x30);
        writer.write_u8(body_len as u8);
        writer.write_u8(0x02);
        writer.write_u8(rb.len() as u8);
        writer.write_bytes(&rb);
        writer.write_u8(0x02);
        writer.write_u8(sb.len() as u8);
        writer.write_bytes(&sb);
        Ok(writer.into_bytes())
    }

    /// Serialize in the 65-byte compact form.
    ///
    /// # Arguments
    /// * `recid` - Recovery id in 0..=3, as returned by `sign_recoverable`.
    /// * `compressed` - Whether the signer's public key is used compressed.
    ///
    /// # Returns
    /// The compact bytes, or `InvalidSignature` if the id is out of range or
    /// a component does not fit 32 bytes.
    pub fn to_compact(&self, recid: u8, compressed: bool) -> Result<Vec<u8>, PrimitivesError> {
        if recid > 3 {
            return Err(PrimitivesError::InvalidSignature(format!(
                "recovery id {} out of range",
                recid
            )));
        }
        let r = int_to_octets(&self.r, 32)
            .map_err(|_| PrimitivesError::InvalidSignature("r exceeds 32 bytes".to_string()))?;
        let s = int_to_octets(&self.s, 32)
            .map_err(|_| PrimitivesError::InvalidSignature("s exceeds 32 bytes".to_string()))?;
        let mut header = COMPACT_HEADER_BASE + recid;
        if compressed {
            header += COMPACT_COMPRESSED_FLAG;
        }
        let mut writer = ByteWriter::with_capacity(COMPACT_LEN);
        writer.write_u8(header);
        writer.write_bytes(&r);
        writer.write_bytes(&s);
        Ok(writer.into_bytes())
    }

    /// Parse a 65-byte compact signature.
    ///
    /// # Returns
    /// The signature, its recovery id and the compressed-key flag.
    pub fn from_compact(bytes: &[u8]) -> Result<(Self, u8, bool), PrimitivesError> {
        if bytes.len() != COMPACT_LEN {
            return Err(PrimitivesError::InvalidSignature(
                "invalid compact signature size".to_string(),
            ));
        }
        let header = bytes[0];
        if !(COMPACT_HEADER_BASE..COMPACT_HEADER_BASE + 8).contains(&header) {
            return Err(PrimitivesError::InvalidSignature(format!(
                "invalid compact header byte {}",
                header
            )));
        }
        let flags = header - COMPACT_HEADER_BASE;
        let compressed = flags & COMPACT_COMPRESSED_FLAG != 0;
        let recid = flags & 3;
        let r = BigUint::from_bytes_be(&bytes[1..33]);
        let s = BigUint::from_bytes_be(&bytes[33..65]);
        Ok((Signature { r, s }, recid, compressed))
    }
}

fn malformed(what: &str) -> PrimitivesError {
    PrimitivesError::InvalidSignature(format!("malformed signature: {}", what))
}

fn read_der_int(reader: &mut ByteReader<'_>, name: &str) -> Result<BigUint, PrimitivesError> {
    let marker = reader
        .read_u8()
        .map_err(|_| malformed(&format!("missing {} marker", name)))?;
    if marker != 0x02 {
        return Err(malformed(&format!("no {} int marker", name)));
    }
    let len = reader
        .read_u8()
        .map_err(|_| malformed(&format!("missing {} length", name)))? as usize;
    if len == 0 {
        return Err(malformed(&format!("bogus {} length", name)));
    }
    let bytes = reader
        .read_bytes(len)
        .map_err(|_| malformed(&format!("bogus {} length", name)))?;
    if bytes[0] & 0x80 != 0 {
        return Err(malformed(&format!("{} is negative", name)));
    }
    Ok(BigUint::from_bytes_be(bytes))
}

/// Minimal big-endian bytes with a 0x00 pad when the high bit is set.
fn canonicalize_int(val: &BigUint) -> Vec<u8> {
    if val.is_zero() {
        return vec![0x00];
    }
    let trimmed = val.to_bytes_be();
    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(&trimmed);
        out
    } else {
        trimmed
    }
}
