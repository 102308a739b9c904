//! Public key: a validated, finite curve point.
//!
//! Parsing accepts compressed (33-byte) and uncompressed (65-byte) SEC1
//! encodings and always checks the point against the curve equation.

use std::fmt;

use crate::ec::curve::{secp256k1, Curve, Point};
use crate::ec::signature::Signature;
use crate::ecdsa;
use crate::hash::hash160;
use crate::PrimitivesError;

/// A public point Q = d*G, never the point at infinity.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    curve: &'static Curve,
    point: Point,
}

impl PublicKey {
    /// Parse a SEC1-encoded secp256k1 public key.
    ///
    /// # Returns
    /// `Ok(PublicKey)`, `InvalidPublicKey` for malformed or infinite
    /// encodings, or `PointNotOnCurve`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        Self::from_bytes_on(secp256k1(), bytes)
    }

    /// Parse a SEC1-encoded public key on `curve`.
    pub fn from_bytes_on(curve: &'static Curve, bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.is_empty() {
            return Err(PrimitivesError::InvalidPublicKey(
                "pubkey bytes are empty".to_string(),
            ));
        }
        let point = curve.decode_point(bytes)?;
        Self::from_point(curve, point)
    }

    /// Parse a hex-encoded secp256k1 public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Wrap a point after checking it is finite and on `curve`.
    pub fn from_point(curve: &'static Curve, point: Point) -> Result<Self, PrimitivesError> {
        if point.is_infinity() {
            return Err(PrimitivesError::InvalidPublicKey(
                "point at infinity".to_string(),
            ));
        }
        if !curve.is_on_curve(&point) {
            return Err(PrimitivesError::PointNotOnCurve);
        }
        Ok(PublicKey { curve, point })
    }

    /// d*G for an in-range d is finite and on the curve by construction.
    pub(crate) fn from_private_point(curve: &'static Curve, point: Point) -> Self {
        PublicKey { curve, point }
    }

    /// Recover the signer's key from a compact signature over `digest`.
    ///
    /// # Returns
    /// The key and whether the signer marked it as compressed.
    pub fn recover_compact(digest: &[u8], compact: &[u8]) -> Result<(Self, bool), PrimitivesError> {
        let (sig, recid, compressed) = Signature::from_compact(compact)?;
        let curve = secp256k1();
        let point = ecdsa::recover_public_key(curve, digest, &sig, recid)?;
        Ok((PublicKey { curve, point }, compressed))
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    /// 0x02/0x03 || x.
    pub fn to_compressed(&self) -> Vec<u8> {
        self.curve.encode_point(&self.point, true)
    }

    /// 0x04 || x || y.
    pub fn to_uncompressed(&self) -> Vec<u8> {
        self.curve.encode_point(&self.point, false)
    }

    /// Hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// RIPEMD-160(SHA-256(compressed key)).
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_compressed())
    }

    /// First four bytes of [`PublicKey::hash160`], the BIP32 key fingerprint.
    pub fn fingerprint(&self) -> [u8; 4] {
        let h = self.hash160();
        [h[0], h[1], h[2], h[3]]
    }

    /// Verify an ECDSA signature over `digest`.
    pub fn verify(&self, digest: &[u8], sig: &Signature) -> bool {
        ecdsa::verify(self.curve, &self.point, digest, sig)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
