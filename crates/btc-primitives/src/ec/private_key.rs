//! Private scalar with signing support.
//!
//! The scalar is held as fixed-width big-endian bytes and zeroized on drop.
//! Its `Debug` output never shows the secret.

use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::ec::curve::{secp256k1, Curve};
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::ecdsa::{self, Rfc6979};
use crate::util::int_to_octets;
use crate::PrimitivesError;

/// A private scalar d in [1, n-1] bound to its curve.
#[derive(Clone)]
pub struct PrivateKey {
    curve: &'static Curve,
    secret: Vec<u8>,
}

impl PrivateKey {
    /// Generate a random secp256k1 key from the OS random number generator.
    pub fn new() -> Self {
        Self::random_on(secp256k1())
    }

    /// Generate a random key on `curve` by rejection sampling.
    pub fn random_on(curve: &'static Curve) -> Self {
        let mut buf = vec![0u8; curve.scalar_len()];
        loop {
            OsRng.fill_bytes(&mut buf);
            if let Ok(key) = Self::from_bytes_on(curve, &buf) {
                buf.zeroize();
                return key;
            }
        }
    }

    /// Create a secp256k1 key from a 32-byte big-endian scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)`, or `InvalidPrivateKey` if the length is wrong or the
    /// scalar is zero or not below n.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        Self::from_bytes_on(secp256k1(), bytes)
    }

    /// Create a key on `curve` from big-endian bytes of the scalar length.
    pub fn from_bytes_on(curve: &'static Curve, bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let expected = curve.scalar_len();
        if bytes.len() != expected {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                expected,
                bytes.len()
            )));
        }
        Self::from_scalar(curve, &BigUint::from_bytes_be(bytes))
    }

    /// Create a key on `curve` from an integer scalar.
    pub fn from_scalar(curve: &'static Curve, d: &BigUint) -> Result<Self, PrimitivesError> {
        if d.is_zero() || d >= curve.order() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "scalar outside [1, n-1]".to_string(),
            ));
        }
        Ok(PrivateKey { curve, secret: int_to_octets(d, curve.scalar_len())? })
    }

    /// Create a secp256k1 key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let mut bytes = hex::decode(hex_str)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve
    }

    /// Big-endian scalar bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.secret.clone()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.secret)
    }

    pub(crate) fn scalar(&self) -> BigUint {
        BigUint::from_bytes_be(&self.secret)
    }

    /// The public key d*G.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_private_point(self.curve, self.curve.mul_generator(&self.scalar()))
    }

    /// Sign a message digest with RFC 6979 nonces.
    ///
    /// The signature is returned as computed; see [`Signature::to_low_s`].
    pub fn sign(&self, digest: &[u8]) -> Result<Signature, PrimitivesError> {
        ecdsa::sign(self.curve, &self.scalar(), digest, &Rfc6979::new())
    }

    /// Sign and return the recovery id alongside the signature.
    pub fn sign_recoverable(&self, digest: &[u8]) -> Result<(Signature, u8), PrimitivesError> {
        ecdsa::sign_recoverable(self.curve, &self.scalar(), digest, &Rfc6979::new())
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.secret == other.secret
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve.name())
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_BYTES: [u8; 32] = [
        0xea, 0xf0, 0x2c, 0xa3, 0x48, 0xc5, 0x24, 0xe6, 0x39, 0x26, 0x55, 0xba, 0x4d, 0x29, 0x60,
        0x3c, 0xd1, 0xa7, 0x34, 0x7d, 0x9d, 0x65, 0xcf, 0xe9, 0x3c, 0xe1, 0xeb, 0xff, 0xdc, 0xa2,
        0x26, 0x94,
    ];

    #[test]
    fn test_priv_key_sign_and_serialize() {
        let priv_key = PrivateKey::from_bytes(&KEY_BYTES).unwrap();
        let pub_key = priv_key.pub_key();

        let uncompressed = pub_key.to_uncompressed();
        assert_eq!(PublicKey::from_bytes(&uncompressed).unwrap(), pub_key);

        let hash: [u8; 10] = [0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0x8, 0x9];
        let sig = priv_key.sign(&hash).unwrap();
        assert!(pub_key.verify(&hash, &sig));

        assert_eq!(priv_key.to_bytes(), KEY_BYTES.to_vec());
        assert_eq!(PrivateKey::from_hex(&priv_key.to_hex()).unwrap(), priv_key);
    }

    #[test]
    fn test_pub_key_matches_k256() {
        let priv_key = PrivateKey::from_bytes(&KEY_BYTES).unwrap();
        let sk = k256::ecdsa::SigningKey::from_bytes(k256::FieldBytes::from_slice(&KEY_BYTES))
            .unwrap();
        let expected = sk.verifying_key().to_encoded_point(true);
        assert_eq!(priv_key.pub_key().to_compressed(), expected.as_bytes().to_vec());
    }

    #[test]
    fn test_scalar_one_is_generator() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let key = PrivateKey::from_bytes(&one).unwrap();
        assert_eq!(
            key.pub_key().to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_rejects_out_of_range_scalars() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        let n = int_to_octets(secp256k1().order(), 32).unwrap();
        assert!(matches!(
            PrivateKey::from_bytes(&n),
            Err(PrimitivesError::InvalidPrivateKey(_))
        ));
        assert!(PrivateKey::from_bytes(&KEY_BYTES[..31]).is_err());
        assert!(PrivateKey::from_hex("").is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_random_keys_are_valid_and_distinct() {
        let a = PrivateKey::new();
        let b = PrivateKey::new();
        assert_ne!(a, b);
        assert_eq!(a.to_bytes().len(), 32);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = PrivateKey::from_bytes(&KEY_BYTES).unwrap();
        let shown = format!("{:?}", key);
        assert!(shown.contains("redacted"));
        assert!(!shown.contains(&key.to_hex()));
    }
}
