//! ECDSA signing, verification and public-key recovery.
//!
//! These are pure functions over a curve, a scalar or point, and a message
//! digest; the key types in [`crate::ec`] wrap them. Digests are converted
//! to integers with `bits2int`, keeping the leftmost bits up to the bit
//! length of n. Nonces come from a [`NonceGenerator`]; [`Rfc6979`] derives
//! them deterministically from the key and digest.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use zeroize::Zeroizing;

use crate::ec::curve::{Curve, Point};
use crate::ec::signature::Signature;
use crate::hash::{sha256_hmac, sha256_hmac_parts};
use crate::util::int_to_octets;
use crate::PrimitivesError;

/// Source of per-signature nonces.
pub trait NonceGenerator {
    /// Produce k in [1, n-1] for private scalar `d` and message `digest`.
    fn generate_k(
        &self,
        n: &BigUint,
        d: &BigUint,
        digest: &[u8],
    ) -> Result<BigUint, PrimitivesError>;
}

/// Deterministic nonces per RFC 6979 section 3.2, instantiated with
/// HMAC-SHA256.
///
/// Optional extra data is mixed into the seeding steps (section 3.6), which
/// gives a caller a fresh nonce after a `SigningRetry`.
#[derive(Debug, Clone, Default)]
pub struct Rfc6979 {
    extra_data: Vec<u8>,
}

impl Rfc6979 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_data(extra_data: impl Into<Vec<u8>>) -> Self {
        Rfc6979 { extra_data: extra_data.into() }
    }
}

impl NonceGenerator for Rfc6979 {
    fn generate_k(
        &self,
        n: &BigUint,
        d: &BigUint,
        digest: &[u8],
    ) -> Result<BigUint, PrimitivesError> {
        let qlen = n.bits();
        let rolen = ((qlen + 7) / 8) as usize;
        let x = Zeroizing::new(int_to_octets(d, rolen)?);
        let h = int_to_octets(&(bits2int(digest, qlen) % n), rolen)?;
        let extra = self.extra_data.as_slice();

        let mut v = [0x01u8; 32];
        let mut k = Zeroizing::new([0x00u8; 32]);

        *k = sha256_hmac_parts(&k[..], &[&v[..], &[0x00u8], x.as_slice(), &h, extra]);
        v = sha256_hmac(&k[..], &v);
        *k = sha256_hmac_parts(&k[..], &[&v[..], &[0x01u8], x.as_slice(), &h, extra]);
        v = sha256_hmac(&k[..], &v);

        loop {
            let mut t = Zeroizing::new(Vec::with_capacity(rolen + 32));
            while t.len() < rolen {
                v = sha256_hmac(&k[..], &v);
                t.extend_from_slice(&v);
            }
            let candidate = bits2int(t.as_slice(), qlen);
            if !candidate.is_zero() && &candidate < n {
                return Ok(candidate);
            }
            *k = sha256_hmac_parts(&k[..], &[&v[..], &[0x00u8]]);
            v = sha256_hmac(&k[..], &v);
        }
    }
}

/// Interpret `data` as a big-endian integer, keeping only its leftmost
/// `qlen` bits.
pub fn bits2int(data: &[u8], qlen: u64) -> BigUint {
    let value = BigUint::from_bytes_be(data);
    let blen = data.len() as u64 * 8;
    if blen > qlen {
        value >> (blen - qlen)
    } else {
        value
    }
}

fn digest_to_int(curve: &Curve, digest: &[u8]) -> BigUint {
    bits2int(digest, curve.order().bits())
}

fn in_scalar_range(curve: &Curve, v: &BigUint) -> bool {
    !v.is_zero() && v < curve.order()
}

/// Sign `digest` with private scalar `d`.
///
/// # Arguments
/// * `curve` - Domain parameters.
/// * `d` - Private scalar in [1, n-1].
/// * `digest` - Message digest; only its leftmost bits up to the size of n are used.
/// * `nonces` - Nonce source.
///
/// # Returns
/// The signature, `InvalidPrivateKey` for an out-of-range scalar, or
/// `SigningRetry` when r or s comes out zero.
pub fn sign(
    curve: &Curve,
    d: &BigUint,
    digest: &[u8],
    nonces: &dyn NonceGenerator,
) -> Result<Signature, PrimitivesError> {
    sign_recoverable(curve, d, digest, nonces).map(|(sig, _)| sig)
}

/// Sign `digest` and also return the recovery id.
///
/// Bit 0 of the id is the parity of R.y; bit 1 is set when R.x >= n.
pub fn sign_recoverable(
    curve: &Curve,
    d: &BigUint,
    digest: &[u8],
    nonces: &dyn NonceGenerator,
) -> Result<(Signature, u8), PrimitivesError> {
    let n = curve.order();
    if !in_scalar_range(curve, d) {
        return Err(PrimitivesError::InvalidPrivateKey(
            "private scalar outside [1, n-1]".to_string(),
        ));
    }
    let k = nonces.generate_k(n, d, digest)?;
    if !in_scalar_range(curve, &k) {
        return Err(PrimitivesError::Other("nonce outside [1, n-1]".to_string()));
    }

    let (rx, ry) = match curve.mul_generator(&k) {
        Point::Affine { x, y } => (x, y),
        Point::Infinity => return Err(PrimitivesError::SigningRetry("r")),
    };
    let r = &rx % n;
    if r.is_zero() {
        tracing::debug!("signature r is zero");
        return Err(PrimitivesError::SigningRetry("r"));
    }
    let k_inv = k
        .modinv(n)
        .ok_or(PrimitivesError::SigningRetry("nonce"))?;
    let e = digest_to_int(curve, digest);
    let s = (k_inv * ((e + d * &r) % n)) % n;
    if s.is_zero() {
        tracing::debug!("signature s is zero");
        return Err(PrimitivesError::SigningRetry("s"));
    }

    let mut recid = u8::from(ry.bit(0));
    if &rx >= n {
        recid |= 2;
    }
    Ok((Signature::new(r, s), recid))
}

/// Verify `sig` over `digest` against public point `q`.
///
/// Returns false for components outside [1, n-1] or an invalid `q`.
pub fn verify(curve: &Curve, q: &Point, digest: &[u8], sig: &Signature) -> bool {
    let n = curve.order();
    if !in_scalar_range(curve, sig.r()) || !in_scalar_range(curve, sig.s()) {
        return false;
    }
    if q.is_infinity() || !curve.is_on_curve(q) {
        return false;
    }
    let w = match sig.s().modinv(n) {
        Some(w) => w,
        None => return false,
    };
    let e = digest_to_int(curve, digest);
    let u1 = (e * &w) % n;
    let u2 = (sig.r() * &w) % n;
    match curve.mul_add(&u1, &u2, q) {
        Point::Affine { x, .. } => &(x % n) == sig.r(),
        Point::Infinity => false,
    }
}

/// Q = r^-1 (s*R - e*G) for the given R.
fn recover_from_r(curve: &Curve, r_point: &Point, digest: &[u8], sig: &Signature) -> Option<Point> {
    let n = curve.order();
    let r_inv = sig.r().modinv(n)?;
    let e = digest_to_int(curve, digest) % n;
    let neg_e = (n - e) % n;
    let u1 = (neg_e * &r_inv) % n;
    let u2 = (sig.s() * &r_inv) % n;
    let q = curve.mul_add(&u1, &u2, r_point);
    if q.is_infinity() {
        None
    } else {
        Some(q)
    }
}

/// All public points for which `sig` is a valid signature over `digest`.
///
/// Candidates come from both square roots at x = r; each survivor has been
/// checked with [`verify`].
pub fn recover_public_keys(curve: &Curve, digest: &[u8], sig: &Signature) -> Vec<Point> {
    if !in_scalar_range(curve, sig.r()) || !in_scalar_range(curve, sig.s()) {
        return Vec::new();
    }
    let mut found = Vec::with_capacity(2);
    for odd in [false, true] {
        let y = match curve.y_for_x(sig.r(), odd) {
            Ok(y) => y,
            Err(_) => continue,
        };
        let r_point = Point::Affine { x: sig.r().clone(), y };
        if let Some(q) = recover_from_r(curve, &r_point, digest, sig) {
            if verify(curve, &q, digest, sig) && !found.contains(&q) {
                found.push(q);
            }
        }
    }
    found
}

/// Recover the signer's public point using the recovery id from
/// [`sign_recoverable`].
pub fn recover_public_key(
    curve: &Curve,
    digest: &[u8],
    sig: &Signature,
    recid: u8,
) -> Result<Point, PrimitivesError> {
    if recid > 3 {
        return Err(PrimitivesError::InvalidSignature(format!(
            "recovery id {} out of range",
            recid
        )));
    }
    if !in_scalar_range(curve, sig.r()) || !in_scalar_range(curve, sig.s()) {
        return Err(PrimitivesError::InvalidSignature(
            "signature component outside [1, n-1]".to_string(),
        ));
    }
    let mut x = sig.r().clone();
    if recid & 2 != 0 {
        x += curve.order();
    }
    if &x >= curve.p() {
        return Err(PrimitivesError::InvalidSignature(
            "recovered x exceeds field".to_string(),
        ));
    }
    let y = curve.y_for_x(&x, recid & 1 == 1)?;
    let r_point = Point::Affine { x, y };
    if curve.cofactor() != 1 && !curve.mul(curve.order(), &r_point).is_infinity() {
        return Err(PrimitivesError::InvalidSignature(
            "R is not in the generator subgroup".to_string(),
        ));
    }
    let q = recover_from_r(curve, &r_point, digest, sig)
        .ok_or_else(|| PrimitivesError::InvalidSignature("recovered point is infinity".to_string()))?;
    if !verify(curve, &q, digest, sig) {
        return Err(PrimitivesError::InvalidSignature(
            "recovered key does not verify".to_string(),
        ));
    }
    Ok(q)
}

/// Fixed scalar used as a nonce; test-only since reusing k leaks the key.
#[cfg(test)]
pub(crate) struct FixedNonce(pub BigUint);

#[cfg(test)]
impl NonceGenerator for FixedNonce {
    fn generate_k(&self, _n: &BigUint, _d: &BigUint, _digest: &[u8]) -> Result<BigUint, PrimitivesError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::curve::secp256k1;
    use crate::hash::sha256;
    use k256::ecdsa::signature::hazmat::PrehashSigner;

    fn hex_int(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    fn k256_sign(d: &BigUint, digest: &[u8; 32]) -> (BigUint, BigUint) {
        let key_bytes = int_to_octets(d, 32).unwrap();
        let sk = k256::ecdsa::SigningKey::from_bytes(k256::FieldBytes::from_slice(&key_bytes))
            .unwrap();
        let sig: k256::ecdsa::Signature = sk.sign_prehash(digest).unwrap();
        let (r, s) = sig.split_bytes();
        (BigUint::from_bytes_be(&r), BigUint::from_bytes_be(&s))
    }

    #[test]
    fn test_rfc6979_satoshi_nonce() {
        let c = secp256k1();
        let digest = sha256(b"Satoshi Nakamoto");
        let k = Rfc6979::new()
            .generate_k(c.order(), &BigUint::one(), &digest)
            .unwrap();
        assert_eq!(
            k,
            hex_int("8F8A276C19F4149656B280621E358CCE24F5F52542772691EE69063B74F15D15")
        );
    }

    #[test]
    fn test_sign_matches_k256() {
        let c = secp256k1();
        let keys = [
            BigUint::one(),
            hex_int("eaf02ca348c524e6392655ba4d29603cd1a7347d9d65cfe93ce1ebffdca22694"),
            c.order() - 1u32,
        ];
        for d in &keys {
            for msg in [&b"hello"[..], b"", b"Everything should be made as simple as possible"] {
                let digest = sha256(msg);
                let ours = sign(c, d, &digest, &Rfc6979::new()).unwrap();
                let (r, s) = k256_sign(d, &digest);
                assert_eq!(ours.r(), &r);
                assert!(ours.s() == &s || ours.s() == &(c.order() - &s));
            }
        }
    }

    #[test]
    fn test_sign_verify_and_tamper() {
        let c = secp256k1();
        let d = hex_int("1e99423a4ed27608a15a2616a2b0e9e52ced330ac530edcc32c8ffc6a526aedd");
        let q = c.mul_generator(&d);
        let digest = sha256(b"pay to the order of");
        let sig = sign(c, &d, &digest, &Rfc6979::new()).unwrap();
        assert!(verify(c, &q, &digest, &sig));

        let other = sha256(b"pay to the order of someone else");
        assert!(!verify(c, &q, &other, &sig));

        let bumped_s = Signature::new(sig.r().clone(), (sig.s() + 1u32) % c.order());
        assert!(!verify(c, &q, &digest, &bumped_s));

        let wrong_key = c.mul_generator(&(&d + 1u32));
        assert!(!verify(c, &wrong_key, &digest, &sig));

        for bit in [0u64, 17, 128, 255] {
            let mask = BigUint::one() << bit;
            let bad_r = Signature::new(sig.r() ^ &mask, sig.s().clone());
            assert!(!verify(c, &q, &digest, &bad_r), "r bit {}", bit);
            let bad_s = Signature::new(sig.r().clone(), sig.s() ^ &mask);
            assert!(!verify(c, &q, &digest, &bad_s), "s bit {}", bit);
        }
    }

    #[test]
    fn test_sign_is_deterministic_and_extra_data_changes_nonce() {
        let c = secp256k1();
        let d = BigUint::from(0xC0FFEEu32);
        let digest = sha256(b"deterministic");
        let a = sign(c, &d, &digest, &Rfc6979::new()).unwrap();
        let b = sign(c, &d, &digest, &Rfc6979::new()).unwrap();
        assert_eq!(a, b);
        let fresh = sign(c, &d, &digest, &Rfc6979::with_extra_data(vec![1u8; 32])).unwrap();
        assert_ne!(a.r(), fresh.r());
        assert!(verify(c, &c.mul_generator(&d), &digest, &fresh));
    }

    #[test]
    fn test_verify_rejects_out_of_range_components() {
        let c = secp256k1();
        let d = BigUint::from(42u32);
        let q = c.mul_generator(&d);
        let digest = sha256(b"range");
        let sig = sign(c, &d, &digest, &Rfc6979::new()).unwrap();

        let zero_r = Signature::new(BigUint::zero(), sig.s().clone());
        assert!(!verify(c, &q, &digest, &zero_r));
        let big_s = Signature::new(sig.r().clone(), c.order().clone());
        assert!(!verify(c, &q, &digest, &big_s));
        assert!(!verify(c, &Point::Infinity, &digest, &sig));
    }

    #[test]
    fn test_sign_rejects_bad_private_scalar() {
        let c = secp256k1();
        let digest = sha256(b"x");
        assert!(matches!(
            sign(c, &BigUint::zero(), &digest, &Rfc6979::new()),
            Err(PrimitivesError::InvalidPrivateKey(_))
        ));
        assert!(sign(c, c.order(), &digest, &Rfc6979::new()).is_err());
    }

    #[test]
    fn test_zero_s_is_retryable() {
        let c = secp256k1();
        let n = c.order();
        // With k = 1 and d = 1, r = Gx mod n; choosing e = -r makes s zero.
        let r = c.generator().x().unwrap() % n;
        let e = (n - &r) % n;
        let digest = int_to_octets(&e, 32).unwrap();
        let err = sign(c, &BigUint::one(), &digest, &FixedNonce(BigUint::one())).unwrap_err();
        assert!(matches!(err, PrimitivesError::SigningRetry(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_recover_public_keys_contains_signer() {
        let c = secp256k1();
        let d = hex_int("0f0e0d0c0b0a09080706050403020100");
        let q = c.mul_generator(&d);
        let digest = sha256(b"recover me");
        let sig = sign(c, &d, &digest, &Rfc6979::new()).unwrap();
        let candidates = recover_public_keys(c, &digest, &sig);
        assert!(!candidates.is_empty() && candidates.len() <= 2);
        assert!(candidates.contains(&q));
        for candidate in &candidates {
            assert!(verify(c, candidate, &digest, &sig));
        }
    }

    #[test]
    fn test_recover_public_key_with_recid() {
        let c = secp256k1();
        for seed in [7u32, 1234, 99_999] {
            let d = BigUint::from(seed);
            let digest = sha256(&seed.to_be_bytes());
            let (sig, recid) = sign_recoverable(c, &d, &digest, &Rfc6979::new()).unwrap();
            assert!(recid < 2);
            let q = recover_public_key(c, &digest, &sig, recid).unwrap();
            assert_eq!(q, c.mul_generator(&d));
            // the other parity yields a different key or fails
            if let Ok(other) = recover_public_key(c, &digest, &sig, recid ^ 1) {
                assert_ne!(other, q);
            }
        }
    }

    #[test]
    fn test_recover_rejects_bad_recid() {
        let c = secp256k1();
        let sig = Signature::new(BigUint::one(), BigUint::one());
        assert!(recover_public_key(c, &[0u8; 32], &sig, 4).is_err());
    }

    #[test]
    fn test_bits2int_truncates_long_digest() {
        let mut long = vec![0u8; 64];
        long[0] = 0x80;
        let v = bits2int(&long, 256);
        assert_eq!(v.bits(), 256);
        assert_eq!(bits2int(&[0x01, 0x02], 256), BigUint::from(0x0102u32));
    }
}
