//! BIP32 hierarchical deterministic keys.
//!
//! An extended key serializes to 78 bytes:
//!
//! ```text
//! [ 0.. 4] version
//! [ 4.. 5] depth
//! [ 5.. 9] parent key fingerprint
//! [ 9..13] child index (big-endian)
//! [13..45] chain code
//! [45..78] key: 0x00 || private scalar, or a compressed public point
//! ```
//!
//! and travels as Base58Check text (`xprv...`, `xpub...`, `tprv...`).

use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use zeroize::Zeroizing;

use crate::base58;
use crate::ec::curve::secp256k1;
use crate::ec::{PrivateKey, PublicKey};
use crate::hash::sha512_hmac;
use crate::util::{ByteReader, ByteWriter, Octets};
use crate::PrimitivesError;

/// Serialized length of an extended key, without checksum.
pub const EXTENDED_KEY_LEN: usize = 78;

/// First hardened child index.
pub const HARDENED: u32 = 0x8000_0000;

/// HMAC key for master key generation.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

pub const MAINNET_PRV: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
pub const TESTNET_PRV: [u8; 4] = [0x04, 0x35, 0x83, 0x94];
pub const SEGWIT_PRV: [u8; 4] = [0x04, 0xB2, 0x43, 0x0C];

pub const MAINNET_PUB: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
pub const TESTNET_PUB: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];
pub const SEGWIT_PUB: [u8; 4] = [0x04, 0xB2, 0x47, 0x46];

/// Network family selected by an extended key's version bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Segwit,
}

impl Network {
    pub fn private_version(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => MAINNET_PRV,
            Network::Testnet => TESTNET_PRV,
            Network::Segwit => SEGWIT_PRV,
        }
    }

    pub fn public_version(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => MAINNET_PUB,
            Network::Testnet => TESTNET_PUB,
            Network::Segwit => SEGWIT_PUB,
        }
    }

    /// Classify version bytes as (network, is_private).
    pub fn from_version(version: &[u8]) -> Option<(Network, bool)> {
        [Network::Mainnet, Network::Testnet, Network::Segwit]
            .into_iter()
            .find_map(|net| {
                if version == &net.private_version()[..] {
                    Some((net, true))
                } else if version == &net.public_version()[..] {
                    Some((net, false))
                } else {
                    None
                }
            })
    }
}

/// Key half of an extended key.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyData {
    Private(PrivateKey),
    Public(PublicKey),
}

/// A decoded BIP32 extended key.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    network: Network,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    chain_code: Zeroizing<[u8; 32]>,
    key: KeyData,
}

impl ExtendedKey {
    /// Derive the master private key from a seed.
    ///
    /// # Arguments
    /// * `seed` - Seed bytes or hex.
    /// * `network` - Selects the version bytes.
    ///
    /// # Returns
    /// The master key, or `InvalidPrivateKey` in the (negligible) case that
    /// the HMAC output is not a valid scalar.
    pub fn master<'a>(
        seed: impl Into<Octets<'a>>,
        network: Network,
    ) -> Result<Self, PrimitivesError> {
        let seed = Zeroizing::new(seed.into().to_bytes()?);
        let i = Zeroizing::new(sha512_hmac(MASTER_HMAC_KEY, &seed));
        let (il, ir) = i.split_at(32);
        let key = PrivateKey::from_bytes(il)?;
        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(ir);
        Ok(ExtendedKey {
            network,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_index: 0,
            chain_code,
            key: KeyData::Private(key),
        })
    }

    /// Parse the 78-byte serialization.
    ///
    /// # Returns
    /// The key, `LengthMismatch`, `InvalidVersion` for unknown version
    /// bytes, or `InvalidExtendedKey` when the key field does not match the
    /// version or the header fields are inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != EXTENDED_KEY_LEN {
            return Err(PrimitivesError::LengthMismatch {
                expected: EXTENDED_KEY_LEN,
                got: bytes.len(),
            });
        }
        let mut reader = ByteReader::new(bytes);
        let version: [u8; 4] = reader.read_array()?;
        let depth = reader.read_u8()?;
        let parent_fingerprint: [u8; 4] = reader.read_array()?;
        let child_index = reader.read_u32_be()?;
        let chain_code = Zeroizing::new(reader.read_array::<32>()?);
        let key_field = reader.read_bytes(33)?;

        let (network, is_private) = Network::from_version(&version).ok_or_else(|| {
            tracing::debug!(version = %hex::encode(version), "unknown extended key version");
            PrimitivesError::InvalidVersion(hex::encode(version))
        })?;

        if depth == 0 && (parent_fingerprint != [0; 4] || child_index != 0) {
            return Err(PrimitivesError::InvalidExtendedKey(
                "zero depth with non-zero parent fingerprint or index".to_string(),
            ));
        }

        let key = match (key_field[0], is_private) {
            (0x00, true) => KeyData::Private(PrivateKey::from_bytes(&key_field[1..])?),
            (0x02 | 0x03, false) => KeyData::Public(PublicKey::from_bytes(key_field)?),
            (0x00, false) => {
                return Err(PrimitivesError::InvalidExtendedKey(
                    "private key data under a public version".to_string(),
                ))
            }
            _ => {
                return Err(PrimitivesError::InvalidExtendedKey(
                    "key data does not match version".to_string(),
                ))
            }
        };

        Ok(ExtendedKey { network, depth, parent_fingerprint, child_index, chain_code, key })
    }

    /// The 78-byte serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(EXTENDED_KEY_LEN);
        writer.write_bytes(&self.version());
        writer.write_u8(self.depth);
        writer.write_bytes(&self.parent_fingerprint);
        writer.write_u32_be(self.child_index);
        writer.write_bytes(&self.chain_code[..]);
        match &self.key {
            KeyData::Private(k) => {
                writer.write_u8(0x00);
                writer.write_bytes(&Zeroizing::new(k.to_bytes()));
            }
            KeyData::Public(p) => writer.write_bytes(&p.to_compressed()),
        }
        writer.into_bytes()
    }

    /// Decode Base58Check text, verifying checksum and length.
    pub fn decode(s: &str) -> Result<Self, PrimitivesError> {
        let bytes = Zeroizing::new(base58::check_decode_len(s, EXTENDED_KEY_LEN)?);
        Self::from_bytes(&bytes)
    }

    /// Encode as Base58Check text.
    pub fn encode(&self) -> String {
        base58::check_encode(&Zeroizing::new(self.to_bytes()))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn version(&self) -> [u8; 4] {
        if self.is_private() {
            self.network.private_version()
        } else {
            self.network.public_version()
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyData::Private(_))
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn key(&self) -> &KeyData {
        &self.key
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        match &self.key {
            KeyData::Private(k) => Some(k),
            KeyData::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            KeyData::Private(k) => k.pub_key(),
            KeyData::Public(p) => p.clone(),
        }
    }

    /// Fingerprint of this key, used as the parent fingerprint of its children.
    pub fn fingerprint(&self) -> [u8; 4] {
        self.public_key().fingerprint()
    }

    /// The extended public key with the same position in the tree.
    ///
    /// # Returns
    /// `InvalidExtendedKey` if this is already a public key.
    pub fn neuter(&self) -> Result<ExtendedKey, PrimitivesError> {
        match &self.key {
            KeyData::Private(k) => Ok(ExtendedKey {
                network: self.network,
                depth: self.depth,
                parent_fingerprint: self.parent_fingerprint,
                child_index: self.child_index,
                chain_code: self.chain_code.clone(),
                key: KeyData::Public(k.pub_key()),
            }),
            KeyData::Public(_) => Err(PrimitivesError::InvalidExtendedKey(
                "extended key is not a private one".to_string(),
            )),
        }
    }

    fn child_depth(&self) -> Result<u8, PrimitivesError> {
        self.depth.checked_add(1).ok_or_else(|| {
            PrimitivesError::InvalidExtendedKey("maximum depth reached".to_string())
        })
    }

    /// Private parent to private child.
    ///
    /// Indices at or above [`HARDENED`] derive hardened children.
    ///
    /// # Returns
    /// The child, `InvalidExtendedKey` for a public parent, or
    /// `InvalidChild` when this index yields no valid key.
    pub fn ckd_priv(&self, index: u32) -> Result<ExtendedKey, PrimitivesError> {
        let parent = self.private_key().ok_or_else(|| {
            PrimitivesError::InvalidExtendedKey(
                "private derivation needs a private parent".to_string(),
            )
        })?;
        let depth = self.child_depth()?;
        let parent_pub = parent.pub_key();

        let mut data = Zeroizing::new(Vec::with_capacity(37));
        if index >= HARDENED {
            data.push(0x00);
            data.extend_from_slice(&Zeroizing::new(parent.to_bytes()));
        } else {
            data.extend_from_slice(&parent_pub.to_compressed());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let i = Zeroizing::new(sha512_hmac(&self.chain_code[..], &data));
        let (il, ir) = i.split_at(32);
        let curve = secp256k1();
        let n = curve.order();
        let tweak = BigUint::from_bytes_be(il);
        if &tweak >= n {
            tracing::warn!(index, "derived tweak not below n, skip to next index");
            return Err(PrimitivesError::InvalidChild(index));
        }
        let child_scalar = (tweak + parent.scalar()) % n;
        if child_scalar.is_zero() {
            tracing::warn!(index, "derived child key is zero, skip to next index");
            return Err(PrimitivesError::InvalidChild(index));
        }
        let key = PrivateKey::from_scalar(curve, &child_scalar)?;

        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(ir);
        tracing::trace!(depth, index, "derived private child");
        Ok(ExtendedKey {
            network: self.network,
            depth,
            parent_fingerprint: parent_pub.fingerprint(),
            child_index: index,
            chain_code,
            key: KeyData::Private(key),
        })
    }

    /// Public parent to public child; hardened indices are rejected.
    ///
    /// Works on private parents too, yielding the neutered child.
    pub fn ckd_pub(&self, index: u32) -> Result<ExtendedKey, PrimitivesError> {
        if index >= HARDENED {
            return Err(PrimitivesError::InvalidExtendedKey(format!(
                "cannot derive hardened child {} from a public key",
                index
            )));
        }
        let depth = self.child_depth()?;
        let parent_pub = self.public_key();

        let mut data = Vec::with_capacity(37);
        data.extend_from_slice(&parent_pub.to_compressed());
        data.extend_from_slice(&index.to_be_bytes());

        let i = Zeroizing::new(sha512_hmac(&self.chain_code[..], &data));
        let (il, ir) = i.split_at(32);
        let curve = secp256k1();
        let tweak = BigUint::from_bytes_be(il);
        if &tweak >= curve.order() {
            tracing::warn!(index, "derived tweak not below n, skip to next index");
            return Err(PrimitivesError::InvalidChild(index));
        }
        let point = curve.add(&curve.mul_generator(&tweak), parent_pub.point());
        if point.is_infinity() {
            tracing::warn!(index, "derived child point is infinity, skip to next index");
            return Err(PrimitivesError::InvalidChild(index));
        }
        let key = PublicKey::from_point(curve, point)?;

        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(ir);
        tracing::trace!(depth, index, "derived public child");
        Ok(ExtendedKey {
            network: self.network,
            depth,
            parent_fingerprint: parent_pub.fingerprint(),
            child_index: index,
            chain_code,
            key: KeyData::Public(key),
        })
    }

    /// Derive one child, privately when possible.
    pub fn derive_child(&self, index: u32) -> Result<ExtendedKey, PrimitivesError> {
        if self.is_private() {
            self.ckd_priv(index)
        } else {
            self.ckd_pub(index)
        }
    }

    /// Walk a path such as `m/0'/1/2h` from this key.
    pub fn derive_path(&self, path: &str) -> Result<ExtendedKey, PrimitivesError> {
        let mut key = self.clone();
        for index in parse_path(path)? {
            key = key.derive_child(index)?;
        }
        Ok(key)
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("network", &self.network)
            .field("private", &self.is_private())
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_index", &self.child_index)
            .finish_non_exhaustive()
    }
}

/// Parse a derivation path into child indices.
///
/// Accepts an optional leading `m` or `M`; hardened steps carry a `'`, `h`
/// or `H` suffix.
pub fn parse_path(path: &str) -> Result<Vec<u32>, PrimitivesError> {
    let path = path.trim();
    let mut parts = path.split('/').peekable();
    if matches!(parts.peek(), Some(&"m") | Some(&"M")) {
        parts.next();
    }
    let mut indices = Vec::new();
    for part in parts {
        let (digits, hardened) = match part.strip_suffix(|c: char| c == '\'' || c == 'h' || c == 'H') {
            Some(d) => (d, true),
            None => (part, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitivesError::InvalidPath(format!("bad path element {:?}", part)));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| PrimitivesError::InvalidPath(format!("index {} out of range", digits)))?;
        if index >= HARDENED {
            return Err(PrimitivesError::InvalidPath(format!("index {} out of range", digits)));
        }
        indices.push(if hardened { index | HARDENED } else { index });
    }
    Ok(indices)
}

/// Master extended private key, Base58Check-encoded.
///
/// # Arguments
/// * `seed` - Seed bytes or hex.
/// * `version` - One of the private version constants, as bytes or hex.
///
/// # Returns
/// The `xprv`-style string, or `InvalidVersion` for a non-private version.
pub fn xmprv_from_seed<'a, 'b>(
    seed: impl Into<Octets<'a>>,
    version: impl Into<Octets<'b>>,
) -> Result<String, PrimitivesError> {
    let version = version.into().to_bytes()?;
    let network = match Network::from_version(&version) {
        Some((net, true)) => net,
        _ => {
            return Err(PrimitivesError::InvalidVersion(format!(
                "invalid private version ({})",
                hex::encode(&version)
            )))
        }
    };
    Ok(ExtendedKey::master(seed, network)?.encode())
}

/// Neutered derivation: the extended public key for an extended private key.
///
/// # Returns
/// The `xpub`-style string, or `InvalidExtendedKey` when the input is not a
/// private key.
pub fn xpub_from_xprv(xprv: &str) -> Result<String, PrimitivesError> {
    Ok(ExtendedKey::decode(xprv)?.neuter()?.encode())
}

/// Derive along `path` from an encoded extended key and re-encode the result.
pub fn derive(xkey: &str, path: &str) -> Result<String, PrimitivesError> {
    Ok(ExtendedKey::decode(xkey)?.derive_path(path)?.encode())
}
