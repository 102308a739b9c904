//! Bitcoin cryptographic primitives.
//!
//! This crate provides the building blocks for key handling:
//! - Arbitrary-radix base conversion (binary, decimal, hex, Base58, 256, indexed)
//! - Base58 and Base58Check encoding
//! - Hash functions (SHA-256, SHA-256d, SHA-512, RIPEMD-160, Hash160, HMAC)
//! - Prime-field elliptic-curve arithmetic with secp256k1 built in
//! - ECDSA with RFC 6979 nonces and public-key recovery
//! - BIP32 extended keys and child derivation
//! - BIP39 mnemonic sentences

pub mod base58;
pub mod bip32;
pub mod bip39;
pub mod config;
pub mod ec;
pub mod ecdsa;
pub mod encoding;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
