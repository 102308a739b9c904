//! Elliptic-curve primitives over prime fields, with secp256k1 built in.
//!
//! [`curve`] holds the point arithmetic; the key and signature types wrap
//! it for everyday use.

pub mod curve;
pub mod key_pair;
pub mod private_key;
pub mod public_key;
pub mod signature;

pub use curve::{secp256k1, Curve, Point};
pub use key_pair::KeyPair;
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
