//! A private key together with its derived public key.

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::PrimitivesError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Fresh random secp256k1 key pair.
    pub fn generate() -> Self {
        Self::from_private(PrivateKey::new())
    }

    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.pub_key();
        KeyPair { private, public }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn sign(&self, digest: &[u8]) -> Result<Signature, PrimitivesError> {
        self.private.sign(digest)
    }

    pub fn verify(&self, digest: &[u8], sig: &Signature) -> bool {
        self.public.verify(digest, sig)
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private: PrivateKey) -> Self {
        Self::from_private(private)
    }
}
