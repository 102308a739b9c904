use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::One;
use proptest::prelude::*;

use btc_primitives::base58;
use btc_primitives::bip32::{ExtendedKey, Network, HARDENED};
use btc_primitives::bip39::Mnemonic;
use btc_primitives::config::Config;
use btc_primitives::ec::{secp256k1, PrivateKey, Signature};
use btc_primitives::ecdsa;
use btc_primitives::encoding::{change_base, Radix};
use btc_primitives::hash::sha256;

fn english() -> &'static Mnemonic {
    static MNEMONIC: OnceLock<Mnemonic> = OnceLock::new();
    MNEMONIC.get_or_init(|| Mnemonic::new(&Config::default()).unwrap())
}

fn with_leading_zeros(zeros: usize, body: Vec<u8>) -> Vec<u8> {
    let mut data = vec![0u8; zeros];
    data.extend(body);
    data
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn base58_roundtrip(zeros in 0usize..4, body in prop::collection::vec(any::<u8>(), 0..64)) {
        let data = with_leading_zeros(zeros, body);
        let encoded = base58::encode(&data);
        prop_assert_eq!(base58::decode(&encoded).unwrap(), data);
    }

    #[test]
    fn base58_check_roundtrip(zeros in 0usize..4, body in prop::collection::vec(any::<u8>(), 0..64)) {
        let data = with_leading_zeros(zeros, body);
        let encoded = base58::check_encode(&data);
        prop_assert_eq!(base58::check_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn base58_check_detects_bit_flip(
        body in prop::collection::vec(any::<u8>(), 1..48),
        pos in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let encoded = base58::check_encode(&body);
        let mut raw = base58::decode(&encoded).unwrap();
        let i = pos.index(raw.len());
        raw[i] ^= 1 << bit;
        prop_assert!(base58::check_decode(&base58::encode(&raw)).is_err());
    }

    #[test]
    fn change_base_roundtrips(zeros in 0usize..4, body in prop::collection::vec(any::<u8>(), 0..48)) {
        let data = with_leading_zeros(zeros, body);
        for radix in [Radix::Base58, Radix::Binary, Radix::Hex] {
            let there = change_base(data.clone(), &Radix::Bytes, &radix, 0).unwrap();
            let back = change_base(there, &radix, &Radix::Bytes, 0).unwrap();
            prop_assert_eq!(back.into_bytes().unwrap(), data.clone());
        }
    }

    #[test]
    fn base58_engine_matches_codec(body in prop::collection::vec(any::<u8>(), 0..48)) {
        let engine = change_base(body.clone(), &Radix::Bytes, &Radix::Base58, 0).unwrap();
        prop_assert_eq!(engine.into_text().unwrap(), base58::encode(&body));
    }

    #[test]
    fn checksum_length_and_determinism(words in 1usize..9, byte in any::<u8>()) {
        let entropy = vec![byte; words * 4];
        let checksum = Mnemonic::checksum(&entropy).unwrap();
        prop_assert_eq!(checksum.len(), entropy.len() * 8 / 32);
        prop_assert_eq!(checksum, Mnemonic::checksum(&entropy).unwrap());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn mnemonic_entropy_roundtrip(entropy in prop::collection::vec(any::<u8>(), 16..=16)) {
        let m = english();
        let sentence = m.to_mnemonic(&entropy, true, false).unwrap();
        prop_assert_eq!(sentence.split(' ').count(), 12);
        prop_assert_eq!(m.to_entropy(&sentence).unwrap(), entropy);
    }

    #[test]
    fn ecdsa_sign_verify_roundtrip(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256),
        bit in 0usize..256,
    ) {
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let hash = sha256(&msg);
            let sig = pk.sign(&hash).unwrap();
            let pub_key = pk.pub_key();
            prop_assert!(pub_key.verify(&hash, &sig));

            let mut tampered = hash;
            tampered[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(!pub_key.verify(&tampered, &sig));

            let mask = BigUint::one() << bit;
            let bad_r = Signature::new(sig.r() ^ &mask, sig.s().clone());
            prop_assert!(!pub_key.verify(&hash, &bad_r));
            let bad_s = Signature::new(sig.r().clone(), sig.s() ^ &mask);
            prop_assert!(!pub_key.verify(&hash, &bad_s));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn recovery_returns_signer(seed in prop::array::uniform32(any::<u8>()), msg in prop::collection::vec(any::<u8>(), 0..64)) {
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let hash = sha256(&msg);
            let (sig, recid) = pk.sign_recoverable(&hash).unwrap();
            let pub_key = pk.pub_key();
            let recovered = ecdsa::recover_public_key(secp256k1(), &hash, &sig, recid).unwrap();
            prop_assert_eq!(&recovered, pub_key.point());
            prop_assert!(ecdsa::recover_public_keys(secp256k1(), &hash, &sig).contains(&recovered));
        }
    }

    #[test]
    fn public_derivation_matches_private(seed in prop::collection::vec(any::<u8>(), 16..64), index in 0u32..HARDENED) {
        let master = ExtendedKey::master(&seed, Network::Mainnet).unwrap();
        let via_priv = master.ckd_priv(index).unwrap().neuter().unwrap();
        let via_pub = master.neuter().unwrap().ckd_pub(index).unwrap();
        prop_assert_eq!(via_priv.encode(), via_pub.encode());
    }
}
