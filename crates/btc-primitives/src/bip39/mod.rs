//! BIP39 mnemonic sentences.
//!
//! Entropy plus a SHA-256 checksum is cut into 11-bit groups, each group
//! indexing a word in a 2048-word list. Conversions go through the base
//! conversion engine: bytes to a bit string, bits to base-2048 indices and
//! back. Output sentences are NFKD-normalized.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use num_bigint::BigUint;
use num_traits::Zero;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::config::{Config, Language, WORDLIST_LEN};
use crate::ec::curve::{secp256k1, Curve};
use crate::encoding::{change_base, normalize_string, Radix};
use crate::hash::sha256;
use crate::util::Octets;
use crate::PrimitivesError;

/// Bits encoded by one word.
const BITS_PER_WORD: usize = 11;

/// Radix of word indices.
const WORD_RADIX: Radix = Radix::Indexed(WORDLIST_LEN as u32);

/// Longest entropy whose checksum still fits in one SHA-256 digest.
pub const MAX_ENTROPY_LEN: usize = 1024;

/// An immutable 2048-word list with a reverse index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wordlist {
    words: Vec<String>,
    index: HashMap<String, u32>,
}

impl Wordlist {
    /// Read `<dir>/<language>.txt`.
    ///
    /// # Returns
    /// The list, or a `Wordlist` error when the file is missing or its
    /// contents are not 2048 distinct non-blank words.
    pub fn load(dir: &Path, language: Language) -> Result<Self, PrimitivesError> {
        let path = dir.join(format!("{}.txt", language.code()));
        let text = fs::read_to_string(&path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "cannot read wordlist");
            PrimitivesError::Wordlist(format!("cannot read {}: {}", path.display(), e))
        })?;
        let list = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), %language, "loaded wordlist");
        Ok(list)
    }

    /// Build a list from text holding one word per line.
    pub fn parse(text: &str) -> Result<Self, PrimitivesError> {
        let words: Vec<String> = text.lines().map(|w| w.trim().to_string()).collect();
        if words.len() != WORDLIST_LEN {
            return Err(PrimitivesError::Wordlist(format!(
                "expected {} words, found {}",
                WORDLIST_LEN,
                words.len()
            )));
        }
        let mut index = HashMap::with_capacity(WORDLIST_LEN);
        for (i, word) in words.iter().enumerate() {
            if word.is_empty() {
                return Err(PrimitivesError::Wordlist(format!("blank word at line {}", i + 1)));
            }
            if index.insert(normalize_string(word), i as u32).is_some() {
                return Err(PrimitivesError::Wordlist(format!(
                    "duplicate word {:?} at line {}",
                    word,
                    i + 1
                )));
            }
        }
        Ok(Wordlist { words, index })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word at `index`, if in range.
    pub fn word(&self, index: u32) -> Option<&str> {
        self.words.get(index as usize).map(String::as_str)
    }

    /// Index of `word`, compared after NFKD normalization.
    pub fn index_of(&self, word: &str) -> Option<u32> {
        self.index.get(&normalize_string(word)).copied()
    }
}

/// Mnemonic codec bound to one wordlist.
#[derive(Debug, Clone)]
pub struct Mnemonic {
    wordlist: Wordlist,
    curve: &'static Curve,
}

impl Mnemonic {
    /// Load the configured wordlist; entropy range checks use secp256k1.
    pub fn new(config: &Config) -> Result<Self, PrimitivesError> {
        let wordlist = Wordlist::load(&config.wordlist_dir, config.language)?;
        Ok(Self::from_wordlist(wordlist, secp256k1()))
    }

    pub fn from_wordlist(wordlist: Wordlist, curve: &'static Curve) -> Self {
        Mnemonic { wordlist, curve }
    }

    pub fn wordlist(&self) -> &Wordlist {
        &self.wordlist
    }

    /// Checksum bits of `entropy` as a '0'/'1' string.
    ///
    /// # Returns
    /// The first len*8/32 bits of SHA-256(entropy), or
    /// `InvalidEntropyLength` when the length is not a multiple of 4 bytes
    /// or exceeds [`MAX_ENTROPY_LEN`].
    pub fn checksum<'a>(entropy: impl Into<Octets<'a>>) -> Result<String, PrimitivesError> {
        let data = Zeroizing::new(entropy.into().to_bytes()?);
        if data.len() % 4 != 0 || data.len() > MAX_ENTROPY_LEN {
            return Err(PrimitivesError::InvalidEntropyLength(data.len()));
        }
        let digest = sha256(&data);
        let bits = change_base(&digest, &Radix::Bytes, &Radix::Binary, 256)?.into_text()?;
        Ok(bits[..data.len() * 8 / 32].to_string())
    }

    /// Encode entropy as a sentence.
    ///
    /// # Arguments
    /// * `entropy` - Entropy bytes or hex.
    /// * `add_checksum` - Append the checksum bits before splitting into words.
    /// * `check_on_curve` - Require the entropy integer to lie in (0, n).
    ///
    /// # Returns
    /// The space-joined, NFKD-normalized sentence.
    pub fn to_mnemonic<'a>(
        &self,
        entropy: impl Into<Octets<'a>>,
        add_checksum: bool,
        check_on_curve: bool,
    ) -> Result<String, PrimitivesError> {
        let data = Zeroizing::new(entropy.into().to_bytes()?);
        if data.is_empty() {
            return Err(PrimitivesError::InvalidEntropyLength(0));
        }
        let value = BigUint::from_bytes_be(&data);
        if check_on_curve && (value.is_zero() || &value >= self.curve.order()) {
            return Err(PrimitivesError::EntropyOutOfRange);
        }

        let entropy_bits = data.len() * 8;
        let indices = if add_checksum {
            let mut bits = Zeroizing::new(
                change_base(value, &Radix::Decimal, &Radix::Binary, entropy_bits)?.into_text()?,
            );
            bits.push_str(&Self::checksum(data.as_slice())?);
            let words = bits.len() / BITS_PER_WORD;
            change_base(bits.as_str(), &Radix::Binary, &WORD_RADIX, words)?.into_indices()?
        } else {
            let words = (entropy_bits + BITS_PER_WORD - 1) / BITS_PER_WORD;
            change_base(value, &Radix::Decimal, &WORD_RADIX, words)?.into_indices()?
        };

        let words = indices
            .iter()
            .map(|&i| {
                self.wordlist
                    .word(i)
                    .ok_or_else(|| PrimitivesError::Encoding(format!("word index {} out of range", i)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(normalize_string(&words.join(" ")))
    }

    /// Decode a checksummed sentence back to its entropy.
    ///
    /// # Returns
    /// The entropy, `UnknownWord`, `InvalidEntropyLength` for a word count
    /// that is not a positive multiple of 3, or `ChecksumMismatch`.
    pub fn to_entropy(&self, sentence: &str) -> Result<Vec<u8>, PrimitivesError> {
        let normalized = Zeroizing::new(normalize_string(sentence));
        let indices = normalized
            .split_whitespace()
            .map(|w| {
                self.wordlist
                    .index_of(w)
                    .ok_or_else(|| PrimitivesError::UnknownWord(w.to_string()))
            })
            .collect::<Result<Vec<u32>, _>>()?;
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(PrimitivesError::InvalidEntropyLength(indices.len() * BITS_PER_WORD / 8));
        }

        let total_bits = indices.len() * BITS_PER_WORD;
        let checksum_bits = total_bits / 33;
        let entropy_bits = total_bits - checksum_bits;
        let bits = Zeroizing::new(
            change_base(indices, &WORD_RADIX, &Radix::Binary, total_bits)?.into_text()?,
        );
        let (entropy_part, checksum_part) = bits.split_at(entropy_bits);
        let entropy = change_base(entropy_part, &Radix::Binary, &Radix::Bytes, entropy_bits / 8)?
            .into_bytes()?;
        if Self::checksum(&entropy)? != checksum_part {
            tracing::debug!(words = total_bits / BITS_PER_WORD, "mnemonic checksum mismatch");
            return Err(PrimitivesError::ChecksumMismatch);
        }
        Ok(entropy)
    }

    /// Whether `sentence` decodes with a valid checksum.
    pub fn check(&self, sentence: &str) -> bool {
        self.to_entropy(sentence).is_ok()
    }

    /// A fresh checksummed sentence from `strength_bits` of OS randomness.
    ///
    /// Strengths up to the bit length of n are drawn until the entropy lies
    /// in (0, n); longer ones are not range-checked.
    ///
    /// # Returns
    /// The sentence, or `InvalidStrength` unless the strength is a positive
    /// multiple of 32 of at most `MAX_ENTROPY_LEN * 8` bits.
    pub fn generate(&self, strength_bits: usize) -> Result<String, PrimitivesError> {
        if strength_bits == 0 || strength_bits % 32 != 0 || strength_bits > MAX_ENTROPY_LEN * 8 {
            return Err(PrimitivesError::InvalidStrength(strength_bits));
        }
        let check_on_curve = strength_bits as u64 <= self.curve.order().bits();
        let mut entropy = Zeroizing::new(vec![0u8; strength_bits / 8]);
        loop {
            OsRng.fill_bytes(&mut entropy);
            match self.to_mnemonic(entropy.as_slice(), true, check_on_curve) {
                Err(PrimitivesError::EntropyOutOfRange) => continue,
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn english() -> Mnemonic {
        Mnemonic::new(&Config::default()).unwrap()
    }

    const VECTORS: [(&str, &str); 5] = [
        (
            "00000000000000000000000000000000",
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        ),
        (
            "7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f",
            "legal winner thank year wave sausage worth useful legal winner thank yellow",
        ),
        (
            "80808080808080808080808080808080",
            "letter advice cage absurd amount doctor acoustic avoid letter advice cage above",
        ),
        (
            "ffffffffffffffffffffffffffffffff",
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong",
        ),
        (
            "0000000000000000000000000000000000000000000000000000000000000000",
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
             abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art",
        ),
    ];

    #[test]
    fn test_reference_vectors() {
        let m = english();
        for (entropy, sentence) in VECTORS {
            assert_eq!(m.to_mnemonic(entropy, true, false).unwrap(), sentence);
            assert_eq!(hex::encode(m.to_entropy(sentence).unwrap()), entropy);
        }
    }

    #[test]
    fn test_checksum() {
        assert_eq!(Mnemonic::checksum("00000000000000000000000000000000").unwrap(), "0011");
        let c32 = Mnemonic::checksum(&[0xABu8; 32]).unwrap();
        assert_eq!(c32.len(), 8);
        assert!(c32.chars().all(|c| c == '0' || c == '1'));
        assert_eq!(c32, Mnemonic::checksum(&[0xABu8; 32]).unwrap());
        assert!(matches!(
            Mnemonic::checksum(&[0u8; 15]),
            Err(PrimitivesError::InvalidEntropyLength(15))
        ));
        assert_eq!(Mnemonic::checksum(&[0u8; 0]).unwrap(), "");
    }

    #[test]
    fn test_oversized_entropy_is_rejected() {
        assert_eq!(Mnemonic::checksum(&vec![0x11u8; MAX_ENTROPY_LEN]).unwrap().len(), 256);
        assert!(matches!(
            Mnemonic::checksum(&vec![0x11u8; 1028]),
            Err(PrimitivesError::InvalidEntropyLength(1028))
        ));
        let m = english();
        assert!(matches!(
            m.to_mnemonic(&vec![0x11u8; 1028], true, false),
            Err(PrimitivesError::InvalidEntropyLength(1028))
        ));
        assert!(matches!(m.generate(8224), Err(PrimitivesError::InvalidStrength(8224))));
    }

    #[test]
    fn test_check_on_curve() {
        let m = english();
        assert!(matches!(
            m.to_mnemonic("00000000000000000000000000000000", true, true),
            Err(PrimitivesError::EntropyOutOfRange)
        ));
        assert!(matches!(m.to_mnemonic(&[0xFFu8; 32], true, true), Err(PrimitivesError::EntropyOutOfRange)));
        assert!(m.to_mnemonic("7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f", true, true).is_ok());
    }

    #[test]
    fn test_without_checksum() {
        let m = english();
        let sentence = m.to_mnemonic(&[0u8; 16], false, false).unwrap();
        assert_eq!(sentence, vec!["abandon"; 12].join(" "));
        let sentence = m.to_mnemonic(&[0xFFu8; 4], false, false).unwrap();
        // 32 bits -> 3 words, leading bit group zero-padded
        assert_eq!(sentence.split(' ').count(), 3);
    }

    #[test]
    fn test_generate_word_counts() {
        let m = english();
        let twelve = m.generate(128).unwrap();
        assert_eq!(twelve.split(' ').count(), 12);
        assert!(m.check(&twelve));
        let twenty_four = m.generate(256).unwrap();
        assert_eq!(twenty_four.split(' ').count(), 24);
        assert!(m.check(&twenty_four));
        assert!(matches!(m.generate(100), Err(PrimitivesError::InvalidStrength(100))));
        assert!(matches!(m.generate(0), Err(PrimitivesError::InvalidStrength(0))));
    }

    #[test]
    fn test_to_entropy_errors() {
        let m = english();
        assert!(matches!(
            m.to_entropy(&vec!["abandon"; 12].join(" ")),
            Err(PrimitivesError::ChecksumMismatch)
        ));
        assert!(matches!(
            m.to_entropy("abandon abandon notaword"),
            Err(PrimitivesError::UnknownWord(w)) if w == "notaword"
        ));
        assert!(m.to_entropy("abandon abandon").is_err());
        assert!(m.to_entropy("").is_err());
    }

    #[test]
    fn test_wordlist_parse_validation() {
        let good: String = (0..WORDLIST_LEN).map(|i| format!("w{}\n", i)).collect();
        let list = Wordlist::parse(&good).unwrap();
        assert_eq!(list.len(), WORDLIST_LEN);
        assert_eq!(list.word(5), Some("w5"));
        assert_eq!(list.index_of("w2047"), Some(2047));

        let short: String = (0..10).map(|i| format!("w{}\n", i)).collect();
        assert!(matches!(Wordlist::parse(&short), Err(PrimitivesError::Wordlist(_))));

        let dup = good.replacen("w1\n", "w0\n", 1);
        assert!(matches!(Wordlist::parse(&dup), Err(PrimitivesError::Wordlist(_))));

        let blank = good.replacen("w1\n", "\n", 1);
        assert!(matches!(Wordlist::parse(&blank), Err(PrimitivesError::Wordlist(_))));
    }

    #[test]
    fn test_wordlist_load_missing_file() {
        let dir = PathBuf::from("/nonexistent/btc-primitives-wordlists");
        assert!(matches!(
            Wordlist::load(&dir, Language::English),
            Err(PrimitivesError::Wordlist(_))
        ));
        assert!(Mnemonic::new(&Config::new(dir, Language::English)).is_err());
    }

    #[test]
    fn test_bundled_wordlists_load() {
        for lang in [
            Language::English,
            Language::French,
            Language::Italian,
            Language::Spanish,
            Language::Japanese,
            Language::Korean,
            Language::ChineseSimplified,
            Language::ChineseTraditional,
        ] {
            let list = Wordlist::load(&Config::bundled_wordlist_dir(), lang).unwrap();
            assert_eq!(list.len(), WORDLIST_LEN, "{}", lang);
        }
    }

    #[test]
    fn test_non_english_roundtrip() {
        let m = Mnemonic::new(&Config::default().with_language(Language::Spanish)).unwrap();
        let entropy = [0x5Au8; 16];
        let sentence = m.to_mnemonic(&entropy, true, true).unwrap();
        assert_eq!(m.to_entropy(&sentence).unwrap(), entropy.to_vec());
    }
}
