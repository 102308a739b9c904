//! Immutable configuration for the mnemonic codec.
//!
//! A `Config` is built once and passed by reference; nothing in the crate
//! reads process-wide mutable state.

use std::fmt;
use std::path::PathBuf;

/// Environment variable that overrides the wordlist directory.
pub const WORDLIST_DIR_ENV: &str = "BTC_PRIMITIVES_WORDLIST_DIR";

/// Number of words in every BIP39 wordlist.
pub const WORDLIST_LEN: usize = 2048;

/// Wordlist languages, named by the file stem of their wordlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    French,
    Italian,
    Spanish,
    Japanese,
    Korean,
    ChineseSimplified,
    ChineseTraditional,
}

impl Language {
    /// File stem of the language's wordlist, e.g. `english`.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::French => "french",
            Language::Italian => "italian",
            Language::Spanish => "spanish",
            Language::Japanese => "japanese",
            Language::Korean => "korean",
            Language::ChineseSimplified => "chinese_simplified",
            Language::ChineseTraditional => "chinese_traditional",
        }
    }

    /// Look a language up by its code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "english" => Some(Language::English),
            "french" => Some(Language::French),
            "italian" => Some(Language::Italian),
            "spanish" => Some(Language::Spanish),
            "japanese" => Some(Language::Japanese),
            "korean" => Some(Language::Korean),
            "chinese_simplified" => Some(Language::ChineseSimplified),
            "chinese_traditional" => Some(Language::ChineseTraditional),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Mnemonic codec configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `<language>.txt` wordlists.
    pub wordlist_dir: PathBuf,
    /// Wordlist language.
    pub language: Language,
}

impl Config {
    pub fn new(wordlist_dir: impl Into<PathBuf>, language: Language) -> Self {
        Config { wordlist_dir: wordlist_dir.into(), language }
    }

    /// The wordlists shipped with this crate.
    pub fn bundled_wordlist_dir() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/wordlists"))
    }

    /// Default configuration with the wordlist directory taken from
    /// `BTC_PRIMITIVES_WORDLIST_DIR` when set.
    pub fn from_env() -> Self {
        let dir = std::env::var_os(WORDLIST_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::bundled_wordlist_dir);
        Config { wordlist_dir: dir, language: Language::default() }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Full path of the configured wordlist file.
    pub fn wordlist_path(&self) -> PathBuf {
        self.wordlist_dir.join(format!("{}.txt", self.language.code()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { wordlist_dir: Self::bundled_wordlist_dir(), language: Language::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes_roundtrip() {
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
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("klingon"), None);
    }

    #[test]
    fn test_default_wordlist_path() {
        let config = Config::default();
        assert!(config.wordlist_path().ends_with("wordlists/english.txt"));
        let french = config.with_language(Language::French);
        assert!(french.wordlist_path().ends_with("wordlists/french.txt"));
    }

    #[test]
    fn test_from_env_overrides_wordlist_dir() {
        std::env::set_var(WORDLIST_DIR_ENV, "/opt/btc/wordlists");
        let config = Config::from_env();
        std::env::remove_var(WORDLIST_DIR_ENV);
        assert_eq!(config.wordlist_dir, PathBuf::from("/opt/btc/wordlists"));
        assert_eq!(config.language, Language::English);
        assert_eq!(config.wordlist_path(), PathBuf::from("/opt/btc/wordlists/english.txt"));
    }
}
