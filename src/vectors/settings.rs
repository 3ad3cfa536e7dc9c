// settings.rs — Load settings supplied by the front end.

use std::path::PathBuf;

use serde::Deserialize;

use super::error::{Result, VectorError};
use super::line::parse_header;
use super::text::TextEncoding;
use crate::config;

/// Vocabulary size as known to the caller; selects the load strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularySize {
    /// Preallocate exactly this many rows and read the file once.
    Known(usize),
    /// Scan the file once to size the table, then read it again to fill it.
    Unknown,
}

impl VocabularySize {
    /// Interpret the front end's integer hint (`-1` means unknown).
    pub fn from_hint(hint: i64) -> Result<Self> {
        if hint == config::vectors::UNKNOWN_VOCAB_SIZE {
            return Ok(Self::Unknown);
        }
        usize::try_from(hint).map(Self::Known).map_err(|_| {
            VectorError::configuration(format!(
                "vocabulary size must be non-negative or {} for unknown, got {hint}",
                config::vectors::UNKNOWN_VOCAB_SIZE
            ))
        })
    }
}

/// Whether the first line of a known-size file is a `vocabSize dimension` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPolicy {
    /// Skip the first line only if it is two unsigned integers.
    #[default]
    Auto,
    Present,
    Absent,
}

impl HeaderPolicy {
    pub fn skips(self, first_line: &str) -> bool {
        match self {
            Self::Present => true,
            Self::Absent => false,
            Self::Auto => parse_header(first_line).is_some(),
        }
    }
}

/// Validated settings for `EmbeddingTable::load`.
#[derive(Debug, Clone)]
pub struct LoadSettings {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub dimension: usize,
    pub vocab_size: VocabularySize,
    pub header: HeaderPolicy,
}

impl LoadSettings {
    /// UTF-8, unknown vocabulary size, automatic header detection.
    pub fn new(path: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            path: path.into(),
            encoding: TextEncoding::UTF8,
            dimension,
            vocab_size: VocabularySize::Unknown,
            header: HeaderPolicy::Auto,
        }
    }

    pub fn with_vocab_size(mut self, vocab_size: VocabularySize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    pub fn with_header(mut self, header: HeaderPolicy) -> Self {
        self.header = header;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Raw settings as they arrive in an `init` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsParams {
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub dimension: i64,
    #[serde(default = "unknown_vocab_size")]
    pub vocab_size: i64,
    #[serde(default)]
    pub header: HeaderPolicy,
}

fn default_encoding() -> String {
    config::vectors::DEFAULT_ENCODING.to_string()
}

fn unknown_vocab_size() -> i64 {
    config::vectors::UNKNOWN_VOCAB_SIZE
}

impl SettingsParams {
    pub fn validate(&self) -> Result<LoadSettings> {
        if self.path.trim().is_empty() {
            return Err(VectorError::configuration("no embedding file selected"));
        }
        let dimension = usize::try_from(self.dimension)
            .ok()
            .filter(|&d| d > 0)
            .ok_or_else(|| {
                VectorError::configuration(format!("dimension must be positive, got {}", self.dimension))
            })?;

        Ok(LoadSettings::new(&self.path, dimension)
            .with_encoding(TextEncoding::from_label(&self.encoding)?)
            .with_vocab_size(VocabularySize::from_hint(self.vocab_size)?)
            .with_header(self.header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: serde_json::Value) -> SettingsParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = params(serde_json::json!({ "path": "/models/glove.txt", "dimension": 50 }))
            .validate()
            .unwrap();
        assert_eq!(settings.encoding, TextEncoding::UTF8);
        assert_eq!(settings.vocab_size, VocabularySize::Unknown);
        assert_eq!(settings.header, HeaderPolicy::Auto);
        assert_eq!(settings.dimension, 50);
    }

    #[test]
    fn test_known_vocab_and_header() {
        let settings = params(serde_json::json!({
            "path": "/models/w2v.txt",
            "encoding": "latin1",
            "dimension": 300,
            "vocabSize": 3000000,
            "header": "present"
        }))
        .validate()
        .unwrap();
        assert_eq!(settings.vocab_size, VocabularySize::Known(3_000_000));
        assert_eq!(settings.header, HeaderPolicy::Present);
        assert_eq!(settings.encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_accepts_legacy_code_page() {
        let settings = params(serde_json::json!({
            "path": "/models/ru.txt",
            "encoding": "windows-1251",
            "dimension": 100
        }))
        .validate()
        .unwrap();
        assert_eq!(settings.encoding.label(), "windows-1251");
    }

    #[test]
    fn test_rejects_bad_settings() {
        let cases = [
            serde_json::json!({ "path": "", "dimension": 2 }),
            serde_json::json!({ "path": "a.txt", "dimension": 0 }),
            serde_json::json!({ "path": "a.txt", "dimension": -5 }),
            serde_json::json!({ "path": "a.txt", "dimension": 2, "vocabSize": -2 }),
            serde_json::json!({ "path": "a.txt", "dimension": 2, "encoding": "klingon" }),
        ];
        for case in cases {
            let result = params(case.clone()).validate();
            assert!(matches!(result, Err(VectorError::Configuration(_))), "{case}");
        }
    }

    #[test]
    fn test_header_policy() {
        assert!(HeaderPolicy::Auto.skips("10 300"));
        assert!(!HeaderPolicy::Auto.skips("cat 1 2"));
        assert!(HeaderPolicy::Present.skips("cat 1 2"));
        assert!(!HeaderPolicy::Absent.skips("10 300"));
    }
}
