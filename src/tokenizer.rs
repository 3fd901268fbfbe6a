//! Owning façade exposing the five public tokenizer operations.

use std::path::Path;

use crate::config::TrainerConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::metrics::TrainingMetrics;
use crate::serialization::{load_table, save_table};
use crate::table::{MergeRuleTable, TokenId};
use crate::trainer::Trainer;

/// Byte-level BPE tokenizer owning a [`MergeRuleTable`].
///
/// The table is written exclusively by [`BpeTokenizer::train`] or
/// [`BpeTokenizer::load`], each of which replaces it wholesale; encode,
/// decode, and save only ever read it.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct BpeTokenizer {
    table: MergeRuleTable,
}

impl BpeTokenizer {
    /// Creates a tokenizer with an empty table; encoding is byte identity
    /// until [`BpeTokenizer::train`] or [`BpeTokenizer::load`] populates it.
    pub fn new() -> Self {
        Self {
            table: MergeRuleTable::new(),
        }
    }

    /// Wraps an existing table, for callers that trained or loaded one
    /// through the lower-level APIs.
    pub fn from_table(table: MergeRuleTable) -> Self {
        Self { table }
    }

    /// Learns a fresh merge table from `text`, replacing any existing one.
    /// Returns the training metrics.
    pub fn train(&mut self, text: &str, vocab_size: usize) -> Result<TrainingMetrics> {
        let cfg = TrainerConfig::builder()
            .target_vocab_size(vocab_size)
            .show_progress(false)
            .build()?;
        let artifacts = Trainer::new(cfg).train(text)?;
        self.table = artifacts.table;
        Ok(artifacts.metrics)
    }

    /// Encodes text into token ids.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        Encoder::new(&self.table).encode(text)
    }

    /// Decodes token ids back into text, lossily where the byte stream is
    /// not valid UTF-8.
    #[must_use]
    pub fn decode(&self, tokens: &[TokenId]) -> String {
        Decoder::new(&self.table).decode(tokens)
    }

    /// Persists the merge table to `path` as a compact JSON merge list.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_table(&self.table, path, false)
    }

    /// Replaces the table with one loaded from `path`.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.table = load_table(path)?;
        Ok(())
    }

    /// Read-only access to the learned table.
    #[must_use]
    pub fn table(&self) -> &MergeRuleTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_on_training_text() {
        let text = "aaabdaaabac";
        let mut tokenizer = BpeTokenizer::new();
        tokenizer.train(text, 260).unwrap();
        let encoded = tokenizer.encode(text);
        assert!(encoded.len() < text.len());
        assert_eq!(tokenizer.decode(&encoded), text);
    }

    #[test]
    fn round_trip_on_unseen_text() {
        let mut tokenizer = BpeTokenizer::new();
        tokenizer
            .train("the quick brown fox jumps over the lazy dog, the dog sleeps", 300)
            .unwrap();
        for text in ["quick dogs sleep", "wholly novel zzz", "日本語テキスト"] {
            let encoded = tokenizer.encode(text);
            assert_eq!(tokenizer.decode(&encoded), text, "{text}");
        }
    }

    #[test]
    fn empty_text_trains_encodes_and_decodes_to_nothing() {
        let mut tokenizer = BpeTokenizer::new();
        tokenizer.train("", 512).unwrap();
        assert!(tokenizer.table().is_empty());
        assert_eq!(tokenizer.encode(""), Vec::<TokenId>::new());
        assert_eq!(tokenizer.decode(&[]), "");
    }

    #[test]
    fn untrained_tokenizer_is_byte_identity() {
        let tokenizer = BpeTokenizer::new();
        let encoded = tokenizer.encode("xyz");
        assert_eq!(encoded, vec![120, 121, 122]);
        assert_eq!(tokenizer.decode(&encoded), "xyz");
    }

    #[test]
    fn repeated_bytes_compress_and_recover() {
        let mut tokenizer = BpeTokenizer::new();
        tokenizer.train("aaaaaaaa", 260).unwrap();
        let encoded = tokenizer.encode("aaaaaaaa");
        assert!(encoded.len() < 8);
        assert_eq!(tokenizer.decode(&encoded), "aaaaaaaa");
    }

    #[test]
    fn save_then_load_behaves_identically() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("merges.json");
        let text = "mississippi misses missus";

        let mut trained = BpeTokenizer::new();
        trained.train(text, 280).unwrap();
        trained.save(&path).unwrap();

        let mut loaded = BpeTokenizer::new();
        loaded.load(&path).unwrap();
        assert_eq!(loaded.table(), trained.table());
        assert_eq!(loaded.encode(text), trained.encode(text));
        assert_eq!(loaded.decode(&loaded.encode(text)), text);
    }
}
