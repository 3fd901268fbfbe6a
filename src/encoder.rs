//! Applies a learned merge-rule table to new text.

use crate::pairs::{byte_tokens, merge_pass};
use crate::table::{MergeRuleTable, Pair, Rank, TokenId};

/// Borrowing encoder over an immutable [`MergeRuleTable`].
///
/// The result depends only on the table and the input: each round applies
/// the known pair with the lowest rank across the whole sequence, which
/// replays merges in exactly the order training learned them.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    table: &'a MergeRuleTable,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder borrowing `table` read-only.
    #[must_use]
    pub fn new(table: &'a MergeRuleTable) -> Self {
        Self { table }
    }

    /// Encodes text into token ids.
    ///
    /// An empty table yields the raw byte sequence unchanged.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        self.encode_bytes(text.as_bytes())
    }

    /// Encodes raw bytes into token ids.
    #[must_use]
    pub fn encode_bytes(&self, data: &[u8]) -> Vec<TokenId> {
        let mut sequence = byte_tokens(data);
        if self.table.is_empty() {
            return sequence;
        }
        while let Some((pair, new_id)) = self.best_known_pair(&sequence) {
            merge_pass(&mut sequence, pair, new_id);
        }
        sequence
    }

    /// Finds the adjacent pair present in `sequence` with the lowest rank in
    /// the table, if any pair is known at all.
    fn best_known_pair(&self, sequence: &[TokenId]) -> Option<(Pair, TokenId)> {
        let mut best: Option<(Rank, Pair, TokenId)> = None;
        for window in sequence.windows(2) {
            let pair = (window[0], window[1]);
            if let Some((new_id, rank)) = self.table.lookup(pair) {
                if best.map_or(true, |(best_rank, _, _)| rank < best_rank) {
                    best = Some((rank, pair, new_id));
                }
            }
        }
        best.map(|(_, pair, new_id)| (pair, new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainerConfig;
    use crate::trainer::Trainer;

    fn trained_table(text: &str, vocab_size: usize) -> MergeRuleTable {
        let cfg = TrainerConfig::builder()
            .target_vocab_size(vocab_size)
            .show_progress(false)
            .build()
            .unwrap();
        Trainer::new(cfg).train(text).unwrap().table
    }

    #[test]
    fn empty_table_is_byte_identity() {
        let table = MergeRuleTable::new();
        let encoder = Encoder::new(&table);
        assert_eq!(encoder.encode("abc"), vec![97, 98, 99]);
        assert_eq!(encoder.encode(""), Vec::<TokenId>::new());
    }

    #[test]
    fn single_rule_merges_without_overlap() {
        let mut table = MergeRuleTable::new();
        let ab = table.push_rule((97, 98)).unwrap();
        let encoded = Encoder::new(&table).encode("abab");
        assert_eq!(encoded, vec![ab, ab]);
    }

    #[test]
    fn encoding_replays_training_on_the_training_text() {
        let text = "low lower lowest low low";
        let table = trained_table(text, 280);
        let encoded = Encoder::new(&table).encode(text);
        // Converged: no adjacent pair in the output is still known to the table.
        for window in encoded.windows(2) {
            assert!(table.lookup((window[0], window[1])).is_none());
        }
    }

    #[test]
    fn earlier_rank_wins_over_later_rule() {
        let mut table = MergeRuleTable::new();
        let ab = table.push_rule((97, 98)).unwrap();
        let bc = table.push_rule((98, 99)).unwrap();
        // In "abc" both rules match overlapping pairs; rank 0 must win.
        let encoded = Encoder::new(&table).encode("abc");
        assert_eq!(encoded, vec![ab, 99]);
        assert_ne!(encoded[0], bc);
    }

    #[test]
    fn unknown_bytes_pass_through_alongside_merges() {
        let mut table = MergeRuleTable::new();
        let ab = table.push_rule((97, 98)).unwrap();
        let encoded = Encoder::new(&table).encode("xaby");
        assert_eq!(encoded, vec![120, ab, 121]);
    }
}
