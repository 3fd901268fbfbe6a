//! Expands token ids back into the bytes they cover.

use log::warn;

use crate::table::{MergeRuleTable, TokenId};

/// Borrowing decoder over an immutable [`MergeRuleTable`].
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    table: &'a MergeRuleTable,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder borrowing `table` read-only.
    #[must_use]
    pub fn new(table: &'a MergeRuleTable) -> Self {
        Self { table }
    }

    /// Decodes token ids into text, replacing invalid UTF-8 runs with the
    /// replacement character. This path never fails.
    #[must_use]
    pub fn decode(&self, tokens: &[TokenId]) -> String {
        String::from_utf8_lossy(&self.decode_to_bytes(tokens)).into_owned()
    }

    /// Decodes token ids into the raw bytes they cover.
    ///
    /// Ids below 256 emit themselves; composite ids expand left then right,
    /// depth first, via an explicit stack. An id that is neither a byte nor
    /// present in the table contributes nothing; decoding continues after a
    /// diagnostic, since a foreign id in otherwise sound input is
    /// recoverable. Expansion terminates because every composite's
    /// constituents were minted before it.
    #[must_use]
    pub fn decode_to_bytes(&self, tokens: &[TokenId]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(tokens.len());
        let mut stack = Vec::new();
        for &token in tokens {
            stack.push(token);
            while let Some(current) = stack.pop() {
                if let Ok(byte) = u8::try_from(current) {
                    bytes.push(byte);
                } else if let Some((left, right)) = self.table.expand(current) {
                    // Right is pushed first so left is emitted first.
                    stack.push(right);
                    stack.push(left);
                } else {
                    warn!("token id {current} is not in the merge table; skipping");
                }
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_table() -> MergeRuleTable {
        let mut table = MergeRuleTable::new();
        table.push_rule((97, 98)).unwrap(); // 256 = "ab"
        table.push_rule((256, 99)).unwrap(); // 257 = "abc"
        table.push_rule((257, 257)).unwrap(); // 258 = "abcabc"
        table
    }

    #[test]
    fn byte_ids_decode_to_themselves() {
        let table = MergeRuleTable::new();
        let decoder = Decoder::new(&table);
        assert_eq!(decoder.decode(&[104, 105]), "hi");
        assert_eq!(decoder.decode(&[]), "");
    }

    #[test]
    fn composite_ids_expand_left_then_right() {
        let table = nested_table();
        let decoder = Decoder::new(&table);
        assert_eq!(decoder.decode(&[258]), "abcabc");
        assert_eq!(decoder.decode(&[257, 100, 256]), "abcdab");
    }

    #[test]
    fn unknown_ids_contribute_nothing() {
        let table = nested_table();
        let decoder = Decoder::new(&table);
        assert_eq!(decoder.decode(&[97, 9999, 98]), "ab");
    }

    #[test]
    fn invalid_utf8_runs_are_replaced() {
        let table = MergeRuleTable::new();
        let decoder = Decoder::new(&table);
        // 0xFF never occurs in well-formed UTF-8.
        assert_eq!(decoder.decode(&[97, 0xFF, 98]), "a\u{FFFD}b");
    }

    #[test]
    fn multibyte_sequences_survive_expansion() {
        let mut table = MergeRuleTable::new();
        // "é" is 0xC3 0xA9 in UTF-8.
        let id = table.push_rule((0xC3, 0xA9)).unwrap();
        let decoder = Decoder::new(&table);
        assert_eq!(decoder.decode(&[id]), "é");
    }
}
