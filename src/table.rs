//! The learned merge-rule table shared by training, encoding, and decoding.

use rustc_hash::FxHashMap;

use crate::config::BYTE_VOCAB;
use crate::error::{BytepairError, Result};

/// Token identifier used throughout the crate.
///
/// Ids `0..256` denote raw bytes; ids `>= 256` denote composite tokens
/// minted during training, one per learned rule.
pub type TokenId = u32;
/// Merge pair encoded as `(left, right)` token identifiers.
pub type Pair = (TokenId, TokenId);
/// Position of a rule in training order; rank 0 was learned first and has
/// the highest priority during encoding.
pub type Rank = u32;

/// First id available for composite tokens.
pub const FIRST_COMPOSITE_ID: TokenId = BYTE_VOCAB as TokenId;

/// Learned merge rules with both lookup directions.
///
/// The two indices are independently owned: `by_pair` answers "what does
/// this pair merge into, and how early was it learned" for the encoder,
/// while `by_id` answers "what does this composite token expand to" for the
/// decoder. Rules are appended in training order and ids grow strictly
/// monotonically from 256, so a composite's constituents always predate it
/// and expansion can never cycle.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRuleTable {
    by_pair: FxHashMap<Pair, (TokenId, Rank)>,
    by_id: FxHashMap<TokenId, Pair>,
    ordered: Vec<(Pair, TokenId)>,
    next_id: TokenId,
}

impl Default for MergeRuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeRuleTable {
    /// Creates an empty table; encoding against it is a byte-identity pass.
    pub fn new() -> Self {
        Self {
            by_pair: FxHashMap::default(),
            by_id: FxHashMap::default(),
            ordered: Vec::new(),
            next_id: FIRST_COMPOSITE_ID,
        }
    }

    /// Mints the next composite id and appends a rule merging `pair` into it.
    ///
    /// Returns the minted id. Fails if `pair` is already bound to a rule or
    /// references an id that has not been minted yet, both of which would
    /// break the merge-forest invariant.
    pub fn push_rule(&mut self, pair: Pair) -> Result<TokenId> {
        if pair.0 >= self.next_id || pair.1 >= self.next_id {
            return Err(BytepairError::Internal(format!(
                "rule ({}, {}) references an id not yet minted (next id {})",
                pair.0, pair.1, self.next_id
            )));
        }
        if self.by_pair.contains_key(&pair) {
            return Err(BytepairError::Internal(format!(
                "pair ({}, {}) already has a merge rule",
                pair.0, pair.1
            )));
        }
        let new_id = self.next_id;
        let rank = Rank::try_from(self.ordered.len())
            .map_err(|_| BytepairError::Internal("rule count exceeds u32::MAX".into()))?;
        self.by_pair.insert(pair, (new_id, rank));
        self.by_id.insert(new_id, pair);
        self.ordered.push((pair, new_id));
        self.next_id += 1;
        Ok(new_id)
    }

    /// Returns the composite id and rank assigned to `pair`, if learned.
    #[must_use]
    pub fn lookup(&self, pair: Pair) -> Option<(TokenId, Rank)> {
        self.by_pair.get(&pair).copied()
    }

    /// Returns the pair a composite id expands to, if `id` was minted here.
    #[must_use]
    pub fn expand(&self, id: TokenId) -> Option<Pair> {
        self.by_id.get(&id).copied()
    }

    /// Returns the learned rules as `(pair, new_id)` in ascending rank order.
    #[must_use]
    pub fn rules(&self) -> &[(Pair, TokenId)] {
        &self.ordered
    }

    /// Number of learned rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the table holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Total vocabulary size: 256 byte tokens plus one token per rule.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        BYTE_VOCAB + self.ordered.len()
    }

    /// The id the next `push_rule` call would mint.
    #[must_use]
    pub fn next_id(&self) -> TokenId {
        self.next_id
    }

    /// Rebuilds a table from a persisted `(pair, new_id)` list in rank order.
    ///
    /// Every rule's constituents must carry ids numerically below its own,
    /// the same invariant `push_rule` enforces; a rule referencing itself or
    /// a later id would let expansion cycle. `next_id` is recomputed as one
    /// past the largest composite id so later training could resume without
    /// collisions.
    pub fn from_rules(rules: Vec<(Pair, TokenId)>) -> Result<Self> {
        let mut by_pair = FxHashMap::default();
        let mut by_id = FxHashMap::default();
        let mut next_id = FIRST_COMPOSITE_ID;
        for (rank, &(pair, new_id)) in rules.iter().enumerate() {
            if new_id < FIRST_COMPOSITE_ID {
                return Err(BytepairError::Serialization(format!(
                    "rule {rank} assigns reserved byte id {new_id}"
                )));
            }
            if pair.0 >= new_id || pair.1 >= new_id {
                return Err(BytepairError::Serialization(format!(
                    "rule {rank} for pair ({}, {}) references an id not minted before {new_id}",
                    pair.0, pair.1
                )));
            }
            let rank = Rank::try_from(rank)
                .map_err(|_| BytepairError::Serialization("rule count exceeds u32::MAX".into()))?;
            if by_pair.insert(pair, (new_id, rank)).is_some() {
                return Err(BytepairError::Serialization(format!(
                    "duplicate rule for pair ({}, {})",
                    pair.0, pair.1
                )));
            }
            if by_id.insert(new_id, pair).is_some() {
                return Err(BytepairError::Serialization(format!(
                    "token id {new_id} assigned by more than one rule"
                )));
            }
            next_id = next_id.max(new_id + 1);
        }
        Ok(Self {
            by_pair,
            by_id,
            ordered: rules,
            next_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rule_mints_monotonic_ids() {
        let mut table = MergeRuleTable::new();
        assert_eq!(table.push_rule((97, 97)).unwrap(), 256);
        assert_eq!(table.push_rule((256, 98)).unwrap(), 257);
        assert_eq!(table.lookup((97, 97)), Some((256, 0)));
        assert_eq!(table.lookup((256, 98)), Some((257, 1)));
        assert_eq!(table.expand(257), Some((256, 98)));
        assert_eq!(table.vocab_size(), 258);
    }

    #[test]
    fn push_rule_rejects_forward_references() {
        let mut table = MergeRuleTable::new();
        let err = table.push_rule((300, 97)).expect_err("unminted left id");
        assert!(matches!(err, BytepairError::Internal(_)));
    }

    #[test]
    fn push_rule_rejects_duplicate_pairs() {
        let mut table = MergeRuleTable::new();
        table.push_rule((1, 2)).unwrap();
        assert!(table.push_rule((1, 2)).is_err());
    }

    #[test]
    fn from_rules_recomputes_next_id() {
        let table = MergeRuleTable::from_rules(vec![((97, 98), 256), ((256, 99), 300)]).unwrap();
        assert_eq!(table.next_id(), 301);
        assert_eq!(table.lookup((256, 99)), Some((300, 1)));
    }

    #[test]
    fn from_rules_rejects_byte_range_ids() {
        let err = MergeRuleTable::from_rules(vec![((97, 98), 255)]).expect_err("reserved id");
        assert!(matches!(err, BytepairError::Serialization(_)));
    }

    #[test]
    fn from_rules_rejects_duplicate_ids() {
        let rules = vec![((97, 98), 256), ((98, 99), 256)];
        assert!(MergeRuleTable::from_rules(rules).is_err());
    }

    #[test]
    fn from_rules_rejects_self_referential_rules() {
        // 256 expanding to (256, 97) would never terminate.
        let err = MergeRuleTable::from_rules(vec![((256, 97), 256)]).expect_err("cyclic rule");
        assert!(matches!(err, BytepairError::Serialization(_)));
    }

    #[test]
    fn from_rules_rejects_constituents_minted_later() {
        let rules = vec![((97, 98), 256), ((300, 97), 257)];
        let err = MergeRuleTable::from_rules(rules).expect_err("forward reference");
        assert!(matches!(err, BytepairError::Serialization(_)));
    }
}
