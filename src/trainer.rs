//! Core training loop that learns a merge-rule table from text.

use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

use log::info;

use crate::config::TrainerConfig;
use crate::error::Result;
use crate::metrics::{IterationMetrics, StopReason, TrainingMetrics};
use crate::pairs::{byte_tokens, count_pairs, merge_pass};
use crate::table::{MergeRuleTable, Pair};

/// High-level façade configuring and executing training runs.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainerConfig,
}

/// Artifacts returned after a training session completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct TrainerArtifacts {
    /// Learned merge-rule table.
    pub table: MergeRuleTable,
    /// Detailed metrics captured during training.
    pub metrics: TrainingMetrics,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: TrainerConfig) -> Self {
        Self { cfg }
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    /// Learns merge rules from `text` until the target vocabulary is reached
    /// or no mergeable pair remains.
    ///
    /// Empty or degenerate text terminates with few or zero rules; that is a
    /// successful run, not an error.
    pub fn train(&self, text: &str) -> Result<TrainerArtifacts> {
        self.train_bytes(text.as_bytes())
    }

    /// Byte-level entry point backing [`Trainer::train`].
    pub fn train_bytes(&self, data: &[u8]) -> Result<TrainerArtifacts> {
        self.cfg.validate()?;

        let max_rules = self.cfg.max_rules();
        let mut sequence = byte_tokens(data);
        let mut table = MergeRuleTable::new();
        let mut metrics = TrainingMetrics::new(max_rules.min(16_384));
        let training_start = Instant::now();

        while table.len() < max_rules {
            if let Some(limit) = self.cfg.time_limit {
                if training_start.elapsed() >= limit {
                    metrics.stop_reason = StopReason::TimeLimitReached;
                    break;
                }
            }
            if let Some(max_iters) = self.cfg.max_merge_iterations {
                if table.len() >= max_iters {
                    metrics.stop_reason = StopReason::MaxIterationsReached;
                    break;
                }
            }
            if sequence.len() < 2 {
                metrics.stop_reason = StopReason::SequenceExhausted;
                break;
            }

            let iteration_start = Instant::now();
            let counts = count_pairs(&sequence);
            let distinct_pairs = counts.len();
            let best = counts
                .iter()
                .filter(|&(_, &count)| count >= self.cfg.min_frequency)
                .map(|(&pair, &count)| PairScore::new(pair, count))
                .max();
            let Some(PairScore { pair, frequency }) = best else {
                metrics.stop_reason = StopReason::NoMergeablePairs;
                break;
            };

            let new_id = table.push_rule(pair)?;
            let merges_applied = merge_pass(&mut sequence, pair, new_id);
            let iteration = table.len();

            if self.cfg.show_progress {
                info!(
                    "iter {:>6} pair ({:>3}, {:>3}) freq {:>8} merges {:>8} seq_len {:>10} vocab {:>6}",
                    iteration,
                    pair.0,
                    pair.1,
                    frequency,
                    merges_applied,
                    sequence.len(),
                    table.vocab_size()
                );
            }

            metrics.iterations.push(IterationMetrics {
                iteration,
                best_frequency: frequency,
                merges_applied,
                distinct_pairs,
                sequence_len: sequence.len(),
                elapsed_iteration: iteration_start.elapsed(),
                elapsed_total: training_start.elapsed(),
            });
        }

        metrics.total_duration = training_start.elapsed();

        if self.cfg.show_progress {
            info!(
                "completed {} merges in {:.2?}; vocab size {}",
                table.len(),
                metrics.total_duration,
                table.vocab_size()
            );
        }

        Ok(TrainerArtifacts { table, metrics })
    }
}

/// Selection key for one merge iteration.
///
/// Ordered by frequency first; among equal frequencies the lexicographically
/// smaller `(left, right)` pair compares greater, so taking the maximum
/// yields a deterministic winner independent of hash-map iteration order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct PairScore {
    frequency: usize,
    pair: Pair,
}

impl PairScore {
    fn new(pair: Pair, frequency: usize) -> Self {
        Self { frequency, pair }
    }
}

impl Ord for PairScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.frequency
            .cmp(&other.frequency)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for PairScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TrainerArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "merge table with vocab size {}", self.table.vocab_size())?;
        writeln!(f, "Stop reason: {:?}", self.metrics.stop_reason)?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}
