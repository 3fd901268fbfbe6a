//! Configuration builders controlling training and corpus loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BytepairError, Result};

/// Number of raw byte tokens occupying ids `0..256`.
pub const BYTE_VOCAB: usize = 256;

/// Configuration for merge-rule training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerConfig {
    /// Target vocabulary size including the 256 base byte tokens.
    pub target_vocab_size: usize,
    /// Minimum number of pair occurrences required before a merge is considered.
    pub min_frequency: usize,
    /// Enables per-iteration logging through the `log` facade.
    pub show_progress: bool,
    /// Hard cap on merge iterations; `None` uses the target vocabulary size.
    pub max_merge_iterations: Option<usize>,
    /// Optional wall-clock deadline for the training loop.
    pub time_limit: Option<Duration>,
}

impl TrainerConfig {
    /// Returns a builder initialised with [`TrainerConfig::default`].
    #[must_use]
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::default()
    }

    /// Validates the invariants required for training.
    pub fn validate(&self) -> Result<()> {
        if self.target_vocab_size <= BYTE_VOCAB {
            return Err(BytepairError::InvalidConfig(format!(
                "target_vocab_size ({}) must exceed the {BYTE_VOCAB} base byte tokens",
                self.target_vocab_size
            )));
        }
        if self.min_frequency < 2 {
            return Err(BytepairError::InvalidConfig(
                "min_frequency must be at least 2; a pair seen once cannot be merged usefully"
                    .into(),
            ));
        }
        let max_vocab = usize::try_from(u32::MAX).unwrap_or(usize::MAX);
        if self.target_vocab_size > max_vocab {
            return Err(BytepairError::InvalidConfig(format!(
                "target_vocab_size ({}) exceeds {max_vocab}, the maximum representable TokenId",
                self.target_vocab_size
            )));
        }
        if self.time_limit == Some(Duration::ZERO) {
            return Err(BytepairError::InvalidConfig(
                "time_limit must be non-zero when set".into(),
            ));
        }
        Ok(())
    }

    /// Maximum number of merge rules this configuration allows.
    #[must_use]
    pub fn max_rules(&self) -> usize {
        self.target_vocab_size - BYTE_VOCAB
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            target_vocab_size: 512,
            min_frequency: 2,
            show_progress: true,
            max_merge_iterations: None,
            time_limit: None,
        }
    }
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TrainerBuilder {
    cfg: TrainerConfig,
}

impl TrainerBuilder {
    /// Creates a builder with [`TrainerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the desired vocabulary size (including base byte tokens).
    #[must_use]
    pub fn target_vocab_size(mut self, value: usize) -> Self {
        self.cfg.target_vocab_size = value;
        self
    }

    /// Sets the minimum merge frequency.
    #[must_use]
    pub fn min_frequency(mut self, value: usize) -> Self {
        self.cfg.min_frequency = value;
        self
    }

    /// Enables or disables per-iteration logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Sets a hard merge iteration limit.
    #[must_use]
    pub fn max_merge_iterations(mut self, value: Option<usize>) -> Self {
        self.cfg.max_merge_iterations = value;
        self
    }

    /// Sets a wall-clock deadline for the training loop.
    #[must_use]
    pub fn time_limit(mut self, value: Option<Duration>) -> Self {
        self.cfg.time_limit = value;
        self
    }

    /// Finalises the builder, returning a validated [`TrainerConfig`].
    pub fn build(self) -> Result<TrainerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration controlling how text corpora are read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusConfig {
    /// Enables recursive directory traversal.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

impl CorpusConfig {
    /// Returns a builder initialised with [`CorpusConfig::default`].
    #[must_use]
    pub fn builder() -> CorpusBuilder {
        CorpusBuilder::default()
    }
}

/// Builder for [`CorpusConfig`].
#[derive(Debug, Default, Clone)]
pub struct CorpusBuilder {
    cfg: CorpusConfig,
}

impl CorpusBuilder {
    /// Creates a new builder with [`CorpusConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Finalises the builder, returning the [`CorpusConfig`].
    pub fn build(self) -> CorpusConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_vocab_without_merge_room() {
        let cfg = TrainerConfig {
            target_vocab_size: 256,
            ..TrainerConfig::default()
        };
        let err = cfg.validate().expect_err("validation should fail");
        assert!(matches!(
            err,
            BytepairError::InvalidConfig(message) if message.contains("target_vocab_size")
        ));
    }

    #[test]
    fn validate_rejects_unmergeable_min_frequency() {
        let cfg = TrainerConfig {
            min_frequency: 1,
            ..TrainerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_produces_valid_config() {
        let cfg = TrainerConfig::builder()
            .target_vocab_size(300)
            .min_frequency(3)
            .show_progress(false)
            .build()
            .expect("config should be valid");
        assert_eq!(cfg.target_vocab_size, 300);
        assert_eq!(cfg.max_rules(), 44);
    }

    #[test]
    fn corpus_builder_overrides_defaults() {
        let cfg = CorpusConfig::builder()
            .recursive(false)
            .follow_symlinks(true)
            .build();
        assert!(!cfg.recursive);
        assert!(cfg.follow_symlinks);
    }
}
