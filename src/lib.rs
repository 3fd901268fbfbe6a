//! Byte-level byte pair encoding (BPE) tokenizer library and CLI.
//!
//! The crate learns a table of merge rules from a training corpus, applies
//! those rules to turn text into token ids, reverses the process to recover
//! the original bytes, and persists the table as an ordered JSON merge list.
//! Typical usage trains a table, then encodes and decodes through the owning
//! [`BpeTokenizer`] façade or the borrowing [`Encoder`]/[`Decoder`] pair.
//!
//! ```
//! use bytepair::BpeTokenizer;
//!
//! # fn main() -> bytepair::Result<()> {
//! let mut tokenizer = BpeTokenizer::new();
//! tokenizer.train("aaabdaaabac", 260)?;
//! let ids = tokenizer.encode("aaabdaaabac");
//! assert_eq!(tokenizer.decode(&ids), "aaabdaaabac");
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting
//! the library portion only can disable default features to avoid the CLI
//! dependencies: `bytepair = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub mod config;
pub mod corpus;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod pairs;
pub mod serialization;
pub mod table;
pub mod tokenizer;
pub mod trainer;

pub use config::{CorpusConfig, TrainerBuilder, TrainerConfig};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{BytepairError, Result};
pub use metrics::{IterationMetrics, StopReason, TrainingMetrics};
pub use table::{MergeRuleTable, Pair, Rank, TokenId};
pub use tokenizer::BpeTokenizer;
pub use trainer::{Trainer, TrainerArtifacts};
