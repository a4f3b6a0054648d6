//! Vector-space retrieval: a TF-IDF inverted index with cosine or pivoted
//! length normalization, ranked queries, and IR evaluation against qrels.
//!
//! The index has two phases. [`IndexBuilder`] ingests documents; `finish`
//! weighs the postings and hands back an immutable [`SearchEngine`].

pub mod calibrate;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod index;
mod stem;
pub mod tokenizer;
pub mod weighting;

pub use config::{EngineConfig, Normalization, NormalizerOptions, PivotParams, Stemmer, TokenShape};
pub use corpus::{JudgmentRecord, QueryId, Topics};
pub use engine::{RankedHit, SearchEngine};
pub use error::{IrError, Result};
pub use index::{DocId, DocStatus, Document, IndexBuilder, Posting, Term};
pub use weighting::Weight;
