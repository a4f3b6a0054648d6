//! Relevance evaluation: runs every topic through the engine and scores the
//! ranked lists against qrels.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | precision | P@k at the evaluation depth |
//! | recall | fraction of relevant documents retrieved |
//! | p@5 | precision at depth 5 |
//! | r-precision | precision at depth \|relevant\| |
//! | RR | 1 / rank of first relevant hit (undefined if none) |
//! | AP | mean precision at relevant hits over \|relevant\| |
//! | F1, F0.2 | F-beta of P and R (undefined if either is 0) |

mod evaluator;
pub mod metrics;

pub use evaluator::{Comparison, EvaluationReport, Evaluator, InspectedHit, Judgments, PrPoint};
pub use metrics::{MetricAverages, QueryMetrics};
