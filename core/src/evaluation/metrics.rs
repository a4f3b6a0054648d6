//! Per-query retrieval metrics over a ranked list of doc ids and a set of
//! relevant doc ids.
//!
//! Undefined values are `None`, never `0`: reciprocal rank with no relevant
//! hit, and F-scores when precision or recall is zero.

use crate::error::{IrError, Result};
use crate::index::DocId;
use serde::Serialize;
use std::collections::HashSet;

fn hits(retrieved: &[DocId], relevant: &HashSet<DocId>) -> usize {
    let unique: HashSet<&DocId> = retrieved.iter().collect();
    unique.into_iter().filter(|d| relevant.contains(d)).count()
}

/// `|retrieved[..depth] ∩ relevant| / depth`. Depth 0 is rejected.
pub fn precision_at(retrieved: &[DocId], relevant: &HashSet<DocId>, depth: usize) -> Result<f64> {
    if depth == 0 {
        return Err(IrError::ZeroDepth);
    }
    let prefix = &retrieved[..depth.min(retrieved.len())];
    Ok(hits(prefix, relevant) as f64 / depth as f64)
}

/// `|retrieved ∩ relevant| / |relevant|`; 0 when nothing is relevant.
pub fn recall(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits(retrieved, relevant) as f64 / relevant.len() as f64
}

/// Precision at depth `|relevant|`.
pub fn r_precision(retrieved: &[DocId], relevant: &HashSet<DocId>) -> Result<f64> {
    precision_at(retrieved, relevant, relevant.len())
}

pub fn reciprocal_rank(retrieved: &[DocId], relevant: &HashSet<DocId>) -> Option<f64> {
    retrieved
        .iter()
        .position(|d| relevant.contains(d))
        .map(|i| 1.0 / (i + 1) as f64)
}

/// Sum of precision at the rank of each relevant hit, divided by the size of
/// the whole relevant set, so relevant documents never retrieved count as 0.
pub fn average_precision(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut found = 0usize;
    let mut sum = 0.0;
    let mut seen = HashSet::new();
    for (i, doc) in retrieved.iter().enumerate() {
        if relevant.contains(doc) && seen.insert(*doc) {
            found += 1;
            sum += found as f64 / (i + 1) as f64;
        }
    }
    sum / relevant.len() as f64
}

/// `(1 + β²)·P·R / (β²·P + R)`, undefined when P or R is zero.
pub fn f_beta(precision: f64, recall: f64, beta: f64) -> Option<f64> {
    if precision == 0.0 || recall == 0.0 {
        return None;
    }
    let b2 = beta * beta;
    Some((1.0 + b2) * precision * recall / (b2 * precision + recall))
}

/// All metrics for one scored topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMetrics {
    /// Precision at the evaluation depth k.
    pub precision: f64,
    pub recall: f64,
    pub p_at_5: f64,
    pub r_precision: f64,
    pub reciprocal_rank: Option<f64>,
    pub average_precision: f64,
    pub f1: Option<f64>,
    pub f0_2: Option<f64>,
}

impl QueryMetrics {
    /// `relevant` must be non-empty and `k` non-zero.
    pub fn compute(retrieved: &[DocId], relevant: &HashSet<DocId>, k: usize) -> Result<Self> {
        let precision = precision_at(retrieved, relevant, k)?;
        let recall = recall(retrieved, relevant);
        Ok(Self {
            precision,
            recall,
            p_at_5: precision_at(retrieved, relevant, 5)?,
            r_precision: r_precision(retrieved, relevant)?,
            reciprocal_rank: reciprocal_rank(retrieved, relevant),
            average_precision: average_precision(retrieved, relevant),
            f1: f_beta(precision, recall, 1.0),
            f0_2: f_beta(precision, recall, 0.2),
        })
    }
}

/// Means across scored topics. Optional metrics average only their defined
/// values; a mean over nothing is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricAverages {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub p_at_5: Option<f64>,
    pub r_precision: Option<f64>,
    pub mrr: Option<f64>,
    pub map: Option<f64>,
    pub f1: Option<f64>,
    pub f0_2: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl MetricAverages {
    pub fn from_metrics<'a>(metrics: impl IntoIterator<Item = &'a QueryMetrics> + Clone) -> Self {
        let m = || metrics.clone().into_iter();
        Self {
            precision: mean(m().map(|q| q.precision)),
            recall: mean(m().map(|q| q.recall)),
            p_at_5: mean(m().map(|q| q.p_at_5)),
            r_precision: mean(m().map(|q| q.r_precision)),
            mrr: mean(m().filter_map(|q| q.reciprocal_rank)),
            map: mean(m().map(|q| q.average_precision)),
            f1: mean(m().filter_map(|q| q.f1)),
            f0_2: mean(m().filter_map(|q| q.f0_2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: DocId = 1;
    const B: DocId = 2;
    const X: DocId = 9;

    fn rel(ids: &[DocId]) -> HashSet<DocId> { ids.iter().copied().collect() }

    #[test]
    fn precision_rejects_zero_depth() {
        assert!(matches!(precision_at(&[A], &rel(&[A]), 0), Err(IrError::ZeroDepth)));
    }

    #[test]
    fn worked_example() {
        let retrieved = [A, X, B];
        let relevant = rel(&[A, B]);
        let m = QueryMetrics::compute(&retrieved, &relevant, 3).unwrap();
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.reciprocal_rank, Some(1.0));
        assert!((m.average_precision - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert!((m.p_at_5 - 2.0 / 5.0).abs() < 1e-12);
        assert_eq!(m.r_precision, 0.5);
    }

    #[test]
    fn reciprocal_rank_without_hits_is_undefined() {
        assert_eq!(reciprocal_rank(&[X, 10, 11], &rel(&[A])), None);
        assert_eq!(reciprocal_rank(&[X, A], &rel(&[A])), Some(0.5));
    }

    #[test]
    fn f_beta_undefined_for_zero_inputs() {
        assert_eq!(f_beta(0.0, 0.5, 1.0), None);
        assert_eq!(f_beta(0.5, 0.0, 0.2), None);
        assert!((f_beta(0.5, 0.5, 1.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn recall_is_bounded() {
        let relevant = rel(&[A, B]);
        assert_eq!(recall(&[X], &relevant), 0.0);
        assert_eq!(recall(&[A], &relevant), 0.5);
        assert_eq!(recall(&[B, X, A], &relevant), 1.0);
    }

    #[test]
    fn average_precision_ignores_order_of_non_relevant() {
        let relevant = rel(&[A, B]);
        let one = average_precision(&[A, X, 10, B], &relevant);
        let two = average_precision(&[A, 10, X, B], &relevant);
        assert_eq!(one, two);
        let moved = average_precision(&[A, B, X, 10], &relevant);
        assert!(moved > one);
    }

    #[test]
    fn average_precision_penalizes_missed_documents() {
        let relevant = rel(&[A, B, 3, 4]);
        assert_eq!(average_precision(&[A], &relevant), 0.25);
    }

    #[test]
    fn averages_skip_undefined_values() {
        let hit = QueryMetrics::compute(&[A], &rel(&[A]), 1).unwrap();
        let miss = QueryMetrics::compute(&[X], &rel(&[A]), 1).unwrap();
        let avg = MetricAverages::from_metrics([&hit, &miss]);
        assert_eq!(avg.precision, Some(0.5));
        assert_eq!(avg.mrr, Some(1.0));
        assert_eq!(avg.f1, Some(1.0));
        assert_eq!(MetricAverages::from_metrics(Vec::<&QueryMetrics>::new()).map, None);
    }
}
