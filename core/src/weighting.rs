//! TF-IDF weighting and length normalization.
//!
//! Each stage takes ownership of the previous one, so raw postings are freed
//! once TF-IDF weights exist, and TF-IDF weights are freed once normalized
//! weights exist.

use crate::config::{Normalization, PivotParams};
use crate::error::{IrError, Result};
use crate::index::{DocId, Postings, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub doc_id: DocId,
    pub score: f64,
}

pub type WeightMap = HashMap<Term, Vec<Weight>>;

/// Per-document length statistic. Holds the TF-IDF components until a
/// normalization pass reduces them to Euclidean norms.
#[derive(Debug, Clone)]
pub enum DocLengths {
    Components(HashMap<DocId, Vec<f64>>),
    Norms(HashMap<DocId, f64>),
}

impl DocLengths {
    pub fn norm(&self, doc_id: DocId) -> Option<f64> {
        match self {
            DocLengths::Norms(norms) => norms.get(&doc_id).copied(),
            DocLengths::Components(_) => None,
        }
    }
}

/// Weights after TF-IDF, before any normalization.
#[derive(Debug)]
pub struct TfIdf {
    weights: WeightMap,
    lengths: DocLengths,
}

/// The final, query-ready weights.
#[derive(Debug)]
pub struct WeightedIndex {
    pub weights: WeightMap,
    pub lengths: DocLengths,
}

#[inline]
pub fn tf(frequency: u32) -> f64 {
    if frequency == 0 { 0.0 } else { 1.0 + (frequency as f64).ln() }
}

/// `ln(N / df)`, where df counts documents, not occurrences.
#[inline]
pub fn idf(total_docs: usize, doc_freq: usize) -> f64 {
    (total_docs as f64 / doc_freq.max(1) as f64).ln()
}

pub fn weigh(postings: Postings, total_docs: usize) -> TfIdf {
    let mut components: HashMap<DocId, Vec<f64>> = HashMap::new();
    let mut weights: WeightMap = HashMap::with_capacity(postings.len());
    for (term, plist) in postings {
        let idf = idf(total_docs, plist.len());
        let weighted: Vec<Weight> = plist
            .into_iter()
            .map(|p| {
                let score = tf(p.frequency) * idf;
                components.entry(p.doc_id).or_default().push(score);
                Weight { doc_id: p.doc_id, score }
            })
            .collect();
        weights.insert(term, weighted);
    }
    tracing::debug!(num_terms = weights.len(), num_docs = components.len(), "computed tf-idf weights");
    TfIdf { weights, lengths: DocLengths::Components(components) }
}

impl TfIdf {
    /// Reduce component lists to Euclidean norms. A document whose terms all
    /// have idf 0 keeps its true length of 0.
    pub fn measure(self) -> Self {
        let lengths = match self.lengths {
            DocLengths::Components(components) => DocLengths::Norms(
                components
                    .into_iter()
                    .map(|(doc_id, parts)| (doc_id, parts.iter().map(|w| w * w).sum::<f64>().sqrt()))
                    .collect(),
            ),
            norms => norms,
        };
        Self { weights: self.weights, lengths }
    }

    pub fn cosine(self) -> WeightedIndex {
        let measured = self.measure();
        // Zero-length vectors hold only zero weights; leave them as they are.
        let weights = rescale(measured.weights, &measured.lengths, |w, len| if len == 0.0 { w } else { w / len });
        WeightedIndex { weights, lengths: measured.lengths }
    }

    /// Pivoted normalization of the raw TF-IDF weights against the cosine
    /// length: `w / ((1 - slope) * pivot + slope * length)`.
    pub fn pivot(self, params: PivotParams) -> Result<WeightedIndex> {
        if matches!(self.lengths, DocLengths::Components(_)) {
            return Err(IrError::Configuration(
                "pivoted normalization needs document lengths; normalize first".into(),
            ));
        }
        params.check()?;
        let PivotParams { slope, pivot_factor } = params;
        let weights = rescale(self.weights, &self.lengths, |w, len| {
            w / ((1.0 - slope) * pivot_factor + slope * len)
        });
        Ok(WeightedIndex { weights, lengths: self.lengths })
    }

    pub fn normalize(self, mode: Normalization) -> Result<WeightedIndex> {
        match mode {
            Normalization::None => Ok(WeightedIndex { weights: self.weights, lengths: self.lengths }),
            Normalization::Cosine => Ok(self.cosine()),
            Normalization::Pivoted(params) => self.measure().pivot(params),
        }
    }
}

fn rescale(weights: WeightMap, lengths: &DocLengths, f: impl Fn(f64, f64) -> f64) -> WeightMap {
    weights
        .into_iter()
        .map(|(term, plist)| {
            let scaled = plist
                .into_iter()
                .map(|w| {
                    let len = lengths.norm(w.doc_id).unwrap_or(1.0);
                    Weight { doc_id: w.doc_id, score: f(w.score, len) }
                })
                .collect();
            (term, scaled)
        })
        .collect()
}
