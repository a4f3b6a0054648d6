//! Pivot calibration.
//!
//! Compares how often documents of a given length are retrieved with how
//! often they are relevant. Fitting a line to each and intersecting them gives
//! the pivot point; the slope of the relevance line is the pivot slope.

use crate::config::{Normalization, PivotParams};
use crate::corpus::{JudgmentRecord, Topics};
use crate::engine::SearchEngine;
use crate::error::{IrError, Result};
use crate::index::DocId;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct LengthBin {
    pub median_length: f64,
    pub documents: usize,
    pub mean_retrieved: f64,
    pub mean_relevant: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Calibration {
    pub params: PivotParams,
    pub bins: Vec<LengthBin>,
}

/// Least-squares `(slope, intercept)`.
fn linear_fit(points: &[(f64, f64)]) -> Result<(f64, f64)> {
    if points.len() < 2 {
        return Err(IrError::Calibration("need at least two bins to fit a line".into()));
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    if sxx == 0.0 {
        return Err(IrError::Calibration("all bins share the same length".into()));
    }
    let slope = sxy / sxx;
    Ok((slope, mean_y - slope * mean_x))
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] }
}

/// Equal-frequency bins over documents sorted by length.
fn bin_lengths(mut lengths: Vec<(DocId, f64)>, num_bins: usize) -> Vec<Vec<(DocId, f64)>> {
    lengths.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let n = lengths.len();
    (0..num_bins)
        .map(|i| lengths[i * n / num_bins..(i + 1) * n / num_bins].to_vec())
        .filter(|bin| !bin.is_empty())
        .collect()
}

pub fn find_pivot(
    engine: &SearchEngine,
    topics: &Topics,
    records: &[JudgmentRecord],
    k: usize,
    num_bins: usize,
) -> Result<Calibration> {
    if engine.normalization() == Normalization::None {
        return Err(IrError::Configuration("pivot calibration needs a normalized index".into()));
    }
    if num_bins < 3 {
        return Err(IrError::Configuration("pivot calibration needs at least 3 bins".into()));
    }

    let mut retrieved: HashMap<DocId, u32> = HashMap::new();
    for text in topics.values() {
        for hit in engine.query(text, k) {
            *retrieved.entry(hit.doc_id).or_insert(0) += 1;
        }
    }
    let mut relevant: HashMap<DocId, u32> = HashMap::new();
    for rec in records.iter().filter(|r| r.is_relevant()) {
        if let Some(doc_id) = engine.doc_id_of(&rec.doc_ref) {
            *relevant.entry(doc_id).or_insert(0) += 1;
        }
    }

    let lengths: Vec<(DocId, f64)> = engine
        .documents()
        .iter()
        .filter_map(|d| engine.doc_length(d.doc_id).map(|len| (d.doc_id, len)))
        .collect();
    let bins: Vec<LengthBin> = bin_lengths(lengths, num_bins)
        .into_iter()
        .map(|bin| {
            let sorted: Vec<f64> = bin.iter().map(|(_, len)| *len).collect();
            let count = |m: &HashMap<DocId, u32>| {
                bin.iter().map(|(id, _)| m.get(id).copied().unwrap_or(0) as f64).sum::<f64>() / bin.len() as f64
            };
            LengthBin {
                median_length: median(&sorted),
                documents: bin.len(),
                mean_retrieved: count(&retrieved),
                mean_relevant: count(&relevant),
            }
        })
        .collect();

    let relevance: Vec<(f64, f64)> = bins.iter().map(|b| (b.median_length, b.mean_relevant)).collect();
    // The shortest bin is an outlier for retrieval counts.
    let retrieval: Vec<(f64, f64)> = bins.iter().skip(1).map(|b| (b.median_length, b.mean_retrieved)).collect();
    let (rel_slope, rel_icpt) = linear_fit(&relevance)?;
    let (ret_slope, ret_icpt) = linear_fit(&retrieval)?;
    if (ret_slope - rel_slope).abs() < f64::EPSILON {
        return Err(IrError::Calibration("retrieval and relevance lines are parallel".into()));
    }
    let pivot_factor = (rel_icpt - ret_icpt) / (ret_slope - rel_slope);
    tracing::info!(slope = rel_slope, pivot_factor, bins = bins.len(), "calibrated pivot");
    Ok(Calibration { params: PivotParams { slope: rel_slope, pivot_factor }, bins })
}
