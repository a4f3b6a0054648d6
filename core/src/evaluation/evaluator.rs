use crate::corpus::{JudgmentRecord, QueryId, Topics};
use crate::engine::{RankedHit, SearchEngine};
use crate::error::{IrError, Result};
use crate::evaluation::metrics::{precision_at, MetricAverages, QueryMetrics};
use crate::index::{DocId, DocStatus};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Relevant documents per query, restricted to documents present and
/// non-blank in the engine.
#[derive(Debug, Clone, Default)]
pub struct Judgments {
    relevant: BTreeMap<QueryId, HashSet<DocId>>,
}

impl Judgments {
    /// Judgments pointing at unknown or blank documents are dropped. A query
    /// that appears only with dropped or non-relevant judgments still gets an
    /// (empty) entry.
    pub fn from_records(records: &[JudgmentRecord], engine: &SearchEngine) -> Self {
        let mut relevant: BTreeMap<QueryId, HashSet<DocId>> = BTreeMap::new();
        let mut dropped = 0usize;
        for rec in records {
            let doc = engine
                .doc_id_of(&rec.doc_ref)
                .and_then(|id| engine.document(id).ok())
                .filter(|d| d.status != DocStatus::Blank);
            let Some(doc) = doc else {
                tracing::debug!(query_id = %rec.query_id, doc_ref = %rec.doc_ref, "judgment references a document outside the collection");
                dropped += 1;
                continue;
            };
            let entry = relevant.entry(rec.query_id.clone()).or_default();
            if rec.is_relevant() {
                entry.insert(doc.doc_id);
            }
        }
        if dropped > 0 {
            tracing::info!(dropped, kept = records.len() - dropped, "dropped judgments for unknown or blank documents");
        }
        Self { relevant }
    }

    pub fn relevant(&self, query_id: &str) -> Option<&HashSet<DocId>> {
        self.relevant.get(query_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    /// Only topics with at least one relevant document.
    pub per_query: BTreeMap<QueryId, QueryMetrics>,
    pub averages: MetricAverages,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrPoint {
    pub k: usize,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectedHit {
    #[serde(flatten)]
    pub hit: RankedHit,
    pub relevant: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub query_id: QueryId,
    pub old_precision: Option<f64>,
    pub new_precision: f64,
    pub old_p_at_5: Option<f64>,
    pub new_p_at_5: f64,
}

/// Runs topics against an engine and scores them against judgments.
///
/// The RNG pads short result lists; pass a seeded one for reproducible runs.
pub struct Evaluator<'a, R> {
    engine: &'a SearchEngine,
    topics: Topics,
    by_text: HashMap<String, QueryId>,
    judgments: Judgments,
    rng: R,
}

impl<'a, R: Rng> Evaluator<'a, R> {
    pub fn new(engine: &'a SearchEngine, topics: Topics, records: &[JudgmentRecord], rng: R) -> Self {
        let judgments = Judgments::from_records(records, engine);
        let by_text = topics.iter().map(|(id, text)| (text.clone(), id.clone())).collect();
        Self { engine, topics, by_text, judgments, rng }
    }

    pub fn judgments(&self) -> &Judgments { &self.judgments }

    pub fn topics(&self) -> &Topics { &self.topics }

    /// Top-k doc ids for every topic, padded to exactly k (when the collection
    /// allows) with a random sample of other non-blank documents.
    pub fn retrieve_all(&mut self, k: usize) -> BTreeMap<QueryId, Vec<DocId>> {
        let engine = self.engine;
        let mut retrieved: BTreeMap<QueryId, Vec<DocId>> = self
            .topics
            .par_iter()
            .map(|(id, text)| (id.clone(), engine.query(text, k).into_iter().map(|h| h.doc_id).collect()))
            .collect();

        let pool: Vec<DocId> = engine.searchable_documents().map(|d| d.doc_id).collect();
        for docs in retrieved.values_mut() {
            if docs.len() >= k {
                continue;
            }
            let taken: HashSet<DocId> = docs.iter().copied().collect();
            let others: Vec<DocId> = pool.iter().copied().filter(|d| !taken.contains(d)).collect();
            docs.extend(others.choose_multiple(&mut self.rng, k - docs.len()).copied());
        }
        retrieved
    }

    pub fn evaluate(&mut self, k: usize) -> Result<EvaluationReport> {
        if k == 0 {
            return Err(IrError::Configuration("evaluation depth k must be at least 1".into()));
        }
        let retrieved = self.retrieve_all(k);
        let mut per_query = BTreeMap::new();
        for (query_id, docs) in &retrieved {
            let Some(relevant) = self.judgments.relevant(query_id).filter(|r| !r.is_empty()) else {
                continue;
            };
            per_query.insert(query_id.clone(), QueryMetrics::compute(docs, relevant, k)?);
        }
        let averages = MetricAverages::from_metrics(per_query.values());
        tracing::debug!(k, scored = per_query.len(), topics = retrieved.len(), "evaluated topics");
        Ok(EvaluationReport { k, per_query, averages })
    }

    /// Re-runs the full evaluation for every k in `1..=max_k`.
    pub fn pr_curve(&mut self, max_k: usize) -> Result<Vec<PrPoint>> {
        (1..=max_k)
            .map(|k| {
                let report = self.evaluate(k)?;
                Ok(PrPoint { k, precision: report.averages.precision, recall: report.averages.recall })
            })
            .collect()
    }

    pub fn query_id_for(&self, query_text: &str) -> Result<&QueryId> {
        self.by_text
            .get(query_text)
            .ok_or_else(|| IrError::NotFound(format!("query `{query_text}`")))
    }

    fn relevant_for(&self, query_id: &str) -> HashSet<DocId> {
        self.judgments.relevant(query_id).cloned().unwrap_or_default()
    }

    pub fn check_relevance(&self, query_text: &str, blog_id: &str) -> Result<bool> {
        let query_id = self.query_id_for(query_text)?;
        Ok(self
            .engine
            .doc_id_of(blog_id)
            .map_or(false, |id| self.relevant_for(query_id).contains(&id)))
    }

    /// Top-k hits of a known topic, each tagged with its relevance.
    pub fn inspect(&self, query_text: &str, k: usize) -> Result<Vec<InspectedHit>> {
        let relevant = self.relevant_for(self.query_id_for(query_text)?);
        Ok(self
            .engine
            .query(query_text, k)
            .into_iter()
            .map(|hit| {
                let relevant = relevant.contains(&hit.doc_id);
                InspectedHit { hit, relevant }
            })
            .collect())
    }

    /// Scores a reformulated query against the judgments of an existing topic,
    /// next to that topic's figures in `report`. No padding is applied.
    pub fn compare(&self, report: &EvaluationReport, original_text: &str, new_text: &str) -> Result<Comparison> {
        let query_id = self.query_id_for(original_text)?.clone();
        let relevant = self.relevant_for(&query_id);
        let docs: Vec<DocId> = self.engine.query(new_text, report.k).into_iter().map(|h| h.doc_id).collect();
        let old = report.per_query.get(&query_id);
        Ok(Comparison {
            old_precision: old.map(|m| m.precision),
            new_precision: precision_at(&docs, &relevant, report.k)?,
            old_p_at_5: old.map(|m| m.p_at_5),
            new_p_at_5: precision_at(&docs, &relevant, 5)?,
            query_id,
        })
    }
}
