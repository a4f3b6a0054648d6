use crate::config::{Normalization, ValidatedConfig};
use crate::error::{IrError, Result};
use crate::index::{DocId, DocStatus, Document, Term};
use crate::tokenizer::Normalizer;
use crate::weighting::{Weight, WeightMap, WeightedIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHit {
    pub doc_id: DocId,
    pub blog_id: String,
    pub score: f64,
}

/// Read-only phase of the index. Built by [`crate::IndexBuilder::finish`];
/// safe to share across threads for querying.
#[derive(Debug)]
pub struct SearchEngine {
    documents: Vec<Document>,
    by_blog_id: HashMap<String, DocId>,
    index: WeightedIndex,
    normalizer: Normalizer,
    bigrams: bool,
    normalization: Normalization,
    total_docs: usize,
}

impl SearchEngine {
    pub(crate) fn new(
        documents: Vec<Document>,
        index: WeightedIndex,
        normalizer: Normalizer,
        config: &ValidatedConfig,
        total_docs: usize,
    ) -> Self {
        let by_blog_id = documents.iter().map(|d| (d.blog_id.clone(), d.doc_id)).collect();
        Self {
            documents,
            by_blog_id,
            index,
            normalizer,
            bigrams: config.bigrams,
            normalization: config.normalization,
            total_docs,
        }
    }

    /// Distinct query terms in order of first appearance, extended with
    /// adjacent-pair bigrams in bigram mode.
    pub fn query_terms(&self, text: &str) -> Vec<Term> {
        let tokens = self.normalizer.normalize(text);
        let mut terms: Vec<Term> = tokens.iter().cloned().map(Term::Word).collect();
        if self.bigrams {
            terms.extend(tokens.windows(2).map(|w| Term::Bigram(w[0].clone(), w[1].clone())));
        }
        let mut seen = HashSet::new();
        terms.retain(|t| seen.insert(t.clone()));
        terms
    }

    /// Every scored document, best first. Equal scores rank by ascending doc id.
    /// Terms missing from the index contribute nothing.
    pub fn ranked(&self, text: &str) -> Vec<(DocId, f64)> {
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for term in self.query_terms(text) {
            let Some(plist) = self.index.weights.get(&term) else { continue };
            for w in plist {
                *scores.entry(w.doc_id).or_insert(0.0) += w.score;
            }
        }
        let mut scored: Vec<(DocId, f64)> = scores.into_iter().collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
    }

    pub fn query(&self, text: &str, k: usize) -> Vec<RankedHit> {
        if k == 0 {
            return Vec::new();
        }
        self.ranked(text)
            .into_iter()
            .take(k)
            .map(|(doc_id, score)| RankedHit { doc_id, blog_id: self.blog_id(doc_id).to_string(), score })
            .collect()
    }

    pub fn postings(&self, term: &Term) -> Result<&[Weight]> {
        self.index
            .weights
            .get(term)
            .map(Vec::as_slice)
            .ok_or_else(|| IrError::NotFound(format!("term `{term}`")))
    }

    pub fn document(&self, doc_id: DocId) -> Result<&Document> {
        self.documents
            .get(doc_id as usize)
            .ok_or_else(|| IrError::NotFound(format!("document {doc_id}")))
    }

    pub fn doc_id_of(&self, blog_id: &str) -> Option<DocId> {
        self.by_blog_id.get(blog_id).copied()
    }

    fn blog_id(&self, doc_id: DocId) -> &str {
        self.documents.get(doc_id as usize).map_or("", |d| d.blog_id.as_str())
    }

    pub fn documents(&self) -> &[Document] { &self.documents }

    /// Documents that are not blank, in doc id order.
    pub fn searchable_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| d.status != DocStatus::Blank)
    }

    /// Euclidean TF-IDF length, available once a normalization pass ran.
    pub fn doc_length(&self, doc_id: DocId) -> Option<f64> {
        self.index.lengths.norm(doc_id)
    }

    pub fn weights(&self) -> &WeightMap { &self.index.weights }

    pub fn normalization(&self) -> Normalization { self.normalization }

    pub fn vocabulary_size(&self) -> usize { self.index.weights.len() }

    /// N used for IDF: non-blank documents.
    pub fn total_docs(&self) -> usize { self.total_docs }

    pub fn count_with_status(&self, status: DocStatus) -> usize {
        self.documents.iter().filter(|d| d.status == status).count()
    }
}
