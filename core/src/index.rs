use crate::config::{EngineConfig, ValidatedConfig};
use crate::engine::SearchEngine;
use crate::error::Result;
use crate::tokenizer::{is_stopword, Normalizer};
use crate::weighting;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

pub type DocId = u32;

/// Number of top bigrams posted per document in bigram mode.
const TOP_BIGRAMS: usize = 3;
/// Top tokens inspected by the English-only filter, and how many of them
/// must be stopwords.
const LANGUAGE_PROBE_TOP: usize = 3;
const LANGUAGE_PROBE_MIN_STOPWORDS: usize = 2;

/// Index key: a single token, or an ordered pair of adjacent tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Word(String),
    Bigram(String, String),
}

impl Term {
    /// Parse a user-supplied term: two whitespace-separated words make a
    /// bigram, anything else is taken as a single word.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => Term::Bigram(a.to_string(), b.to_string()),
            _ => Term::Word(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Word(w) => f.write_str(w),
            Term::Bigram(a, b) => write!(f, "{a} {b}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Raw occurrences of the term in the document.
    pub frequency: u32,
}

/// term -> postings, at most one entry per doc id.
pub type Postings = HashMap<Term, Vec<Posting>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Contributed postings.
    Indexed,
    /// Empty after normalization; its judgments are ignored.
    Blank,
    /// Skipped by the English-only filter.
    Excluded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub blog_id: String,
    pub status: DocStatus,
}

/// Mutable build phase of the index. Call [`IndexBuilder::finish`] to weigh the
/// postings and obtain a read-only [`SearchEngine`].
pub struct IndexBuilder {
    config: ValidatedConfig,
    normalizer: Normalizer,
    probe: Normalizer,
    documents: Vec<Document>,
    postings: Postings,
}

impl IndexBuilder {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let config = config.validate()?;
        let normalizer = Normalizer::new(&config.normalizer);
        let probe = normalizer.language_probe();
        Ok(Self { config, normalizer, probe, documents: Vec::new(), postings: HashMap::new() })
    }

    /// Ingest one document. Every document gets the next sequential id, even
    /// blank or excluded ones, so that judgments can still be resolved.
    pub fn add_document(&mut self, blog_id: impl Into<String>, text: &str) -> DocId {
        let doc_id = self.documents.len() as DocId;
        let tokens = self.normalizer.normalize(text);
        let status = if tokens.is_empty() {
            DocStatus::Blank
        } else if self.config.english_only && !self.reads_as_english(text) {
            DocStatus::Excluded
        } else {
            self.post(doc_id, &tokens);
            DocStatus::Indexed
        };
        tracing::trace!(doc_id, ?status, tokens = tokens.len(), "ingested document");
        self.documents.push(Document { doc_id, blog_id: blog_id.into(), status });
        doc_id
    }

    fn post(&mut self, doc_id: DocId, tokens: &[String]) {
        for (word, frequency) in frequency_distribution(tokens.iter().cloned()) {
            self.postings.entry(Term::Word(word)).or_default().push(Posting { doc_id, frequency });
        }
        if self.config.bigrams {
            let pairs = tokens.windows(2).map(|w| (w[0].clone(), w[1].clone()));
            let top = top_n(frequency_distribution(pairs), TOP_BIGRAMS);
            for ((a, b), frequency) in top.into_iter().filter(|(_, f)| *f > 1) {
                self.postings.entry(Term::Bigram(a, b)).or_default().push(Posting { doc_id, frequency });
            }
        }
    }

    fn reads_as_english(&self, text: &str) -> bool {
        let fd = frequency_distribution(self.probe.normalize(text));
        let stopwords = top_n(fd, LANGUAGE_PROBE_TOP)
            .iter()
            .filter(|(w, _)| is_stopword(w))
            .count();
        stopwords >= LANGUAGE_PROBE_MIN_STOPWORDS
    }

    pub fn num_documents(&self) -> usize { self.documents.len() }

    /// Weigh and normalize the postings. The raw postings are consumed.
    pub fn finish(self) -> Result<SearchEngine> {
        let total_docs = self.documents.iter().filter(|d| d.status != DocStatus::Blank).count();
        let blank = self.documents.len() - total_docs;
        let excluded = self.documents.iter().filter(|d| d.status == DocStatus::Excluded).count();
        tracing::info!(num_docs = self.documents.len(), blank, excluded, num_terms = self.postings.len(), "ingested documents");

        let index = weighting::weigh(self.postings, total_docs).normalize(self.config.normalization)?;
        tracing::info!(normalization = ?self.config.normalization, "index build complete");
        Ok(SearchEngine::new(self.documents, index, self.normalizer, &self.config, total_docs))
    }
}

/// Counts in order of first occurrence.
fn frequency_distribution<T: Hash + Eq + Clone>(items: impl IntoIterator<Item = T>) -> Vec<(T, u32)> {
    let mut slots: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, u32)> = Vec::new();
    for item in items {
        match slots.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    counts
}

/// Highest counts first; ties keep first-occurrence order.
fn top_n<T>(mut counts: Vec<(T, u32)>, n: usize) -> Vec<(T, u32)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_distribution_keeps_first_occurrence_order() {
        let fd = frequency_distribution(["b", "a", "b", "c", "a", "b"]);
        assert_eq!(fd, vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn top_n_breaks_ties_by_first_occurrence() {
        let top = top_n(vec![("x", 1), ("y", 2), ("z", 2), ("w", 1)], 3);
        assert_eq!(top, vec![("y", 2), ("z", 2), ("x", 1)]);
    }

    #[test]
    fn blank_documents_are_recorded_without_postings() {
        let mut b = IndexBuilder::new(&EngineConfig::default()).unwrap();
        b.add_document("empty", "");
        b.add_document("digits", "1234 5678");
        b.add_document("real", "cat dog");
        assert_eq!(b.documents[0].status, DocStatus::Blank);
        assert_eq!(b.documents[1].status, DocStatus::Blank);
        assert_eq!(b.documents[2].status, DocStatus::Indexed);
        assert!(b.postings.values().flatten().all(|p| p.doc_id == 2));
    }

    #[test]
    fn bigrams_need_more_than_one_occurrence() {
        let cfg = EngineConfig { bigrams: true, ..Default::default() };
        let mut b = IndexBuilder::new(&cfg).unwrap();
        b.add_document("d", "new york new york big apple");
        let ny = Term::Bigram("new".into(), "york".into());
        assert_eq!(b.postings[&ny], vec![Posting { doc_id: 0, frequency: 2 }]);
        assert!(!b.postings.contains_key(&Term::Bigram("big".into(), "apple".into())));
    }

    #[test]
    fn english_filter_excludes_documents_without_stopwords() {
        let cfg = EngineConfig { english_only: true, ..Default::default() };
        let mut b = IndexBuilder::new(&cfg).unwrap();
        b.add_document("en", "the cat and the dog and the bird");
        b.add_document("xx", "lorem ipsum lorem ipsum dolor");
        assert_eq!(b.documents[0].status, DocStatus::Indexed);
        assert_eq!(b.documents[1].status, DocStatus::Excluded);
        assert!(b.postings.values().flatten().all(|p| p.doc_id == 0));
    }

    #[test]
    fn term_parse_and_display() {
        assert_eq!(Term::parse("new york"), Term::Bigram("new".into(), "york".into()));
        assert_eq!(Term::parse("cat"), Term::Word("cat".into()));
        assert_eq!(Term::Bigram("a".into(), "b".into()).to_string(), "a b");
    }
}
