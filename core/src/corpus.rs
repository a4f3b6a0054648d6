//! Corpus ingestion from a directory tree, plus parsers for TREC-style topic
//! files and relevance judgments (qrels).

use crate::config::EngineConfig;
use crate::engine::SearchEngine;
use crate::error::{IrError, Result};
use crate::index::IndexBuilder;
use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub type QueryId = String;

/// query id -> query text
pub type Topics = BTreeMap<QueryId, String>;

lazy_static! {
    static ref TOPIC: Regex =
        Regex::new(r"(?s)<num>\s*Number:\s*(\d+)\s*<title>\s*(.*?)\s*<desc>").expect("valid regex");
}

/// Every regular file under `dir`, sorted by path.
pub fn corpus_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Blog id is the file name without its extension.
pub fn blog_id(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Keep a random subset of `n` files, still in path order.
pub fn sample_files<R: Rng>(files: Vec<PathBuf>, n: usize, rng: &mut R) -> Vec<PathBuf> {
    if n >= files.len() {
        return files;
    }
    let mut picked: Vec<PathBuf> = files.choose_multiple(rng, n).cloned().collect();
    picked.sort();
    picked
}

/// Index every file under `dir` (or a random `sample` of them). Doc ids follow
/// path order. Bytes that are not UTF-8 are replaced, not rejected.
pub fn load_directory<R: Rng>(
    dir: &Path,
    sample: Option<usize>,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<SearchEngine> {
    let mut files = corpus_files(dir);
    if files.is_empty() {
        return Err(IrError::NotFound(format!("no documents under {}", dir.display())));
    }
    if let Some(n) = sample {
        files = sample_files(files, n, rng);
    }
    let mut builder = IndexBuilder::new(config)?;
    for file in &files {
        let bytes = fs::read(file)?;
        builder.add_document(blog_id(file), &String::from_utf8_lossy(&bytes));
    }
    tracing::info!(num_docs = builder.num_documents(), dir = %dir.display(), "loaded corpus");
    builder.finish()
}

/// One qrels line: `query_id iteration doc_ref relevance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentRecord {
    pub query_id: QueryId,
    /// External document id (blog id).
    pub doc_ref: String,
    pub relevance: i32,
}

impl JudgmentRecord {
    pub fn is_relevant(&self) -> bool { self.relevance > 0 }
}

/// Extract `<num>`/`<title>` pairs. The title runs up to `<desc>`; inner
/// whitespace is collapsed.
pub fn parse_topics(text: &str) -> Topics {
    TOPIC
        .captures_iter(text)
        .map(|caps| {
            let title = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
            (caps[1].to_string(), title)
        })
        .collect()
}

/// Malformed lines are skipped with a warning.
pub fn parse_qrels(text: &str) -> Vec<JudgmentRecord> {
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() { continue; }
        let &[query_id, _iteration, doc_ref, relevance] = fields.as_slice() else {
            tracing::warn!(line = i + 1, "skipping qrels line with {} fields", fields.len());
            continue;
        };
        match relevance.parse::<i32>() {
            Ok(relevance) => records.push(JudgmentRecord {
                query_id: query_id.to_string(),
                doc_ref: doc_ref.to_string(),
                relevance,
            }),
            Err(_) => tracing::warn!(line = i + 1, relevance, "skipping qrels line with bad relevance"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn loads_a_directory_tree_in_path_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("BLOG-2.txt"), "cat dog cat").unwrap();
        fs::write(dir.path().join("sub/BLOG-1.txt"), "dog bird").unwrap();
        fs::write(dir.path().join("BLOG-3.txt"), "").unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let engine = load_directory(dir.path(), None, &EngineConfig::default(), &mut rng).unwrap();
        let ids: Vec<&str> = engine.documents().iter().map(|d| d.blog_id.as_str()).collect();
        assert_eq!(ids, vec!["BLOG-2", "BLOG-3", "BLOG-1"]);
        assert_eq!(engine.query("cat", 5)[0].blog_id, "BLOG-2");
    }

    #[test]
    fn sampling_keeps_path_order() {
        let files: Vec<PathBuf> = (0..10).map(|i| PathBuf::from(format!("f{i}"))).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let picked = sample_files(files, 4, &mut rng);
        assert_eq!(picked.len(), 4);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = load_directory(dir.path(), None, &EngineConfig::default(), &mut rng).unwrap_err();
        assert!(matches!(err, IrError::NotFound(_)));
    }

    #[test]
    fn parses_trec_topics() {
        let text = "<top>\n<num> Number: 851\n\n<title> \"March of the Penguins\"\n\n<desc> Description:\nFind opinions.\n</top>\n\
                    <top>\n<num> Number: 852\n\n<title> larry summers\n\n<desc> Description:\n...\n</top>";
        let topics = parse_topics(text);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics["851"], "\"March of the Penguins\"");
        assert_eq!(topics["852"], "larry summers");
    }

    #[test]
    fn parses_qrels_and_skips_garbage() {
        let text = "851 0 BLOG06-001 1\n\nbroken line\n851 0 BLOG06-002 0\n852 0 BLOG06-003 x\n";
        let recs = parse_qrels(text);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].is_relevant());
        assert!(!recs[1].is_relevant());
        assert_eq!(recs[1].doc_ref, "BLOG06-002");
    }
}
