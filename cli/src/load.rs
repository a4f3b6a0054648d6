use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use vsir_core::corpus::{parse_qrels, parse_topics};
use vsir_core::{JudgmentRecord, Topics};

pub fn load_topics(path: &Path) -> Result<Topics> {
    let text = fs::read_to_string(path).with_context(|| format!("reading topics {}", path.display()))?;
    let topics = parse_topics(&text);
    if topics.is_empty() {
        anyhow::bail!("no topics found in {}", path.display());
    }
    Ok(topics)
}

pub fn load_qrels(path: &Path) -> Result<Vec<JudgmentRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading qrels {}", path.display()))?;
    Ok(parse_qrels(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn topics_file_without_topics_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("topics.txt");
        fs::write(&path, "nothing here").unwrap();
        assert!(load_topics(&path).is_err());
    }

    #[test]
    fn reads_qrels_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qrels.txt");
        fs::write(&path, "851 0 BLOG-1 1\n851 0 BLOG-2 0\n").unwrap();
        let recs = load_qrels(&path).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].doc_ref, "BLOG-1");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_qrels(Path::new("/nonexistent/qrels.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/qrels.txt"));
    }
}
