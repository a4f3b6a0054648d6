use crate::config::{NormalizerOptions, Stemmer, TokenShape};
use crate::stem;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref LETTERS: Regex = Regex::new(r"[A-Za-z]+").expect("valid regex");
    static ref WORD_CHARS: Regex = Regex::new(r"\w+").expect("valid regex");
    static ref WORD_CHARS_HYPHEN: Regex = Regex::new(r"['\w\-]+").expect("valid regex");
    static ref SNOWBALL: SnowballStemmer = SnowballStemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","couldn't",
            "d","did","didn","didn't","do","does","doesn","doesn't","doing","don","don't","down","during",
            "each","few","for","from","further",
            "had","hadn","hadn't","has","hasn","hasn't","have","haven","haven't","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","isn't","it","it's","its","itself",
            "just","ll","m","ma","me","mightn","mightn't","more","most","mustn","mustn't","my","myself",
            "needn","needn't","no","nor","not","now",
            "o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shan't","she","she's","should","should've","shouldn","shouldn't","so","some","such",
            "t","than","that","that'll","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasn't","we","were","weren","weren't","what","when","where","which","while","who","whom","why","will","with","won","won't","wouldn","wouldn't",
            "y","you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// The single morphological step applied after stopword removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Morphology {
    None,
    Snowball,
    Lancaster,
    Lemmatize,
}

/// A text normalization pipeline with every option resolved up front.
#[derive(Debug, Clone)]
pub struct Normalizer {
    lowercase: bool,
    pattern: &'static Regex,
    remove_stopwords: bool,
    morphology: Morphology,
}

impl Normalizer {
    pub fn new(options: &NormalizerOptions) -> Self {
        let pattern: &'static Regex = match options.token_shape {
            TokenShape::LettersOnly => &LETTERS,
            TokenShape::WordChars => &WORD_CHARS,
            TokenShape::WordCharsAndHyphenApostrophe => &WORD_CHARS_HYPHEN,
        };
        if options.stemmer != Stemmer::None && options.lemmatize {
            tracing::warn!(stemmer = ?options.stemmer, "stemming and lemmatizing both requested; using the stemmer");
        }
        // Porter2 (Snowball English) is the revised Porter algorithm.
        let morphology = match options.stemmer {
            Stemmer::Porter | Stemmer::Snowball => Morphology::Snowball,
            Stemmer::Lancaster => Morphology::Lancaster,
            Stemmer::None if options.lemmatize => Morphology::Lemmatize,
            Stemmer::None => Morphology::None,
        };
        Self { lowercase: options.lowercase, pattern, remove_stopwords: options.remove_stopwords, morphology }
    }

    /// Same case folding and token shape, but stopwords kept and no
    /// morphology. Used to judge whether a document reads as English.
    pub fn language_probe(&self) -> Self {
        Self { remove_stopwords: false, morphology: Morphology::None, ..self.clone() }
    }

    /// Tokenize text using NFKC normalization, optional lowercasing, the
    /// configured token shape, optional stopword removal and at most one of
    /// stemming or lemmatization.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let mut normalized = text.nfkc().collect::<String>();
        if self.lowercase {
            normalized = normalized.to_lowercase();
        }
        let mut tokens = Vec::new();
        for mat in self.pattern.find_iter(&normalized) {
            let token = mat.as_str();
            if self.remove_stopwords && is_stopword(token) { continue; }
            let token = match self.morphology {
                Morphology::None => token.to_string(),
                Morphology::Snowball => SNOWBALL.stem(token).into_owned(),
                Morphology::Lancaster => stem::lancaster(token),
                Morphology::Lemmatize => stem::lemmatize(token),
            };
            if !token.is_empty() {
                tokens.push(token);
            }
        }
        tokens
    }
}

impl Default for Normalizer {
    fn default() -> Self { Self::new(&NormalizerOptions::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let n = Normalizer::new(&NormalizerOptions { stemmer: Stemmer::Snowball, ..Default::default() });
        let t = n.normalize("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn letters_only_splits_on_digits() {
        let t = Normalizer::default().normalize("abc123def");
        assert_eq!(t, vec!["abc", "def"]);
    }

    #[test]
    fn probe_keeps_stopwords() {
        let n = Normalizer::new(&NormalizerOptions { remove_stopwords: true, ..Default::default() });
        assert_eq!(n.normalize("the cat"), vec!["cat"]);
        assert_eq!(n.language_probe().normalize("the cat"), vec!["the", "cat"]);
    }
}
