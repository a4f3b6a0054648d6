//! Engine configuration.
//!
//! A config is a plain value: build it with a struct literal (or from JSON) and
//! call [`EngineConfig::validate`] once. Validation rejects inconsistent
//! combinations up front so that the builder never has to re-check options.

use crate::error::{IrError, Result};
use serde::{Deserialize, Serialize};

/// Which characters make up a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenShape {
    /// ASCII letters only, digits and symbols split tokens.
    #[default]
    LettersOnly,
    /// Word characters (letters, digits, underscore).
    WordChars,
    /// Word characters plus hyphens and apostrophes.
    WordCharsAndHyphenApostrophe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stemmer {
    #[default]
    None,
    Porter,
    Lancaster,
    Snowball,
}

/// Options for the text normalization pipeline. Documents and queries must be
/// normalized with the same options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NormalizerOptions {
    pub lowercase: bool,
    pub token_shape: TokenShape,
    pub remove_stopwords: bool,
    pub stemmer: Stemmer,
    /// Mutually exclusive with `stemmer`; the stemmer wins when both are set.
    pub lemmatize: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            token_shape: TokenShape::LettersOnly,
            remove_stopwords: false,
            stemmer: Stemmer::None,
            lemmatize: false,
        }
    }
}

/// Constants produced offline by pivot calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PivotParams {
    pub slope: f64,
    pub pivot_factor: f64,
}

impl PivotParams {
    /// The pivot denominator `(1 - slope) * pivot + slope * length` must stay
    /// positive for every length, including 0.
    pub fn check(&self) -> Result<()> {
        if !self.slope.is_finite() || !self.pivot_factor.is_finite() {
            return Err(IrError::Configuration("pivot constants must be finite".into()));
        }
        if self.slope < 0.0 {
            return Err(IrError::Configuration("pivot slope must be non-negative".into()));
        }
        if (1.0 - self.slope) * self.pivot_factor <= 0.0 {
            return Err(IrError::Configuration(format!(
                "pivot slope {} and pivot factor {} give a non-positive denominator",
                self.slope, self.pivot_factor
            )));
        }
        Ok(())
    }
}

impl Default for PivotParams {
    fn default() -> Self {
        Self { slope: 0.00162428, pivot_factor: 37.48 }
    }
}

/// Length normalization applied after TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    None,
    Cosine,
    Pivoted(PivotParams),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub normalizer: NormalizerOptions,
    /// Post the top bigrams of each document and extend queries with bigrams.
    pub bigrams: bool,
    /// Exclude documents whose most frequent tokens are not mostly stopwords.
    pub english_only: bool,
    pub normalize: bool,
    pub pivot: Option<PivotParams>,
}

/// A config that passed validation. Only obtainable through
/// [`EngineConfig::validate`]; its fields are private to the crate.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub(crate) normalizer: NormalizerOptions,
    pub(crate) bigrams: bool,
    pub(crate) english_only: bool,
    pub(crate) normalization: Normalization,
}

impl ValidatedConfig {
    pub fn normalization(&self) -> Normalization { self.normalization }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<ValidatedConfig> {
        let mut normalizer = self.normalizer.clone();
        if self.bigrams && normalizer.remove_stopwords {
            tracing::warn!("bigram mode keeps stopwords; ignoring remove_stopwords");
            normalizer.remove_stopwords = false;
        }

        let normalization = match (self.normalize, self.pivot) {
            (false, None) => Normalization::None,
            (true, None) => Normalization::Cosine,
            (true, Some(p)) => {
                p.check()?;
                Normalization::Pivoted(p)
            }
            (false, Some(_)) => {
                return Err(IrError::Configuration(
                    "pivoted normalization requires normalize = true".into(),
                ))
            }
        };

        Ok(ValidatedConfig {
            normalizer,
            bigrams: self.bigrams,
            english_only: self.english_only,
            normalization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_without_normalize_is_rejected() {
        let cfg = EngineConfig { pivot: Some(PivotParams::default()), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(IrError::Configuration(_))));
    }

    #[test]
    fn pivot_with_zero_denominator_is_rejected() {
        for (slope, pivot_factor) in [(0.0, 0.0), (1.0, 37.48), (1.5, 10.0), (0.2, -1.0), (f64::NAN, 1.0)] {
            let cfg = EngineConfig {
                normalize: true,
                pivot: Some(PivotParams { slope, pivot_factor }),
                ..Default::default()
            };
            assert!(
                matches!(cfg.validate(), Err(IrError::Configuration(_))),
                "slope {slope}, pivot factor {pivot_factor} should be rejected"
            );
        }
        let ok = EngineConfig { normalize: true, pivot: Some(PivotParams::default()), ..Default::default() };
        assert_eq!(ok.validate().unwrap().normalization, Normalization::Pivoted(PivotParams::default()));
    }

    #[test]
    fn bigrams_force_stopwords_kept() {
        let cfg = EngineConfig {
            bigrams: true,
            normalizer: NormalizerOptions { remove_stopwords: true, ..Default::default() },
            ..Default::default()
        };
        let v = cfg.validate().unwrap();
        assert!(!v.normalizer.remove_stopwords);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{"normalise": true}"#);
        assert!(matches!(err, Err(IrError::Json(_))));
    }

    #[test]
    fn parses_enums_from_json() {
        let cfg = EngineConfig::from_json_str(
            r#"{"normalize": true, "normalizer": {"stemmer": "lancaster", "token_shape": "word_chars"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.normalizer.stemmer, Stemmer::Lancaster);
        assert_eq!(cfg.normalizer.token_shape, TokenShape::WordChars);
        assert!(cfg.normalizer.lowercase);
        assert_eq!(cfg.validate().unwrap().normalization, Normalization::Cosine);
    }
}
