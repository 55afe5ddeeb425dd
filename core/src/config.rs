//! Engine configuration. Every field has a default so a partial JSON file works.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vectorizer: VectorizerConfig,
    pub index: IndexConfig,
    pub recommend: RecommendConfig,
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text).map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopWords {
    English,
    None,
    Custom(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Vocabulary cap; terms are kept by descending document frequency.
    pub max_features: usize,
    /// Longest n-gram emitted by the tokenizer (1 = unigrams only).
    pub ngram_max: usize,
    pub stop_words: StopWords,
    /// Use idf = ln((1 + N) / (1 + df)) + 1 instead of ln(N / df) + 1.
    pub smooth_idf: bool,
    /// Use tf = 1 + ln(count) instead of the raw count.
    pub sublinear_tf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self { max_features: 1000, ngram_max: 2, stop_words: StopWords::English, smooth_idf: true, sublinear_tf: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Cosine against every row.
    Exact,
    /// Term postings over normalized rows; only rows sharing a term are touched.
    Postings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Row count above which the postings accelerator is built.
    pub accelerate_above: usize,
    /// Overrides the size-based choice.
    pub force: Option<IndexKind>,
}

impl Default for IndexConfig {
    fn default() -> Self { Self { accelerate_above: 2048, force: None } }
}

impl IndexConfig {
    pub fn kind_for(&self, rows: usize) -> IndexKind {
        match self.force {
            Some(kind) => kind,
            None if rows > self.accelerate_above => IndexKind::Postings,
            None => IndexKind::Exact,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Candidates requested per wanted result, to absorb exclusions and `min_score`.
    pub candidate_factor: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self { Self { candidate_factor: 3 } }
}
