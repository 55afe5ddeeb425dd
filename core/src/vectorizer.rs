use crate::config::{StopWords, VectorizerConfig};
use crate::error::{Error, Result};
use crate::similarity::SparseVector;
use crate::tokenizer::{terms, StopWordSet};
use crate::{Recipe, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Frozen vocabulary and idf weights; what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerState {
    /// Sorted; a term's position is its id.
    pub vocabulary: Vec<String>,
    pub idf: Vec<f32>,
    pub ngram_max: usize,
    pub stop_words: StopWords,
    pub sublinear_tf: bool,
}

/// TF-IDF vectorizer over recipe text (name, ingredients, tags).
#[derive(Debug, Clone)]
pub struct Vectorizer {
    state: VectorizerState,
    term_ids: HashMap<String, TermId>,
    stop_words: StopWordSet,
}

/// Text blob a recipe is vectorized from.
pub fn recipe_text(recipe: &Recipe) -> String {
    format!("{} {} {}", recipe.name, recipe.ingredients.join(" "), recipe.tags.join(" "))
}

fn idf_weight(num_docs: usize, df: u32, smooth: bool) -> f32 {
    let (n, df) = (num_docs as f64, df as f64);
    let w = if smooth { ((1.0 + n) / (1.0 + df)).ln() + 1.0 } else { (n / df).ln() + 1.0 };
    w as f32
}

impl Vectorizer {
    /// Learn vocabulary and idf from `recipes` and return the raw (unnormalized)
    /// tf-idf row of every recipe, in input order. `None` for an empty corpus.
    pub fn fit(recipes: &[Recipe], config: &VectorizerConfig) -> Option<(Self, Vec<SparseVector>)> {
        if recipes.is_empty() {
            return None;
        }
        let stop_words = StopWordSet::from_config(&config.stop_words);
        let ngram_max = config.ngram_max.max(1);

        let docs: Vec<HashMap<String, u32>> = recipes
            .iter()
            .map(|r| {
                let mut tf: HashMap<String, u32> = HashMap::new();
                for term in terms(&recipe_text(r), &stop_words, ngram_max) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut df: HashMap<&str, u32> = HashMap::new();
        for doc in &docs {
            for term in doc.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(&str, u32)> = df.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(config.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let vocabulary: Vec<String> = ranked.iter().map(|(t, _)| t.to_string()).collect();
        let idf: Vec<f32> = ranked.iter().map(|&(_, d)| idf_weight(recipes.len(), d, config.smooth_idf)).collect();
        let state = VectorizerState {
            vocabulary,
            idf,
            ngram_max,
            stop_words: config.stop_words.clone(),
            sublinear_tf: config.sublinear_tf,
        };
        let vectorizer = Self::with_stop_words(state, stop_words);
        let rows = docs.iter().map(|doc| vectorizer.weigh(doc.iter().map(|(t, &c)| (t.as_str(), c)))).collect();
        tracing::info!(num_docs = recipes.len(), num_features = vectorizer.num_features(), "vectorizer fit");
        Some((vectorizer, rows))
    }

    pub fn from_state(state: VectorizerState) -> Result<Self> {
        if state.vocabulary.len() != state.idf.len() {
            return Err(Error::Persistence(format!(
                "vocabulary of {} terms with {} idf weights",
                state.vocabulary.len(),
                state.idf.len()
            )));
        }
        let unique: HashSet<&String> = state.vocabulary.iter().collect();
        if unique.len() != state.vocabulary.len() {
            return Err(Error::Persistence("duplicate vocabulary term".into()));
        }
        if let Some(pos) = state.idf.iter().position(|w| !w.is_finite() || *w <= 0.0) {
            return Err(Error::Persistence(format!("idf weight {} for term {:?}", state.idf[pos], state.vocabulary[pos])));
        }
        let stop_words = StopWordSet::from_config(&state.stop_words);
        Ok(Self::with_stop_words(state, stop_words))
    }

    fn with_stop_words(state: VectorizerState, stop_words: StopWordSet) -> Self {
        let term_ids = state.vocabulary.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
        Self { state, term_ids, stop_words }
    }

    pub fn state(&self) -> &VectorizerState { &self.state }
    pub fn num_features(&self) -> usize { self.state.vocabulary.len() }
    pub fn vocabulary(&self) -> &[String] { &self.state.vocabulary }
    pub fn term_id(&self, term: &str) -> Option<TermId> { self.term_ids.get(term).copied() }

    /// Raw tf-idf vector of `text` over the frozen vocabulary; unknown terms add nothing.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut tf: HashMap<String, u32> = HashMap::new();
        for term in terms(text, &self.stop_words, self.state.ngram_max) {
            *tf.entry(term).or_insert(0) += 1;
        }
        self.weigh(tf.iter().map(|(t, &c)| (t.as_str(), c)))
    }

    /// Pantry ingredients are vectorized as one space-joined text.
    pub fn transform_ingredients<S: AsRef<str>>(&self, ingredients: &[S]) -> SparseVector {
        let text = ingredients.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(" ");
        self.transform(&text)
    }

    fn weigh<'a>(&self, counts: impl Iterator<Item = (&'a str, u32)>) -> SparseVector {
        let mut weights: BTreeMap<TermId, f32> = BTreeMap::new();
        for (term, count) in counts {
            if let Some(&tid) = self.term_ids.get(term) {
                let tf = if self.state.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
                weights.insert(tid, tf * self.state.idf[tid as usize]);
            }
        }
        SparseVector::from_map(weights)
    }
}
