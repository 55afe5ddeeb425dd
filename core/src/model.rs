use crate::config::{EngineConfig, IndexKind};
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::similarity::{IndexState, SimilarityIndex, SparseVector};
use crate::vectorizer::{Vectorizer, VectorizerState};
use crate::{Neighbor, RecipeId};
use serde::{Deserialize, Serialize};

/// A trained vectorizer with the similarity index over its recipe rows.
/// Immutable; retraining produces a new one.
#[derive(Debug, Clone)]
pub struct VectorModel {
    vectorizer: Vectorizer,
    index: SimilarityIndex,
}

/// Everything that must survive a save/load cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    pub vectorizer: VectorizerState,
    pub index: IndexState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStats {
    pub is_trained: bool,
    pub num_recipes: usize,
    pub num_features: usize,
    pub index_kind: Option<IndexKind>,
    pub accelerated_rows: usize,
}

impl ModelStats {
    pub fn untrained() -> Self {
        Self { is_trained: false, num_recipes: 0, num_features: 0, index_kind: None, accelerated_rows: 0 }
    }
}

impl VectorModel {
    /// `None` when the corpus is empty.
    pub fn train(corpus: &Corpus, config: &EngineConfig) -> Result<Option<Self>> {
        let Some((vectorizer, rows)) = Vectorizer::fit(corpus.recipes(), &config.vectorizer) else {
            return Ok(None);
        };
        let ids = corpus.recipes().iter().map(|r| r.id).collect();
        let index = SimilarityIndex::build(ids, rows, vectorizer.num_features(), &config.index)?;
        Ok(Some(Self { vectorizer, index }))
    }

    pub fn from_state(state: ModelState) -> Result<Self> {
        let vectorizer = Vectorizer::from_state(state.vectorizer)?;
        let index = SimilarityIndex::from_state(state.index)?;
        if index.dims() != vectorizer.num_features() {
            return Err(Error::Persistence(format!(
                "index has {} dimensions, vocabulary has {} terms",
                index.dims(),
                vectorizer.num_features()
            )));
        }
        Ok(Self { vectorizer, index })
    }

    pub fn to_state(&self) -> ModelState {
        ModelState { vectorizer: self.vectorizer.state().clone(), index: self.index.state().clone() }
    }

    pub fn vectorizer(&self) -> &Vectorizer { &self.vectorizer }
    pub fn index(&self) -> &SimilarityIndex { &self.index }
    pub fn recipe_ids(&self) -> &[RecipeId] { self.index.ids() }

    pub fn query_vector<S: AsRef<str>>(&self, ingredients: &[S]) -> SparseVector {
        self.vectorizer.transform_ingredients(ingredients)
    }

    pub fn nearest(&self, query: &SparseVector, k: usize) -> Vec<Neighbor> {
        self.index.query_nearest(query, k)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            is_trained: true,
            num_recipes: self.index.len(),
            num_features: self.vectorizer.num_features(),
            index_kind: Some(self.index.kind()),
            accelerated_rows: self.index.accelerator().map_or(0, |a| a.num_rows()),
        }
    }
}
