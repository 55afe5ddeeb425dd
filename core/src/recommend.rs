use crate::config::{EngineConfig, RecommendConfig};
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::model::{ModelStats, VectorModel};
use crate::persist::{load_model, save_model, ModelPaths};
use crate::{Neighbor, RecipeId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Content-based recommendations over a swappable [`VectorModel`].
///
/// Queries clone the current model handle and run without holding the lock;
/// training builds a new model off to the side and swaps it in.
#[derive(Default)]
pub struct Recommender {
    model: RwLock<Option<Arc<VectorModel>>>,
    train_lock: Mutex<()>,
    config: EngineConfig,
}

impl Recommender {
    pub fn new(config: EngineConfig) -> Self {
        Self { model: RwLock::new(None), train_lock: Mutex::new(()), config }
    }

    /// Start from the model saved under `dir`, or untrained if it cannot be read.
    pub fn open<P: AsRef<Path>>(dir: P, config: EngineConfig) -> Self {
        let recommender = Self::new(config);
        if let Err(e) = recommender.load(&dir) {
            tracing::warn!(error = %e, path = %dir.as_ref().display(), "no usable saved model, starting untrained");
        }
        recommender
    }

    pub fn is_trained(&self) -> bool { self.model.read().is_some() }

    pub fn model(&self) -> Result<Arc<VectorModel>> {
        self.model.read().clone().ok_or(Error::NotTrained)
    }

    /// Fit a new model on `corpus` and swap it in. An empty corpus leaves the
    /// current state untouched and returns `false`.
    pub fn train(&self, corpus: &Corpus) -> Result<bool> {
        let _guard = self.train_lock.lock();
        match VectorModel::train(corpus, &self.config)? {
            Some(model) => {
                self.install(model);
                Ok(true)
            }
            None => {
                tracing::warn!("no recipes to train on");
                Ok(false)
            }
        }
    }

    pub fn install(&self, model: VectorModel) {
        tracing::info!(num_recipes = model.index().len(), kind = ?model.index().kind(), "model installed");
        *self.model.write() = Some(Arc::new(model));
    }

    pub fn reset(&self) {
        *self.model.write() = None;
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let model = self.model()?;
        save_model(&ModelPaths::new(dir), &model)
    }

    /// Replace the current model with the one saved under `dir`. On failure the
    /// recommender falls back to untrained and the error is returned.
    pub fn load<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let _guard = self.train_lock.lock();
        match load_model(&ModelPaths::new(dir)) {
            Ok(model) => {
                self.install(model);
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> ModelStats {
        match self.model.read().as_ref() {
            Some(model) => model.stats(),
            None => ModelStats::untrained(),
        }
    }

    /// Up to `n` recipes most similar to the pantry text, highest score first,
    /// skipping `exclude` and anything scoring below `min_score`.
    pub fn recommend<S: AsRef<str>>(
        &self,
        pantry: &[S],
        n: usize,
        exclude: &[RecipeId],
        min_score: f32,
    ) -> Result<Vec<Neighbor>> {
        let model = self.model()?;
        Ok(recommend_with(&model, &self.config.recommend, pantry, n, exclude, min_score))
    }

    /// Up to `n` recipes most similar to `recipe_id`, never including itself.
    pub fn similar_to(&self, recipe_id: RecipeId, n: usize) -> Result<Vec<Neighbor>> {
        let model = self.model()?;
        similar_with(&model, recipe_id, n)
    }
}

pub fn recommend_with<S: AsRef<str>>(
    model: &VectorModel,
    config: &RecommendConfig,
    pantry: &[S],
    n: usize,
    exclude: &[RecipeId],
    min_score: f32,
) -> Vec<Neighbor> {
    if n == 0 {
        return Vec::new();
    }
    let query = model.query_vector(pantry);
    let want = n.saturating_mul(config.candidate_factor.max(2)).saturating_add(exclude.len());
    let excluded: HashSet<RecipeId> = exclude.iter().copied().collect();
    let hits: Vec<Neighbor> = model
        .nearest(&query, want)
        .into_iter()
        .filter(|h| !excluded.contains(&h.recipe_id) && h.score >= min_score)
        .take(n)
        .collect();
    tracing::debug!(pantry = pantry.len(), terms = query.nnz(), hits = hits.len(), "recommend");
    hits
}

pub fn similar_with(model: &VectorModel, recipe_id: RecipeId, n: usize) -> Result<Vec<Neighbor>> {
    let query = model.index().vector(recipe_id).ok_or(Error::NotFound(recipe_id))?;
    if n == 0 {
        return Ok(Vec::new());
    }
    Ok(model
        .nearest(query, n.saturating_add(1))
        .into_iter()
        .filter(|h| h.recipe_id != recipe_id)
        .take(n)
        .collect())
}
