use crate::config::EngineConfig;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::model::ModelStats;
use crate::recommend::Recommender;
use crate::search::{self, AcceptAll, DietPolicy};
use crate::{Neighbor, PantryQuery, Recipe, RecipeId, SearchPage};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;

/// Owns the current corpus snapshot and the recommender.
///
/// The corpus and the vector model are swapped independently. A model may
/// still name recipes the current corpus has dropped; those are skipped when
/// recommendations are resolved to recipes.
pub struct PantryEngine {
    corpus: RwLock<Arc<Corpus>>,
    reload_lock: Mutex<u64>,
    recommender: Recommender,
    diet_policy: Box<dyn DietPolicy>,
}

impl PantryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            corpus: RwLock::new(Arc::new(Corpus::default())),
            reload_lock: Mutex::new(0),
            recommender: Recommender::new(config),
            diet_policy: Box::new(AcceptAll),
        }
    }

    pub fn with_diet_policy(mut self, policy: impl DietPolicy + 'static) -> Self {
        self.diet_policy = Box::new(policy);
        self
    }

    /// Build a new corpus generation from `recipes` and swap it in. Readers
    /// holding the previous snapshot keep it until they drop it.
    pub fn load_recipes(&self, recipes: Vec<Recipe>) -> Result<Arc<Corpus>> {
        let mut generation = self.reload_lock.lock();
        let corpus = Arc::new(Corpus::new(recipes, *generation + 1)?);
        *generation += 1;
        *self.corpus.write() = Arc::clone(&corpus);
        Ok(corpus)
    }

    pub fn corpus(&self) -> Arc<Corpus> { Arc::clone(&self.corpus.read()) }
    pub fn recommender(&self) -> &Recommender { &self.recommender }

    pub fn search(&self, query: &PantryQuery) -> Result<SearchPage> {
        search::search(&self.corpus(), query, self.diet_policy.as_ref())
    }

    pub fn recipe(&self, id: RecipeId) -> Result<Recipe> {
        self.corpus().recipe(id).cloned()
    }

    /// Retrain the vector model on the current corpus snapshot.
    pub fn train(&self) -> Result<bool> {
        self.recommender.train(&self.corpus())
    }

    pub fn save_model<P: AsRef<Path>>(&self, dir: P) -> Result<()> { self.recommender.save(dir) }
    pub fn load_model<P: AsRef<Path>>(&self, dir: P) -> Result<()> { self.recommender.load(dir) }
    pub fn model_stats(&self) -> ModelStats { self.recommender.stats() }

    pub fn recommend<S: AsRef<str>>(
        &self,
        pantry: &[S],
        n: usize,
        exclude: &[RecipeId],
        min_score: f32,
    ) -> Result<Vec<Neighbor>> {
        self.recommender.recommend(pantry, n, exclude, min_score)
    }

    pub fn similar_to(&self, recipe_id: RecipeId, n: usize) -> Result<Vec<Neighbor>> {
        self.recommender.similar_to(recipe_id, n)
    }

    /// Recommendations paired with their recipes from the current corpus.
    pub fn recommend_recipes<S: AsRef<str>>(
        &self,
        pantry: &[S],
        n: usize,
        exclude: &[RecipeId],
        min_score: f32,
    ) -> Result<Vec<(Recipe, f32)>> {
        let hits = self.recommend(pantry, n, exclude, min_score)?;
        let corpus = self.corpus();
        Ok(hits
            .into_iter()
            .filter_map(|h| corpus.get(h.recipe_id).map(|r| (r.clone(), h.score)))
            .collect())
    }
}

impl Default for PantryEngine {
    fn default() -> Self { Self::new(EngineConfig::default()) }
}
