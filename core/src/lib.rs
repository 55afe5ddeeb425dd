//! Pantry matching and content-based recipe recommendation.
//!
//! Two engines share one corpus of [`Recipe`]s: coverage ranking of recipes
//! against a pantry (`search`), and TF-IDF vector similarity (`recommend`).
//! [`engine::PantryEngine`] composes both behind swappable snapshots.

pub mod config;
pub mod corpus;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod normalize;
pub mod persist;
pub mod recommend;
pub mod search;
pub mod similarity;
pub mod tokenizer;
pub mod vectorizer;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use config::EngineConfig;
pub use corpus::Corpus;
pub use engine::PantryEngine;
pub use error::{Error, Result};
pub use recommend::Recommender;

pub type RecipeId = u64;
pub type TermId = u32;

/// A recipe as loaded from the corpus. Immutable once it is part of a [`Corpus`].
/// Only serialized for output; input formats are parsed by the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub ingredients: Vec<String>,
    /// Derived from `ingredients` when the recipe enters a corpus.
    #[serde(skip)]
    pub normalized_ingredients: Vec<String>,
    pub time_minutes: u32,
    /// Ordered and free of duplicates once prepared.
    pub tags: Vec<String>,
    pub nutrition: BTreeMap<String, f64>,
    pub steps: Vec<String>,
}

impl Recipe {
    /// Name given to recipes that arrive without one.
    pub const UNNAMED: &'static str = "Unknown Recipe";

    pub fn new(id: RecipeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ingredients: Vec::new(),
            normalized_ingredients: Vec::new(),
            time_minutes: 0,
            tags: Vec::new(),
            nutrition: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_ingredients<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = ingredients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time(mut self, minutes: u32) -> Self {
        self.time_minutes = minutes;
        self
    }

    /// Fill the derived fields: normalized ingredients and deduplicated tags.
    pub(crate) fn prepare(&mut self) {
        self.normalized_ingredients = self.ingredients.iter().map(|i| normalize::normalize(i)).collect();
        let mut seen = std::collections::HashSet::new();
        self.tags.retain(|t| seen.insert(t.clone()));
    }
}

/// A pantry search request. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct PantryQuery {
    pub ingredients: Vec<String>,
    pub max_time: Option<u32>,
    pub diet: Option<String>,
    pub page: usize,
    pub limit: usize,
}

impl PantryQuery {
    pub const DEFAULT_PAGE: usize = 1;
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            max_time: None,
            diet: None,
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn page(mut self, page: usize, limit: usize) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    pub fn max_time(mut self, minutes: u32) -> Self {
        self.max_time = Some(minutes);
        self
    }

    pub fn diet(mut self, diet: impl Into<String>) -> Self {
        self.diet = Some(diet.into());
        self
    }
}

/// Coverage of one recipe by a pantry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecipe {
    pub recipe_id: RecipeId,
    pub coverage: f32,
    pub missing_ingredients: Vec<String>,
}

/// A search hit: the recipe's own fields plus its pantry coverage.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub pantry_coverage: f32,
    pub missing_ingredients: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub recipes: Vec<RankedRecipe>,
    pub total_results: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// One nearest-neighbor hit, highest score first in every result list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub recipe_id: RecipeId,
    pub score: f32,
}
