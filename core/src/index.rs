use crate::coverage::ingredients_match;
use crate::error::{Error, Result};
use crate::Recipe;
use std::collections::{BTreeSet, HashMap};

/// Normalized ingredient -> positions of the recipes that list it.
///
/// Built in one pass over a corpus and tagged with that corpus' generation so
/// it can never be consulted against a newer one.
#[derive(Debug, Default)]
pub struct IngredientIndex {
    postings: HashMap<String, BTreeSet<usize>>,
    generation: u64,
    num_recipes: usize,
    mentions: usize,
}

impl IngredientIndex {
    /// Recipes must already carry their normalized ingredients.
    pub fn build(recipes: &[Recipe], generation: u64) -> Self {
        let mut postings: HashMap<String, BTreeSet<usize>> = HashMap::new();
        let mut mentions = 0;
        for (pos, recipe) in recipes.iter().enumerate() {
            for ingredient in &recipe.normalized_ingredients {
                postings.entry(ingredient.clone()).or_default().insert(pos);
                mentions += 1;
            }
        }
        Self { postings, generation, num_recipes: recipes.len(), mentions }
    }

    pub fn generation(&self) -> u64 { self.generation }
    pub fn num_recipes(&self) -> usize { self.num_recipes }
    pub fn num_ingredients(&self) -> usize { self.postings.len() }
    pub fn num_mentions(&self) -> usize { self.mentions }

    /// Exact lookup of one normalized ingredient.
    pub fn lookup(&self, normalized: &str) -> Option<&BTreeSet<usize>> {
        self.postings.get(normalized)
    }

    pub fn ensure_generation(&self, expected: u64) -> Result<()> {
        if self.generation == expected {
            Ok(())
        } else {
            Err(Error::StaleIndex { expected, found: self.generation })
        }
    }

    /// Positions of every recipe with at least one ingredient that fuzzy-matches
    /// some pantry item. Recipes outside this set have coverage 0, unless they
    /// list no ingredients at all.
    pub fn candidates(&self, pantry: &[String]) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for (ingredient, positions) in &self.postings {
            if pantry.iter().any(|p| ingredients_match(ingredient, p)) {
                out.extend(positions.iter().copied());
            }
        }
        out
    }
}
