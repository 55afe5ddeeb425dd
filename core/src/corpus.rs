use crate::error::{Error, Result};
use crate::index::IngredientIndex;
use crate::{Recipe, RecipeId};
use std::collections::{BTreeSet, HashMap};

/// An immutable generation of the recipe collection and its ingredient index.
/// Replaced wholesale on reload, never mutated.
#[derive(Debug, Default)]
pub struct Corpus {
    generation: u64,
    recipes: Vec<Recipe>,
    by_id: HashMap<RecipeId, usize>,
    index: IngredientIndex,
}

impl Corpus {
    /// Prepares every recipe (normalized ingredients, tags) and indexes them.
    /// Recipe ids must be unique.
    pub fn new(mut recipes: Vec<Recipe>, generation: u64) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(recipes.len());
        for (pos, recipe) in recipes.iter_mut().enumerate() {
            if by_id.insert(recipe.id, pos).is_some() {
                return Err(Error::DuplicateRecipe(recipe.id));
            }
            recipe.prepare();
        }
        let index = IngredientIndex::build(&recipes, generation);
        tracing::info!(
            generation,
            num_recipes = recipes.len(),
            num_ingredients = index.num_ingredients(),
            "corpus loaded"
        );
        Ok(Self { generation, recipes, by_id, index })
    }

    pub fn generation(&self) -> u64 { self.generation }
    pub fn len(&self) -> usize { self.recipes.len() }
    pub fn is_empty(&self) -> bool { self.recipes.is_empty() }
    pub fn recipes(&self) -> &[Recipe] { &self.recipes }

    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.by_id.get(&id).map(|&pos| &self.recipes[pos])
    }

    pub fn recipe(&self, id: RecipeId) -> Result<&Recipe> {
        self.get(id).ok_or(Error::NotFound(id))
    }

    pub fn ingredient_index(&self) -> Result<&IngredientIndex> {
        self.index.ensure_generation(self.generation)?;
        Ok(&self.index)
    }

    /// Positions of recipes that could score above zero for `pantry`
    /// (normalized), plus every recipe with no ingredients.
    pub fn candidates(&self, pantry: &[String]) -> Result<BTreeSet<usize>> {
        let mut out = self.ingredient_index()?.candidates(pantry);
        out.extend(
            self.recipes
                .iter()
                .enumerate()
                .filter(|(_, r)| r.normalized_ingredients.is_empty())
                .map(|(pos, _)| pos),
        );
        Ok(out)
    }
}
