use crate::corpus::Corpus;
use crate::coverage;
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::{PantryQuery, RankedRecipe, Recipe, SearchPage};

/// Filter point for the `diet` query parameter.
pub trait DietPolicy: Send + Sync {
    fn allows(&self, recipe: &Recipe, diet: &str) -> bool;
}

/// No diet taxonomy: every recipe passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl DietPolicy for AcceptAll {
    fn allows(&self, _recipe: &Recipe, _diet: &str) -> bool { true }
}

pub fn validate(query: &PantryQuery) -> Result<()> {
    if query.page < 1 {
        return Err(Error::InvalidQuery(format!("page must be >= 1, got {}", query.page)));
    }
    if query.limit < 1 {
        return Err(Error::InvalidQuery(format!("limit must be >= 1, got {}", query.limit)));
    }
    if matches!(&query.diet, Some(d) if d.trim().is_empty()) {
        return Err(Error::InvalidQuery("diet must not be blank".into()));
    }
    Ok(())
}

/// Rank every recipe in `corpus` by pantry coverage and return one page.
///
/// Sorting is stable, so equal coverage keeps corpus order.
pub fn search(corpus: &Corpus, query: &PantryQuery, diet_policy: &dyn DietPolicy) -> Result<SearchPage> {
    validate(query)?;
    let pantry: Vec<String> = query.ingredients.iter().map(|i| normalize(i)).collect();

    let mut scored: Vec<(usize, f32, Vec<String>)> = Vec::new();
    for (pos, recipe) in corpus.recipes().iter().enumerate() {
        if matches!(query.max_time, Some(max) if recipe.time_minutes > max) {
            continue;
        }
        if let Some(diet) = &query.diet {
            if !diet_policy.allows(recipe, diet) {
                continue;
            }
        }
        let (cov, missing) = coverage::score(&pantry, &recipe.normalized_ingredients);
        scored.push((pos, cov, missing));
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total_results = scored.len();
    let total_pages = total_results.div_ceil(query.limit);
    let start = (query.page - 1).saturating_mul(query.limit).min(total_results);
    let end = start.saturating_add(query.limit).min(total_results);
    tracing::debug!(pantry = pantry.len(), total_results, page = query.page, "pantry search");

    let recipes = scored
        .drain(start..end)
        .map(|(pos, cov, missing)| RankedRecipe {
            recipe: corpus.recipes()[pos].clone(),
            pantry_coverage: cov,
            missing_ingredients: missing,
        })
        .collect();
    Ok(SearchPage { recipes, total_results, page: query.page, total_pages })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnlyTagged;
    impl DietPolicy for OnlyTagged {
        fn allows(&self, recipe: &Recipe, diet: &str) -> bool { recipe.tags.iter().any(|t| t == diet) }
    }

    fn corpus() -> Corpus {
        Corpus::new(
            vec![
                Recipe::new(1, "slow").with_ingredients(["rice"]).with_time(90).with_tags(["vegan"]),
                Recipe::new(2, "fast").with_ingredients(["rice", "fish"]).with_time(15),
            ],
            0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_pagination() {
        let c = corpus();
        assert!(matches!(search(&c, &PantryQuery::new(["rice"]).page(0, 5), &AcceptAll), Err(Error::InvalidQuery(_))));
        assert!(matches!(search(&c, &PantryQuery::new(["rice"]).page(1, 0), &AcceptAll), Err(Error::InvalidQuery(_))));
        assert!(matches!(search(&c, &PantryQuery::new(["rice"]).diet("  "), &AcceptAll), Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn default_query_is_first_page() {
        let q = PantryQuery::new(["rice"]);
        assert_eq!((q.page, q.limit), (PantryQuery::DEFAULT_PAGE, PantryQuery::DEFAULT_LIMIT));
        let page = search(&corpus(), &q, &AcceptAll).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.recipes.len(), 2);
    }

    #[test]
    fn max_time_filters() {
        let page = search(&corpus(), &PantryQuery::new(["rice"]).max_time(30), &AcceptAll).unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.recipes[0].recipe.id, 2);
        assert_eq!(page.recipes[0].missing_ingredients, vec!["fish"]);
    }

    #[test]
    fn diet_goes_through_policy() {
        let q = PantryQuery::new(["rice"]).diet("vegan");
        assert_eq!(search(&corpus(), &q, &AcceptAll).unwrap().total_results, 2);
        let page = search(&corpus(), &q, &OnlyTagged).unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.recipes[0].recipe.id, 1);
    }

    #[test]
    fn empty_corpus_has_no_pages() {
        let page = search(&Corpus::default(), &PantryQuery::new(["rice"]), &AcceptAll).unwrap();
        assert_eq!(page.total_results, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.recipes.is_empty());
    }

    #[test]
    fn page_past_end_is_empty() {
        let page = search(&corpus(), &PantryQuery::new(["rice"]).page(5, 1), &AcceptAll).unwrap();
        assert!(page.recipes.is_empty());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 5);
    }
}
