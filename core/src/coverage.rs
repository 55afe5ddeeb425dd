/// Symmetric substring containment. Deliberately permissive: "egg" matches
/// "eggplant", and "" matches everything.
#[inline]
pub fn ingredients_match(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Fraction of `recipe` covered by `pantry`, plus the uncovered ingredients in
/// recipe order. Both sides are expected to be normalized already.
///
/// A recipe with no ingredients is fully covered.
pub fn score<P, R>(pantry: &[P], recipe: &[R]) -> (f32, Vec<String>)
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    if recipe.is_empty() {
        return (1.0, Vec::new());
    }
    let mut matched = 0usize;
    let mut missing = Vec::new();
    for ingredient in recipe {
        let ingredient = ingredient.as_ref();
        if pantry.iter().any(|p| ingredients_match(ingredient, p.as_ref())) {
            matched += 1;
        } else {
            missing.push(ingredient.to_string());
        }
    }
    (matched as f32 / recipe.len() as f32, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn empty_recipe_is_fully_covered() {
        assert_eq!(score(&NONE, &NONE), (1.0, vec![]));
        assert_eq!(score(&["salt"], &NONE), (1.0, vec![]));
    }

    #[test]
    fn partial_coverage_lists_missing_in_order() {
        let (cov, missing) = score(&["tomato", "garlic"], &["tomato", "pasta", "garlic", "basil"]);
        assert_eq!(cov, 0.5);
        assert_eq!(missing, vec!["pasta", "basil"]);
    }

    #[test]
    fn containment_is_symmetric() {
        assert_eq!(score(&["egg"], &["eggplant"]).0, 1.0);
        assert_eq!(score(&["eggplant"], &["egg"]).0, 1.0);
        assert_eq!(score(&["rice"], &["pasta"]).0, 0.0);
    }

    #[test]
    fn each_ingredient_counted_once() {
        let (cov, _) = score(&["oil", "olive oil", "oil"], &["olive oil"]);
        assert_eq!(cov, 1.0);
    }
}
