use anyhow::{Context, Result};
use pantry_core::{Recipe, RecipeId};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Food.com order for array-form nutrition.
const NUTRIENTS: [&str; 7] = ["calories", "fat", "sugar", "sodium", "protein", "saturated_fat", "carbs"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NutritionInput {
    Named(BTreeMap<String, f64>),
    Ordered(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct InputRecipe {
    id: Option<RecipeId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default, alias = "minutes")]
    time_minutes: u32,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    nutrition: Option<NutritionInput>,
    #[serde(default)]
    steps: Vec<String>,
}

impl InputRecipe {
    fn into_recipe(self, id: RecipeId) -> Recipe {
        let nutrition = match self.nutrition {
            Some(NutritionInput::Named(map)) => map,
            Some(NutritionInput::Ordered(values)) => {
                NUTRIENTS.iter().zip(values).map(|(name, v)| (name.to_string(), v)).collect()
            }
            None => BTreeMap::new(),
        };
        let mut recipe = Recipe::new(id, self.name.unwrap_or_else(|| Recipe::UNNAMED.into()))
            .with_ingredients(self.ingredients)
            .with_tags(self.tags)
            .with_time(self.time_minutes);
        recipe.nutrition = nutrition;
        recipe.steps = self.steps;
        recipe
    }
}

/// Load recipes from a `.json` / `.jsonl` file, or every such file under a directory.
/// Records without an id get their position in the load order, or the next
/// higher id when that one is already claimed by another record.
pub fn load_recipes(input: &str) -> Result<Vec<Recipe>> {
    let input_path = Path::new(input);
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input {input} does not exist");
    }

    let mut raw = Vec::new();
    for file in &files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(file, &mut raw)?;
        } else {
            read_json(file, &mut raw)?;
        }
    }
    let mut taken: HashSet<RecipeId> = raw.iter().filter_map(|r| r.id).collect();
    let recipes: Vec<Recipe> = raw
        .into_iter()
        .enumerate()
        .map(|(pos, r)| {
            let id = r.id.unwrap_or_else(|| {
                let mut id = pos as RecipeId;
                while !taken.insert(id) {
                    id += 1;
                }
                id
            });
            r.into_recipe(id)
        })
        .collect();
    tracing::info!(files = files.len(), recipes = recipes.len(), "loaded recipes");
    Ok(recipes)
}

fn read_jsonl(file: &Path, out: &mut Vec<InputRecipe>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let recipe = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        out.push(recipe);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<InputRecipe>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| file.display().to_string())?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v).with_context(|| file.display().to_string())?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping non-recipe json"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_json_and_jsonl_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"[{"id": 7, "name": "Soup", "ingredients": ["water"], "minutes": 20,
                 "nutrition": [100.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.jsonl"),
            "{\"ingredients\": [\"bread\"], \"nutrition\": {\"calories\": 80.0}}\n\n{\"id\": 9}\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let recipes = load_recipes(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0].id, 7);
        assert_eq!(recipes[0].time_minutes, 20);
        assert_eq!(recipes[0].nutrition["protein"], 5.0);
        assert_eq!(recipes[1].id, 1);
        assert_eq!(recipes[1].name, Recipe::UNNAMED);
        assert_eq!(recipes[1].nutrition["calories"], 80.0);
        assert_eq!(recipes[2].id, 9);
    }

    #[test]
    fn missing_ids_skip_claimed_ones() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("r.jsonl");
        fs::write(&file, "{\"id\": 1}\n{\"name\": \"A\"}\n{\"id\": 2}\n{}\n").unwrap();

        let recipes = load_recipes(file.to_str().unwrap()).unwrap();
        let ids: Vec<RecipeId> = recipes.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2, 4]);
        assert!(pantry_core::Corpus::new(recipes, 1).is_ok());
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(load_recipes("/definitely/not/here.json").is_err());
    }
}
