mod loader;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pantry_core::{EngineConfig, PantryEngine, PantryQuery, RecipeId, Recommender};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pantry")]
#[command(about = "Match recipes to a pantry and train/query the recipe similarity model", long_about = None)]
struct Cli {
    /// JSON engine config; flags below override it
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the vector model on a recipe corpus and save it
    Train {
        /// Input path (JSON/JSONL file or directory)
        #[arg(long)]
        input: String,
        /// Output model directory
        #[arg(long)]
        output: String,
        /// Vocabulary size cap
        #[arg(long)]
        max_features: Option<usize>,
        /// Use smoothed IDF = ln((1 + N) / (1 + df)) + 1
        #[arg(long)]
        smoothed_idf: Option<bool>,
        /// Build the postings accelerator above this many recipes
        #[arg(long)]
        accelerate_above: Option<usize>,
    },
    /// Rank recipes by pantry coverage
    Search {
        #[arg(long)]
        input: String,
        /// Comma-separated pantry ingredients
        #[arg(long, value_delimiter = ',')]
        ingredients: Vec<String>,
        #[arg(long)]
        max_time: Option<u32>,
        #[arg(long)]
        diet: Option<String>,
        #[arg(long, default_value_t = PantryQuery::DEFAULT_PAGE)]
        page: usize,
        #[arg(long, default_value_t = PantryQuery::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Print one recipe by id
    Recipe {
        #[arg(long)]
        input: String,
        #[arg(long)]
        id: RecipeId,
    },
    /// Recommend recipes for a pantry from a saved model
    Recommend {
        #[arg(long)]
        model: String,
        /// Corpus used to attach recipe details to the hits
        #[arg(long)]
        input: Option<String>,
        #[arg(long, value_delimiter = ',')]
        ingredients: Vec<String>,
        #[arg(short, long, default_value_t = 10)]
        n: usize,
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<RecipeId>,
        #[arg(long, default_value_t = 0.0)]
        min_score: f32,
    },
    /// Recipes most similar to a given recipe, from a saved model
    Similar {
        #[arg(long)]
        model: String,
        #[arg(long)]
        id: RecipeId,
        #[arg(short, long, default_value_t = 5)]
        n: usize,
    },
    /// Saved model statistics
    Stats {
        #[arg(long)]
        model: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Train { input, output, max_features, smoothed_idf, accelerate_above } => {
            if let Some(v) = max_features { config.vectorizer.max_features = v; }
            if let Some(v) = smoothed_idf { config.vectorizer.smooth_idf = v; }
            if let Some(v) = accelerate_above { config.index.accelerate_above = v; }
            train(&input, &output, config)
        }
        Commands::Search { input, ingredients, max_time, diet, page, limit } => {
            let engine = engine_with(&input, config)?;
            let query = PantryQuery { ingredients, max_time, diet, page, limit };
            print_json(&engine.search(&query)?)
        }
        Commands::Recipe { input, id } => {
            let engine = engine_with(&input, config)?;
            print_json(&engine.recipe(id)?)
        }
        Commands::Recommend { model, input, ingredients, n, exclude, min_score } => {
            let engine = PantryEngine::new(config);
            engine.load_model(&model).with_context(|| format!("loading model from {model}"))?;
            match input {
                Some(input) => {
                    engine.load_recipes(loader::load_recipes(&input)?)?;
                    let hits: Vec<RecommendedRecipe> = engine
                        .recommend_recipes(&ingredients, n, &exclude, min_score)?
                        .into_iter()
                        .map(|(recipe, score)| RecommendedRecipe { id: recipe.id, name: recipe.name, score })
                        .collect();
                    print_json(&hits)
                }
                None => print_json(&engine.recommend(&ingredients, n, &exclude, min_score)?),
            }
        }
        Commands::Similar { model, id, n } => {
            let recommender = Recommender::new(config);
            recommender.load(&model).with_context(|| format!("loading model from {model}"))?;
            print_json(&recommender.similar_to(id, n)?)
        }
        Commands::Stats { model } => {
            let recommender = Recommender::open(&model, config);
            print_json(&recommender.stats())
        }
    }
}

#[derive(Serialize)]
struct RecommendedRecipe {
    id: RecipeId,
    name: String,
    score: f32,
}

fn engine_with(input: &str, config: EngineConfig) -> Result<PantryEngine> {
    let engine = PantryEngine::new(config);
    engine.load_recipes(loader::load_recipes(input)?)?;
    Ok(engine)
}

fn train(input: &str, output: &str, config: EngineConfig) -> Result<()> {
    let engine = engine_with(input, config)?;
    if !engine.train()? {
        anyhow::bail!("no recipes found in {input}, nothing to train");
    }
    engine.save_model(output)?;
    let stats = engine.model_stats();
    tracing::info!(output, num_recipes = stats.num_recipes, num_features = stats.num_features, "training complete");
    print_json(&stats)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
