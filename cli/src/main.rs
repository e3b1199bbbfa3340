mod telemetry;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tadka_core::{
    create_provider, enrich_all, load_recipes, save_recipes, EnrichConfig, Enricher, Recipe,
    RecipeCache,
};

/// Name of the file holding every enriched recipe of a run.
const FINAL_OUTPUT_FILE: &str = "enriched_recipes_final.json";

#[derive(Parser)]
#[command(name = "tadka")]
#[command(about = "Enrich scraped recipes with LLM-generated metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich every recipe in the input file, writing batch and final output files
    Enrich {
        /// Input JSON file (default: TADKA_INPUT_FILE or recipes.json)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output directory (default: TADKA_OUTPUT_DIR or enriched_recipes)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Recipes per batch file (default: TADKA_BATCH_SIZE or 10)
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Enrich a few random recipes and print them before and after
    Sample {
        /// Number of recipes to sample
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
        count: u8,
        /// Input JSON file (default: TADKA_INPUT_FILE or recipes.json)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Remove every cached enrichment
    ClearCache,
    /// Show how many enrichments are cached
    CacheStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = EnrichConfig::from_env().context("Invalid configuration")?;
    telemetry::init(config.log_file.as_deref())?;

    match cli.command {
        Commands::Enrich {
            input,
            output_dir,
            batch_size,
        } => {
            let input = input.unwrap_or_else(|| config.input_file.clone());
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            let batch_size = batch_size.unwrap_or(config.batch_size);
            if batch_size == 0 {
                bail!("--batch-size must be at least 1");
            }
            enrich(&config, &input, &output_dir, batch_size).await?;
        }
        Commands::Sample { count, input } => {
            let input = input.unwrap_or_else(|| config.input_file.clone());
            sample(&config, &input, usize::from(count)).await?;
        }
        Commands::ClearCache => {
            let cache = RecipeCache::new(config.cache_dir.clone());
            if !cache.clear() {
                bail!("Failed to clear cache at {}", cache.dir().display());
            }
            println!("Cleared cache at {}", cache.dir().display());
        }
        Commands::CacheStats => {
            let cache = RecipeCache::new(config.cache_dir.clone());
            let stats = cache.stats();
            println!("Cache directory: {}", cache.dir().display());
            println!("Cached entries:  {}", stats.cached_entries);
        }
    }

    Ok(())
}

fn build_enricher(config: &EnrichConfig) -> Result<Enricher> {
    let provider = create_provider(&config.provider)?;
    Ok(Enricher::new(
        provider,
        RecipeCache::new(config.cache_dir.clone()),
        config.retry.clone(),
    ))
}

fn load(input: &Path) -> Result<Vec<Recipe>> {
    load_recipes(input).with_context(|| format!("Failed to load recipes from {}", input.display()))
}

async fn enrich(
    config: &EnrichConfig,
    input: &Path,
    output_dir: &Path,
    batch_size: usize,
) -> Result<()> {
    let enricher = build_enricher(config)?;
    let recipes = load(input)?;
    let total = recipes.len();

    let mut enriched = Vec::with_capacity(total);
    let mut failed = 0;

    for (index, batch) in recipes.chunks(batch_size).enumerate() {
        tracing::info!(batch = index, recipes = batch.len(), "Processing batch");

        let outcome = enrich_all(&enricher, batch.to_vec()).await;
        failed += outcome.failures.len();

        let batch_file = output_dir.join(format!("enriched_recipes_batch_{}.json", index));
        save_recipes(&batch_file, &outcome.enriched)?;
        enriched.extend(outcome.enriched);
    }

    save_recipes(&output_dir.join(FINAL_OUTPUT_FILE), &enriched)?;

    println!(
        "Enriched {} of {} recipes ({} failed), output in {}",
        enriched.len(),
        total,
        failed,
        output_dir.display()
    );

    Ok(())
}

async fn sample(config: &EnrichConfig, input: &Path, count: usize) -> Result<()> {
    let enricher = build_enricher(config)?;
    let recipes = load(input)?;

    let chosen: Vec<Recipe> = recipes
        .choose_multiple(&mut rand::thread_rng(), count)
        .cloned()
        .collect();

    if chosen.is_empty() {
        bail!("No recipes found in {}", input.display());
    }

    for recipe in chosen {
        println!("{}", "=".repeat(80));
        println!("Recipe: {}", recipe.title);
        println!("\n--- Original ---");
        println!("{}", serde_json::to_string_pretty(&recipe)?);

        let title = recipe.title.clone();
        match enricher.enrich(recipe).await {
            Ok(enriched) => {
                println!("\n--- Enrichment ---");
                println!("{}", serde_json::to_string_pretty(&enriched.enrichment)?);
            }
            Err(e) => println!("\nFailed to enrich {}: {}", title, e),
        }
    }

    Ok(())
}
