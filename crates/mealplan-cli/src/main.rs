mod config;
mod grocery_cmd;
mod plan_cmds;
mod recipe_cmds;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mealplan_core::{MealDbCatalog, MealPlanSession};
use mealplan_store::FileStore;

use config::{CliOverrides, MealplanConfig};

#[derive(Parser)]
#[command(name = "mealplan", about = "Weekly meal planner and grocery list builder")]
struct Cli {
    /// User whose plan to work on (overrides MEALPLAN_USER env var)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Directory holding saved plans (overrides MEALPLAN_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TheMealDB response file used for recipe details (overrides MEALPLAN_CATALOG env var)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file from the global flags
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Saved recipe management
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Weekly meal plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Grocery list built from the meal plan
    Grocery {
        #[command(subcommand)]
        command: GroceryCommands,
    },
}

#[derive(Subcommand)]
pub enum RecipeCommands {
    /// Save a recipe to the pool
    Save {
        /// Recipe ID
        id: String,
        /// Recipe title
        title: String,
        /// Thumbnail URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a recipe from the pool (planned copies stay)
    Remove {
        /// Recipe ID
        id: String,
    },
    /// List saved recipes
    List,
    /// Save a recipe from the catalog by its idMeal
    Import {
        /// Catalog recipe ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show the weekly grid
    Show,
    /// Drag a recipe between the pool and the grid
    ///
    /// Addresses are `pool:<recipe-id>`, `pool` or `<day>.<meal>`.
    Move {
        /// Where the recipe is dragged from
        from: String,
        /// Where it is dropped
        to: String,
    },
    /// Empty one slot
    Unset {
        /// Slot as `<day>.<meal>`, e.g. `monday.dinner`
        slot: String,
    },
    /// Empty the whole grid and the grocery list
    Clear,
}

#[derive(Subcommand)]
pub enum GroceryCommands {
    /// Rebuild the grocery list from the current plan
    Generate,
    /// Show the last grocery list
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = CliOverrides {
        user: cli.user,
        data_dir: cli.data_dir,
        catalog: cli.catalog,
    };

    if let Commands::Init { force } = cli.command {
        return cmd_init(&overrides, force);
    }

    let resolved = MealplanConfig::resolve(&overrides)?;
    tracing::debug!(
        user = %resolved.user,
        data_dir = %resolved.store.data_dir.display(),
        catalog = ?resolved.catalog,
        "resolved configuration"
    );
    let catalog = Arc::new(load_catalog(&resolved).await?);
    let store = Arc::new(FileStore::new(resolved.store.clone()));
    let session = MealPlanSession::start(resolved.user.clone(), store, catalog.clone()).await;

    let result = match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Recipe { command } => {
            recipe_cmds::run_recipe_command(command, &session, &catalog).await
        }
        Commands::Plan { command } => plan_cmds::run_plan_command(command, &session).await,
        Commands::Grocery { command } => grocery_cmd::run_grocery_command(command, &session).await,
    };

    if let Some(message) = session.last_error().await {
        eprintln!("warning: {message}");
    }
    session.end();
    result
}

/// Load the configured catalog, or an empty one when none is configured.
async fn load_catalog(config: &MealplanConfig) -> Result<MealDbCatalog> {
    match &config.catalog {
        Some(path) => MealDbCatalog::load(path)
            .await
            .with_context(|| format!("failed to load recipe catalog {}", path.display())),
        None => Ok(MealDbCatalog::default()),
    }
}

/// Execute the `mealplan init` command: write the config file.
fn cmd_init(overrides: &CliOverrides, force: bool) -> Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(user) = &overrides.user {
        mealplan_core::UserKey::new(user.as_str()).context("invalid user id")?;
    }

    let cfg = config::ConfigFile {
        session: config::SessionSection {
            user: overrides.user.clone(),
        },
        storage: config::StorageSection {
            data_dir: overrides.data_dir.clone(),
        },
        catalog: config::CatalogSection {
            path: overrides.catalog.clone(),
        },
    };
    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    if let Some(user) = &cfg.session.user {
        println!("  session.user = {user}");
    }
    if let Some(dir) = &cfg.storage.data_dir {
        println!("  storage.data_dir = {}", dir.display());
    }
    if let Some(catalog) = &cfg.catalog.path {
        println!("  catalog.path = {}", catalog.display());
    }

    Ok(())
}
