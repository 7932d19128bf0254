//! CLI handlers for `mealplan recipe` subcommands.

use anyhow::{Context, Result, bail};

use mealplan_core::{MealDbCatalog, MealPlanSession, RecipeId, RecipeStub, SavedRecipePool};

use crate::RecipeCommands;

pub async fn run_recipe_command(
    command: RecipeCommands,
    session: &MealPlanSession,
    catalog: &MealDbCatalog,
) -> Result<()> {
    match command {
        RecipeCommands::Save { id, title, image } => {
            let mut stub = RecipeStub::new(id, title);
            if let Some(image) = image {
                stub = stub.with_image(image);
            }
            cmd_save(session, stub).await
        }
        RecipeCommands::Remove { id } => {
            let id = RecipeId::new(id);
            if session.remove_saved_recipe(&id).await {
                println!("Removed recipe {id}.");
            } else {
                println!("Recipe {id} is not saved.");
            }
            Ok(())
        }
        RecipeCommands::List => {
            print!("{}", render_pool(&session.saved_recipes().await));
            Ok(())
        }
        RecipeCommands::Import { id } => {
            let id = RecipeId::new(id);
            let stub = catalog
                .stub(&id)
                .cloned()
                .with_context(|| format!("recipe {id} not found in catalog"))?;
            cmd_save(session, stub).await
        }
    }
}

async fn cmd_save(session: &MealPlanSession, stub: RecipeStub) -> Result<()> {
    if !stub.is_valid() {
        bail!("recipe id and title must not be empty");
    }
    let (id, title) = (stub.id.clone(), stub.title.clone());
    if session.add_saved_recipe(stub).await {
        println!("Saved recipe {id}: {title}");
    } else {
        println!("Recipe {id} is already saved.");
    }
    Ok(())
}

pub fn render_pool(pool: &SavedRecipePool) -> String {
    if pool.is_empty() {
        return "No saved recipes.\n".to_owned();
    }
    let width = pool.iter().map(|r| r.id.as_str().len()).max().unwrap_or(0);
    let mut out = String::new();
    for recipe in pool {
        out.push_str(&format!("{:<width$}  {}\n", recipe.id.as_str(), recipe.title));
    }
    out
}
