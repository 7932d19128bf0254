//! CLI handlers for `mealplan grocery` subcommands.

use anyhow::{Result, bail};

use mealplan_core::{GroceryList, GroceryOutcome, MealPlanSession, RecipeStub, Slot};

use crate::GroceryCommands;

pub async fn run_grocery_command(command: GroceryCommands, session: &MealPlanSession) -> Result<()> {
    match command {
        GroceryCommands::Generate => match session.generate_grocery_list().await {
            GroceryOutcome::Adopted(list) => {
                print!("{}", render_list(&*list, &[]));
                Ok(())
            }
            GroceryOutcome::Superseded => {
                println!("Grocery list generation was superseded by a newer run.");
                Ok(())
            }
            GroceryOutcome::Failed(message) => bail!(message),
        },
        GroceryCommands::Show => {
            let list = session.grocery_list().await;
            let missing = session.missing_from_grocery_list().await;
            print!("{}", render_list(&*list, &missing));
            Ok(())
        }
    }
}

/// Render a grocery list. Failed entries show their error inline.
/// `missing` lists planned recipes the list does not cover yet.
pub fn render_list(list: &GroceryList, missing: &[(Slot, RecipeStub)]) -> String {
    let mut out = String::new();
    if list.is_empty() {
        out.push_str("Grocery list is empty. Run `mealplan grocery generate`.\n");
    }
    for entry in list {
        out.push_str(&format!(
            "{} {}: {} ({})\n",
            entry.day, entry.meal, entry.recipe.title, entry.recipe.id
        ));
        if let Some(error) = &entry.fetch_error {
            out.push_str(&format!("  ! {error}\n"));
            continue;
        }
        for ingredient in &entry.ingredients {
            out.push_str(&format!("  - {}\n", ingredient.original));
        }
    }
    if !missing.is_empty() {
        out.push_str("\nNot in the grocery list yet:\n");
        for (slot, recipe) in missing {
            out.push_str(&format!("  {slot}: {} ({})\n", recipe.title, recipe.id));
        }
    }
    out
}
