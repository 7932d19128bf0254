//! CLI handlers for `mealplan plan` subcommands.
//!
//! Implements:
//! - `mealplan plan show`              -- print the weekly grid
//! - `mealplan plan move <from> <to>`  -- drag/drop transfer between pool and grid
//! - `mealplan plan unset <day.meal>`  -- empty one slot
//! - `mealplan plan clear`             -- reset grid and grocery list

use anyhow::{Context, Result};

use mealplan_core::{Day, MealPlanGrid, MealPlanSession, MealTime, Slot};

use crate::PlanCommands;

pub async fn run_plan_command(command: PlanCommands, session: &MealPlanSession) -> Result<()> {
    match command {
        PlanCommands::Show => {
            let grid = session.plan().await;
            print!("{}", render_grid(&*grid));
            Ok(())
        }
        PlanCommands::Move { from, to } => cmd_move(session, &from, &to).await,
        PlanCommands::Unset { slot } => {
            let slot: Slot = slot.parse().context("cannot unset slot")?;
            if session.remove_from_slot(slot).await {
                println!("Cleared {slot}.");
            } else {
                println!("{slot} is already empty.");
            }
            Ok(())
        }
        PlanCommands::Clear => {
            session.clear_plan().await;
            println!("Meal plan cleared.");
            Ok(())
        }
    }
}

/// Run a transfer. Transfers that resolve to nothing are reported, not
/// treated as errors.
async fn cmd_move(session: &MealPlanSession, from: &str, to: &str) -> Result<()> {
    match session.transfer_ids(from, to).await {
        Ok(()) => println!("Moved {from} -> {to}."),
        Err(reason) => println!("Nothing moved ({reason})."),
    }
    Ok(())
}

/// Render the grid as one line per day.
pub fn render_grid(grid: &MealPlanGrid) -> String {
    let mut out = String::new();
    for day in Day::ALL {
        let cells: Vec<String> = MealTime::ALL
            .into_iter()
            .map(|meal| {
                let cell = grid
                    .get(Slot::new(day, meal))
                    .map(|r| format!("{} ({})", r.title, r.id))
                    .unwrap_or_else(|| "-".to_owned());
                format!("{meal}: {cell}")
            })
            .collect();
        out.push_str(&format!("{:<9}  {}\n", day.to_string(), cells.join(" | ")));
    }
    out
}
