//! Shared fixtures for mealplan integration tests.
//!
//! [`ScriptedSource`] is an in-memory [`RecipeDetailSource`] whose answers
//! are set up per recipe id. It records every fetch so tests can assert on
//! call counts, and individual ids can be gated so a fetch blocks until the
//! test releases it.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use mealplan_core::{
    Day, DetailError, Ingredient, MealPlanGrid, MealTime, RecipeDetailSource, RecipeDetails,
    RecipeId, RecipeStub, Slot,
};

/// A minimal valid stub.
pub fn recipe(id: &str, title: &str) -> RecipeStub {
    RecipeStub::new(id, title)
}

pub fn slot(day: Day, meal: MealTime) -> Slot {
    Slot::new(day, meal)
}

/// Build a grid from `(slot, stub)` placements.
pub fn grid_with(placements: &[(Slot, RecipeStub)]) -> MealPlanGrid {
    let mut grid = MealPlanGrid::new();
    for (slot, recipe) in placements {
        grid.set(*slot, Some(recipe.clone()));
    }
    grid
}

/// Split `"2 eggs"` into measure `"2"` and name `"eggs"`. A line without a
/// space is all name.
fn ingredient_line(recipe: &RecipeId, n: usize, line: &str) -> Ingredient {
    let line = line.trim();
    let (measure, name) = line.split_once(' ').unwrap_or(("", line));
    Ingredient::new(format!("{recipe}-ing-{n}"), measure, name)
}

// ---------------------------------------------------------------------------
// Scripted detail source
// ---------------------------------------------------------------------------

pub struct ScriptedSource {
    answers: HashMap<RecipeId, Result<RecipeDetails, DetailError>>,
    gated: HashSet<RecipeId>,
    gate: Semaphore,
    calls: Mutex<Vec<RecipeId>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            gated: HashSet::new(),
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `id` with the given ingredient lines.
    pub fn with_ingredients(mut self, id: &str, lines: &[&str]) -> Self {
        let id = RecipeId::new(id);
        let ingredients = lines
            .iter()
            .enumerate()
            .map(|(i, line)| ingredient_line(&id, i + 1, line))
            .collect();
        self.answers.insert(id, Ok(RecipeDetails::new(ingredients)));
        self
    }

    /// Fail every fetch of `id` with `error`.
    pub fn with_error(mut self, id: &str, error: DetailError) -> Self {
        self.answers.insert(RecipeId::new(id), Err(error));
        self
    }

    /// Make fetches of `id` wait for [`release`](Self::release).
    pub fn gate(mut self, id: &str) -> Self {
        self.gated.insert(RecipeId::new(id));
        self
    }

    /// Let `n` gated fetches proceed.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Every fetched id, in call order.
    pub fn calls(&self) -> Vec<RecipeId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, id: &str) -> usize {
        let id = RecipeId::new(id);
        self.calls.lock().unwrap().iter().filter(|c| **c == id).count()
    }
}

#[async_trait]
impl RecipeDetailSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_details(&self, id: &RecipeId) -> Result<RecipeDetails, DetailError> {
        self.calls.lock().unwrap().push(id.clone());
        if self.gated.contains(id) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| DetailError::Other(e.to_string()))?;
            permit.forget();
        }
        self.answers
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(DetailError::NotFound(id.clone())))
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}
