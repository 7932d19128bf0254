//! The user's saved-recipe pool.

use serde::{Deserialize, Serialize};

use crate::model::{RecipeId, RecipeStub};

/// Ordered collection of saved recipes, unique by id.
///
/// The pool is independent of the grid: removing a recipe here does not
/// touch grid slots that already hold a copy of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RecipeStub>", into = "Vec<RecipeStub>")]
pub struct SavedRecipePool {
    recipes: Vec<RecipeStub>,
}

impl SavedRecipePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `recipe` unless a recipe with the same id is already saved.
    ///
    /// Stubs without a usable id or title are ignored. Returns `true` when
    /// the pool changed.
    pub fn add(&mut self, recipe: RecipeStub) -> bool {
        if !recipe.is_valid() || self.contains(&recipe.id) {
            return false;
        }
        self.recipes.push(recipe);
        true
    }

    /// Remove the recipe with `id`. Returns `true` when the pool changed.
    pub fn remove(&mut self, id: &RecipeId) -> bool {
        let before = self.recipes.len();
        self.recipes.retain(|r| &r.id != id);
        self.recipes.len() != before
    }

    pub fn contains(&self, id: &RecipeId) -> bool {
        self.recipes.iter().any(|r| &r.id == id)
    }

    pub fn get(&self, id: &RecipeId) -> Option<&RecipeStub> {
        self.recipes.iter().find(|r| &r.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecipeStub> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl From<Vec<RecipeStub>> for SavedRecipePool {
    /// Keeps the first occurrence of each id.
    fn from(recipes: Vec<RecipeStub>) -> Self {
        let mut pool = Self::new();
        for recipe in recipes {
            pool.add(recipe);
        }
        pool
    }
}

impl From<SavedRecipePool> for Vec<RecipeStub> {
    fn from(pool: SavedRecipePool) -> Self {
        pool.recipes
    }
}

impl<'a> IntoIterator for &'a SavedRecipePool {
    type Item = &'a RecipeStub;
    type IntoIter = std::slice::Iter<'a, RecipeStub>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipes.iter()
    }
}
