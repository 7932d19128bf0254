//! The `RecipeDetailSource` trait -- the adapter interface for recipe
//! detail lookups.
//!
//! The grocery aggregator only ever talks to this trait. A live HTTP
//! client, an offline catalog ([`crate::mealdb::MealDbCatalog`]) or a test
//! double can sit behind it. The trait is object-safe so it can be held as
//! `Arc<dyn RecipeDetailSource>`.

use async_trait::async_trait;

use crate::model::{Ingredient, RecipeId};

/// Full detail for one recipe, as far as grocery aggregation cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDetails {
    pub ingredients: Vec<Ingredient>,
}

impl RecipeDetails {
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self { ingredients }
    }
}

/// Errors a detail lookup can report.
///
/// The `Display` text is what ends up on a grocery entry's `fetch_error`,
/// so it is written for end users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetailError {
    /// The service answered but has no recipe with that id.
    #[error("Failed to fetch details")]
    NotFound(RecipeId),

    #[error("Request failed with status {0}")]
    Status(u16),

    #[error("Network Error: Could not reach the recipe service.")]
    Network,

    #[error("{0}")]
    Other(String),
}

/// Source of full recipe details, keyed by recipe id.
#[async_trait]
pub trait RecipeDetailSource: Send + Sync {
    /// Human-readable name for logs (e.g. "themealdb-catalog").
    fn name(&self) -> &str;

    /// Fetch the ingredient list for `id`.
    async fn fetch_details(&self, id: &RecipeId) -> Result<RecipeDetails, DetailError>;
}

// Compile-time assertion: RecipeDetailSource must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn RecipeDetailSource) {}
};
