//! Meal planning core: the weekly grid, the saved-recipe pool, drag/drop
//! transfer resolution, and grocery list aggregation.
//!
//! # Architecture
//!
//! ```text
//! UI / CLI
//!     |
//!     v
//! MealPlanSession --transfer()--> transfer::resolve(pool, grid, src, dst)
//!     |                                   |
//!     |                                   v
//!     |                          new MealPlanGrid (atomic swap)
//!     |
//!     +--generate_grocery_list()--> GroceryAggregator --> RecipeDetailSource
//!     |
//!     +--every change--> PersistenceGateway::save(UserSnapshot)
//! ```

pub mod grid;
pub mod grocery;
pub mod mealdb;
pub mod model;
pub mod persistence;
pub mod pool;
pub mod session;
pub mod source;
pub mod transfer;

pub use grid::MealPlanGrid;
pub use grocery::{AggregationError, GenerationCounter, GroceryAggregator, RunPhase, RunTicket};
pub use mealdb::MealDbCatalog;
pub use model::{
    Day, GroceryEntry, GroceryList, GroceryRecipe, Ingredient, MealTime, RecipeId, RecipeStub,
    Slot,
};
pub use persistence::{PersistenceError, PersistenceGateway, UserKey, UserSnapshot};
pub use pool::SavedRecipePool;
pub use session::{GroceryOutcome, MealPlanSession};
pub use source::{DetailError, RecipeDetailSource, RecipeDetails};
pub use transfer::{Address, NoOpReason, TransferOutcome};
