//! Grocery list aggregation.
//!
//! Turns a meal plan grid into a [`GroceryList`](crate::model::GroceryList):
//! one entry per occupied slot, in canonical (day, meal) order, with the
//! ingredients fetched from a [`RecipeDetailSource`](crate::source::RecipeDetailSource).
//!
//! # Run lifecycle
//!
//! ```text
//! idle -> flattening -> fetching(0) -> ... -> fetching(n-1) -> assembled
//!                            |
//!                            +-- per-entry fetch error (run continues)
//! ```
//!
//! A failed fetch only marks its own entry. A failure outside the fetch
//! loop ends the run in `failed` with an [`AggregationError`].
//!
//! Runs are not cancelled. A newer run supersedes an older one through the
//! [`GenerationCounter`]: whoever adopts the result checks that its
//! [`RunTicket`] is still current.

pub mod engine;
pub mod generation;

pub use engine::{AggregationError, GroceryAggregator, RunPhase, generate};
pub use generation::{GenerationCounter, RunTicket};
