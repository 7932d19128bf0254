//! Session-scoped meal planning service.
//!
//! A [`MealPlanSession`] owns one user's saved-recipe pool, meal plan grid
//! and grocery list for the lifetime of a login. It is the only way callers
//! mutate that state; every effective mutation is mirrored to the
//! [`PersistenceGateway`] as one full snapshot.
//!
//! # Lifecycle
//!
//! ```text
//! start(user)  -- load snapshot --> active --> end()
//!                  |
//!                  +-- corrupt record: remove it, start empty, record message
//! ```
//!
//! The initial load finishes inside [`MealPlanSession::start`], before the
//! session value exists, so no save can race ahead of it and clobber the
//! stored data with defaults.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::grid::MealPlanGrid;
use crate::grocery::{GroceryAggregator, RunPhase};
use crate::model::{GroceryList, RecipeId, RecipeStub, Slot};
use crate::persistence::{PersistenceError, PersistenceGateway, UserKey, UserSnapshot};
use crate::pool::SavedRecipePool;
use crate::source::RecipeDetailSource;
use crate::transfer::{self, Address, NoOpReason, TransferOutcome};

/// Run-level message shown when aggregation fails outside a single fetch.
pub const AGGREGATION_FAILED_MESSAGE: &str =
    "An unexpected error occurred while generating the grocery list.";

/// Message shown when the stored record could not be read.
pub const LOAD_FAILED_MESSAGE: &str =
    "Your saved meal plan could not be read and has been reset.";

/// What happened to a grocery list run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroceryOutcome {
    /// The run was the latest one; its list is now the session's list.
    Adopted(Arc<GroceryList>),
    /// A newer run (or a plan clear) started before this one finished.
    /// Its result was discarded.
    Superseded,
    /// The run aborted. The session's list was emptied and
    /// [`AGGREGATION_FAILED_MESSAGE`] recorded.
    Failed(String),
}

struct SessionState {
    pool: SavedRecipePool,
    grid: Arc<MealPlanGrid>,
    grocery: Arc<GroceryList>,
    /// Dismissible run-level or persistence message.
    error: Option<String>,
}

impl SessionState {
    fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            saved_recipes: self.pool.clone(),
            meal_plan: (*self.grid).clone(),
            grocery_list: (*self.grocery).clone(),
            saved_at: Some(Utc::now()),
        }
    }
}

/// One user's meal planning state plus its collaborators.
pub struct MealPlanSession {
    user: UserKey,
    gateway: Arc<dyn PersistenceGateway>,
    aggregator: GroceryAggregator,
    state: Mutex<SessionState>,
}

impl MealPlanSession {
    /// Start a session for `user`, loading whatever was stored for them.
    ///
    /// Never fails: an unreadable record is replaced by an empty pool and
    /// grid, and the problem is reported through [`Self::last_error`].
    pub async fn start(
        user: UserKey,
        gateway: Arc<dyn PersistenceGateway>,
        source: Arc<dyn RecipeDetailSource>,
    ) -> Self {
        let (snapshot, load_error) = match gateway.load(&user).await {
            Ok(Some(snapshot)) => (snapshot, None),
            Ok(None) => {
                debug!(user = %user, "no stored data, starting empty");
                (UserSnapshot::default(), None)
            }
            Err(e) => {
                warn!(user = %user, error = %e, "failed to load stored data, starting empty");
                if matches!(e, PersistenceError::Corrupt { .. }) {
                    if let Err(remove_err) = gateway.remove(&user).await {
                        warn!(user = %user, error = %remove_err, "failed to discard corrupt record");
                    }
                }
                (UserSnapshot::default(), Some(LOAD_FAILED_MESSAGE.to_owned()))
            }
        };

        info!(
            user = %user,
            saved = snapshot.saved_recipes.len(),
            planned = snapshot.meal_plan.occupied_count(),
            source = source.name(),
            "meal plan session started"
        );

        Self {
            user,
            gateway,
            aggregator: GroceryAggregator::new(source),
            state: Mutex::new(SessionState {
                pool: snapshot.saved_recipes,
                grid: Arc::new(snapshot.meal_plan),
                grocery: Arc::new(snapshot.grocery_list),
                error: load_error,
            }),
        }
    }

    /// End the session. In-memory state is dropped without a final write;
    /// everything was already persisted as it changed.
    pub fn end(self) {
        info!(user = %self.user, "meal plan session ended");
    }

    pub fn user(&self) -> &UserKey {
        &self.user
    }

    // -----------------------------------------------------------------------
    // Saved-recipe pool
    // -----------------------------------------------------------------------

    /// Save a recipe. Returns `false` if it was already saved or invalid.
    pub async fn add_saved_recipe(&self, recipe: RecipeStub) -> bool {
        let mut state = self.state.lock().await;
        let id = recipe.id.clone();
        if !state.pool.add(recipe) {
            debug!(user = %self.user, recipe_id = %id, "recipe not added to pool");
            return false;
        }
        info!(user = %self.user, recipe_id = %id, "saved recipe");
        self.persist(&mut state).await;
        true
    }

    /// Remove a saved recipe. Grid slots holding a copy keep it.
    pub async fn remove_saved_recipe(&self, id: &RecipeId) -> bool {
        let mut state = self.state.lock().await;
        if !state.pool.remove(id) {
            return false;
        }
        info!(user = %self.user, recipe_id = %id, "removed saved recipe");
        self.persist(&mut state).await;
        true
    }

    pub async fn is_recipe_saved(&self, id: &RecipeId) -> bool {
        self.state.lock().await.pool.contains(id)
    }

    pub async fn saved_recipes(&self) -> SavedRecipePool {
        self.state.lock().await.pool.clone()
    }

    // -----------------------------------------------------------------------
    // Meal plan grid
    // -----------------------------------------------------------------------

    /// The current grid. The returned value never changes; later mutations
    /// install a new grid.
    pub async fn plan(&self) -> Arc<MealPlanGrid> {
        Arc::clone(&self.state.lock().await.grid)
    }

    /// Replace the whole grid. Returns `false` (and writes nothing) if
    /// `grid` equals the current one.
    pub async fn update_plan(&self, grid: MealPlanGrid) -> bool {
        let mut state = self.state.lock().await;
        self.commit_grid(&mut state, grid).await
    }

    /// Apply a drag/drop transfer.
    ///
    /// `Err` carries the reason the grid was left alone. Unresolvable or
    /// no-op transfers are logged at debug level only.
    pub async fn transfer(&self, source: &Address, destination: &Address) -> Result<(), NoOpReason> {
        let mut state = self.state.lock().await;
        let outcome = transfer::resolve(&state.pool, &state.grid, source, destination);
        match outcome {
            TransferOutcome::Commit(next) => {
                debug!(user = %self.user, %source, %destination, "transfer committed");
                if self.commit_grid(&mut state, next).await {
                    Ok(())
                } else {
                    Err(NoOpReason::Unchanged)
                }
            }
            TransferOutcome::NoOp(reason) => {
                debug!(user = %self.user, %source, %destination, %reason, "transfer ignored");
                Err(reason)
            }
        }
    }

    /// Apply a transfer given raw drag identifiers (see [`Address`]).
    pub async fn transfer_ids(&self, source: &str, destination: &str) -> Result<(), NoOpReason> {
        match (source.parse::<Address>(), destination.parse::<Address>()) {
            (Ok(src), Ok(dst)) => self.transfer(&src, &dst).await,
            _ => {
                debug!(user = %self.user, source, destination, "transfer ignored: unresolved address");
                Err(NoOpReason::Unresolved)
            }
        }
    }

    /// Empty one slot. Returns `false` if it was already empty.
    pub async fn remove_from_slot(&self, slot: Slot) -> bool {
        let mut state = self.state.lock().await;
        if state.grid.get(slot).is_none() {
            return false;
        }
        let next = state.grid.with_slot(slot, None);
        self.commit_grid(&mut state, next).await
    }

    /// Reset the grid and the grocery list.
    ///
    /// Also supersedes any grocery run in flight so it cannot bring back a
    /// list for the plan that was just cleared.
    pub async fn clear_plan(&self) {
        let mut state = self.state.lock().await;
        self.aggregator.invalidate();
        if state.grid.is_empty() && state.grocery.is_empty() {
            return;
        }
        state.grid = Arc::new(MealPlanGrid::new());
        state.grocery = Arc::new(GroceryList::default());
        info!(user = %self.user, "meal plan cleared");
        self.persist(&mut state).await;
    }

    async fn commit_grid(&self, state: &mut SessionState, next: MealPlanGrid) -> bool {
        if *state.grid == next {
            return false;
        }
        state.grid = Arc::new(next);
        self.persist(state).await;
        true
    }

    // -----------------------------------------------------------------------
    // Grocery list
    // -----------------------------------------------------------------------

    /// Build a grocery list from the current grid.
    ///
    /// The result is adopted only if no newer run (or plan clear) started
    /// while this one was fetching.
    pub async fn generate_grocery_list(&self) -> GroceryOutcome {
        let (ticket, grid) = {
            let mut state = self.state.lock().await;
            state.error = None;
            (self.aggregator.begin(), Arc::clone(&state.grid))
        };
        debug!(user = %self.user, generation = ticket.generation(), "grocery run started");

        let result = self.aggregator.run(&grid, ticket).await;

        let mut state = self.state.lock().await;
        if !self.aggregator.is_current(ticket) {
            debug!(
                user = %self.user,
                generation = ticket.generation(),
                latest = self.aggregator.current_generation(),
                "discarding superseded grocery run"
            );
            return GroceryOutcome::Superseded;
        }

        match result {
            Ok(list) => {
                let list = Arc::new(list);
                if *state.grocery != *list {
                    state.grocery = Arc::clone(&list);
                    self.persist(&mut state).await;
                }
                GroceryOutcome::Adopted(list)
            }
            Err(e) => {
                error!(user = %self.user, error = %e, "grocery list generation failed");
                state.error = Some(AGGREGATION_FAILED_MESSAGE.to_owned());
                if !state.grocery.is_empty() {
                    state.grocery = Arc::new(GroceryList::default());
                    self.persist(&mut state).await;
                }
                GroceryOutcome::Failed(AGGREGATION_FAILED_MESSAGE.to_owned())
            }
        }
    }

    pub async fn grocery_list(&self) -> Arc<GroceryList> {
        Arc::clone(&self.state.lock().await.grocery)
    }

    /// Planned slots whose recipe does not appear anywhere in the current
    /// grocery list, in canonical order. Non-empty means the list is stale.
    pub async fn missing_from_grocery_list(&self) -> Vec<(Slot, RecipeStub)> {
        let state = self.state.lock().await;
        state
            .grid
            .occupied()
            .filter(|(_, recipe)| !state.grocery.contains_recipe(&recipe.id))
            .map(|(slot, recipe)| (slot, recipe.clone()))
            .collect()
    }

    /// Progress of the latest grocery run. Superseded runs never report.
    pub fn phase(&self) -> RunPhase {
        self.aggregator.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<RunPhase> {
        self.aggregator.subscribe()
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// The pending dismissible message, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }

    /// Write the full snapshot. Failures are logged and surfaced as the
    /// dismissible message; in-memory state is kept either way.
    async fn persist(&self, state: &mut SessionState) {
        let snapshot = state.snapshot();
        match self.gateway.save(&self.user, &snapshot).await {
            Ok(()) => debug!(user = %self.user, "snapshot saved"),
            Err(e) => {
                error!(user = %self.user, error = %e, "failed to save snapshot");
                state.error = Some(format!("Failed to save your data: {e}"));
            }
        }
    }
}

impl std::fmt::Debug for MealPlanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealPlanSession")
            .field("user", &self.user)
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}
