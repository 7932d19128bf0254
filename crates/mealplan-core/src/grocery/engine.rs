use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::grid::MealPlanGrid;
use crate::grocery::generation::{GenerationCounter, RunTicket};
use crate::model::{GroceryEntry, GroceryList, RecipeId, RecipeStub, Slot};
use crate::source::{RecipeDetailSource, RecipeDetails};

/// Message used when a source fails without saying why.
const DEFAULT_FETCH_ERROR: &str = "Failed to fetch details";

/// Progress of the most recent aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Flattening,
    /// Resolving entry `index` of `total`.
    Fetching { index: usize, total: usize },
    Assembled,
    Failed,
}

impl RunPhase {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Flattening | Self::Fetching { .. })
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Flattening => f.write_str("flattening"),
            Self::Fetching { index, total } => write!(f, "fetching({}/{})", index + 1, total),
            Self::Assembled => f.write_str("assembled"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// A failure that aborts a whole run.
///
/// Individual fetch failures never produce this; they are recorded on the
/// affected entry instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("unexpected failure during grocery aggregation: {0}")]
    Unexpected(String),
}

/// Per-run memo of fetch results, keyed by recipe id.
type FetchCache = HashMap<RecipeId, Result<Arc<RecipeDetails>, String>>;

/// Grocery aggregation engine bound to one detail source.
///
/// Reports progress through a watch channel so a front end can show a
/// spinner or "3 of 7" without polling the engine. Only the run holding the
/// current [`RunTicket`] may publish; a superseded run finishes silently.
pub struct GroceryAggregator {
    source: Arc<dyn RecipeDetailSource>,
    phase: watch::Sender<RunPhase>,
    generations: GenerationCounter,
}

impl GroceryAggregator {
    pub fn new(source: Arc<dyn RecipeDetailSource>) -> Self {
        let (phase, _) = watch::channel(RunPhase::Idle);
        Self {
            source,
            phase,
            generations: GenerationCounter::new(),
        }
    }

    pub fn source(&self) -> &Arc<dyn RecipeDetailSource> {
        &self.source
    }

    /// The phase of the latest run.
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    /// Issue a ticket for a new run, superseding every earlier one.
    pub fn begin(&self) -> RunTicket {
        self.generations.begin()
    }

    /// Supersede every outstanding run and reset the phase to idle.
    pub fn invalidate(&self) {
        self.generations.invalidate();
        self.phase.send_replace(RunPhase::Idle);
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.generations.is_current(ticket)
    }

    pub fn current_generation(&self) -> u64 {
        self.generations.current()
    }

    /// Start a run and build the grocery list for `grid`.
    pub async fn generate(&self, grid: &MealPlanGrid) -> Result<GroceryList, AggregationError> {
        let ticket = self.begin();
        self.run(grid, ticket).await
    }

    /// Build the grocery list for `grid` under an already issued `ticket`.
    ///
    /// Fetches each distinct recipe id at most once. A panic inside the
    /// detail source is caught and reported as
    /// [`AggregationError::Unexpected`].
    pub async fn run(
        &self,
        grid: &MealPlanGrid,
        ticket: RunTicket,
    ) -> Result<GroceryList, AggregationError> {
        let report = |phase: RunPhase| {
            if self.generations.is_current(ticket) {
                self.phase.send_replace(phase);
            }
        };

        let outcome = AssertUnwindSafe(aggregate(grid, self.source.as_ref(), &report))
            .catch_unwind()
            .await;

        match outcome {
            Ok(list) => Ok(list),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(
                    source = self.source.name(),
                    generation = ticket.generation(),
                    error = %message,
                    "grocery aggregation aborted"
                );
                report(RunPhase::Failed);
                Err(AggregationError::Unexpected(message))
            }
        }
    }
}

impl fmt::Debug for GroceryAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroceryAggregator")
            .field("source", &self.source.name())
            .field("phase", &self.phase())
            .field("generation", &self.current_generation())
            .finish()
    }
}

/// One-shot aggregation without progress reporting.
pub async fn generate(
    grid: &MealPlanGrid,
    source: &dyn RecipeDetailSource,
) -> Result<GroceryList, AggregationError> {
    AssertUnwindSafe(aggregate(grid, source, &|_| {}))
        .catch_unwind()
        .await
        .map_err(|payload| AggregationError::Unexpected(panic_message(payload.as_ref())))
}

async fn aggregate(
    grid: &MealPlanGrid,
    source: &dyn RecipeDetailSource,
    report: &(dyn Fn(RunPhase) + Sync),
) -> GroceryList {
    report(RunPhase::Flattening);
    let planned: Vec<(Slot, &RecipeStub)> = grid.occupied().collect();

    if planned.is_empty() {
        debug!("meal plan is empty, nothing to fetch");
        report(RunPhase::Assembled);
        return GroceryList::default();
    }

    let total = planned.len();
    let mut cache = FetchCache::new();
    let mut entries = Vec::with_capacity(total);

    for (index, (slot, recipe)) in planned.into_iter().enumerate() {
        report(RunPhase::Fetching { index, total });

        let result = if let Some(cached) = cache.get(&recipe.id).cloned() {
            debug!(recipe_id = %recipe.id, %slot, "using cached recipe details");
            cached
        } else {
            debug!(recipe_id = %recipe.id, %slot, source = source.name(), "fetching recipe details");
            let fetched = source
                .fetch_details(&recipe.id)
                .await
                .map(Arc::new)
                .map_err(|e| {
                    let message = e.to_string();
                    if message.trim().is_empty() {
                        DEFAULT_FETCH_ERROR.to_owned()
                    } else {
                        message
                    }
                });
            if let Err(message) = &fetched {
                warn!(recipe_id = %recipe.id, error = %message, "failed to fetch recipe details");
            }
            cache.insert(recipe.id.clone(), fetched.clone());
            fetched
        };

        let (ingredients, fetch_error) = match result {
            Ok(details) => (details.ingredients.clone(), None),
            Err(message) => (Vec::new(), Some(message)),
        };

        entries.push(GroceryEntry {
            day: slot.day,
            meal: slot.meal,
            recipe: recipe.into(),
            ingredients,
            fetch_error,
        });
    }

    let list = GroceryList::new(entries);
    info!(
        entries = list.len(),
        fetched = cache.len(),
        failed = list.failed_entries().count(),
        "grocery list assembled"
    );
    report(RunPhase::Assembled);
    list
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
