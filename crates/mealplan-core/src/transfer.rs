//! Drag/drop transfer resolution between the saved-recipe pool and the
//! weekly grid.
//!
//! The resolver is a pure function over addresses and container state. It
//! knows nothing about pointer events or any UI drag library; a front end
//! only has to turn its drag identifiers into [`Address`] values.
//!
//! ```text
//! pool      -> pool       no-op
//! pool      -> slot(d,m)  copy stub into slot, discarding the old occupant
//! slot(d,m) -> pool       clear slot
//! slot(a)   -> slot(b)    swap occupants
//! ```

use std::fmt;
use std::str::FromStr;

use crate::grid::MealPlanGrid;
use crate::model::{RecipeId, Slot};
use crate::pool::SavedRecipePool;

/// One end of a drag/drop gesture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// The saved-recipe pool. As a drag source it names the dragged item;
    /// as a destination the item is irrelevant.
    Pool { recipe: Option<RecipeId> },
    /// A single grid slot.
    Slot(Slot),
}

impl Address {
    /// The pool container, without naming an item.
    pub fn pool() -> Self {
        Self::Pool { recipe: None }
    }

    /// A pool item being dragged.
    pub fn pool_item(id: impl Into<RecipeId>) -> Self {
        Self::Pool {
            recipe: Some(id.into()),
        }
    }

    pub fn slot(slot: Slot) -> Self {
        Self::Slot(slot)
    }

    pub fn is_pool(&self) -> bool {
        matches!(self, Self::Pool { .. })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool { recipe: None } => f.write_str("pool"),
            Self::Pool { recipe: Some(id) } => write!(f, "pool:{id}"),
            Self::Slot(slot) => write!(f, "{slot}"),
        }
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Accepts `pool`, `pool:<recipe-id>`, `<day>.<meal>` and `<day>-<meal>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "pool" {
            return Ok(Self::pool());
        }
        if let Some(id) = s.strip_prefix("pool:") {
            if id.trim().is_empty() {
                return Err(AddressParseError(s.to_owned()));
            }
            return Ok(Self::pool_item(id));
        }
        s.parse::<Slot>()
            .map(Self::Slot)
            .map_err(|_| AddressParseError(s.to_owned()))
    }
}

/// Error returned when a drag identifier does not name any container.
#[derive(Debug, Clone)]
pub struct AddressParseError(pub String);

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolvable address: {:?}", self.0)
    }
}

impl std::error::Error for AddressParseError {}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Why a transfer left the state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Source or destination does not resolve to a container.
    Unresolved,
    /// Source and destination are the same container.
    SameAddress,
    /// Pool to pool: the pool has no ordering semantics.
    PoolToPool,
    /// The source slot is empty.
    NothingDragged,
    /// The transfer would produce the current grid.
    Unchanged,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unresolved => "unresolved",
            Self::SameAddress => "same_address",
            Self::PoolToPool => "pool_to_pool",
            Self::NothingDragged => "nothing_dragged",
            Self::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Result of resolving a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The replacement grid to commit atomically. The pool never changes.
    Commit(MealPlanGrid),
    /// Nothing to commit.
    NoOp(NoOpReason),
}

impl TransferOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp(_))
    }
}

/// Resolve a drag from `source` to `destination` against the current state.
///
/// Never fails: addresses that cannot be resolved produce
/// [`NoOpReason::Unresolved`], which callers treat as a benign timing
/// artifact of the UI rather than an error.
pub fn resolve(
    pool: &SavedRecipePool,
    grid: &MealPlanGrid,
    source: &Address,
    destination: &Address,
) -> TransferOutcome {
    if source == destination {
        return TransferOutcome::NoOp(NoOpReason::SameAddress);
    }

    let next = match (source, destination) {
        (Address::Pool { .. }, Address::Pool { .. }) => {
            return TransferOutcome::NoOp(NoOpReason::PoolToPool);
        }
        (Address::Pool { recipe }, Address::Slot(to)) => {
            let Some(stub) = recipe.as_ref().and_then(|id| pool.get(id)) else {
                return TransferOutcome::NoOp(NoOpReason::Unresolved);
            };
            grid.with_slot(*to, Some(stub.clone()))
        }
        (Address::Slot(from), Address::Pool { .. }) => {
            if grid.get(*from).is_none() {
                return TransferOutcome::NoOp(NoOpReason::NothingDragged);
            }
            grid.with_slot(*from, None)
        }
        (Address::Slot(from), Address::Slot(to)) => {
            if grid.get(*from).is_none() {
                return TransferOutcome::NoOp(NoOpReason::NothingDragged);
            }
            grid.swapped(*from, *to)
        }
    };

    if &next == grid {
        TransferOutcome::NoOp(NoOpReason::Unchanged)
    } else {
        TransferOutcome::Commit(next)
    }
}

/// Resolve a transfer given raw drag identifiers.
///
/// Identifiers that do not parse resolve to [`NoOpReason::Unresolved`].
pub fn resolve_ids(
    pool: &SavedRecipePool,
    grid: &MealPlanGrid,
    source: &str,
    destination: &str,
) -> TransferOutcome {
    match (source.parse::<Address>(), destination.parse::<Address>()) {
        (Ok(src), Ok(dst)) => resolve(pool, grid, &src, &dst),
        _ => TransferOutcome::NoOp(NoOpReason::Unresolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, MealTime, RecipeStub};

    const MON_B: Slot = Slot::new(Day::Monday, MealTime::Breakfast);
    const TUE_L: Slot = Slot::new(Day::Tuesday, MealTime::Lunch);

    fn fixture() -> (SavedRecipePool, MealPlanGrid) {
        let mut pool = SavedRecipePool::new();
        pool.add(RecipeStub::new("1", "Omelette"));
        pool.add(RecipeStub::new("2", "Curry"));
        (pool, MealPlanGrid::new())
    }

    #[test]
    fn address_parsing() {
        assert_eq!("pool".parse::<Address>().unwrap(), Address::pool());
        assert_eq!(
            "pool:52772".parse::<Address>().unwrap(),
            Address::pool_item("52772")
        );
        assert_eq!(
            "monday-breakfast".parse::<Address>().unwrap(),
            Address::Slot(MON_B)
        );
        assert!("pool:".parse::<Address>().is_err());
        assert!("sidebar".parse::<Address>().is_err());
    }

    #[test]
    fn address_display_parses_back() {
        for addr in [Address::pool(), Address::pool_item("9"), Address::Slot(TUE_L)] {
            assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
        }
    }

    #[test]
    fn pool_to_slot_copies_stub() {
        let (pool, grid) = fixture();
        let outcome = resolve(&pool, &grid, &Address::pool_item("1"), &Address::Slot(MON_B));
        let TransferOutcome::Commit(next) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(next.get(MON_B), pool.get(&"1".into()));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn pool_to_slot_overwrites_occupant() {
        let (pool, grid) = fixture();
        let grid = grid.with_slot(MON_B, Some(RecipeStub::new("2", "Curry")));
        let TransferOutcome::Commit(next) =
            resolve(&pool, &grid, &Address::pool_item("1"), &Address::Slot(MON_B))
        else {
            panic!("expected commit");
        };
        assert_eq!(next.get(MON_B).unwrap().id.as_str(), "1");
        assert_eq!(next.occupied_count(), 1);
    }

    #[test]
    fn pool_source_must_be_member() {
        let (pool, grid) = fixture();
        let outcome = resolve(&pool, &grid, &Address::pool_item("99"), &Address::Slot(MON_B));
        assert_eq!(outcome, TransferOutcome::NoOp(NoOpReason::Unresolved));
        let outcome = resolve(&pool, &grid, &Address::pool(), &Address::Slot(MON_B));
        assert_eq!(outcome, TransferOutcome::NoOp(NoOpReason::Unresolved));
    }

    #[test]
    fn slot_to_pool_clears_slot() {
        let (pool, grid) = fixture();
        let grid = grid.with_slot(TUE_L, Some(RecipeStub::new("1", "Omelette")));
        let TransferOutcome::Commit(next) =
            resolve(&pool, &grid, &Address::Slot(TUE_L), &Address::pool_item("2"))
        else {
            panic!("expected commit");
        };
        assert!(next.get(TUE_L).is_none());
        assert!(next.is_empty());
    }

    #[test]
    fn slot_to_slot_swaps_both_occupants() {
        let (pool, grid) = fixture();
        let a = RecipeStub::new("1", "Omelette");
        let b = RecipeStub::new("2", "Curry");
        let grid = grid
            .with_slot(MON_B, Some(a.clone()))
            .with_slot(TUE_L, Some(b.clone()));
        let TransferOutcome::Commit(next) =
            resolve(&pool, &grid, &Address::Slot(MON_B), &Address::Slot(TUE_L))
        else {
            panic!("expected commit");
        };
        assert_eq!(next.get(MON_B), Some(&b));
        assert_eq!(next.get(TUE_L), Some(&a));
    }

    #[test]
    fn slot_to_empty_slot_moves() {
        let (pool, grid) = fixture();
        let grid = grid.with_slot(MON_B, Some(RecipeStub::new("1", "Omelette")));
        let TransferOutcome::Commit(next) =
            resolve(&pool, &grid, &Address::Slot(MON_B), &Address::Slot(TUE_L))
        else {
            panic!("expected commit");
        };
        assert!(next.get(MON_B).is_none());
        assert_eq!(next.get(TUE_L).unwrap().id.as_str(), "1");
    }

    #[test]
    fn noop_cases() {
        let (pool, grid) = fixture();
        let grid = grid.with_slot(MON_B, Some(RecipeStub::new("1", "Omelette")));

        let same = resolve(&pool, &grid, &Address::Slot(MON_B), &Address::Slot(MON_B));
        assert_eq!(same, TransferOutcome::NoOp(NoOpReason::SameAddress));

        let p2p = resolve(&pool, &grid, &Address::pool_item("1"), &Address::pool());
        assert_eq!(p2p, TransferOutcome::NoOp(NoOpReason::PoolToPool));

        let empty = resolve(&pool, &grid, &Address::Slot(TUE_L), &Address::Slot(MON_B));
        assert_eq!(empty, TransferOutcome::NoOp(NoOpReason::NothingDragged));

        let same_recipe = resolve(&pool, &grid, &Address::pool_item("1"), &Address::Slot(MON_B));
        assert_eq!(same_recipe, TransferOutcome::NoOp(NoOpReason::Unchanged));
    }

    #[test]
    fn swapping_identical_recipes_is_unchanged() {
        let (pool, grid) = fixture();
        let stub = RecipeStub::new("1", "Omelette");
        let grid = grid
            .with_slot(MON_B, Some(stub.clone()))
            .with_slot(TUE_L, Some(stub));
        let outcome = resolve(&pool, &grid, &Address::Slot(MON_B), &Address::Slot(TUE_L));
        assert_eq!(outcome, TransferOutcome::NoOp(NoOpReason::Unchanged));
    }

    #[test]
    fn unparseable_ids_are_unresolved() {
        let (pool, grid) = fixture();
        let outcome = resolve_ids(&pool, &grid, "sidebar-1", "monday.breakfast");
        assert_eq!(outcome, TransferOutcome::NoOp(NoOpReason::Unresolved));
        let outcome = resolve_ids(&pool, &grid, "pool:1", "monday.brunch");
        assert_eq!(outcome, TransferOutcome::NoOp(NoOpReason::Unresolved));
        assert!(!resolve_ids(&pool, &grid, "pool:1", "monday.breakfast").is_noop());
    }
}
