//! Grocery list generation through the session: ordering, fetch
//! deduplication, partial failures, run-level failures and supersession.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use mealplan_core::session::AGGREGATION_FAILED_MESSAGE;
use mealplan_core::{
    Day, DetailError, GroceryOutcome, MealPlanGrid, MealPlanSession, MealTime, RecipeDetailSource,
    RecipeDetails, RecipeId, RunPhase, Slot, UserKey, grocery,
};
use mealplan_store::MemoryStore;
use mealplan_test_utils::{ScriptedSource, grid_with, recipe};

const MON_BREAKFAST: Slot = Slot::new(Day::Monday, MealTime::Breakfast);
const TUE_LUNCH: Slot = Slot::new(Day::Tuesday, MealTime::Lunch);
const WED_DINNER: Slot = Slot::new(Day::Wednesday, MealTime::Dinner);

async fn session_with(source: Arc<dyn RecipeDetailSource>) -> (MealPlanSession, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session =
        MealPlanSession::start(UserKey::new("alice").unwrap(), store.clone(), source).await;
    (session, store)
}

fn adopted(outcome: GroceryOutcome) -> Arc<mealplan_core::GroceryList> {
    match outcome {
        GroceryOutcome::Adopted(list) => list,
        other => panic!("expected adopted list, got {other:?}"),
    }
}

/// Panics on every lookup.
struct ExplodingSource;

#[async_trait]
impl RecipeDetailSource for ExplodingSource {
    fn name(&self) -> &str {
        "exploding"
    }

    async fn fetch_details(&self, _id: &RecipeId) -> Result<RecipeDetails, DetailError> {
        panic!("detail source blew up");
    }
}

// ===========================================================================
// Aggregation
// ===========================================================================

#[tokio::test]
async fn end_to_end_with_shared_and_failing_recipes() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_ingredients("1", &["2 eggs"])
            .with_error("2", DetailError::Status(500)),
    );
    let (session, store) = session_with(source.clone()).await;
    session
        .update_plan(grid_with(&[
            (MON_BREAKFAST, recipe("1", "Omelette")),
            (TUE_LUNCH, recipe("1", "Omelette")),
            (WED_DINNER, recipe("2", "Curry")),
        ]))
        .await;

    let list = adopted(session.generate_grocery_list().await);
    assert_eq!(source.calls().len(), 2);
    assert_eq!(source.call_count("1"), 1);

    let entries = list.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].slot(), MON_BREAKFAST);
    assert_eq!(entries[1].slot(), TUE_LUNCH);
    assert_eq!(entries[2].slot(), WED_DINNER);

    assert_eq!(entries[0].ingredients[0].original, "2 eggs");
    assert_eq!(entries[1].ingredients, entries[0].ingredients);
    assert!(entries[0].fetch_error.is_none());

    assert!(entries[2].ingredients.is_empty());
    assert_eq!(
        entries[2].fetch_error.as_deref(),
        Some("Request failed with status 500")
    );
    assert_eq!(entries[2].recipe.title, "Curry");

    assert_eq!(*session.grocery_list().await, *list);
    assert!(session.missing_from_grocery_list().await.is_empty());
    assert_eq!(session.phase(), RunPhase::Assembled);
    let stored = store.get_raw(&UserKey::new("alice").unwrap()).await.unwrap();
    assert!(stored.contains("Request failed with status 500"));
}

#[tokio::test]
async fn entries_follow_canonical_slot_order() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_ingredients("a", &["1 onion"])
            .with_ingredients("b", &["salt"]),
    );
    let (session, _store) = session_with(source.clone()).await;
    let sunday_breakfast = Slot::new(Day::Sunday, MealTime::Breakfast);
    let monday_dinner = Slot::new(Day::Monday, MealTime::Dinner);
    session
        .update_plan(grid_with(&[
            (sunday_breakfast, recipe("a", "Pancakes")),
            (monday_dinner, recipe("b", "Broth")),
        ]))
        .await;

    let list = adopted(session.generate_grocery_list().await);
    let slots: Vec<Slot> = list.iter().map(|e| e.slot()).collect();
    assert_eq!(slots, vec![monday_dinner, sunday_breakfast]);
    assert_eq!(
        source.calls(),
        vec![RecipeId::new("b"), RecipeId::new("a")]
    );
    assert_eq!(list.entries()[0].ingredients[0].measure, "");
    assert_eq!(list.entries()[0].ingredients[0].name, "salt");
}

#[tokio::test]
async fn empty_plan_makes_no_calls() {
    let source = Arc::new(ScriptedSource::new());
    let (session, _store) = session_with(source.clone()).await;

    let list = adopted(session.generate_grocery_list().await);
    assert!(list.is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn generation_is_deterministic() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_ingredients("1", &["2 eggs", "1 cup milk"])
            .with_error("2", DetailError::Network),
    );
    let (session, store) = session_with(source.clone()).await;
    session
        .update_plan(grid_with(&[
            (MON_BREAKFAST, recipe("1", "Omelette")),
            (WED_DINNER, recipe("2", "Curry")),
        ]))
        .await;

    let first = adopted(session.generate_grocery_list().await);
    let saves = store.save_count();
    let second = adopted(session.generate_grocery_list().await);

    assert_eq!(*first, *second);
    // Identical result is not written again.
    assert_eq!(store.save_count(), saves);
}

#[tokio::test]
async fn stale_list_reports_missing_recipes() {
    let source = Arc::new(ScriptedSource::new().with_ingredients("1", &["2 eggs"]));
    let (session, _store) = session_with(source).await;
    session
        .update_plan(grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]))
        .await;
    session.generate_grocery_list().await;

    session
        .update_plan(grid_with(&[
            (MON_BREAKFAST, recipe("1", "Omelette")),
            (TUE_LUNCH, recipe("9", "Tacos")),
        ]))
        .await;

    let missing = session.missing_from_grocery_list().await;
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].0, TUE_LUNCH);
    assert_eq!(missing[0].1.title, "Tacos");
}

// ===========================================================================
// Run-level failure
// ===========================================================================

#[tokio::test]
async fn source_panic_fails_whole_run() {
    let (session, _store) = session_with(Arc::new(ExplodingSource)).await;
    session
        .update_plan(grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]))
        .await;

    let outcome = session.generate_grocery_list().await;
    assert_eq!(
        outcome,
        GroceryOutcome::Failed(AGGREGATION_FAILED_MESSAGE.to_owned())
    );
    assert!(session.grocery_list().await.is_empty());
    assert_eq!(
        session.last_error().await.as_deref(),
        Some(AGGREGATION_FAILED_MESSAGE)
    );
    assert_eq!(session.phase(), RunPhase::Failed);
}

#[tokio::test]
async fn free_function_reports_panic_as_error() {
    let grid = grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]);
    let err = grocery::generate(&grid, &ExplodingSource).await.unwrap_err();
    assert!(err.to_string().contains("detail source blew up"), "{err}");

    let ok = grocery::generate(&MealPlanGrid::new(), &ExplodingSource)
        .await
        .unwrap();
    assert!(ok.is_empty());
}

// ===========================================================================
// Supersession
// ===========================================================================

/// Poll until the gated fetch of `id` has started.
async fn wait_for_call(source: &ScriptedSource, id: &str) {
    while source.call_count(id) == 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn newer_run_wins_over_slower_older_run() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_ingredients("1", &["2 eggs"])
            .with_ingredients("2", &["1 lime"])
            .gate("1"),
    );
    let (session, _store) = session_with(source.clone()).await;
    session
        .update_plan(grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]))
        .await;

    let (older, newer) = tokio::join!(session.generate_grocery_list(), async {
        wait_for_call(&source, "1").await;
        session
            .update_plan(grid_with(&[(MON_BREAKFAST, recipe("2", "Ceviche"))]))
            .await;
        let outcome = session.generate_grocery_list().await;
        source.release(1);
        outcome
    });

    assert_eq!(older, GroceryOutcome::Superseded);
    let list = adopted(newer);
    assert_eq!(list.entries()[0].recipe.id.as_str(), "2");
    assert_eq!(*session.grocery_list().await, *list);
}

#[tokio::test]
async fn clear_plan_supersedes_in_flight_run() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_ingredients("1", &["2 eggs"])
            .gate("1"),
    );
    let (session, _store) = session_with(source.clone()).await;
    session
        .update_plan(grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]))
        .await;

    let (outcome, ()) = tokio::join!(session.generate_grocery_list(), async {
        wait_for_call(&source, "1").await;
        session.clear_plan().await;
        source.release(1);
    });

    assert_eq!(outcome, GroceryOutcome::Superseded);
    assert!(session.grocery_list().await.is_empty());
    assert!(session.plan().await.is_empty());
}

#[tokio::test]
async fn superseded_run_leaves_newer_run_phase_alone() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_ingredients("1", &["2 eggs"])
            .with_ingredients("2", &["1 lime"])
            .gate("1")
            .gate("2"),
    );
    let (session, _store) = session_with(source.clone()).await;
    session
        .update_plan(grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]))
        .await;
    let older_done = Notify::new();

    let (older, newer, phase_after_older) = tokio::join!(
        async {
            let outcome = session.generate_grocery_list().await;
            older_done.notify_one();
            outcome
        },
        async {
            wait_for_call(&source, "1").await;
            session
                .update_plan(grid_with(&[(MON_BREAKFAST, recipe("2", "Ceviche"))]))
                .await;
            session.generate_grocery_list().await
        },
        async {
            wait_for_call(&source, "2").await;
            // The older run queued on the gate first, so it takes this permit.
            source.release(1);
            older_done.notified().await;
            let phase = session.phase();
            source.release(1);
            phase
        }
    );

    assert_eq!(older, GroceryOutcome::Superseded);
    assert_eq!(phase_after_older, RunPhase::Fetching { index: 0, total: 1 });
    assert!(phase_after_older.is_running());
    assert_eq!(adopted(newer).entries()[0].recipe.id.as_str(), "2");
    assert_eq!(session.phase(), RunPhase::Assembled);
}

#[tokio::test]
async fn clear_plan_resets_phase() {
    let source = Arc::new(ScriptedSource::new().with_ingredients("1", &["2 eggs"]).gate("1"));
    let (session, _store) = session_with(source.clone()).await;
    session
        .update_plan(grid_with(&[(MON_BREAKFAST, recipe("1", "Omelette"))]))
        .await;

    let (outcome, phase_after_clear) = tokio::join!(session.generate_grocery_list(), async {
        wait_for_call(&source, "1").await;
        session.clear_plan().await;
        let phase = session.phase();
        source.release(1);
        phase
    });

    assert_eq!(outcome, GroceryOutcome::Superseded);
    assert_eq!(phase_after_clear, RunPhase::Idle);
    assert_eq!(session.phase(), RunPhase::Idle);
}
