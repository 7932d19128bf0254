//! The weekly meal plan grid: 7 days x 3 meals, each slot holding at most
//! one [`RecipeStub`].
//!
//! The grid is a plain value. Callers never edit a live grid in place;
//! they build a replacement with [`MealPlanGrid::with_slot`] or
//! [`MealPlanGrid::swapped`] and swap the whole value in, so a reader
//! sees either the old grid or the new one and nothing in between.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Day, MealTime, RecipeStub, Slot};

/// Nested `day -> meal -> stub|null` form used for serialization.
type GridRepr = BTreeMap<Day, BTreeMap<MealTime, Option<RecipeStub>>>;

/// Fixed-shape mapping of every [`Slot`] to an optional recipe.
///
/// All 21 slots always exist; an unassigned slot is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GridRepr", into = "GridRepr")]
pub struct MealPlanGrid {
    slots: [[Option<RecipeStub>; 3]; 7],
}

impl MealPlanGrid {
    /// A grid with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&RecipeStub> {
        self.slots[slot.day.index()][slot.meal.index()].as_ref()
    }

    /// Replace the occupant of `slot`, returning the previous one.
    pub fn set(&mut self, slot: Slot, recipe: Option<RecipeStub>) -> Option<RecipeStub> {
        std::mem::replace(&mut self.slots[slot.day.index()][slot.meal.index()], recipe)
    }

    /// Reset every slot to empty.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// A copy of this grid with `slot` set to `recipe`.
    pub fn with_slot(&self, slot: Slot, recipe: Option<RecipeStub>) -> Self {
        let mut next = self.clone();
        next.set(slot, recipe);
        next
    }

    /// A copy of this grid with the occupants of `a` and `b` exchanged.
    pub fn swapped(&self, a: Slot, b: Slot) -> Self {
        let mut next = self.clone();
        let from_a = next.set(a, None);
        let from_b = next.set(b, from_a);
        next.set(a, from_b);
        next
    }

    /// Occupied slots in canonical (day, meal) order.
    pub fn occupied(&self) -> impl Iterator<Item = (Slot, &RecipeStub)> {
        Slot::all().filter_map(move |slot| self.get(slot).map(|recipe| (slot, recipe)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().flatten().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().flatten().all(Option::is_none)
    }
}

impl From<GridRepr> for MealPlanGrid {
    /// Days or meals missing from the nested map become empty slots.
    fn from(repr: GridRepr) -> Self {
        let mut grid = Self::default();
        for (day, meals) in repr {
            for (meal, recipe) in meals {
                grid.set(Slot::new(day, meal), recipe);
            }
        }
        grid
    }
}

impl From<MealPlanGrid> for GridRepr {
    fn from(grid: MealPlanGrid) -> Self {
        let mut repr = GridRepr::new();
        for (day_idx, meals) in grid.slots.into_iter().enumerate() {
            let day = Day::ALL[day_idx];
            let row = repr.entry(day).or_default();
            for (meal_idx, recipe) in meals.into_iter().enumerate() {
                row.insert(MealTime::ALL[meal_idx], recipe);
            }
        }
        repr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(id: &str) -> RecipeStub {
        RecipeStub::new(id, format!("Recipe {id}"))
    }

    #[test]
    fn new_grid_has_all_21_slots_empty() {
        let grid = MealPlanGrid::new();
        assert_eq!(Slot::all().count(), 21);
        for slot in Slot::all() {
            assert!(grid.get(slot).is_none(), "{slot} should be empty");
        }
        assert!(grid.is_empty());
    }

    #[test]
    fn set_returns_previous_occupant() {
        let mut grid = MealPlanGrid::new();
        let slot = Slot::new(Day::Friday, MealTime::Lunch);
        assert!(grid.set(slot, Some(stub("1"))).is_none());
        let old = grid.set(slot, Some(stub("2")));
        assert_eq!(old.unwrap().id.as_str(), "1");
        assert_eq!(grid.get(slot).unwrap().id.as_str(), "2");
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn with_slot_leaves_original_untouched() {
        let grid = MealPlanGrid::new();
        let slot = Slot::new(Day::Monday, MealTime::Breakfast);
        let next = grid.with_slot(slot, Some(stub("1")));
        assert!(grid.get(slot).is_none());
        assert_eq!(next.get(slot), Some(&stub("1")));
    }

    #[test]
    fn swapped_exchanges_occupants() {
        let a = Slot::new(Day::Monday, MealTime::Breakfast);
        let b = Slot::new(Day::Sunday, MealTime::Dinner);
        let grid = MealPlanGrid::new()
            .with_slot(a, Some(stub("a")))
            .with_slot(b, Some(stub("b")));

        let next = grid.swapped(a, b);
        assert_eq!(next.get(a), Some(&stub("b")));
        assert_eq!(next.get(b), Some(&stub("a")));
        assert_eq!(next.occupied_count(), 2);
    }

    #[test]
    fn clear_all_empties_grid() {
        let mut grid = MealPlanGrid::new()
            .with_slot(Slot::new(Day::Tuesday, MealTime::Dinner), Some(stub("1")));
        grid.clear_all();
        assert_eq!(grid, MealPlanGrid::new());
    }

    #[test]
    fn occupied_iterates_in_canonical_order() {
        let late = Slot::new(Day::Sunday, MealTime::Dinner);
        let early = Slot::new(Day::Monday, MealTime::Breakfast);
        let grid = MealPlanGrid::new()
            .with_slot(late, Some(stub("late")))
            .with_slot(early, Some(stub("early")));
        let order: Vec<Slot> = grid.occupied().map(|(slot, _)| slot).collect();
        assert_eq!(order, vec![early, late]);
    }

    #[test]
    fn serializes_as_nested_map() {
        let grid = MealPlanGrid::new()
            .with_slot(Slot::new(Day::Monday, MealTime::Lunch), Some(stub("7")));
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["monday"]["lunch"]["id"], "7");
        assert!(json["sunday"]["dinner"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 7);
    }

    #[test]
    fn partial_map_fills_missing_slots() {
        let json = r#"{ "wednesday": { "dinner": { "id": 3, "title": "Stew" } } }"#;
        let grid: MealPlanGrid = serde_json::from_str(json).unwrap();
        let slot = Slot::new(Day::Wednesday, MealTime::Dinner);
        assert_eq!(grid.get(slot).unwrap().title, "Stew");
        assert_eq!(grid.occupied_count(), 1);
    }
}
