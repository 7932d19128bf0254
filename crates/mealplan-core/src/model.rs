//! Shared value types: recipe identity, the day/meal axes of the weekly
//! grid, and the grocery list produced from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Recipe identity
// ---------------------------------------------------------------------------

/// Identifier of a recipe.
///
/// Upstream recipe services hand out ids either as strings (`"52772"`) or
/// as bare integers. Both are normalized to the same string form here so
/// that `52772` and `"52772"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RecipeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<u64> for RecipeId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecipeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self::new(s),
            RawId::Unsigned(n) => Self(n.to_string()),
            RawId::Signed(n) => Self(n.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Grid axes
// ---------------------------------------------------------------------------

/// Day of the week. Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Position in the canonical order (monday = 0).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        };
        f.write_str(s)
    }
}

impl FromStr for Day {
    type Err = DayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            _ => Err(DayParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Day`] string.
#[derive(Debug, Clone)]
pub struct DayParseError(pub String);

impl fmt::Display for DayParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day: {:?}", self.0)
    }
}

impl std::error::Error for DayParseError {}

// ---------------------------------------------------------------------------

/// Meal within a day. Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealTime {
    pub const ALL: [MealTime; 3] = [MealTime::Breakfast, MealTime::Lunch, MealTime::Dinner];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        };
        f.write_str(s)
    }
}

impl FromStr for MealTime {
    type Err = MealTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => Err(MealTimeParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`MealTime`] string.
#[derive(Debug, Clone)]
pub struct MealTimeParseError(pub String);

impl fmt::Display for MealTimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid meal time: {:?}", self.0)
    }
}

impl std::error::Error for MealTimeParseError {}

// ---------------------------------------------------------------------------

/// One (day, meal) address in the weekly grid.
///
/// Ordering is canonical: all of monday before tuesday, and within a day
/// breakfast, lunch, dinner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub day: Day,
    pub meal: MealTime,
}

impl Slot {
    pub const fn new(day: Day, meal: MealTime) -> Self {
        Self { day, meal }
    }

    /// All 21 slots in canonical order.
    pub fn all() -> impl Iterator<Item = Slot> {
        Day::ALL
            .into_iter()
            .flat_map(|day| MealTime::ALL.into_iter().map(move |meal| Slot { day, meal }))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.day, self.meal)
    }
}

impl FromStr for Slot {
    type Err = SlotParseError;

    /// Accepts `monday.dinner` and the drag-identifier form `monday-dinner`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, meal) = s
            .split_once(['.', '-'])
            .ok_or_else(|| SlotParseError(s.to_owned()))?;
        let day = day.parse::<Day>().map_err(|_| SlotParseError(s.to_owned()))?;
        let meal = meal
            .parse::<MealTime>()
            .map_err(|_| SlotParseError(s.to_owned()))?;
        Ok(Self { day, meal })
    }
}

/// Error returned when parsing an invalid [`Slot`] string.
#[derive(Debug, Clone)]
pub struct SlotParseError(pub String);

impl fmt::Display for SlotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid slot {:?} (expected <day>.<meal>)", self.0)
    }
}

impl std::error::Error for SlotParseError {}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// Minimal recipe identity carried by the pool and the grid.
///
/// Stubs are copied by value into grid slots; two stubs are the same
/// recipe when their ids match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStub {
    pub id: RecipeId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl RecipeStub {
    pub fn new(id: impl Into<RecipeId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// A stub is usable when both its id and title are non-blank.
    pub fn is_valid(&self) -> bool {
        !self.id.as_str().is_empty() && !self.title.trim().is_empty()
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    /// Display form, e.g. `"2 eggs"`.
    pub original: String,
    pub name: String,
    pub measure: String,
}

impl Ingredient {
    pub fn new(id: impl Into<String>, measure: &str, name: &str) -> Self {
        let measure = measure.trim();
        let name = name.trim();
        Self {
            id: id.into(),
            original: format!("{measure} {name}").trim().to_owned(),
            name: name.to_owned(),
            measure: measure.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grocery list
// ---------------------------------------------------------------------------

/// The recipe reference kept on a grocery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryRecipe {
    pub id: RecipeId,
    pub title: String,
}

impl From<&RecipeStub> for GroceryRecipe {
    fn from(stub: &RecipeStub) -> Self {
        Self {
            id: stub.id.clone(),
            title: stub.title.clone(),
        }
    }
}

/// Ingredients needed for one occupied grid slot.
///
/// When the recipe's details could not be fetched, `ingredients` is empty
/// and `fetch_error` carries a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryEntry {
    pub day: Day,
    pub meal: MealTime,
    pub recipe: GroceryRecipe,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, alias = "fetchError", skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl GroceryEntry {
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.meal)
    }
}

/// Grocery entries in canonical (day, meal) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroceryList {
    entries: Vec<GroceryEntry>,
}

impl GroceryList {
    pub fn new(entries: Vec<GroceryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GroceryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroceryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose details could not be fetched.
    pub fn failed_entries(&self) -> impl Iterator<Item = &GroceryEntry> {
        self.entries.iter().filter(|e| e.fetch_error.is_some())
    }

    pub fn contains_recipe(&self, id: &RecipeId) -> bool {
        self.entries.iter().any(|e| &e.recipe.id == id)
    }

    /// Distinct recipe ids, in order of first appearance.
    pub fn recipe_ids(&self) -> Vec<&RecipeId> {
        let mut ids: Vec<&RecipeId> = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&&entry.recipe.id) {
                ids.push(&entry.recipe.id);
            }
        }
        ids
    }
}

impl<'a> IntoIterator for &'a GroceryList {
    type Item = &'a GroceryEntry;
    type IntoIter = std::slice::Iter<'a, GroceryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
