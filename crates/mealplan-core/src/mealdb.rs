//! Normalization of TheMealDB "meal" records.
//!
//! TheMealDB returns loosely typed records with numbered
//! `strIngredientN` / `strMeasureN` columns. This module turns them into
//! [`RecipeStub`] and [`Ingredient`] values at the boundary so nothing
//! downstream ever sees the raw shape.
//!
//! [`MealDbCatalog`] is an offline [`RecipeDetailSource`] backed by a saved
//! `lookup.php` / `search.php` response (`{"meals": [...]}`).

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::model::{Ingredient, RecipeId, RecipeStub};
use crate::source::{DetailError, RecipeDetailSource, RecipeDetails};

/// TheMealDB records carry at most this many ingredient columns.
pub const MAX_INGREDIENTS: usize = 20;

/// Errors loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog document has no \"meals\" array")]
    MissingMeals,
}

fn text_field<'a>(meal: &'a Value, name: &str) -> Option<&'a str> {
    meal.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn meal_id(meal: &Value) -> Option<RecipeId> {
    match meal.get("idMeal")? {
        Value::String(s) if !s.trim().is_empty() => Some(RecipeId::new(s.as_str())),
        Value::Number(n) => Some(RecipeId::new(n.to_string())),
        _ => None,
    }
}

/// Build a stub from a meal record. Returns `None` without an id or name.
pub fn stub_from_meal(meal: &Value) -> Option<RecipeStub> {
    let id = meal_id(meal)?;
    let title = text_field(meal, "strMeal")?;
    let mut stub = RecipeStub::new(id, title);
    stub.image = text_field(meal, "strMealThumb").map(str::to_owned);
    Some(stub)
}

/// Extract the ingredient lines of a meal record.
///
/// Columns are read in order and the walk stops at the first blank
/// ingredient name. Ingredient ids are `<idMeal>-ing-<n>`.
pub fn parse_ingredients(meal: &Value) -> Vec<Ingredient> {
    let id = meal_id(meal).map(|id| id.to_string()).unwrap_or_default();
    let mut ingredients = Vec::new();
    for n in 1..=MAX_INGREDIENTS {
        let Some(name) = text_field(meal, &format!("strIngredient{n}")) else {
            break;
        };
        let measure = text_field(meal, &format!("strMeasure{n}")).unwrap_or("");
        ingredients.push(Ingredient::new(format!("{id}-ing-{n}"), measure, name));
    }
    ingredients
}

/// Offline detail source built from a TheMealDB response document.
#[derive(Debug, Clone, Default)]
pub struct MealDbCatalog {
    stubs: Vec<RecipeStub>,
    ingredients: HashMap<RecipeId, Vec<Ingredient>>,
}

impl MealDbCatalog {
    /// Parse a `{"meals": [...]}` document. `"meals": null` (TheMealDB's
    /// "no results") yields an empty catalog. Records without an id or
    /// name are skipped.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let doc: Value = serde_json::from_str(text)?;
        let meals: &[Value] = match doc.get("meals") {
            Some(Value::Array(meals)) => meals.as_slice(),
            Some(Value::Null) => &[],
            _ => return Err(CatalogError::MissingMeals),
        };

        let mut catalog = Self::default();
        for meal in meals {
            let Some(stub) = stub_from_meal(meal) else {
                debug!("skipping catalog record without idMeal/strMeal");
                continue;
            };
            if catalog.ingredients.contains_key(&stub.id) {
                continue;
            }
            catalog
                .ingredients
                .insert(stub.id.clone(), parse_ingredients(meal));
            catalog.stubs.push(stub);
        }
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let catalog = Self::from_json(&text)?;
        info!(path = %path.display(), recipes = catalog.len(), "loaded recipe catalog");
        Ok(catalog)
    }

    pub fn stub(&self, id: &RecipeId) -> Option<&RecipeStub> {
        self.stubs.iter().find(|s| &s.id == id)
    }

    pub fn stubs(&self) -> &[RecipeStub] {
        &self.stubs
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

#[async_trait]
impl RecipeDetailSource for MealDbCatalog {
    fn name(&self) -> &str {
        "themealdb-catalog"
    }

    async fn fetch_details(&self, id: &RecipeId) -> Result<RecipeDetails, DetailError> {
        self.ingredients
            .get(id)
            .map(|ingredients| RecipeDetails::new(ingredients.clone()))
            .ok_or_else(|| DetailError::NotFound(id.clone()))
    }
}
