//! Durable per-user snapshots and the gateway trait that stores them.
//!
//! A [`UserSnapshot`] bundles the pool, the grid and the last grocery list.
//! Implementations of [`PersistenceGateway`] live in the `mealplan-store`
//! crate; the session service only sees the trait.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::grid::MealPlanGrid;
use crate::model::GroceryList;
use crate::pool::SavedRecipePool;

/// Prefix of every storage key, so one store can be shared with other data.
const STORAGE_KEY_PREFIX: &str = "mealplan_";

/// Errors raised by snapshot encoding and by gateway implementations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("invalid user key {0:?} (expected ASCII letters, digits, '-' or '_')")]
    InvalidKey(String),

    #[error("stored record for {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// User key
// ---------------------------------------------------------------------------

/// Identifier of the user whose data a session owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserKey(String);

impl UserKey {
    /// Validate and wrap a user id.
    ///
    /// Only ASCII alphanumerics, `-` and `_` are accepted, which keeps the
    /// derived storage key safe to use as a file name.
    pub fn new(id: impl Into<String>) -> Result<Self, PersistenceError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= 64
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::InvalidKey(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespaced key under which this user's snapshot is stored.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything persisted for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserSnapshot {
    pub saved_recipes: SavedRecipePool,
    pub meal_plan: MealPlanGrid,
    pub grocery_list: GroceryList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl UserSnapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a stored snapshot.
    ///
    /// Text that is not a JSON object is [`PersistenceError::Corrupt`]. A
    /// field with the wrong shape falls back to its default on its own, so
    /// a damaged grocery list does not cost the user their saved recipes.
    /// The camelCase field names of older records are accepted too.
    pub fn from_json(key: &UserKey, text: &str) -> Result<Self, PersistenceError> {
        let corrupt = |reason: String| PersistenceError::Corrupt {
            key: key.storage_key(),
            reason,
        };

        let value: Value = serde_json::from_str(text).map_err(|e| corrupt(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(corrupt("expected a JSON object".to_owned()));
        };

        Ok(Self {
            saved_recipes: take_field(key, &mut fields, "saved_recipes", "savedRecipes"),
            meal_plan: take_field(key, &mut fields, "meal_plan", "mealPlan"),
            grocery_list: take_field(key, &mut fields, "grocery_list", "groceryList"),
            saved_at: take_field(key, &mut fields, "saved_at", "savedAt"),
        })
    }
}

fn take_field<T: DeserializeOwned + Default>(
    key: &UserKey,
    fields: &mut Map<String, Value>,
    name: &str,
    legacy_name: &str,
) -> T {
    let Some(value) = fields.remove(name).or_else(|| fields.remove(legacy_name)) else {
        return T::default();
    };
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(user = %key, field = name, error = %e, "discarding malformed snapshot field");
        T::default()
    })
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Durable key-value store for user snapshots.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load the snapshot for `user`, or `None` if nothing was stored yet.
    async fn load(&self, user: &UserKey) -> Result<Option<UserSnapshot>, PersistenceError>;

    /// Replace the stored snapshot for `user`.
    async fn save(&self, user: &UserKey, snapshot: &UserSnapshot) -> Result<(), PersistenceError>;

    /// Delete the stored snapshot for `user`. Deleting nothing is not an error.
    async fn remove(&self, user: &UserKey) -> Result<(), PersistenceError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PersistenceGateway) {}
};
