//! Storage backends for mealplan user snapshots.
//!
//! Both gateways key records by [`UserKey::storage_key`]
//! (`mealplan_<user>`):
//!
//! ```text
//! FileStore    <data_dir>/mealplan_<user>.json
//! MemoryStore  HashMap<"mealplan_<user>", json text>
//! ```
//!
//! [`UserKey::storage_key`]: mealplan_core::UserKey::storage_key

pub mod config;
pub mod file;
pub mod memory;

pub use config::StoreConfig;
pub use file::FileStore;
pub use memory::MemoryStore;
