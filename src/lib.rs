// Camp Signups - Core Library
// Exposes the store, serializer and HTTP layer for the CLI, server and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod seed;
pub mod serializer;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use db::{open_database, setup_database, table_counts, TableCounts};
pub use entities::{
    delete_activity, delete_camper, get_activity, get_camper, get_signup, insert_activity,
    insert_camper, insert_signup, list_activities, list_campers, list_signups, update_camper,
    Activity, Camper, CamperField, Signup,
};
pub use error::{StoreError, StoreResult, ValidationError};
pub use seed::{reset, seed_from_csv, SeedReport};
pub use serializer::{to_value, to_values, Exclusions, Node, Related, Relations};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
