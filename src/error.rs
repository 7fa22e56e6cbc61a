// Store errors
// Two failure kinds reach callers: a missing row, or a rejected write.

use thiserror::Error;

/// A field failed its rule before anything was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Must have name attribute")]
    Name,

    #[error("Must have age attribute")]
    Age,

    #[error("Must have a valid time attribute")]
    Time,

    /// Signup points at a camper/activity that is missing or does not exist.
    #[error("Signup must reference an existing camper and activity")]
    Reference,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Serializer asked for a relationship the entity does not have
    #[error("{entity} has no relationship {edge}")]
    UnknownEdge { entity: &'static str, edge: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
