//! Error types for the store and sync layers.

use thiserror::Error;

/// Failure talking to the backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("failed to create runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("no such {collection} document: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a bug operation requested from the UI.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required form field was missing; nothing was written.
    #[error("missing required field: {0}")]
    Validation(&'static str),

    /// No loaded user has this exact name; nothing was written.
    #[error("user not found: {0}")]
    UserNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
