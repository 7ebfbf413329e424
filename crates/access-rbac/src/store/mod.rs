//! Assignment persistence
//!
//! This module provides the assignment store abstraction and its
//! implementations. The store owns the consistency of assignments: pair
//! uniqueness, atomic insert-unless-present, and bulk deletes.

use async_trait::async_trait;
use thiserror::Error;

use crate::assignment::Assignment;

pub mod memory;

#[cfg(feature = "file-store")]
pub mod file;

pub use memory::MemoryAssignmentStore;

#[cfg(feature = "file-store")]
pub use file::FileAssignmentStore;

/// Assignment store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(subject, item)` pair already exists
    #[error("Assignment already exists: {0}")]
    Conflict(String),

    /// Storage has not been bootstrapped
    #[error("Assignment storage does not exist: {0}")]
    NotInitialized(String),

    /// Backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for assignment store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Persistence capability for direct assignments.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Check if the pair is assigned.
    async fn exists(&self, subject: &str, item: &str) -> StoreResult<bool>;

    /// Insert an assignment.
    ///
    /// Must fail with [`StoreError::Conflict`] when the pair already exists
    /// and must not create a second record for it.
    async fn insert(&self, assignment: Assignment) -> StoreResult<()>;

    /// Delete one assignment. Returns `true` if it existed.
    async fn delete(&self, subject: &str, item: &str) -> StoreResult<bool>;

    /// Delete every assignment of `subject`. Returns the number removed.
    async fn delete_all(&self, subject: &str) -> StoreResult<u64>;

    /// List the assignments of `subject`, ordered by item name.
    async fn list(&self, subject: &str) -> StoreResult<Vec<Assignment>>;

    /// Delete every assignment of every subject. Returns the number removed.
    async fn clear(&self) -> StoreResult<u64>;
}
