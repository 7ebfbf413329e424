//! In-memory assignment store.
//!
//! Suitable for tests and single-process embedding. State is lost on
//! restart. Reads take a shared lock, mutations an exclusive one, so
//! insert-unless-present is atomic within the process.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{AssignmentStore, StoreError, StoreResult};
use crate::assignment::Assignment;

type Key = (String, String);

/// In-memory assignment store keyed by `(subject, item)`.
#[derive(Debug, Default)]
pub struct MemoryAssignmentStore {
    assignments: RwLock<BTreeMap<Key, Assignment>>,
}

impl MemoryAssignmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with assignments. Later duplicates are ignored.
    pub fn with_assignments<I>(assignments: I) -> Self
    where
        I: IntoIterator<Item = Assignment>,
    {
        let mut map = BTreeMap::new();
        for a in assignments {
            map.entry(key(&a.subject_id, &a.item_name)).or_insert(a);
        }
        Self {
            assignments: RwLock::new(map),
        }
    }

    /// Total number of assignments.
    pub async fn len(&self) -> usize {
        self.assignments.read().await.len()
    }

    /// Check if there are no assignments.
    pub async fn is_empty(&self) -> bool {
        self.assignments.read().await.is_empty()
    }
}

fn key(subject: &str, item: &str) -> Key {
    (subject.to_string(), item.to_string())
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn exists(&self, subject: &str, item: &str) -> StoreResult<bool> {
        Ok(self.assignments.read().await.contains_key(&key(subject, item)))
    }

    async fn insert(&self, assignment: Assignment) -> StoreResult<()> {
        let mut assignments = self.assignments.write().await;
        let k = key(&assignment.subject_id, &assignment.item_name);
        if assignments.contains_key(&k) {
            return Err(StoreError::Conflict(format!("{}/{}", k.0, k.1)));
        }
        assignments.insert(k, assignment);
        Ok(())
    }

    async fn delete(&self, subject: &str, item: &str) -> StoreResult<bool> {
        Ok(self
            .assignments
            .write()
            .await
            .remove(&key(subject, item))
            .is_some())
    }

    async fn delete_all(&self, subject: &str) -> StoreResult<u64> {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|(s, _), _| s != subject);
        Ok((before - assignments.len()) as u64)
    }

    async fn list(&self, subject: &str) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .filter(|a| a.subject_id == subject)
            .cloned()
            .collect())
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut assignments = self.assignments.write().await;
        let removed = assignments.len() as u64;
        assignments.clear();
        Ok(removed)
    }
}
