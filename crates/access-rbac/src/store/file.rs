//! JSON-file assignment store.
//!
//! Assignments are kept as a JSON array in a single file. The file must be
//! bootstrapped with [`FileAssignmentStore::init`] before the store can be
//! opened, mirroring the schema step of a database-backed store.
//!
//! Every mutation is a read-modify-write of the whole file. Writers are
//! serialized by an exclusive advisory lock on a `<path>.lock` sibling,
//! which holds across handles and processes, and each write goes to a
//! fresh temporary file in the same directory that is renamed over the
//! store. Readers never lock and always see a complete file.

use async_trait::async_trait;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::{AssignmentStore, StoreError, StoreResult};
use crate::assignment::Assignment;

/// Assignment store persisted to a JSON file.
#[derive(Debug)]
pub struct FileAssignmentStore {
    path: PathBuf,
    /// Queues this handle's writers ahead of the file lock.
    write_lock: Mutex<()>,
}

impl FileAssignmentStore {
    /// Create the storage file if it does not exist.
    ///
    /// Returns `true` when the file was created, `false` when it was
    /// already present. Existing content is never touched.
    pub async fn init(path: &Path) -> StoreResult<bool> {
        if tokio::fs::try_exists(path).await? {
            tracing::debug!(path = %path.display(), "Assignment storage already initialized");
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let _lock = lock_storage(path).await?;
        if tokio::fs::try_exists(path).await? {
            return Ok(false);
        }
        write_atomic(path, &[]).await?;
        tracing::info!(path = %path.display(), "Created assignment storage");
        Ok(true)
    }

    /// Check if the storage file exists.
    pub async fn is_initialized(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Open an initialized storage file.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if !Self::is_initialized(&path).await {
            return Err(StoreError::NotInitialized(path.display().to_string()));
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StoreResult<Vec<Assignment>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotInitialized(self.path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `f` to the current assignments and persist the result.
    async fn update<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Vec<Assignment>) -> StoreResult<(T, bool)>,
    {
        let _guard = self.write_lock.lock().await;
        let _lock = lock_storage(&self.path).await?;
        let mut assignments = self.read().await?;
        let (result, changed) = f(&mut assignments)?;
        if changed {
            write_atomic(&self.path, &assignments).await?;
        }
        Ok(result)
    }
}

/// Take the exclusive lock on `<path>.lock`. Dropping the file releases it.
async fn lock_storage(path: &Path) -> StoreResult<File> {
    let mut lock_path = path.as_os_str().to_owned();
    lock_path.push(".lock");
    let lock_path = PathBuf::from(lock_path);

    blocking(move || {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    })
    .await
}

async fn write_atomic(path: &Path, assignments: &[Assignment]) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(assignments)?;
    let path = path.to_path_buf();

    blocking(move || {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
}

async fn blocking<T, F>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Backend(format!("storage task failed: {e}")))?
}

#[async_trait]
impl AssignmentStore for FileAssignmentStore {
    async fn exists(&self, subject: &str, item: &str) -> StoreResult<bool> {
        Ok(self.read().await?.iter().any(|a| a.matches(subject, item)))
    }

    async fn insert(&self, assignment: Assignment) -> StoreResult<()> {
        self.update(|assignments| {
            if assignments
                .iter()
                .any(|a| a.matches(&assignment.subject_id, &assignment.item_name))
            {
                return Err(StoreError::Conflict(format!(
                    "{}/{}",
                    assignment.subject_id, assignment.item_name
                )));
            }
            assignments.push(assignment);
            Ok(((), true))
        })
        .await
    }

    async fn delete(&self, subject: &str, item: &str) -> StoreResult<bool> {
        self.update(|assignments| {
            let before = assignments.len();
            assignments.retain(|a| !a.matches(subject, item));
            let removed = assignments.len() < before;
            Ok((removed, removed))
        })
        .await
    }

    async fn delete_all(&self, subject: &str) -> StoreResult<u64> {
        self.update(|assignments| {
            let before = assignments.len();
            assignments.retain(|a| a.subject_id != subject);
            let removed = (before - assignments.len()) as u64;
            Ok((removed, removed > 0))
        })
        .await
    }

    async fn list(&self, subject: &str) -> StoreResult<Vec<Assignment>> {
        let mut found: Vec<_> = self
            .read()
            .await?
            .into_iter()
            .filter(|a| a.subject_id == subject)
            .collect();
        found.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        Ok(found)
    }

    async fn clear(&self) -> StoreResult<u64> {
        self.update(|assignments| {
            let removed = assignments.len() as u64;
            assignments.clear();
            Ok((removed, removed > 0))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");

        let err = FileAssignmentStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized(_)));

        assert!(FileAssignmentStore::init(&path).await.unwrap());
        assert!(!FileAssignmentStore::init(&path).await.unwrap());
        assert!(FileAssignmentStore::open(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_init_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var/rbac/assignments.json");

        FileAssignmentStore::init(&path).await.unwrap();
        assert!(FileAssignmentStore::is_initialized(&path).await);
    }

    #[tokio::test]
    async fn test_assignments_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");
        FileAssignmentStore::init(&path).await.unwrap();

        let store = FileAssignmentStore::open(&path).await.unwrap();
        store
            .insert(Assignment::new("u1", "admin").with_creator("root"))
            .await
            .unwrap();
        store.insert(Assignment::new("u1", "edit")).await.unwrap();
        drop(store);

        let store = FileAssignmentStore::open(&path).await.unwrap();
        assert!(store.exists("u1", "admin").await.unwrap());
        let listed = store.list("u1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].created_by.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");
        FileAssignmentStore::init(&path).await.unwrap();
        let store = FileAssignmentStore::open(&path).await.unwrap();

        store.insert(Assignment::new("u1", "admin")).await.unwrap();
        let err = store.insert(Assignment::new("u1", "admin")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");
        FileAssignmentStore::init(&path).await.unwrap();
        let store = FileAssignmentStore::open(&path).await.unwrap();

        for (s, i) in [("u1", "admin"), ("u1", "edit"), ("u2", "edit")] {
            store.insert(Assignment::new(s, i)).await.unwrap();
        }

        assert!(store.delete("u1", "admin").await.unwrap());
        assert!(!store.delete("u1", "admin").await.unwrap());
        assert_eq!(store.delete_all("u1").await.unwrap(), 1);
        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(store.clear().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_through_separate_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");
        FileAssignmentStore::init(&path).await.unwrap();

        let first = Arc::new(FileAssignmentStore::open(&path).await.unwrap());
        let second = Arc::new(FileAssignmentStore::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..40 {
            let store = if i % 2 == 0 { first.clone() } else { second.clone() };
            handles.push(tokio::spawn(async move {
                store.insert(Assignment::new(format!("u{i}"), "admin")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reopened = FileAssignmentStore::open(&path).await.unwrap();
        for i in 0..40 {
            assert!(reopened.exists(&format!("u{i}"), "admin").await.unwrap());
        }
        assert_eq!(reopened.clear().await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_write_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");
        FileAssignmentStore::init(&path).await.unwrap();
        let store = FileAssignmentStore::open(&path).await.unwrap();
        store.insert(Assignment::new("u1", "admin")).await.unwrap();

        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["assignments.json", "assignments.json.lock"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileAssignmentStore::open(&path).await.unwrap();
        let err = store.exists("u1", "admin").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
