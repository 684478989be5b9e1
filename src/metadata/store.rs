//! Thread-safe, optionally persistent metadata store.
//!
//! One [`RwLock`] guards the whole path-to-metadata map. Reads share the lock;
//! every mutation holds it exclusively for its full duration, including the
//! rewrite of the backing JSON file. A failed rewrite is reported to the
//! caller but the in-memory change stays applied.

use std::fs;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::error::{StoreError, StoreResult};
use super::models::{Comment, FileMetadata, NewComment, TestReference, TestSuggestion};

/// Snapshot of every file's metadata, keyed by source path.
pub type MetadataMap = IndexMap<String, FileMetadata>;

/// Keyed store of per-file test metadata, suggestions and comments.
///
/// Paths are used verbatim as keys; the store does not normalise them.
#[derive(Debug, Default)]
pub struct MetadataStore {
    files: RwLock<MetadataMap>,
    persist_path: Option<PathBuf>,
}

impl MetadataStore {
    /// Creates a store that never touches the disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a store backed by `persist_path`, loading any existing content.
    ///
    /// A missing file yields an empty store. An unreadable or malformed file
    /// is logged and also yields an empty store; its content will be
    /// overwritten by the next mutation.
    #[must_use]
    pub fn open(persist_path: Option<PathBuf>) -> Self {
        let files = persist_path
            .as_deref()
            .map(load_file)
            .unwrap_or_default();

        Self {
            files: RwLock::new(files),
            persist_path,
        }
    }

    /// Path of the backing file, if persistence is configured.
    #[must_use]
    pub fn persist_path(&self) -> Option<&Path> {
        self.persist_path.as_deref()
    }

    /// Number of source files with recorded metadata.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if no file has any metadata entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Replaces the whole test list for `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten.
    pub fn set_test_metadata(&self, path: &str, tests: Vec<TestReference>) -> StoreResult<()> {
        self.mutate(|files| {
            files.entry(path.to_string()).or_default().tests = tests;
            ((), true)
        })
    }

    /// Merges `tests` into the test list for `path`.
    ///
    /// Entries are matched on `(test_file, test_name)`. A match is replaced in
    /// place, an unmatched new entry is appended and untouched existing
    /// entries are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten.
    pub fn add_test_metadata(&self, path: &str, tests: Vec<TestReference>) -> StoreResult<()> {
        self.mutate(|files| {
            let entry = files.entry(path.to_string()).or_default();
            let existing = std::mem::take(&mut entry.tests);
            entry.tests = merge_by_key(existing, tests, TestReference::key);
            ((), true)
        })
    }

    /// Returns a copy of everything recorded for `path`.
    #[must_use]
    pub fn get_test_metadata(&self, path: &str) -> Option<FileMetadata> {
        self.read().get(path).cloned()
    }

    /// Merges `suggestions` into the suggestion list for `path`, matching on
    /// `suggested_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten.
    pub fn add_suggestions(&self, path: &str, suggestions: Vec<TestSuggestion>) -> StoreResult<()> {
        self.mutate(|files| {
            let entry = files.entry(path.to_string()).or_default();
            let existing = std::mem::take(&mut entry.suggestions);
            entry.suggestions =
                merge_by_key(existing, suggestions, |s| s.suggested_name.clone());
            ((), true)
        })
    }

    /// Returns the suggestions for `path`, empty if none.
    #[must_use]
    pub fn get_suggestions(&self, path: &str) -> Vec<TestSuggestion> {
        self.read()
            .get(path)
            .map(|meta| meta.suggestions.clone())
            .unwrap_or_default()
    }

    /// Appends a new comment to `path` and returns it with its generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten. The comment
    /// is still kept in memory in that case.
    pub fn add_comment(&self, path: &str, comment: NewComment) -> StoreResult<Comment> {
        self.mutate(|files| {
            let comment = Comment::create(comment);
            files
                .entry(path.to_string())
                .or_default()
                .comments
                .push(comment.clone());
            (comment, true)
        })
    }

    /// Replaces the content of comment `id`.
    ///
    /// Returns `Ok(false)` without writing anything if the file or the
    /// comment does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten.
    pub fn update_comment(&self, path: &str, id: &str, content: &str) -> StoreResult<bool> {
        self.mutate(|files| {
            let Some(comment) = find_comment(files, path, id) else {
                return (false, false);
            };
            content.clone_into(&mut comment.content);
            comment.touch();
            (true, true)
        })
    }

    /// Removes comment `id` from `path`.
    ///
    /// Returns `Ok(false)` without writing anything if the file or the
    /// comment does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten.
    pub fn delete_comment(&self, path: &str, id: &str) -> StoreResult<bool> {
        self.mutate(|files| {
            let Some(meta) = files.get_mut(path) else {
                return (false, false);
            };
            let Some(index) = meta.comments.iter().position(|c| c.id == id) else {
                return (false, false);
            };
            meta.comments.remove(index);
            (true, true)
        })
    }

    /// Flips the resolved flag of comment `id`.
    ///
    /// Returns `Ok(false)` without writing anything if the file or the
    /// comment does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be rewritten.
    pub fn toggle_comment_resolved(&self, path: &str, id: &str) -> StoreResult<bool> {
        self.mutate(|files| {
            let Some(comment) = find_comment(files, path, id) else {
                return (false, false);
            };
            comment.resolved = !comment.resolved;
            comment.touch();
            (true, true)
        })
    }

    /// Returns the comments for `path` in insertion order, empty if none.
    #[must_use]
    pub fn get_comments(&self, path: &str) -> Vec<Comment> {
        self.read()
            .get(path)
            .map(|meta| meta.comments.clone())
            .unwrap_or_default()
    }

    /// Returns a read-only snapshot of the whole store.
    ///
    /// Later mutations are not reflected in the returned map.
    #[must_use]
    pub fn get_all_metadata(&self) -> MetadataMap {
        self.read().clone()
    }

    /// Writes the whole store to the backing file.
    ///
    /// Does nothing when persistence is not configured. Holds the write lock
    /// so the rewrite cannot interleave with any other write of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = self.persist_path.as_deref() else {
            return Ok(());
        };
        let files = self.write();
        write_file(path, &files)
    }

    fn read(&self) -> RwLockReadGuard<'_, MetadataMap> {
        self.files.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MetadataMap> {
        self.files.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `apply` under the write lock and rewrites the backing file when
    /// it reports a change. The lock is held until the write completes.
    fn mutate<T>(&self, apply: impl FnOnce(&mut MetadataMap) -> (T, bool)) -> StoreResult<T> {
        let mut files = self.write();
        let (value, changed) = apply(&mut files);

        if changed {
            if let Some(path) = self.persist_path.as_deref() {
                write_file(path, &files)?;
            }
        }

        Ok(value)
    }
}

/// Merges `incoming` over `existing`, keyed by `key`.
///
/// Existing entries keep their position; a colliding incoming entry replaces
/// the old value in place and new keys are appended in batch order.
fn merge_by_key<T, K, F>(existing: Vec<T>, incoming: Vec<T>, key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut merged: IndexMap<K, T> = IndexMap::with_capacity(existing.len() + incoming.len());
    for item in existing.into_iter().chain(incoming) {
        merged.insert(key(&item), item);
    }
    merged.into_values().collect()
}

fn find_comment<'a>(files: &'a mut MetadataMap, path: &str, id: &str) -> Option<&'a mut Comment> {
    files
        .get_mut(path)?
        .comments
        .iter_mut()
        .find(|comment| comment.id == id)
}

fn load_file(path: &Path) -> MetadataMap {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No metadata file yet, starting empty");
            return MetadataMap::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read metadata file, starting empty");
            return MetadataMap::new();
        }
    };

    match serde_json::from_str::<MetadataMap>(&contents) {
        Ok(files) => {
            tracing::info!(path = %path.display(), files = files.len(), "Loaded metadata");
            files
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed metadata file, starting empty");
            MetadataMap::new()
        }
    }
}

fn write_file(path: &Path, files: &MetadataMap) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(files)?;

    let persist_err = |source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }
    fs::write(path, json).map_err(persist_err)?;

    tracing::trace!(path = %path.display(), files = files.len(), "Metadata written");
    Ok(())
}
