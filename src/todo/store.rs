//! Todo storage and persistence.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::observability::metrics;
use crate::todo::model::{NewTodo, Todo, TodoChanges};

/// Errors from loading or saving the data file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("data file is not valid: {0}")]
    Format(#[from] serde_json::Error),

    #[error("no data file is configured")]
    NotPersistent,

    #[error("save task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// On-disk layout of the data file.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    items: Vec<Todo>,
}

/// A thread-safe store for todo items.
///
/// Cloning is cheap; every clone shares the same items.
#[derive(Clone)]
pub struct TodoStore {
    items: Arc<DashMap<u64, Todo>>,
    /// Next id to hand out. Ids are never reused.
    next_id: Arc<AtomicU64>,
    persistence_path: Option<PathBuf>,
    /// Serializes writers of the data file.
    save_lock: Arc<Mutex<()>>,
}

impl TodoStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            items: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            persistence_path,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load from file if it exists; otherwise start empty and persist there.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            let max_id = snapshot.items.iter().map(|t| t.id).max().unwrap_or(0);
            store
                .next_id
                .store(snapshot.next_id.max(max_id + 1), Ordering::SeqCst);
            for todo in snapshot.items {
                store.items.insert(todo.id, todo);
            }
            tracing::info!(
                path = %path.display(),
                items = store.items.len(),
                "Loaded todos from data file"
            );
        } else {
            tracing::info!(path = %path.display(), "Data file not found, starting empty");
        }

        metrics::record_item_count(store.items.len());
        Ok(store)
    }

    /// Whether mutations are written to a data file.
    pub fn is_persistent(&self) -> bool {
        self.persistence_path.is_some()
    }

    /// Write every item to the data file.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let path = self
            .persistence_path
            .as_ref()
            .ok_or(StoreError::NotPersistent)?;

        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let snapshot = Snapshot {
            next_id: self.next_id.load(Ordering::SeqCst),
            items: self.list(),
        };

        // Write beside the target and rename so readers never see half a file.
        let tmp = path.with_extension("json.tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, &snapshot)?;
        }
        fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), items = snapshot.items.len(), "Saved todos");
        Ok(())
    }

    /// [`save_to_file`](Self::save_to_file) on the blocking pool, keeping
    /// file I/O and the save lock off the async workers.
    pub async fn save(&self) -> Result<(), StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save_to_file()).await?
    }

    /// Save if a data file is configured.
    pub async fn persist(&self) -> Result<(), StoreError> {
        if self.is_persistent() {
            self.save().await?;
        }
        Ok(())
    }

    /// All items in ascending id order.
    pub fn list(&self) -> Vec<Todo> {
        let mut items: Vec<Todo> = self.items.iter().map(|r| r.value().clone()).collect();
        items.sort_by_key(|t| t.id);
        items
    }

    /// Store a new item under the next free id.
    pub fn insert(&self, new: NewTodo) -> Todo {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let todo = Todo {
            id,
            title: new.title,
            completed: new.completed,
        };
        self.items.insert(id, todo.clone());
        metrics::record_item_count(self.items.len());
        todo
    }

    pub fn get(&self, id: u64) -> Option<Todo> {
        self.items.get(&id).map(|r| r.value().clone())
    }

    /// Apply changes to an existing item, returning the updated item.
    pub fn update(&self, id: u64, changes: &TodoChanges) -> Option<Todo> {
        self.items.get_mut(&id).map(|mut entry| {
            changes.apply(entry.value_mut());
            entry.value().clone()
        })
    }

    pub fn remove(&self, id: u64) -> Option<Todo> {
        let removed = self.items.remove(&id).map(|(_, todo)| todo);
        if removed.is_some() {
            metrics::record_item_count(self.items.len());
        }
        removed
    }

    /// Count items as (total, completed).
    pub fn counts(&self) -> (usize, usize) {
        self.items.iter().fold((0, 0), |(total, completed), r| {
            (total + 1, completed + usize::from(r.value().completed))
        })
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new(None)
    }
}
