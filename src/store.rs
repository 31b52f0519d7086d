//! The task store: canonical in-memory tasks, settings and theme flag.
//!
//! Every mutation is written through to the key-value backend before the call
//! returns. Ids are unique within the store; records loaded or imported with a
//! duplicate id are dropped, first occurrence wins.

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use chrono::{Local, NaiveDate, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ImportError, StorageError, StoreError};
use crate::settings::{Settings, SettingsPatch};
use crate::stats::Dashboard;
use crate::storage::{FileStore, KeyValueStore, SETTINGS_KEY, TASKS_KEY, THEME_KEY};
use crate::task::{Task, TaskInput};
use crate::validate::validate_task_object;

/// Result of a validated bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub total: usize,
}

impl ImportSummary {
    /// Some records were dropped.
    pub fn is_partial(&self) -> bool {
        self.imported < self.total
    }
}

/// The store the binary runs on.
pub type PlannerStore = TaskStore<FileStore>;

pub struct TaskStore<S: KeyValueStore> {
    kv: S,
    tasks: Vec<Task>,
    settings: Settings,
    dark_mode: bool,
    stamps: HashMap<&'static str, Option<SystemTime>>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Rehydrate a store from the backend.
    pub fn open(kv: S) -> Result<Self, StoreError> {
        let mut store = TaskStore {
            kv,
            tasks: Vec::new(),
            settings: Settings::default(),
            dark_mode: false,
            stamps: HashMap::new(),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[cfg(test)]
    pub fn backend(&self) -> &S {
        &self.kv
    }

    pub fn get_task_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Create a task with a fresh id and timestamps, append it and persist.
    /// Nothing changes in memory when the write fails.
    pub fn add_task(&mut self, input: &TaskInput) -> Result<Task, StoreError> {
        let now = Utc::now();
        let task = Task {
            id: self.next_id(),
            title: input.title.clone(),
            duration: input.duration_value(),
            due_date: input.due_date.clone(),
            tag: input.normalized_tag(),
            created_at: now,
            updated_at: now,
        };

        let mut tasks = self.tasks.clone();
        tasks.push(task.clone());
        self.commit_tasks(tasks)?;
        info!(id = %task.id, title = %task.title, "task added");
        Ok(task)
    }

    /// Replace every field except id and creation time. `None` when no task
    /// has this id; nothing is written in that case.
    pub fn update_task(&mut self, id: &str, input: &TaskInput) -> Result<Option<Task>, StoreError> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };

        let mut tasks = self.tasks.clone();
        let task = &mut tasks[index];
        task.title = input.title.clone();
        task.duration = input.duration_value();
        task.due_date = input.due_date.clone();
        task.tag = input.normalized_tag();
        task.updated_at = Utc::now();
        let updated = task.clone();

        self.commit_tasks(tasks)?;
        info!(id = %updated.id, "task updated");
        Ok(Some(updated))
    }

    /// Remove the task with this id, if any, and persist. Returns whether a
    /// task was removed; an unknown id is not an error.
    pub fn delete_task(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.clone();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != self.tasks.len();

        self.commit_tasks(tasks)?;
        if removed {
            info!(id, "task deleted");
        }
        Ok(removed)
    }

    /// Shallow-merge into the current settings and persist.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<(), StoreError> {
        let mut settings = self.settings;
        settings.apply(patch);
        let text = encode(SETTINGS_KEY, &settings)?;
        self.write(SETTINGS_KEY, &text)?;
        self.settings = settings;
        info!(
            unit = self.settings.default_unit.as_str(),
            daily_target = self.settings.daily_target,
            "settings updated"
        );
        Ok(())
    }

    /// Flip the theme flag and persist it. Returns the new value.
    pub fn toggle_dark_mode(&mut self) -> Result<bool, StoreError> {
        let dark = !self.dark_mode;
        self.write(THEME_KEY, &dark.to_string())?;
        self.dark_mode = dark;
        Ok(dark)
    }

    /// Store-level import: replace all tasks with a serialized array.
    ///
    /// Returns `false` and leaves the store untouched when the text is not a
    /// JSON array or cannot be written. Elements that do not decode as tasks,
    /// and repeated ids, are dropped on reload; the stored array is then
    /// rewritten so it matches the tasks held in memory.
    pub fn import_tasks(&mut self, serialized: &str) -> bool {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(serialized) else {
            warn!("import rejected: not a JSON array");
            return false;
        };

        if let Err(e) = self.write(TASKS_KEY, serialized) {
            warn!(error = %e, "import failed to persist");
            return false;
        }
        self.tasks = decode_tasks(Some(serialized));

        if self.tasks.len() != items.len() {
            warn!(kept = self.tasks.len(), total = items.len(), "import dropped unusable records");
            if let Err(e) = self.persist_tasks() {
                warn!(error = %e, "failed to rewrite imported tasks");
            }
        }
        info!(count = self.tasks.len(), "tasks imported");
        true
    }

    /// The import flow for user files: every record is validated on its own,
    /// invalid ones (and repeated ids) are dropped, and the rest replace the
    /// stored tasks.
    pub fn import_validated(&mut self, serialized: &str) -> Result<ImportSummary, ImportError> {
        let Value::Array(items) = serde_json::from_str::<Value>(serialized)? else {
            return Err(ImportError::NotAnArray);
        };

        let total = items.len();
        let now = Utc::now();
        let mut seen = HashSet::new();
        let valid: Vec<Value> = items
            .into_iter()
            .filter(validate_task_object)
            .filter(|item| Task::from_import(item, now).is_some())
            .filter(|item| seen.insert(id_key(item)))
            .collect();

        if valid.is_empty() {
            return Err(ImportError::NoValidTasks);
        }

        let text = encode(TASKS_KEY, &valid).map_err(StoreError::from)?;
        self.write(TASKS_KEY, &text)?;
        self.tasks = decode_tasks(Some(&text));
        info!(count = self.tasks.len(), "tasks imported");

        let summary = ImportSummary { imported: valid.len(), total };
        if summary.is_partial() {
            warn!(imported = summary.imported, total, "some imported tasks were invalid");
        }
        Ok(summary)
    }

    /// The persisted task array, verbatim.
    pub fn export_tasks(&self) -> Result<String, StoreError> {
        Ok(self.kv.get(TASKS_KEY)?.unwrap_or_else(|| "[]".to_string()))
    }

    /// The current tasks as 2-space indented JSON, for a `tasks.json` download.
    pub fn export_pretty(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.tasks).map_err(|source| {
            StoreError::from(StorageError::Encode { key: TASKS_KEY.to_string(), source })
        })
    }

    /// Re-read tasks, settings and theme from the backend.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.reload_key(TASKS_KEY)?;
        self.reload_key(SETTINGS_KEY)?;
        self.reload_key(THEME_KEY)?;
        Ok(())
    }

    /// React to another writer changing `key`. Returns whether the key belongs
    /// to this store.
    pub fn handle_external_change(&mut self, key: &str) -> Result<bool, StoreError> {
        match key {
            TASKS_KEY | SETTINGS_KEY | THEME_KEY => {
                self.reload_key(key)?;
                info!(key, "resynchronised after external change");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Compare backend modification stamps with the ones seen at the last load
    /// or write and reload whatever changed. Returns whether anything did.
    pub fn poll_external_changes(&mut self) -> Result<bool, StoreError> {
        let mut changed = false;
        for key in [TASKS_KEY, SETTINGS_KEY, THEME_KEY] {
            let current = self.kv.modified(key);
            if self.stamps.get(key).copied().flatten() != current {
                self.handle_external_change(key)?;
                changed = true;
            }
        }
        Ok(changed)
    }

    pub fn dashboard(&self, today: NaiveDate) -> Dashboard {
        Dashboard::compute(&self.tasks, &self.settings, today)
    }

    pub fn dashboard_today(&self) -> Dashboard {
        self.dashboard(Local::now().date_naive())
    }

    fn reload_key(&mut self, key: &str) -> Result<(), StoreError> {
        let text = self.kv.get(key)?;
        match key {
            TASKS_KEY => self.tasks = decode_tasks(text.as_deref()),
            SETTINGS_KEY => self.settings = Settings::from_stored(text.as_deref()),
            THEME_KEY => self.dark_mode = text.as_deref() == Some("true"),
            _ => return Ok(()),
        }
        self.remember_stamp(key);
        Ok(())
    }

    fn persist_tasks(&mut self) -> Result<(), StoreError> {
        let text = encode(TASKS_KEY, &self.tasks)?;
        self.write(TASKS_KEY, &text)
    }

    /// Write `tasks` and adopt them only once the write succeeded.
    fn commit_tasks(&mut self, tasks: Vec<Task>) -> Result<(), StoreError> {
        let text = encode(TASKS_KEY, &tasks)?;
        self.write(TASKS_KEY, &text)?;
        self.tasks = tasks;
        Ok(())
    }

    fn write(&mut self, key: &'static str, value: &str) -> Result<(), StoreError> {
        self.kv.set(key, value)?;
        self.remember_stamp(key);
        Ok(())
    }

    fn remember_stamp(&mut self, key: &str) {
        let stamp = self.kv.modified(key);
        for known in [TASKS_KEY, SETTINGS_KEY, THEME_KEY] {
            if known == key {
                self.stamps.insert(known, stamp);
            }
        }
    }

    fn next_id(&self) -> String {
        loop {
            let id = format!("task_{}", Uuid::new_v4().simple());
            if self.get_task_by_id(&id).is_none() {
                return id;
            }
        }
    }
}

fn encode<T: serde::Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Encode { key: key.to_string(), source })
}

/// Lenient load of the stored task array. Malformed data yields an empty list,
/// undecodable records and repeated ids are skipped.
fn decode_tasks(text: Option<&str>) -> Vec<Task> {
    let Some(text) = text else {
        return Vec::new();
    };
    let items: Vec<Value> = match serde_json::from_str(text) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "Error parsing stored tasks, starting fresh");
            return Vec::new();
        }
    };

    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(items.len());
    for item in &items {
        match Task::from_import(item, now) {
            Some(task) if seen.insert(task.id.clone()) => tasks.push(task),
            Some(task) => warn!(id = %task.id, "skipping stored task with duplicate id"),
            None => warn!("skipping undecodable stored task"),
        }
    }
    tasks
}

/// The id a record will be stored under, for duplicate detection.
fn id_key(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
