use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_replace, new_habit_id, HabitStore, OwnerHabits, Versioned};
use crate::date::CalendarDate;
use crate::due::SkippedHabit;
use crate::error::{HabitError, HabitResult};
use crate::habit::{Habit, NewHabit};

/// On-disk layout: `{"habits": [{"version": n, ...document}]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    habits: Vec<Value>,
}

/// Habits kept in a single JSON document on disk.
///
/// Every read goes to the file, so several processes can share it. Writes
/// hold an exclusive lock on a `.lock` sibling for the whole
/// read-modify-write and replace the file by renaming a fully written temp
/// file over it. Documents are kept raw: one the engine cannot decode is
/// reported when listing and written back untouched.
pub struct JsonFileStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Check that `path` holds a readable store. A missing file is an empty
    /// store and is only created by the first write.
    pub fn open(path: impl AsRef<Path>) -> HabitResult<Self> {
        let path = path.as_ref().to_path_buf();
        let documents = read_documents(&path)?;
        tracing::debug!(path = %path.display(), documents = documents.len(), "opened habit store");
        Ok(Self {
            path,
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `change` against the current file contents and persist the
    /// result. Nothing is written when `change` fails.
    fn update<T>(&self, change: impl FnOnce(&mut Vec<Value>) -> HabitResult<T>) -> HabitResult<T> {
        let _writer = self.writer.lock();
        let _lock = self.lock_file()?;
        let mut documents = read_documents(&self.path)?;
        let outcome = change(&mut documents)?;
        self.persist(documents)?;
        Ok(outcome)
    }

    /// Exclusive advisory lock, released when the returned file is dropped.
    fn lock_file(&self) -> HabitResult<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(sibling(&self.path, ".lock"))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn persist(&self, documents: Vec<Value>) -> HabitResult<()> {
        let json = serde_json::to_string_pretty(&StoreFile { habits: documents })?;
        let temp_path = sibling(&self.path, ".tmp");
        let cleanup = |err: std::io::Error| {
            let _ = fs::remove_file(&temp_path);
            err
        };

        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes()).map_err(cleanup)?;
        file.sync_all().map_err(cleanup)?;
        fs::rename(&temp_path, &self.path).map_err(cleanup)?;
        Ok(())
    }

    fn decode(document: &Value) -> HabitResult<Versioned<Habit>> {
        let version = document
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(Versioned::new(version, Habit::from_json(document.clone())?))
    }
}

fn read_documents(path: &Path) -> HabitResult<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: StoreFile = serde_json::from_str(&raw)?;
    Ok(file.habits)
}

/// `habits.json` + `.lock` -> `habits.json.lock`, in the same directory.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("habits"));
    name.push(suffix);
    path.with_file_name(name)
}

fn document_id(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

fn document_owner(document: &Value) -> Option<&str> {
    document
        .get("userId")
        .or_else(|| document.get("ownerId"))
        .and_then(Value::as_str)
}

impl HabitStore for JsonFileStore {
    fn insert(
        &self,
        owner_id: &str,
        request: NewHabit,
        created_at: CalendarDate,
    ) -> HabitResult<Versioned<Habit>> {
        let habit = Habit::create(new_habit_id(), owner_id, request, created_at)?;
        let stored = Versioned::new(1, habit);
        self.update(|documents| {
            documents.push(serde_json::to_value(&stored)?);
            Ok(())
        })?;
        tracing::debug!(habit = %stored.value.id(), "habit inserted");
        Ok(stored)
    }

    fn get(&self, id: &str) -> HabitResult<Option<Versioned<Habit>>> {
        read_documents(&self.path)?
            .iter()
            .find(|document| document_id(document) == Some(id))
            .map(Self::decode)
            .transpose()
    }

    fn list_by_owner(&self, owner_id: &str) -> HabitResult<OwnerHabits> {
        let mut listing = OwnerHabits::default();
        for document in read_documents(&self.path)?
            .iter()
            .filter(|document| document_owner(document) == Some(owner_id))
        {
            match Self::decode(document) {
                Ok(stored) => listing.habits.push(stored),
                Err(err) => {
                    let id = document_id(document).unwrap_or("<unknown>");
                    listing.skipped.push(SkippedHabit::new(id, &err));
                }
            }
        }
        Ok(listing)
    }

    fn replace(&self, habit: Habit, expected_version: u64) -> HabitResult<Versioned<Habit>> {
        let stored = self.update(|documents| {
            let slot = documents
                .iter_mut()
                .find(|document| document_id(document) == Some(habit.id()))
                .ok_or_else(|| HabitError::HabitNotFound(habit.id().to_string()))?;
            let current = Self::decode(slot)?;
            check_replace(
                current.value.owner_id(),
                current.version,
                &habit,
                expected_version,
            )?;
            let stored = Versioned::new(current.version + 1, habit);
            *slot = serde_json::to_value(&stored)?;
            Ok(stored)
        })?;
        tracing::debug!(habit = %stored.value.id(), version = stored.version, "habit replaced");
        Ok(stored)
    }
}
