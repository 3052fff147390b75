//! Reminder persistence contract and adapters.
//!
//! The engine only needs two things from a store: the reminders that already exist, and an
//! insert that refuses ids it has already seen. The unique-id insert is what keeps overlapping
//! generation runs from creating duplicates, so every adapter performs its read-check-write
//! under a lock. Delivery collaborators additionally use [`ReminderStore::due`] and
//! [`ReminderStore::mark_sent`].

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::Reminder;
use care_ids::ReminderId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Storage for generated reminders.
pub trait ReminderStore: Send + Sync {
    /// Every stored reminder, in insertion order.
    fn existing(&self) -> SchedulingResult<Vec<Reminder>>;

    /// Inserts each reminder whose id is not already stored and returns how many were added.
    ///
    /// Reminders with a known id are skipped; stored records are never overwritten.
    fn insert_if_absent(&self, reminders: &[Reminder]) -> SchedulingResult<usize>;

    /// Unsent reminders scheduled at or before `now`, earliest first.
    fn due(&self, now: DateTime<Utc>) -> SchedulingResult<Vec<Reminder>>;

    /// Records delivery of a reminder. Marking an already-sent reminder keeps its first
    /// `sent_at`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::UnknownReminder`] if no reminder has this id.
    fn mark_sent(&self, id: ReminderId, sent_at: DateTime<Utc>) -> SchedulingResult<()>;
}

/// Ordered reminder records with an id index.
#[derive(Debug, Default)]
struct ReminderTable {
    rows: Vec<Reminder>,
    index: HashMap<ReminderId, usize>,
}

impl ReminderTable {
    fn from_rows(rows: Vec<Reminder>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.insert_if_absent(row);
        }
        table
    }

    fn insert_if_absent(&mut self, reminder: Reminder) -> bool {
        if self.index.contains_key(&reminder.id) {
            return false;
        }
        self.index.insert(reminder.id, self.rows.len());
        self.rows.push(reminder);
        true
    }

    fn insert_all(&mut self, reminders: &[Reminder]) -> usize {
        reminders
            .iter()
            .filter(|r| self.insert_if_absent((*r).clone()))
            .count()
    }

    fn due(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut due: Vec<Reminder> = self.rows.iter().filter(|r| r.is_due(now)).cloned().collect();
        due.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for).then(a.id.cmp(&b.id)));
        due
    }

    /// Returns whether the record changed.
    fn mark_sent(&mut self, id: ReminderId, sent_at: DateTime<Utc>) -> SchedulingResult<bool> {
        let row = self
            .index
            .get(&id)
            .and_then(|&i| self.rows.get_mut(i))
            .ok_or(SchedulingError::UnknownReminder(id))?;
        if row.sent {
            return Ok(false);
        }
        row.sent = true;
        row.sent_at = Some(sent_at);
        Ok(true)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> SchedulingResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| SchedulingError::StoreLockPoisoned)
}

/// Process-local store, mainly for tests and single-run tools.
#[derive(Debug, Default)]
pub struct InMemoryReminderStore {
    table: Mutex<ReminderTable>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminders(reminders: Vec<Reminder>) -> Self {
        Self {
            table: Mutex::new(ReminderTable::from_rows(reminders)),
        }
    }
}

impl ReminderStore for InMemoryReminderStore {
    fn existing(&self) -> SchedulingResult<Vec<Reminder>> {
        Ok(lock(&self.table)?.rows.clone())
    }

    fn insert_if_absent(&self, reminders: &[Reminder]) -> SchedulingResult<usize> {
        Ok(lock(&self.table)?.insert_all(reminders))
    }

    fn due(&self, now: DateTime<Utc>) -> SchedulingResult<Vec<Reminder>> {
        Ok(lock(&self.table)?.due(now))
    }

    fn mark_sent(&self, id: ReminderId, sent_at: DateTime<Utc>) -> SchedulingResult<()> {
        lock(&self.table)?.mark_sent(id, sent_at).map(|_| ())
    }
}

/// Reminders kept as a JSON array in a single file.
///
/// All operations in this process are serialised through one lock, and writes replace the file
/// atomically via a sibling temporary file. A missing file reads as an empty store.
#[derive(Debug)]
pub struct JsonFileReminderStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileReminderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SchedulingResult<ReminderTable> {
        let rows: Vec<Reminder> = match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text).map_err(SchedulingError::Deserialization)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(SchedulingError::FileRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(ReminderTable::from_rows(rows))
    }

    fn save(&self, table: &ReminderTable) -> SchedulingResult<()> {
        let json =
            serde_json::to_string_pretty(&table.rows).map_err(SchedulingError::Serialization)?;
        write_atomically(&self.path, json.as_bytes())
    }
}

impl ReminderStore for JsonFileReminderStore {
    fn existing(&self) -> SchedulingResult<Vec<Reminder>> {
        let _guard = lock(&self.guard)?;
        Ok(self.load()?.rows)
    }

    fn insert_if_absent(&self, reminders: &[Reminder]) -> SchedulingResult<usize> {
        let _guard = lock(&self.guard)?;
        let mut table = self.load()?;
        let inserted = table.insert_all(reminders);
        if inserted > 0 {
            self.save(&table)?;
        }
        Ok(inserted)
    }

    fn due(&self, now: DateTime<Utc>) -> SchedulingResult<Vec<Reminder>> {
        let _guard = lock(&self.guard)?;
        Ok(self.load()?.due(now))
    }

    fn mark_sent(&self, id: ReminderId, sent_at: DateTime<Utc>) -> SchedulingResult<()> {
        let _guard = lock(&self.guard)?;
        let mut table = self.load()?;
        if table.mark_sent(id, sent_at)? {
            self.save(&table)?;
        }
        Ok(())
    }
}

/// Writes `contents` to a temporary sibling of `path`, then renames it into place.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> SchedulingResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SchedulingError::DataDirCreation)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let write_err = |source| SchedulingError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, contents).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}
