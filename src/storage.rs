use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;

use crate::{
    calendar_date, dedup_tags, generate_note_id, normalize_attendees, normalize_meeting_time, Note, NoteDraft,
    NotesError, Result, DEFAULT_CATEGORY, DEFAULT_TITLE,
};

/// A persistent key-value slot holding the serialized note collection.
pub trait NoteSlot {
    /// Reads the raw slot contents, `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replaces the slot contents.
    fn write(&self, data: &str) -> Result<()>;
}

/// A slot backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NoteSlot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("Notes file does not exist yet: {}", self.path.display());
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read notes file {}: {}", self.path.display(), e);
            NotesError::Io(e)
        })?;
        Ok(Some(data))
    }

    /// Writes through a temporary file in the same directory so a crash never
    /// leaves a half-written collection behind.
    fn write(&self, data: &str) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        if !dir.exists() {
            debug!("Creating notes directory: {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                NotesError::DirectoryError {
                    path: dir.to_path_buf(),
                }
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotesError::Io(e)
        })?;

        trace!("Writing to temporary file");
        temp_file.write_all(data.as_bytes())?;
        temp_file.flush()?;

        debug!("Performing atomic move of temporary file to final location");
        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            NotesError::Io(e.error)
        })?;

        Ok(())
    }
}

/// An in-memory slot. Clones share the same contents, so a clone handed to a
/// second store behaves like the same slot read after a restart.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    data: Arc<Mutex<Option<String>>>,
    fail_writes: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds `data`.
    pub fn with_contents(data: impl Into<String>) -> Self {
        Self {
            data: Arc::new(Mutex::new(Some(data.into()))),
            fail_writes: false,
        }
    }

    /// A slot whose writes always fail, as when storage quota is exhausted.
    pub fn failing() -> Self {
        Self {
            data: Arc::default(),
            fail_writes: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.data.lock().ok().and_then(|data| data.clone())
    }
}

impl NoteSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        let data = self
            .data
            .lock()
            .map_err(|_| NotesError::LockAcquisitionFailed {
                message: "Failed to acquire lock on memory slot".to_string(),
            })?;
        Ok(data.clone())
    }

    fn write(&self, data: &str) -> Result<()> {
        if self.fail_writes {
            return Err(NotesError::Persistence {
                message: "slot rejected the write".to_string(),
            });
        }
        let mut slot = self
            .data
            .lock()
            .map_err(|_| NotesError::LockAcquisitionFailed {
                message: "Failed to acquire lock on memory slot".to_string(),
            })?;
        *slot = Some(data.to_string());
        Ok(())
    }
}

/// Ordered in-memory note collection mirrored to a [`NoteSlot`].
///
/// Notes are kept newest first. Every mutation rewrites the whole collection
/// to the slot; there are no partial writes and no transactions spanning
/// several edits.
pub struct NoteStore<S: NoteSlot> {
    slot: S,
    notes: Vec<Note>,
}

impl<S: NoteSlot> NoteStore<S> {
    /// Creates a store over `slot` and hydrates it.
    pub fn open(slot: S) -> Self {
        let mut store = Self {
            slot,
            notes: Vec::new(),
        };
        store.load();
        store
    }

    /// Replaces the in-memory collection with the slot contents.
    ///
    /// Never fails: an unreadable or malformed slot yields an empty collection
    /// and a logged warning.
    pub fn load(&mut self) -> &[Note] {
        self.notes = match self.slot.read() {
            Ok(Some(data)) => match serde_json::from_str::<Vec<Note>>(&data) {
                Ok(notes) => {
                    info!("Loaded {} notes", notes.len());
                    notes
                }
                Err(e) => {
                    warn!("Persisted notes are malformed, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No persisted notes found");
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read persisted notes, starting empty: {}", e);
                Vec::new()
            }
        };
        &self.notes
    }

    /// Writes the entire collection to the slot.
    pub fn persist(&self) -> Result<()> {
        trace!("Serializing {} notes", self.notes.len());
        let json = serde_json::to_string(&self.notes)?;
        self.slot.write(&json).map_err(|e| {
            error!("Failed to persist notes: {}", e);
            match e {
                NotesError::Persistence { .. } => e,
                other => NotesError::Persistence {
                    message: other.to_string(),
                },
            }
        })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Every tag in use, in first-seen order.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.notes.iter().flat_map(|note| note.tags.iter()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Creates a note from `draft`, filling defaults, and puts it first.
    ///
    /// If persisting fails the note stays in memory and the error is returned
    /// for the caller to report.
    pub fn create(&mut self, draft: NoteDraft) -> Result<Note> {
        let now = Utc::now();
        let id = match draft.id.filter(|id| !id.is_empty()) {
            Some(id) if !self.contains(&id) => id,
            _ => self.unique_id(),
        };

        let note = Note {
            id,
            title: draft
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: draft.content.unwrap_or_default(),
            tags: dedup_tags(draft.tags.unwrap_or_default()),
            category: draft
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            date: draft.date.unwrap_or_else(|| calendar_date(&now)),
            attendees: normalize_attendees(draft.attendees),
            meeting_time: normalize_meeting_time(draft.meeting_time),
            created_at: now,
            updated_at: now,
        };

        info!("Creating note: {}", note.id);
        self.notes.insert(0, note.clone());
        self.persist()?;
        Ok(note)
    }

    /// Merges the `Some` fields of `draft` into the note with `id`.
    ///
    /// Returns `Ok(None)` without writing anything when no such note exists.
    /// The draft's `id` field is ignored; ids are immutable.
    pub fn update(&mut self, id: &str, draft: NoteDraft) -> Result<Option<Note>> {
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            debug!("Update skipped, note not found: {}", id);
            return Ok(None);
        };

        if let Some(title) = draft.title {
            note.title = if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            };
        }
        if let Some(content) = draft.content {
            note.content = content;
        }
        if let Some(tags) = draft.tags {
            note.tags = dedup_tags(tags);
        }
        if let Some(category) = draft.category.filter(|c| !c.is_empty()) {
            note.category = category;
        }
        if let Some(date) = draft.date {
            note.date = date;
        }
        if draft.attendees.is_some() {
            note.attendees = normalize_attendees(draft.attendees);
        }
        if draft.meeting_time.is_some() {
            note.meeting_time = normalize_meeting_time(draft.meeting_time);
        }
        note.touch();

        let updated = note.clone();
        info!("Updated note: {}", id);
        self.persist()?;
        Ok(Some(updated))
    }

    /// Replaces only the body of a note; the auto-save path.
    pub fn update_content(&mut self, id: &str, content: String) -> Result<Option<Note>> {
        debug!("Auto-saving content of note: {}", id);
        self.update(
            id,
            NoteDraft {
                content: Some(content),
                ..NoteDraft::default()
            },
        )
    }

    /// Applies a change to a note in place and persists the result.
    pub fn modify<F>(&mut self, id: &str, change: F) -> Result<Option<Note>>
    where
        F: FnOnce(&mut Note),
    {
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            return Ok(None);
        };
        change(note);
        note.touch();
        let updated = note.clone();
        self.persist()?;
        Ok(Some(updated))
    }

    /// Removes the note with `id`. Returns whether anything was removed;
    /// an absent id leaves the store and the slot untouched.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            debug!("Delete skipped, note not found: {}", id);
            return Ok(false);
        }
        info!("Note {} deleted", id);
        self.persist()?;
        Ok(true)
    }

    /// Deletes the note only if `confirm` approves it. Declining is not an error.
    pub fn delete_confirmed<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Note) -> bool,
    {
        let Some(note) = self.get(id) else {
            return Ok(false);
        };
        if !confirm(note) {
            info!("Deletion of note {} cancelled", id);
            return Ok(false);
        }
        self.delete(id)
    }

    fn unique_id(&self) -> String {
        let mut stamp = Utc::now();
        let mut id = generate_note_id(stamp);
        while self.contains(&id) {
            stamp += Duration::milliseconds(1);
            id = generate_note_id(stamp);
        }
        id
    }
}
