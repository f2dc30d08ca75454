//! Editing sessions.
//!
//! The rich-text body is owned by an external component; the session only
//! sees it through [`ContentSource`], which yields the current HTML
//! serialization on demand.

use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use chrono::{NaiveDate, Utc};
use log::{debug, info};

use crate::note::push_unique;
use crate::{
    calendar_date, normalize_attendees, normalize_meeting_time, AutoSaveCallback, AutoSaver, Note,
    NoteDraft, NoteSlot, NoteStore, NotesError, Result, DEFAULT_CATEGORY, DEFAULT_TITLE,
};

/// The body of a note being edited, as HTML.
pub trait ContentSource: Send + Sync {
    fn html(&self) -> Result<String>;
}

/// An in-memory body.
#[derive(Debug, Default)]
pub struct HtmlBuffer {
    html: Mutex<String>,
}

impl HtmlBuffer {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Mutex::new(html.into()),
        }
    }

    pub fn set(&self, html: impl Into<String>) {
        if let Ok(mut current) = self.html.lock() {
            *current = html.into();
        }
    }
}

impl ContentSource for HtmlBuffer {
    fn html(&self) -> Result<String> {
        self.html
            .lock()
            .map(|html| html.clone())
            .map_err(|_| NotesError::LockAcquisitionFailed {
                message: "Failed to acquire lock on editor buffer".to_string(),
            })
    }
}

/// A body kept in a file that an external editor writes to.
///
/// The file is read back as is, except that a single trailing newline is
/// dropped when the body it was seeded with had none. Many editors append one
/// on save.
#[derive(Debug, Clone)]
pub struct FileContent {
    path: PathBuf,
    strip_final_newline: bool,
}

impl FileContent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strip_final_newline: false,
        }
    }

    /// A file seeded with `baseline`.
    pub fn seeded(path: impl Into<PathBuf>, baseline: &str) -> Self {
        Self {
            path: path.into(),
            strip_final_newline: !baseline.ends_with('\n'),
        }
    }
}

impl ContentSource for FileContent {
    fn html(&self) -> Result<String> {
        let mut html = fs::read_to_string(&self.path)?;
        if self.strip_final_newline && html.ends_with('\n') {
            html.pop();
        }
        Ok(html)
    }
}

/// Transient state for creating or editing one note.
///
/// Ends with [`EditorSession::save`] or [`EditorSession::discard`]. Either
/// way, and also when the session is simply dropped, its auto-save task is
/// torn down.
pub struct EditorSession {
    note_id: Option<String>,
    date: Option<NaiveDate>,
    pub title: String,
    pub category: String,
    pub meeting_time: String,
    tags: Vec<String>,
    attendees: Vec<String>,
    baseline: String,
    source: Arc<dyn ContentSource>,
    auto_saver: Option<AutoSaver>,
}

impl EditorSession {
    /// A session for a new, blank note.
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            note_id: None,
            date: None,
            title: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            meeting_time: String::new(),
            tags: Vec::new(),
            attendees: Vec::new(),
            baseline: String::new(),
            source,
            auto_saver: None,
        }
    }

    /// A session for an existing note or an instantiated template.
    pub fn edit(note: &Note, source: Arc<dyn ContentSource>) -> Self {
        Self {
            note_id: Some(note.id.clone()),
            date: Some(note.date),
            title: note.title.clone(),
            category: note.category.clone(),
            meeting_time: note.meeting_time.clone().unwrap_or_default(),
            tags: note.tags.clone(),
            attendees: note.attendees.clone().unwrap_or_default(),
            baseline: note.content.clone(),
            source,
            auto_saver: None,
        }
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn attendees(&self) -> &[String] {
        &self.attendees
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        push_unique(&mut self.tags, tag)
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn add_attendee(&mut self, attendee: &str) -> bool {
        push_unique(&mut self.attendees, attendee)
    }

    pub fn remove_attendee(&mut self, attendee: &str) {
        self.attendees.retain(|a| a != attendee);
    }

    /// Starts auto-saving the body. Replaces, and thereby cancels, any
    /// previous auto-save of this session. Must run inside a tokio runtime.
    pub fn start_auto_save(&mut self, period: std::time::Duration, on_save: AutoSaveCallback) {
        self.auto_saver = Some(AutoSaver::start(
            Arc::clone(&self.source),
            self.baseline.clone(),
            period,
            on_save,
        ));
    }

    pub fn is_auto_saving(&self) -> bool {
        self.auto_saver.as_ref().is_some_and(AutoSaver::is_running)
    }

    /// The note as it would be saved now.
    pub fn draft(&self) -> Result<NoteDraft> {
        let title = if self.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            self.title.clone()
        };

        Ok(NoteDraft {
            id: self.note_id.clone(),
            title: Some(title),
            content: Some(self.source.html()?),
            tags: Some(self.tags.clone()),
            category: Some(self.category.clone()),
            date: Some(self.date.unwrap_or_else(|| calendar_date(&Utc::now()))),
            attendees: normalize_attendees(Some(self.attendees.clone())),
            meeting_time: normalize_meeting_time(Some(self.meeting_time.clone())),
        })
    }

    /// Ends the session by writing every field to the store.
    ///
    /// Auto-save is stopped before the body is read, so no stale auto-save
    /// can land after this write. A note whose id is not in the store yet
    /// (a new note or an instantiated template) is created.
    pub async fn save<S: NoteSlot>(mut self, store: &Mutex<NoteStore<S>>) -> Result<Note> {
        self.stop_auto_save().await;
        let mut draft = self.draft()?;

        let mut store = store
            .lock()
            .map_err(|_| NotesError::LockAcquisitionFailed {
                message: "Failed to acquire lock on note store".to_string(),
            })?;

        match draft.id.clone() {
            Some(id) if store.contains(&id) => {
                debug!("Saving edits to existing note {}", id);
                // Cleared optional fields must overwrite stored values.
                draft.attendees.get_or_insert_with(Vec::new);
                draft.meeting_time.get_or_insert_with(String::new);
                store
                    .update(&id, draft)?
                    .ok_or(NotesError::NoteNotFound { id })
            }
            _ => {
                let note = store.create(draft)?;
                info!("Saved new note {}", note.id);
                Ok(note)
            }
        }
    }

    /// Ends the session without saving.
    pub async fn discard(mut self) {
        self.stop_auto_save().await;
    }

    async fn stop_auto_save(&mut self) {
        if let Some(mut saver) = self.auto_saver.take() {
            saver.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;
    use crate::{find_template, MemorySlot};

    fn store() -> Mutex<NoteStore<MemorySlot>> {
        Mutex::new(NoteStore::open(MemorySlot::new()))
    }

    #[tokio::test]
    async fn saving_a_new_session_creates_a_note() {
        let store = store();
        let source = Arc::new(HtmlBuffer::new("<p>hello</p>"));
        let mut session = EditorSession::new(source);
        assert!(session.add_tag("team"));
        assert!(!session.add_tag("team"));
        session.add_attendee("Ann");

        let note = session.save(&store).await.unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(note.content, "<p>hello</p>");
        assert_eq!(note.tags, vec!["team"]);
        assert_eq!(note.attendees, Some(vec!["Ann".to_string()]));
        assert_eq!(note.meeting_time, None);
        assert_eq!(store.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saving_an_existing_note_updates_in_place() {
        let store = store();
        let original = store
            .lock()
            .unwrap()
            .create(NoteDraft {
                title: Some("Plan".into()),
                attendees: Some(vec!["Ann".into()]),
                meeting_time: Some("10:00 AM".into()),
                ..NoteDraft::default()
            })
            .unwrap();

        let source = Arc::new(HtmlBuffer::new("<p>edited</p>"));
        let mut session = EditorSession::edit(&original, source);
        session.title = "Plan v2".into();
        session.remove_attendee("Ann");
        session.meeting_time.clear();

        let saved = session.save(&store).await.unwrap();
        assert_eq!(saved.id, original.id);
        assert_eq!(saved.title, "Plan v2");
        assert_eq!(saved.content, "<p>edited</p>");
        assert_eq!(saved.attendees, None);
        assert_eq!(saved.meeting_time, None);
        assert_eq!(saved.created_at, original.created_at);
        assert_eq!(store.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn template_drafts_are_created_with_their_id() {
        let store = store();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap();
        let draft = find_template("team-standup").unwrap().instantiate(&now);

        let source = Arc::new(HtmlBuffer::new(draft.content.clone()));
        let saved = EditorSession::edit(&draft, source).save(&store).await.unwrap();

        assert_eq!(saved.id, draft.id);
        assert_eq!(saved.date, draft.date);
        assert_eq!(saved.attendees, None);
        assert_eq!(saved.meeting_time, draft.meeting_time);
        assert_eq!(saved.tags, draft.tags);
    }

    #[tokio::test]
    async fn auto_save_persists_body_only_and_stops_on_save() {
        let store = Arc::new(store());
        let note = store
            .lock()
            .unwrap()
            .create(NoteDraft {
                title: Some("Live".into()),
                content: Some("<p>v1</p>".into()),
                ..NoteDraft::default()
            })
            .unwrap();

        let source = Arc::new(HtmlBuffer::new("<p>v1</p>"));
        let mut session = EditorSession::edit(&note, Arc::clone(&source) as Arc<dyn ContentSource>);
        session.title = "Not auto-saved".into();

        let calls = Arc::new(AtomicUsize::new(0));
        let (shared, counter, id) = (Arc::clone(&store), Arc::clone(&calls), note.id.clone());
        session.start_auto_save(
            std::time::Duration::from_millis(10),
            Arc::new(move |content: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                shared.lock().unwrap().update_content(&id, content).unwrap();
            }),
        );
        assert!(session.is_auto_saving());

        source.set("<p>v2</p>");
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        {
            let store = store.lock().unwrap();
            let current = store.get(&note.id).unwrap();
            assert_eq!(current.content, "<p>v2</p>");
            assert_eq!(current.title, "Live");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        source.set("<p>v3</p>");
        let saved = session.save(&*store).await.unwrap();
        assert_eq!(saved.content, "<p>v3</p>");
        assert_eq!(saved.title, "Not auto-saved");

        let after = calls.load(Ordering::SeqCst);
        source.set("<p>v4</p>");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after);
    }

    #[tokio::test]
    async fn discard_leaves_the_store_untouched() {
        let store = store();
        let mut session = EditorSession::new(Arc::new(HtmlBuffer::new("x")));
        session.start_auto_save(std::time::Duration::from_millis(10), Arc::new(|_: String| {}));
        session.discard().await;
        assert!(store.lock().unwrap().is_empty());
    }

    #[test]
    fn file_content_reads_the_current_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("body.html");
        fs::write(&path, "<p>from disk</p>\n  \n").unwrap();
        assert_eq!(FileContent::new(&path).html().unwrap(), "<p>from disk</p>\n  \n");
        assert!(FileContent::new(dir.path().join("missing")).html().is_err());
    }

    #[test]
    fn seeded_file_content_absorbs_one_appended_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("body.html");

        fs::write(&path, "<p>a</p>\n").unwrap();
        assert_eq!(FileContent::seeded(&path, "<p>a</p>").html().unwrap(), "<p>a</p>");

        fs::write(&path, "<p>a</p>\n\n").unwrap();
        assert_eq!(FileContent::seeded(&path, "<p>a</p>\n").html().unwrap(), "<p>a</p>\n\n");
    }

    #[tokio::test]
    async fn untouched_file_never_auto_saves() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("body.html");
        let body = "<p>notes</p>\n";
        fs::write(&path, body).unwrap();

        let store = Arc::new(store());
        let note = store
            .lock()
            .unwrap()
            .create(NoteDraft {
                content: Some(body.into()),
                ..NoteDraft::default()
            })
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut session = EditorSession::edit(&note, Arc::new(FileContent::seeded(&path, body)));
        session.start_auto_save(
            std::time::Duration::from_millis(10),
            Arc::new(move |_: String| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;

        let saved = session.save(&*store).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(saved.content, body);
    }

    #[tokio::test]
    async fn restarting_auto_save_cancels_the_previous_task() {
        let source = Arc::new(HtmlBuffer::new("<p>v1</p>"));
        let note = Note::new("Live".into(), "<p>v1</p>".into(), vec![]);
        let mut session = EditorSession::edit(&note, Arc::clone(&source) as Arc<dyn ContentSource>);

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&first), Arc::clone(&second));
        session.start_auto_save(
            std::time::Duration::from_millis(10),
            Arc::new(move |_: String| {
                a.fetch_add(1, Ordering::SeqCst);
            }),
        );
        session.start_auto_save(
            std::time::Duration::from_millis(10),
            Arc::new(move |_: String| {
                b.fetch_add(1, Ordering::SeqCst);
            }),
        );

        source.set("<p>v2</p>");
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        session.discard().await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
