//! CLI module for the meetnotes application
//!
//! This module handles the command-line interface for interacting with the
//! note store, the template catalog and the exporters.
use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Local;
use console::style;
use log::{debug, error, info, warn};
use tempfile::Builder;

use crate::{
    catalog, delivery::launch, find_template, html_to_markdown, is_listed_category, parse_tags,
    template_categories, view, AutoSaveCallback, Commands, Config, ContentSource, EditorSession,
    ExportOutcome, Exporter, FileContent, Note, NoteDraft, NoteQuery, NoteSlot, NoteStore,
    NotesError, Result, Selection, SortBy, SortOrder, CATEGORIES,
};

/// Options for the `list` command.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub query: NoteQuery,
    /// 0 means no limit
    pub limit: usize,
    pub json: bool,
}

/// Field changes requested on the command line for `create` and `edit`.
#[derive(Debug, Clone, Default)]
pub struct NoteFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
    pub category: Option<String>,
    pub attendees: Option<String>,
    pub time: Option<String>,
}

impl NoteFields {
    fn into_draft(self) -> NoteDraft {
        NoteDraft {
            title: self.title,
            content: self.content,
            tags: self.tags.map(|tags| parse_tags(Some(tags))),
            category: self.category,
            attendees: self.attendees.map(|a| parse_tags(Some(a))),
            meeting_time: self.time,
            ..NoteDraft::default()
        }
    }

    /// Copies the requested changes into an editing session.
    fn apply_to(&self, session: &mut EditorSession) {
        if let Some(title) = &self.title {
            session.title = title.clone();
        }
        if let Some(category) = &self.category {
            session.category = category.clone();
        }
        if let Some(time) = &self.time {
            session.meeting_time = time.clone();
        }
        if let Some(tags) = &self.tags {
            for tag in session.tags().to_vec() {
                session.remove_tag(&tag);
            }
            for tag in parse_tags(Some(tags.clone())) {
                session.add_tag(&tag);
            }
        }
        if let Some(attendees) = &self.attendees {
            for attendee in session.attendees().to_vec() {
                session.remove_attendee(&attendee);
            }
            for attendee in parse_tags(Some(attendees.clone())) {
                session.add_attendee(&attendee);
            }
        }
    }
}

/// CLI Application handler - processes CLI commands against a [`NoteStore`]
pub struct App<S: NoteSlot> {
    /// The note store, shared with auto-save callbacks
    store: Arc<Mutex<NoteStore<S>>>,

    /// Application configuration
    config: Config,

    /// Delivers exports to files, the printer and the clipboard
    exporter: Exporter,

    /// Whether to display verbose output
    verbose: bool,
}

impl<S: NoteSlot + Send + 'static> App<S> {
    /// Create a new CLI application with the given store and config
    pub fn new(store: NoteStore<S>, config: Config, verbose: bool) -> Self {
        let exporter = Exporter::from_config(&config);
        Self::with_exporter(store, config, exporter, verbose)
    }

    pub fn with_exporter(
        store: NoteStore<S>,
        config: Config,
        exporter: Exporter,
        verbose: bool,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config,
            exporter,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Create {
                title,
                content,
                edit,
                tags,
                category,
                attendees,
                time,
            } => {
                let fields = NoteFields {
                    title,
                    content,
                    tags,
                    category,
                    attendees,
                    time,
                };
                self.handle_create(fields, edit).await?;
            }

            Commands::New { template, edit } => self.handle_new(&template, edit).await?,

            Commands::Templates { category } => self.handle_templates(category.into()),

            Commands::View { id, json } => self.handle_view(&id, json)?,

            Commands::List {
                search,
                category,
                tag,
                sort_by,
                order,
                limit,
                json,
            } => {
                let options = ListOptions {
                    query: NoteQuery {
                        search_term: search,
                        category: category.into(),
                        tag: tag.into(),
                        sort_by,
                        sort_order: order,
                    },
                    limit,
                    json,
                };
                self.handle_list(&options)?;
            }

            Commands::Edit {
                id,
                title,
                content,
                tags,
                category,
                attendees,
                time,
            } => {
                let fields = NoteFields {
                    title,
                    content,
                    tags,
                    category,
                    attendees,
                    time,
                };
                self.handle_edit(&id, fields).await?;
            }

            Commands::Delete { id, force } => self.handle_delete(&id, force)?,

            Commands::Tag {
                id,
                add,
                remove,
                list,
            } => self.handle_tag(&id, add, remove, list)?,

            Commands::Export { id, format, output } => {
                self.handle_export(&id, &format, output)?;
            }

            Commands::Config => self.handle_config()?,
        }

        Ok(())
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, NoteStore<S>>> {
        self.store
            .lock()
            .map_err(|_| NotesError::LockAcquisitionFailed {
                message: "Failed to acquire lock on note store".to_string(),
            })
    }

    fn find_note(&self, id: &str) -> Result<Note> {
        self.lock_store()?
            .get(id)
            .cloned()
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })
    }

    async fn handle_create(&self, fields: NoteFields, edit: bool) -> Result<()> {
        warn_unlisted_category(fields.category.as_deref());
        let note = if edit {
            let initial = fields.content.clone().unwrap_or_default();
            let (file, source) = editor_file(&initial)?;
            let mut session = EditorSession::new(source);
            fields.apply_to(&mut session);
            self.edit_in_session(session, &file).await?
        } else {
            self.lock_store()?.create(fields.into_draft())?
        };

        println!("Note created with ID: {}", style(&note.id).green());
        Ok(())
    }

    async fn handle_new(&self, template_id: &str, edit: bool) -> Result<()> {
        let template = find_template(template_id)?;
        let draft = template.instantiate(&Local::now());

        let note = if edit {
            let (file, source) = editor_file(&draft.content)?;
            let session = EditorSession::edit(&draft, source);
            self.edit_in_session(session, &file).await?
        } else {
            self.lock_store()?.create(NoteDraft::from(draft))?
        };

        println!(
            "Note created from template '{}' with ID: {}",
            template.name,
            style(&note.id).green()
        );
        Ok(())
    }

    fn handle_templates(&self, category: Selection) {
        if self.verbose {
            println!("Categories: {}", template_categories().join(", "));
        }

        for template in catalog().iter().filter(|t| category.admits(t.category)) {
            println!(
                "{:<20} {} [{}]",
                style(template.id).bold(),
                template.name,
                style(template.category).cyan()
            );
            println!("{:<20} {}", "", style(template.description).dim());
        }
    }

    fn handle_view(&self, id: &str, json: bool) -> Result<()> {
        let note = self.find_note(id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&note)?);
            return Ok(());
        }

        println!("{}", style(&note.title).bold());
        println!("ID:       {}", note.id);
        println!("Category: {}", note.category);
        println!("Date:     {}", note.date.format("%Y-%m-%d"));
        if let Some(time) = &note.meeting_time {
            println!("Time:     {}", time);
        }
        if let Some(attendees) = note.attendees.as_ref().filter(|a| !a.is_empty()) {
            println!("Attendees: {}", attendees.join(", "));
        }
        if !note.tags.is_empty() {
            println!("Tags:     {}", style(format_tags(&note.tags)).cyan());
        }
        println!("Updated:  {}", note.updated_at.format("%Y-%m-%d %H:%M:%S"));
        println!("{}", separator());
        println!("{}", html_to_markdown(&note.content));
        Ok(())
    }

    /// List notes according to provided filters and options
    fn handle_list(&self, options: &ListOptions) -> Result<()> {
        let mut notes = {
            let store = self.lock_store()?;
            debug!("Listing with {:?} over {} notes", options.query, store.len());
            view(store.notes(), &options.query)
        };

        let total = notes.len();
        if options.limit > 0 && notes.len() > options.limit {
            notes.truncate(options.limit);
        }

        if options.json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", separator());
            }
            println!(
                "{} | {} | {}",
                note.id,
                note.date.format("%Y-%m-%d"),
                style(&note.category).magenta()
            );
            println!("{}", style(&note.title).bold());
            if !note.tags.is_empty() {
                println!("{}", style(format_tags(&note.tags)).cyan());
            }
            println!("{}", style(note.preview()).dim());
        }

        if notes.len() < total {
            println!(
                "\nShowing {} of {} notes. Use --limit to show more.",
                notes.len(),
                total
            );
        } else {
            println!(
                "\nFound {} note{}",
                total,
                if total == 1 { "" } else { "s" }
            );
        }
        Ok(())
    }

    async fn handle_edit(&self, id: &str, fields: NoteFields) -> Result<()> {
        warn_unlisted_category(fields.category.as_deref());
        let note = self.find_note(id)?;

        let updated = if fields.content.is_some() {
            self.lock_store()?
                .update(id, fields.into_draft())?
                .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })?
        } else {
            let (file, source) = editor_file(&note.content)?;
            let mut session = EditorSession::edit(&note, source);
            fields.apply_to(&mut session);
            if self.config.auto_save {
                session.start_auto_save(self.config.auto_save_interval(), self.auto_save_to(id));
            }
            self.edit_in_session(session, &file).await?
        };

        println!("Note {} updated successfully", style(&updated.id).green());
        Ok(())
    }

    /// Callback writing auto-saved bodies to the note with `id`.
    fn auto_save_to(&self, id: &str) -> AutoSaveCallback {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        Arc::new(move |content: String| match store.lock() {
            Ok(mut store) => {
                if let Err(e) = store.update_content(&id, content) {
                    error!("Auto-save of note {} failed: {}", id, e);
                }
            }
            Err(_) => error!("Auto-save of note {} could not lock the store", id),
        })
    }

    /// Opens `file` in the configured editor and saves the session once the
    /// editor exits. A failed editor discards the session.
    async fn edit_in_session(
        &self,
        session: EditorSession,
        file: &tempfile::TempPath,
    ) -> Result<Note> {
        let editor = self.config.get_editor_command();
        let path = file.to_path_buf();
        info!("Opening editor to write note content. Save and exit when done...");

        let launched = tokio::task::spawn_blocking(move || launch(&editor, &path))
            .await
            .map_err(|e| NotesError::EditorError {
                message: format!("Editor task failed: {}", e),
            })
            .and_then(|result| result);

        match launched {
            Ok(()) => session.save(&*self.store).await,
            Err(e) => {
                warn!("Editor failed, discarding changes: {}", e);
                session.discard().await;
                Err(e)
            }
        }
    }

    fn handle_delete(&self, id: &str, force: bool) -> Result<()> {
        let mut store = self.lock_store()?;
        if !store.contains(id) {
            return Err(NotesError::NoteNotFound { id: id.to_string() });
        }

        let mut prompt_error = None;
        let deleted = store.delete_confirmed(id, |note| {
            if force {
                return true;
            }
            match confirm_delete(note) {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    prompt_error = Some(e);
                    false
                }
            }
        })?;

        if let Some(e) = prompt_error {
            return Err(e);
        }

        if deleted {
            println!("Note {} has been permanently deleted.", id);
        } else {
            println!("Deletion cancelled.");
        }
        Ok(())
    }

    fn handle_tag(
        &self,
        id: &str,
        add: Option<String>,
        remove: Option<String>,
        list: bool,
    ) -> Result<()> {
        let add = parse_tags(add);
        let remove = parse_tags(remove);

        let note = if add.is_empty() && remove.is_empty() {
            self.find_note(id)?
        } else {
            self.lock_store()?
                .modify(id, |note| {
                    for tag in &add {
                        note.add_tag(tag);
                    }
                    for tag in &remove {
                        note.remove_tag(tag);
                    }
                })?
                .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })?
        };

        if list || (add.is_empty() && remove.is_empty()) {
            if note.tags.is_empty() {
                println!("Note {} has no tags.", note.id);
            } else {
                println!("{}", style(format_tags(&note.tags)).cyan());
            }
            if self.verbose {
                let all = self.lock_store()?.all_tags();
                println!("All tags: {}", all.join(", "));
            }
        } else {
            println!("Tags of note {} updated.", note.id);
        }
        Ok(())
    }

    fn handle_export(&self, id: &str, format: &str, output: Option<PathBuf>) -> Result<()> {
        let note = self.find_note(id)?;

        let redirected;
        let exporter = match output {
            Some(dir) => {
                let mut exporter = Exporter::from_config(&self.config);
                exporter.set_export_dir(dir);
                redirected = exporter;
                &redirected
            }
            None => &self.exporter,
        };

        match exporter.export(&note, format)? {
            ExportOutcome::Saved(path) => println!("Exported to {}", path.display()),
            ExportOutcome::Printed(path) => println!("Sent {} to print", path.display()),
            ExportOutcome::Copied => println!("Copied note to clipboard"),
            ExportOutcome::Skipped => {
                println!("Unknown export format '{}', nothing exported", format)
            }
        }
        Ok(())
    }

    fn handle_config(&self) -> Result<()> {
        if let Some(path) = Config::default_path() {
            println!("Config file: {}", path.display());
        }
        println!("{}", serde_json::to_string_pretty(&self.config)?);
        println!("Editor:  {}", self.config.get_editor_command());
        println!("Printer: {}", self.config.get_print_command());
        Ok(())
    }
}

/// Writes `content` to a temporary HTML file for an external editor.
fn editor_file(content: &str) -> Result<(tempfile::TempPath, Arc<dyn ContentSource>)> {
    let mut file = Builder::new()
        .prefix("meetnotes-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    let path = file.into_temp_path();
    let source: Arc<dyn ContentSource> =
        Arc::new(FileContent::seeded(path.to_path_buf(), content));
    Ok((path, source))
}

fn warn_unlisted_category(category: Option<&str>) {
    if let Some(category) = category.filter(|c| !is_listed_category(c)) {
        warn!(
            "Category '{}' is not one of: {}",
            category,
            CATEGORIES.join(", ")
        );
    }
}

fn confirm_delete(note: &Note) -> Result<bool> {
    println!("You are about to delete the following note:");
    println!("ID:      {}", note.id);
    println!("Title:   {}", note.title);
    println!("Tags:    {}", note.tags.join(", "));
    println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("\n{}", note.preview());

    println!("\nThis action cannot be undone!");
    print!("Are you sure you want to delete this note? [y/N]: ");
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}

fn separator() -> String {
    let width = terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80);
    "-".repeat(width.min(50))
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            query: NoteQuery {
                sort_by: SortBy::Updated,
                sort_order: SortOrder::Desc,
                ..NoteQuery::default()
            },
            limit: 20,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::{clipboard::tests::RecordingClipboard, HtmlEscaping, MemorySlot};

    fn app(export_dir: PathBuf) -> (App<MemorySlot>, MemorySlot, RecordingClipboard) {
        let slot = MemorySlot::new();
        let clipboard = RecordingClipboard::default();
        let config = Config {
            export_dir: export_dir.clone(),
            auto_save: false,
            ..Config::default()
        };
        let exporter = Exporter::new(
            export_dir,
            "true".into(),
            HtmlEscaping::Escaped,
            Box::new(clipboard.clone()),
        );
        let app = App::with_exporter(NoteStore::open(slot.clone()), config, exporter, false);
        (app, slot, clipboard)
    }

    fn only_note(app: &App<MemorySlot>) -> Note {
        let store = app.lock_store().unwrap();
        assert_eq!(store.len(), 1);
        store.notes()[0].clone()
    }

    #[tokio::test]
    async fn create_without_editor_persists_fields() {
        let dir = tempdir().unwrap();
        let (app, slot, _) = app(dir.path().to_path_buf());

        app.run(Commands::Create {
            title: Some("Sync".into()),
            content: Some("<p>agenda</p>".into()),
            edit: false,
            tags: Some("team, weekly".into()),
            category: Some("meeting".into()),
            attendees: Some("Ann,Bob".into()),
            time: Some("09:30 AM".into()),
        })
        .await
        .unwrap();

        let note = only_note(&app);
        assert_eq!(note.title, "Sync");
        assert_eq!(note.tags, vec!["team", "weekly"]);
        assert_eq!(note.attendees, Some(vec!["Ann".into(), "Bob".into()]));
        assert_eq!(note.meeting_time.as_deref(), Some("09:30 AM"));
        assert!(slot.contents().unwrap().contains("\"meetingTime\""));
    }

    #[tokio::test]
    async fn new_from_template_without_editor() {
        let dir = tempdir().unwrap();
        let (app, _, _) = app(dir.path().to_path_buf());

        app.run(Commands::New {
            template: "team-standup".into(),
            edit: false,
        })
        .await
        .unwrap();

        let note = only_note(&app);
        assert_eq!(note.title, "Team Standup");
        assert_eq!(note.category, "meeting");
        assert!(note.content.contains("<h1>Team Standup - "));

        let missing = app
            .run(Commands::New {
                template: "nope".into(),
                edit: false,
            })
            .await;
        assert!(matches!(missing, Err(NotesError::TemplateNotFound { .. })));
    }

    #[tokio::test]
    async fn edit_with_content_skips_the_editor() {
        let dir = tempdir().unwrap();
        let (app, _, _) = app(dir.path().to_path_buf());
        let id = app
            .lock_store()
            .unwrap()
            .create(NoteDraft {
                title: Some("Old".into()),
                ..NoteDraft::default()
            })
            .unwrap()
            .id;

        app.run(Commands::Edit {
            id: id.clone(),
            title: Some("New".into()),
            content: Some("<p>body</p>".into()),
            tags: None,
            category: None,
            attendees: None,
            time: None,
        })
        .await
        .unwrap();

        let note = only_note(&app);
        assert_eq!(note.title, "New");
        assert_eq!(note.content, "<p>body</p>");

        let missing = app
            .run(Commands::Edit {
                id: "note-0".into(),
                title: None,
                content: Some("x".into()),
                tags: None,
                category: None,
                attendees: None,
                time: None,
            })
            .await;
        assert!(matches!(missing, Err(NotesError::NoteNotFound { .. })));
    }

    #[tokio::test]
    async fn tag_and_forced_delete() {
        let dir = tempdir().unwrap();
        let (app, _, _) = app(dir.path().to_path_buf());
        let id = app
            .lock_store()
            .unwrap()
            .create(NoteDraft {
                tags: Some(vec!["a".into()]),
                ..NoteDraft::default()
            })
            .unwrap()
            .id;

        app.run(Commands::Tag {
            id: id.clone(),
            add: Some("b,a".into()),
            remove: Some("a".into()),
            list: true,
        })
        .await
        .unwrap();
        assert_eq!(only_note(&app).tags, vec!["b"]);

        app.run(Commands::Delete {
            id: id.clone(),
            force: true,
        })
        .await
        .unwrap();
        assert!(app.lock_store().unwrap().is_empty());

        let again = app.run(Commands::Delete { id, force: true }).await;
        assert!(matches!(again, Err(NotesError::NoteNotFound { .. })));
    }

    #[tokio::test]
    async fn export_writes_files_and_copies() {
        let dir = tempdir().unwrap();
        let (app, _, clipboard) = app(dir.path().to_path_buf());
        let id = app
            .lock_store()
            .unwrap()
            .create(NoteDraft {
                title: Some("Weekly Sync".into()),
                content: Some("<h1>Sync</h1>".into()),
                ..NoteDraft::default()
            })
            .unwrap()
            .id;

        app.run(Commands::Export {
            id: id.clone(),
            format: "md".into(),
            output: None,
        })
        .await
        .unwrap();
        assert!(dir.path().join("weekly_sync.md").exists());

        app.run(Commands::Export {
            id: id.clone(),
            format: "copy".into(),
            output: None,
        })
        .await
        .unwrap();
        assert_eq!(clipboard.copied.lock().unwrap().len(), 1);

        app.run(Commands::Export {
            id,
            format: "docx".into(),
            output: None,
        })
        .await
        .unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn list_and_view_accept_existing_notes() {
        let dir = tempdir().unwrap();
        let (app, _, _) = app(dir.path().to_path_buf());
        let id = app
            .lock_store()
            .unwrap()
            .create(NoteDraft::default())
            .unwrap()
            .id;

        app.handle_list(&ListOptions::default()).unwrap();
        app.handle_list(&ListOptions {
            json: true,
            ..ListOptions::default()
        })
        .unwrap();
        app.handle_view(&id, false).unwrap();
        assert!(matches!(
            app.handle_view("note-0", true),
            Err(NotesError::NoteNotFound { .. })
        ));
    }
}
