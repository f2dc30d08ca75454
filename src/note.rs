//! Core data structures for the meetnotes application.
//!
//! This module contains the `Note` record, the partial `NoteDraft` used to
//! create and update notes, and the fixed set of note categories.
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Title given to notes saved without one.
pub const DEFAULT_TITLE: &str = "Untitled Note";

/// Category given to notes saved without one.
pub const DEFAULT_CATEGORY: &str = "general";

/// The categories offered by the editor. Templates may use other values.
pub const CATEGORIES: [&str; 6] = [
    "general",
    "meeting",
    "project",
    "personal",
    "ideas",
    "action-items",
];

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Note body as an HTML fragment
    pub content: String,
    /// Tags for organization, in insertion order
    pub tags: Vec<String>,
    /// One of [`CATEGORIES`] or a template-provided value
    pub category: String,
    /// Logical date of the note
    pub date: NaiveDate,
    /// Meeting attendees, absent for non-meeting notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<String>>,
    /// Meeting time as displayed to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<String>,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new blank note with the given title, dated today.
    pub fn new(title: String, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();

        Note {
            id: generate_note_id(now),
            title: if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            },
            content,
            tags: dedup_tags(tags),
            category: DEFAULT_CATEGORY.to_string(),
            date: calendar_date(&now),
            attendees: None,
            meeting_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a tag unless it is empty or already present.
    /// Returns whether the tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        push_unique(&mut self.tags, tag)
    }

    /// Removes a tag, returning whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Sets `updated_at` to now, never earlier than `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    /// Plain-text preview of the body: tags stripped, first 150 characters.
    pub fn preview(&self) -> String {
        let text = crate::strip_tags(&self.content);
        let head: String = text.chars().take(150).collect();
        format!("{}...", head)
    }
}

/// A partial note. `None` fields are filled with defaults on create and left
/// untouched on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub attendees: Option<Vec<String>>,
    pub meeting_time: Option<String>,
}

impl From<Note> for NoteDraft {
    fn from(note: Note) -> Self {
        NoteDraft {
            id: Some(note.id),
            title: Some(note.title),
            content: Some(note.content),
            tags: Some(note.tags),
            category: Some(note.category),
            date: Some(note.date),
            attendees: note.attendees,
            meeting_time: note.meeting_time,
        }
    }
}

/// Whether `category` is one the editor offers.
pub fn is_listed_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// The calendar date a note is filed under: the UTC date of `at`, whatever
/// zone `at` is expressed in.
pub fn calendar_date<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    at.with_timezone(&Utc).date_naive()
}

/// Generates a note id from a timestamp: `note-<epoch millis>`.
pub fn generate_note_id(now: DateTime<Utc>) -> String {
    format!("note-{}", now.timestamp_millis())
}

/// Drops empty and repeated tags, keeping first occurrences in order.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique = Vec::with_capacity(tags.len());
    for tag in tags {
        push_unique(&mut unique, &tag);
    }
    unique
}

/// Empty attendee lists collapse to `None`.
pub fn normalize_attendees(attendees: Option<Vec<String>>) -> Option<Vec<String>> {
    attendees.filter(|list| !list.is_empty())
}

/// Empty meeting times collapse to `None`.
pub fn normalize_meeting_time(time: Option<String>) -> Option<String> {
    time.filter(|t| !t.trim().is_empty())
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}
