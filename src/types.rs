//! Shared enums and command definitions for the meetnotes application.
//!
//! This module contains the sort and filter selectors used by the query
//! engine, the export format names, and the CLI subcommands.
use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::NotesError;

/// A specialized Result type for meetnotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Key used to order notes in a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// The note's logical date
    Date,
    /// Case-insensitive title
    Title,
    /// Last modification time
    #[default]
    Updated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A filter control value: either `all` or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Whether `value` passes this selection.
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            Ok(Selection::Only(s.to_string()))
        }
    }
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        value
            .map(|v| v.parse().unwrap_or_default())
            .unwrap_or_default()
    }
}

/// Ways a note can leave the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `.md` file download
    Markdown,
    /// `.html` file download
    Html,
    /// Standalone HTML handed to the print command
    Print,
    /// Markdown text on the clipboard
    Copy,
}

impl ExportFormat {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Markdown => Some("md"),
            ExportFormat::Html => Some("html"),
            ExportFormat::Print | ExportFormat::Copy => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "html" => Ok(ExportFormat::Html),
            "print" => Ok(ExportFormat::Print),
            "copy" | "clipboard" => Ok(ExportFormat::Copy),
            other => Err(NotesError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Print => "print",
            ExportFormat::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Available subcommands for the meetnotes application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    Create {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Body of the note as an HTML fragment
        #[clap(short, long)]
        content: Option<String>,

        /// Open the body in an editor before saving
        #[clap(short, long)]
        edit: bool,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Category of the note
        #[clap(short = 'C', long)]
        category: Option<String>,

        /// Meeting attendees (comma-separated)
        #[clap(short, long)]
        attendees: Option<String>,

        /// Meeting time, e.g. "09:30 AM"
        #[clap(short = 'm', long)]
        time: Option<String>,
    },

    /// Create a note from a template
    New {
        /// ID of the template (see `templates`)
        template: String,

        /// Open the body in an editor before saving
        #[clap(short, long)]
        edit: bool,
    },

    /// List the available templates
    Templates {
        /// Only show templates of this category
        #[clap(short = 'C', long)]
        category: Option<String>,
    },

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List notes with optional filtering and sorting
    List {
        /// Case-insensitive text to look for in titles, bodies and tags
        #[clap(short, long)]
        search: Option<String>,

        /// Filter notes by category ("all" for any)
        #[clap(short = 'C', long)]
        category: Option<String>,

        /// Filter notes by tag ("all" for any)
        #[clap(short, long)]
        tag: Option<String>,

        /// Sort key
        #[clap(long, value_enum, default_value_t = SortBy::Updated)]
        sort_by: SortBy,

        /// Sort direction
        #[clap(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,

        /// Limit the number of notes returned
        #[clap(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New body for the note; opens the editor when omitted
        #[clap(short, long)]
        content: Option<String>,

        /// Replace the tags (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// New category
        #[clap(short = 'C', long)]
        category: Option<String>,

        /// Replace the attendees (comma-separated)
        #[clap(short, long)]
        attendees: Option<String>,

        /// New meeting time
        #[clap(short = 'm', long)]
        time: Option<String>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Tag operations (add, remove, list)
    Tag {
        /// ID of the note to modify
        id: String,

        /// Tags to add (comma-separated)
        #[clap(short, long)]
        add: Option<String>,

        /// Tags to remove (comma-separated)
        #[clap(short, long)]
        remove: Option<String>,

        /// List all tags for the note
        #[clap(short, long)]
        list: bool,
    },

    /// Export a note
    Export {
        /// ID of the note to export
        id: String,

        /// One of: md, html, print, copy
        #[clap(short, long, default_value = "md")]
        format: String,

        /// Directory for downloaded files (default uses config setting)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the current configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parses_all_case_insensitively() {
        assert_eq!("ALL".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!("".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!(
            "meeting".parse::<Selection>().unwrap(),
            Selection::Only("meeting".into())
        );
        assert!(Selection::All.admits("anything"));
        assert!(!Selection::Only("a".into()).admits("b"));
    }

    #[test]
    fn export_format_names() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("Copy".parse::<ExportFormat>().unwrap(), ExportFormat::Copy);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(NotesError::UnsupportedFormat { format }) if format == "pdf"
        ));
    }
}
