//! Error types for the meetnotes application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during note management and export operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the meetnotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// No template with the requested id exists in the catalog.
    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    /// Writing the note collection to its slot failed. The in-memory
    /// collection still holds the change.
    #[error("Failed to persist notes: {message}")]
    Persistence { message: String },

    /// Both the primary and the fallback clipboard paths failed.
    #[error("Failed to copy to clipboard: {message}")]
    Clipboard { message: String },

    /// An export format name that is not recognized.
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    #[error("{message}")]
    EditorError { message: String },
}
