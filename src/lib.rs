//! Meeting notes library
//!
//! This library provides a persistent note store, a catalog of note
//! templates, filtering and sorting of notes for display, conversion of note
//! bodies to Markdown and standalone HTML, and editing sessions with
//! periodic auto-save.

mod autosave;
mod cli;
pub(crate) mod clipboard;
mod config;
pub(crate) mod delivery;
mod editor;
mod errors;
mod export;
mod helper;
pub(crate) mod note;
mod query;
mod rules;
mod storage;
mod templates;
mod types;

// Re-export key components
pub use autosave::*;
pub use cli::*;
pub use clipboard::*;
pub use config::*;
pub use delivery::*;
pub use editor::*;
pub use errors::*;
pub use export::*;
pub use helper::*;
pub use note::*;
pub use query::*;
pub use rules::*;
pub use storage::*;
pub use templates::*;
pub use types::*;
