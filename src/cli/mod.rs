//! Command-line surface of the meetnotes application.

mod app;
mod args;

pub use app::*;
pub use args::*;
