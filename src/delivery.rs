//! Export sinks: file downloads, printing, and the clipboard.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, error, info, warn};
use shell_words::split;
use tempfile::{Builder, NamedTempFile};

use crate::{
    export_filename, to_html, to_markdown, Clipboard, Config, ExportFormat, FallbackClipboard,
    HtmlEscaping, Note, NotesError, Result,
};

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// A file was written
    Saved(PathBuf),
    /// A document was handed to the print command
    Printed(PathBuf),
    /// Markdown was placed on the clipboard
    Copied,
    /// The format was not recognized; nothing happened
    Skipped,
}

/// Delivers rendered notes to files, the printer, or the clipboard.
pub struct Exporter {
    export_dir: PathBuf,
    print_command: String,
    escaping: HtmlEscaping,
    clipboard: Box<dyn Clipboard + Send + Sync>,
}

impl Exporter {
    pub fn new(
        export_dir: PathBuf,
        print_command: String,
        escaping: HtmlEscaping,
        clipboard: Box<dyn Clipboard + Send + Sync>,
    ) -> Self {
        Self {
            export_dir,
            print_command,
            escaping,
            clipboard,
        }
    }

    /// An exporter using the configured directories and the system clipboard.
    pub fn from_config(config: &Config) -> Self {
        let escaping = if config.raw_html_export {
            HtmlEscaping::Raw
        } else {
            HtmlEscaping::Escaped
        };
        Self::new(
            config.export_dir.clone(),
            config.get_print_command(),
            escaping,
            Box::new(FallbackClipboard::system()),
        )
    }

    /// Writes downloads somewhere else from now on.
    pub fn set_export_dir(&mut self, dir: PathBuf) {
        self.export_dir = dir;
    }

    /// Exports by format name. Unknown names are logged and ignored.
    pub fn export(&self, note: &Note, format: &str) -> Result<ExportOutcome> {
        match format.parse::<ExportFormat>() {
            Ok(format) => self.export_as(note, format),
            Err(e) => {
                warn!("{}", e);
                Ok(ExportOutcome::Skipped)
            }
        }
    }

    pub fn export_as(&self, note: &Note, format: ExportFormat) -> Result<ExportOutcome> {
        info!("Exporting note {} as {}", note.id, format);
        match format {
            ExportFormat::Markdown | ExportFormat::Html => {
                self.download(note, format).map(ExportOutcome::Saved)
            }
            ExportFormat::Print => self.print(note).map(ExportOutcome::Printed),
            ExportFormat::Copy => self.copy(note).map(|_| ExportOutcome::Copied),
        }
    }

    /// Writes the Markdown or HTML rendering to the export directory.
    pub fn download(&self, note: &Note, format: ExportFormat) -> Result<PathBuf> {
        let Some(extension) = format.extension() else {
            return Err(NotesError::UnsupportedFormat {
                format: format.to_string(),
            });
        };
        let body = match format {
            ExportFormat::Markdown => to_markdown(note),
            _ => to_html(note, self.escaping),
        };

        let path = self.export_dir.join(export_filename(&note.title, extension));
        write_atomically(&path, &body)?;
        info!("Exported note {} to {}", note.id, path.display());
        Ok(path)
    }

    /// Writes the HTML document to a temporary file and opens it with the
    /// print command. The file is left in place for the viewer to read.
    pub fn print(&self, note: &Note) -> Result<PathBuf> {
        let html = to_html(note, self.escaping);
        let mut file = Builder::new()
            .prefix("meetnotes-print-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path().keep().map_err(|e| {
            error!("Failed to keep print file: {}", e);
            NotesError::Io(e.error)
        })?;

        launch(&self.print_command, &path)?;
        info!("Sent note {} to print via {}", note.id, path.display());
        Ok(path)
    }

    /// Copies the Markdown rendering to the clipboard.
    pub fn copy(&self, note: &Note) -> Result<()> {
        let markdown = to_markdown(note);
        self.clipboard.write_text(&markdown).map_err(|e| {
            error!("Failed to copy note {}: {}", note.id, e);
            e
        })?;
        info!("Copied note {} via {}", note.id, self.clipboard.name());
        Ok(())
    }
}

fn write_atomically(path: &Path, data: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !dir.exists() {
        debug!("Creating export directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|_| NotesError::DirectoryError {
            path: dir.to_path_buf(),
        })?;
    }

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(data.as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        NotesError::Io(e.error)
    })?;
    Ok(())
}

/// Runs a shell-like command line with `file` appended as the last argument.
pub(crate) fn launch(command_line: &str, file: &Path) -> Result<()> {
    let args = split(command_line).map_err(|e| NotesError::EditorError {
        message: format!("Failed to parse command '{}': {}", command_line, e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(NotesError::EditorError {
            message: "Empty command".to_string(),
        });
    };

    debug!("Launching {} {:?} {}", program, rest, file.display());
    let status = Command::new(program).args(rest).arg(file).status()?;
    if !status.success() {
        return Err(NotesError::EditorError {
            message: format!("{} exited with {}", program, status),
        });
    }
    Ok(())
}
