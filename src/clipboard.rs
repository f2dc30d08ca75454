//! Clipboard access for exported Markdown.
//!
//! The system clipboard is reached through a helper program found on `PATH`.
//! When that is unavailable the text is sent to the terminal as an OSC 52
//! escape sequence, which most terminal emulators forward to the clipboard.

use std::{
    io::Write,
    process::{Command, Stdio},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use which::which;

use crate::{NotesError, Result};

/// Somewhere plain text can be copied to.
pub trait Clipboard {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    fn write_text(&self, text: &str) -> Result<()>;
}

/// Known clipboard helper programs, in order of preference.
const CLIPBOARD_PROGRAMS: [(&str, &[&str]); 5] = [
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip", &[]),
];

/// Pipes text into a clipboard helper program.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The first known helper program installed on this machine.
    pub fn detect() -> Option<Self> {
        CLIPBOARD_PROGRAMS
            .iter()
            .find(|(program, _)| which(program).is_ok())
            .map(|(program, args)| {
                debug!("Using clipboard program: {}", program);
                Self::new(*program, args.iter().map(|a| a.to_string()).collect())
            })
    }
}

impl Clipboard for CommandClipboard {
    fn name(&self) -> &str {
        &self.program
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;

        // The pipe is closed when `stdin` drops, before waiting.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };

        let status = child.wait()?;
        written?;
        if !status.success() {
            return Err(NotesError::Clipboard {
                message: format!("{} exited with {}", self.program, status),
            });
        }
        Ok(())
    }
}

/// Writes an OSC 52 sequence to the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalClipboard;

impl TerminalClipboard {
    pub fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
    }
}

impl Clipboard for TerminalClipboard {
    fn name(&self) -> &str {
        "terminal"
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let term = console::Term::stdout();
        if !term.is_term() {
            return Err(NotesError::Clipboard {
                message: "stdout is not a terminal".to_string(),
            });
        }
        term.write_str(&Self::sequence(text))?;
        term.flush()?;
        Ok(())
    }
}

/// Tries the primary clipboard, then the fallback. Fails only when both do.
pub struct FallbackClipboard {
    primary: Option<Box<dyn Clipboard + Send + Sync>>,
    fallback: Box<dyn Clipboard + Send + Sync>,
}

impl FallbackClipboard {
    pub fn new(
        primary: Option<Box<dyn Clipboard + Send + Sync>>,
        fallback: Box<dyn Clipboard + Send + Sync>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// The detected system clipboard with the terminal as fallback.
    pub fn system() -> Self {
        let primary = CommandClipboard::detect()
            .map(|clipboard| Box::new(clipboard) as Box<dyn Clipboard + Send + Sync>);
        Self::new(primary, Box::new(TerminalClipboard))
    }
}

impl Clipboard for FallbackClipboard {
    fn name(&self) -> &str {
        self.primary
            .as_ref()
            .map_or_else(|| self.fallback.name(), |primary| primary.name())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let primary_error = match &self.primary {
            Some(primary) => match primary.write_text(text) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "Clipboard {} failed, falling back to {}: {}",
                        primary.name(),
                        self.fallback.name(),
                        e
                    );
                    e.to_string()
                }
            },
            None => "no clipboard program available".to_string(),
        };

        self.fallback.write_text(text).map_err(|e| NotesError::Clipboard {
            message: format!("{}; {}: {}", primary_error, self.fallback.name(), e),
        })
    }
}
