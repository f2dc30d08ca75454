use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NotesError, Result};

const NOTES_FILE: &str = "notes.json";
const CONFIG_FILE: &str = "config.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// File holding the JSON array of notes
    pub data_file: PathBuf,

    /// Directory where downloaded exports are written
    pub export_dir: PathBuf,

    /// How often the editor session checks for body changes (milliseconds)
    pub auto_save_interval_ms: u64,

    /// Whether editing sessions auto-save the body
    pub auto_save: bool,

    /// Editor command used for note bodies
    pub editor_command: Option<String>,

    /// Command that opens an HTML file for printing
    pub print_command: Option<String>,

    /// Write exported HTML metadata without escaping, as older exports did
    pub raw_html_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".meetnotes"));

        Self {
            data_file: data_dir.join(NOTES_FILE),
            export_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            auto_save_interval_ms: 5000,
            auto_save: true,
            editor_command: None,
            print_command: None,
            raw_html_export: false,
        }
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Reads the configuration at `path`, or the default location when
    /// `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No configuration directory available, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!("Configuration file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data).map_err(|e| NotesError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| NotesError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.auto_save_interval_ms == 0 {
            return Err(NotesError::ConfigError {
                message: "auto_save_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(NotesError::ConfigError {
                message: "data_file must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_millis(self.auto_save_interval_ms)
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            // Try common Linux editors
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }

    /// Command that opens an HTML document so it can be printed.
    pub fn get_print_command(&self) -> String {
        if let Some(command) = &self.print_command {
            return command.clone();
        }

        if cfg!(windows) {
            "cmd /C start \"\"".to_string()
        } else if cfg!(target_os = "macos") {
            "open".to_string()
        } else {
            "xdg-open".to_string()
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "meetnotes")
}
