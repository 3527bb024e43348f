//! Configuration: wake words, thresholds, command table sources
//!
//! Loaded once from `config.toml` (or a `--config` path), overridable
//! from the command line, and validated loudly before anything starts.
//! A config problem is fatal at construction time, never mid-operation.

use crate::command::{CommandTable, parse_action};
use crate::engine::AssistantContext;
use crate::history::HistoryLog;
use crate::normalize::Normalizer;
use crate::wake::WakeWords;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no se pudo leer {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("configuración inválida en {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("la lista de palabras de activación está vacía")]
    NoWakeWords,
    #[error("la tabla de comandos está vacía")]
    NoCommands,
    #[error("umbral fuera de rango [0,1]: {0}")]
    BadThreshold(f32),
    #[error(transparent)]
    Commands(#[from] crate::command::CommandFileError),
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_wake_words")]
    pub wake_words: Vec<String>,
    /// Token similarity needed for a fuzzy wake-word hit.
    #[serde(default = "default_wake_threshold")]
    pub wake_threshold: f32,
    /// Similarity needed for a command-table hit.
    #[serde(default = "default_command_cutoff")]
    pub command_cutoff: f32,
    /// Seconds to wait for a command after a bare wake word.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    /// Where technical logs go; stdout when unset.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Canned replies when nothing matched.
    #[serde(default = "default_responses")]
    pub responses: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            wake_words: default_wake_words(),
            wake_threshold: default_wake_threshold(),
            command_cutoff: default_command_cutoff(),
            command_timeout_secs: default_command_timeout(),
            history_file: default_history_file(),
            log_file: None,
            commands: CommandsConfig::default(),
            responses: default_responses(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandsConfig {
    /// Carry the built-in command set.
    #[serde(default = "default_enable_builtin")]
    pub builtin: bool,
    /// Optional JSON command file (`{"frase": "https://..."}`).
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Extra commands declared inline.
    #[serde(default)]
    pub custom: Vec<CustomCommand>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            builtin: default_enable_builtin(),
            file: None,
            custom: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CustomCommand {
    pub phrase: String,
    /// `speak:texto`, `url:https://...`, `run:programa args`, `shutdown`.
    pub action: String,
}

fn default_name() -> String {
    "AGP".into()
}

fn default_wake_words() -> Vec<String> {
    ["autogestión", "agp", "asistente", "illo", "compae"]
        .map(String::from)
        .to_vec()
}

fn default_wake_threshold() -> f32 {
    0.7
}

fn default_command_cutoff() -> f32 {
    0.6
}

fn default_command_timeout() -> u64 {
    5
}

fn default_history_file() -> PathBuf {
    PathBuf::from("historial_comandos.txt")
}

fn default_enable_builtin() -> bool {
    true
}

fn default_responses() -> Vec<String> {
    [
        "No te he pillao bien, ¿puedes repetirlo, illo?",
        "¿Quieres que abra algo o que escriba?",
        "Eso no lo tengo programado todavía, compae.",
        "No entiendo eso aún, pero lo aprenderé.",
    ]
    .map(String::from)
    .to_vec()
}

impl Config {
    /// Load from an explicit path, or `config.toml` if present, or
    /// defaults. An unreadable or malformed file is a hard error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = Path::new("config.toml");
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback.to_path_buf()
            }
        };
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate and assemble everything the engine owns.
    pub fn build_context(&self) -> Result<AssistantContext, ConfigError> {
        for threshold in [self.wake_threshold, self.command_cutoff] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::BadThreshold(threshold));
            }
        }

        let wake = WakeWords::new(self.wake_words.clone(), self.wake_threshold);
        if wake.is_empty() {
            return Err(ConfigError::NoWakeWords);
        }

        let mut commands = if self.commands.builtin {
            CommandTable::builtin()
        } else {
            CommandTable::new()
        };
        for custom in &self.commands.custom {
            match parse_action(&custom.action) {
                Some(action) => commands.insert(&custom.phrase, action),
                None => warn!(
                    phrase = %custom.phrase,
                    action = %custom.action,
                    "acción de comando no reconocida"
                ),
            }
        }
        if let Some(file) = &self.commands.file {
            commands.merge_json_file(file)?;
        }
        if commands.is_empty() {
            return Err(ConfigError::NoCommands);
        }

        Ok(AssistantContext {
            normalizer: Normalizer::spanish(),
            wake,
            commands,
            responses: self.responses.clone(),
            command_cutoff: self.command_cutoff,
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            history: HistoryLog::new(&self.history_file),
        })
    }
}
