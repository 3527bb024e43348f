//! Command table and fuzzy matching
//!
//! The table is an explicit registry built once at startup: built-in
//! commands, plus custom entries from `config.toml`, plus an optional
//! JSON command file. Matching is a pure lookup; the engine executes
//! whatever action comes back.

use crate::fuzzy::ratio;
use chrono::{DateTime, Datelike, Local, Timelike};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// What a matched command does. Actions with a visible side effect carry
/// the confirmation to speak once the side effect succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
    Speak(String),
    SpeakTime,
    SpeakDate,
    OpenUrl { url: String, reply: String },
    RunOs { argv: Vec<String>, reply: String },
    Shutdown,
}

/// Result of one lookup. Transient, consumed within the same pass.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    CommandHit {
        key: String,
        action: CommandAction,
        confidence: f32,
    },
}

#[derive(Debug, Error)]
pub enum CommandFileError {
    #[error("no se pudo leer {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON inválido en {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Ordered phrase -> action registry. Keys are unique, lower-cased and
/// trimmed; insertion order breaks matching ties.
pub struct CommandTable {
    entries: Vec<(String, CommandAction)>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The command set carried over from the desktop assistant.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("salir", CommandAction::Shutdown);
        table.insert("apagar", CommandAction::Shutdown);
        table.insert("hola", CommandAction::Speak("¡Hola illo! Aquí estoy.".into()));
        table.insert(
            "buenos días",
            CommandAction::Speak("Buenos días, compae. ¿Qué necesitas?".into()),
        );
        table.insert(
            "buenas tardes",
            CommandAction::Speak("Buenas tardes, ¿en qué te ayudo?".into()),
        );
        table.insert(
            "cómo estás",
            CommandAction::Speak("Mejor que nunca, compae. Listo pa' currá.".into()),
        );
        table.insert("qué tal", CommandAction::Speak("Aquí andamos, ¿y tú qué?".into()));
        table.insert("qué hora es", CommandAction::SpeakTime);
        table.insert("qué día es", CommandAction::SpeakDate);
        table.insert("fecha", CommandAction::SpeakDate);
        table.insert_url("abre google", "https://www.google.com", "Abriendo Google");
        table.insert_url("abre youtube", "https://www.youtube.com", "Abriendo YouTube");
        table.insert_url("abre correo", "https://mail.google.com", "Abriendo correo");
        table.insert_url("abre gmail", "https://mail.google.com", "Abriendo Gmail");
        table.insert_url("abre agp", "https://autogestionpro.com", "Abriendo AutogestiónPro");
        table.insert_url(
            "abre panel agp",
            "https://panel.autogestionpro.com",
            "Abriendo panel",
        );
        table.insert_url(
            "abre métricas",
            "https://metrics.autogestionpro.com",
            "Abriendo métricas",
        );
        table.insert_url("abre crm", "https://crm.autogestionpro.com", "Abriendo CRM");
        table.insert_run("abre bloc de notas", &["notepad"], "Abriendo bloc de notas");
        table.insert_run("abre notepad", &["notepad"], "Abriendo notepad");
        table.insert_run("abre terminal", &["cmd"], "Abriendo terminal");
        table.insert_run("abre calculadora", &["calc"], "Abriendo calculadora");
        table.insert(
            "ayuda",
            CommandAction::Speak(
                "Puedo abrir apps, buscar en Google, escribir por ti, y más: saluda, \
                 pregunta hora, di 'escribe' lo que quieras dictar."
                    .into(),
            ),
        );
        table.insert(
            "qué puedes hacer",
            CommandAction::Speak(
                "Puedo abrir programas, navegar por internet, escribir texto y responder \
                 preguntas básicas."
                    .into(),
            ),
        );
        table
    }

    /// Insert an entry. The first insertion of a key wins; duplicates are
    /// dropped with a warning.
    pub fn insert(&mut self, phrase: &str, action: CommandAction) {
        let key = phrase.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        if self.entries.iter().any(|(k, _)| *k == key) {
            warn!(%key, "comando duplicado ignorado");
            return;
        }
        self.entries.push((key, action));
    }

    fn insert_url(&mut self, phrase: &str, url: &str, reply: &str) {
        self.insert(
            phrase,
            CommandAction::OpenUrl {
                url: url.into(),
                reply: reply.into(),
            },
        );
    }

    fn insert_run(&mut self, phrase: &str, argv: &[&str], reply: &str) {
        self.insert(
            phrase,
            CommandAction::RunOs {
                argv: argv.iter().map(|s| s.to_string()).collect(),
                reply: reply.into(),
            },
        );
    }

    /// Merge a JSON command file: `{"frase": "https://..."}`  opens the
    /// URL, any other string value is spoken back.
    pub fn merge_json_file(&mut self, path: &Path) -> Result<(), CommandFileError> {
        let raw = fs::read_to_string(path).map_err(|source| CommandFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|source| CommandFileError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        let Value::Object(map) = value else {
            warn!(path = %path.display(), "el archivo de comandos no es un objeto JSON");
            return Ok(());
        };
        for (phrase, entry) in map {
            let Value::String(text) = entry else {
                warn!(%phrase, "valor de comando no textual ignorado");
                continue;
            };
            if text.starts_with("http") {
                let reply = format!("Abriendo {}", host_of(&text));
                self.insert(&phrase, CommandAction::OpenUrl { url: text, reply });
            } else {
                self.insert(&phrase, CommandAction::Speak(text));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Best fuzzy match over every key. The single best candidate at or
    /// above the cutoff wins; ties go to the earlier entry.
    pub fn best_match(&self, text: &str, cutoff: f32) -> MatchResult {
        let mut best: Option<(usize, f32)> = None;
        for (i, (key, _)) in self.entries.iter().enumerate() {
            let r = ratio(text, key);
            if r >= cutoff && best.map_or(true, |(_, b)| r > b) {
                best = Some((i, r));
            }
        }
        match best {
            Some((i, confidence)) => {
                let (key, action) = &self.entries[i];
                MatchResult::CommandHit {
                    key: key.clone(),
                    action: action.clone(),
                    confidence,
                }
            }
            None => MatchResult::NoMatch,
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a custom command action from `config.toml`:
/// `speak:texto`, `url:https://...`, `run:programa args`, `shutdown`.
pub fn parse_action(action: &str) -> Option<CommandAction> {
    if let Some(text) = action.strip_prefix("speak:") {
        return Some(CommandAction::Speak(text.trim().to_string()));
    }
    if let Some(url) = action.strip_prefix("url:") {
        let url = url.trim().to_string();
        let reply = format!("Abriendo {}", host_of(&url));
        return Some(CommandAction::OpenUrl { url, reply });
    }
    if let Some(cmdline) = action.strip_prefix("run:") {
        let argv: Vec<String> = cmdline.split_whitespace().map(String::from).collect();
        if argv.is_empty() {
            return None;
        }
        let reply = format!("Abriendo {}", argv[0]);
        return Some(CommandAction::RunOs { argv, reply });
    }
    match action {
        "shutdown" => Some(CommandAction::Shutdown),
        "time" => Some(CommandAction::SpeakTime),
        "date" => Some(CommandAction::SpeakDate),
        _ => None,
    }
}

fn host_of(url: &str) -> String {
    url.split("//")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

const DIAS: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MESES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub fn spanish_time(now: DateTime<Local>) -> String {
    format!("Son las {:02}:{:02}", now.hour(), now.minute())
}

pub fn spanish_date(now: DateTime<Local>) -> String {
    let dia = DIAS[now.weekday().num_days_from_monday() as usize];
    let mes = MESES[now.month0() as usize];
    format!("Hoy es {} {} de {}", dia, now.day(), mes)
}
