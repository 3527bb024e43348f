//! Session state owned by the listening engine
//!
//! Single-owner mutable state: the engine thread is the only writer.
//! Anything the UI needs travels as a [`UiEvent`] or a [`StatusSnapshot`]
//! message, never by sharing this struct.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Lines kept for display; older ones fall off the front.
const HISTORY_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Passive listening, no wake word yet.
    Idle,
    /// Wake word heard, waiting for the command utterance.
    AwaitingCommand,
    /// Everything is typed verbatim until the end phrase.
    Dictating,
    /// Terminal; queues drain and workers exit.
    ShuttingDown,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Idle => write!(f, "Escuchando..."),
            Mode::AwaitingCommand => write!(f, "Te escucho..."),
            Mode::Dictating => write!(f, "DICTADO ACTIVO"),
            Mode::ShuttingDown => write!(f, "Apagando..."),
        }
    }
}

/// Message published to whoever renders status (terminal, tray, GUI).
#[derive(Debug, Clone)]
pub enum UiEvent {
    Heard(String),
    Mode(Mode),
    Snapshot(StatusSnapshot),
}

/// Read-only copy of the session for display.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub recent: Vec<String>,
}

pub struct SessionState {
    mode: Mode,
    last_activity: Instant,
    last_topic: Option<String>,
    history: VecDeque<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            last_activity: Instant::now(),
            last_topic: None,
            history: VecDeque::with_capacity(HISTORY_LINES),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Record activity now; resets the awaiting-command timeout.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn last_topic(&self) -> Option<&str> {
        self.last_topic.as_deref()
    }

    pub fn set_last_topic(&mut self, topic: &str) {
        self.last_topic = Some(topic.to_string());
    }

    /// Append a display line to the bounded ring buffer.
    pub fn note(&mut self, line: String) {
        if self.history.len() == HISTORY_LINES {
            self.history.pop_front();
        }
        self.history.push_back(line);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.mode,
            recent: self.history.iter().cloned().collect(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
