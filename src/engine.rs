//! The listening state machine
//!
//! Consumes utterances in order and turns each into actions: speech
//! requests, OS calls, dictation passthrough, or a shutdown. One
//! utterance is processed to completion before the next is dequeued, so
//! at most one command handler runs at a time.

use crate::actions::OsBridge;
use crate::command::{CommandAction, CommandTable, MatchResult, spanish_date, spanish_time};
use crate::dictation::{Dictation, DictationAction, END_CONFIRMATION, START_CONFIRMATION};
use crate::history::HistoryLog;
use crate::normalize::Normalizer;
use crate::recognizer::Utterance;
use crate::session::{Mode, SessionState, StatusSnapshot, UiEvent};
use crate::tts::SpeechRequest;
use crate::wake::WakeWords;
use anyhow::Result;
use chrono::Local;
use flume::Sender;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

const PROMPT: &str = "Dime";
const CONTINUITY_REPLY: &str = "Sigues con lo mismo, ¿no? Dime qué necesitas.";
const ERROR_REPLY: &str = "Hubo un error ejecutando eso, illo.";
const FAREWELL: &str = "Apagando el asistente. Hasta luego, illo.";

/// Utterances that start with one of these are a one-shot dictation:
/// the prefix is stripped and the rest typed at the focus.
const WRITE_PREFIXES: [&str; 7] = [
    "escribe esto",
    "escribe",
    "anota",
    "pon",
    "redacta",
    "dicta",
    "transcribe",
];

/// Everything the engine needs that is decided at startup and read-only
/// afterwards. Built from [`crate::config::Config`], owned by the engine.
pub struct AssistantContext {
    pub normalizer: Normalizer,
    pub wake: WakeWords,
    pub commands: CommandTable,
    pub responses: Vec<String>,
    pub command_cutoff: f32,
    pub command_timeout: Duration,
    pub history: HistoryLog,
}

pub struct Engine {
    normalizer: Normalizer,
    wake: WakeWords,
    commands: CommandTable,
    responses: Vec<String>,
    command_cutoff: f32,
    command_timeout: Duration,
    history: HistoryLog,
    dictation: Dictation,
    session: SessionState,
    os: Box<dyn OsBridge>,
    speech_tx: Sender<SpeechRequest>,
    ui_tx: Sender<UiEvent>,
    running: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(
        ctx: AssistantContext,
        os: Box<dyn OsBridge>,
        speech_tx: Sender<SpeechRequest>,
        ui_tx: Sender<UiEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            normalizer: ctx.normalizer,
            wake: ctx.wake,
            commands: ctx.commands,
            responses: ctx.responses,
            command_cutoff: ctx.command_cutoff,
            command_timeout: ctx.command_timeout,
            history: ctx.history,
            dictation: Dictation::new(),
            session: SessionState::new(),
            os,
            speech_tx,
            ui_tx,
            running,
        }
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.session.snapshot()
    }

    /// Process one utterance to completion.
    pub fn handle(&mut self, utt: &Utterance) {
        if self.session.mode() == Mode::ShuttingDown {
            return;
        }
        let norm = self.normalizer.apply(&utt.text);
        debug!(text = %utt.text, %norm, mode = ?self.session.mode(), "procesando");
        self.session.note(utt.text.clone());
        let _ = self.ui_tx.send(UiEvent::Heard(utt.text.clone()));

        if self.session.mode() == Mode::Dictating {
            self.handle_dictation(&norm, &utt.text);
        } else if Dictation::is_start_phrase(&norm) {
            self.dictation.activate();
            self.set_mode(Mode::Dictating);
            self.say(START_CONFIRMATION);
            self.history.record(&utt.text, "dictado_iniciado");
        } else if let Some(rest) = strip_write_prefix(&norm) {
            self.write_once(&rest, &utt.text);
        } else if self.session.mode() == Mode::Idle && self.wake.detect(&norm).is_some() {
            let rest = self.wake.strip(&norm);
            if rest.is_empty() {
                self.set_mode(Mode::AwaitingCommand);
                self.say(PROMPT);
            } else {
                // single-shot activation: wake word and command in one breath
                self.dispatch(&rest, &utt.text);
            }
        } else {
            let was_awaiting = self.session.mode() == Mode::AwaitingCommand;
            self.dispatch(&norm, &utt.text);
            if was_awaiting && self.session.mode() == Mode::AwaitingCommand {
                self.set_mode(Mode::Idle);
            }
        }

        self.session.touch();
        let _ = self.ui_tx.send(UiEvent::Snapshot(self.session.snapshot()));
    }

    /// Called between queue polls; reverts a stale wake activation.
    pub fn tick(&mut self) {
        if self.session.mode() == Mode::AwaitingCommand
            && self.session.idle_for() >= self.command_timeout
        {
            debug!("espera de comando agotada, vuelta a escucha pasiva");
            self.set_mode(Mode::Idle);
        }
    }

    fn handle_dictation(&mut self, norm: &str, raw: &str) {
        match self.dictation.handle(norm, raw) {
            DictationAction::Passthrough(text) => {
                if let Err(err) = self.os.type_text(&format!(" {text}")) {
                    error!(%err, "fallo escribiendo dictado");
                    self.say(ERROR_REPLY);
                } else {
                    self.history.record(raw, "dictado");
                }
            }
            DictationAction::Finished => {
                self.set_mode(Mode::Idle);
                self.say(END_CONFIRMATION);
                self.history.record(raw, "dictado_finalizado");
            }
            DictationAction::NotHandled => {}
        }
    }

    fn write_once(&mut self, text: &str, raw: &str) {
        self.say(&format!("Vale, escribo: {text}"));
        if let Err(err) = self.os.type_text(&format!("{text} ")) {
            error!(%err, "fallo escribiendo texto");
            self.say(ERROR_REPLY);
        } else {
            self.history.record(raw, &format!("escribió: {text}"));
        }
    }

    /// One command-match attempt plus whatever it triggers.
    fn dispatch(&mut self, text: &str, raw: &str) {
        match self.commands.best_match(text, self.command_cutoff) {
            MatchResult::CommandHit {
                key,
                action,
                confidence,
            } => {
                debug!(%key, confidence, "comando reconocido");
                match self.execute(&action) {
                    Ok(()) => {
                        self.history.record(raw, &key);
                        self.session.note(format!("ejecutó: {key}"));
                    }
                    Err(err) => {
                        error!(%key, %err, "fallo ejecutando comando");
                        self.say(ERROR_REPLY);
                        self.history.record(raw, "error_ejecucion");
                    }
                }
            }
            MatchResult::NoMatch => self.fallback(text, raw),
        }
    }

    fn execute(&mut self, action: &CommandAction) -> Result<()> {
        match action {
            CommandAction::Speak(text) => self.say(text),
            CommandAction::SpeakTime => self.say(&spanish_time(Local::now())),
            CommandAction::SpeakDate => self.say(&spanish_date(Local::now())),
            CommandAction::OpenUrl { url, reply } => {
                self.os.open_url(url)?;
                self.say(reply);
            }
            CommandAction::RunOs { argv, reply } => {
                self.os.run_command(argv)?;
                self.say(reply);
            }
            CommandAction::Shutdown => self.shutdown(),
        }
        Ok(())
    }

    /// Nothing matched: keep the conversation going.
    fn fallback(&mut self, norm: &str, raw: &str) {
        let continues_topic = self.session.last_topic().is_some_and(|topic| {
            topic
                .split_whitespace()
                .any(|word| norm.split_whitespace().any(|t| t == word))
        });
        let reply = if continues_topic {
            CONTINUITY_REPLY.to_string()
        } else {
            self.responses
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_else(|| "No te he entendido.".to_string())
        };
        self.say(&reply);
        self.history.record(raw, "no_reconocido");
        self.session.set_last_topic(norm);
    }

    fn shutdown(&mut self) {
        info!("apagando el asistente");
        self.say(FAREWELL);
        let _ = self.speech_tx.send(SpeechRequest::Stop);
        self.set_mode(Mode::ShuttingDown);
        self.running.store(false, Ordering::SeqCst);
    }

    fn set_mode(&mut self, mode: Mode) {
        self.session.set_mode(mode);
        let _ = self.ui_tx.send(UiEvent::Mode(mode));
    }

    fn say(&mut self, text: &str) {
        self.session.note(format!("> {text}"));
        let _ = self.speech_tx.send(SpeechRequest::Say(text.to_string()));
    }
}

fn strip_write_prefix(norm: &str) -> Option<String> {
    for prefix in WRITE_PREFIXES {
        if let Some(rest) = norm.strip_prefix(prefix) {
            if rest.starts_with(' ') {
                let rest = rest.trim();
                if !rest.is_empty() {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}
