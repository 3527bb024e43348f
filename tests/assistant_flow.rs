//! End-to-end scenarios for the listening pipeline: wake word, command
//! dispatch, dictation, timeout reversion, and cooperative shutdown.

use anyhow::Result;
use asistente::actions::OsBridge;
use asistente::command::{CommandAction, CommandTable};
use asistente::engine::{AssistantContext, Engine};
use asistente::history::HistoryLog;
use asistente::normalize::Normalizer;
use asistente::recognizer::Utterance;
use asistente::session::{Mode, UiEvent};
use asistente::tts::SpeechRequest;
use asistente::wake::WakeWords;
use flume::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum OsCall {
    Url(String),
    Run(Vec<String>),
    Typed(String),
}

#[derive(Clone, Default)]
struct RecordingBridge {
    calls: Arc<Mutex<Vec<OsCall>>>,
}

impl OsBridge for RecordingBridge {
    fn open_url(&mut self, url: &str) -> Result<()> {
        self.calls.lock().unwrap().push(OsCall::Url(url.into()));
        Ok(())
    }

    fn run_command(&mut self, argv: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(OsCall::Run(argv.to_vec()));
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.calls.lock().unwrap().push(OsCall::Typed(text.into()));
        Ok(())
    }
}

struct Pipeline {
    engine: Engine,
    speech_rx: Receiver<SpeechRequest>,
    #[allow(dead_code)]
    ui_rx: Receiver<UiEvent>,
    calls: Arc<Mutex<Vec<OsCall>>>,
    running: Arc<AtomicBool>,
}

impl Pipeline {
    fn hear(&mut self, text: &str) {
        self.engine.handle(&Utterance::now(text));
    }

    fn spoken(&self) -> Vec<String> {
        self.speech_rx
            .try_iter()
            .filter_map(|req| match req {
                SpeechRequest::Say(text) => Some(text),
                SpeechRequest::Stop => None,
            })
            .collect()
    }

    fn os_calls(&self) -> Vec<OsCall> {
        self.calls.lock().unwrap().clone()
    }
}

fn pipeline_with(commands: CommandTable, wake_words: &[&str], timeout: Duration) -> Pipeline {
    let (speech_tx, speech_rx) = flume::unbounded();
    let (ui_tx, ui_rx) = flume::unbounded();
    let running = Arc::new(AtomicBool::new(true));
    let bridge = RecordingBridge::default();
    let calls = Arc::clone(&bridge.calls);
    let ctx = AssistantContext {
        normalizer: Normalizer::spanish(),
        wake: WakeWords::new(wake_words.iter().map(|s| s.to_string()).collect(), 0.7),
        commands,
        responses: vec!["No te he pillao bien, ¿puedes repetirlo, illo?".into()],
        command_cutoff: 0.6,
        command_timeout: timeout,
        history: HistoryLog::new(
            std::env::temp_dir().join(format!("asistente_flow_{}.txt", std::process::id())),
        ),
    };
    let engine = Engine::new(
        ctx,
        Box::new(bridge),
        speech_tx,
        ui_tx,
        Arc::clone(&running),
    );
    Pipeline {
        engine,
        speech_rx,
        ui_rx,
        calls,
        running,
    }
}

fn greeting_table() -> CommandTable {
    let mut table = CommandTable::new();
    table.insert("hola", CommandAction::Speak("¡Hola!".into()));
    table.insert("qué hora es", CommandAction::SpeakTime);
    table
}

#[test]
fn noise_is_fallback_then_wake_plus_command_speaks() {
    let mut p = pipeline_with(greeting_table(), &["asistente"], Duration::from_secs(5));

    p.hear("ruido random");
    let first = p.spoken();
    assert_eq!(first.len(), 1, "fallback should speak once: {first:?}");
    assert_ne!(first[0], "¡Hola!");
    assert!(p.os_calls().is_empty());
    assert_eq!(p.engine.mode(), Mode::Idle);

    p.hear("asistente hola");
    assert_eq!(p.spoken(), vec!["¡Hola!".to_string()]);
    assert_eq!(p.engine.mode(), Mode::Idle);
}

#[test]
fn single_shot_activation_dispatches_in_one_pass() {
    let mut p = pipeline_with(greeting_table(), &["autogestión"], Duration::from_secs(5));
    p.hear("autogestión qué hora es");
    let spoken = p.spoken();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].starts_with("Son las "), "{spoken:?}");
    assert_eq!(p.engine.mode(), Mode::Idle);
}

#[test]
fn bare_wake_word_prompts_then_takes_the_command() {
    let mut p = pipeline_with(CommandTable::builtin(), &["asistente"], Duration::from_secs(5));

    p.hear("asistente");
    assert_eq!(p.engine.mode(), Mode::AwaitingCommand);
    assert_eq!(p.spoken(), vec!["Dime".to_string()]);

    p.hear("abre youtube");
    assert_eq!(p.engine.mode(), Mode::Idle);
    assert_eq!(p.spoken(), vec!["Abriendo YouTube".to_string()]);
    assert_eq!(
        p.os_calls(),
        vec![OsCall::Url("https://www.youtube.com".into())]
    );
}

#[test]
fn awaiting_command_times_out_silently() {
    let mut p = pipeline_with(greeting_table(), &["asistente"], Duration::from_millis(100));
    p.hear("asistente");
    p.spoken();
    assert_eq!(p.engine.mode(), Mode::AwaitingCommand);

    std::thread::sleep(Duration::from_millis(150));
    p.engine.tick();
    assert_eq!(p.engine.mode(), Mode::Idle);
    assert!(p.spoken().is_empty(), "reversion must be silent");
}

#[test]
fn dictation_round_trip_types_verbatim() {
    let mut p = pipeline_with(CommandTable::builtin(), &["asistente"], Duration::from_secs(5));

    p.hear("empieza dictado");
    assert_eq!(p.engine.mode(), Mode::Dictating);
    let confirm = p.spoken();
    assert_eq!(confirm.len(), 1);

    p.hear("hola mundo");
    assert_eq!(p.os_calls(), vec![OsCall::Typed(" hola mundo".into())]);
    assert!(p.spoken().is_empty(), "dictation must not answer back");

    p.hear("fin del dictado");
    assert_eq!(p.engine.mode(), Mode::Idle);
    assert_eq!(p.spoken().len(), 1);

    // mode is off again: same words now fall through to matching
    p.hear("hola mundo");
    assert_eq!(p.os_calls().len(), 1);
}

#[test]
fn normalization_feeds_matching() {
    let mut p = pipeline_with(CommandTable::builtin(), &["autogestión"], Duration::from_secs(5));
    // recognizer splits the wake word and mangles the site name
    p.hear("auto gestión abre guguel");
    assert_eq!(p.spoken(), vec!["Abriendo Google".to_string()]);
    assert_eq!(
        p.os_calls(),
        vec![OsCall::Url("https://www.google.com".into())]
    );
}

#[test]
fn shutdown_stops_every_lane_in_order() {
    let mut p = pipeline_with(CommandTable::builtin(), &["asistente"], Duration::from_secs(5));
    p.hear("asistente salir");
    assert_eq!(p.engine.mode(), Mode::ShuttingDown);
    assert!(!p.running.load(Ordering::SeqCst));

    // farewell first, then the stop sentinel, nothing after
    let requests: Vec<SpeechRequest> = p.speech_rx.try_iter().collect();
    assert!(matches!(&requests[0], SpeechRequest::Say(text) if text.contains("Apagando")));
    assert!(matches!(requests[1], SpeechRequest::Stop));
    assert_eq!(requests.len(), 2);

    // terminal: later utterances are ignored
    p.hear("asistente hola");
    assert!(p.spoken().is_empty());
    assert!(p.os_calls().is_empty());
}
