//! Lane wiring: recognizer -> engine -> speech
//!
//! Three workers connected by bounded channels. Every worker polls its
//! inbound queue with a timeout so the shutdown flag is always seen;
//! nothing blocks indefinitely and nothing shares mutable state.

use crate::actions::{OsBridge, ShellBridge};
use crate::config::Config;
use crate::engine::Engine;
use crate::recognizer::{Utterance, run_stdin_recognizer};
use crate::session::UiEvent;
use crate::tts::{ConsoleSpeech, SpeechRequest, Synthesizer, run_speech_worker};
use anyhow::Result;
use flume::Receiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

const QUEUE_DEPTH: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Single consumer of the utterance queue. Utterances are handled in
/// finalization order; `tick` runs between polls so a stale wake
/// activation expires even in silence.
pub fn run_engine_worker(rx: Receiver<Utterance>, mut engine: Engine, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(utt) => engine.handle(&utt),
            Err(flume::RecvTimeoutError::Timeout) => engine.tick(),
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }
    // recognizer gone or shutdown requested; let the other lanes wind down
    running.store(false, Ordering::SeqCst);
}

/// Run the assistant against stdin until a shutdown command, Ctrl-C, or
/// end of input.
pub fn run(config: Config) -> Result<()> {
    let ctx = config.build_context()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = Arc::clone(&running);
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;
    }

    let (utt_tx, utt_rx) = flume::bounded::<Utterance>(QUEUE_DEPTH);
    let (speech_tx, speech_rx) = flume::bounded::<SpeechRequest>(QUEUE_DEPTH);
    let (ui_tx, ui_rx) = flume::unbounded::<UiEvent>();

    let _ = speech_tx.send(SpeechRequest::Say(format!(
        "Asistente de voz {} activado, listo para ayudarte compae.",
        config.name
    )));

    let speech_handle = thread::spawn({
        let running = Arc::clone(&running);
        move || run_speech_worker(speech_rx, Box::new(ConsoleSpeech), running)
    });

    let engine_handle = thread::spawn({
        let running = Arc::clone(&running);
        let speech_tx = speech_tx.clone();
        move || {
            // the bridge may own platform handles; build it on its own lane
            let os: Box<dyn OsBridge> = match ShellBridge::new() {
                Ok(bridge) => Box::new(bridge),
                Err(err) => {
                    error!(%err, "no se pudo iniciar el puente de acciones");
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };
            let engine = Engine::new(ctx, os, speech_tx, ui_tx, Arc::clone(&running));
            run_engine_worker(utt_rx, engine, running);
        }
    });

    // stdin blocks on read; the thread dies with the process, not joined
    thread::spawn({
        let running = Arc::clone(&running);
        move || run_stdin_recognizer(utt_tx, running)
    });

    println!(
        "🎙️ Escuchando... (di '{}')",
        config.wake_words.join("', '")
    );
    while running.load(Ordering::SeqCst) {
        match ui_rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => print_event(&event),
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = engine_handle.join();
    let _ = speech_handle.join();
    info!("asistente finalizado");
    Ok(())
}

/// Feed one transcript through a full pipeline pass and say the queued
/// responses. Scripting and smoke-test entry point.
pub fn run_once(config: Config, text: &str) -> Result<()> {
    let ctx = config.build_context()?;
    let running = Arc::new(AtomicBool::new(true));
    let (speech_tx, speech_rx) = flume::bounded::<SpeechRequest>(QUEUE_DEPTH);
    let (ui_tx, _ui_rx) = flume::unbounded::<UiEvent>();

    let os: Box<dyn OsBridge> = Box::new(ShellBridge::new()?);
    let mut engine = Engine::new(ctx, os, speech_tx, ui_tx, running);
    engine.handle(&Utterance::now(text));
    drop(engine);

    let mut synth = ConsoleSpeech;
    for req in speech_rx.drain() {
        if let SpeechRequest::Say(text) = req {
            synth.speak(&text)?;
        }
    }
    Ok(())
}

fn print_event(event: &UiEvent) {
    match event {
        UiEvent::Heard(text) => println!("🗣️ \"{text}\""),
        UiEvent::Mode(mode) => println!("[{mode}]"),
        // line-based terminal; a GUI front-end would render these
        UiEvent::Snapshot(_) => {}
    }
}
