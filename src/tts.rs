//! Speech output lane
//!
//! Single consumer of [`SpeechRequest`] messages, so responses are
//! spoken in the order the engine enqueued them. Voice synthesis itself
//! is an external concern behind the [`Synthesizer`] trait.

use anyhow::Result;
use flume::Receiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error};

pub enum SpeechRequest {
    Say(String),
    /// Sentinel: drain and exit the lane.
    Stop,
}

pub trait Synthesizer: Send {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Stand-in for a real TTS engine: prints responses to the terminal.
pub struct ConsoleSpeech;

impl Synthesizer for ConsoleSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        println!("💬 {text}");
        Ok(())
    }
}

pub fn run_speech_worker(
    rx: Receiver<SpeechRequest>,
    mut synth: Box<dyn Synthesizer>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(SpeechRequest::Say(text)) => speak_one(synth.as_mut(), &text),
            Ok(SpeechRequest::Stop) => return,
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => return,
        }
    }

    // Interrupted without a sentinel: say what was already queued.
    for req in rx.drain() {
        match req {
            SpeechRequest::Say(text) => speak_one(synth.as_mut(), &text),
            SpeechRequest::Stop => break,
        }
    }
}

fn speak_one(synth: &mut dyn Synthesizer, text: &str) {
    debug!(text, "hablando");
    if let Err(err) = synth.speak(text) {
        error!(%err, "fallo de síntesis de voz");
        println!("(sin audio) {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Synthesizer for Recorder {
        fn speak(&mut self, text: &str) -> Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn speaks_in_fifo_order_until_sentinel() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = flume::bounded(8);
        tx.send(SpeechRequest::Say("uno".into())).unwrap();
        tx.send(SpeechRequest::Say("dos".into())).unwrap();
        tx.send(SpeechRequest::Stop).unwrap();
        tx.send(SpeechRequest::Say("tres".into())).unwrap();

        let running = Arc::new(AtomicBool::new(true));
        run_speech_worker(rx, Box::new(Recorder(Arc::clone(&spoken))), running);

        assert_eq!(*spoken.lock().unwrap(), vec!["uno", "dos"]);
    }

    #[test]
    fn drains_queue_when_interrupted() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = flume::bounded(8);
        tx.send(SpeechRequest::Say("pendiente".into())).unwrap();

        let running = Arc::new(AtomicBool::new(false));
        run_speech_worker(rx, Box::new(Recorder(Arc::clone(&spoken))), running);

        assert_eq!(*spoken.lock().unwrap(), vec!["pendiente"]);
    }
}
