//! Transcript source lane
//!
//! The core consumes finalized transcript strings; where they come from
//! is an external concern. The shipped binary feeds stdin lines through
//! this lane, which makes the whole pipeline scriptable and testable
//! without a microphone or a speech model.

use chrono::{DateTime, Local};
use flume::Sender;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// One finalized recognizer result. Created once, consumed once.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub at: DateTime<Local>,
}

impl Utterance {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            at: Local::now(),
        }
    }
}

/// Read stdin lines as finalized transcripts until EOF or shutdown.
///
/// Blank lines mean the recognizer produced nothing this cycle and are
/// skipped, not treated as errors.
pub fn run_stdin_recognizer(tx: Sender<Utterance>, running: Arc<AtomicBool>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let Ok(line) = line else { break };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        debug!(text, "transcripción final");
        if tx.send(Utterance::now(text)).is_err() {
            break;
        }
    }
}
