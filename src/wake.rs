//! Wake word detection over normalized transcripts
//!
//! Exact containment is the cheap path; otherwise every token is scored
//! against every wake word with the similarity ratio, so short phrases
//! survive recognizer mangling ("autogestion", "asistenta").

use crate::fuzzy::{clean_token, ratio};
use tracing::debug;

pub struct WakeWords {
    phrases: Vec<String>,
    threshold: f32,
}

impl WakeWords {
    pub fn new(phrases: Vec<String>, threshold: f32) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases, threshold }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Check a normalized transcript for a wake word.
    ///
    /// Returns the match confidence: 1.0 for containment, the similarity
    /// ratio for a fuzzy token hit. The first phrase or token pair that
    /// qualifies is authoritative.
    pub fn detect(&self, text: &str) -> Option<f32> {
        if text.is_empty() {
            return None;
        }
        for phrase in &self.phrases {
            if text.contains(phrase.as_str()) {
                return Some(1.0);
            }
        }
        for token in text.split_whitespace() {
            let token = clean_token(token);
            for phrase in &self.phrases {
                let r = ratio(&token, phrase);
                if r >= self.threshold {
                    debug!(%token, %phrase, ratio = r, "wake word difusa");
                    return Some(r);
                }
            }
        }
        None
    }

    /// Remove every wake-word occurrence, leaving the residual command.
    pub fn strip(&self, text: &str) -> String {
        let mut out = text.to_string();
        for phrase in &self.phrases {
            out = out.replace(phrase.as_str(), " ");
        }
        let out = out.split_whitespace().collect::<Vec<_>>().join(" ");
        out.trim_start_matches([',', '!', '.', ' ']).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wake(threshold: f32) -> WakeWords {
        WakeWords::new(
            vec![
                "autogestión".into(),
                "agp".into(),
                "asistente".into(),
                "illo".into(),
                "compae".into(),
            ],
            threshold,
        )
    }

    #[test]
    fn containment_ignores_threshold() {
        for threshold in [0.0, 0.7, 1.0] {
            let w = wake(threshold);
            assert_eq!(w.detect("oye asistente abre google"), Some(1.0));
            assert_eq!(w.detect("autogestión"), Some(1.0));
        }
    }

    #[test]
    fn fuzzy_token_hit() {
        let w = wake(0.7);
        // recognizer drops the accent
        assert!(w.detect("autogestion qué hora es").is_some());
        // and bends vowels
        assert!(w.detect("asistenta hola").is_some());
    }

    #[test]
    fn threshold_boundary() {
        // ratio("illa", "illo") == 0.75 exactly
        assert!(wake(0.75).detect("illa").is_some());
        assert!(wake(0.76).detect("illa").is_none());
        assert!(wake(0.74).detect("illa").is_some());
    }

    #[test]
    fn empty_text() {
        assert_eq!(wake(0.0).detect(""), None);
    }

    #[test]
    fn unrelated_text() {
        assert_eq!(wake(0.7).detect("ruido de fondo cualquiera"), None);
    }

    #[test]
    fn strip_removes_wake_words() {
        let w = wake(0.7);
        assert_eq!(w.strip("autogestión qué hora es"), "qué hora es");
        assert_eq!(w.strip("asistente"), "");
        assert_eq!(w.strip("illo abre google"), "abre google");
    }

    #[test]
    fn phrases_are_trimmed_and_lowercased() {
        let w = WakeWords::new(vec!["  Hola Asistente ".into(), "".into()], 0.7);
        assert_eq!(w.phrases(), ["hola asistente"]);
    }
}
