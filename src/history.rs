//! Append-only interaction history
//!
//! One line per executed command or interaction, in the format the
//! desktop assistant always used: `fecha | entrada -> acción`.
//! Writes are best-effort; a failed append is logged and forgotten.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::error;

pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append `timestamp | entrada -> accion`. Never fails the caller.
    pub fn record(&self, entrada: &str, accion: &str) {
        let line = format!(
            "{} | {} -> {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            entrada,
            accion
        );
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(err) = result {
            error!(path = %self.path.display(), %err, "no se pudo guardar el historial");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appends_lines() {
        let path = std::env::temp_dir().join("asistente_historial_test.txt");
        let _ = fs::remove_file(&path);
        let log = HistoryLog::new(&path);
        log.record("hola", "hola");
        log.record("abre google", "abre google");
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("| hola -> hola"));
        assert!(lines[1].contains("| abre google -> abre google"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn bad_path_does_not_panic() {
        let log = HistoryLog::new("/nonexistent-dir/historial.txt");
        log.record("hola", "hola");
    }
}
