use anyhow::{Context, Result};
use asistente::config::Config;
use asistente::pipeline;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "asistente", about = "Asistente de voz AGP: palabras de activación y comandos en español")]
struct Cli {
    /// Ruta al archivo de configuración (config.toml por defecto)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Palabra de activación; repetible, sustituye la lista configurada
    #[arg(long = "wake-word")]
    wake_words: Vec<String>,

    /// Umbral de similitud para la palabra de activación (0.0-1.0)
    #[arg(long)]
    wake_threshold: Option<f32>,

    /// Umbral de similitud para comandos (0.0-1.0)
    #[arg(long)]
    cutoff: Option<f32>,

    /// Archivo de historial de comandos
    #[arg(long)]
    history: Option<PathBuf>,

    /// Archivo de log técnico (stdout si no se indica)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Procesa un único texto como transcripción y termina
    Once {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if !cli.wake_words.is_empty() {
        config.wake_words = cli.wake_words.clone();
    }
    if let Some(threshold) = cli.wake_threshold {
        config.wake_threshold = threshold;
    }
    if let Some(cutoff) = cli.cutoff {
        config.command_cutoff = cutoff;
    }
    if let Some(history) = cli.history {
        config.history_file = history;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = Some(log_file);
    }

    init_tracing(config.log_file.as_deref())?;

    match cli.command {
        Some(Command::Once { text }) => pipeline::run_once(config, &text.join(" ")),
        None => pipeline::run(config),
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("no se pudo crear el directorio de logs")?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("no se pudo abrir el log {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_target(false)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
        }
    }
    Ok(())
}
