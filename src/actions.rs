//! OS-action collaborators: opening URLs and programs, typing text
//!
//! The engine only ever talks to the [`OsBridge`] trait; the shipped
//! implementation spawns processes and, with the `typing` feature,
//! drives the keyboard through enigo.

use anyhow::{Context, Result, bail};
use std::process::Command;
use tracing::info;

pub trait OsBridge: Send {
    fn open_url(&mut self, url: &str) -> Result<()>;
    fn run_command(&mut self, argv: &[String]) -> Result<()>;
    /// Type literal text at the current input focus.
    fn type_text(&mut self, text: &str) -> Result<()>;
}

pub struct ShellBridge {
    #[cfg(feature = "typing")]
    enigo: enigo::Enigo,
}

impl ShellBridge {
    pub fn new() -> Result<Self> {
        #[cfg(feature = "typing")]
        {
            let enigo = enigo::Enigo::new(&enigo::Settings::default())
                .map_err(|e| anyhow::anyhow!("no se pudo inicializar enigo: {e}"))?;
            Ok(Self { enigo })
        }
        #[cfg(not(feature = "typing"))]
        {
            Ok(Self {})
        }
    }
}

impl OsBridge for ShellBridge {
    fn open_url(&mut self, url: &str) -> Result<()> {
        info!(url, "abriendo url");
        opener(url)
            .spawn()
            .with_context(|| format!("no se pudo abrir {url}"))?;
        Ok(())
    }

    fn run_command(&mut self, argv: &[String]) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            bail!("comando vacío");
        };
        info!(%program, "lanzando programa");
        Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("no se pudo lanzar {program}"))?;
        Ok(())
    }

    #[cfg(feature = "typing")]
    fn type_text(&mut self, text: &str) -> Result<()> {
        use enigo::Keyboard;
        self.enigo
            .text(text)
            .map_err(|e| anyhow::anyhow!("no se pudo escribir: {e}"))
    }

    #[cfg(not(feature = "typing"))]
    fn type_text(&mut self, text: &str) -> Result<()> {
        println!("⌨️  {text}");
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(target_os = "macos")]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
