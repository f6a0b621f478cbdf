use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

pub(crate) const PLAYER_ENV: &str = "SERIALTRACK_PLAYER";

/// Hands an episode file to whatever plays it.
pub(crate) trait Player {
    fn open(&self, path: &Path) -> Result<()>;
}

/// Launches the configured program, or the desktop's default opener.
#[derive(Debug, Clone, Default)]
pub(crate) struct SystemPlayer {
    program: Option<PathBuf>,
}

impl SystemPlayer {
    pub(crate) fn new(configured: Option<PathBuf>) -> Self {
        Self::with_program(resolve_player_from_env(env::var_os(PLAYER_ENV), configured))
    }

    pub(crate) fn with_program(program: Option<PathBuf>) -> Self {
        Self { program }
    }

    pub(crate) fn command(&self, path: &Path) -> ProcessCommand {
        match &self.program {
            Some(program) => {
                let mut cmd = ProcessCommand::new(program);
                cmd.arg(path);
                cmd
            }
            None => default_opener(path),
        }
    }
}

impl Player for SystemPlayer {
    fn open(&self, path: &Path) -> Result<()> {
        let mut cmd = self.command(path);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to open {}", path.display()))?;
        // The session keeps going while the episode plays; reap off-thread.
        std::thread::spawn(move || {
            if let Err(err) = child.wait() {
                debug!(error = %err, "failed waiting on player");
            }
        });
        Ok(())
    }
}

pub(crate) fn resolve_player_from_env(
    env_value: Option<OsString>,
    configured: Option<PathBuf>,
) -> Option<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => configured,
    }
}

#[cfg(target_os = "windows")]
fn default_opener(path: &Path) -> ProcessCommand {
    let mut cmd = ProcessCommand::new("cmd");
    cmd.arg("/C").arg("start").arg("").arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn default_opener(path: &Path) -> ProcessCommand {
    let mut cmd = ProcessCommand::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_opener(path: &Path) -> ProcessCommand {
    let mut cmd = ProcessCommand::new("xdg-open");
    cmd.arg(path);
    cmd
}
