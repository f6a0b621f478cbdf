mod catalog;
mod library;
mod order;
mod player;
mod progress;
mod render;
mod session;


use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::config::Config;
use crate::store::ProgressStore;

use self::catalog::{FsListing, Listing};
use self::library::{LibraryManager, RefreshOutcome};
use self::player::SystemPlayer;
use self::render::{format_saved_at, render_unwatched};
use self::session::Session;

pub fn run(cli: &Cli, config: Config) -> Result<()> {
    debug!(
        root = %config.root.display(),
        data_dir = %config.data_dir.display(),
        config_file = ?config.config_file,
        order = ?config.order,
        "resolved configuration"
    );
    let store = ProgressStore::new(config.data_dir.clone());
    let mut manager = LibraryManager::new(config.root.clone(), config.order, FsListing, store);
    let player = SystemPlayer::new(config.player.clone());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    startup(&mut manager, cli.rebuild, &mut out)?;

    let stdin = io::stdin();
    let mut session = Session::new(&mut manager, &player, &config.keywords);
    session.run(stdin.lock(), &mut out)
}

fn startup<L: Listing, W: Write>(
    manager: &mut LibraryManager<L>,
    rebuild: bool,
    out: &mut W,
) -> Result<()> {
    match manager.refresh(rebuild) {
        Ok(RefreshOutcome::Restored) => {
            if let Some(saved_at) = manager.saved_at() {
                writeln!(out, "Progress last saved {}.", format_saved_at(saved_at))?;
            }
        }
        Ok(RefreshOutcome::Rebuilt) => {
            writeln!(out, "Built library of {} series.", manager.library().len())?;
        }
        Ok(RefreshOutcome::RebuiltUnsaved(err)) => {
            warn!(error = %err, "initial save failed");
            writeln!(
                out,
                "Built library of {} series, but progress could not be saved: {err}",
                manager.library().len()
            )?;
        }
        Err(err) => {
            return Err(err).context("failed to load the series library");
        }
    }
    write!(out, "{}", render_unwatched(&manager.unwatched_view()))?;
    Ok(())
}
