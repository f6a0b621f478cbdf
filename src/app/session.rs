//! Line-oriented command loop.
//!
//! [`transition`] maps `(state, input line)` to the next state plus the
//! effects to run; it touches nothing. [`Session`] reads lines, applies the
//! effects against the [`LibraryManager`] and the [`Player`], and may fall
//! back to `Selecting` when an effect fails.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::warn;

use crate::config::{Keyword, Keywords};

use super::catalog::Listing;
use super::library::{LibraryError, LibraryManager};
use super::player::Player;
use super::render::{format_position, render_all, render_help, render_unwatched};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Selecting,
    /// Playing the series shown at `position` when it was selected.
    Watching {
        position: usize,
    },
    Editing,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Play {
        position: usize,
        advance: bool,
    },
    Edit {
        position: usize,
        season: u32,
        episode: u32,
    },
    ShowUnwatched,
    ShowAll,
    ShowHelp,
    Rescan,
    Report(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) next: State,
    pub(crate) effects: Vec<Effect>,
}

impl Transition {
    fn to(next: State) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CommandError {
    #[error("'{input}' is not a series position")]
    Position { input: String },

    #[error("expected '<position> <season> <episode>', got '{input}'")]
    Edit { input: String },
}

/// `"3"` plays and advances series 3, `"-3"` only plays it.
pub(crate) fn parse_position(input: &str) -> Result<(usize, bool), CommandError> {
    let trimmed = input.trim();
    let (digits, advance) = match trimmed.strip_prefix('-') {
        Some(rest) => (rest.trim_start(), false),
        None => (trimmed, true),
    };
    digits
        .parse::<usize>()
        .map(|position| (position, advance))
        .map_err(|_| CommandError::Position {
            input: trimmed.to_string(),
        })
}

pub(crate) fn parse_edit(input: &str) -> Result<(usize, u32, u32), CommandError> {
    let err = || CommandError::Edit {
        input: input.trim().to_string(),
    };
    let mut parts = input.split_whitespace();
    let position = parts
        .next()
        .and_then(|raw| raw.parse::<usize>().ok())
        .ok_or_else(err)?;
    let season = parts
        .next()
        .and_then(|raw| raw.parse::<u32>().ok())
        .ok_or_else(err)?;
    let episode = parts
        .next()
        .and_then(|raw| raw.parse::<u32>().ok())
        .ok_or_else(err)?;
    if parts.next().is_some() {
        return Err(err());
    }
    Ok((position, season, episode))
}

/// Malformed numbers end the session in `Selecting` and `Editing`.
pub(crate) fn transition(state: State, line: &str, keywords: &Keywords) -> Transition {
    match state {
        State::Selecting => match keywords.classify(line) {
            Some(Keyword::Stop) => Transition::to(State::Stop),
            Some(Keyword::Edit) => Transition::to(State::Editing).with(Effect::ShowUnwatched),
            Some(Keyword::Help) => Transition::to(State::Selecting).with(Effect::ShowHelp),
            Some(Keyword::Rescan) => Transition::to(State::Selecting).with(Effect::Rescan),
            Some(Keyword::All) => Transition::to(State::Selecting).with(Effect::ShowAll),
            None => match parse_position(line) {
                Ok((position, advance)) => Transition::to(State::Watching { position })
                    .with(Effect::Play { position, advance }),
                Err(err) => Transition::to(State::Stop).with(Effect::Report(err.to_string())),
            },
        },
        State::Watching { position } => {
            if keywords.is_stop(line) {
                Transition::to(State::Selecting).with(Effect::ShowUnwatched)
            } else {
                Transition::to(State::Watching { position }).with(Effect::Play {
                    position,
                    advance: true,
                })
            }
        }
        State::Editing => {
            if keywords.is_stop(line) {
                return Transition::to(State::Selecting).with(Effect::ShowUnwatched);
            }
            match parse_edit(line) {
                Ok((position, season, episode)) => {
                    Transition::to(State::Editing).with(Effect::Edit {
                        position,
                        season,
                        episode,
                    })
                }
                Err(err) => Transition::to(State::Stop).with(Effect::Report(err.to_string())),
            }
        }
        State::Stop => Transition::to(State::Stop),
    }
}

pub(crate) fn prompt(state: State, keywords: &Keywords) -> String {
    let stop = keywords.stop.first().map(String::as_str).unwrap_or("stop");
    match state {
        State::Selecting => {
            let help = keywords.help.first().map(String::as_str).unwrap_or("help");
            format!("Series position ({help} for help, {stop} to quit)> ")
        }
        State::Watching { .. } => format!("Play the next episode? (enter / {stop})> "),
        State::Editing => format!("<position> <season> <episode> ({stop} to finish)> "),
        State::Stop => String::new(),
    }
}

pub(crate) struct Session<'a, L, P> {
    manager: &'a mut LibraryManager<L>,
    player: &'a P,
    keywords: &'a Keywords,
    state: State,
}

impl<'a, L: Listing, P: Player> Session<'a, L, P> {
    pub(crate) fn new(
        manager: &'a mut LibraryManager<L>,
        player: &'a P,
        keywords: &'a Keywords,
    ) -> Self {
        Self {
            manager,
            player,
            keywords,
            state: State::Selecting,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> State {
        self.state
    }

    /// Runs until a stop transition or end of input.
    pub(crate) fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        let mut lines = input.lines();
        while self.state != State::Stop {
            write!(out, "{}", prompt(self.state, self.keywords))?;
            out.flush()?;
            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            let line = line.context("failed to read command")?;
            self.step(&line, out)?;
        }
        Ok(())
    }

    pub(crate) fn step<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let Transition { next, effects } = transition(self.state, line, self.keywords);
        self.state = next;
        for effect in effects {
            self.apply(effect, out)?;
        }
        Ok(())
    }

    fn apply<W: Write>(&mut self, effect: Effect, out: &mut W) -> Result<()> {
        match effect {
            Effect::Play { position, advance } => self.play(position, advance, out)?,
            Effect::Edit {
                position,
                season,
                episode,
            } => match self.manager.edit_position(position, season, episode) {
                Ok(series) => {
                    writeln!(out, "{} is now at {}", series.name, format_position(series))?
                }
                Err(err @ LibraryError::Store(_)) => writeln!(out, "Progress not saved: {err}")?,
                Err(err) => writeln!(out, "{err}")?,
            },
            Effect::ShowUnwatched => {
                write!(out, "{}", render_unwatched(&self.manager.unwatched_view()))?
            }
            Effect::ShowAll => write!(out, "{}", render_all(self.manager.library()))?,
            Effect::ShowHelp => write!(out, "{}", render_help(self.keywords))?,
            Effect::Rescan => match self.manager.rescan() {
                Ok(summary) => {
                    write!(
                        out,
                        "Rescanned {} series ({} new, {} gone",
                        summary.series, summary.added, summary.removed
                    )?;
                    if summary.reset > 0 {
                        write!(out, ", {} restarted", summary.reset)?;
                    }
                    writeln!(out, ").")?;
                    write!(out, "{}", render_unwatched(&self.manager.unwatched_view()))?;
                }
                Err(err) => writeln!(out, "Rescan failed: {err}")?,
            },
            Effect::Report(message) => writeln!(out, "{message}")?,
        }
        Ok(())
    }

    fn play<W: Write>(&mut self, position: usize, advance: bool, out: &mut W) -> Result<()> {
        let path = match self.manager.episode_to_play(position) {
            Ok(path) => path,
            Err(err) => {
                writeln!(out, "{err}")?;
                self.state = State::Selecting;
                return Ok(());
            }
        };

        match self.player.open(&path) {
            Ok(()) => writeln!(out, "Playing {}", path.display())?,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "player launch failed");
                writeln!(out, "Could not start the player: {err:#}")?;
            }
        }

        match self.manager.mark_watched(position, advance) {
            Ok(outcome) if outcome.finished => {
                writeln!(out, "That was the last episode of {}.", outcome.series)?;
                self.state = State::Selecting;
                write!(out, "{}", render_unwatched(&self.manager.unwatched_view()))?;
            }
            Ok(outcome) if advance => writeln!(
                out,
                "{} next: s{}e{}",
                outcome.series, outcome.season, outcome.episode
            )?,
            Ok(_) => {}
            Err(err) => {
                writeln!(out, "Progress not saved: {err}")?;
                self.state = State::Selecting;
            }
        }
        Ok(())
    }
}
