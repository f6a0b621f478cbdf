use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One season directory. `number` is 1-based and follows catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub number: u32,
    pub directory: PathBuf,
    /// Episode file names relative to `directory`, in play order.
    pub episodes: Vec<String>,
}

impl Season {
    pub fn episode_count(&self) -> u32 {
        self.episodes.len() as u32
    }

    pub fn episode_path(&self, episode: u32) -> Option<PathBuf> {
        let idx = episode.checked_sub(1)? as usize;
        self.episodes.get(idx).map(|name| self.directory.join(name))
    }
}

/// A tracked show and its watch position.
///
/// `(current_season, current_episode)` names the next episode to play. Once
/// `watched` is set the position stays pinned on the last playable episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub directory: PathBuf,
    pub seasons: Vec<Season>,
    pub current_season: u32,
    pub current_episode: u32,
    pub watched: bool,
}

impl Series {
    /// Starts at the first episode of the first non-empty season. Returns
    /// `None` when no season has anything to play.
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        seasons: Vec<Season>,
    ) -> Option<Self> {
        let first = seasons.iter().find(|season| !season.episodes.is_empty())?;
        let current_season = first.number;
        Some(Self {
            name: name.into(),
            directory: directory.into(),
            seasons,
            current_season,
            current_episode: 1,
            watched: false,
        })
    }

    pub fn season(&self, number: u32) -> Option<&Season> {
        let idx = number.checked_sub(1)? as usize;
        self.seasons.get(idx)
    }

    pub fn season_count(&self) -> u32 {
        self.seasons.len() as u32
    }

    pub fn episode_count(&self, season: u32) -> u32 {
        self.season(season).map(Season::episode_count).unwrap_or(0)
    }

    pub fn position(&self) -> (u32, u32) {
        (self.current_season, self.current_episode)
    }

    pub fn current_episode_path(&self) -> Option<PathBuf> {
        self.season(self.current_season)?
            .episode_path(self.current_episode)
    }

    /// Position and season numbering satisfy the model invariants.
    pub fn is_consistent(&self) -> bool {
        let numbered = self
            .seasons
            .iter()
            .enumerate()
            .all(|(idx, season)| season.number as usize == idx + 1);
        numbered && (1..=self.episode_count(self.current_season)).contains(&self.current_episode)
    }
}

/// All tracked series keyed by name, kept in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    series: Vec<Series>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a series. A name already present is rejected and `false` returned.
    pub fn insert(&mut self, series: Series) -> bool {
        if self.get(&series.name).is_some() {
            return false;
        }
        self.series.push(series);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|series| series.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Series> {
        self.series.iter_mut().find(|series| series.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series not yet finished, in library order.
    pub fn unwatched(&self) -> Vec<&Series> {
        self.series.iter().filter(|series| !series.watched).collect()
    }

    /// First entry violating the invariants, if any.
    pub fn find_inconsistent(&self) -> Option<&Series> {
        if let Some(duplicate) = self
            .series
            .iter()
            .enumerate()
            .find(|(idx, series)| {
                self.series[..*idx]
                    .iter()
                    .any(|other| other.name == series.name)
            })
            .map(|(_, series)| series)
        {
            return Some(duplicate);
        }
        self.series.iter().find(|series| !series.is_consistent())
    }
}
