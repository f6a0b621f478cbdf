use thiserror::Error;

use crate::model::Series;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum RangeError {
    #[error("season {season} does not exist ({name} has {available} season(s))")]
    Season {
        name: String,
        season: u32,
        available: u32,
    },

    #[error("episode {episode} does not exist (season {season} has {available} episode(s))")]
    Episode {
        season: u32,
        episode: u32,
        available: u32,
    },
}

impl Series {
    /// Moves the watch position one episode forward, rolling over into the
    /// next season that has episodes. At the last episode the position stays
    /// put and the series is marked watched; after that this is a no-op.
    pub(crate) fn advance(&mut self) {
        if self.watched {
            return;
        }
        if self.current_episode < self.episode_count(self.current_season) {
            self.current_episode += 1;
            return;
        }
        match self.next_playable_season() {
            Some(season) => {
                self.current_season = season;
                self.current_episode = 1;
            }
            None => self.watched = true,
        }
    }

    /// Sets the position directly. Clears `watched`.
    pub(crate) fn jump(&mut self, season: u32, episode: u32) -> Result<(), RangeError> {
        if season == 0 || season > self.season_count() {
            return Err(RangeError::Season {
                name: self.name.clone(),
                season,
                available: self.season_count(),
            });
        }
        let available = self.episode_count(season);
        if episode == 0 || episode > available {
            return Err(RangeError::Episode {
                season,
                episode,
                available,
            });
        }
        self.current_season = season;
        self.current_episode = episode;
        self.watched = false;
        Ok(())
    }

    /// Whether an episode exists after the current position.
    pub(crate) fn has_next(&self) -> bool {
        self.current_episode < self.episode_count(self.current_season)
            || self.next_playable_season().is_some()
    }

    fn next_playable_season(&self) -> Option<u32> {
        self.seasons
            .iter()
            .find(|season| season.number > self.current_season && !season.episodes.is_empty())
            .map(|season| season.number)
    }

    /// Takes over the position stored in `previous` for the same series after
    /// a rescan. The episode is found by file name in the season with the
    /// same directory; its old index is used only when that file is gone.
    /// Returns `false` when neither lands on an existing episode.
    pub(crate) fn carry_progress_from(&mut self, previous: &Series) -> bool {
        let (season, episode) = self
            .locate_episode_of(previous)
            .unwrap_or_else(|| previous.position());
        if self.jump(season, episode).is_err() {
            return false;
        }
        if previous.watched {
            if self.has_next() {
                self.advance();
            } else {
                self.watched = true;
            }
        }
        true
    }

    fn locate_episode_of(&self, previous: &Series) -> Option<(u32, u32)> {
        let old_season = previous.season(previous.current_season)?;
        let idx = previous.current_episode.checked_sub(1)? as usize;
        let name = old_season.episodes.get(idx)?;
        let season = self
            .seasons
            .iter()
            .find(|season| season.directory == old_season.directory)?;
        let found = season.episodes.iter().position(|episode| episode == name)?;
        Some((season.number, found as u32 + 1))
    }
}
