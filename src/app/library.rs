use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SortOrder;
use crate::model::{Library, Series};
use crate::store::{ProgressStore, StoreError};

use super::catalog::{CatalogError, FsListing, Listing, build_catalog};
use super::progress::RangeError;

#[derive(Debug, Error)]
pub(crate) enum LibraryError {
    #[error("no series at position {position} (the list has {available})")]
    Index { position: usize, available: usize },

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub(crate) enum RefreshOutcome {
    Restored,
    Rebuilt,
    /// Rebuilt and in use, but the first save failed.
    RebuiltUnsaved(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WatchOutcome {
    pub(crate) series: String,
    pub(crate) season: u32,
    pub(crate) episode: u32,
    pub(crate) finished: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RescanSummary {
    pub(crate) series: usize,
    pub(crate) added: usize,
    pub(crate) removed: usize,
    pub(crate) reset: usize,
}

/// Owns the library, backs it with the progress store and resolves the
/// 1-based positions shown to the user.
pub(crate) struct LibraryManager<L = FsListing> {
    root: PathBuf,
    order: SortOrder,
    listing: L,
    store: ProgressStore,
    library: Library,
    saved_at: Option<DateTime<Utc>>,
}

impl<L: Listing> LibraryManager<L> {
    pub(crate) fn new(root: PathBuf, order: SortOrder, listing: L, store: ProgressStore) -> Self {
        Self {
            root,
            order,
            listing,
            store,
            library: Library::new(),
            saved_at: None,
        }
    }

    pub(crate) fn library(&self) -> &Library {
        &self.library
    }

    pub(crate) fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// Loads stored progress, or rebuilds from disk when `force` is set or
    /// nothing is stored. A rebuilt library replaces the in-memory one even
    /// if saving it fails.
    pub(crate) fn refresh(&mut self, force: bool) -> Result<RefreshOutcome, LibraryError> {
        if !force && let Some(snapshot) = self.store.load()? {
            info!(series = snapshot.library.len(), "restored stored progress");
            self.library = snapshot.library;
            self.saved_at = Some(snapshot.saved_at);
            return Ok(RefreshOutcome::Restored);
        }

        self.library = build_catalog(&self.root, &self.listing, self.order)?;
        info!(
            root = %self.root.display(),
            series = self.library.len(),
            "built library from disk"
        );
        match self.persist() {
            Ok(()) => Ok(RefreshOutcome::Rebuilt),
            Err(err) => Ok(RefreshOutcome::RebuiltUnsaved(err)),
        }
    }

    /// Rebuilds the catalog from disk, keeping each series' progress by name.
    pub(crate) fn rescan(&mut self) -> Result<RescanSummary, LibraryError> {
        let mut fresh = build_catalog(&self.root, &self.listing, self.order)?;
        let mut summary = RescanSummary {
            series: fresh.len(),
            ..RescanSummary::default()
        };

        let names: Vec<String> = fresh.iter().map(|series| series.name.clone()).collect();
        for name in &names {
            let (Some(series), previous) = (fresh.get_mut(name), self.library.get(name)) else {
                continue;
            };
            match previous {
                None => summary.added += 1,
                Some(previous) => {
                    if !series.carry_progress_from(previous) {
                        warn!(
                            series = %name,
                            season = previous.current_season,
                            episode = previous.current_episode,
                            "stored position no longer exists, starting over"
                        );
                        summary.reset += 1;
                    }
                }
            }
        }
        summary.removed = self
            .library
            .iter()
            .filter(|series| fresh.get(&series.name).is_none())
            .count();

        let previous = std::mem::replace(&mut self.library, fresh);
        if let Err(err) = self.persist() {
            self.library = previous;
            return Err(err.into());
        }
        Ok(summary)
    }

    /// Series still in progress, in library order. Position `n` in the UI is
    /// element `n - 1` of this list; it is recomputed on every call.
    pub(crate) fn unwatched_view(&self) -> Vec<&Series> {
        self.library.unwatched()
    }

    /// The episode file `mark_watched` would play for `position`.
    pub(crate) fn episode_to_play(&self, position: usize) -> Result<PathBuf, LibraryError> {
        let name = self.resolve(position)?;
        let series = self.series(&name);
        series
            .and_then(Series::current_episode_path)
            .ok_or(LibraryError::Index {
                position,
                available: self.unwatched_view().len(),
            })
    }

    /// Records a viewing of the series at `position`, advancing it first when
    /// `advance_next` is set, and saves. A failed save is rolled back.
    pub(crate) fn mark_watched(
        &mut self,
        position: usize,
        advance_next: bool,
    ) -> Result<WatchOutcome, LibraryError> {
        let name = self.resolve(position)?;
        self.mutate_and_persist(&name, |series| {
            if advance_next {
                series.advance();
            }
            Ok(())
        })?;

        let series = self.series(&name).ok_or(LibraryError::Index {
            position,
            available: self.unwatched_view().len(),
        })?;
        Ok(WatchOutcome {
            series: series.name.clone(),
            season: series.current_season,
            episode: series.current_episode,
            finished: series.watched,
        })
    }

    /// Moves the series at `position` to `season`/`episode` and saves.
    /// Nothing is written when the target is out of range.
    pub(crate) fn edit_position(
        &mut self,
        position: usize,
        season: u32,
        episode: u32,
    ) -> Result<&Series, LibraryError> {
        let name = self.resolve(position)?;
        self.mutate_and_persist(&name, |series| {
            series.jump(season, episode).map_err(LibraryError::from)
        })?;
        self.series(&name).ok_or(LibraryError::Index {
            position,
            available: self.unwatched_view().len(),
        })
    }

    fn resolve(&self, position: usize) -> Result<String, LibraryError> {
        let view = self.unwatched_view();
        position
            .checked_sub(1)
            .and_then(|idx| view.get(idx))
            .map(|series| series.name.clone())
            .ok_or(LibraryError::Index {
                position,
                available: view.len(),
            })
    }

    fn series(&self, name: &str) -> Option<&Series> {
        self.library.get(name)
    }

    fn mutate_and_persist<F>(&mut self, name: &str, mutate: F) -> Result<(), LibraryError>
    where
        F: FnOnce(&mut Series) -> Result<(), LibraryError>,
    {
        let Some(series) = self.library.get_mut(name) else {
            return Ok(());
        };
        let snapshot = series.clone();
        mutate(series)?;

        if let Err(err) = self.persist() {
            if let Some(series) = self.library.get_mut(name) {
                *series = snapshot;
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.saved_at = Some(self.store.save(&self.library)?);
        Ok(())
    }
}
