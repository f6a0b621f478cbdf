use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SortOrder;
use crate::model::{Library, Season, Series};

use super::order::sort_names;

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error("series root {0} does not exist")]
    RootMissing(PathBuf),

    #[error("series root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to list {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) kind: EntryKind,
}

/// Directory enumeration as consumed by the catalog builder.
pub(crate) trait Listing {
    /// Kind of the entry at `path`, or `None` if nothing usable is there.
    fn kind(&self, path: &Path) -> Option<EntryKind>;

    /// Immediate children of `dir` in enumeration order.
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FsListing;

impl Listing for FsListing {
    fn kind(&self, path: &Path) -> Option<EntryKind> {
        // metadata() follows symlinks, so linked season folders still count.
        let meta = fs::metadata(path).ok()?;
        if meta.is_dir() {
            Some(EntryKind::Dir)
        } else if meta.is_file() {
            Some(EntryKind::File)
        } else {
            None
        }
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for item in fs::read_dir(dir)? {
            let item = item?;
            let path = item.path();
            let name = match item.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(path = %path.display(), name = ?raw, "skipping entry with non UTF-8 name");
                    continue;
                }
            };
            let Some(kind) = self.kind(&path) else {
                debug!(path = %path.display(), "skipping entry that is neither file nor directory");
                continue;
            };
            entries.push(Entry { name, path, kind });
        }
        Ok(entries)
    }
}

/// Scans `root` into a fresh library: one series per subdirectory, one
/// season per subdirectory of a series, one episode per file in a season.
pub(crate) fn build_catalog(
    root: &Path,
    listing: &impl Listing,
    order: SortOrder,
) -> Result<Library, CatalogError> {
    match listing.kind(root) {
        None => return Err(CatalogError::RootMissing(root.to_path_buf())),
        Some(EntryKind::File) => return Err(CatalogError::NotADirectory(root.to_path_buf())),
        Some(EntryKind::Dir) => {}
    }

    let mut library = Library::new();
    for entry in list_sorted(listing, root, order)? {
        if entry.kind != EntryKind::Dir {
            continue;
        }
        let seasons = scan_seasons(listing, &entry.path, order)?;
        match Series::new(entry.name.as_str(), entry.path.clone(), seasons) {
            Some(series) => {
                debug!(
                    series = %series.name,
                    seasons = series.season_count(),
                    "catalogued series"
                );
                library.insert(series);
            }
            None => warn!(path = %entry.path.display(), "skipping series without playable episodes"),
        }
    }
    Ok(library)
}

fn scan_seasons(
    listing: &impl Listing,
    series_dir: &Path,
    order: SortOrder,
) -> Result<Vec<Season>, CatalogError> {
    let mut seasons = Vec::new();
    let season_dirs = list_sorted(listing, series_dir, order)?
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::Dir);
    for (idx, entry) in season_dirs.enumerate() {
        let episodes = list_sorted(listing, &entry.path, order)?
            .into_iter()
            .filter(|episode| episode.kind == EntryKind::File)
            .map(|episode| episode.name)
            .collect();
        seasons.push(Season {
            number: idx as u32 + 1,
            directory: entry.path,
            episodes,
        });
    }
    Ok(seasons)
}

fn list_sorted(
    listing: &impl Listing,
    dir: &Path,
    order: SortOrder,
) -> Result<Vec<Entry>, CatalogError> {
    let mut entries = listing.list(dir).map_err(|source| CatalogError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    sort_names(&mut entries, order, |entry| entry.name.as_str());
    Ok(entries)
}
